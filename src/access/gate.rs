//! Authorization gate - fixed operator allow-list

use std::collections::HashSet;
use wakeon_shared::OperatorId;

/// Membership test over the operators allowed to wake devices
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    operators: HashSet<OperatorId>,
}

impl AuthorizationGate {
    pub fn new(operators: impl IntoIterator<Item = OperatorId>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }

    pub fn is_authorized(&self, identity: &OperatorId) -> bool {
        self.operators.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

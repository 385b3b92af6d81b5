//! Wake service - the boundary front ends talk to

use super::{WakeOrchestrator, WakeResult};
use crate::access::AuthorizationGate;
use tracing::warn;
use wakeon_shared::OperatorId;

/// Authorization gate in front of the orchestrator
pub struct WakeService {
    gate: AuthorizationGate,
    orchestrator: WakeOrchestrator,
}

impl WakeService {
    pub fn new(gate: AuthorizationGate, orchestrator: WakeOrchestrator) -> Self {
        Self { gate, orchestrator }
    }

    pub fn is_authorized(&self, identity: &OperatorId) -> bool {
        self.gate.is_authorized(identity)
    }

    /// Device names to offer as choices, in configuration order
    pub fn list_device_names(&self) -> Vec<String> {
        self.orchestrator.registry().list_names()
    }

    pub fn has_device(&self, name: &str) -> bool {
        self.orchestrator.registry().lookup(name).is_ok()
    }

    /// Wake `name` on behalf of `identity`
    ///
    /// Unauthorized callers are turned away before the orchestrator is
    /// touched, so no signal or probe can result from their request.
    pub async fn request_wake(&self, identity: &OperatorId, name: &str) -> WakeResult {
        if !self.is_authorized(identity) {
            warn!("[WAKE] Access denied for operator {}", identity);
            return WakeResult::Unauthorized;
        }
        self.orchestrator.request_wake(name).await
    }

    pub fn orchestrator(&self) -> &WakeOrchestrator {
        &self.orchestrator
    }
}

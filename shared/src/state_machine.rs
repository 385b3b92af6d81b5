//! Wake Attempt State Machine
//!
//! Defines the lifecycle of a single wake attempt and its valid transitions.

use std::fmt;

/// State of a wake attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Signal not yet sent or polling in progress
    Pending,
    /// Device answered a probe
    Online,
    /// Polling budget exhausted without an answer
    Unreachable,
    /// Wake signal could not be transmitted
    Failed,
}

impl AttemptState {
    /// Whether no further events are accepted
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Pending)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptState::Pending => write!(f, "pending"),
            AttemptState::Online => write!(f, "online"),
            AttemptState::Unreachable => write!(f, "unreachable"),
            AttemptState::Failed => write!(f, "failed"),
        }
    }
}

/// Events that drive a wake attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptEvent {
    /// Magic packet transmitted
    SignalSent,
    /// Magic packet could not be transmitted
    SignalFailed { reason: String },
    /// A reachability probe got a positive reply
    ProbeAnswered,
    /// Attempt budget or deadline ran out
    BudgetExhausted,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid; carries the new state
    Success(AttemptState),
    /// Transition was invalid from the current state
    Invalid {
        from: AttemptState,
        event: AttemptEvent,
    },
}

/// Tracks one wake attempt from signal to verdict
#[derive(Debug)]
pub struct AttemptStateMachine {
    state: AttemptState,
    signal_sent: bool,
    probes: u32,
    failure: Option<String>,
}

impl Default for AttemptStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptStateMachine {
    /// Create a new state machine in Pending state
    pub fn new() -> Self {
        Self {
            state: AttemptState::Pending,
            signal_sent: false,
            probes: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn signal_sent(&self) -> bool {
        self.signal_sent
    }

    /// Number of probes recorded so far
    pub fn probes(&self) -> u32 {
        self.probes
    }

    /// Reason recorded by a `SignalFailed` event
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Record that a probe was issued; ignored unless polling is underway
    pub fn record_probe(&mut self) -> bool {
        if self.state == AttemptState::Pending && self.signal_sent {
            self.probes += 1;
            true
        } else {
            false
        }
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: AttemptEvent) -> TransitionResult {
        use AttemptState::*;

        let next = match (self.state, self.signal_sent, &event) {
            (Pending, false, AttemptEvent::SignalSent) => {
                self.signal_sent = true;
                Some(Pending)
            }
            (Pending, false, AttemptEvent::SignalFailed { reason }) => {
                self.failure = Some(reason.clone());
                Some(Failed)
            }
            (Pending, true, AttemptEvent::ProbeAnswered) => Some(Online),
            (Pending, true, AttemptEvent::BudgetExhausted) => Some(Unreachable),
            _ => None,
        };

        match next {
            Some(state) => {
                self.state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.state,
                event,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let fsm = AttemptStateMachine::new();
        assert_eq!(fsm.state(), AttemptState::Pending);
        assert!(!fsm.signal_sent());
        assert_eq!(fsm.probes(), 0);
    }

    #[test]
    fn test_happy_path() {
        let mut fsm = AttemptStateMachine::new();
        assert_eq!(
            fsm.process_event(AttemptEvent::SignalSent),
            TransitionResult::Success(AttemptState::Pending)
        );
        assert!(fsm.record_probe());
        assert!(fsm.record_probe());
        assert_eq!(
            fsm.process_event(AttemptEvent::ProbeAnswered),
            TransitionResult::Success(AttemptState::Online)
        );
        assert_eq!(fsm.probes(), 2);
        assert!(fsm.state().is_terminal());
    }

    #[test]
    fn test_probe_before_signal_is_invalid() {
        let mut fsm = AttemptStateMachine::new();
        assert!(!fsm.record_probe());
        let result = fsm.process_event(AttemptEvent::ProbeAnswered);
        assert!(matches!(
            result,
            TransitionResult::Invalid {
                from: AttemptState::Pending,
                ..
            }
        ));
        assert_eq!(fsm.state(), AttemptState::Pending);
    }

    #[test]
    fn test_signal_failure_is_terminal() {
        let mut fsm = AttemptStateMachine::new();
        fsm.process_event(AttemptEvent::SignalFailed {
            reason: "network unreachable".into(),
        });
        assert_eq!(fsm.state(), AttemptState::Failed);
        assert_eq!(fsm.failure(), Some("network unreachable"));

        // Nothing moves a terminal attempt
        assert!(matches!(
            fsm.process_event(AttemptEvent::SignalSent),
            TransitionResult::Invalid { .. }
        ));
        assert_eq!(fsm.state(), AttemptState::Failed);
    }

    #[test]
    fn test_signal_cannot_fail_after_send() {
        let mut fsm = AttemptStateMachine::new();
        fsm.process_event(AttemptEvent::SignalSent);
        let result = fsm.process_event(AttemptEvent::SignalFailed {
            reason: "late".into(),
        });
        assert!(matches!(result, TransitionResult::Invalid { .. }));
        assert_eq!(
            fsm.process_event(AttemptEvent::BudgetExhausted),
            TransitionResult::Success(AttemptState::Unreachable)
        );
    }
}

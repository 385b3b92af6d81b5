//! Bounded reachability polling after a wake signal

use crate::probe::ReachabilityProbe;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;
use wakeon_shared::defaults;
use wakeon_shared::state_machine::{AttemptEvent, AttemptState, AttemptStateMachine};

/// Budget for the polling phase of a wake attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before the first probe
    pub initial_delay: Duration,
    /// Wait between consecutive probes
    pub interval: Duration,
    /// Maximum number of probes (1 = single check)
    pub max_attempts: u32,
    /// Upper bound for one probe
    pub probe_timeout: Duration,
    /// Overall bound, measured from the start of polling, initial delay included
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(defaults::INITIAL_DELAY_MS),
            interval: Duration::from_millis(defaults::PROBE_INTERVAL_MS),
            max_attempts: defaults::MAX_PROBE_ATTEMPTS,
            probe_timeout: Duration::from_millis(defaults::PROBE_TIMEOUT_MS),
            deadline: Duration::from_millis(defaults::WAKE_DEADLINE_MS),
        }
    }
}

/// Probe `addr` until it answers, the attempts run out or the deadline passes
///
/// The state machine must already have seen `SignalSent`; it leaves this
/// function in `Online` or `Unreachable`.
pub(crate) async fn poll_until_online(
    probe: &dyn ReachabilityProbe,
    addr: IpAddr,
    policy: &PollPolicy,
    fsm: &mut AttemptStateMachine,
) -> AttemptState {
    let deadline = Instant::now() + policy.deadline;

    if !policy.initial_delay.is_zero() {
        sleep(policy.initial_delay.min(policy.deadline)).await;
    }

    for attempt in 1..=policy.max_attempts {
        let now = Instant::now();
        if now >= deadline {
            debug!("[PROBE] Deadline reached before attempt {}", attempt);
            break;
        }

        let limit = policy.probe_timeout.min(deadline - now);
        fsm.record_probe();

        // Probes are expected to honour `limit`; enforce it regardless
        let answered = timeout(limit, probe.check(addr, limit))
            .await
            .unwrap_or(false);

        debug!(
            "[PROBE] {} {} attempt {}/{}: {}",
            probe.name(),
            addr,
            attempt,
            policy.max_attempts,
            if answered { "reply" } else { "no reply" }
        );

        if answered {
            fsm.process_event(AttemptEvent::ProbeAnswered);
            return fsm.state();
        }

        if attempt == policy.max_attempts {
            break;
        }

        if Instant::now() + policy.interval >= deadline {
            debug!("[PROBE] Next attempt would start past the deadline");
            break;
        }
        sleep(policy.interval).await;
    }

    fsm.process_event(AttemptEvent::BudgetExhausted);
    fsm.state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wake::testing::{HangingProbe, ScriptedProbe};

    const ADDR: &str = "192.0.2.10";

    fn policy(max_attempts: u32, interval_secs: u64) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(interval_secs),
            max_attempts,
            probe_timeout: Duration::from_secs(1),
            deadline: Duration::from_secs(3600),
        }
    }

    /// Paused clocks land on whole-millisecond timer ticks
    fn assert_elapsed(started: Instant, secs: u64) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_secs(secs) && elapsed < Duration::from_millis(secs * 1000 + 50),
            "elapsed {:?}, expected ~{}s",
            elapsed,
            secs
        );
    }

    fn signalled() -> AttemptStateMachine {
        let mut fsm = AttemptStateMachine::new();
        fsm.process_event(AttemptEvent::SignalSent);
        fsm
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_reply() {
        let probe = ScriptedProbe::new(&[false, true, true]);
        let mut fsm = signalled();

        let state =
            poll_until_online(probe.as_ref(), ADDR.parse().unwrap(), &policy(5, 2), &mut fsm).await;

        assert_eq!(state, AttemptState::Online);
        assert_eq!(probe.calls(), 2);
        assert_eq!(fsm.probes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_exact_budget() {
        let probe = ScriptedProbe::new(&[]);
        let mut fsm = signalled();
        let started = Instant::now();

        let state =
            poll_until_online(probe.as_ref(), ADDR.parse().unwrap(), &policy(4, 2), &mut fsm).await;

        assert_eq!(state, AttemptState::Unreachable);
        assert_eq!(probe.calls(), 4);
        // No sleep after the final probe
        assert_elapsed(started, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cuts_budget_short() {
        let probe = ScriptedProbe::new(&[]);
        let mut fsm = signalled();
        let mut policy = policy(10, 2);
        policy.deadline = Duration::from_secs(5);

        let state = poll_until_online(probe.as_ref(), ADDR.parse().unwrap(), &policy, &mut fsm).await;

        assert_eq!(state, AttemptState::Unreachable);
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_precedes_first_probe() {
        let probe = ScriptedProbe::new(&[true]);
        let mut fsm = signalled();
        let mut policy = policy(1, 2);
        policy.initial_delay = Duration::from_secs(5);
        let started = Instant::now();

        let state = poll_until_online(probe.as_ref(), ADDR.parse().unwrap(), &policy, &mut fsm).await;

        assert_eq!(state, AttemptState::Online);
        assert_elapsed(started, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_is_bounded() {
        let mut fsm = signalled();
        let policy = PollPolicy {
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
            max_attempts: 3,
            probe_timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(60),
        };
        let started = Instant::now();

        let state = poll_until_online(&HangingProbe, ADDR.parse().unwrap(), &policy, &mut fsm).await;

        assert_eq!(state, AttemptState::Unreachable);
        assert_eq!(fsm.probes(), 3);
        // 3 timed-out probes plus 2 intervals
        assert_elapsed(started, 8);
    }
}

//! Wake orchestrator - single-flight send-and-verify protocol

use super::poll::{poll_until_online, PollPolicy};
use super::{WakeOutcome, WakeReport, WakeResult};
use crate::access::{DeviceRegistry, UnknownDevice};
use crate::probe::ReachabilityProbe;
use crate::signal::WakeSignal;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use wakeon_shared::state_machine::{AttemptEvent, AttemptState, AttemptStateMachine};
use wakeon_shared::{now_ms, Device};

type SharedAttempt = Shared<BoxFuture<'static, WakeReport>>;

/// A pending attempt that later requests can join
struct InFlight {
    attempt_id: u64,
    started_at_ms: u64,
    result: SharedAttempt,
}

type InFlightMap = Arc<RwLock<HashMap<String, InFlight>>>;

/// Runs wake attempts, at most one pending per device
pub struct WakeOrchestrator {
    registry: Arc<DeviceRegistry>,
    signal: Arc<dyn WakeSignal>,
    probe: Arc<dyn ReachabilityProbe>,
    policy: PollPolicy,
    attempt_id: AtomicU64,
    /// Pending attempts by device name
    in_flight: InFlightMap,
}

impl WakeOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        registry: Arc<DeviceRegistry>,
        signal: Arc<dyn WakeSignal>,
        probe: Arc<dyn ReachabilityProbe>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            registry,
            signal,
            probe,
            policy,
            attempt_id: AtomicU64::new(0),
            in_flight: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Number of attempts currently pending
    pub async fn in_flight(&self) -> usize {
        self.in_flight.read().await.len()
    }

    /// Wake `name` and wait for the verdict of the attempt it started or joined
    pub async fn request_wake(&self, name: &str) -> WakeResult {
        let device = match self.registry.lookup(name) {
            Ok(device) => device.clone(),
            Err(UnknownDevice(name)) => {
                warn!("[WAKE] Rejected request for unknown device '{}'", name);
                return WakeResult::UnknownDevice(name);
            }
        };

        // Check-then-create under one write lock
        let (result, joined) = {
            let mut in_flight = self.in_flight.write().await;
            match in_flight.get(&device.name) {
                Some(existing) => {
                    info!(
                        "[WAKE] Attempt #{} for {} already pending since {}ms, joining",
                        existing.attempt_id, device.name, existing.started_at_ms
                    );
                    (existing.result.clone(), true)
                }
                None => {
                    let key = device.name.clone();
                    let entry = self.start_attempt(device);
                    let result = entry.result.clone();
                    in_flight.insert(key, entry);
                    (result, false)
                }
            }
        };

        WakeResult::from_report(result.await, joined)
    }

    /// Spawn the attempt and a supervisor that retires it once finished
    ///
    /// Must be called with the in-flight write lock held.
    fn start_attempt(&self, device: Device) -> InFlight {
        let attempt_id = self.attempt_id.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at_ms = now_ms();
        let started = Instant::now();
        let name = device.name.clone();

        info!("[WAKE] Attempt #{} for {} started", attempt_id, name);

        let attempt = tokio::spawn(run_attempt(
            device,
            self.signal.clone(),
            self.probe.clone(),
            self.policy,
        ));

        let in_flight = self.in_flight.clone();
        let supervisor_name = name.clone();
        let supervisor = tokio::spawn(async move {
            let report = match attempt.await {
                Ok(report) => report,
                Err(e) => {
                    error!("[WAKE] Attempt #{} for {} aborted: {}", attempt_id, supervisor_name, e);
                    aborted_report(&supervisor_name, started, &e.to_string())
                }
            };

            let mut in_flight = in_flight.write().await;
            if in_flight
                .get(&supervisor_name)
                .is_some_and(|entry| entry.attempt_id == attempt_id)
            {
                in_flight.remove(&supervisor_name);
            }
            drop(in_flight);

            info!(
                "[WAKE] Attempt #{} for {} finished: {} after {} probe(s) in {:?}",
                attempt_id, supervisor_name, report.outcome, report.probes, report.elapsed
            );
            report
        });

        let result = async move {
            match supervisor.await {
                Ok(report) => report,
                Err(e) => aborted_report(&name, started, &e.to_string()),
            }
        }
        .boxed()
        .shared();

        InFlight {
            attempt_id,
            started_at_ms,
            result,
        }
    }
}

/// Send the signal once, then poll until a verdict
async fn run_attempt(
    device: Device,
    signal: Arc<dyn WakeSignal>,
    probe: Arc<dyn ReachabilityProbe>,
    policy: PollPolicy,
) -> WakeReport {
    let started = Instant::now();
    let mut fsm = AttemptStateMachine::new();

    match signal.send(&device).await {
        Ok(()) => {
            fsm.process_event(AttemptEvent::SignalSent);
            info!(
                "[SIGNAL] WoL packet sent to {} with MAC address {}",
                device.name, device.mac
            );
        }
        Err(e) => {
            error!("[SIGNAL] Failed to send WoL packet to {}: {:#}", device.name, e);
            fsm.process_event(AttemptEvent::SignalFailed {
                reason: format!("{:#}", e),
            });
        }
    }

    if fsm.signal_sent() {
        debug!("[WAKE] Polling {} at {}", device.name, device.ip);
        poll_until_online(probe.as_ref(), device.ip, &policy, &mut fsm).await;
    }

    let outcome = match fsm.state() {
        AttemptState::Online => WakeOutcome::Online,
        AttemptState::Unreachable => WakeOutcome::Unreachable,
        AttemptState::Failed => WakeOutcome::Failed {
            reason: fsm.failure().unwrap_or("wake signal not sent").to_string(),
        },
        AttemptState::Pending => {
            warn!("[WAKE] Attempt for {} ended without a verdict", device.name);
            WakeOutcome::Unreachable
        }
    };

    WakeReport {
        device: device.name,
        outcome,
        probes: fsm.probes(),
        elapsed: started.elapsed(),
    }
}

fn aborted_report(device: &str, started: Instant, reason: &str) -> WakeReport {
    WakeReport {
        device: device.to_string(),
        outcome: WakeOutcome::Failed {
            reason: format!("attempt aborted: {}", reason),
        },
        probes: 0,
        elapsed: started.elapsed(),
    }
}

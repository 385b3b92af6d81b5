//! Wake orchestration
//!
//! This module handles:
//! - Sending the wake signal exactly once per attempt
//! - Polling the device until it answers or the budget runs out
//! - Coalescing concurrent requests for the same device into one attempt
//! - Enforcing authorization at the service boundary

mod orchestrator;
mod poll;
mod service;

pub use orchestrator::WakeOrchestrator;
pub use poll::PollPolicy;
pub use service::WakeService;

use std::fmt;
use std::time::Duration;

/// Terminal outcome of one wake attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    /// Device answered a probe
    Online,
    /// No answer within the polling budget
    Unreachable,
    /// Wake signal could not be transmitted, or the attempt died
    Failed { reason: String },
}

/// What a finished attempt looked like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeReport {
    pub device: String,
    pub outcome: WakeOutcome,
    /// Probes issued during the attempt
    pub probes: u32,
    /// Time from attempt start to verdict
    pub elapsed: Duration,
}

/// Result handed back to a front end for verbatim rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeResult {
    Online(WakeReport),
    Unreachable(WakeReport),
    /// The wake signal could not be sent; not retried within the request
    Failed(WakeReport),
    /// Another request already started this attempt; carries its verdict
    AlreadyInProgress(WakeReport),
    UnknownDevice(String),
    /// Rejected by the authorization gate; deliberately carries no detail
    Unauthorized,
}

impl WakeResult {
    /// Wrap a report, marking callers that joined an existing attempt
    pub fn from_report(report: WakeReport, joined: bool) -> Self {
        if joined {
            return WakeResult::AlreadyInProgress(report);
        }
        match report.outcome {
            WakeOutcome::Online => WakeResult::Online(report),
            WakeOutcome::Unreachable => WakeResult::Unreachable(report),
            WakeOutcome::Failed { .. } => WakeResult::Failed(report),
        }
    }

    /// The attempt report, if an attempt was run or joined
    pub fn report(&self) -> Option<&WakeReport> {
        match self {
            WakeResult::Online(r)
            | WakeResult::Unreachable(r)
            | WakeResult::Failed(r)
            | WakeResult::AlreadyInProgress(r) => Some(r),
            WakeResult::UnknownDevice(_) | WakeResult::Unauthorized => None,
        }
    }

    pub fn outcome(&self) -> Option<&WakeOutcome> {
        self.report().map(|r| &r.outcome)
    }
}

impl fmt::Display for WakeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeOutcome::Online => write!(f, "online"),
            WakeOutcome::Unreachable => write!(f, "unreachable"),
            WakeOutcome::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}

fn render_report(f: &mut fmt::Formatter<'_>, report: &WakeReport) -> fmt::Result {
    match &report.outcome {
        WakeOutcome::Online => write!(f, "The device {} is now online.", report.device),
        WakeOutcome::Unreachable => write!(
            f,
            "Unable to wake up {}. Check the device status and try again.",
            report.device
        ),
        WakeOutcome::Failed { reason } => write!(
            f,
            "Could not send the wake signal to {}: {}",
            report.device, reason
        ),
    }
}

impl fmt::Display for WakeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeResult::Online(r) | WakeResult::Unreachable(r) | WakeResult::Failed(r) => {
                render_report(f, r)
            }
            WakeResult::AlreadyInProgress(r) => {
                write!(f, "A wake for {} was already in progress. ", r.device)?;
                render_report(f, r)
            }
            WakeResult::UnknownDevice(_) => {
                write!(f, "Device not recognized. Please check the device name.")
            }
            WakeResult::Unauthorized => write!(f, "Access denied."),
        }
    }
}

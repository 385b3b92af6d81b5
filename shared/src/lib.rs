//! Wakeon Shared Types
//!
//! This crate provides the device model, the magic packet codec and the
//! wake attempt state machine shared by the orchestrator and its front ends.

pub mod codec;
pub mod state_machine;

use std::fmt;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

pub use codec::{AddressError, MacAddress};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Default parameters for the wake protocol
pub mod defaults {
    use std::net::{IpAddr, Ipv4Addr};

    /// Limited broadcast address used for the magic packet
    pub const BROADCAST_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::BROADCAST);

    /// Discard port, the conventional Wake-on-LAN destination
    pub const WAKE_PORT: u16 = 9;

    /// Delay between sending the wake signal and the first probe
    pub const INITIAL_DELAY_MS: u64 = 5000;

    /// Delay between two consecutive probes
    pub const PROBE_INTERVAL_MS: u64 = 5000;

    /// Number of probes before the device is declared unreachable
    pub const MAX_PROBE_ATTEMPTS: u32 = 6;

    /// Upper bound for a single reachability probe
    pub const PROBE_TIMEOUT_MS: u64 = 2000;

    /// Overall deadline for one wake attempt, measured from the signal
    pub const WAKE_DEADLINE_MS: u64 = 60000;
}

/// A registered device that can be woken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub mac: MacAddress,
    pub ip: IpAddr,
}

impl Device {
    /// Create a new device entry
    pub fn new(name: impl Into<String>, mac: MacAddress, ip: IpAddr) -> Self {
        Self {
            name: name.into(),
            mac,
            ip,
        }
    }
}

/// Opaque identity of an operator as supplied by a front end
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(String);

impl OperatorId {
    /// Wrap an identity verbatim; no normalisation is applied
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for OperatorId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for OperatorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Probe trait abstraction for pluggable reachability checks

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

/// A single bounded liveness check against a network address
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Returns true only on a positive reply within `timeout`
    async fn check(&self, addr: IpAddr, timeout: Duration) -> bool;

    /// Human-readable name for this probe
    fn name(&self) -> &'static str;
}

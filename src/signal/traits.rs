//! Sender trait abstraction for pluggable wake signal backends

use anyhow::Result;
use async_trait::async_trait;
use wakeon_shared::Device;

/// Fire-and-forget transmission of a wake signal
#[async_trait]
pub trait WakeSignal: Send + Sync {
    /// Transmit the signal once; an error means nothing left this host
    async fn send(&self, device: &Device) -> Result<()>;
}

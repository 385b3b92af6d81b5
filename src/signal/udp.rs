//! UDP broadcast transport for magic packets

use crate::signal::traits::WakeSignal;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;
use wakeon_shared::{codec, defaults, Device};

/// Where magic packets are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalConfig {
    /// Broadcast (or directed broadcast) address
    pub broadcast: IpAddr,
    /// Destination port, usually 7 or 9
    pub port: u16,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            broadcast: defaults::BROADCAST_ADDR,
            port: defaults::WAKE_PORT,
        }
    }
}

impl SignalConfig {
    pub fn target(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast, self.port)
    }
}

/// Sends one magic packet per wake request from an ephemeral socket
pub struct MagicPacketSender {
    config: SignalConfig,
}

impl MagicPacketSender {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

#[async_trait]
impl WakeSignal for MagicPacketSender {
    async fn send(&self, device: &Device) -> Result<()> {
        let target = self.config.target();
        let bind_addr = match target {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind UDP socket on {}", bind_addr))?;

        if target.is_ipv4() {
            socket
                .set_broadcast(true)
                .context("Failed to enable broadcast")?;
        }

        let packet = codec::encode(&device.mac);
        let sent = socket
            .send_to(&packet, target)
            .await
            .with_context(|| format!("Failed to send magic packet to {}", target))?;

        if sent != packet.len() {
            return Err(anyhow!(
                "Short write: {} of {} bytes sent to {}",
                sent,
                packet.len(),
                target
            ));
        }

        debug!(
            "[SIGNAL] Magic packet for {} ({}) sent to {}",
            device.name, device.mac, target
        );
        Ok(())
    }
}

//! TCP connect probe for hosts that filter ICMP

use crate::probe::traits::ReachabilityProbe;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Treats an accepted TCP connection on `port` as proof of life
pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl ReachabilityProbe for TcpProbe {
    async fn check(&self, addr: IpAddr, limit: Duration) -> bool {
        let target = SocketAddr::new(addr, self.port);

        match timeout(limit, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("[PROBE] connect {} failed: {}", target, e);
                false
            }
            Err(_) => {
                debug!("[PROBE] connect {} timed out after {:?}", target, limit);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "TCP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new(port);
        assert!(probe.check("127.0.0.1".parse().unwrap(), Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        // Grab a free port, then release it
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let probe = TcpProbe::new(port);
        assert!(!probe.check("127.0.0.1".parse().unwrap(), Duration::from_secs(2)).await);
        assert_eq!(probe.name(), "TCP");
    }
}

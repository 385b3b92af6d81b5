//! ICMP echo probe backed by the system `ping` utility
//!
//! Raw ICMP sockets need elevated privileges, the setuid `ping` binary
//! does not. One echo request is sent per check.

use crate::probe::traits::ReachabilityProbe;
use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const DEFAULT_PROGRAM: &str = "ping";

/// Runs `ping` for a single echo request
pub struct PingProbe {
    program: String,
}

impl PingProbe {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a specific executable instead of `ping` from `PATH`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable to run for `addr`
    ///
    /// macOS `ping` rejects IPv6 literals; its IPv6 echo lives in `ping6`.
    /// An explicitly chosen program is always used as is.
    pub fn program_for(&self, addr: IpAddr) -> &str {
        if cfg!(target_os = "macos") && addr.is_ipv6() && self.program == DEFAULT_PROGRAM {
            "ping6"
        } else {
            &self.program
        }
    }

    /// Platform-specific arguments for one echo request bounded by `timeout`
    pub fn args(addr: IpAddr, timeout: Duration) -> Vec<String> {
        let secs = timeout.as_secs_f64().ceil().max(1.0) as u64;

        if cfg!(windows) {
            vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                timeout.as_millis().max(1).to_string(),
                addr.to_string(),
            ]
        } else if cfg!(target_os = "macos") && addr.is_ipv6() {
            // `ping6` has no overall timeout flag; the caller's timeout bounds it
            vec!["-c".into(), "1".into(), addr.to_string()]
        } else if cfg!(target_os = "macos") {
            vec!["-c".into(), "1".into(), "-t".into(), secs.to_string(), addr.to_string()]
        } else {
            vec!["-c".into(), "1".into(), "-W".into(), secs.to_string(), addr.to_string()]
        }
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReachabilityProbe for PingProbe {
    async fn check(&self, addr: IpAddr, timeout: Duration) -> bool {
        let program = self.program_for(addr);
        let mut child = match Command::new(program)
            .args(Self::args(addr, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!("[PROBE] Failed to spawn {}: {}", program, e);
                return false;
            }
        };

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("[PROBE] ping {} exited with {}", addr, status);
                status.success()
            }
            Ok(Err(e)) => {
                debug!("[PROBE] ping {} failed: {}", addr, e);
                false
            }
            Err(_) => {
                debug!("[PROBE] ping {} timed out after {:?}", addr, timeout);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "ICMP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_ping_args() {
        let args = PingProbe::args("192.0.2.10".parse().unwrap(), Duration::from_millis(1500));
        assert_eq!(args, vec!["-c", "1", "-W", "2", "192.0.2.10"]);

        // Sub-second timeouts still wait at least one second
        let args = PingProbe::args("2001:db8::1".parse().unwrap(), Duration::from_millis(100));
        assert_eq!(args, vec!["-c", "1", "-W", "1", "2001:db8::1"]);
    }

    #[test]
    #[cfg(target_os = "macos")]
    fn test_ping_args_macos() {
        let args = PingProbe::args("192.0.2.10".parse().unwrap(), Duration::from_millis(1500));
        assert_eq!(args, vec!["-c", "1", "-t", "2", "192.0.2.10"]);

        let args = PingProbe::args("2001:db8::1".parse().unwrap(), Duration::from_millis(1500));
        assert_eq!(args, vec!["-c", "1", "2001:db8::1"]);
    }

    #[test]
    fn test_program_for_address_family() {
        let probe = PingProbe::new();
        let v4: IpAddr = "192.0.2.10".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert_eq!(probe.program_for(v4), "ping");
        if cfg!(target_os = "macos") {
            assert_eq!(probe.program_for(v6), "ping6");
        } else {
            assert_eq!(probe.program_for(v6), "ping");
        }

        let custom = PingProbe::with_program("/opt/bin/fping");
        assert_eq!(custom.program_for(v6), "/opt/bin/fping");
    }

    #[tokio::test]
    async fn test_missing_program_is_unreachable() {
        let probe = PingProbe::with_program("/nonexistent/wakeon-ping");
        let up = probe
            .check("127.0.0.1".parse().unwrap(), Duration::from_millis(200))
            .await;
        assert!(!up);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_exit_status_decides() {
        let addr: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(PingProbe::with_program("true").check(addr, Duration::from_secs(2)).await);
        assert!(!PingProbe::with_program("false").check(addr, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_slow_program_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let script = std::env::temp_dir().join(format!("wakeon-slow-ping-{}", std::process::id()));
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let probe = PingProbe::with_program(script.to_string_lossy());
        let started = std::time::Instant::now();
        let up = probe
            .check("127.0.0.1".parse().unwrap(), Duration::from_millis(100))
            .await;

        assert!(!up);
        assert!(started.elapsed() < Duration::from_secs(4));
        let _ = std::fs::remove_file(&script);
    }
}

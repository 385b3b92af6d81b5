//! Startup configuration
//!
//! Loaded once from a TOML file and turned into immutable values. Every
//! malformed entry is rejected here, never later during a wake request.
//!
//! ```toml
//! authorized_operators = [123456789, "ops-team"]
//!
//! [signal]
//! broadcast = "192.168.1.255"
//! port = 9
//!
//! [polling]
//! initial_delay_ms = 5000
//! interval_ms = 5000
//! max_attempts = 6
//! probe_timeout_ms = 2000
//! deadline_ms = 60000
//!
//! [probe]
//! kind = "ping"        # or: kind = "tcp", port = 22
//!
//! [[devices]]
//! name = "pc_home"
//! mac = "AA:BB:CC:DD:EE:FF"
//! ip = "192.168.1.10"
//! ```
//!
//! `AUTHORIZED_USERS` (comma-separated) replaces `authorized_operators`
//! when set.

use crate::access::{AuthorizationGate, DeviceRegistry, RegistryError};
use crate::probe::{PingProbe, ReachabilityProbe, TcpProbe};
use crate::signal::SignalConfig;
use crate::wake::PollPolicy;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use wakeon_shared::{defaults, Device, MacAddress, OperatorId};

/// Environment variable overriding the operator list
pub const AUTHORIZED_USERS_ENV: &str = "AUTHORIZED_USERS";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Operator identities may be written as integers or strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawOperator {
    Id(i64),
    Name(String),
}

impl From<RawOperator> for OperatorId {
    fn from(raw: RawOperator) -> Self {
        match raw {
            RawOperator::Id(id) => OperatorId::from(id),
            RawOperator::Name(name) => OperatorId::new(name.trim()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    authorized_operators: Vec<RawOperator>,
    #[serde(default)]
    signal: SignalSection,
    #[serde(default)]
    polling: PollingSection,
    #[serde(default)]
    probe: ProbeKind,
    #[serde(default)]
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SignalSection {
    broadcast: String,
    port: u16,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            broadcast: defaults::BROADCAST_ADDR.to_string(),
            port: defaults::WAKE_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PollingSection {
    initial_delay_ms: u64,
    interval_ms: u64,
    max_attempts: u32,
    probe_timeout_ms: u64,
    deadline_ms: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: defaults::INITIAL_DELAY_MS,
            interval_ms: defaults::PROBE_INTERVAL_MS,
            max_attempts: defaults::MAX_PROBE_ATTEMPTS,
            probe_timeout_ms: defaults::PROBE_TIMEOUT_MS,
            deadline_ms: defaults::WAKE_DEADLINE_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceEntry {
    name: String,
    mac: String,
    ip: String,
}

/// Which reachability probe to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeKind {
    /// ICMP echo through the system `ping`
    #[default]
    Ping,
    /// TCP connect to a port the device listens on
    Tcp { port: u16 },
}

impl ProbeKind {
    pub fn build(&self) -> Arc<dyn ReachabilityProbe> {
        match *self {
            ProbeKind::Ping => Arc::new(PingProbe::new()),
            ProbeKind::Tcp { port } => Arc::new(TcpProbe::new(port)),
        }
    }
}

/// Validated, immutable configuration
#[derive(Debug, Clone)]
pub struct WakeonConfig {
    pub registry: DeviceRegistry,
    pub gate: AuthorizationGate,
    pub policy: PollPolicy,
    pub signal: SignalConfig,
    pub probe: ProbeKind,
}

impl WakeonConfig {
    /// Load from a TOML file, honouring `AUTHORIZED_USERS`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path_str,
                source,
            })?;

        let env_operators = std::env::var(AUTHORIZED_USERS_ENV).ok();
        let config = Self::parse(&content, env_operators.as_deref())?;

        info!(
            "Configuration loaded: {} device(s), {} operator(s)",
            config.registry.len(),
            config.gate.len()
        );
        Ok(config)
    }

    /// Parse from a string; `env_operators` stands in for `AUTHORIZED_USERS`
    pub fn parse(content: &str, env_operators: Option<&str>) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content)?;

        let operators: Vec<OperatorId> = match env_operators {
            Some(list) => parse_operator_list(list)?,
            None => file
                .authorized_operators
                .into_iter()
                .map(OperatorId::from)
                .collect(),
        };
        if operators.iter().any(|id| id.as_str().is_empty()) {
            return Err(ConfigError::invalid(
                "authorized_operators",
                "operator identities must not be empty",
            ));
        }
        let gate = AuthorizationGate::new(operators);
        if gate.is_empty() {
            return Err(ConfigError::invalid(
                "authorized_operators",
                "at least one operator is required",
            ));
        }

        let registry = build_registry(file.devices)?;
        let policy = build_policy(&file.polling)?;
        let signal = build_signal(&file.signal)?;

        if let ProbeKind::Tcp { port: 0 } = file.probe {
            return Err(ConfigError::invalid("probe.port", "must be non-zero"));
        }

        Ok(Self {
            registry,
            gate,
            policy,
            signal,
            probe: file.probe,
        })
    }
}

fn parse_operator_list(list: &str) -> Result<Vec<OperatorId>, ConfigError> {
    let operators: Vec<OperatorId> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OperatorId::new)
        .collect();

    if operators.is_empty() {
        return Err(ConfigError::invalid(
            AUTHORIZED_USERS_ENV,
            "no operator identities listed",
        ));
    }
    Ok(operators)
}

fn build_registry(entries: Vec<DeviceEntry>) -> Result<DeviceRegistry, ConfigError> {
    let mut devices = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let mac = MacAddress::parse(&entry.mac)
            .map_err(|e| ConfigError::invalid(format!("devices[{i}].mac"), e.to_string()))?;
        let ip: IpAddr = entry.ip.trim().parse().map_err(|_| {
            ConfigError::invalid(
                format!("devices[{i}].ip"),
                format!("'{}' is not an IPv4 or IPv6 address", entry.ip),
            )
        })?;
        devices.push(Device::new(entry.name, mac, ip));
    }

    let registry = DeviceRegistry::new(devices)
        .map_err(|e: RegistryError| ConfigError::invalid("devices.name", e.to_string()))?;
    if registry.is_empty() {
        return Err(ConfigError::invalid("devices", "at least one device is required"));
    }
    Ok(registry)
}

fn build_policy(polling: &PollingSection) -> Result<PollPolicy, ConfigError> {
    if polling.max_attempts == 0 {
        return Err(ConfigError::invalid("polling.max_attempts", "must be at least 1"));
    }
    if polling.probe_timeout_ms == 0 {
        return Err(ConfigError::invalid("polling.probe_timeout_ms", "must be non-zero"));
    }
    if polling.deadline_ms <= polling.initial_delay_ms {
        return Err(ConfigError::invalid(
            "polling.deadline_ms",
            "must be longer than initial_delay_ms so at least one probe can run",
        ));
    }

    Ok(PollPolicy {
        initial_delay: Duration::from_millis(polling.initial_delay_ms),
        interval: Duration::from_millis(polling.interval_ms),
        max_attempts: polling.max_attempts,
        probe_timeout: Duration::from_millis(polling.probe_timeout_ms),
        deadline: Duration::from_millis(polling.deadline_ms),
    })
}

fn build_signal(signal: &SignalSection) -> Result<SignalConfig, ConfigError> {
    let broadcast: IpAddr = signal.broadcast.trim().parse().map_err(|_| {
        ConfigError::invalid(
            "signal.broadcast",
            format!("'{}' is not an IP address", signal.broadcast),
        )
    })?;
    if signal.port == 0 {
        return Err(ConfigError::invalid("signal.port", "must be non-zero"));
    }

    Ok(SignalConfig {
        broadcast,
        port: signal.port,
    })
}

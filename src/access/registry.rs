//! Device registry - immutable name to address lookup table

use std::collections::HashMap;
use thiserror::Error;
use wakeon_shared::Device;

/// Lookup failure for a name that is not registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown device: {0}")]
pub struct UnknownDevice(pub String);

/// Errors raised while building the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Device name must not be empty")]
    EmptyName,

    #[error("Duplicate device name: {0}")]
    DuplicateName(String),
}

/// Known devices, in the order they were configured
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
}

impl DeviceRegistry {
    /// Build a registry; names must be non-empty and unique
    pub fn new(devices: Vec<Device>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(devices.len());

        for (pos, device) in devices.iter().enumerate() {
            if device.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if index.insert(device.name.clone(), pos).is_some() {
                return Err(RegistryError::DuplicateName(device.name.clone()));
            }
        }

        Ok(Self { devices, index })
    }

    /// Case-sensitive exact lookup
    pub fn lookup(&self, name: &str) -> Result<&Device, UnknownDevice> {
        self.index
            .get(name)
            .map(|&pos| &self.devices[pos])
            .ok_or_else(|| UnknownDevice(name.to_string()))
    }

    /// Device names in configuration order
    pub fn list_names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

//! Read-only access tables built once at startup
//!
//! This module handles:
//! - Resolving device names to their hardware and network addresses
//! - Deciding whether an operator may issue wake requests

mod gate;
mod registry;

pub use gate::AuthorizationGate;
pub use registry::{DeviceRegistry, RegistryError, UnknownDevice};

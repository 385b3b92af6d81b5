//! Wake signal transmission
//!
//! This module handles:
//! - Building the magic packet for a device
//! - Broadcasting it on the local segment

pub mod traits;
pub mod udp;

pub use traits::WakeSignal;
pub use udp::{MagicPacketSender, SignalConfig};

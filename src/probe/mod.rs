//! Reachability probes used to confirm a device came online
//!
//! Every probe collapses its failure modes into a negative answer so a
//! misbehaving network never surfaces as an error to the orchestrator.

pub mod ping;
pub mod tcp;
pub mod traits;

pub use ping::PingProbe;
pub use tcp::TcpProbe;
pub use traits::ReachabilityProbe;

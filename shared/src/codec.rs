//! Hardware address parsing and magic packet codec
//!
//! A magic packet is framed as:
//! ```text
//! [ 6 bytes: 0xFF sync stream ][ 16 x 6 bytes: target MAC address ]
//! ```
//!
//! It is sent as the payload of a single UDP broadcast datagram.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of a hardware address in bytes
pub const MAC_LEN: usize = 6;

/// Number of times the MAC address is repeated in a magic packet
pub const MAC_REPETITIONS: usize = 16;

/// Total magic packet size (102 bytes)
pub const MAGIC_PACKET_LEN: usize = MAC_LEN + MAC_LEN * MAC_REPETITIONS;

/// Errors that can occur while parsing addresses or packets
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid hardware address '{0}': expected six hex pairs separated by ':' or '-'")]
    InvalidMac(String),

    #[error("Invalid magic packet length: {0} bytes (expected {MAGIC_PACKET_LEN})")]
    InvalidLength(usize),

    #[error("Magic packet is missing the 0xFF sync stream")]
    MissingSync,

    #[error("Magic packet repetition {0} does not match the target address")]
    InconsistentTarget(usize),
}

/// A 48-bit link-layer hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; MAC_LEN]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }

    /// Parse a colon- or hyphen-delimited address such as `AA:BB:CC:DD:EE:FF`
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let text = text.trim();
        let invalid = || AddressError::InvalidMac(text.to_string());

        let separator = match (text.contains(':'), text.contains('-')) {
            (true, false) => ':',
            (false, true) => '-',
            _ => return Err(invalid()),
        };

        let mut octets = [0u8; MAC_LEN];
        let mut groups = text.split(separator);

        for octet in octets.iter_mut() {
            let group = groups.next().ok_or_else(invalid)?;
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        if groups.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }

    pub fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Encode the magic packet that wakes `mac`
pub fn encode(mac: &MacAddress) -> Bytes {
    let mut buf = BytesMut::with_capacity(MAGIC_PACKET_LEN);

    // Sync stream
    buf.put_bytes(0xFF, MAC_LEN);

    for _ in 0..MAC_REPETITIONS {
        buf.put_slice(&mac.0);
    }

    buf.freeze()
}

/// Validate a magic packet and return the address it targets
pub fn decode(buf: &[u8]) -> Result<MacAddress, AddressError> {
    if buf.len() != MAGIC_PACKET_LEN {
        return Err(AddressError::InvalidLength(buf.len()));
    }

    let (sync, body) = buf.split_at(MAC_LEN);
    if sync.iter().any(|&b| b != 0xFF) {
        return Err(AddressError::MissingSync);
    }

    let mut target = [0u8; MAC_LEN];
    target.copy_from_slice(&body[..MAC_LEN]);

    for (index, chunk) in body.chunks_exact(MAC_LEN).enumerate() {
        if chunk != target {
            return Err(AddressError::InconsistentTarget(index));
        }
    }

    Ok(MacAddress(target))
}

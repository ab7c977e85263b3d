//! 128-bit Bluetooth UUIDs
//!
//! SIG-assigned 16-bit UUIDs live on the Bluetooth base UUID. Vendor services
//! register their own 128-bit base and derive their 16-bit UUIDs from it.

use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 128-bit Bluetooth UUID, stored little-endian.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    bytes: [u8; 16],
}

/// "00000000-0000-1000-8000-00805F9B34FB" in little-endian order.
const BLUETOOTH_BASE_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Offset of the 16-bit alias within the little-endian bytes.
const SHORT_OFFSET: usize = 12;

impl Uuid {
    /// Creates a UUID from 16 little-endian bytes.
    pub const fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Uuid { bytes }
    }

    /// Creates a UUID from 16 big-endian bytes (the textual order).
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid { bytes }
    }

    /// Creates a SIG-assigned UUID from its 16-bit alias.
    pub const fn from_u16(uuid16: u16) -> Self {
        Uuid::from_bytes_le(BLUETOOTH_BASE_BYTES).with_short(uuid16)
    }

    /// Returns this UUID with bytes 12..14 replaced by `uuid16`.
    ///
    /// This is how a vendor base turns into a concrete 16-bit UUID:
    /// base `7b7e0000-...` plus `0x1570` gives `7b7e1570-...`.
    pub const fn with_short(self, uuid16: u16) -> Self {
        let mut bytes = self.bytes;
        bytes[SHORT_OFFSET] = uuid16 as u8;
        bytes[SHORT_OFFSET + 1] = (uuid16 >> 8) as u8;
        Uuid { bytes }
    }

    /// The 16-bit alias held at bytes 12..14, regardless of the base.
    pub fn short(&self) -> u16 {
        u16::from_le_bytes([self.bytes[SHORT_OFFSET], self.bytes[SHORT_OFFSET + 1]])
    }

    /// Returns the base of this UUID, with the 16-bit alias zeroed.
    pub fn base(&self) -> Self {
        self.with_short(0)
    }

    /// Generates a random (version 4) UUID, usable as a vendor base.
    pub fn new_random_v4() -> Self {
        let mut bytes_be = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes_be);

        bytes_be[6] = (bytes_be[6] & 0x0F) | 0x40;
        bytes_be[8] = (bytes_be[8] & 0x3F) | 0x80;

        Uuid::from_bytes_be(bytes_be)
    }

    /// Returns the underlying bytes in little-endian order.
    pub const fn as_bytes_le(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// Returns the underlying bytes in big-endian order.
    pub fn as_bytes_be(&self) -> [u8; 16] {
        let mut bytes = self.bytes;
        bytes.reverse();
        bytes
    }

    fn is_sig_assigned(&self) -> bool {
        self.bytes[..SHORT_OFFSET] == BLUETOOTH_BASE_BYTES[..SHORT_OFFSET]
            && self.bytes[SHORT_OFFSET + 2..] == [0, 0]
    }

    /// The 16-bit alias if this is a SIG-assigned UUID.
    pub fn as_u16(&self) -> Option<u16> {
        self.is_sig_assigned().then(|| self.short())
    }
}

impl From<u16> for Uuid {
    fn from(uuid16: u16) -> Self {
        Uuid::from_u16(uuid16)
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.as_bytes_be();
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16])
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u16() {
            Some(short) => write!(f, "Uuid(0x{:04X})", short),
            None => write!(f, "Uuid({})", self),
        }
    }
}

/// Errors returned when parsing a UUID from text
#[derive(Debug, Error, PartialEq)]
pub enum UuidParseError {
    #[error("UUID must have 4 or 32 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("Invalid UUID hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Accepts a 16-bit alias ("180A") or a full UUID with or without hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();

        match cleaned.len() {
            4 => {
                let mut short = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut short)?;
                Ok(Uuid::from_u16(u16::from_be_bytes(short)))
            }
            32 => {
                let mut bytes_be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes_be)?;
                Ok(Uuid::from_bytes_be(bytes_be))
            }
            len => Err(UuidParseError::InvalidLength(len)),
        }
    }
}

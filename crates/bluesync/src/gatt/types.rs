//! Common types for GATT registration
//!
//! Handles handed out by the registry are newtypes so that a connection
//! handle can never be passed where an attribute handle is expected.

use crate::att::AttPermissions;
use bitflags::bitflags;
use std::fmt;

/// Handle of a link, as assigned by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnHandle(pub u16);

/// Handle of a single attribute in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttHandle(pub u16);

/// Handle of a service declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceHandle(pub u16);

/// Index of a UUID base known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UuidType(pub u8);

impl UuidType {
    /// The Bluetooth SIG base, always present
    pub const SIG: UuidType = UuidType(1);
    /// First index handed out for vendor bases
    pub const VENDOR_BEGIN: UuidType = UuidType(2);
}

impl fmt::Display for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl fmt::Display for AttHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// A 16-bit UUID relative to a registered base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VendorUuid {
    pub uuid_type: UuidType,
    pub uuid16: u16,
}

impl VendorUuid {
    pub fn new(uuid_type: UuidType, uuid16: u16) -> Self {
        Self { uuid_type, uuid16 }
    }
}

/// Service declaration type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Primary,
    Secondary,
}

bitflags! {
    /// Characteristic properties as carried in the characteristic declaration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicProperties: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

impl CharacteristicProperties {
    /// Whether the characteristic needs a Client Characteristic Configuration descriptor
    pub fn needs_cccd(&self) -> bool {
        self.intersects(Self::NOTIFY | Self::INDICATE)
    }
}

/// Everything the registry needs to add one characteristic
#[derive(Debug, Clone)]
pub struct CharacteristicSpec {
    pub uuid: VendorUuid,
    pub properties: CharacteristicProperties,
    /// Access permissions of the value attribute
    pub permissions: AttPermissions,
    /// Maximum length of the value in bytes
    pub max_len: u16,
    pub initial_value: Vec<u8>,
}

/// Handles produced when a characteristic is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharHandles {
    pub value_handle: AttHandle,
    /// Present only for notify or indicate characteristics
    pub cccd_handle: Option<AttHandle>,
}

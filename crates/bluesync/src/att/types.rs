//! Attribute permissions

use super::constants::*;
use bitflags::bitflags;

bitflags! {
    /// Access permissions of a single attribute
    ///
    /// Only open access and no access are modelled; link-level security
    /// requirements are left to the transport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttPermissions: u16 {
        const READ = ATT_PERM_READ;
        const WRITE = ATT_PERM_WRITE;
    }
}

impl AttPermissions {
    /// Neither read nor write allowed
    pub fn no_access() -> Self {
        Self::from_bits_retain(ATT_PERM_NONE)
    }

    pub fn read_only() -> Self {
        Self::READ
    }

    pub fn write_only() -> Self {
        Self::WRITE
    }

    pub fn read_write() -> Self {
        Self::READ | Self::WRITE
    }

    pub fn can_read(&self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(&self) -> bool {
        self.contains(Self::WRITE)
    }
}

//! GATT (Generic Attribute Profile) server side
//!
//! The attribute registry seam that services are registered on, and an
//! in-memory registry implementing it.

pub mod database;
pub mod registry;
pub mod types;

pub use database::{MemoryRegistry, Notification};
pub use registry::AttributeRegistry;
pub use types::{
    AttHandle, CharHandles, CharacteristicProperties, CharacteristicSpec, ConnHandle,
    ServiceHandle, ServiceKind, UuidType, VendorUuid,
};

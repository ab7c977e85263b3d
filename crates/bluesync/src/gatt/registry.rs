//! The attribute registry seam
//!
//! A service configures itself on a registry once at startup and, at
//! runtime, asks it for CCCD state and to push notifications. Inbound
//! connect / write / disconnect signals travel the other way as
//! [`BleEvent`](crate::event::BleEvent)s.

use super::types::{
    AttHandle, CharHandles, CharacteristicSpec, ConnHandle, ServiceHandle, ServiceKind, UuidType,
    VendorUuid,
};
use crate::att::AttResult;
use crate::uuid::Uuid;

pub trait AttributeRegistry {
    /// Register a 128-bit vendor base and return the index for its 16-bit UUIDs
    fn add_vendor_uuid(&self, base: Uuid) -> AttResult<UuidType>;

    fn register_service(&self, kind: ServiceKind, uuid: VendorUuid) -> AttResult<ServiceHandle>;

    /// Add a characteristic, plus its CCCD when it can notify or indicate
    fn register_characteristic(
        &self,
        service: ServiceHandle,
        spec: &CharacteristicSpec,
    ) -> AttResult<CharHandles>;

    /// Read the CCCD value the given connection has written
    fn read_cccd_value(&self, conn_handle: ConnHandle, cccd_handle: AttHandle)
        -> AttResult<Vec<u8>>;

    /// Send a notification of `value` on `value_handle`
    fn notify(&self, conn_handle: ConnHandle, value_handle: AttHandle, value: &[u8])
        -> AttResult<()>;
}

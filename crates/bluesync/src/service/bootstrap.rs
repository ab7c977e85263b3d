//! One-time registration of the data sync service

use super::{
    ConnectionTracker, DataSyncService, ServiceHandles, DATA_SYNC_CTRL_PT_UUID,
    DATA_SYNC_REV_CHAR_UUID, DATA_SYNC_SERVICE_UUID,
};
use crate::att::{AttError, AttPermissions};
use crate::codec::MAX_NOTIF_BUFFER_LEN;
use crate::config::DataSyncConfig;
use crate::error::{DataSyncError, DataSyncResult};
use crate::gatt::{
    AttributeRegistry, CharHandles, CharacteristicProperties, CharacteristicSpec, ServiceHandle,
    ServiceKind, UuidType, VendorUuid,
};
use log::{error, info};
use std::sync::Arc;

impl<R: AttributeRegistry> DataSyncService<R> {
    /// Create a service that is not yet registered
    pub fn new(registry: Arc<R>, config: DataSyncConfig) -> Self {
        Self {
            registry,
            config,
            handles: None,
            connection: ConnectionTracker::new(),
            initialized: false,
            notif_buffer: [0; MAX_NOTIF_BUFFER_LEN],
        }
    }

    /// Register the service and its characteristics
    ///
    /// Any failure is a startup error: a partially registered service is
    /// unusable, and the service stays uninitialized.
    pub fn init(&mut self) -> DataSyncResult<ServiceHandles> {
        if self.initialized {
            return Err(DataSyncError::InvalidState);
        }

        let handles = self.register().map_err(|err| {
            error!("Data sync service registration failed: {}", err);
            err
        })?;

        self.handles = Some(handles);
        self.initialized = true;
        info!(
            "Data sync service ready: revision 0x{:04x}, control point {}",
            self.config.revision, handles.control_point.value_handle
        );

        Ok(handles)
    }

    fn register(&self) -> DataSyncResult<ServiceHandles> {
        let uuid_type = self
            .registry
            .add_vendor_uuid(self.config.base_uuid)
            .map_err(DataSyncError::Registration)?;

        let service_handle = self
            .registry
            .register_service(
                ServiceKind::Primary,
                VendorUuid::new(uuid_type, DATA_SYNC_SERVICE_UUID),
            )
            .map_err(DataSyncError::Registration)?;

        let revision = self.add_revision_char(service_handle, uuid_type)?;
        let control_point = self.add_control_point_char(service_handle, uuid_type)?;

        Ok(ServiceHandles {
            uuid_type,
            service_handle,
            revision,
            control_point,
        })
    }

    fn add_revision_char(
        &self,
        service_handle: ServiceHandle,
        uuid_type: UuidType,
    ) -> DataSyncResult<CharHandles> {
        let value = self.config.revision.to_le_bytes().to_vec();
        let spec = CharacteristicSpec {
            uuid: VendorUuid::new(uuid_type, DATA_SYNC_REV_CHAR_UUID),
            properties: CharacteristicProperties::READ,
            permissions: AttPermissions::read_only(),
            max_len: value.len() as u16,
            initial_value: value,
        };

        self.registry
            .register_characteristic(service_handle, &spec)
            .map_err(DataSyncError::Registration)
    }

    fn add_control_point_char(
        &self,
        service_handle: ServiceHandle,
        uuid_type: UuidType,
    ) -> DataSyncResult<CharHandles> {
        let spec = CharacteristicSpec {
            uuid: VendorUuid::new(uuid_type, DATA_SYNC_CTRL_PT_UUID),
            properties: CharacteristicProperties::WRITE | CharacteristicProperties::NOTIFY,
            permissions: AttPermissions::write_only(),
            max_len: self.config.control_point_max_len,
            initial_value: Vec::new(),
        };

        let handles = self
            .registry
            .register_characteristic(service_handle, &spec)
            .map_err(DataSyncError::Registration)?;

        // Without a CCCD the peer can never subscribe
        if handles.cccd_handle.is_none() {
            return Err(DataSyncError::Registration(AttError::InvalidState));
        }

        Ok(handles)
    }
}

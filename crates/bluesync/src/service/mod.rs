//! Data sync service
//!
//! A vendor GATT service with two characteristics: a read-only data layout
//! revision and a write/notify control point. A peer that has enabled
//! notifications on the control point writes a command frame; the service
//! answers with a three byte response notification.
//!
//! Events must reach a service one at a time. Hosts that deliver them from
//! several threads wrap the service with [`DataSyncService::into_shared`].

mod bootstrap;
mod connection;
mod control_point;
mod gate;

#[cfg(test)]
mod tests;

pub use connection::{ConnectionState, ConnectionTracker};

use crate::codec::{Procedure, ResponseValue, MAX_NOTIF_BUFFER_LEN};
use crate::config::DataSyncConfig;
use crate::error::{DataSyncError, DataSyncResult};
use crate::event::BleEvent;
use crate::gatt::{AttributeRegistry, CharHandles, ConnHandle, ServiceHandle, UuidType};
use std::sync::{Arc, Mutex};

pub const DATA_SYNC_SERVICE_UUID: u16 = 0x1570;
/// Reserved for the packet transfer characteristic
pub const DATA_SYNC_PKT_CHAR_UUID: u16 = 0x1571;
pub const DATA_SYNC_CTRL_PT_UUID: u16 = 0x1572;
/// Reserved for the status report characteristic
pub const DATA_SYNC_STATUS_REP_UUID: u16 = 0x1573;
pub const DATA_SYNC_REV_CHAR_UUID: u16 = 0x1574;

/// Registry handles recorded when the service is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHandles {
    pub uuid_type: UuidType,
    pub service_handle: ServiceHandle,
    pub revision: CharHandles,
    pub control_point: CharHandles,
}

/// The data sync service instance
pub struct DataSyncService<R> {
    registry: Arc<R>,
    config: DataSyncConfig,
    handles: Option<ServiceHandles>,
    connection: ConnectionTracker,
    /// Set once `init` has registered everything; never cleared
    initialized: bool,
    notif_buffer: [u8; MAX_NOTIF_BUFFER_LEN],
}

/// A service shared between threads that deliver events
pub type SharedDataSyncService<R> = Arc<Mutex<DataSyncService<R>>>;

impl<R: AttributeRegistry> DataSyncService<R> {
    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn config(&self) -> &DataSyncConfig {
        &self.config
    }

    /// Registry handles, once initialized
    pub fn handles(&self) -> Option<ServiceHandles> {
        self.handles
    }

    pub fn revision(&self) -> u16 {
        self.config.revision
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn conn_handle(&self) -> Option<ConnHandle> {
        self.connection.conn_handle()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn into_shared(self) -> SharedDataSyncService<R> {
        Arc::new(Mutex::new(self))
    }

    fn report_error(&self, error: &DataSyncError) {
        if let Some(handler) = &self.config.error_handler {
            handler(error);
        }
    }
}

/// Dispatch an event to a service the host may not have created yet
pub fn on_ble_evt<R: AttributeRegistry>(service: Option<&mut DataSyncService<R>>, event: &BleEvent) {
    if let Some(service) = service {
        service.on_ble_evt(event);
    }
}

/// Send a response through a service the host may not have created yet
pub fn response_send<R: AttributeRegistry>(
    service: Option<&mut DataSyncService<R>>,
    procedure: Procedure,
    result: ResponseValue,
) -> DataSyncResult<()> {
    service
        .ok_or(DataSyncError::NullService)?
        .send_response(procedure, result)
}

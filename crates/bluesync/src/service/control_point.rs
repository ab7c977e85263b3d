//! Control point state machine

use super::DataSyncService;
use crate::codec::{decode_header, encode_response_into, Command, Procedure, ResponseValue};
use crate::error::{DataSyncError, DataSyncResult};
use crate::event::BleEvent;
use crate::gatt::{AttHandle, AttributeRegistry};
use log::{debug, trace, warn};

impl<R: AttributeRegistry> DataSyncService<R> {
    /// Handle an event delivered by the transport
    pub fn on_ble_evt(&mut self, event: &BleEvent) {
        match event {
            BleEvent::Connected { conn_handle } => self.connection.on_connect(*conn_handle),
            BleEvent::Written { handle, data, .. } => self.handle_write(*handle, data),
            BleEvent::Disconnected { conn_handle, reason } => {
                trace!("Disconnect of {} with reason 0x{:02x}", conn_handle, reason);
                self.connection.on_disconnect();
            }
        }
    }

    /// Handle a peer write to any attribute
    ///
    /// Writes to other attributes, writes from a peer that has not
    /// subscribed to the control point, and unknown commands get no answer.
    pub fn handle_write(&mut self, handle: AttHandle, data: &[u8]) {
        let Some(handles) = self.handles else {
            return;
        };
        if handle != handles.control_point.value_handle {
            return;
        }

        if !self.is_subscribed() {
            debug!("Control point write dropped: notifications not enabled");
            return;
        }

        let header = match decode_header(data) {
            Ok(header) => header,
            Err(_) => {
                debug!("Empty control point write ignored");
                return;
            }
        };

        match Command::from_header(header) {
            Command::BeginInit => {
                if let Err(err) = self.send_response(Procedure::Init, ResponseValue::Success) {
                    warn!("Failed to answer init request: {}", err);
                }
            }
            Command::Unknown(header) => {
                debug!("Unknown control point command 0x{:02x} ignored", header);
            }
        }
    }

    /// Notify the connected peer of a procedure result
    pub fn send_response(
        &mut self,
        procedure: Procedure,
        result: ResponseValue,
    ) -> DataSyncResult<()> {
        let (conn_handle, handles) = match (self.connection.conn_handle(), self.handles) {
            (Some(conn_handle), Some(handles)) if self.initialized => (conn_handle, handles),
            _ => return Err(DataSyncError::InvalidState),
        };

        let len = encode_response_into(&mut self.notif_buffer, procedure, result);
        trace!("Response {:?}/{:?} to {}", procedure, result, conn_handle);

        self.registry
            .notify(
                conn_handle,
                handles.control_point.value_handle,
                &self.notif_buffer[..len],
            )
            .map_err(DataSyncError::Transport)
    }
}

//! Control point subscription check

use super::DataSyncService;
use crate::att::{AttError, AttResult, CCCD_NOTIFICATION};
use crate::error::DataSyncError;
use crate::gatt::AttributeRegistry;
use byteorder::{LittleEndian, ReadBytesExt};
use log::warn;
use std::io::Cursor;

impl<R: AttributeRegistry> DataSyncService<R> {
    /// Whether the tracked peer has enabled control point notifications
    ///
    /// A failed CCCD read counts as "not subscribed" and is passed to the
    /// error handler.
    pub fn is_subscribed(&self) -> bool {
        let Some(cccd_handle) = self.handles.and_then(|h| h.control_point.cccd_handle) else {
            return false;
        };

        let cccd = match self.connection.conn_handle() {
            Some(conn_handle) => self.registry.read_cccd_value(conn_handle, cccd_handle),
            None => Err(AttError::InvalidState),
        };

        match cccd.and_then(|value| notification_enabled(&value)) {
            Ok(enabled) => enabled,
            Err(err) => {
                warn!("Control point CCCD read failed: {}", err);
                self.report_error(&DataSyncError::SubscriptionRead(err));
                false
            }
        }
    }
}

fn notification_enabled(cccd: &[u8]) -> AttResult<bool> {
    let flags = Cursor::new(cccd)
        .read_u16::<LittleEndian>()
        .map_err(|_| AttError::InvalidAttributeValueLength)?;
    Ok(flags & CCCD_NOTIFICATION != 0)
}

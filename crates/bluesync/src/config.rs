//! Data sync service configuration

use crate::att::ATT_DEFAULT_MTU;
use crate::error::DataSyncError;
use crate::uuid::Uuid;
use std::fmt;
use std::sync::Arc;

/// Vendor base the service UUIDs are derived from: 7b7e0000-2f1a-4c0b-9d3e-5a1c4f6b8e21
pub const DEFAULT_BASE_UUID: Uuid = Uuid::from_bytes_le([
    0x21, 0x8E, 0x6B, 0x4F, 0x1C, 0x5A, 0x3E, 0x9D, 0x0B, 0x4C, 0x1A, 0x2F, 0x00, 0x00, 0x7E, 0x7B,
]);

/// Called with errors the service cannot return to anyone
pub type ErrorHandler = Arc<dyn Fn(&DataSyncError) + Send + Sync>;

/// Data sync service configuration
#[derive(Clone)]
pub struct DataSyncConfig {
    /// Data layout revision exposed to the peer
    pub revision: u16,
    /// 128-bit base for the service's 16-bit UUIDs
    pub base_uuid: Uuid,
    /// Maximum length of a control point write
    pub control_point_max_len: u16,
    pub error_handler: Option<ErrorHandler>,
}

impl Default for DataSyncConfig {
    fn default() -> Self {
        Self {
            revision: 0x0001,
            base_uuid: DEFAULT_BASE_UUID,
            control_point_max_len: ATT_DEFAULT_MTU,
            error_handler: None,
        }
    }
}

impl DataSyncConfig {
    pub fn with_revision(mut self, revision: u16) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_base_uuid(mut self, base_uuid: Uuid) -> Self {
        self.base_uuid = base_uuid;
        self
    }

    pub fn with_control_point_max_len(mut self, max_len: u16) -> Self {
        self.control_point_max_len = max_len;
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DataSyncError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for DataSyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSyncConfig")
            .field("revision", &self.revision)
            .field("base_uuid", &self.base_uuid)
            .field("control_point_max_len", &self.control_point_max_len)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

//! Error types for the data sync service

use crate::att::AttError;
use thiserror::Error;

/// Errors raised by the data sync service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSyncError {
    #[error("Failed to register the data sync service: {0}")]
    Registration(AttError),

    #[error("No active connection or service not initialized")]
    InvalidState,

    #[error("No data sync service")]
    NullService,

    #[error("Malformed control point frame")]
    MalformedFrame,

    #[error("Unknown procedure code: 0x{0:02x}")]
    UnknownProcedure(u8),

    #[error("Unknown response value: 0x{0:02x}")]
    UnknownResult(u8),

    #[error("Failed to read control point CCCD: {0}")]
    SubscriptionRead(AttError),

    #[error("Failed to send notification: {0}")]
    Transport(AttError),
}

/// Result type for data sync operations
pub type DataSyncResult<T> = Result<T, DataSyncError>;

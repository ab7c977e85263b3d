//! Error handling for attribute registry operations
use super::constants::*;
use thiserror::Error;

/// ATT error codes as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttErrorCode {
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,
    RequestNotSupported,
    AttributeNotFound,
    InvalidAttributeValueLength,
    Unlikely,
    InsufficientResources,
    /// Common profile error: the CCCD is not configured for the operation
    CccdImproperlyConfigured,
    Unknown(u8),
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            ATT_ERROR_INVALID_HANDLE => AttErrorCode::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => AttErrorCode::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => AttErrorCode::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => AttErrorCode::InvalidPdu,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => AttErrorCode::RequestNotSupported,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => AttErrorCode::AttributeNotFound,
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => AttErrorCode::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => AttErrorCode::Unlikely,
            ATT_ERROR_INSUFFICIENT_RESOURCES => AttErrorCode::InsufficientResources,
            ATT_ERROR_CCCD_IMPROPERLY_CONFIGURED => AttErrorCode::CccdImproperlyConfigured,
            other => AttErrorCode::Unknown(other),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> u8 {
        match code {
            AttErrorCode::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            AttErrorCode::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AttErrorCode::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttErrorCode::InvalidPdu => ATT_ERROR_INVALID_PDU,
            AttErrorCode::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            AttErrorCode::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            AttErrorCode::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            AttErrorCode::Unlikely => ATT_ERROR_UNLIKELY,
            AttErrorCode::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            AttErrorCode::CccdImproperlyConfigured => ATT_ERROR_CCCD_IMPROPERLY_CONFIGURED,
            AttErrorCode::Unknown(code) => code,
        }
    }
}

/// Errors reported by an attribute registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttError {
    #[error("Invalid handle: {0}")]
    InvalidHandle(u16),

    #[error("Unknown connection handle: {0}")]
    InvalidConnection(u16),

    #[error("Attribute not found")]
    AttributeNotFound,

    #[error("Read not permitted")]
    ReadNotPermitted,

    #[error("Write not permitted")]
    WriteNotPermitted,

    #[error("Invalid attribute value length")]
    InvalidAttributeValueLength,

    #[error("CCCD improperly configured on handle {0}")]
    CccdImproperlyConfigured(u16),

    #[error("Insufficient resources")]
    InsufficientResources,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid state for operation")]
    InvalidState,
}

impl AttError {
    /// Convert to the ATT error code sent back to a peer
    pub fn to_error_code(&self) -> AttErrorCode {
        match self {
            AttError::InvalidHandle(_) => AttErrorCode::InvalidHandle,
            AttError::InvalidConnection(_) => AttErrorCode::Unlikely,
            AttError::AttributeNotFound => AttErrorCode::AttributeNotFound,
            AttError::ReadNotPermitted => AttErrorCode::ReadNotPermitted,
            AttError::WriteNotPermitted => AttErrorCode::WriteNotPermitted,
            AttError::InvalidAttributeValueLength => AttErrorCode::InvalidAttributeValueLength,
            AttError::CccdImproperlyConfigured(_) => AttErrorCode::CccdImproperlyConfigured,
            AttError::InsufficientResources => AttErrorCode::InsufficientResources,
            AttError::InvalidParameter(_) => AttErrorCode::InvalidPdu,
            AttError::InvalidState => AttErrorCode::RequestNotSupported,
        }
    }
}

/// ATT Result type
pub type AttResult<T> = Result<T, AttError>;

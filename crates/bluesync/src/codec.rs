//! Control point frame codec
//!
//! Peer to peripheral: a command frame whose first byte is the header.
//! Peripheral to peer: `[OP_CODE_RESPONSE, procedure, result]`.

use crate::error::{DataSyncError, DataSyncResult};
use std::convert::TryFrom;

/// Header of the "begin initialization" command
pub const OP_CODE_BEGIN_INIT: u8 = 0x5A;
/// First byte of every response frame
pub const OP_CODE_RESPONSE: u8 = 0x5B;

pub const RESPONSE_FRAME_LEN: usize = 3;
/// Longest response any control point procedure may produce
pub const MAX_RESPONSE_LEN: usize = 7;
/// Length of a packet receipt notification
pub const MAX_PKTS_RCPT_NOTIF_LEN: usize = 6;
/// Size of the buffer a service keeps for outgoing notifications
pub const MAX_NOTIF_BUFFER_LEN: usize = if MAX_PKTS_RCPT_NOTIF_LEN > MAX_RESPONSE_LEN {
    MAX_PKTS_RCPT_NOTIF_LEN
} else {
    MAX_RESPONSE_LEN
};

/// Procedure a response refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Procedure {
    Start = 1,
    Init = 2,
    ReceiveApp = 3,
    Validate = 4,
    PacketReceiptRequest = 8,
}

impl TryFrom<u8> for Procedure {
    type Error = DataSyncError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Procedure::Start),
            2 => Ok(Procedure::Init),
            3 => Ok(Procedure::ReceiveApp),
            4 => Ok(Procedure::Validate),
            8 => Ok(Procedure::PacketReceiptRequest),
            other => Err(DataSyncError::UnknownProcedure(other)),
        }
    }
}

/// Outcome carried in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseValue {
    Success = 1,
    InvalidState = 2,
    NotSupported = 3,
    DataSize = 4,
    CrcError = 5,
    OperationFailed = 6,
}

impl TryFrom<u8> for ResponseValue {
    type Error = DataSyncError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ResponseValue::Success),
            2 => Ok(ResponseValue::InvalidState),
            3 => Ok(ResponseValue::NotSupported),
            4 => Ok(ResponseValue::DataSize),
            5 => Ok(ResponseValue::CrcError),
            6 => Ok(ResponseValue::OperationFailed),
            other => Err(DataSyncError::UnknownResult(other)),
        }
    }
}

/// A command as classified from its header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BeginInit,
    Unknown(u8),
}

impl Command {
    pub fn from_header(header: u8) -> Self {
        match header {
            OP_CODE_BEGIN_INIT => Command::BeginInit,
            other => Command::Unknown(other),
        }
    }
}

/// Encode a response frame
pub fn encode_response(procedure: Procedure, result: ResponseValue) -> [u8; RESPONSE_FRAME_LEN] {
    [OP_CODE_RESPONSE, procedure as u8, result as u8]
}

/// Encode a response frame into a notification buffer, returning its length
pub fn encode_response_into(
    buf: &mut [u8; MAX_NOTIF_BUFFER_LEN],
    procedure: Procedure,
    result: ResponseValue,
) -> usize {
    buf[..RESPONSE_FRAME_LEN].copy_from_slice(&encode_response(procedure, result));
    RESPONSE_FRAME_LEN
}

/// The header byte of a command frame
pub fn decode_header(frame: &[u8]) -> DataSyncResult<u8> {
    frame.first().copied().ok_or(DataSyncError::MalformedFrame)
}

/// A decoded response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub procedure: Procedure,
    pub result: ResponseValue,
}

impl ResponseFrame {
    pub fn new(procedure: Procedure, result: ResponseValue) -> Self {
        Self { procedure, result }
    }

    /// Parse a notification received on the control point
    pub fn parse(data: &[u8]) -> DataSyncResult<Self> {
        if data.len() != RESPONSE_FRAME_LEN || data[0] != OP_CODE_RESPONSE {
            return Err(DataSyncError::MalformedFrame);
        }

        Ok(Self {
            procedure: Procedure::try_from(data[1])?,
            result: ResponseValue::try_from(data[2])?,
        })
    }

    pub fn to_bytes(&self) -> [u8; RESPONSE_FRAME_LEN] {
        encode_response(self.procedure, self.result)
    }
}

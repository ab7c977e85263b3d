//! Events exchanged between the transport and the data sync service

use crate::gatt::{AttHandle, ConnHandle};

/// Signals a transport delivers to a registered service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BleEvent {
    /// A peer connected
    Connected { conn_handle: ConnHandle },
    /// A peer wrote `data` to the attribute at `handle`
    Written {
        conn_handle: ConnHandle,
        handle: AttHandle,
        data: Vec<u8>,
    },
    /// The link went down with the given HCI reason
    Disconnected { conn_handle: ConnHandle, reason: u8 },
}

/// Requests a peer can make of the data sync application
///
/// Only the initialization handshake is served over the control point
/// today. The remaining kinds belong to the packet transfer path, whose
/// packet characteristic is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSyncEvent {
    /// Prepare for a new synchronization
    Start,
    /// Prepare to receive init parameters
    ReceiveInitData,
    /// Prepare to receive the data set
    ReceiveAppData,
    /// Validate the received data
    Validate,
    /// Activate the received data and reset
    ActivateAndReset,
    /// Reset and keep the current data
    SystemReset,
    /// A receipt notification is due every `num_of_pkts` packets
    PacketReceiptNotifEnabled { num_of_pkts: u16 },
    PacketReceiptNotifDisabled,
    /// A packet was written to the packet characteristic
    PacketWrite(Vec<u8>),
    /// The peer asked for the number of bytes received so far
    BytesReceivedSend,
}

//! Connection tracking
//!
//! The service follows a single peer at a time. A second connect without a
//! disconnect in between replaces the stale handle.

use crate::gatt::ConnHandle;
use log::{debug, warn};

/// Connection state of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Default)]
pub struct ConnectionTracker {
    conn_handle: Option<ConnHandle>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(&mut self, conn_handle: ConnHandle) {
        if let Some(stale) = self.conn_handle.replace(conn_handle) {
            warn!("Connection {} replaces stale {}", conn_handle, stale);
        } else {
            debug!("Connected on {}", conn_handle);
        }
    }

    pub fn on_disconnect(&mut self) {
        if let Some(conn_handle) = self.conn_handle.take() {
            debug!("Disconnected from {}", conn_handle);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn_handle.is_some()
    }

    pub fn conn_handle(&self) -> Option<ConnHandle> {
        self.conn_handle
    }

    pub fn state(&self) -> ConnectionState {
        match self.conn_handle {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }
}

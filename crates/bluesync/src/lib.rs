//! BlueSync - a data synchronization control point over Bluetooth LE GATT
//!
//! This library provides the peripheral side of the data sync service: a
//! vendor GATT service whose control point accepts commands from a central
//! and answers them with notifications. Services register on an
//! [`AttributeRegistry`]; [`MemoryRegistry`] is an in-process one.

pub mod att;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod gatt;
pub mod service;
pub mod uuid;

// Re-export common types for convenience
pub use att::{AttError, AttResult};
pub use codec::{Procedure, ResponseFrame, ResponseValue};
pub use config::DataSyncConfig;
pub use error::{DataSyncError, DataSyncResult};
pub use event::{BleEvent, DataSyncEvent};
pub use gatt::{AttHandle, AttributeRegistry, ConnHandle, MemoryRegistry};
pub use service::{DataSyncService, ServiceHandles, SharedDataSyncService};
pub use uuid::Uuid;

//! Attribute Protocol (ATT) definitions
//!
//! Constants, permissions and error codes shared by the attribute registry
//! and the services registered on it.

pub mod constants;
pub mod error;
pub mod types;

pub use self::constants::*;
pub use self::error::{AttError, AttErrorCode, AttResult};
pub use self::types::AttPermissions;

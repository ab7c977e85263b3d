//! ATT Protocol constants

// ATT error codes
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_ERROR_INVALID_PDU: u8 = 0x04;
pub const ATT_ERROR_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;
pub const ATT_ERROR_INSUFFICIENT_RESOURCES: u8 = 0x11;
pub const ATT_ERROR_CCCD_IMPROPERLY_CONFIGURED: u8 = 0xFD;

// ATT attribute permission flags
pub const ATT_PERM_NONE: u16 = 0x0000;
pub const ATT_PERM_READ: u16 = 0x0001;
pub const ATT_PERM_WRITE: u16 = 0x0002;

// ATT handle values
pub const ATT_HANDLE_MIN: u16 = 0x0001;
pub const ATT_HANDLE_MAX: u16 = 0xFFFF;

// ATT value length limits
pub const ATT_DEFAULT_MTU: u16 = 23;
pub const ATT_MTU_HEADER_SIZE: usize = 3; // Opcode (1) + handle (2)
pub const ATT_MAX_VALUE_LEN: u16 = 512;

// Declaration and descriptor types
pub const PRIMARY_SERVICE_UUID: u16 = 0x2800;
pub const SECONDARY_SERVICE_UUID: u16 = 0x2801;
pub const CHARACTERISTIC_UUID: u16 = 0x2803;
pub const CLIENT_CHAR_CONFIG_UUID: u16 = 0x2902;

// Client Characteristic Configuration values
pub const CCCD_VALUE_LEN: usize = 2;
pub const CCCD_NOTIFICATION: u16 = 0x0001;

//! In-memory attribute registry
//!
//! Keeps a flat attribute table in handle order, the CCCD state of every
//! connected peer and a queue of outgoing notifications. The peer-facing
//! methods (`connect`, `write_from_peer`, ...) return the [`BleEvent`] that a
//! host forwards to its services.

use super::registry::AttributeRegistry;
use super::types::{
    AttHandle, CharHandles, CharacteristicSpec, ConnHandle, ServiceHandle, ServiceKind, UuidType,
    VendorUuid,
};
use crate::att::{
    AttError, AttPermissions, AttResult, ATT_DEFAULT_MTU, ATT_HANDLE_MAX, ATT_HANDLE_MIN,
    ATT_MAX_VALUE_LEN, ATT_MTU_HEADER_SIZE, CCCD_NOTIFICATION, CCCD_VALUE_LEN,
    CHARACTERISTIC_UUID, CLIENT_CHAR_CONFIG_UUID, PRIMARY_SERVICE_UUID, SECONDARY_SERVICE_UUID,
};
use crate::event::BleEvent;
use crate::uuid::Uuid;
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

/// Number of vendor UUID bases a registry accepts by default
pub const DEFAULT_VENDOR_UUID_COUNT: usize = 10;

/// Number of vendor UUID types that fit in a `UuidType`
pub const MAX_VENDOR_UUID_COUNT: usize = (u8::MAX - UuidType::VENDOR_BEGIN.0) as usize + 1;

/// An attribute in the table
#[derive(Debug, Clone)]
struct Attribute {
    type_: Uuid,
    value: Vec<u8>,
    permissions: AttPermissions,
    max_len: u16,
}

impl Attribute {
    fn read(&self) -> AttResult<&[u8]> {
        if !self.permissions.can_read() {
            return Err(AttError::ReadNotPermitted);
        }
        Ok(&self.value)
    }

    fn write(&mut self, value: &[u8]) -> AttResult<()> {
        if !self.permissions.can_write() {
            return Err(AttError::WriteNotPermitted);
        }
        if value.len() > self.max_len as usize {
            return Err(AttError::InvalidAttributeValueLength);
        }
        self.value = value.to_vec();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct ServiceRecord {
    uuid: Uuid,
    end_handle: AttHandle,
}

/// A notification handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub conn_handle: ConnHandle,
    pub handle: AttHandle,
    pub value: Vec<u8>,
}

/// Attribute registry backed by process memory
pub struct MemoryRegistry {
    attributes: RwLock<BTreeMap<AttHandle, Attribute>>,
    services: RwLock<BTreeMap<ServiceHandle, ServiceRecord>>,
    /// CCCD handle -> value handle of the characteristic it configures
    cccds: RwLock<BTreeMap<AttHandle, AttHandle>>,
    /// CCCD flags per connected peer
    connections: RwLock<HashMap<ConnHandle, HashMap<AttHandle, u16>>>,
    vendor_bases: RwLock<Vec<Uuid>>,
    vendor_capacity: usize,
    mtu: u16,
    next_handle: Mutex<u32>,
    outbox: Mutex<VecDeque<Notification>>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_vendor_capacity(DEFAULT_VENDOR_UUID_COUNT)
    }

    /// Create an empty registry that accepts at most `capacity` vendor bases
    ///
    /// The capacity is clamped to [`MAX_VENDOR_UUID_COUNT`].
    pub fn with_vendor_capacity(capacity: usize) -> Self {
        Self {
            attributes: RwLock::new(BTreeMap::new()),
            services: RwLock::new(BTreeMap::new()),
            cccds: RwLock::new(BTreeMap::new()),
            connections: RwLock::new(HashMap::new()),
            vendor_bases: RwLock::new(Vec::new()),
            vendor_capacity: capacity.min(MAX_VENDOR_UUID_COUNT),
            mtu: ATT_DEFAULT_MTU,
            next_handle: Mutex::new(ATT_HANDLE_MIN as u32),
            outbox: Mutex::new(VecDeque::new()),
        }
    }

    /// Expand a registry-relative UUID into its full 128-bit form
    pub fn resolve(&self, uuid: VendorUuid) -> AttResult<Uuid> {
        if uuid.uuid_type == UuidType::SIG {
            return Ok(Uuid::from_u16(uuid.uuid16));
        }

        let bases = self.vendor_bases.read().unwrap_or_else(PoisonError::into_inner);
        uuid.uuid_type
            .0
            .checked_sub(UuidType::VENDOR_BEGIN.0)
            .and_then(|index| bases.get(index as usize))
            .map(|base| base.with_short(uuid.uuid16))
            .ok_or_else(|| {
                AttError::InvalidParameter(format!("Unknown UUID type: {}", uuid.uuid_type.0))
            })
    }

    /// A peer connected; its CCCDs all start out disabled
    pub fn connect(&self, conn_handle: ConnHandle) -> BleEvent {
        let cccds = self.cccds.read().unwrap_or_else(PoisonError::into_inner);
        let state = cccds.keys().map(|handle| (*handle, 0u16)).collect();

        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conn_handle, state);
        debug!("Peer connected on {}", conn_handle);

        BleEvent::Connected { conn_handle }
    }

    /// A peer disconnected; its CCCD state is dropped
    pub fn disconnect(&self, conn_handle: ConnHandle, reason: u8) -> AttResult<BleEvent> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&conn_handle)
            .ok_or(AttError::InvalidConnection(conn_handle.0))?;
        debug!("Peer on {} disconnected, reason 0x{:02x}", conn_handle, reason);

        Ok(BleEvent::Disconnected { conn_handle, reason })
    }

    /// Apply a peer write request and return the event to forward
    pub fn write_from_peer(
        &self,
        conn_handle: ConnHandle,
        handle: AttHandle,
        data: &[u8],
    ) -> AttResult<BleEvent> {
        let mut connections = self.connections.write().unwrap_or_else(PoisonError::into_inner);
        let cccd_state = connections
            .get_mut(&conn_handle)
            .ok_or(AttError::InvalidConnection(conn_handle.0))?;

        if let Some(flags) = cccd_state.get_mut(&handle) {
            if data.len() != CCCD_VALUE_LEN {
                return Err(AttError::InvalidAttributeValueLength);
            }
            *flags = Cursor::new(data)
                .read_u16::<LittleEndian>()
                .map_err(|_| AttError::InvalidAttributeValueLength)?;
            trace!("CCCD {} on {} set to 0x{:04x}", handle, conn_handle, flags);
        } else {
            let mut attributes = self.attributes.write().unwrap_or_else(PoisonError::into_inner);
            attributes
                .get_mut(&handle)
                .ok_or(AttError::InvalidHandle(handle.0))?
                .write(data)?;
        }

        Ok(BleEvent::Written {
            conn_handle,
            handle,
            data: data.to_vec(),
        })
    }

    /// Serve a peer read request
    pub fn read_from_peer(&self, conn_handle: ConnHandle, handle: AttHandle) -> AttResult<Vec<u8>> {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        let cccd_state = connections
            .get(&conn_handle)
            .ok_or(AttError::InvalidConnection(conn_handle.0))?;

        if let Some(flags) = cccd_state.get(&handle) {
            return Ok(flags.to_le_bytes().to_vec());
        }

        let attributes = self.attributes.read().unwrap_or_else(PoisonError::into_inner);
        let attr = attributes
            .get(&handle)
            .ok_or(AttError::InvalidHandle(handle.0))?;
        Ok(attr.read()?.to_vec())
    }

    /// Local read of an attribute value, ignoring its permissions
    pub fn value(&self, handle: AttHandle) -> AttResult<Vec<u8>> {
        let attributes = self.attributes.read().unwrap_or_else(PoisonError::into_inner);
        attributes
            .get(&handle)
            .map(|attr| attr.value.clone())
            .ok_or(AttError::AttributeNotFound)
    }

    /// Type of the attribute at `handle`
    pub fn attribute_type(&self, handle: AttHandle) -> AttResult<Uuid> {
        let attributes = self.attributes.read().unwrap_or_else(PoisonError::into_inner);
        attributes
            .get(&handle)
            .map(|attr| attr.type_)
            .ok_or(AttError::AttributeNotFound)
    }

    /// UUID and last handle of a registered service
    pub fn service(&self, handle: ServiceHandle) -> AttResult<(Uuid, AttHandle)> {
        let services = self.services.read().unwrap_or_else(PoisonError::into_inner);
        services
            .get(&handle)
            .map(|svc| (svc.uuid, svc.end_handle))
            .ok_or(AttError::AttributeNotFound)
    }

    /// Drain every notification sent so far
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Lock handle allocation; table layout changes happen while it is held
    fn allocator(&self) -> MutexGuard<'_, u32> {
        self.next_handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert attributes at consecutive handles, returning the first one
    fn insert_run(
        &self,
        next: &mut u32,
        run: Vec<(Uuid, Vec<u8>, AttPermissions, u16)>,
    ) -> AttResult<AttHandle> {
        let first = *next;
        if first + run.len() as u32 > ATT_HANDLE_MAX as u32 + 1 {
            return Err(AttError::InsufficientResources);
        }

        let mut attributes = self.attributes.write().unwrap_or_else(PoisonError::into_inner);
        for (offset, (type_, value, permissions, max_len)) in run.into_iter().enumerate() {
            let handle = AttHandle((first + offset as u32) as u16);
            attributes.insert(
                handle,
                Attribute {
                    type_,
                    value,
                    permissions,
                    max_len,
                },
            );
            *next += 1;
        }

        Ok(AttHandle(first as u16))
    }
}

impl AttributeRegistry for MemoryRegistry {
    fn add_vendor_uuid(&self, base: Uuid) -> AttResult<UuidType> {
        let base = base.base();
        let mut bases = self.vendor_bases.write().unwrap_or_else(PoisonError::into_inner);

        let index = match bases.iter().position(|known| *known == base) {
            Some(index) => index,
            None => {
                if bases.len() >= self.vendor_capacity {
                    return Err(AttError::InsufficientResources);
                }
                bases.push(base);
                bases.len() - 1
            }
        };

        let uuid_type = u8::try_from(index)
            .ok()
            .and_then(|index| UuidType::VENDOR_BEGIN.0.checked_add(index))
            .map(UuidType)
            .ok_or(AttError::InsufficientResources)?;
        debug!("Vendor base {} registered as type {}", base, uuid_type.0);
        Ok(uuid_type)
    }

    fn register_service(&self, kind: ServiceKind, uuid: VendorUuid) -> AttResult<ServiceHandle> {
        let full_uuid = self.resolve(uuid)?;
        let declaration_type = match kind {
            ServiceKind::Primary => PRIMARY_SERVICE_UUID,
            ServiceKind::Secondary => SECONDARY_SERVICE_UUID,
        };

        let value = match full_uuid.as_u16() {
            Some(short) => short.to_le_bytes().to_vec(),
            None => full_uuid.as_bytes_le().to_vec(),
        };
        let max_len = value.len() as u16;

        let mut next = self.allocator();
        let handle = self.insert_run(
            &mut next,
            vec![(
                Uuid::from_u16(declaration_type),
                value,
                AttPermissions::read_only(),
                max_len,
            )],
        )?;

        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                ServiceHandle(handle.0),
                ServiceRecord {
                    uuid: full_uuid,
                    end_handle: handle,
                },
            );
        debug!("Service {} declared at {}", full_uuid, handle);

        Ok(ServiceHandle(handle.0))
    }

    fn register_characteristic(
        &self,
        service: ServiceHandle,
        spec: &CharacteristicSpec,
    ) -> AttResult<CharHandles> {
        if spec.max_len > ATT_MAX_VALUE_LEN {
            return Err(AttError::InvalidParameter(format!(
                "Maximum length {} exceeds {}",
                spec.max_len, ATT_MAX_VALUE_LEN
            )));
        }
        if spec.initial_value.len() > spec.max_len as usize {
            return Err(AttError::InvalidAttributeValueLength);
        }

        let uuid = self.resolve(spec.uuid)?;
        let mut next = self.allocator();

        // Characteristics can only be appended to the last declared service
        let last_service = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .next_back()
            .copied();
        match last_service {
            Some(last) if last == service => {}
            Some(_) => return Err(AttError::InvalidState),
            None => return Err(AttError::AttributeNotFound),
        }

        let value_handle = AttHandle((*next + 1) as u16);

        let mut declaration = vec![spec.properties.bits()];
        declaration.extend_from_slice(&value_handle.0.to_le_bytes());
        match uuid.as_u16() {
            Some(short) => declaration.extend_from_slice(&short.to_le_bytes()),
            None => declaration.extend_from_slice(uuid.as_bytes_le()),
        }
        let declaration_len = declaration.len() as u16;

        let mut run = vec![
            (
                Uuid::from_u16(CHARACTERISTIC_UUID),
                declaration,
                AttPermissions::read_only(),
                declaration_len,
            ),
            (
                uuid,
                spec.initial_value.clone(),
                spec.permissions,
                spec.max_len,
            ),
        ];
        if spec.properties.needs_cccd() {
            run.push((
                Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID),
                vec![0; CCCD_VALUE_LEN],
                AttPermissions::read_write(),
                CCCD_VALUE_LEN as u16,
            ));
        }
        let run_len = run.len() as u16;
        let first = self.insert_run(&mut next, run)?;

        let cccd_handle = spec.properties.needs_cccd().then(|| AttHandle(first.0 + 2));
        if let Some(cccd) = cccd_handle {
            self.cccds
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(cccd, value_handle);
            for state in self
                .connections
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .values_mut()
            {
                state.insert(cccd, 0);
            }
        }

        if let Some(record) = self
            .services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&service)
        {
            record.end_handle = AttHandle(first.0 + run_len - 1);
        }
        debug!(
            "Characteristic {} added: value {}, cccd {:?}",
            uuid, value_handle, cccd_handle
        );

        Ok(CharHandles {
            value_handle,
            cccd_handle,
        })
    }

    fn read_cccd_value(
        &self,
        conn_handle: ConnHandle,
        cccd_handle: AttHandle,
    ) -> AttResult<Vec<u8>> {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        let state = connections
            .get(&conn_handle)
            .ok_or(AttError::InvalidConnection(conn_handle.0))?;
        let flags = state
            .get(&cccd_handle)
            .ok_or(AttError::InvalidHandle(cccd_handle.0))?;

        Ok(flags.to_le_bytes().to_vec())
    }

    fn notify(
        &self,
        conn_handle: ConnHandle,
        value_handle: AttHandle,
        value: &[u8],
    ) -> AttResult<()> {
        let cccd_handle = self
            .cccds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(_, configured)| **configured == value_handle)
            .map(|(cccd, _)| *cccd)
            .ok_or(AttError::InvalidHandle(value_handle.0))?;

        let flags = self.read_cccd_value(conn_handle, cccd_handle)?;
        if u16::from_le_bytes([flags[0], flags[1]]) & CCCD_NOTIFICATION == 0 {
            return Err(AttError::CccdImproperlyConfigured(cccd_handle.0));
        }
        if value.len() > self.mtu as usize - ATT_MTU_HEADER_SIZE {
            return Err(AttError::InvalidAttributeValueLength);
        }

        {
            let mut attributes = self.attributes.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(attr) = attributes.get_mut(&value_handle) {
                if value.len() <= attr.max_len as usize {
                    attr.value = value.to_vec();
                }
            }
        }

        trace!("Notify {} on {}: {:02x?}", value_handle, conn_handle, value);
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Notification {
                conn_handle,
                handle: value_handle,
                value: value.to_vec(),
            });
        Ok(())
    }
}

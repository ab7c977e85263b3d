//! Unit tests for the data sync service

use super::*;
use crate::att::{AttError, AttResult};
use crate::gatt::{
    AttHandle, CharacteristicProperties, CharacteristicSpec, MemoryRegistry, Notification,
    ServiceKind, VendorUuid,
};
use crate::uuid::Uuid;
use std::sync::Mutex;

const SERVICE: ServiceHandle = ServiceHandle(0x000C);
const REVISION_VALUE: AttHandle = AttHandle(0x000E);
const CTRL_PT_VALUE: AttHandle = AttHandle(0x0010);
const CTRL_PT_CCCD: AttHandle = AttHandle(0x0011);

/// Registry double that records every call
struct MockRegistry {
    cccd: Mutex<AttResult<Vec<u8>>>,
    notify_result: Mutex<AttResult<()>>,
    /// Registration call that fails: 0 = vendor UUID, 1 = service, 2.. = characteristics
    fail_step: Option<usize>,
    steps: Mutex<usize>,
    characteristics: Mutex<Vec<CharacteristicSpec>>,
    cccd_reads: Mutex<Vec<(ConnHandle, AttHandle)>>,
    notifications: Mutex<Vec<(ConnHandle, AttHandle, Vec<u8>)>>,
}

impl MockRegistry {
    fn new() -> Self {
        Self {
            cccd: Mutex::new(Ok(vec![0x01, 0x00])),
            notify_result: Mutex::new(Ok(())),
            fail_step: None,
            steps: Mutex::new(0),
            characteristics: Mutex::new(Vec::new()),
            cccd_reads: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(step: usize) -> Self {
        Self {
            fail_step: Some(step),
            ..Self::new()
        }
    }

    fn set_cccd(&self, value: AttResult<Vec<u8>>) {
        *self.cccd.lock().unwrap() = value;
    }

    fn notifications(&self) -> Vec<(ConnHandle, AttHandle, Vec<u8>)> {
        self.notifications.lock().unwrap().clone()
    }

    fn step(&self) -> AttResult<()> {
        let mut steps = self.steps.lock().unwrap();
        let current = *steps;
        *steps += 1;
        if self.fail_step == Some(current) {
            return Err(AttError::InsufficientResources);
        }
        Ok(())
    }
}

impl AttributeRegistry for MockRegistry {
    fn add_vendor_uuid(&self, _base: Uuid) -> AttResult<UuidType> {
        self.step()?;
        Ok(UuidType(2))
    }

    fn register_service(&self, kind: ServiceKind, uuid: VendorUuid) -> AttResult<ServiceHandle> {
        self.step()?;
        assert_eq!(kind, ServiceKind::Primary);
        assert_eq!(uuid, VendorUuid::new(UuidType(2), DATA_SYNC_SERVICE_UUID));
        Ok(SERVICE)
    }

    fn register_characteristic(
        &self,
        service: ServiceHandle,
        spec: &CharacteristicSpec,
    ) -> AttResult<CharHandles> {
        self.step()?;
        assert_eq!(service, SERVICE);
        self.characteristics.lock().unwrap().push(spec.clone());

        Ok(if spec.properties.needs_cccd() {
            CharHandles {
                value_handle: CTRL_PT_VALUE,
                cccd_handle: Some(CTRL_PT_CCCD),
            }
        } else {
            CharHandles {
                value_handle: REVISION_VALUE,
                cccd_handle: None,
            }
        })
    }

    fn read_cccd_value(
        &self,
        conn_handle: ConnHandle,
        cccd_handle: AttHandle,
    ) -> AttResult<Vec<u8>> {
        self.cccd_reads.lock().unwrap().push((conn_handle, cccd_handle));
        self.cccd.lock().unwrap().clone()
    }

    fn notify(
        &self,
        conn_handle: ConnHandle,
        value_handle: AttHandle,
        value: &[u8],
    ) -> AttResult<()> {
        self.notify_result.lock().unwrap().clone()?;
        self.notifications
            .lock()
            .unwrap()
            .push((conn_handle, value_handle, value.to_vec()));
        Ok(())
    }
}

fn ready_service(config: DataSyncConfig) -> (Arc<MockRegistry>, DataSyncService<MockRegistry>) {
    let registry = Arc::new(MockRegistry::new());
    let mut service = DataSyncService::new(registry.clone(), config);
    service.init().unwrap();
    (registry, service)
}

fn connected(conn: u16) -> BleEvent {
    BleEvent::Connected {
        conn_handle: ConnHandle(conn),
    }
}

fn disconnected(conn: u16) -> BleEvent {
    BleEvent::Disconnected {
        conn_handle: ConnHandle(conn),
        reason: 0x13,
    }
}

fn written(conn: u16, handle: AttHandle, data: &[u8]) -> BleEvent {
    BleEvent::Written {
        conn_handle: ConnHandle(conn),
        handle,
        data: data.to_vec(),
    }
}

/// Config whose error handler records what it is given
fn recording_config() -> (DataSyncConfig, Arc<Mutex<Vec<DataSyncError>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let config =
        DataSyncConfig::default().with_error_handler(move |err| sink.lock().unwrap().push(err.clone()));
    (config, seen)
}

#[test]
fn test_init_registers_both_characteristics() {
    let (registry, service) = ready_service(DataSyncConfig::default().with_revision(0x0102));

    assert!(service.is_initialized());
    let handles = service.handles().unwrap();
    assert_eq!(handles.service_handle, SERVICE);
    assert_eq!(handles.revision.value_handle, REVISION_VALUE);
    assert_eq!(handles.control_point.cccd_handle, Some(CTRL_PT_CCCD));

    let specs = registry.characteristics.lock().unwrap();
    assert_eq!(specs.len(), 2);

    let revision = &specs[0];
    assert_eq!(revision.uuid.uuid16, DATA_SYNC_REV_CHAR_UUID);
    assert_eq!(revision.properties, CharacteristicProperties::READ);
    assert!(revision.permissions.can_read() && !revision.permissions.can_write());
    assert_eq!(revision.initial_value, vec![0x02, 0x01]);
    assert_eq!(revision.max_len, 2);

    let control_point = &specs[1];
    assert_eq!(control_point.uuid.uuid16, DATA_SYNC_CTRL_PT_UUID);
    assert_eq!(
        control_point.properties,
        CharacteristicProperties::WRITE | CharacteristicProperties::NOTIFY
    );
    assert!(control_point.permissions.can_write() && !control_point.permissions.can_read());
    assert!(control_point.initial_value.is_empty());
    assert_eq!(control_point.max_len, 23);
}

#[test]
fn test_init_failure_is_reported_at_every_step() {
    for step in 0..4 {
        let registry = Arc::new(MockRegistry::failing_at(step));
        let mut service = DataSyncService::new(registry, DataSyncConfig::default());

        assert_eq!(
            service.init(),
            Err(DataSyncError::Registration(AttError::InsufficientResources)),
            "step {step}"
        );
        assert!(!service.is_initialized());
        assert!(service.handles().is_none());

        service.on_ble_evt(&connected(1));
        assert_eq!(
            service.send_response(Procedure::Init, ResponseValue::Success),
            Err(DataSyncError::InvalidState)
        );
    }
}

#[test]
fn test_init_only_once() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());

    assert_eq!(service.init(), Err(DataSyncError::InvalidState));
    assert_eq!(registry.characteristics.lock().unwrap().len(), 2);
    assert!(service.is_initialized());
}

#[test]
fn test_send_before_init_is_invalid_state() {
    let registry = Arc::new(MockRegistry::new());
    let mut service = DataSyncService::new(registry.clone(), DataSyncConfig::default());

    assert_eq!(
        service.send_response(Procedure::Init, ResponseValue::Success),
        Err(DataSyncError::InvalidState)
    );

    service.on_ble_evt(&connected(1));
    assert!(service.is_connected());
    assert_eq!(
        service.send_response(Procedure::Init, ResponseValue::Success),
        Err(DataSyncError::InvalidState)
    );

    // Writes before init have no control point to match
    service.handle_write(CTRL_PT_VALUE, &[0x5A]);
    assert!(registry.notifications().is_empty());
}

#[test]
fn test_disconnect_blocks_responses() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());

    service.on_ble_evt(&connected(0x40));
    service.on_ble_evt(&disconnected(0x40));

    assert!(!service.is_connected());
    assert_eq!(service.connection_state(), ConnectionState::Disconnected);
    assert_eq!(
        service.send_response(Procedure::Init, ResponseValue::Success),
        Err(DataSyncError::InvalidState)
    );
    assert!(registry.notifications().is_empty());
}

#[test]
fn test_begin_init_is_answered() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());

    service.on_ble_evt(&connected(0x40));
    service.on_ble_evt(&written(0x40, CTRL_PT_VALUE, &[0x5A]));

    assert_eq!(
        registry.notifications(),
        vec![(ConnHandle(0x40), CTRL_PT_VALUE, vec![0x5B, 0x02, 0x01])]
    );
    assert_eq!(
        *registry.cccd_reads.lock().unwrap(),
        vec![(ConnHandle(0x40), CTRL_PT_CCCD)]
    );
}

#[test]
fn test_trailing_bytes_are_not_consumed() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());

    service.on_ble_evt(&connected(1));
    service.on_ble_evt(&written(1, CTRL_PT_VALUE, &[0x5A, 0xDE, 0xAD]));

    assert_eq!(registry.notifications().len(), 1);
}

#[test]
fn test_unsubscribed_peer_is_ignored() {
    let (config, seen) = recording_config();
    let (registry, mut service) = ready_service(config);
    registry.set_cccd(Ok(vec![0x00, 0x00]));

    service.on_ble_evt(&connected(1));
    service.on_ble_evt(&written(1, CTRL_PT_VALUE, &[0x5A]));

    assert!(registry.notifications().is_empty());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_cccd_read_failure_reaches_error_handler() {
    let (config, seen) = recording_config();
    let (registry, mut service) = ready_service(config);
    registry.set_cccd(Err(AttError::InvalidConnection(1)));

    service.on_ble_evt(&connected(1));
    service.on_ble_evt(&written(1, CTRL_PT_VALUE, &[0x5A]));

    assert!(registry.notifications().is_empty());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![DataSyncError::SubscriptionRead(AttError::InvalidConnection(1))]
    );
}

#[test]
fn test_cccd_read_failure_without_handler() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());
    registry.set_cccd(Err(AttError::InvalidHandle(0x11)));

    service.on_ble_evt(&connected(1));
    assert!(!service.is_subscribed());
    service.on_ble_evt(&written(1, CTRL_PT_VALUE, &[0x5A]));

    assert!(registry.notifications().is_empty());
}

#[test]
fn test_subscription_without_connection() {
    let (config, seen) = recording_config();
    let (registry, service) = ready_service(config);

    assert!(!service.is_subscribed());
    assert!(registry.cccd_reads.lock().unwrap().is_empty());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![DataSyncError::SubscriptionRead(AttError::InvalidState)]
    );
}

#[test]
fn test_unknown_and_empty_commands_are_ignored() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());
    service.on_ble_evt(&connected(1));

    let frames: [&[u8]; 5] = [&[0x00], &[0xFF], &[0x5B, 0x02, 0x01], &[0x01], &[]];
    for frame in frames {
        service.on_ble_evt(&written(1, CTRL_PT_VALUE, frame));
    }

    assert!(registry.notifications().is_empty());
}

#[test]
fn test_writes_to_other_attributes_are_ignored() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());
    service.on_ble_evt(&connected(1));

    service.on_ble_evt(&written(1, REVISION_VALUE, &[0x5A]));
    service.on_ble_evt(&written(1, CTRL_PT_CCCD, &[0x01, 0x00]));

    assert!(registry.notifications().is_empty());
    assert!(registry.cccd_reads.lock().unwrap().is_empty());
}

#[test]
fn test_last_connect_wins() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());

    service.on_ble_evt(&connected(1));
    service.on_ble_evt(&connected(2));
    assert!(service.is_connected());
    assert_eq!(service.conn_handle(), Some(ConnHandle(2)));

    service.on_ble_evt(&written(2, CTRL_PT_VALUE, &[0x5A]));
    assert_eq!(registry.notifications()[0].0, ConnHandle(2));
}

#[test]
fn test_transport_failure_is_propagated() {
    let (registry, mut service) = ready_service(DataSyncConfig::default());
    *registry.notify_result.lock().unwrap() = Err(AttError::CccdImproperlyConfigured(0x11));

    service.on_ble_evt(&connected(1));
    assert_eq!(
        service.send_response(Procedure::Validate, ResponseValue::CrcError),
        Err(DataSyncError::Transport(AttError::CccdImproperlyConfigured(0x11)))
    );

    *registry.notify_result.lock().unwrap() = Ok(());
    service
        .send_response(Procedure::Validate, ResponseValue::CrcError)
        .unwrap();
    assert_eq!(registry.notifications()[0].2, vec![0x5B, 0x04, 0x05]);
}

#[test]
fn test_missing_service() {
    let event = connected(1);
    on_ble_evt::<MockRegistry>(None, &event);

    assert_eq!(
        response_send::<MockRegistry>(None, Procedure::Init, ResponseValue::Success),
        Err(DataSyncError::NullService)
    );

    let (registry, mut service) = ready_service(DataSyncConfig::default());
    on_ble_evt(Some(&mut service), &event);
    response_send(Some(&mut service), Procedure::Start, ResponseValue::Success).unwrap();
    assert_eq!(registry.notifications()[0].2, vec![0x5B, 0x01, 0x01]);
}

#[test]
fn test_shared_service_across_threads() {
    let (registry, service) = ready_service(DataSyncConfig::default());
    let shared = service.into_shared();

    let worker = {
        let shared = shared.clone();
        std::thread::spawn(move || {
            let mut service = shared.lock().unwrap();
            service.on_ble_evt(&connected(7));
            service.on_ble_evt(&written(7, CTRL_PT_VALUE, &[0x5A]));
        })
    };
    worker.join().unwrap();

    assert!(shared.lock().unwrap().is_connected());
    assert_eq!(registry.notifications().len(), 1);
}

#[test]
fn test_session_over_memory_registry() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut service = DataSyncService::new(
        registry.clone(),
        DataSyncConfig::default().with_revision(0x0A0B),
    );
    let handles = service.init().unwrap();
    let control_point = handles.control_point.value_handle;
    let cccd = handles.control_point.cccd_handle.unwrap();
    let conn = ConnHandle(0x0001);

    let (uuid, _) = registry.service(handles.service_handle).unwrap();
    assert_eq!(uuid.to_string(), "7b7e1570-2f1a-4c0b-9d3e-5a1c4f6b8e21");

    service.on_ble_evt(&registry.connect(conn));

    // Peer-visible attribute permissions
    assert_eq!(
        registry
            .read_from_peer(conn, handles.revision.value_handle)
            .unwrap(),
        vec![0x0B, 0x0A]
    );
    assert_eq!(
        registry.write_from_peer(conn, handles.revision.value_handle, &[0]),
        Err(AttError::WriteNotPermitted)
    );
    assert_eq!(
        registry.read_from_peer(conn, control_point),
        Err(AttError::ReadNotPermitted)
    );

    // Not subscribed yet
    let event = registry.write_from_peer(conn, control_point, &[0x5A]).unwrap();
    service.on_ble_evt(&event);
    assert!(registry.take_notifications().is_empty());

    let event = registry.write_from_peer(conn, cccd, &[0x01, 0x00]).unwrap();
    service.on_ble_evt(&event);
    assert!(service.is_subscribed());

    let event = registry.write_from_peer(conn, control_point, &[0x5A]).unwrap();
    service.on_ble_evt(&event);
    assert_eq!(
        registry.take_notifications(),
        vec![Notification {
            conn_handle: conn,
            handle: control_point,
            value: vec![0x5B, 0x02, 0x01],
        }]
    );

    service.on_ble_evt(&registry.disconnect(conn, 0x13).unwrap());
    assert_eq!(
        service.send_response(Procedure::Init, ResponseValue::Success),
        Err(DataSyncError::InvalidState)
    );
}

#[test]
fn test_registration_failure_from_memory_registry() {
    let registry = Arc::new(MemoryRegistry::with_vendor_capacity(0));
    let mut service = DataSyncService::new(registry, DataSyncConfig::default());

    assert_eq!(
        service.init(),
        Err(DataSyncError::Registration(AttError::InsufficientResources))
    );
    assert!(!service.is_initialized());
}

//! Example driving a data sync session against an in-memory registry
//!
//! Plays both sides of the link: the peer subscribes to the control point,
//! asks for initialization and decodes the response.
//!
//! Run with `RUST_LOG=debug` to see the service's log output.

use bluesync::gatt::ConnHandle;
use bluesync::{BleEvent, DataSyncConfig, DataSyncService, MemoryRegistry, ResponseFrame};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let registry = Arc::new(MemoryRegistry::new());
    let config = DataSyncConfig::default()
        .with_revision(0x0003)
        .with_error_handler(|err| eprintln!("Data sync error: {}", err));

    let mut service = DataSyncService::new(registry.clone(), config);
    let handles = service.init()?;
    let (service_uuid, _) = registry.service(handles.service_handle)?;
    println!("Registered data sync service {}", service_uuid);

    let control_point = handles.control_point.value_handle;
    let cccd = handles
        .control_point
        .cccd_handle
        .ok_or("control point has no CCCD")?;

    let conn = ConnHandle(0x0040);
    service.on_ble_evt(&registry.connect(conn));

    let revision = registry.read_from_peer(conn, handles.revision.value_handle)?;
    println!("Peer read revision: {:02x?}", revision);

    if let Err(err) = registry.read_from_peer(conn, control_point) {
        println!(
            "Peer read of control point refused: {} (ATT error 0x{:02x})",
            err,
            u8::from(err.to_error_code())
        );
    }

    // Peer subscribes, then asks for initialization
    let events: Vec<BleEvent> = vec![
        registry.write_from_peer(conn, cccd, &[0x01, 0x00])?,
        registry.write_from_peer(conn, control_point, &[0x5A])?,
    ];
    for event in &events {
        service.on_ble_evt(event);
    }

    for notification in registry.take_notifications() {
        let frame = ResponseFrame::parse(&notification.value)?;
        println!(
            "Notification on {}: {:?} -> {:?}",
            notification.handle, frame.procedure, frame.result
        );
    }

    service.on_ble_evt(&registry.disconnect(conn, 0x13)?);
    println!("Peer disconnected, connected = {}", service.is_connected());

    Ok(())
}

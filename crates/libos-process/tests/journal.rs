//! Round-trip journal tests
//!
//! Verifies that the mock journal reflects exactly what crossed the trap.

use libos_ipc::{graphics, io, LogArgs, ServiceHost};
use libos_process::testing::MockGateway;
use libos_process::IpcChannel;
use serde_json::json;

#[test]
fn test_journal_serializes_in_call_order() {
    let mock = MockGateway::new();
    let channel = IpcChannel::new(&mock);

    let text = "boot";
    let args = LogArgs {
        addr: text.as_ptr(),
        size: text.len() as u32,
    };
    // SAFETY: `text` outlives the call
    unsafe { channel.call(ServiceHost::Io, io::CMD_LOG, &args) }.unwrap();
    let context = channel
        .call_empty(ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT)
        .unwrap()
        .handle();
    channel
        .call_with_word(ServiceHost::Graphics, graphics::CMD_DESTROY_GRAPHICS_CONTEXT, context)
        .unwrap();

    let journal = serde_json::to_value(mock.journal()).unwrap();
    assert_eq!(
        journal,
        json!([
            {
                "host": "Io",
                "command": 0,
                "request": { "Log": { "text": "boot" } },
                "success": true
            },
            { "host": "Graphics", "command": 0, "request": "Empty", "success": true },
            { "host": "Graphics", "command": 1, "request": { "Word": context }, "success": true },
        ])
    );
}

#[test]
fn test_every_command_produces_one_entry() {
    let mock = MockGateway::new();
    let channel = IpcChannel::new(&mock);

    for command in 0..=io::CMD_GET_LOCATION {
        if command == io::CMD_LOG || command == io::CMD_GET_LOCATION {
            continue;
        }
        let request = libos_ipc::StreamRequest::close(42);
        // SAFETY: payload has no inner addresses the mock would follow
        // (name is null, destination is only written for known handles)
        let _ = unsafe { channel.call(ServiceHost::Io, command, &request) };
    }
    let _ = channel.call_empty(ServiceHost::Io, io::CMD_GET_LOCATION);

    assert_eq!(mock.round_trips(), 5);
    assert!(mock.journal().iter().all(|trip| !trip.success));
}

#[test]
fn test_clear_journal() {
    let mock = MockGateway::new();
    let channel = IpcChannel::new(&mock);
    let _ = channel.call_empty(ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT);
    mock.clear_journal();
    assert_eq!(mock.round_trips(), 0);
    assert_eq!(mock.live_contexts(), 1);
}

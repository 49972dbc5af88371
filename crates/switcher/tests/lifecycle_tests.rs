//! Session lifecycle tests
//!
//! Exercise construction, unwind-on-failure, teardown ordering, and the
//! Set Report parameters against the scripted FakeUsb access layer.
//!
//! Run with: `cargo test -p switcher --test lifecycle_tests`

use switcher::protocol::{
    HID_SET_REPORT, INIT_REPORT, PRODUCT_ID, REQUEST_TYPE_SET_REPORT, SET_REPORT_VALUE,
    TRIGGER_REPORT, VENDOR_ID,
};
use switcher::testing::{Event, FakeUsb, TransferReply};
use switcher::{Error, ProtocolError, find_switch};

/// A bus carrying exactly one healthy dongle whose vendor HID interface
/// bears the given number.
fn one_switch(interface_number: u8) -> FakeUsb {
    let usb = FakeUsb::new();
    usb.add_device(VENDOR_ID, PRODUCT_ID, FakeUsb::switch_layout(interface_number));
    usb
}

fn set_report(index: u16, data: &[u8]) -> Event {
    Event::Transfer {
        request_type: REQUEST_TYPE_SET_REPORT,
        request: HID_SET_REPORT,
        value: SET_REPORT_VALUE,
        index,
        data: data.to_vec(),
    }
}

#[test]
fn test_full_lifecycle_with_detached_driver() {
    let usb = one_switch(3);
    usb.set_driver_active(true);

    let session = find_switch(&usb).unwrap();
    assert_eq!(session.interface_number(), 3);
    session.trigger().unwrap();
    drop(session);

    assert_eq!(
        usb.events(),
        vec![
            Event::Enumerate,
            Event::Open { index: 0 },
            Event::DriverQuery,
            Event::Detach,
            Event::Claim { interface: 3 },
            set_report(3, &INIT_REPORT),
            set_report(3, &TRIGGER_REPORT),
            Event::Release { interface: 3 },
            Event::Attach,
            Event::Close,
            Event::Unref { index: 0 },
        ]
    );
}

#[test]
fn test_no_driver_detached_means_no_reattach() {
    let usb = one_switch(1);

    let session = find_switch(&usb).unwrap();
    drop(session);

    let events = usb.events();
    assert!(!events.contains(&Event::Detach));
    assert!(!events.contains(&Event::Attach));
    assert!(events.contains(&Event::Release { interface: 1 }));
    assert!(events.contains(&Event::Close));
}

#[test]
fn test_initialize_runs_once_before_any_trigger() {
    let usb = one_switch(2);

    let session = find_switch(&usb).unwrap();
    session.trigger().unwrap();
    session.trigger().unwrap();
    drop(session);

    let transfers: Vec<Event> = usb
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Transfer { .. }))
        .collect();
    assert_eq!(
        transfers,
        vec![
            set_report(2, &INIT_REPORT),
            set_report(2, &TRIGGER_REPORT),
            set_report(2, &TRIGGER_REPORT),
        ]
    );
}

#[test]
fn test_open_failure_releases_device_reference() {
    let usb = one_switch(3);
    usb.fail_open(rusb::Error::Access);

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(err, Error::Open(rusb::Error::Access));

    assert_eq!(
        usb.events(),
        vec![
            Event::Enumerate,
            Event::Open { index: 0 },
            Event::Unref { index: 0 },
        ]
    );
}

#[test]
fn test_driver_query_failure_closes_and_releases() {
    let usb = one_switch(3);
    usb.fail_driver_query(rusb::Error::Io);

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(err, Error::DriverQuery(rusb::Error::Io));

    assert_eq!(
        usb.events(),
        vec![
            Event::Enumerate,
            Event::Open { index: 0 },
            Event::DriverQuery,
            Event::Close,
            Event::Unref { index: 0 },
        ]
    );
}

#[test]
fn test_detach_failure_does_not_reattach() {
    let usb = one_switch(3);
    usb.set_driver_active(true);
    usb.fail_detach(rusb::Error::Busy);

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(err, Error::Detach(rusb::Error::Busy));

    assert_eq!(
        usb.events(),
        vec![
            Event::Enumerate,
            Event::Open { index: 0 },
            Event::DriverQuery,
            Event::Detach,
            Event::Close,
            Event::Unref { index: 0 },
        ]
    );
}

#[test]
fn test_claim_failure_reattaches_detached_driver() {
    let usb = one_switch(3);
    usb.set_driver_active(true);
    usb.fail_claim(rusb::Error::Busy);

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(err, Error::Claim(rusb::Error::Busy));

    assert_eq!(
        usb.events(),
        vec![
            Event::Enumerate,
            Event::Open { index: 0 },
            Event::DriverQuery,
            Event::Detach,
            Event::Claim { interface: 3 },
            Event::Attach,
            Event::Close,
            Event::Unref { index: 0 },
        ]
    );
}

#[test]
fn test_claim_failure_without_detach_skips_reattach() {
    let usb = one_switch(3);
    usb.fail_claim(rusb::Error::Busy);

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(err, Error::Claim(rusb::Error::Busy));

    let events = usb.events();
    assert!(!events.contains(&Event::Attach));
    assert!(!events.contains(&Event::Release { interface: 3 }));
}

#[test]
fn test_init_transfer_failure_unwinds_fully() {
    let usb = one_switch(3);
    usb.set_driver_active(true);
    usb.push_transfer_reply(TransferReply::Error(rusb::Error::Pipe));

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(
        err,
        Error::Protocol(ProtocolError::Transfer(rusb::Error::Pipe))
    );

    assert_eq!(
        usb.events(),
        vec![
            Event::Enumerate,
            Event::Open { index: 0 },
            Event::DriverQuery,
            Event::Detach,
            Event::Claim { interface: 3 },
            set_report(3, &INIT_REPORT),
            Event::Release { interface: 3 },
            Event::Attach,
            Event::Close,
            Event::Unref { index: 0 },
        ]
    );
}

#[test]
fn test_short_init_write_is_a_protocol_failure() {
    let usb = one_switch(3);
    usb.push_transfer_reply(TransferReply::Written(3));

    let err = find_switch(&usb).err().expect("construction should fail");
    assert_eq!(
        err,
        Error::Protocol(ProtocolError::ShortWrite {
            wrote: 3,
            expected: INIT_REPORT.len(),
        })
    );
}

#[test]
fn test_failed_trigger_leaves_session_usable() {
    let usb = one_switch(3);

    let session = find_switch(&usb).unwrap();

    usb.push_transfer_reply(TransferReply::Error(rusb::Error::Timeout));
    let err = session.trigger().err().expect("trigger should fail");
    assert_eq!(
        err,
        Error::Protocol(ProtocolError::Transfer(rusb::Error::Timeout))
    );

    // Failure did not tear anything down.
    let events = usb.events();
    assert!(!events.contains(&Event::Release { interface: 3 }));
    assert!(!events.contains(&Event::Close));

    // The retry goes through.
    session.trigger().unwrap();
    drop(session);

    let events = usb.events();
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == Event::Release { interface: 3 })
            .count(),
        1
    );
    assert_eq!(events.iter().filter(|e| **e == Event::Close).count(), 1);
}

#[test]
fn test_short_trigger_write_is_a_protocol_failure() {
    let usb = one_switch(3);

    let session = find_switch(&usb).unwrap();
    usb.push_transfer_reply(TransferReply::Written(4));

    let err = session.trigger().err().expect("trigger should fail");
    assert_eq!(
        err,
        Error::Protocol(ProtocolError::ShortWrite {
            wrote: 4,
            expected: TRIGGER_REPORT.len(),
        })
    );
}

#[test]
fn test_teardown_survives_release_and_attach_failures() {
    let usb = one_switch(3);
    usb.set_driver_active(true);
    usb.fail_release(rusb::Error::NoDevice);
    usb.fail_attach(rusb::Error::NoDevice);

    let session = find_switch(&usb).unwrap();
    drop(session);

    // Best-effort teardown still attempts everything and closes the handle.
    let events = usb.events();
    assert!(events.contains(&Event::Release { interface: 3 }));
    assert!(events.contains(&Event::Attach));
    assert!(events.contains(&Event::Close));
    assert!(events.contains(&Event::Unref { index: 0 }));
}

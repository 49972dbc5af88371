//! HID Set Report protocol constants for the switch dongle
//!
//! Both reports are fixed literal byte sequences captured from the vendor
//! tool. The byte meanings are an opaque hardware protocol; nothing here
//! infers or alters them.

use std::time::Duration;

/// Vendor ID of the KVM dongle.
pub const VENDOR_ID: u16 = 0x2101;
/// Product ID of the KVM dongle.
pub const PRODUCT_ID: u16 = 0x1406;

/// bmRequestType for an output report: host-to-device, class request,
/// interface recipient.
pub const REQUEST_TYPE_SET_REPORT: u8 = 0x21;
/// HID Set Report bRequest.
pub const HID_SET_REPORT: u8 = 0x09;
/// HID output report type.
pub const HID_REPORT_TYPE_OUTPUT: u8 = 0x02;
/// wValue: output report type in the high byte, report ID 0 in the low byte.
pub const SET_REPORT_VALUE: u16 = (HID_REPORT_TYPE_OUTPUT as u16) << 8;

/// Sent once during session construction; the dongle expects it before any
/// trigger.
pub const INIT_REPORT: [u8; 5] = [0x03, 0x00, 0x00, 0x00, 0x00];
/// Flips the switch to its other input.
pub const TRIGGER_REPORT: [u8; 5] = [0x03, 0x5c, 0x04, 0x00, 0x00];

/// Default control transfer timeout.
pub const REPORT_TIMEOUT: Duration = Duration::from_millis(100);

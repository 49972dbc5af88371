//! USB KVM switch control
//!
//! Locates a SIIG-style KVM dongle (vendor `0x2101`, product `0x1406`) on the
//! USB bus, takes its vendor HID interface away from the kernel's generic HID
//! driver, and sends the two-message Set Report sequence that flips the
//! physical switch to its other input.
//!
//! The crate is built around three pieces:
//!
//! - [`usb::UsbAccess`]: the capability surface consumed from libusb (via
//!   `rusb`), kept behind a trait so the acquisition lifecycle can be
//!   exercised without hardware.
//! - [`discovery`]: bus enumeration, vendor/product matching, and the
//!   fixed-topology interface resolution.
//! - [`session::Session`]: the owner of one opened, claimed device. It sends
//!   the initialization report as part of construction, exposes
//!   [`Session::trigger`], and restores kernel-driver state on drop.

pub mod discovery;
pub mod error;
pub mod protocol;
pub mod session;
pub mod testing;
pub mod usb;

pub use discovery::{find_devices, find_switch, resolve_interface};
pub use error::{Error, ProtocolError, Result, TopologyError};
pub use session::Session;
pub use usb::{ConfigLayout, InterfaceLayout, RusbAccess, UsbAccess};

//! Device session lifecycle
//!
//! [`Session`] owns exactly one opened, claimed USB device. Construction
//! walks open -> kernel-driver check -> claim -> initialization report; a
//! failure at any step unwinds whatever was acquired before it, in reverse
//! order, so the kernel's view of the device is left untouched. Teardown
//! runs exactly once, in `Drop`.

use tracing::{debug, warn};

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{
    HID_SET_REPORT, INIT_REPORT, REPORT_TIMEOUT, REQUEST_TYPE_SET_REPORT, SET_REPORT_VALUE,
    TRIGGER_REPORT,
};
use crate::usb::UsbAccess;

/// The stateful owner of one opened, claimed KVM dongle.
///
/// Not `Clone`: the handle is released exactly once, by `Drop`. The
/// `detached_kernel` flag is the sole input to the reattachment decision at
/// teardown.
pub struct Session<'a, B: UsbAccess> {
    usb: &'a B,
    // Declaration order doubles as teardown order: the handle closes before
    // the device reference is released.
    handle: B::Handle,
    _device: B::Device,
    interface: u8,
    detached_kernel: bool,
    claimed: bool,
}

impl<'a, B: UsbAccess> Session<'a, B> {
    /// Open the device and establish a ready session.
    ///
    /// Consumes the device token; on any failure the token is dropped and
    /// its reference released. From the kernel-driver check onward the
    /// partially built session is already armed with its `Drop` impl, so a
    /// failed step unwinds automatically.
    pub fn open(usb: &'a B, device: B::Device, interface: u8) -> Result<Self> {
        let handle = usb.open(&device).map_err(Error::Open)?;

        let mut session = Session {
            usb,
            handle,
            _device: device,
            interface,
            detached_kernel: false,
            claimed: false,
        };

        let driver_active = session
            .usb
            .kernel_driver_active(&session.handle, interface)
            .map_err(Error::DriverQuery)?;
        if driver_active {
            session
                .usb
                .detach_kernel_driver(&mut session.handle, interface)
                .map_err(Error::Detach)?;
            session.detached_kernel = true;
            debug!("Detached kernel driver from interface {}", interface);
        }

        session
            .usb
            .claim_interface(&mut session.handle, interface)
            .map_err(Error::Claim)?;
        session.claimed = true;
        debug!("Claimed interface {}", interface);

        session.send_report(&INIT_REPORT)?;
        debug!("Initialization report accepted");

        Ok(session)
    }

    /// The interface number resolved at construction.
    pub fn interface_number(&self) -> u8 {
        self.interface
    }

    /// Send the trigger report, flipping the switch to its other input.
    ///
    /// Each call is an independent blocking request; a failure leaves the
    /// session usable, so the caller may retry or drop it normally.
    pub fn trigger(&self) -> Result<()> {
        self.send_report(&TRIGGER_REPORT)
    }

    /// Issue one HID Set Report transfer carrying `payload`.
    fn send_report(&self, payload: &[u8]) -> Result<()> {
        let wrote = self
            .usb
            .write_control(
                &self.handle,
                REQUEST_TYPE_SET_REPORT,
                HID_SET_REPORT,
                SET_REPORT_VALUE,
                u16::from(self.interface),
                payload,
                REPORT_TIMEOUT,
            )
            .map_err(|e| Error::Protocol(ProtocolError::Transfer(e)))?;

        if wrote != payload.len() {
            return Err(ProtocolError::ShortWrite {
                wrote,
                expected: payload.len(),
            }
            .into());
        }

        Ok(())
    }
}

impl<B: UsbAccess> Drop for Session<'_, B> {
    fn drop(&mut self) {
        if self.claimed {
            if let Err(e) = self.usb.release_interface(&mut self.handle, self.interface) {
                warn!("Failed to release interface {}: {}", self.interface, e);
            }
        }

        // Reattachment is best-effort: by this point the operation the user
        // cared about has already concluded.
        if self.detached_kernel {
            if let Err(e) = self.usb.attach_kernel_driver(&mut self.handle, self.interface) {
                warn!(
                    "Could not reattach kernel driver to interface {}: {}",
                    self.interface, e
                );
            }
        }

        // The handle and the device token drop next, closing the handle and
        // releasing the device reference.
    }
}

//! Device discovery and interface resolution
//!
//! Finds the one KVM dongle on the bus and works out which interface number
//! to claim. The interface check is a defensive consistency test on an
//! assumed-fixed hardware topology, not a general interface search: the
//! dongle always exposes two interfaces, and the vendor HID interface is the
//! second one.

use tracing::{debug, warn};

use crate::error::{Error, Result, TopologyError};
use crate::protocol::{PRODUCT_ID, VENDOR_ID};
use crate::session::Session;
use crate::usb::UsbAccess;

/// Index of the vendor HID interface within the active configuration.
const TARGET_INTERFACE: usize = 1;

/// Enumerate the bus and return every device matching the given vendor and
/// product IDs. Non-matching devices are dropped (their references released)
/// during the scan; a device whose descriptor cannot be read is skipped.
pub fn find_devices<B: UsbAccess>(
    usb: &B,
    vendor_id: u16,
    product_id: u16,
) -> Result<Vec<B::Device>> {
    let devices = usb.devices().map_err(Error::Enumeration)?;

    let mut matches = Vec::new();
    for device in devices {
        let (vid, pid) = match usb.device_ids(&device) {
            Ok(ids) => ids,
            Err(e) => {
                let (bus, address) = usb.location(&device);
                warn!(
                    "Skipping device at bus {:03} addr {:03}: descriptor read failed: {}",
                    bus, address, e
                );
                continue;
            }
        };

        if vid == vendor_id && pid == product_id {
            let (bus, address) = usb.location(&device);
            debug!(
                "Matched {:04x}:{:04x} at bus {:03} addr {:03}",
                vid, pid, bus, address
            );
            matches.push(device);
        }
    }

    Ok(matches)
}

/// Resolve the interface number this tool must claim.
///
/// The active configuration must expose exactly two interfaces, and the
/// second must expose exactly one alternate setting; the result is that
/// setting's `bInterfaceNumber`.
pub fn resolve_interface<B: UsbAccess>(usb: &B, device: &B::Device) -> Result<u8> {
    let layout = usb.active_config_layout(device).map_err(Error::ActiveConfig)?;

    if layout.interfaces.len() != 2 {
        return Err(TopologyError::InterfaceCount(layout.interfaces.len()).into());
    }

    let interface = &layout.interfaces[TARGET_INTERFACE];
    if interface.alt_settings.len() != 1 {
        return Err(TopologyError::AltSettingCount(interface.alt_settings.len()).into());
    }

    Ok(interface.alt_settings[0])
}

/// Full acquisition path: find exactly one dongle, resolve its interface,
/// and open a session (which sends the initialization report before
/// returning). Zero or multiple matches fail with every held device
/// reference released.
pub fn find_switch<B: UsbAccess>(usb: &B) -> Result<Session<'_, B>> {
    let mut matches = find_devices(usb, VENDOR_ID, PRODUCT_ID)?;

    let device = match matches.len() {
        1 => matches.remove(0),
        0 => return Err(TopologyError::NoMatch.into()),
        n => return Err(TopologyError::MultipleMatches(n).into()),
    };

    let interface = resolve_interface(usb, &device)?;
    debug!("Resolved target interface {}", interface);

    Session::open(usb, device, interface)
}

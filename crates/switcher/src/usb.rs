//! USB access layer seam
//!
//! [`UsbAccess`] models the capability set this tool consumes from libusb:
//! enumeration, descriptor introspection, open, kernel-driver management,
//! interface claiming, and synchronous control transfers. [`RusbAccess`] is
//! the production implementation over a `rusb::Context`; the
//! [`testing`](crate::testing) module provides a scripted one.
//!
//! Ownership follows rusb conventions: dropping a `Device` releases its
//! reference, dropping a `Handle` closes it.

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};

/// Owned snapshot of a device's active configuration: for each interface,
/// the `bInterfaceNumber` of each alternate setting, in descriptor order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayout {
    pub interfaces: Vec<InterfaceLayout>,
}

/// One interface of the active configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceLayout {
    pub alt_settings: Vec<u8>,
}

/// Capability surface of the USB access layer.
pub trait UsbAccess {
    /// An owned reference to one device on the bus.
    type Device;
    /// An open handle to a device.
    type Handle;

    /// Enumerate every device currently visible on the bus.
    fn devices(&self) -> Result<Vec<Self::Device>, rusb::Error>;

    /// Vendor and product IDs from the device descriptor.
    fn device_ids(&self, device: &Self::Device) -> Result<(u16, u16), rusb::Error>;

    /// Bus number and device address, for diagnostics.
    fn location(&self, device: &Self::Device) -> (u8, u8);

    /// Snapshot of the active configuration descriptor.
    fn active_config_layout(&self, device: &Self::Device) -> Result<ConfigLayout, rusb::Error>;

    /// Open a handle to the device.
    fn open(&self, device: &Self::Device) -> Result<Self::Handle, rusb::Error>;

    /// Whether a kernel driver is currently bound to the interface.
    fn kernel_driver_active(
        &self,
        handle: &Self::Handle,
        interface: u8,
    ) -> Result<bool, rusb::Error>;

    /// Unbind the kernel driver from the interface.
    fn detach_kernel_driver(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error>;

    /// Rebind the kernel driver to the interface.
    fn attach_kernel_driver(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error>;

    /// Claim exclusive access to the interface.
    fn claim_interface(&self, handle: &mut Self::Handle, interface: u8)
    -> Result<(), rusb::Error>;

    /// Release a previously claimed interface.
    fn release_interface(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error>;

    /// Synchronous host-to-device control transfer; returns the byte count
    /// actually written.
    #[allow(clippy::too_many_arguments)]
    fn write_control(
        &self,
        handle: &Self::Handle,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;
}

/// Production access layer over a `rusb::Context`.
pub struct RusbAccess {
    context: Context,
}

impl RusbAccess {
    /// Initialize a libusb context.
    pub fn new() -> Result<Self, rusb::Error> {
        Ok(Self {
            context: Context::new()?,
        })
    }
}

impl UsbAccess for RusbAccess {
    type Device = Device<Context>;
    type Handle = DeviceHandle<Context>;

    fn devices(&self) -> Result<Vec<Self::Device>, rusb::Error> {
        Ok(self.context.devices()?.iter().collect())
    }

    fn device_ids(&self, device: &Self::Device) -> Result<(u16, u16), rusb::Error> {
        let descriptor = device.device_descriptor()?;
        Ok((descriptor.vendor_id(), descriptor.product_id()))
    }

    fn location(&self, device: &Self::Device) -> (u8, u8) {
        (device.bus_number(), device.address())
    }

    fn active_config_layout(&self, device: &Self::Device) -> Result<ConfigLayout, rusb::Error> {
        let config = device.active_config_descriptor()?;
        let interfaces = config
            .interfaces()
            .map(|interface| InterfaceLayout {
                alt_settings: interface
                    .descriptors()
                    .map(|setting| setting.interface_number())
                    .collect(),
            })
            .collect();
        Ok(ConfigLayout { interfaces })
    }

    fn open(&self, device: &Self::Device) -> Result<Self::Handle, rusb::Error> {
        device.open()
    }

    fn kernel_driver_active(
        &self,
        handle: &Self::Handle,
        interface: u8,
    ) -> Result<bool, rusb::Error> {
        handle.kernel_driver_active(interface)
    }

    fn detach_kernel_driver(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error> {
        handle.detach_kernel_driver(interface)
    }

    fn attach_kernel_driver(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error> {
        handle.attach_kernel_driver(interface)
    }

    fn claim_interface(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error> {
        handle.claim_interface(interface)
    }

    fn release_interface(
        &self,
        handle: &mut Self::Handle,
        interface: u8,
    ) -> Result<(), rusb::Error> {
        handle.release_interface(interface)
    }

    fn write_control(
        &self,
        handle: &Self::Handle,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        handle.write_control(request_type, request, value, index, data, timeout)
    }
}

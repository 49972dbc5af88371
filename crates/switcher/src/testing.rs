//! Test doubles for exercising the acquisition lifecycle without hardware
//!
//! [`FakeUsb`] implements [`UsbAccess`] over scripted state: a device table,
//! per-operation injected failures, and a FIFO of transfer replies. Every
//! call is appended to an event log, including the implicit close/unref that
//! happen when fake handles and device tokens drop, so tests can assert
//! exact acquisition/release ordering and reference balance.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::usb::{ConfigLayout, InterfaceLayout, UsbAccess};

/// One recorded access-layer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Enumerate,
    Open {
        index: usize,
    },
    DriverQuery,
    Detach,
    Attach,
    Claim {
        interface: u8,
    },
    Release {
        interface: u8,
    },
    Transfer {
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: Vec<u8>,
    },
    Close,
    Unref {
        index: usize,
    },
}

/// Scripted outcome of one control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferReply {
    /// The transfer reports this many bytes written.
    Written(usize),
    /// The transfer fails with this error.
    Error(rusb::Error),
}

#[derive(Debug, Clone)]
struct DeviceSpec {
    vendor_id: u16,
    product_id: u16,
    layout: ConfigLayout,
    descriptor_error: Option<rusb::Error>,
}

#[derive(Debug, Default)]
struct Failures {
    enumerate: Option<rusb::Error>,
    active_config: Option<rusb::Error>,
    open: Option<rusb::Error>,
    driver_query: Option<rusb::Error>,
    detach: Option<rusb::Error>,
    attach: Option<rusb::Error>,
    claim: Option<rusb::Error>,
    release: Option<rusb::Error>,
}

#[derive(Debug, Default)]
struct State {
    devices: Vec<DeviceSpec>,
    driver_active: bool,
    failures: Failures,
    transfer_replies: VecDeque<TransferReply>,
    log: Vec<Event>,
}

/// Scripted [`UsbAccess`] implementation.
#[derive(Debug, Default, Clone)]
pub struct FakeUsb {
    state: Arc<Mutex<State>>,
}

/// A fake device token; logs `Unref` when dropped.
pub struct FakeDevice {
    index: usize,
    state: Arc<Mutex<State>>,
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap()
            .log
            .push(Event::Unref { index: self.index });
    }
}

/// A fake open handle; logs `Close` when dropped.
pub struct FakeHandle {
    state: Arc<Mutex<State>>,
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.state.lock().unwrap().log.push(Event::Close);
    }
}

impl FakeUsb {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two-interface layout of a healthy dongle, with the vendor HID
    /// interface bearing the given number.
    pub fn switch_layout(interface_number: u8) -> ConfigLayout {
        ConfigLayout {
            interfaces: vec![
                InterfaceLayout {
                    alt_settings: vec![0],
                },
                InterfaceLayout {
                    alt_settings: vec![interface_number],
                },
            ],
        }
    }

    /// Add a device to the scripted bus.
    pub fn add_device(&self, vendor_id: u16, product_id: u16, layout: ConfigLayout) {
        self.state.lock().unwrap().devices.push(DeviceSpec {
            vendor_id,
            product_id,
            layout,
            descriptor_error: None,
        });
    }

    /// Add a device whose descriptor read fails; the matcher must skip it.
    pub fn add_unreadable_device(&self, error: rusb::Error) {
        self.state.lock().unwrap().devices.push(DeviceSpec {
            vendor_id: 0,
            product_id: 0,
            layout: ConfigLayout { interfaces: vec![] },
            descriptor_error: Some(error),
        });
    }

    /// Script whether a kernel driver is bound to the target interface.
    pub fn set_driver_active(&self, active: bool) {
        self.state.lock().unwrap().driver_active = active;
    }

    pub fn fail_enumeration(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.enumerate = Some(error);
    }

    pub fn fail_active_config(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.active_config = Some(error);
    }

    pub fn fail_open(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.open = Some(error);
    }

    pub fn fail_driver_query(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.driver_query = Some(error);
    }

    pub fn fail_detach(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.detach = Some(error);
    }

    pub fn fail_attach(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.attach = Some(error);
    }

    pub fn fail_claim(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.claim = Some(error);
    }

    pub fn fail_release(&self, error: rusb::Error) {
        self.state.lock().unwrap().failures.release = Some(error);
    }

    /// Queue the outcome of the next unscripted transfer. Transfers with no
    /// queued reply report a full write.
    pub fn push_transfer_reply(&self, reply: TransferReply) {
        self.state.lock().unwrap().transfer_replies.push_back(reply);
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().log.clone()
    }
}

impl UsbAccess for FakeUsb {
    type Device = FakeDevice;
    type Handle = FakeHandle;

    fn devices(&self) -> Result<Vec<FakeDevice>, rusb::Error> {
        let count = {
            let mut state = self.state.lock().unwrap();
            state.log.push(Event::Enumerate);
            if let Some(error) = state.failures.enumerate {
                return Err(error);
            }
            state.devices.len()
        };

        Ok((0..count)
            .map(|index| FakeDevice {
                index,
                state: Arc::clone(&self.state),
            })
            .collect())
    }

    fn device_ids(&self, device: &FakeDevice) -> Result<(u16, u16), rusb::Error> {
        let state = self.state.lock().unwrap();
        let spec = &state.devices[device.index];
        match spec.descriptor_error {
            Some(error) => Err(error),
            None => Ok((spec.vendor_id, spec.product_id)),
        }
    }

    fn location(&self, device: &FakeDevice) -> (u8, u8) {
        (1, device.index as u8 + 1)
    }

    fn active_config_layout(&self, device: &FakeDevice) -> Result<ConfigLayout, rusb::Error> {
        let state = self.state.lock().unwrap();
        if let Some(error) = state.failures.active_config {
            return Err(error);
        }
        Ok(state.devices[device.index].layout.clone())
    }

    fn open(&self, device: &FakeDevice) -> Result<FakeHandle, rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::Open {
            index: device.index,
        });
        if let Some(error) = state.failures.open {
            return Err(error);
        }
        Ok(FakeHandle {
            state: Arc::clone(&self.state),
        })
    }

    fn kernel_driver_active(
        &self,
        _handle: &FakeHandle,
        _interface: u8,
    ) -> Result<bool, rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::DriverQuery);
        if let Some(error) = state.failures.driver_query {
            return Err(error);
        }
        Ok(state.driver_active)
    }

    fn detach_kernel_driver(
        &self,
        _handle: &mut FakeHandle,
        _interface: u8,
    ) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::Detach);
        match state.failures.detach {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn attach_kernel_driver(
        &self,
        _handle: &mut FakeHandle,
        _interface: u8,
    ) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::Attach);
        match state.failures.attach {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn claim_interface(&self, _handle: &mut FakeHandle, interface: u8) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::Claim { interface });
        match state.failures.claim {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn release_interface(
        &self,
        _handle: &mut FakeHandle,
        interface: u8,
    ) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::Release { interface });
        match state.failures.release {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn write_control(
        &self,
        _handle: &FakeHandle,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Event::Transfer {
            request_type,
            request,
            value,
            index,
            data: data.to_vec(),
        });
        match state.transfer_replies.pop_front() {
            None => Ok(data.len()),
            Some(TransferReply::Written(n)) => Ok(n),
            Some(TransferReply::Error(error)) => Err(error),
        }
    }
}

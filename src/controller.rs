//! HID transport abstraction.

use std::convert::TryFrom;
use std::time::Duration;

use bytes::Bytes;
use hidapi::{HidApi, HidDevice};
use tracing::debug;

use crate::blob::PACKET_SIZE;
use crate::error::{Error, Result};

/// HID vendor ID of the LED controller.
pub const VENDOR_ID: u16 = 0x2516;

/// HID product ID of the LED controller.
pub const PRODUCT_ID: u16 = 0x0051;

/// HID interface carrying the LED reports.
pub const INTERFACE: i32 = 1;

/// Byte-in, byte-out peer exchanging fixed size reports.
pub trait Transport {
    /// Write one 64 byte report and read the 64 byte reply.
    fn exchange(&mut self, request: &[u8], timeout: Duration) -> Result<Bytes>;
}

/// Transport backed by a hidapi device handle.
pub struct HidTransport {
    device: HidDevice,
}

impl HidTransport {
    /// Open the LED controller interface.
    pub fn open() -> Result<Self> {
        let api = HidApi::new()?;

        let info = api
            .device_list()
            .find(|info| {
                info.vendor_id() == VENDOR_ID
                    && info.product_id() == PRODUCT_ID
                    && info.interface_number() == INTERFACE
            })
            .ok_or_else(|| Error::Io(format!("no device {:04x}:{:04x} found", VENDOR_ID, PRODUCT_ID)))?;

        debug!("Opening {:?}", info.path());

        Ok(Self { device: info.open_device(&api)? })
    }
}

impl Transport for HidTransport {
    fn exchange(&mut self, request: &[u8], timeout: Duration) -> Result<Bytes> {
        if request.len() != PACKET_SIZE {
            return Err(Error::InvalidLength { expected: PACKET_SIZE, actual: request.len() });
        }

        // Reports are unnumbered, so hidapi expects a leading zero report ID.
        let mut report = Vec::with_capacity(PACKET_SIZE + 1);
        report.push(0x00);
        report.extend_from_slice(request);

        let written = self.device.write(&report)?;
        if written < PACKET_SIZE {
            return Err(Error::Io(format!("short write: {} of {} bytes", written, PACKET_SIZE)));
        }

        let mut reply = [0; PACKET_SIZE];
        let timeout = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        match self.device.read_timeout(&mut reply, timeout)? {
            0 => Err(Error::Timeout),
            PACKET_SIZE => Ok(Bytes::copy_from_slice(&reply)),
            read => Err(Error::Io(format!("short read: {} of {} bytes", read, PACKET_SIZE))),
        }
    }
}

//! Discovery, exclusive open and write path for the light bar HID device.

use crate::error::Error;
use crate::packet::{REPORT_LEN, Report};

use hidapi::HidApi;
use log::{debug, info};

/// USB vendor id of the light bar.
pub const VENDOR_ID: u16 = 0x0B05;
/// USB product id of the light bar.
pub const PRODUCT_ID: u16 = 0x1AC8;

/// An open, writable connection to the device.
///
/// Any write error invalidates the transport; callers must close the owning
/// [`Session`] and rediscover.
pub trait Transport: Send {
    /// Send one fixed-size output report.
    fn write_report(&mut self, report: &Report) -> Result<(), Error>;
}

/// Opens transports. One open per device session.
///
/// Implemented by [`HidBackend`] for real hardware and by
/// [`MockBackend`](crate::mock::MockBackend) in tests.
pub trait DeviceBackend: Send {
    /// Enumerate devices, find the light bar and open it exclusively.
    ///
    /// Returns [`Error::DeviceNotFound`] when no matching device is attached
    /// and [`Error::DeviceOpenFailed`] when a match exists but cannot be
    /// opened (busy, permissions). Both are recoverable search failures.
    fn open(&mut self) -> Result<Box<dyn Transport>, Error>;
}

/// Real HID backend over `hidapi`.
///
/// The `HidApi` context is created lazily on the first open so that even a
/// failing HID subsystem stays inside the supervised retry loop instead of
/// aborting startup.
#[derive(Default)]
pub struct HidBackend {
    api: Option<HidApi>,
}

impl HidBackend {
    /// Create the backend without touching the HID subsystem yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn api(&mut self) -> Result<&mut HidApi, Error> {
        if self.api.is_none() {
            let api = HidApi::new().map_err(|err| Error::Backend(err.to_string()))?;
            self.api = Some(api);
        }
        match self.api.as_mut() {
            Some(api) => Ok(api),
            None => Err(Error::Backend("HID context missing".into())),
        }
    }
}

impl DeviceBackend for HidBackend {
    fn open(&mut self) -> Result<Box<dyn Transport>, Error> {
        let api = self.api()?;
        api.refresh_devices()
            .map_err(|err| Error::Backend(err.to_string()))?;

        let info = api
            .device_list()
            .find(|info| info.vendor_id() == VENDOR_ID && info.product_id() == PRODUCT_ID)
            .ok_or(Error::DeviceNotFound)?;

        let device = info
            .open_device(api)
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;
        info!(
            "opened light bar {:04x}:{:04x}",
            info.vendor_id(),
            info.product_id()
        );
        Ok(Box::new(HidTransport { device }))
    }
}

struct HidTransport {
    device: hidapi::HidDevice,
}

impl Transport for HidTransport {
    fn write_report(&mut self, report: &Report) -> Result<(), Error> {
        let written = self
            .device
            .write(report)
            .map_err(|err| Error::DeviceIo(err.to_string()))?;
        if written != REPORT_LEN {
            return Err(Error::DeviceIo(format!(
                "short write: {written} of {REPORT_LEN} bytes"
            )));
        }
        Ok(())
    }
}

/// One open-to-close lifetime of the device transport.
///
/// Closing is idempotent and releases the transport on every path,
/// including the error paths that send the loop back to discovery.
pub struct Session {
    transport: Option<Box<dyn Transport>>,
}

impl Session {
    /// Wrap a freshly opened transport.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    /// Write one report, or fail with [`Error::DeviceIo`] if the session
    /// was already closed.
    pub fn write(&mut self, report: &Report) -> Result<(), Error> {
        match self.transport.as_mut() {
            Some(transport) => transport.write_report(report),
            None => Err(Error::DeviceIo("session closed".into())),
        }
    }

    /// Release the transport. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("device session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

//! Error types for the light bar service.

/// Errors that can occur while driving the light bar.
///
/// The first four variants map directly onto the service's retry behavior:
/// [`DeviceNotFound`](Error::DeviceNotFound) and
/// [`DeviceOpenFailed`](Error::DeviceOpenFailed) keep the loop searching,
/// while [`DeviceIo`](Error::DeviceIo) and [`Capture`](Error::Capture) tear
/// the current session down and restart discovery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No HID device with the expected vendor/product id is attached.
    #[error("no matching light bar device found")]
    DeviceNotFound,

    /// A matching device exists but could not be opened exclusively.
    #[error("failed to open device: {0}")]
    DeviceOpenFailed(String),

    /// A report write failed mid-session; the session must be closed.
    #[error("device write failed: {0}")]
    DeviceIo(String),

    /// Screen capture failed; treated exactly like a device I/O failure.
    #[error("screen capture failed: {0}")]
    Capture(String),

    /// The HID backend itself could not be initialized.
    #[error("HID backend unavailable: {0}")]
    Backend(String),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// An I/O error occurred (e.g., reading the configuration file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error belongs to the discovery phase, i.e. no session
    /// existed when it occurred.
    pub fn is_search_failure(&self) -> bool {
        matches!(self, Error::DeviceNotFound | Error::DeviceOpenFailed(_))
    }
}

//! Screen-sync ambient lighting engine for the ASUS ROG light bar.
//!
//! This crate drives the light bar (USB HID `0b05:1ac8`) from live screen
//! content: each tick it captures a fixed 200x150 window centered on the
//! desktop, reduces it to one average color, smooths it with a per-session
//! EMA, scales it to the user brightness, encodes it into the two vendor
//! HID reports and streams them to the device. A supervised state machine
//! owns discovery, exclusive open and reconnect-on-failure, so the service
//! keeps running for as long as the process lives.
//!
//! # Example
//!
//! ```no_run
//! use lightbar_core::{AppConfig, HidBackend, ScreenSource, Service, ServiceHandle};
//!
//! let config = AppConfig::load_or_default("lightbar.json");
//! let handle = ServiceHandle::new(config);
//!
//! // The handle is the seam for an external settings UI: clone it, flip
//! // run/pause, adjust brightness, request a graceful stop.
//! let controls = handle.clone();
//! controls.set_brightness(60);
//!
//! Service::new(Box::new(HidBackend::new()), ScreenSource::new(), handle).run();
//! ```
//!
//! # Testing
//!
//! [`MockBackend`] and [`MockSource`] exercise the full loop without any
//! hardware:
//!
//! ```
//! use lightbar_core::{AppConfig, MockBackend, MockLedger, MockSource, Service, ServiceHandle};
//! use lightbar_core::{Cadence, RetryPolicy};
//! use std::time::Duration;
//!
//! let ledger = MockLedger::new();
//! let handle = ServiceHandle::new(AppConfig::default());
//! handle.request_stop();
//!
//! let mut service = Service::new(
//!     Box::new(MockBackend::new(ledger.clone())),
//!     MockSource::solid((100, 150, 200)),
//!     handle,
//! )
//! .with_timing(
//!     Cadence { tick: Duration::ZERO, paused: Duration::ZERO },
//!     RetryPolicy { search: Duration::ZERO, restart: Duration::ZERO },
//! );
//! service.run();
//! ```
//!
//! # Disclaimer
//!
//! This is an **unofficial** tool built from observed wire traffic. It is
//! not affiliated with or endorsed by ASUS. Use at your own risk.

#![warn(missing_docs)]

mod capture;
mod color;
mod config;
mod error;
mod mock;
mod packet;
mod service;
mod session;
mod state;

pub use capture::{
    CAPTURE_HEIGHT, CAPTURE_WIDTH, PixelBuffer, PixelSource, ScreenSource, capture_origin,
};
pub use color::{
    FinalColor, HARDWARE_CEILING, RawColor, SAMPLE_STRIDE, SMOOTH_FACTOR, Smoother, average,
    effective_limit, scale,
};
pub use config::AppConfig;
pub use error::Error;
pub use mock::{MockBackend, MockLedger, MockSource};
pub use packet::{REPORT_LEN, Report, black_report, mode_report, stream_report};
pub use service::{Cadence, RetryPolicy, Service};
pub use session::{DeviceBackend, HidBackend, PRODUCT_ID, Session, Transport, VENDOR_ID};
pub use state::{ControlSnapshot, RunState, ServiceHandle};

//! Mock pixel source and device backend for testing.
//!
//! These allow exercising the full control loop without a screen or the
//! actual light bar attached.

use crate::capture::{CAPTURE_HEIGHT, CAPTURE_WIDTH, PixelBuffer, PixelSource};
use crate::error::Error;
use crate::packet::Report;
use crate::session::{DeviceBackend, Transport};

use std::sync::{Arc, Mutex, MutexGuard};

/// A pixel source producing solid-color frames.
///
/// Counts captures and can be scripted to fail, to verify both the paused
/// path (no captures at all) and capture-failure recovery.
#[derive(Debug, Clone)]
pub struct MockSource {
    color: (u8, u8, u8),
    captures: Arc<Mutex<u64>>,
    fail: Arc<Mutex<bool>>,
}

impl MockSource {
    /// A source whose every frame is uniformly `(r, g, b)`.
    pub fn solid(color: (u8, u8, u8)) -> Self {
        Self {
            color,
            captures: Arc::new(Mutex::new(0)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// How many frames have been captured so far.
    pub fn captures(&self) -> u64 {
        *lock(&self.captures)
    }

    /// Make every subsequent capture fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.fail) = failing;
    }
}

impl PixelSource for MockSource {
    fn capture(&mut self, _origin: (u32, u32)) -> Result<PixelBuffer, Error> {
        if *lock(&self.fail) {
            return Err(Error::Capture("mock capture failure".into()));
        }
        *lock(&self.captures) += 1;
        Ok(PixelBuffer::solid(CAPTURE_WIDTH, CAPTURE_HEIGHT, self.color))
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    writes: Vec<Report>,
    opens: u64,
    fail_opens: u64,
    fail_write_after: Option<u64>,
    writes_until_failure: u64,
}

/// Shared record of everything a [`MockBackend`] session observed.
///
/// Cloning shares the underlying state, so tests keep one handle while the
/// service owns the backend.
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    /// An empty ledger; opens succeed and writes never fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report written across all sessions, in order.
    pub fn writes(&self) -> Vec<Report> {
        lock(&self.state).writes.clone()
    }

    /// How many times a transport was opened.
    pub fn opens(&self) -> u64 {
        lock(&self.state).opens
    }

    /// Make the next `n` open attempts fail with `DeviceNotFound`.
    pub fn fail_next_opens(&self, n: u64) {
        lock(&self.state).fail_opens = n;
    }

    /// Fail the write after `n` more successful writes, once.
    pub fn fail_write_after(&self, n: u64) {
        let mut state = lock(&self.state);
        state.fail_write_after = Some(n);
        state.writes_until_failure = n;
    }
}

/// Device backend recording into a [`MockLedger`].
#[derive(Debug, Clone)]
pub struct MockBackend {
    ledger: MockLedger,
}

impl MockBackend {
    /// A backend recording into `ledger`.
    pub fn new(ledger: MockLedger) -> Self {
        Self { ledger }
    }
}

impl DeviceBackend for MockBackend {
    fn open(&mut self) -> Result<Box<dyn Transport>, Error> {
        let mut state = lock(&self.ledger.state);
        state.opens += 1;
        if state.fail_opens > 0 {
            state.fail_opens -= 1;
            return Err(Error::DeviceNotFound);
        }
        Ok(Box::new(MockTransport {
            ledger: self.ledger.clone(),
        }))
    }
}

struct MockTransport {
    ledger: MockLedger,
}

impl Transport for MockTransport {
    fn write_report(&mut self, report: &Report) -> Result<(), Error> {
        let mut state = lock(&self.ledger.state);
        if state.fail_write_after.is_some() {
            if state.writes_until_failure == 0 {
                state.fail_write_after = None;
                return Err(Error::DeviceIo("mock write failure".into()));
            }
            state.writes_until_failure -= 1;
        }
        state.writes.push(*report);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::black_report;

    #[test]
    fn ledger_records_writes_in_order() {
        let ledger = MockLedger::new();
        let mut backend = MockBackend::new(ledger.clone());
        let mut transport = backend.open().unwrap();
        transport.write_report(&black_report()).unwrap();
        transport.write_report(&black_report()).unwrap();
        assert_eq!(ledger.opens(), 1);
        assert_eq!(ledger.writes().len(), 2);
    }

    #[test]
    fn scripted_write_failure_fires_once() {
        let ledger = MockLedger::new();
        ledger.fail_write_after(1);
        let mut backend = MockBackend::new(ledger.clone());
        let mut transport = backend.open().unwrap();
        transport.write_report(&black_report()).unwrap();
        assert!(transport.write_report(&black_report()).is_err());
        transport.write_report(&black_report()).unwrap();
        assert_eq!(ledger.writes().len(), 2);
    }

    #[test]
    fn mock_source_counts_and_fails_on_demand() {
        let mut source = MockSource::solid((1, 2, 3));
        source.capture((0, 0)).unwrap();
        assert_eq!(source.captures(), 1);
        source.set_failing(true);
        assert!(source.capture((0, 0)).is_err());
        assert_eq!(source.captures(), 1);
    }
}

//! The control loop: capture, reduce, smooth, scale, encode, transmit.
//!
//! One dedicated worker runs this loop; ticks are strictly sequential and
//! all capture and device I/O happens in-line. Failures never surface to a
//! user — the loop retries indefinitely under a typed retry policy, and an
//! outer supervisor restarts the whole state machine if anything escapes.

use crate::capture::{PixelSource, capture_origin};
use crate::color::{FinalColor, Smoother, average, scale};
use crate::error::Error;
use crate::packet::{black_report, mode_report, stream_report};
use crate::session::{DeviceBackend, Session};
use crate::state::{ControlSnapshot, RunState, ServiceHandle};

use log::{debug, error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

/// Sleep intervals between loop iterations.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    /// Delay after a running tick (~100 Hz target, best-effort).
    pub tick: Duration,
    /// Delay between black frames while paused.
    pub paused: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            paused: Duration::from_millis(500),
        }
    }
}

/// The retry-forever behavior as an explicit policy: error kind in, backoff
/// out, next state always "try again".
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Backoff after a failed discovery or open attempt.
    pub search: Duration,
    /// Backoff before the supervisor restarts the state machine.
    pub restart: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            search: Duration::from_millis(2000),
            restart: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    /// The backoff to apply for an error: search failures wait the short
    /// discovery interval, everything else the supervisor restart interval.
    pub fn backoff_for(&self, err: &Error) -> Duration {
        if err.is_search_failure() {
            self.search
        } else {
            self.restart
        }
    }
}

/// The service worker: owns the device backend, the pixel source and the
/// per-session smoothing state, and runs the Searching ↔ Connected state
/// machine until a stop is requested.
pub struct Service<S: PixelSource> {
    backend: Box<dyn DeviceBackend>,
    source: S,
    handle: ServiceHandle,
    smoother: Smoother,
    cadence: Cadence,
    policy: RetryPolicy,
}

impl<S: PixelSource> Service<S> {
    /// Create a service with the default cadence and retry policy.
    pub fn new(backend: Box<dyn DeviceBackend>, source: S, handle: ServiceHandle) -> Self {
        Self {
            backend,
            source,
            handle,
            smoother: Smoother::new(),
            cadence: Cadence::default(),
            policy: RetryPolicy::default(),
        }
    }

    /// Override the sleep intervals, mainly for tests.
    pub fn with_timing(mut self, cadence: Cadence, policy: RetryPolicy) -> Self {
        self.cadence = cadence;
        self.policy = policy;
        self
    }

    /// Run under the supervisor: anything escaping the state machine,
    /// error or panic, is logged, waited out, and followed by a full
    /// restart from Searching. Returns only once a stop has been requested
    /// through the handle.
    pub fn run(&mut self) {
        info!("light bar service starting");
        while !self.handle.stop_requested() {
            match panic::catch_unwind(AssertUnwindSafe(|| self.serve())) {
                Ok(Ok(())) => break,
                Ok(Err(err)) => {
                    error!(
                        "service loop failed: {err}; restarting in {:?}",
                        self.policy.restart
                    );
                    thread::sleep(self.policy.restart);
                }
                Err(_) => {
                    error!(
                        "service loop panicked; restarting in {:?}",
                        self.policy.restart
                    );
                    thread::sleep(self.policy.restart);
                }
            }
        }
        info!("light bar service stopped");
    }

    /// The Searching state: discover and open, then hand the session to
    /// [`drive`](Self::drive). Search failures back off and retry here;
    /// session failures close the session and land back here; anything
    /// else escapes to the supervisor.
    fn serve(&mut self) -> Result<(), Error> {
        loop {
            if self.handle.stop_requested() {
                return Ok(());
            }
            match self.backend.open() {
                Ok(transport) => {
                    let mut session = Session::new(transport);
                    self.smoother.reset();
                    let outcome = self.drive(&mut session);
                    session.close();
                    match outcome {
                        Ok(()) => return Ok(()),
                        Err(err) => {
                            let backoff = self.policy.backoff_for(&err);
                            warn!("session ended: {err}; searching again in {backoff:?}");
                            thread::sleep(backoff);
                        }
                    }
                }
                Err(err) if err.is_search_failure() => {
                    debug!("searching: {err}");
                    thread::sleep(self.policy.backoff_for(&err));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The Connected state. Writes the mode report once as session
    /// initialization, then loops: paused ticks stream black at the slow
    /// cadence without capturing; running ticks run the full pipeline and
    /// write the mode report followed by the stream report. The repeated
    /// mode write mirrors the device's observed protocol and must stay.
    fn drive(&mut self, session: &mut Session) -> Result<(), Error> {
        session.write(&mode_report(FinalColor::BLACK))?;
        loop {
            let snapshot = self.handle.snapshot();
            if snapshot.stop {
                return Ok(());
            }
            match snapshot.run_state {
                RunState::Paused => {
                    session.write(&black_report())?;
                    thread::sleep(self.cadence.paused);
                }
                RunState::Running => {
                    let color = self.next_color(&snapshot)?;
                    session.write(&mode_report(color))?;
                    session.write(&stream_report(color))?;
                    thread::sleep(self.cadence.tick);
                }
            }
        }
    }

    /// One pass of the color pipeline: capture the centered window, average
    /// the sample grid, fold into the session EMA, scale to brightness.
    fn next_color(&mut self, snapshot: &ControlSnapshot) -> Result<FinalColor, Error> {
        let origin = capture_origin(
            snapshot.config.screen_width,
            snapshot.config.screen_height,
        );
        let frame = self.source.capture(origin)?;
        let raw = average(&frame);
        let smoothed = self.smoother.update(raw);
        Ok(scale(smoothed, snapshot.config.brightness()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_matches_the_device_protocol() {
        let cadence = Cadence::default();
        assert_eq!(cadence.tick, Duration::from_millis(10));
        assert_eq!(cadence.paused, Duration::from_millis(500));

        let policy = RetryPolicy::default();
        assert_eq!(policy.search, Duration::from_millis(2000));
        assert_eq!(policy.restart, Duration::from_millis(3000));
    }

    #[test]
    fn policy_maps_error_kinds_to_backoffs() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(&Error::DeviceNotFound), policy.search);
        assert_eq!(
            policy.backoff_for(&Error::DeviceOpenFailed("busy".into())),
            policy.search
        );
        assert_eq!(
            policy.backoff_for(&Error::DeviceIo("gone".into())),
            policy.restart
        );
        assert_eq!(
            policy.backoff_for(&Error::Capture("lost".into())),
            policy.restart
        );
    }
}

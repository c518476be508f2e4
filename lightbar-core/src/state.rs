//! Shared run-state between the service worker and its controller.

use crate::config::AppConfig;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// Whether the service is actively mirroring the screen or idling dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Capture, smooth and stream colors every tick.
    Running,
    /// Keep the session open but stream black at a slow cadence.
    Paused,
}

/// A consistent-enough view of the shared state, taken once per tick.
#[derive(Debug, Clone, Copy)]
pub struct ControlSnapshot {
    /// Screen/brightness settings as of this tick.
    pub config: AppConfig,
    /// Run/pause toggle as of this tick.
    pub run_state: RunState,
    /// Whether a graceful shutdown was requested.
    pub stop: bool,
}

#[derive(Debug)]
struct Shared {
    screen_width: AtomicU32,
    screen_height: AtomicU32,
    brightness_percent: AtomicU8,
    running: AtomicBool,
    stop: AtomicBool,
}

/// Cloneable handle over the state shared between the UI context (writer)
/// and the service worker (reader).
///
/// Each field is an independent atomic: the worker reads a snapshot once per
/// tick and a torn width/height pair is tolerated for a single frame. There
/// is deliberately no lock on this path.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    shared: Arc<Shared>,
}

impl ServiceHandle {
    /// Create a handle seeded from a configuration document, starting in
    /// the [`RunState::Running`] state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                screen_width: AtomicU32::new(config.screen_width),
                screen_height: AtomicU32::new(config.screen_height),
                brightness_percent: AtomicU8::new(config.brightness()),
                running: AtomicBool::new(true),
                stop: AtomicBool::new(false),
            }),
        }
    }

    /// Update the logical desktop resolution.
    pub fn set_resolution(&self, width: u32, height: u32) {
        self.shared.screen_width.store(width, Ordering::SeqCst);
        self.shared.screen_height.store(height, Ordering::SeqCst);
    }

    /// Update the brightness setting, clamped to 0-100.
    pub fn set_brightness(&self, percent: u8) {
        self.shared
            .brightness_percent
            .store(percent.min(100), Ordering::SeqCst);
    }

    /// Toggle between running and paused.
    pub fn set_running(&self, running: bool) {
        self.shared.running.store(running, Ordering::SeqCst);
    }

    /// Ask the supervisor to wind down at the next poll point.
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.shared.stop.load(Ordering::SeqCst)
    }

    /// Take the per-tick snapshot of all shared values.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            config: AppConfig {
                screen_width: self.shared.screen_width.load(Ordering::SeqCst),
                screen_height: self.shared.screen_height.load(Ordering::SeqCst),
                brightness_percent: self.shared.brightness_percent.load(Ordering::SeqCst),
            },
            run_state: if self.shared.running.load(Ordering::SeqCst) {
                RunState::Running
            } else {
                RunState::Paused
            },
            stop: self.shared.stop.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_with_seed_config() {
        let handle = ServiceHandle::new(AppConfig::default());
        let snap = handle.snapshot();
        assert_eq!(snap.run_state, RunState::Running);
        assert_eq!(snap.config, AppConfig::default());
        assert!(!snap.stop);
    }

    #[test]
    fn writes_are_visible_in_the_next_snapshot() {
        let handle = ServiceHandle::new(AppConfig::default());
        handle.set_resolution(1920, 1080);
        handle.set_brightness(130);
        handle.set_running(false);

        let snap = handle.snapshot();
        assert_eq!(snap.config.screen_width, 1920);
        assert_eq!(snap.config.screen_height, 1080);
        assert_eq!(snap.config.brightness_percent, 100, "clamped on write");
        assert_eq!(snap.run_state, RunState::Paused);
    }

    #[test]
    fn stop_request_is_shared_across_clones() {
        let handle = ServiceHandle::new(AppConfig::default());
        let clone = handle.clone();
        clone.request_stop();
        assert!(handle.stop_requested());
        assert!(handle.snapshot().stop);
    }
}

//! Headless ambient-lighting daemon for the ASUS ROG light bar.
//!
//! Runs the capture→average→smooth→scale→encode→transmit loop on the main
//! thread until the process is terminated. No arguments are required; an
//! optional first argument overrides the configuration file path.

use lightbar_core::{AppConfig, HidBackend, ScreenSource, Service, ServiceHandle};
use log::info;

const DEFAULT_CONFIG_PATH: &str = "lightbar.json";

fn main() {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_or_default(&config_path);
    info!(
        "starting with {}x{} at {}% brightness (config: {config_path})",
        config.screen_width, config.screen_height, config.brightness_percent
    );

    // The handle stays cloneable for an external settings UI; the daemon
    // itself runs until the process is killed, like the original service.
    let handle = ServiceHandle::new(config);
    let mut service = Service::new(Box::new(HidBackend::new()), ScreenSource::new(), handle);
    service.run();
}

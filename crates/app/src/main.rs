//! Duty-cycle controller: wake, connect, fetch, render, sleep.
//!
//! The whole program is one linear pass. Every path out of `run` ends in
//! deep sleep; the next cycle starts from a hardware reset.

mod fetch;
mod hardware;
mod network;
mod retained;
mod ui;
mod wake;

use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use log::{error, info, warn};

use hardware::*;

/// This configuration is picked up at compile time by `build.rs` from the
/// file `cfg.toml`.
/// Defines CONFIG
#[derive(Debug)]
#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,
    #[default("")]
    wifi_psk: &'static str,
    #[default("")]
    wifi_bssid: &'static str,
    #[default("")]
    snapshot_url: &'static str,
    #[default("")]
    log_url: &'static str,
}

pub static APP_CONFIG: Config = CONFIG;

fn main() {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    run()
}

fn run() -> ! {
    let wake_cause = wake::classify();
    wake_cause.log();

    let sys_loop = EspSystemEventLoop::take().unwrap();
    let nvs = EspDefaultNvsPartition::take().unwrap();
    let SystemPeripherals {
        power:
            Power {
                main: mut pw_main,
                display: mut pw_display,
            },
        modem,
        display: mut display_hw,
        batt_adc: mut adc,
        batt_adc_pin: mut adc_pin,
    } = SystemPeripherals::take();

    pw_main.set_high().expect("main power pin");
    pw_display.set_high().expect("display power pin");

    info!("Configuration: {:?}", APP_CONFIG);

    let mut retained = retained::RetainedState::load();

    let connection = match network::connect(&sys_loop, &nvs, modem, &mut retained) {
        Ok(connection) => connection,
        Err(e) => {
            error!("Wifi connection failed: {e}");
            wake::fail_safe_sleep();
        }
    };

    let snapshot = match fetch::fetch_snapshot(APP_CONFIG.snapshot_url) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Snapshot fetch failed: {e}");
            fetch::report_diagnostic(APP_CONFIG.log_url, &format!("fetch failed: {e}"));
            wake::fail_safe_sleep();
        }
    };

    let battery_level = batt_gauge_create(&mut adc, &mut adc_pin)
        .and_then(|mut gauge| gauge.read_level())
        .unwrap_or_else(|e| {
            // A dashboard with an empty gauge beats no dashboard.
            warn!("Battery measurement failed: {e}");
            0
        });

    if let Err(e) = ui::render_and_flush(&mut display_hw, &snapshot, battery_level) {
        error!("Display refresh failed: {e}");
        wake::fail_safe_sleep();
    }

    drop(connection);
    drop(pw_display);
    drop(pw_main);

    wake::deep_sleep()
}

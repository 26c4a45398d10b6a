//! Wake-cause classification and the two ways back into deep sleep.

use std::time::Duration;

use esp_idf_svc::sys;
use log::{info, warn};

/// Cadence of the whole duty cycle; also the fail-safe retry interval.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// RTC-capable line wired to the side button, active low.
const WAKE_PIN: u32 = 38;
const WAKE_PIN_BITMASK: u64 = 1 << WAKE_PIN;

#[derive(Debug, Clone, Copy)]
pub enum WakeCause {
    /// Scheduled wake at the end of a refresh interval.
    Timer,
    /// One of the EXT1 lines was pulled low (the side button).
    ExternalSignal { pins: u64 },
    /// Anything else, including cold boot; handled like a timer wake.
    Other(u32),
}

pub fn classify() -> WakeCause {
    match unsafe { sys::esp_sleep_get_wakeup_cause() } {
        sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT1 => {
            let pins = unsafe { sys::esp_sleep_get_ext1_wakeup_status() };
            WakeCause::ExternalSignal { pins }
        }
        sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
        other => WakeCause::Other(other),
    }
}

impl WakeCause {
    pub fn log(&self) {
        match self {
            WakeCause::Timer => info!("Woke on refresh timer"),
            WakeCause::ExternalSignal { pins } => {
                // Which line fired is informational only; every wake runs
                // the same refresh cycle.
                for line in 0..64 {
                    if pins & (1 << line) != 0 {
                        info!("Woke on external signal, GPIO{line}");
                    }
                }
            }
            WakeCause::Other(cause) => info!("Woke with cause {cause}, treating as timer wake"),
        }
    }
}

/// Normal end of cycle: wake again on the timer or on the side button.
pub fn deep_sleep() -> ! {
    let armed = esp_idf_svc::sys::esp!(unsafe {
        sys::esp_sleep_enable_ext1_wakeup(
            WAKE_PIN_BITMASK,
            sys::esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ALL_LOW,
        )
    });
    if let Err(e) = armed {
        warn!("Unable to arm button wake: {e}");
    }
    enter(REFRESH_INTERVAL)
}

/// Terminal path for a failed cycle: skip the button wake and just retry
/// on the next scheduled refresh. The panel keeps the last good image.
pub fn fail_safe_sleep() -> ! {
    enter(REFRESH_INTERVAL)
}

fn enter(interval: Duration) -> ! {
    info!("Entering deep sleep for {} s", interval.as_secs());
    unsafe { sys::esp_deep_sleep(interval.as_micros() as u64) };
    unreachable!("deep sleep resets the chip")
}

//! The one scrap of state that survives between duty cycles.

use log::info;

// Lives in RTC slow memory, which stays powered through deep sleep. A cold
// boot or full power loss re-runs the initializer, dropping back to -1.
#[link_section = ".rtc.data"]
static mut LAST_WIFI_CHANNEL: i32 = -1;

/// Power-domain-scoped view over the retained channel scalar.
///
/// Lifecycle: read once at boot, written at most once per cycle after a
/// successful association. Failed cycles leave it untouched.
pub struct RetainedState {
    last_wifi_channel: i32,
}

impl RetainedState {
    pub fn load() -> Self {
        let last_wifi_channel = unsafe { LAST_WIFI_CHANNEL };
        info!("Retained wifi channel: {last_wifi_channel}");
        Self { last_wifi_channel }
    }

    /// `None` until the first successful association after a cold boot.
    pub fn last_wifi_channel(&self) -> Option<u8> {
        (1..=14)
            .contains(&self.last_wifi_channel)
            .then(|| self.last_wifi_channel as u8)
    }

    pub fn store_channel(&mut self, channel: u8) {
        self.last_wifi_channel = i32::from(channel);
        unsafe { LAST_WIFI_CHANNEL = self.last_wifi_channel };
    }
}

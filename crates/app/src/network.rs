//! Wi-Fi association with a cached-channel fast path.
//!
//! The negotiated channel from the previous cycle (if any) is tried first,
//! pinned to the configured BSSID so no scan is needed. If the AP moved
//! channels in the meantime that attempt fails and a single unconstrained
//! retry covers it. A second failure is fatal for the cycle.

use std::time::Instant;

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    sys::EspError,
    wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
use log::{info, warn};
use thiserror::Error;

use crate::retained::RetainedState;
use crate::APP_CONFIG;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("association failed on the cached channel and on a full scan")]
    AssociationTimeout,
    #[error(transparent)]
    Esp(#[from] EspError),
}

pub struct Connection {
    /// Kept alive for the duration of the cycle; dropping it tears the
    /// interface down.
    pub wifi: Box<EspWifi<'static>>,
}

/// Associates and, on success, persists the negotiated channel into
/// `retained`. This is the sole writer of the retained state; failures
/// leave it untouched.
pub fn connect(
    sys_loop: &EspSystemEventLoop,
    nvs: &EspDefaultNvsPartition,
    modem: Modem,
    retained: &mut RetainedState,
) -> Result<Connection, ConnectError> {
    let cached_channel = retained.last_wifi_channel();
    let started = Instant::now();
    let mut esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs.clone()))?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sys_loop.clone())?;

    wifi.wifi_mut()
        .set_configuration(&Configuration::Client(client_configuration(cached_channel)))?;
    wifi.start()?;

    if let Some(channel) = cached_channel {
        info!("Trying last known channel {channel} first");
    }

    if let Err(e) = associate(&mut wifi) {
        warn!("Association failed ({e}), the AP may have moved channels");

        let _ = wifi.disconnect();
        match channel_for_ssid(&mut wifi, APP_CONFIG.wifi_ssid) {
            Ok(Some(channel)) => info!("Scan finds '{}' on channel {channel}", APP_CONFIG.wifi_ssid),
            Ok(None) => warn!("Scan does not see '{}'", APP_CONFIG.wifi_ssid),
            Err(e) => warn!("Scan failed: {e}"),
        }

        wifi.wifi_mut()
            .set_configuration(&Configuration::Client(client_configuration(None)))?;
        associate(&mut wifi).map_err(|e| {
            warn!("Unconstrained association failed too: {e}");
            ConnectError::AssociationTimeout
        })?;
    }

    let channel = negotiated_channel()?;
    retained.store_channel(channel);
    let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
    info!(
        "Wifi up on channel {channel}, IP {}, took {} ms",
        ip_info.ip,
        started.elapsed().as_millis()
    );

    drop(wifi);
    Ok(Connection {
        wifi: Box::new(esp_wifi),
    })
}

fn associate(wifi: &mut BlockingWifi<&mut EspWifi<'static>>) -> Result<(), EspError> {
    wifi.connect()?;
    wifi.wait_netif_up()
}

fn client_configuration(channel: Option<u8>) -> ClientConfiguration {
    ClientConfiguration {
        ssid: APP_CONFIG.wifi_ssid.try_into().unwrap(),
        password: APP_CONFIG.wifi_psk.try_into().unwrap(),
        channel,
        // Pinning the BSSID alongside the channel skips the scan entirely.
        bssid: channel.and(parse_bssid(APP_CONFIG.wifi_bssid)),
        ..Default::default()
    }
}

/// Active scan correlating an SSID to its current channel.
fn channel_for_ssid(
    wifi: &mut BlockingWifi<&mut EspWifi<'static>>,
    ssid: &str,
) -> Result<Option<u8>, EspError> {
    let access_points = wifi.scan()?;
    Ok(access_points
        .iter()
        .find(|ap| ap.ssid.as_str() == ssid)
        .map(|ap| ap.channel))
}

fn negotiated_channel() -> Result<u8, EspError> {
    let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
    esp_idf_svc::sys::esp!(unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) })?;
    Ok(ap_info.primary)
}

fn parse_bssid(bssid: &str) -> Option<[u8; 6]> {
    let mut out = [0u8; 6];
    let mut parts = bssid.split(':');
    for byte in out.iter_mut() {
        *byte = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    parts.next().is_none().then_some(out)
}

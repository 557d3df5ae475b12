//! Wi-Fi station / soft-AP adapter.
//!
//! Implements [`ConnectivityPort`] for the hub. Association is started
//! with [`begin_connect`](ConnectivityPort::begin_connect) and completion
//! observed by polling — the boot-time selector owns the attempt/poll
//! budget, not this adapter.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-IDF Wi-Fi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation that associates after a couple of
//!   polls, for host-side tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::ConnectivityPort;
use crate::error::NetworkError;

/// SSID of the configuration access point.
pub const AP_SSID: &str = "GardenLink Config";

/// Polls the simulation takes to "associate".
#[cfg(not(target_os = "espidf"))]
const SIM_CONNECT_POLLS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WifiState {
    Idle,
    Connecting,
    Connected,
}

pub struct WifiAdapter {
    state: WifiState,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::EspWifi<'static>,
    /// Simulation: polls remaining until the association "completes".
    #[cfg(not(target_os = "espidf"))]
    sim_polls_left: core::cell::Cell<u32>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Idle,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Idle,
            sim_polls_left: core::cell::Cell::new(0),
        }
    }

    /// Bring up the configuration access point (ConfigAp mode). The portal
    /// HTTP server binds on top of this.
    #[cfg(target_os = "espidf")]
    pub fn start_access_point(&mut self) -> Result<(), NetworkError> {
        use esp_idf_svc::wifi::{AccessPointConfiguration, Configuration};

        let ap = AccessPointConfiguration {
            ssid: AP_SSID.try_into().unwrap_or_default(),
            ..Default::default()
        };
        self.driver
            .set_configuration(&Configuration::AccessPoint(ap))
            .and_then(|()| self.driver.start())
            .map_err(|e| {
                warn!("wifi: AP start failed ({e})");
                NetworkError::WifiConnectFailed
            })?;
        info!("wifi: access point '{AP_SSID}' up");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start_access_point(&mut self) -> Result<(), NetworkError> {
        info!("wifi(sim): access point '{AP_SSID}' up");
        Ok(())
    }

    // ── Platform-specific station handling ────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: ssid.try_into().map_err(|()| NetworkError::WifiConnectFailed)?,
            password: password
                .try_into()
                .map_err(|()| NetworkError::WifiConnectFailed)?,
            auth_method,
            ..Default::default()
        };
        self.driver
            .set_configuration(&Configuration::Client(client))
            .and_then(|()| self.driver.start())
            .and_then(|()| self.driver.connect())
            .map_err(|e| {
                warn!("wifi: association start failed ({e})");
                NetworkError::WifiConnectFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self, ssid: &str, _password: &str) -> Result<(), NetworkError> {
        info!("wifi(sim): associating with '{ssid}'");
        self.sim_polls_left.set(SIM_CONNECT_POLLS);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        let left = self.sim_polls_left.get();
        if left > 0 {
            self.sim_polls_left.set(left - 1);
            return false;
        }
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("wifi: disconnect failed ({e})");
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("wifi(sim): disconnected");
    }
}

impl ConnectivityPort for WifiAdapter {
    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        if ssid.is_empty() {
            return Err(NetworkError::WifiConnectFailed);
        }
        self.platform_begin(ssid, password)?;
        self.state = WifiState::Connecting;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected() && self.state != WifiState::Idle
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Idle;
    }
}

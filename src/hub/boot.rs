//! Boot-time mode selection.
//!
//! Runs exactly once per boot and decides which of the hub's two faces
//! comes up:
//!
//! ```text
//!              ┌─────────────┐  toggle asserted / any failure
//!   boot ────▶ │ Connecting  │ ─────────────────────────────▶ ConfigAp
//!              └──────┬──────┘
//!                     │ Wi-Fi up → provisioning Ready → MQTT up
//!                     ▼
//!               ClientActive
//! ```
//!
//! Every failure path fails **open** into the configuration portal — a hub
//! that cannot reach its network must still be reachable by its owner.
//! `ConfigAp` is terminal for the boot cycle; only a reset or portal
//! reconfiguration leads back to a client attempt.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConnectivityPort, EventSink, HttpPort, MqttPort, StoragePort, TimePort};
use crate::config::HubConfig;
use crate::hub::provisioning;
use crate::store::ConfigStore;

/// Outer Wi-Fi association attempts.
const WIFI_ATTEMPTS: u32 = 3;
/// Status polls per attempt; with the poll interval this bounds one
/// attempt to roughly fifteen seconds.
const WIFI_POLLS_PER_ATTEMPT: u32 = 30;
const WIFI_POLL_INTERVAL_MS: u32 = 500;
/// Pause between outer attempts.
const WIFI_ATTEMPT_PAUSE_MS: u32 = 3000;

const MQTT_ATTEMPTS: u32 = 3;
const MQTT_RETRY_DELAY_MS: u32 = 2000;

/// The face the hub boots into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Access-point + configuration portal. Terminal for this boot cycle.
    ConfigAp,
    /// Connected client bridging radio and platform.
    ClientActive,
}

/// Decide the boot mode. Blocking — Wi-Fi and MQTT attempts run to
/// completion before the main loop starts.
pub fn select_mode<S: StoragePort>(
    toggle_asserted: bool,
    cfg: &mut HubConfig,
    store: &mut ConfigStore<S>,
    wifi: &mut impl ConnectivityPort,
    mqtt: &mut impl MqttPort,
    http: &mut impl HttpPort,
    time: &impl TimePort,
    sink: &mut impl EventSink,
) -> BootMode {
    if toggle_asserted {
        info!("boot: config toggle asserted, skipping networking");
        return conclude(BootMode::ConfigAp, sink);
    }

    if !cfg.has_wifi_credentials() {
        info!("boot: no WiFi credentials stored");
        return conclude(BootMode::ConfigAp, sink);
    }

    if !connect_wifi(cfg, wifi, time) {
        warn!("boot: WiFi attempts exhausted, failing open to portal");
        return conclude(BootMode::ConfigAp, sink);
    }

    let state = provisioning::run(cfg, store, http, sink);
    if state != provisioning::ProvisioningState::Ready {
        warn!("boot: provisioning incomplete ({state:?})");
        return conclude(BootMode::ConfigAp, sink);
    }

    if !connect_mqtt(cfg, mqtt, time) {
        warn!("boot: MQTT attempts exhausted, failing open to portal");
        return conclude(BootMode::ConfigAp, sink);
    }

    conclude(BootMode::ClientActive, sink)
}

fn conclude(mode: BootMode, sink: &mut impl EventSink) -> BootMode {
    info!("boot: entering {mode:?}");
    sink.emit(&AppEvent::BootCompleted(mode));
    mode
}

/// Station association with attempt-count timeouts: each outer attempt
/// polls the link state at a fixed interval, with a pause before the next
/// attempt.
fn connect_wifi(cfg: &HubConfig, wifi: &mut impl ConnectivityPort, time: &impl TimePort) -> bool {
    for attempt in 1..=WIFI_ATTEMPTS {
        info!("boot: WiFi attempt {attempt}/{WIFI_ATTEMPTS} ('{}')", cfg.wifi_ssid);
        match wifi.begin_connect(&cfg.wifi_ssid, &cfg.wifi_password) {
            Ok(()) => {
                for _ in 0..WIFI_POLLS_PER_ATTEMPT {
                    if wifi.is_connected() {
                        info!("boot: WiFi connected");
                        return true;
                    }
                    time.delay_ms(WIFI_POLL_INTERVAL_MS);
                }
                wifi.disconnect();
            }
            Err(e) => warn!("boot: WiFi association refused ({e})"),
        }
        if attempt < WIFI_ATTEMPTS {
            time.delay_ms(WIFI_ATTEMPT_PAUSE_MS);
        }
    }
    false
}

fn connect_mqtt(cfg: &HubConfig, mqtt: &mut impl MqttPort, time: &impl TimePort) -> bool {
    for attempt in 1..=MQTT_ATTEMPTS {
        match mqtt.connect(
            &cfg.mqtt_host,
            cfg.mqtt_port,
            &cfg.mqtt_user,
            &cfg.mqtt_password,
        ) {
            Ok(()) => {
                info!("boot: MQTT connected to {}:{}", cfg.mqtt_host, cfg.mqtt_port);
                return true;
            }
            Err(e) => {
                warn!("boot: MQTT attempt {attempt}/{MQTT_ATTEMPTS} failed ({e})");
                if attempt < MQTT_ATTEMPTS {
                    time.delay_ms(MQTT_RETRY_DELAY_MS);
                }
            }
        }
    }
    false
}

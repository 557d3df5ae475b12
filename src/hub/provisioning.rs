//! Cloud-platform provisioning workflow.
//!
//! Two persisted milestones bind the hub to the platform: the device
//! identifier returned by registration, and the MQTT broker credentials
//! fetched with it. Each step runs **at most once per boot cycle** and is
//! gated on the persisted record, so retries happen naturally on the next
//! boot and a step that failed leaves the record untouched.
//!
//! Registration is not idempotent server-side: once an identifier is
//! persisted it must never be requested again, across any number of
//! reboots.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HttpPort, StoragePort};
use crate::config::{set_field, HubConfig};
use crate::error::NetworkError;
use crate::store::ConfigStore;

const REGISTER_URL: &str = "https://dash.wqtt.ru/api/devices";
const BROKER_URL: &str = "https://dash.wqtt.ru/api/broker";

// ---------------------------------------------------------------------------
// Derived state
// ---------------------------------------------------------------------------

/// Where the hub stands with the platform. Derived from the persisted
/// record, never stored directly; moves forward only (a full config reset
/// is the one way back).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningState {
    /// No device identifier yet.
    Unregistered,
    /// Registered, but broker details not fetched.
    RegisteredNoBroker,
    /// Identifier and broker details both persisted.
    Ready,
}

impl ProvisioningState {
    pub fn of(cfg: &HubConfig) -> Self {
        match (cfg.device_id, cfg.mqtt_host.is_empty()) {
            (None, _) => Self::Unregistered,
            (Some(_), true) => Self::RegisteredNoBroker,
            (Some(_), false) => Self::Ready,
        }
    }
}

// ---------------------------------------------------------------------------
// API shapes
// ---------------------------------------------------------------------------

/// Capability descriptor sent with registration.
#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sensors: [&'a str; 2],
    commands: [&'a str; 2],
}

#[derive(Deserialize)]
struct RegisterResponse {
    id: u32,
}

#[derive(Deserialize)]
struct BrokerResponse {
    server: String,
    port: u16,
    user: String,
    password: String,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Advance provisioning as far as the persisted record and the network
/// allow, one attempt per step. Returns the state reached.
pub fn run<S: StoragePort>(
    cfg: &mut HubConfig,
    store: &mut ConfigStore<S>,
    http: &mut impl HttpPort,
    sink: &mut impl EventSink,
) -> ProvisioningState {
    if cfg.cloud_token.is_empty() {
        warn!("provisioning: no cloud token configured, skipping");
        return ProvisioningState::of(cfg);
    }

    if ProvisioningState::of(cfg) == ProvisioningState::Unregistered {
        match register(cfg, http) {
            Ok(id) => {
                // The platform now knows this id; persist before anything
                // else so a reboot cannot trigger a duplicate registration.
                cfg.device_id = Some(id);
                if let Err(e) = store.save(cfg) {
                    warn!("provisioning: device id persist failed ({e})");
                }
                info!("provisioning: registered as device {id}");
                sink.emit(&AppEvent::ProvisioningAdvanced(
                    ProvisioningState::RegisteredNoBroker,
                ));
            }
            Err(e) => {
                warn!("provisioning: registration failed ({e}), retrying next boot");
                return ProvisioningState::of(cfg);
            }
        }
    }

    if ProvisioningState::of(cfg) == ProvisioningState::RegisteredNoBroker {
        match fetch_broker(cfg, http) {
            Ok(broker) => {
                set_field(&mut cfg.mqtt_host, &broker.server);
                cfg.mqtt_port = broker.port;
                set_field(&mut cfg.mqtt_user, &broker.user);
                set_field(&mut cfg.mqtt_password, &broker.password);
                if let Err(e) = store.save(cfg) {
                    warn!("provisioning: broker details persist failed ({e})");
                }
                info!("provisioning: broker details stored ({})", cfg.mqtt_host);
                sink.emit(&AppEvent::ProvisioningAdvanced(ProvisioningState::Ready));
            }
            Err(e) => {
                warn!("provisioning: broker fetch failed ({e}), retrying next boot");
            }
        }
    }

    ProvisioningState::of(cfg)
}

fn register(cfg: &HubConfig, http: &mut impl HttpPort) -> Result<u32, NetworkError> {
    let descriptor = RegisterRequest {
        name: "gardenlink",
        kind: "irrigation",
        sensors: ["moisture", "water_level"],
        commands: ["reference", "mode"],
    };
    let body = serde_json::to_string(&descriptor).map_err(|_| NetworkError::BadResponse)?;
    let response = http.post_json(REGISTER_URL, Some(cfg.cloud_token.as_str()), &body)?;
    let parsed: RegisterResponse =
        serde_json::from_slice(&response).map_err(|_| NetworkError::BadResponse)?;
    Ok(parsed.id)
}

fn fetch_broker(cfg: &HubConfig, http: &mut impl HttpPort) -> Result<BrokerResponse, NetworkError> {
    let response = http.get(BROKER_URL, Some(cfg.cloud_token.as_str()))?;
    serde_json::from_slice(&response).map_err(|_| NetworkError::BadResponse)
}

//! Integration tests for boot-time mode selection: toggle override,
//! fail-open behaviour, and the full path to client mode.

use gardenlink::app::events::AppEvent;
use gardenlink::config::{set_field, HubConfig};
use gardenlink::hub::boot::{self, BootMode};
use gardenlink::store::ConfigStore;

use crate::mock_hw::{
    ManualClock, RecordingSink, ScriptedHttp, ScriptedMqtt, ScriptedWifi, SharedStorage,
    BROKER_OK, REGISTER_OK,
};

fn configured_hub() -> HubConfig {
    let mut cfg = HubConfig::default();
    set_field(&mut cfg.wifi_ssid, "Greenhouse");
    set_field(&mut cfg.wifi_password, "hunter22");
    set_field(&mut cfg.cloud_token, "tok-abc");
    cfg
}

struct BootRig {
    cfg: HubConfig,
    store: ConfigStore<SharedStorage>,
    wifi: ScriptedWifi,
    mqtt: ScriptedMqtt,
    http: ScriptedHttp,
    clock: ManualClock,
    sink: RecordingSink,
}

impl BootRig {
    fn new(cfg: HubConfig, wifi: ScriptedWifi, mqtt: ScriptedMqtt, http: ScriptedHttp) -> Self {
        Self {
            cfg,
            store: ConfigStore::new(SharedStorage::new()),
            wifi,
            mqtt,
            http,
            clock: ManualClock::new(),
            sink: RecordingSink::new(),
        }
    }

    fn select(&mut self, toggle: bool) -> BootMode {
        boot::select_mode(
            toggle,
            &mut self.cfg,
            &mut self.store,
            &mut self.wifi,
            &mut self.mqtt,
            &mut self.http,
            &self.clock,
            &mut self.sink,
        )
    }
}

#[test]
fn toggle_asserted_skips_networking_entirely() {
    let mut rig = BootRig::new(
        configured_hub(),
        ScriptedWifi::reachable(0),
        ScriptedMqtt::connecting_after(0),
        ScriptedHttp::new().on("devices", REGISTER_OK).on("broker", BROKER_OK),
    );
    assert_eq!(rig.select(true), BootMode::ConfigAp);
    assert_eq!(rig.wifi.begin_calls, 0, "toggle must bypass WiFi");
    assert_eq!(rig.mqtt.connect_calls, 0);
    assert!(rig.http.requests.borrow().is_empty());
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::BootCompleted(BootMode::ConfigAp)));
}

#[test]
fn missing_credentials_fail_open_to_portal() {
    let mut rig = BootRig::new(
        HubConfig::default(),
        ScriptedWifi::reachable(0),
        ScriptedMqtt::connecting_after(0),
        ScriptedHttp::new(),
    );
    assert_eq!(rig.select(false), BootMode::ConfigAp);
    assert_eq!(rig.wifi.begin_calls, 0);
}

#[test]
fn wifi_exhaustion_fails_open_after_three_attempts() {
    let mut rig = BootRig::new(
        configured_hub(),
        ScriptedWifi::unreachable(),
        ScriptedMqtt::connecting_after(0),
        ScriptedHttp::new(),
    );
    assert_eq!(rig.select(false), BootMode::ConfigAp);
    assert_eq!(rig.wifi.begin_calls, 3);
    // No provisioning traffic without a network.
    assert!(rig.http.requests.borrow().is_empty());
}

#[test]
fn full_success_path_reaches_client_mode() {
    let mut rig = BootRig::new(
        configured_hub(),
        ScriptedWifi::reachable(3),
        ScriptedMqtt::connecting_after(0),
        ScriptedHttp::new().on("devices", REGISTER_OK).on("broker", BROKER_OK),
    );
    assert_eq!(rig.select(false), BootMode::ClientActive);

    // Provisioning completed and persisted on the way through.
    assert_eq!(rig.cfg.device_id, Some(31));
    assert_eq!(rig.cfg.mqtt_host.as_str(), "broker.wqtt.example");
    assert_eq!(rig.mqtt.connect_calls, 1);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::BootCompleted(BootMode::ClientActive)));
}

#[test]
fn mqtt_exhaustion_falls_back_after_bounded_retries() {
    let mut rig = BootRig::new(
        configured_hub(),
        ScriptedWifi::reachable(0),
        ScriptedMqtt::unreachable(),
        ScriptedHttp::new().on("devices", REGISTER_OK).on("broker", BROKER_OK),
    );
    assert_eq!(rig.select(false), BootMode::ConfigAp);
    assert_eq!(rig.mqtt.connect_calls, 3);
}

#[test]
fn incomplete_provisioning_falls_back_without_touching_mqtt() {
    let mut rig = BootRig::new(
        configured_hub(),
        ScriptedWifi::reachable(0),
        ScriptedMqtt::connecting_after(0),
        ScriptedHttp::new().failing("devices"),
    );
    assert_eq!(rig.select(false), BootMode::ConfigAp);
    assert_eq!(rig.mqtt.connect_calls, 0);
    assert_eq!(rig.cfg.device_id, None);
}

#[test]
fn mqtt_retry_succeeds_within_budget() {
    let mut rig = BootRig::new(
        configured_hub(),
        ScriptedWifi::reachable(0),
        ScriptedMqtt::connecting_after(2),
        ScriptedHttp::new().on("devices", REGISTER_OK).on("broker", BROKER_OK),
    );
    assert_eq!(rig.select(false), BootMode::ClientActive);
    assert_eq!(rig.mqtt.connect_calls, 3);
}

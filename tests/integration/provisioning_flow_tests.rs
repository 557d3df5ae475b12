//! Integration tests for the provisioning workflow: the non-idempotent
//! registration must run exactly once across any number of boots, and
//! failures must leave the persisted record untouched.

use gardenlink::config::HubConfig;
use gardenlink::config::set_field;
use gardenlink::hub::provisioning::{self, ProvisioningState};
use gardenlink::store::ConfigStore;

use crate::mock_hw::{RecordingSink, ScriptedHttp, SharedStorage, BROKER_OK, REGISTER_OK};

/// One "boot": load the record, run the workflow once, return everything
/// for assertions.
fn boot(
    storage: &SharedStorage,
    http: &mut ScriptedHttp,
) -> (HubConfig, ProvisioningState) {
    let mut store = ConfigStore::new(storage.clone());
    let mut cfg: HubConfig = store.load();
    if cfg.cloud_token.is_empty() {
        set_field(&mut cfg.cloud_token, "tok-abc");
    }
    let mut sink = RecordingSink::new();
    let state = provisioning::run(&mut cfg, &mut store, http, &mut sink);
    (cfg, state)
}

#[test]
fn first_boot_registers_and_fetches_broker() {
    let storage = SharedStorage::new();
    let mut http = ScriptedHttp::new()
        .on("devices", REGISTER_OK)
        .on("broker", BROKER_OK);

    let (cfg, state) = boot(&storage, &mut http);
    assert_eq!(state, ProvisioningState::Ready);
    assert_eq!(cfg.device_id, Some(31));
    assert_eq!(cfg.mqtt_host.as_str(), "broker.wqtt.example");
    assert_eq!(cfg.mqtt_port, 1883);
    assert_eq!(cfg.mqtt_user.as_str(), "hub31");
    assert_eq!(http.request_count("devices"), 1);
    assert_eq!(http.request_count("broker"), 1);
}

#[test]
fn later_boots_never_reregister_or_refetch() {
    let storage = SharedStorage::new();
    let mut http = ScriptedHttp::new()
        .on("devices", REGISTER_OK)
        .on("broker", BROKER_OK);
    boot(&storage, &mut http);

    for _ in 0..3 {
        let mut http = ScriptedHttp::new()
            .on("devices", REGISTER_OK)
            .on("broker", BROKER_OK);
        let (_, state) = boot(&storage, &mut http);
        assert_eq!(state, ProvisioningState::Ready);
        assert_eq!(http.request_count("devices"), 0, "duplicate registration");
        assert_eq!(http.request_count("broker"), 0, "duplicate broker fetch");
    }
}

#[test]
fn failed_registration_leaves_record_untouched() {
    let storage = SharedStorage::new();
    let mut http = ScriptedHttp::new().failing("devices");

    let (cfg, state) = boot(&storage, &mut http);
    assert_eq!(state, ProvisioningState::Unregistered);
    assert_eq!(cfg.device_id, None);

    // The stored record still derives Unregistered on the next boot.
    let store = ConfigStore::new(storage.clone());
    let stored: HubConfig = store.load();
    assert_eq!(ProvisioningState::of(&stored), ProvisioningState::Unregistered);
}

#[test]
fn broker_failure_keeps_registration_and_resumes_next_boot() {
    let storage = SharedStorage::new();
    let mut http = ScriptedHttp::new()
        .on("devices", REGISTER_OK)
        .failing("broker");

    let (cfg, state) = boot(&storage, &mut http);
    assert_eq!(state, ProvisioningState::RegisteredNoBroker);
    assert_eq!(cfg.device_id, Some(31));

    // Next boot resumes at the broker step only.
    let mut http = ScriptedHttp::new()
        .on("devices", REGISTER_OK)
        .on("broker", BROKER_OK);
    let (cfg, state) = boot(&storage, &mut http);
    assert_eq!(state, ProvisioningState::Ready);
    assert_eq!(cfg.device_id, Some(31));
    assert_eq!(http.request_count("devices"), 0, "id already persisted");
    assert_eq!(http.request_count("broker"), 1);
}

#[test]
fn garbage_registration_response_is_a_failed_step() {
    let storage = SharedStorage::new();
    let mut http = ScriptedHttp::new().on("devices", "not json");

    let (cfg, state) = boot(&storage, &mut http);
    assert_eq!(state, ProvisioningState::Unregistered);
    assert_eq!(cfg.device_id, None);
}

#[test]
fn missing_token_makes_no_requests() {
    let storage = SharedStorage::new();
    let mut store = ConfigStore::new(storage.clone());
    let mut cfg = HubConfig::default();
    let mut http = ScriptedHttp::new()
        .on("devices", REGISTER_OK)
        .on("broker", BROKER_OK);
    let mut sink = RecordingSink::new();

    let state = provisioning::run(&mut cfg, &mut store, &mut http, &mut sink);
    assert_eq!(state, ProvisioningState::Unregistered);
    assert!(http.requests.borrow().is_empty());
}

#[test]
fn reset_is_the_only_way_back() {
    let storage = SharedStorage::new();
    let mut http = ScriptedHttp::new()
        .on("devices", REGISTER_OK)
        .on("broker", BROKER_OK);
    boot(&storage, &mut http);

    let mut store = ConfigStore::new(storage.clone());
    store.reset().unwrap();
    let stored: HubConfig = store.load();
    assert_eq!(ProvisioningState::of(&stored), ProvisioningState::Unregistered);
}

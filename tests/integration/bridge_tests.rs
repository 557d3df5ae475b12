//! Integration tests for the hub's client loop: MQTT ⇄ radio bridging
//! and the rain push-down derived from the forecast cache.

use gardenlink::adapters::mqtt::MqttAdapter;
use gardenlink::adapters::radio::RadioAdapter;
use gardenlink::config::{set_field, HubConfig, WEATHER_CHECK_INTERVAL_MS};
use gardenlink::hub::bridge::{TOPIC_MODE, TOPIC_REFERENCE, TOPIC_VALUE, TOPIC_WATER};
use gardenlink::hub::HubService;
use gardenlink::store::ConfigStore;

use crate::mock_hw::{
    ManualClock, RecordingSink, ScriptedHttp, SharedStorage, FORECAST_RAINY, TIME_OK,
};

fn hub_with(cfg: HubConfig) -> HubService<SharedStorage> {
    HubService::new(ConfigStore::new(SharedStorage::new()), cfg)
}

fn connected_mqtt() -> MqttAdapter {
    let mut mqtt = MqttAdapter::new();
    mqtt.connect("broker.example", 1883, "hub", "pw").unwrap();
    mqtt
}

fn sent_payloads(radio: &RadioAdapter) -> Vec<String> {
    radio
        .sent
        .iter()
        .map(|f| String::from_utf8(f.clone()).unwrap())
        .collect()
}

#[test]
fn platform_reference_update_reaches_the_radio() {
    let mut hub = hub_with(HubConfig::default());
    let mut radio = RadioAdapter::new();
    let mut mqtt = connected_mqtt();
    let mut http = ScriptedHttp::new();
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();

    mqtt.inject(TOPIC_REFERENCE, "45");
    mqtt.inject(TOPIC_MODE, "2");
    hub.poll(1, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);

    let sent = sent_payloads(&radio);
    assert!(sent.iter().any(|f| f == "REFERENCE=45"));
    assert!(sent.iter().any(|f| f == "MODE=2"));
}

#[test]
fn device_telemetry_reaches_the_platform() {
    let mut hub = hub_with(HubConfig::default());
    let mut radio = RadioAdapter::new();
    let mut mqtt = connected_mqtt();
    let mut http = ScriptedHttp::new();
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();

    radio.inject(b"VALUE=33");
    radio.inject(b"STATUS=1");
    radio.inject(b"WATER=0");
    hub.poll(1, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);

    assert!(mqtt
        .published
        .contains(&(TOPIC_VALUE.to_owned(), "33".to_owned())));
    assert!(mqtt
        .published
        .contains(&("watering/status".to_owned(), "1".to_owned())));
    assert!(mqtt
        .published
        .contains(&(TOPIC_WATER.to_owned(), "0".to_owned())));
}

#[test]
fn unmapped_traffic_is_dropped_both_ways() {
    let mut hub = hub_with(HubConfig::default());
    let mut radio = RadioAdapter::new();
    let mut mqtt = connected_mqtt();
    let mut http = ScriptedHttp::new();
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();

    // Publish-direction topic arriving inbound, and garbage frames.
    mqtt.inject(TOPIC_VALUE, "99");
    mqtt.inject("some/other", "1");
    radio.inject(b"not-a-frame");
    radio.inject(b"RAIN=1");
    hub.poll(1, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);

    assert!(!sent_payloads(&radio).iter().any(|f| f.starts_with("VALUE")));
    assert!(mqtt.published.is_empty(), "nothing mappable was received");
}

#[test]
fn rain_flag_is_pushed_to_the_device_on_refresh() {
    let mut cfg = HubConfig::default();
    cfg.latitude = 52.5;
    cfg.longitude = 13.4;
    set_field(&mut cfg.cloud_token, "tok");

    let mut hub = hub_with(cfg);
    let mut radio = RadioAdapter::new();
    let mut mqtt = connected_mqtt();
    let mut http = ScriptedHttp::new()
        .on("timestamp", TIME_OK)
        .on("forecast", FORECAST_RAINY);
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();

    hub.poll(1, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);
    assert!(hub.rain_soon());
    assert!(sent_payloads(&radio).iter().any(|f| f == "RAIN=1"));

    // Within the hourly check window nothing new goes out.
    let frames_before = radio.sent.len();
    hub.poll(2000, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);
    assert_eq!(radio.sent.len(), frames_before);
}

#[test]
fn without_coordinates_the_conservative_flag_goes_down_once() {
    let mut hub = hub_with(HubConfig::default());
    let mut radio = RadioAdapter::new();
    let mut mqtt = connected_mqtt();
    let mut http = ScriptedHttp::new();
    let clock = ManualClock::new();
    let mut sink = RecordingSink::new();

    hub.poll(1, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);
    assert!(!hub.rain_soon());
    assert_eq!(sent_payloads(&radio), vec!["RAIN=0".to_owned()]);

    // The flag did not change, so the next check pushes nothing.
    let next_check = WEATHER_CHECK_INTERVAL_MS + 100;
    hub.poll(next_check, &mut radio, &mut mqtt, &mut http, &clock, &mut sink);
    assert_eq!(radio.sent.len(), 1);
}

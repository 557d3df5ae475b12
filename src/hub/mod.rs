//! Hub gateway service.
//!
//! After [`boot::select_mode`] lands in client mode, the hub runs a
//! single-threaded cooperative loop:
//!
//! ```text
//!   radio frames ──▶ ┌──────────────────┐ ──▶ MQTT publishes
//!                    │    HubService    │
//!   MQTT messages ─▶ │  bridge · cache  │ ──▶ radio commands (+ RAIN)
//!                    └──────────────────┘
//! ```
//!
//! Each poll pass services the radio, the MQTT client, and the periodic
//! weather task in sequence. Network calls block the loop for seconds at
//! a time — an accepted latency trade-off on this hardware; radio frames
//! queue in the transport meanwhile.

pub mod boot;
pub mod bridge;
pub mod portal;
pub mod provisioning;
pub mod weather;

use log::info;

use crate::app::ports::{
    EventSink, HttpPort, MqttPort, RadioPort, StoragePort, TimePort,
};
use crate::config::{HubConfig, WEATHER_CHECK_INTERVAL_MS};
use crate::link::Command;
use crate::schedule::IntervalTimer;
use crate::store::ConfigStore;
use self::weather::WeatherForecastCache;

/// The hub's client-mode core. Owns all of the hub's mutable state: the
/// persisted record, the forecast cache, and the last rain flag pushed to
/// the device.
pub struct HubService<S: StoragePort> {
    store: ConfigStore<S>,
    config: HubConfig,
    weather: WeatherForecastCache,
    weather_check: IntervalTimer,
    pushed_rain: Option<bool>,
}

impl<S: StoragePort> HubService<S> {
    /// Build the client-mode service around the record the boot path
    /// loaded (and possibly provisioned). The first weather check runs on
    /// the first poll.
    pub fn new(store: ConfigStore<S>, config: HubConfig) -> Self {
        Self {
            store,
            config,
            weather: WeatherForecastCache::new(),
            weather_check: IntervalTimer::expired(WEATHER_CHECK_INTERVAL_MS),
            pushed_rain: None,
        }
    }

    /// One cooperative pass: radio → platform, platform → radio, then the
    /// periodic forecast task.
    pub fn poll(
        &mut self,
        now_ms: u64,
        radio: &mut impl RadioPort,
        mqtt: &mut impl MqttPort,
        http: &mut impl HttpPort,
        time: &impl TimePort,
        sink: &mut impl EventSink,
    ) {
        let mut buf = [0u8; 96];
        while let Some(n) = radio.receive(&mut buf) {
            bridge::radio_to_mqtt(&buf[..n], mqtt);
        }

        while let Some(message) = mqtt.poll() {
            bridge::mqtt_to_radio(&message, radio);
        }

        if self.weather_check.poll(now_ms) {
            self.refresh_weather(radio, http, time, sink);
        }
    }

    /// Run the staleness-governed refresh and push the rain flag down to
    /// the device whenever it changes (or was never sent this boot).
    fn refresh_weather(
        &mut self,
        radio: &mut impl RadioPort,
        http: &mut impl HttpPort,
        time: &impl TimePort,
        sink: &mut impl EventSink,
    ) {
        self.weather
            .ensure_fresh(&mut self.config, &mut self.store, http, time, sink);

        let rain_soon = self.weather.rain_soon();
        if self.pushed_rain != Some(rain_soon) {
            info!("hub: pushing RAIN={} to device", u8::from(rain_soon));
            bridge::send_command(radio, Command::Rain, if rain_soon { "1" } else { "0" });
            self.pushed_rain = Some(rain_soon);
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn rain_soon(&self) -> bool {
        self.weather.rain_soon()
    }
}

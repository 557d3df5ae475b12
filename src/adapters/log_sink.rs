//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). The MQTT status topics carry
//! the machine-readable view; this is the human-readable one.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ReferenceChanged(percent) => {
                info!("CONFIG | reference={percent}%");
            }
            AppEvent::ModeChanged(mode) => {
                info!("CONFIG | mode={mode:?}");
            }
            AppEvent::WateringChanged(open) => {
                info!("VALVE  | watering={}", if *open { "on" } else { "off" });
            }
            AppEvent::RainFlagChanged(rain) => {
                info!("RAIN   | rain_soon={rain}");
            }
            AppEvent::ForecastRefreshed { rain_soon } => {
                info!("WEATHER| refreshed, rain_soon={rain_soon}");
            }
            AppEvent::ForecastUnavailable => {
                info!("WEATHER| refresh failed, keeping previous forecast");
            }
            AppEvent::ProvisioningAdvanced(state) => {
                info!("CLOUD  | provisioning -> {state:?}");
            }
            AppEvent::BootCompleted(mode) => {
                info!("BOOT   | mode={mode:?}");
            }
        }
    }
}

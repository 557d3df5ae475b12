//! Field hardware adapter — moisture probes, float switch, valve relay.
//!
//! Implements [`SensorPort`] and [`ValvePort`] for the device node. This
//! is the only module that touches the device's pins. Raw ADC counts are
//! mapped to 0–100 percent here; averaging across probes is domain logic
//! and stays out.
//!
//! The float switch sits on a pulled-up input and reads **low** when
//! water is present.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{SensorPort, SensorSnapshot, ValvePort, MAX_MOISTURE_CHANNELS};
use crate::error::HardwareError;

/// Full-scale raw count of the 12-bit moisture ADC.
#[cfg(target_os = "espidf")]
const ADC_FULL_SCALE: u32 = 4095;

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct FieldAdapter {
    /// ADC1 channel numbers of the configured moisture probes.
    moisture_channels: heapless::Vec<esp_idf_svc::sys::adc1_channel_t, MAX_MOISTURE_CHANNELS>,
    water_switch: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyInputPin, esp_idf_hal::gpio::Input>,
    valve: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
}

#[cfg(target_os = "espidf")]
impl FieldAdapter {
    pub fn new(
        moisture_channels: heapless::Vec<esp_idf_svc::sys::adc1_channel_t, MAX_MOISTURE_CHANNELS>,
        water_switch: esp_idf_hal::gpio::PinDriver<
            'static,
            esp_idf_hal::gpio::AnyInputPin,
            esp_idf_hal::gpio::Input,
        >,
        valve: esp_idf_hal::gpio::PinDriver<
            'static,
            esp_idf_hal::gpio::AnyOutputPin,
            esp_idf_hal::gpio::Output,
        >,
    ) -> Self {
        info!(
            "field: {} moisture channel(s) configured",
            moisture_channels.len()
        );
        Self {
            moisture_channels,
            water_switch,
            valve,
        }
    }
}

#[cfg(target_os = "espidf")]
impl SensorPort for FieldAdapter {
    fn read(&mut self) -> Result<SensorSnapshot, HardwareError> {
        let mut snapshot = SensorSnapshot::default();
        for &channel in &self.moisture_channels {
            // SAFETY: oneshot read from the main task; channels were
            // configured at init.
            let raw = unsafe { esp_idf_svc::sys::adc1_get_raw(channel) };
            if raw < 0 {
                return Err(HardwareError::AdcReadFailed);
            }
            let percent = (raw as u32 * 100 / ADC_FULL_SCALE).min(100) as u8;
            // Capacity matches the configured channel bound.
            let _ = snapshot.moisture_percent.push(percent);
        }
        snapshot.water_available = self.water_switch.is_low();
        Ok(snapshot)
    }
}

#[cfg(target_os = "espidf")]
impl ValvePort for FieldAdapter {
    fn set_watering(&mut self, open: bool) -> Result<(), HardwareError> {
        let result = if open {
            self.valve.set_high()
        } else {
            self.valve.set_low()
        };
        result.map_err(|e| {
            warn!("field: valve GPIO write failed ({e})");
            HardwareError::GpioWriteFailed
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct FieldAdapter {
    pub moisture_percent: heapless::Vec<u8, MAX_MOISTURE_CHANNELS>,
    pub water_available: bool,
    pub valve_open: bool,
}

#[cfg(not(target_os = "espidf"))]
impl FieldAdapter {
    pub fn new() -> Self {
        info!("field: simulation backend");
        Self {
            moisture_percent: heapless::Vec::new(),
            water_available: true,
            valve_open: false,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SensorPort for FieldAdapter {
    fn read(&mut self) -> Result<SensorSnapshot, HardwareError> {
        Ok(SensorSnapshot {
            moisture_percent: self.moisture_percent.clone(),
            water_available: self.water_available,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl ValvePort for FieldAdapter {
    fn set_watering(&mut self, open: bool) -> Result<(), HardwareError> {
        if open != self.valve_open {
            info!("field(sim): valve {}", if open { "open" } else { "closed" });
        }
        self.valve_open = open;
        Ok(())
    }
}

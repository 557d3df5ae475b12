//! System configuration parameters.
//!
//! Two records, one per node type. The device record is mutated only by
//! received radio commands; the hub record only through the configuration
//! portal and the provisioning workflow. Both are persisted through
//! [`ConfigStore`](crate::store::ConfigStore) on every change.

use serde::{Deserialize, Serialize};

/// Capacity of every persisted string field, including the NUL forced at the
/// boundary by the storage layer.
pub const FIELD_CAPACITY: usize = 64;

/// Fixed-capacity string used for all persisted configuration fields.
pub type ConfigString = heapless::String<FIELD_CAPACITY>;

/// Critical-dryness floor (percent). Below this the device waters even when
/// rain is imminent.
pub const MIN_MOISTURE_FLOOR: u8 = 1;

// --- Timing ---

/// Device sensor-report / decision cadence.
pub const DEVICE_REPORT_INTERVAL_MS: u64 = 60 * 1000;
/// Without a fresh RAIN command within this window the device clears its
/// rain flag (conservative default).
pub const RAIN_DECAY_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;
/// How often the hub evaluates forecast freshness. The 24 h staleness rule
/// in [`weather`](crate::hub::weather) decides whether a fetch happens.
pub const WEATHER_CHECK_INTERVAL_MS: u64 = 60 * 60 * 1000;
/// A forecast older than this is stale and must be re-fetched.
pub const FORECAST_MAX_AGE_SECS: u64 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Watering mode
// ---------------------------------------------------------------------------

/// Watering mode. `Off`/`On` override the sensors; `Auto` defers to the
/// decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Off,
    On,
    Auto,
}

impl Mode {
    /// ASCII token carried in MODE radio commands. Values match the units
    /// already in the field.
    pub const fn wire_value(self) -> &'static str {
        match self {
            Self::Off => "1",
            Self::On => "2",
            Self::Auto => "3",
        }
    }

    /// Parse a MODE command value. Anything unrecognised falls back to
    /// `Auto`, matching the deployed device behaviour.
    pub fn from_wire_value(value: &str) -> Self {
        match value {
            "1" => Self::Off,
            "2" => Self::On,
            _ => Self::Auto,
        }
    }
}

// ---------------------------------------------------------------------------
// Device configuration
// ---------------------------------------------------------------------------

/// Field-device settings. Owned exclusively by the device node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Moisture percentage below which `Auto` mode waters.
    pub reference: u8,
    pub mode: Mode,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            reference: MIN_MOISTURE_FLOOR,
            mode: Mode::Auto,
        }
    }
}

impl DeviceConfig {
    /// Set the reference threshold, clamped to the valid percentage range.
    pub fn set_reference(&mut self, percent: i32) {
        self.reference = percent.clamp(0, 100) as u8;
    }
}

// ---------------------------------------------------------------------------
// Hub configuration
// ---------------------------------------------------------------------------

/// Hub gateway settings. Owned exclusively by the hub node.
///
/// `device_id == None` means the hub has never registered with the cloud
/// platform; an empty `mqtt_host` means broker details were never fetched.
/// Together these derive the provisioning state — see
/// [`ProvisioningState`](crate::hub::provisioning::ProvisioningState).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    pub wifi_ssid: ConfigString,
    pub wifi_password: ConfigString,

    pub cloud_token: ConfigString,
    pub device_id: Option<u32>,

    pub mqtt_host: ConfigString,
    pub mqtt_port: u16,
    pub mqtt_user: ConfigString,
    pub mqtt_password: ConfigString,

    pub latitude: f32,
    pub longitude: f32,

    /// Unix time of the last successful weather fetch. Zero = never.
    pub last_weather_update: u64,
}

impl HubConfig {
    /// True once Wi-Fi credentials have been configured via the portal.
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    /// True if forecast coordinates are set. The zero/zero sentinel means
    /// "unset" and forbids weather fetches.
    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// Copy `src` into a fixed-capacity field, truncating at the capacity
/// boundary. Must hold even for hostile portal/storage input.
pub fn set_field(dst: &mut ConfigString, src: &str) {
    dst.clear();
    for ch in src.chars() {
        if dst.push(ch).is_err() {
            break;
        }
    }
}

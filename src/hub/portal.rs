//! Configuration-portal update logic.
//!
//! The portal's HTTP/DNS/HTML side is an external collaborator; what lives
//! here is the part with rules in it — applying submitted form fields to
//! the hub record and the factory reset. Only fields present in the
//! request change; everything else keeps its stored value. The device
//! identifier is provisioning-owned and not settable from the form.

use log::{info, warn};

use crate::app::ports::StoragePort;
use crate::config::{set_field, HubConfig};
use crate::error::ConfigError;
use crate::store::ConfigStore;

/// Apply `/save` form fields and persist. Unknown keys and unparsable
/// numeric values are skipped with a diagnostic; the save still happens
/// for whatever was accepted.
pub fn apply_save<'a, S: StoragePort>(
    cfg: &mut HubConfig,
    store: &mut ConfigStore<S>,
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<(), ConfigError> {
    for (key, value) in fields {
        match key {
            "wifi_ssid" => set_field(&mut cfg.wifi_ssid, value),
            "wifi_password" => set_field(&mut cfg.wifi_password, value),
            "cloud_token" => set_field(&mut cfg.cloud_token, value),
            "mqtt_host" => set_field(&mut cfg.mqtt_host, value),
            "mqtt_user" => set_field(&mut cfg.mqtt_user, value),
            "mqtt_password" => set_field(&mut cfg.mqtt_password, value),
            "mqtt_port" => match value.parse::<u16>() {
                Ok(port) => cfg.mqtt_port = port,
                Err(_) => warn!("portal: bad mqtt_port '{value}' ignored"),
            },
            "latitude" => match value.parse::<f32>() {
                Ok(lat) if (-90.0..=90.0).contains(&lat) => cfg.latitude = lat,
                _ => warn!("portal: bad latitude '{value}' ignored"),
            },
            "longitude" => match value.parse::<f32>() {
                Ok(lon) if (-180.0..=180.0).contains(&lon) => cfg.longitude = lon,
                _ => warn!("portal: bad longitude '{value}' ignored"),
            },
            other => warn!("portal: unknown field '{other}' ignored"),
        }
    }
    info!("portal: saving configuration");
    store.save(cfg)
}

/// Apply `/reset`: flood the backing region so the next boot starts from
/// defaults. Also the only path that reverts provisioning.
pub fn apply_reset<S: StoragePort>(store: &mut ConfigStore<S>) -> Result<(), ConfigError> {
    info!("portal: factory reset requested");
    store.reset()
}

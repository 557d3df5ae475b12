//! GardenLink hub firmware entry point.
//!
//! Boots through [`boot::select_mode`]: either the connected client loop
//! (radio ⇄ MQTT bridge + weather cache) or the configuration access
//! point with the portal HTTP server. ConfigAp is terminal until the
//! owner reconfigures and the hub restarts.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use log::{info, warn};

use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, InputPin, PinDriver, Pull};
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::http::server::{Configuration as HttpServerConfig, EspHttpServer};
use esp_idf_svc::wifi::EspWifi;

use embedded_svc::http::Method;
use embedded_svc::io::{Read as _, Write as _};

use gardenlink::adapters::eeprom::EepromAdapter;
use gardenlink::adapters::http::HttpAdapter;
use gardenlink::adapters::log_sink::LogEventSink;
use gardenlink::adapters::mqtt::MqttAdapter;
use gardenlink::adapters::radio::RadioAdapter;
use gardenlink::adapters::time::SystemTimeAdapter;
use gardenlink::adapters::wifi::WifiAdapter;
use gardenlink::app::ports::TimePort;
use gardenlink::config::HubConfig;
use gardenlink::hub::boot::{self, BootMode};
use gardenlink::hub::{portal, HubService};
use gardenlink::store::ConfigStore;

const LOOP_PACE_MS: u32 = 50;
const MAX_FORM_BODY: usize = 1024;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("GardenLink hub v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    // ── Config storage ────────────────────────────────────────
    let eeprom = EepromAdapter::new(nvs_partition.clone())
        .map_err(|e| anyhow!("config storage init failed: {e}"))?;
    let mut store = ConfigStore::new(eeprom);
    let mut config = store.load::<HubConfig>();

    // ── Config toggle (BOOT button, active low) ───────────────
    let mut toggle = PinDriver::input(peripherals.pins.gpio0.downgrade_input())?;
    toggle.set_pull(Pull::Up)?;
    let toggle_asserted = toggle.is_low();

    // ── Radio UART ────────────────────────────────────────────
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyInputPin>::None,
        Option::<AnyOutputPin>::None,
        &UartConfig::default().baudrate(Hertz(9600)),
    )?;
    let mut radio = RadioAdapter::new(uart);

    // ── Network adapters ──────────────────────────────────────
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?;
    let mut wifi = WifiAdapter::new(driver);
    let mut mqtt = MqttAdapter::new();
    let mut http = HttpAdapter::new();
    let time = SystemTimeAdapter::new();
    let mut sink = LogEventSink::new();

    // ── Boot-time mode selection ──────────────────────────────
    let mode = boot::select_mode(
        toggle_asserted,
        &mut config,
        &mut store,
        &mut wifi,
        &mut mqtt,
        &mut http,
        &time,
        &mut sink,
    );

    match mode {
        BootMode::ClientActive => {
            let mut hub = HubService::new(store, config);
            info!("hub: entering client loop");
            loop {
                hub.poll(
                    time.uptime_ms(),
                    &mut radio,
                    &mut mqtt,
                    &mut http,
                    &time,
                    &mut sink,
                );
                time.delay_ms(LOOP_PACE_MS);
            }
        }
        BootMode::ConfigAp => {
            wifi.start_access_point()
                .map_err(|e| anyhow!("AP start failed: {e}"))?;
            let _server = serve_portal(store, config)?;
            info!("hub: portal up, waiting for configuration");
            loop {
                time.delay_ms(1000);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration portal (HTTP transport glue; rules live in hub::portal)
// ───────────────────────────────────────────────────────────────

fn serve_portal(
    store: ConfigStore<EepromAdapter>,
    config: HubConfig,
) -> Result<EspHttpServer<'static>> {
    let shared = Arc::new(Mutex::new((store, config)));
    let mut server = EspHttpServer::new(&HttpServerConfig::default())?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/", Method::Get, move |request| {
        let guard = state.lock().unwrap();
        let page = render_form(&guard.1);
        request
            .into_ok_response()?
            .write_all(page.as_bytes())
            .map(|_| ())
    })?;

    let state = shared.clone();
    server.fn_handler::<anyhow::Error, _>("/save", Method::Post, move |mut request| {
        let mut body = vec![0u8; MAX_FORM_BODY];
        let n = request.read(&mut body)?;
        let fields = parse_form(&body[..n]);

        let mut guard = state.lock().unwrap();
        let (store, config) = &mut *guard;
        let outcome = portal::apply_save(
            config,
            store,
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let message = match outcome {
            Ok(()) => "Saved. Restart the hub to apply.",
            Err(e) => {
                warn!("portal: save failed ({e})");
                "Save failed; settings may not be persisted. Try again."
            }
        };
        request
            .into_ok_response()?
            .write_all(message.as_bytes())
            .map(|_| ())
    })?;

    let state = shared;
    server.fn_handler::<anyhow::Error, _>("/reset", Method::Post, move |request| {
        let mut guard = state.lock().unwrap();
        let (store, config) = &mut *guard;
        let message = match portal::apply_reset(store) {
            Ok(()) => {
                *config = HubConfig::default();
                "Configuration erased. Restart the hub."
            }
            Err(e) => {
                warn!("portal: reset failed ({e})");
                "Reset failed. Try again."
            }
        };
        request
            .into_ok_response()?
            .write_all(message.as_bytes())
            .map(|_| ())
    })?;

    Ok(server)
}

/// Pre-filled configuration form. Passwords and the cloud token are never
/// echoed back; blank submissions keep only explicitly posted fields.
fn render_form(cfg: &HubConfig) -> String {
    format!(
        "<!doctype html><title>GardenLink</title><h1>GardenLink Hub</h1>\
         <form method=post action=/save>\
         WiFi SSID <input name=wifi_ssid value=\"{}\"><br>\
         WiFi password <input name=wifi_password type=password><br>\
         Cloud token <input name=cloud_token type=password><br>\
         Latitude <input name=latitude value=\"{}\"><br>\
         Longitude <input name=longitude value=\"{}\"><br>\
         <button>Save</button></form>\
         <form method=post action=/reset><button>Factory reset</button></form>",
        cfg.wifi_ssid, cfg.latitude, cfg.longitude
    )
}

/// Minimal `application/x-www-form-urlencoded` parse: `+` is space, `%XX`
/// is a hex escape, pairs split on `&`/`=`.
fn parse_form(body: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(body);
    text.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((url_decode(key), url_decode(value)))
        })
        .collect()
}

fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = core::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

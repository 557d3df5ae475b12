//! Shared mocks for integration tests.
//!
//! The adapters' host-simulation backends (radio, MQTT, field, EEPROM)
//! already run on the host and are used directly where they fit; the
//! mocks here cover what those cannot script — failing networks, a
//! hand-cranked clock, and an event recorder.

#![allow(dead_code)] // not every test binary touches every mock

use gardenlink::app::events::AppEvent;
use gardenlink::app::ports::{
    ConnectivityPort, EventSink, HttpPort, MqttMessage, MqttPort, StorageError, StoragePort,
    TimePort,
};
use gardenlink::store::RESET_FILL;
use gardenlink::NetworkError;

// ── Shared storage ────────────────────────────────────────────

/// Cloneable in-memory region: every clone sees the same bytes, so a
/// "reboot" is just a fresh `ConfigStore` over a clone.
#[derive(Clone)]
pub struct SharedStorage(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

impl SharedStorage {
    pub fn new() -> Self {
        Self(std::rc::Rc::new(std::cell::RefCell::new(vec![
            RESET_FILL;
            512
        ])))
    }
}

impl StoragePort for SharedStorage {
    fn capacity(&self) -> usize {
        self.0.borrow().len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let bytes = self.0.borrow();
        let end = offset.checked_add(buf.len()).ok_or(StorageError::OutOfBounds)?;
        if end > bytes.len() {
            return Err(StorageError::OutOfBounds);
        }
        buf.copy_from_slice(&bytes[offset..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let mut bytes = self.0.borrow_mut();
        let end = offset.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        if end > bytes.len() {
            return Err(StorageError::OutOfBounds);
        }
        bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Hand-cranked clock ────────────────────────────────────────

/// A [`TimePort`] the test advances explicitly. Delays are recorded, not
/// slept, so retry pacing can be asserted without waiting it out.
pub struct ManualClock {
    pub now_ms: std::cell::Cell<u64>,
    pub delays: std::cell::RefCell<Vec<u32>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_ms: std::cell::Cell::new(0),
            delays: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, ms: u64) -> u64 {
        self.now_ms.set(self.now_ms.get() + ms);
        self.now_ms.get()
    }
}

impl TimePort for ManualClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn delay_ms(&self, ms: u32) {
        self.delays.borrow_mut().push(ms);
        self.now_ms.set(self.now_ms.get() + u64::from(ms));
    }
}

// ── Scripted HTTP ─────────────────────────────────────────────

/// Canned responses per URL substring, plus a request log.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: Vec<(&'static str, Result<String, NetworkError>)>,
    pub requests: std::cell::RefCell<Vec<String>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to any URL containing `fragment` with `body`.
    pub fn on(mut self, fragment: &'static str, body: &str) -> Self {
        self.responses.push((fragment, Ok(body.to_owned())));
        self
    }

    /// Fail any URL containing `fragment`.
    pub fn failing(mut self, fragment: &'static str) -> Self {
        self.responses
            .push((fragment, Err(NetworkError::HttpRequestFailed)));
        self
    }

    pub fn request_count(&self, fragment: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|u| u.contains(fragment))
            .count()
    }

    fn answer(&mut self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.requests.borrow_mut().push(url.to_owned());
        for (fragment, response) in &self.responses {
            if url.contains(fragment) {
                return response.clone().map(String::into_bytes);
            }
        }
        Err(NetworkError::HttpRequestFailed)
    }
}

impl HttpPort for ScriptedHttp {
    fn get(&mut self, url: &str, _bearer: Option<&str>) -> Result<Vec<u8>, NetworkError> {
        self.answer(url)
    }

    fn post_json(
        &mut self,
        url: &str,
        _bearer: Option<&str>,
        _body: &str,
    ) -> Result<Vec<u8>, NetworkError> {
        self.answer(url)
    }
}

// ── Scripted Wi-Fi ────────────────────────────────────────────

/// Connectivity that either associates after a fixed number of status
/// polls or never does.
pub struct ScriptedWifi {
    /// `None` = association never completes.
    pub connect_after_polls: Option<u32>,
    polls: std::cell::Cell<u32>,
    started: bool,
    pub begin_calls: u32,
}

impl ScriptedWifi {
    pub fn reachable(after_polls: u32) -> Self {
        Self {
            connect_after_polls: Some(after_polls),
            polls: std::cell::Cell::new(0),
            started: false,
            begin_calls: 0,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            connect_after_polls: None,
            polls: std::cell::Cell::new(0),
            started: false,
            begin_calls: 0,
        }
    }
}

impl ConnectivityPort for ScriptedWifi {
    fn begin_connect(&mut self, ssid: &str, _password: &str) -> Result<(), NetworkError> {
        if ssid.is_empty() {
            return Err(NetworkError::WifiConnectFailed);
        }
        self.begin_calls += 1;
        self.polls.set(0);
        self.started = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if !self.started {
            return false;
        }
        match self.connect_after_polls {
            Some(after) => {
                self.polls.set(self.polls.get() + 1);
                self.polls.get() > after
            }
            None => false,
        }
    }

    fn disconnect(&mut self) {
        self.started = false;
    }
}

// ── Scripted MQTT ─────────────────────────────────────────────

/// MQTT port whose connect fails a configurable number of times before
/// succeeding (or forever).
pub struct ScriptedMqtt {
    pub failures_before_success: Option<u32>,
    pub connect_calls: u32,
    connected: bool,
    pub published: Vec<(String, String)>,
}

impl ScriptedMqtt {
    pub fn connecting_after(failures: u32) -> Self {
        Self {
            failures_before_success: Some(failures),
            connect_calls: 0,
            connected: false,
            published: Vec::new(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            failures_before_success: None,
            connect_calls: 0,
            connected: false,
            published: Vec::new(),
        }
    }
}

impl MqttPort for ScriptedMqtt {
    fn connect(
        &mut self,
        _host: &str,
        _port: u16,
        _user: &str,
        _password: &str,
    ) -> Result<(), NetworkError> {
        self.connect_calls += 1;
        match self.failures_before_success {
            Some(failures) if self.connect_calls > failures => {
                self.connected = true;
                Ok(())
            }
            _ => Err(NetworkError::MqttConnectFailed),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), NetworkError> {
        if !self.connected {
            return Err(NetworkError::MqttPublishFailed);
        }
        self.published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }

    fn poll(&mut self) -> Option<MqttMessage> {
        None
    }
}

// ── Canned cloud responses ────────────────────────────────────

pub const REGISTER_OK: &str = r#"{"id":31}"#;
pub const BROKER_OK: &str =
    r#"{"server":"broker.wqtt.example","port":1883,"user":"hub31","password":"brkpass"}"#;
pub const TIME_OK: &str = r#"{"timestamp":1700000000}"#;
pub const FORECAST_DRY: &str =
    r#"{"hourly":{"rain":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]}}"#;
pub const FORECAST_RAINY: &str =
    r#"{"hourly":{"rain":[0,0,0.4,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]}}"#;

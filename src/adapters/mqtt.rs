//! MQTT client adapter.
//!
//! Implements [`MqttPort`] for the hub. Inbound messages arrive on the
//! ESP-IDF MQTT task and are queued into a channel the cooperative loop
//! drains via [`poll`](MqttPort::poll) — the domain never sees a callback.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: in-memory simulation with an injectable
//!   inbound queue for host-side tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{MqttMessage, MqttPort};
use crate::error::NetworkError;
use crate::hub::bridge::SUBSCRIBE_TOPICS;

fn clipped<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    inbound: std::sync::mpsc::Receiver<MqttMessage>,
    inbound_tx: std::sync::mpsc::Sender<MqttMessage>,
    connected: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    pub fn new() -> Self {
        let (inbound_tx, inbound) = std::sync::mpsc::channel();
        Self {
            client: None,
            inbound,
            inbound_tx,
            connected: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }
}

#[cfg(target_os = "espidf")]
impl MqttPort for MqttAdapter {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<(), NetworkError> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
        use std::sync::atomic::Ordering;

        let url = format!("mqtt://{host}:{port}");
        let conf = MqttClientConfiguration {
            client_id: Some("gardenlink-hub"),
            username: (!user.is_empty()).then_some(user),
            password: (!password.is_empty()).then_some(password),
            ..Default::default()
        };

        let tx = self.inbound_tx.clone();
        let connected = self.connected.clone();
        let mut client = EspMqttClient::new_cb(&url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => connected.store(true, Ordering::SeqCst),
                EventPayload::Disconnected => connected.store(false, Ordering::SeqCst),
                EventPayload::Received { topic, data, .. } => {
                    let Some(topic) = topic else { return };
                    let Ok(payload) = core::str::from_utf8(data) else {
                        warn!("mqtt: non-UTF-8 payload on {topic} dropped");
                        return;
                    };
                    let _ = tx.send(MqttMessage {
                        topic: clipped(topic),
                        payload: clipped(payload),
                    });
                }
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("mqtt: client init failed ({e})");
            NetworkError::MqttConnectFailed
        })?;

        for topic in SUBSCRIBE_TOPICS {
            client.subscribe(topic, QoS::AtLeastOnce).map_err(|e| {
                warn!("mqtt: subscribe {topic} failed ({e})");
                NetworkError::MqttConnectFailed
            })?;
        }

        self.client = Some(client);
        info!("mqtt: session open against {host}:{port}");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), NetworkError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(NetworkError::MqttPublishFailed)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|e| {
                warn!("mqtt: publish {topic} failed ({e})");
                NetworkError::MqttPublishFailed
            })
    }

    fn poll(&mut self) -> Option<MqttMessage> {
        self.inbound.try_recv().ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    connected: bool,
    inbound: std::collections::VecDeque<MqttMessage>,
    /// Everything the hub published, for assertions.
    pub published: Vec<(String, String)>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new() -> Self {
        Self {
            connected: false,
            inbound: std::collections::VecDeque::new(),
            published: Vec::new(),
        }
    }

    /// Queue a platform-originated message for the next poll.
    pub fn inject(&mut self, topic: &str, payload: &str) {
        self.inbound.push_back(MqttMessage {
            topic: clipped(topic),
            payload: clipped(payload),
        });
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttPort for MqttAdapter {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        _user: &str,
        _password: &str,
    ) -> Result<(), NetworkError> {
        info!("mqtt(sim): session open against {host}:{port} ({:?})", SUBSCRIBE_TOPICS);
        self.connected = true;
        Ok(())
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
        self.inbound.pop_front()
    }
}

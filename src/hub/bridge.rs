//! Protocol bridge: MQTT topics ⇄ radio commands.
//!
//! A stateless, exhaustive mapping with one entry per direction. Anything
//! outside the mapping — an unknown topic, a command the platform has no
//! topic for — is dropped with a diagnostic, never forwarded. `RAIN` is
//! hub-originated (derived from the forecast cache) and deliberately has
//! no inbound topic.

use log::warn;

use crate::app::ports::{MqttMessage, MqttPort, RadioPort};
use crate::link::{self, Command};

/// Platform → device: reference-threshold updates.
pub const TOPIC_REFERENCE: &str = "moisture/reference";
/// Platform → device: watering-mode updates.
pub const TOPIC_MODE: &str = "watering/mode";
/// Device → platform: averaged moisture percentage.
pub const TOPIC_VALUE: &str = "moisture/value";
/// Device → platform: valve status.
pub const TOPIC_STATUS: &str = "watering/status";
/// Device → platform: water-source availability.
pub const TOPIC_WATER: &str = "water/level";

/// Topics the hub subscribes to in client mode.
pub const SUBSCRIBE_TOPICS: [&str; 2] = [TOPIC_REFERENCE, TOPIC_MODE];

/// Inbound direction: MQTT topic → radio command.
pub fn command_for_topic(topic: &str) -> Option<Command> {
    match topic {
        TOPIC_REFERENCE => Some(Command::Reference),
        TOPIC_MODE => Some(Command::Mode),
        _ => None,
    }
}

/// Outbound direction: radio command → MQTT topic.
pub fn topic_for_command(command: Command) -> Option<&'static str> {
    match command {
        Command::Value => Some(TOPIC_VALUE),
        Command::Status => Some(TOPIC_STATUS),
        Command::Water => Some(TOPIC_WATER),
        Command::Reference | Command::Mode | Command::Rain => None,
    }
}

/// Forward one received radio frame to its MQTT topic. Malformed frames
/// and commands without a topic are dropped.
pub fn radio_to_mqtt(payload: &[u8], mqtt: &mut impl MqttPort) {
    let (command, value) = match link::decode(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("bridge: dropping radio frame ({e})");
            return;
        }
    };
    let Some(topic) = topic_for_command(command) else {
        warn!("bridge: no topic for {}, dropped", command.token());
        return;
    };
    if let Err(e) = mqtt.publish(topic, value) {
        warn!("bridge: publish to {topic} failed ({e})");
    }
}

/// Forward one inbound MQTT message to the radio. Unmapped topics are
/// dropped.
pub fn mqtt_to_radio(message: &MqttMessage, radio: &mut impl RadioPort) {
    let Some(command) = command_for_topic(&message.topic) else {
        warn!("bridge: unmapped topic '{}', dropped", message.topic);
        return;
    };
    send_command(radio, command, &message.payload);
}

/// Encode and transmit one command frame, respecting the transport's
/// frame bound.
pub fn send_command(radio: &mut impl RadioPort, command: Command, value: &str) {
    let mut buf = [0u8; 96];
    let cap = radio.max_frame().min(buf.len());
    match link::encode(command, value, &mut buf[..cap]) {
        Ok(n) => {
            if let Err(e) = radio.send(&buf[..n]) {
                warn!("bridge: radio send failed ({e})");
            }
        }
        Err(e) => warn!("bridge: cannot encode {} ({e})", command.token()),
    }
}

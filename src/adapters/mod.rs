//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                    |
//! |------------|------------------|--------------------------------|
//! | `eeprom`   | StoragePort      | NVS blob / in-memory region    |
//! | `field`    | SensorPort       | ESP32 ADC moisture channels    |
//! |            | ValvePort        | ESP32 GPIO valve relay         |
//! | `http`     | HttpPort         | ESP-IDF HTTP client (TLS)      |
//! | `log_sink` | EventSink        | Serial log output              |
//! | `mqtt`     | MqttPort         | ESP-IDF MQTT client            |
//! | `radio`    | RadioPort        | UART-attached radio module     |
//! | `time`     | TimePort         | ESP32 system timer             |
//! | `wifi`     | ConnectivityPort | ESP-IDF WiFi STA / soft-AP     |
//!
//! Every adapter carries a host-side simulation backend behind
//! `#[cfg(not(target_os = "espidf"))]` so the whole stack runs in tests.

pub mod eeprom;
pub mod field;
pub mod http;
pub mod log_sink;
pub mod mqtt;
pub mod radio;
pub mod time;
pub mod wifi;

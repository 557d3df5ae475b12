//! Unified error types for the GardenLink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. No variant is fatal: the
//! control loop logs, degrades, and keeps running. All variants are `Copy`
//! so they pass through the loop without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A transient network operation failed (retried, then degraded).
    Network(NetworkError),
    /// A malformed or unknown radio/MQTT message (dropped with a diagnostic).
    Protocol(ProtocolError),
    /// Persisted configuration is missing, invalid, or not durably written.
    Config(ConfigError),
    /// A sensor or actuator failed (best-effort continuation).
    Hardware(HardwareError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Network errors (transient; bounded retries, then cached/default behaviour)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Wi-Fi association did not complete within the polling budget.
    WifiConnectFailed,
    /// The MQTT broker refused or dropped the connection.
    MqttConnectFailed,
    /// An MQTT publish was not accepted.
    MqttPublishFailed,
    /// An HTTP request failed at the transport level.
    HttpRequestFailed,
    /// The HTTP response was not the expected JSON shape.
    BadResponse,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::MqttConnectFailed => write!(f, "MQTT connect failed"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::BadResponse => write!(f, "unexpected response body"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors (malformed input; dropped, never propagated as fatal)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Radio payload carries no `=` delimiter.
    MissingDelimiter,
    /// Command token is not one of the recognised commands.
    UnknownCommand,
    /// Payload is not valid ASCII.
    NotAscii,
    /// A value contains the `=` delimiter (forbidden by the wire format).
    DelimiterInValue,
    /// Encoded payload would exceed the transport's maximum frame size.
    PayloadTooLong,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter => write!(f, "missing '=' delimiter"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::NotAscii => write!(f, "payload not ASCII"),
            Self::DelimiterInValue => write!(f, "'=' not allowed in value"),
            Self::PayloadTooLong => write!(f, "payload exceeds frame size"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Validity marker mismatch — the record was never fully written.
    /// Resolved by falling back to defaults, never a crash.
    NotProvisioned,
    /// The storage backend reported a read failure.
    ReadFailed,
    /// The storage backend reported a write or flush failure; the record
    /// must be treated as possibly stale.
    WriteFailed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProvisioned => write!(f, "no valid stored config"),
            Self::ReadFailed => write!(f, "storage read failed"),
            Self::WriteFailed => write!(f, "storage write failed"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// A moisture channel's ADC read failed.
    AdcReadFailed,
    /// The water-level GPIO read failed.
    GpioReadFailed,
    /// The valve GPIO write failed.
    GpioWriteFailed,
    /// The radio transport rejected a frame.
    RadioSendFailed,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::RadioSendFailed => write!(f, "radio send failed"),
        }
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

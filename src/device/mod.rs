//! Field-device service.
//!
//! Owns the device's entire mutable state — persisted settings, the rain
//! flag, the current valve command — and drives it from a single
//! cooperative loop:
//!
//! ```text
//!   radio frames ──▶ ┌───────────────────┐ ──▶ valve
//!                    │   DeviceService   │
//!   sensor reads ──▶ │  decision engine  │ ──▶ VALUE/WATER/STATUS frames
//!                    └───────────────────┘
//! ```
//!
//! Settings mutate only through received radio commands and are persisted
//! on every change. Sensor evaluation and telemetry run on a periodic
//! timer; the rain flag decays to the conservative default when the hub
//! goes quiet.

pub mod decision;

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RadioPort, SensorPort, StoragePort, ValvePort};
use crate::config::{DeviceConfig, Mode, DEVICE_REPORT_INTERVAL_MS, RAIN_DECAY_INTERVAL_MS};
use crate::link::{self, Command};
use crate::schedule::IntervalTimer;
use crate::store::ConfigStore;

use self::decision::{mean_moisture, should_water};

/// Stack scratch for radio frames; the live bound is the transport's
/// [`max_frame`](RadioPort::max_frame).
const FRAME_SCRATCH: usize = 96;

/// The device node's control core.
pub struct DeviceService<S: StoragePort> {
    store: ConfigStore<S>,
    config: DeviceConfig,
    rain_soon: bool,
    watering: bool,
    report: IntervalTimer,
    rain_decay: IntervalTimer,
}

impl<S: StoragePort> DeviceService<S> {
    /// Load persisted settings and arm the periodic tasks. The first
    /// sensor report fires on the first poll so the hub sees the device
    /// promptly after boot.
    pub fn new(store: ConfigStore<S>, now_ms: u64) -> Self {
        let config = store.load::<DeviceConfig>();
        info!(
            "device: loaded config (reference={}%, mode={:?})",
            config.reference, config.mode
        );
        Self {
            store,
            config,
            rain_soon: false,
            watering: false,
            report: IntervalTimer::expired(DEVICE_REPORT_INTERVAL_MS),
            rain_decay: IntervalTimer::new(RAIN_DECAY_INTERVAL_MS, now_ms),
        }
    }

    // ── Cooperative loop ──────────────────────────────────────

    /// One loop pass: drain the radio, decay the rain flag, then run the
    /// periodic sensor/decision/telemetry task when due.
    pub fn poll(
        &mut self,
        now_ms: u64,
        radio: &mut impl RadioPort,
        hw: &mut (impl SensorPort + ValvePort),
        sink: &mut impl EventSink,
    ) {
        let mut buf = [0u8; FRAME_SCRATCH];
        while let Some(n) = radio.receive(&mut buf) {
            self.handle_frame(&buf[..n], now_ms, sink);
        }

        if self.rain_decay.poll(now_ms) && self.rain_soon {
            info!("device: no RAIN update within decay window, clearing flag");
            self.rain_soon = false;
            sink.emit(&AppEvent::RainFlagChanged(false));
        }

        if self.report.poll(now_ms) {
            self.run_check(radio, hw, sink);
        }
    }

    /// Apply one received radio frame. Malformed or unexpected frames are
    /// dropped with a diagnostic; they never crash the receiver.
    pub fn handle_frame(&mut self, payload: &[u8], now_ms: u64, sink: &mut impl EventSink) {
        let (command, value) = match link::decode(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("device: dropping radio frame ({e})");
                return;
            }
        };

        match command {
            Command::Reference => match value.parse::<i32>() {
                Ok(percent) => {
                    self.config.set_reference(percent);
                    self.persist();
                    info!("device: reference set to {}%", self.config.reference);
                    sink.emit(&AppEvent::ReferenceChanged(self.config.reference));
                }
                Err(_) => warn!("device: non-numeric REFERENCE value '{value}' dropped"),
            },
            Command::Mode => {
                let mode = Mode::from_wire_value(value);
                self.config.mode = mode;
                self.persist();
                info!("device: mode set to {mode:?}");
                sink.emit(&AppEvent::ModeChanged(mode));
            }
            Command::Rain => {
                let rain = value == "1";
                self.rain_decay.rearm(now_ms);
                if rain != self.rain_soon {
                    self.rain_soon = rain;
                    sink.emit(&AppEvent::RainFlagChanged(rain));
                }
            }
            // Device-originated commands arriving inbound are an anomaly.
            Command::Value | Command::Status | Command::Water => {
                warn!("device: unexpected inbound {} dropped", command.token());
            }
        }
    }

    /// Read sensors, report telemetry, decide, and drive the valve.
    fn run_check(
        &mut self,
        radio: &mut impl RadioPort,
        hw: &mut (impl SensorPort + ValvePort),
        sink: &mut impl EventSink,
    ) {
        let snapshot = match hw.read() {
            Ok(s) => s,
            Err(e) => {
                warn!("device: sensor read failed ({e}), skipping check");
                return;
            }
        };
        let Some(moisture) = mean_moisture(&snapshot.moisture_percent) else {
            warn!("device: no moisture channels configured, skipping check");
            return;
        };

        let mut value: heapless::String<12> = heapless::String::new();
        let _ = write!(value, "{moisture}");
        self.send(radio, Command::Value, &value);
        self.send(radio, Command::Water, bool_token(snapshot.water_available));

        let open = should_water(
            moisture,
            snapshot.water_available,
            self.rain_soon,
            self.config.mode,
            self.config.reference,
        );
        self.send(radio, Command::Status, bool_token(open));

        if let Err(e) = hw.set_watering(open) {
            warn!("device: valve write failed ({e})");
        }
        if open != self.watering {
            self.watering = open;
            sink.emit(&AppEvent::WateringChanged(open));
        }
    }

    // ── Internals ─────────────────────────────────────────────

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.config) {
            // Not durable; the next accepted command will retry the write.
            warn!("device: config save failed ({e})");
        }
    }

    fn send(&self, radio: &mut impl RadioPort, command: Command, value: &str) {
        let mut buf = [0u8; FRAME_SCRATCH];
        let cap = radio.max_frame().min(buf.len());
        match link::encode(command, value, &mut buf[..cap]) {
            Ok(n) => {
                if let Err(e) = radio.send(&buf[..n]) {
                    warn!("device: radio send failed ({e})");
                }
            }
            Err(e) => warn!("device: cannot encode {} ({e})", command.token()),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn rain_soon(&self) -> bool {
        self.rain_soon
    }

    pub fn watering(&self) -> bool {
        self.watering
    }
}

const fn bool_token(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

//! Staleness-governed rain-forecast cache.
//!
//! The hub has no real-time clock, so "now" itself comes off the network:
//! freshness is best-effort by design. The cache fetches at most once per
//! staleness window, replaces the forecast wholesale, and persists only
//! the fetch timestamp so a restart does not force an immediate re-fetch.
//! Every failure path degrades to the previous forecast — or, absent one,
//! to the conservative `rain_soon = false`.

use log::{info, warn};
use serde::Deserialize;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HttpPort, StoragePort, TimePort};
use crate::config::{HubConfig, FORECAST_MAX_AGE_SECS};
use crate::error::NetworkError;
use crate::store::ConfigStore;

/// Hourly rain forecast, one day ahead.
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// Trusted Unix-time source (the hub has no RTC).
const TIME_URL: &str = "https://aisenseapi.com/services/v1/timestamp";

/// Fetch retry budget: fixed delay, no backoff.
const FETCH_ATTEMPTS: u32 = 3;
const FETCH_RETRY_DELAY_MS: u32 = 5000;

/// Forecast horizon in hours.
pub const FORECAST_HOURS: usize = 24;

// ── API response shapes ───────────────────────────────────────

#[derive(Deserialize)]
struct ForecastResponse {
    hourly: HourlyRain,
}

#[derive(Deserialize)]
struct HourlyRain {
    rain: Vec<f32>,
}

#[derive(Deserialize)]
struct TimestampResponse {
    timestamp: u64,
}

// ── Cache ─────────────────────────────────────────────────────

/// One fetched forecast. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherForecast {
    pub hourly_rain_mm: heapless::Vec<f32, FORECAST_HOURS>,
    pub rain_soon: bool,
    pub fetched_at: u64,
}

/// Unix time pinned to the monotonic clock at the moment it was fetched.
/// Later "now" queries extrapolate from uptime instead of re-asking the
/// network.
#[derive(Debug, Clone, Copy)]
struct TimeBase {
    unix: u64,
    uptime_ms: u64,
}

/// In-memory forecast plus the freshness bookkeeping persisted in
/// [`HubConfig::last_weather_update`].
#[derive(Debug, Default)]
pub struct WeatherForecastCache {
    forecast: Option<WeatherForecast>,
    time_base: Option<TimeBase>,
}

impl WeatherForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rain expected within the forecast window. `false` when no forecast
    /// is held — the conservative default.
    pub fn rain_soon(&self) -> bool {
        self.forecast.as_ref().is_some_and(|f| f.rain_soon)
    }

    pub fn forecast(&self) -> Option<&WeatherForecast> {
        self.forecast.as_ref()
    }

    /// Make sure a usable forecast is held, fetching if the 24 h staleness
    /// window has lapsed. Returns `true` when the forecast (cached or
    /// fresh) is usable, `false` on refusal or fetch exhaustion.
    pub fn ensure_fresh<S: StoragePort>(
        &mut self,
        cfg: &mut HubConfig,
        store: &mut ConfigStore<S>,
        http: &mut impl HttpPort,
        time: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !cfg.has_coordinates() {
            warn!("weather: coordinates unset, refusing to fetch");
            return false;
        }

        // Without a trusted "now" the staleness rule cannot run; keep
        // whatever we have and try again next cycle.
        let Some(now) = self.now(http, time) else {
            warn!("weather: time source unreachable, deferring refresh");
            return self.forecast.is_some();
        };

        let fresh = cfg.last_weather_update != 0
            && now >= cfg.last_weather_update
            && now - cfg.last_weather_update <= FORECAST_MAX_AGE_SECS;
        if fresh {
            return true;
        }

        for attempt in 1..=FETCH_ATTEMPTS {
            match fetch_forecast(http, cfg.latitude, cfg.longitude) {
                Ok(hourly) => {
                    let rain_soon = hourly.iter().any(|&mm| mm > 0.0);
                    self.forecast = Some(WeatherForecast {
                        hourly_rain_mm: hourly,
                        rain_soon,
                        fetched_at: now,
                    });

                    cfg.last_weather_update = now;
                    if let Err(e) = store.save(cfg) {
                        // Next boot just re-fetches; nothing else is lost.
                        warn!("weather: timestamp persist failed ({e})");
                    }

                    info!("weather: forecast refreshed (rain_soon={rain_soon})");
                    sink.emit(&AppEvent::ForecastRefreshed { rain_soon });
                    return true;
                }
                Err(e) => {
                    warn!("weather: fetch attempt {attempt}/{FETCH_ATTEMPTS} failed ({e})");
                    if attempt < FETCH_ATTEMPTS {
                        time.delay_ms(FETCH_RETRY_DELAY_MS);
                    }
                }
            }
        }

        // Exhausted: the previous forecast and rain flag stay authoritative.
        sink.emit(&AppEvent::ForecastUnavailable);
        false
    }

    /// Unix "now": extrapolated from the sync point when one exists,
    /// otherwise fetched from the time API and pinned to uptime.
    fn now(&mut self, http: &mut impl HttpPort, time: &impl TimePort) -> Option<u64> {
        if let Some(base) = self.time_base {
            let elapsed_ms = time.uptime_ms().wrapping_sub(base.uptime_ms);
            return Some(base.unix + elapsed_ms / 1000);
        }
        match fetch_unix_time(http) {
            Ok(unix) => {
                self.time_base = Some(TimeBase {
                    unix,
                    uptime_ms: time.uptime_ms(),
                });
                Some(unix)
            }
            Err(e) => {
                warn!("weather: time fetch failed ({e})");
                None
            }
        }
    }
}

// ── Fetch helpers ─────────────────────────────────────────────

fn fetch_unix_time(http: &mut impl HttpPort) -> Result<u64, NetworkError> {
    let body = http.get(TIME_URL, None)?;
    let parsed: TimestampResponse =
        serde_json::from_slice(&body).map_err(|_| NetworkError::BadResponse)?;
    Ok(parsed.timestamp)
}

fn fetch_forecast(
    http: &mut impl HttpPort,
    latitude: f32,
    longitude: f32,
) -> Result<heapless::Vec<f32, FORECAST_HOURS>, NetworkError> {
    let url = format!(
        "{FORECAST_URL}?latitude={latitude}&longitude={longitude}&hourly=rain&forecast_days=1"
    );
    let body = http.get(&url, None)?;
    let parsed: ForecastResponse =
        serde_json::from_slice(&body).map_err(|_| NetworkError::BadResponse)?;
    if parsed.hourly.rain.is_empty() {
        return Err(NetworkError::BadResponse);
    }

    let mut hourly = heapless::Vec::new();
    for mm in parsed.hourly.rain.into_iter().take(FORECAST_HOURS) {
        // Capacity equals the take() bound.
        let _ = hourly.push(mm);
    }
    Ok(hourly)
}

//! Monotonic time adapter.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic) and
//!   FreeRTOS task delays.
//! - **all other targets** — `std::time::Instant` / `std::thread::sleep`
//!   for host-side testing and simulation.

use crate::app::ports::TimePort;

/// Time adapter for both node firmwares.
pub struct SystemTimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemTimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl TimePort for SystemTimeAdapter {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

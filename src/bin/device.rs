//! GardenLink field-device firmware entry point.
//!
//! Wires the device adapters — UART radio, moisture/float sensors, valve
//! relay, EEPROM-style config region — to [`DeviceService`] and runs the
//! cooperative control loop forever. Nothing in the loop is fatal.

use anyhow::{anyhow, Result};
use log::info;

use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::sys::{
    adc1_channel_t_ADC1_CHANNEL_0, adc1_channel_t_ADC1_CHANNEL_3, adc1_channel_t_ADC1_CHANNEL_6,
    adc1_config_channel_atten, adc1_config_width, adc_atten_t_ADC_ATTEN_DB_11,
    adc_bits_width_t_ADC_WIDTH_BIT_12,
};

use gardenlink::adapters::eeprom::EepromAdapter;
use gardenlink::adapters::field::FieldAdapter;
use gardenlink::adapters::log_sink::LogEventSink;
use gardenlink::adapters::radio::RadioAdapter;
use gardenlink::adapters::time::SystemTimeAdapter;
use gardenlink::app::ports::TimePort;
use gardenlink::device::DeviceService;
use gardenlink::store::ConfigStore;

/// Loop pacing; radio frames queue in the UART FIFO between passes.
const LOOP_PACE_MS: u32 = 50;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("GardenLink device v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let nvs_partition = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    // ── Config storage ────────────────────────────────────────
    let eeprom = EepromAdapter::new(nvs_partition)
        .map_err(|e| anyhow!("config storage init failed: {e}"))?;
    let store = ConfigStore::new(eeprom);

    // ── Radio UART ────────────────────────────────────────────
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyInputPin>::None,
        Option::<AnyOutputPin>::None,
        &UartConfig::default().baudrate(Hertz(9600)),
    )?;
    let mut radio = RadioAdapter::new(uart);

    // ── Field hardware ────────────────────────────────────────
    // SAFETY: one-time ADC setup before any reads.
    unsafe {
        adc1_config_width(adc_bits_width_t_ADC_WIDTH_BIT_12);
    }
    let mut channels = heapless::Vec::new();
    for channel in [
        adc1_channel_t_ADC1_CHANNEL_0,
        adc1_channel_t_ADC1_CHANNEL_3,
        adc1_channel_t_ADC1_CHANNEL_6,
    ] {
        // SAFETY: same one-time setup context.
        unsafe {
            adc1_config_channel_atten(channel, adc_atten_t_ADC_ATTEN_DB_11);
        }
        channels
            .push(channel)
            .map_err(|_| anyhow!("too many moisture channels"))?;
    }

    let mut water_switch = PinDriver::input(peripherals.pins.gpio4.downgrade_input())?;
    water_switch.set_pull(Pull::Up)?;
    let valve = PinDriver::output(peripherals.pins.gpio5.downgrade_output())?;
    let mut field = FieldAdapter::new(channels, water_switch, valve);

    // ── Service + loop ────────────────────────────────────────
    let time = SystemTimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut device = DeviceService::new(store, time.uptime_ms());

    info!("device: entering control loop");
    loop {
        device.poll(time.uptime_ms(), &mut radio, &mut field, &mut sink);
        time.delay_ms(LOOP_PACE_MS);
    }
}

//! Watering decision engine.
//!
//! A pure function over the current sensor state and mode — no side
//! effects, callable on every control-loop tick. Rule order is a designed
//! tie-break, not incidental: the water-source check beats even a manual
//! `On`, and the critical-dryness floor beats rain suppression.

use crate::config::{Mode, MIN_MOISTURE_FLOOR};

/// Decide whether the valve should be open right now.
///
/// First matching rule wins:
/// 1. no water source → never water,
/// 2. `Off` → never, 3. `On` → always,
/// 4. critically dry (below [`MIN_MOISTURE_FLOOR`]) → water even if rain
///    is imminent,
/// 5. rain expected → suppress routine watering,
/// 6. otherwise water below the reference threshold.
pub fn should_water(
    moisture_percent: u8,
    water_available: bool,
    rain_soon: bool,
    mode: Mode,
    reference: u8,
) -> bool {
    if !water_available {
        return false;
    }
    match mode {
        Mode::Off => false,
        Mode::On => true,
        Mode::Auto => {
            if moisture_percent < MIN_MOISTURE_FLOOR {
                true
            } else if rain_soon {
                false
            } else {
                moisture_percent < reference
            }
        }
    }
}

/// Arithmetic mean of the configured moisture channels, each already
/// mapped to 0–100. `None` when no channel is configured.
pub fn mean_moisture(channels: &[u8]) -> Option<u8> {
    if channels.is_empty() {
        return None;
    }
    let sum: u32 = channels.iter().map(|&c| u32::from(c)).sum();
    Some((sum / channels.len() as u32) as u8)
}

//! Application layer: port traits and outbound events.
//!
//! The domain services ([`device`](crate::device) and [`hub`](crate::hub))
//! touch the outside world only through the traits in [`ports`]; adapters
//! implement them per platform.

pub mod events;
pub mod ports;

//! Card piles.
//!
//! Every card-playing entity owns a deck, hand, discard pile and exhaust
//! pile. The resolver moves cards between them for draw and discard
//! effects; reshuffles go through the state's seeded RNG.

pub mod manager;

pub use manager::{Zone, ZoneManager};

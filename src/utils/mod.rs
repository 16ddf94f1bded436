//! Utility functions and helpers
//!
//! This module contains timestamp utilities and the injectable random
//! source used by generators.

pub mod random;
pub mod time;

pub use random::{FixedRandom, RandomSource, SeededRandom, SequenceRandom};
pub use time::current_timestamp_millis;

//! Utilities shared across Pairroom packages.

pub mod logger;
pub mod time;

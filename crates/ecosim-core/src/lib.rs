//! Core types and utilities for the ecosim grid ecosystem simulation.

pub mod types;
pub mod config;
pub mod error;
pub mod random;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use random::RandomSource;
#[cfg(any(test, feature = "test-util"))]
pub use random::ScriptedRandom;

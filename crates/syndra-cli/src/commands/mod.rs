//! CLI command implementations.

pub mod common;
pub mod generate;
pub mod noise;
pub mod stats;
pub mod transpile;
pub mod version;

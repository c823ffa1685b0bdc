//! Runtime configuration of the demo binary.

pub mod demo;

pub use demo::{load_config, OutputConfig, RuntimeConfig};

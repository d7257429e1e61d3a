// src/config/mod.rs
// This module handles configuration parsing and validation.

pub mod raw; // Structs directly mapping to YAML/JSON structure
pub mod processed; // Validated configuration consumed by the logger

pub use processed::LoggerConfig;

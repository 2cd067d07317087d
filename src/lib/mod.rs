//! Shared library modules providing error types, environment assembly, path helpers, and telemetry initialization.

pub mod env_builder;
pub mod errors;
pub mod paths;
pub mod telemetry;

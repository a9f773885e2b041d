//! Core types and configuration shared across apiguard crates.
//!
//! This crate provides the error taxonomy every layer maps its failures into
//! ([`ApiError`] / [`ErrorKind`]), the structured error body returned to
//! clients, and the environment-driven server configuration.

mod config;
mod error;

pub use config::{ApiConfig, env_bool, env_parse, env_string};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorKind};

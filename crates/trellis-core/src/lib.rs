//! trellis-core: Shared values, parameter maps, configuration, and error handling.
//!
//! This crate provides the foundational types used by the statement builder
//! and the execution client:
//! - `Value`, the typed scalar bound to a statement parameter
//! - `ParamMap`, the key-sorted parameter map carried alongside statement text
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod params;
pub mod value;

pub use error::CoreError;
pub use params::ParamMap;
pub use value::Value;

//! HTTP client for the symbol-art conversion service.
//!
//! Provides environment-driven configuration, the multipart conversion
//! call with structured error parsing, and the [`api::ConversionService`]
//! trait that the workflow depends on.

pub mod api;
pub mod config;

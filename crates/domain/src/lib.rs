//! Shared types for GeminiGuard: errors, configuration, and the
//! provider-agnostic conversation content model.

pub mod config;
pub mod content;
pub mod error;

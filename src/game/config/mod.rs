//! Config Module
//!
//! Grid settings and the buildable catalogue.

pub mod build_config;

pub use build_config::{BuildConfig, ConfigError, TemplateDefinition, TemplateKind};

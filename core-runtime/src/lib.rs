//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the media description core:
//! - Logging and tracing infrastructure
//! - Configuration management with fail-fast capability checks
//!
//! ## Overview
//!
//! `core-metadata` builds its services from a [`CoreConfig`](config::CoreConfig)
//! and logs exclusively through `tracing`; hosts call
//! [`init_logging`](logging::init_logging) once at startup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};

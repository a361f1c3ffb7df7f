//! Configuration module for audit-trail
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - Persisted settings for the diff engine, exclusions and worker pool

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::{Settings, SYSTEM_TENANT};

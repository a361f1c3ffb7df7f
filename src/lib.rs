//! audit-trail - Entity change tracking with structural diffs
//!
//! This library records what changed on an entity every time the host
//! persistence layer creates, updates or deletes it. Each event becomes an
//! audit record holding a path-keyed change set, and exactly one record per
//! entity is flagged as the latest.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Value trees, entity identity and audit records
//! - `diff`: Flattening, value comparison and structural diffing
//! - `storage`: JSON file storage for audit records
//! - `audit`: Lifecycle listener, worker pool and record store
//! - `display`: Terminal formatting for histories and change sets
//! - `export`: JSON, YAML and CSV export
//! - `cli`: Command handlers for the `trail` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::diff::{DiffOptions, StructuralDiffer};
//! use audit_trail::models::{Record, Value};
//!
//! let differ = StructuralDiffer::new(&DiffOptions::default());
//! let old = Value::from(Record::new("Customer").with("firstName", "Jane"));
//! let new = Value::from(Record::new("Customer").with("firstName", "John"));
//!
//! let changes = differ.diff(&old, &new);
//! assert_eq!(changes.to_payload()["firstName"], "Jane->John");
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod diff;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod storage;

pub use error::{AuditError, AuditResult};

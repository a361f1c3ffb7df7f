//! Audit trail recording for entity lifecycle events
//!
//! Turns persistence events into audit records: create, update and delete
//! operations with the structural change set between the old and new state.
//!
//! # Architecture
//!
//! - `AuditListener`: lifecycle hooks for the host persistence layer. Copies
//!   entity state into an `AuditEvent` and hands it to an `EventSink`.
//! - `EntityInfoResolver`: identity of an entity, or `None` for kinds that
//!   are never audited.
//! - `AuditPipeline`: diffs one event and appends the result. Usable as a
//!   sink directly, for synchronous recording.
//! - `AuditDispatcher`: a sink that queues events for a pool of tokio
//!   workers, keeping audit work off the caller's path.
//! - `AuditRecordStore`: writes records and keeps one latest record per
//!   entity. Failures are logged, never returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use audit_trail::audit::{AuditDispatcher, AuditListener, AuditPipeline, EntityInfoResolver};
//! use audit_trail::config::Settings;
//! use audit_trail::storage::AuditRecordRepository;
//!
//! let settings = Settings::default();
//! let pipeline = Arc::new(AuditPipeline::from_settings(
//!     &settings,
//!     Arc::new(AuditRecordRepository::new(paths.records_file())),
//! ));
//! let dispatcher = Arc::new(AuditDispatcher::from_settings(pipeline, &settings)?);
//! let listener = AuditListener::new(EntityInfoResolver::from_settings(&settings), dispatcher);
//!
//! // From the persistence layer's post-update hook
//! listener.on_post_update(&customer, &property_names, &old_state, &state);
//! ```

mod dispatcher;
mod listener;
mod pipeline;
mod resolver;
mod store;

pub use dispatcher::AuditDispatcher;
pub use listener::AuditListener;
pub use pipeline::{AuditEvent, AuditPipeline, EventSink, LifecycleKind};
pub use resolver::EntityInfoResolver;
pub use store::{AppendOutcome, AuditRecordStore};

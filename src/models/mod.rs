//! Core data models for audit-trail
//!
//! The value tree the diff engine works on, the identity of audited entities,
//! and the audit records written for them.

pub mod auditable;
pub mod entity;
pub mod ids;
pub mod record;
pub mod value;

pub use auditable::Auditable;
pub use entity::{AuditedEntity, EntityInfo};
pub use ids::RecordId;
pub use record::{Action, AuditRecord, ChangePayload};
pub use value::{ArrayMode, Record, Scalar, ScalarKind, Value, ValueKind};

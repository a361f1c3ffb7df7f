//! Entry point for the host persistence layer's lifecycle hooks
//!
//! Each hook resolves the entity's identity, copies its state into an
//! [`AuditEvent`] and hands it to a sink. Hooks never fail: anything that
//! goes wrong is logged and the event is dropped, so auditing cannot affect
//! the transaction that triggered it.

use std::sync::Arc;

use super::pipeline::{AuditEvent, EventSink};
use super::resolver::EntityInfoResolver;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditedEntity, Record, Value};

pub struct AuditListener {
    resolver: EntityInfoResolver,
    sink: Arc<dyn EventSink>,
}

impl AuditListener {
    pub fn new(resolver: EntityInfoResolver, sink: Arc<dyn EventSink>) -> Self {
        Self { resolver, sink }
    }

    /// After an entity was inserted
    pub fn on_post_insert(&self, entity: &dyn AuditedEntity) {
        if let Some(info) = self.resolver.resolve(entity) {
            let state = entity.to_value();
            self.submit(AuditEvent::inserted(info, state));
        }
    }

    /// After an entity was updated. `old_state` and `state` hold one value per
    /// entry of `property_names`, in the same order.
    pub fn on_post_update(
        &self,
        entity: &dyn AuditedEntity,
        property_names: &[String],
        old_state: &[Value],
        state: &[Value],
    ) {
        let Some(info) = self.resolver.resolve(entity) else {
            return;
        };

        let event = state_record(entity.entity_kind(), property_names, old_state).and_then(
            |before| {
                let after = state_record(entity.entity_kind(), property_names, state)?;
                Ok(AuditEvent::updated(info.clone(), before.into(), after.into()))
            },
        );

        match event {
            Ok(event) => self.submit(event),
            Err(e) => {
                tracing::error!(entity = %info.key(), error = %e, "dropping update event");
            }
        }
    }

    /// After an entity was deleted
    pub fn on_post_delete(&self, entity: &dyn AuditedEntity) {
        if let Some(info) = self.resolver.resolve(entity) {
            let state = entity.to_value();
            self.submit(AuditEvent::deleted(info, state));
        }
    }

    fn submit(&self, event: AuditEvent) {
        let key = event.info.key();
        if let Err(e) = self.sink.submit(event) {
            tracing::warn!(entity = %key, error = %e, "audit event dropped");
        }
    }
}

/// Zip property names with one side of the state arrays
fn state_record(kind: &str, names: &[String], values: &[Value]) -> AuditResult<Record> {
    if names.len() != values.len() {
        return Err(AuditError::traversal(
            "",
            format!(
                "{} property names but {} state values",
                names.len(),
                values.len()
            ),
        ));
    }

    Ok(names
        .iter()
        .zip(values)
        .fold(Record::new(kind), |record, (name, value)| {
            record.with_value(name.clone(), value.clone())
        }))
}

//! Audit trail CLI commands
//!
//! Records lifecycle events from JSON snapshots and browses the stored
//! history of an entity.

use std::path::PathBuf;

use clap::Subcommand;

use super::{array_mode, load_document};
use crate::audit::{AppendOutcome, AuditEvent, AuditPipeline, EntityInfoResolver};
use crate::config::Settings;
use crate::display::{format_history, format_record_details};
use crate::error::{AuditError, AuditResult};
use crate::models::EntityInfo;
use crate::storage::{RecordBackend, Storage};

/// Audit subcommands
#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// Record a lifecycle event from before/after snapshots
    ///
    /// Both snapshots make an update, only --after an insert and only
    /// --before a delete.
    Record {
        /// Entity type name, e.g. Customer
        kind: String,
        /// Entity primary key
        id: String,
        /// State before the change (JSON file)
        #[arg(short, long)]
        before: Option<PathBuf>,
        /// State after the change (JSON file)
        #[arg(short, long)]
        after: Option<PathBuf>,
        /// Table name (defaults to the lowercased kind)
        #[arg(short, long)]
        table: Option<String>,
        /// Tenant the entity belongs to
        #[arg(long)]
        tenant: Option<String>,
        /// Who made the change
        #[arg(long)]
        actor: Option<String>,
        /// Treat arrays as unordered sets
        #[arg(short, long)]
        sets: bool,
    },
    /// Show the change history of an entity
    History {
        /// Entity type name
        kind: String,
        /// Entity primary key
        id: String,
        /// Print every record in full
        #[arg(short, long)]
        details: bool,
    },
    /// Show a single record
    Show {
        /// Record ID (full or short form)
        record: String,
    },
    /// List stored records
    List {
        /// Only records for this entity type
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Recompute which record is latest for every entity
    Reconcile,
}

/// Handle an audit command
pub fn handle_audit_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AuditCommands,
) -> AuditResult<()> {
    match cmd {
        AuditCommands::Record {
            kind,
            id,
            before,
            after,
            table,
            tenant,
            actor,
            sets,
        } => {
            let resolver = EntityInfoResolver::from_settings(settings);
            if resolver.is_excluded(&kind) {
                println!("Entity type '{}' is excluded from auditing.", kind);
                return Ok(());
            }
            if id.trim().is_empty() {
                return Err(AuditError::Validation("Entity id cannot be empty".into()));
            }

            let table = table.unwrap_or_else(|| kind.to_lowercase());
            let mut info = EntityInfo::new(kind, id, table);
            if let Some(tenant) = tenant {
                info = info.with_tenant(tenant);
            }
            if let Some(actor) = actor {
                info = info.with_actor(actor);
            }

            let arrays = array_mode(sets);
            let before = before.map(|p| load_document(&p, arrays)).transpose()?;
            let after = after.map(|p| load_document(&p, arrays)).transpose()?;
            let event = match (before, after) {
                (Some(before), Some(after)) => AuditEvent::updated(info, before, after),
                (None, Some(after)) => AuditEvent::inserted(info, after),
                (Some(before), None) => AuditEvent::deleted(info, before),
                (None, None) => {
                    return Err(AuditError::Validation(
                        "Provide --before, --after, or both".into(),
                    ))
                }
            };

            let pipeline = AuditPipeline::from_settings(settings, storage.backend());
            match pipeline.handle(event) {
                AppendOutcome::Recorded(record) => {
                    println!(
                        "Recorded {} for {}/{}",
                        record.action, record.entity_kind, record.entity_id
                    );
                    println!("  Changes: {}", record.change_count());
                    println!("  ID: {}", record.id);
                }
                AppendOutcome::Excluded => println!("Table is excluded from auditing."),
                AppendOutcome::Unchanged => println!("No changes detected. Nothing recorded."),
                AppendOutcome::Failed => {
                    return Err(AuditError::Storage(
                        "Failed to write audit record".into(),
                    ))
                }
            }
        }

        AuditCommands::History { kind, id, details } => {
            let records = storage.records.history(&kind, &id)?;
            if details {
                if records.is_empty() {
                    println!("No audit records found.");
                }
                for record in &records {
                    print!("{}", format_record_details(record));
                    println!();
                }
            } else {
                println!("{}", format_history(&records).trim_end());
            }
        }

        AuditCommands::Show { record } => {
            let found = storage
                .records
                .find(&record)?
                .ok_or_else(|| AuditError::record_not_found(&record))?;
            print!("{}", format_record_details(&found));
        }

        AuditCommands::List { kind } => {
            let records = match kind {
                Some(kind) => storage.records.by_kind(&kind)?,
                None => storage.records.all()?,
            };
            println!("{}", format_history(&records).trim_end());
        }

        AuditCommands::Reconcile => {
            let changed = storage.records.reconcile()?;
            println!("Reconciled {} latest flag(s)", changed);
        }
    }

    Ok(())
}

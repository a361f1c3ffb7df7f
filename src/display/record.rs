//! Audit record display formatting
//!
//! Formats entity histories for terminal output in table and detail views.

use crate::models::AuditRecord;

/// Format an entity's history as a table, oldest first
pub fn format_history(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let entity_width = records
        .iter()
        .map(|r| r.entity_kind.len() + r.entity_id.len() + 1)
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<19}  {:<entity_width$}  {:<6}  {:>7}  {}\n",
        "ID",
        "Created",
        "Entity",
        "Action",
        "Changes",
        "Latest",
        entity_width = entity_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<19}  {:-<entity_width$}  {:-<6}  {:->7}  {:-<6}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        entity_width = entity_width,
    ));

    for record in records {
        output.push_str(&format!(
            "{:<12}  {:<19}  {:<entity_width$}  {:<6}  {:>7}  {}\n",
            record.id.to_string(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{}/{}", record.entity_kind, record.entity_id),
            record.action.to_string(),
            record.change_count(),
            if record.latest { "*" } else { "" },
            entity_width = entity_width,
        ));
    }

    output.push_str(&format!("\n{} record(s)\n", records.len()));
    output
}

/// Format a single record with its full change set
pub fn format_record_details(record: &AuditRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Audit Record: {}\n", record.id));
    output.push_str(&format!("  Entity:   {}/{}\n", record.entity_kind, record.entity_id));
    output.push_str(&format!("  Table:    {}\n", record.table_name));
    if let Some(tenant) = &record.tenant_id {
        output.push_str(&format!("  Tenant:   {}\n", tenant));
    }
    if let Some(actor) = &record.actor_id {
        output.push_str(&format!("  Actor:    {}\n", actor));
    }
    output.push_str(&format!("  Action:   {}\n", record.action));
    output.push_str(&format!(
        "  Latest:   {}\n",
        if record.latest { "Yes" } else { "No" }
    ));
    output.push_str(&format!(
        "  Created:  {}\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S%.3f UTC")
    ));

    if record.change_set.is_empty() {
        output.push_str("\n  (no changes)\n");
        return output;
    }

    output.push_str("\n  Changes:\n");
    let path_width = record.change_set.keys().map(|k| k.len()).max().unwrap_or(4);
    for (path, change) in &record.change_set {
        let rendered = change
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| change.to_string());
        output.push_str(&format!(
            "    {:<path_width$}  {}\n",
            if path.is_empty() { "(root)" } else { path.as_str() },
            rendered,
            path_width = path_width.max(6),
        ));
    }

    output
}

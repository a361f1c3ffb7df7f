//! Change set display formatting

use crate::diff::{ChangeEntry, ChangeSet, FlatMap};

/// Format a change set as a table of path, change kind and rendered change
pub fn format_change_set(changes: &ChangeSet) -> String {
    if changes.is_empty() {
        return "No differences.".to_string();
    }

    let path_width = changes
        .paths()
        .map(|p| display_path(p).len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<path_width$}  {:<8}  {}\n",
        "Path",
        "Change",
        "Value",
        path_width = path_width,
    ));
    output.push_str(&format!(
        "{:-<path_width$}  {:-<8}  {:-<10}\n",
        "",
        "",
        "",
        path_width = path_width,
    ));

    for (path, entry) in changes.iter() {
        let value = match entry {
            ChangeEntry::Modified { old, new } => format!("{} -> {}", old, new),
            ChangeEntry::Added { value } | ChangeEntry::Removed { value } => value.to_string(),
        };
        output.push_str(&format!(
            "{:<path_width$}  {:<8}  {}\n",
            display_path(path),
            entry.label(),
            value,
            path_width = path_width,
        ));
    }

    output.push_str(&format!("\n{} change(s)\n", changes.len()));
    output
}

/// Format a flat map as `path = value` lines
pub fn format_flat_map(flat: &FlatMap) -> String {
    let mut output = String::new();
    for (path, value) in flat.iter() {
        output.push_str(&format!("{} = {}\n", display_path(path), value.to_json()));
    }
    output
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}

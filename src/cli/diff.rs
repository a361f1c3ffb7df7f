//! Diff and flatten CLI commands
//!
//! Compares two JSON documents the way an entity update is compared, without
//! writing anything to the audit trail.

use std::path::PathBuf;

use clap::Args;

use super::{array_mode, load_document};
use crate::config::Settings;
use crate::diff::{Flattener, StructuralDiffer};
use crate::display::{format_change_set, format_flat_map};
use crate::error::{AuditError, AuditResult};

/// Arguments for `trail diff`
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Old state (JSON file)
    pub old: PathBuf,

    /// New state (JSON file)
    pub new: PathBuf,

    /// Treat arrays as unordered sets
    #[arg(short, long)]
    pub sets: bool,

    /// Compare the flattened forms instead of the trees
    #[arg(long)]
    pub flat: bool,

    /// Print the persisted payload (JSON) instead of a table
    #[arg(short, long)]
    pub payload: bool,
}

/// Arguments for `trail flatten`
#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Document to flatten (JSON file)
    pub file: PathBuf,

    /// Treat arrays as unordered sets
    #[arg(short, long)]
    pub sets: bool,

    /// Prefix every path with this segment
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Print the flat map as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handle `trail diff`
pub fn handle_diff_command(settings: &Settings, args: DiffArgs) -> AuditResult<()> {
    let arrays = array_mode(args.sets);
    let old = load_document(&args.old, arrays)?;
    let new = load_document(&args.new, arrays)?;

    let differ = StructuralDiffer::new(&settings.diff_options());
    let changes = if args.flat {
        let flattener = differ.flattener();
        differ.diff_flat(&flattener.flatten(&old, ""), &flattener.flatten(&new, ""))
    } else {
        differ.diff(&old, &new)
    };

    if args.payload {
        let rendered = serde_json::to_string_pretty(&changes.to_payload())
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        println!("{}", rendered);
    } else {
        println!("{}", format_change_set(&changes).trim_end());
    }

    Ok(())
}

/// Handle `trail flatten`
pub fn handle_flatten_command(settings: &Settings, args: FlattenArgs) -> AuditResult<()> {
    let value = load_document(&args.file, array_mode(args.sets))?;
    let flat = Flattener::new(&settings.diff_options()).flatten(&value, &args.prefix);

    if args.json {
        let rendered = serde_json::to_string_pretty(&flat.to_json())
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        println!("{}", rendered);
    } else {
        print!("{}", format_flat_map(&flat));
    }

    Ok(())
}

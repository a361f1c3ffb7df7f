use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use audit_trail::cli::{
    handle_audit_command, handle_diff_command, handle_export_command, handle_flatten_command,
    handle_import_command, AuditCommands, DiffArgs, ExportCommands, ExportFormat, FlattenArgs,
};
use audit_trail::config::{AuditPaths, Settings};
use audit_trail::storage::Storage;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "AUDIT_TRAIL_LOG";

#[derive(Parser)]
#[command(
    name = "trail",
    author = "Kaylee Beyene",
    version,
    about = "Entity change tracking with structural diffs",
    long_about = "trail records what changed on an entity between two states, \
                  keeps an append-only history per entity, and compares \
                  documents the same way the audit listener does."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two JSON documents
    Diff(DiffArgs),

    /// Print the flattened paths of a JSON document
    Flatten(FlattenArgs),

    /// Audit trail commands
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Export the audit trail
    #[command(subcommand)]
    Export(ExportCommands),

    /// Import records from a JSON or YAML export
    Import {
        /// Export file to read
        file: PathBuf,
        /// Input format (detected from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
    },

    /// Initialize the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Diff(args)) => handle_diff_command(&settings, args)?,
        Some(Commands::Flatten(args)) => handle_flatten_command(&settings, args)?,
        Some(Commands::Audit(cmd)) => handle_audit_command(&storage, &settings, cmd)?,
        Some(Commands::Export(cmd)) => handle_export_command(&storage, cmd)?,
        Some(Commands::Import { file, format }) => {
            handle_import_command(&storage, &file, format)?
        }
        Some(Commands::Init) => {
            println!("Initializing audit-trail at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            storage.records.save()?;
            println!("Initialization complete!");
            println!();
            println!("Run 'trail audit record --help' to record a change.");
        }
        Some(Commands::Config) => {
            println!("audit-trail Configuration");
            println!("=========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Records file:     {}", paths.records_file().display());
            println!("Export directory: {}", paths.export_dir().display());
            println!();
            println!("Settings:");
            println!("  Max depth:            {}", settings.max_depth);
            println!("  Timestamp epsilon:    {}ms", settings.timestamp_epsilon_ms);
            println!("  Similarity threshold: {}", settings.similarity_threshold);
            println!("  Ignored fields:       {}", settings.ignored_fields.join(", "));
            println!(
                "  Excluded entities:    {}",
                settings
                    .excluded_entities
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for (tenant, tables) in &settings.excluded_tables {
                println!(
                    "  Excluded tables ({}): {}",
                    tenant,
                    tables.iter().cloned().collect::<Vec<_>>().join(", ")
                );
            }
            println!("  Workers:              {}", settings.worker_count);
            println!("  Queue capacity:       {}", settings.queue_capacity);
        }
        None => {
            println!("trail - Entity change tracking with structural diffs");
            println!();
            println!("Run 'trail --help' for usage information.");
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["trail", "audit", "reconcile", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Some(Commands::Audit(AuditCommands::Reconcile))
        ));
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};

use entity_auditor::cli::{handle_export_command, handle_log_command, ExportArgs, LogCommands};
use entity_auditor::config::{AuditSettings, AuditorPaths};
use entity_auditor::logging::init_tracing;
use entity_auditor::storage::Storage;

#[derive(Parser)]
#[command(
    name = "auditor",
    version,
    about = "Inspect and export entity change audit logs",
    long_about = "auditor reads the field-level audit trail written by audited sessions. \
                  Every save is one batch; every changed field of every entity in it is \
                  one record."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse audit records
    #[command(subcommand)]
    Log(LogCommands),

    /// Export audit records as CSV, JSON or YAML
    Export(ExportArgs),

    /// Create the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let paths = AuditorPaths::new()?;
    let settings = AuditSettings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Log(cmd)) => {
            let storage = Storage::open(paths)?;
            handle_log_command(&storage, cmd)?;
        }
        Some(Commands::Export(args)) => {
            let storage = Storage::open(paths)?;
            handle_export_command(&storage, args)?;
        }
        Some(Commands::Init) => {
            println!("Initializing entity-auditor at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Settings written to: {}", paths.settings_file().display());
            println!("Audit records will be appended to: {}", paths.audit_log().display());
        }
        Some(Commands::Config) => {
            println!("entity-auditor Configuration");
            println!("============================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Entities file:  {}", paths.entities_file().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Audit logging enabled:    {}", settings.use_audit_logging);
            println!("  Ignore audit failures:    {}", settings.ignore_audit_log_exceptions);
            println!("  Default username:         {}", settings.default_username);
            if !settings.ignored_types.is_empty() {
                println!("  Ignored types:            {}", settings.ignored_types.join(", "));
            }
            if !settings.ignored_properties.is_empty() {
                println!(
                    "  Ignored properties:       {}",
                    settings.ignored_properties.join(", ")
                );
            }
        }
        None => {
            println!("auditor - entity change audit log viewer");
            println!();
            println!("Run 'auditor --help' for usage information.");
            println!("Run 'auditor log recent' to see the latest changes.");
        }
    }

    Ok(())
}

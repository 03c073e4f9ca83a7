//! Database table cleaning tool.
//!
//! Connects to a configured database, enumerates user tables, and
//! destructively cleans them (truncate or drop), gated by dry-run and
//! backup flags and by interactive confirmation.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dbcleaner_core::{CleanOptions, Cleaner, CleanerConfig, Config, init_logging};
use dialoguer::{Confirm, MultiSelect};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod wizard;

#[derive(Parser)]
#[command(name = "dbcleaner")]
#[command(about = "Clean database tables by truncating or dropping them")]
#[command(version)]
#[command(long_about = "
dbcleaner - destructive database table cleaning

Connects to the configured database, lists the base tables of the default
schema, and truncates or drops the tables you select.

SUPPORTED DATABASES:
- PostgreSQL (driver: postgres)
- MySQL (driver: mysql)

EXAMPLES:
  dbcleaner init
  dbcleaner clean --dry-run
  dbcleaner clean --truncate --config staging.yaml
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean database tables by truncating or dropping them
    Clean(CleanArgs),
    /// Interactively create a configuration file
    Init(InitArgs),
}

#[derive(Args)]
struct CleanArgs {
    /// Show what would be cleaned without actually doing it
    #[arg(long)]
    dry_run: bool,

    /// Create a backup before cleaning
    #[arg(long)]
    backup: bool,

    /// Truncate tables instead of dropping them
    #[arg(long)]
    truncate: bool,

    /// Clean every candidate table without prompting
    #[arg(long)]
    yes: bool,

    /// Configuration file path
    #[arg(long, env = "DBCLEANER_CONFIG", default_value = "dbcleaner.yaml")]
    config: PathBuf,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 30)]
    connect_timeout: u64,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the configuration file
    #[arg(short, long, default_value = "dbcleaner.yaml")]
    output: PathBuf,

    /// Overwrite an existing file without asking
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match cli.command {
        Command::Clean(args) => run_clean(args).await,
        Command::Init(args) => wizard::run_wizard(&args.output, args.force),
    }
}

/// Merges CLI flags with the `cleaner` config section into one options
/// value for the invocation. A flag or a config default is enough to
/// enable a behavior.
fn merge_options(args: &CleanArgs, defaults: &CleanerConfig) -> CleanOptions {
    CleanOptions {
        dry_run: args.dry_run || defaults.dry_run,
        backup: args.backup || defaults.backup_before,
        truncate: args.truncate || defaults.truncate_only,
    }
}

async fn run_clean(args: CleanArgs) -> anyhow::Result<()> {
    let config = Config::load(&args.config).with_context(|| {
        format!(
            "failed to load configuration from {} (run `dbcleaner init` to create one)",
            args.config.display()
        )
    })?;

    let opts = merge_options(&args, &config.cleaner);
    if opts.dry_run {
        info!("dry-run mode: no tables will be modified");
    }

    // Driver resolution happens before any connection attempt.
    let mut cleaner = Cleaner::from_config(&config)?;

    info!("connecting to {}", config.database);
    let outcome = match cleaner.connect(Duration::from_secs(args.connect_timeout)).await {
        Ok(()) => clean_flow(&cleaner, &config, &opts, args.yes).await,
        Err(e) => Err(e.into()),
    };

    // The session is released on every path, including a failed connect.
    cleaner.close().await;
    outcome
}

async fn clean_flow(
    cleaner: &Cleaner,
    config: &Config,
    opts: &CleanOptions,
    assume_yes: bool,
) -> anyhow::Result<()> {
    let all_tables = cleaner.list_tables().await?;
    let candidates = config.cleaner.filter_tables(&all_tables);

    if candidates.is_empty() {
        println!("No candidate tables found in {}", config.database);
        return Ok(());
    }

    println!("Found {} candidate tables:", candidates.len());
    for table in &candidates {
        println!("  - {table}");
    }

    let selected = if assume_yes {
        candidates
    } else {
        select_tables(&candidates)?
    };

    if selected.is_empty() {
        println!("No tables selected, nothing to do.");
        return Ok(());
    }

    if !opts.dry_run && !assume_yes && !confirm_destruction(&selected, opts)? {
        println!("Cleaning cancelled.");
        return Ok(());
    }

    cleaner.clean_tables(&selected, opts).await?;

    if opts.dry_run {
        println!("Dry run completed; no tables were modified.");
    } else {
        println!("Cleaned {} tables successfully.", selected.len());
    }
    Ok(())
}

fn select_tables(candidates: &[String]) -> anyhow::Result<Vec<String>> {
    let picked = MultiSelect::new()
        .with_prompt("Select tables to clean (space toggles, enter confirms)")
        .items(candidates)
        .interact()
        .context("table selection cancelled")?;

    Ok(picked.into_iter().map(|i| candidates[i].clone()).collect())
}

fn confirm_destruction(selected: &[String], opts: &CleanOptions) -> anyhow::Result<bool> {
    let action = if opts.truncate { "truncate" } else { "drop" };
    Confirm::new()
        .with_prompt(format!(
            "Permanently {action} {} selected table(s)?",
            selected.len()
        ))
        .default(false)
        .interact()
        .context("confirmation cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_clean_flags_parse() {
        let cli = Cli::parse_from([
            "dbcleaner",
            "clean",
            "--dry-run",
            "--truncate",
            "--config",
            "staging.yaml",
        ]);
        let Command::Clean(args) = cli.command else {
            panic!("expected clean subcommand");
        };
        assert!(args.dry_run);
        assert!(args.truncate);
        assert!(!args.backup);
        assert_eq!(args.config, PathBuf::from("staging.yaml"));
        assert_eq!(args.connect_timeout, 30);
    }

    #[test]
    fn test_merge_options_flag_or_config_enables() {
        let cli = Cli::parse_from(["dbcleaner", "clean", "--backup"]);
        let Command::Clean(args) = cli.command else {
            panic!("expected clean subcommand");
        };

        let defaults = CleanerConfig {
            dry_run: true,
            ..Default::default()
        };
        let opts = merge_options(&args, &defaults);
        assert!(opts.dry_run, "config default enables dry-run");
        assert!(opts.backup, "flag enables backup");
        assert!(!opts.truncate);
    }
}

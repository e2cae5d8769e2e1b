// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Filekeeper CLI: organize, deduplicate and rename files from the terminal.
//!
//! Every mutating command defaults to preview mode; nothing touches the
//! filesystem until `--execute` is passed.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use filekeeper::classifier::ProjectRule;
use filekeeper::config::AppConfig;
use filekeeper::dupes::{self, GroupSelection};
use filekeeper::fileops::format_file_size;
use filekeeper::oplog::OperationLog;
use filekeeper::organizer::{self, OrganizeStrategy};
use filekeeper::renamer::{self, CommandExtractor};
use filekeeper::scanner::scan_directory;
use filekeeper::validate::{validate_destination, validate_path};
use filekeeper::{ExecutionMode, FilekeeperError, OperationResult, Result};

/// Filekeeper CLI - file organization, duplicate cleanup and renaming
#[derive(Parser, Debug)]
#[command(name = "filekeeper")]
#[command(version = "1.2.0")]
#[command(about = "Organize, deduplicate and rename files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List files in a directory with size and timestamps
    Scan {
        /// Directory to scan
        path: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Move files into category, date or project folders
    Organize {
        /// Directory holding the files to organize
        path: String,

        /// Destination root (defaults to the scanned directory)
        #[arg(short, long)]
        target: Option<String>,

        /// Grouping strategy
        #[arg(short, long, default_value = "type", value_parser = ["type", "date", "project"])]
        strategy: String,

        /// JSON file with project rules (required for --strategy project)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Actually move files instead of previewing
        #[arg(long)]
        execute: bool,
    },

    /// Find files with identical content
    Duplicates {
        /// Directory to scan
        path: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Ignore files smaller than this many bytes (overrides config)
        #[arg(long)]
        min_size: Option<u64>,

        /// Delete redundant copies (keeps the first file of each group
        /// unless --keep says otherwise)
        #[arg(long)]
        remove: bool,

        /// Keep selection per group, formatted GROUP:IDX[,IDX...]
        /// (e.g. --keep 0:1 --keep 2:0,3)
        #[arg(long)]
        keep: Vec<String>,

        /// Move redundant copies into this directory instead of deleting
        #[arg(long, conflicts_with = "remove")]
        archive_to: Option<String>,

        /// Actually remove/archive files instead of previewing
        #[arg(long)]
        execute: bool,
    },

    /// Rename screenshots from text extracted out of the image
    Rename {
        /// Directory holding the screenshots
        path: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Actually rename files instead of previewing
        #[arg(long)]
        execute: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;
    let log = OperationLog::new(PathBuf::from(&config.log.path));

    match cli.command {
        Commands::Scan { path, recursive } => run_scan(&config, &path, recursive, &cli.format),
        Commands::Organize {
            path,
            target,
            strategy,
            rules,
            execute,
        } => run_organize(&config, &log, &path, target, &strategy, rules, execute, &cli.format),
        Commands::Duplicates {
            path,
            recursive,
            min_size,
            remove,
            keep,
            archive_to,
            execute,
        } => run_duplicates(
            &config, &log, &path, recursive, min_size, remove, &keep, archive_to, execute,
            &cli.format,
        ),
        Commands::Rename {
            path,
            recursive,
            execute,
        } => run_rename(&config, &log, &path, recursive, execute, &cli.format).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

fn execution_mode(execute: bool) -> ExecutionMode {
    if execute {
        ExecutionMode::Execute
    } else {
        warn!("PREVIEW MODE - no files will be modified (pass --execute to apply)");
        ExecutionMode::Preview
    }
}

/// Run a scan and print the records
fn run_scan(config: &AppConfig, path: &str, recursive: bool, format: &str) -> Result<()> {
    let dir = validate_path(path, &config.allowed_root_paths())?;
    let report = scan_directory(&dir, recursive, &config.scan.ignore_patterns);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report.records)?);
        }
        _ => {
            for record in &report.records {
                println!(
                    "{:>10}  {}  {}",
                    format_file_size(record.size_bytes),
                    record.modified.format("%Y-%m-%d %H:%M"),
                    record.path.display()
                );
            }
            if report.skipped > 0 {
                println!("\n{} files ({} skipped)", report.records.len(), report.skipped);
            } else {
                println!("\n{} files", report.records.len());
            }
        }
    }

    for err in &report.errors {
        warn!("Skipped {:?}: {}", err.path, err.message);
    }

    Ok(())
}

/// Run the organize command
#[allow(clippy::too_many_arguments)]
fn run_organize(
    config: &AppConfig,
    log: &OperationLog,
    path: &str,
    target: Option<String>,
    strategy: &str,
    rules_file: Option<PathBuf>,
    execute: bool,
    format: &str,
) -> Result<()> {
    let roots = config.allowed_root_paths();
    let dir = validate_path(path, &roots)?;
    let target_dir = match target {
        Some(t) => validate_path(&t, &roots)?,
        None => dir.clone(),
    };

    let strategy = match strategy {
        "date" => OrganizeStrategy::ByDate,
        "project" => OrganizeStrategy::ByProject,
        _ => OrganizeStrategy::ByType,
    };

    let rules: Vec<ProjectRule> = match rules_file {
        Some(ref file) => {
            let content = std::fs::read_to_string(file)?;
            serde_json::from_str(&content).map_err(|e| {
                FilekeeperError::Config(format!("Failed to parse rules file {:?}: {}", file, e))
            })?
        }
        None => Vec::new(),
    };

    let report = scan_directory(&dir, config.scan.recursive, &config.scan.ignore_patterns);
    for err in &report.errors {
        warn!("Skipped {:?}: {}", err.path, err.message);
    }

    let mode = execution_mode(execute);

    if mode.is_preview() {
        let plan = organizer::plan_organize(&report.records, strategy, &target_dir, &rules);
        for planned in &plan {
            println!(
                "{} -> {}",
                planned.source.display(),
                planned.destination.display()
            );
        }
    }

    let result = organizer::organize(&report.records, strategy, &target_dir, &rules, mode, log)?;
    print_result(&result, format)?;
    Ok(())
}

/// Parse one `--keep GROUP:IDX[,IDX...]` argument
fn parse_keep(raw: &str) -> Result<GroupSelection> {
    let invalid =
        || FilekeeperError::InvalidSelection(format!("invalid --keep value '{}'", raw));

    let (group, indices) = raw.split_once(':').ok_or_else(invalid)?;
    let group_index: usize = group.trim().parse().map_err(|_| invalid())?;
    let keep_indices: Vec<usize> = indices
        .split(',')
        .map(|i| i.trim().parse().map_err(|_| invalid()))
        .collect::<Result<_>>()?;

    Ok(GroupSelection {
        group_index,
        keep_indices,
    })
}

/// Run the duplicates command
#[allow(clippy::too_many_arguments)]
fn run_duplicates(
    config: &AppConfig,
    log: &OperationLog,
    path: &str,
    recursive: bool,
    min_size: Option<u64>,
    remove: bool,
    keep: &[String],
    archive_to: Option<String>,
    execute: bool,
    format: &str,
) -> Result<()> {
    let roots = config.allowed_root_paths();
    let dir = validate_path(path, &roots)?;
    let min_size = min_size.unwrap_or(config.scan.min_duplicate_size);

    let report = scan_directory(&dir, recursive, &config.scan.ignore_patterns);
    let scan = dupes::find_duplicates(&report.records, config.hashing.chunk_size, min_size);
    for err in &scan.errors {
        warn!("Could not hash {:?}: {}", err.path, err.message);
    }

    if format == "json" && !remove && archive_to.is_none() {
        let groups: Vec<serde_json::Value> = scan
            .groups
            .iter()
            .map(|g| {
                serde_json::json!({
                    "digest": g.digest,
                    "total_size": g.total_size,
                    "files": g.members.iter().map(|m| m.path.to_string_lossy()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if scan.groups.is_empty() {
        info!("No duplicate files found");
        return Ok(());
    }

    for (i, group) in scan.groups.iter().enumerate() {
        println!(
            "Group {} ({} files, {} each):",
            i,
            group.members.len(),
            format_file_size(group.members[0].size_bytes)
        );
        for (j, member) in group.members.iter().enumerate() {
            println!("  [{}] {}", j, member.path.display());
        }
    }

    if !remove && archive_to.is_none() {
        return Ok(());
    }

    let selections: Vec<GroupSelection> =
        keep.iter().map(|k| parse_keep(k)).collect::<Result<_>>()?;
    let mode = execution_mode(execute);

    let result = if let Some(archive) = archive_to {
        // The archive directory may not exist yet; it still has to land
        // inside the allowed roots.
        let archive_dir = validate_destination(&archive, &roots)?;
        dupes::archive_duplicates(&scan.groups, &selections, &archive_dir, mode, log)?
    } else {
        dupes::remove_duplicates(&scan.groups, &selections, mode, log)
    };

    print_result(&result, format)?;
    Ok(())
}

/// Extensions the rename command considers screenshots
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "webp"];

/// Run the rename command
async fn run_rename(
    config: &AppConfig,
    log: &OperationLog,
    path: &str,
    recursive: bool,
    execute: bool,
    format: &str,
) -> Result<()> {
    let dir = validate_path(path, &config.allowed_root_paths())?;

    let report = scan_directory(&dir, recursive, &config.scan.ignore_patterns);
    let files: Vec<PathBuf> = report
        .records
        .iter()
        .filter(|r| IMAGE_EXTENSIONS.contains(&r.extension.as_str()))
        .map(|r| r.path.clone())
        .collect();

    if files.is_empty() {
        info!("No image files found in {:?}", dir);
        return Ok(());
    }

    let extractor = CommandExtractor::from_config(&config.ocr);
    let mode = execution_mode(execute);
    let rename = renamer::rename_screenshots(&files, &extractor, &config.naming, mode, log).await;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rename.proposals)?);
        }
        _ => {
            for proposal in &rename.proposals {
                println!(
                    "{} -> {} [{}]",
                    proposal.original_name,
                    proposal.proposed_name,
                    serde_json::to_value(&proposal.status)?
                        .as_str()
                        .unwrap_or("unknown")
                );
            }
        }
    }

    print_result(&rename.result, format)?;
    Ok(())
}

/// Print a batch result in the requested format
fn print_result(result: &OperationResult, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        _ => {
            println!(
                "\nProcessed {} files, {} errors",
                result.processed_count,
                result.error_list.len()
            );
            for err in &result.error_list {
                eprintln!("  {}: {}", err.path.display(), err.message);
            }
            for (key, value) in &result.summary {
                println!("  {}: {}", key, value);
            }
            if !result.success {
                eprintln!("Completed with errors");
            }
        }
    }
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            let default_config = AppConfig::default();
            default_config.save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Allowed roots: {:?}", config.allowed_roots);
            println!("  Log file: {}", config.log.path);
            println!("  OCR command: {} {:?}", config.ocr.program, config.ocr.args);
        }
    }

    Ok(())
}

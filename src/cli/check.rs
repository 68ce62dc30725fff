//! # Check Command
//!
//! This module implements the check/modify run over a batch of files. It is
//! the only command crtdebug has.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::config::load_config;
use crate::diff::DiffManager;
use crate::encoding::initialize_codepage_support;
use crate::file_filter::ExtensionFilter;
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{
  CategorizedReports, print_all_files_ok, print_blank_line, print_failed_files, print_hint, print_inserted_files,
  print_missing_files, print_start_message, print_summary, print_verbose_details,
};
use crate::processor::{FileCollector, Processor, ProcessorConfig};
use crate::report::{FileReport, ProcessingSummary, ReportFormat, ReportGenerator};
use crate::workspace::resolve_workspace;

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
  /// File or directory patterns to process. Directories are processed
  /// recursively.
  #[arg(required = true)]
  pub patterns: Vec<String>,

  /// Path to config file (default: .crtdebug.toml in workspace root)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Dry run mode: only report files missing the block without modifying
  /// them (default)
  #[arg(long, group = "mode", hide = true)]
  pub dry_run: bool,

  /// Modify mode: insert the block into files that lack it
  #[arg(
    long,
    group = "mode",
    help = "Modify mode: insert the block into files that lack it

[default: --dry-run]"
  )]
  pub modify: bool,

  /// Show diff of pending insertions in dry run mode
  #[arg(long)]
  pub show_diff: bool,

  /// Save diff of pending insertions to a file in dry run mode
  #[arg(long, short = 'o', value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// File patterns to ignore (supports glob patterns)
  #[arg(long, short = 'i')]
  pub ignore: Vec<String>,

  /// Skip files whose path contains this text (repeatable, case-insensitive).
  /// Added to the config's [paths] exclude list.
  #[arg(long, value_name = "TEXT")]
  pub exclude_path: Vec<String>,

  /// Only process files with these extensions (repeatable, case-insensitive)
  #[arg(long, value_name = "EXT")]
  pub include_ext: Vec<String>,

  /// Exclude files with these extensions (repeatable, case-insensitive)
  #[arg(long, value_name = "EXT")]
  pub exclude_ext: Vec<String>,

  /// Marker whose presence means a file is already done (overrides config)
  #[arg(long, value_name = "TEXT")]
  pub marker: Option<String>,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors and the paths of files missing the
  /// block
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,

  /// Generate a JSON report of per-file results and save to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Generate a CSV report of per-file results and save to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_csv: Option<PathBuf>,
}

/// Run the check command with the given arguments
pub fn run_check(args: CheckArgs) -> Result<()> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  // Dry run is the default when neither flag is given
  let check_only = args.dry_run || !args.modify;

  let workspace_root = resolve_workspace(&args.patterns)?;
  debug!("Using workspace root: {}", workspace_root.display());

  let mut config = load_config(args.config.as_deref(), &workspace_root, args.no_config)?;

  if let Some(marker) = args.marker {
    config.marker = marker;
    config
      .validate()
      .context("The --marker override does not fit the configured block")?;
  }

  initialize_codepage_support(Some(&config.legacy_codepage))
    .with_context(|| format!("Failed to set up legacy code page '{}'", config.legacy_codepage))?;

  let extension_filter = ExtensionFilter::new(&config.extensions).merge_cli(args.include_ext, args.exclude_ext);
  if extension_filter.is_active() {
    debug!("Extension filtering is active");
  }

  let mut exclude_paths = config.paths.exclude.clone();
  exclude_paths.extend(args.exclude_path);

  let diff_manager = DiffManager::new(args.show_diff, args.save_diff);
  diff_manager.prepare()?;

  let inserter = config.inserter();
  let marker = inserter.marker().to_string();

  let mut processor = Processor::new(ProcessorConfig {
    check_only,
    ignore_patterns: args.ignore,
    exclude_paths,
    extension_filter,
    diff_manager: Some(diff_manager),
    ..ProcessorConfig::new(inserter, workspace_root)
  })?;

  let files = FileCollector::collect(&args.patterns)?;
  print_start_message(files.len(), !check_only);

  if files.is_empty() {
    print_blank_line();
    print_all_files_ok(&marker);
    return Ok(());
  }

  let start_time = Instant::now();
  let has_issues = processor.process_files(files)?;
  let elapsed = start_time.elapsed();

  let file_reports = processor.take_file_reports();
  let summary = ProcessingSummary::from_reports(&file_reports, elapsed);
  let categorized = CategorizedReports::from_reports(&file_reports);

  print_blank_line();
  print_verbose_details(&categorized);

  if check_only {
    print_missing_files(&categorized.missing, &marker);
  } else {
    print_inserted_files(&categorized.inserted, &marker);
  }
  print_failed_files(&categorized.failed);

  if !has_issues && categorized.inserted.is_empty() {
    print_all_files_ok(&marker);
  }

  print_blank_line();
  print_summary(&summary);

  if check_only && !categorized.missing.is_empty() {
    print_blank_line();
    print_hint("Run with --modify to insert the missing blocks.");
  }

  write_report(ReportFormat::Json, args.report_json.as_deref(), &file_reports, &summary);
  write_report(ReportFormat::Csv, args.report_csv.as_deref(), &file_reports, &summary);

  // In modify mode only failures count; missing blocks were inserted.
  if has_issues {
    process::exit(1);
  }

  Ok(())
}

/// Writes one report if a path was requested. Report failures are printed
/// but do not change the exit code.
fn write_report(format: ReportFormat, output_path: Option<&Path>, files: &[FileReport], summary: &ProcessingSummary) {
  let Some(output_path) = output_path else {
    return;
  };

  let report_generator = ReportGenerator::new(format, output_path);
  if let Err(e) = report_generator.generate(files, summary) {
    eprintln!("Error generating {} report: {:#}", format, e);
  } else {
    info_log!("Generated {} report at {}", format, output_path.display());
  }
}

//! # CLI Module
//!
//! Command-line interface for the document intake pipeline.
//!
//! ## Usage
//! ```bash
//! # Stage files and folders; nothing is written
//! doc-intake stage ~/Downloads/papers
//!
//! # Stage, then commit everything selected
//! doc-intake import ~/Downloads/papers --library ~/Library/Papers
//!
//! # JSON output
//! doc-intake stage paper.pdf --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use document_intake::core::hasher::Sha256Hasher;
use document_intake::core::hooks::ChangeLogRepository;
use document_intake::core::metadata::{FilenameExtractor, StandardNormalizer};
use document_intake::core::model::{StagingItem, SuggestedAction};
use document_intake::core::pipeline::{CancellationToken, IntakeConfig, IntakePipeline};
use document_intake::core::scanner::{DocumentScanner, ScanConfig};
use document_intake::core::similarity::ShingleScorer;
use document_intake::core::storage::LocalBlobStorage;
use document_intake::core::store::SqliteEntryStore;
use document_intake::error::{IntakeError, Result};
use document_intake::events::{CommitEvent, Event, EventChannel, StageEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// Document Intake - stage, deduplicate and commit documents
#[derive(Parser, Debug)]
#[command(name = "doc-intake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage files and show what would happen to each
    Stage {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Stage files, then commit every selected item
    Import {
        #[command(flatten)]
        common: CommonArgs,

        /// Stage only; report what would be committed
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Files or folders to ingest
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Library root (overrides the config file)
    #[arg(short, long)]
    library: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stage { common } => run_intake(common, Mode::Stage),
        Commands::Import { common, dry_run } => {
            run_intake(common, if dry_run { Mode::DryRun } else { Mode::Import })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Stage,
    DryRun,
    Import,
}

fn load_config(common: &CommonArgs) -> Result<IntakeConfig> {
    let mut config = match &common.config {
        Some(path) => IntakeConfig::load(path)?,
        None => IntakeConfig::default(),
    };
    if let Some(library) = &common.library {
        config.library_root = library.clone();
    }
    if common.include_hidden {
        config.include_hidden = true;
    }
    Ok(config)
}

fn run_intake(common: CommonArgs, mode: Mode) -> Result<()> {
    document_intake::init_tracing(if common.verbose { "debug" } else { "warn" });

    let term = Term::stderr();
    let pretty = common.output == OutputFormat::Pretty;
    let config = load_config(&common)?;

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Document Intake").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} {}",
            style("Library:").dim(),
            config.library_root.display()
        ))
        .ok();
        term.write_line("").ok();
    }

    let scanner = DocumentScanner::new(ScanConfig {
        include_hidden: config.include_hidden,
        extensions: Some(config.allowed_extensions.clone()),
        ..ScanConfig::default()
    });
    let paths = scanner.expand(&common.paths)?;

    let (sender, receiver) = EventChannel::new();
    let mut builder = IntakePipeline::builder()
        .config(config.clone())
        .store(Arc::new(SqliteEntryStore::open(&config.database_path())?))
        .storage(Arc::new(LocalBlobStorage::new(&config.library_root)))
        .hasher(Arc::new(Sha256Hasher::new()))
        .extractor(Arc::new(FilenameExtractor::new()))
        .scorer(Arc::new(ShingleScorer::new()))
        .normalizer(Arc::new(StandardNormalizer))
        .events(sender);
    if mode == Mode::Import && config.changelog {
        let changelog = ChangeLogRepository::open(&config.changelog_path())
            .map_err(|e| IntakeError::Config(e.to_string()))?;
        builder = builder.hook(Arc::new(changelog));
    }
    let pipeline = builder.build()?;

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = common.verbose;

    // Handle events in a separate thread; it returns the committed entry ids
    let event_thread = thread::spawn(move || {
        let mut committed_ids = Vec::new();
        for event in receiver.iter() {
            if let Event::Commit(CommitEvent::ItemCommitted { path, entry_id, .. }) = &event {
                committed_ids.push((path.clone(), entry_id.clone()));
            }
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Stage(StageEvent::Started { total }) => {
                    pb.set_length(total as u64);
                    pb.set_message("Staging");
                }
                Event::Stage(StageEvent::FileStaged { path, .. }) => {
                    pb.inc(1);
                    if verbose {
                        pb.set_message(file_name(&path));
                    }
                }
                Event::Stage(StageEvent::FileFailed { path, message }) => {
                    pb.inc(1);
                    pb.println(format!("  {} {}: {}", style("!").red(), file_name(&path), message));
                }
                Event::Stage(StageEvent::Completed { .. } | StageEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                Event::Commit(CommitEvent::ItemSkipped { path, reason }) if verbose => {
                    pb.println(format!("  {} {}: {}", style("-").dim(), file_name(&path), reason));
                }
                Event::Commit(CommitEvent::ItemFailed { path, message }) => {
                    pb.println(format!("  {} {}: {}", style("!").red(), file_name(&path), message));
                }
                _ => {}
            }
        }
        committed_ids
    });

    let ct = CancellationToken::new();
    let staged = pipeline.stage_all(&paths, &ct)?;
    let committed = match mode {
        Mode::Import => Some(pipeline.commit(staged.clone(), &ct)?),
        Mode::Stage | Mode::DryRun => None,
    };

    // Drop pipeline to close the event channel
    drop(pipeline);
    let committed_ids = event_thread.join().unwrap_or_default();
    let committed = committed.map(|_| committed_ids);

    match common.output {
        OutputFormat::Pretty => {
            print_pretty_results(&term, &staged, committed.as_deref(), mode, verbose)
        }
        OutputFormat::Json => print_json_results(&staged, committed.as_deref())?,
    }

    Ok(())
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn print_pretty_results(
    term: &Term,
    staged: &[StagingItem],
    committed: Option<&[(PathBuf, String)]>,
    mode: Mode,
    verbose: bool,
) {
    term.write_line(&format!(
        "{} {} files staged",
        style("✓").green().bold(),
        style(staged.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    for (i, item) in staged.iter().enumerate() {
        let action = match item.suggested_action {
            SuggestedAction::New => style(format!("{:<10}", "New")).green(),
            SuggestedAction::Duplicate => style(format!("{:<10}", "Duplicate")).dim(),
            SuggestedAction::Review => style(format!("{:<10}", "Review")).yellow(),
            other => style(format!("{:<10}", other.to_string())).cyan(),
        };
        let marker = if item.selected { "●" } else { "○" };

        term.write_line(&format!(
            "  {:>3}. {} {} {}",
            i + 1,
            marker,
            action,
            item.display_name
        ))
        .ok();

        if let Some(title) = &item.similar_to_title {
            term.write_line(&format!(
                "          {} {} ({:.1}%, {})",
                style("matches").dim(),
                title,
                item.similarity * 100.0,
                item.match_kind
            ))
            .ok();
        }
    }

    term.write_line("").ok();
    let selected = staged.iter().filter(|i| i.selected).count();

    match (mode, committed) {
        (Mode::Import, Some(committed)) => {
            term.write_line(&format!(
                "{} {} of {} selected items committed",
                style("✓").green().bold(),
                style(committed.len()).cyan(),
                selected
            ))
            .ok();
            if verbose {
                for (path, entry_id) in committed {
                    term.write_line(&format!("    {} {}", style(entry_id).dim(), file_name(path)))
                        .ok();
                }
            }
        }
        (Mode::DryRun, _) => {
            term.write_line(&format!(
                "{}",
                style(format!("Dry run: {} selected items would be committed.", selected)).dim()
            ))
            .ok();
        }
        _ => {
            term.write_line(&format!(
                "{}",
                style("Nothing was written. Run `doc-intake import` to commit.").dim()
            ))
            .ok();
        }
    }
}

fn print_json_results(
    staged: &[StagingItem],
    committed: Option<&[(PathBuf, String)]>,
) -> Result<()> {
    let output = serde_json::json!({
        "staged": staged,
        "committed": committed.map(|items| {
            items
                .iter()
                .map(|(path, entry_id)| serde_json::json!({ "path": path, "entry_id": entry_id }))
                .collect::<Vec<_>>()
        }),
    });

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| IntakeError::Config(format!("JSON output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;

use bilidocx::app_config::{self, Config};
use bilidocx::app_controller::Controller;
use bilidocx::dialect::Dialect;
use bilidocx::errors::AppError;
use bilidocx::file_utils::FileManager;

/// CLI Wrapper for Dialect to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDialect {
    NumberedPair,
    BracketBrace,
    Pipe,
}

impl From<CliDialect> for Dialect {
    fn from(cli_dialect: CliDialect) -> Self {
        match cli_dialect {
            CliDialect::NumberedPair => Dialect::NumberedPair,
            CliDialect::BracketBrace => Dialect::BracketBrace,
            CliDialect::Pipe => Dialect::Pipe,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report the dialect of a document or of every document in a directory
    Sniff {
        /// Input .docx file or directory
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
    },

    /// Read segments from a bilingual document into a JSON file
    Extract {
        /// Input .docx file or directory
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Output JSON file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dialect to read with instead of sniffing
        #[arg(short, long, value_enum)]
        dialect: Option<CliDialect>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Write translated segments from a JSON file back into the document
    Update {
        /// Original bilingual document
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Segment file produced by `extract`
        #[arg(value_name = "SEGMENTS")]
        segments: PathBuf,

        /// Output document
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dialect to write with instead of the one recorded in the segment file
        #[arg(short, long, value_enum)]
        dialect: Option<CliDialect>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Export (original, final) paragraph pairs from tracked changes
    Changes {
        /// Input .docx file
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for bilidocx
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// bilidocx - bilingual DOCX interchange for CAT tools
#[derive(Parser, Debug)]
#[command(name = "bilidocx")]
#[command(version = "0.1.0")]
#[command(about = "Read and write CAT-tool bilingual DOCX tables")]
#[command(long_about = "bilidocx reads the segment tables of bilingual DOCX exports, carries inline formatting as tag notation, and writes translations back.

EXAMPLES:
    bilidocx sniff exports/                      # Report the dialect of every document
    bilidocx extract review.docx                 # Write review.segments.json
    bilidocx extract -d pipe strings.docx        # Skip sniffing
    bilidocx update review.docx review.segments.json -o review.nl.docx
    bilidocx changes edited.docx                 # Write edited.changes.json
    bilidocx completions bash > bilidocx.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

DIALECTS:
    numbered-pair - <1>text</1> tags, ID/Status/Source/Target table
    bracket-brace - [1}text{2] tags, ID/Source/Target/Comment/Status table
    pipe          - |text| tags, ID/Source/Target/Notes table")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Accept everything here; the effective level is applied once the
    // config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "bilidocx", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(cmd_log_level) = &cli.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = Config::load_or_create(&cli.config_path)
        .with_context(|| format!("Failed to load configuration from {}", cli.config_path))?;
    match &cli.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Sniff { input_path } => run_sniff(&controller, input_path),
        Commands::Extract {
            input_path,
            output,
            dialect,
            force_overwrite,
        } => run_extract(&controller, input_path, output, dialect.map(Into::into), force_overwrite),
        Commands::Update {
            document,
            segments,
            output,
            dialect,
            force_overwrite,
        } => {
            let report = controller.update_file(
                &document,
                &segments,
                output,
                dialect.map(Into::into),
                force_overwrite,
            )?;
            if let Some(report) = report {
                info!(
                    "Updated {}: {} rows written, {} skipped, {} warnings",
                    document.display(),
                    report.rows_written,
                    report.rows_skipped,
                    report.warnings.len()
                );
            }
            Ok(())
        }
        Commands::Changes { input_path, output } => {
            let count = controller.changes_to_json(&input_path, output)?;
            info!("Exported {} change pairs from {}", count, input_path.display());
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn run_sniff(controller: &Controller, input_path: PathBuf) -> Result<()> {
    let results = controller.sniff_path(&input_path)?;
    let mut unrecognized = 0;
    for (path, dialect) in &results {
        match dialect {
            Some(dialect) => println!("{}\t{}", dialect, path.display()),
            None => {
                unrecognized += 1;
                println!("unrecognized\t{}", path.display());
            }
        }
    }
    if unrecognized > 0 {
        warn!("{} of {} documents not recognized", unrecognized, results.len());
    }
    Ok(())
}

fn run_extract(
    controller: &Controller,
    input_path: PathBuf,
    output: Option<PathBuf>,
    dialect: Option<Dialect>,
    force_overwrite: bool,
) -> Result<()> {
    if FileManager::dir_exists(&input_path) {
        if output.is_some() {
            warn!("--output is ignored for directories; segment files are written next to each document");
        }
        let summary = controller.run_extract_folder(&input_path, dialect, force_overwrite)?;
        if !summary.failures.is_empty() {
            error!("{} documents could not be read", summary.failures.len());
        }
        return Ok(());
    }

    if !FileManager::file_exists(&input_path) {
        return Err(AppError::File(format!("Input path does not exist: {:?}", input_path)).into());
    }

    if let Some(file) = controller.extract_to_json(&input_path, output, dialect, force_overwrite)? {
        let warnings = bilidocx::segment::collect_warnings(&file.segments);
        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(
            "Extracted {} segments ({}) with {} warnings",
            file.segments.len(),
            file.dialect,
            warnings.len()
        );
    }
    Ok(())
}

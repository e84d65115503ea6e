use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::dialect::Dialect;
use crate::docx::WordDocument;
use crate::errors::{AppError, InterchangeError};
use crate::file_utils::FileManager;
use crate::reader::BilingualDocumentReader;
use crate::segment::{SegmentRecord, SegmentWarning, collect_warnings};
use crate::track_changes::{ChangePair, TrackChangesExtractor};
use crate::writer::{BilingualDocumentWriter, WriteReport};

// @module: Application controller for bilingual document processing

/// Segment exchange file written by `extract` and read back by `update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentFile {
    // @field: Dialect the segments were read with
    pub dialect: Dialect,
    // @field: Document the segments came from
    pub source_file: String,
    pub segments: Vec<SegmentRecord>,
}

/// Totals of a folder run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub segments: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub warnings: Vec<SegmentWarning>,
}

impl BatchSummary {
    fn log(&self, action: &str) {
        info!(
            "{}: {} files processed, {} skipped, {} failed, {} segments, {} warnings",
            action,
            self.files_processed,
            self.files_skipped,
            self.failures.len(),
            self.segments,
            self.warnings.len()
        );
        for warning in &self.warnings {
            warn!("{}", warning);
        }
        for (path, message) in &self.failures {
            error!("{}: {}", path.display(), message);
        }
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn reader(&self, dialect: Dialect) -> BilingualDocumentReader {
        BilingualDocumentReader::new(dialect, self.config.encoding.clone())
            .with_tag_style(self.config.writer.tag_style_name.clone())
            .with_tag_color(self.config.writer.fallback_color.clone())
    }

    fn writer(&self, dialect: Dialect) -> BilingualDocumentWriter {
        BilingualDocumentWriter::new(
            dialect,
            self.config.encoding.clone(),
            self.config.writer.clone(),
        )
    }

    /// Dialect of a document
    pub fn sniff_file<P: AsRef<Path>>(&self, path: P) -> Result<Dialect> {
        let path = path.as_ref();
        let document = WordDocument::open(path)
            .with_context(|| format!("Failed to open document: {}", path.display()))?;
        Dialect::sniff(&document).ok_or_else(|| InterchangeError::UnrecognizedFormat.into())
    }

    /// Read a document's segments. Without an explicit dialect the document
    /// is sniffed.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P, dialect: Option<Dialect>) -> Result<SegmentFile> {
        let path = path.as_ref();
        let document = WordDocument::open(path)
            .with_context(|| format!("Failed to open document: {}", path.display()))?;
        let dialect = match dialect {
            Some(dialect) => dialect,
            None => Dialect::sniff(&document).ok_or(InterchangeError::UnrecognizedFormat)?,
        };

        let segments = self.reader(dialect).extract(&document)?;
        info!(
            "Read {} segments from {} ({})",
            segments.len(),
            path.display(),
            dialect
        );

        Ok(SegmentFile {
            dialect,
            source_file: path.to_string_lossy().to_string(),
            segments,
        })
    }

    pub fn save_segment_file<P: AsRef<Path>>(&self, file: &SegmentFile, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(file).context("Failed to serialize segments")?;
        FileManager::write_to_file(path, &json)
    }

    pub fn load_segment_file<P: AsRef<Path>>(path: P) -> Result<SegmentFile> {
        let content = FileManager::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse segment file: {:?}", path.as_ref()))
    }

    /// Extract one document to JSON. Returns `None` when the output exists
    /// and `force_overwrite` is off.
    pub fn extract_to_json<P: AsRef<Path>>(
        &self,
        input: P,
        output: Option<PathBuf>,
        dialect: Option<Dialect>,
        force_overwrite: bool,
    ) -> Result<Option<SegmentFile>> {
        let input = input.as_ref();
        let output = output.unwrap_or_else(|| default_output(input, "segments", "json"));
        if output.exists() && !force_overwrite {
            warn!(
                "Skipping {}, {} already exists (use -f to force overwrite)",
                input.display(),
                output.display()
            );
            return Ok(None);
        }

        let file = self.extract_file(input, dialect)?;
        self.save_segment_file(&file, &output)?;
        debug!("Segments written to {}", output.display());
        Ok(Some(file))
    }

    /// Extract every `.docx` below a directory, each next to its source
    pub fn run_extract_folder<P: AsRef<Path>>(
        &self,
        input_dir: P,
        dialect: Option<Dialect>,
        force_overwrite: bool,
    ) -> Result<BatchSummary> {
        let files = FileManager::find_files(&input_dir, "docx")?;
        let mut summary = BatchSummary::default();
        if files.is_empty() {
            warn!("No .docx files found in {:?}", input_dir.as_ref());
            return Ok(summary);
        }

        let progress = folder_progress(files.len() as u64);
        for path in &files {
            progress.set_message(display_name(path));
            match self.extract_to_json(path, None, dialect, force_overwrite) {
                Ok(Some(file)) => {
                    summary.files_processed += 1;
                    summary.segments += file.segments.len();
                    summary.warnings.extend(prefixed(path, collect_warnings(&file.segments)));
                }
                Ok(None) => summary.files_skipped += 1,
                Err(e) => summary.failures.push((path.clone(), format!("{:#}", e))),
            }
            progress.inc(1);
        }
        progress.finish_with_message("Folder processing complete");

        summary.log("Extract");
        Ok(summary)
    }

    /// Write the segments of a JSON file back into a document
    pub fn update_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        document: P,
        segments: Q,
        output: Option<PathBuf>,
        dialect: Option<Dialect>,
        force_overwrite: bool,
    ) -> Result<Option<WriteReport>> {
        let document = document.as_ref();
        let output = output.unwrap_or_else(|| default_output(document, "updated", "docx"));
        if output.exists() && !force_overwrite {
            warn!(
                "Skipping {}, {} already exists (use -f to force overwrite)",
                document.display(),
                output.display()
            );
            return Ok(None);
        }

        let file = Self::load_segment_file(&segments)?;
        let dialect = dialect.unwrap_or(file.dialect);
        if dialect != file.dialect {
            warn!(
                "Segments were read as {} but are written as {}",
                file.dialect, dialect
            );
        }

        let report = self
            .writer(dialect)
            .write(document, &file.segments, &output)
            .with_context(|| format!("Failed to update {}", document.display()))?;
        for warning in &report.warnings {
            warn!("{}", warning);
        }
        Ok(Some(report))
    }

    /// Change pairs of one document
    pub fn extract_changes<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ChangePair>> {
        let path = path.as_ref();
        let extractor = TrackChangesExtractor::new(self.config.track_changes.include_auxiliary_parts);
        let pairs = extractor
            .extract_path(path)
            .with_context(|| format!("Failed to read revisions of {}", path.display()))?;
        info!("Found {} changed paragraphs in {}", pairs.len(), path.display());
        Ok(pairs)
    }

    /// Write a document's change pairs as JSON
    pub fn changes_to_json<P: AsRef<Path>>(&self, input: P, output: Option<PathBuf>) -> Result<usize> {
        let input = input.as_ref();
        let output = output.unwrap_or_else(|| default_output(input, "changes", "json"));
        let pairs = self.extract_changes(input)?;
        let json = serde_json::to_string_pretty(&pairs)?;
        FileManager::write_to_file(&output, &json)?;
        Ok(pairs.len())
    }

    /// Dialect of every `.docx` at a path (a file or a directory)
    pub fn sniff_path<P: AsRef<Path>>(&self, input: P) -> Result<Vec<(PathBuf, Option<Dialect>)>> {
        let input = input.as_ref();
        let files = if FileManager::dir_exists(input) {
            FileManager::find_files(input, "docx")?
        } else if FileManager::file_exists(input) {
            vec![input.to_path_buf()]
        } else {
            return Err(AppError::File(format!("Input path does not exist: {:?}", input)).into());
        };

        let mut results = Vec::with_capacity(files.len());
        for path in files {
            let dialect = match self.sniff_file(&path) {
                Ok(dialect) => Some(dialect),
                Err(e) => {
                    debug!("{}: {:#}", path.display(), e);
                    None
                }
            };
            results.push((path, dialect));
        }
        Ok(results)
    }
}

/// `<dir>/<stem>.<suffix>.<extension>` next to the input
fn default_output(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let dir = input.parent().unwrap_or(Path::new(""));
    FileManager::generate_output_path(input, dir, suffix, extension)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn prefixed(path: &Path, warnings: Vec<SegmentWarning>) -> impl Iterator<Item = SegmentWarning> + '_ {
    warnings.into_iter().map(move |warning| {
        SegmentWarning::new(
            warning.kind,
            format!("{}: {}", display_name(path), warning.message),
        )
    })
}

fn folder_progress(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style.progress_chars("█▓▒░"));
    progress.set_message("Processing files");
    progress
}

/*!
 * Bilingual document reader.
 *
 * Validates a document against a dialect's table layout and turns every data
 * row into a `SegmentRecord`. Only fatal package problems are errors; row
 * level oddities (unknown status strings, duplicate ids, source text that
 * does not survive encoding) become warnings on the record.
 */

use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};

use crate::dialect::Dialect;
use crate::docx::WordDocument;
use crate::docx::document::{TagMarks, cell_runs, cell_text, row_cells, table_rows};
use crate::docx::xml::XmlElement;
use crate::errors::{InterchangeError, NotationError};
use crate::notation::{EncodePolicy, TagNotation, plan};
use crate::schema::{BilingualTableSchema, RowIdentity};
use crate::segment::{SegmentId, SegmentRecord, SegmentStatus, WarningKind};

/// Default name of the character style numbered-pair documents use for tags
pub const DEFAULT_TAG_STYLE: &str = "Tag";

/// Default accent color of tags written without the tag style
pub const DEFAULT_TAG_COLOR: &str = "C00000";

/// Whether a document holds exactly one body table shaped like the schema.
/// Never fails; a malformed document is simply not a match.
pub fn validate_layout(schema: &BilingualTableSchema, document: &WordDocument) -> bool {
    let tables = document.tables();
    if tables.len() != 1 {
        debug!("{}: expected one body table, found {}", schema.name, tables.len());
        return false;
    }

    let rows = table_rows(tables[0]);
    if rows.len() < schema.header_rows {
        debug!("{}: table has only {} rows", schema.name, rows.len());
        return false;
    }

    let header = row_cells(rows[schema.signature_row]);
    if header.len() != schema.column_count {
        debug!(
            "{}: header row has {} cells, expected {}",
            schema.name,
            header.len(),
            schema.column_count
        );
        return false;
    }

    let labels: Vec<String> = header.iter().map(|cell| cell_text(cell)).collect();
    let matched = schema.matches_header(&labels);
    if !matched {
        debug!("{}: header keywords not found in {:?}", schema.name, labels);
    }
    matched
}

/// Native key of a row: the trimmed ID cell, or `#<row index>` when empty
pub fn row_key(id_cell: Option<&XmlElement>, row_index: usize) -> String {
    let key = id_cell.map(cell_text).unwrap_or_default().trim().to_string();
    if key.is_empty() {
        format!("#{}", row_index)
    } else {
        key
    }
}

/// Reader for one dialect
#[derive(Debug, Clone)]
pub struct BilingualDocumentReader {
    dialect: Dialect,
    schema: BilingualTableSchema,
    policy: EncodePolicy,
    tag_style_name: String,
    tag_color: String,
}

impl BilingualDocumentReader {
    pub fn new(dialect: Dialect, policy: EncodePolicy) -> Self {
        Self {
            dialect,
            schema: dialect.schema(),
            policy,
            tag_style_name: DEFAULT_TAG_STYLE.to_string(),
            tag_color: DEFAULT_TAG_COLOR.to_string(),
        }
    }

    /// Character style whose runs are tags in numbered-pair cells
    pub fn with_tag_style(mut self, name: impl Into<String>) -> Self {
        self.tag_style_name = name.into();
        self
    }

    /// Accent color that, together with italic, marks a tag run
    pub fn with_tag_color(mut self, color: impl Into<String>) -> Self {
        self.tag_color = color.into();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn validate(&self, document: &WordDocument) -> bool {
        validate_layout(&self.schema, document)
    }

    /// Open a file and extract its segments
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<SegmentRecord>, InterchangeError> {
        let document = WordDocument::open(path)?;
        self.extract(&document)
    }

    /// One record per data row, in document order
    pub fn extract(&self, document: &WordDocument) -> Result<Vec<SegmentRecord>, InterchangeError> {
        if !self.validate(document) {
            return Err(InterchangeError::FormatMismatch {
                dialect: self.dialect.name(),
            });
        }

        let marks = if self.dialect.uses_tag_style() {
            Some(TagMarks {
                style_id: document
                    .styles()
                    .and_then(|styles| styles.character_style_id(&self.tag_style_name)),
                accent_color: Some(self.tag_color.as_str()),
            })
        } else {
            None
        };

        let notation = self.dialect.notation();
        let columns = self.schema.columns;
        let tables = document.tables();
        let rows = table_rows(tables[0]);

        let mut records = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut reported_statuses: HashSet<String> = HashSet::new();

        for (row_index, row) in rows.iter().enumerate().skip(self.schema.header_rows) {
            let cells = row_cells(row);
            if cells.len() < columns.required_cells() {
                warn!(
                    "Row {} has {} cells, expected {}; skipped",
                    row_index,
                    cells.len(),
                    columns.required_cells()
                );
                continue;
            }

            let key = row_key(cells.get(columns.id).copied(), row_index);
            let id = match self.schema.row_identity {
                RowIdentity::Opaque => SegmentId::Opaque(key.clone()),
                RowIdentity::Sequential => SegmentId::Sequential(
                    key.parse()
                        .unwrap_or((row_index + 1 - self.schema.header_rows) as u64),
                ),
            };
            let mut record = SegmentRecord::new(id, row_index, key.clone());

            if !seen_keys.insert(key.clone()) {
                warn!("Duplicate row id '{}' at row {}", key, row_index);
                record.push_warning(
                    WarningKind::DuplicateRowKey,
                    format!("row id '{}' appears more than once", key),
                );
            }

            let (source_text, source_tagged) =
                self.encode_cell(cells[columns.source], marks.as_ref(), notation, &mut record);
            record.translatable = !source_text.trim().is_empty();
            record.source_text = source_text;
            record.source_tagged = source_tagged;

            let (target_text, target_tagged) =
                self.encode_cell(cells[columns.target], marks.as_ref(), notation, &mut record);
            record.target_text = target_text;
            record.target_tagged = target_tagged;

            record.status = match columns.status {
                Some(index) => {
                    let text = cell_text(cells[index]);
                    self.read_status(text.trim(), &mut record, &mut reported_statuses)
                }
                None if record.has_target() => SegmentStatus::Translated,
                None => SegmentStatus::Untranslated,
            };

            records.push(record);
        }

        debug!(
            "Extracted {} segments as {}",
            records.len(),
            self.dialect.name()
        );
        Ok(records)
    }

    // Plain and tagged text of a cell. The tagged text is decoded again so a
    // run layout the notation cannot express is flagged on the record.
    fn encode_cell(
        &self,
        cell: &XmlElement,
        marks: Option<&TagMarks>,
        notation: &dyn TagNotation,
        record: &mut SegmentRecord,
    ) -> (String, String) {
        let runs = cell_runs(cell, marks);
        let span_plan = plan::plan_spans(&runs, &self.policy, |run| notation.is_tag_token(run));
        let tagged = plan::render(notation, &span_plan);

        match notation.decode(&tagged) {
            Ok(decoded) if decoded.plain == span_plan.plain => {}
            Ok(decoded) => {
                warn!("Segment {}: encoded text does not decode back", record.id);
                record.push_warning(
                    WarningKind::NotationRoundTrip,
                    format!("decoded '{}' differs from cell text", decoded.plain),
                );
            }
            Err(e) => {
                warn!("Segment {}: {}", record.id, e);
                let kind = match e {
                    NotationError::TagCountMismatch { .. } => WarningKind::TagCountMismatch,
                    _ => WarningKind::NotationRoundTrip,
                };
                record.push_warning(kind, e.to_string());
            }
        }

        (span_plan.plain, tagged)
    }

    fn read_status(
        &self,
        text: &str,
        record: &mut SegmentRecord,
        reported: &mut HashSet<String>,
    ) -> SegmentStatus {
        match self.schema.parse_status(text) {
            Some(status) => status,
            None => {
                if reported.insert(text.to_string()) {
                    warn!("Unknown {} status '{}'", self.dialect.name(), text);
                }
                record.push_warning(
                    WarningKind::UnknownStatus,
                    format!("status '{}' is not recognized", text),
                );
                SegmentStatus::Untranslated
            }
        }
    }
}

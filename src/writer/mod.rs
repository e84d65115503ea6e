/*!
 * Bilingual document writer.
 *
 * Re-opens the original package, aligns records with table rows by their
 * native row key and rewrites the target and status cells. Everything else
 * in the package is carried over untouched.
 *
 * - `prolog`: numbered-pair XML declaration fixup
 */

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use crate::app_config::{StyleFallback, WriterConfig};
use crate::dialect::Dialect;
use crate::docx::WordDocument;
use crate::docx::document::{
    cell_runs, cell_text, first_paragraph_props, first_run_props, replace_cell_paragraphs,
    row_cells, row_cells_mut,
};
use crate::docx::xml::{XmlElement, XmlNode};
use crate::errors::InterchangeError;
use crate::file_utils::FileManager;
use crate::notation::{EncodePolicy, RunFormat, StyledRun, TagNotation, plan, rebuild_runs};
use crate::reader::{row_key, validate_layout};
use crate::schema::BilingualTableSchema;
use crate::segment::{SegmentRecord, SegmentWarning, WarningKind};

pub mod prolog;

pub use prolog::{NORMALIZED_PROLOG, XML_PROLOG_PARTS, normalize_xml_prologs};

/// Run properties that express formatting the writer decides itself
const FORMATTING_PROPS: &[&str] = &[
    "w:rStyle", "w:b", "w:bCs", "w:i", "w:iCs", "w:u", "w:color", "w:highlight", "w:rPrChange",
];

/// Schema order of `w:rPr` children
const RUN_PROPS_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps", "w:strike",
    "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof", "w:snapToGrid",
    "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern", "w:position", "w:sz",
    "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd", "w:fitText", "w:vertAlign",
    "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout", "w:specVanish", "w:oMath",
];

/// Outcome of a write
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteReport {
    /// Rows whose target cell was rewritten
    pub rows_written: usize,
    /// Records that were not written (no target text or no matching row)
    pub rows_skipped: usize,
    pub warnings: Vec<SegmentWarning>,
}

// How tag spans are rendered in the target cell
#[derive(Debug, Clone)]
enum TagRendering {
    RunFormats,
    CharacterStyle(String),
    Manual { color: String },
    Plain,
}

/// Writer for one dialect
#[derive(Debug, Clone)]
pub struct BilingualDocumentWriter {
    dialect: Dialect,
    schema: BilingualTableSchema,
    policy: EncodePolicy,
    config: WriterConfig,
}

impl BilingualDocumentWriter {
    pub fn new(dialect: Dialect, policy: EncodePolicy, config: WriterConfig) -> Self {
        Self {
            dialect,
            schema: dialect.schema(),
            policy,
            config,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Re-open `original` and produce the updated package bytes
    pub fn update<P: AsRef<Path>>(
        &self,
        original: P,
        records: &[SegmentRecord],
    ) -> Result<(Vec<u8>, WriteReport), InterchangeError> {
        let bytes = std::fs::read(original.as_ref())?;
        self.update_bytes(&bytes, records)
    }

    /// Produce the updated package from the original archive bytes
    pub fn update_bytes(
        &self,
        original: &[u8],
        records: &[SegmentRecord],
    ) -> Result<(Vec<u8>, WriteReport), InterchangeError> {
        let mut document = WordDocument::from_bytes(original)?;
        if !validate_layout(&self.schema, &document) {
            return Err(InterchangeError::FormatMismatch {
                dialect: self.dialect.name(),
            });
        }

        let report = self.apply(&mut document, records);
        let mut bytes = document.to_bytes()?;
        if self.dialect.requires_prolog_fixup() && self.config.fix_xml_prologs {
            bytes = normalize_xml_prologs(&bytes)?;
        }
        Ok((bytes, report))
    }

    /// Update `original` and save the result to `output`. The output file
    /// appears only once the whole package has been written.
    pub fn write<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        original: P,
        records: &[SegmentRecord],
        output: Q,
    ) -> Result<WriteReport, InterchangeError> {
        let (bytes, report) = self.update(original, records)?;
        FileManager::write_atomic(output.as_ref(), &bytes)?;
        info!(
            "Wrote {} ({} rows written, {} skipped, {} warnings)",
            output.as_ref().display(),
            report.rows_written,
            report.rows_skipped,
            report.warnings.len()
        );
        Ok(report)
    }

    fn tag_rendering(&self, document: &WordDocument, report: &mut WriteReport) -> TagRendering {
        if !self.dialect.uses_tag_style() {
            return TagRendering::RunFormats;
        }

        let style_id = document
            .styles()
            .and_then(|styles| styles.character_style_id(&self.config.tag_style_name));
        if let Some(id) = style_id {
            return TagRendering::CharacterStyle(id.to_string());
        }

        let message = format!(
            "character style '{}' not found; using {:?} tag formatting",
            self.config.tag_style_name, self.config.style_fallback
        );
        warn!("{}", message);
        report
            .warnings
            .push(SegmentWarning::new(WarningKind::StyleMissing, message));

        match self.config.style_fallback {
            StyleFallback::Manual => TagRendering::Manual {
                color: self.config.fallback_color.clone(),
            },
            StyleFallback::Plain => TagRendering::Plain,
        }
    }

    fn apply(&self, document: &mut WordDocument, records: &[SegmentRecord]) -> WriteReport {
        let mut report = WriteReport::default();
        let rendering = self.tag_rendering(document, &mut report);
        let notation = self.dialect.notation();
        let columns = self.schema.columns;

        let mut by_key: HashMap<&str, Vec<&SegmentRecord>> = HashMap::new();
        for record in records {
            by_key.entry(record.row_key.as_str()).or_default().push(record);
        }
        let mut matched: HashSet<(&str, usize)> = HashSet::new();

        let Some(table) = document.table_mut(0) else {
            return report;
        };
        let rows = table.elements_mut().filter(|e| e.is("w:tr"));

        for (row_index, row) in rows.enumerate().skip(self.schema.header_rows) {
            let (record, paragraphs, status_text) = {
                let cells = row_cells(row);
                if cells.len() < columns.required_cells() {
                    continue;
                }
                let key = row_key(cells.get(columns.id).copied(), row_index);
                let Some(candidates) = by_key.get(key.as_str()) else {
                    continue;
                };
                // Rows sharing an id are told apart by position
                let record = match candidates.iter().find(|r| r.row_index == row_index) {
                    Some(record) => *record,
                    None if candidates.len() == 1 => candidates[0],
                    None => continue,
                };
                if !matched.insert((record.row_key.as_str(), record.row_index)) {
                    continue;
                }

                let paragraphs = if record.has_target() {
                    let runs = self.target_runs(record, cells[columns.source], notation, &mut report);
                    let base_props = first_run_props(cells[columns.target])
                        .or_else(|| first_run_props(cells[columns.source]))
                        .map(strip_formatting);
                    let paragraph_props = first_paragraph_props(cells[columns.target])
                        .or_else(|| first_paragraph_props(cells[columns.source]));
                    Some(build_paragraphs(
                        &runs,
                        paragraph_props.as_ref(),
                        base_props.as_ref(),
                        &rendering,
                    ))
                } else {
                    None
                };

                let status_text = columns.status.and_then(|index| {
                    let existing = cell_text(cells[index]);
                    if self.schema.parse_status(existing.trim()) == Some(record.status) {
                        None
                    } else {
                        self.schema.status_label(record.status)
                    }
                });

                (record, paragraphs, status_text)
            };

            let mut cells = row_cells_mut(row);
            match paragraphs {
                Some(paragraphs) => {
                    replace_cell_paragraphs(cells[columns.target], paragraphs);
                    report.rows_written += 1;
                }
                None => {
                    debug!("Segment {} has no target; target cell left as is", record.id);
                    report.rows_skipped += 1;
                }
            }
            if let (Some(index), Some(label)) = (columns.status, status_text) {
                set_cell_text(cells[index], label);
            }
        }

        for record in records {
            if !matched.contains(&(record.row_key.as_str(), record.row_index)) {
                warn!("Row '{}' not found in document", record.row_key);
                report.rows_skipped += 1;
                report.warnings.push(SegmentWarning::new(
                    WarningKind::RowNotFound,
                    format!("segment {}: row '{}' not found", record.id, record.row_key),
                ));
            }
        }

        report
    }

    // Styled runs for a record's target. Tag formats come from the source
    // cell's own encoding, keyed the way the notation numbers its spans.
    fn target_runs(
        &self,
        record: &SegmentRecord,
        source_cell: &XmlElement,
        notation: &dyn TagNotation,
        report: &mut WriteReport,
    ) -> Vec<StyledRun> {
        let decoded = match notation.decode(&record.target_tagged) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Segment {}: {}; writing plain text", record.id, e);
                report.warnings.push(SegmentWarning::new(
                    WarningKind::TagCountMismatch,
                    format!("segment {}: {}", record.id, e),
                ));
                let text = if record.target_text.is_empty() {
                    notation.strip(&record.target_tagged)
                } else {
                    record.target_text.clone()
                };
                return vec![StyledRun::plain(text)];
            }
        };

        let source_runs = cell_runs(source_cell, None);
        let source_plan =
            plan::plan_spans(&source_runs, &self.policy, |run| notation.is_tag_token(run));
        let formats: HashMap<u32, RunFormat> = source_plan
            .spans
            .iter()
            .enumerate()
            .map(|(index, span)| (notation.span_key(index + 1), span.format))
            .collect();

        rebuild_runs(notation, &decoded, |span| {
            formats
                .get(&span.key)
                .or_else(|| {
                    source_plan
                        .spans
                        .get(span.ordinal.wrapping_sub(1))
                        .map(|s| &s.format)
                })
                .copied()
                .unwrap_or(RunFormat::BOLD)
        })
    }
}

/// Base run properties with writer-controlled formatting removed
fn strip_formatting(mut props: XmlElement) -> XmlElement {
    props.children.retain(|node| match node {
        XmlNode::Element(e) => !FORMATTING_PROPS.contains(&e.name.as_str()),
        _ => false,
    });
    props
}

fn sort_run_props(props: &mut XmlElement) {
    let rank = |node: &XmlNode| match node {
        XmlNode::Element(e) => RUN_PROPS_ORDER
            .iter()
            .position(|name| *name == e.name)
            .unwrap_or(RUN_PROPS_ORDER.len()),
        _ => RUN_PROPS_ORDER.len(),
    };
    props.children.sort_by_key(rank);
}

fn push_flag(props: &mut XmlElement, name: &str) {
    props.children.push(XmlNode::Element(XmlElement::new(name)));
}

fn run_props(run: &StyledRun, base: Option<&XmlElement>, rendering: &TagRendering) -> Option<XmlElement> {
    let mut props = base.cloned().unwrap_or_else(|| XmlElement::new("w:rPr"));

    if run.tagged {
        match rendering {
            TagRendering::RunFormats => {
                if run.format.bold {
                    push_flag(&mut props, "w:b");
                    push_flag(&mut props, "w:bCs");
                }
                if run.format.italic {
                    push_flag(&mut props, "w:i");
                    push_flag(&mut props, "w:iCs");
                }
                if run.format.underline {
                    props.children.push(XmlNode::Element(
                        XmlElement::new("w:u").with_attr("w:val", "single"),
                    ));
                }
            }
            TagRendering::CharacterStyle(style_id) => {
                props.children.push(XmlNode::Element(
                    XmlElement::new("w:rStyle").with_attr("w:val", style_id),
                ));
            }
            TagRendering::Manual { color } => {
                push_flag(&mut props, "w:i");
                push_flag(&mut props, "w:iCs");
                props.children.push(XmlNode::Element(
                    XmlElement::new("w:color").with_attr("w:val", color),
                ));
            }
            TagRendering::Plain => {}
        }
    }

    sort_run_props(&mut props);
    if props.children.is_empty() {
        None
    } else {
        Some(props)
    }
}

/// A `w:r` holding one line of text; tabs become `w:tab`
fn text_run(text: &str, props: Option<XmlElement>) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if let Some(props) = props {
        run.children.push(XmlNode::Element(props));
    }
    for (index, piece) in text.split('\t').enumerate() {
        if index > 0 {
            run.children.push(XmlNode::Element(XmlElement::new("w:tab")));
        }
        if piece.is_empty() {
            continue;
        }
        let mut t = XmlElement::new("w:t").with_text(piece);
        if piece.starts_with(char::is_whitespace) || piece.ends_with(char::is_whitespace) {
            t.set_attr("xml:space", "preserve");
        }
        run.children.push(XmlNode::Element(t));
    }
    run
}

fn new_paragraph(props: Option<&XmlElement>) -> XmlElement {
    let mut paragraph = XmlElement::new("w:p");
    if let Some(props) = props {
        paragraph.children.push(XmlNode::Element(props.clone()));
    }
    paragraph
}

/// One paragraph per `\n`-separated line of the runs
fn build_paragraphs(
    runs: &[StyledRun],
    paragraph_props: Option<&XmlElement>,
    base_props: Option<&XmlElement>,
    rendering: &TagRendering,
) -> Vec<XmlElement> {
    let mut paragraphs = vec![new_paragraph(paragraph_props)];
    for run in runs {
        let props = run_props(run, base_props, rendering);
        for (index, line) in run.text.split('\n').enumerate() {
            if index > 0 {
                paragraphs.push(new_paragraph(paragraph_props));
            }
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            if let Some(paragraph) = paragraphs.last_mut() {
                paragraph
                    .children
                    .push(XmlNode::Element(text_run(line, props.clone())));
            }
        }
    }
    paragraphs
}

/// Replace a cell's content with one line of text in its existing formatting
fn set_cell_text(cell: &mut XmlElement, text: &str) {
    let paragraph_props = first_paragraph_props(cell);
    let run_props = first_run_props(cell);
    let mut paragraph = new_paragraph(paragraph_props.as_ref());
    paragraph
        .children
        .push(XmlNode::Element(text_run(text, run_props)));
    replace_cell_paragraphs(cell, vec![paragraph]);
}

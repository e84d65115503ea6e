/*!
 * Segment records shared by the reader and the writer.
 *
 * A record is created once per table row by the reader, mutated only through
 * its target/status setters while translation happens elsewhere, and
 * consumed by the writer.
 */

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::notation::TagNotation;

/// Segment identifier: a row counter or the tool's own opaque id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentId {
    Sequential(u64),
    Opaque(String),
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential(number) => write!(f, "{}", number),
            Self::Opaque(id) => write!(f, "{}", id),
        }
    }
}

/// Translation state of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Untranslated,
    Draft,
    Translated,
    Approved,
}

impl SegmentStatus {
    pub const ALL: [SegmentStatus; 4] = [
        SegmentStatus::Untranslated,
        SegmentStatus::Draft,
        SegmentStatus::Translated,
        SegmentStatus::Approved,
    ];
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Untranslated => "untranslated",
            Self::Draft => "draft",
            Self::Translated => "translated",
            Self::Approved => "approved",
        };
        write!(f, "{}", name)
    }
}

/// Category of a recoverable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Tagged text whose opening and closing tags do not pair up
    TagCountMismatch,
    /// Status string outside the dialect vocabulary
    UnknownStatus,
    /// The "Tag" character style is absent; manual formatting was used
    StyleMissing,
    /// A record whose row key no longer exists in the document
    RowNotFound,
    /// Two rows share one native identifier
    DuplicateRowKey,
    /// Encoded source text does not decode back cleanly
    NotationRoundTrip,
}

/// A recoverable problem attached to one segment or document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl SegmentWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SegmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// One table row of a bilingual document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: SegmentId,
    pub source_text: String,
    pub source_tagged: String,
    #[serde(default)]
    pub target_text: String,
    #[serde(default)]
    pub target_tagged: String,
    #[serde(default)]
    pub status: SegmentStatus,
    /// Index of the row within the table, header rows included
    pub row_index: usize,
    /// Native row identifier used to align rows on write-back
    pub row_key: String,
    /// False when the source cell is empty
    #[serde(default = "default_true")]
    pub translatable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SegmentWarning>,
}

fn default_true() -> bool {
    true
}

impl SegmentRecord {
    pub fn new(id: SegmentId, row_index: usize, row_key: impl Into<String>) -> Self {
        Self {
            id,
            source_text: String::new(),
            source_tagged: String::new(),
            target_text: String::new(),
            target_tagged: String::new(),
            status: SegmentStatus::Untranslated,
            row_index,
            row_key: row_key.into(),
            translatable: true,
            warnings: Vec::new(),
        }
    }

    /// Whether the target cell holds any text
    pub fn has_target(&self) -> bool {
        !self.target_tagged.trim().is_empty()
    }

    /// Store a tagged translation.
    ///
    /// `target_text` is derived through the notation. Malformed tags are
    /// stripped leniently and recorded as a warning. An untranslated segment
    /// moves to `Translated`.
    pub fn set_translation(&mut self, tagged: &str, notation: &dyn TagNotation) {
        self.target_tagged = tagged.to_string();
        self.target_text = match notation.decode(tagged) {
            Ok(decoded) => decoded.plain,
            Err(e) => {
                warn!("Segment {}: {}", self.id, e);
                self.push_warning(WarningKind::TagCountMismatch, e.to_string());
                notation.strip(tagged)
            }
        };
        if self.status == SegmentStatus::Untranslated {
            self.status = SegmentStatus::Translated;
        }
    }

    pub fn set_status(&mut self, status: SegmentStatus) {
        self.status = status;
    }

    pub fn push_warning(&mut self, kind: WarningKind, message: impl Into<String>) {
        self.warnings.push(SegmentWarning::new(kind, message));
    }

    /// Number of tags in the tagged source, if it decodes
    pub fn source_tag_count(&self, notation: &dyn TagNotation) -> Option<usize> {
        notation.decode(&self.source_tagged).ok().map(|d| d.tag_count())
    }
}

/// Every record warning, prefixed with the segment id
pub fn collect_warnings(records: &[SegmentRecord]) -> Vec<SegmentWarning> {
    records
        .iter()
        .flat_map(|record| {
            record.warnings.iter().map(move |warning| {
                SegmentWarning::new(
                    warning.kind,
                    format!("segment {}: {}", record.id, warning.message),
                )
            })
        })
        .collect()
}

/*!
 * Table schemas of the supported bilingual document dialects.
 *
 * A schema fixes the table shape (column count, header rows), the header
 * keyword signature used to recognize the dialect, the column roles and the
 * status vocabulary.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::segment::SegmentStatus;

/// Trailing match percentage, as in "Draft (85%)"
static PERCENT_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\(\s*\d+\s*%\s*\)\s*$").expect("Invalid percent suffix regex")
});

/// Column roles of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    pub comment: Option<usize>,
    pub status: Option<usize>,
}

impl ColumnMap {
    /// Cells a data row needs for every mapped column to exist
    pub fn required_cells(&self) -> usize {
        [
            Some(self.id),
            Some(self.source),
            Some(self.target),
            self.comment,
            self.status,
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |max| max + 1)
    }
}

/// How a dialect identifies its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIdentity {
    /// Tool-assigned opaque string
    Opaque,
    /// Row counter
    Sequential,
}

/// Table schema of one dialect
#[derive(Debug, Clone, PartialEq)]
pub struct BilingualTableSchema {
    pub name: &'static str,
    /// Exact number of cells in the column-header row
    pub column_count: usize,
    /// Rows before the first segment row
    pub header_rows: usize,
    /// Index of the row holding the column headers
    pub signature_row: usize,
    /// Words that must each appear in some header cell
    pub header_keywords: &'static [&'static str],
    pub columns: ColumnMap,
    pub row_identity: RowIdentity,
    /// Normalized status strings and their meaning
    pub status_vocabulary: &'static [(&'static str, SegmentStatus)],
    /// Status strings written back, per status
    pub status_labels: &'static [(SegmentStatus, &'static str)],
}

const NUMBERED_PAIR_STATUSES: &[(&str, SegmentStatus)] = &[
    ("not translated", SegmentStatus::Untranslated),
    ("draft", SegmentStatus::Draft),
    ("translation rejected", SegmentStatus::Draft),
    ("sign-off rejected", SegmentStatus::Draft),
    ("translated", SegmentStatus::Translated),
    ("translation approved", SegmentStatus::Approved),
    ("approved sign-off", SegmentStatus::Approved),
    ("signed off", SegmentStatus::Approved),
];

const NUMBERED_PAIR_LABELS: &[(SegmentStatus, &str)] = &[
    (SegmentStatus::Untranslated, "Not Translated (0%)"),
    (SegmentStatus::Draft, "Draft (0%)"),
    (SegmentStatus::Translated, "Translated (100%)"),
    (SegmentStatus::Approved, "Approved Sign-off"),
];

const BRACKET_BRACE_STATUSES: &[(&str, SegmentStatus)] = &[
    ("not started", SegmentStatus::Untranslated),
    ("pre-translated", SegmentStatus::Draft),
    ("partially edited", SegmentStatus::Draft),
    ("edited", SegmentStatus::Draft),
    ("rejected", SegmentStatus::Draft),
    ("confirmed", SegmentStatus::Translated),
    ("translator confirmed", SegmentStatus::Translated),
    ("proofread", SegmentStatus::Approved),
    ("reviewer 1 confirmed", SegmentStatus::Approved),
    ("reviewer 2 confirmed", SegmentStatus::Approved),
];

const BRACKET_BRACE_LABELS: &[(SegmentStatus, &str)] = &[
    (SegmentStatus::Untranslated, "Not started"),
    (SegmentStatus::Draft, "Edited"),
    (SegmentStatus::Translated, "Confirmed"),
    (SegmentStatus::Approved, "Proofread"),
];

impl BilingualTableSchema {
    /// ID, Status, Source, Target; one header row; opaque row ids
    pub fn numbered_pair() -> Self {
        Self {
            name: "numbered-pair",
            column_count: 4,
            header_rows: 1,
            signature_row: 0,
            header_keywords: &["id", "status", "source", "target"],
            columns: ColumnMap {
                id: 0,
                status: Some(1),
                source: 2,
                target: 3,
                comment: None,
            },
            row_identity: RowIdentity::Opaque,
            status_vocabulary: NUMBERED_PAIR_STATUSES,
            status_labels: NUMBERED_PAIR_LABELS,
        }
    }

    /// ID, Source, Target, Comment, Status; metadata row plus header row
    pub fn bracket_brace() -> Self {
        Self {
            name: "bracket-brace",
            column_count: 5,
            header_rows: 2,
            signature_row: 1,
            header_keywords: &["id", "comment", "status"],
            columns: ColumnMap {
                id: 0,
                source: 1,
                target: 2,
                comment: Some(3),
                status: Some(4),
            },
            row_identity: RowIdentity::Sequential,
            status_vocabulary: BRACKET_BRACE_STATUSES,
            status_labels: BRACKET_BRACE_LABELS,
        }
    }

    /// ID, source file name, target file name, Notes, free column
    pub fn pipe() -> Self {
        Self {
            name: "pipe",
            column_count: 5,
            header_rows: 1,
            signature_row: 0,
            header_keywords: &["id", "notes"],
            columns: ColumnMap {
                id: 0,
                source: 1,
                target: 2,
                comment: Some(3),
                status: None,
            },
            row_identity: RowIdentity::Sequential,
            status_vocabulary: &[],
            status_labels: &[],
        }
    }

    /// Whether header cells satisfy the keyword signature. Matching ignores
    /// case and order; a keyword must equal a whole word of some cell.
    pub fn matches_header<S: AsRef<str>>(&self, header_cells: &[S]) -> bool {
        let cell_words: Vec<Vec<String>> = header_cells
            .iter()
            .map(|cell| {
                cell.as_ref()
                    .to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|word| !word.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect();

        self.header_keywords.iter().all(|keyword| {
            cell_words
                .iter()
                .any(|words| words.iter().any(|word| word == keyword))
        })
    }

    /// Map a status string through the vocabulary. Returns `None` for
    /// strings outside it; an empty string is `Untranslated`.
    pub fn parse_status(&self, text: &str) -> Option<SegmentStatus> {
        let normalized = PERCENT_SUFFIX_REGEX.replace(text.trim(), "");
        let normalized = normalized
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if normalized.is_empty() {
            return Some(SegmentStatus::Untranslated);
        }
        self.status_vocabulary
            .iter()
            .find(|(label, _)| *label == normalized)
            .map(|(_, status)| *status)
    }

    /// Status string written back for a status
    pub fn status_label(&self, status: SegmentStatus) -> Option<&'static str> {
        self.status_labels
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, label)| *label)
    }
}

/*!
 * Inline tag notations used by CAT tools to carry formatting through a
 * plain-text translation round trip.
 *
 * Three notations are supported:
 * - `numbered`: `<N>…</N>` pairs and `<N/>` placeholders
 * - `bracket`: asymmetric `[N}…{M]` pairs
 * - `pipe`: unnumbered `|…|` pairs
 *
 * Encoding goes through a span plan (`plan`) so every notation shares the
 * same span heuristics. Decoding yields the plain text plus the tag spans,
 * which `runs` turns back into constant-formatting runs for the writer.
 */

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::errors::NotationError;

pub mod bracket;
pub mod numbered;
pub mod pipe;
pub mod plan;
pub mod runs;

pub use bracket::BracketBraceNotation;
pub use numbered::NumberedPairNotation;
pub use pipe::PipeNotation;
pub use plan::{EncodePolicy, EncodedSpan, SpanPlan, plan_spans};
pub use runs::{StyledRun, rebuild_runs};

/// Bold/italic/underline combination of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl RunFormat {
    pub const PLAIN: RunFormat = RunFormat { bold: false, italic: false, underline: false };
    pub const BOLD: RunFormat = RunFormat { bold: true, italic: false, underline: false };

    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }

    /// Formatting that applies when two spans overlap
    pub fn union(self, other: RunFormat) -> RunFormat {
        RunFormat {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
        }
    }
}

/// A span of cell text sharing one formatting state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Written in the tool's own tag formatting (the "Tag" character style
    /// or its manual fallback). Each such run is one tag span.
    pub tag_mark: bool,
}

impl FormattingRun {
    pub fn new(text: impl Into<String>, bold: bool, italic: bool, underline: bool) -> Self {
        Self {
            text: text.into(),
            bold,
            italic,
            underline,
            tag_mark: false,
        }
    }

    /// A run in tag formatting
    pub fn mark(text: impl Into<String>) -> Self {
        Self {
            tag_mark: true,
            ..Self::new(text, false, true, false)
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, false, false, false)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, true, false, false)
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text, false, true, false)
    }

    pub fn format(&self) -> RunFormat {
        RunFormat {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    pub fn is_formatted(&self) -> bool {
        !self.format().is_plain()
    }
}

/// A decoded tag pair, as byte offsets into the plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan {
    /// Notation-level identifier (the number in the opening tag, or the
    /// ordinal for unnumbered notations)
    pub key: u32,
    /// 1-based position of the opening tag among all opening tags
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
}

/// A decoded self-closing tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub key: u32,
    pub offset: usize,
}

/// Result of decoding tagged text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
    pub plain: String,
    pub spans: Vec<TagSpan>,
    pub placeholders: Vec<Placeholder>,
}

impl Decoded {
    /// Number of tags: pairs plus self-closing placeholders
    pub fn tag_count(&self) -> usize {
        self.spans.len() + self.placeholders.len()
    }
}

/// Conversion between formatting runs and a tool's inline tag text
pub trait TagNotation: Send + Sync + Debug {
    /// Short display name used in errors and logs
    fn name(&self) -> &'static str;

    /// Opening tag for the `ordinal`-th span (1-based)
    fn opening_tag(&self, ordinal: usize) -> String;

    /// Closing tag for the `ordinal`-th span (1-based)
    fn closing_tag(&self, ordinal: usize) -> String;

    /// Key the encoder gives the `ordinal`-th span, as `decode` reports it
    fn span_key(&self, ordinal: usize) -> u32 {
        ordinal as u32
    }

    /// Key of a run whose whole text is a self-closing tag
    fn placeholder_key(&self, _text: &str) -> Option<u32> {
        None
    }

    /// Text of the self-closing tag with the given key
    fn placeholder_tag(&self, _key: u32) -> Option<String> {
        None
    }

    /// Whether a run is a tag token to carry verbatim instead of text
    fn is_tag_token(&self, run: &FormattingRun) -> bool {
        self.placeholder_key(&run.text).is_some()
    }

    /// Split tagged text into plain text and tag spans
    fn decode(&self, tagged: &str) -> Result<Decoded, NotationError>;

    /// Remove every tag token without checking balance
    fn strip(&self, tagged: &str) -> String;

    /// Encode runs into tagged text
    fn encode(&self, runs: &[FormattingRun], policy: &EncodePolicy) -> String {
        let plan = plan_spans(runs, policy, |run| self.is_tag_token(run));
        plan::render(self, &plan)
    }
}

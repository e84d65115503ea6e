/*!
 * Dialect registry.
 *
 * A dialect pairs a table schema with a tag notation. Sniffing tries every
 * dialect in `Dialect::ALL` order and returns the first whose layout check
 * accepts the document.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::docx::WordDocument;
use crate::app_config::WriterConfig;
use crate::errors::InterchangeError;
use crate::notation::{
    BracketBraceNotation, Decoded, EncodePolicy, FormattingRun, NumberedPairNotation, PipeNotation,
    TagNotation,
};
use crate::reader::{self, BilingualDocumentReader};
use crate::schema::BilingualTableSchema;
use crate::segment::SegmentRecord;
use crate::writer::{BilingualDocumentWriter, WriteReport};

static NUMBERED_PAIR: NumberedPairNotation = NumberedPairNotation;
static BRACKET_BRACE: BracketBraceNotation = BracketBraceNotation;
static PIPE: PipeNotation = PipeNotation;

/// Supported bilingual document dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// `<N>…</N>` tags, four-column table with opaque row ids
    NumberedPair,
    /// `[N}…{M]` tags, five-column table with a metadata row
    BracketBrace,
    /// `|…|` tags, five-column table without status
    Pipe,
}

impl Dialect {
    /// Sniffing order
    pub const ALL: [Dialect; 3] = [Dialect::NumberedPair, Dialect::BracketBrace, Dialect::Pipe];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NumberedPair => "numbered-pair",
            Self::BracketBrace => "bracket-brace",
            Self::Pipe => "pipe",
        }
    }

    pub fn schema(&self) -> BilingualTableSchema {
        match self {
            Self::NumberedPair => BilingualTableSchema::numbered_pair(),
            Self::BracketBrace => BilingualTableSchema::bracket_brace(),
            Self::Pipe => BilingualTableSchema::pipe(),
        }
    }

    pub fn notation(&self) -> &'static dyn TagNotation {
        match self {
            Self::NumberedPair => &NUMBERED_PAIR,
            Self::BracketBrace => &BRACKET_BRACE,
            Self::Pipe => &PIPE,
        }
    }

    /// Tag spans are rendered with a character style instead of run formats
    pub fn uses_tag_style(&self) -> bool {
        matches!(self, Self::NumberedPair)
    }

    /// Written packages need normalized XML prologs to be re-imported
    pub fn requires_prolog_fixup(&self) -> bool {
        matches!(self, Self::NumberedPair)
    }

    /// Whether the document has this dialect's table layout
    pub fn validate(&self, document: &WordDocument) -> bool {
        reader::validate_layout(&self.schema(), document)
    }

    /// First dialect whose layout check accepts the document
    pub fn sniff(document: &WordDocument) -> Option<Dialect> {
        let found = Self::ALL.into_iter().find(|dialect| dialect.validate(document));
        debug!(
            "Sniffed dialect: {}",
            found.map_or("none", |dialect| dialect.name())
        );
        found
    }

    /// Segments of a document, with the default tag style
    pub fn extract(
        &self,
        document: &WordDocument,
        policy: &EncodePolicy,
    ) -> Result<Vec<SegmentRecord>, InterchangeError> {
        BilingualDocumentReader::new(*self, policy.clone()).extract(document)
    }

    /// Package bytes of `original` with `records` written back
    pub fn update(
        &self,
        original: &[u8],
        records: &[SegmentRecord],
        policy: &EncodePolicy,
        config: &WriterConfig,
    ) -> Result<(Vec<u8>, WriteReport), InterchangeError> {
        BilingualDocumentWriter::new(*self, policy.clone(), config.clone()).update_bytes(original, records)
    }

    pub fn encode(&self, runs: &[FormattingRun], policy: &EncodePolicy) -> String {
        self.notation().encode(runs, policy)
    }

    pub fn decode(&self, tagged: &str) -> Result<Decoded, InterchangeError> {
        Ok(self.notation().decode(tagged)?)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "numbered-pair" | "numbered" => Ok(Self::NumberedPair),
            "bracket-brace" | "bracket" => Ok(Self::BracketBrace),
            "pipe" => Ok(Self::Pipe),
            _ => Err(anyhow!("Invalid dialect: {}", s)),
        }
    }
}

/*!
 * Error types for the bilidocx library.
 *
 * Fatal conditions (a corrupt archive, a missing part, unparsable XML) are
 * returned as typed errors and abort the document being processed. Tag
 * notation problems are recoverable: callers turn them into per-segment
 * warnings so a single bad row never stops a batch.
 */

use thiserror::Error;

/// Errors raised while reading or writing the OOXML package
#[derive(Error, Debug)]
pub enum DocxError {
    /// The zip container or one of its entries could not be read or written
    #[error("Archive error in '{part}': {message}")]
    Archive {
        /// Part name inside the archive, or the archive itself
        part: String,
        /// Underlying error message
        message: String,
    },

    /// A part the operation requires is absent from the package
    #[error("Missing archive part: {0}")]
    MissingPart(String),

    /// A part holds malformed XML
    #[error("XML error in '{part}': {message}")]
    Xml {
        /// Part name inside the archive
        part: String,
        /// Parser error message
        message: String,
    },

    /// A part is not valid UTF-8
    #[error("Part '{part}' is not valid UTF-8")]
    Encoding {
        /// Part name inside the archive
        part: String,
    },

    /// Underlying file system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocxError {
    /// Build an archive error for a named part
    pub fn archive(part: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Archive {
            part: part.into(),
            message: error.to_string(),
        }
    }

    /// Build an XML error for a named part
    pub fn xml(part: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Xml {
            part: part.into(),
            message: error.to_string(),
        }
    }
}

/// Errors raised when tagged text does not follow its notation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// Opening and closing delimiters do not pair up
    #[error("{notation} tag count mismatch: {opening} opening, {closing} closing")]
    TagCountMismatch {
        /// Notation name
        notation: &'static str,
        /// Opening delimiters seen
        opening: usize,
        /// Closing delimiters seen
        closing: usize,
    },

    /// A closing delimiter appeared with nothing open
    #[error("{notation} closing tag '{tag}' at byte {position} has no opening tag")]
    UnexpectedClose {
        /// Notation name
        notation: &'static str,
        /// The offending tag text
        tag: String,
        /// Byte offset in the tagged string
        position: usize,
    },
}

/// Errors raised by the reader and writer for a whole document
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// The document does not match the requested dialect's table schema
    #[error("Document does not match the {dialect} table layout")]
    FormatMismatch {
        /// Dialect display name
        dialect: &'static str,
    },

    /// No known dialect accepted the document
    #[error("Unrecognized bilingual document")]
    UnrecognizedFormat,

    /// Package level failure
    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    /// Tag notation failure that could not be downgraded to a warning
    #[error("Notation error: {0}")]
    Notation(#[from] NotationError),

    /// Underlying file system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from reading or writing a bilingual document
    #[error("Interchange error: {0}")]
    Interchange(#[from] InterchangeError),

    /// Error from the OOXML package layer
    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::File(error.to_string())
    }
}

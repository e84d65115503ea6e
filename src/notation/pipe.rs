/*!
 * Pipe notation: unnumbered `|text|` pairs.
 */

use crate::errors::NotationError;
use crate::notation::{Decoded, TagNotation, TagSpan};

const NAME: &str = "pipe";
const DELIMITER: char = '|';

/// `|…|` notation
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeNotation;

impl TagNotation for PipeNotation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn opening_tag(&self, _ordinal: usize) -> String {
        DELIMITER.to_string()
    }

    fn closing_tag(&self, _ordinal: usize) -> String {
        DELIMITER.to_string()
    }

    fn decode(&self, tagged: &str) -> Result<Decoded, NotationError> {
        let count = tagged.matches(DELIMITER).count();
        if count % 2 != 0 {
            return Err(NotationError::TagCountMismatch {
                notation: NAME,
                opening: count.div_ceil(2),
                closing: count / 2,
            });
        }

        let mut decoded = Decoded::default();
        let mut open: Option<usize> = None;
        for piece in tagged.split_inclusive(DELIMITER) {
            let (text, delimited) = match piece.strip_suffix(DELIMITER) {
                Some(text) => (text, true),
                None => (piece, false),
            };
            decoded.plain.push_str(text);
            if !delimited {
                continue;
            }

            let offset = decoded.plain.len();
            match open.take() {
                Some(start) => {
                    let ordinal = decoded.spans.len() + 1;
                    decoded.spans.push(TagSpan {
                        key: ordinal as u32,
                        ordinal,
                        start,
                        end: offset,
                    });
                }
                None => open = Some(offset),
            }
        }

        Ok(decoded)
    }

    fn strip(&self, tagged: &str) -> String {
        tagged.replace(DELIMITER, "")
    }
}

/*!
 * Bracket/brace notation: `[N}text{M]`.
 *
 * The tool numbers opening and closing tags from one counter, so the close
 * of `[1}` is usually `{2]`. Decoding pairs a close `{M]` with the pending
 * open numbered `M`, else `M - 1`, else the most recent pending open.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::NotationError;
use crate::notation::{Decoded, TagNotation, TagSpan};

/// Opening `[N}` or closing `{N]`
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)\}|\{(\d+)\]").expect("Invalid bracket tag regex")
});

const NAME: &str = "bracket-brace";

/// `[N}…{M]` notation
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketBraceNotation;

impl TagNotation for BracketBraceNotation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn opening_tag(&self, ordinal: usize) -> String {
        format!("[{}}}", ordinal * 2 - 1)
    }

    fn closing_tag(&self, ordinal: usize) -> String {
        format!("{{{}]", ordinal * 2)
    }

    fn span_key(&self, ordinal: usize) -> u32 {
        (ordinal * 2 - 1) as u32
    }

    fn decode(&self, tagged: &str) -> Result<Decoded, NotationError> {
        let mut decoded = Decoded::default();
        // Pending opens in insertion order: (key, ordinal, start offset)
        let mut pending: Vec<(u32, usize, usize)> = Vec::new();
        let mut closed: Vec<TagSpan> = Vec::new();
        let mut opening = 0;
        let mut closing = 0;
        let mut cursor = 0;

        for cap in TAG_REGEX.captures_iter(tagged) {
            let Some(whole) = cap.get(0) else { continue };
            let (number, is_open) = match (cap.get(1), cap.get(2)) {
                (Some(open), _) => (open.as_str(), true),
                (None, Some(close)) => (close.as_str(), false),
                (None, None) => continue,
            };
            let Ok(key) = number.parse::<u32>() else { continue };

            decoded.plain.push_str(&tagged[cursor..whole.start()]);
            cursor = whole.end();
            let offset = decoded.plain.len();

            if is_open {
                opening += 1;
                pending.push((key, opening, offset));
                continue;
            }

            closing += 1;
            let position = pending
                .iter()
                .position(|(open_key, _, _)| *open_key == key)
                .or_else(|| {
                    pending
                        .iter()
                        .position(|(open_key, _, _)| key > 0 && *open_key == key - 1)
                })
                .or_else(|| pending.len().checked_sub(1));
            let Some(position) = position else {
                return Err(NotationError::UnexpectedClose {
                    notation: NAME,
                    tag: whole.as_str().to_string(),
                    position: whole.start(),
                });
            };
            let (open_key, ordinal, start) = pending.remove(position);
            closed.push(TagSpan { key: open_key, ordinal, start, end: offset });
        }
        decoded.plain.push_str(&tagged[cursor..]);

        if !pending.is_empty() {
            return Err(NotationError::TagCountMismatch { notation: NAME, opening, closing });
        }

        closed.sort_by_key(|span| span.ordinal);
        decoded.spans = closed;
        Ok(decoded)
    }

    fn strip(&self, tagged: &str) -> String {
        TAG_REGEX.replace_all(tagged, "").into_owned()
    }
}

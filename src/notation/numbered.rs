/*!
 * Numbered-pair notation: `<N>text</N>` with `<N/>` placeholders.
 *
 * Tag numbers are per-document identifiers and need not be sequential.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::NotationError;
use crate::notation::{Decoded, FormattingRun, Placeholder, TagNotation, TagSpan};

/// Any numbered tag: opening, closing or self-closing
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)(\d+)(/?)>").expect("Invalid numbered tag regex")
});

/// A run holding nothing but a placeholder
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(\d+)/>$").expect("Invalid placeholder regex")
});

/// A run holding nothing but an opening or closing tag
static PAIR_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^</?\d+>$").expect("Invalid pair token regex")
});

const NAME: &str = "numbered-pair";

/// `<N>…</N>` notation
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedPairNotation;

impl TagNotation for NumberedPairNotation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn opening_tag(&self, ordinal: usize) -> String {
        format!("<{}>", ordinal)
    }

    fn closing_tag(&self, ordinal: usize) -> String {
        format!("</{}>", ordinal)
    }

    fn placeholder_key(&self, text: &str) -> Option<u32> {
        PLACEHOLDER_REGEX
            .captures(text.trim())
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn placeholder_tag(&self, key: u32) -> Option<String> {
        Some(format!("<{}/>", key))
    }

    // Tag-formatted `<N>` and `</N>` are the tool's own tags, not text
    fn is_tag_token(&self, run: &FormattingRun) -> bool {
        self.placeholder_key(&run.text).is_some()
            || (run.tag_mark && PAIR_TOKEN_REGEX.is_match(run.text.trim()))
    }

    fn decode(&self, tagged: &str) -> Result<Decoded, NotationError> {
        let mut decoded = Decoded::default();
        // Open tags: (key, ordinal, start offset in plain)
        let mut stack: Vec<(u32, usize, usize)> = Vec::new();
        let mut closed: Vec<TagSpan> = Vec::new();
        let mut opening = 0;
        let mut closing = 0;
        let mut cursor = 0;

        for cap in TAG_REGEX.captures_iter(tagged) {
            let Some(whole) = cap.get(0) else { continue };
            let key: u32 = match cap[2].parse() {
                Ok(key) => key,
                // Absurdly long digit runs are text, not tags
                Err(_) => continue,
            };
            let is_close = !cap[1].is_empty();
            let is_self_closing = !cap[3].is_empty();
            if is_close && is_self_closing {
                continue;
            }

            decoded.plain.push_str(&tagged[cursor..whole.start()]);
            cursor = whole.end();
            let offset = decoded.plain.len();

            if is_self_closing {
                decoded.placeholders.push(Placeholder { key, offset });
            } else if is_close {
                closing += 1;
                let position = stack
                    .iter()
                    .rposition(|(open_key, _, _)| *open_key == key)
                    .or_else(|| stack.len().checked_sub(1));
                let Some(position) = position else {
                    return Err(NotationError::UnexpectedClose {
                        notation: NAME,
                        tag: whole.as_str().to_string(),
                        position: whole.start(),
                    });
                };
                let (open_key, ordinal, start) = stack.remove(position);
                closed.push(TagSpan { key: open_key, ordinal, start, end: offset });
            } else {
                opening += 1;
                stack.push((key, opening, offset));
            }
        }
        decoded.plain.push_str(&tagged[cursor..]);

        if !stack.is_empty() {
            debug!("Unclosed numbered tags: {:?}", stack);
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

/*!
 * Formatting state machine: decoded tag spans back into runs.
 *
 * The plain text is cut at every span boundary and placeholder offset. Each
 * piece takes the union of the formats of the spans covering it, and
 * neighbouring pieces covered by the same spans are merged so the writer
 * emits one run per span. Two tags that touch stay two runs.
 */

use crate::notation::{Decoded, RunFormat, TagNotation, TagSpan};

/// A run ready to be materialized in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub format: RunFormat,
    /// Covered by at least one tag span
    pub tagged: bool,
    /// A self-closing tag carried verbatim
    pub placeholder: bool,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat::PLAIN,
            tagged: false,
            placeholder: false,
        }
    }
}

/// Rebuild runs from decoded text. `format_for` supplies each span's format.
pub fn rebuild_runs<N, F>(notation: &N, decoded: &Decoded, format_for: F) -> Vec<StyledRun>
where
    N: TagNotation + ?Sized,
    F: Fn(&TagSpan) -> RunFormat,
{
    let plain = decoded.plain.as_str();
    let mut boundaries: Vec<usize> = vec![0, plain.len()];
    for span in &decoded.spans {
        boundaries.push(span.start);
        boundaries.push(span.end);
    }
    boundaries.extend(decoded.placeholders.iter().map(|p| p.offset));
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut runs: Vec<StyledRun> = Vec::new();
    // Spans covering the last pushed run
    let mut last_cover: Vec<usize> = Vec::new();
    for (index, &offset) in boundaries.iter().enumerate() {
        for placeholder in decoded.placeholders.iter().filter(|p| p.offset == offset) {
            if let Some(text) = notation.placeholder_tag(placeholder.key) {
                runs.push(StyledRun {
                    text,
                    format: RunFormat::PLAIN,
                    tagged: true,
                    placeholder: true,
                });
            }
        }

        let Some(&next) = boundaries.get(index + 1) else { break };
        if next <= offset {
            continue;
        }

        let active: Vec<&TagSpan> = decoded
            .spans
            .iter()
            .filter(|span| span.start <= offset && span.end >= next)
            .collect();
        let cover: Vec<usize> = active.iter().map(|span| span.ordinal).collect();
        let format = active
            .iter()
            .fold(RunFormat::PLAIN, |acc, span| acc.union(format_for(span)));
        let tagged = !active.is_empty();
        let text = &plain[offset..next];

        match runs.last_mut() {
            Some(last) if !last.placeholder && last.format == format && last_cover == cover => {
                last.text.push_str(text);
            }
            _ => runs.push(StyledRun {
                text: text.to_string(),
                format,
                tagged,
                placeholder: false,
            }),
        }
        last_cover = cover;
    }

    runs
}

/*!
 * Span planning shared by every notation's encoder.
 *
 * Translations reorder words, so source run boundaries rarely map onto the
 * target. The planner keeps the number of tagged spans small instead of
 * mirroring every run:
 * - if formatted characters make up more than `formatted_share_threshold`
 *   of the text, one span covers everything from the first to the last
 *   formatted character;
 * - otherwise formatting found in the first `leading_runs` runs (a bolded
 *   leading name, say) becomes one span, and each later formatted run gets
 *   its own span.
 */

use serde::{Deserialize, Serialize};

use crate::notation::{FormattingRun, RunFormat, TagNotation};

/// Tunable constants of the span heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodePolicy {
    /// Share of formatted characters above which the whole formatted region
    /// becomes a single span
    #[serde(default = "default_formatted_share_threshold")]
    pub formatted_share_threshold: f64,

    /// How many leading runs are folded into one span when formatted
    #[serde(default = "default_leading_runs")]
    pub leading_runs: usize,
}

impl Default for EncodePolicy {
    fn default() -> Self {
        Self {
            formatted_share_threshold: default_formatted_share_threshold(),
            leading_runs: default_leading_runs(),
        }
    }
}

fn default_formatted_share_threshold() -> f64 {
    0.6
}

fn default_leading_runs() -> usize {
    2
}

/// A span to be wrapped in one tag pair, as byte offsets into the plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSpan {
    pub start: usize,
    pub end: usize,
    pub format: RunFormat,
}

/// Plain text plus the spans and tag tokens an encoder will emit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanPlan {
    pub plain: String,
    pub spans: Vec<EncodedSpan>,
    /// Tag tokens carried verbatim: (byte offset, tag text)
    pub tokens: Vec<(usize, String)>,
}

// Merged run of constant formatting
struct Segment {
    start: usize,
    end: usize,
    chars: usize,
    format: RunFormat,
    mark: bool,
}

impl Segment {
    fn span(&self) -> EncodedSpan {
        EncodedSpan {
            start: self.start,
            end: self.end,
            format: self.format,
        }
    }
}

/// Plan the tag spans for a run list.
///
/// `is_token` recognizes runs that are tag tokens themselves (`<3/>`, or a
/// tag-formatted `<1>`); those are kept out of the plain text. Tag-formatted
/// runs become one span each; the share and leading-run rules only look at
/// the remaining formatted runs.
pub fn plan_spans<F>(runs: &[FormattingRun], policy: &EncodePolicy, is_token: F) -> SpanPlan
where
    F: Fn(&FormattingRun) -> bool,
{
    let mut plan = SpanPlan::default();
    let mut segments: Vec<Segment> = Vec::new();

    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        if is_token(run) {
            plan.tokens.push((plan.plain.len(), run.text.trim().to_string()));
            continue;
        }

        // Whitespace carries no visible formatting
        let blank = run.text.trim().is_empty();
        let format = if blank { RunFormat::PLAIN } else { run.format() };
        let mark = run.tag_mark && !blank;

        let start = plan.plain.len();
        plan.plain.push_str(&run.text);
        let chars = run.text.chars().count();

        match segments.last_mut() {
            Some(last) if !mark && !last.mark && last.format == format && last.end == start => {
                last.end = plan.plain.len();
                last.chars += chars;
            }
            _ => segments.push(Segment {
                start,
                end: plan.plain.len(),
                chars,
                format,
                mark,
            }),
        }
    }

    plan.spans = segments.iter().filter(|s| s.mark).map(Segment::span).collect();

    let segments: Vec<&Segment> = segments.iter().filter(|s| !s.mark).collect();
    plan.spans.extend(heuristic_spans(&segments, policy));
    plan.spans.sort_by_key(|span| span.start);
    plan
}

// Spans for ordinary formatting (everything but tag marks)
fn heuristic_spans(segments: &[&Segment], policy: &EncodePolicy) -> Vec<EncodedSpan> {
    let formatted: Vec<&Segment> = segments
        .iter()
        .copied()
        .filter(|s| !s.format.is_plain())
        .collect();
    let (Some(first), Some(last)) = (formatted.first(), formatted.last()) else {
        return Vec::new();
    };

    let total_chars: usize = segments.iter().map(|s| s.chars).sum();
    let formatted_chars: usize = formatted.iter().map(|s| s.chars).sum();
    let share = formatted_chars as f64 / total_chars.max(1) as f64;

    if share > policy.formatted_share_threshold {
        return vec![EncodedSpan {
            start: first.start,
            end: last.end,
            format: first.format,
        }];
    }

    let mut spans = Vec::new();
    let leading_count = policy.leading_runs.min(segments.len());
    let leading: Vec<&Segment> = segments[..leading_count]
        .iter()
        .copied()
        .filter(|s| !s.format.is_plain())
        .collect();
    if let (Some(first), Some(last)) = (leading.first(), leading.last()) {
        spans.push(EncodedSpan {
            start: first.start,
            end: last.end,
            format: first.format,
        });
    }

    spans.extend(
        segments[leading_count..]
            .iter()
            .filter(|s| !s.format.is_plain())
            .map(|s| s.span()),
    );
    spans
}

/// Render a plan with a notation's delimiters
pub fn render<N: TagNotation + ?Sized>(notation: &N, plan: &SpanPlan) -> String {
    // (offset, order, rank, text): closes before tokens before opens, and
    // spans opened later close first
    let mut events: Vec<(usize, u8, usize, String)> = Vec::new();
    for (index, span) in plan.spans.iter().enumerate() {
        events.push((span.start, 2, index, notation.opening_tag(index + 1)));
        events.push((span.end, 0, usize::MAX - index, notation.closing_tag(index + 1)));
    }
    for (position, (offset, text)) in plan.tokens.iter().enumerate() {
        events.push((*offset, 1, position, text.clone()));
    }
    events.sort_by_key(|(offset, order, rank, _)| (*offset, *order, *rank));

    let mut out = String::with_capacity(plan.plain.len() + events.len() * 4);
    let mut cursor = 0;
    for (offset, _, _, tag) in events {
        out.push_str(&plan.plain[cursor..offset]);
        out.push_str(&tag);
        cursor = offset;
    }
    out.push_str(&plan.plain[cursor..]);
    out
}

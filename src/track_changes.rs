/*!
 * Track-changes extraction.
 *
 * Every paragraph is rendered twice from its revision markup: once as it was
 * before the tracked edits (original) and once with them accepted (final).
 * Paragraphs whose two renderings differ become `ChangePair`s, which is the
 * raw material for learning from post-edits.
 */

use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::docx::xml::{XmlDocument, XmlElement};
use crate::docx::{DOCUMENT_PART, DocxPackage, WordDocument};
use crate::errors::DocxError;

/// Parts other than the main document that can hold tracked edits
static AUXILIARY_PART_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^word/(header\d*|footer\d*|footnotes|endnotes|comments)\.xml$")
        .expect("Invalid auxiliary part regex")
});

/// Spaces and tabs left dangling before a line break
static TRAILING_SPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("Invalid trailing space regex"));

static BLANK_LINES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid blank lines regex"));

/// Which side of the tracked edits to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionView {
    /// Deletions kept, insertions dropped
    Original,
    /// Insertions kept, deletions dropped
    Final,
}

/// A paragraph whose text changed under revision tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePair {
    pub original_text: String,
    pub final_text: String,
    /// Part the paragraph lives in
    pub part: String,
    /// Position among the part's outermost paragraphs
    pub paragraph_index: usize,
    /// Authors of the paragraph's revisions, in order of appearance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
}

/// Text fragments of a subtree in one revision view
pub fn walk(node: &XmlElement, view: RevisionView) -> Vec<String> {
    let mut out = Vec::new();
    walk_into(node, view, &mut out);
    out
}

fn walk_into(node: &XmlElement, view: RevisionView, out: &mut Vec<String>) {
    for element in node.elements() {
        match element.name.as_str() {
            "w:ins" | "w:moveTo" => {
                if view == RevisionView::Final {
                    walk_into(element, view, out);
                }
            }
            "w:del" | "w:moveFrom" => {
                if view == RevisionView::Original {
                    walk_into(element, view, out);
                }
            }
            "w:t" => out.push(element.text_content()),
            "w:delText" => {
                if view == RevisionView::Original {
                    out.push(element.text_content());
                }
            }
            "w:tab" => out.push("\t".to_string()),
            "w:br" | "w:cr" => out.push("\n".to_string()),
            // Property blocks hold tab stops and change records, never text
            "w:pPr" | "w:rPr" | "w:sectPr" | "w:tblPr" | "w:trPr" | "w:tcPr" => {}
            _ => walk_into(element, view, out),
        }
    }
}

/// Tidy a rendered paragraph: no spaces before line breaks, at most one
/// blank line in a row, no surrounding whitespace
pub fn normalize_whitespace(text: &str) -> String {
    let text = TRAILING_SPACE_REGEX.replace_all(text, "\n");
    let text = BLANK_LINES_REGEX.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Render a paragraph in one view
pub fn paragraph_text(paragraph: &XmlElement, view: RevisionView) -> String {
    normalize_whitespace(&walk(paragraph, view).concat())
}

fn revision_authors(paragraph: &XmlElement) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    let mut stack = vec![paragraph];
    while let Some(node) = stack.pop() {
        // Reverse so children are visited in document order
        for element in node.elements().collect::<Vec<_>>().into_iter().rev() {
            stack.push(element);
        }
        if matches!(node.name.as_str(), "w:ins" | "w:del" | "w:moveFrom" | "w:moveTo") {
            if let Some(author) = node.attr("w:author") {
                if !authors.iter().any(|a| a == author) {
                    authors.push(author.to_string());
                }
            }
        }
    }
    authors
}

/// Extracts (original, final) pairs from revision markup
#[derive(Debug, Clone, Default)]
pub struct TrackChangesExtractor {
    include_auxiliary_parts: bool,
}

impl TrackChangesExtractor {
    pub fn new(include_auxiliary_parts: bool) -> Self {
        Self { include_auxiliary_parts }
    }

    pub fn extract_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ChangePair>, DocxError> {
        self.extract_pairs(&DocxPackage::open(path)?)
    }

    pub fn extract_document(&self, document: &WordDocument) -> Result<Vec<ChangePair>, DocxError> {
        self.extract_pairs(document.package())
    }

    /// Change pairs of the main document, then of auxiliary parts if enabled
    pub fn extract_pairs(&self, package: &DocxPackage) -> Result<Vec<ChangePair>, DocxError> {
        let mut parts = vec![DOCUMENT_PART.to_string()];
        if self.include_auxiliary_parts {
            let mut auxiliary: Vec<String> = package
                .part_names()
                .filter(|name| AUXILIARY_PART_REGEX.is_match(name))
                .map(str::to_string)
                .collect();
            auxiliary.sort();
            parts.extend(auxiliary);
        }

        let mut pairs = Vec::new();
        for part in &parts {
            let Some(xml) = package.part_text(part)? else {
                if part == DOCUMENT_PART {
                    return Err(DocxError::MissingPart(part.clone()));
                }
                continue;
            };
            let document = XmlDocument::parse(xml, part)?;
            pairs.extend(extract_from_root(&document.root, part));
        }

        debug!("Found {} changed paragraphs", pairs.len());
        Ok(pairs)
    }
}

/// Change pairs of one parsed part
pub fn extract_from_root(root: &XmlElement, part: &str) -> Vec<ChangePair> {
    let mut paragraphs = Vec::new();
    root.find_all("w:p", &mut paragraphs);

    paragraphs
        .into_iter()
        .enumerate()
        .filter_map(|(paragraph_index, paragraph)| {
            let original_text = paragraph_text(paragraph, RevisionView::Original);
            let final_text = paragraph_text(paragraph, RevisionView::Final);
            if original_text == final_text {
                return None;
            }
            Some(ChangePair {
                original_text,
                final_text,
                part: part.to_string(),
                paragraph_index,
                authors: revision_authors(paragraph),
            })
        })
        .collect()
}

/*!
 * WordprocessingML document access: tables, rows, cells and runs.
 */

use std::path::Path;

use log::debug;

use crate::docx::package::DocxPackage;
use crate::docx::styles::StyleSheet;
use crate::docx::xml::{XmlDocument, XmlElement, XmlNode};
use crate::errors::DocxError;
use crate::notation::FormattingRun;

/// Main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Style table part
pub const STYLES_PART: &str = "word/styles.xml";

/// An opened `.docx` with its main part parsed
#[derive(Debug, Clone)]
pub struct WordDocument {
    package: DocxPackage,
    document: XmlDocument,
    styles: Option<StyleSheet>,
}

impl WordDocument {
    /// Open a document from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocxError> {
        Self::from_package(DocxPackage::open(path)?)
    }

    /// Open a document from an in-memory archive
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_package(DocxPackage::from_bytes(bytes)?)
    }

    pub fn from_package(package: DocxPackage) -> Result<Self, DocxError> {
        let xml = package
            .part_text(DOCUMENT_PART)?
            .ok_or_else(|| DocxError::MissingPart(DOCUMENT_PART.to_string()))?;
        let document = XmlDocument::parse(xml, DOCUMENT_PART)?;

        let styles = match package.part_text(STYLES_PART)? {
            Some(xml) => Some(StyleSheet::parse(xml, STYLES_PART)?),
            None => {
                debug!("Package has no {}", STYLES_PART);
                None
            }
        };

        Ok(Self { package, document, styles })
    }

    pub fn package(&self) -> &DocxPackage {
        &self.package
    }

    pub fn styles(&self) -> Option<&StyleSheet> {
        self.styles.as_ref()
    }

    /// Root element of the main part (`w:document`)
    pub fn root(&self) -> &XmlElement {
        &self.document.root
    }

    pub fn body(&self) -> Option<&XmlElement> {
        self.document.root.child("w:body")
    }

    pub fn body_mut(&mut self) -> Option<&mut XmlElement> {
        self.document.root.child_mut("w:body")
    }

    /// Tables placed directly in the body
    pub fn tables(&self) -> Vec<&XmlElement> {
        self.body()
            .map(|body| body.children_named("w:tbl").collect())
            .unwrap_or_default()
    }

    /// Mutable access to the `index`-th body table
    pub fn table_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        self.body_mut()?
            .elements_mut()
            .filter(|e| e.is("w:tbl"))
            .nth(index)
    }

    /// Package with the main part re-serialized from the current tree
    pub fn to_package(&self) -> Result<DocxPackage, DocxError> {
        let mut package = self.package.clone();
        package.set_part(DOCUMENT_PART, self.document.to_bytes()?);
        Ok(package)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        self.to_package()?.to_bytes()
    }
}

/// Rows of a table
pub fn table_rows(table: &XmlElement) -> Vec<&XmlElement> {
    table.children_named("w:tr").collect()
}

/// Cells of a row
pub fn row_cells(row: &XmlElement) -> Vec<&XmlElement> {
    row.children_named("w:tc").collect()
}

/// Mutable cells of a row
pub fn row_cells_mut(row: &mut XmlElement) -> Vec<&mut XmlElement> {
    row.elements_mut().filter(|e| e.is("w:tc")).collect()
}

/// Plain text of a cell, paragraphs joined by newlines
pub fn cell_text(cell: &XmlElement) -> String {
    cell_runs(cell, None)
        .into_iter()
        .map(|run| run.text)
        .collect()
}

/// What tag formatting looks like in a document
#[derive(Debug, Clone, Copy, Default)]
pub struct TagMarks<'a> {
    /// Id of the tag character style, when the document defines one
    pub style_id: Option<&'a str>,
    /// Accent color of italic runs written without the style
    pub accent_color: Option<&'a str>,
}

impl TagMarks<'_> {
    fn matches(&self, props: &XmlElement, italic: bool) -> bool {
        let styled = self.style_id.is_some_and(|id| {
            props
                .child("w:rStyle")
                .and_then(|s| s.attr("w:val"))
                .is_some_and(|v| v == id)
        });
        let accented = italic
            && self.accent_color.is_some_and(|color| {
                props
                    .child("w:color")
                    .and_then(|c| c.attr("w:val"))
                    .is_some_and(|v| v.eq_ignore_ascii_case(color))
            });
        styled || accented
    }
}

/// Formatting runs of a cell.
///
/// Paragraphs are separated by an unformatted `"\n"` run. Runs in tag
/// formatting (see `TagMarks`) come back as italic tag marks.
pub fn cell_runs(cell: &XmlElement, marks: Option<&TagMarks>) -> Vec<FormattingRun> {
    let mut runs = Vec::new();
    for (index, paragraph) in cell.children_named("w:p").enumerate() {
        if index > 0 {
            runs.push(FormattingRun::plain("\n"));
        }
        collect_runs(paragraph, marks, &mut runs);
    }
    runs
}

fn collect_runs(node: &XmlElement, marks: Option<&TagMarks>, out: &mut Vec<FormattingRun>) {
    for element in node.elements() {
        match element.name.as_str() {
            "w:r" => {
                if let Some(run) = read_run(element, marks) {
                    out.push(run);
                }
            }
            // Deleted content and property blocks carry no visible text
            "w:del" | "w:moveFrom" | "w:pPr" | "w:rPr" => {}
            _ => collect_runs(element, marks, out),
        }
    }
}

fn read_run(run: &XmlElement, marks: Option<&TagMarks>) -> Option<FormattingRun> {
    let mut text = String::new();
    for element in run.elements() {
        match element.name.as_str() {
            "w:t" => text.push_str(&element.text_content()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            "w:noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    if text.is_empty() {
        return None;
    }

    let props = run.child("w:rPr");
    let bold = props.is_some_and(|p| toggle_on(p, "w:b"));
    let italic = props.is_some_and(|p| toggle_on(p, "w:i"));
    let underline = props.is_some_and(underline_on);

    if let (Some(marks), Some(props)) = (marks, props) {
        if marks.matches(props, italic) {
            return Some(FormattingRun {
                bold,
                underline,
                ..FormattingRun::mark(text)
            });
        }
    }

    Some(FormattingRun::new(text, bold, italic, underline))
}

fn toggle_on(props: &XmlElement, name: &str) -> bool {
    match props.child(name) {
        Some(flag) => !matches!(flag.attr("w:val"), Some("0" | "false" | "off")),
        None => false,
    }
}

fn underline_on(props: &XmlElement) -> bool {
    match props.child("w:u") {
        Some(flag) => !matches!(flag.attr("w:val"), Some("none" | "0" | "false")),
        None => false,
    }
}

/// Paragraph properties of a cell's first paragraph
pub fn first_paragraph_props(cell: &XmlElement) -> Option<XmlElement> {
    cell.child("w:p")?.child("w:pPr").cloned()
}

/// Run properties of the first run that has any, searching nested content
pub fn first_run_props(cell: &XmlElement) -> Option<XmlElement> {
    let mut runs = Vec::new();
    cell.find_all("w:r", &mut runs);
    runs.into_iter().find_map(|run| run.child("w:rPr").cloned())
}

/// Replace a cell's paragraphs, keeping its cell properties
pub fn replace_cell_paragraphs(cell: &mut XmlElement, paragraphs: Vec<XmlElement>) {
    cell.children
        .retain(|node| matches!(node, XmlNode::Element(e) if e.is("w:tcPr")));
    cell.children
        .extend(paragraphs.into_iter().map(XmlNode::Element));
}

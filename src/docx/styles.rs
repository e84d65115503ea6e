/*!
 * Style table lookup (`word/styles.xml`).
 */

use crate::docx::xml::XmlDocument;
use crate::errors::DocxError;

/// Kind of a style definition (`w:type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(Self::Paragraph),
            "character" => Some(Self::Character),
            "table" => Some(Self::Table),
            "numbering" => Some(Self::Numbering),
            _ => None,
        }
    }
}

/// One `w:style` entry
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDef {
    pub id: String,
    pub name: String,
    pub kind: StyleKind,
}

/// Parsed style table
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: Vec<StyleDef>,
}

impl StyleSheet {
    pub fn parse(xml: &str, part: &str) -> Result<Self, DocxError> {
        let document = XmlDocument::parse(xml, part)?;
        let styles = document
            .root
            .children_named("w:style")
            .filter_map(|style| {
                let kind = StyleKind::parse(style.attr("w:type").unwrap_or("paragraph"))?;
                let id = style.attr("w:styleId")?.to_string();
                let name = style
                    .child("w:name")
                    .and_then(|n| n.attr("w:val"))
                    .unwrap_or(&id)
                    .to_string();
                Some(StyleDef { id, name, kind })
            })
            .collect();
        Ok(Self { styles })
    }

    pub fn styles(&self) -> &[StyleDef] {
        &self.styles
    }

    /// Style id of the character style whose name or id matches, ignoring case
    pub fn character_style_id(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .filter(|s| s.kind == StyleKind::Character)
            .find(|s| s.name.eq_ignore_ascii_case(name) || s.id.eq_ignore_ascii_case(name))
            .map(|s| s.id.as_str())
    }
}

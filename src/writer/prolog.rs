/*!
 * XML prolog normalization for numbered-pair packages.
 *
 * The importer of the numbered-pair tool rejects parts whose first line is
 * not exactly `<?xml version="1.0" encoding="utf-8"?>`. This is string
 * surgery on serialized XML, so it is kept here behind one operation with
 * an explicit list of the parts it touches.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::docx::DocxPackage;
use crate::errors::DocxError;

/// Prolog the importer accepts
pub const NORMALIZED_PROLOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Parts whose prolog is rewritten
pub const XML_PROLOG_PARTS: [&str; 4] = [
    "word/document.xml",
    "word/styles.xml",
    "word/settings.xml",
    "word/comments.xml",
];

/// A leading XML declaration, optionally after a byte order mark
static PROLOG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\x{FEFF}?\s*<\?xml\s[^?]*\?>").expect("Invalid XML prolog regex")
});

/// Replace or insert the declaration of one serialized part
pub fn normalize_prolog(xml: &str) -> String {
    if PROLOG_REGEX.is_match(xml) {
        PROLOG_REGEX.replace(xml, NORMALIZED_PROLOG).into_owned()
    } else {
        let body = xml.trim_start_matches('\u{FEFF}');
        format!("{}\r\n{}", NORMALIZED_PROLOG, body)
    }
}

/// Normalize the listed parts of an in-memory package and repack it.
/// Parts absent from the package are skipped.
pub fn normalize_xml_prologs(archive: &[u8]) -> Result<Vec<u8>, DocxError> {
    let mut package = DocxPackage::from_bytes(archive)?;

    for part in XML_PROLOG_PARTS {
        let normalized = match package.part_text(part)? {
            Some(xml) => normalize_prolog(xml),
            None => {
                debug!("Prolog fixup: {} not in package", part);
                continue;
            }
        };
        package.set_part(part, normalized.into_bytes());
    }

    package.to_bytes()
}

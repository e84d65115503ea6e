/*!
 * OOXML access layer.
 *
 * - `package`: zip container read/write
 * - `xml`: mutable XML tree over quick-xml
 * - `document`: tables, rows, cells and formatting runs of the main part
 * - `styles`: character style lookup
 */

pub mod document;
pub mod package;
pub mod styles;
pub mod xml;

pub use document::{WordDocument, DOCUMENT_PART, STYLES_PART};
pub use package::DocxPackage;
pub use styles::StyleSheet;
pub use xml::{XmlDocument, XmlElement, XmlNode};

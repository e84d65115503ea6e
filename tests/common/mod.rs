/*!
 * Common test utilities for the bilidocx test suite
 *
 * Bilingual documents are assembled in memory with `zip::ZipWriter` from
 * small WordprocessingML fragments, so every test states the exact table it
 * reads.
 */

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Route library logs to the test harness; repeated calls are harmless
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes bytes to a file in the given directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Escape text for element content
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Plain run
pub fn run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

/// Bold run
pub fn bold_run(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

/// Italic run
pub fn italic_run(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

/// Run in a character style
pub fn styled_run(text: &str, style_id: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:rStyle w:val="{}"/><w:sz w:val="18"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        style_id,
        escape(text)
    )
}

/// Cell holding one paragraph of the given runs
pub fn cell(runs: &str) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="2000" w:type="dxa"/></w:tcPr><w:p>{}</w:p></w:tc>"#,
        runs
    )
}

/// Cell holding plain text, or an empty paragraph
pub fn text_cell(text: &str) -> String {
    if text.is_empty() {
        cell("")
    } else {
        cell(&run(text))
    }
}

/// Table row from cells
pub fn row(cells: &[String]) -> String {
    format!("<w:tr>{}</w:tr>", cells.concat())
}

/// Main part with the given body content
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
        W_NS, body
    )
}

/// Body table from rows
pub fn table(rows: &[String]) -> String {
    format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr>{}</w:tbl>"#,
        rows.concat()
    )
}

/// Style part, optionally defining the "Tag" character style
pub fn styles_xml(with_tag_style: bool) -> String {
    let tag = if with_tag_style {
        r#"<w:style w:type="character" w:styleId="Tag"><w:name w:val="Tag"/><w:rPr><w:i/><w:color w:val="FF0066"/></w:rPr></w:style>"#
    } else {
        ""
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>{}</w:styles>"#,
        W_NS, tag
    )
}

/// Zip a package from a main part and an optional style part
pub fn build_docx(document: &str, styles: Option<&str>) -> Result<Vec<u8>> {
    let mut parts: Vec<(&str, String)> = vec![
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
                .to_string(),
        ),
        ("word/document.xml", document.to_string()),
        (
            "word/settings.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:settings xmlns:w="{}"><w:zoom w:percent="100"/></w:settings>"#,
                W_NS
            ),
        ),
    ];
    if let Some(styles) = styles {
        parts.push(("word/styles.xml", styles.to_string()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in parts {
        writer.start_file(name, options)?;
        writer.write_all(content.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Copy of an archive with one more entry appended
pub fn with_part(archive: &[u8], name: &str, content: &str) -> Result<Vec<u8>> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        writer.start_file(file.name().to_string(), options)?;
        writer.write_all(&bytes)?;
    }
    writer.start_file(name, options)?;
    writer.write_all(content.as_bytes())?;
    Ok(writer.finish()?.into_inner())
}

/// Comments part with a single comment
pub fn comments_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:comments xmlns:w="{}"><w:comment w:id="0" w:author="Reviewer"><w:p><w:r><w:t>Check the name</w:t></w:r></w:p></w:comment></w:comments>"#,
        W_NS
    )
}

/// Text of one archive entry
pub fn read_part(archive: &[u8], name: &str) -> Result<String> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut file = zip.by_name(name)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

/// One numbered-pair data row: id, status, source runs, target runs
pub struct NumberedRow<'a> {
    pub id: &'a str,
    pub status: &'a str,
    pub source: String,
    pub target: String,
}

/// Numbered-pair document: ID/Status/Source/Target header plus rows
pub fn numbered_pair_docx(rows: &[NumberedRow], with_tag_style: bool) -> Result<Vec<u8>> {
    let mut table_rows = vec![row(&[
        text_cell("Segment ID"),
        text_cell("Segment status"),
        text_cell("Source segment"),
        text_cell("Target segment"),
    ])];
    for r in rows {
        table_rows.push(row(&[
            text_cell(r.id),
            text_cell(r.status),
            cell(&r.source),
            cell(&r.target),
        ]));
    }
    build_docx(
        &document_xml(&table(&table_rows)),
        Some(&styles_xml(with_tag_style)),
    )
}

/// Bracket/brace document: metadata row, ID/Source/Target/Comment/Status
/// header, then rows of (id, source runs, target runs, comment, status)
pub fn bracket_brace_docx(rows: &[(&str, String, String, &str, &str)]) -> Result<Vec<u8>> {
    let metadata = format!(
        r#"<w:tc><w:tcPr><w:gridSpan w:val="5"/></w:tcPr><w:p>{}</w:p></w:tc>"#,
        run("Bilingual export, project Annual report 2023")
    );
    let mut table_rows = vec![
        format!("<w:tr>{}</w:tr>", metadata),
        row(&[
            text_cell("ID"),
            text_cell("nl-NL"),
            text_cell("en-GB"),
            text_cell("Comment"),
            text_cell("Status"),
        ]),
    ];
    for (id, source, target, comment, status) in rows {
        table_rows.push(row(&[
            text_cell(id),
            cell(source),
            cell(target),
            text_cell(comment),
            text_cell(status),
        ]));
    }
    build_docx(&document_xml(&table(&table_rows)), Some(&styles_xml(false)))
}

/// Pipe document: ID/source file/target file/Notes/blank header, then rows
/// of (id, source runs, target runs, notes)
pub fn pipe_docx(rows: &[(&str, String, String, &str)]) -> Result<Vec<u8>> {
    let mut table_rows = vec![row(&[
        text_cell("ID"),
        text_cell("strings.en.txt"),
        text_cell("strings.nl.txt"),
        text_cell("Notes"),
        text_cell(""),
    ])];
    for (id, source, target, notes) in rows {
        table_rows.push(row(&[
            text_cell(id),
            cell(source),
            cell(target),
            text_cell(notes),
            text_cell(""),
        ]));
    }
    build_docx(&document_xml(&table(&table_rows)), Some(&styles_xml(false)))
}

/// Document whose paragraphs carry tracked insertions and deletions
pub fn track_changes_docx() -> Result<Vec<u8>> {
    let body = concat!(
        r#"<w:p><w:r><w:t>Unchanged paragraph.</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">Exports of </w:t></w:r>"#,
        r#"<w:ins w:id="1" w:author="Reviewer" w:date="2024-03-01T10:00:00Z"><w:r><w:t>machinery</w:t></w:r></w:ins>"#,
        r#"<w:del w:id="2" w:author="Reviewer" w:date="2024-03-01T10:00:00Z"><w:r><w:delText>goods</w:delText></w:r></w:del>"#,
        r#"<w:r><w:t xml:space="preserve"> increased</w:t></w:r></w:p>"#,
        r#"<w:p><w:del w:id="3" w:author="Editor"><w:r><w:delText xml:space="preserve">Very </w:delText></w:r></w:del><w:r><w:t>strong growth.</w:t></w:r></w:p>"#,
    );
    build_docx(&document_xml(body), Some(&styles_xml(false)))
}

/*!
 * Integration tests for track-changes extraction
 */

use anyhow::Result;
use bilidocx::docx::{DocxPackage, WordDocument};
use bilidocx::errors::DocxError;
use bilidocx::track_changes::TrackChangesExtractor;
use crate::common;

/// Scenario: each edited paragraph yields its original and final text
#[test]
fn test_extractDocument_withInsertAndDelete_shouldPairTexts() -> Result<()> {
    common::init_test_logger();
    let document = WordDocument::from_bytes(&common::track_changes_docx()?)?;

    let pairs = TrackChangesExtractor::default().extract_document(&document)?;

    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].original_text, "Exports of goods increased");
    assert_eq!(pairs[0].final_text, "Exports of machinery increased");
    assert_eq!(pairs[0].paragraph_index, 1);
    assert_eq!(pairs[0].authors, vec!["Reviewer".to_string()]);
    assert_eq!(pairs[0].part, "word/document.xml");

    assert_eq!(pairs[1].original_text, "Very strong growth.");
    assert_eq!(pairs[1].final_text, "strong growth.");
    assert_eq!(pairs[1].authors, vec!["Editor".to_string()]);

    Ok(())
}

/// Extracting twice from the same package gives identical pairs
#[test]
fn test_extractPairs_twice_shouldBeIdentical() -> Result<()> {
    let package = DocxPackage::from_bytes(&common::track_changes_docx()?)?;
    let extractor = TrackChangesExtractor::new(true);

    let first = serde_json::to_string(&extractor.extract_pairs(&package)?)?;
    let second = serde_json::to_string(&extractor.extract_pairs(&package)?)?;

    assert_eq!(first, second);
    assert!(first.contains("machinery"));

    Ok(())
}

/// A document without revisions has no pairs
#[test]
fn test_extractDocument_withoutRevisions_shouldBeEmpty() -> Result<()> {
    let bytes = common::pipe_docx(&[("1", common::run("Hello"), common::run("Hallo"), "")])?;
    let document = WordDocument::from_bytes(&bytes)?;

    let pairs = TrackChangesExtractor::default().extract_document(&document)?;

    assert!(pairs.is_empty());

    Ok(())
}

/// Paragraphs inside table cells are visited too
#[test]
fn test_extractDocument_withRevisionInTableCell_shouldFindIt() -> Result<()> {
    let cell = common::cell(
        r#"<w:r><w:t xml:space="preserve">Status </w:t></w:r><w:ins w:author="Ann"><w:r><w:t>final</w:t></w:r></w:ins>"#,
    );
    let body = common::table(&[common::row(&[cell])]);
    let bytes = common::build_docx(&common::document_xml(&body), None)?;
    let document = WordDocument::from_bytes(&bytes)?;

    let pairs = TrackChangesExtractor::default().extract_document(&document)?;

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].original_text, "Status");
    assert_eq!(pairs[0].final_text, "Status final");

    Ok(())
}

/// Auxiliary parts are only read when enabled
#[test]
fn test_extractPairs_withFooterRevision_shouldHonorSetting() -> Result<()> {
    let mut package = DocxPackage::from_bytes(&common::track_changes_docx()?)?;
    package.set_part(
        "word/footer1.xml",
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t xml:space="preserve">Page </w:t></w:r><w:del w:author="Ann"><w:r><w:delText>one</w:delText></w:r></w:del></w:p></w:ftr>"#
            .to_vec(),
    );

    let main_only = TrackChangesExtractor::new(false).extract_pairs(&package)?;
    let with_footer = TrackChangesExtractor::new(true).extract_pairs(&package)?;

    assert_eq!(main_only.len(), 2);
    assert_eq!(with_footer.len(), 3);
    let footer = &with_footer[2];
    assert_eq!(footer.part, "word/footer1.xml");
    assert_eq!(footer.original_text, "Page one");
    assert_eq!(footer.final_text, "Page");

    Ok(())
}

/// A package without a main part is an error
#[test]
fn test_extractPairs_withoutMainPart_shouldFail() -> Result<()> {
    let package = DocxPackage::default();

    let result = TrackChangesExtractor::default().extract_pairs(&package);

    assert!(matches!(result, Err(DocxError::MissingPart(_))));

    Ok(())
}

/*!
 * Integration tests for write-back and the XML prolog fixup
 */

use anyhow::Result;
use bilidocx::app_config::{StyleFallback, WriterConfig};
use bilidocx::dialect::Dialect;
use bilidocx::docx::WordDocument;
use bilidocx::errors::InterchangeError;
use bilidocx::notation::{EncodePolicy, TagNotation};
use bilidocx::reader::BilingualDocumentReader;
use bilidocx::segment::{SegmentRecord, SegmentStatus, WarningKind};
use bilidocx::writer::{BilingualDocumentWriter, NORMALIZED_PROLOG};
use crate::common::{self, NumberedRow};

fn read(dialect: Dialect, bytes: &[u8]) -> Result<Vec<SegmentRecord>> {
    let document = WordDocument::from_bytes(bytes)?;
    Ok(BilingualDocumentReader::new(dialect, EncodePolicy::default()).extract(&document)?)
}

fn writer(dialect: Dialect) -> BilingualDocumentWriter {
    BilingualDocumentWriter::new(dialect, EncodePolicy::default(), WriterConfig::default())
}

fn numbered_doc(with_tag_style: bool) -> Result<Vec<u8>> {
    common::numbered_pair_docx(
        &[
            NumberedRow {
                id: "a1b2",
                status: "Not Translated (0%)",
                source: format!(
                    "{}{}",
                    common::bold_run("Biagio Pagano"),
                    common::run(" is a footballer")
                ),
                target: String::new(),
            },
            NumberedRow {
                id: "c3d4",
                status: "Draft (85%)",
                source: common::run("He plays as a striker."),
                target: common::run("Hij speelt als spits."),
            },
        ],
        with_tag_style,
    )
}

fn pipe_doc() -> Result<Vec<u8>> {
    common::pipe_docx(&[(
        "1",
        format!(
            "{}{}{}",
            common::run("He debuted against "),
            common::bold_run("Juventus FC"),
            common::run(" in 2001")
        ),
        String::new(),
        "",
    )])
}

/// Scenario: a numbered translation is written in the "Tag" style and reads back identically
#[test]
fn test_update_numberedPair_withTagStyle_shouldRoundTrip() -> Result<()> {
    let original = numbered_doc(true)?;
    let mut records = read(Dialect::NumberedPair, &original)?;
    let notation = Dialect::NumberedPair.notation();
    records[0].set_translation("<1>Biagio Pagano</1> is een voetballer", notation);

    let (bytes, report) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

    assert_eq!(report.rows_written, 2);
    assert!(report.warnings.is_empty());
    let xml = common::read_part(&bytes, "word/document.xml")?;
    assert!(xml.contains(r#"<w:rStyle w:val="Tag"/>"#));
    assert!(xml.contains("Translated (100%)"));
    assert!(xml.contains("Draft (85%)"));

    let reread = read(Dialect::NumberedPair, &bytes)?;
    assert_eq!(reread[0].target_tagged, "<1>Biagio Pagano</1> is een voetballer");
    assert_eq!(reread[0].status, SegmentStatus::Translated);
    assert_eq!(reread[1].target_text, "Hij speelt als spits.");
    assert_eq!(reread[1].status, SegmentStatus::Draft);
    assert_eq!(
        reread[0].source_tag_count(notation),
        notation.decode(&reread[0].target_tagged).ok().map(|d| d.tag_count())
    );

    Ok(())
}

/// Every written tag pair is read back as its own pair
#[test]
fn test_update_numberedPair_withSeveralTags_shouldConserveTagCount() -> Result<()> {
    let targets = [
        "<1>Biagio Pagano</1> en <2>Juventus FC</2>",
        "<1>Ja</1><2>Nee</2> en <3>misschien</3>",
        "<1>Een</1> twee <2>drie</2> vier <3>vijf</3> zes <4>zeven</4>",
    ];
    for with_tag_style in [true, false] {
        for target in targets {
            let original = numbered_doc(with_tag_style)?;
            let mut records = read(Dialect::NumberedPair, &original)?;
            let notation = Dialect::NumberedPair.notation();
            records[0].set_translation(target, notation);
            let written = notation.decode(target)?.tag_count();

            let (bytes, _) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

            let reread = read(Dialect::NumberedPair, &bytes)?;
            assert_eq!(
                notation.decode(&reread[0].target_tagged)?.tag_count(),
                written,
                "{} (tag style: {})",
                target,
                with_tag_style
            );
            assert_eq!(reread[0].target_tagged, target);
        }
    }

    Ok(())
}

/// Without the "Tag" style, tags get manual formatting and one warning
#[test]
fn test_update_numberedPair_withoutTagStyle_shouldUseManualFormatting() -> Result<()> {
    let original = numbered_doc(false)?;
    let mut records = read(Dialect::NumberedPair, &original)?;
    let notation = Dialect::NumberedPair.notation();
    records[0].set_translation("<1>Biagio Pagano</1> is een voetballer", notation);

    let (bytes, report) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

    let missing = report
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::StyleMissing)
        .count();
    assert_eq!(missing, 1);
    let xml = common::read_part(&bytes, "word/document.xml")?;
    assert!(xml.contains(r#"<w:color w:val="C00000"/>"#));
    assert!(xml.contains("<w:i/>"));
    assert!(!xml.contains("w:rStyle"));

    let reread = read(Dialect::NumberedPair, &bytes)?;
    assert_eq!(reread[0].target_tagged, "<1>Biagio Pagano</1> is een voetballer");

    Ok(())
}

/// The plain fallback writes tag spans as ordinary text
#[test]
fn test_update_numberedPair_withPlainFallback_shouldDropFormatting() -> Result<()> {
    let original = numbered_doc(false)?;
    let mut records = read(Dialect::NumberedPair, &original)?;
    records[0].set_translation(
        "<1>Biagio Pagano</1> is een voetballer",
        Dialect::NumberedPair.notation(),
    );
    let config = WriterConfig {
        style_fallback: StyleFallback::Plain,
        ..WriterConfig::default()
    };

    let (bytes, _) = BilingualDocumentWriter::new(Dialect::NumberedPair, EncodePolicy::default(), config)
        .update_bytes(&original, &records)?;

    let reread = read(Dialect::NumberedPair, &bytes)?;
    assert_eq!(reread[0].target_tagged, "Biagio Pagano is een voetballer");

    Ok(())
}

/// Scenario: a bracket/brace translation is bold and its status becomes "Confirmed"
#[test]
fn test_update_bracketBrace_withTranslation_shouldWriteBoldAndConfirm() -> Result<()> {
    let original = common::bracket_brace_docx(&[(
        "1",
        common::bold_run("De uitvoer"),
        String::new(),
        "",
        "Not started",
    )])?;
    let mut records = read(Dialect::BracketBrace, &original)?;
    assert_eq!(records[0].source_tagged, "[1}De uitvoer{2]");
    records[0].set_translation("[1}The exports{2]", Dialect::BracketBrace.notation());

    let (bytes, report) = writer(Dialect::BracketBrace).update_bytes(&original, &records)?;

    assert_eq!(report.rows_written, 1);
    let xml = common::read_part(&bytes, "word/document.xml")?;
    assert!(xml.contains("<w:b/>"));
    assert!(xml.contains("Confirmed"));
    assert!(!xml.contains("Not started"));

    let reread = read(Dialect::BracketBrace, &bytes)?;
    assert_eq!(reread[0].target_tagged, "[1}The exports{2]");
    assert_eq!(reread[0].status, SegmentStatus::Translated);

    Ok(())
}

/// Scenario: a balanced pipe translation reads back identically
#[test]
fn test_update_pipe_withBalancedPipes_shouldRoundTrip() -> Result<()> {
    let original = pipe_doc()?;
    let mut records = read(Dialect::Pipe, &original)?;
    records[0].set_translation("Hij debuteerde tegen |Juventus FC| in 2001", Dialect::Pipe.notation());

    let (bytes, report) = writer(Dialect::Pipe).update_bytes(&original, &records)?;

    assert!(report.warnings.is_empty());
    let reread = read(Dialect::Pipe, &bytes)?;
    assert_eq!(reread[0].target_tagged, "Hij debuteerde tegen |Juventus FC| in 2001");
    assert_eq!(reread[0].status, SegmentStatus::Translated);

    Ok(())
}

/// Scenario: an odd pipe count is written as plain text with a warning
#[test]
fn test_update_pipe_withOddPipes_shouldWritePlainText() -> Result<()> {
    let original = pipe_doc()?;
    let mut records = read(Dialect::Pipe, &original)?;
    records[0].set_translation("Hij debuteerde tegen |Juventus FC in 2001", Dialect::Pipe.notation());
    assert_eq!(records[0].warnings[0].kind, WarningKind::TagCountMismatch);

    let (bytes, report) = writer(Dialect::Pipe).update_bytes(&original, &records)?;

    assert_eq!(report.rows_written, 1);
    assert_eq!(report.warnings[0].kind, WarningKind::TagCountMismatch);
    let reread = read(Dialect::Pipe, &bytes)?;
    assert_eq!(reread[0].target_tagged, "Hij debuteerde tegen Juventus FC in 2001");

    Ok(())
}

/// Line breaks and tabs in a translation become paragraphs and tab elements
#[test]
fn test_update_withMultilineTarget_shouldSplitParagraphs() -> Result<()> {
    let original = pipe_doc()?;
    let mut records = read(Dialect::Pipe, &original)?;
    records[0].set_translation("Regel een\nRegel\ttwee", Dialect::Pipe.notation());

    let (bytes, _) = writer(Dialect::Pipe).update_bytes(&original, &records)?;

    let xml = common::read_part(&bytes, "word/document.xml")?;
    assert!(xml.contains("<w:tab/>"));
    let reread = read(Dialect::Pipe, &bytes)?;
    assert_eq!(reread[0].target_text, "Regel een\nRegel\ttwee");

    Ok(())
}

/// Scenario: numbered-pair output starts every XML part with the normalized prolog
#[test]
fn test_update_numberedPair_shouldNormalizeXmlProlog() -> Result<()> {
    let original = numbered_doc(true)?;
    let records = read(Dialect::NumberedPair, &original)?;

    let (bytes, _) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

    for part in ["word/document.xml", "word/styles.xml", "word/settings.xml"] {
        let xml = common::read_part(&bytes, part)?;
        assert_eq!(xml.lines().next(), Some(NORMALIZED_PROLOG), "part {}", part);
    }

    Ok(())
}

/// The comments part gets the normalized prolog and keeps its content
#[test]
fn test_update_numberedPair_withComments_shouldNormalizeCommentsProlog() -> Result<()> {
    let original = common::with_part(&numbered_doc(true)?, "word/comments.xml", &common::comments_xml())?;
    let records = read(Dialect::NumberedPair, &original)?;

    let (bytes, _) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

    let xml = common::read_part(&bytes, "word/comments.xml")?;
    assert_eq!(xml.lines().next(), Some(NORMALIZED_PROLOG));
    assert!(xml.contains("Check the name"));
    assert!(!xml.contains("standalone"));

    Ok(())
}

/// Other dialects, and a disabled fixup, keep the standard declaration
#[test]
fn test_update_withoutFixup_shouldKeepStandaloneDeclaration() -> Result<()> {
    let original = pipe_doc()?;
    let records = read(Dialect::Pipe, &original)?;
    let (bytes, _) = writer(Dialect::Pipe).update_bytes(&original, &records)?;
    let xml = common::read_part(&bytes, "word/document.xml")?;
    assert_ne!(xml.lines().next(), Some(NORMALIZED_PROLOG));
    assert!(xml.starts_with("<?xml"));

    let numbered = numbered_doc(true)?;
    let records = read(Dialect::NumberedPair, &numbered)?;
    let config = WriterConfig {
        fix_xml_prologs: false,
        ..WriterConfig::default()
    };
    let (bytes, _) = BilingualDocumentWriter::new(Dialect::NumberedPair, EncodePolicy::default(), config)
        .update_bytes(&numbered, &records)?;
    let xml = common::read_part(&bytes, "word/settings.xml")?;
    assert_ne!(xml.lines().next(), Some(NORMALIZED_PROLOG));

    Ok(())
}

/// Writing the same records twice yields identical archives
#[test]
fn test_update_twice_shouldBeByteIdentical() -> Result<()> {
    let original = numbered_doc(true)?;
    let mut records = read(Dialect::NumberedPair, &original)?;
    records[0].set_translation(
        "<1>Biagio Pagano</1> is een voetballer",
        Dialect::NumberedPair.notation(),
    );
    let writer = writer(Dialect::NumberedPair);

    let (first, _) = writer.update_bytes(&original, &records)?;
    let (second, _) = writer.update_bytes(&original, &records)?;

    assert_eq!(first, second);

    Ok(())
}

/// Untouched records leave the segments as they were
#[test]
fn test_update_withUnchangedRecords_shouldPreserveSegments() -> Result<()> {
    let original = common::bracket_brace_docx(&[
        ("1", common::bold_run("De uitvoer"), String::new(), "", "Not started"),
        ("2", common::run("steeg."), common::run("rose."), "", "Proofread"),
    ])?;
    let records = read(Dialect::BracketBrace, &original)?;

    let (bytes, report) = writer(Dialect::BracketBrace).update_bytes(&original, &records)?;

    assert_eq!(report.rows_written, 1);
    assert_eq!(report.rows_skipped, 1);
    let reread = read(Dialect::BracketBrace, &bytes)?;
    assert_eq!(reread, records);

    Ok(())
}

/// A record whose row no longer exists is reported and skipped
#[test]
fn test_update_withUnknownRowKey_shouldWarnRowNotFound() -> Result<()> {
    let original = pipe_doc()?;
    let mut records = read(Dialect::Pipe, &original)?;
    records[0].row_key = "99".into();
    records[0].set_translation("Hallo", Dialect::Pipe.notation());

    let (_, report) = writer(Dialect::Pipe).update_bytes(&original, &records)?;

    assert_eq!(report.rows_written, 0);
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.warnings[0].kind, WarningKind::RowNotFound);

    Ok(())
}

/// Writing into a document of another dialect fails
#[test]
fn test_update_withWrongDialect_shouldReturnFormatMismatch() -> Result<()> {
    let original = pipe_doc()?;

    let result = writer(Dialect::BracketBrace).update_bytes(&original, &[]);

    assert!(matches!(
        result,
        Err(InterchangeError::FormatMismatch { dialect: "bracket-brace" })
    ));

    Ok(())
}

/// `write` saves a document the reader accepts
#[test]
fn test_write_shouldSaveReadableDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "strings.docx", &pipe_doc()?)?;
    let output = temp_dir.path().join("strings.nl.docx");
    let mut records = read(Dialect::Pipe, &std::fs::read(&input)?)?;
    records[0].set_translation("Hij debuteerde tegen |Juventus FC| in 2001", Dialect::Pipe.notation());

    let report = writer(Dialect::Pipe).write(&input, &records, &output)?;

    assert_eq!(report.rows_written, 1);
    let reread = BilingualDocumentReader::new(Dialect::Pipe, EncodePolicy::default()).read_path(&output)?;
    assert_eq!(reread[0].target_text, "Hij debuteerde tegen Juventus FC in 2001");

    Ok(())
}

/// Numbered placeholders come back as tag-styled runs in the target
#[test]
fn test_update_numberedPair_withPlaceholder_shouldRestoreIt() -> Result<()> {
    let original = common::numbered_pair_docx(
        &[NumberedRow {
            id: "f6",
            status: "Not Translated (0%)",
            source: format!(
                "{}{}{}",
                common::run("See page "),
                common::styled_run("<3/>", "Tag"),
                common::run(" for details")
            ),
            target: String::new(),
        }],
        true,
    )?;
    let mut records = read(Dialect::NumberedPair, &original)?;
    assert_eq!(records[0].source_tagged, "See page <3/> for details");
    records[0].set_translation("Zie pagina <3/> voor details", Dialect::NumberedPair.notation());

    let (bytes, _) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

    let reread = read(Dialect::NumberedPair, &bytes)?;
    assert_eq!(reread[0].target_tagged, "Zie pagina <3/> voor details");
    assert_eq!(reread[0].target_text, "Zie pagina  voor details");

    Ok(())
}

/// Records sharing an ID are each written to their own row
#[test]
fn test_update_withDuplicateRowKeys_shouldWriteEachRow() -> Result<()> {
    let original = common::numbered_pair_docx(
        &[
            NumberedRow {
                id: "x1",
                status: "Not Translated (0%)",
                source: common::run("Yes"),
                target: String::new(),
            },
            NumberedRow {
                id: "x1",
                status: "Not Translated (0%)",
                source: common::run("No"),
                target: String::new(),
            },
        ],
        true,
    )?;
    let mut records = read(Dialect::NumberedPair, &original)?;
    let notation = Dialect::NumberedPair.notation();
    records[0].set_translation("Ja", notation);
    records[1].set_translation("Nee", notation);

    let (bytes, report) = writer(Dialect::NumberedPair).update_bytes(&original, &records)?;

    assert_eq!(report.rows_written, 2);
    let reread = read(Dialect::NumberedPair, &bytes)?;
    assert_eq!(reread[0].target_text, "Ja");
    assert_eq!(reread[1].target_text, "Nee");

    Ok(())
}

/// Each dialect reads and writes through the same surface
#[test]
fn test_dialect_extractThenUpdate_shouldRoundTrip() -> Result<()> {
    let original = pipe_doc()?;
    let document = WordDocument::from_bytes(&original)?;
    let policy = EncodePolicy::default();
    assert!(Dialect::Pipe.validate(&document));

    let mut records = Dialect::Pipe.extract(&document, &policy)?;
    records[0].set_translation("Hij debuteerde tegen |Juventus FC| in 2001", Dialect::Pipe.notation());
    let (bytes, report) = Dialect::Pipe.update(&original, &records, &policy, &WriterConfig::default())?;

    assert_eq!(report.rows_written, 1);
    let reread = Dialect::Pipe.extract(&WordDocument::from_bytes(&bytes)?, &policy)?;
    assert_eq!(reread[0].target_tagged, "Hij debuteerde tegen |Juventus FC| in 2001");
    assert_eq!(Dialect::Pipe.decode(&reread[0].target_tagged)?.tag_count(), 1);

    Ok(())
}

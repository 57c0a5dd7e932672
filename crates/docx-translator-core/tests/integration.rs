//! Integration tests for docx-translator-core
//!
//! These tests verify the end-to-end workflow:
//! - DOCX loading and paragraph extraction
//! - Translation with mock backends
//! - Alignment failures and provider failures
//! - Translated-only and bilingual rewriting
//! - Cache hits and misses

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docx_translator_core::{
    AppConfig, CacheConfig, DocxDocument, DocxTranslator, Error, ErrorKind, Lang,
    ParagraphExtractor, RenderMode, Result, TranslationCache, Translator,
    translator::TranslatorInfo,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// =============================================================================
// Mock Translators for Testing
// =============================================================================

/// How the mock answers
enum Reply {
    /// Uppercase each line, keeping line structure
    Upper,
    /// Always the same text
    Fixed(&'static str),
    /// Fail like a provider would
    Fail,
    /// Never answer in time
    Hang,
}

/// A mock translator that returns predictable translations without network calls.
struct MockTranslator {
    reply: Reply,
    calls: AtomicUsize,
}

impl MockTranslator {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "mock",
            model: None,
            supports_auto_detect: true,
        }
    }

    async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Upper => Ok(text.to_uppercase()),
            Reply::Fixed(answer) => Ok(answer.to_string()),
            Reply::Fail => Err(Error::TranslationRequest("Mock translation failure".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(text.to_string())
            }
        }
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Build a minimal .docx whose body holds `body_xml`
fn build_docx(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
    );

    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zout.start_file(name, SimpleFileOptions::default()).unwrap();
        zout.write_all(body.as_bytes()).unwrap();
    }
    zout.finish().unwrap().into_inner()
}

fn paragraph(text: &str) -> String {
    if text.is_empty() {
        return "<w:p><w:pPr><w:spacing w:after=\"120\"/></w:pPr></w:p>".to_string();
    }
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:jc w:val="both"/></w:pPr><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
    )
}

/// The three-paragraph document: "Hello", blank, "World"
fn hello_world() -> Vec<u8> {
    build_docx(&[paragraph("Hello"), paragraph(""), paragraph("World")].concat())
}

fn texts(bytes: &[u8]) -> Vec<String> {
    let doc = DocxDocument::load(bytes).expect("output should load");
    ParagraphExtractor::new(&doc).extract_texts()
}

fn test_config() -> AppConfig {
    AppConfig {
        target_lang: Lang::new("fr"),
        cache: CacheConfig::disabled(),
        ..Default::default()
    }
}

fn pipeline(translator: Arc<MockTranslator>) -> DocxTranslator {
    DocxTranslator::with_translator(translator, test_config()).expect("Should create translator")
}

// =============================================================================
// Extraction Tests
// =============================================================================

#[test]
fn test_docx_loads_and_extracts() {
    let doc = DocxDocument::load(&hello_world()).unwrap();
    let paragraphs = ParagraphExtractor::new(&doc).extract();
    assert_eq!(paragraphs.len(), 3);
    assert_eq!(paragraphs[0].text, "Hello");
    assert_eq!(paragraphs[1].text, "");
    assert_eq!(paragraphs[2].position, 2);
}

#[test]
fn test_extraction_is_idempotent() {
    let doc = DocxDocument::load(&hello_world()).unwrap();
    let first = ParagraphExtractor::new(&doc).extract_texts();
    let second = ParagraphExtractor::new(&doc).extract_texts();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_docx_bytes() {
    let result = DocxDocument::load(&[0, 1, 2, 3]);
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::ParseFailure));
}

#[test]
fn test_malformed_document_xml() {
    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    zout.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    zout.write_all(b"<w:document><w:body>").unwrap();
    let bytes = zout.finish().unwrap().into_inner();

    let err = DocxDocument::load(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_translated_only_scenario() {
    let translator = MockTranslator::new(Reply::Fixed("Bonjour\n\nMonde"));
    let result = pipeline(translator.clone())
        .translate_document_with(&hello_world(), &Lang::new("fr"), RenderMode::TranslatedOnly)
        .await
        .unwrap();

    assert_eq!(texts(&result.bytes), vec!["Bonjour", "", "Monde"]);
    assert_eq!(result.paragraph_count, 3);
    assert_eq!(result.mode, RenderMode::TranslatedOnly);
    assert!(!result.from_cache);
    assert_eq!(translator.calls(), 1, "provider is called once per document");
}

#[tokio::test]
async fn test_bilingual_scenario() {
    let translator = MockTranslator::new(Reply::Fixed("Bonjour\n\nMonde"));
    let result = pipeline(translator)
        .translate_document_with(&hello_world(), &Lang::new("fr"), RenderMode::Bilingual)
        .await
        .unwrap();

    assert_eq!(
        texts(&result.bytes),
        vec!["Hello", "Bonjour", "", "", "World", "Monde"]
    );
}

#[tokio::test]
async fn test_translated_only_keeps_structure() {
    let source = hello_world();
    let before = DocxDocument::load(&source).unwrap();

    let result = pipeline(MockTranslator::new(Reply::Upper))
        .translate_document(&source)
        .await
        .unwrap();
    let after = DocxDocument::load(&result.bytes).unwrap();

    assert_eq!(texts(&result.bytes), vec!["HELLO", "", "WORLD"]);
    assert_eq!(before.tree().attached_len(), after.tree().attached_len());

    let xml = String::from_utf8(after.tree().serialize().unwrap()).unwrap();
    assert_eq!(xml.matches(r#"<w:pStyle w:val="Body"/>"#).count(), 2);
    assert!(xml.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
}

#[tokio::test]
async fn test_bilingual_formatting_is_deep_copied() {
    let result = pipeline(MockTranslator::new(Reply::Upper))
        .translate_document_with(&hello_world(), &Lang::new("fr"), RenderMode::Bilingual)
        .await
        .unwrap();

    let doc = DocxDocument::load(&result.bytes).unwrap();
    let tree = doc.tree();
    let paragraphs = ParagraphExtractor::new(&doc).extract();
    assert_eq!(paragraphs.len(), 6);

    for pair in paragraphs.chunks(2) {
        let original = tree.first_child_named(pair[0].node, "w:pPr").unwrap();
        let translated = tree.first_child_named(pair[1].node, "w:pPr").unwrap();
        assert_ne!(original, translated);
        assert!(tree.subtree_eq(original, translated));
    }
}

#[tokio::test]
async fn test_alignment_mismatch_stops_pipeline() {
    // Provider collapsed the blank paragraph
    let result = pipeline(MockTranslator::new(Reply::Fixed("Bonjour\nMonde")))
        .translate_document(&hello_world())
        .await;

    match result {
        Err(Error::AlignmentMismatch { expected, actual }) => {
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("expected AlignmentMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_failure_is_surfaced() {
    let err = pipeline(MockTranslator::new(Reply::Fail))
        .translate_document(&hello_world())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderFailure);
    assert!(err.to_string().contains("Mock translation failure"));
}

#[tokio::test]
async fn test_provider_timeout_fails_request() {
    let mut config = test_config();
    config.translator.timeout_secs = 0;
    let translator = DocxTranslator::with_translator(MockTranslator::new(Reply::Hang), config)
        .unwrap();

    let err = translator.translate_document(&hello_world()).await.unwrap_err();
    assert!(matches!(err, Error::TranslationTimeout));
}

#[tokio::test]
async fn test_document_without_text_skips_provider() {
    let translator = MockTranslator::new(Reply::Fail);
    let source = build_docx(&[paragraph(""), paragraph("")].concat());

    let result = pipeline(translator.clone())
        .translate_document(&source)
        .await
        .unwrap();

    assert_eq!(translator.calls(), 0);
    assert_eq!(texts(&result.bytes), vec!["", ""]);
}

#[tokio::test]
async fn test_document_without_paragraphs() {
    let translator = MockTranslator::new(Reply::Fail);
    let result = pipeline(translator.clone())
        .translate_document(&build_docx(""))
        .await
        .unwrap();

    assert_eq!(result.paragraph_count, 0);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn test_tables_are_left_untouched() {
    let body = format!(
        "{}<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>{}",
        paragraph("Hello"),
        paragraph("World")
    );
    let result = pipeline(MockTranslator::new(Reply::Upper))
        .translate_document_with(&build_docx(&body), &Lang::new("fr"), RenderMode::Bilingual)
        .await
        .unwrap();

    let doc = DocxDocument::load(&result.bytes).unwrap();
    let xml = String::from_utf8(doc.tree().serialize().unwrap()).unwrap();
    assert!(xml.contains("<w:t>cell</w:t>"));
    assert!(!xml.contains("CELL"));
    assert_eq!(texts(&result.bytes), vec!["Hello", "HELLO", "World", "WORLD"]);
}

#[tokio::test]
async fn test_other_parts_survive() {
    let result = pipeline(MockTranslator::new(Reply::Upper))
        .translate_document(&hello_world())
        .await
        .unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(result.bytes)).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]);
}

// =============================================================================
// Cache Tests
// =============================================================================

#[tokio::test]
async fn test_cache_hit_on_second_translation() {
    let translator = MockTranslator::new(Reply::Upper);
    let cache = TranslationCache::new(&CacheConfig {
        disk_enabled: false,
        ..CacheConfig::default()
    })
    .unwrap();
    let pipeline = DocxTranslator::from_parts(translator.clone(), cache, test_config());

    let first = pipeline.translate_document(&hello_world()).await.unwrap();
    assert!(!first.from_cache);

    let second = pipeline
        .translate_document_with(&hello_world(), &Lang::new("fr"), RenderMode::Bilingual)
        .await
        .unwrap();
    assert!(second.from_cache, "render mode does not affect the cached text");
    assert_eq!(translator.calls(), 1);
    assert_eq!(texts(&second.bytes).len(), 6);
}

#[tokio::test]
async fn test_misaligned_reply_is_not_cached() {
    let translator = MockTranslator::new(Reply::Fixed("only one line"));
    let cache = TranslationCache::new(&CacheConfig {
        disk_enabled: false,
        ..CacheConfig::default()
    })
    .unwrap();
    let pipeline = DocxTranslator::from_parts(translator.clone(), cache, test_config());

    assert!(pipeline.translate_document(&hello_world()).await.is_err());
    assert!(pipeline.translate_document(&hello_world()).await.is_err());
    assert_eq!(translator.calls(), 2);
}

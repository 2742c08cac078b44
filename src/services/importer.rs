//! HTML import
//!
//! Turns one uploaded HTML file into a published page. The caller passes in
//! whether the request is authorized and whether its nonce checked out, so
//! this module never looks at the HTTP request itself.
//!
//! Title and body are found with first-match, non-greedy, case-insensitive
//! regular expressions. This is not an HTML parser: with several `<title>`
//! or `<body>` tags only the first is used, and malformed or nested markup
//! gives surprising but deterministic results.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::models::{ImportFailure, ImportResult, ParsedDocument, UploadedFile};
use crate::services::sanitize::{
    file_extension, file_stem, sanitize_file_name, sanitize_post_content, sanitize_text_field,
    strip_all_tags,
};

/// Title used when neither the document nor the file name provide one
pub const DEFAULT_TITLE: &str = "Imported Page";

/// File name extensions accepted for import, compared case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["html", "htm"];

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("valid title regex"));

static BODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").expect("valid body regex"));

/// Storage failure reported by a [`PageStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused the record; reported to the user as an insert failure
    #[error("Page rejected by storage: {0}")]
    Rejected(String),
    /// The store itself is broken; propagated to the caller
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// Where imported pages are written
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Create a published page and return its identifier
    async fn create_page(&self, title: &str, content: &str) -> Result<i64, StoreError>;
}

/// Extract a title and body from raw HTML bytes.
///
/// Bytes are decoded as UTF-8, replacing invalid sequences. No charset
/// detection is attempted. The title falls back to `filename` without its
/// extension, then to [`DEFAULT_TITLE`]; the content falls back to the whole
/// decoded input.
pub fn extract(raw: &[u8], filename: &str) -> ParsedDocument {
    let html = String::from_utf8_lossy(raw);

    let title = TITLE_RE
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| strip_all_tags(m.as_str()).trim().to_string())
        .unwrap_or_default();

    let content = BODY_RE
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    ParsedDocument {
        title: if title.is_empty() { fallback_title(filename) } else { title },
        content: if content.is_empty() { html.into_owned() } else { content },
    }
}

/// Whether `ext` (without the dot) is one of [`ALLOWED_EXTENSIONS`]
pub fn is_extension_allowed(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
}

fn fallback_title(filename: &str) -> String {
    let stem = file_stem(filename);
    if stem.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        stem.to_string()
    }
}

pub struct Importer {
    store: Arc<dyn PageStore>,
}

impl Importer {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    /// Validate, extract and store one uploaded file.
    ///
    /// Expected problems come back as `ImportResult::Failure`; only a fatal
    /// storage error is returned as `Err`.
    pub async fn import(
        &self,
        file: Option<UploadedFile>,
        authorized: bool,
        token_valid: bool,
    ) -> anyhow::Result<ImportResult> {
        let (filename, bytes) = match self.validate(file, authorized, token_valid) {
            Ok(accepted) => accepted,
            Err(reason) => {
                tracing::warn!(reason = %reason, "HTML import rejected");
                return Ok(ImportResult::Failure(reason));
            }
        };

        let parsed = extract(&bytes, &filename);
        drop(bytes);

        let mut title = sanitize_text_field(&parsed.title);
        if title.is_empty() {
            title = fallback_title(&filename);
        }
        let content = sanitize_post_content(&parsed.content);

        match self.store.create_page(&title, &content).await {
            Ok(page_id) if page_id > 0 => {
                tracing::info!(page_id, title = %title, file = %filename, "HTML file imported");
                Ok(ImportResult::Success { page_id })
            }
            Ok(page_id) => {
                tracing::warn!(page_id, file = %filename, "Page store returned an invalid id");
                Ok(ImportResult::Failure(ImportFailure::Insert))
            }
            Err(StoreError::Rejected(reason)) => {
                tracing::warn!(file = %filename, "Page insert rejected: {}", reason);
                Ok(ImportResult::Failure(ImportFailure::Insert))
            }
            Err(StoreError::Fatal(e)) => {
                tracing::error!(file = %filename, "Page store failure: {:#}", e);
                Err(e)
            }
        }
    }

    /// Checks in order, stopping at the first failure. On success returns the
    /// sanitized file name and the raw bytes.
    fn validate(
        &self,
        file: Option<UploadedFile>,
        authorized: bool,
        token_valid: bool,
    ) -> Result<(String, Vec<u8>), ImportFailure> {
        if !authorized {
            return Err(ImportFailure::Permission);
        }
        if !token_valid {
            return Err(ImportFailure::Nonce);
        }
        let file = file.ok_or(ImportFailure::Missing)?;
        if let Some(error) = &file.upload_error {
            tracing::debug!(file = %file.name, "Upload error: {}", error);
            return Err(ImportFailure::Upload);
        }
        if file.size_bytes == 0 {
            return Err(ImportFailure::Empty);
        }

        let filename = sanitize_file_name(&file.name);
        let ext = file_extension(&filename);
        if !is_extension_allowed(&ext) {
            return Err(ImportFailure::Type);
        }

        let bytes = file.bytes.ok_or(ImportFailure::Read)?;
        Ok((filename, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;

    const Q1_REPORT: &str =
        "<html><head><title>Q1 Report</title></head><body><p>Hello</p></body></html>";

    #[derive(Clone, Copy)]
    enum Behaviour {
        Store,
        ZeroId,
        Reject,
        Fail,
    }

    struct RecordingStore {
        behaviour: Behaviour,
        pages: Mutex<Vec<(String, String)>>,
    }

    impl RecordingStore {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                pages: Mutex::new(Vec::new()),
            })
        }

        fn pages(&self) -> Vec<(String, String)> {
            self.pages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageStore for RecordingStore {
        async fn create_page(&self, title: &str, content: &str) -> Result<i64, StoreError> {
            match self.behaviour {
                Behaviour::Store => {
                    let mut pages = self.pages.lock().unwrap();
                    pages.push((title.to_string(), content.to_string()));
                    Ok(pages.len() as i64)
                }
                Behaviour::ZeroId => Ok(0),
                Behaviour::Reject => Err(StoreError::Rejected("UNIQUE constraint failed".into())),
                Behaviour::Fail => Err(StoreError::Fatal(anyhow::anyhow!("connection lost"))),
            }
        }
    }

    fn importer(store: Arc<RecordingStore>) -> Importer {
        Importer::new(store)
    }

    // ========================================================================
    // Extraction
    // ========================================================================

    #[test]
    fn test_extract_title_and_body() {
        let doc = extract(Q1_REPORT.as_bytes(), "report.html");
        assert_eq!(doc.title, "Q1 Report");
        assert_eq!(doc.content, "<p>Hello</p>");
    }

    #[test]
    fn test_extract_without_title_or_body() {
        let raw = "Just some notes\nwithout markup";
        let doc = extract(raw.as_bytes(), "draft.htm");
        assert_eq!(doc.title, "draft");
        assert_eq!(doc.content, raw);
    }

    #[test]
    fn test_extract_without_filename_uses_default_label() {
        let doc = extract(b"<p>x</p>", "");
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.content, "<p>x</p>");
    }

    #[test]
    fn test_extract_is_case_insensitive_and_spans_lines() {
        let raw = "<HTML><TITLE>\n  Mixed <em>Case</em>\n</TITLE>\n<BODY class=\"x\" id='y'>\n<h1>Hi</h1>\n</BODY></HTML>";
        let doc = extract(raw.as_bytes(), "page.html");
        assert_eq!(doc.title, "Mixed Case");
        assert_eq!(doc.content, "<h1>Hi</h1>");
    }

    #[test]
    fn test_extract_uses_first_match_only() {
        let raw = "<title>First</title><title>Second</title><body>one</body><body>two</body>";
        let doc = extract(raw.as_bytes(), "x.html");
        assert_eq!(doc.title, "First");
        assert_eq!(doc.content, "one");
    }

    #[test]
    fn test_extract_empty_title_falls_back_to_filename() {
        let raw = "<title> <b></b> </title><body>text</body>";
        let doc = extract(raw.as_bytes(), "notes.v2.html");
        assert_eq!(doc.title, "notes.v2");
    }

    #[test]
    fn test_extract_empty_body_falls_back_to_raw() {
        let raw = "<title>T</title><body>   </body>";
        let doc = extract(raw.as_bytes(), "t.html");
        assert_eq!(doc.content, raw);
    }

    #[test]
    fn test_extract_title_attributes_are_not_matched() {
        // `<title>` must be bare; anything else is left to the fallback.
        let raw = "<title lang=\"en\">Ignored</title><body>b</body>";
        let doc = extract(raw.as_bytes(), "fallback.html");
        assert_eq!(doc.title, "fallback");
    }

    #[test]
    fn test_extract_replaces_invalid_utf8() {
        let raw = b"<title>Caf\xe9</title><body>ok</body>";
        let doc = extract(raw, "cafe.html");
        assert_eq!(doc.title, "Caf\u{FFFD}");
    }

    // ========================================================================
    // Import validation order
    // ========================================================================

    #[tokio::test]
    async fn test_import_success() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store.clone())
            .import(Some(UploadedFile::new("report.html", Q1_REPORT)), true, true)
            .await
            .unwrap();

        assert_eq!(result, ImportResult::Success { page_id: 1 });
        assert_eq!(
            store.pages(),
            vec![("Q1 Report".to_string(), "<p>Hello</p>".to_string())]
        );
    }

    #[tokio::test]
    async fn test_permission_checked_first() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store.clone()).import(None, false, false).await.unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Permission));
        assert!(store.pages().is_empty());
    }

    #[tokio::test]
    async fn test_nonce_checked_before_file() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store).import(None, true, false).await.unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Nonce));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store).import(None, true, true).await.unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Missing));
    }

    #[tokio::test]
    async fn test_upload_error() {
        let store = RecordingStore::new(Behaviour::Store);
        let file = UploadedFile {
            upload_error: Some("stream reset".into()),
            ..UploadedFile::new("a.html", "<p>x</p>")
        };
        let result = importer(store).import(Some(file), true, true).await.unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Upload));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store)
            .import(Some(UploadedFile::new("notes.txt", Vec::new())), true, true)
            .await
            .unwrap();
        // Size is checked before the extension.
        assert_eq!(result, ImportResult::Failure(ImportFailure::Empty));
    }

    #[tokio::test]
    async fn test_wrong_extension_rejected_before_extraction() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store.clone())
            .import(Some(UploadedFile::new("notes.txt", Q1_REPORT)), true, true)
            .await
            .unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Type));
        assert!(store.pages().is_empty());
    }

    #[test]
    fn test_allowed_extensions_are_fixed() {
        assert!(is_extension_allowed("html"));
        assert!(is_extension_allowed("HTM"));
        assert!(!is_extension_allowed("txt"));
        assert!(!is_extension_allowed("xhtml"));
        assert!(!is_extension_allowed(""));
    }

    #[tokio::test]
    async fn test_extension_is_case_insensitive() {
        let store = RecordingStore::new(Behaviour::Store);
        let result = importer(store)
            .import(Some(UploadedFile::new("REPORT.HTM", Q1_REPORT)), true, true)
            .await
            .unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_unreadable_bytes() {
        let store = RecordingStore::new(Behaviour::Store);
        let file = UploadedFile {
            name: "a.html".into(),
            bytes: None,
            size_bytes: 128,
            upload_error: None,
        };
        let result = importer(store).import(Some(file), true, true).await.unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Read));
    }

    #[tokio::test]
    async fn test_zero_id_is_insert_failure() {
        let store = RecordingStore::new(Behaviour::ZeroId);
        let result = importer(store)
            .import(Some(UploadedFile::new("a.html", Q1_REPORT)), true, true)
            .await
            .unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Insert));
    }

    #[tokio::test]
    async fn test_rejected_insert_is_insert_failure() {
        let store = RecordingStore::new(Behaviour::Reject);
        let result = importer(store)
            .import(Some(UploadedFile::new("a.html", Q1_REPORT)), true, true)
            .await
            .unwrap();
        assert_eq!(result, ImportResult::Failure(ImportFailure::Insert));
    }

    #[tokio::test]
    async fn test_fatal_store_error_propagates() {
        let store = RecordingStore::new(Behaviour::Fail);
        let err = importer(store)
            .import(Some(UploadedFile::new("a.html", Q1_REPORT)), true, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection lost"));
    }

    // ========================================================================
    // Sanitization before storage
    // ========================================================================

    #[tokio::test]
    async fn test_stored_content_is_sanitized() {
        let store = RecordingStore::new(Behaviour::Store);
        let raw = "<title>Safe\n  Title</title><body><p onclick=\"x()\">Hi</p><script>alert(1)</script></body>";
        importer(store.clone())
            .import(Some(UploadedFile::new("s.html", raw)), true, true)
            .await
            .unwrap();

        let (title, content) = store.pages().remove(0);
        assert_eq!(title, "Safe Title");
        assert_eq!(content, "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_title_uses_sanitized_filename() {
        let store = RecordingStore::new(Behaviour::Store);
        importer(store.clone())
            .import(Some(UploadedFile::new("../uploads/my draft.htm", "plain text")), true, true)
            .await
            .unwrap();

        let (title, content) = store.pages().remove(0);
        assert_eq!(title, "my-draft");
        assert_eq!(content, "plain text");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Non-empty input always yields a non-empty title and content.
        #[test]
        fn extraction_never_yields_empty_fields(
            raw in prop::collection::vec(any::<u8>(), 1..256),
            stem in "[a-z]{1,8}",
        ) {
            let doc = extract(&raw, &format!("{}.html", stem));
            prop_assert!(!doc.title.is_empty());
            prop_assert!(!doc.content.is_empty());
        }

        #[test]
        fn title_is_trimmed_inner_text(inner in "[A-Za-z0-9 ]{0,20}") {
            let raw = format!("<html><head><title>{}</title></head><body>b</body></html>", inner);
            let doc = extract(raw.as_bytes(), "page.html");
            let expected = if inner.trim().is_empty() { "page" } else { inner.trim() };
            prop_assert_eq!(doc.title, expected);
        }

        #[test]
        fn missing_body_keeps_raw_input(text in "[A-Za-z0-9 .,]{1,64}") {
            let doc = extract(text.as_bytes(), "plain.htm");
            prop_assert_eq!(doc.content, text);
        }

        /// Anything but .html/.htm is refused, whatever the content.
        #[test]
        fn foreign_extensions_are_refused(ext in "[a-z]{1,5}") {
            prop_assume!(ext != "html" && ext != "htm");
            let store = RecordingStore::new(Behaviour::Store);
            let file = UploadedFile::new(format!("page.{}", ext), Q1_REPORT);
            let result = tokio_test::block_on(importer(store.clone()).import(Some(file), true, true))
                .unwrap();
            prop_assert_eq!(result, ImportResult::Failure(ImportFailure::Type));
            prop_assert!(store.pages().is_empty());
        }
    }
}

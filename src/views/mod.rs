//! Server-rendered views
//!
//! Templates are compiled into the binary and rendered with Tera.
//! Autoescaping is on for every `.html` template, so only values piped
//! through `| safe` reach the output unescaped.

use anyhow::{Context, Result};
use serde::Serialize;
use tera::Tera;

use crate::models::Page;
use crate::services::Notice;

const IMPORT_TEMPLATE: &str = "import.html";
const PAGE_TEMPLATE: &str = "page.html";
const DENIED_TEMPLATE: &str = "denied.html";

/// Errors that can occur while rendering a view
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Template error: {0}")]
    TemplateError(String),
}

/// Everything the upload form needs
#[derive(Debug, Serialize)]
pub struct ImportFormView<'a> {
    pub action: &'a str,
    pub nonce: &'a str,
    pub nonce_field: &'a str,
    pub file_field: &'a str,
    pub accept: String,
    pub notice: Option<NoticeView>,
}

#[derive(Debug, Serialize)]
pub struct NoticeView {
    pub message: &'static str,
    pub css_class: &'static str,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            message: notice.message,
            css_class: notice.css_class(),
        }
    }
}

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("templates/base.html")),
            (IMPORT_TEMPLATE, include_str!("templates/import.html")),
            (PAGE_TEMPLATE, include_str!("templates/page.html")),
            (DENIED_TEMPLATE, include_str!("templates/denied.html")),
        ])
        .map_err(|e| ViewError::TemplateError(format!("Failed to add templates: {}", e)))?;

        Ok(Self { tera })
    }

    pub fn import_form(&self, view: &ImportFormView<'_>) -> Result<String> {
        self.render(IMPORT_TEMPLATE, view)
    }

    /// Render a stored page. Its content was sanitized on import and is
    /// emitted as-is.
    pub fn page(&self, page: &Page) -> Result<String> {
        self.render(PAGE_TEMPLATE, page)
    }

    pub fn denied(&self, message: &str) -> Result<String> {
        self.render(DENIED_TEMPLATE, &serde_json::json!({ "message": message }))
    }

    fn render(&self, name: &str, data: &impl Serialize) -> Result<String> {
        let context = tera::Context::from_serialize(data)
            .map_err(|e| ViewError::TemplateError(format!("Failed to build context: {}", e)))?;
        self.tera
            .render(name, &context)
            .map_err(|e| ViewError::TemplateError(format!("Failed to render {}: {:?}", name, e)))
            .with_context(|| format!("Rendering view {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{resolve_notice, NoticeStatus};

    fn form<'a>(notice: Option<NoticeView>) -> ImportFormView<'a> {
        ImportFormView {
            action: "/admin/import",
            nonce: "0123456789abcdef0123",
            nonce_field: "import_nonce",
            file_field: "html_file",
            accept: ".html,.htm".to_string(),
            notice,
        }
    }

    #[test]
    fn test_import_form_contains_fields() {
        let views = Views::new().unwrap();
        let html = views.import_form(&form(None)).unwrap();

        assert!(html.contains(r#"name="import_nonce""#));
        assert!(html.contains(r#"value="0123456789abcdef0123""#));
        assert!(html.contains(r#"name="html_file""#));
        assert!(html.contains(r#"accept=".html,.htm""#));
        assert!(html.contains(r#"enctype="multipart/form-data""#));
        assert!(!html.contains("notice-"));
    }

    #[test]
    fn test_import_form_renders_notice() {
        let views = Views::new().unwrap();
        let notice = resolve_notice(NoticeStatus::Error, "type").map(NoticeView::from);
        let html = views.import_form(&form(notice)).unwrap();

        assert!(html.contains("notice-error"));
        assert!(html.contains("Invalid file type. Please upload an .html or .htm file."));
    }

    #[test]
    fn test_page_escapes_title_but_not_content() {
        let views = Views::new().unwrap();
        let page = Page::new(
            "a-b".to_string(),
            "A & B".to_string(),
            "<p>Hello</p>".to_string(),
        );
        let html = views.page(&page).unwrap();

        assert!(html.contains("A &amp; B"));
        assert!(html.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_denied_escapes_message() {
        let views = Views::new().unwrap();
        let html = views.denied("<nope>").unwrap();
        assert!(html.contains("&lt;nope&gt;"));
    }
}

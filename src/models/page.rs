//! Page model: a published CMS page created from an imported HTML file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Draft,
    #[default]
    Published,
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for PageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(anyhow::anyhow!("Invalid page status: {}", s)),
        }
    }
}

/// Kind of content record. Imports only ever create `Page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Page,
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
        }
    }
}

impl std::str::FromStr for PageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "page" => Ok(Self::Page),
            _ => Err(anyhow::anyhow!("Invalid page type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub status: PageStatus,
    pub page_type: PageType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// A new, not yet stored, published page
    pub fn new(slug: String, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            slug,
            title,
            content,
            status: PageStatus::Published,
            page_type: PageType::Page,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_is_published_page() {
        let page = Page::new("q1".into(), "Q1".into(), "<p>x</p>".into());
        assert_eq!(page.id, 0);
        assert_eq!(page.status, PageStatus::Published);
        assert_eq!(page.page_type, PageType::Page);
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!("PUBLISHED".parse::<PageStatus>().unwrap(), PageStatus::Published);
        assert_eq!(PageStatus::Draft.to_string(), "draft");
        assert!("archived".parse::<PageStatus>().is_err());
    }

    #[test]
    fn test_page_serializes_lowercase_enums() {
        let page = Page::new("a".into(), "A".into(), "b".into());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["status"], "published");
        assert_eq!(json["page_type"], "page");
    }
}

//! Page service

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::repositories::PageRepository;
use crate::models::{Page, PageStatus};
use crate::services::importer::{PageStore, StoreError};

/// Longest slug stored, in characters
const MAX_SLUG_CHARS: usize = 200;

pub struct PageService {
    repo: Arc<dyn PageRepository>,
}

impl PageService {
    pub fn new(repo: Arc<dyn PageRepository>) -> Self {
        Self { repo }
    }

    /// Create a published page with a slug derived from its title.
    ///
    /// The slug is picked before the insert, so a concurrent import with the
    /// same title can take it first. That unique violation is retried once
    /// with a fresh slug.
    pub async fn create_published(&self, title: &str, content: &str) -> Result<Page> {
        let slug = self.unique_slug(title).await?;
        let page = Page::new(slug, title.to_string(), content.to_string());

        let created = self.repo.create(&page).await;
        match created {
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(slug = %page.slug, "Slug taken by a concurrent insert, retrying");
                let retry = Page {
                    slug: self.unique_slug(title).await?,
                    ..page
                };
                self.repo.create(&retry).await
            }
            result => result,
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        self.repo.get_by_id(id).await
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let page = self.repo.get_by_slug(slug).await?;
        Ok(page.filter(|p| p.status == PageStatus::Published))
    }

    pub async fn list(&self) -> Result<Vec<Page>> {
        self.repo.list().await
    }

    /// First free slug among `base`, `base-2`, `base-3`, ...
    async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = generate_slug(title);
        if !self.repo.exists_by_slug(&base).await? {
            return Ok(base);
        }

        let mut n = 2u32;
        loop {
            let candidate = with_suffix(&base, n);
            if !self.repo.exists_by_slug(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[async_trait]
impl PageStore for PageService {
    async fn create_page(&self, title: &str, content: &str) -> Result<i64, StoreError> {
        match self.create_published(title, content).await {
            Ok(page) => Ok(page.id),
            Err(e) => Err(classify_store_error(e)),
        }
    }
}

/// `base-n`, shortening `base` so the result stays within the slug limit
fn with_suffix(base: &str, n: u32) -> String {
    let suffix = format!("-{}", n);
    let keep = MAX_SLUG_CHARS.saturating_sub(suffix.len());
    let head: String = base.chars().take(keep).collect();
    format!("{}{}", head.trim_end_matches('-'), suffix)
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    )
}

/// Constraint violations and other database-side refusals are rejections;
/// anything else (pool closed, I/O, protocol) is fatal.
fn classify_store_error(e: anyhow::Error) -> StoreError {
    match e.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => StoreError::Rejected(db_err.message().to_string()),
        _ => StoreError::Fatal(e),
    }
}

/// Generate a URL slug from a page title.
///
/// Lower-cases, keeps ASCII alphanumerics and non-ASCII letters, turns
/// everything else into single hyphens and trims hyphens from both ends.
/// Falls back to `page` when nothing usable remains.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::new();
    let mut prev_hyphen = true;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric()) {
            slug.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    let slug: String = slug.trim_end_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

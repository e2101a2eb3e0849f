//! Hugging Face Hub content source.
//!
//! Endpoints used:
//! - `/api/daily_papers?limit=N`
//! - `/api/{models,datasets,spaces}?sort=lastModified&direction=-1&limit=N`
//!
//! Raw records are lenient: every field is optional, and missing values fall
//! back to what the Hub's own pages would show (name from the repo id, author
//! from its namespace, URL from the id).

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{FeedError, FeedResult};
use crate::types::{ContentItem, ContentKind};

use super::{ContentSource, SourceFuture};

pub const HF_API_BASE: &str = "https://huggingface.co";

pub struct HfSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HfSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: HF_API_BASE.into(),
            token: None,
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    fn endpoint(&self, kind: ContentKind, limit: usize) -> String {
        let base = self.base_url.trim_end_matches('/');
        match kind {
            ContentKind::Paper => format!("{base}/api/daily_papers?limit={limit}"),
            ContentKind::Model => {
                format!("{base}/api/models?sort=lastModified&direction=-1&limit={limit}")
            }
            ContentKind::Dataset => {
                format!("{base}/api/datasets?sort=lastModified&direction=-1&limit={limit}")
            }
            ContentKind::Space => {
                format!("{base}/api/spaces?sort=lastModified&direction=-1&limit={limit}")
            }
        }
    }

    async fn get_json(&self, url: &str) -> FeedResult<Vec<Value>> {
        let mut request = self
            .client
            .get(url)
            .header("content-type", "application/json")
            .header("accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Source(format!("Hub returned {status}: {body}")));
        }
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn latest(&self, kind: ContentKind, limit: usize) -> FeedResult<Vec<ContentItem>> {
        let url = self.endpoint(kind, limit);
        debug!(%kind, limit, "fetching from hub");
        let records = self.get_json(&url).await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            match map_record(kind, record, &self.base_url) {
                Ok(item) => items.push(item),
                Err(e) => debug!(%kind, error = %e, "skipping malformed hub record"),
            }
        }
        Ok(items)
    }
}

impl Default for HfSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSource for HfSource {
    fn fetch_latest(&self, kind: ContentKind, limit: usize) -> SourceFuture<'_, Vec<ContentItem>> {
        Box::pin(self.latest(kind, limit))
    }
}

// ─── Raw records ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPaper {
    id: Option<String>,
    title: Option<String>,
    /// Plain names or `{ "name": ... }` objects.
    authors: Vec<Value>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    summary: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at_camel: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
    url: Option<String>,
    tags: Vec<String>,
}

/// Shape shared by models, datasets and spaces.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRepo {
    #[serde(rename = "_id")]
    object_id: Option<String>,
    id: Option<String>,
    name: Option<String>,
    author: Option<String>,
    description: Option<String>,
    downloads: Option<u64>,
    likes: Option<u64>,
    tags: Vec<String>,
    #[serde(rename = "lastModified")]
    last_modified: Option<DateTime<Utc>>,
}

fn fallback_id(kind: ContentKind) -> String {
    format!("{kind}-{}", Uuid::new_v4().simple())
}

fn author_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn map_paper(raw: RawPaper, base: &str) -> ContentItem {
    let id = raw.id.clone().unwrap_or_else(|| fallback_id(ContentKind::Paper));
    let url = raw
        .url
        .unwrap_or_else(|| format!("{base}/papers/{}", raw.id.as_deref().unwrap_or_default()));
    let updated_at = raw
        .published_at_camel
        .or(raw.published_at)
        .unwrap_or_else(Utc::now);

    ContentItem::new(ContentKind::Paper, id, raw.title.unwrap_or_default())
        .with_authors(raw.authors.iter().filter_map(author_name))
        .with_description(raw.abstract_text.or(raw.summary).unwrap_or_default())
        .with_tags(raw.tags)
        .with_url(url)
        .with_updated_at(updated_at)
}

fn map_repo(kind: ContentKind, raw: RawRepo, base: &str) -> ContentItem {
    let repo_id = raw.id.unwrap_or_default();
    let id = raw.object_id.unwrap_or_else(|| fallback_id(kind));
    let namespace = repo_id.split('/').next().unwrap_or_default().to_string();

    // Models display the bare repo name; datasets and spaces keep `owner/name`.
    let title = match kind {
        ContentKind::Model => raw
            .name
            .unwrap_or_else(|| repo_id.rsplit('/').next().unwrap_or_default().to_string()),
        _ => repo_id.clone(),
    };
    let url = match kind {
        ContentKind::Dataset => format!("{base}/datasets/{repo_id}"),
        ContentKind::Space => format!("{base}/spaces/{repo_id}"),
        _ => format!("{base}/{repo_id}"),
    };

    let mut item = ContentItem::new(kind, id, title)
        .with_authors([raw.author.unwrap_or(namespace)])
        .with_description(raw.description.unwrap_or_default())
        .with_tags(raw.tags)
        .with_url(url)
        .with_updated_at(raw.last_modified.unwrap_or_else(Utc::now))
        .with_likes(raw.likes.unwrap_or(0));
    if kind != ContentKind::Space {
        item = item.with_downloads(raw.downloads.unwrap_or(0));
    }
    item
}

fn map_record(kind: ContentKind, record: Value, base: &str) -> FeedResult<ContentItem> {
    let base = base.trim_end_matches('/');
    Ok(match kind {
        ContentKind::Paper => map_paper(serde_json::from_value(record)?, base),
        _ => map_repo(kind, serde_json::from_value(record)?, base),
    })
}

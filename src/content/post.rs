//! Post, Category and Tag models as served by microCMS

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cover image of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eyecatch {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A reference to another content item (category or tag) embedded in a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
}

/// A blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,

    /// Post title
    pub title: String,

    /// Rendered HTML body
    pub content: String,

    /// Cover image
    #[serde(default)]
    pub eyecatch: Option<Eyecatch>,

    /// Published posts always carry a category
    pub category: Reference,

    #[serde(default)]
    pub tags: Vec<Reference>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Missing on drafts
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_at: Option<DateTime<Utc>>,

    /// Custom API fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    /// Date shown in listings
    pub fn display_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// A category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_at: Option<DateTime<Utc>>,
}

/// A tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_at: Option<DateTime<Utc>>,
}

/// The list envelope returned by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub contents: Vec<T>,
    /// Total matching items upstream, not the length of `contents`
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
}

//! Denormalized composite views produced by the aggregation joins.
//!
//! Views deserialize straight from pipeline output. Joined fields default to
//! absent/empty so that dangling weak references surface as an omission in
//! the view, never as a deserialization failure.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::entities::{CategoryRecord, CommentRecord, TagRecord};
use crate::domain::types::EntityId;

/// Display stand-in for an author whose user document no longer exists.
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Author fields surfaced by joins; credential material is not carried into
/// views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorView {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub email: String,
    pub name: String,
}

/// One article with every relation resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_modified: Option<OffsetDateTime>,
    #[serde(default)]
    pub author: Option<AuthorView>,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

impl ArticleView {
    pub fn author_display(&self) -> &str {
        self.author
            .as_ref()
            .map(|author| author.name.as_str())
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|category| category.name.as_str())
            .collect()
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.name.as_str()).collect()
    }
}

/// One comment with its author resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub article_id: EntityId,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default)]
    pub author: Option<AuthorView>,
}

impl CommentView {
    pub fn author_display(&self) -> &str {
        self.author
            .as_ref()
            .map(|author| author.name.as_str())
            .unwrap_or(UNKNOWN_AUTHOR)
    }
}

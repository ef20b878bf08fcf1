//! Entity records mirrored from the document store.
//!
//! Documents are schema-on-read; records declare the fields this console
//! relies on and ignore anything else a collection may carry. Cross-entity
//! ids (`author_id`, `category_ids`, `tag_ids`, `article_id`) are weak
//! references: the referent may be deleted after the id is stored, and
//! nothing here enforces its existence.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::credentials;
use crate::domain::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub email: String,
    pub name: String,
    pub password_digest: String,
}

/// Insert payload for `users`; the store assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct UserDraft {
    pub email: String,
    pub name: String,
    pub password_digest: String,
}

impl UserDraft {
    /// The plaintext password is digested here and never stored.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password: &str,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password_digest: credentials::digest_password(password),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDraft {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagDraft {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<OffsetDateTime>,
    pub author_id: EntityId,
    #[serde(default)]
    pub category_ids: Vec<EntityId>,
    #[serde(default)]
    pub tag_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub article_id: EntityId,
    pub author_id: EntityId,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

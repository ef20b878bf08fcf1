//! Composite article views and article-level CRUD.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::entity_store::EntityStore;
use crate::application::store::{
    DocumentStore, Filter, ID_FIELD, Lookup, PipelineStage, StoreError, collection, from_document,
    to_document,
};
use crate::domain::entities::{ArticleRecord, UserRecord};
use crate::domain::types::EntityId;
use crate::domain::views::ArticleView;

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("required field `{field}` is empty")]
    MissingField { field: &'static str },
    #[error("author `{key}` does not resolve to a known user")]
    UnknownAuthor { key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Mutable article fields as sent by the console forms.
///
/// Updates replace all of these fields at once; callers resend unchanged
/// values. `author_key` is the authoring user's email, resolved against the
/// user store's key index.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub title: String,
    pub text: String,
    pub author_key: String,
    pub category_ids: Vec<EntityId>,
    pub tag_ids: Vec<EntityId>,
}

#[derive(Serialize)]
struct NewArticle<'a> {
    title: &'a str,
    text: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    author_id: EntityId,
    category_ids: &'a [EntityId],
    tag_ids: &'a [EntityId],
}

#[derive(Serialize)]
struct ReplaceArticle<'a> {
    title: &'a str,
    text: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    last_modified: OffsetDateTime,
    author_id: EntityId,
    category_ids: &'a [EntityId],
    tag_ids: &'a [EntityId],
}

/// Joins articles with their relations and owns article-level CRUD.
pub struct ArticleService {
    store: Arc<dyn DocumentStore>,
    users: Arc<EntityStore<UserRecord>>,
}

impl ArticleService {
    pub fn new(store: Arc<dyn DocumentStore>, users: Arc<EntityStore<UserRecord>>) -> Self {
        Self { store, users }
    }

    /// Resolve every article into a composite view, optionally filtered.
    ///
    /// Joins run before the filter so the term can match resolved names.
    /// Dangling category/tag ids drop out of the joined lists silently; a
    /// dangling author id leaves the author absent and the view renders the
    /// unknown placeholder. An empty or whitespace term returns everything.
    /// Result order follows the store's natural order.
    pub async fn list_composite(&self, search_term: &str) -> Result<Vec<ArticleView>, ArticleError> {
        let mut pipeline = vec![
            PipelineStage::Lookup(Lookup {
                from: collection::USERS,
                local_field: "author_id",
                foreign_field: ID_FIELD,
                as_field: "author",
            }),
            PipelineStage::Lookup(Lookup {
                from: collection::CATEGORIES,
                local_field: "category_ids",
                foreign_field: ID_FIELD,
                as_field: "categories",
            }),
            PipelineStage::Lookup(Lookup {
                from: collection::TAGS,
                local_field: "tag_ids",
                foreign_field: ID_FIELD,
                as_field: "tags",
            }),
            PipelineStage::Lookup(Lookup {
                from: collection::COMMENTS,
                local_field: ID_FIELD,
                foreign_field: "article_id",
                as_field: "comments",
            }),
            PipelineStage::UnwindFirst { path: "author" },
        ];

        let term = search_term.trim();
        if !term.is_empty() {
            pipeline.push(PipelineStage::MatchAnyContains {
                fields: vec!["title", "text", "author.name", "categories.name", "tags.name"],
                term: term.to_string(),
            });
        }

        let documents = self.store.aggregate(collection::ARTICLES, &pipeline).await?;
        counter!("sobremesa_composite_scan_total").increment(1);
        debug!(results = documents.len(), term, "composite article scan");

        documents
            .into_iter()
            .map(|document| {
                from_document(collection::ARTICLES, document).map_err(ArticleError::from)
            })
            .collect()
    }

    /// Single article fetch, e.g. to prefill an edit form.
    pub async fn find_article(&self, id: EntityId) -> Result<Option<ArticleRecord>, ArticleError> {
        let filter = Filter::field(ID_FIELD, id.to_string());
        let documents = self
            .store
            .find(collection::ARTICLES, &filter, None)
            .await?;
        documents
            .into_iter()
            .next()
            .map(|document| {
                from_document(collection::ARTICLES, document).map_err(ArticleError::from)
            })
            .transpose()
    }

    /// Validate and insert; `date` is stamped with the creation time.
    pub async fn create_article(&self, draft: &ArticleDraft) -> Result<EntityId, ArticleError> {
        let author_id = self.validate(draft)?;
        let document = to_document(&NewArticle {
            title: draft.title.trim(),
            text: draft.text.trim(),
            date: OffsetDateTime::now_utc(),
            author_id,
            category_ids: &draft.category_ids,
            tag_ids: &draft.tag_ids,
        })?;
        Ok(self.store.insert_one(collection::ARTICLES, document).await?)
    }

    /// Validate and replace every mutable field, stamping `last_modified`.
    ///
    /// Returns the modified count; 0 means the id matched nothing or the
    /// replacement changed nothing.
    pub async fn update_article(
        &self,
        id: EntityId,
        draft: &ArticleDraft,
    ) -> Result<u64, ArticleError> {
        let author_id = self.validate(draft)?;
        let patch = to_document(&ReplaceArticle {
            title: draft.title.trim(),
            text: draft.text.trim(),
            last_modified: OffsetDateTime::now_utc(),
            author_id,
            category_ids: &draft.category_ids,
            tag_ids: &draft.tag_ids,
        })?;
        Ok(self
            .store
            .update_one(collection::ARTICLES, id, patch)
            .await?)
    }

    /// Delete by id; reports whether a document was actually removed.
    /// Comments referencing the article are left in place (weak references,
    /// no cascade).
    pub async fn delete_article(&self, id: EntityId) -> Result<bool, ArticleError> {
        let deleted = self.store.delete_one(collection::ARTICLES, id).await?;
        Ok(deleted > 0)
    }

    /// Rejects before any store write: title, text and author key must be
    /// non-empty, and the author key must resolve in the user index.
    fn validate(&self, draft: &ArticleDraft) -> Result<EntityId, ArticleError> {
        if draft.title.trim().is_empty() {
            return Err(ArticleError::MissingField { field: "title" });
        }
        if draft.text.trim().is_empty() {
            return Err(ArticleError::MissingField { field: "text" });
        }
        let author_key = draft.author_key.trim();
        if author_key.is_empty() {
            return Err(ArticleError::MissingField { field: "author" });
        }
        self.users
            .resolve_id(author_key)
            .ok_or_else(|| ArticleError::UnknownAuthor {
                key: author_key.to_string(),
            })
    }
}

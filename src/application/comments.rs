//! Comment threads scoped to a single article.
//!
//! Comments have no key index; they are read fresh on every call, scoped by
//! article id, and built straight on the store adapter.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::store::{
    DocumentStore, ID_FIELD, Lookup, PipelineStage, StoreError, collection, from_document,
    to_document,
};
use crate::domain::types::EntityId;
use crate::domain::views::CommentView;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment text is empty")]
    EmptyText,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct NewComment<'a> {
    article_id: EntityId,
    author_id: EntityId,
    text: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
}

pub struct CommentService {
    store: Arc<dyn DocumentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All comments on the article, authors joined one-to-one (dangling
    /// author ids render the unknown placeholder), sorted by `date`
    /// ascending. The store's natural order is not trusted for
    /// chronology, so the sort is imposed here.
    pub async fn list_for_article(
        &self,
        article_id: EntityId,
    ) -> Result<Vec<CommentView>, CommentError> {
        let pipeline = [
            PipelineStage::MatchEq {
                field: "article_id",
                value: Value::String(article_id.to_string()),
            },
            PipelineStage::Lookup(Lookup {
                from: collection::USERS,
                local_field: "author_id",
                foreign_field: ID_FIELD,
                as_field: "author",
            }),
            PipelineStage::UnwindFirst { path: "author" },
        ];

        let documents = self.store.aggregate(collection::COMMENTS, &pipeline).await?;
        let mut views = documents
            .into_iter()
            .map(|document| {
                from_document::<CommentView>(collection::COMMENTS, document)
                    .map_err(CommentError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        views.sort_by_key(|view| view.date);
        Ok(views)
    }

    /// Insert a comment stamped with the current time. The article and
    /// author ids are stored as weak references; only the text is
    /// validated.
    pub async fn create(
        &self,
        article_id: EntityId,
        author_id: EntityId,
        text: &str,
    ) -> Result<EntityId, CommentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CommentError::EmptyText);
        }
        let document = to_document(&NewComment {
            article_id,
            author_id,
            text,
            date: OffsetDateTime::now_utc(),
        })?;
        Ok(self.store.insert_one(collection::COMMENTS, document).await?)
    }
}

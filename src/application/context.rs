//! Console context: one explicit object owning every store and service.
//!
//! Replaces module-level singleton managers; tests construct their own
//! context against whatever `DocumentStore` they need.

use std::sync::Arc;

use thiserror::Error;

use crate::application::articles::ArticleService;
use crate::application::comments::CommentService;
use crate::application::entity_store::EntityStore;
use crate::application::store::{DocumentStore, StoreError};
use crate::domain::entities::{CategoryRecord, TagRecord, UserRecord};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("store connection check failed: {0}")]
    Ping(#[source] StoreError),
}

pub struct Console {
    users: Arc<EntityStore<UserRecord>>,
    categories: Arc<EntityStore<CategoryRecord>>,
    tags: Arc<EntityStore<TagRecord>>,
    articles: ArticleService,
    comments: CommentService,
}

impl Console {
    /// Connect to the store and warm the key indexes.
    ///
    /// An unreachable store at startup is the only fatal failure. Warm
    /// failures leave that index empty until the next reload and are logged
    /// inside `load_index`.
    pub async fn connect(store: Arc<dyn DocumentStore>) -> Result<Self, ConnectError> {
        store.ping().await.map_err(ConnectError::Ping)?;

        let users = Arc::new(EntityStore::new(store.clone()));
        let categories = Arc::new(EntityStore::new(store.clone()));
        let tags = Arc::new(EntityStore::new(store.clone()));
        let articles = ArticleService::new(store.clone(), users.clone());
        let comments = CommentService::new(store);

        let console = Self {
            users,
            categories,
            tags,
            articles,
            comments,
        };
        console.warm_indexes().await;
        Ok(console)
    }

    async fn warm_indexes(&self) {
        let _ = self.users.load_index().await;
        let _ = self.categories.load_index().await;
        let _ = self.tags.load_index().await;
    }

    pub fn users(&self) -> &EntityStore<UserRecord> {
        &self.users
    }

    pub fn categories(&self) -> &EntityStore<CategoryRecord> {
        &self.categories
    }

    pub fn tags(&self) -> &EntityStore<TagRecord> {
        &self.tags
    }

    pub fn articles(&self) -> &ArticleService {
        &self.articles
    }

    pub fn comments(&self) -> &CommentService {
        &self.comments
    }
}

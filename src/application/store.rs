//! Store-adapter trait describing the document persistence surface.
//!
//! The concrete driver (connection lifecycle, wire protocol) is an external
//! collaborator; this crate consumes only the operations below. Calls are
//! issued one at a time per the console's single-actor model: no retries, no
//! timeouts, no cancellation.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::types::EntityId;

/// Schema-on-read document as stored in a collection.
pub type Document = serde_json::Map<String, Value>;

/// Field carrying the store-generated identifier.
pub const ID_FIELD: &str = "_id";

/// Logical collection names consumed by the console.
pub mod collection {
    pub const USERS: &str = "users";
    pub const CATEGORIES: &str = "categories";
    pub const TAGS: &str = "tags";
    pub const ARTICLES: &str = "articles";
    pub const COMMENTS: &str = "comments";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {message}")]
    Unreachable { message: String },
    #[error("persistence error: {message}")]
    Persistence { message: String },
    #[error("malformed document in `{collection}`: {message}")]
    Malformed {
        collection: String,
        message: String,
    },
}

impl StoreError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            message: err.to_string(),
        }
    }

    pub fn malformed(collection: &str, err: impl std::fmt::Display) -> Self {
        Self::Malformed {
            collection: collection.to_string(),
            message: err.to_string(),
        }
    }
}

/// Top-level equality filter; an empty filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            clauses: vec![(name.into(), value.into())],
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

/// Left-outer join against another collection.
///
/// When the local field holds an array, every element participates in the
/// join; swapping `local_field`/`foreign_field` around the id gives the
/// reverse (one-to-many) form used for comments.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub from: &'static str,
    pub local_field: &'static str,
    pub foreign_field: &'static str,
    pub as_field: &'static str,
}

/// One stage of an aggregation pipeline, applied in order.
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Lookup(Lookup),
    /// Collapse a joined array to its first element, dropping the field
    /// entirely when the array is empty.
    UnwindFirst { path: &'static str },
    /// Keep documents whose field equals the value.
    MatchEq { field: &'static str, value: Value },
    /// Keep documents where any of the (possibly nested, possibly
    /// array-valued) field paths contains the term, case-insensitively.
    MatchAnyContains {
        fields: Vec<&'static str>,
        term: String,
    },
}

/// Minimal persistence surface consumed by the console core.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap reachability probe used once at startup.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Equality find with optional field projection, in the store's natural
    /// order.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert a document, returning the store-generated id.
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<EntityId, StoreError>;

    /// Set-merge the given fields into the document with this id. Returns
    /// the modified count: 0 means not found or no effective change, and
    /// callers must treat it as "nothing happened" rather than an error.
    async fn update_one(
        &self,
        collection: &str,
        id: EntityId,
        set: Document,
    ) -> Result<u64, StoreError>;

    /// Delete by id, returning the deleted count.
    async fn delete_one(&self, collection: &str, id: EntityId) -> Result<u64, StoreError>;

    /// Run a multi-stage join/filter pipeline.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[PipelineStage],
    ) -> Result<Vec<Document>, StoreError>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value).map_err(StoreError::from_persistence)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::from_persistence(format!(
            "expected a document, serialized to {other:?}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(
    collection: &str,
    document: Document,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|err| StoreError::malformed(collection, err))
}

//! Generic CRUD over one collection plus a cached key→id index.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::store::{
    DocumentStore, Document, Filter, ID_FIELD, StoreError, collection, from_document, to_document,
};
use crate::domain::entities::{
    CategoryDraft, CategoryRecord, TagDraft, TagRecord, UserDraft, UserRecord,
};
use crate::domain::types::EntityId;

/// A record kind managed by an [`EntityStore`].
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Insert payload; the store assigns `_id`.
    type Draft: Serialize + Send + Sync;

    const COLLECTION: &'static str;
    /// Human-meaningful field indexed for reverse lookup.
    const KEY_FIELD: &'static str;
}

impl Entity for UserRecord {
    type Draft = UserDraft;

    const COLLECTION: &'static str = collection::USERS;
    const KEY_FIELD: &'static str = "email";
}

impl Entity for CategoryRecord {
    type Draft = CategoryDraft;

    const COLLECTION: &'static str = collection::CATEGORIES;
    const KEY_FIELD: &'static str = "name";
}

impl Entity for TagRecord {
    type Draft = TagDraft;

    const COLLECTION: &'static str = collection::TAGS;
    const KEY_FIELD: &'static str = "name";
}

/// Derived key→id mapping over one collection.
///
/// Consistency contract: single writer per process, rebuilt by full
/// replacement (never merged) after every successful mutation, last-write-
/// wins on duplicate keys, no expiry, no size bound. Holds nothing that is
/// not recoverable from the backing collection, and goes stale if another
/// process mutates that collection.
#[derive(Debug, Default)]
struct KeyIndex {
    entries: RwLock<HashMap<String, EntityId>>,
}

impl KeyIndex {
    fn replace(&self, entries: HashMap<String, EntityId>) {
        *self.entries.write().expect("key index lock poisoned") = entries;
    }

    fn resolve(&self, key: &str) -> Option<EntityId> {
        self.entries
            .read()
            .expect("key index lock poisoned")
            .get(key)
            .copied()
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("key index lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

/// Generic CRUD over one collection, owning that collection's key index for
/// the lifetime of the store instance.
pub struct EntityStore<E: Entity> {
    store: Arc<dyn DocumentStore>,
    index: KeyIndex,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityStore<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            index: KeyIndex::default(),
            _entity: PhantomData,
        }
    }

    /// Rebuild the key index from an `{_id, key}` projection scan.
    ///
    /// The previous mapping is replaced atomically on success and kept
    /// untouched on failure (stale-but-available). Documents missing either
    /// projected field are skipped.
    pub async fn load_index(&self) -> Result<(), StoreError> {
        let projection = [ID_FIELD, E::KEY_FIELD];
        match self
            .store
            .find(E::COLLECTION, &Filter::all(), Some(&projection))
            .await
        {
            Ok(documents) => {
                let mut entries = HashMap::with_capacity(documents.len());
                for document in documents {
                    let Some(id) = document
                        .get(ID_FIELD)
                        .cloned()
                        .and_then(|value| serde_json::from_value::<EntityId>(value).ok())
                    else {
                        continue;
                    };
                    let Some(key) = document.get(E::KEY_FIELD).and_then(Value::as_str) else {
                        continue;
                    };
                    entries.insert(key.to_owned(), id);
                }
                debug!(
                    collection = E::COLLECTION,
                    entries = entries.len(),
                    "key index reloaded"
                );
                counter!("sobremesa_index_reload_total", "collection" => E::COLLECTION)
                    .increment(1);
                self.index.replace(entries);
                Ok(())
            }
            Err(err) => {
                warn!(
                    collection = E::COLLECTION,
                    error = %err,
                    "key index reload failed, keeping previous mapping"
                );
                Err(err)
            }
        }
    }

    /// Key values currently cached, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.index.keys()
    }

    /// Pure cache lookup; no store round-trip.
    pub fn resolve_id(&self, key: &str) -> Option<EntityId> {
        self.index.resolve(key)
    }

    /// Full documents, straight from the store (bypasses the cache).
    pub async fn list_all(&self) -> Result<Vec<E>, StoreError> {
        let documents = self.store.find(E::COLLECTION, &Filter::all(), None).await?;
        documents
            .into_iter()
            .map(|document| from_document(E::COLLECTION, document))
            .collect()
    }

    /// Direct store read by key value; first match in natural order.
    pub async fn find_by_key(&self, key: &str) -> Result<Option<E>, StoreError> {
        let filter = Filter::field(E::KEY_FIELD, key);
        let documents = self.store.find(E::COLLECTION, &filter, None).await?;
        documents
            .into_iter()
            .next()
            .map(|document| from_document(E::COLLECTION, document))
            .transpose()
    }

    pub async fn create_one(&self, draft: &E::Draft) -> Result<EntityId, StoreError> {
        let document = to_document(draft)?;
        let id = self.store.insert_one(E::COLLECTION, document).await?;
        self.reload_after_write().await;
        Ok(id)
    }

    /// Set-merge `patch` into the document; unspecified fields stay as they
    /// are. Returns the modified count, where 0 means not found or no
    /// effective change.
    pub async fn update_one(&self, id: EntityId, patch: Document) -> Result<u64, StoreError> {
        let modified = self.store.update_one(E::COLLECTION, id, patch).await?;
        self.reload_after_write().await;
        Ok(modified)
    }

    pub async fn delete_one(&self, id: EntityId) -> Result<u64, StoreError> {
        let deleted = self.store.delete_one(E::COLLECTION, id).await?;
        self.reload_after_write().await;
        Ok(deleted)
    }

    /// Reload-on-write: the index is fully rebuilt after every mutation,
    /// never patched incrementally. The mutation already succeeded, so a
    /// failed reload is only logged (by `load_index`) and leaves the
    /// previous mapping serving lookups.
    async fn reload_after_write(&self) {
        let _ = self.load_index().await;
    }
}

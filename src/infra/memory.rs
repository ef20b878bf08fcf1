//! In-memory document store backend.
//!
//! Backs tests and embedded deployments. Collections preserve insertion
//! order; that order is the "natural order" surfaced by `find` and
//! `aggregate`.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::application::store::{
    Document, DocumentStore, Filter, ID_FIELD, Lookup, PipelineStage, StoreError,
};
use crate::domain::types::EntityId;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn apply_lookup(&self, documents: Vec<Document>, lookup: &Lookup) -> Vec<Document> {
        let foreign = self.snapshot(lookup.from);
        documents
            .into_iter()
            .map(|mut document| {
                let keys: Vec<Value> = match document.get(lookup.local_field).cloned() {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => vec![other],
                };
                let joined: Vec<Value> = foreign
                    .iter()
                    .filter(|candidate| {
                        candidate
                            .get(lookup.foreign_field)
                            .is_some_and(|foreign_value| {
                                keys.iter().any(|key| key == foreign_value)
                            })
                    })
                    .map(|candidate| Value::Object(candidate.clone()))
                    .collect();
                document.insert(lookup.as_field.to_string(), Value::Array(joined));
                document
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>, StoreError> {
        let documents = self.snapshot(collection);
        Ok(documents
            .into_iter()
            .filter(|document| filter.matches(document))
            .map(|document| match projection {
                Some(fields) => project(&document, fields),
                None => document,
            })
            .collect())
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<EntityId, StoreError> {
        let id = EntityId::generate();
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: EntityId,
        set: Document,
    ) -> Result<u64, StoreError> {
        let Some(mut documents) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let id_value = Value::String(id.to_string());
        let Some(document) = documents
            .iter_mut()
            .find(|document| document.get(ID_FIELD) == Some(&id_value))
        else {
            return Ok(0);
        };
        let mut modified = false;
        for (field, value) in set {
            if document.get(&field) != Some(&value) {
                document.insert(field, value);
                modified = true;
            }
        }
        Ok(u64::from(modified))
    }

    async fn delete_one(&self, collection: &str, id: EntityId) -> Result<u64, StoreError> {
        let Some(mut documents) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let id_value = Value::String(id.to_string());
        let before = documents.len();
        documents.retain(|document| document.get(ID_FIELD) != Some(&id_value));
        Ok((before - documents.len()) as u64)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[PipelineStage],
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = self.snapshot(collection);
        for stage in pipeline {
            documents = match stage {
                PipelineStage::Lookup(lookup) => self.apply_lookup(documents, lookup),
                PipelineStage::UnwindFirst { path } => unwind_first(documents, path),
                PipelineStage::MatchEq { field, value } => documents
                    .into_iter()
                    .filter(|document| document.get(*field) == Some(value))
                    .collect(),
                PipelineStage::MatchAnyContains { fields, term } => {
                    let needle = term.to_lowercase();
                    documents
                        .into_iter()
                        .filter(|document| {
                            fields.iter().any(|path| contains_term(document, path, &needle))
                        })
                        .collect()
                }
            };
        }
        Ok(documents)
    }
}

fn project(document: &Document, fields: &[&str]) -> Document {
    let mut projected = Document::new();
    for field in fields {
        if let Some(value) = document.get(*field) {
            projected.insert((*field).to_string(), value.clone());
        }
    }
    projected
}

fn unwind_first(documents: Vec<Document>, path: &str) -> Vec<Document> {
    documents
        .into_iter()
        .map(|mut document| {
            match document.remove(path) {
                Some(Value::Array(items)) => {
                    // Empty arrays leave the field absent (the document
                    // itself is preserved).
                    if let Some(first) = items.into_iter().next() {
                        document.insert(path.to_string(), first);
                    }
                }
                Some(other) => {
                    document.insert(path.to_string(), other);
                }
                None => {}
            }
            document
        })
        .collect()
}

fn contains_term(document: &Document, path: &str, needle: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((head, rest)) = segments.split_first() else {
        return false;
    };
    let Some(root) = document.get(*head) else {
        return false;
    };
    let mut values = Vec::new();
    collect_path(root, rest, &mut values);
    values
        .iter()
        .any(|value| value.as_str().is_some_and(|text| text.to_lowercase().contains(needle)))
}

/// Walk a dotted path, fanning out over arrays at any depth.
fn collect_path<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    if let Value::Array(items) = value {
        for item in items {
            collect_path(item, segments, out);
        }
        return;
    }
    match segments.split_first() {
        None => out.push(value),
        Some((head, rest)) => {
            if let Value::Object(map) = value {
                if let Some(next) = map.get(*head) {
                    collect_path(next, rest, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Document {
        let Value::Object(map) = value else {
            panic!("literal is not an object");
        };
        map
    }

    #[tokio::test]
    async fn lookup_joins_every_element_of_an_array_field() {
        let store = MemoryStore::new();
        let first = store
            .insert_one("categories", object(json!({ "name": "Dessert" })))
            .await
            .unwrap();
        let second = store
            .insert_one("categories", object(json!({ "name": "Breakfast" })))
            .await
            .unwrap();
        store
            .insert_one(
                "articles",
                object(json!({ "title": "Tarta", "category_ids": [first, second] })),
            )
            .await
            .unwrap();

        let pipeline = [PipelineStage::Lookup(Lookup {
            from: "categories",
            local_field: "category_ids",
            foreign_field: ID_FIELD,
            as_field: "categories",
        })];
        let results = store.aggregate("articles", &pipeline).await.unwrap();
        let joined = results[0].get("categories").unwrap().as_array().unwrap();
        assert_eq!(joined.len(), 2);
    }

    #[tokio::test]
    async fn unwind_first_leaves_the_field_absent_for_missing_referents() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "articles",
                object(json!({ "title": "Huerto", "author_id": EntityId::generate() })),
            )
            .await
            .unwrap();

        let pipeline = [
            PipelineStage::Lookup(Lookup {
                from: "users",
                local_field: "author_id",
                foreign_field: ID_FIELD,
                as_field: "author",
            }),
            PipelineStage::UnwindFirst { path: "author" },
        ];
        let results = store.aggregate("articles", &pipeline).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].get("author").is_none());
    }

    #[tokio::test]
    async fn match_any_contains_reaches_into_joined_arrays() {
        let store = MemoryStore::new();
        let category = store
            .insert_one("categories", object(json!({ "name": "Dessert" })))
            .await
            .unwrap();
        store
            .insert_one(
                "articles",
                object(json!({ "title": "Tarta", "text": "...", "category_ids": [category] })),
            )
            .await
            .unwrap();
        store
            .insert_one(
                "articles",
                object(json!({ "title": "Caldo", "text": "...", "category_ids": [] })),
            )
            .await
            .unwrap();

        let pipeline = [
            PipelineStage::Lookup(Lookup {
                from: "categories",
                local_field: "category_ids",
                foreign_field: ID_FIELD,
                as_field: "categories",
            }),
            PipelineStage::MatchAnyContains {
                fields: vec!["title", "categories.name"],
                term: "dessert".to_string(),
            },
        ];
        let results = store.aggregate("articles", &pipeline).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("title").unwrap(), "Tarta");
    }

    #[tokio::test]
    async fn update_with_identical_values_reports_no_modification() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("tags", object(json!({ "name": "vegan" })))
            .await
            .unwrap();

        let unchanged = store
            .update_one("tags", id, object(json!({ "name": "vegan" })))
            .await
            .unwrap();
        assert_eq!(unchanged, 0);

        let changed = store
            .update_one("tags", id, object(json!({ "name": "vegetarian" })))
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let missing = store
            .update_one("tags", EntityId::generate(), object(json!({ "name": "x" })))
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn projection_keeps_only_the_requested_fields() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "users",
                object(json!({ "email": "a@b.com", "name": "Ana", "password_digest": "d" })),
            )
            .await
            .unwrap();

        let documents = store
            .find("users", &Filter::all(), Some(&[ID_FIELD, "email"]))
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].contains_key(ID_FIELD));
        assert!(documents[0].contains_key("email"));
        assert!(!documents[0].contains_key("password_digest"));
    }
}

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::filter::{Filter, SortDirection};
use crate::store::{Collection, DocumentStore, StoreError, StoreResult};

/// Process-local store with the same unique constraints as the REST backend.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_unique(
        collection: Collection,
        existing: &[Value],
        candidate: &Value,
        skip_index: Option<usize>,
    ) -> StoreResult<()> {
        for key in collection.unique_keys() {
            let value = match candidate.get(*key) {
                Some(Value::Null) | None => continue,
                Some(v) => v,
            };

            let clash = existing
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip_index)
                .any(|(_, doc)| doc.get(*key) == Some(value));

            if clash {
                return Err(StoreError::Conflict(format!(
                    "duplicate value for {}.{}",
                    collection.name(),
                    key
                )));
            }
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: Collection, document: Value) -> StoreResult<Value> {
        if !document.is_object() {
            return Err(StoreError::InvalidDocument("documents must be JSON objects".to_string()));
        }

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        Self::check_unique(collection, docs, &document, None)?;

        debug!("Inserted document into {}", collection.name());
        docs.push(document.clone());
        Ok(document)
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let docs = match collections.get(&collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };

        // Later inserts first, so equal sort keys come back newest first.
        let mut found: Vec<Value> = docs
            .iter()
            .rev()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();

        match &filter.order_by {
            Some((field, SortDirection::Desc)) => {
                found.sort_by(|a, b| compare_values(b.get(field), a.get(field)));
            }
            Some((field, SortDirection::Asc)) => {
                found.reverse();
                found.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
            }
            None => found.reverse(),
        }

        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }

        Ok(found)
    }

    async fn update(&self, collection: Collection, filter: &Filter, patch: Value) -> StoreResult<Vec<Value>> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(StoreError::InvalidDocument("patch must be a JSON object".to_string())),
        };

        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(&collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };

        let targets: Vec<usize> = docs
            .iter()
            .enumerate()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(i, _)| i)
            .collect();

        // Validate every patched document before writing any of them.
        let mut patched = Vec::with_capacity(targets.len());
        for &index in &targets {
            let mut doc = docs[index].clone();
            if let Value::Object(fields) = &mut doc {
                for (key, value) in &patch {
                    fields.insert(key.clone(), value.clone());
                }
            }
            Self::check_unique(collection, docs, &doc, Some(index))?;
            patched.push((index, doc));
        }

        let mut updated = Vec::with_capacity(patched.len());
        for (index, doc) in patched {
            docs[index] = doc.clone();
            updated.push(doc);
        }

        debug!("Updated {} document(s) in {}", updated.len(), collection.name());
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(&collection) {
            Some(docs) => docs,
            None => return Ok(0),
        };

        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        let removed = before - docs.len();

        debug!("Deleted {} document(s) from {}", removed, collection.name());
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        debug!("In-memory store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn insert_enforces_unique_user_keys() {
        let store = InMemoryStore::new();
        store
            .insert(Collection::Users, json!({ "id": "1", "externalId": "ext_1", "email": "a@x.io" }))
            .await
            .unwrap();

        let dup = store
            .insert(Collection::Users, json!({ "id": "2", "externalId": "ext_1", "email": "b@x.io" }))
            .await;
        assert_matches!(dup, Err(StoreError::Conflict(_)));
        assert_eq!(store.count(Collection::Users).await, 1);
    }

    #[tokio::test]
    async fn null_values_do_not_clash() {
        let store = InMemoryStore::new();
        store.insert(Collection::Users, json!({ "id": "1", "externalId": "a", "email": null })).await.unwrap();
        store.insert(Collection::Users, json!({ "id": "2", "externalId": "b", "email": null })).await.unwrap();
        assert_eq!(store.count(Collection::Users).await, 2);
    }

    #[tokio::test]
    async fn find_orders_by_timestamp_desc() {
        let store = InMemoryStore::new();
        store.insert(Collection::LiveSessions, json!({ "id": "a", "createdAt": "2024-01-01T10:00:00Z" })).await.unwrap();
        store.insert(Collection::LiveSessions, json!({ "id": "b", "createdAt": "2024-01-01T12:00:00.5Z" })).await.unwrap();
        store.insert(Collection::LiveSessions, json!({ "id": "c", "createdAt": "2024-01-01T11:00:00Z" })).await.unwrap();

        let found = store.find(Collection::LiveSessions, &Filter::new().newest_first()).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn equal_sort_keys_return_latest_insert_first() {
        let store = InMemoryStore::new();
        store.insert(Collection::Vitals, json!({ "id": "a", "createdAt": "2024-01-01T10:00:00Z" })).await.unwrap();
        store.insert(Collection::Vitals, json!({ "id": "b", "createdAt": "2024-01-01T10:00:00Z" })).await.unwrap();

        let found = store.find(Collection::Vitals, &Filter::new().newest_first()).await.unwrap();
        assert_eq!(found[0]["id"], "b");
    }

    #[tokio::test]
    async fn update_patches_and_rejects_unique_violation() {
        let store = InMemoryStore::new();
        store.insert(Collection::Users, json!({ "id": "1", "externalId": "a", "email": "a@x.io" })).await.unwrap();
        store.insert(Collection::Users, json!({ "id": "2", "externalId": "b", "email": "b@x.io" })).await.unwrap();

        let updated = store
            .update(Collection::Users, &Filter::new().eq("id", "1"), json!({ "phone": "555" }))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["phone"], "555");
        assert_eq!(updated[0]["email"], "a@x.io");

        let clash = store
            .update(Collection::Users, &Filter::new().eq("id", "1"), json!({ "email": "b@x.io" }))
            .await;
        assert_matches!(clash, Err(StoreError::Conflict(_)));

        let first = store.find_one(Collection::Users, &Filter::new().eq("id", "1")).await.unwrap().unwrap();
        assert_eq!(first["email"], "a@x.io");
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let store = InMemoryStore::new();
        store.insert(Collection::Notifications, json!({ "id": "1", "patient_id": "p" })).await.unwrap();
        store.insert(Collection::Notifications, json!({ "id": "2", "patient_id": "q" })).await.unwrap();

        let removed = store.delete(Collection::Notifications, &Filter::new().eq("patient_id", "p")).await.unwrap();
        assert_eq!(removed, 1);

        let removed = store.delete(Collection::Notifications, &Filter::new().eq("patient_id", "zzz")).await.unwrap();
        assert_eq!(removed, 0);
    }
}

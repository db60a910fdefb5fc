//! In-process `BookStore`, used by tests and by `STORE_BACKEND=memory`.

use crate::domain::book::{BookRecord, StoredBook};
use crate::storage::{BookStore, StoreError, StoreResult, UpsertOutcome};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: u64,
    books: BTreeMap<u64, BookRecord>,
}

impl Inner {
    fn id_of_title(&self, title: &str) -> Option<u64> {
        self.books
            .iter()
            .find(|(_, b)| b.title == title)
            .map(|(id, _)| *id)
    }

    fn allocate(&mut self, record: &BookRecord) -> StoredBook {
        self.next_id += 1;
        let id = self.next_id;
        self.books.insert(id, record.clone());
        StoredBook::from_record(id.to_string(), record)
    }
}

/// Same semantics as the Postgres store, including the unique title constraint.
#[derive(Default)]
pub struct InMemoryBookStore {
    inner: RwLock<Inner>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn parse_id(id: &str) -> Option<u64> {
    id.trim().parse::<u64>().ok()
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<StoredBook>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .iter()
            .map(|(id, b)| StoredBook::from_record(id.to_string(), b))
            .collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<StoredBook>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .get(&id)
            .map(|b| StoredBook::from_record(id.to_string(), b)))
    }

    async fn insert(&self, record: &BookRecord) -> StoreResult<StoredBook> {
        let mut inner = self.inner.write().await;
        if inner.id_of_title(&record.title).is_some() {
            return Err(StoreError::DuplicateTitle(record.title.clone()));
        }
        Ok(inner.allocate(record))
    }

    async fn replace(&self, id: &str, record: &BookRecord) -> StoreResult<Option<StoredBook>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&id) {
            return Ok(None);
        }
        if matches!(inner.id_of_title(&record.title), Some(other) if other != id) {
            return Err(StoreError::DuplicateTitle(record.title.clone()));
        }
        inner.books.insert(id, record.clone());
        Ok(Some(StoredBook::from_record(id.to_string(), record)))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        Ok(self.inner.write().await.books.remove(&id).is_some())
    }

    async fn upsert_by_title(&self, record: &BookRecord) -> StoreResult<UpsertOutcome> {
        let mut inner = self.inner.write().await;
        match inner.id_of_title(&record.title) {
            Some(id) => {
                inner.books.insert(id, record.clone());
                Ok(UpsertOutcome::Updated(StoredBook::from_record(
                    id.to_string(),
                    record,
                )))
            }
            None => Ok(UpsertOutcome::Inserted(inner.allocate(record))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_keeps_identifier_for_existing_title() {
        let store = InMemoryBookStore::new();
        let first = store
            .upsert_by_title(&BookRecord::new("Foo", "£1.00", "In stock"))
            .await
            .unwrap();
        assert!(matches!(first, UpsertOutcome::Inserted(_)));

        let second = store
            .upsert_by_title(&BookRecord::new("Foo", "£2.00", "Out of stock"))
            .await
            .unwrap();
        assert!(matches!(second, UpsertOutcome::Updated(_)));
        assert_eq!(first.book().id, second.book().id);
        assert_eq!(store.len().await, 1);

        let stored = store.get(&first.book().id).await.unwrap().unwrap();
        assert_eq!(stored.price, "£2.00");
    }

    #[tokio::test]
    async fn replace_rejects_title_owned_by_another_book() {
        let store = InMemoryBookStore::new();
        let a = store.insert(&BookRecord::new("A", "", "")).await.unwrap();
        store.insert(&BookRecord::new("B", "", "")).await.unwrap();

        let err = store
            .replace(&a.id, &BookRecord::new("B", "", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTitle(t) if t == "B"));

        // Re-saving a book under its own title is fine.
        assert!(store
            .replace(&a.id, &BookRecord::new("A", "£3.00", ""))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_are_not_found() {
        let store = InMemoryBookStore::new();
        assert!(store.get("42").await.unwrap().is_none());
        assert!(store.get("not-an-id").await.unwrap().is_none());
        assert!(!store.delete("not-an-id").await.unwrap());
        assert!(store
            .replace("7", &BookRecord::default())
            .await
            .unwrap()
            .is_none());
    }
}

// In-process document store
//
// Same semantics as the REST backend, kept in a concurrent map. Used by
// the service tests and by `keyline serve --memory`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use tracing::trace;

use crate::document::Document;
use crate::error::Error;
use crate::store::DocumentStore;
use crate::value::{Fields, Value};

const ROOT: &str = "projects/local/databases/(default)/documents";

/// A `DocumentStore` held entirely in memory.
///
/// Writes can be made to fail on demand to exercise best-effort paths,
/// and every successful write is counted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<String, Document>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing failure injection and the
    /// write counter.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        let key = key(collection, id);
        let now = timestamp();
        self.docs.insert(
            key.clone(),
            Document {
                name: format!("{ROOT}/{key}"),
                fields: Some(fields),
                create_time: Some(now.clone()),
                update_time: Some(now),
            },
        );
    }

    /// While `true`, `set` and `patch` return a 503 without touching state.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` and `patch` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored documents across all collections.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Api {
                message: "writes disabled".into(),
                code: Some("UNAVAILABLE".into()),
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        Ok(self.docs.get(&key(collection, id)).map(|d| d.clone()))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), Error> {
        self.check_writable()?;
        let key = key(collection, id);
        trace!(%key, "memory set");
        let now = timestamp();
        self.docs
            .entry(key.clone())
            .and_modify(|doc| {
                doc.fields = Some(fields.clone());
                doc.update_time = Some(now.clone());
            })
            .or_insert_with(|| Document {
                name: format!("{ROOT}/{key}"),
                fields: Some(fields.clone()),
                create_time: Some(now.clone()),
                update_time: Some(now.clone()),
            });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn patch(&self, collection: &str, id: &str, fields: Fields) -> Result<(), Error> {
        self.check_writable()?;
        let key = key(collection, id);
        trace!(%key, fields = fields.len(), "memory patch");
        let now = timestamp();
        let mut doc = self.docs.entry(key.clone()).or_insert_with(|| Document {
            name: format!("{ROOT}/{key}"),
            fields: Some(Fields::new()),
            create_time: Some(now.clone()),
            update_time: None,
        });
        doc.fields.get_or_insert_with(Fields::new).merge(fields);
        doc.update_time = Some(now);
        drop(doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, Error> {
        let prefix = format!("{collection}/");
        let mut hits: Vec<Document> = self
            .docs
            .iter()
            .filter(|entry| {
                let rest = entry.key().strip_prefix(&prefix);
                // Only direct children of the collection.
                rest.is_some_and(|id| !id.contains('/'))
            })
            .filter(|entry| {
                entry
                    .value()
                    .fields
                    .as_ref()
                    .and_then(|f| f.get(field))
                    .is_some_and(|v| *v == value)
            })
            .map(|entry| entry.value().clone())
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }
}

fn key(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// The storage seam consumed by the license and quota services.
//
// A document store is addressed by `(collection, id)` and supports point
// reads, full writes, partial merges, and single-field equality queries.
// `RestStore` talks to the hosted database; `MemoryStore` backs tests and
// the local demo server.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Error;
use crate::value::{Fields, Value};

/// Abstract document store backend.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// concurrently. No method retries; errors surface to the caller as-is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. A missing document is `Ok(None)`, not an error.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Error>;

    /// Full write: creates the document or replaces every field of an
    /// existing one.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), Error>;

    /// Partial write: merges the named fields into the document, leaving
    /// all other fields untouched. Creates the document if absent.
    async fn patch(&self, collection: &str, id: &str, fields: Fields) -> Result<(), Error>;

    /// Every document in `collection` whose `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, Error>;
}

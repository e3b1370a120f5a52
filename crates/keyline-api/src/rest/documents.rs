// Document store endpoints
//
// Point reads and full writes address a single document URL. Partial
// merges go through `documents:batchWrite` with an update mask, and
// equality lookups through `documents:runQuery`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::error::Error;
use crate::rest::client::RestStore;
use crate::store::DocumentStore;
use crate::value::{Fields, Value};

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct SetBody<'a> {
    fields: &'a Fields,
}

#[derive(Serialize)]
struct BatchWriteRequest<'a> {
    writes: Vec<WriteOp<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteOp<'a> {
    update: DocumentWrite<'a>,
    update_mask: DocumentMask<'a>,
}

#[derive(Serialize)]
struct DocumentWrite<'a> {
    name: String,
    fields: &'a Fields,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentMask<'a> {
    field_paths: Vec<&'a str>,
}

#[derive(Deserialize, Default)]
struct BatchWriteResponse {
    #[serde(default)]
    status: Vec<RpcStatus>,
}

#[derive(Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Serialize)]
struct StructuredQuery<'a> {
    from: [CollectionSelector<'a>; 1],
    #[serde(rename = "where")]
    filter: Filter<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter<'a> {
    field_filter: FieldFilter<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldFilter<'a> {
    field: FieldReference<'a>,
    op: &'static str,
    value: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference<'a> {
    field_path: &'a str,
}

/// One element of the `runQuery` response stream. Entries without a
/// `document` carry only a read time (no-match / progress markers).
#[derive(Deserialize)]
struct RunQueryResponse {
    #[serde(default)]
    document: Option<Document>,
}

// ── DocumentStore impl ──────────────────────────────────────────────

#[async_trait]
impl DocumentStore for RestStore {
    /// `GET documents/{collection}/{id}`
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        let url = self.document_url(collection, id)?;
        debug!(collection, id, "reading document");
        self.get_optional(url).await
    }

    /// `PATCH documents/{collection}/{id}` without an update mask, which
    /// replaces the whole document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), Error> {
        let url = self.document_url(collection, id)?;
        debug!(collection, id, fields = fields.len(), "writing document");
        let _: Document = self.patch_json(url, &SetBody { fields: &fields }).await?;
        Ok(())
    }

    /// `POST documents:batchWrite` with one masked update.
    async fn patch(&self, collection: &str, id: &str, fields: Fields) -> Result<(), Error> {
        let url = self.rpc_url("batchWrite")?;
        debug!(collection, id, fields = fields.len(), "merging document fields");

        let body = BatchWriteRequest {
            writes: vec![WriteOp {
                update: DocumentWrite {
                    name: self.document_name(collection, id),
                    fields: &fields,
                },
                update_mask: DocumentMask {
                    field_paths: fields.names().collect(),
                },
            }],
        };

        let resp: BatchWriteResponse = self.post_json(url, &body).await?;

        // A 200 batch can still carry per-write failures.
        for (index, status) in resp.status.into_iter().enumerate() {
            if status.code != 0 {
                return Err(Error::Write {
                    index,
                    code: status.code,
                    message: status.message.unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// `POST documents:runQuery` with a single `EQUAL` field filter.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, Error> {
        let url = self.rpc_url("runQuery")?;
        debug!(collection, field, "running equality query");

        let body = RunQueryRequest {
            structured_query: StructuredQuery {
                from: [CollectionSelector {
                    collection_id: collection,
                }],
                filter: Filter {
                    field_filter: FieldFilter {
                        field: FieldReference { field_path: field },
                        op: "EQUAL",
                        value: &value,
                    },
                },
            },
        };

        let results: Vec<RunQueryResponse> = self.post_json(url, &body).await?;
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }
}

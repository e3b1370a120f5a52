use serde::{Deserialize, Serialize};

use crate::value::Fields;

/// A stored document as returned by point reads and queries.
///
/// `fields` is `None` when the store omitted the field map entirely
/// (an empty or malformed document); callers decide whether that is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name:
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// The document identifier (last segment of the resource name).
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// The collection the document lives in (second-to-last segment).
    pub fn collection(&self) -> Option<&str> {
        let mut parts = self.name.rsplit('/');
        parts.next()?;
        parts.next()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_is_last_path_segment() {
        let doc = Document {
            name: "projects/p/databases/(default)/documents/licenses/LICENSE-1-ABC".into(),
            ..Document::default()
        };
        assert_eq!(doc.id(), "LICENSE-1-ABC");
        assert_eq!(doc.collection(), Some("licenses"));
    }

    #[test]
    fn missing_field_map_is_none() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/u1",
            "createTime": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(doc.fields.is_none());
        assert_eq!(doc.id(), "u1");
    }
}

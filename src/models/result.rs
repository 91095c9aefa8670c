//! The result document written once per source PDF.
//!
//! The schema is fixed: four top-level fields, always present, even when a
//! category is empty. Documents are immutable once written.

use serde::{Deserialize, Serialize};

/// One extracted text line with the service's confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub confidence: f64,
}

/// One extracted form field. A key with no detected value carries an empty
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
    pub confidence: f64,
}

/// One extracted table as row-major cell text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub confidence: f64,
}

/// Provenance metadata attached to every result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Key of the source PDF.
    pub source_file: String,
    /// Bucket the source PDF was analyzed from.
    pub bucket: String,
    /// Batch prefix, e.g. `batch-1/`.
    pub batch: String,
    /// Correlation id of the analysis job.
    pub job_id: String,
    /// When the result was processed (UTC, RFC 3339).
    pub processed_time: String,
    /// Number of blocks the analysis returned.
    pub total_blocks: usize,
    /// Set only when the document was written by the recovery path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered: Option<bool>,
}

/// A complete result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub raw_text: Vec<TextLine>,
    pub key_value_pairs: Vec<KeyValuePair>,
    pub tables: Vec<Table>,
    pub metadata: DocumentMetadata,
}

impl ResultDocument {
    /// Serialize with the same pretty two-space formatting the original
    /// pipeline wrote, so documents diff cleanly across runs.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_categories_still_serialize_all_four_fields() {
        let doc = ResultDocument {
            raw_text: vec![],
            key_value_pairs: vec![],
            tables: vec![],
            metadata: DocumentMetadata {
                source_file: "batch-1/a.pdf".into(),
                bucket: "b".into(),
                batch: "batch-1/".into(),
                job_id: "j".into(),
                processed_time: "2026-01-01T00:00:00Z".into(),
                total_blocks: 0,
                recovered: None,
            },
        };
        let value: serde_json::Value =
            serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        for field in ["raw_text", "key_value_pairs", "tables", "metadata"] {
            assert!(obj.contains_key(field), "missing field {}", field);
        }
        // recovered is omitted unless the recovery path set it
        assert!(value["metadata"].get("recovered").is_none());
    }

    #[test]
    fn recovered_flag_serializes_when_set() {
        let doc = ResultDocument {
            raw_text: vec![TextLine {
                text: "hello".into(),
                confidence: 99.0,
            }],
            key_value_pairs: vec![],
            tables: vec![],
            metadata: DocumentMetadata {
                source_file: "a.pdf".into(),
                bucket: "b".into(),
                batch: "batch-2/".into(),
                job_id: "j".into(),
                processed_time: "2026-01-01T00:00:00Z".into(),
                total_blocks: 1,
                recovered: Some(true),
            },
        };
        let value: serde_json::Value =
            serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["metadata"]["recovered"], serde_json::json!(true));
    }
}

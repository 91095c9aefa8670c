//! The analysis service's block data model.
//!
//! Only the fields the reshaping needs are modelled; unknown block and
//! relationship types deserialize to `Unknown` instead of failing, since the
//! service adds types over time.

use serde::{Deserialize, Serialize};

/// Type of a returned block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    KeyValueSet,
    Table,
    Cell,
    MergedCell,
    SelectionElement,
    #[serde(other)]
    Unknown,
}

/// Type of a relationship edge between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Child,
    Value,
    MergedCell,
    #[serde(other)]
    Unknown,
}

/// A typed edge from one block to others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "Type")]
    pub relationship_type: RelationshipType,
    #[serde(rename = "Ids", default)]
    pub ids: Vec<String>,
}

/// One block from the analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    pub id: String,
    pub block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<u32>,
}

impl Block {
    /// Whether this block is the KEY half of a key-value set.
    pub fn is_key(&self) -> bool {
        self.block_type == BlockType::KeyValueSet
            && self.entity_types.iter().any(|t| t == "KEY")
    }

    /// Ids referenced by relationships of the given type.
    pub fn related_ids(&self, relationship_type: RelationshipType) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(move |r| r.relationship_type == relationship_type)
            .flat_map(|r| r.ids.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_deserializes_from_service_json() {
        let json = r#"{
            "Id": "abc",
            "BlockType": "KEY_VALUE_SET",
            "Confidence": 98.5,
            "EntityTypes": ["KEY"],
            "Relationships": [
                {"Type": "VALUE", "Ids": ["v1"]},
                {"Type": "CHILD", "Ids": ["w1", "w2"]}
            ]
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.block_type, BlockType::KeyValueSet);
        assert!(block.is_key());
        let child_ids: Vec<&str> = block.related_ids(RelationshipType::Child).collect();
        assert_eq!(child_ids, vec!["w1", "w2"]);
    }

    #[test]
    fn unknown_block_type_does_not_fail() {
        let json = r#"{"Id": "x", "BlockType": "LAYOUT_FIGURE"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.block_type, BlockType::Unknown);
    }

    #[test]
    fn cell_indices_deserialize() {
        let json = r#"{"Id": "c", "BlockType": "CELL", "RowIndex": 2, "ColumnIndex": 3}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.row_index, Some(2));
        assert_eq!(block.column_index, Some(3));
    }
}

//! Reshaping of analysis blocks into the result-document categories.
//!
//! Lines become text entries, KEY key-value sets are resolved through their
//! VALUE and CHILD relationships, and tables are rebuilt from CELL children
//! ordered by row then column index.

use std::collections::{BTreeMap, HashMap};

use super::blocks::{Block, BlockType, RelationshipType};
use crate::models::{DocumentMetadata, KeyValuePair, ResultDocument, Table, TextLine};

/// The three extracted categories, before metadata is attached.
#[derive(Debug, Default, Clone)]
pub struct ExtractedContent {
    pub raw_text: Vec<TextLine>,
    pub key_value_pairs: Vec<KeyValuePair>,
    pub tables: Vec<Table>,
}

impl ExtractedContent {
    /// Reshape a full block list.
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let block_map: HashMap<&str, &Block> =
            blocks.iter().map(|b| (b.id.as_str(), b)).collect();

        let mut extracted = Self::default();

        for block in blocks {
            match block.block_type {
                BlockType::Line => extracted.raw_text.push(TextLine {
                    text: block.text.clone().unwrap_or_default(),
                    confidence: block.confidence.unwrap_or(0.0),
                }),
                BlockType::KeyValueSet if block.is_key() => {
                    let key = child_text(block, &block_map);
                    let value = value_block(block, &block_map)
                        .map(|v| child_text(v, &block_map))
                        .unwrap_or_default();
                    extracted.key_value_pairs.push(KeyValuePair {
                        key,
                        value,
                        confidence: block.confidence.unwrap_or(0.0),
                    });
                }
                BlockType::Table => {
                    if let Some(table) = extract_table(block, &block_map) {
                        extracted.tables.push(table);
                    }
                }
                _ => {}
            }
        }

        extracted
    }

    /// Attach metadata, producing the complete result document.
    pub fn into_document(self, metadata: DocumentMetadata) -> ResultDocument {
        ResultDocument {
            raw_text: self.raw_text,
            key_value_pairs: self.key_value_pairs,
            tables: self.tables,
            metadata,
        }
    }
}

/// Text of a block's WORD children, space-joined and trimmed.
fn child_text(block: &Block, block_map: &HashMap<&str, &Block>) -> String {
    let mut text = String::new();
    for id in block.related_ids(RelationshipType::Child) {
        if let Some(child) = block_map.get(id) {
            if child.block_type == BlockType::Word {
                if let Some(word) = &child.text {
                    text.push_str(word);
                    text.push(' ');
                }
            }
        }
    }
    text.trim_end().to_string()
}

/// The VALUE block referenced by a KEY block, if any.
fn value_block<'a>(
    key_block: &Block,
    block_map: &HashMap<&str, &'a Block>,
) -> Option<&'a Block> {
    key_block
        .related_ids(RelationshipType::Value)
        .find_map(|id| block_map.get(id).copied())
}

/// Rebuild a table from its CELL children. Tables with no relationships or
/// no populated rows are dropped entirely.
fn extract_table(table_block: &Block, block_map: &HashMap<&str, &Block>) -> Option<Table> {
    if table_block.relationships.is_empty() {
        return None;
    }

    // Row index -> column index -> cell text, both ascending
    let mut cells: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
    for id in table_block.related_ids(RelationshipType::Child) {
        let Some(cell) = block_map.get(id) else {
            continue;
        };
        if cell.block_type != BlockType::Cell {
            continue;
        }
        let row = cell.row_index.unwrap_or(0);
        let column = cell.column_index.unwrap_or(0);
        cells
            .entry(row)
            .or_default()
            .insert(column, child_text(cell, block_map));
    }

    if cells.is_empty() {
        return None;
    }

    let rows: Vec<Vec<String>> = cells
        .into_values()
        .map(|row| row.into_values().collect())
        .collect();

    Some(Table {
        rows,
        confidence: table_block.confidence.unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::blocks::Relationship;

    fn block(id: &str, block_type: BlockType) -> Block {
        Block {
            id: id.to_string(),
            block_type,
            text: None,
            confidence: Some(90.0),
            entity_types: Vec::new(),
            relationships: Vec::new(),
            row_index: None,
            column_index: None,
        }
    }

    fn word(id: &str, text: &str) -> Block {
        Block {
            text: Some(text.to_string()),
            ..block(id, BlockType::Word)
        }
    }

    fn related(relationship_type: RelationshipType, ids: &[&str]) -> Relationship {
        Relationship {
            relationship_type,
            ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn lines_become_raw_text() {
        let mut line = block("l1", BlockType::Line);
        line.text = Some("Invoice Total".to_string());
        line.confidence = Some(99.2);

        let extracted = ExtractedContent::from_blocks(&[line]);
        assert_eq!(extracted.raw_text.len(), 1);
        assert_eq!(extracted.raw_text[0].text, "Invoice Total");
        assert!((extracted.raw_text[0].confidence - 99.2).abs() < f64::EPSILON);
        assert!(extracted.key_value_pairs.is_empty());
        assert!(extracted.tables.is_empty());
    }

    #[test]
    fn key_value_pair_resolved_through_relationships() {
        let mut key = block("k1", BlockType::KeyValueSet);
        key.entity_types = vec!["KEY".to_string()];
        key.relationships = vec![
            related(RelationshipType::Child, &["w1", "w2"]),
            related(RelationshipType::Value, &["v1"]),
        ];

        let mut value = block("v1", BlockType::KeyValueSet);
        value.entity_types = vec!["VALUE".to_string()];
        value.relationships = vec![related(RelationshipType::Child, &["w3"])];

        let blocks = vec![
            key,
            value,
            word("w1", "Invoice"),
            word("w2", "Number"),
            word("w3", "12345"),
        ];
        let extracted = ExtractedContent::from_blocks(&blocks);
        assert_eq!(extracted.key_value_pairs.len(), 1);
        let pair = &extracted.key_value_pairs[0];
        assert_eq!(pair.key, "Invoice Number");
        assert_eq!(pair.value, "12345");
    }

    #[test]
    fn key_without_value_yields_empty_string() {
        let mut key = block("k1", BlockType::KeyValueSet);
        key.entity_types = vec!["KEY".to_string()];
        key.relationships = vec![related(RelationshipType::Child, &["w1"])];

        let blocks = vec![key, word("w1", "Signature")];
        let extracted = ExtractedContent::from_blocks(&blocks);
        assert_eq!(extracted.key_value_pairs.len(), 1);
        assert_eq!(extracted.key_value_pairs[0].key, "Signature");
        assert_eq!(extracted.key_value_pairs[0].value, "");
    }

    #[test]
    fn value_entity_alone_produces_no_pair() {
        let mut value = block("v1", BlockType::KeyValueSet);
        value.entity_types = vec!["VALUE".to_string()];
        let extracted = ExtractedContent::from_blocks(&[value]);
        assert!(extracted.key_value_pairs.is_empty());
    }

    #[test]
    fn table_cells_ordered_by_row_then_column() {
        let mut table = block("t1", BlockType::Table);
        table.confidence = Some(97.0);
        table.relationships = vec![related(RelationshipType::Child, &["c22", "c11", "c12", "c21"])];

        let mut cells = Vec::new();
        for (id, row, col, text) in [
            ("c11", 1, 1, "a"),
            ("c12", 1, 2, "b"),
            ("c21", 2, 1, "c"),
            ("c22", 2, 2, "d"),
        ] {
            let word_id = format!("w-{}", id);
            let mut cell = block(id, BlockType::Cell);
            cell.row_index = Some(row);
            cell.column_index = Some(col);
            cell.relationships = vec![related(RelationshipType::Child, &[word_id.as_str()])];
            cells.push(cell);
            cells.push(word(&word_id, text));
        }

        let mut blocks = vec![table];
        blocks.extend(cells);
        let extracted = ExtractedContent::from_blocks(&blocks);
        assert_eq!(extracted.tables.len(), 1);
        assert_eq!(
            extracted.tables[0].rows,
            vec![vec!["a".to_string(), "b".to_string()], vec![
                "c".to_string(),
                "d".to_string()
            ]]
        );
    }

    #[test]
    fn empty_table_is_dropped() {
        let table = block("t1", BlockType::Table);
        let extracted = ExtractedContent::from_blocks(&[table]);
        assert!(extracted.tables.is_empty());

        // relationships pointing at nothing resolvable also drop the table
        let mut table = block("t2", BlockType::Table);
        table.relationships = vec![related(RelationshipType::Child, &["missing"])];
        let extracted = ExtractedContent::from_blocks(&[table]);
        assert!(extracted.tables.is_empty());
    }
}

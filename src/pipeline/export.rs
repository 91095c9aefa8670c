//! Tabular export of result documents.
//!
//! Writes four CSV views of a document set, mirroring the review spreadsheet
//! the analysts work from: a per-file summary, all key-value pairs, a text
//! preview per file, and flattened table rows.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::models::ResultDocument;

/// Characters of raw text kept in the preview column.
const PREVIEW_CHARS: usize = 200;

/// One parsed result document with the path it was read from.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub path: PathBuf,
    pub document: ResultDocument,
}

/// Parse every downloaded result document under `input`, recursively.
///
/// Files that are not valid result documents are logged and skipped, so a
/// stray file in the directory does not block the export. Entries come back
/// sorted by path for stable CSV ordering.
pub fn collect_documents(input: &Path) -> anyhow::Result<Vec<ExportEntry>> {
    let mut entries = Vec::new();
    collect_into(input, &mut entries)?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn collect_into(dir: &Path, entries: &mut Vec<ExportEntry>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_into(&path, entries)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            let body = std::fs::read(&path)?;
            match serde_json::from_slice::<ResultDocument>(&body) {
                Ok(document) => entries.push(ExportEntry { path, document }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparseable document")
                }
            }
        }
    }
    Ok(())
}

/// Write the four CSV views into `dest`. Returns the written paths.
pub fn export_documents(entries: &[ExportEntry], dest: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest)?;

    let views = [
        ("summary.csv", summary_csv(entries)),
        ("key_value_pairs.csv", key_value_csv(entries)),
        ("full_text.csv", full_text_csv(entries)),
        ("tables.csv", tables_csv(entries)),
    ];

    let mut written = Vec::new();
    for (name, content) in views {
        let path = dest.join(name);
        std::fs::write(&path, content)?;
        written.push(path);
    }

    info!(documents = entries.len(), dest = %dest.display(), "export written");
    Ok(written)
}

fn summary_csv(entries: &[ExportEntry]) -> String {
    let mut out = String::from(
        "file,batch,job_id,processed_time,lines,key_value_pairs,tables,recovered\n",
    );
    for entry in entries {
        let doc = &entry.document;
        write_row(
            &mut out,
            &[
                &doc.metadata.source_file,
                &doc.metadata.batch,
                &doc.metadata.job_id,
                &doc.metadata.processed_time,
                &doc.raw_text.len().to_string(),
                &doc.key_value_pairs.len().to_string(),
                &doc.tables.len().to_string(),
                if doc.metadata.recovered.unwrap_or(false) {
                    "yes"
                } else {
                    "no"
                },
            ],
        );
    }
    out
}

fn key_value_csv(entries: &[ExportEntry]) -> String {
    let mut out = String::from("file,key,value,confidence\n");
    for entry in entries {
        for pair in &entry.document.key_value_pairs {
            write_row(
                &mut out,
                &[
                    &entry.document.metadata.source_file,
                    &pair.key,
                    &pair.value,
                    &format!("{:.2}", pair.confidence),
                ],
            );
        }
    }
    out
}

fn full_text_csv(entries: &[ExportEntry]) -> String {
    let mut out = String::from("file,lines,preview\n");
    for entry in entries {
        let doc = &entry.document;
        let text = doc
            .raw_text
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        write_row(
            &mut out,
            &[
                &doc.metadata.source_file,
                &doc.raw_text.len().to_string(),
                &preview,
            ],
        );
    }
    out
}

fn tables_csv(entries: &[ExportEntry]) -> String {
    let mut out = String::from("file,table,row,cells\n");
    for entry in entries {
        for (table_index, table) in entry.document.tables.iter().enumerate() {
            for (row_index, row) in table.rows.iter().enumerate() {
                write_row(
                    &mut out,
                    &[
                        &entry.document.metadata.source_file,
                        &(table_index + 1).to_string(),
                        &(row_index + 1).to_string(),
                        &row.join(" | "),
                    ],
                );
            }
        }
    }
    out
}

fn write_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", csv_escape(field));
    }
    out.push('\n');
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentMetadata, KeyValuePair, Table, TextLine};

    fn entry(source_file: &str) -> ExportEntry {
        ExportEntry {
            path: PathBuf::from(format!("results/batch-1/{}.json", source_file)),
            document: ResultDocument {
                raw_text: vec![TextLine {
                    text: "hello world".into(),
                    confidence: 99.0,
                }],
                key_value_pairs: vec![KeyValuePair {
                    key: "Name".into(),
                    value: "Doe, Jane".into(),
                    confidence: 98.765,
                }],
                tables: vec![Table {
                    rows: vec![vec!["a".into(), "b".into()]],
                    confidence: 95.0,
                }],
                metadata: DocumentMetadata {
                    source_file: format!("batch-1/{}.pdf", source_file),
                    bucket: "b".into(),
                    batch: "batch-1/".into(),
                    job_id: "j".into(),
                    processed_time: "2026-01-01T00:00:00Z".into(),
                    total_blocks: 3,
                    recovered: None,
                },
            },
        }
    }

    #[test]
    fn csv_escape_quotes_delimiters_and_doubles_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn key_value_view_quotes_and_rounds() {
        let csv = key_value_csv(&[entry("doc")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "file,key,value,confidence");
        assert_eq!(
            lines.next().unwrap(),
            "batch-1/doc.pdf,Name,\"Doe, Jane\",98.77"
        );
    }

    #[test]
    fn summary_view_counts_categories() {
        let csv = summary_csv(&[entry("doc")]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "batch-1/doc.pdf,batch-1/,j,2026-01-01T00:00:00Z,1,1,1,no"
        );
    }

    #[test]
    fn tables_view_joins_cells() {
        let csv = tables_csv(&[entry("doc")]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "batch-1/doc.pdf,1,1,a | b");
    }

    #[test]
    fn collect_skips_non_documents() {
        let dir = tempfile::tempdir().unwrap();
        let batch = dir.path().join("batch-1");
        std::fs::create_dir_all(&batch).unwrap();
        std::fs::write(
            batch.join("doc.json"),
            entry("doc").document.to_json_pretty().unwrap(),
        )
        .unwrap();
        std::fs::write(batch.join("stray.json"), "{\"not\": \"a result\"}").unwrap();
        std::fs::write(batch.join("notes.txt"), "ignore me").unwrap();

        let entries = collect_documents(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].document.metadata.job_id, "j");
    }

    #[test]
    fn export_writes_four_views() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_documents(&[entry("doc")], dir.path()).unwrap();
        assert_eq!(written.len(), 4);
        for path in &written {
            assert!(path.exists());
        }
        let summary = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert!(summary.starts_with("file,batch,job_id"));
    }

    #[test]
    fn preview_is_truncated() {
        let mut e = entry("doc");
        e.document.raw_text = vec![TextLine {
            text: "x".repeat(500),
            confidence: 99.0,
        }];
        let csv = full_text_csv(&[e]);
        let row = csv.lines().nth(1).unwrap();
        let preview = row.rsplit(',').next().unwrap();
        assert_eq!(preview.len(), PREVIEW_CHARS);
    }
}

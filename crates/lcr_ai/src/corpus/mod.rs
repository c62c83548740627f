use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which knowledge-base source a document (and every chunk cut from it)
/// came from. Fixed per source file; carried through to retrieval hits for
/// provenance display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Qa,
    Statute,
    Clause,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Qa => "qa",
            SourceTag::Statute => "statute",
            SourceTag::Clause => "clause",
        }
    }
}

/// One loaded knowledge-base document. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusDocument {
    pub content: String,
    pub tag: SourceTag,
    pub metadata: BTreeMap<String, String>,
}

/// File locations of the knowledge-base sources.
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    pub qa_json: PathBuf,
    pub statute_json: PathBuf,
    pub clauses_csv: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct QaRecord {
    question: String,
    answer: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StatuteFile {
    #[serde(default)]
    text: String,
}

// CSV column holding the recommended clause text.
const CLAUSE_HEADER: &str = "특약내용";

/// Load every available source into a flat document sequence.
///
/// A missing or unreadable source is skipped with a warning; malformed
/// individual records are skipped as well. An empty return means no source
/// loaded, and the caller must treat the index build as unavailable rather
/// than indexing nothing.
pub fn load_corpus(paths: &CorpusPaths) -> Vec<CorpusDocument> {
    let mut docs = Vec::new();

    match load_qa_pairs(&paths.qa_json) {
        Ok(mut qa) => {
            info!(count = qa.len(), path = %paths.qa_json.display(), "loaded QA source");
            docs.append(&mut qa);
        }
        Err(e) => warn!(path = %paths.qa_json.display(), error = %e, "QA source unavailable"),
    }

    match load_statute(&paths.statute_json) {
        Ok(doc) => {
            info!(path = %paths.statute_json.display(), "loaded statute source");
            docs.push(doc);
        }
        Err(e) => {
            warn!(path = %paths.statute_json.display(), error = %e, "statute source unavailable")
        }
    }

    match load_clauses(&paths.clauses_csv) {
        Ok(mut clauses) => {
            info!(count = clauses.len(), path = %paths.clauses_csv.display(), "loaded clause source");
            docs.append(&mut clauses);
        }
        Err(e) => {
            warn!(path = %paths.clauses_csv.display(), error = %e, "clause source unavailable")
        }
    }

    docs
}

fn source_metadata(path: &Path) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    meta.insert("source_path".to_string(), path.display().to_string());
    meta
}

fn load_qa_pairs(path: &Path) -> Result<Vec<CorpusDocument>, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    // Tolerate individually malformed records: decode as loose values first.
    let values: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    let mut docs = Vec::new();
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<QaRecord>(value) {
            Ok(rec) if !rec.question.trim().is_empty() && !rec.answer.trim().is_empty() => {
                docs.push(CorpusDocument {
                    content: format!(
                        "Case question: {}\nCase answer: {}",
                        rec.question.trim(),
                        rec.answer.trim()
                    ),
                    tag: SourceTag::Qa,
                    metadata: source_metadata(path),
                });
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, path = %path.display(), "skipped malformed QA records");
    }
    Ok(docs)
}

fn load_statute(path: &Path) -> Result<CorpusDocument, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let parsed: StatuteFile = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    if parsed.text.trim().is_empty() {
        return Err("statute file has no text".to_string());
    }
    Ok(CorpusDocument {
        content: parsed.text,
        tag: SourceTag::Statute,
        metadata: source_metadata(path),
    })
}

fn load_clauses(path: &Path) -> Result<Vec<CorpusDocument>, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let Some(clause_idx) = headers.iter().position(|h| h.trim() == CLAUSE_HEADER) else {
        return Err(format!("missing '{CLAUSE_HEADER}' column"));
    };

    let mut docs = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let Ok(row) = row else {
            skipped += 1;
            continue;
        };
        let clause = row.get(clause_idx).map(str::trim).unwrap_or("");
        if clause.is_empty() {
            skipped += 1;
            continue;
        }
        docs.push(CorpusDocument {
            content: format!("Recommended special clause example: {clause}"),
            tag: SourceTag::Clause,
            metadata: source_metadata(path),
        });
    }
    if skipped > 0 {
        warn!(skipped, path = %path.display(), "skipped empty or malformed clause rows");
    }
    Ok(docs)
}

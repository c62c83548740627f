use lcr_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusDocument, SourceTag};

/// Atomic retrieval unit cut from exactly one source document.
///
/// Chunk boundaries are a pure function of (chunk_size, chunk_overlap,
/// document content): re-running the splitter on identical input always
/// yields identical chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub tag: SourceTag,
    /// Position within the parent document.
    pub chunk_index: u32,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn char_suffix(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let total = char_len(s);
    if total <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(total - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// Split a paragraph into sentences, keeping terminators. A newline also ends
/// a sentence so list-style contract clauses split cleanly.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut chars = paragraph.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\n' {
            let sentence = buf.trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
            buf.clear();
            continue;
        }
        buf.push(ch);
        if is_sentence_end(ch) {
            let boundary = chars.peek().map(|c| c.is_whitespace()).unwrap_or(true);
            if boundary {
                let sentence = buf.trim();
                if !sentence.is_empty() {
                    out.push(sentence.to_string());
                }
                buf.clear();
            }
        }
    }
    let sentence = buf.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
    out
}

/// Fixed non-overlapping character windows; last resort below sentences.
fn split_char_windows(text: &str, window: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        buf.push(ch);
        count += 1;
        if count == window {
            out.push(buf.clone());
            buf.clear();
            count = 0;
        }
    }
    if !buf.trim().is_empty() {
        out.push(buf);
    }
    out
}

/// Break text into units no longer than `budget` chars, preferring paragraph
/// boundaries, then sentences, then raw character windows.
fn split_units(text: &str, budget: usize) -> Vec<String> {
    let mut units = Vec::new();
    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if char_len(para) <= budget {
            units.push(para.to_string());
            continue;
        }
        for sentence in split_sentences(para) {
            if char_len(&sentence) <= budget {
                units.push(sentence);
            } else {
                units.extend(split_char_windows(&sentence, budget));
            }
        }
    }
    units
}

/// Greedy longest-fit split with overlap carry-over.
///
/// Every chunk is at most `chunk_size` chars (char-counted, UTF-8 safe); each
/// chunk after the first begins with up to `chunk_overlap` trailing chars of
/// its predecessor for context continuity. No unit is dropped: stripping the
/// carried prefixes and concatenating reconstructs the source modulo
/// whitespace normalization.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if char_len(trimmed) <= chunk_size {
        return vec![trimmed.to_string()];
    }

    // Units must leave room for the overlap seed plus a joining newline.
    let unit_budget = chunk_size.saturating_sub(chunk_overlap + 1).max(1);
    let units = split_units(trimmed, unit_budget);

    let mut chunks: Vec<String> = Vec::new();
    let mut buf = String::new();
    for unit in units {
        let add = char_len(&unit) + if buf.is_empty() { 0 } else { 1 };
        if !buf.is_empty() && char_len(&buf) + add > chunk_size {
            let seed = char_suffix(&buf, chunk_overlap).trim_start().to_string();
            chunks.push(std::mem::take(&mut buf));
            buf = seed;
        }
        if !buf.is_empty() {
            buf.push('\n');
        }
        buf.push_str(&unit);
    }
    if !buf.trim().is_empty() {
        chunks.push(buf);
    }
    chunks
}

/// Split every document, preserving per-document chunk order.
pub fn split_documents(
    documents: &[CorpusDocument],
    chunk_size: u32,
    chunk_overlap: u32,
) -> Result<Vec<TextChunk>, AppError> {
    if chunk_size == 0 {
        return Err(AppError::new("CONFIG_INVALID", "chunk_size must be positive"));
    }
    if chunk_overlap >= chunk_size {
        return Err(AppError::new(
            "CONFIG_INVALID",
            "chunk_overlap must be smaller than chunk_size",
        )
        .with_details(format!(
            "chunk_size={chunk_size}; chunk_overlap={chunk_overlap}"
        )));
    }

    let mut out = Vec::new();
    for doc in documents {
        let pieces = split_text(&doc.content, chunk_size as usize, chunk_overlap as usize);
        for (i, content) in pieces.into_iter().enumerate() {
            out.push(TextChunk {
                content,
                tag: doc.tag,
                chunk_index: i as u32,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Whitespace-insensitive comparison: splitting may move or insert
    // whitespace at boundaries but never touches other characters.
    fn normalize_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Strip each chunk's carried-over prefix and join what remains.
    fn reconstruct(chunks: &[String], chunk_overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
                continue;
            }
            let seed = char_suffix(&chunks[i - 1], chunk_overlap).trim_start();
            let rest = chunk
                .strip_prefix(seed)
                .map(|r| r.trim_start_matches('\n'))
                .unwrap_or(chunk);
            out.push('\n');
            out.push_str(rest);
        }
        out
    }

    fn sample_text() -> String {
        let mut paras = Vec::new();
        for i in 0..12 {
            paras.push(format!(
                "제{i}조 임대인은 임차인이 주택을 사용할 수 있도록 한다. \
                 임차인은 차임을 지급할 의무가 있다. 조항 번호는 {i}번이다."
            ));
        }
        paras.join("\n\n")
    }

    #[test]
    fn short_document_yields_exactly_one_chunk() {
        let chunks = split_text("짧은 계약서 본문.", 1000, 100);
        assert_eq!(chunks, vec!["짧은 계약서 본문.".to_string()]);
    }

    #[test]
    fn chunks_respect_the_size_limit() {
        let text = sample_text();
        for chunk in split_text(&text, 200, 40) {
            assert!(chunk.chars().count() <= 200, "chunk too long: {chunk}");
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = sample_text();
        assert_eq!(split_text(&text, 200, 40), split_text(&text, 200, 40));
    }

    #[test]
    fn consecutive_chunks_carry_overlap() {
        let text = sample_text();
        let chunks = split_text(&text, 200, 40);
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let seed = char_suffix(&pair[0], 40).trim_start();
            if !seed.is_empty() {
                assert!(
                    pair[1].starts_with(seed),
                    "chunk does not start with predecessor overlap"
                );
            }
        }
    }

    #[test]
    fn deoverlapped_concatenation_is_lossless_modulo_whitespace() {
        let text = sample_text();
        let chunks = split_text(&text, 200, 40);
        let rebuilt = reconstruct(&chunks, 40);
        assert_eq!(normalize_ws(&rebuilt), normalize_ws(&text));
    }

    #[test]
    fn oversized_sentence_falls_back_to_char_windows() {
        let long_run = "가".repeat(500);
        let chunks = split_text(&long_run, 120, 20);
        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 120);
        }
        let rebuilt = reconstruct(&chunks, 20);
        assert_eq!(normalize_ws(&rebuilt), normalize_ws(&long_run));
    }

    #[test]
    fn document_splitting_preserves_tags_and_indices() {
        use std::collections::BTreeMap;
        let docs = vec![
            CorpusDocument {
                content: sample_text(),
                tag: SourceTag::Statute,
                metadata: BTreeMap::new(),
            },
            CorpusDocument {
                content: "단일 청크 문서.".to_string(),
                tag: SourceTag::Clause,
                metadata: BTreeMap::new(),
            },
        ];
        let chunks = split_documents(&docs, 200, 40).expect("split");
        let statute: Vec<_> = chunks.iter().filter(|c| c.tag == SourceTag::Statute).collect();
        let clause: Vec<_> = chunks.iter().filter(|c| c.tag == SourceTag::Clause).collect();
        assert!(statute.len() >= 2);
        assert_eq!(clause.len(), 1);
        for (i, chunk) in statute.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
        }
        assert_eq!(clause[0].chunk_index, 0);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let docs = Vec::new();
        let err = split_documents(&docs, 100, 100).unwrap_err();
        assert_eq!(err.code, "CONFIG_INVALID");
    }
}

use std::fs;
use std::path::Path;

use lcr_ai::corpus::{load_corpus, CorpusPaths, SourceTag};

fn paths_in(dir: &Path) -> CorpusPaths {
    CorpusPaths {
        qa_json: dir.join("qa.json"),
        statute_json: dir.join("statute.json"),
        clauses_csv: dir.join("clauses.csv"),
    }
}

fn write_all_sources(dir: &Path) {
    fs::write(
        dir.join("qa.json"),
        r#"[
            {"question": "전세금은 언제 돌려받나요?", "answer": "계약 종료 시 반환됩니다."},
            {"question": "근저당이 있으면요?", "answer": "대항력 확보가 어렵습니다."},
            {"question": "빈 답변", "answer": "  "},
            {"unrelated": true}
        ]"#,
    )
    .expect("qa");
    fs::write(
        dir.join("statute.json"),
        r#"{"text": "제3조 임차인은 주택의 인도와 주민등록을 마친 때에 대항력이 생긴다."}"#,
    )
    .expect("statute");
    fs::write(
        dir.join("clauses.csv"),
        "번호,특약내용\n1,근저당권 설정을 금지한다.\n2,\n3,보증금은 즉시 반환한다.\n",
    )
    .expect("clauses");
}

#[test]
fn loads_all_sources_with_fixed_tags() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_all_sources(dir.path());

    let docs = load_corpus(&paths_in(dir.path()));

    let qa = docs.iter().filter(|d| d.tag == SourceTag::Qa).count();
    let statute = docs.iter().filter(|d| d.tag == SourceTag::Statute).count();
    let clause = docs.iter().filter(|d| d.tag == SourceTag::Clause).count();
    // Malformed and empty records are skipped, not fatal.
    assert_eq!(qa, 2);
    assert_eq!(statute, 1);
    assert_eq!(clause, 2);

    let first_qa = docs.iter().find(|d| d.tag == SourceTag::Qa).expect("qa doc");
    assert!(first_qa.content.starts_with("Case question:"));
    assert!(first_qa.content.contains("Case answer:"));

    let clause_doc = docs.iter().find(|d| d.tag == SourceTag::Clause).expect("clause doc");
    assert!(clause_doc
        .content
        .starts_with("Recommended special clause example:"));
}

#[test]
fn missing_sources_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Only the statute file exists.
    fs::write(
        dir.path().join("statute.json"),
        r#"{"text": "제3조 대항력."}"#,
    )
    .expect("statute");

    let docs = load_corpus(&paths_in(dir.path()));
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].tag, SourceTag::Statute);
}

#[test]
fn no_sources_yields_an_empty_corpus() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docs = load_corpus(&paths_in(dir.path()));
    assert!(docs.is_empty());
}

#[test]
fn statute_without_text_is_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("statute.json"), r#"{"text": "  "}"#).expect("statute");

    let docs = load_corpus(&paths_in(dir.path()));
    assert!(docs.is_empty());
}

#[test]
fn clause_table_without_the_expected_column_is_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("clauses.csv"), "번호,내용\n1,무언가\n").expect("clauses");

    let docs = load_corpus(&paths_in(dir.path()));
    assert!(docs.is_empty());
}

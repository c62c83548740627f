use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use lcr_ai::analysis::{analyze_contract, answer_question, PipelineOptions};
use lcr_ai::chunking::TextChunk;
use lcr_ai::corpus::SourceTag;
use lcr_ai::embeddings::Embedder;
use lcr_ai::groundedness::GroundednessCheck;
use lcr_ai::index::CollectionStore;
use lcr_ai::llm::ChatModel;
use lcr_ai::retrieve::Retriever;
use lcr_core::domain::{AnalysisMode, GroundednessLabel, GroundednessVerdict};
use lcr_core::error::AppError;

struct LenEmbedder;

impl Embedder for LenEmbedder {
    fn embed_document(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let bytes = input.as_bytes();
        let first = bytes.first().copied().unwrap_or(0) as f32;
        Ok(vec![bytes.len() as f32, first, 1.0])
    }

    fn embed_query(&self, input: &str) -> Result<Vec<f32>, AppError> {
        self.embed_document(input)
    }

    fn model_family(&self) -> &str {
        "mock"
    }
}

/// Records every prompt; optionally fails grounded (RAG) prompts.
struct RecordingModel {
    prompts: Mutex<Vec<String>>,
    fail_grounded: bool,
}

impl RecordingModel {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail_grounded: false,
        }
    }

    fn failing_grounded() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail_grounded: true,
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

impl ChatModel for RecordingModel {
    fn complete(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().expect("lock").push(prompt.to_string());
        if self.fail_grounded && prompt.contains("[Reference]") {
            return Err(AppError::new("AI_GENERATION_FAILED", "scripted failure"));
        }
        Ok("analysis body".to_string())
    }
}

struct StaticChecker {
    calls: AtomicUsize,
    fail: bool,
}

impl StaticChecker {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GroundednessCheck for StaticChecker {
    fn check(&self, _answer: &str, _evidence: &str) -> Result<GroundednessVerdict, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::new("AI_GROUNDEDNESS_FAILED", "scripted failure"));
        }
        Ok(GroundednessVerdict {
            label: GroundednessLabel::Grounded,
            rationale: None,
        })
    }
}

fn opts() -> PipelineOptions {
    PipelineOptions {
        top_k: 5,
        split_threshold_tokens: 2000,
    }
}

fn built_store(dir: &std::path::Path) -> CollectionStore {
    let chunks = vec![
        TextChunk {
            content: "보증금은 계약 종료 시 즉시 반환되어야 한다.".to_string(),
            tag: SourceTag::Statute,
            chunk_index: 0,
        },
        TextChunk {
            content: "Case question: 근저당이 있는 집은 위험한가요?\nCase answer: 대항력 확보가 어렵습니다.".to_string(),
            tag: SourceTag::Qa,
            chunk_index: 0,
        },
    ];
    let store = CollectionStore::open(dir.join("kb"));
    store
        .build(&chunks, &LenEmbedder, "2026-08-01T00:00:00Z")
        .expect("build");
    store
}

#[test]
fn short_contract_takes_the_normal_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = built_store(dir.path());
    let embedder = LenEmbedder;
    let retriever = Retriever::new(store, &embedder);
    let model = RecordingModel::new();
    let checker = StaticChecker::new();

    // ~50 chars: well under the split threshold.
    let contract = "임대인은 계약 종료 즉시 보증금을 반환한다. 특약 없음.";
    let outcome = analyze_contract(Some(&retriever), &model, &checker, &opts(), contract)
        .expect("analyze");

    assert_eq!(outcome.mode, AnalysisMode::Normal);
    assert_eq!(outcome.markdown, "analysis body");
    // Exactly one generation call and one groundedness call.
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("[Reference]"));
    assert!(prompts[0].contains(contract));
    assert_eq!(checker.call_count(), 1);
    assert_eq!(
        outcome.groundedness.expect("verdict").label,
        GroundednessLabel::Grounded
    );
}

#[test]
fn oversized_contract_splits_into_labeled_parts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = built_store(dir.path());
    let embedder = LenEmbedder;
    let retriever = Retriever::new(store, &embedder);
    let model = RecordingModel::new();
    let checker = StaticChecker::new();

    // 20_000 chars at threshold 2000 tokens (8000 chars).
    let para = "제1조 임대인은 임차인에게 주택을 인도한다. ".repeat(40);
    let paras: Vec<String> = (0..10).map(|_| para.clone()).collect();
    let contract = paras.join("\n\n");
    assert!(contract.chars().count() >= 8_000);

    let outcome = analyze_contract(Some(&retriever), &model, &checker, &opts(), &contract)
        .expect("analyze");

    assert_eq!(outcome.mode, AnalysisMode::Split);
    assert!(outcome.markdown.contains("## Part 1/"));
    assert!(outcome.markdown.matches("## Part").count() >= 2);

    // Part analyses run without retrieval augmentation.
    let prompts = model.prompts();
    assert!(prompts.len() >= 2);
    assert!(prompts.iter().all(|p| !p.contains("[Reference]")));

    // Every paragraph of the input is covered by exactly one part prompt.
    let all_prompts = prompts.join("\n");
    assert!(all_prompts.contains(para.trim()));

    // Groundedness ran once, over the full input.
    assert_eq!(checker.call_count(), 1);
    assert!(outcome.groundedness.is_some());
}

#[test]
fn absent_retriever_degrades_without_groundedness() {
    let model = RecordingModel::new();
    let checker = StaticChecker::new();

    let outcome = analyze_contract(None, &model, &checker, &opts(), "짧은 계약서")
        .expect("analyze");

    assert_eq!(outcome.mode, AnalysisMode::Degraded);
    assert!(outcome.groundedness.is_none());
    assert_eq!(checker.call_count(), 0);
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("[Reference]"));
}

#[test]
fn unbuilt_collection_degrades_gracefully() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = CollectionStore::open(dir.path().join("never-built"));
    let embedder = LenEmbedder;
    let retriever = Retriever::new(store, &embedder);
    let model = RecordingModel::new();
    let checker = StaticChecker::new();

    let outcome = analyze_contract(Some(&retriever), &model, &checker, &opts(), "짧은 계약서")
        .expect("analyze");

    assert_eq!(outcome.mode, AnalysisMode::Degraded);
    assert!(outcome.groundedness.is_none());
    assert_eq!(checker.call_count(), 0);
}

#[test]
fn grounded_generation_failure_retries_once_simplified() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = built_store(dir.path());
    let embedder = LenEmbedder;
    let retriever = Retriever::new(store, &embedder);
    let model = RecordingModel::failing_grounded();
    let checker = StaticChecker::new();

    let outcome = analyze_contract(Some(&retriever), &model, &checker, &opts(), "짧은 계약서")
        .expect("analyze");

    // The simplified retry succeeded; the result is reported as degraded.
    assert_eq!(outcome.mode, AnalysisMode::Degraded);
    assert!(outcome.groundedness.is_none());
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("[Reference]"));
    assert!(!prompts[1].contains("[Reference]"));
}

#[test]
fn groundedness_failure_is_advisory_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = built_store(dir.path());
    let embedder = LenEmbedder;
    let retriever = Retriever::new(store, &embedder);
    let model = RecordingModel::new();
    let checker = StaticChecker::failing();

    let outcome = analyze_contract(Some(&retriever), &model, &checker, &opts(), "짧은 계약서")
        .expect("analyze");

    // The answer is still returned; the verdict records unknown.
    assert_eq!(outcome.mode, AnalysisMode::Normal);
    assert_eq!(outcome.markdown, "analysis body");
    assert_eq!(
        outcome.groundedness.expect("verdict").label,
        GroundednessLabel::Unknown
    );
}

#[test]
fn empty_contract_is_rejected() {
    let model = RecordingModel::new();
    let checker = StaticChecker::new();
    let err = analyze_contract(None, &model, &checker, &opts(), "   ").unwrap_err();
    assert_eq!(err.code, "AI_INPUT_EMPTY");
}

#[test]
fn question_normal_and_degraded_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = built_store(dir.path());
    let embedder = LenEmbedder;
    let retriever = Retriever::new(store, &embedder);
    let model = RecordingModel::new();
    let checker = StaticChecker::new();

    let grounded = answer_question(
        Some(&retriever),
        &model,
        &checker,
        &opts(),
        "전세 보증금은 언제 돌려받나요?",
    )
    .expect("answer");
    assert_eq!(grounded.mode, AnalysisMode::Normal);
    assert!(grounded.groundedness.is_some());
    assert_eq!(checker.call_count(), 1);

    let plain_model = RecordingModel::new();
    let plain = answer_question(None, &plain_model, &checker, &opts(), "질문입니다?")
        .expect("answer");
    assert_eq!(plain.mode, AnalysisMode::Degraded);
    assert!(plain.groundedness.is_none());
    let prompts = plain_model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("[Reference]"));
}

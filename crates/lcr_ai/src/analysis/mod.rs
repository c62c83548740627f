use lcr_core::domain::{AnalysisMode, GroundednessVerdict};
use lcr_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::{assemble, SubjectKind};
use crate::groundedness::GroundednessCheck;
use crate::llm::ChatModel;
use crate::prompts;
use crate::retrieve::Retriever;

const PART_SEPARATOR: &str = "\n\n---\n\n";

/// Per-invocation knobs the orchestrator reads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub top_k: u32,
    pub split_threshold_tokens: u32,
}

/// Result of one analysis or consultation invocation. The caller always gets
/// either usable markdown or an explicit error; failed split parts appear as
/// clearly labeled sections, never as raw template text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub markdown: String,
    pub mode: AnalysisMode,
    pub groundedness: Option<GroundednessVerdict>,
}

/// Rough token estimate: one token per four characters. Only used to compare
/// against the split threshold, so precision does not matter.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Partition text at paragraph boundaries by greedy token-budget
/// accumulation. Every paragraph lands in exactly one part; a part holds as
/// many consecutive paragraphs as fit under the budget. A single paragraph
/// over budget becomes its own part rather than being cut.
pub fn split_for_analysis(text: &str, max_tokens: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let candidate = if buf.is_empty() {
            para.to_string()
        } else {
            format!("{buf}\n\n{para}")
        };
        if !buf.is_empty() && estimate_tokens(&candidate) > max_tokens {
            parts.push(std::mem::take(&mut buf));
            buf = para.to_string();
        } else {
            buf = candidate;
        }
    }
    if !buf.trim().is_empty() {
        parts.push(buf);
    }
    parts
}

/// Analyze a lease contract, choosing the path per invocation:
/// retrieval-grounded (`Normal`), token-budget split (`Split`), or plain
/// generation when grounding is unavailable (`Degraded`).
pub fn analyze_contract(
    retriever: Option<&Retriever<'_>>,
    llm: &dyn ChatModel,
    checker: &dyn GroundednessCheck,
    opts: &PipelineOptions,
    contract_text: &str,
) -> Result<AnalysisOutcome, AppError> {
    let text = contract_text.trim();
    if text.is_empty() {
        return Err(AppError::new("AI_INPUT_EMPTY", "Contract text must not be empty"));
    }

    let Some(retriever) = retriever else {
        info!("retriever absent; running degraded contract analysis");
        return degraded_contract(llm, text);
    };

    let tokens = estimate_tokens(text);
    if tokens > opts.split_threshold_tokens as usize {
        info!(
            tokens,
            threshold = opts.split_threshold_tokens,
            "token budget exceeded; splitting input"
        );
        return split_contract(retriever, llm, checker, opts, text);
    }

    // Embedding failure here is fatal to the call; an unbuilt collection is
    // not (empty retrieval means no grounding available).
    let retrieved = retriever.retrieve(text, opts.top_k)?;
    if retrieved.is_empty() {
        info!("no grounding retrieved; running degraded contract analysis");
        return degraded_contract(llm, text);
    }

    let ctx = assemble(&retrieved, text, SubjectKind::Contract);
    let markdown = match llm.complete(&prompts::contract_analysis_prompt(&ctx)) {
        Ok(md) => md,
        Err(e) => {
            // One simplified retry without retrieval; the result is a
            // non-grounded answer and is reported as such.
            warn!(error = %e, "grounded generation failed; retrying once without retrieval");
            return degraded_contract(llm, text);
        }
    };

    let verdict = advisory_check(checker, &markdown, &ctx.render());
    Ok(AnalysisOutcome {
        markdown,
        mode: AnalysisMode::Normal,
        groundedness: Some(verdict),
    })
}

/// Answer a consultation question with retrieval grounding when available.
pub fn answer_question(
    retriever: Option<&Retriever<'_>>,
    llm: &dyn ChatModel,
    checker: &dyn GroundednessCheck,
    opts: &PipelineOptions,
    question: &str,
) -> Result<AnalysisOutcome, AppError> {
    let q = question.trim();
    if q.is_empty() {
        return Err(AppError::new("AI_INPUT_EMPTY", "Question must not be empty"));
    }

    let retrieved = match retriever {
        Some(r) => r.retrieve(q, opts.top_k)?,
        None => crate::retrieve::RetrievalResult::empty(),
    };
    if retrieved.is_empty() {
        info!("no grounding retrieved; answering without references");
        let markdown = llm.complete(&prompts::simple_question_prompt(q))?;
        return Ok(AnalysisOutcome {
            markdown,
            mode: AnalysisMode::Degraded,
            groundedness: None,
        });
    }

    let ctx = assemble(&retrieved, q, SubjectKind::Question);
    let markdown = llm.complete(&prompts::question_prompt(&ctx))?;
    let verdict = advisory_check(checker, &markdown, &ctx.render());
    Ok(AnalysisOutcome {
        markdown,
        mode: AnalysisMode::Normal,
        groundedness: Some(verdict),
    })
}

fn degraded_contract(llm: &dyn ChatModel, text: &str) -> Result<AnalysisOutcome, AppError> {
    let markdown = llm.complete(&prompts::simple_contract_prompt(text))?;
    Ok(AnalysisOutcome {
        markdown,
        mode: AnalysisMode::Degraded,
        groundedness: None,
    })
}

fn split_contract(
    retriever: &Retriever<'_>,
    llm: &dyn ChatModel,
    checker: &dyn GroundednessCheck,
    opts: &PipelineOptions,
    text: &str,
) -> Result<AnalysisOutcome, AppError> {
    let parts = split_for_analysis(text, opts.split_threshold_tokens as usize);
    let total = parts.len();
    info!(parts = total, "analyzing split contract");

    let mut sections: Vec<String> = Vec::with_capacity(total);
    for (i, part) in parts.iter().enumerate() {
        let n = i + 1;
        // Parts are analyzed standalone, without retrieval augmentation.
        match llm.complete(&prompts::simple_contract_prompt(part)) {
            Ok(body) => sections.push(format!("## Part {n}/{total} analysis\n\n{body}")),
            Err(e) => {
                warn!(part = n, error = %e, "part analysis failed");
                sections.push(format!(
                    "## Part {n}/{total} analysis failed\n\nThe analysis service returned an error for this part: {e}"
                ));
            }
        }
    }

    // One advisory check over the full input against evidence retrieved on
    // the full input, not per part.
    let groundedness = match retriever.retrieve(text, opts.top_k) {
        Ok(retrieved) if !retrieved.is_empty() => {
            let ctx = assemble(&retrieved, text, SubjectKind::Contract);
            Some(advisory_check(checker, text, &ctx.retrieved_text))
        }
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "retrieval for split groundedness failed");
            Some(GroundednessVerdict::unknown())
        }
    };

    Ok(AnalysisOutcome {
        markdown: sections.join(PART_SEPARATOR),
        mode: AnalysisMode::Split,
        groundedness,
    })
}

fn advisory_check(
    checker: &dyn GroundednessCheck,
    answer: &str,
    evidence: &str,
) -> GroundednessVerdict {
    match checker.check(answer, evidence) {
        Ok(verdict) => {
            info!(label = verdict.label.as_str(), "groundedness verdict");
            verdict
        }
        Err(e) => {
            // Advisory only: the answer is still returned.
            warn!(error = %e, "groundedness check failed; recording unknown");
            GroundednessVerdict::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_is_quarter_of_chars() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens(&"가".repeat(8000)), 2000);
    }

    #[test]
    fn split_covers_every_paragraph_in_order() {
        let paras: Vec<String> = (0..10).map(|i| format!("paragraph {i} {}", "x".repeat(400))).collect();
        let text = paras.join("\n\n");
        let parts = split_for_analysis(&text, 150);
        assert!(parts.len() >= 2);
        let joined = parts.join("\n\n");
        for p in &paras {
            assert!(joined.contains(p.as_str()));
        }
        // Order preserved across the concatenation.
        let mut last = 0;
        for p in &paras {
            let at = joined.find(p.as_str()).expect("paragraph present");
            assert!(at >= last);
            last = at;
        }
    }

    #[test]
    fn short_text_is_a_single_part() {
        let parts = split_for_analysis("one short paragraph", 2000);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn oversized_single_paragraph_becomes_its_own_part() {
        let big = "y".repeat(4000);
        let text = format!("small one\n\n{big}\n\nsmall two");
        let parts = split_for_analysis(&text, 100);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], big);
    }
}

use serde::{Deserialize, Serialize};

/// Path the orchestrator took for one analysis invocation. Chosen per call;
/// no state is carried across invocations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Retrieval-grounded single-pass analysis.
    Normal,
    /// Input exceeded the token budget; analyzed in parts without retrieval.
    Split,
    /// Retrieval unavailable (or RAG generation failed); plain analysis.
    Degraded,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Normal => "normal",
            AnalysisMode::Split => "split",
            AnalysisMode::Degraded => "degraded",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroundednessLabel {
    Grounded,
    NotGrounded,
    Unknown,
}

impl GroundednessLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroundednessLabel::Grounded => "grounded",
            GroundednessLabel::NotGrounded => "not_grounded",
            GroundednessLabel::Unknown => "unknown",
        }
    }
}

/// Advisory fact-consistency verdict for one generation call. Logged and
/// attached to diagnostics; never gates whether the answer is returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundednessVerdict {
    pub label: GroundednessLabel,
    pub rationale: Option<String>,
}

impl GroundednessVerdict {
    pub fn unknown() -> Self {
        Self {
            label: GroundednessLabel::Unknown,
            rationale: None,
        }
    }
}

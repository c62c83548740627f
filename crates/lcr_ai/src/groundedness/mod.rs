use lcr_core::domain::GroundednessVerdict;
use lcr_core::error::AppError;

/// Fact-consistency scoring of a generated answer against retrieved evidence.
///
/// Advisory only: the orchestrator records the verdict but never withholds an
/// answer because of it.
pub trait GroundednessCheck {
    fn check(&self, answer: &str, evidence: &str) -> Result<GroundednessVerdict, AppError>;
}

pub mod upstage_check;

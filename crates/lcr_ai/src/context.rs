use crate::retrieve::RetrievalResult;

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// What the grounding subject is; picks the section label so downstream
/// scoring can tell evidence apart from the claim under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Contract,
    Question,
}

impl SubjectKind {
    fn label(&self) -> &'static str {
        match self {
            SubjectKind::Contract => "[Contract]",
            SubjectKind::Question => "[Question]",
        }
    }
}

/// Retrieved evidence plus the verbatim subject text, assembled for one
/// generation call. Transient: built per invocation, never persisted.
#[derive(Debug, Clone)]
pub struct GroundingContext {
    pub retrieved_text: String,
    pub subject_text: String,
    pub kind: SubjectKind,
}

impl GroundingContext {
    /// Single grounding string with explicit section delimiters. The subject
    /// is carried verbatim; it is never truncated or altered here.
    pub fn render(&self) -> String {
        format!(
            "[Reference]\n{}\n\n{}\n{}",
            self.retrieved_text,
            self.kind.label(),
            self.subject_text
        )
    }
}

/// Concatenate retrieved chunks in ranked order, each tagged with its source
/// and separated by an explicit delimiter.
pub fn assemble(
    retrieved: &RetrievalResult,
    subject_text: &str,
    kind: SubjectKind,
) -> GroundingContext {
    let blocks: Vec<String> = retrieved
        .hits
        .iter()
        .map(|hit| format!("(source: {})\n{}", hit.chunk.tag.as_str(), hit.chunk.content))
        .collect();
    GroundingContext {
        retrieved_text: blocks.join(BLOCK_SEPARATOR),
        subject_text: subject_text.to_string(),
        kind,
    }
}

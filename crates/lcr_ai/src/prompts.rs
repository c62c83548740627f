use crate::context::GroundingContext;

/// Retrieval-grounded contract analysis.
pub fn contract_analysis_prompt(ctx: &GroundingContext) -> String {
    format!(
        r#"You are a Korean real-estate legal expert. Using the [Reference] material, analyze the following [Contract] and explain in detail whether it contains clauses that disadvantage the tenant or is missing clauses the tenant needs. Format the answer as clear markdown.

[Reference]
{context}

[Contract]
{subject}

[Analysis request]
1. **Clauses unfavorable to the tenant**: point out toxic clauses or terms that commonly work against tenants.
2. **Missing key clauses**: based on the reference material, check for protective clauses that should be present but are absent.
3. **Improvements and alternatives**: for each problem found, suggest concretely how to amend or add clauses.
4. **Overall legal advice**: give an overall opinion on the contract and anything else the tenant should verify.
"#,
        context = ctx.retrieved_text,
        subject = ctx.subject_text,
    )
}

/// Plain contract analysis without retrieved references; used for split parts
/// and as the degraded fallback.
pub fn simple_contract_prompt(contract: &str) -> String {
    format!(
        r#"As a Korean real-estate legal expert, analyze the following [Contract] from the tenant's point of view. Format the answer as clear markdown with these sections:
1. **Clauses unfavorable to the tenant**: point out toxic clauses or terms that commonly work against tenants.
2. **Missing key clauses**: check for protective clauses that should be present but are absent.
3. **Improvements and alternatives**: for each problem found, suggest concretely how to amend or add clauses.
4. **Overall legal advice**: give an overall opinion on the contract and anything else the tenant should verify.

[Contract]
{contract}
"#
    )
}

/// Retrieval-grounded consultation answer.
pub fn question_prompt(ctx: &GroundingContext) -> String {
    format!(
        r#"You are a Korean real-estate legal expert. Using the [Reference] material, answer the user's [Question] kindly and in detail, formatted as clear markdown. State that the answer has no legal effect and recommend consulting a professional. Start directly with the substance: do not open with meta remarks about the reference material or how the answer was produced. For each key claim, quote the relevant reference passage or statute wording briefly in quotation marks.

[Reference]
{context}

[Question]
{subject}
"#,
        context = ctx.retrieved_text,
        subject = ctx.subject_text,
    )
}

/// Consultation answer without references (degraded path).
pub fn simple_question_prompt(question: &str) -> String {
    format!(
        r#"You are a Korean real-estate legal expert. Answer the user's [Question] kindly and in detail, formatted as clear markdown. State that the answer has no legal effect and recommend consulting a professional. Start directly with the substance.

[Question]
{question}
"#
    )
}

/// First landlord-extraction pass: the bare name only.
pub fn landlord_name_prompt(contract: &str) -> String {
    format!(
        r#"From the following lease contract text, extract only the name of the landlord (임대인/집주인). Reply with the name alone and nothing else (e.g. 홍길동). If there is no name, reply 없음.

{contract}
"#
    )
}

/// Second landlord-extraction pass: the full line containing the name.
pub fn landlord_sentence_prompt(contract: &str) -> String {
    format!(
        r#"From the following lease contract text, reply with the exact line or sentence that contains the landlord's (임대인/집주인) name.

{contract}
"#
    )
}

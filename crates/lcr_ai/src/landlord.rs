use tracing::{debug, warn};

use crate::llm::ChatModel;
use crate::prompts;

fn is_hangul(ch: char) -> bool {
    ('가'..='힣').contains(&ch)
}

/// A bare answer is accepted when, spaces removed, it is a 2-5 char Hangul run.
fn validate_bare_name(answer: &str) -> Option<String> {
    let compact: String = answer.chars().filter(|c| !c.is_whitespace()).collect();
    let len = compact.chars().count();
    if (2..=5).contains(&len) && compact.chars().all(is_hangul) {
        Some(compact)
    } else {
        None
    }
}

/// First Hangul run of at least 2 chars in free text, capped at 5 chars.
fn scan_for_name(text: &str) -> Option<String> {
    let mut run = String::new();
    for ch in text.chars() {
        if is_hangul(ch) {
            run.push(ch);
            continue;
        }
        if run.chars().count() >= 2 {
            break;
        }
        run.clear();
    }
    let len = run.chars().count();
    if len < 2 {
        return None;
    }
    Some(run.chars().take(5).collect())
}

/// Extract the landlord's name from the contract, escalating through two
/// model passes: the bare name first, then the containing sentence scanned in
/// code. Failure is a typed `None`; the rule layer surfaces it as an alert
/// asking for manual verification.
pub fn extract_landlord_name(llm: &dyn ChatModel, contract_text: &str) -> Option<String> {
    match llm.complete(&prompts::landlord_name_prompt(contract_text)) {
        Ok(answer) => {
            if answer.trim() == "없음" {
                debug!("landlord extraction: model reports no name present");
                return None;
            }
            if let Some(name) = validate_bare_name(&answer) {
                debug!(name = %name, "landlord extraction succeeded on first pass");
                return Some(name);
            }
        }
        Err(e) => {
            warn!(error = %e, "landlord extraction first pass failed");
        }
    }

    match llm.complete(&prompts::landlord_sentence_prompt(contract_text)) {
        Ok(sentence) => {
            if let Some(name) = scan_for_name(&sentence) {
                debug!(name = %name, "landlord extraction succeeded on second pass");
                return Some(name);
            }
            debug!("landlord extraction: no Hangul name in returned sentence");
            None
        }
        Err(e) => {
            warn!(error = %e, "landlord extraction second pass failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_validation() {
        assert_eq!(validate_bare_name("홍길동"), Some("홍길동".to_string()));
        assert_eq!(validate_bare_name(" 홍 길 동 "), Some("홍길동".to_string()));
        assert_eq!(validate_bare_name("이름은 홍길동입니다"), None);
        assert_eq!(validate_bare_name("김"), None);
        assert_eq!(validate_bare_name("John"), None);
    }

    #[test]
    fn sentence_scan_takes_first_run_capped_at_five() {
        assert_eq!(
            scan_for_name("임대인: 홍길동 (서울)"),
            Some("임대인".to_string())
        );
        assert_eq!(scan_for_name("lessor is 홍길동."), Some("홍길동".to_string()));
        assert_eq!(scan_for_name("no korean text"), None);
        assert_eq!(
            scan_for_name("가나다라마바사"),
            Some("가나다라마".to_string())
        );
    }
}

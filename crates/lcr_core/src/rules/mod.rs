use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deterministic keyword scan over the contract text.
///
/// Each category lists the clause vocabulary a safe lease is expected to
/// touch. A category counts as covered when at least half of its keywords
/// appear; uncovered categories deduct from the safety score by risk tier.
/// Ordering rules are stable so outputs are snapshot-testable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Critical,
    Warning,
    Advisory,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Advisory,
    Ok,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleAlert {
    pub severity: AlertSeverity,
    pub code: String,
    pub message: String,
}

impl RuleAlert {
    fn new(severity: AlertSeverity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleAnalysis {
    /// 0..=100. Starts at 100; tier deductions bring it down, floored at 0.
    pub safety_score: i64,
    pub alerts: Vec<RuleAlert>,
}

struct ClauseCategory {
    code: &'static str,
    display: &'static str,
    // Korean clause vocabulary; matched verbatim against the contract text.
    keywords: &'static [&'static str],
    tier: RiskTier,
}

const CATEGORIES: &[ClauseCategory] = &[
    ClauseCategory {
        code: "RULE_DEPOSIT_RETURN",
        display: "Deposit return",
        keywords: &["보증금", "반환", "즉시", "계약종료"],
        tier: RiskTier::Critical,
    },
    ClauseCategory {
        code: "RULE_PRIORITY_STATUS",
        display: "Priority and lien status",
        keywords: &["권리관계", "익일", "근저당", "대항력"],
        tier: RiskTier::Critical,
    },
    ClauseCategory {
        code: "RULE_LEASE_LOAN",
        display: "Lease deposit loan",
        keywords: &["대출", "불가", "무효", "전세자금"],
        tier: RiskTier::Warning,
    },
    ClauseCategory {
        code: "RULE_REPAIR_DUTY",
        display: "Repair duty",
        keywords: &["수선", "하자", "파손", "수리"],
        tier: RiskTier::Advisory,
    },
    ClauseCategory {
        code: "RULE_SPECIAL_CLAUSES",
        display: "Special clauses",
        keywords: &["특약", "기타사항", "추가조건"],
        tier: RiskTier::Advisory,
    },
];

fn tier_deduction(tier: RiskTier) -> i64 {
    match tier {
        RiskTier::Critical => 40,
        RiskTier::Warning => 20,
        RiskTier::Advisory => 10,
    }
}

fn tier_alert_severity(tier: RiskTier) -> AlertSeverity {
    match tier {
        RiskTier::Critical => AlertSeverity::Critical,
        RiskTier::Warning => AlertSeverity::Warning,
        RiskTier::Advisory => AlertSeverity::Advisory,
    }
}

fn missing_message(display: &str, tier: RiskTier) -> String {
    match tier {
        RiskTier::Critical => format!(
            "{display}: required clauses are missing or incomplete; this can cause serious harm to the tenant."
        ),
        RiskTier::Warning => format!(
            "{display}: related clauses are insufficient and need attention."
        ),
        RiskTier::Advisory => format!(
            "{display}: strengthening the related clauses is recommended to prevent disputes."
        ),
    }
}

/// Severity-first, then original category order (stable sort).
fn sort_alerts(alerts: &mut [RuleAlert]) {
    alerts.sort_by_key(|a| a.severity);
}

pub fn analyze_contract_rules(contract_text: &str) -> RuleAnalysis {
    let mut score: i64 = 100;
    let mut alerts: Vec<RuleAlert> = Vec::new();

    for cat in CATEGORIES {
        let present = cat
            .keywords
            .iter()
            .filter(|kw| contract_text.contains(*kw))
            .count();
        // Covered when at least half of the vocabulary appears.
        let covered = present * 2 >= cat.keywords.len();
        debug!(
            category = cat.code,
            present,
            total = cat.keywords.len(),
            covered,
            "rule category scan"
        );
        if covered {
            alerts.push(RuleAlert::new(
                AlertSeverity::Ok,
                cat.code,
                format!("{}: related clauses were found.", cat.display),
            ));
        } else {
            score -= tier_deduction(cat.tier);
            alerts.push(RuleAlert::new(
                tier_alert_severity(cat.tier),
                cat.code,
                missing_message(cat.display, cat.tier),
            ));
        }
    }

    score = score.max(0);
    sort_alerts(&mut alerts);

    RuleAnalysis {
        safety_score: score,
        alerts,
    }
}

/// Outcome of the landlord identity screening, folded into the rule analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LandlordScreening {
    /// Name extraction failed; manual verification required.
    NameNotFound,
    /// Landlord appears on the habitual defaulter list.
    Listed { name: String },
    /// Landlord was checked and is not on the list.
    Clear { name: String },
    /// The list file could not be read; screening skipped.
    ListUnavailable { details: String },
}

impl RuleAnalysis {
    pub fn record_landlord_screening(&mut self, screening: &LandlordScreening) {
        match screening {
            LandlordScreening::NameNotFound => {
                self.alerts.push(RuleAlert::new(
                    AlertSeverity::Warning,
                    "RULE_LANDLORD_NAME_NOT_FOUND",
                    "Landlord check: the landlord's name could not be extracted from the contract; verify manually.",
                ));
            }
            LandlordScreening::Listed { name } => {
                // Fatal finding: zero the score regardless of clause coverage.
                self.safety_score = 0;
                self.alerts.push(RuleAlert::new(
                    AlertSeverity::Critical,
                    "RULE_LANDLORD_DEFAULTER",
                    format!(
                        "Landlord check: '{name}' appears on the habitual defaulter list. Stop the contract and consult a professional immediately."
                    ),
                ));
            }
            LandlordScreening::Clear { name } => {
                self.alerts.push(RuleAlert::new(
                    AlertSeverity::Ok,
                    "RULE_LANDLORD_CLEAR",
                    format!("Landlord check: '{name}' is not on the habitual defaulter list."),
                ));
            }
            LandlordScreening::ListUnavailable { details } => {
                self.alerts.push(RuleAlert::new(
                    AlertSeverity::Warning,
                    "RULE_LANDLORD_LIST_UNAVAILABLE",
                    format!("Landlord check: the defaulter list could not be read ({details})."),
                ));
            }
        }
        sort_alerts(&mut self.alerts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_contract_deducts_every_category() {
        let res = analyze_contract_rules("");
        // 100 - 40 - 40 - 20 - 10 - 10 = -20, floored at 0.
        assert_eq!(res.safety_score, 0);
        assert_eq!(res.alerts.len(), CATEGORIES.len());
        assert!(res.alerts.iter().all(|a| a.severity != AlertSeverity::Ok));
        // Critical alerts sort first.
        assert_eq!(res.alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn covered_categories_keep_the_score() {
        let text = "임차인은 계약종료 시 보증금 반환을 즉시 요구할 수 있다. \
                    임대인은 권리관계를 유지하고 근저당을 설정하지 않으며 임차인은 대항력을 갖는다. \
                    전세자금 대출이 불가할 경우 계약은 무효로 한다. \
                    하자 및 파손의 수선, 수리는 임대인이 부담한다. \
                    특약 및 기타사항은 별지에 따른다.";
        let res = analyze_contract_rules(text);
        assert_eq!(res.safety_score, 100);
        assert!(res.alerts.iter().all(|a| a.severity == AlertSeverity::Ok));
    }

    #[test]
    fn half_coverage_counts_as_covered() {
        // Exactly 2 of 4 deposit keywords present.
        let text = "보증금 반환";
        let res = analyze_contract_rules(text);
        let deposit = res
            .alerts
            .iter()
            .find(|a| a.code == "RULE_DEPOSIT_RETURN")
            .expect("deposit alert");
        assert_eq!(deposit.severity, AlertSeverity::Ok);
    }

    #[test]
    fn determinism() {
        let text = "보증금 반환 특약";
        assert_eq!(analyze_contract_rules(text), analyze_contract_rules(text));
    }

    #[test]
    fn defaulter_hit_zeroes_the_score() {
        let mut res = analyze_contract_rules("보증금 반환 즉시 계약종료 권리관계 익일 근저당 대항력");
        assert!(res.safety_score > 0);
        res.record_landlord_screening(&LandlordScreening::Listed {
            name: "홍길동".to_string(),
        });
        assert_eq!(res.safety_score, 0);
        assert_eq!(res.alerts[0].code, "RULE_LANDLORD_DEFAULTER");
    }

    #[test]
    fn clear_screening_appends_ok_alert() {
        let mut res = analyze_contract_rules("");
        let before = res.safety_score;
        res.record_landlord_screening(&LandlordScreening::Clear {
            name: "홍길동".to_string(),
        });
        assert_eq!(res.safety_score, before);
        assert!(res
            .alerts
            .iter()
            .any(|a| a.code == "RULE_LANDLORD_CLEAR" && a.severity == AlertSeverity::Ok));
    }
}

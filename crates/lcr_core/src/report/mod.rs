use crate::domain::{AnalysisMode, GroundednessVerdict};
use crate::rules::{AlertSeverity, RuleAnalysis};

/// Inputs for one rendered report. The AI body is already markdown; rule
/// results and diagnostics are formatted here with stable ordering so the
/// output is snapshot-testable.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub source_label: &'a str,
    pub rules: &'a RuleAnalysis,
    pub ai_markdown: &'a str,
    pub mode: AnalysisMode,
    pub groundedness: Option<&'a GroundednessVerdict>,
    /// RFC3339; supplied by the host so rendering stays deterministic.
    pub generated_at: &'a str,
}

fn safety_grade(score: i64) -> String {
    if score >= 80 {
        format!("Safe ({score}/100)")
    } else if score >= 50 {
        format!("Caution ({score}/100)")
    } else if score >= 0 {
        format!("At risk ({score}/100)")
    } else {
        "Score unavailable".to_string()
    }
}

fn severity_marker(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Critical => "[CRITICAL]",
        AlertSeverity::Warning => "[WARNING]",
        AlertSeverity::Advisory => "[ADVISORY]",
        AlertSeverity::Ok => "[OK]",
    }
}

/// Render the combined analysis report as markdown.
pub fn render_report(input: &ReportInput<'_>) -> String {
    let mut out = String::new();

    out.push_str("# Lease Contract Analysis Report\n\n");
    out.push_str(&format!("- Source: **{}**\n", input.source_label));
    out.push_str(&format!("- Generated at: {}\n", input.generated_at));
    out.push_str(&format!(
        "- Safety grade: **{}**\n\n",
        safety_grade(input.rules.safety_score)
    ));

    out.push_str("## Rule check findings\n\n");
    if input.rules.alerts.is_empty() {
        out.push_str("- No findings.\n");
    } else {
        for alert in &input.rules.alerts {
            out.push_str(&format!(
                "- {} {}\n",
                severity_marker(alert.severity),
                alert.message
            ));
        }
    }
    out.push('\n');

    out.push_str("## AI analysis\n\n");
    out.push_str(input.ai_markdown.trim_end());
    out.push_str("\n\n");

    out.push_str("## Diagnostics\n\n");
    out.push_str(&format!("- Analysis mode: `{}`\n", input.mode.as_str()));
    match input.groundedness {
        Some(v) => {
            out.push_str(&format!("- Groundedness: `{}`\n", v.label.as_str()));
            if let Some(reason) = v.rationale.as_deref() {
                out.push_str(&format!("- Groundedness rationale: {reason}\n"));
            }
        }
        None => {
            out.push_str("- Groundedness: not checked\n");
        }
    }
    out.push_str(
        "\nThis report is informational and has no legal effect; consult a professional for binding advice.\n",
    );

    out
}

use serde::{Deserialize, Serialize};

/// Canonical approval phrase. The critic must emit it on a line of its own;
/// anything else counts as a request for revision.
pub const APPROVAL_MARKER: &str = "NO FURTHER CHANGES NEEDED";

/// Classification of one critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Artifact accepted as-is; the loop stops.
    Approved,
    /// Concrete issues remain; the critique feeds the next revision.
    Revise {
        critique: String,
        issues: Vec<String>,
    },
    /// Critique was empty, unparsable, or the call failed. Never fatal:
    /// the loop advances without fresh feedback.
    Degraded { reason: String },
}

impl Verdict {
    /// Classify raw critic output.
    ///
    /// Approval requires a whole-line, case-insensitive match of
    /// [`APPROVAL_MARKER`]; the phrase buried inside a longer sentence does
    /// not approve. A critique with no itemized issues is treated as
    /// degraded rather than actionable.
    pub fn from_critique(text: &str) -> Self {
        if text.trim().is_empty() {
            return Verdict::Degraded {
                reason: "empty critique".to_string(),
            };
        }

        if has_approval_line(text) {
            return Verdict::Approved;
        }

        let issues = itemized_issues(text);
        if issues.is_empty() {
            return Verdict::Degraded {
                reason: "critique contained no itemized issues".to_string(),
            };
        }

        Verdict::Revise {
            critique: text.trim().to_string(),
            issues,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Verdict::Degraded { .. })
    }

    /// Short form for log lines.
    pub fn short_description(&self) -> String {
        match self {
            Verdict::Approved => "APPROVED".to_string(),
            Verdict::Revise { issues, .. } => format!("REVISE ({} issues)", issues.len()),
            Verdict::Degraded { .. } => "DEGRADED".to_string(),
        }
    }
}

/// Whole-line match, tolerating surrounding whitespace and one trailing
/// period. Substring matches inside longer sentences are rejected.
fn has_approval_line(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim().trim_end_matches('.').trim_end();
        line.eq_ignore_ascii_case(APPROVAL_MARKER)
    })
}

/// Collect `- `, `* ` and `1. `-style bullet lines.
fn itemized_issues(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| strip_bullet(line.trim()))
        .map(|issue| issue.trim().to_string())
        .filter(|issue| !issue.is_empty())
        .collect()
}

fn strip_bullet(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some(rest);
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        return rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_marker_approves() {
        assert!(Verdict::from_critique("NO FURTHER CHANGES NEEDED").is_approved());
        assert!(Verdict::from_critique("  no further changes needed.  ").is_approved());
        assert!(Verdict::from_critique("Looks solid.\nNo Further Changes Needed").is_approved());
    }

    #[test]
    fn marker_inside_a_sentence_does_not_approve() {
        let critique =
            "Claiming there are no further changes needed would be premature.\n- Fix the overflow";
        let verdict = Verdict::from_critique(critique);
        assert!(!verdict.is_approved());
        assert!(matches!(verdict, Verdict::Revise { .. }));
    }

    #[test]
    fn bullets_become_issues() {
        let verdict = Verdict::from_critique(
            "Two problems remain:\n- missing input validation for negative numbers\n- no docstring",
        );
        match verdict {
            Verdict::Revise { issues, critique } => {
                assert_eq!(issues.len(), 2);
                assert_eq!(issues[0], "missing input validation for negative numbers");
                assert!(critique.contains("no docstring"));
            }
            other => panic!("expected Revise, got {other:?}"),
        }
    }

    #[test]
    fn numbered_lists_become_issues() {
        let verdict = Verdict::from_critique("1. handle zero\n2) add tests");
        match verdict {
            Verdict::Revise { issues, .. } => {
                assert_eq!(issues, vec!["handle zero", "add tests"])
            }
            other => panic!("expected Revise, got {other:?}"),
        }
    }

    #[test]
    fn empty_critique_is_degraded() {
        assert!(Verdict::from_critique("").is_degraded());
        assert!(Verdict::from_critique("   \n  ").is_degraded());
    }

    #[test]
    fn free_text_without_items_is_degraded() {
        let verdict = Verdict::from_critique("This is vaguely fine I suppose.");
        assert!(verdict.is_degraded());
    }

    #[test]
    fn classification_is_deterministic() {
        let critique = "- one thing to fix";
        assert_eq!(
            Verdict::from_critique(critique),
            Verdict::from_critique(critique)
        );
        assert_eq!(
            Verdict::from_critique(APPROVAL_MARKER),
            Verdict::from_critique(APPROVAL_MARKER)
        );
    }

    #[test]
    fn verdict_serializes_with_kind_tag() {
        let json = serde_json::to_value(Verdict::Approved).unwrap();
        assert_eq!(json["kind"], "approved");

        let json = serde_json::to_value(Verdict::Revise {
            critique: "c".into(),
            issues: vec!["i".into()],
        })
        .unwrap();
        assert_eq!(json["kind"], "revise");
        assert_eq!(json["issues"][0], "i");
    }
}

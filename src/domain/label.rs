/// Prefix shared by every results label on a ticket.
pub const RESULTS_LABEL_PREFIX: &str = "results_";

/// Suffix appended when no failing command was recorded.
const NO_FAILING_CMD_SUFFIX: char = 'X';

/// Compose the canonical results label for a ticket.
///
/// Format: `results_{stage}{flow}{result}`, with `X` appended when the
/// failing-command field is empty or whitespace-only. Pure and deterministic;
/// the backend computes the same label server-side and its value is
/// authoritative — this one is a preview for display before the check call
/// returns.
pub fn compose_results_label(stage: &str, flow: &str, result: &str, failing_cmd: &str) -> String {
    let mut label = format!("{RESULTS_LABEL_PREFIX}{stage}{flow}{result}");
    if failing_cmd.trim().is_empty() {
        label.push(NO_FAILING_CMD_SUFFIX);
    }
    label
}

/// Whether a label belongs to the results family.
pub fn is_results_label(label: &str) -> bool {
    label.starts_with(RESULTS_LABEL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_failing_cmd_appends_suffix() {
        assert_eq!(
            compose_results_label("build", "ci", "fail", ""),
            "results_buildcifailX"
        );
        assert_eq!(
            compose_results_label("build", "ci", "fail", "   \t"),
            "results_buildcifailX"
        );
    }

    #[test]
    fn non_empty_failing_cmd_omits_suffix() {
        assert_eq!(
            compose_results_label("build", "ci", "fail", "make test"),
            "results_buildcifail"
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let first = compose_results_label("S1", "F2", "R3", "cmd");
        let second = compose_results_label("S1", "F2", "R3", "cmd");
        assert_eq!(first, second);
    }

    #[test]
    fn recognizes_results_family() {
        assert!(is_results_label("results_S1F2R3X"));
        assert!(!is_results_label("triage_needed"));
    }
}

use super::TestStatus;
use crate::process::ProcessCapture;
use crate::registry::RegistryEntry;
use crate::scenarios::SKIP_MARKER;

/// Status of one finished child plus the reasons behind a FAILED verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Classification {
    pub status: TestStatus,
    pub failures: Vec<String>,
    /// `None` when the output was not inspected or nothing was expected.
    pub expected_found: Option<bool>,
}

/// Derive a status from exit code, captured stdout, and the database check.
pub(super) fn classify(
    entry: &RegistryEntry,
    capture: &ProcessCapture,
    database_present: bool,
) -> Classification {
    if capture.timed_out {
        return Classification {
            status: TestStatus::Timeout,
            failures: Vec::new(),
            expected_found: None,
        };
    }
    if capture.stdout.contains(SKIP_MARKER) {
        return Classification {
            status: TestStatus::Skipped,
            failures: Vec::new(),
            expected_found: None,
        };
    }

    let mut failures = Vec::new();
    if capture.exit_code != Some(0) {
        failures.push(format!("exit code {}", capture.exit_label()));
    }
    let expected_found = entry
        .expected_output
        .as_ref()
        .map(|expected| expected.found_in(&capture.stdout, entry.match_mode));
    if let (Some(false), Some(expected)) = (expected_found, &entry.expected_output) {
        failures.push(format!("expected output {expected} not found in stdout"));
    }
    if entry.requires_database && !database_present {
        failures.push("database file missing after run".to_string());
    }

    Classification {
        status: if failures.is_empty() {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        },
        failures,
        expected_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{default_registry, ExpectedOutput, MatchMode};
    use std::time::Duration;

    fn capture(exit_code: Option<i32>, stdout: &str, timed_out: bool) -> ProcessCapture {
        ProcessCapture {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            timed_out,
            duration: Duration::from_millis(5),
        }
    }

    fn entry(script: &str) -> RegistryEntry {
        default_registry().lookup(script)
    }

    #[test]
    fn passes_on_clean_exit_with_token_and_database() {
        let result = classify(
            &entry("add_prod_test"),
            &capture(Some(0), "Produit ajouté avec succès : Clavier\n", false),
            true,
        );
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.expected_found, Some(true));
    }

    #[test]
    fn mojibake_alternative_token_counts() {
        let result = classify(
            &entry("add_prod_test"),
            &capture(Some(0), "Produit ajoutÃ© avec succÃ¨s\n", false),
            true,
        );
        assert_eq!(result.status, TestStatus::Passed);
    }

    #[test]
    fn each_unmet_condition_is_reported() {
        let result = classify(
            &entry("delete_prod_test"),
            &capture(Some(1), "Échec du scénario delete_prod_test :\n", false),
            false,
        );
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(
            result.failures,
            [
                "exit code 1",
                "expected output \"Deleted\" not found in stdout",
                "database file missing after run",
            ]
        );
    }

    #[test]
    fn smoke_ignores_database() {
        let result = classify(
            &entry("smoke_test"),
            &capture(Some(0), "Binary opened and exited cleanly.\n", false),
            false,
        );
        assert_eq!(result.status, TestStatus::Passed);
    }

    #[test]
    fn timeout_wins_over_output() {
        let result = classify(
            &entry("list_prod_test"),
            &capture(None, "Liste des produits", true),
            true,
        );
        assert_eq!(result.status, TestStatus::Timeout);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn skip_marker_short_circuits() {
        let result = classify(
            &entry("list_prod_test"),
            &capture(Some(0), "[SKIPPED] list_prod_test: binaire introuvable\n", false),
            false,
        );
        assert_eq!(result.status, TestStatus::Skipped);
    }

    #[test]
    fn exact_mode_is_case_sensitive_normalized_is_not() {
        let mut entry = entry("list_prod_test");
        let output = capture(Some(0), "=== LISTE DES PRODUITS ===", false);
        assert_eq!(classify(&entry, &output, true).status, TestStatus::Failed);

        entry.match_mode = MatchMode::Normalized;
        assert_eq!(classify(&entry, &output, true).status, TestStatus::Passed);
    }

    #[test]
    fn no_expectation_means_exit_code_decides() {
        let mut entry = entry("custom_script");
        entry.expected_output = None;
        entry.requires_database = false;
        let result = classify(&entry, &capture(Some(0), "", false), false);
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.expected_found, None);

        entry.expected_output = Some(ExpectedOutput::One("ok".to_string()));
        let result = classify(&entry, &capture(Some(0), "", false), false);
        assert_eq!(result.status, TestStatus::Failed);
    }
}

//! Built-in scenario scripts.
//!
//! Each scenario drives the AUT through one user journey and reports a verdict
//! on stdout. Scenarios run in their own process (`stock-ci scenario <name>`)
//! so the runner judges them exactly like external scripts: exit code plus
//! expected token in stdout. Raw AUT output is echoed to stderr only.
mod analysis;
mod ids;
mod journeys;
mod session;
mod transcript;

pub use session::Aut;

use std::process::ExitCode;
use std::time::Duration;

/// Printed on stdout by a scenario that chose not to run.
pub const SKIP_MARKER: &str = "[SKIPPED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    ThemeInit,
    Smoke,
    AddProduct,
    ListProducts,
    ModifyProduct,
    DeleteProduct,
    FullJourney,
    Regression,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 8] = [
        ScenarioId::ThemeInit,
        ScenarioId::Smoke,
        ScenarioId::AddProduct,
        ScenarioId::ListProducts,
        ScenarioId::ModifyProduct,
        ScenarioId::DeleteProduct,
        ScenarioId::FullJourney,
        ScenarioId::Regression,
    ];

    pub fn script_name(self) -> &'static str {
        match self {
            ScenarioId::ThemeInit => "theme_init",
            ScenarioId::Smoke => "smoke_test",
            ScenarioId::AddProduct => "add_prod_test",
            ScenarioId::ListProducts => "list_prod_test",
            ScenarioId::ModifyProduct => "modify_prod_test",
            ScenarioId::DeleteProduct => "delete_prod_test",
            ScenarioId::FullJourney => "full_journey_test",
            ScenarioId::Regression => "regression_bug_test",
        }
    }

    /// Resolve a registry script name; a trailing `.py` is tolerated so
    /// registries written for the old Python scripts keep working.
    pub fn from_script_name(name: &str) -> Option<Self> {
        let name = name.strip_suffix(".py").unwrap_or(name);
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.script_name() == name)
    }

    /// Per-session wait for the AUT.
    pub fn default_timeout(self) -> Duration {
        match self {
            ScenarioId::ThemeInit | ScenarioId::Smoke => Duration::from_secs(5),
            ScenarioId::FullJourney => Duration::from_secs(20),
            _ => Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub aut: Aut,
    pub timeout: Option<Duration>,
    pub skip_when_aut_missing: bool,
}

impl ScenarioContext {
    fn timeout_for(&self, id: ScenarioId) -> Duration {
        self.timeout.unwrap_or_else(|| id.default_timeout())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioVerdict {
    Passed(Vec<String>),
    Failed(Vec<String>),
    Skipped(String),
}

impl ScenarioVerdict {
    fn from_failures(failures: Vec<String>, success: Vec<String>) -> Self {
        if failures.is_empty() {
            ScenarioVerdict::Passed(success)
        } else {
            ScenarioVerdict::Failed(failures)
        }
    }

    /// Print the verdict lines on stdout and map them to the process exit code.
    pub fn emit(&self, id: ScenarioId) -> ExitCode {
        match self {
            ScenarioVerdict::Passed(lines) => {
                for line in lines {
                    println!("{line}");
                }
                ExitCode::SUCCESS
            }
            ScenarioVerdict::Failed(failures) => {
                println!("Échec du scénario {} :", id.script_name());
                for failure in failures {
                    println!("  - {failure}");
                }
                ExitCode::FAILURE
            }
            ScenarioVerdict::Skipped(reason) => {
                println!("{SKIP_MARKER} {}: {reason}", id.script_name());
                ExitCode::SUCCESS
            }
        }
    }
}

/// Run one scenario to a verdict. Launch problems become failures.
pub fn run_scenario(id: ScenarioId, context: &ScenarioContext) -> ScenarioVerdict {
    if !context.aut.exists() && context.skip_when_aut_missing {
        return ScenarioVerdict::Skipped(format!(
            "binaire introuvable: {}",
            context.aut.binary.display()
        ));
    }
    tracing::info!(
        scenario = id.script_name(),
        aut = %context.aut.binary.display(),
        "running scenario"
    );
    match journeys::run(id, context) {
        Ok(verdict) => verdict,
        Err(err) => ScenarioVerdict::Failed(vec![format!("erreur inattendue : {err:#}")]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn script_names_round_trip() {
        for id in ScenarioId::ALL {
            assert_eq!(ScenarioId::from_script_name(id.script_name()), Some(id));
        }
        assert_eq!(
            ScenarioId::from_script_name("delete_prod_test.py"),
            Some(ScenarioId::DeleteProduct)
        );
        assert_eq!(ScenarioId::from_script_name("Theem.py"), None);
    }

    #[test]
    fn scenario_names_cover_default_registry() {
        let registry = crate::registry::default_registry();
        for entry in registry.entries() {
            assert!(
                ScenarioId::from_script_name(&entry.script).is_some(),
                "{} has no built-in scenario",
                entry.script
            );
        }
    }

    #[test]
    fn missing_aut_is_skipped_when_allowed() {
        let context = ScenarioContext {
            aut: Aut::new(Path::new("/nonexistent/gestion_stock"), Path::new("/")),
            timeout: None,
            skip_when_aut_missing: true,
        };
        let verdict = run_scenario(ScenarioId::Smoke, &context);
        assert!(matches!(verdict, ScenarioVerdict::Skipped(_)));
    }

    #[test]
    fn missing_aut_fails_by_default() {
        let context = ScenarioContext {
            aut: Aut::new(Path::new("/nonexistent/gestion_stock"), Path::new("/")),
            timeout: Some(Duration::from_secs(1)),
            skip_when_aut_missing: false,
        };
        let ScenarioVerdict::Failed(failures) = run_scenario(ScenarioId::AddProduct, &context)
        else {
            panic!("expected failure");
        };
        assert!(failures[0].contains("launch AUT"), "{failures:?}");
    }
}

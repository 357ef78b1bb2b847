//! Immutable table of test scripts and how their output is judged.
//!
//! The table is declared data: it is built once at startup (either the
//! built-in default or the `registry` array of the config file) and handed to
//! the runner by reference.
use crate::normalize::contains_normalized;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    Smoke,
    Ci,
    Weekly,
    NonTest,
    Unknown,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Smoke => "smoke",
            TestKind::Ci => "ci",
            TestKind::Weekly => "weekly",
            TestKind::NonTest => "non-test",
            TestKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Token(s) that must appear in a script's stdout for it to pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedOutput {
    One(String),
    AnyOf(Vec<String>),
}

impl ExpectedOutput {
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            ExpectedOutput::One(token) => vec![token.as_str()],
            ExpectedOutput::AnyOf(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }

    /// True when any token is found in `text`.
    pub fn found_in(&self, text: &str, mode: MatchMode) -> bool {
        self.tokens().into_iter().any(|token| match mode {
            MatchMode::Exact => text.contains(token),
            MatchMode::Normalized => contains_normalized(text, token),
        })
    }
}

impl fmt::Display for ExpectedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedOutput::One(token) => write!(f, "{token:?}"),
            ExpectedOutput::AnyOf(tokens) => write!(f, "any of {tokens:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-sensitive substring match on raw stdout.
    #[default]
    Exact,
    /// Substring match after accent stripping and case folding.
    Normalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub script: String,
    pub run: bool,
    #[serde(rename = "type")]
    pub kind: TestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<ExpectedOutput>,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default = "default_requires_database")]
    pub requires_database: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// Script location relative to the repo root; defaults to
    /// `<scripts_dir>/<script>` for scripts that are not built in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_requires_database() -> bool {
    true
}

impl RegistryEntry {
    fn declared(script: &str, run: bool, kind: TestKind) -> Self {
        RegistryEntry {
            script: script.to_string(),
            run,
            kind,
            expected_output: None,
            match_mode: MatchMode::Exact,
            requires_database: true,
            timeout_secs: None,
            stdin: None,
            path: None,
        }
    }

    fn expecting(mut self, expected: ExpectedOutput) -> Self {
        self.expected_output = Some(expected);
        self
    }

    fn without_database(mut self) -> Self {
        self.requires_database = false;
        self
    }

    /// Metadata assumed for a script the table does not mention.
    pub fn unregistered(script: &str) -> Self {
        RegistryEntry::declared(script, true, TestKind::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Build a registry, rejecting empty or duplicate script names.
    /// Names are stored trimmed so they resolve like the bare script name.
    pub fn new(mut entries: Vec<RegistryEntry>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for entry in &mut entries {
            entry.script = entry.script.trim().to_string();
            let name = entry.script.as_str();
            if name.is_empty() {
                return Err(anyhow!("registry entry with empty script name"));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(anyhow!(
                    "registry script {name:?} must be a bare name (use `path` for locations)"
                ));
            }
            if !seen.insert(name.to_string()) {
                return Err(anyhow!("duplicate registry entry {name:?}"));
            }
            if entry.timeout_secs == Some(0) {
                return Err(anyhow!("registry entry {name:?} has a zero timeout"));
            }
        }
        Ok(Registry { entries })
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn get(&self, script: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.script == script)
    }

    /// Registered metadata, or the `{run: true, type: unknown}` fallback.
    pub fn lookup(&self, script: &str) -> RegistryEntry {
        self.get(script)
            .cloned()
            .unwrap_or_else(|| RegistryEntry::unregistered(script))
    }

    /// Entries of the requested type (all when `None`), in table order.
    pub fn selected(&self, kind: Option<TestKind>) -> impl Iterator<Item = &RegistryEntry> {
        self.entries
            .iter()
            .filter(move |entry| match kind {
                Some(kind) => entry.kind == kind,
                None => true,
            })
    }
}

/// The table shipped with the harness.
pub fn default_registry() -> Registry {
    let entries = vec![
        RegistryEntry::declared("theme_init", false, TestKind::NonTest).without_database(),
        RegistryEntry::declared("smoke_test", true, TestKind::Smoke)
            .expecting(ExpectedOutput::One(
                "Binary opened and exited cleanly".to_string(),
            ))
            .without_database(),
        RegistryEntry::declared("add_prod_test", true, TestKind::Ci).expecting(
            ExpectedOutput::AnyOf(vec![
                "Produit ajouté avec succès".to_string(),
                // Same confirmation read back through a Latin-1 console.
                "Produit ajoutÃ© avec succÃ¨s".to_string(),
            ]),
        ),
        RegistryEntry::declared("list_prod_test", true, TestKind::Ci)
            .expecting(ExpectedOutput::One("Liste des produits".to_string())),
        RegistryEntry::declared("modify_prod_test", true, TestKind::Ci).expecting(
            ExpectedOutput::One(" Modification réussie pour ".to_string()),
        ),
        RegistryEntry::declared("delete_prod_test", true, TestKind::Ci)
            .expecting(ExpectedOutput::One("Deleted".to_string())),
        RegistryEntry::declared("full_journey_test", false, TestKind::Weekly),
        RegistryEntry::declared("regression_bug_test", true, TestKind::Ci)
            .expecting(ExpectedOutput::One("Cas de bug résolu".to_string())),
    ];
    Registry { entries }
}

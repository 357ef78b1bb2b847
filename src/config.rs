//! Harness configuration.
//!
//! `stock-ci.json` at the repo root is optional; every field has a default that
//! matches the layout of the gestion_stock repository. Relative paths resolve
//! against the repo root so the harness can be launched from anywhere.
use crate::registry::{default_registry, Registry, RegistryEntry};
use crate::version::DEFAULT_COMMIT_WINDOW;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_FILE_NAME: &str = "stock-ci.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_version: u32,
    pub aut_binary: String,
    pub build_dir: String,
    pub database_name: String,
    pub reports_dir: String,
    pub weekly_dir: String,
    pub logs_dir: String,
    pub scripts_dir: String,
    pub python: String,
    pub default_timeout_secs: u64,
    pub smoke_timeout_secs: u64,
    pub weekly_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_timeout_secs: Option<u64>,
    pub version_commit_window: usize,
    pub clean_database: bool,
    pub skip_when_aut_missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<Vec<RegistryEntry>>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            schema_version: CONFIG_SCHEMA_VERSION,
            aut_binary: "build/gestion_stock.exe".to_string(),
            build_dir: "build".to_string(),
            database_name: "stockt.db".to_string(),
            reports_dir: "reports".to_string(),
            weekly_dir: "weekly_test".to_string(),
            logs_dir: "build/logs".to_string(),
            scripts_dir: "Tests".to_string(),
            python: "python3".to_string(),
            default_timeout_secs: 300,
            smoke_timeout_secs: 60,
            weekly_timeout_secs: 300,
            scenario_timeout_secs: None,
            version_commit_window: DEFAULT_COMMIT_WINDOW,
            clean_database: false,
            skip_when_aut_missing: false,
            registry: None,
        }
    }
}

/// Resolved, validated configuration handed to every component.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub repo_root: PathBuf,
    pub aut_binary: PathBuf,
    pub build_dir: PathBuf,
    pub database_name: String,
    pub reports_dir: PathBuf,
    pub weekly_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub python: String,
    pub default_timeout: Duration,
    pub smoke_timeout: Duration,
    pub weekly_timeout: Duration,
    pub scenario_timeout: Option<Duration>,
    pub version_commit_window: usize,
    pub clean_database: bool,
    pub skip_when_aut_missing: bool,
    pub registry: Registry,
}

impl HarnessConfig {
    pub fn database_path(&self) -> PathBuf {
        self.build_dir.join(&self.database_name)
    }
}

/// Load `explicit` (or `<repo_root>/stock-ci.json` when present) and resolve it.
pub fn load_config(repo_root: &Path, explicit: Option<&Path>) -> Result<HarnessConfig> {
    let repo_root = repo_root
        .canonicalize()
        .with_context(|| format!("resolve repo root {}", repo_root.display()))?;
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = repo_root.join(CONFIG_FILE_NAME);
            candidate.is_file().then_some(candidate)
        }
    };
    let file = match path {
        Some(path) => {
            let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
            let file: ConfigFile = serde_json::from_slice(&bytes)
                .with_context(|| format!("parse config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded harness config");
            file
        }
        None => ConfigFile::default(),
    };
    resolve_config(&repo_root, file)
}

/// Validate raw config values and resolve paths against `repo_root`.
pub fn resolve_config(repo_root: &Path, file: ConfigFile) -> Result<HarnessConfig> {
    validate_config(&file)?;
    let registry = match file.registry {
        Some(entries) => Registry::new(entries).context("validate config registry")?,
        None => default_registry(),
    };
    let resolve = |value: &str| repo_root.join(value);
    Ok(HarnessConfig {
        repo_root: repo_root.to_path_buf(),
        aut_binary: resolve(&file.aut_binary),
        build_dir: resolve(&file.build_dir),
        database_name: file.database_name,
        reports_dir: resolve(&file.reports_dir),
        weekly_dir: resolve(&file.weekly_dir),
        logs_dir: resolve(&file.logs_dir),
        scripts_dir: resolve(&file.scripts_dir),
        python: file.python,
        default_timeout: Duration::from_secs(file.default_timeout_secs),
        smoke_timeout: Duration::from_secs(file.smoke_timeout_secs),
        weekly_timeout: Duration::from_secs(file.weekly_timeout_secs),
        scenario_timeout: file.scenario_timeout_secs.map(Duration::from_secs),
        version_commit_window: file.version_commit_window,
        clean_database: file.clean_database,
        skip_when_aut_missing: file.skip_when_aut_missing,
        registry,
    })
}

/// Validate schema version and the values that cannot be defaulted sensibly.
pub fn validate_config(file: &ConfigFile) -> Result<()> {
    if file.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            file.schema_version
        ));
    }
    for (name, value) in [
        ("default_timeout_secs", file.default_timeout_secs),
        ("smoke_timeout_secs", file.smoke_timeout_secs),
        ("weekly_timeout_secs", file.weekly_timeout_secs),
    ] {
        if value == 0 {
            return Err(anyhow!("{name} must be > 0"));
        }
    }
    if file.scenario_timeout_secs == Some(0) {
        return Err(anyhow!("scenario_timeout_secs must be > 0"));
    }
    if file.version_commit_window == 0 {
        return Err(anyhow!("version_commit_window must be > 0"));
    }
    for (name, value) in [
        ("aut_binary", &file.aut_binary),
        ("build_dir", &file.build_dir),
        ("database_name", &file.database_name),
        ("reports_dir", &file.reports_dir),
        ("weekly_dir", &file.weekly_dir),
        ("logs_dir", &file.logs_dir),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("{name} must not be empty"));
        }
    }
    if Path::new(&file.database_name).components().count() != 1 {
        return Err(anyhow!(
            "database_name must be a file name, got {:?}",
            file.database_name
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

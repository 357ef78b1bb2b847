//! Shared test infrastructure for integration tests.
// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The stand-in AUT built alongside the harness.
pub fn stock_sim() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stock-sim"))
}

/// A throwaway repository laid out like gestion_stock: `build/`, `Tests/`,
/// and a `stock-ci.json` pointing at the stand-in AUT.
pub struct TestRepo {
    pub dir: TempDir,
}

impl TestRepo {
    pub fn new() -> TestRepo {
        TestRepo::with_config(json!({}))
    }

    /// Repository whose config is the defaults below overlaid with `overrides`.
    pub fn with_config(overrides: Value) -> TestRepo {
        let dir = TempDir::new().expect("create temp repo");
        fs::create_dir_all(dir.path().join("build")).expect("create build dir");
        fs::create_dir_all(dir.path().join("Tests")).expect("create Tests dir");

        let mut config = json!({
            "schema_version": 1,
            "aut_binary": stock_sim().display().to_string(),
            "default_timeout_secs": 120,
            "smoke_timeout_secs": 60,
            "scenario_timeout_secs": 15
        });
        if let (Some(base), Some(extra)) = (config.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        let text = serde_json::to_string_pretty(&config).expect("serialize config");
        fs::write(dir.path().join("stock-ci.json"), text).expect("write config");
        TestRepo { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    /// `stock-ci <args...> --repo-root <root>`.
    pub fn stock_ci(&self, args: &[&str]) -> Command {
        let mut command = Command::cargo_bin("stock-ci").expect("stock-ci binary");
        command.args(args).arg("--repo-root").arg(self.root());
        command
    }

    /// `stock-ci scenario <name>` run from the build directory against the sim.
    pub fn scenario(&self, name: &str) -> Command {
        let mut command = Command::cargo_bin("stock-ci").expect("stock-ci binary");
        command
            .args(["scenario", name, "--aut"])
            .arg(stock_sim())
            .current_dir(self.build_dir());
        command
    }

    pub fn read_json(&self, relative: &str) -> Value {
        let path = self.root().join(relative);
        let bytes = fs::read(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
        serde_json::from_slice(&bytes).expect("parse json")
    }

    /// Files in `relative` whose names start with `prefix`.
    pub fn files_with_prefix(&self, relative: &str, prefix: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.root().join(relative)) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(prefix))
            })
            .collect()
    }

    /// Write an executable shell script (Unix only).
    #[cfg(unix)]
    pub fn script(&self, relative: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.root().join(relative);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    }
}

/// `(script, status)` pairs of a report JSON.
pub fn statuses(report: &Value) -> Vec<(String, String)> {
    report["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .map(|result| {
                    (
                        result["script"].as_str().unwrap_or_default().to_string(),
                        result["status"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

//! CLI argument parsing for the CI harness.
//!
//! The CLI stays thin: it resolves the repo root and config, then hands off
//! to the orchestrator, weekly runner, or a single built-in scenario.
use crate::registry::TestKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "stock-ci",
    version,
    about = "Black-box CI harness for the gestion_stock inventory CLI",
    after_help = "Commands:\n  ci                       Run the registered suite and write reports/<version>.{json,md}\n  ci --weekly              Run the weekly full journey and report it\n  weekly                   Run the full journey and write weekly_test/ artifacts\n  scenario <name>          Run one built-in scenario against the AUT\n  version                  Print the release tag found in recent commits\n  registry                 List the test registry\n\nExamples:\n  stock-ci ci\n  stock-ci ci --kind smoke\n  stock-ci ci --only add_prod_test --clean-db\n  stock-ci scenario delete_prod_test --aut build/gestion_stock.exe\n  stock-ci registry --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level harness commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Ci(CiArgs),
    Weekly(WeeklyArgs),
    Scenario(ScenarioArgs),
    Version(VersionArgs),
    Registry(RegistryArgs),
}

/// Location of the repository and its harness config.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository root containing build/, Tests/, and reports/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo_root: PathBuf,

    /// Harness config (default: <repo-root>/stock-ci.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Run the registered test suite and write reports")]
pub struct CiArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Run the weekly full journey instead of the suite
    #[arg(long, conflicts_with_all = ["kind", "only"])]
    pub weekly: bool,

    /// Only run entries of this type
    #[arg(long, value_enum)]
    pub kind: Option<TestKind>,

    /// Only run these scripts (repeatable); unknown names use fallback metadata
    #[arg(long, value_name = "SCRIPT")]
    pub only: Vec<String>,

    /// Delete the AUT database from the build directory afterwards
    #[arg(long)]
    pub clean_db: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Run the full journey and write weekly_test/ artifacts")]
pub struct WeeklyArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Run one built-in scenario against the AUT")]
pub struct ScenarioArgs {
    /// Scenario name as used in the registry (e.g. add_prod_test)
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub repo: RepoArgs,

    /// AUT binary (default: aut_binary from the config)
    #[arg(long, value_name = "PATH")]
    pub aut: Option<PathBuf>,

    /// Per-session wait for the AUT, overriding the scenario default
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Report [SKIPPED] instead of failing when the AUT binary is missing
    #[arg(long)]
    pub skip_missing_aut: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the release tag found in recent commit subjects")]
pub struct VersionArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
}

#[derive(Parser, Debug)]
#[command(about = "List the test registry")]
pub struct RegistryArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

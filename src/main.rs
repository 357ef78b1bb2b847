use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;
mod config;
mod normalize;
mod orchestrator;
mod process;
mod registry;
mod report;
mod runner;
mod scenarios;
mod util;
mod version;
mod weekly;

use cli::{Command, RegistryArgs, RepoArgs, RootArgs, ScenarioArgs};
use config::{load_config, HarnessConfig};
use orchestrator::{print_summary, run_ci, CiOptions};
use runner::Selection;
use scenarios::{run_scenario, Aut, ScenarioContext, ScenarioId};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Ci(args) => {
            let config = load(&args.repo)?;
            let options = CiOptions {
                weekly: args.weekly,
                selection: Selection {
                    kind: args.kind,
                    only: args.only,
                },
                clean_database: args.clean_db,
            };
            let outcome = run_ci(&config, &scenario_exe()?, &options)?;
            print_summary(&outcome, &config.repo_root);
            Ok(exit_code(outcome.exit_code))
        }
        Command::Weekly(args) => {
            let config = load(&args.repo)?;
            let outcome = weekly::run_weekly(&config, &scenario_exe()?, &util::timestamp_now())?;
            println!(
                "Weekly journey: {} (return code {})",
                outcome.record.status, outcome.record.return_code
            );
            println!(
                "Artifacts: {} {}",
                util::display_path(&outcome.report_path, Some(&config.repo_root)),
                util::display_path(&outcome.result_path, Some(&config.repo_root))
            );
            Ok(exit_code(outcome.record.return_code))
        }
        Command::Scenario(args) => cmd_scenario(args),
        Command::Version(args) => {
            let config = load(&args.repo)?;
            println!(
                "{}",
                version::resolve_version(&config.repo_root, config.version_commit_window)
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Registry(args) => cmd_registry(args),
    }
}

fn load(repo: &RepoArgs) -> Result<HarnessConfig> {
    load_config(&repo.repo_root, repo.config.as_deref())
}

fn scenario_exe() -> Result<PathBuf> {
    std::env::current_exe().context("locate stock-ci executable")
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn cmd_scenario(args: ScenarioArgs) -> Result<ExitCode> {
    let id = ScenarioId::from_script_name(&args.name).ok_or_else(|| {
        let known: Vec<&str> = ScenarioId::ALL.iter().map(|id| id.script_name()).collect();
        anyhow!(
            "unknown scenario {:?} (known: {})",
            args.name,
            known.join(", ")
        )
    })?;
    let config = load(&args.repo)?;
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let binary = args.aut.as_deref().unwrap_or(&config.aut_binary);
    let context = ScenarioContext {
        aut: Aut::new(&cwd.join(binary), &cwd),
        timeout: args
            .timeout_secs
            .map(std::time::Duration::from_secs)
            .or(config.scenario_timeout),
        skip_when_aut_missing: args.skip_missing_aut || config.skip_when_aut_missing,
    };
    Ok(run_scenario(id, &context).emit(id))
}

fn cmd_registry(args: RegistryArgs) -> Result<ExitCode> {
    let config = load(&args.repo)?;
    let entries = config.registry.entries();
    if args.json {
        let text = serde_json::to_string_pretty(entries).context("serialize registry")?;
        println!("{text}");
        return Ok(ExitCode::SUCCESS);
    }
    println!("{:<24} {:<5} {:<9} expected output", "script", "run", "type");
    for entry in entries {
        let expected = entry
            .expected_output
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<5} {:<9} {expected}",
            entry.script, entry.run, entry.kind
        );
    }
    Ok(ExitCode::SUCCESS)
}

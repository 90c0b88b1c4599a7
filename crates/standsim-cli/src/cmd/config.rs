use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use standsim_core::config::{Config, FailurePolicy, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if json {
        return print_json(&config);
    }

    println!("Simulator:        {}", config.simulator.executable);
    println!("Output database:  {}", config.output_db(root).display());
    println!("Job workspaces:   {}", config.workspace_dir(root).display());
    println!("Keep workspaces:  {}", config.simulator.keep_workspaces);
    let policy = match config.simulator.on_failure {
        FailurePolicy::Continue => "continue",
        FailurePolicy::Abort => "abort",
    };
    println!("On failure:       {policy}");
    match &config.assessment {
        Some(a) => println!(
            "Assessment:       {} (commands in {})",
            a.executable,
            a.command_dir.display()
        ),
        None => println!("Assessment:       (none)"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate(root);

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use standsim_core::action::{ActionKind, ActionPlan, ActionRow};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ActionsSubcommand {
    /// Show each action's default year and settings
    Defaults,

    /// Show the rows of a plan and how each resolves
    Show {
        /// Management plan file (YAML)
        #[arg(long)]
        plan: PathBuf,
    },

    /// Append an action row to a plan, filling blank cells with defaults
    Add {
        /// Management plan file (YAML); created if missing
        #[arg(long)]
        plan: PathBuf,
        /// Action name, e.g. "Thin from Below" or thin-below
        #[arg(long)]
        action: String,
        /// Zero-based simulation year (default 0)
        #[arg(long)]
        year: Option<String>,
        /// Comma-separated settings (default: the action's defaults)
        #[arg(long)]
        settings: Option<String>,
    },
}

pub fn run(subcmd: ActionsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ActionsSubcommand::Defaults => defaults(json),
        ActionsSubcommand::Show { plan } => show(&plan, json),
        ActionsSubcommand::Add {
            plan,
            action,
            year,
            settings,
        } => add(
            &plan,
            action,
            year.unwrap_or_default(),
            settings.unwrap_or_default(),
            json,
        ),
    }
}

// ---------------------------------------------------------------------------
// defaults
// ---------------------------------------------------------------------------

fn defaults(json: bool) -> anyhow::Result<()> {
    if json {
        let rows: Vec<_> = ActionKind::all()
            .iter()
            .map(|k| {
                serde_json::json!({
                    "action": k.display_name(),
                    "year": "0",
                    "settings": k.default_settings(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    let rows = ActionKind::all()
        .iter()
        .map(|k| {
            vec![
                k.display_name().to_string(),
                "0".to_string(),
                k.default_settings().to_string(),
            ]
        })
        .collect();
    print_table(&["ACTION", "YEAR", "SETTINGS"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let plan = ActionPlan::load(path)
        .with_context(|| format!("failed to load plan {}", path.display()))?;

    if json {
        let resolution = plan.resolve();
        let value = serde_json::json!({
            "rows": plan.actions,
            "resolved": resolution.actions,
            "rejected": resolution.rejected,
        });
        return print_json(&value);
    }

    if plan.is_empty() {
        println!("No actions. Run: standsim actions add --plan {} --action <name>", path.display());
        return Ok(());
    }

    let rows = plan
        .actions
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let status = match row.resolve(i + 1) {
                Ok(_) => "ok".to_string(),
                Err(e) => e.to_string(),
            };
            vec![
                (i + 1).to_string(),
                row.action.clone(),
                row.year.clone(),
                row.settings.clone(),
                status,
            ]
        })
        .collect();
    print_table(&["#", "ACTION", "YEAR", "SETTINGS", "STATUS"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

fn add(
    path: &Path,
    action: String,
    year: String,
    settings: String,
    json: bool,
) -> anyhow::Result<()> {
    let mut plan = if path.exists() {
        ActionPlan::load(path)
            .with_context(|| format!("failed to load plan {}", path.display()))?
    } else {
        ActionPlan::default()
    };

    plan.push_row(ActionRow::new(action, year, settings))?;
    plan.save(path)
        .with_context(|| format!("failed to save plan {}", path.display()))?;

    let Some(row) = plan.actions.last() else {
        return Ok(());
    };
    if json {
        return print_json(row);
    }
    println!(
        "Added row {}: {} (year {}, settings {})",
        plan.actions.len(),
        row.action,
        row.year,
        row.settings
    );
    Ok(())
}

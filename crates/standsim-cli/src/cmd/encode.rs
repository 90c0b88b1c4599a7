use crate::output::print_json;
use anyhow::Context;
use standsim_core::{action::ActionPlan, encoder::encode};
use std::path::Path;

pub fn run(plan_path: &Path, json: bool) -> anyhow::Result<()> {
    let plan = ActionPlan::load(plan_path)
        .with_context(|| format!("failed to load plan {}", plan_path.display()))?;
    let resolution = plan.resolve();
    let block = encode(&resolution.actions)?;

    if json {
        let value = serde_json::json!({
            "actions": resolution.actions,
            "rejected": resolution.rejected,
            "block": block,
        });
        return print_json(&value);
    }

    for rejected in &resolution.rejected {
        eprintln!("skipped row {}: {}", rejected.row, rejected.message);
    }
    print!("{block}");
    Ok(())
}

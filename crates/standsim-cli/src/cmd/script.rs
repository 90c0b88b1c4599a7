use anyhow::Context;
use standsim_core::{action::ActionPlan, config::Config, encoder::encode, job::SimulationJob};
use std::path::Path;

pub fn run(
    root: &Path,
    stand: &str,
    db: &Path,
    years: u32,
    plan_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    let commands = match plan_path {
        Some(path) => {
            let plan = ActionPlan::load(path)
                .with_context(|| format!("failed to load plan {}", path.display()))?;
            let resolution = plan.resolve();
            for rejected in &resolution.rejected {
                eprintln!("skipped row {}: {}", rejected.row, rejected.message);
            }
            Some(encode(&resolution.actions)?)
        }
        None => None,
    };

    let output_db = std::path::absolute(config.output_db(root))?;
    let database = std::path::absolute(db)?;
    let job = SimulationJob {
        stand_id: stand,
        database: &database,
        years,
        commands: commands.as_deref(),
        output_db: &output_db,
    };
    print!("{}", job.render()?);
    Ok(())
}

use anyhow::Context;
use standsim_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing standsim in: {}", root.display());

    let dir = paths::standsim_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    let config = Config::load(root).context("failed to load config")?;
    let jobs = config.workspace_dir(root);
    io::ensure_dir(&jobs).with_context(|| format!("failed to create {}", jobs.display()))?;

    println!("\nstandsim initialized.");
    println!("Next: standsim config validate");
    Ok(())
}

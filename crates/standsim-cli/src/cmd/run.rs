use crate::output::{print_json, print_table};
use anyhow::{anyhow, Context};
use standsim_core::{
    action::{ActionPlan, Resolution},
    assessment::{AssessmentRunner, RiskModel},
    config::Config,
    dispatch::{run_batch, BatchPlan, BatchReport, DispatchOptions, StandStatus},
    features::{FeatureStore, GeoJsonStore},
    join::{join_results, JoinSummary},
    metrics::parse_selection,
    output::OutputTable,
    paths,
    simulator::ExternalSimulator,
    StandsimError,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub struct RunArgs {
    /// Stand features (GeoJSON FeatureCollection with a Stand_ID property)
    #[arg(long)]
    pub stands: PathBuf,
    /// Input simulation database
    #[arg(long)]
    pub db: PathBuf,
    /// Number of years to simulate
    #[arg(long)]
    pub years: u32,
    /// Where to write the joined features
    #[arg(long)]
    pub out: PathBuf,
    /// Management plan file (YAML)
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Stand the plan applies to; repeatable (default: every stand)
    #[arg(long = "select", value_name = "STAND_ID")]
    pub select: Vec<String>,
    /// Output field to join, by display name; repeatable
    #[arg(long = "field", value_name = "NAME")]
    pub fields: Vec<String>,
    /// Assessment model to run on the joined features
    #[arg(long)]
    pub model: Option<String>,
    /// Simulator executable (overrides simulator.executable)
    #[arg(long, env = "STANDSIM_SIMULATOR")]
    pub simulator: Option<String>,
}

pub fn run(root: &Path, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    // Everything the user typed is checked before the first job is written.
    let fields = parse_selection(&args.fields)?;
    let assessment = match args.model.as_deref() {
        Some(name) => {
            let model: RiskModel = name.parse()?;
            model.check_fields(&fields)?;
            let section = config.assessment.as_ref().ok_or_else(|| {
                anyhow!("model '{model}' requested but config has no assessment section")
            })?;
            let runner = AssessmentRunner::new(
                executable_path(root, &section.executable),
                paths::resolve(root, &section.command_dir),
            );
            Some((model, runner))
        }
        None => None,
    };

    let resolution = match &args.plan {
        Some(path) => ActionPlan::load(path)
            .with_context(|| format!("failed to load plan {}", path.display()))?
            .resolve(),
        None => Resolution::default(),
    };

    let mut store = GeoJsonStore::load(&args.stands)
        .with_context(|| format!("failed to load stands {}", args.stands.display()))?;
    let stands = store.stand_ids()?;

    let selected: HashSet<String> = if args.select.is_empty() {
        stands.iter().cloned().collect()
    } else {
        for id in &args.select {
            if !stands.contains(id) {
                tracing::warn!(stand = %id, "selected stand not in feature layer");
            }
        }
        args.select.iter().cloned().collect()
    };

    let output_db = std::path::absolute(config.output_db(root))?;
    let table = OutputTable::open(&output_db)
        .with_context(|| format!("failed to open {}", output_db.display()))?;
    table.reset().context("failed to reset output table")?;

    let executable = args
        .simulator
        .unwrap_or_else(|| config.simulator.executable.clone());
    let simulator = ExternalSimulator::new(executable_path(root, &executable));
    if simulator.locate().is_none() {
        tracing::warn!(
            executable = %simulator.executable().display(),
            "simulator executable not found"
        );
    }

    let plan = BatchPlan {
        stands: &stands,
        selected: &selected,
        actions: &resolution.actions,
        database: &args.db,
        years: args.years,
        output_db: &output_db,
    };
    let options = DispatchOptions {
        workspace_dir: config.workspace_dir(root),
        keep_workspaces: config.simulator.keep_workspaces,
        on_failure: config.simulator.on_failure,
    };
    let report = run_batch(&simulator, &plan, &options);

    let joined = join_and_save(&table, &mut store, &fields, &args.out);
    let overlay = match (&joined, assessment) {
        (Ok(summary), Some((model, runner))) => {
            let last = summary
                .years
                .map(|y| y.last)
                .ok_or(StandsimError::NoOutputRows)?;
            Some(
                runner
                    .run(model, last, &args.out)
                    .with_context(|| format!("assessment '{model}' failed"))?,
            )
        }
        _ => None,
    };

    if json {
        let value = serde_json::json!({
            "report": report,
            "rejected_actions": resolution.rejected,
            "join": joined.as_ref().ok(),
            "output": args.out,
            "overlay": overlay,
        });
        print_json(&value)?;
    } else {
        print_report(&report);
        if let Ok(summary) = &joined {
            print_join(summary, &args.out, overlay.as_deref());
        }
    }

    joined?;
    let failed = report.failure_count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} stands failed", report.outcomes.len());
    }
    Ok(())
}

/// Bare names are looked up on PATH; anything with a directory part is
/// taken relative to the project root.
fn executable_path(root: &Path, executable: &str) -> PathBuf {
    let path = PathBuf::from(executable);
    if path.components().count() > 1 {
        paths::resolve(root, &path)
    } else {
        path
    }
}

fn join_and_save(
    table: &OutputTable,
    store: &mut GeoJsonStore,
    fields: &[standsim_core::metrics::MetricField],
    out: &Path,
) -> anyhow::Result<JoinSummary> {
    let summary = join_results(table, store, fields).context("failed to join results")?;
    store
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

fn print_report(report: &BatchReport) {
    let rows = report
        .outcomes
        .iter()
        .map(|o| {
            let (status, detail) = match &o.status {
                StandStatus::Succeeded => ("ok", String::new()),
                StandStatus::Failed { error } => ("failed", error.clone()),
            };
            vec![
                o.stand_id.clone(),
                if o.managed { "yes" } else { "no" }.to_string(),
                status.to_string(),
                detail,
            ]
        })
        .collect();
    print_table(&["STAND", "ACTIONS", "STATUS", "DETAIL"], rows);

    for outcome in report.outcomes.iter().filter(|o| !o.messages.is_empty()) {
        println!("\n{}:", outcome.stand_id);
        for line in &outcome.messages {
            println!("  {line}");
        }
        if let Some(dir) = &outcome.workspace {
            println!("  (workspace kept at {})", dir.display());
        }
    }

    if report.aborted {
        println!("\nBatch aborted after the first failed stand.");
    }
    let elapsed = report.finished_at - report.started_at;
    println!(
        "\n{} stands, {} failed, {:.1}s",
        report.outcomes.len(),
        report.failure_count(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
}

fn print_join(summary: &JoinSummary, out: &Path, overlay: Option<&Path>) {
    if let Some(years) = summary.years {
        println!("Years: {} to {}", years.first, years.last);
    }
    if summary.columns.is_empty() {
        println!("No fields joined.");
    } else {
        println!("Joined: {}", summary.columns.join(", "));
    }
    println!("Wrote {}", out.display());
    if let Some(path) = overlay {
        println!("Assessment overlay: {}", path.display());
    }
}

//! Sequential per-stand dispatch of simulation jobs.
//!
//! Each stand gets a fresh job workspace, its script and one blocking
//! simulator run. Stands run one at a time in stand-id order. A failed
//! stand is recorded in the report; whether the batch continues is
//! governed by [`FailurePolicy`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::action::ResolvedAction;
use crate::config::FailurePolicy;
use crate::encoder::encode;
use crate::error::{Result, StandsimError};
use crate::job::{JobWorkspace, SimulationJob};
use crate::simulator::Simulator;

/// The stands and inputs for one batch.
#[derive(Debug, Clone)]
pub struct BatchPlan<'a> {
    /// Every stand to simulate, in run order.
    pub stands: &'a [String],
    /// Stands the management actions apply to.
    pub selected: &'a HashSet<String>,
    pub actions: &'a [ResolvedAction],
    pub database: &'a Path,
    pub years: u32,
    pub output_db: &'a Path,
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub workspace_dir: PathBuf,
    pub keep_workspaces: bool,
    pub on_failure: FailurePolicy,
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StandStatus {
    Succeeded,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StandOutcome {
    pub stand_id: String,
    /// Whether the management block was embedded in this stand's script.
    pub managed: bool,
    #[serde(flatten)]
    pub status: StandStatus,
    /// Simulator console lines, prompts removed.
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
}

impl StandOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StandStatus::Succeeded
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<StandOutcome>,
    /// Set when the abort policy stopped the batch early.
    pub aborted: bool,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &StandOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}

// ---------------------------------------------------------------------------
// run_batch
// ---------------------------------------------------------------------------

pub fn run_batch<S: Simulator + ?Sized>(
    simulator: &S,
    plan: &BatchPlan<'_>,
    options: &DispatchOptions,
) -> BatchReport {
    let started_at = Utc::now();

    // The block is identical for every managed stand; encode it once and
    // report any failure against each stand it would have applied to.
    let encoded: Option<std::result::Result<String, String>> = if plan.actions.is_empty() {
        None
    } else {
        Some(encode(plan.actions).map_err(|e| e.to_string()))
    };

    let mut outcomes = Vec::with_capacity(plan.stands.len());
    let mut aborted = false;

    for stand_id in plan.stands {
        let block = match &encoded {
            Some(block) if plan.selected.contains(stand_id) => Some(block),
            _ => None,
        };
        let mut outcome = StandOutcome {
            stand_id: stand_id.clone(),
            managed: block.is_some(),
            status: StandStatus::Succeeded,
            messages: Vec::new(),
            workspace: None,
        };

        let result = match block {
            Some(Err(message)) => Err(message.clone()),
            Some(Ok(commands)) => {
                run_stand(simulator, plan, options, Some(commands.as_str()), &mut outcome)
                    .map_err(|e| e.to_string())
            }
            None => run_stand(simulator, plan, options, None, &mut outcome)
                .map_err(|e| e.to_string()),
        };

        if let Err(error) = result {
            tracing::warn!(stand = %stand_id, "stand failed: {error}");
            outcome.status = StandStatus::Failed { error };
        } else {
            tracing::info!(stand = %stand_id, "stand finished");
        }

        let failed = !outcome.succeeded();
        outcomes.push(outcome);
        if failed && options.on_failure == FailurePolicy::Abort {
            tracing::warn!("aborting batch after failed stand");
            aborted = true;
            break;
        }
    }

    BatchReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
        aborted,
    }
}

fn run_stand<S: Simulator + ?Sized>(
    simulator: &S,
    plan: &BatchPlan<'_>,
    options: &DispatchOptions,
    commands: Option<&str>,
    outcome: &mut StandOutcome,
) -> Result<()> {
    // The simulator runs inside the job directory, so relative paths are
    // pinned to the caller's working directory before they reach the script.
    let database = std::path::absolute(plan.database)?;
    let output_db = std::path::absolute(plan.output_db)?;

    let stand_id = outcome.stand_id.as_str();
    let job = SimulationJob {
        stand_id,
        database: &database,
        years: plan.years,
        commands,
        output_db: &output_db,
    };
    let script = job.render()?;

    let workspace = JobWorkspace::create(&options.workspace_dir, stand_id)?;
    workspace.write_script(&script)?;

    let result = simulator.run(stand_id, workspace.files());
    if options.keep_workspaces {
        outcome.workspace = Some(workspace.keep());
    }
    let output = result?;
    outcome.messages = output.lines;

    if output.exit_code != 0 {
        return Err(StandsimError::SimulatorFailed {
            stand: outcome.stand_id.clone(),
            code: output.exit_code,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

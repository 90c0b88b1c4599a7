use crate::assessment::RiskModel;
use crate::error::{Result, StandsimError};
use crate::paths;
use crate::simulator::locate_executable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// FailurePolicy
// ---------------------------------------------------------------------------

/// What the batch does after a stand's simulator run fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Report the stand and move on to the next one.
    #[default]
    Continue,
    /// Stop after the first failed stand.
    Abort,
}

// ---------------------------------------------------------------------------
// SimulatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_executable")]
    pub executable: String,
    #[serde(default = "default_output_db")]
    pub output_db: PathBuf,
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
    #[serde(default)]
    pub keep_workspaces: bool,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

fn default_executable() -> String {
    "FVSie".to_string()
}

fn default_output_db() -> PathBuf {
    PathBuf::from(paths::DEFAULT_OUTPUT_DB)
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_WORKSPACE_DIR)
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            output_db: default_output_db(),
            workspace_dir: default_workspace_dir(),
            keep_workspaces: false,
            on_failure: FailurePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// AssessmentConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    pub executable: String,
    /// Directory holding one command file per model.
    pub command_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<AssessmentConfig>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            simulator: SimulatorConfig::default(),
            assessment: None,
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(StandsimError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn output_db(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.simulator.output_db)
    }

    pub fn workspace_dir(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.simulator.workspace_dir)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Simulator executable must be named and should be findable
        let exe = self.simulator.executable.trim();
        if exe.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "simulator.executable is empty".to_string(),
            });
        } else if locate_executable(Path::new(exe)).is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("simulator executable '{exe}' not found"),
            });
        }

        // 2. Assessment section: executable and one command file per model
        if let Some(assessment) = &self.assessment {
            if assessment.executable.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "assessment.executable is empty".to_string(),
                });
            }
            let dir = paths::resolve(root, &assessment.command_dir);
            if !dir.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "assessment command directory '{}' does not exist",
                        dir.display()
                    ),
                });
            } else {
                for model in RiskModel::all() {
                    let file = dir.join(model.command_file());
                    if !file.exists() {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Warning,
                            message: format!(
                                "no command file for '{}' (expected {})",
                                model,
                                file.display()
                            ),
                        });
                    }
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

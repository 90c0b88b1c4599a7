//! Management action rows and their resolution into typed settings.
//!
//! Rows arrive loosely typed (three strings, as authored in a plan file).
//! Resolution fills blank cells with per-action defaults; parsing the
//! settings tokens into a typed record happens per action kind.

use crate::error::{Result, StandsimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ThinAbove,
    ThinBelow,
    Clearcut,
    PrescribedBurn,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::ThinAbove,
            ActionKind::ThinBelow,
            ActionKind::Clearcut,
            ActionKind::PrescribedBurn,
        ]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ActionKind::ThinAbove => "Thin from Above",
            ActionKind::ThinBelow => "Thin from Below",
            ActionKind::Clearcut => "Clearcut",
            ActionKind::PrescribedBurn => "Prescribed Burn",
        }
    }

    /// Canonical settings used when a row leaves its settings cell blank.
    pub fn default_settings(self) -> &'static str {
        match self {
            ActionKind::Clearcut => "0,0,999",
            ActionKind::ThinAbove | ActionKind::ThinBelow => "60,1,0,999,0,999",
            ActionKind::PrescribedBurn => "8,2,70,1,70,1",
        }
    }

    /// Number of settings tokens the action's keyword template consumes.
    pub fn settings_len(self) -> usize {
        match self {
            ActionKind::Clearcut => 3,
            ActionKind::ThinAbove | ActionKind::ThinBelow => 6,
            ActionKind::PrescribedBurn => 6,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = StandsimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thin from above" | "thin-above" | "thin_above" => Ok(ActionKind::ThinAbove),
            "thin from below" | "thin-below" | "thin_below" => Ok(ActionKind::ThinBelow),
            "clearcut" => Ok(ActionKind::Clearcut),
            "prescribed burn" | "prescribed-burn" | "prescribed_burn" | "burn" => {
                Ok(ActionKind::PrescribedBurn)
            }
            _ => Err(StandsimError::UnknownAction(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionRow
// ---------------------------------------------------------------------------

/// One user-authored management action, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub action: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub settings: String,
}

impl ActionRow {
    pub fn new(
        action: impl Into<String>,
        year: impl Into<String>,
        settings: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            year: year.into(),
            settings: settings.into(),
        }
    }

    /// Fill blank cells in place: year becomes `0`, settings become the
    /// action's default string. Non-blank cells are left verbatim.
    pub fn fill_defaults(&mut self) -> Result<()> {
        let kind: ActionKind = self.action.parse()?;
        if self.year.trim().is_empty() {
            self.year = "0".to_string();
        }
        if self.settings.trim().is_empty() {
            self.settings = kind.default_settings().to_string();
        }
        Ok(())
    }

    /// Resolve this row without mutating it. `row` is the 1-based row
    /// number used in error messages.
    pub fn resolve(&self, row: usize) -> Result<ResolvedAction> {
        let kind: ActionKind = self.action.parse()?;

        let year_text = self.year.trim();
        let year = if year_text.is_empty() {
            0
        } else {
            year_text
                .parse::<u32>()
                .map_err(|_| StandsimError::InvalidYear {
                    row,
                    value: self.year.clone(),
                })?
        };

        let settings_text = if self.settings.trim().is_empty() {
            kind.default_settings()
        } else {
            self.settings.as_str()
        };
        let settings = settings_text
            .split(',')
            .map(|t| t.trim().to_string())
            .collect();

        Ok(ResolvedAction {
            kind,
            year,
            settings,
        })
    }
}

// ---------------------------------------------------------------------------
// ResolvedAction
// ---------------------------------------------------------------------------

/// A fully specified action: zero-based year and the settings tokens.
///
/// Token count is not checked here; the encoder reports mismatches for
/// the stand it is encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    pub year: u32,
    pub settings: Vec<String>,
}

impl ResolvedAction {
    pub fn new(kind: ActionKind, year: u32, settings: &str) -> Self {
        Self {
            kind,
            year,
            settings: settings.split(',').map(|t| t.trim().to_string()).collect(),
        }
    }

    /// Parse the tokens into the typed settings record for this action.
    pub fn typed_settings(&self) -> Result<ActionSettings> {
        let expected = self.kind.settings_len();
        if self.settings.len() != expected {
            return Err(StandsimError::SettingsCount {
                action: self.kind.display_name().to_string(),
                expected,
                found: self.settings.len(),
            });
        }
        let mut values = Vec::with_capacity(expected);
        for token in &self.settings {
            let value = token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| StandsimError::InvalidSetting {
                    action: self.kind.display_name().to_string(),
                    token: token.clone(),
                })?;
            values.push(value);
        }

        Ok(match self.kind {
            ActionKind::ThinAbove | ActionKind::ThinBelow => ActionSettings::Thin(ThinSettings {
                residual_basal_area: values[0],
                efficiency: values[1],
                min_dbh: values[2],
                max_dbh: values[3],
                min_height: values[4],
                max_height: values[5],
            }),
            ActionKind::PrescribedBurn => ActionSettings::Burn(BurnSettings {
                wind_speed: values[0],
                moisture: values[1],
                temperature: values[2],
                mortality: values[3],
                percent_burned: values[4],
                season: values[5],
            }),
            ActionKind::Clearcut => ActionSettings::Clearcut(ClearcutSettings {
                min_dbh: values[0],
                efficiency: values[1],
                dbh_cap: values[2],
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Typed settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionSettings {
    Thin(ThinSettings),
    Burn(BurnSettings),
    Clearcut(ClearcutSettings),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinSettings {
    pub residual_basal_area: f64,
    pub efficiency: f64,
    pub min_dbh: f64,
    pub max_dbh: f64,
    pub min_height: f64,
    pub max_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnSettings {
    pub wind_speed: f64,
    pub moisture: f64,
    pub temperature: f64,
    pub mortality: f64,
    pub percent_burned: f64,
    pub season: f64,
}

/// Clearcut in two passes: everything from `min_dbh` up to `dbh_cap` at
/// full efficiency, then the remaining larger trees at `efficiency`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearcutSettings {
    pub min_dbh: f64,
    pub efficiency: f64,
    pub dbh_cap: f64,
}

// ---------------------------------------------------------------------------
// ActionPlan
// ---------------------------------------------------------------------------

/// An ordered list of action rows, persisted as YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    #[serde(default)]
    pub actions: Vec<ActionRow>,
}

/// A row that could not be resolved. The rest of the plan still runs.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub actions: Vec<ResolvedAction>,
    pub rejected: Vec<RejectedRow>,
}

impl ActionPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let plan: ActionPlan = serde_yaml::from_str(&data)?;
        Ok(plan)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append a row and resolve it as the most recent edit.
    pub fn push_row(&mut self, row: ActionRow) -> Result<()> {
        self.actions.push(row);
        self.resolve_last_row()
    }

    /// Fill defaults on the last row only, then check it resolves.
    /// Earlier rows are never retouched.
    pub fn resolve_last_row(&mut self) -> Result<()> {
        let row_number = self.actions.len();
        let Some(last) = self.actions.last_mut() else {
            return Ok(());
        };
        last.fill_defaults()?;
        last.resolve(row_number).map(|_| ())
    }

    /// Resolve every row in order. Bad rows are collected, not fatal.
    pub fn resolve(&self) -> Resolution {
        let mut resolution = Resolution::default();
        for (i, row) in self.actions.iter().enumerate() {
            match row.resolve(i + 1) {
                Ok(action) => resolution.actions.push(action),
                Err(e) => {
                    tracing::warn!(row = i + 1, "skipping action row: {e}");
                    resolution.rejected.push(RejectedRow {
                        row: i + 1,
                        message: e.to_string(),
                    });
                }
            }
        }
        resolution
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Rule-based assessment models run over the joined stand features.
//!
//! The model engine is an external program driven by a command file per
//! model. This module only checks inputs and invokes it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StandsimError};
use crate::metrics::MetricField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskModel {
    SevereFireRisk,
    ThinningAssessment,
}

impl RiskModel {
    pub fn all() -> &'static [RiskModel] {
        &[RiskModel::SevereFireRisk, RiskModel::ThinningAssessment]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RiskModel::SevereFireRisk => "Severe Fire Risk",
            RiskModel::ThinningAssessment => "Thinning Assessment",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            RiskModel::SevereFireRisk => "severe_fire_risk",
            RiskModel::ThinningAssessment => "thinning_assessment",
        }
    }

    pub fn command_file(self) -> String {
        format!("{}.eem", self.slug())
    }

    /// Metrics the model's rules read from the joined features.
    pub fn required_fields(self) -> &'static [MetricField] {
        match self {
            RiskModel::SevereFireRisk => &[
                MetricField::BasalArea,
                MetricField::TopHeight,
                MetricField::TreesPerAcre,
                MetricField::CrownCompetitionFactor,
            ],
            RiskModel::ThinningAssessment => &[
                MetricField::BasalArea,
                MetricField::StandDensityIndex,
                MetricField::QuadraticMeanDiameter,
                MetricField::TreesPerAcre,
            ],
        }
    }

    /// Fail unless every required metric is in `selected`.
    pub fn check_fields(self, selected: &[MetricField]) -> Result<()> {
        let missing: Vec<&str> = self
            .required_fields()
            .iter()
            .filter(|f| !selected.contains(*f))
            .map(|f| f.display_name())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StandsimError::MissingModelFields {
                model: self.display_name().to_string(),
                missing: missing.join(", "),
            })
        }
    }
}

impl fmt::Display for RiskModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for RiskModel {
    type Err = StandsimError;

    fn from_str(s: &str) -> Result<Self> {
        RiskModel::all()
            .iter()
            .copied()
            .find(|m| m.display_name() == s || m.slug() == s)
            .ok_or_else(|| StandsimError::UnknownModel(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// AssessmentRunner
// ---------------------------------------------------------------------------

pub struct AssessmentRunner {
    executable: PathBuf,
    command_dir: PathBuf,
}

impl AssessmentRunner {
    pub fn new(executable: impl Into<PathBuf>, command_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            command_dir: command_dir.into(),
        }
    }

    /// Overlay written next to the joined features, e.g.
    /// `joined_severe_fire_risk.geojson`.
    pub fn overlay_path(model: RiskModel, joined: &Path) -> PathBuf {
        let stem = joined
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stands".to_string());
        joined.with_file_name(format!("{stem}_{}.geojson", model.slug()))
    }

    /// Run `model` against `joined` for `last_year`; returns the overlay.
    pub fn run(&self, model: RiskModel, last_year: i64, joined: &Path) -> Result<PathBuf> {
        let command_file = self.command_dir.join(model.command_file());
        let overlay = Self::overlay_path(model, joined);

        tracing::info!(model = %model, year = last_year, "running assessment model");
        let output = Command::new(&self.executable)
            .arg(&command_file)
            .arg(joined)
            .arg(last_year.to_string())
            .arg(&overlay)
            .output()
            .map_err(|e| {
                StandsimError::AssessmentFailed(format!("{}: {e}", self.executable.display()))
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            if !line.trim().is_empty() {
                tracing::info!(model = %model, "{line}");
            }
        }

        if !output.status.success() {
            let hint = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(500)
                .collect::<String>();
            return Err(StandsimError::AssessmentFailed(format!(
                "{model} exited with {}: {hint}",
                output.status
            )));
        }
        Ok(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_parse_from_display_name_and_slug() {
        assert_eq!(
            "Severe Fire Risk".parse::<RiskModel>().unwrap(),
            RiskModel::SevereFireRisk
        );
        assert_eq!(
            "thinning_assessment".parse::<RiskModel>().unwrap(),
            RiskModel::ThinningAssessment
        );
        assert!("Wildlife Habitat".parse::<RiskModel>().is_err());
    }

    #[test]
    fn check_fields_lists_missing() {
        let err = RiskModel::ThinningAssessment
            .check_fields(&[MetricField::BasalArea, MetricField::TreesPerAcre])
            .unwrap_err();
        match err {
            StandsimError::MissingModelFields { model, missing } => {
                assert_eq!(model, "Thinning Assessment");
                assert_eq!(missing, "Stand Density Index, Quadratic Mean Diameter");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn check_fields_accepts_superset() {
        let mut selected = RiskModel::SevereFireRisk.required_fields().to_vec();
        selected.push(MetricField::StandAge);
        assert!(RiskModel::SevereFireRisk.check_fields(&selected).is_ok());
    }

    #[test]
    fn overlay_sits_next_to_joined_features() {
        let overlay =
            AssessmentRunner::overlay_path(RiskModel::SevereFireRisk, Path::new("/out/joined.geojson"));
        assert_eq!(overlay, PathBuf::from("/out/joined_severe_fire_risk.geojson"));
    }

    #[cfg(unix)]
    #[test]
    fn runner_passes_arguments_in_order() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("eems.sh");
        std::fs::write(&exe, "#!/bin/sh\necho \"$1|$2|$3\" > \"$4\"\n").unwrap();
        let mut perms = std::fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).unwrap();

        let joined = dir.path().join("joined.geojson");
        let runner = AssessmentRunner::new(&exe, dir.path().join("cmds"));
        let overlay = runner.run(RiskModel::ThinningAssessment, 10, &joined).unwrap();

        let written = std::fs::read_to_string(&overlay).unwrap();
        assert_eq!(
            written.trim(),
            format!(
                "{}|{}|10",
                dir.path().join("cmds/thinning_assessment.eem").display(),
                joined.display()
            )
        );
    }

    #[cfg(unix)]
    #[test]
    fn runner_reports_failure() {
        let runner = AssessmentRunner::new("false", "/tmp");
        let err = runner
            .run(RiskModel::SevereFireRisk, 3, Path::new("/tmp/j.geojson"))
            .unwrap_err();
        assert!(matches!(err, StandsimError::AssessmentFailed(_)));
    }
}

use crate::error::{Result, StandsimError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// MetricField
// ---------------------------------------------------------------------------

/// A simulator summary metric that can be joined back onto stand features.
///
/// The display name is what users select; the code is the column name in the
/// summary output table and the prefix of the joined feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricField {
    StandAge,
    TreesPerAcre,
    BasalArea,
    StandDensityIndex,
    CrownCompetitionFactor,
    TopHeight,
    QuadraticMeanDiameter,
    TotalCubicVolume,
    MerchantableCubicVolume,
    BoardFootVolume,
}

impl MetricField {
    pub fn all() -> &'static [MetricField] {
        &[
            MetricField::StandAge,
            MetricField::TreesPerAcre,
            MetricField::BasalArea,
            MetricField::StandDensityIndex,
            MetricField::CrownCompetitionFactor,
            MetricField::TopHeight,
            MetricField::QuadraticMeanDiameter,
            MetricField::TotalCubicVolume,
            MetricField::MerchantableCubicVolume,
            MetricField::BoardFootVolume,
        ]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MetricField::StandAge => "Stand Age",
            MetricField::TreesPerAcre => "Trees Per Acre",
            MetricField::BasalArea => "Basal Area",
            MetricField::StandDensityIndex => "Stand Density Index",
            MetricField::CrownCompetitionFactor => "Crown Competition Factor",
            MetricField::TopHeight => "Top Height",
            MetricField::QuadraticMeanDiameter => "Quadratic Mean Diameter",
            MetricField::TotalCubicVolume => "Total Cubic Volume",
            MetricField::MerchantableCubicVolume => "Merchantable Cubic Volume",
            MetricField::BoardFootVolume => "Board Foot Volume",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            MetricField::StandAge => "Age",
            MetricField::TreesPerAcre => "Tpa",
            MetricField::BasalArea => "BA",
            MetricField::StandDensityIndex => "SDI",
            MetricField::CrownCompetitionFactor => "CCF",
            MetricField::TopHeight => "TopHt",
            MetricField::QuadraticMeanDiameter => "QMD",
            MetricField::TotalCubicVolume => "TCuFt",
            MetricField::MerchantableCubicVolume => "MCuFt",
            MetricField::BoardFootVolume => "BdFt",
        }
    }

    /// Exact display-name lookup. Anything outside the table is an error.
    pub fn from_display(name: &str) -> Result<Self> {
        MetricField::all()
            .iter()
            .copied()
            .find(|f| f.display_name() == name)
            .ok_or_else(|| StandsimError::UnknownField(name.to_string()))
    }

    /// Column name for this metric once joined for `year`, e.g. `Age_0`.
    pub fn joined_column(self, year: i64) -> String {
        format!("{}_{}", self.code(), year)
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for MetricField {
    type Err = StandsimError;

    fn from_str(s: &str) -> Result<Self> {
        MetricField::from_display(s)
    }
}

/// Map a user selection of display names to metric fields.
///
/// Order is preserved and repeated names collapse onto their first
/// occurrence. The first unknown name fails the whole selection.
pub fn parse_selection<S: AsRef<str>>(names: &[S]) -> Result<Vec<MetricField>> {
    let mut fields = Vec::with_capacity(names.len());
    for name in names {
        let field = MetricField::from_display(name.as_ref())?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields)
}

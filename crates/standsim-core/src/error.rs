use thiserror::Error;

#[derive(Debug, Error)]
pub enum StandsimError {
    #[error("not initialized: run 'standsim init'")]
    NotInitialized,

    #[error("feature layer '{0}' has no Stand_ID field on every feature")]
    MissingStandIdField(String),

    #[error("unknown management action '{0}'")]
    UnknownAction(String),

    #[error("action row {row}: year '{value}' is not a whole number")]
    InvalidYear { row: usize, value: String },

    #[error("{action}: expected {expected} settings, found {found}")]
    SettingsCount {
        action: String,
        expected: usize,
        found: usize,
    },

    #[error("{action}: setting '{token}' is not numeric")]
    InvalidSetting { action: String, token: String },

    #[error("{keyword}: value '{value}' does not fit a 10-column field")]
    FieldTooWide { keyword: String, value: String },

    #[error("action year {0} is past the last simulated cycle number")]
    YearOutOfRange(u32),

    #[error("stand id {0:?} contains control characters")]
    InvalidStandId(String),

    #[error("unknown output field '{0}'")]
    UnknownField(String),

    #[error("unknown assessment model '{0}'")]
    UnknownModel(String),

    #[error("model '{model}' requires fields not selected: {missing}")]
    MissingModelFields { model: String, missing: String },

    #[error("failed to start simulator: {0}")]
    SimulatorSpawn(String),

    #[error("simulator exited with code {code} for stand {stand}")]
    SimulatorFailed { stand: String, code: i32 },

    #[error("assessment model failed: {0}")]
    AssessmentFailed(String),

    #[error("output table has no rows")]
    NoOutputRows,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StandsimError>;

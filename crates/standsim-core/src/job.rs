//! Per-stand simulation jobs: the keyword script and its file set.

use crate::error::{Result, StandsimError};
use crate::keyword::record;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Table the simulator reads stand-level inventory from.
pub const STAND_INIT_TABLE: &str = "FVS_StandInit";
/// Table the simulator reads tree records from.
pub const TREE_INIT_TABLE: &str = "FVS_TreeInit";

// ---------------------------------------------------------------------------
// SimulationJob
// ---------------------------------------------------------------------------

/// Everything needed to render one stand's keyword script.
#[derive(Debug, Clone)]
pub struct SimulationJob<'a> {
    pub stand_id: &'a str,
    /// Input database, passed through to the data-retrieval section.
    pub database: &'a Path,
    /// Number of one-year cycles to simulate.
    pub years: u32,
    /// Encoded management block, or `None` when no actions apply.
    pub commands: Option<&'a str>,
    /// Shared output database the simulator appends summary rows to.
    pub output_db: &'a Path,
}

impl SimulationJob<'_> {
    /// Render the keyword script. Section order and keyword spelling are
    /// what the simulator parses; do not reorder.
    pub fn render(&self) -> Result<String> {
        check_stand_id(self.stand_id)?;
        let stand = sql_literal(self.stand_id);
        let mut s = String::new();

        s.push_str("STDIDENT\n");
        s.push_str(self.stand_id);
        s.push('\n');

        s.push_str(&record("INVYEAR", &["0"])?);
        s.push('\n');
        s.push_str(&record("TIMEINT", &["0", "1"])?);
        s.push('\n');
        s.push_str(&record("NUMCYCLE", &[self.years.to_string()])?);
        s.push('\n');

        s.push_str("DATABASE\n");
        s.push_str("DSNOUT\n");
        s.push_str(&self.output_db.display().to_string());
        s.push('\n');
        s.push_str("SUMMARY\n");
        s.push_str("END\n");

        s.push_str("DATABASE\n");
        s.push_str("DSNIN\n");
        s.push_str(&self.database.display().to_string());
        s.push('\n');
        s.push_str("STANDSQL\n");
        s.push_str(&format!(
            "SELECT * FROM {STAND_INIT_TABLE} WHERE Stand_ID = {stand}\n"
        ));
        s.push_str("ENDSQL\n");
        s.push_str("TREESQL\n");
        s.push_str(&format!(
            "SELECT * FROM {TREE_INIT_TABLE} WHERE Stand_ID = {stand}\n"
        ));
        s.push_str("ENDSQL\n");
        s.push_str("END\n");

        match self.commands {
            Some(block) if !block.is_empty() => {
                s.push_str(block);
                if !block.ends_with('\n') {
                    s.push('\n');
                }
            }
            _ => s.push('\n'),
        }

        s.push_str("SPLABEL\n");
        s.push_str("          All_Species = All\n");
        s.push_str("PROCESS\n");
        s.push_str("STOP\n");
        Ok(s)
    }
}

/// Stand ids are written on their own script line; a control character
/// would split it into extra keyword lines.
pub fn check_stand_id(stand_id: &str) -> Result<()> {
    if stand_id.chars().any(char::is_control) {
        return Err(StandsimError::InvalidStandId(stand_id.to_string()));
    }
    Ok(())
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ---------------------------------------------------------------------------
// JobFiles
// ---------------------------------------------------------------------------

/// The simulator's file set for one run. Everything shares one stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFiles {
    pub dir: PathBuf,
    pub script: PathBuf,
    pub tree_data: PathBuf,
    pub output: PathBuf,
    pub trace: PathBuf,
    pub summary: PathBuf,
    pub check_plot: PathBuf,
}

impl JobFiles {
    pub fn in_dir(dir: &Path, stem: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            script: dir.join(format!("{stem}.key")),
            tree_data: dir.join(format!("{stem}.tre")),
            output: dir.join(format!("{stem}.out")),
            trace: dir.join(format!("{stem}.trl")),
            summary: dir.join(format!("{stem}.sum")),
            check_plot: dir.join(format!("{stem}.chp")),
        }
    }
}

/// Reduce a stand id to characters safe in a file name.
pub fn file_stem(stand_id: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));
    let stem = re.replace_all(stand_id.trim(), "_");
    if stem.is_empty() {
        "stand".to_string()
    } else {
        stem.into_owned()
    }
}

// ---------------------------------------------------------------------------
// JobWorkspace
// ---------------------------------------------------------------------------

/// A fresh directory holding one stand's job files.
///
/// Each stand gets its own directory, so runs never share intermediate
/// files. The directory is removed on drop unless kept with [`keep`].
///
/// [`keep`]: JobWorkspace::keep
pub struct JobWorkspace {
    dir: TempDir,
    files: JobFiles,
}

impl JobWorkspace {
    pub fn create(parent: &Path, stand_id: &str) -> Result<Self> {
        crate::io::ensure_dir(parent)?;
        let stem = file_stem(stand_id);
        let dir = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .tempdir_in(parent)?;
        let files = JobFiles::in_dir(dir.path(), &stem);
        Ok(Self { dir, files })
    }

    pub fn files(&self) -> &JobFiles {
        &self.files
    }

    /// Write the script, replacing any previous content.
    pub fn write_script(&self, script: &str) -> Result<()> {
        crate::io::atomic_write(&self.files.script, script.as_bytes())?;
        tracing::debug!(path = %self.files.script.display(), "wrote job script");
        Ok(())
    }

    /// Persist the directory and return its path.
    pub fn keep(self) -> PathBuf {
        self.dir.into_path()
    }
}

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STANDSIM_DIR: &str = ".standsim";
pub const CONFIG_FILE: &str = ".standsim/config.yaml";
pub const DEFAULT_OUTPUT_DB: &str = ".standsim/output.db";
pub const DEFAULT_WORKSPACE_DIR: &str = ".standsim/jobs";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn standsim_dir(root: &Path) -> PathBuf {
    root.join(STANDSIM_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the project root. Absolute paths pass
/// through untouched.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

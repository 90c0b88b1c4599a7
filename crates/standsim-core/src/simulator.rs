//! Invocation of the external growth simulator.
//!
//! The simulator reads a keyword script on stdin and writes line-oriented
//! progress text to stdout. Summary rows go to the output database named in
//! the script, as a side effect.
//!
//! # Console filtering
//! Lines containing `ENTER` are interactive prompts left over from the
//! simulator's terminal mode. They are dropped along with blank lines.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, StandsimError};
use crate::job::JobFiles;

/// Token marking an interactive prompt line in simulator output.
pub const PROMPT_TOKEN: &str = "ENTER";

/// What one simulator run produced on its console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorOutput {
    pub exit_code: i32,
    /// Non-empty console lines with prompts removed.
    pub lines: Vec<String>,
}

impl SimulatorOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs one prepared job to completion.
pub trait Simulator {
    fn run(&self, stand_id: &str, files: &JobFiles) -> Result<SimulatorOutput>;
}

// ---------------------------------------------------------------------------
// ExternalSimulator
// ---------------------------------------------------------------------------

/// The simulator executable, invoked as `<executable> < <script>`.
#[derive(Debug, Clone)]
pub struct ExternalSimulator {
    executable: PathBuf,
}

impl ExternalSimulator {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Resolve the executable: bare names through `PATH`, anything with a
    /// directory component as given.
    pub fn locate(&self) -> Option<PathBuf> {
        locate_executable(&self.executable)
    }
}

impl Simulator for ExternalSimulator {
    fn run(&self, stand_id: &str, files: &JobFiles) -> Result<SimulatorOutput> {
        let script = File::open(&files.script).map_err(|e| {
            StandsimError::SimulatorSpawn(format!(
                "cannot open script {}: {e}",
                files.script.display()
            ))
        })?;

        tracing::info!(stand = stand_id, exe = %self.executable.display(), "starting simulator");

        // Blocks until the simulator exits; there is no timeout.
        let output = Command::new(&self.executable)
            .current_dir(&files.dir)
            .stdin(Stdio::from(script))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                StandsimError::SimulatorSpawn(format!("{}: {e}", self.executable.display()))
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        let lines = console_lines(&text);
        for line in &lines {
            tracing::info!(stand = stand_id, "{line}");
        }

        Ok(SimulatorOutput {
            exit_code: output.status.code().unwrap_or(-1),
            lines,
        })
    }
}

/// Split console text into reportable lines: non-empty, no prompts.
pub fn console_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.contains(PROMPT_TOKEN))
        .map(str::to_string)
        .collect()
}

pub fn locate_executable(executable: &Path) -> Option<PathBuf> {
    if executable.components().count() > 1 {
        return executable.is_file().then(|| executable.to_path_buf());
    }
    which::which(executable).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_lines_drop_prompts_and_blanks() {
        let text = "  FOREST VEGETATION SIMULATOR\n\nENTER KEYWORD FILE NAME\n   \nSTAND S1 DONE\r\n";
        assert_eq!(
            console_lines(text),
            vec!["  FOREST VEGETATION SIMULATOR", "STAND S1 DONE"]
        );
    }

    #[test]
    fn prompt_token_matches_anywhere_in_line() {
        assert!(console_lines("PLEASE ENTER A VALUE").is_empty());
        assert_eq!(console_lines("enter is lowercase"), vec!["enter is lowercase"]);
    }

    #[test]
    fn locate_missing_path_returns_none() {
        assert!(locate_executable(Path::new("/definitely/not/here/fvs")).is_none());
        assert!(locate_executable(Path::new("standsim-no-such-binary-xyz")).is_none());
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use crate::job::JobWorkspace;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_simulator(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-sim.sh");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[test]
        fn script_is_fed_on_stdin() {
            let dir = TempDir::new().unwrap();
            let exe = fake_simulator(dir.path(), "cat");
            let ws = JobWorkspace::create(&dir.path().join("jobs"), "S1").unwrap();
            ws.write_script("STDIDENT\nS1\n\nPROCESS\nSTOP\n").unwrap();

            let out = ExternalSimulator::new(&exe).run("S1", ws.files()).unwrap();
            assert!(out.success());
            assert_eq!(out.lines, vec!["STDIDENT", "S1", "PROCESS", "STOP"]);
        }

        #[test]
        fn runs_inside_the_job_directory() {
            let dir = TempDir::new().unwrap();
            let exe = fake_simulator(dir.path(), "cat > /dev/null\ntouch marker.out");
            let ws = JobWorkspace::create(&dir.path().join("jobs"), "S1").unwrap();
            ws.write_script("STOP\n").unwrap();

            ExternalSimulator::new(&exe).run("S1", ws.files()).unwrap();
            assert!(ws.files().dir.join("marker.out").exists());
        }

        #[test]
        fn stderr_is_combined_and_prompts_filtered() {
            let dir = TempDir::new().unwrap();
            let exe = fake_simulator(
                dir.path(),
                "echo 'CYCLE 1'\necho 'PRESS ENTER TO CONTINUE'\necho 'WARNING: SITE' 1>&2",
            );
            let ws = JobWorkspace::create(&dir.path().join("jobs"), "S1").unwrap();
            ws.write_script("STOP\n").unwrap();

            let out = ExternalSimulator::new(&exe).run("S1", ws.files()).unwrap();
            assert_eq!(out.lines, vec!["CYCLE 1", "WARNING: SITE"]);
        }

        #[test]
        fn non_zero_exit_is_reported_not_raised() {
            let dir = TempDir::new().unwrap();
            let exe = fake_simulator(dir.path(), "echo 'ERROR IN KEYWORD'\nexit 3");
            let ws = JobWorkspace::create(&dir.path().join("jobs"), "S1").unwrap();
            ws.write_script("STOP\n").unwrap();

            let out = ExternalSimulator::new(&exe).run("S1", ws.files()).unwrap();
            assert_eq!(out.exit_code, 3);
            assert!(!out.success());
        }

        #[test]
        fn missing_executable_fails_to_spawn() {
            let dir = TempDir::new().unwrap();
            let ws = JobWorkspace::create(&dir.path().join("jobs"), "S1").unwrap();
            ws.write_script("STOP\n").unwrap();

            let err = ExternalSimulator::new(dir.path().join("nope"))
                .run("S1", ws.files())
                .unwrap_err();
            assert!(matches!(err, StandsimError::SimulatorSpawn(_)));
        }
    }
}

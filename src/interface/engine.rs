//! Running an external estimation program as a subprocess.
//!
//! The artifact is staged into a temporary directory that is removed when the
//! run finishes, the program is invoked with the staged files as arguments
//! and, on success, its standard output is decoded as a JSON [`EngineReport`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ChoiceError, Result};
use crate::interface::{Engine, EngineFailure, EngineOutcome, EngineReport};
use crate::options::EngineOptions;

/// Artifacts that can be written to disk for an external program.
pub trait Stage {
    /// Writes the engine inputs into `dir` and returns the files to pass as arguments.
    fn stage(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Engine that runs an external executable once per estimation.
#[derive(Clone, Debug)]
pub struct CommandEngine {
    options: EngineOptions,
}

impl CommandEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

impl<A: Stage> Engine<A> for CommandEngine {
    fn run(&mut self, artifact: &A) -> Result<EngineOutcome> {
        let staging = tempfile::Builder::new()
            .prefix("choicers-")
            .disable_cleanup(self.options.keep_staging)
            .tempdir()?;
        let inputs = artifact.stage(staging.path())?;

        let program = self.options.executable.display().to_string();
        log::debug!(
            "running `{}` on {} staged inputs in {}",
            program,
            inputs.len(),
            staging.path().display()
        );

        let output = Command::new(&self.options.executable)
            .args(&self.options.arguments)
            .args(&inputs)
            .current_dir(staging.path())
            .output()
            .map_err(|source| ChoiceError::EngineUnavailable {
                program: program.clone(),
                source,
            })?;

        if self.options.keep_staging {
            log::info!("kept staging directory {}", staging.path().display());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Ok(EngineOutcome::Failed(EngineFailure {
                exit_code: output.status.code(),
                stdout,
                stderr,
            }));
        }

        let report: EngineReport = serde_json::from_str(&stdout)?;
        Ok(EngineOutcome::Completed(report))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Script(&'static str);

    impl Stage for Script {
        fn stage(&self, dir: &Path) -> Result<Vec<PathBuf>> {
            let path = dir.join("input.txt");
            std::fs::write(&path, self.0)?;
            Ok(vec![path])
        }
    }

    fn shell(script: &str) -> CommandEngine {
        CommandEngine::new(
            EngineOptions::new("sh")
                .with_argument("-c")
                .with_argument(script)
                .with_argument("engine"),
        )
    }

    #[test]
    fn decodes_report_from_stdout() {
        let mut engine = shell(
            r#"cat "$1" >/dev/null && echo '{"null_log_likelihood":-2.0,"final_log_likelihood":-1.5,"estimates":{"p1":{"value":1.0,"std_err":0.5,"t_value":2.0}}}'"#,
        );
        let outcome = engine.run(&Script("data")).unwrap();
        match outcome {
            EngineOutcome::Completed(report) => {
                assert_eq!(report.final_log_likelihood, -1.5);
                assert_eq!(report.estimates["p1"].std_err, 0.5);
            }
            EngineOutcome::Failed(failure) => panic!("unexpected failure: {failure}"),
        }
    }

    #[test]
    fn non_zero_exit_is_reported_verbatim() {
        let mut engine = shell("echo 'did not converge' >&2; exit 4");
        let outcome = engine.run(&Script("data")).unwrap();
        assert_eq!(
            outcome,
            EngineOutcome::Failed(EngineFailure {
                exit_code: Some(4),
                stdout: String::new(),
                stderr: "did not converge\n".to_string(),
            })
        );
    }

    #[test]
    fn missing_program_is_an_error() {
        let mut engine = CommandEngine::new(EngineOptions::new("/nonexistent/estimation-engine"));
        let err = engine.run(&Script("data")).unwrap_err();
        assert!(matches!(err, ChoiceError::EngineUnavailable { .. }));
    }

    #[derive(Default)]
    struct Recorded(RefCell<Option<PathBuf>>);

    impl Stage for Recorded {
        fn stage(&self, dir: &Path) -> Result<Vec<PathBuf>> {
            *self.0.borrow_mut() = Some(dir.to_path_buf());
            Script("data").stage(dir)
        }
    }

    #[test]
    fn staging_directory_is_removed_unless_kept() {
        let failing = "exit 1";

        let artifact = Recorded::default();
        shell(failing).run(&artifact).unwrap();
        let removed = artifact.0.borrow().clone().unwrap();
        assert!(!removed.exists());

        let artifact = Recorded::default();
        let mut engine = CommandEngine::new(shell(failing).options().clone().with_keep_staging(true));
        engine.run(&artifact).unwrap();
        let kept = artifact.0.borrow().clone().unwrap();
        assert!(kept.join("input.txt").is_file());
        std::fs::remove_dir_all(kept).unwrap();
    }
}

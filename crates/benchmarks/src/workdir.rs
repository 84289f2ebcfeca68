//! Scoped working-directory change.
//!
//! The process working directory is global state. [`WorkdirGuard`] owns it
//! for the lifetime of a run: entering records the current directory and
//! moves into the target, dropping moves back. Restoration runs on normal
//! return, on `?` propagation and on panic unwinding.

use crate::error::{PerfError, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Restores the previous working directory when dropped.
#[derive(Debug)]
#[must_use = "the working directory is restored as soon as the guard is dropped"]
pub struct WorkdirGuard {
    original: PathBuf,
}

impl WorkdirGuard {
    /// Change into `path`, remembering where we came from.
    pub fn enter(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let workdir_err = |source| PerfError::Workdir {
            path: path.to_path_buf(),
            source,
        };

        let original = env::current_dir().map_err(workdir_err)?;
        env::set_current_dir(path).map_err(workdir_err)?;
        debug!(from = %original.display(), to = %path.display(), "entered working directory");

        Ok(Self { original })
    }

    /// Directory that will be restored on drop.
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        match env::set_current_dir(&self.original) {
            Ok(()) => debug!(to = %self.original.display(), "restored working directory"),
            Err(e) => warn!(
                to = %self.original.display(),
                error = %e,
                "failed to restore working directory"
            ),
        }
    }
}

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::Result;
use crate::video::{CleanupReport, Sequence};

/// Directory holding frames extracted from a foreground video
pub const INPUT_FRAMES_DIR: &str = "inputframes";

/// Directory holding frames extracted from a background video
pub const BACKGROUND_FRAMES_DIR: &str = "backgroundframes";

/// Where one run keeps its intermediate and output frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    pub root_dir: PathBuf,
    pub sequence_prefix: String,
    pub cleanup: bool,
}

impl WorkingContext {
    /// Context whose prefix is the current local time (`%Y%m%d%H%M`),
    /// followed by `_<label>` when a label is given
    pub fn new<P: Into<PathBuf>>(root_dir: P, label: Option<&str>, cleanup: bool) -> Self {
        let timestamp = Local::now().format("%Y%m%d%H%M").to_string();
        let sequence_prefix = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => format!("{}_{}", timestamp, label),
            None => timestamp,
        };
        Self::with_prefix(root_dir, sequence_prefix, cleanup)
    }

    pub fn with_prefix<P: Into<PathBuf>, S: Into<String>>(root_dir: P, sequence_prefix: S, cleanup: bool) -> Self {
        Self {
            root_dir: root_dir.into(),
            sequence_prefix: sequence_prefix.into(),
            cleanup,
        }
    }

    /// Create the working directory if it does not exist yet
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_dir)?;
        Ok(())
    }

    /// Frames extracted from a foreground video
    pub fn input_sequence(&self) -> Sequence {
        Sequence::new(self.root_dir.join(INPUT_FRAMES_DIR), self.sequence_prefix.as_str())
    }

    /// Frames extracted from a background video
    pub fn background_sequence(&self) -> Sequence {
        Sequence::new(self.root_dir.join(BACKGROUND_FRAMES_DIR), self.sequence_prefix.as_str())
    }

    /// Effect output frames
    pub fn output_sequence(&self) -> Sequence {
        Sequence::new(self.root_dir.as_path(), self.sequence_prefix.as_str())
    }

    /// The run's sequence inside a user-supplied frame directory
    pub fn sequence_in(&self, directory: &Path) -> Sequence {
        Sequence::new(directory, self.sequence_prefix.as_str())
    }

    /// Remove this run's frames and any directories left empty.
    ///
    /// Subdirectories go first so the working directory itself can be
    /// removed last when nothing else lives there.
    pub fn cleanup_all(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for sequence in [self.input_sequence(), self.background_sequence(), self.output_sequence()] {
            report.merge(sequence.cleanup(&self.root_dir));
        }

        info!("Cleanup removed {} files and {} directories ({} failures)",
              report.removed_files, report.removed_dirs, report.failures.len());
        report
    }
}

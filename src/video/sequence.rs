//! Frame sequences stored on disk as `<dir>/<prefix>_NNNN.png`.
//!
//! Frames are ordered by file name. Indices are zero-padded to four digits,
//! so ordering matches numeric order only up to frame 9999.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{Result, SequenceError};
use crate::video::types::Frame;

/// Frame files are always PNG
pub const FRAME_EXTENSION: &str = "png";

/// A named, ordered set of frame files identified by `(directory, prefix)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    directory: PathBuf,
    prefix: String,
}

impl Sequence {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(directory: P, prefix: S) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path that frame `index` is written to
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{:04}.{}", self.prefix, index, FRAME_EXTENSION))
    }

    /// printf-style pattern handed to ffmpeg for extraction
    pub fn write_pattern(&self) -> PathBuf {
        self.directory
            .join(format!("{}_%04d.{}", self.prefix, FRAME_EXTENSION))
    }

    /// Whether `file_name` belongs to this sequence
    pub fn matches(&self, file_name: &str) -> bool {
        let Some(rest) = file_name.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        let Some(digits) = rest
            .strip_prefix('_')
            .and_then(|r| r.strip_suffix(FRAME_EXTENSION))
            .and_then(|r| r.strip_suffix('.'))
        else {
            return false;
        };
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }

    /// Member frame files sorted by name; a missing directory yields none
    pub fn frames(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_member = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| self.matches(name))
                .unwrap_or(false);
            if is_member && path.is_file() {
                frames.push(path);
            }
        }

        frames.sort();
        Ok(frames)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.frames()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Like [`frames`](Self::frames) but an empty sequence is an error
    pub fn require_frames(&self) -> Result<Vec<PathBuf>> {
        let frames = self.frames()?;
        if frames.is_empty() {
            return Err(SequenceError::NoFrames {
                directory: self.directory.display().to_string(),
                prefix: self.prefix.clone(),
            }.into());
        }
        Ok(frames)
    }

    /// Load the frame stored at `path` as RGBA, tagging it with `index`
    pub fn load_frame(index: usize, path: &Path) -> Result<Frame> {
        let image = image::open(path).map_err(|e| SequenceError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Frame::new(index, image.to_rgba8()))
    }

    /// Read the frame at ordinal position `index`
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let frames = self.frames()?;
        let path = frames.get(index).ok_or_else(|| SequenceError::FrameMissing {
            directory: self.directory.display().to_string(),
            prefix: self.prefix.clone(),
            index,
        })?;
        Self::load_frame(index, path)
    }

    /// Write `image` as frame `index`, creating the directory if needed
    pub fn write_frame(&self, index: usize, image: &DynamicImage) -> Result<PathBuf> {
        let path = self.frame_path(index);
        fs::create_dir_all(&self.directory)?;
        image.save(&path).map_err(|e| SequenceError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }

    /// Delete every member frame, leaving the directory and foreign files alone.
    ///
    /// Unlike [`Sequence::cleanup`], a failed removal is an error.
    pub fn clear(&self) -> Result<usize> {
        let frames = self.frames()?;
        for frame in &frames {
            fs::remove_file(frame).map_err(|e| SequenceError::WriteFailed {
                path: frame.display().to_string(),
                reason: format!("could not remove stale frame: {}", e),
            })?;
        }
        if !frames.is_empty() {
            debug!("Removed {} stale frames of '{}' from {}", frames.len(), self.prefix, self.directory.display());
        }
        Ok(frames.len())
    }

    /// Delete every frame of this sequence, then remove the directory and its
    /// parents up to and including `root` while they are empty.
    ///
    /// Never fails: problems are logged and recorded in the report.
    pub fn cleanup(&self, root: &Path) -> CleanupReport {
        let mut report = CleanupReport::default();

        if !self.directory.is_dir() {
            debug!("Nothing to clean in {}", self.directory.display());
            return report;
        }

        match self.frames() {
            Ok(frames) => {
                if frames.is_empty() {
                    debug!("No files found for prefix '{}' in {}", self.prefix, self.directory.display());
                }
                for frame in frames {
                    match fs::remove_file(&frame) {
                        Ok(()) => report.removed_files += 1,
                        Err(e) => report.record_failure(&frame, e),
                    }
                }
            }
            Err(e) => {
                warn!("Failed to list {}: {}", self.directory.display(), e);
                report.failures.push(format!("{}: {}", self.directory.display(), e));
            }
        }

        let mut dir = Some(self.directory.as_path());
        while let Some(current) = dir {
            if !current.starts_with(root) {
                break;
            }
            match is_empty_dir(current) {
                Ok(true) => match fs::remove_dir(current) {
                    Ok(()) => {
                        info!("Deleted empty directory: {}", current.display());
                        report.removed_dirs += 1;
                    }
                    Err(e) => {
                        report.record_failure(current, e);
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    report.record_failure(current, e);
                    break;
                }
            }
            if current == root {
                break;
            }
            dir = current.parent();
        }

        report
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// What a best-effort cleanup managed to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_files: usize,
    pub removed_dirs: usize,
    pub failures: Vec<String>,
}

impl CleanupReport {
    fn record_failure(&mut self, path: &Path, error: io::Error) {
        warn!("Failed to delete {}: {}", path.display(), error);
        self.failures.push(format!("{}: {}", path.display(), error));
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: CleanupReport) {
        self.removed_files += other.removed_files;
        self.removed_dirs += other.removed_dirs;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn solid(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba(color)))
    }

    #[test]
    fn test_frame_paths_are_zero_padded() {
        let seq = Sequence::new("/work", "202501011200_clip");
        assert_eq!(seq.frame_path(7), PathBuf::from("/work/202501011200_clip_0007.png"));
        assert_eq!(seq.frame_path(12345), PathBuf::from("/work/202501011200_clip_12345.png"));
        assert_eq!(seq.write_pattern(), PathBuf::from("/work/202501011200_clip_%04d.png"));
    }

    #[test]
    fn test_membership() {
        let seq = Sequence::new("/work", "run");
        assert!(seq.matches("run_0000.png"));
        assert!(seq.matches("run_12345.png"));
        assert!(!seq.matches("run_0000.jpg"));
        assert!(!seq.matches("run_.png"));
        assert!(!seq.matches("run_label_0000.png"));
        assert!(!seq.matches("other_0000.png"));
        assert!(!seq.matches("run0000.png"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let seq = Sequence::new(dir.path().join("absent"), "run");
        assert!(seq.frames().unwrap().is_empty());
        assert!(seq.require_frames().is_err());
    }

    #[test]
    fn test_write_then_enumerate_in_order() {
        let dir = tempdir().unwrap();
        let seq = Sequence::new(dir.path().join("frames"), "run");

        for index in [2, 0, 1] {
            seq.write_frame(index, &solid([index as u8, 0, 0, 255])).unwrap();
        }
        std::fs::write(dir.path().join("frames").join("notes.txt"), "x").unwrap();

        let frames = seq.frames().unwrap();
        assert_eq!(frames, vec![seq.frame_path(0), seq.frame_path(1), seq.frame_path(2)]);

        let frame = seq.read_frame(2).unwrap();
        assert_eq!(frame.index(), 2);
        assert_eq!(frame.get_pixel(0, 0), [2, 0, 0, 255]);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let dir = tempdir().unwrap();
        let seq = Sequence::new(dir.path(), "run");
        seq.write_frame(10000, &solid([0, 0, 0, 255])).unwrap();
        seq.write_frame(9999, &solid([0, 0, 0, 255])).unwrap();

        // "10000" sorts before "9999"
        let frames = seq.frames().unwrap();
        assert_eq!(frames, vec![seq.frame_path(10000), seq.frame_path(9999)]);
    }

    #[test]
    fn test_read_past_end_is_frame_missing() {
        let dir = tempdir().unwrap();
        let seq = Sequence::new(dir.path(), "run");
        seq.write_frame(0, &solid([0, 0, 0, 255])).unwrap();
        assert!(matches!(
            seq.read_frame(1),
            Err(crate::error::FxError::Sequence(SequenceError::FrameMissing { index: 1, .. }))
        ));
    }

    #[test]
    fn test_cleanup_removes_frames_and_empty_dirs() {
        let root = tempdir().unwrap();
        let work = root.path().join("work");
        let input = Sequence::new(work.join("inputframes"), "run");
        let output = Sequence::new(&work, "run");
        input.write_frame(0, &solid([1, 1, 1, 255])).unwrap();
        output.write_frame(0, &solid([1, 1, 1, 255])).unwrap();

        let report = input.cleanup(&work);
        assert_eq!(report.removed_files, 1);
        assert_eq!(report.removed_dirs, 1);
        assert!(!work.join("inputframes").exists());
        assert!(work.exists());

        let report = output.cleanup(&work);
        assert_eq!(report.removed_files, 1);
        assert_eq!(report.removed_dirs, 1);
        assert!(!work.exists());
        assert!(root.path().exists());
    }

    #[test]
    fn test_cleanup_keeps_foreign_files() {
        let root = tempdir().unwrap();
        let seq = Sequence::new(root.path(), "run");
        seq.write_frame(0, &solid([1, 1, 1, 255])).unwrap();
        std::fs::write(root.path().join("keep.txt"), "x").unwrap();

        let report = seq.cleanup(root.path());
        assert_eq!(report.removed_files, 1);
        assert_eq!(report.removed_dirs, 0);
        assert!(root.path().join("keep.txt").exists());
    }

    #[test]
    fn test_clear_removes_only_members() {
        let root = tempdir().unwrap();
        let seq = Sequence::new(root.path(), "run");
        let other = Sequence::new(root.path(), "other");
        for index in 0..3 {
            seq.write_frame(index, &solid([1, 1, 1, 255])).unwrap();
        }
        other.write_frame(0, &solid([2, 2, 2, 255])).unwrap();

        assert_eq!(seq.clear().unwrap(), 3);
        assert!(seq.is_empty().unwrap());
        assert_eq!(other.len().unwrap(), 1);
        assert!(root.path().is_dir());
        assert_eq!(seq.clear().unwrap(), 0);
    }

    #[test]
    fn test_cleanup_twice_is_a_no_op() {
        let root = tempdir().unwrap();
        let work = root.path().join("work");
        let seq = Sequence::new(&work, "run");
        seq.write_frame(0, &solid([1, 1, 1, 255])).unwrap();

        let first = seq.cleanup(&work);
        assert!(first.is_clean());
        let second = seq.cleanup(&work);
        assert_eq!(second, CleanupReport::default());
    }
}

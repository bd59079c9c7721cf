use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::video::sequence::Sequence;
use crate::video::types::{EncodedVideo, StreamInfo};

/// Converts between video containers and frame sequences
pub trait FrameCodec: Send + Sync {
    /// Decode every frame of `source` into `sequence`
    fn extract_frames(&self, source: &Path, sequence: &Sequence) -> Result<StreamInfo>;

    /// Encode `sequence` in index order into a video at `destination`.
    ///
    /// Unreadable frames are skipped with a warning; a sequence with no
    /// readable frame at all is an error.
    fn reassemble(&self, sequence: &Sequence, frame_rate: f64, destination: &Path) -> Result<EncodedVideo>;
}

/// [`FrameCodec`] backed by the external ffmpeg and ffprobe executables
pub struct FfmpegCodec {
    config: CodecConfig,
    default_frame_rate: f64,
}

impl FfmpegCodec {
    pub fn new(config: CodecConfig, default_frame_rate: f64) -> Self {
        Self {
            config,
            default_frame_rate,
        }
    }

    pub fn check_available(&self) -> bool {
        Command::new(&self.config.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn require_ffmpeg(&self) -> Result<()> {
        if self.check_available() {
            Ok(())
        } else {
            Err(CodecError::ToolMissing { tool: self.config.ffmpeg.clone() }.into())
        }
    }

    /// Average frame rate of the first video stream, if ffprobe can tell
    pub fn probe_frame_rate(&self, source: &Path) -> Option<f64> {
        let output = Command::new(&self.config.ffprobe)
            .args([
                "-v", "error",
                "-select_streams", "v:0",
                "-show_entries", "stream=avg_frame_rate",
                "-of", "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(source)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.lines().find_map(parse_frame_rate)
    }

    fn run(&self, mut cmd: Command) -> std::result::Result<(), String> {
        debug!("Running {:?}", cmd);
        let output = cmd.output().map_err(|e| format!("FFmpeg execution failed: {}", e))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!("FFmpeg failed: {}", String::from_utf8_lossy(&output.stderr).trim()))
        }
    }

    fn quality_to_crf(&self) -> u8 {
        let quality = self.config.quality.min(100);
        51 - ((quality as f32 / 100.0) * 51.0) as u8
    }
}

impl FrameCodec for FfmpegCodec {
    fn extract_frames(&self, source: &Path, sequence: &Sequence) -> Result<StreamInfo> {
        if !source.is_file() {
            return Err(CodecError::SourceNotFound { path: source.display().to_string() }.into());
        }
        self.require_ffmpeg()?;
        fs::create_dir_all(sequence.directory())?;

        let frame_rate = self.probe_frame_rate(source).unwrap_or_else(|| {
            warn!("Could not probe frame rate of {}, assuming {} fps", source.display(), self.default_frame_rate);
            self.default_frame_rate
        });

        let mut cmd = Command::new(&self.config.ffmpeg);
        cmd.args(["-v", "error", "-i"])
            .arg(source)
            .args(["-start_number", "0", "-y"])
            .arg(sequence.write_pattern());

        self.run(cmd).map_err(|reason| CodecError::ExtractionFailed {
            path: source.display().to_string(),
            reason,
        })?;

        let frame_count = sequence.len()?;
        if frame_count == 0 {
            return Err(CodecError::ExtractionFailed {
                path: source.display().to_string(),
                reason: "no frames decoded".to_string(),
            }.into());
        }

        info!("Extracted {} frames at {:.2} fps from {}", frame_count, frame_rate, source.display());
        Ok(StreamInfo { frame_rate, frame_count })
    }

    fn reassemble(&self, sequence: &Sequence, frame_rate: f64, destination: &Path) -> Result<EncodedVideo> {
        let frames = readable_frames(sequence)?;
        let total = sequence.len()?;
        self.require_ffmpeg()?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let list_path = sequence
            .directory()
            .join(format!("{}_frames.txt", sequence.prefix()));
        write_concat_list(&frames, frame_rate, &list_path)?;

        let mut cmd = Command::new(&self.config.ffmpeg);
        cmd.args(["-v", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args([
                // yuv420p needs even dimensions
                "-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-c:v", self.config.video_codec.as_str(),
                "-r", frame_rate.to_string().as_str(),
                "-pix_fmt", "yuv420p",
                "-crf", self.quality_to_crf().to_string().as_str(),
                "-y",
            ])
            .arg(destination);

        let result = self.run(cmd);
        if let Err(e) = fs::remove_file(&list_path) {
            warn!("Failed to remove frame list {}: {}", list_path.display(), e);
        }
        result.map_err(|reason| CodecError::EncodingFailed { reason })?;

        let file_size = fs::metadata(destination)?.len();
        let encoded = EncodedVideo {
            path: destination.to_path_buf(),
            frame_count: frames.len(),
            skipped_frames: total - frames.len(),
            duration: frames.len() as f64 / frame_rate,
            file_size,
        };

        info!("Reassembled {} frames into {} ({:.1} MB)",
              encoded.frame_count, destination.display(), file_size as f64 / 1024.0 / 1024.0);
        Ok(encoded)
    }
}

/// Frames of `sequence` that fully decode; the rest are skipped with a warning
fn readable_frames(sequence: &Sequence) -> Result<Vec<PathBuf>> {
    let mut readable = Vec::new();
    for path in sequence.frames()? {
        match image::open(&path) {
            Ok(_) => readable.push(path),
            Err(e) => warn!("Skipping unreadable frame {}: {}", path.display(), e),
        }
    }

    if readable.is_empty() {
        return Err(CodecError::NoFrames {
            directory: sequence.directory().display().to_string(),
            prefix: sequence.prefix().to_string(),
        }.into());
    }
    Ok(readable)
}

/// Write an ffmpeg concat-demuxer list showing each frame for `1 / frame_rate` seconds
fn write_concat_list(frames: &[PathBuf], frame_rate: f64, list_path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(list_path)?);
    let frame_duration = 1.0 / frame_rate;

    for frame in frames {
        writeln!(file, "file '{}'", concat_escape(frame))?;
        writeln!(file, "duration {:.6}", frame_duration)?;
    }

    // The concat demuxer ignores the last duration unless the file repeats
    if let Some(last) = frames.last() {
        writeln!(file, "file '{}'", concat_escape(last))?;
    }

    file.flush()?;
    Ok(())
}

fn concat_escape(path: &Path) -> String {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    absolute.display().to_string().replace('\'', r"'\''")
}

/// Parse ffprobe's `num/den` (or plain number) frame rate
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let value = value.trim();
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

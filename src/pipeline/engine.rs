use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use rayon::prelude::*;
use tokio::task;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    effects::EffectSpec,
    error::{ConfigError, FrameError, FxError, Result},
    pipeline::context::WorkingContext,
    video::{is_video_file, CleanupReport, EncodedVideo, FfmpegCodec, FrameCodec, PixelBuffer, Sequence},
};

/// Where a frame sequence comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSource {
    /// A video container that still has to be split into frames
    Video(PathBuf),
    /// A directory already holding `<prefix>_NNNN.png` frames
    Directory(PathBuf),
}

/// How the foreground input is processed, decided once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    SingleImage(PathBuf),
    Sequence(SequenceSource),
}

impl InputKind {
    pub fn resolve(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::InputNotFound { path: path.display().to_string() }.into());
        }

        if is_video_file(path) {
            Ok(Self::Sequence(SequenceSource::Video(path.to_path_buf())))
        } else if path.is_file() {
            Ok(Self::SingleImage(path.to_path_buf()))
        } else if path.is_dir() {
            Ok(Self::Sequence(SequenceSource::Directory(path.to_path_buf())))
        } else {
            Err(ConfigError::InvalidInput {
                path: path.display().to_string(),
                reason: "neither a file nor a directory".to_string(),
            }.into())
        }
    }
}

/// Background supplied for compositing effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSource {
    None,
    StaticImage(PathBuf),
    Sequence(SequenceSource),
}

impl BackgroundSource {
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::None);
        };

        match InputKind::resolve(path)? {
            InputKind::SingleImage(path) => Ok(Self::StaticImage(path)),
            InputKind::Sequence(source) => Ok(Self::Sequence(source)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Paths for one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Image, video, or frame directory
    pub input: PathBuf,
    /// Image, video, or frame directory composited behind the input
    pub background: Option<PathBuf>,
    /// Output image (single-image mode) or video; other paths leave the
    /// frames in the working directory
    pub output: PathBuf,
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of frame indices attempted
    pub frame_count: usize,
    pub succeeded: Vec<usize>,
    pub failed: Vec<FrameError>,
    /// Final image or video, if one was written
    pub output: Option<PathBuf>,
    pub encoded: Option<EncodedVideo>,
    pub cleanup: Option<CleanupReport>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.succeeded.len() == self.frame_count
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.index).collect()
    }
}

/// Background as seen by the frame loop
enum FrameBackground {
    None,
    /// Shared read-only; each frame works on its own clone
    Static(Arc<PixelBuffer>),
    Frames(Vec<PathBuf>),
}

/// Drives an effect across a single image or a whole frame sequence
///
/// The run follows a fixed order:
/// 1. Resolve the input and background kinds
/// 2. Extract frames from video inputs
/// 3. Apply the effect to every frame index in parallel
/// 4. Reassemble a video when the output is one
/// 5. Clean up intermediate frames when asked to
#[derive(Clone)]
pub struct Pipeline {
    config: Config,
    effect: EffectSpec,
    codec: Arc<dyn FrameCodec>,
}

impl Pipeline {
    pub fn new(config: Config, effect: EffectSpec, codec: Arc<dyn FrameCodec>) -> Self {
        Self { config, effect, codec }
    }

    /// Pipeline using the system ffmpeg for extraction and reassembly
    pub fn with_ffmpeg(config: Config, effect: EffectSpec) -> Self {
        let codec = FfmpegCodec::new(config.codec.clone(), config.pipeline.default_frame_rate);
        Self::new(config, effect, Arc::new(codec))
    }

    pub fn effect(&self) -> &EffectSpec {
        &self.effect
    }

    /// Run on the blocking thread pool so the async runtime stays responsive
    pub async fn run(&self, ctx: WorkingContext, request: RunRequest) -> Result<RunReport> {
        let engine = self.clone();
        task::spawn_blocking(move || engine.run_blocking(&ctx, &request))
            .await
            .map_err(|e| FxError::generic(format!("pipeline task failed: {}", e)))?
    }

    pub fn run_blocking(&self, ctx: &WorkingContext, request: &RunRequest) -> Result<RunReport> {
        let input = InputKind::resolve(&request.input)?;
        let background = BackgroundSource::resolve(request.background.as_deref())?;

        if self.effect.requires_background() && background.is_none() {
            return Err(ConfigError::MissingBackground {
                operation: self.effect.name().to_string(),
            }.into());
        }

        info!("Starting {} run", self.effect);
        info!("   Input: {:?}", request.input);
        info!("   Output: {:?}", request.output);
        info!("   Working directory: {:?} (prefix {})", ctx.root_dir, ctx.sequence_prefix);

        ctx.ensure()?;

        let mut report = match input {
            InputKind::SingleImage(path) => self.run_single_image(&path, &background, &request.output)?,
            InputKind::Sequence(source) => self.run_sequence(ctx, &source, &background, &request.output)?,
        };

        if ctx.cleanup {
            report.cleanup = Some(ctx.cleanup_all());
        }

        info!("Run finished: {}/{} frames succeeded", report.succeeded.len(), report.frame_count);
        Ok(report)
    }

    // ==========================================
    // SINGLE-IMAGE MODE
    // ==========================================

    fn run_single_image(
        &self,
        input: &Path,
        background: &BackgroundSource,
        output: &Path,
    ) -> Result<RunReport> {
        info!("Single-image mode");

        let bg = if self.effect.requires_background() {
            match background {
                BackgroundSource::StaticImage(path) => Some(load_rgba(path)?),
                BackgroundSource::Sequence(source) => {
                    let path = match source {
                        SequenceSource::Video(p) | SequenceSource::Directory(p) => p,
                    };
                    return Err(ConfigError::InvalidInput {
                        path: path.display().to_string(),
                        reason: "a single input image needs a single background image".to_string(),
                    }.into());
                }
                BackgroundSource::None => None,
            }
        } else {
            if !background.is_none() {
                debug!("{} ignores the background", self.effect.name());
            }
            None
        };

        let fg = load_rgba(input)?;
        let result = self.effect.apply(fg, bg)?;
        save_output(result, output)?;
        info!("Saved {:?}", output);

        Ok(RunReport {
            frame_count: 1,
            succeeded: vec![0],
            output: Some(output.to_path_buf()),
            ..RunReport::default()
        })
    }

    // ==========================================
    // SEQUENCE MODE
    // ==========================================

    fn run_sequence(
        &self,
        ctx: &WorkingContext,
        source: &SequenceSource,
        background: &BackgroundSource,
        output: &Path,
    ) -> Result<RunReport> {
        info!("Sequence mode");

        let (fg_sequence, frame_rate) = self.open_sequence(ctx, source, ctx.input_sequence(), "input")?;
        let fg_frames = fg_sequence.require_frames()?;
        let bg = self.open_background(ctx, background)?;

        let frame_count = match &bg {
            FrameBackground::Frames(bg_frames) => fg_frames.len().min(bg_frames.len()),
            FrameBackground::Static(_) | FrameBackground::None => fg_frames.len(),
        };
        if let FrameBackground::Frames(bg_frames) = &bg {
            if bg_frames.len() != fg_frames.len() {
                warn!("Foreground has {} frames, background {}; processing {}",
                      fg_frames.len(), bg_frames.len(), frame_count);
            }
        }

        // Frames left by an earlier run with the same prefix must not be reassembled
        let output_sequence = ctx.output_sequence();
        let shares_input_dir = same_directory(output_sequence.directory(), fg_sequence.directory())
            || matches!(&bg, FrameBackground::Frames(paths)
                if paths.first().and_then(|p| p.parent())
                    .is_some_and(|dir| same_directory(output_sequence.directory(), dir)));
        if shares_input_dir {
            warn!("Output frames share a directory and prefix with an input sequence; not clearing {:?}",
                  output_sequence.directory());
        } else {
            output_sequence.clear()?;
        }

        let outcomes = self.process_frames(&fg_frames, &bg, &output_sequence, frame_count)?;

        let mut report = RunReport {
            frame_count,
            ..RunReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(index) => report.succeeded.push(index),
                Err(err) => report.failed.push(err),
            }
        }
        if !report.failed.is_empty() {
            warn!("{} of {} frames failed: {:?}", report.failed.len(), frame_count, report.failed_indices());
        }

        if is_video_file(output) {
            let frame_rate = frame_rate.unwrap_or(self.config.pipeline.default_frame_rate);
            info!("Reassembling frames into {:?} at {:.2} fps", output, frame_rate);
            let encoded = self.codec.reassemble(&output_sequence, frame_rate, output)?;
            report.output = Some(encoded.path.clone());
            report.encoded = Some(encoded);
        } else {
            info!("Output {:?} is not a video; frames left in {:?}", output, ctx.root_dir);
        }

        Ok(report)
    }

    /// Turn a source into a readable sequence, extracting videos into `target`
    fn open_sequence(
        &self,
        ctx: &WorkingContext,
        source: &SequenceSource,
        target: Sequence,
        role: &str,
    ) -> Result<(Sequence, Option<f64>)> {
        match source {
            SequenceSource::Video(path) => {
                info!("Extracting frames from {} video {:?}...", role, path);
                let stream = self.codec.extract_frames(path, &target)?;
                Ok((target, Some(stream.frame_rate)))
            }
            SequenceSource::Directory(dir) => {
                info!("Using {} frame sequence from {:?}", role, dir);
                Ok((ctx.sequence_in(dir), None))
            }
        }
    }

    fn open_background(&self, ctx: &WorkingContext, background: &BackgroundSource) -> Result<FrameBackground> {
        if !self.effect.requires_background() {
            if !background.is_none() {
                debug!("{} ignores the background", self.effect.name());
            }
            return Ok(FrameBackground::None);
        }

        match background {
            BackgroundSource::None => Ok(FrameBackground::None),
            BackgroundSource::StaticImage(path) => {
                info!("Using static background image: {:?}", path);
                Ok(FrameBackground::Static(Arc::new(load_rgba(path)?)))
            }
            BackgroundSource::Sequence(source) => {
                let (sequence, _) = self.open_sequence(ctx, source, ctx.background_sequence(), "background")?;
                Ok(FrameBackground::Frames(sequence.require_frames()?))
            }
        }
    }

    /// Apply the effect to indices `0..frame_count` on a bounded worker pool
    fn process_frames(
        &self,
        fg_frames: &[PathBuf],
        bg: &FrameBackground,
        output: &Sequence,
        frame_count: usize,
    ) -> Result<Vec<std::result::Result<usize, FrameError>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pipeline.workers)
            .build()
            .map_err(|e| FxError::generic(format!("failed to start worker pool: {}", e)))?;
        let interval = self.config.pipeline.progress_interval.max(1);

        info!("Processing {} frames on {} workers", frame_count, self.config.pipeline.workers);

        let outcomes = pool.install(|| {
            (0..frame_count)
                .into_par_iter()
                .map(|index| {
                    if index % interval == 0 || index + 1 == frame_count {
                        info!("Processing frame {} of {}", index + 1, frame_count);
                    }
                    self.process_frame(index, &fg_frames[index], bg, output)
                        .map(|_| index)
                        .map_err(|e| {
                            warn!("Frame {} failed: {}", index, e);
                            FrameError::new(index, e)
                        })
                })
                .collect()
        });

        Ok(outcomes)
    }

    fn process_frame(
        &self,
        index: usize,
        fg_path: &Path,
        bg: &FrameBackground,
        output: &Sequence,
    ) -> Result<PathBuf> {
        let fg = Sequence::load_frame(index, fg_path)?.into_buffer();
        let bg = match bg {
            FrameBackground::None => None,
            FrameBackground::Static(image) => Some(PixelBuffer::clone(image)),
            FrameBackground::Frames(paths) => Some(Sequence::load_frame(index, &paths[index])?.into_buffer()),
        };

        let result = self.effect.apply(fg, bg)?;
        output.write_frame(index, &result)
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn load_rgba(path: &Path) -> Result<PixelBuffer> {
    Ok(image::open(path)?.to_rgba8())
}

/// Save a single-image result; JPEG has no alpha so RGBA is flattened first
fn save_output(image: DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let is_jpeg = matches!(
        path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref(),
        Some("jpg") | Some("jpeg")
    );
    let image = if is_jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };

    image.save(path)?;
    Ok(())
}

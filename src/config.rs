use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default Euclidean RGB distance under which a pixel counts as the key color
pub const DEFAULT_TOLERANCE: f32 = 30.0;

/// Default luma above which a pixel is never keyed out
pub const DEFAULT_WHITE_PROTECT: f32 = 180.0;

/// Main configuration for framefx
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Effect parameters
    #[serde(default)]
    pub effects: EffectsConfig,

    /// Frame loop settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// External ffmpeg settings
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.effects.validate()?;
        self.pipeline.validate()?;
        self.codec.validate()?;
        Ok(())
    }
}

/// Effect parameters shared by every frame of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Chroma key color distance tolerance
    pub tolerance: f32,

    /// Chroma key highlight protection threshold (0-255 luma)
    pub white_protect: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            white_protect: DEFAULT_WHITE_PROTECT,
        }
    }
}

impl EffectsConfig {
    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "effects.tolerance".to_string(),
                value: self.tolerance.to_string()
            }.into());
        }

        if !(0.0..=255.0).contains(&self.white_protect) {
            return Err(ConfigError::InvalidValue {
                key: "effects.white_protect".to_string(),
                value: self.white_protect.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of frames processed in parallel
    pub workers: usize,

    /// Log progress every N frames
    pub progress_interval: usize,

    /// Frame rate used when the input is already a frame directory
    pub default_frame_rate: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            progress_interval: 30,
            default_frame_rate: 30.0,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.workers".to_string(),
                value: self.workers.to_string()
            }.into());
        }

        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.progress_interval".to_string(),
                value: self.progress_interval.to_string()
            }.into());
        }

        if !self.default_frame_rate.is_finite() || self.default_frame_rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.default_frame_rate".to_string(),
                value: self.default_frame_rate.to_string()
            }.into());
        }

        Ok(())
    }
}

/// External ffmpeg/ffprobe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// ffmpeg executable
    pub ffmpeg: String,

    /// ffprobe executable
    pub ffprobe: String,

    /// Encoder passed to `-c:v`
    pub video_codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            video_codec: "libx264".to_string(),
            quality: 85,
        }
    }
}

impl CodecConfig {
    fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "codec.quality".to_string(),
                value: self.quality.to_string()
            }.into());
        }

        if self.ffmpeg.trim().is_empty() || self.ffprobe.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "codec.ffmpeg".to_string(),
                value: format!("{:?}/{:?}", self.ffmpeg, self.ffprobe)
            }.into());
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

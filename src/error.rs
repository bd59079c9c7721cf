use thiserror::Error;

/// Main error type for the framefx library
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Configuration and argument errors, reported before any frame is touched
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid hex color '{value}': use RRGGBB or #RRGGBB")]
    InvalidColor { value: String },

    #[error("Operation '{operation}' requires a background image, video or frame directory")]
    MissingBackground { operation: String },

    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: String, reason: String },

    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Frame sequence storage errors
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("No frames matching '{prefix}_NNNN.png' found in {directory}")]
    NoFrames { directory: String, prefix: String },

    #[error("Frame {index} is not present in sequence {directory}/{prefix}")]
    FrameMissing {
        directory: String,
        prefix: String,
        index: usize,
    },

    #[error("Failed to read frame {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to write frame {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Errors raised by the per-pixel effects
#[derive(Error, Debug)]
pub enum EffectError {
    #[error("Invalid input for {effect}: expected {expected}, found {found}")]
    InvalidInputKind {
        effect: String,
        expected: String,
        found: String,
    },

    #[error("Effect {effect} needs a background frame")]
    MissingBackground { effect: String },
}

/// Errors from the external video codec
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Video source not found: {path}")]
    SourceNotFound { path: String },

    #[error("Frame extraction failed for {path}: {reason}")]
    ExtractionFailed { path: String, reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("No readable frames to reassemble in {directory}/{prefix}")]
    NoFrames { directory: String, prefix: String },

    #[error("{tool} not found. Please install FFmpeg.")]
    ToolMissing { tool: String },
}

/// A single frame's failure inside a sequence run
#[derive(Error, Debug)]
#[error("frame {index}: {source}")]
pub struct FrameError {
    pub index: usize,
    #[source]
    pub source: FxError,
}

impl FrameError {
    pub fn new(index: usize, source: impl Into<FxError>) -> Self {
        Self {
            index,
            source: source.into(),
        }
    }
}

/// Convenience type alias for Results using FxError
pub type Result<T> = std::result::Result<T, FxError>;

impl FxError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error ends the whole run rather than a single frame
    pub fn is_fatal_for_run(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Sequence(SequenceError::NoFrames { .. }) => true,
            Self::Codec(_) => true,
            Self::Generic(_) => true,
            Self::Sequence(_) | Self::Effect(_) | Self::Io(_) | Self::Image(_) => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::InvalidColor { value }) => {
                format!("'{}' is not a hex color. Use a value like 00FF00 or #00FF00.", value)
            }
            Self::Codec(CodecError::ToolMissing { tool }) => {
                format!("'{}' was not found on PATH. Install FFmpeg or set codec.{} in the config file.", tool, tool)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_fatal() {
        let err: FxError = ConfigError::MissingBackground {
            operation: "chromakey".to_string(),
        }
        .into();
        assert!(err.is_fatal_for_run());
    }

    #[test]
    fn test_frame_level_errors_are_recoverable() {
        let err: FxError = EffectError::InvalidInputKind {
            effect: "apply_light".to_string(),
            expected: "rgba8".to_string(),
            found: "rgb8".to_string(),
        }
        .into();
        assert!(!err.is_fatal_for_run());

        let missing: FxError = SequenceError::FrameMissing {
            directory: "work".to_string(),
            prefix: "clip".to_string(),
            index: 3,
        }
        .into();
        assert!(!missing.is_fatal_for_run());
    }

    #[test]
    fn test_frame_error_mentions_index() {
        let err = FrameError::new(
            12,
            SequenceError::ReadFailed {
                path: "clip_0012.png".to_string(),
                reason: "truncated".to_string(),
            },
        );
        assert!(err.to_string().starts_with("frame 12:"));
    }
}

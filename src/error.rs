//! Error types for voxcast.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxcastError {
    // Input errors
    #[error("Input text file not found at {path}")]
    InputNotFound { path: String },

    #[error("Input text is empty: {source_name}")]
    EmptyInput { source_name: String },

    /// Reserved for inputs the segmenter cannot split at all. Segmentation
    /// currently always falls back to a single whole-text chunk.
    #[error("Segmentation impossible: {message}")]
    SegmentationImpossible { message: String },

    // Synthesis errors
    #[error("Synthesis produced no audio for chunk {chunk_index}: {chunk_text:?}")]
    SynthesisFailure {
        chunk_index: usize,
        chunk_text: String,
    },

    #[error("Synthesis engine failed on chunk {chunk_index}: {message}")]
    EngineFailed { chunk_index: usize, message: String },

    #[error("Synthesis engine unavailable: {message}")]
    EngineUnavailable { message: String },

    // Audio errors
    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    #[error("No audio fragments to assemble")]
    NoAudio,

    #[error("Failed to write audio to {path}: {message}")]
    OutputWrite { path: String, message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxcastError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_input_not_found_display() {
        let error = VoxcastError::InputNotFound {
            path: "input/es_text.txt".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Input text file not found at input/es_text.txt"
        );
    }

    #[test]
    fn test_empty_input_display() {
        let error = VoxcastError::EmptyInput {
            source_name: "request body".to_string(),
        };
        assert_eq!(error.to_string(), "Input text is empty: request body");
    }

    #[test]
    fn test_synthesis_failure_display_carries_index_and_text() {
        let error = VoxcastError::SynthesisFailure {
            chunk_index: 2,
            chunk_text: "Tercer bloque.".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("chunk 2"), "got: {}", msg);
        assert!(msg.contains("Tercer bloque."), "got: {}", msg);
    }

    #[test]
    fn test_engine_failed_display() {
        let error = VoxcastError::EngineFailed {
            chunk_index: 0,
            message: "exit status 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Synthesis engine failed on chunk 0: exit status 1"
        );
    }

    #[test]
    fn test_audio_format_mismatch_display() {
        let error = VoxcastError::AudioFormatMismatch {
            expected: "24000 Hz".to_string(),
            actual: "22050 Hz".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio format mismatch: expected 24000 Hz, got 22050 Hz"
        );
    }

    #[test]
    fn test_no_audio_display() {
        assert_eq!(
            VoxcastError::NoAudio.to_string(),
            "No audio fragments to assemble"
        );
    }

    #[test]
    fn test_output_write_display() {
        let error = VoxcastError::OutputWrite {
            path: "/readonly/out.wav".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to write audio to /readonly/out.wav: permission denied"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = VoxcastError::ConfigInvalidValue {
            key: "segmentation.max_chars".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for segmentation.max_chars: must be positive"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VoxcastError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: VoxcastError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: VoxcastError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VoxcastError>();
        assert_sync::<VoxcastError>();
    }
}

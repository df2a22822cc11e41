//! Request/response boundary for hosting the pipeline behind a web front end.
//!
//! Transport-agnostic: a host decodes a JSON body into [`GenerateRequest`],
//! calls [`SynthesisService::generate`], and encodes either the
//! [`GenerateResponse`] or the [`ServiceError`] body with its status code.

use crate::audio::wav::write_wav;
use crate::defaults;
use crate::error::VoxcastError;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::tts::engine::{SpeechEngine, SynthesisParams};
use crate::tts::voices;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix under which artifacts are exposed to clients.
pub const AUDIO_URL_PREFIX: &str = "/audio/";

/// Incoming synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_split_pattern")]
    pub split_pattern: String,
}

fn default_voice() -> String {
    defaults::VOICE.to_string()
}

fn default_speed() -> f32 {
    defaults::SPEED
}

fn default_split_pattern() -> String {
    defaults::SERVICE_SPLIT_PATTERN.to_string()
}

impl GenerateRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: default_voice(),
            speed: default_speed(),
            split_pattern: default_split_pattern(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(json)
            .map_err(|e| ServiceError::bad_request(format!("Invalid request: {}", e)))
    }
}

/// Successful synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub audio_url: String,
    pub filename: String,
    /// Seconds, rounded to two decimals
    pub duration: f64,
    /// Fragments the engine produced
    pub chunks: usize,
}

impl GenerateResponse {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Error body sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed request: HTTP-style status plus message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ServiceError {
    pub status: u16,
    pub message: String,
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body())
    }
}

impl From<VoxcastError> for ServiceError {
    fn from(err: VoxcastError) -> Self {
        match err {
            VoxcastError::EmptyInput { .. } => Self::bad_request("Text must not be empty"),
            VoxcastError::NoAudio => Self::internal("Could not generate audio"),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Runs requests through the pipeline and stores the results as WAV files.
pub struct SynthesisService<E: SpeechEngine> {
    config: PipelineConfig,
    engine: Arc<E>,
    artifact_dir: PathBuf,
    sequence: AtomicU64,
}

impl<E: SpeechEngine + 'static> SynthesisService<E> {
    /// `config` supplies budget, sample rate, silence and workers; voice,
    /// speed and split pattern come from each request.
    pub fn new(config: PipelineConfig, engine: E, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
            artifact_dir: artifact_dir.into(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, ServiceError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(ServiceError::bad_request("Text must not be empty"));
        }
        if !voices::is_supported(&request.voice) {
            return Err(ServiceError::bad_request(format!(
                "Unsupported voice: {}",
                request.voice
            )));
        }
        if !(request.speed.is_finite() && request.speed > 0.0) {
            return Err(ServiceError::bad_request(format!(
                "Speed must be a positive number, got {}",
                request.speed
            )));
        }
        if let Err(e) = regex::Regex::new(&request.split_pattern) {
            return Err(ServiceError::bad_request(format!("Invalid split pattern: {}", e)));
        }

        log::info!(
            "Generating audio: voice={}, speed={}",
            request.voice,
            request.speed
        );

        let config = PipelineConfig {
            params: SynthesisParams {
                voice: request.voice,
                speed: request.speed,
                split_pattern: request.split_pattern,
            },
            ..self.config.clone()
        };
        let pipeline = Pipeline::from_arc(config, Arc::clone(&self.engine))?;
        let output = pipeline.run(text, "request").await?;

        let filename = self.next_filename();
        let path = self.artifact_dir.join(&filename);
        write_wav(&path, &output.waveform)?;
        log::debug!("Stored {}", path.display());

        Ok(GenerateResponse {
            success: true,
            audio_url: format!("{}{}", AUDIO_URL_PREFIX, filename),
            filename,
            duration: round2(output.waveform.duration_secs()),
            chunks: output.fragment_count,
        })
    }

    /// Resolve a stored artifact by file name.
    ///
    /// Returns `None` for anything but a plain `.wav` file name, or when the
    /// file does not exist.
    pub fn artifact_path(&self, filename: &str) -> Option<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return None,
        }
        if !filename.ends_with(".wav") {
            return None;
        }
        let path = self.artifact_dir.join(filename);
        path.is_file().then_some(path)
    }

    /// `voxcast_<unix seconds>_<8 hex>.wav`
    fn next_filename(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let tag = (u64::from(now.subsec_nanos()) ^ seq.wrapping_mul(0x9E37_79B9_7F4A_7C15)) as u32;
        format!("voxcast_{}_{:08x}.wav", now.as_secs(), tag)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::decode_wav;
    use crate::tts::engine::MockEngine;
    use tempfile::TempDir;

    fn service(dir: &TempDir, engine: MockEngine) -> SynthesisService<MockEngine> {
        let config = PipelineConfig {
            silence_ms: 0,
            ..PipelineConfig::default()
        };
        SynthesisService::new(config, engine, dir.path())
    }

    #[test]
    fn test_request_defaults() {
        let req = GenerateRequest::from_json(r#"{"text": "Hola"}"#).unwrap();
        assert_eq!(req.text, "Hola");
        assert_eq!(req.voice, "ef_dora");
        assert_eq!(req.speed, 0.92);
        assert_eq!(req.split_pattern, r"\n+");
        assert_eq!(req, GenerateRequest::new("Hola"));
    }

    #[test]
    fn test_malformed_request_is_bad_request() {
        let err = GenerateRequest::from_json(r#"{"text": 5}"#).unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[test]
    fn test_error_body_json() {
        let err = ServiceError::bad_request("Unsupported voice: xx");
        assert_eq!(err.to_json().unwrap(), r#"{"error":"Unsupported voice: xx"}"#);
    }

    #[test]
    fn test_error_mapping() {
        let empty: ServiceError = VoxcastError::EmptyInput {
            source_name: "request".to_string(),
        }
        .into();
        assert_eq!(empty.status, 400);

        let no_audio: ServiceError = VoxcastError::NoAudio.into();
        assert_eq!(no_audio.status, 500);

        let engine: ServiceError = VoxcastError::EngineFailed {
            chunk_index: 0,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(engine.status, 500);
        assert!(engine.message.contains("boom"));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.8275), 0.83);
        assert_eq!(round2(2.0), 2.0);
    }

    #[tokio::test]
    async fn test_generate_blank_text_is_400() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, MockEngine::new(24_000));
        let err = svc.generate(GenerateRequest::new("  \n ")).await.unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_generate_unsupported_voice_is_400() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new(24_000);
        let svc = service(&dir, engine.clone());
        let mut req = GenerateRequest::new("Hola.");
        req.voice = "jf_alpha".to_string();

        let err = svc.generate(req).await.unwrap_err();
        assert_eq!(err.status, 400);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_bad_speed_is_400() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new(24_000);
        let svc = service(&dir, engine.clone());

        for speed in [-1.0, 0.0, f32::NAN] {
            let mut req = GenerateRequest::new("Hola.");
            req.speed = speed;
            let err = svc.generate(req).await.unwrap_err();
            assert_eq!(err.status, 400, "speed {}", speed);
        }
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_bad_split_pattern_is_400() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new(24_000);
        let svc = service(&dir, engine.clone());
        let mut req = GenerateRequest::new("Hola.");
        req.split_pattern = "(".to_string();

        let err = svc.generate(req).await.unwrap_err();
        assert_eq!(err.status, 400);
        assert!(err.message.contains("split pattern"));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_silent_engine_is_500() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, MockEngine::new(24_000).with_silence_on("Hola"));
        let err = svc.generate(GenerateRequest::new("Hola.")).await.unwrap_err();
        assert_eq!(err.status, 500);
    }

    #[tokio::test]
    async fn test_generate_writes_artifact() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, MockEngine::new(24_000).with_samples_per_char(2_400));

        // Split pattern `\n+` yields two fragments from one chunk.
        let response = svc
            .generate(GenerateRequest::new("Hola.\nAdiós."))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.chunks, 2);
        assert!(response.filename.starts_with("voxcast_"));
        assert!(response.filename.ends_with(".wav"));
        assert_eq!(response.audio_url, format!("/audio/{}", response.filename));
        // (5 + 6) chars * 2400 samples at 24 kHz = 1.1 s
        assert_eq!(response.duration, 1.1);

        let path = svc.artifact_path(&response.filename).unwrap();
        let (samples, rate) = decode_wav(std::fs::File::open(path).unwrap()).unwrap();
        assert_eq!(rate, 24_000);
        assert_eq!(samples.len(), 11 * 2_400);

        let json = response.to_json().unwrap();
        assert!(json.contains(r#""success":true"#));
    }

    #[tokio::test]
    async fn test_filenames_are_unique() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, MockEngine::new(24_000));
        let a = svc.generate(GenerateRequest::new("Uno.")).await.unwrap();
        let b = svc.generate(GenerateRequest::new("Uno.")).await.unwrap();
        assert_ne!(a.filename, b.filename);
    }

    #[test]
    fn test_artifact_path_rejects_non_plain_names() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ok.wav"), b"RIFF").unwrap();
        let svc = service(&dir, MockEngine::new(24_000));

        assert!(svc.artifact_path("ok.wav").is_some());
        assert!(svc.artifact_path("missing.wav").is_none());
        assert!(svc.artifact_path("../ok.wav").is_none());
        assert!(svc.artifact_path("/etc/passwd").is_none());
        assert!(svc.artifact_path("sub/ok.wav").is_none());
        assert!(svc.artifact_path("..").is_none());
        assert!(svc.artifact_path("").is_none());
        assert!(svc.artifact_path("notes.txt").is_none());
    }
}

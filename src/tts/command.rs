//! Speech engine backed by an external program.
//!
//! The program receives the chunk text on stdin and must write a WAV stream to
//! stdout. Arguments may reference `{voice}`, `{speed}`, `{split_pattern}` and
//! `{lang}`, which are substituted per call.
//!
//! The `ProcessRunner` trait enables full testability without spawning anything.

use crate::audio::AudioFragment;
use crate::audio::wav::decode_wav;
use crate::defaults;
use crate::error::{Result, VoxcastError};
use crate::tts::engine::{SpeechEngine, SynthesisParams};
use crate::tts::voices::language_code;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

/// Everything needed to launch one engine process.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set for the child only.
    pub env: Vec<(String, String)>,
    /// Inherited variables removed from the child.
    pub env_remove: Vec<String>,
}

/// Trait for running an engine process.
///
/// Object-safe, Send + Sync for use from worker tasks.
pub trait ProcessRunner: Send + Sync {
    /// Run `spec` with `stdin` as input and return its stdout.
    ///
    /// Returns an error if the program is missing or exits unsuccessfully.
    fn run(&self, spec: &ProcessSpec, stdin: &[u8]) -> Result<Vec<u8>>;
}

/// Production runner using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, spec: &ProcessSpec, stdin: &[u8]) -> Result<Vec<u8>> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for key in &spec.env_remove {
            command.env_remove(key);
        }
        command.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoxcastError::EngineUnavailable {
                    message: format!(
                        "{} not found.\n\
                        Hint: set [engine].command in the config file or pass --engine",
                        spec.program
                    ),
                }
            } else if e.kind() == std::io::ErrorKind::PermissionDenied {
                VoxcastError::EngineUnavailable {
                    message: format!("Permission denied executing {}: {}", spec.program, e),
                }
            } else {
                VoxcastError::EngineUnavailable {
                    message: format!("Failed to execute {}: {}", spec.program, e),
                }
            }
        })?;

        // Feed stdin from its own thread so an engine that streams output
        // while still reading can never fill both pipes at once.
        let pipe = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(mut pipe) = pipe {
                    pipe.write_all(stdin)?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (output, written)
        });

        let output = output?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoxcastError::Other(format!(
                "{} failed with status {:?}: {}",
                spec.program,
                output.status,
                stderr.trim()
            )));
        }

        match written {
            // The engine may exit successfully without reading all of its input.
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }

        Ok(output.stdout)
    }
}

/// Engine that shells out once per chunk.
#[derive(Debug, Clone)]
pub struct CommandEngine<R: ProcessRunner = SystemProcessRunner> {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    acceleration: bool,
    sample_rate: u32,
    runner: R,
}

impl CommandEngine<SystemProcessRunner> {
    pub fn new(program: &str, args: Vec<String>, sample_rate: u32) -> Self {
        Self {
            program: program.to_string(),
            args,
            env: Vec::new(),
            acceleration: false,
            sample_rate,
            runner: SystemProcessRunner::new(),
        }
    }
}

impl<R: ProcessRunner> CommandEngine<R> {
    /// Replace the process runner (tests, sandboxes).
    pub fn with_runner<R2: ProcessRunner>(self, runner: R2) -> CommandEngine<R2> {
        CommandEngine {
            program: self.program,
            args: self.args,
            env: self.env,
            acceleration: self.acceleration,
            sample_rate: self.sample_rate,
            runner,
        }
    }

    /// Extra environment for the engine process.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Toggle the MPS fallback in the engine's environment.
    pub fn with_acceleration(mut self, enabled: bool) -> Self {
        self.acceleration = enabled;
        self
    }

    /// Build the launch spec for one call.
    pub fn process_spec(&self, params: &SynthesisParams) -> ProcessSpec {
        let lang = language_code(&params.voice)
            .map(String::from)
            .unwrap_or_default();
        let speed = params.speed.to_string();

        let args = self
            .args
            .iter()
            .map(|arg| {
                arg.replace("{voice}", &params.voice)
                    .replace("{speed}", &speed)
                    .replace("{split_pattern}", &params.split_pattern)
                    .replace("{lang}", &lang)
            })
            .collect();

        let mut env = self.env.clone();
        let mut env_remove = Vec::new();
        if self.acceleration {
            env.push((defaults::MPS_FALLBACK_ENV.to_string(), "1".to_string()));
        } else {
            env_remove.push(defaults::MPS_FALLBACK_ENV.to_string());
        }

        ProcessSpec {
            program: self.program.clone(),
            args,
            env,
            env_remove,
        }
    }
}

impl<R: ProcessRunner> SpeechEngine for CommandEngine<R> {
    fn synthesize(&self, text: &str, params: &SynthesisParams) -> Result<Vec<AudioFragment>> {
        let spec = self.process_spec(params);
        let stdout = self.runner.run(&spec, text.as_bytes())?;
        if stdout.is_empty() {
            return Ok(Vec::new());
        }

        let (samples, rate) = decode_wav(Cursor::new(stdout))?;
        if rate != self.sample_rate {
            return Err(VoxcastError::AudioFormatMismatch {
                expected: format!("{} Hz", self.sample_rate),
                actual: format!("{} Hz", rate),
            });
        }
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![AudioFragment::new(samples)])
    }

    fn name(&self) -> &str {
        &self.program
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

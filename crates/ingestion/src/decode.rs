//! Radar format decoding.
//!
//! Decoding NEXRAD Level II/III binaries is delegated to an external
//! program that prints the decoded volume as JSON on stdout. Decoders are
//! called from blocking worker threads.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use radar_common::{RadarError, RadarResult};

use crate::volume::RadarVolume;

/// Turns a staged file into a navigable volume.
pub trait VolumeDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> RadarResult<RadarVolume>;
}

/// Placeholder in decoder arguments replaced with the staged file path.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Runs an external decoder and parses its stdout.
///
/// When no argument contains `{input}`, the path is appended as the last
/// argument.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: String,
    args: Vec<String>,
}

impl CommandDecoder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, path: &Path) -> Vec<String> {
        let input = path.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(INPUT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(INPUT_PLACEHOLDER, &input)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(input.into_owned());
        }
        args
    }
}

impl VolumeDecoder for CommandDecoder {
    #[instrument(skip(self), fields(program = %self.program))]
    fn decode(&self, path: &Path) -> RadarResult<RadarVolume> {
        let output = Command::new(&self.program)
            .args(self.command_args(path))
            .output()
            .map_err(|e| RadarError::Decode(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RadarError::Decode(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let volume: RadarVolume = serde_json::from_slice(&output.stdout)
            .map_err(|e| RadarError::Decode(format!("invalid decoder output: {}", e)))?;
        volume.validate()?;
        debug!(sweeps = volume.nsweeps(), rays = volume.nrays(), "Decoded volume");
        Ok(volume)
    }
}

/// Reads files that already hold a decoded volume as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonVolumeDecoder;

impl VolumeDecoder for JsonVolumeDecoder {
    fn decode(&self, path: &Path) -> RadarResult<RadarVolume> {
        let data = std::fs::read(path)?;
        let volume: RadarVolume = serde_json::from_slice(&data)
            .map_err(|e| RadarError::Decode(format!("{}: {}", path.display(), e)))?;
        volume.validate()?;
        Ok(volume)
    }
}

/// Decoder selection in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DecoderConfig {
    /// External program, e.g. a pyart-based script
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Staged files are decoded JSON volumes
    Json,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig::Json
    }
}

impl DecoderConfig {
    pub fn build(&self) -> Arc<dyn VolumeDecoder> {
        match self {
            DecoderConfig::Command { program, args } => {
                Arc::new(CommandDecoder::new(program.clone(), args.clone()))
            }
            DecoderConfig::Json => Arc::new(JsonVolumeDecoder),
        }
    }
}

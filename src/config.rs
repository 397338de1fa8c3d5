use crate::constants::DEFAULT_FRAME_RATE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

fn default_output() -> PathBuf {
    PathBuf::from("output.webm")
}

/// Mux configuration file structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MuxConfig {
    /// Directory holding the `.webp` frames, muxed in file-name order
    pub input_dir: Option<PathBuf>,
    /// Output WebM path (default: output.webm)
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Frames per second (default: 60)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Per-frame durations in milliseconds, overriding `frame_rate` when set
    pub frame_durations_ms: Option<Vec<f64>>,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            output: default_output(),
            frame_rate: default_frame_rate(),
            frame_durations_ms: None,
        }
    }
}

impl MuxConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validate the configuration
    ///
    /// Requires an input directory and a positive frame rate; explicit
    /// durations must be finite and non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_dir.is_none() {
            return Err("input_dir is required (set it in the config or pass --input-dir)".to_string());
        }

        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(format!("frame_rate must be positive, got {}", self.frame_rate));
        }

        if let Some(durations) = &self.frame_durations_ms {
            if let Some((i, d)) = durations
                .iter()
                .enumerate()
                .find(|(_, d)| !d.is_finite() || **d < 0.0)
            {
                return Err(format!("frame_durations_ms[{}] is invalid: {}", i, d));
            }
        }

        Ok(())
    }
}

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_INTENSITY_THRESHOLD,
    TRAFFIC_LIGHT_CLASS_ID,
};

const DEFAULT_MODEL_PATH: &str = "models/yolov3";
pub const DEFAULT_TOPOLOGY_FILE: &str = "yolov3.onnx";
pub const DEFAULT_WEIGHTS_FILE: &str = "yolov3.weights";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ClassifierConfigFile {
    confidence_threshold: Option<f32>,
    intensity_threshold: Option<f64>,
    traffic_light_class_id: Option<usize>,
    model: Option<ModelConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    topology_file: Option<String>,
    weights_file: Option<String>,
    input_size: Option<u32>,
}

/// Construction options for the classification pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum detector confidence for a traffic light, in (0, 1].
    pub confidence_threshold: f32,
    /// Minimum mean top-band brightness (0..255) required for RED.
    pub intensity_threshold: f64,
    /// Detector vocabulary index of the traffic light class.
    pub traffic_light_class_id: usize,
    pub model: ModelSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Directory holding the topology descriptor and the weights blob.
    pub path: PathBuf,
    pub topology_file: String,
    /// External tensor data for the topology. Only checked for presence and
    /// readability: tract opens the file name recorded inside the graph, so
    /// this must match that name.
    pub weights_file: String,
    /// Square network input resolution.
    pub input_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::from_file(ClassifierConfigFile::default())
    }
}

impl ClassifierConfig {
    /// Load from the TOML file named by `TL_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like `load`, but an explicit `path` takes precedence over `TL_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("TL_CONFIG").ok().map(PathBuf::from));
        let file_cfg = match config_path {
            Some(path) => read_config_file(&path)?,
            None => ClassifierConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ClassifierConfigFile =
            toml::from_str(raw).map_err(|e| anyhow!("invalid config: {}", e))?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ClassifierConfigFile) -> Self {
        let model = file.model.unwrap_or_default();
        Self {
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            intensity_threshold: file
                .intensity_threshold
                .unwrap_or(DEFAULT_INTENSITY_THRESHOLD),
            traffic_light_class_id: file
                .traffic_light_class_id
                .unwrap_or(TRAFFIC_LIGHT_CLASS_ID),
            model: ModelSettings {
                path: model
                    .path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
                topology_file: model
                    .topology_file
                    .unwrap_or_else(|| DEFAULT_TOPOLOGY_FILE.to_string()),
                weights_file: model
                    .weights_file
                    .unwrap_or_else(|| DEFAULT_WEIGHTS_FILE.to_string()),
                input_size: model.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("TL_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = PathBuf::from(path);
            }
        }
        if let Ok(value) = std::env::var("TL_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("TL_CONFIDENCE_THRESHOLD must be a number"))?;
        }
        if let Ok(value) = std::env::var("TL_INTENSITY_THRESHOLD") {
            self.intensity_threshold = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("TL_INTENSITY_THRESHOLD must be a number"))?;
        }
        if let Ok(value) = std::env::var("TL_INPUT_SIZE") {
            self.model.input_size = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("TL_INPUT_SIZE must be a positive integer"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_confidence_threshold(self.confidence_threshold)?;
        if !self.intensity_threshold.is_finite() {
            return Err(anyhow!("intensity threshold must be finite"));
        }
        if self.model.input_size == 0 {
            return Err(anyhow!("model input size must be greater than zero"));
        }
        if self.model.topology_file.trim().is_empty() || self.model.weights_file.trim().is_empty()
        {
            return Err(anyhow!("model artifact file names must not be empty"));
        }
        Ok(())
    }

    pub fn topology_path(&self) -> PathBuf {
        self.model.path.join(&self.model.topology_file)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model.path.join(&self.model.weights_file)
    }
}

/// Confidence thresholds live in (0, 1].
pub(crate) fn validate_confidence_threshold(threshold: f32) -> Result<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(anyhow!(
            "confidence threshold must be in (0, 1], got {}",
            threshold
        ))
    }
}

fn read_config_file(path: &Path) -> Result<ClassifierConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

//! Signal Witness
//!
//! Decides, from a single camera frame, whether a visible traffic light is red.
//!
//! # Architecture
//!
//! 1. **Localize**: a pretrained multi-class detector finds every "traffic light"
//!    box above a confidence threshold and the frame is cropped to each box.
//! 2. **Classify**: each crop is split into three horizontal bands; the crop is
//!    red when the top band is the brightest and above an intensity threshold.
//! 3. **Aggregate**: the first red crop makes the whole frame RED; otherwise UNKNOWN.
//!
//! Yellow and green are never distinguished from "not red".
//!
//! # Module Structure
//!
//! - `frame`: B-G-R frames and borrowed crops
//! - `detect`: detector backend seam (stub, tract/ONNX), preprocessing, anchor decoding
//! - `localizer`: traffic light filtering and cropping
//! - `classifier`: three-band brightness heuristic
//! - `pipeline`: frame-level aggregation
//! - `config`: TOML file + environment configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod config;
pub mod detect;
pub mod frame;
pub mod localizer;
pub mod pipeline;

pub use classifier::{band_rows, ColorBand, ColorClassifier};
pub use config::{ClassifierConfig, ModelSettings};
pub use detect::{AnchorPrediction, Detection, DetectorBackend, InputBlob, StubBackend};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use frame::{Crop, Frame, BGR_CHANNELS};
pub use localizer::{Localize, ObjectLocalizer};
pub use pipeline::ClassificationPipeline;

// -------------------- Constants --------------------

/// Index of "traffic light" in the 80-class COCO vocabulary.
pub const TRAFFIC_LIGHT_CLASS_ID: usize = 9;

/// Default minimum mean top-band brightness (0..255 scale) for RED.
pub const DEFAULT_INTENSITY_THRESHOLD: f64 = 40.0;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Number of horizontal bands a traffic light crop is split into.
pub const BAND_COUNT: usize = 3;

/// Square detector input resolution.
pub const DEFAULT_INPUT_SIZE: u32 = 416;

// -------------------- Light State --------------------

/// Traffic light state handed to the vehicle-behavior side.
///
/// This crate only ever produces `Red` or `Unknown`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightState {
    Red,
    Yellow,
    Green,
    Unknown,
}

impl LightState {
    /// Numeric code used on the vehicle message bus.
    pub fn code(self) -> u8 {
        match self {
            LightState::Red => 0,
            LightState::Yellow => 1,
            LightState::Green => 2,
            LightState::Unknown => 4,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(LightState::Red),
            1 => Ok(LightState::Yellow),
            2 => Ok(LightState::Green),
            4 => Ok(LightState::Unknown),
            other => Err(anyhow!("unknown traffic light code {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_state_codes_round_trip() {
        for state in [
            LightState::Red,
            LightState::Yellow,
            LightState::Green,
            LightState::Unknown,
        ] {
            assert_eq!(LightState::from_code(state.code()).unwrap(), state);
        }
        assert!(LightState::from_code(3).is_err());
        assert!(LightState::from_code(5).is_err());
    }

    #[test]
    fn light_state_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&LightState::Red).unwrap(), "\"RED\"");
        let parsed: LightState = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(parsed, LightState::Unknown);
    }
}

//! Frame-level classification: localize, then classify crops until one is red.

use crate::classifier::ColorClassifier;
use crate::frame::Frame;
use crate::localizer::Localize;
use crate::LightState;

#[cfg(feature = "backend-tract")]
use anyhow::Result;

#[cfg(feature = "backend-tract")]
use crate::config::ClassifierConfig;
#[cfg(feature = "backend-tract")]
use crate::detect::TractBackend;
#[cfg(feature = "backend-tract")]
use crate::localizer::ObjectLocalizer;

/// Owns a localizer and a classifier; one call per incoming frame.
///
/// Any red light anywhere in the frame yields RED. Crops are classified in the
/// order the localizer returns them and the first RED ends the scan.
pub struct ClassificationPipeline<L> {
    localizer: L,
    classifier: ColorClassifier,
}

impl<L: Localize> ClassificationPipeline<L> {
    pub fn new(localizer: L, classifier: ColorClassifier) -> Self {
        Self {
            localizer,
            classifier,
        }
    }

    pub fn localizer(&self) -> &L {
        &self.localizer
    }

    pub fn classifier(&self) -> &ColorClassifier {
        &self.classifier
    }

    /// Classify one frame. Never fails; returns RED or UNKNOWN.
    pub fn get_classification(&self, frame: &Frame) -> LightState {
        let crops = self.localizer.locate(frame);
        if crops.is_empty() {
            return LightState::Unknown;
        }

        for (index, crop) in crops.iter().enumerate() {
            if self.classifier.classify(crop) == LightState::Red {
                log::debug!("crop {} of {} classified red", index + 1, crops.len());
                return LightState::Red;
            }
        }
        LightState::Unknown
    }
}

#[cfg(feature = "backend-tract")]
impl ClassificationPipeline<ObjectLocalizer<TractBackend>> {
    /// Build the full pipeline from configuration, loading the detector once.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let localizer = ObjectLocalizer::from_config(config)?;
        Ok(Self::new(
            localizer,
            ColorClassifier::new(config.intensity_threshold),
        ))
    }
}

//! Traffic light localization.
//!
//! `ObjectLocalizer` runs the detector once per frame, keeps anchors whose
//! best class is the traffic light class at or above the confidence threshold,
//! and cuts one crop per surviving box. Crops come out in detector scan order.
//! Overlapping boxes are all kept; there is no non-maximum suppression.

use anyhow::Result;

use crate::config::validate_confidence_threshold;
use crate::detect::{Detection, DetectorBackend};
use crate::frame::{Crop, Frame};
use crate::TRAFFIC_LIGHT_CLASS_ID;

#[cfg(feature = "backend-tract")]
use crate::config::ClassifierConfig;
#[cfg(feature = "backend-tract")]
use crate::detect::TractBackend;

/// Anything that can turn a frame into traffic light crops.
pub trait Localize {
    fn locate<'f>(&self, frame: &'f Frame) -> Vec<Crop<'f>>;
}

pub struct ObjectLocalizer<B> {
    backend: B,
    confidence_threshold: f32,
    class_id: usize,
}

impl<B: DetectorBackend> ObjectLocalizer<B> {
    pub fn new(backend: B, confidence_threshold: f32) -> Result<Self> {
        validate_confidence_threshold(confidence_threshold)?;
        Ok(Self {
            backend,
            confidence_threshold,
            class_id: TRAFFIC_LIGHT_CLASS_ID,
        })
    }

    /// Override the detector class index treated as "traffic light".
    pub fn with_class_id(mut self, class_id: usize) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Accepted traffic light boxes in pixel space, in scan order.
    ///
    /// Degenerate frames and inference failures yield no detections.
    pub fn detections(&self, frame: &Frame) -> Vec<Detection> {
        if frame.is_degenerate() {
            log::debug!(
                "skipping degenerate frame {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels()
            );
            return Vec::new();
        }
        let anchors = match self.backend.forward(frame) {
            Ok(anchors) => anchors,
            Err(e) => {
                log::warn!(
                    "{} backend failed, treating frame as empty: {:#}",
                    self.backend.name(),
                    e
                );
                return Vec::new();
            }
        };

        anchors
            .iter()
            .filter_map(|anchor| {
                let (class_id, confidence) = anchor.best_class()?;
                if class_id != self.class_id
                    || !confidence.is_finite()
                    || confidence < self.confidence_threshold
                {
                    return None;
                }
                Detection::from_anchor(
                    anchor,
                    class_id,
                    confidence,
                    frame.width(),
                    frame.height(),
                )
            })
            .collect()
    }

    /// Crops for every accepted detection. Boxes empty after clamping are dropped.
    pub fn detect<'f>(&self, frame: &'f Frame) -> Vec<Crop<'f>> {
        let detections = self.detections(frame);
        let crops: Vec<Crop<'f>> = detections
            .iter()
            .filter_map(|det| frame.crop(det.x, det.y, det.w, det.h))
            .collect();
        log::debug!(
            "{} traffic light detections, {} crops",
            detections.len(),
            crops.len()
        );
        crops
    }
}

#[cfg(feature = "backend-tract")]
impl ObjectLocalizer<TractBackend> {
    /// Load the detector artifacts named by `config`. Fails if they are missing or malformed.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let backend = TractBackend::new(
            config.topology_path(),
            config.weights_path(),
            config.model.input_size,
        )?;
        Ok(Self::new(backend, config.confidence_threshold)?
            .with_class_id(config.traffic_light_class_id))
    }
}

impl<B: DetectorBackend> Localize for ObjectLocalizer<B> {
    fn locate<'f>(&self, frame: &'f Frame) -> Vec<Crop<'f>> {
        self.detect(frame)
    }
}

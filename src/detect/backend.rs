use anyhow::Result;

use crate::detect::result::AnchorPrediction;
use crate::frame::Frame;

/// Detector backend trait.
///
/// Backends own their inference handle and never mutate it after
/// construction, so `forward` takes `&self`. Callers serialize invocations;
/// no locking happens here.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run one forward pass over a well-formed frame.
    ///
    /// Returns every anchor across all output scales, in output order.
    /// Box coordinates are normalized to the frame (0..1).
    fn forward(&self, frame: &Frame) -> Result<Vec<AnchorPrediction>>;
}

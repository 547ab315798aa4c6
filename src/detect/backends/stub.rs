use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::AnchorPrediction;
use crate::frame::Frame;

/// Scripted backend for tests and the synthetic demo.
///
/// Every forward pass replays the same anchors, regardless of frame content.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    anchors: Vec<AnchorPrediction>,
    failure: Option<String>,
}

impl StubBackend {
    pub fn new(anchors: Vec<AnchorPrediction>) -> Self {
        Self {
            anchors,
            failure: None,
        }
    }

    /// Backend whose forward pass always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            anchors: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn forward(&self, _frame: &Frame) -> Result<Vec<AnchorPrediction>> {
        match &self.failure {
            Some(message) => Err(anyhow!("stub inference failed: {}", message)),
            None => Ok(self.anchors.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_backend_replays_script() {
        let anchor = AnchorPrediction::from_region_row(&[0.5, 0.5, 0.1, 0.3, 1.0, 0.9]).unwrap();
        let backend = StubBackend::new(vec![anchor.clone()]);
        let frame = Frame::bgr(vec![0u8; 12], 2, 2).unwrap();

        assert_eq!(backend.forward(&frame).unwrap(), vec![anchor.clone()]);
        assert_eq!(backend.forward(&frame).unwrap(), vec![anchor]);
    }

    #[test]
    fn failing_stub_reports_error() {
        let backend = StubBackend::failing("boom");
        let frame = Frame::bgr(vec![0u8; 12], 2, 2).unwrap();
        let err = backend.forward(&frame).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}

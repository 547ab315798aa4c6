#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::preprocess::InputBlob;
use crate::detect::result::{AnchorPrediction, REGION_BOX_FIELDS};
use crate::frame::Frame;

/// Tract-based backend for an ONNX export of a region-layer detector.
///
/// The topology file references its weights as external tensor data; both
/// files must be present next to each other. tract resolves the weights by the
/// name recorded in the graph, so `weights_path` is only pre-checked.
/// Every graph output is read as rows of `[cx, cy, w, h, objectness, class
/// scores...]`, scales in output order.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
}

impl TractBackend {
    /// Load the model artifacts from disk and prepare them for inference.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        topology_path: P,
        weights_path: Q,
        input_size: u32,
    ) -> Result<Self> {
        let topology_path = topology_path.as_ref();
        let weights_path = weights_path.as_ref();
        if input_size == 0 {
            return Err(anyhow!("network input size must be > 0"));
        }
        ensure_readable(topology_path, "topology descriptor")?;
        ensure_readable(weights_path, "weights blob")?;

        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(topology_path)
            .with_context(|| {
                format!("failed to load ONNX model from {}", topology_path.display())
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "loaded detector {} ({}x{} input)",
            topology_path.display(),
            input_size,
            input_size
        );
        Ok(Self { model, input_size })
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let blob = InputBlob::from_frame(frame, self.input_size)?;
        let shape = blob.shape();
        let input = tract_ndarray::Array4::from_shape_vec(shape, blob.into_vec())
            .context("network input shape mismatch")?;
        Ok(input.into_tensor())
    }

    fn decode_outputs(&self, outputs: TVec<TValue>) -> Result<Vec<AnchorPrediction>> {
        if outputs.is_empty() {
            return Err(anyhow!("model produced no outputs"));
        }
        let mut anchors = Vec::new();
        for (index, output) in outputs.iter().enumerate() {
            let view = output
                .to_array_view::<f32>()
                .with_context(|| format!("model output {} was not f32", index))?;
            let stride = *view
                .shape()
                .last()
                .ok_or_else(|| anyhow!("model output {} is a scalar", index))?;
            if stride <= REGION_BOX_FIELDS {
                return Err(anyhow!(
                    "model output {} has {} fields per row, expected more than {}",
                    index,
                    stride,
                    REGION_BOX_FIELDS
                ));
            }
            let values: Vec<f32> = view.iter().copied().collect();
            anchors.extend(
                values
                    .chunks_exact(stride)
                    .filter_map(AnchorPrediction::from_region_row),
            );
        }
        Ok(anchors)
    }
}

fn ensure_readable(path: &Path, what: &str) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("missing {} at {}", what, path.display()))?;
    if !metadata.is_file() {
        return Err(anyhow!("{} at {} is not a file", what, path.display()));
    }
    std::fs::File::open(path)
        .with_context(|| format!("unreadable {} at {}", what, path.display()))?;
    Ok(())
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn forward(&self, frame: &Frame) -> Result<Vec<AnchorPrediction>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_outputs(outputs)
    }
}

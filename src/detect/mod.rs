//! Object detection seam.
//!
//! A `DetectorBackend` runs one forward pass and reports raw anchor rows.
//! Filtering to traffic lights and cutting crops happens in `localizer`.

mod backend;
mod backends;
mod preprocess;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use preprocess::InputBlob;
pub use result::{AnchorPrediction, Detection, REGION_BOX_FIELDS};

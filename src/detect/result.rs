/// Leading fields of a region-layer row: center x, center y, width, height, objectness.
pub const REGION_BOX_FIELDS: usize = 5;

/// One anchor of the detector output, box normalized to the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorPrediction {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub objectness: f32,
    /// Per-class scores, already scaled by objectness.
    pub class_scores: Vec<f32>,
}

impl AnchorPrediction {
    /// Parse a `[cx, cy, w, h, objectness, p0, p1, ...]` row.
    ///
    /// Rows without at least one class score are rejected.
    pub fn from_region_row(row: &[f32]) -> Option<Self> {
        if row.len() <= REGION_BOX_FIELDS {
            return None;
        }
        Some(Self {
            center_x: row[0],
            center_y: row[1],
            width: row[2],
            height: row[3],
            objectness: row[4],
            class_scores: row[REGION_BOX_FIELDS..].to_vec(),
        })
    }

    /// Highest scoring class and its score. Ties resolve to the lowest index.
    pub fn best_class(&self) -> Option<(usize, f32)> {
        let mut scores = self.class_scores.iter().copied().enumerate();
        let first = scores.next()?;
        Some(scores.fold(first, |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        }))
    }
}

/// Accepted detection in pixel space. `(x, y)` is the top-left corner and may
/// lie outside the frame; clamping happens when the crop is cut.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    /// Scale a normalized center box to the frame and derive the top-left corner.
    ///
    /// Every stage truncates toward zero, matching an integer cast.
    /// Non-finite boxes yield `None`.
    pub fn from_anchor(
        anchor: &AnchorPrediction,
        class_id: usize,
        confidence: f32,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let frame_width = frame_width as f64;
        let frame_height = frame_height as f64;
        let center_x = (anchor.center_x as f64 * frame_width).trunc();
        let center_y = (anchor.center_y as f64 * frame_height).trunc();
        let width = (anchor.width as f64 * frame_width).trunc();
        let height = (anchor.height as f64 * frame_height).trunc();
        if ![center_x, center_y, width, height]
            .iter()
            .all(|v| v.is_finite())
        {
            return None;
        }

        Some(Self {
            x: (center_x - width / 2.0).trunc() as i64,
            y: (center_y - height / 2.0).trunc() as i64,
            w: width as i64,
            h: height as i64,
            class_id,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(cx: f32, cy: f32, w: f32, h: f32, scores: &[f32]) -> AnchorPrediction {
        AnchorPrediction {
            center_x: cx,
            center_y: cy,
            width: w,
            height: h,
            objectness: 1.0,
            class_scores: scores.to_vec(),
        }
    }

    #[test]
    fn region_row_splits_box_and_scores() {
        let row = [0.5, 0.25, 0.1, 0.2, 0.9, 0.0, 0.7, 0.1];
        let parsed = AnchorPrediction::from_region_row(&row).unwrap();
        assert_eq!(parsed.center_x, 0.5);
        assert_eq!(parsed.objectness, 0.9);
        assert_eq!(parsed.class_scores, vec![0.0, 0.7, 0.1]);

        assert!(AnchorPrediction::from_region_row(&row[..5]).is_none());
    }

    #[test]
    fn best_class_prefers_first_on_ties() {
        let a = anchor(0.0, 0.0, 0.0, 0.0, &[0.2, 0.6, 0.6, 0.1]);
        assert_eq!(a.best_class(), Some((1, 0.6)));

        let empty = anchor(0.0, 0.0, 0.0, 0.0, &[]);
        assert_eq!(empty.best_class(), None);
    }

    #[test]
    fn box_corner_truncates_toward_zero() {
        // 160x120 frame: cx=80, cy=60, w=40, h=15 -> y = 60 - 7.5 = 52.5 -> 52
        let a = anchor(0.5, 0.5, 0.25, 0.125, &[1.0]);
        let det = Detection::from_anchor(&a, 0, 1.0, 160, 120).unwrap();
        assert_eq!((det.x, det.y, det.w, det.h), (60, 52, 40, 15));

        // cx=10, w=25 -> x = -2.5 -> -2
        let a = anchor(0.0625, 0.5, 0.15625, 0.125, &[1.0]);
        let det = Detection::from_anchor(&a, 0, 1.0, 160, 120).unwrap();
        assert_eq!(det.x, -2);
        assert_eq!(det.w, 25);
    }

    #[test]
    fn non_finite_box_is_rejected() {
        let a = anchor(f32::NAN, 0.5, 0.25, 0.125, &[1.0]);
        assert!(Detection::from_anchor(&a, 0, 1.0, 160, 120).is_none());
    }
}

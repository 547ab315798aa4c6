//! Red / not-red decision for a single traffic light crop.
//!
//! The crop is split into three horizontal bands. With the top (red) bulb lit,
//! the top band carries the highest mean HSV value of the three.

use std::ops::Range;

use crate::frame::Crop;
use crate::{LightState, BAND_COUNT, DEFAULT_INTENSITY_THRESHOLD};

/// Horizontal third of a crop, top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorBand {
    Top,
    Middle,
    Bottom,
}

impl ColorBand {
    pub const ALL: [ColorBand; BAND_COUNT] = [ColorBand::Top, ColorBand::Middle, ColorBand::Bottom];

    pub fn index(self) -> usize {
        match self {
            ColorBand::Top => 0,
            ColorBand::Middle => 1,
            ColorBand::Bottom => 2,
        }
    }
}

/// Row ranges of the three bands for a crop of `height` rows.
///
/// Top and Middle get `height / 3` rows each; Bottom takes the rest.
/// Returns `None` when `height < 3`, since Top and Middle would be empty.
pub fn band_rows(height: usize) -> Option<[Range<usize>; BAND_COUNT]> {
    let slice = height / BAND_COUNT;
    if slice == 0 {
        return None;
    }
    Some([0..slice, slice..2 * slice, 2 * slice..height])
}

/// Mean of the HSV value channel (`max(B, G, R)`) over `rows` of the crop.
fn mean_value(crop: &Crop<'_>, rows: Range<usize>) -> f64 {
    let area = rows.len() * crop.width();
    let sum: u64 = rows
        .flat_map(|row| crop.row(row).chunks_exact(3))
        .map(|bgr| bgr[0].max(bgr[1]).max(bgr[2]) as u64)
        .sum();
    sum as f64 / area as f64
}

/// Brightness heuristic classifier. Stateless apart from its threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorClassifier {
    intensity_threshold: f64,
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INTENSITY_THRESHOLD)
    }
}

impl ColorClassifier {
    pub fn new(intensity_threshold: f64) -> Self {
        Self {
            intensity_threshold,
        }
    }

    pub fn intensity_threshold(&self) -> f64 {
        self.intensity_threshold
    }

    /// Mean value channel per band, `None` for crops under three rows.
    pub fn band_intensities(&self, crop: &Crop<'_>) -> Option<[f64; BAND_COUNT]> {
        let [top, middle, bottom] = band_rows(crop.height())?;
        Some([
            mean_value(crop, top),
            mean_value(crop, middle),
            mean_value(crop, bottom),
        ])
    }

    /// RED when the top band is the brightest (first on ties) and strictly
    /// above the threshold. Everything else, including short crops, is UNKNOWN.
    pub fn classify(&self, crop: &Crop<'_>) -> LightState {
        let intensities = match self.band_intensities(crop) {
            Some(intensities) => intensities,
            None => {
                log::debug!("crop {:?} too short for {} bands", crop, BAND_COUNT);
                return LightState::Unknown;
            }
        };

        let brightest = ColorBand::ALL
            .iter()
            .copied()
            .fold(ColorBand::Top, |best, band| {
                if intensities[band.index()] > intensities[best.index()] {
                    band
                } else {
                    best
                }
            });
        log::debug!(
            "band intensities {:.1}/{:.1}/{:.1}, brightest {:?}",
            intensities[0],
            intensities[1],
            intensities[2],
            brightest
        );

        let top = intensities[ColorBand::Top.index()];
        if brightest == ColorBand::Top && top > self.intensity_threshold {
            LightState::Red
        } else {
            LightState::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    /// Single-column frame whose rows carry the given gray values.
    fn column(values: &[u8]) -> Frame {
        let data = values.iter().flat_map(|v| [*v, *v, *v]).collect();
        Frame::bgr(data, 1, values.len() as u32).unwrap()
    }

    /// `width x height` frame with each band filled with a uniform B-G-R pixel.
    fn banded(width: u32, height: u32, bands: [[u8; 3]; 3]) -> Frame {
        let rows = band_rows(height as usize).unwrap();
        let mut data = Vec::new();
        for y in 0..height as usize {
            let band = rows.iter().position(|r| r.contains(&y)).unwrap();
            for _ in 0..width {
                data.extend_from_slice(&bands[band]);
            }
        }
        Frame::bgr(data, width, height).unwrap()
    }

    #[test]
    fn band_sizes_absorb_remainder_into_bottom() {
        let sizes = |h| band_rows(h).unwrap().map(|r: Range<usize>| r.len());
        assert_eq!(sizes(9), [3, 3, 3]);
        assert_eq!(sizes(10), [3, 3, 4]);
        assert_eq!(sizes(11), [3, 3, 5]);
        assert_eq!(sizes(3), [1, 1, 1]);
        assert_eq!(band_rows(10).unwrap()[2], 6..10);
    }

    #[test]
    fn short_crops_have_no_bands() {
        assert!(band_rows(0).is_none());
        assert!(band_rows(2).is_none());

        let frame = column(&[255, 255]);
        let crop = frame.full_crop().unwrap();
        assert_eq!(ColorClassifier::default().classify(&crop), LightState::Unknown);
    }

    #[test]
    fn value_channel_is_max_of_components() {
        // Pure red in B-G-R order has value 200.
        let frame = banded(4, 9, [[0, 0, 200], [10, 0, 0], [0, 5, 0]]);
        let crop = frame.full_crop().unwrap();
        let intensities = ColorClassifier::default().band_intensities(&crop).unwrap();
        assert_eq!(intensities, [200.0, 10.0, 5.0]);
    }

    #[test]
    fn bright_top_band_is_red() {
        let frame = banded(5, 12, [[30, 30, 200], [0, 0, 0], [0, 0, 0]]);
        let crop = frame.full_crop().unwrap();
        assert_eq!(ColorClassifier::new(40.0).classify(&crop), LightState::Red);
    }

    #[test]
    fn brighter_lower_bands_are_never_red() {
        let classifier = ColorClassifier::new(40.0);

        let middle = banded(5, 9, [[0, 0, 200], [0, 230, 230], [0, 0, 0]]);
        assert_eq!(
            classifier.classify(&middle.full_crop().unwrap()),
            LightState::Unknown
        );

        let bottom = banded(5, 10, [[0, 0, 120], [0, 0, 0], [0, 121, 0]]);
        assert_eq!(
            classifier.classify(&bottom.full_crop().unwrap()),
            LightState::Unknown
        );
    }

    #[test]
    fn tie_with_top_band_still_counts_as_top() {
        let frame = banded(2, 9, [[0, 0, 90], [0, 90, 0], [0, 0, 0]]);
        let crop = frame.full_crop().unwrap();
        assert_eq!(ColorClassifier::new(40.0).classify(&crop), LightState::Red);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let classifier = ColorClassifier::new(40.0);

        let equal = column(&[40, 40, 40, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            classifier.classify(&equal.full_crop().unwrap()),
            LightState::Unknown
        );

        // Top mean 40.5
        let above = column(&[40, 41, 40, 41, 0, 0, 0, 0, 0, 0, 0, 0]);
        let crop = above.full_crop().unwrap();
        assert_eq!(classifier.band_intensities(&crop).unwrap()[0], 40.5);
        assert_eq!(classifier.classify(&crop), LightState::Red);
    }

    #[test]
    fn fractional_threshold_equal_to_mean_is_unknown() {
        // Top band: nine 40s and one 41 across a single row, mean 40.1
        let mut row = vec![40u8; 9];
        row.push(41);
        let mut data: Vec<u8> = row.iter().flat_map(|v| [*v, *v, *v]).collect();
        data.extend(std::iter::repeat(0u8).take(10 * 2 * 3));
        let frame = Frame::bgr(data, 10, 3).unwrap();
        let crop = frame.full_crop().unwrap();

        let classifier = ColorClassifier::new(40.1);
        assert_eq!(classifier.band_intensities(&crop).unwrap()[0], 40.1);
        assert_eq!(classifier.classify(&crop), LightState::Unknown);
        assert_eq!(ColorClassifier::new(40.0).classify(&crop), LightState::Red);
    }

    #[test]
    fn dim_top_band_is_unknown() {
        let frame = banded(3, 9, [[0, 0, 35], [0, 0, 2], [0, 0, 1]]);
        let crop = frame.full_crop().unwrap();
        assert_eq!(ColorClassifier::new(40.0).classify(&crop), LightState::Unknown);
    }
}

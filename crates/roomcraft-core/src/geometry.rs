//! Focus-crop geometry.

use serde::{Deserialize, Serialize};

/// Side of a focus crop as a fraction of the image's shorter dimension.
pub const FOCUS_CROP_FRACTION: f64 = 0.45;

/// A square pixel region inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl CropRegion {
    /// Square crop centered on a click given in percent of the image size.
    ///
    /// The side is `FOCUS_CROP_FRACTION` of the shorter dimension and the
    /// region is shifted so it stays fully inside the image.
    pub fn centered(width: u32, height: u32, x_percent: f64, y_percent: f64) -> Self {
        let shorter = width.min(height);
        let size = ((shorter as f64) * FOCUS_CROP_FRACTION).round() as u32;
        let size = size.clamp(1.min(shorter), shorter);

        let cx = (x_percent.clamp(0.0, 100.0) / 100.0) * width as f64;
        let cy = (y_percent.clamp(0.0, 100.0) / 100.0) * height as f64;

        let x = clamp_origin(cx - size as f64 / 2.0, width - size);
        let y = clamp_origin(cy - size as f64 / 2.0, height - size);

        Self { x, y, size }
    }

    pub fn center(&self) -> (u32, u32) {
        (self.x + self.size / 2, self.y + self.size / 2)
    }

    pub fn contains_within(&self, width: u32, height: u32) -> bool {
        self.x + self.size <= width && self.y + self.size <= height
    }
}

fn clamp_origin(origin: f64, max: u32) -> u32 {
    origin.round().clamp(0.0, max as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_click_on_landscape_image() {
        let region = CropRegion::centered(1000, 600, 50.0, 50.0);
        assert_eq!(region.size, 270);
        assert_eq!(region.center(), (500, 300));
        assert_eq!((region.x, region.y), (365, 165));
        assert!(region.contains_within(1000, 600));
    }

    #[test]
    fn test_corner_clicks_are_clamped() {
        let top_left = CropRegion::centered(1000, 600, 0.0, 0.0);
        assert_eq!((top_left.x, top_left.y), (0, 0));

        let bottom_right = CropRegion::centered(1000, 600, 100.0, 100.0);
        assert_eq!((bottom_right.x, bottom_right.y), (730, 330));
        assert!(bottom_right.contains_within(1000, 600));
    }

    #[test]
    fn test_out_of_range_percentages() {
        let region = CropRegion::centered(400, 800, 150.0, -20.0);
        assert_eq!(region.size, 180);
        assert_eq!((region.x, region.y), (220, 0));
    }

    #[test]
    fn test_tiny_image() {
        let region = CropRegion::centered(2, 2, 50.0, 50.0);
        assert_eq!(region.size, 1);
        assert!(region.contains_within(2, 2));
    }
}

//! Contour shape measurements shared by the detectors

use opencv::{
    core::{Point, Rect, Vector},
    imgproc::{arc_length, bounding_rect, contour_area},
};

use crate::{Result, VerificationError};

/// Area, closed perimeter and bounding box of one contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourGeometry {
    pub area: f64,
    pub perimeter: f64,
    pub bounds: Rect,
}

impl ContourGeometry {
    pub fn measure(contour: &Vector<Point>) -> Result<Self> {
        let area = contour_area(contour, false)
            .map_err(|e| VerificationError::opencv("area calculation", e))?;
        let perimeter = arc_length(contour, true)
            .map_err(|e| VerificationError::opencv("perimeter calculation", e))?;
        let bounds =
            bounding_rect(contour).map_err(|e| VerificationError::opencv("bounding rect", e))?;

        Ok(Self {
            area,
            perimeter,
            bounds,
        })
    }

    /// Bounding box height over width; 0.0 for a zero-width box
    pub fn aspect_ratio(&self) -> f64 {
        if self.bounds.width > 0 {
            self.bounds.height as f64 / self.bounds.width as f64
        } else {
            0.0
        }
    }

    /// Perimeter over area, `None` when the area is zero
    pub fn perimeter_area_ratio(&self) -> Option<f64> {
        (self.area > 0.0).then(|| self.perimeter / self.area)
    }

    /// 4π·area / perimeter² (1.0 for a circle), `None` when the perimeter is zero
    pub fn circularity(&self) -> Option<f64> {
        (self.perimeter > 0.0)
            .then(|| 4.0 * std::f64::consts::PI * self.area / (self.perimeter * self.perimeter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn polygon(points: &[(i32, i32)]) -> Vector<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_rectangle_measurements() {
        let contour = polygon(&[(0, 0), (0, 199), (14, 199), (14, 0)]);
        let geometry = ContourGeometry::measure(&contour).unwrap();

        assert_relative_eq!(geometry.area, 14.0 * 199.0);
        assert_relative_eq!(geometry.perimeter, 2.0 * (14.0 + 199.0));
        assert_eq!(geometry.bounds, Rect::new(0, 0, 15, 200));
        assert_relative_eq!(geometry.aspect_ratio(), 200.0 / 15.0);
    }

    #[test]
    fn test_square_circularity() {
        let contour = polygon(&[(0, 0), (0, 100), (100, 100), (100, 0)]);
        let geometry = ContourGeometry::measure(&contour).unwrap();

        // π/4 for any square
        assert_relative_eq!(
            geometry.circularity().unwrap(),
            std::f64::consts::FRAC_PI_4,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_degenerate_contours() {
        let point = polygon(&[(5, 5)]);
        let geometry = ContourGeometry::measure(&point).unwrap();
        assert_eq!(geometry.circularity(), None);
        assert_eq!(geometry.perimeter_area_ratio(), None);

        let line = polygon(&[(5, 5), (5, 40)]);
        let geometry = ContourGeometry::measure(&line).unwrap();
        assert_eq!(geometry.area, 0.0);
        assert_eq!(geometry.perimeter_area_ratio(), None);
        assert!(geometry.circularity().unwrap() < 1e-12);
    }

    #[test]
    fn test_zero_width_aspect_ratio() {
        let geometry = ContourGeometry {
            area: 0.0,
            perimeter: 0.0,
            bounds: Rect::new(0, 0, 0, 10),
        };
        assert_eq!(geometry.aspect_ratio(), 0.0);
    }
}

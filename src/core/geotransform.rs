use crate::types::{BoundingBox, GeoTransform, OrthoError, OrthoResult, PixelWindow};
use ndarray::Array1;

impl GeoTransform {
    /// Build from the six GDAL-ordered coefficients
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Parse the textual geotransform stored in granule global attributes.
    ///
    /// Accepts bracketed or bare lists separated by commas and/or whitespace,
    /// e.g. `"[-118.3, 0.00054, 0.0, 34.6, 0.0, -0.00054]"`.
    pub fn parse(text: &str) -> OrthoResult<Self> {
        let trimmed = text
            .trim()
            .trim_start_matches(&['[', '('][..])
            .trim_end_matches(&[']', ')'][..]);

        let coefficients = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f64>().map_err(|e| {
                    OrthoError::InvalidFormat(format!(
                        "Geotransform coefficient '{}' is not a number: {}",
                        token, e
                    ))
                })
            })
            .collect::<OrthoResult<Vec<f64>>>()?;

        let gt: [f64; 6] = coefficients.as_slice().try_into().map_err(|_| {
            OrthoError::InvalidFormat(format!(
                "Geotransform needs 6 coefficients, found {} in '{}'",
                coefficients.len(),
                text
            ))
        })?;

        Ok(Self::from_gdal(&gt))
    }

    /// Rotated grids cannot be described by separate lat/lon vectors
    pub fn ensure_north_up(&self) -> OrthoResult<()> {
        if self.rotation_x != 0.0 || self.rotation_y != 0.0 {
            return Err(OrthoError::Configuration(format!(
                "Rotated geotransform is not supported (row rotation {}, column rotation {})",
                self.rotation_x, self.rotation_y
            )));
        }
        Ok(())
    }

    /// Longitude of the center of column `x`
    pub fn lon_center(&self, x: usize) -> f64 {
        self.top_left_x + 0.5 * self.pixel_width + x as f64 * self.pixel_width
    }

    /// Latitude of the center of row `y`
    pub fn lat_center(&self, y: usize) -> f64 {
        self.top_left_y + 0.5 * self.pixel_height + y as f64 * self.pixel_height
    }

    /// Pixel-center coordinate vectors `(lat, lon)` for a `width` x `height` grid
    pub fn coord_vectors(&self, width: usize, height: usize) -> OrthoResult<(Array1<f64>, Array1<f64>)> {
        self.ensure_north_up()?;

        let lon = Array1::from_shape_fn(width, |x| self.lon_center(x));
        let lat = Array1::from_shape_fn(height, |y| self.lat_center(y));

        Ok((lat, lon))
    }

    /// Grid cell containing a geographic point, as `(x, y)`
    pub fn pixel_at(&self, lat: f64, lon: f64, width: usize, height: usize) -> Option<(usize, usize)> {
        if self.pixel_width == 0.0 || self.pixel_height == 0.0 || !lat.is_finite() || !lon.is_finite() {
            return None;
        }

        let fx = ((lon - self.top_left_x) / self.pixel_width).floor();
        let fy = ((lat - self.top_left_y) / self.pixel_height).floor();

        if fx < 0.0 || fy < 0.0 || fx >= width as f64 || fy >= height as f64 {
            return None;
        }

        Some((fx as usize, fy as usize))
    }

    /// Window of cells whose centers fall inside `bbox`
    pub fn window_for_bbox(&self, bbox: &BoundingBox, width: usize, height: usize) -> OrthoResult<PixelWindow> {
        if bbox.min_lon > bbox.max_lon || bbox.min_lat > bbox.max_lat {
            return Err(OrthoError::Usage(format!(
                "Bounding box is inverted: {:?}",
                bbox
            )));
        }

        let (lat, lon) = self.coord_vectors(width, height)?;

        let (x_start, x_end) = contiguous_range(&lon, bbox.min_lon, bbox.max_lon);
        let (y_start, y_end) = contiguous_range(&lat, bbox.min_lat, bbox.max_lat);

        let window = PixelWindow { x_start, x_end, y_start, y_end };
        if window.is_empty() {
            return Err(OrthoError::Usage(format!(
                "Bounding box {:?} does not overlap the {}x{} grid",
                bbox, width, height
            )));
        }

        log::debug!("Bounding box {:?} -> window x={}..{}, y={}..{}",
                    bbox, x_start, x_end, y_start, y_end);

        Ok(window)
    }

    /// Transform of a sub-grid starting at the window's top-left cell
    pub fn window_transform(&self, window: &PixelWindow) -> GeoTransform {
        GeoTransform {
            top_left_x: self.top_left_x + window.x_start as f64 * self.pixel_width,
            top_left_y: self.top_left_y + window.y_start as f64 * self.pixel_height,
            ..*self
        }
    }
}

/// Half-open index range of a monotonic vector's values inside `[lo, hi]`
fn contiguous_range(values: &Array1<f64>, lo: f64, hi: f64) -> (usize, usize) {
    let inside = |v: &f64| *v >= lo && *v <= hi;
    match values.iter().position(inside) {
        Some(start) => {
            let end = values.iter().rposition(inside).map_or(start, |i| i + 1);
            (start, end)
        }
        None => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn emit_like() -> GeoTransform {
        GeoTransform::from_gdal(&[-118.5, 0.0005, 0.0, 34.8, 0.0, -0.0005])
    }

    #[test]
    fn test_coord_vectors_use_pixel_centers() {
        let gt = emit_like();
        let (lat, lon) = gt.coord_vectors(4, 3).unwrap();

        assert_eq!(lon.len(), 4);
        assert_eq!(lat.len(), 3);
        for x in 0..4 {
            assert_eq!(lon[x], -118.5 + 0.5 * 0.0005 + x as f64 * 0.0005);
        }
        for y in 0..3 {
            assert_eq!(lat[y], 34.8 + 0.5 * -0.0005 + y as f64 * -0.0005);
        }
    }

    #[test]
    fn test_rotated_transform_rejected() {
        let gt = GeoTransform::from_gdal(&[0.0, 1.0, 0.01, 0.0, 0.0, -1.0]);
        assert!(matches!(gt.coord_vectors(2, 2), Err(OrthoError::Configuration(_))));

        let gt = GeoTransform::from_gdal(&[0.0, 1.0, 0.0, 0.0, -0.2, -1.0]);
        assert!(matches!(gt.ensure_north_up(), Err(OrthoError::Configuration(_))));
    }

    #[test]
    fn test_parse_geotransform_text() {
        let gt = GeoTransform::parse("[-118.5, 0.0005, 0.0, 34.8, 0.0, -0.0005]").unwrap();
        assert_eq!(gt, emit_like());

        let gt = GeoTransform::parse("-118.5 0.0005 0 34.8 0 -0.0005").unwrap();
        assert_eq!(gt, emit_like());

        assert!(matches!(GeoTransform::parse("[1, 2, 3]"), Err(OrthoError::InvalidFormat(_))));
        assert!(matches!(GeoTransform::parse("[1, 2, x, 4, 5, 6]"), Err(OrthoError::InvalidFormat(_))));
    }

    #[test]
    fn test_pixel_at_inverts_centers() {
        let gt = emit_like();
        let (lat, lon) = gt.coord_vectors(10, 8).unwrap();

        assert_eq!(gt.pixel_at(lat[5], lon[7], 10, 8), Some((7, 5)));
        assert_eq!(gt.pixel_at(lat[0], lon[0], 10, 8), Some((0, 0)));
        assert_eq!(gt.pixel_at(35.0, lon[0], 10, 8), None);
        assert_eq!(gt.pixel_at(lat[0], -120.0, 10, 8), None);
    }

    #[test]
    fn test_window_for_bbox() {
        let gt = emit_like();
        let (lat, lon) = gt.coord_vectors(10, 10).unwrap();

        let bbox = BoundingBox {
            min_lon: lon[2],
            max_lon: lon[5],
            min_lat: lat[6],
            max_lat: lat[3],
        };
        let window = gt.window_for_bbox(&bbox, 10, 10).unwrap();
        assert_eq!(window, PixelWindow { x_start: 2, x_end: 6, y_start: 3, y_end: 7 });

        let shifted = gt.window_transform(&window);
        assert_relative_eq!(shifted.lon_center(0), lon[2], epsilon = 1e-12);
        assert_relative_eq!(shifted.lat_center(0), lat[3], epsilon = 1e-12);
    }

    #[test]
    fn test_window_outside_grid() {
        let gt = emit_like();
        let bbox = BoundingBox { min_lon: 10.0, max_lon: 11.0, min_lat: 10.0, max_lat: 11.0 };
        assert!(matches!(gt.window_for_bbox(&bbox, 10, 10), Err(OrthoError::Usage(_))));
    }
}

use crate::types::{BoundingBox, OrthoCube, OrthoError, OrthoResult};
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis, Zip};

impl OrthoCube {
    /// Grid dimensions `(height, width, bands)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// `true` for cells that received a source pixel
    pub fn valid_mask(&self) -> Array2<bool> {
        self.valid.clone()
    }

    /// Replace fill cells with NaN, the convention used for display and export
    pub fn fill_to_nan(&mut self) {
        if self.fill_value.is_nan() {
            return;
        }
        Zip::from(self.data.lanes_mut(Axis(2)))
            .and(&self.valid)
            .for_each(|mut spectrum, &valid| {
                if !valid {
                    spectrum.fill(f32::NAN);
                }
            });
        self.fill_value = f32::NAN;
    }

    /// Crop to the cells whose centers fall inside `bbox`
    pub fn spatial_subset(&self, bbox: &BoundingBox) -> OrthoResult<OrthoCube> {
        let (height, width, _) = self.dim();
        let window = self.geo_transform.window_for_bbox(bbox, width, height)?;

        log::debug!("Spatial subset {:?}: {}x{} of {}x{} cells",
                    bbox, window.width(), window.height(), width, height);

        Ok(OrthoCube {
            data: self
                .data
                .slice(s![window.y_start..window.y_end, window.x_start..window.x_end, ..])
                .to_owned(),
            valid: self
                .valid
                .slice(s![window.y_start..window.y_end, window.x_start..window.x_end])
                .to_owned(),
            lat: self.lat.slice(s![window.y_start..window.y_end]).to_owned(),
            lon: self.lon.slice(s![window.x_start..window.x_end]).to_owned(),
            geo_transform: self.geo_transform.window_transform(&window),
            fill_value: self.fill_value,
            bands: self.bands.clone(),
        })
    }

    /// Spectrum of the cell containing `(lat, lon)`; `None` outside the grid or on fill
    pub fn spectrum_at(&self, lat: f64, lon: f64) -> Option<ArrayView1<f32>> {
        let (height, width, _) = self.dim();
        let (x, y) = self.geo_transform.pixel_at(lat, lon, width, height)?;
        if !self.valid[[y, x]] {
            return None;
        }
        Some(self.data.slice(s![y, x, ..]))
    }

    /// Image of the band closest to `wavelength` (nm)
    pub fn band_nearest(&self, wavelength: f32) -> OrthoResult<ArrayView2<f32>> {
        let bands = self.bands.as_ref().ok_or_else(|| {
            OrthoError::Usage("Cube carries no band metadata for wavelength lookup".to_string())
        })?;
        let index = bands.nearest_band(wavelength).ok_or_else(|| {
            OrthoError::Usage(format!("No band near {} nm", wavelength))
        })?;
        Ok(self.data.index_axis(Axis(2), index))
    }
}

use crate::types::{OrthoError, OrthoResult, SpectralBands};
use ndarray::{ArrayView3, Axis};

impl SpectralBands {
    pub fn new(wavelengths: Vec<f32>, fwhm: Vec<f32>, good_wavelengths: Vec<bool>) -> OrthoResult<Self> {
        if fwhm.len() != wavelengths.len() || good_wavelengths.len() != wavelengths.len() {
            return Err(OrthoError::Configuration(format!(
                "Band metadata lengths differ: {} wavelengths, {} fwhm, {} good_wavelengths",
                wavelengths.len(),
                fwhm.len(),
                good_wavelengths.len()
            )));
        }
        Ok(Self { wavelengths, fwhm, good_wavelengths })
    }

    /// Metadata whose `good_wavelengths` is taken from the 0/1 flags in the file
    pub fn from_flags(wavelengths: Vec<f32>, fwhm: Vec<f32>, good_flags: &[f32]) -> OrthoResult<Self> {
        let good = good_flags.iter().map(|&f| f != 0.0).collect();
        Self::new(wavelengths, fwhm, good)
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// The cube's band axis must line up with this metadata
    pub fn ensure_matches(&self, band_count: usize) -> OrthoResult<()> {
        if band_count != self.len() {
            return Err(OrthoError::Configuration(format!(
                "Cube has {} bands but band metadata describes {}",
                band_count,
                self.len()
            )));
        }
        Ok(())
    }

    pub fn good_indices(&self) -> Vec<usize> {
        self.good_wavelengths
            .iter()
            .enumerate()
            .filter_map(|(i, &good)| good.then_some(i))
            .collect()
    }

    /// Bands whose centers fall in `[min_nm, max_nm]`
    pub fn indices_in_range(&self, min_nm: f32, max_nm: f32) -> Vec<usize> {
        self.wavelengths
            .iter()
            .enumerate()
            .filter_map(|(i, &wl)| (wl >= min_nm && wl <= max_nm).then_some(i))
            .collect()
    }

    /// Band whose center is closest to `wavelength`
    pub fn nearest_band(&self, wavelength: f32) -> Option<usize> {
        self.wavelengths
            .iter()
            .enumerate()
            .filter(|(_, wl)| wl.is_finite())
            .min_by(|(_, a), (_, b)| {
                (*a - wavelength)
                    .abs()
                    .partial_cmp(&(*b - wavelength).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }

    /// Metadata for a subset of bands, in the given order
    pub fn select(&self, indices: &[usize]) -> OrthoResult<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(OrthoError::Configuration(format!(
                "Band index {} out of range for {} bands",
                bad,
                self.len()
            )));
        }

        Ok(Self {
            wavelengths: indices.iter().map(|&i| self.wavelengths[i]).collect(),
            fwhm: indices.iter().map(|&i| self.fwhm[i]).collect(),
            good_wavelengths: indices.iter().map(|&i| self.good_wavelengths[i]).collect(),
        })
    }
}

/// Infer `good_wavelengths` from a cube: a band is bad when every finite
/// sample equals the bad-wavelength `sentinel`.
pub fn good_wavelengths_from_sentinel(cube: ArrayView3<f32>, sentinel: f32) -> Vec<bool> {
    cube.axis_iter(Axis(2))
        .map(|band| {
            let mut finite = band.iter().filter(|v| v.is_finite()).peekable();
            if finite.peek().is_none() {
                return true;
            }
            !finite.all(|&v| v == sentinel)
        })
        .collect()
}

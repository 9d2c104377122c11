use crate::core::glt::{Glt, GltRemapper};
use crate::types::{
    EmitCube, EmitReal, GeoTransform, OrthoError, OrthoResult, SpectralBands, DEFAULT_FILL_VALUE,
};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis, Zip};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Masked remap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrthoConfig {
    /// Place the result on the GLT grid; `false` keeps sensor geometry
    pub ortho: bool,
    /// Value for ortho cells without a source pixel
    pub fill_value: EmitReal,
    /// Blank bands flagged bad in `good_wavelengths`
    pub mask_bad_wavelengths: bool,
    /// Process only these band indices (bounds peak memory)
    pub band_subset: Option<Vec<usize>>,
}

impl Default for OrthoConfig {
    fn default() -> Self {
        Self {
            ortho: true,
            fill_value: DEFAULT_FILL_VALUE,
            mask_bad_wavelengths: true,
            band_subset: None,
        }
    }
}

/// Everything one granule contributes to a masked remap
#[derive(Debug, Clone)]
pub struct OrthoRequest<'a> {
    pub data: ArrayView3<'a, EmitReal>,
    pub glt: &'a Glt,
    pub geo_transform: &'a GeoTransform,
    pub bands: &'a SpectralBands,
    /// Pixels to exclude [downtrack, crosstrack]
    pub quality_mask: Option<ArrayView2<'a, bool>>,
    /// Interpolated samples to exclude [downtrack, crosstrack, band]
    pub band_mask: Option<ArrayView3<'a, bool>>,
}

impl<'a> OrthoRequest<'a> {
    pub fn new(
        data: ArrayView3<'a, EmitReal>,
        glt: &'a Glt,
        geo_transform: &'a GeoTransform,
        bands: &'a SpectralBands,
    ) -> Self {
        Self { data, glt, geo_transform, bands, quality_mask: None, band_mask: None }
    }

    pub fn with_quality_mask(mut self, mask: ArrayView2<'a, bool>) -> Self {
        self.quality_mask = Some(mask);
        self
    }

    pub fn with_band_mask(mut self, mask: ArrayView3<'a, bool>) -> Self {
        self.band_mask = Some(mask);
        self
    }
}

/// Masked remap orchestrator.
///
/// Masks are applied on the raw grid before remapping, so the gather only
/// moves samples that survive the screens.
#[derive(Debug, Clone, Default)]
pub struct OrthoProcessor {
    config: OrthoConfig,
}

impl OrthoProcessor {
    pub fn new(config: OrthoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrthoConfig {
        &self.config
    }

    pub fn process(&self, request: &OrthoRequest) -> OrthoResult<EmitCube> {
        let (downtrack, crosstrack, band_count) = request.data.dim();
        log::info!("🛰️  Masked remap of {}x{}x{} cube (ortho={})",
                   downtrack, crosstrack, band_count, self.config.ortho);

        request.bands.ensure_matches(band_count)?;
        self.validate_masks(request)?;

        // GLT bounds are checked before any masking work
        let remapper = if self.config.ortho {
            let remapper = GltRemapper::new(request.glt.clone(), *request.geo_transform)?;
            remapper.glt().validate_bounds(downtrack, crosstrack)?;
            Some(remapper)
        } else {
            None
        };

        let (mut data, bands, band_mask) = match &self.config.band_subset {
            Some(indices) => {
                let bands = request.bands.select(indices)?;
                log::debug!("Band subset: {} of {} bands", indices.len(), band_count);
                (
                    request.data.select(Axis(2), indices),
                    bands,
                    request.band_mask.map(|m| m.select(Axis(2), indices)),
                )
            }
            None => (
                request.data.to_owned(),
                request.bands.clone(),
                request.band_mask.map(|m| m.to_owned()),
            ),
        };

        if self.config.mask_bad_wavelengths {
            blank_bands(&mut data, &bands.good_wavelengths);
        }
        if let Some(mask) = &request.quality_mask {
            blank_pixels(&mut data, mask.view());
        }
        if let Some(mask) = &band_mask {
            blank_samples(&mut data, mask.view());
        }

        match remapper {
            Some(remapper) => {
                let mut ortho = remapper.remap_validated(data.view(), self.config.fill_value)?;
                ortho.bands = Some(bands);
                log::info!("✅ Orthorectified to {:?}", ortho.data.dim());
                Ok(EmitCube::Ortho(ortho))
            }
            None => {
                log::info!("✅ Masked cube kept in sensor geometry");
                Ok(EmitCube::Sensor { data, bands })
            }
        }
    }

    fn validate_masks(&self, request: &OrthoRequest) -> OrthoResult<()> {
        let (downtrack, crosstrack, band_count) = request.data.dim();

        if let Some(mask) = &request.quality_mask {
            if mask.dim() != (downtrack, crosstrack) {
                return Err(OrthoError::Usage(format!(
                    "Quality mask shape {:?} does not match cube pixels {:?}",
                    mask.dim(),
                    (downtrack, crosstrack)
                )));
            }
        }

        if let Some(mask) = &request.band_mask {
            if mask.dim() != (downtrack, crosstrack, band_count) {
                return Err(OrthoError::Usage(format!(
                    "Band mask shape {:?} does not match cube shape {:?}",
                    mask.dim(),
                    (downtrack, crosstrack, band_count)
                )));
            }
        }

        Ok(())
    }
}

/// Convenience wrapper: full masked remap with default configuration
pub fn emit_ortho(request: &OrthoRequest) -> OrthoResult<EmitCube> {
    OrthoProcessor::default().process(request)
}

/// Set every sample of a band to NaN where `keep[band]` is false
pub fn blank_bands<T: Float>(cube: &mut Array3<T>, keep: &[bool]) {
    for (mut band, &good) in cube.axis_iter_mut(Axis(2)).zip(keep) {
        if !good {
            band.fill(T::nan());
        }
    }
}

/// Set all bands of flagged pixels to NaN
pub fn blank_pixels<T: Float>(cube: &mut Array3<T>, mask: ArrayView2<bool>) {
    Zip::from(cube.lanes_mut(Axis(2)))
        .and(mask)
        .for_each(|mut spectrum, &excluded| {
            if excluded {
                spectrum.fill(T::nan());
            }
        });
}

/// Set individually flagged samples to NaN
pub fn blank_samples<T: Float>(cube: &mut Array3<T>, mask: ArrayView3<bool>) {
    Zip::from(cube).and(mask).for_each(|value, &excluded| {
        if excluded {
            *value = T::nan();
        }
    });
}

//! emit-ortho: GLT orthorectification and quality masking for EMIT granules
//!
//! This library implements the array transforms behind the EMIT tutorials:
//! placing sensor-geometry reflectance cubes onto a geographic grid with the
//! granule's Geometry Lookup Table, and decoding the L2A quality and
//! band-interpolation masks that screen the data before it is remapped.
//! File access, plotting and export stay with the caller.

pub mod types;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, EmitCube, GeoTransform, OrthoCube, OrthoError, OrthoResult, PixelWindow,
    RawCube, SpectralBands, BAD_WAVELENGTH_VALUE, DEFAULT_FILL_VALUE, GLT_NODATA_VALUE,
};

pub use crate::core::{
    apply_glt, build_quality_mask, emit_ortho, unpack_band_mask, Glt, GltRemapper, OrthoConfig,
    OrthoProcessor, OrthoRequest, QualityFlag, QualityLayers,
};

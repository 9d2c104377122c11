//! Core orthorectification and masking modules

pub mod geotransform;
pub mod glt;
pub mod band_mask;
pub mod quality_mask;
pub mod spectral;
pub mod ortho;
pub mod product;

// Re-export main types
pub use glt::{Glt, GltRemapper, GltCoverage, apply_glt};
pub use band_mask::{unpack_band_mask, unpack_emit_band_mask, pack_band_mask, packed_len, EMIT_BAND_COUNT};
pub use quality_mask::{QualityFlag, QualityLayers, build_quality_mask, DEFAULT_QUALITY_FLAGS};
pub use spectral::good_wavelengths_from_sentinel;
pub use ortho::{OrthoProcessor, OrthoConfig, OrthoRequest, emit_ortho, blank_bands, blank_pixels, blank_samples};

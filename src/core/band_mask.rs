//! Band-interpolation mask decoding.
//!
//! The L2A mask product stores one bit per spectral band per pixel, packed
//! most-significant-bit first into `BAND_MASK_PACKED_LEN` bytes. A set bit
//! means the band was interpolated over a sensor defect or saturation.

use crate::types::{
    BandMaskCube, OrthoError, OrthoResult, BAND_MASK_BITS_PER_ELEMENT, BAND_MASK_PACKED_LEN,
};
use ndarray::{Array3, ArrayView3, Axis};

/// Spectral bands in an EMIT L1B/L2A cube
pub const EMIT_BAND_COUNT: usize = 285;

/// Packed elements needed to hold one bit per band
pub fn packed_len(band_count: usize) -> usize {
    (band_count + BAND_MASK_BITS_PER_ELEMENT - 1) / BAND_MASK_BITS_PER_ELEMENT
}

/// Unpack a [downtrack, crosstrack, packed] bitfield into [downtrack, crosstrack, band]
pub fn unpack_band_mask(packed: ArrayView3<u8>, band_count: usize) -> OrthoResult<BandMaskCube> {
    let (downtrack, crosstrack, elements) = packed.dim();
    let expected = packed_len(band_count);

    if elements != expected {
        return Err(OrthoError::DataCorruption(format!(
            "Packed band mask has {} elements per pixel, {} bands need {}",
            elements, band_count, expected
        )));
    }

    let unpacked = Array3::from_shape_fn((downtrack, crosstrack, band_count), |(i, j, band)| {
        let byte = packed[[i, j, band / BAND_MASK_BITS_PER_ELEMENT]];
        let shift = BAND_MASK_BITS_PER_ELEMENT - 1 - band % BAND_MASK_BITS_PER_ELEMENT;
        ((byte >> shift) & 1) == 1
    });

    let flagged = unpacked.iter().filter(|&&b| b).count();
    log::debug!("Unpacked band mask {}x{}x{}: {} interpolated samples",
                downtrack, crosstrack, band_count, flagged);

    Ok(unpacked)
}

/// Unpack the standard 36-byte EMIT layer into 285 band flags
pub fn unpack_emit_band_mask(packed: ArrayView3<u8>) -> OrthoResult<BandMaskCube> {
    if packed.len_of(Axis(2)) != BAND_MASK_PACKED_LEN {
        return Err(OrthoError::DataCorruption(format!(
            "EMIT band mask must have {} packed elements per pixel, found {}",
            BAND_MASK_PACKED_LEN,
            packed.len_of(Axis(2))
        )));
    }
    unpack_band_mask(packed, EMIT_BAND_COUNT)
}

/// Inverse of [`unpack_band_mask`]; trailing padding bits are zero
pub fn pack_band_mask(mask: ArrayView3<bool>) -> Array3<u8> {
    let (downtrack, crosstrack, bands) = mask.dim();
    let mut packed = Array3::<u8>::zeros((downtrack, crosstrack, packed_len(bands)));

    for ((i, j, band), &flag) in mask.indexed_iter() {
        if flag {
            let shift = BAND_MASK_BITS_PER_ELEMENT - 1 - band % BAND_MASK_BITS_PER_ELEMENT;
            packed[[i, j, band / BAND_MASK_BITS_PER_ELEMENT]] |= 1 << shift;
        }
    }

    packed
}

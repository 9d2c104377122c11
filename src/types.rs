use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Reflectance or radiance sample
pub type EmitReal = f32;

/// Sensor-geometry cube (downtrack x crosstrack x band)
pub type RawCube = Array3<EmitReal>;

/// Geographic-grid cube (latitude x longitude x band)
pub type OrthoData = Array3<EmitReal>;

/// Per-pixel boolean screen (downtrack x crosstrack), `true` = exclude
pub type PixelMask = Array2<bool>;

/// Per-pixel, per-band boolean screen (downtrack x crosstrack x band)
pub type BandMaskCube = Array3<bool>;

/// GLT cell value marking "no source pixel"
pub const GLT_NODATA_VALUE: i32 = 0;

/// Fill written to ortho cells that have no source pixel
pub const DEFAULT_FILL_VALUE: EmitReal = -9999.0;

/// Reflectance written by the L2A processor into atmospherically opaque bands
pub const BAD_WAVELENGTH_VALUE: EmitReal = -0.01;

/// Packed bytes per pixel in the L2A `band_mask` layer
pub const BAND_MASK_PACKED_LEN: usize = 36;

/// Bits carried by each packed band-mask element
pub const BAND_MASK_BITS_PER_ELEMENT: usize = 8;

/// Affine pixel-to-geographic transform, GDAL coefficient order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Rectangular pixel window on a grid (half-open ranges)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl PixelWindow {
    pub fn width(&self) -> usize {
        self.x_end - self.x_start
    }

    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Spectral metadata from the `sensor_band_parameters` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralBands {
    /// Band center wavelengths (nm)
    pub wavelengths: Vec<f32>,
    /// Full width at half maximum per band (nm)
    pub fwhm: Vec<f32>,
    /// `false` for bands inside atmospheric absorption windows
    pub good_wavelengths: Vec<bool>,
}

/// Orthorectified cube with its coordinate vectors
#[derive(Debug, Clone)]
pub struct OrthoCube {
    /// Gridded data (lat x lon x band)
    pub data: OrthoData,
    /// `true` for cells the GLT filled from a raw pixel
    pub valid: Array2<bool>,
    /// Pixel-center latitudes, one per grid row
    pub lat: Array1<f64>,
    /// Pixel-center longitudes, one per grid column
    pub lon: Array1<f64>,
    /// Transform of the grid's top-left corner
    pub geo_transform: GeoTransform,
    /// Value held by cells without a source pixel
    pub fill_value: EmitReal,
    /// Metadata for the carried bands, when known
    pub bands: Option<SpectralBands>,
}

/// Output of the masked remap orchestrator
#[derive(Debug, Clone)]
pub enum EmitCube {
    /// Masked cube left in sensor geometry
    Sensor {
        data: RawCube,
        bands: SpectralBands,
    },
    /// Masked cube placed on the GLT grid
    Ortho(OrthoCube),
}

/// Error types for EMIT orthorectification
#[derive(Debug, thiserror::Error)]
pub enum OrthoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data corruption: {0}")]
    DataCorruption(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Result type for orthorectification operations
pub type OrthoResult<T> = Result<T, OrthoError>;

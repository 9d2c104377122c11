//! Python bindings for notebook callers

use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::exceptions::PyValueError;
use numpy::{PyReadonlyArray2, PyReadonlyArray3, ToPyArray};

use crate::core::{
    apply_glt, build_quality_mask, unpack_band_mask, unpack_emit_band_mask, Glt, OrthoConfig,
    OrthoProcessor, OrthoRequest,
};
use crate::types::{EmitCube, GeoTransform, OrthoCube, OrthoError, SpectralBands, DEFAULT_FILL_VALUE};

fn to_py_err(e: OrthoError) -> PyErr {
    PyValueError::new_err(format!("{}", e))
}

fn geotransform_from(coefficients: &[f64]) -> PyResult<GeoTransform> {
    let gt: [f64; 6] = coefficients.try_into().map_err(|_| {
        PyValueError::new_err(format!(
            "geotransform needs 6 coefficients, got {}",
            coefficients.len()
        ))
    })?;
    Ok(GeoTransform::from_gdal(&gt))
}

fn ortho_to_dict(py: Python, ortho: &OrthoCube) -> PyResult<PyObject> {
    let result = PyDict::new(py);
    result.set_item("data", ortho.data.to_pyarray(py))?;
    result.set_item("valid", ortho.valid.to_pyarray(py))?;
    result.set_item("latitude", ortho.lat.to_pyarray(py))?;
    result.set_item("longitude", ortho.lon.to_pyarray(py))?;
    result.set_item("geotransform", ortho.geo_transform.to_gdal().to_vec())?;
    result.set_item("fill_value", ortho.fill_value)?;
    if let Some(bands) = &ortho.bands {
        result.set_item("wavelengths", bands.wavelengths.clone())?;
        result.set_item("fwhm", bands.fwhm.clone())?;
        result.set_item("good_wavelengths", bands.good_wavelengths.clone())?;
    }
    Ok(result.into())
}

/// Orthorectify a [downtrack, crosstrack, band] cube with a GLT
#[pyfunction]
#[pyo3(name = "apply_glt", signature = (data, glt_x, glt_y, geotransform, fill_value = None))]
fn py_apply_glt(
    py: Python,
    data: PyReadonlyArray3<f32>,
    glt_x: PyReadonlyArray2<i32>,
    glt_y: PyReadonlyArray2<i32>,
    geotransform: Vec<f64>,
    fill_value: Option<f32>,
) -> PyResult<PyObject> {
    let glt = Glt::new(glt_x.as_array().to_owned(), glt_y.as_array().to_owned()).map_err(to_py_err)?;
    let gt = geotransform_from(&geotransform)?;

    let ortho = apply_glt(data.as_array(), &glt, &gt, fill_value).map_err(to_py_err)?;
    ortho_to_dict(py, &ortho)
}

/// Combine selected quality-flag layers into a boolean exclusion mask
#[pyfunction]
#[pyo3(name = "quality_mask")]
fn py_quality_mask(
    py: Python,
    mask_layers: PyReadonlyArray3<f32>,
    quality_bands: Vec<usize>,
) -> PyResult<PyObject> {
    let mask = build_quality_mask(mask_layers.as_array(), &quality_bands).map_err(to_py_err)?;
    Ok(mask.to_pyarray(py).into())
}

/// Unpack the packed band-interpolation mask
#[pyfunction]
#[pyo3(name = "band_mask", signature = (packed, band_count = None))]
fn py_band_mask(
    py: Python,
    packed: PyReadonlyArray3<u8>,
    band_count: Option<usize>,
) -> PyResult<PyObject> {
    let mask = match band_count {
        Some(count) => unpack_band_mask(packed.as_array(), count),
        None => unpack_emit_band_mask(packed.as_array()),
    }
    .map_err(to_py_err)?;
    Ok(mask.to_pyarray(py).into())
}

/// Masked remap: screen bad wavelengths and flagged pixels, then orthorectify
#[pyfunction]
#[pyo3(
    name = "emit_ortho",
    signature = (
        data, glt_x, glt_y, geotransform, wavelengths, fwhm, good_wavelengths,
        quality_mask = None, band_mask = None, ortho = true, fill_value = None, band_subset = None
    )
)]
#[allow(clippy::too_many_arguments)]
fn py_emit_ortho(
    py: Python,
    data: PyReadonlyArray3<f32>,
    glt_x: PyReadonlyArray2<i32>,
    glt_y: PyReadonlyArray2<i32>,
    geotransform: Vec<f64>,
    wavelengths: Vec<f32>,
    fwhm: Vec<f32>,
    good_wavelengths: Vec<f32>,
    quality_mask: Option<PyReadonlyArray2<bool>>,
    band_mask: Option<PyReadonlyArray3<bool>>,
    ortho: bool,
    fill_value: Option<f32>,
    band_subset: Option<Vec<usize>>,
) -> PyResult<PyObject> {
    let glt = Glt::new(glt_x.as_array().to_owned(), glt_y.as_array().to_owned()).map_err(to_py_err)?;
    let gt = geotransform_from(&geotransform)?;
    let bands = SpectralBands::from_flags(wavelengths, fwhm, &good_wavelengths).map_err(to_py_err)?;

    let mut request = OrthoRequest::new(data.as_array(), &glt, &gt, &bands);
    if let Some(mask) = &quality_mask {
        request = request.with_quality_mask(mask.as_array());
    }
    if let Some(mask) = &band_mask {
        request = request.with_band_mask(mask.as_array());
    }

    let processor = OrthoProcessor::new(OrthoConfig {
        ortho,
        fill_value: fill_value.unwrap_or(DEFAULT_FILL_VALUE),
        band_subset,
        ..Default::default()
    });

    match processor.process(&request).map_err(to_py_err)? {
        EmitCube::Ortho(cube) => ortho_to_dict(py, &cube),
        EmitCube::Sensor { data, bands } => {
            let result = PyDict::new(py);
            result.set_item("data", data.to_pyarray(py))?;
            result.set_item("wavelengths", bands.wavelengths)?;
            result.set_item("fwhm", bands.fwhm)?;
            result.set_item("good_wavelengths", bands.good_wavelengths)?;
            Ok(result.into())
        }
    }
}

/// Pixel-center latitude/longitude vectors for a north-up grid
#[pyfunction]
#[pyo3(name = "coord_vectors")]
fn py_coord_vectors(
    py: Python,
    geotransform: Vec<f64>,
    width: usize,
    height: usize,
) -> PyResult<PyObject> {
    let gt = geotransform_from(&geotransform)?;
    let (lat, lon) = gt.coord_vectors(width, height).map_err(to_py_err)?;

    let result = PyDict::new(py);
    result.set_item("latitude", lat.to_pyarray(py))?;
    result.set_item("longitude", lon.to_pyarray(py))?;
    Ok(result.into())
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_apply_glt, m)?)?;
    m.add_function(wrap_pyfunction!(py_quality_mask, m)?)?;
    m.add_function(wrap_pyfunction!(py_band_mask, m)?)?;
    m.add_function(wrap_pyfunction!(py_emit_ortho, m)?)?;
    m.add_function(wrap_pyfunction!(py_coord_vectors, m)?)?;
    Ok(())
}

use crate::types::{
    BoundingBox, EmitReal, GeoTransform, OrthoCube, OrthoError, OrthoResult, PixelWindow, RawCube,
    DEFAULT_FILL_VALUE, GLT_NODATA_VALUE,
};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};

/// Geometry Lookup Table: per ortho cell, 1-based (crosstrack, downtrack)
/// indices into the raw grid, `GLT_NODATA_VALUE` where no pixel maps.
#[derive(Debug, Clone, PartialEq)]
pub struct Glt {
    x: Array2<i32>,
    y: Array2<i32>,
}

/// How many GLT cells point at a raw pixel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GltCoverage {
    pub total_cells: usize,
    pub valid_cells: usize,
    pub valid_percentage: f64,
}

impl Glt {
    /// Pair integer `glt_x` / `glt_y` grids
    pub fn new(x: Array2<i32>, y: Array2<i32>) -> OrthoResult<Self> {
        if x.dim() != y.dim() {
            return Err(OrthoError::Configuration(format!(
                "GLT x/y shape mismatch: glt_x is {:?}, glt_y is {:?}",
                x.dim(),
                y.dim()
            )));
        }
        Ok(Self { x, y })
    }

    /// Pair floating-point GLT grids, turning NaN/inf fill into no-data.
    ///
    /// Finite entries must be whole numbers inside the `i32` range.
    pub fn from_float(x: ArrayView2<f64>, y: ArrayView2<f64>) -> OrthoResult<Self> {
        Self::new(float_indices(x, "glt_x")?, float_indices(y, "glt_y")?)
    }

    /// Ortho grid dimensions `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn x(&self) -> &Array2<i32> {
        &self.x
    }

    pub fn y(&self) -> &Array2<i32> {
        &self.y
    }

    /// Both indices are needed for a cell to be filled
    pub fn valid_mask(&self) -> Array2<bool> {
        Zip::from(&self.x)
            .and(&self.y)
            .map_collect(|&gx, &gy| gx != GLT_NODATA_VALUE && gy != GLT_NODATA_VALUE)
    }

    pub fn coverage(&self) -> GltCoverage {
        let total_cells = self.x.len();
        let valid_cells = self.valid_mask().iter().filter(|&&v| v).count();
        let valid_percentage = if total_cells > 0 {
            valid_cells as f64 / total_cells as f64 * 100.0
        } else {
            0.0
        };

        GltCoverage { total_cells, valid_cells, valid_percentage }
    }

    /// Sub-table for a pixel window of the ortho grid
    pub fn crop(&self, window: &PixelWindow) -> OrthoResult<Self> {
        let (height, width) = self.dim();
        if window.is_empty() || window.x_end > width || window.y_end > height {
            return Err(OrthoError::Usage(format!(
                "Window {:?} is not inside the {}x{} GLT grid",
                window, width, height
            )));
        }

        let rows = window.y_start..window.y_end;
        let cols = window.x_start..window.x_end;
        Ok(Self {
            x: self.x.slice(s![rows.clone(), cols.clone()]).to_owned(),
            y: self.y.slice(s![rows, cols]).to_owned(),
        })
    }

    /// Check every non-sentinel index against the raw grid before gathering
    pub fn validate_bounds(&self, downtrack: usize, crosstrack: usize) -> OrthoResult<()> {
        for (((row, col), &gx), &gy) in self.x.indexed_iter().zip(self.y.iter()) {
            if gx == GLT_NODATA_VALUE || gy == GLT_NODATA_VALUE {
                continue;
            }
            let in_range = gx >= 1 && gy >= 1
                && (gx as usize) <= crosstrack
                && (gy as usize) <= downtrack;
            if !in_range {
                return Err(OrthoError::DataCorruption(format!(
                    "GLT cell ({}, {}) points at raw pixel (downtrack {}, crosstrack {}) \
                     outside the {}x{} raw grid",
                    row, col, gy as i64 - 1, gx as i64 - 1, downtrack, crosstrack
                )));
            }
        }
        Ok(())
    }
}

fn float_indices(grid: ArrayView2<f64>, name: &str) -> OrthoResult<Array2<i32>> {
    let mut indices = Array2::from_elem(grid.dim(), GLT_NODATA_VALUE);
    for ((row, col), &v) in grid.indexed_iter() {
        if !v.is_finite() {
            continue;
        }
        if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
            return Err(OrthoError::DataCorruption(format!(
                "{} cell ({}, {}) holds {}, not an integer pixel index",
                name, row, col, v
            )));
        }
        indices[[row, col]] = v as i32;
    }
    Ok(indices)
}

/// GLT remapper: nearest-source gather from sensor geometry onto the ortho grid
#[derive(Debug, Clone)]
pub struct GltRemapper {
    glt: Glt,
    geo_transform: GeoTransform,
}

impl GltRemapper {
    pub fn new(glt: Glt, geo_transform: GeoTransform) -> OrthoResult<Self> {
        geo_transform.ensure_north_up()?;
        Ok(Self { glt, geo_transform })
    }

    /// Restrict the remap to the cells whose centers fall inside `bbox`
    pub fn cropped(&self, bbox: &BoundingBox) -> OrthoResult<Self> {
        let (height, width) = self.glt.dim();
        let window = self.geo_transform.window_for_bbox(bbox, width, height)?;

        log::info!("Cropping GLT {}x{} to {}x{} window",
                   width, height, window.width(), window.height());

        Ok(Self {
            glt: self.glt.crop(&window)?,
            geo_transform: self.geo_transform.window_transform(&window),
        })
    }

    pub fn glt(&self) -> &Glt {
        &self.glt
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    /// Gather `raw[glt_y-1, glt_x-1, :]` into each valid cell; other cells keep `fill`
    pub fn remap_array<T>(&self, raw: ArrayView3<T>, fill: T) -> OrthoResult<Array3<T>>
    where
        T: Copy + Send + Sync,
    {
        let (downtrack, crosstrack, _) = raw.dim();
        self.glt.validate_bounds(downtrack, crosstrack)?;
        Ok(self.gather(raw, fill))
    }

    /// Gather without the bounds scan; callers must have run `Glt::validate_bounds`
    fn gather<T>(&self, raw: ArrayView3<T>, fill: T) -> Array3<T>
    where
        T: Copy + Send + Sync,
    {
        let (downtrack, crosstrack, bands) = raw.dim();
        let (height, width) = self.glt.dim();
        log::debug!("GLT remap: raw {}x{}x{} -> ortho {}x{}x{}",
                    downtrack, crosstrack, bands, height, width, bands);

        #[cfg(feature = "parallel")]
        let output = self.gather_parallel(raw, fill);
        #[cfg(not(feature = "parallel"))]
        let output = self.gather_serial(raw, fill);

        output
    }

    #[cfg_attr(feature = "parallel", allow(dead_code))]
    fn gather_serial<T>(&self, raw: ArrayView3<T>, fill: T) -> Array3<T>
    where
        T: Copy,
    {
        let (height, width) = self.glt.dim();
        let mut output = Array3::from_elem((height, width, raw.len_of(Axis(2))), fill);

        Zip::from(output.lanes_mut(Axis(2)))
            .and(&self.glt.x)
            .and(&self.glt.y)
            .for_each(|mut cell, &gx, &gy| {
                if gx != GLT_NODATA_VALUE && gy != GLT_NODATA_VALUE {
                    cell.assign(&raw.slice(s![(gy - 1) as usize, (gx - 1) as usize, ..]));
                }
            });

        output
    }

    #[cfg(feature = "parallel")]
    fn gather_parallel<T>(&self, raw: ArrayView3<T>, fill: T) -> Array3<T>
    where
        T: Copy + Send + Sync,
    {
        let (height, width) = self.glt.dim();
        let mut output = Array3::from_elem((height, width, raw.len_of(Axis(2))), fill);

        log::debug!("Gathering {} rows on {} threads", height, rayon::current_num_threads());
        Zip::from(output.lanes_mut(Axis(2)))
            .and(&self.glt.x)
            .and(&self.glt.y)
            .par_for_each(|mut cell, &gx, &gy| {
                if gx != GLT_NODATA_VALUE && gy != GLT_NODATA_VALUE {
                    cell.assign(&raw.slice(s![(gy - 1) as usize, (gx - 1) as usize, ..]));
                }
            });

        output
    }

    /// Orthorectify a reflectance cube, attaching coordinates
    pub fn remap(&self, raw: ArrayView3<EmitReal>, fill_value: EmitReal) -> OrthoResult<OrthoCube> {
        let (downtrack, crosstrack, _) = raw.dim();
        self.glt.validate_bounds(downtrack, crosstrack)?;
        self.remap_validated(raw, fill_value)
    }

    /// `remap` for a cube whose dimensions were already checked against the GLT
    pub(crate) fn remap_validated(
        &self,
        raw: ArrayView3<EmitReal>,
        fill_value: EmitReal,
    ) -> OrthoResult<OrthoCube> {
        log::info!("Orthorectifying {:?} cube onto {:?} GLT grid", raw.dim(), self.glt.dim());

        let data = self.gather(raw, fill_value);
        let (height, width) = self.glt.dim();
        let (lat, lon) = self.geo_transform.coord_vectors(width, height)?;

        let coverage = self.glt.coverage();
        log::debug!("GLT coverage: {}/{} cells ({:.1}%)",
                    coverage.valid_cells, coverage.total_cells, coverage.valid_percentage);
        if coverage.valid_cells == 0 {
            log::warn!("GLT has no valid cells, output is entirely fill");
        }

        Ok(OrthoCube {
            data,
            valid: self.glt.valid_mask(),
            lat,
            lon,
            geo_transform: self.geo_transform,
            fill_value,
            bands: None,
        })
    }

    /// Orthorectify only the selected band indices
    pub fn remap_bands(
        &self,
        raw: ArrayView3<EmitReal>,
        band_indices: &[usize],
        fill_value: EmitReal,
    ) -> OrthoResult<OrthoCube> {
        let bands = raw.len_of(Axis(2));
        if let Some(&bad) = band_indices.iter().find(|&&b| b >= bands) {
            return Err(OrthoError::Configuration(format!(
                "Band index {} out of range for a cube with {} bands",
                bad, bands
            )));
        }

        let subset: RawCube = raw.select(Axis(2), band_indices);
        self.remap(subset.view(), fill_value)
    }

    /// Orthorectify a single 2-D layer (elevation, flag layer, mask)
    pub fn remap_layer<T>(&self, layer: ArrayView2<T>, fill: T) -> OrthoResult<Array2<T>>
    where
        T: Copy + Send + Sync,
    {
        let stacked = self.remap_array(layer.insert_axis(Axis(2)), fill)?;
        Ok(stacked.index_axis_move(Axis(2), 0))
    }
}

/// One-shot remap with the default no-data fill
pub fn apply_glt(
    raw: ArrayView3<EmitReal>,
    glt: &Glt,
    geo_transform: &GeoTransform,
    fill_value: Option<EmitReal>,
) -> OrthoResult<OrthoCube> {
    let remapper = GltRemapper::new(glt.clone(), *geo_transform)?;
    remapper.remap(raw, fill_value.unwrap_or(DEFAULT_FILL_VALUE))
}

use crate::types::{OrthoError, OrthoResult, PixelMask};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Layers of the EMIT L2A `mask` variable, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityFlag {
    Cloud,
    Cirrus,
    Water,
    Spacecraft,
    DilatedCloud,
    Aod550,
    WaterVapor,
    Aggregate,
}

/// Screen used by the tutorials: clouds, cirrus, spacecraft, dilated clouds
pub const DEFAULT_QUALITY_FLAGS: [QualityFlag; 4] = [
    QualityFlag::Cloud,
    QualityFlag::Cirrus,
    QualityFlag::Spacecraft,
    QualityFlag::DilatedCloud,
];

impl QualityFlag {
    pub const ALL: [QualityFlag; 8] = [
        QualityFlag::Cloud,
        QualityFlag::Cirrus,
        QualityFlag::Water,
        QualityFlag::Spacecraft,
        QualityFlag::DilatedCloud,
        QualityFlag::Aod550,
        QualityFlag::WaterVapor,
        QualityFlag::Aggregate,
    ];

    /// Layer index along the mask's third axis
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name as stored in `sensor_band_parameters/mask_bands`
    pub fn name(self) -> &'static str {
        match self {
            QualityFlag::Cloud => "Cloud flag",
            QualityFlag::Cirrus => "Cirrus flag",
            QualityFlag::Water => "Water flag",
            QualityFlag::Spacecraft => "Spacecraft Flag",
            QualityFlag::DilatedCloud => "Dilated Cloud Flag",
            QualityFlag::Aod550 => "AOD550",
            QualityFlag::WaterVapor => "H2O (g cm-2)",
            QualityFlag::Aggregate => "Aggregate Flag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|flag| flag.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Named quality layers aligned to the raw grid, stacked as [downtrack, crosstrack, layer]
#[derive(Debug, Clone)]
pub struct QualityLayers {
    data: Array3<f32>,
    names: Vec<String>,
}

impl QualityLayers {
    pub fn new(data: Array3<f32>, names: Vec<String>) -> OrthoResult<Self> {
        if data.len_of(Axis(2)) != names.len() {
            return Err(OrthoError::Configuration(format!(
                "Quality mask has {} layers but {} layer names",
                data.len_of(Axis(2)),
                names.len()
            )));
        }
        Ok(Self { data, names })
    }

    /// Wrap an L2A `mask` variable using the standard layer names
    pub fn emit(data: Array3<f32>) -> OrthoResult<Self> {
        let names = QualityFlag::ALL.iter().map(|f| f.name().to_string()).collect();
        Self::new(data, names)
    }

    /// Stack individual 2-D layers
    pub fn from_layers(layers: &[(&str, ArrayView2<f32>)]) -> OrthoResult<Self> {
        if layers.is_empty() {
            return Err(OrthoError::Usage("No quality layers supplied".to_string()));
        }

        let views: Vec<_> = layers.iter().map(|(_, layer)| layer.view()).collect();
        let data = ndarray::stack(Axis(2), &views).map_err(|e| {
            OrthoError::Configuration(format!("Quality layers have differing shapes: {}", e))
        })?;
        let names = layers.iter().map(|(name, _)| name.to_string()).collect();

        Self::new(data, names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn view(&self) -> ArrayView3<f32> {
        self.data.view()
    }

    pub fn layer_index(&self, name: &str) -> OrthoResult<usize> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| OrthoError::Usage(format!(
                "Unknown quality layer '{}', available: {:?}",
                name, self.names
            )))
    }

    pub fn build_mask(&self, flags: &[usize]) -> OrthoResult<PixelMask> {
        for &flag in flags {
            if let Some(name) = self.names.get(flag) {
                log::debug!("Screening quality layer {}: {}", flag, name);
            }
        }
        build_quality_mask(self.data.view(), flags)
    }

    pub fn build_mask_for(&self, flags: &[QualityFlag]) -> OrthoResult<PixelMask> {
        let indices = flags
            .iter()
            .map(|flag| self.layer_index(flag.name()))
            .collect::<OrthoResult<Vec<_>>>()?;
        self.build_mask(&indices)
    }

    pub fn build_mask_by_name(&self, names: &[&str]) -> OrthoResult<PixelMask> {
        let indices = names
            .iter()
            .map(|name| self.layer_index(name))
            .collect::<OrthoResult<Vec<_>>>()?;
        self.build_mask(&indices)
    }
}

/// OR of the selected layers, each flagged where its value is above zero.
/// `true` marks a pixel to exclude.
pub fn build_quality_mask(layers: ArrayView3<f32>, flags: &[usize]) -> OrthoResult<PixelMask> {
    let (downtrack, crosstrack, layer_count) = layers.dim();

    if let Some(&bad) = flags.iter().find(|&&f| f >= layer_count) {
        return Err(OrthoError::Usage(format!(
            "Quality flag index {} out of range for {} mask layers",
            bad, layer_count
        )));
    }

    let mut mask = Array2::from_elem((downtrack, crosstrack), false);
    for &flag in flags {
        Zip::from(&mut mask)
            .and(layers.index_axis(Axis(2), flag))
            .for_each(|excluded, &value| *excluded |= value > 0.0);
    }

    let flagged = mask.iter().filter(|&&m| m).count();
    let total = mask.len().max(1);
    log::info!("Quality mask from flags {:?}: {:.1}% of pixels excluded",
               flags, flagged as f64 / total as f64 * 100.0);
    if flagged > 0 && flagged == mask.len() {
        log::warn!("⚠️  Quality flags {:?} exclude every pixel of the granule", flags);
    }

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn single_flag_layers(flagged_layer: usize) -> Array3<f32> {
        let mut data = Array3::<f32>::zeros((2, 2, 8));
        data[[1, 0, flagged_layer]] = 1.0;
        data
    }

    #[test]
    fn test_or_semantics_per_layer() {
        for layer in 0..8 {
            let data = single_flag_layers(layer);
            for selected in [vec![0usize, 1, 3, 4], vec![layer], vec![2, 5, 6, 7]] {
                let mask = build_quality_mask(data.view(), &selected).unwrap();
                assert_eq!(mask[[1, 0]], selected.contains(&layer));
                assert!(!mask[[0, 0]] && !mask[[0, 1]] && !mask[[1, 1]]);
            }
        }
    }

    #[test]
    fn test_continuous_layers_and_nan() {
        let mut data = Array3::<f32>::zeros((1, 3, 2));
        data[[0, 0, 1]] = 0.05;
        data[[0, 1, 1]] = f32::NAN;
        data[[0, 2, 1]] = -1.0;

        let mask = build_quality_mask(data.view(), &[1]).unwrap();
        assert_eq!(mask, arr2(&[[true, false, false]]));
    }

    #[test]
    fn test_empty_selection_flags_nothing() {
        let data = Array3::<f32>::ones((3, 3, 8));
        let mask = build_quality_mask(data.view(), &[]).unwrap();
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn test_out_of_range_flag() {
        let data = Array3::<f32>::zeros((2, 2, 8));
        assert!(matches!(build_quality_mask(data.view(), &[8]), Err(OrthoError::Usage(_))));
    }

    #[test]
    fn test_named_selection() {
        let layers = QualityLayers::emit(single_flag_layers(QualityFlag::DilatedCloud.index())).unwrap();

        let mask = layers.build_mask_for(&DEFAULT_QUALITY_FLAGS).unwrap();
        assert!(mask[[1, 0]]);

        let mask = layers.build_mask_by_name(&["water flag", "AOD550"]).unwrap();
        assert!(!mask[[1, 0]]);

        assert!(matches!(layers.build_mask_by_name(&["Snow"]), Err(OrthoError::Usage(_))));
    }

    #[test]
    fn test_from_layers() {
        let cloud = arr2(&[[0.0f32, 1.0], [0.0, 0.0]]);
        let cirrus = arr2(&[[0.0f32, 0.0], [1.0, 0.0]]);
        let layers = QualityLayers::from_layers(&[("Cloud flag", cloud.view()), ("Cirrus flag", cirrus.view())]).unwrap();

        assert_eq!(layers.view().dim(), (2, 2, 2));
        let mask = layers.build_mask(&[0, 1]).unwrap();
        assert_eq!(mask, arr2(&[[false, true], [true, false]]));

        let odd = arr2(&[[0.0f32, 0.0, 0.0]]);
        assert!(QualityLayers::from_layers(&[("a", cloud.view()), ("b", odd.view())]).is_err());
    }

    #[test]
    fn test_flag_names_round_trip() {
        for flag in QualityFlag::ALL {
            assert_eq!(QualityFlag::from_name(flag.name()), Some(flag));
            assert_eq!(QualityFlag::ALL[flag.index()], flag);
        }
        assert_eq!(QualityFlag::from_name("Rain"), None);
    }
}

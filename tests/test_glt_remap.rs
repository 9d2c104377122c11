use emit_ortho::core::{Glt, GltRemapper};
use emit_ortho::types::{GeoTransform, OrthoError, RawCube, DEFAULT_FILL_VALUE};
use ndarray::{arr2, s, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn reflectance_cube(downtrack: usize, crosstrack: usize, bands: usize) -> RawCube {
    Array3::from_shape_fn((downtrack, crosstrack, bands), |(i, j, k)| {
        0.01 * (i as f32) + 0.0001 * (j as f32) + 0.5 * (k as f32 + 1.0).ln()
    })
}

/// Random GLT with roughly a quarter of the cells left as no-data
fn random_glt(rng: &mut StdRng, height: usize, width: usize, downtrack: usize, crosstrack: usize) -> Glt {
    let mut x = Array2::<i32>::zeros((height, width));
    let mut y = Array2::<i32>::zeros((height, width));
    for cell in 0..height * width {
        let (r, c) = (cell / width, cell % width);
        match rng.gen_range(0..8) {
            0 => {}
            1 => x[[r, c]] = rng.gen_range(1..=crosstrack as i32),
            _ => {
                x[[r, c]] = rng.gen_range(1..=crosstrack as i32);
                y[[r, c]] = rng.gen_range(1..=downtrack as i32);
            }
        }
    }
    Glt::new(x, y).expect("Failed to pair GLT grids")
}

fn north_up() -> GeoTransform {
    GeoTransform::from_gdal(&[-118.3, 0.000542232, 0.0, 34.6, 0.0, -0.000542232])
}

#[test]
fn test_documented_scenario() {
    let raw = reflectance_cube(4, 3, 2);
    let glt = Glt::new(arr2(&[[0, 2], [1, 0]]), arr2(&[[0, 1], [2, 0]])).unwrap();
    let remapper = GltRemapper::new(glt, north_up()).unwrap();

    let ortho = remapper.remap(raw.view(), DEFAULT_FILL_VALUE).unwrap();

    assert_eq!(ortho.data.dim(), (2, 2, 2));
    assert!(ortho.data.slice(s![0, 0, ..]).iter().all(|&v| v == DEFAULT_FILL_VALUE));
    assert_eq!(ortho.data.slice(s![0, 1, ..]), raw.slice(s![0, 1, ..]));
    assert_eq!(ortho.data.slice(s![1, 0, ..]), raw.slice(s![1, 0, ..]));
    assert!(ortho.data.slice(s![1, 1, ..]).iter().all(|&v| v == DEFAULT_FILL_VALUE));
    assert_eq!(ortho.lat.len(), 2);
    assert_eq!(ortho.lon.len(), 2);
}

#[test]
fn test_every_cell_is_a_copy_or_fill() {
    let mut rng = StdRng::seed_from_u64(42);
    let (downtrack, crosstrack, bands) = (37, 23, 11);
    let raw = reflectance_cube(downtrack, crosstrack, bands);
    let glt = random_glt(&mut rng, 41, 29, downtrack, crosstrack);
    let remapper = GltRemapper::new(glt.clone(), north_up()).unwrap();

    let ortho = remapper.remap(raw.view(), DEFAULT_FILL_VALUE).unwrap();
    assert_eq!(ortho.data.dim(), (41, 29, bands));

    for ((r, c), &gx) in glt.x().indexed_iter() {
        let gy = glt.y()[[r, c]];
        let cell = ortho.data.slice(s![r, c, ..]);
        if gx == 0 || gy == 0 {
            assert!(cell.iter().all(|&v| v == DEFAULT_FILL_VALUE), "cell ({}, {}) should be fill", r, c);
        } else {
            let source = raw.slice(s![gy as usize - 1, gx as usize - 1, ..]);
            assert_eq!(cell, source, "cell ({}, {}) should copy raw pixel", r, c);
        }
    }
}

#[test]
fn test_remap_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let raw = reflectance_cube(30, 20, 5);
    let glt = random_glt(&mut rng, 35, 25, 30, 20);
    let remapper = GltRemapper::new(glt, north_up()).unwrap();

    let first = remapper.remap(raw.view(), DEFAULT_FILL_VALUE).unwrap();
    let second = remapper.remap(raw.view(), DEFAULT_FILL_VALUE).unwrap();

    let bits = |a: &Array3<f32>| a.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first.data), bits(&second.data));
    assert_eq!(first.lat, second.lat);
    assert_eq!(first.lon, second.lon);
}

#[test]
fn test_matches_naive_gather() {
    let mut rng = StdRng::seed_from_u64(2024);
    let raw = reflectance_cube(16, 16, 4);
    let glt = random_glt(&mut rng, 64, 48, 16, 16);
    let remapper = GltRemapper::new(glt.clone(), north_up()).unwrap();

    let ortho = remapper.remap_array(raw.view(), -1.0f32).unwrap();

    let mut expected = Array3::from_elem((64, 48, 4), -1.0f32);
    for r in 0..64 {
        for c in 0..48 {
            let (gx, gy) = (glt.x()[[r, c]], glt.y()[[r, c]]);
            if gx != 0 && gy != 0 {
                for b in 0..4 {
                    expected[[r, c, b]] = raw[[gy as usize - 1, gx as usize - 1, b]];
                }
            }
        }
    }
    assert_eq!(ortho, expected);
}

#[test]
fn test_band_subset_equals_sliced_full_remap() {
    let mut rng = StdRng::seed_from_u64(99);
    let raw = reflectance_cube(12, 10, 9);
    let glt = random_glt(&mut rng, 15, 14, 12, 10);
    let remapper = GltRemapper::new(glt, north_up()).unwrap();

    let full = remapper.remap(raw.view(), DEFAULT_FILL_VALUE).unwrap();
    let subset = remapper.remap_bands(raw.view(), &[0, 4, 8], DEFAULT_FILL_VALUE).unwrap();

    for (out_band, &src_band) in [0usize, 4, 8].iter().enumerate() {
        assert_eq!(
            subset.data.index_axis(Axis(2), out_band),
            full.data.index_axis(Axis(2), src_band)
        );
    }
}

#[test]
fn test_coordinates_follow_pixel_center_formula() {
    let gt = north_up();
    let raw = reflectance_cube(5, 5, 1);
    let glt = Glt::new(Array2::from_elem((7, 9), 1), Array2::from_elem((7, 9), 1)).unwrap();
    let ortho = GltRemapper::new(glt, gt).unwrap().remap(raw.view(), DEFAULT_FILL_VALUE).unwrap();

    for (x, &lon) in ortho.lon.iter().enumerate() {
        assert_eq!(lon, gt.top_left_x + 0.5 * gt.pixel_width + x as f64 * gt.pixel_width);
    }
    for (y, &lat) in ortho.lat.iter().enumerate() {
        assert_eq!(lat, gt.top_left_y + 0.5 * gt.pixel_height + y as f64 * gt.pixel_height);
    }
}

#[test]
fn test_error_reporting() {
    let raw = reflectance_cube(4, 3, 2);

    let mismatch = Glt::new(Array2::zeros((2, 2)), Array2::zeros((3, 2)));
    match mismatch {
        Err(OrthoError::Configuration(msg)) => assert!(msg.contains("(2, 2)") && msg.contains("(3, 2)")),
        other => panic!("expected configuration error, got {:?}", other),
    }

    let glt = Glt::new(arr2(&[[1, 1], [1, 4]]), arr2(&[[1, 1], [1, 1]])).unwrap();
    let remapper = GltRemapper::new(glt, north_up()).unwrap();
    match remapper.remap(raw.view(), DEFAULT_FILL_VALUE) {
        Err(OrthoError::DataCorruption(msg)) => assert!(msg.contains("crosstrack 3")),
        other => panic!("expected data corruption error, got {:?}", other),
    }

    let rotated = GeoTransform::from_gdal(&[-118.3, 0.0005, 0.01, 34.6, 0.0, -0.0005]);
    let glt = Glt::new(arr2(&[[1]]), arr2(&[[1]])).unwrap();
    assert!(matches!(GltRemapper::new(glt, rotated), Err(OrthoError::Configuration(_))));
}

use bloby::prelude::*;
use bloby::{ErosionPolicy, Threshold};
use ndarray::{s, Array3};
use simple_logger::SimpleLogger;

fn init_logger() {
    let _ = SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// 在背景 `bg` 上放置若干 `3 x 3 x 3` 亮块, 各亮块的中心由 `centres` 给出.
fn cubes(shape: Idx3d, bg: u16, value: u16, centres: &[Idx3d]) -> Volume {
    let mut raw = Array3::from_elem(shape, bg);
    for &(z, y, x) in centres {
        raw.slice_mut(s![z - 1..z + 2, y - 1..y + 2, x - 1..x + 2])
            .fill(value);
    }
    Volume::new(raw)
}

#[test]
fn test_single_bright_voxel() {
    init_logger();
    let mut raw = Array3::<u16>::zeros((4, 4, 4));
    raw[(1, 2, 3)] = 1000;
    let v = Volume::new(raw);

    for seed in 0..5 {
        let d = BlobDetector::new(DetectorConfig::new(2).with_seed(seed))
            .detect(&v)
            .unwrap();
        assert_eq!(d.representatives, vec![0, 1000]);
        assert_eq!(d.threshold.value(), 500.0);
        assert_eq!(d.policy, ErosionPolicy::Skip);
        assert_eq!(d.foreground, 1);
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.centroids, vec![Centroid::from((1, 2, 3))]);
    }
}

#[test]
fn test_single_component_rejected() {
    init_logger();
    let mut raw = Array3::<u16>::zeros((4, 4, 4));
    raw[(0, 0, 0)] = 1000;
    let e = BlobDetector::with_components(1)
        .get_blob_centroids(&Volume::new(raw))
        .unwrap_err();
    assert_eq!(e, BlobError::Config(ConfigError::TooFewComponents(1)));
    assert_eq!(
        Threshold::from_representatives(&[1000]),
        Err(BlobError::Config(ConfigError::TooFewComponents(1)))
    );
}

#[test]
fn test_degenerate_volumes() {
    init_logger();
    let detector = BlobDetector::new(DetectorConfig::new(2).with_seed(0));

    let e = detector
        .detect(&Volume::new(Array3::zeros((4, 4, 4))))
        .unwrap_err();
    assert!(e.is_data());

    let e = detector
        .detect(&Volume::new(Array3::zeros((0, 4, 4))))
        .unwrap_err();
    assert_eq!(e, BlobError::Data(DataError::EmptyVolume));
}

#[test]
fn test_fit_not_converged() {
    init_logger();
    let mut raw = Array3::<u16>::zeros((4, 4, 4));
    raw.slice_mut(s![0..2, .., ..]).fill(500);
    raw[(3, 3, 3)] = 1000;

    let mut config = DetectorConfig::new(2).with_seed(0);
    config.cluster = config.cluster.with_max_iter(1);
    let e = BlobDetector::new(config)
        .get_blob_centroids(&Volume::new(raw))
        .unwrap_err();
    assert_eq!(
        e,
        BlobError::Data(DataError::NotConverged { iterations: 1 })
    );
}

#[test]
fn test_touching_cubes_k2_vs_k3() {
    init_logger();
    // 两个仅在角点相接的亮块, 外加一个弱荧光块.
    let centres = [(2, 2, 2), (5, 5, 5)];
    let mut raw = cubes((8, 8, 12), 10, 900, &centres).into_inner();
    raw.slice_mut(s![0..2, 5..8, 9..12]).fill(300);
    let v = Volume::new(raw);

    // k = 3 时阈值在 300 与 900 之间, 腐蚀后两块分开.
    let d3 = BlobDetector::new(DetectorConfig::new(3).with_seed(1))
        .detect(&v)
        .unwrap();
    assert_eq!(d3.representatives, vec![10, 300, 900]);
    assert_eq!(d3.threshold.value(), 600.0);
    assert_eq!(d3.policy, ErosionPolicy::Erode);
    assert_eq!(d3.foreground, 54);
    assert_eq!(
        d3.centroids,
        vec![Centroid::from((2, 2, 2)), Centroid::from((5, 5, 5))]
    );

    // 只有两个强度水平时 k = 2 不腐蚀, 两块经角点 26-相连, 合并为一个斑点.
    let v2 = cubes((8, 8, 12), 10, 900, &centres);
    let d2 = BlobDetector::new(DetectorConfig::new(2).with_seed(1))
        .detect(&v2)
        .unwrap();
    assert_eq!(d2.policy, ErosionPolicy::Skip);
    assert_eq!(d2.labels.len(), 1);
    // 各轴均值为 3.5, 五成双取整为 4.
    assert_eq!(d2.centroids, vec![Centroid::from((4, 4, 4))]);
}

#[test]
fn test_threshold_between_representatives() {
    init_logger();
    let v = cubes(
        (9, 12, 12),
        20,
        800,
        &[(2, 2, 2), (6, 8, 8), (2, 9, 3)],
    );
    let mut raw = v.into_inner();
    raw.slice_mut(s![7..9, 0..3, 9..12]).fill(250);
    let v = Volume::new(raw);

    for seed in 0..3 {
        let d = BlobDetector::new(DetectorConfig::new(3).with_seed(seed))
            .detect(&v)
            .unwrap();
        let reps = &d.representatives;
        assert_eq!(reps.len(), 3);
        assert!(reps.windows(2).all(|w| w[0] <= w[1]));
        let t = d.threshold.value();
        assert!(reps[1] as f64 <= t && t <= reps[2] as f64);

        let (sz, sy, sx) = v.shape();
        for c in d.centroids.iter() {
            assert!(c.z < sz && c.y < sy && c.x < sx);
        }
    }
}

#[test]
fn test_isolated_voxels_k2() {
    init_logger();
    let mut raw = Array3::<u16>::from_elem((5, 6, 7), 50);
    let pts = [(0, 0, 0), (2, 3, 3), (4, 5, 6)];
    for p in pts {
        raw[p] = 2000;
    }
    let d = BlobDetector::new(DetectorConfig::new(2).with_seed(9))
        .get_blob_centroids(&Volume::new(raw))
        .unwrap();
    let expected: Vec<Centroid> = pts.into_iter().map(Centroid::from).collect();
    assert_eq!(d, expected);
}

#[test]
fn test_intensity_by_region() {
    init_logger();
    let v = cubes((4, 6, 6), 1, 100, &[(1, 1, 1)]);
    let mut regions = Array3::<RegionId>::zeros((4, 6, 6));
    regions.slice_mut(s![0..3, 0..3, 0..3]).fill(7);
    regions[(3, 5, 5)] = 2;
    let r = RegionVolume::new(regions);

    let m = BlobDetector::default().intensity_by_region(&v, &r).unwrap();
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![0, 2, 7]);
    assert_eq!(m[&7], 2700.0);
    assert_eq!(m[&2], 1.0);
    assert_eq!(m[&0], (4 * 6 * 6 - 27 - 1) as f64);
    assert_eq!(m.values().sum::<f64>(), v.total_intensity());

    let seq = sum_intensity_by_region(&v, &r).unwrap();
    assert_eq!(seq, m);

    let bad = RegionVolume::new(Array3::zeros((4, 6, 5)));
    assert!(matches!(
        BlobDetector::default().intensity_by_region(&v, &bad),
        Err(BlobError::ShapeMismatch { .. })
    ));
}

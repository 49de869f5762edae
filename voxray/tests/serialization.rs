//! Artifact format tests: byte layouts and text ↔ binary conversion.

use std::fs;

use tempfile::tempdir;
use voxray::{MappingSession, VoxrayConfig};
use voxray_core::{LabeledPoint, PixelCoord, Point3};
use voxray_io::format::{encode_matrix, load_pose, HEADER_SIZE};
use voxray_io::{load_matrix, PointChunk, RayLut};

fn f64_at(bytes: &[u8], index: usize) -> f64 {
    let start = HEADER_SIZE + index * 8;
    f64::from_le_bytes(bytes[start..start + 8].try_into().unwrap())
}

#[test]
fn test_chunk_binary_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("x_DUCATI.bin");
    let chunk = PointChunk::new(vec![
        LabeledPoint::new(Point3::new(1.0, 2.0, 3.0), 7),
        LabeledPoint::new(Point3::new(4.0, 5.0, 6.0), 8),
    ]);
    chunk.write_binary(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 4 * 2 * 8);
    assert_eq!(i64::from_le_bytes(bytes[0..8].try_into().unwrap()), 4);
    assert_eq!(i64::from_le_bytes(bytes[8..16].try_into().unwrap()), 2);
    // Row-major: all x values first, one column per point.
    assert_eq!(f64_at(&bytes, 0), 1.0);
    assert_eq!(f64_at(&bytes, 1), 4.0);
    assert_eq!(f64_at(&bytes, 2), 2.0);
    assert_eq!(f64_at(&bytes, 7), 8.0);
}

#[test]
fn test_text_lut_converts_to_identical_binary() {
    let dir = tempdir().unwrap();
    let text = dir.path().join("raysLut.txt");
    let binary = dir.path().join("raysLut.bin");
    fs::write(
        &text,
        "0 0 0.0 0.0 0.0 -0.25 -0.25 1.0\n\
         0 1 0.0 0.0 0.0 0.25 -0.25 1.0\n\
         1 0 0.0 0.0 0.0 -0.25 0.25 1.0\n\
         1 1 0.0 0.0 0.0 0.25 0.25 1.0\n",
    )
    .unwrap();

    let from_text = RayLut::load_text(&text, 2, 2).unwrap();
    from_text.save(&binary).unwrap();
    let from_binary = RayLut::load(&binary, 2, 2).unwrap();
    assert_eq!(from_binary, from_text);

    // Saving again reproduces the same bytes.
    let bytes = fs::read(&binary).unwrap();
    assert_eq!(encode_matrix(&from_binary.to_matrix()), bytes);
    assert_eq!(load_matrix(&binary).unwrap().rows(), 4);
}

#[test]
fn test_truncated_artifacts_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raysLut.bin");
    RayLut::from_fn(2, 2, |_, _| voxray_core::Ray::new(Point3::ZERO, Point3::new(0.0, 0.0, 1.0)))
        .save(&path)
        .unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 3);
    fs::write(&path, &bytes).unwrap();
    assert!(RayLut::load(&path, 2, 2).is_err());

    fs::write(&path, [0u8; 7]).unwrap();
    assert!(RayLut::load(&path, 2, 2).is_err());
}

#[test]
fn test_session_with_text_artifacts() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("raysLut.txt"),
        "0 0 0 0 0 0 0 1\n0 1 0.1 0 0 0 0 1\n1 0 0 0.1 0 0 0 1\n1 1 0.1 0.1 0 0 0 1\n",
    )
    .unwrap();
    fs::write(dir.path().join("unrectifyLut.txt"), "0 0 1 1\n1 1 0 0\n0 1 1 0\n").unwrap();

    let text = format!(
        "[sensor]\nrows = 2\ncols = 2\n\n[paths]\nray_lut = \"{}\"\nrectify_lut = \"{}\"\n",
        dir.path().join("raysLut.txt").display(),
        dir.path().join("unrectifyLut.txt").display(),
    );
    let config = VoxrayConfig::from_toml(&text).unwrap();
    let session = MappingSession::from_config(&config).unwrap();

    assert_eq!(session.ray_lut().populated(), 4);
    let remap = session.remap().expect("remap table loaded");
    assert_eq!(remap.to_raw(0, 0), Some(PixelCoord::new(1, 1)));
    assert_eq!(remap.to_rectified(1, 0), Some(PixelCoord::new(0, 1)));
    assert_eq!(remap.to_raw(1, 0), None);
}

#[test]
fn test_pose_file_feeds_ray_casting() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pose.txt");
    fs::write(
        &path,
        "1 0 0 10\n\
         0 1 0 20\n\
         0 0 1 0\n\
         0 0 0 1\n",
    )
    .unwrap();
    let pose = load_pose(&path).unwrap();

    let map = voxray_io::SparseVoxelMap::new(voxray_io::MapConfig::default()).unwrap();
    map.integrate_point(Point3::new(10.05, 20.05, 1.05), voxray_core::Observation::single(3));

    let ray = voxray_core::Ray::new(Point3::new(0.05, 0.05, 0.0), Point3::new(0.0, 0.0, 1.0));
    let hit = voxray::intersect_voxel(&map, &pose, &ray, 0.1, 2.0)
        .unwrap()
        .expect("pose moves the ray under the voxel");
    assert_eq!(hit.label(), Some(3));

    fs::write(&path, "1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 1 1\n").unwrap();
    assert!(load_pose(&path).is_err());
}

#[test]
fn test_config_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("voxray.toml");
    let mut config = VoxrayConfig::default();
    config.raycast.roi_half_extent = 120;
    config.paths.rectify_lut = Some(dir.path().join("unrectifyLut.txt"));
    fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    assert_eq!(VoxrayConfig::load(&path).unwrap(), config);
}

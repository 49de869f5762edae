//! Concurrent safety tests for voxray.
//!
//! These tests verify that integration from many threads never loses an
//! update and that ray casting from many threads sees a consistent map.

use std::sync::Arc;
use std::thread;

use voxray::{intersect_voxel, VoxelIntegrator};
use voxray_core::{CameraPose, Label, LabeledPoint, Observation, Point3, Ray, VoxelCoord};
use voxray_io::{MapConfig, SparseVoxelMap};

// =============================================================================
// Test Map Factories
// =============================================================================

fn concurrent_map() -> Arc<SparseVoxelMap> {
    Arc::new(SparseVoxelMap::new(MapConfig::new(0.1, 64, true)).unwrap())
}

/// Points of thread `t`: a shared hot voxel plus a private strip.
fn thread_points(t: usize, count: usize) -> Vec<LabeledPoint> {
    (0..count)
        .map(|i| {
            let position = if i % 4 == 0 {
                Point3::new(0.05, 0.05, 0.05)
            } else {
                Point3::new(0.05 + 0.1 * i as f64, 0.05 + 0.1 * t as f64, 1.05)
            };
            LabeledPoint::new(position, (t % 3) as Label)
        })
        .collect()
}

// =============================================================================
// Concurrent Write Tests
// =============================================================================

#[test]
fn test_concurrent_integration_loses_no_weight() {
    let map = concurrent_map();
    let num_threads = 8;
    let points_per_thread = 2_000;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for point in thread_points(t, points_per_thread) {
                    map.integrate_point(point.position, Observation::single(point.label.unwrap_or(0)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked");
    }

    let stats = map.stats();
    assert_eq!(stats.total_weight, (num_threads * points_per_thread) as u64);

    // Every thread put a quarter of its points into the hot voxel.
    let hot = map.query(VoxelCoord::new(0, 0, 0)).unwrap();
    assert_eq!(hot.total_weight(), (num_threads * points_per_thread / 4) as u64);
}

#[test]
fn test_concurrent_same_voxel_counts() {
    let map = concurrent_map();
    let num_threads = 16;
    let per_thread = 500;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for _ in 0..per_thread {
                    map.integrate(VoxelCoord::new(-3, 7, 2), Observation::single((t % 2) as Label));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked");
    }

    let data = map.query(VoxelCoord::new(-3, 7, 2)).unwrap();
    assert_eq!(data.weight_of(0), (num_threads / 2 * per_thread) as u32);
    assert_eq!(data.weight_of(1), (num_threads / 2 * per_thread) as u32);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_parallel_batches_from_threads() {
    let map = concurrent_map();
    let integrator = VoxelIntegrator::default();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || integrator.integrate_batch(&thread_points(t, 1_000), &map))
        })
        .collect();

    let integrated: usize = handles
        .into_iter()
        .map(|h| h.join().expect("writer panicked").integrated)
        .sum();

    assert_eq!(integrated, 4_000);
    assert_eq!(map.stats().total_weight, 4_000);
}

// =============================================================================
// Concurrent Read Tests
// =============================================================================

#[test]
fn test_concurrent_ray_casts_agree() {
    let map = concurrent_map();
    for x in 0..20 {
        for y in 0..20 {
            map.integrate(VoxelCoord::new(x, y, 40), Observation::single(4));
        }
    }

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                let mut hits = 0;
                for i in 0..400 {
                    let (x, y) = (i % 20, (i / 20 + t) % 20);
                    let ray = Ray::new(
                        Point3::new(0.05 + 0.1 * x as f64, 0.05 + 0.1 * y as f64, 0.05),
                        Point3::new(0.0, 0.0, 1.0),
                    );
                    let hit = intersect_voxel(&map, &CameraPose::IDENTITY, &ray, 0.1, 10.0)
                        .unwrap()
                        .expect("every ray hits the wall");
                    assert_eq!(hit.voxel.coord.z, 40);
                    assert_eq!(hit.label(), Some(4));
                    hits += 1;
                }
                hits
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("reader panicked"), 400);
    }
}

#[test]
fn test_fetch_all_after_concurrent_writes() {
    let map = concurrent_map();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..250 {
                    map.integrate(VoxelCoord::new(t, i, 0), Observation::single(1));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked");
    }

    assert_eq!(map.len(), 1_000);
    assert_eq!(map.fetch_all().count(), 1_000);
}

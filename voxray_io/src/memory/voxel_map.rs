//! SparseVoxelMap - sharded concurrent voxel index.
//!
//! Voxels live in a fixed number of shards, each a `HashMap` behind its own
//! `parking_lot::RwLock`. A coordinate always maps to the same shard (via its
//! Morton code), so updates to one voxel serialize on one lock while writers
//! touching distinct regions mostly proceed in parallel.
//!
//! The map is append/merge only: voxels are created on first observation and
//! never removed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rayon::prelude::*;
use voxray_core::{shard_index, voxel_coord, Observation, Point3, Voxel3D, VoxelCoord, VoxelData};

use crate::config::MapConfig;
use crate::error::Result;

type Shard = RwLock<HashMap<VoxelCoord, VoxelData>>;

/// Sparse, thread-safe voxel map keyed by integer coordinate.
pub struct SparseVoxelMap {
    config: MapConfig,
    shards: Box<[Shard]>,
    count: AtomicUsize,
    phase: PhaseTracker,
}

impl SparseVoxelMap {
    /// Create an empty map.
    ///
    /// Fails for a non-positive resolution or a shard count that is not a
    /// power of two.
    pub fn new(config: MapConfig) -> Result<Self> {
        config.validate()?;

        let shards = (0..config.shards)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        log::debug!(
            "created voxel map: resolution={} shards={} concurrent={}",
            config.resolution,
            config.shards,
            config.concurrent
        );

        Ok(Self {
            config,
            shards,
            count: AtomicUsize::new(0),
            phase: PhaseTracker::default(),
        })
    }

    /// Map configuration.
    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Voxel edge length.
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.config.resolution
    }

    /// Whether batch integration may fan out over several threads.
    #[inline]
    pub fn is_concurrent(&self) -> bool {
        self.config.concurrent
    }

    /// Switch the concurrency mode. Requires exclusive access so it can never
    /// change in the middle of a batch.
    pub fn set_concurrent(&mut self, concurrent: bool) {
        self.config.concurrent = concurrent;
    }

    /// Number of stored voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// True when no voxel has been stored yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn shard(&self, coord: VoxelCoord) -> &Shard {
        &self.shards[shard_index(coord, self.shards.len())]
    }

    /// Merge an observation into the voxel at `coord`, creating it if absent.
    ///
    /// Safe to call from many threads at once; no update is lost. Counts as
    /// a write phase, see [`SparseVoxelMap::begin_write`].
    pub fn integrate(&self, coord: VoxelCoord, observation: Observation) {
        let _phase = self.begin_write();
        let mut shard = self.shard(coord).write();
        match shard.entry(coord) {
            Entry::Occupied(mut e) => e.get_mut().integrate(observation),
            Entry::Vacant(e) => {
                e.insert(VoxelData::from_observation(observation));
                self.count.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    /// Merge an observation at a world position.
    #[inline]
    pub fn integrate_point(&self, position: Point3, observation: Observation) {
        self.integrate(voxel_coord(position, self.config.resolution), observation);
    }

    /// Merge a whole voxel record into the voxel at `coord`.
    pub fn merge(&self, coord: VoxelCoord, data: &VoxelData) {
        if data.is_empty() {
            return;
        }
        let _phase = self.begin_write();
        let mut shard = self.shard(coord).write();
        match shard.entry(coord) {
            Entry::Occupied(mut e) => e.get_mut().merge(data),
            Entry::Vacant(e) => {
                e.insert(*data);
                self.count.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    /// Copy of the data stored at `coord`.
    #[inline]
    pub fn query(&self, coord: VoxelCoord) -> Option<VoxelData> {
        self.shard(coord).read().get(&coord).copied()
    }

    /// Copy of the data stored in the voxel containing `position`.
    #[inline]
    pub fn query_point(&self, position: Point3) -> Option<VoxelData> {
        self.query(voxel_coord(position, self.config.resolution))
    }

    /// True when a voxel exists at `coord`.
    #[inline]
    pub fn contains(&self, coord: VoxelCoord) -> bool {
        self.shard(coord).read().contains_key(&coord)
    }

    /// Materialized voxel at `coord`, or [`Voxel3D::empty`] when absent.
    pub fn voxel(&self, coord: VoxelCoord) -> Voxel3D {
        match self.query(coord) {
            Some(data) => Voxel3D::new(coord, self.config.resolution, data),
            None => Voxel3D::empty(),
        }
    }

    /// Lazily iterate over every stored voxel.
    ///
    /// Shards are snapshotted one at a time, so the result is only a
    /// consistent picture of the map when no writer runs concurrently. Call
    /// again to restart.
    pub fn fetch_all(&self) -> VoxelIter<'_> {
        VoxelIter {
            map: self,
            next_shard: 0,
            buffer: Vec::new().into_iter(),
        }
    }

    /// Parallel counterpart of [`SparseVoxelMap::fetch_all`].
    pub fn par_voxels(&self) -> impl ParallelIterator<Item = Voxel3D> + '_ {
        let resolution = self.config.resolution;
        self.shards.par_iter().flat_map_iter(move |shard| {
            shard
                .read()
                .iter()
                .map(|(&coord, data)| Voxel3D::new(coord, resolution, *data))
                .collect::<Vec<_>>()
        })
    }

    /// Occupancy statistics.
    pub fn stats(&self) -> MapStats {
        let mut stats = MapStats {
            voxels: 0,
            shards: self.shards.len(),
            occupied_shards: 0,
            largest_shard: 0,
            total_weight: 0,
        };

        for (idx, shard) in self.shards.iter().enumerate() {
            let shard = shard.read();
            if shard.is_empty() {
                continue;
            }
            log::debug!("shard {}: {} voxels", idx, shard.len());
            stats.voxels += shard.len();
            stats.occupied_shards += 1;
            stats.largest_shard = stats.largest_shard.max(shard.len());
            stats.total_weight += shard.values().map(VoxelData::total_weight).sum::<u64>();
        }
        stats
    }

    /// Enter the write phase (point integration).
    ///
    /// In debug builds, overlapping an active read phase panics. Release
    /// builds do not track phases.
    pub fn begin_write(&self) -> WritePhase<'_> {
        self.phase.enter_write();
        WritePhase { map: self }
    }

    /// Enter the read phase (ray casting). See [`SparseVoxelMap::begin_write`].
    pub fn begin_read(&self) -> ReadPhase<'_> {
        self.phase.enter_read();
        ReadPhase { map: self }
    }
}

/// Snapshot statistics of a [`SparseVoxelMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapStats {
    /// Stored voxels.
    pub voxels: usize,
    /// Configured shard count.
    pub shards: usize,
    /// Shards holding at least one voxel.
    pub occupied_shards: usize,
    /// Voxel count of the fullest shard.
    pub largest_shard: usize,
    /// Sum of every voxel's total weight.
    pub total_weight: u64,
}

/// Lazy iterator over all voxels of a map, produced by
/// [`SparseVoxelMap::fetch_all`].
pub struct VoxelIter<'a> {
    map: &'a SparseVoxelMap,
    next_shard: usize,
    buffer: std::vec::IntoIter<(VoxelCoord, VoxelData)>,
}

impl Iterator for VoxelIter<'_> {
    type Item = Voxel3D;

    fn next(&mut self) -> Option<Voxel3D> {
        loop {
            if let Some((coord, data)) = self.buffer.next() {
                return Some(Voxel3D::new(coord, self.map.config.resolution, data));
            }
            let shard = self.map.shards.get(self.next_shard)?;
            self.next_shard += 1;
            self.buffer = shard
                .read()
                .iter()
                .map(|(&c, &d)| (c, d))
                .collect::<Vec<_>>()
                .into_iter();
        }
    }
}

/// RAII marker for the write phase. Dropping it ends the phase.
pub struct WritePhase<'a> {
    map: &'a SparseVoxelMap,
}

impl Drop for WritePhase<'_> {
    fn drop(&mut self) {
        self.map.phase.exit_write();
    }
}

/// RAII marker for the read phase. Dropping it ends the phase.
pub struct ReadPhase<'a> {
    map: &'a SparseVoxelMap,
}

impl Drop for ReadPhase<'_> {
    fn drop(&mut self) {
        self.map.phase.exit_read();
    }
}

/// Debug-only bookkeeping of active read and write phases.
#[derive(Default)]
struct PhaseTracker {
    #[cfg(debug_assertions)]
    writers: AtomicUsize,
    #[cfg(debug_assertions)]
    readers: AtomicUsize,
}

impl PhaseTracker {
    #[inline]
    fn enter_write(&self) {
        #[cfg(debug_assertions)]
        {
            self.writers.fetch_add(1, Ordering::AcqRel);
            if self.readers.load(Ordering::Acquire) != 0 {
                self.writers.fetch_sub(1, Ordering::AcqRel);
                panic!("write phase started while ray casting is reading the map");
            }
        }
    }

    #[inline]
    fn exit_write(&self) {
        #[cfg(debug_assertions)]
        self.writers.fetch_sub(1, Ordering::AcqRel);
    }

    #[inline]
    fn enter_read(&self) {
        #[cfg(debug_assertions)]
        {
            self.readers.fetch_add(1, Ordering::AcqRel);
            if self.writers.load(Ordering::Acquire) != 0 {
                self.readers.fetch_sub(1, Ordering::AcqRel);
                panic!("read phase started while points are being integrated");
            }
        }
    }

    #[inline]
    fn exit_read(&self) {
        #[cfg(debug_assertions)]
        self.readers.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn map() -> SparseVoxelMap {
        SparseVoxelMap::new(MapConfig::new(0.1, 8, true)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(SparseVoxelMap::new(MapConfig::new(0.0, 8, true)).is_err());
        assert!(SparseVoxelMap::new(MapConfig::new(0.1, 0, true)).is_err());
    }

    #[test]
    fn test_integrate_creates_then_merges() {
        let map = map();
        assert!(map.is_empty());

        map.integrate_point(Point3::new(0.05, 0.05, 0.05), Observation::single(1));
        map.integrate_point(Point3::new(0.05, 0.05, 0.06), Observation::single(1));
        map.integrate_point(Point3::new(0.05, 0.05, 0.04), Observation::single(2));

        assert_eq!(map.len(), 1);
        let data = map.query(VoxelCoord::new(0, 0, 0)).unwrap();
        assert_eq!(data.weight_of(1), 2);
        assert_eq!(data.weight_of(2), 1);
        assert_eq!(data.heaviest_label(), Some(1));
    }

    #[test]
    fn test_query_missing() {
        let map = map();
        assert!(map.query(VoxelCoord::new(1, 2, 3)).is_none());
        assert!(map.voxel(VoxelCoord::new(1, 2, 3)).is_empty());
        assert!(!map.contains(VoxelCoord::new(1, 2, 3)));
    }

    #[test]
    fn test_voxel_materializes_center() {
        let map = map();
        map.integrate(VoxelCoord::new(2, 0, -1), Observation::single(4));
        let voxel = map.voxel(VoxelCoord::new(2, 0, -1));
        assert_eq!(voxel.label(), Some(4));
        assert!((voxel.center.x - 0.25).abs() < 1e-12);
        assert!((voxel.center.z + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_merge_whole_record() {
        let map = map();
        let mut data = VoxelData::new();
        data.integrate(Observation::new(3, 5));
        map.merge(VoxelCoord::new(0, 0, 0), &data);
        map.merge(VoxelCoord::new(0, 0, 0), &data);
        map.merge(VoxelCoord::new(1, 0, 0), &VoxelData::new());

        assert_eq!(map.len(), 1);
        assert_eq!(map.query(VoxelCoord::new(0, 0, 0)).unwrap().weight_of(3), 10);
    }

    #[test]
    fn test_fetch_all_yields_each_voxel_once() {
        let map = map();
        let mut expected = HashSet::new();
        for x in -5..5 {
            for z in 0..4 {
                let c = VoxelCoord::new(x, 1, z);
                map.integrate(c, Observation::single(0));
                map.integrate(c, Observation::single(1));
                expected.insert(c);
            }
        }

        let seen: Vec<_> = map.fetch_all().map(|v| v.coord).collect();
        assert_eq!(seen.len(), expected.len());
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);

        // Restartable
        assert_eq!(map.fetch_all().count(), expected.len());
        assert_eq!(map.par_voxels().count(), expected.len());
    }

    #[test]
    fn test_fetch_all_empty() {
        assert_eq!(map().fetch_all().count(), 0);
    }

    #[test]
    fn test_stats() {
        let map = map();
        for x in 0..10 {
            map.integrate(VoxelCoord::new(x, 0, 0), Observation::new(1, 2));
        }
        let stats = map.stats();
        assert_eq!(stats.voxels, 10);
        assert_eq!(stats.shards, 8);
        assert!(stats.occupied_shards >= 1 && stats.occupied_shards <= 8);
        assert!(stats.largest_shard >= 2);
        assert_eq!(stats.total_weight, 20);
    }

    #[test]
    fn test_set_concurrent() {
        let mut map = map();
        assert!(map.is_concurrent());
        map.set_concurrent(false);
        assert!(!map.is_concurrent());
    }

    #[test]
    fn test_phases_in_sequence() {
        let map = map();
        {
            let _write = map.begin_write();
            map.integrate(VoxelCoord::new(0, 0, 0), Observation::single(1));
        }
        let _read_a = map.begin_read();
        let _read_b = map.begin_read();
        assert!(map.contains(VoxelCoord::new(0, 0, 0)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "read phase started")]
    fn test_overlapping_phases_detected() {
        let map = map();
        let _write = map.begin_write();
        let _read = map.begin_read();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_rejected_phase_leaves_tracker_clean() {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let map = map();
        {
            let _write = map.begin_write();
            let rejected = catch_unwind(AssertUnwindSafe(|| {
                let _read = map.begin_read();
            }));
            assert!(rejected.is_err());
        }

        // Write phase over, the rejected read must not linger.
        let recovered = catch_unwind(AssertUnwindSafe(|| {
            let _write = map.begin_write();
            map.integrate(VoxelCoord::new(1, 2, 3), Observation::single(1));
        }));
        assert!(recovered.is_ok());
        let _read = map.begin_read();
        assert!(map.contains(VoxelCoord::new(1, 2, 3)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "write phase started")]
    fn test_direct_write_during_read_detected() {
        let map = map();
        let _read = map.begin_read();
        map.integrate(VoxelCoord::new(0, 0, 0), Observation::single(1));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "write phase started")]
    fn test_direct_merge_during_read_detected() {
        let map = map();
        let _read = map.begin_read();
        map.merge(VoxelCoord::new(0, 0, 0), &VoxelData::from_observation(Observation::single(2)));
    }
}

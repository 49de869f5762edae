//! Per-voxel label evidence.
//!
//! A [`VoxelData`] accumulates how often each semantic label was observed
//! inside one cell. Storage is inline and bounded: up to [`MAX_LABELS`]
//! distinct labels are tracked individually, kept sorted by label id so two
//! voxels built from the same observations compare equal regardless of the
//! order those observations arrived in.

use crate::coords::voxel_center;
use crate::types::{Label, Point3, VoxelCoord, Weight};

/// Maximum number of distinct labels tracked per voxel.
pub const MAX_LABELS: usize = 20;

/// One increment of evidence for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Observation {
    /// Observed label.
    pub label: Label,
    /// Evidence added by this observation.
    pub weight: Weight,
}

impl Observation {
    /// Create an observation with an explicit weight.
    #[inline]
    pub const fn new(label: Label, weight: Weight) -> Self {
        Self { label, weight }
    }

    /// Unit-weight observation, the increment applied per integrated point.
    #[inline]
    pub const fn single(label: Label) -> Self {
        Self { label, weight: 1 }
    }
}

/// Bounded label → weight mapping stored in a voxel.
///
/// Once every slot holds a label, observations of further labels are added to
/// [`VoxelData::overflow_weight`] instead of being tracked individually.
/// Merging is commutative and associative as long as the number of distinct
/// labels stays within [`MAX_LABELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelData {
    // Sorted by label; entries at index >= len are zeroed.
    slots: [(Label, Weight); MAX_LABELS],
    len: u8,
    overflow_weight: Weight,
}

impl Default for VoxelData {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelData {
    /// Create an empty voxel record.
    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: [(0, 0); MAX_LABELS],
            len: 0,
            overflow_weight: 0,
        }
    }

    /// Create a record holding a single observation.
    pub fn from_observation(observation: Observation) -> Self {
        let mut data = Self::new();
        data.integrate(observation);
        data
    }

    /// Add an observation. Weights saturate at `Weight::MAX`.
    pub fn integrate(&mut self, observation: Observation) {
        let len = self.len as usize;
        match self.slots[..len].binary_search_by_key(&observation.label, |&(l, _)| l) {
            Ok(idx) => {
                let slot = &mut self.slots[idx].1;
                *slot = slot.saturating_add(observation.weight);
            }
            Err(idx) if len < MAX_LABELS => {
                self.slots.copy_within(idx..len, idx + 1);
                self.slots[idx] = (observation.label, observation.weight);
                self.len += 1;
            }
            Err(_) => {
                self.overflow_weight = self.overflow_weight.saturating_add(observation.weight);
            }
        }
    }

    /// Fold another record into this one.
    pub fn merge(&mut self, other: &VoxelData) {
        for (label, weight) in other.labels() {
            self.integrate(Observation::new(label, weight));
        }
        self.overflow_weight = self.overflow_weight.saturating_add(other.overflow_weight);
    }

    /// Weight accumulated for `label` (zero if never observed or overflowed).
    pub fn weight_of(&self, label: Label) -> Weight {
        let len = self.len as usize;
        self.slots[..len]
            .binary_search_by_key(&label, |&(l, _)| l)
            .map(|idx| self.slots[idx].1)
            .unwrap_or(0)
    }

    /// Label with the largest weight together with that weight.
    ///
    /// Ties resolve to the lowest label id.
    pub fn heaviest(&self) -> Option<(Label, Weight)> {
        let mut best: Option<(Label, Weight)> = None;
        for (label, weight) in self.labels() {
            match best {
                Some((_, w)) if w >= weight => {}
                _ => best = Some((label, weight)),
            }
        }
        best
    }

    /// Label with the largest weight, if any label has been observed.
    #[inline]
    pub fn heaviest_label(&self) -> Option<Label> {
        self.heaviest().map(|(label, _)| label)
    }

    /// Weight of the heaviest label, zero when empty.
    #[inline]
    pub fn heaviest_weight(&self) -> Weight {
        self.heaviest().map(|(_, weight)| weight).unwrap_or(0)
    }

    /// Iterate over `(label, weight)` pairs in ascending label order.
    pub fn labels(&self) -> impl Iterator<Item = (Label, Weight)> + '_ {
        self.slots[..self.len as usize].iter().copied()
    }

    /// Number of labels tracked individually.
    #[inline]
    pub fn label_count(&self) -> usize {
        self.len as usize
    }

    /// Weight absorbed after all label slots were taken.
    #[inline]
    pub fn overflow_weight(&self) -> Weight {
        self.overflow_weight
    }

    /// Sum of every weight, overflow included.
    pub fn total_weight(&self) -> u64 {
        self.labels().map(|(_, w)| w as u64).sum::<u64>() + self.overflow_weight as u64
    }

    /// True when nothing has been integrated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0 && self.overflow_weight == 0
    }
}

/// A voxel as handed to consumers: coordinate, world-space center and data.
///
/// `data == None` marks a miss (no voxel stored at `coord`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Voxel3D {
    /// Integer coordinate of the cell.
    pub coord: VoxelCoord,
    /// Center of the cell, `(coord + 0.5) * resolution`.
    pub center: Point3,
    /// Label evidence, `None` for the empty marker.
    pub data: Option<VoxelData>,
}

impl Voxel3D {
    /// Materialize a stored voxel.
    #[inline]
    pub fn new(coord: VoxelCoord, resolution: f64, data: VoxelData) -> Self {
        Self {
            coord,
            center: voxel_center(coord, resolution),
            data: Some(data),
        }
    }

    /// The empty marker.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            coord: VoxelCoord::new(0, 0, 0),
            center: Point3::ZERO,
            data: None,
        }
    }

    /// True for the empty marker.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Heaviest label of the voxel, `None` for empty voxels.
    #[inline]
    pub fn label(&self) -> Option<Label> {
        self.data.as_ref().and_then(VoxelData::heaviest_label)
    }
}

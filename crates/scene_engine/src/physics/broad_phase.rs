//! Incremental three-axis sweep-and-prune
//!
//! Every collider contributes a START and an END bound on each axis. The
//! bounds stay sorted between frames; each update refreshes the tracked
//! coordinates and re-sorts with adjacent swaps only. Because objects move a
//! little per frame the sequence is nearly sorted and the pass is close to
//! linear.
//!
//! Overlap state per axis lives in a triangular bit matrix. Swapping a START
//! with an END of a different collider is exactly the moment their
//! projections start or stop overlapping, so that swap toggles the pair's
//! bit. A pair is a broad-phase hit when its bit is set on all three axes.

use crate::foundation::collections::TriangularBitset;
use crate::physics::primitives::{Aabb, Axis};

/// Which end of an interval a bound marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// Interval minimum
    Start,
    /// Interval maximum
    End,
}

/// One interval endpoint on one axis
#[derive(Debug, Clone, Copy)]
struct Bound {
    kind: BoundKind,
    collider: u32,
    value: f32,
}

impl Bound {
    /// Strict ordering by value; at equal values a START sorts before an
    /// END, so touching intervals count as overlapping.
    fn precedes(&self, other: &Self) -> bool {
        self.value < other.value
            || (self.value == other.value && self.kind == BoundKind::Start && other.kind == BoundKind::End)
    }
}

/// Work done by one incremental update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Adjacent swaps performed across all axes
    pub swaps: usize,
    /// Overlap bits toggled across all axes
    pub flips: usize,
}

impl std::ops::AddAssign for SweepStats {
    fn add_assign(&mut self, rhs: Self) {
        self.swaps += rhs.swaps;
        self.flips += rhs.flips;
    }
}

/// Sorted bounds and overlap matrix for a single axis
#[derive(Debug, Clone)]
struct AxisSweep {
    axis: Axis,
    bounds: Vec<Bound>,
    overlaps: TriangularBitset,
}

impl AxisSweep {
    fn build(axis: Axis, aabbs: &[Aabb]) -> Self {
        let mut bounds = Vec::with_capacity(aabbs.len() * 2);
        for (index, aabb) in aabbs.iter().enumerate() {
            let collider = index as u32;
            bounds.push(Bound { kind: BoundKind::Start, collider, value: aabb.min_on(axis) });
            bounds.push(Bound { kind: BoundKind::End, collider, value: aabb.max_on(axis) });
        }
        bounds.sort_by(|a, b| {
            a.value
                .total_cmp(&b.value)
                .then_with(|| (a.kind == BoundKind::End).cmp(&(b.kind == BoundKind::End)))
        });

        // Seed the matrix with one sweep; afterwards it only ever toggles.
        let mut overlaps = TriangularBitset::new(aabbs.len());
        let mut active: Vec<u32> = Vec::new();
        for bound in &bounds {
            match bound.kind {
                BoundKind::Start => {
                    for &other in &active {
                        overlaps.set(other as usize, bound.collider as usize, true);
                    }
                    active.push(bound.collider);
                }
                BoundKind::End => active.retain(|&other| other != bound.collider),
            }
        }

        Self { axis, bounds, overlaps }
    }

    fn refresh(&mut self, aabbs: &[Aabb]) {
        for bound in &mut self.bounds {
            let aabb = &aabbs[bound.collider as usize];
            bound.value = match bound.kind {
                BoundKind::Start => aabb.min_on(self.axis),
                BoundKind::End => aabb.max_on(self.axis),
            };
        }
    }

    /// Insertion sort using adjacent swaps only.
    ///
    /// A collider's own START never passes its END (min <= max and the sort
    /// is stable), so every START/END swap involves two different colliders.
    fn resort(&mut self) -> SweepStats {
        let mut stats = SweepStats::default();
        for i in 1..self.bounds.len() {
            let mut j = i;
            while j > 0 && self.bounds[j].precedes(&self.bounds[j - 1]) {
                let (left, right) = (self.bounds[j - 1], self.bounds[j]);
                if left.kind != right.kind && left.collider != right.collider {
                    self.overlaps.toggle(left.collider as usize, right.collider as usize);
                    stats.flips += 1;
                }
                self.bounds.swap(j - 1, j);
                stats.swaps += 1;
                j -= 1;
            }
        }
        stats
    }

    fn is_sorted(&self) -> bool {
        self.bounds.windows(2).all(|pair| !pair[1].precedes(&pair[0]))
    }
}

/// Three-axis incremental sweep-and-prune over a fixed collider set
///
/// Collider indices are positions in the slice given to [`SweepAndPrune::new`];
/// the same slice layout must be passed to every [`SweepAndPrune::update`].
/// Adding or removing colliders after construction is not supported; build
/// a new instance instead.
#[derive(Debug, Clone)]
pub struct SweepAndPrune {
    axes: [AxisSweep; 3],
    count: usize,
}

impl SweepAndPrune {
    /// Build the sorted bounds and overlap matrices for `aabbs`
    pub fn new(aabbs: &[Aabb]) -> Self {
        Self {
            axes: Axis::ALL.map(|axis| AxisSweep::build(axis, aabbs)),
            count: aabbs.len(),
        }
    }

    /// Number of colliders tracked
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no colliders are tracked
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Refresh tracked coordinates from `aabbs` and re-sort every axis
    pub fn update(&mut self, aabbs: &[Aabb]) -> SweepStats {
        if aabbs.len() != self.count {
            debug_assert!(false, "collider set changed after sweep-and-prune was built");
            log::error!(
                "Sweep-and-prune built for {} colliders, got {}; update skipped",
                self.count,
                aabbs.len()
            );
            return SweepStats::default();
        }

        let mut stats = SweepStats::default();
        for sweep in &mut self.axes {
            sweep.refresh(aabbs);
            let axis_stats = sweep.resort();
            log::trace!("{:?} axis: {} swaps, {} flips", sweep.axis, axis_stats.swaps, axis_stats.flips);
            stats += axis_stats;
        }
        stats
    }

    /// Pairs `(i, j)`, `i < j`, whose boxes overlap on all three axes
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let [x, y, z] = &self.axes;
        TriangularBitset::intersect3(&x.overlaps, &y.overlaps, &z.overlaps)
    }

    /// Whether colliders `i` and `j` currently overlap on every axis
    pub fn is_overlapping(&self, i: usize, j: usize) -> bool {
        i != j && self.axes.iter().all(|sweep| sweep.overlaps.get(i, j))
    }

    /// Overlap matrix for one axis
    pub fn axis_overlaps(&self, axis: Axis) -> &TriangularBitset {
        &self.axes[axis.index()].overlaps
    }

    /// Whether every axis is sorted (holds after every update)
    pub fn is_sorted(&self) -> bool {
        self.axes.iter().all(AxisSweep::is_sorted)
    }
}

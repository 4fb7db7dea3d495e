//! The "MERGE" Engine - Contiguity-Constrained Agglomerative Clustering
//!
//! Clusters live in an arena addressed by integer id. Ids `0..n` are the
//! initial singletons (stand indices of the [`GridIndex`]); each merge
//! appends a new record and retires both parents, so ids are never reused.
//!
//! Candidate pairs sit in a min-heap keyed by `(distance, low id, high id)`.
//! Entries touching a retired cluster are stale and skipped on pop
//! (lazy invalidation), which keeps each merge at O(degree * log E).

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, trace};

use crate::error::ClusterError;
use crate::features::FeatureVector;
use crate::grid::GridIndex;

// ============================================================================
// MERGE CANDIDATE (heap entry)
// ============================================================================

/// An adjacent cluster pair and the distance between their means.
///
/// Ordered by distance, then by the lower id, then by the higher id, so
/// exactly equidistant pairs always resolve the same way.
#[derive(Debug, Clone, Copy)]
struct MergeCandidate {
    distance: f64,
    low: usize,
    high: usize,
}

impl MergeCandidate {
    fn new(distance: f64, a: usize, b: usize) -> Self {
        Self {
            distance,
            low: a.min(b),
            high: a.max(b),
        }
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.low.cmp(&other.low))
            .then(self.high.cmp(&other.high))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MergeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCandidate {}

// ============================================================================
// MERGE EVENT
// ============================================================================

/// One reduction step: clusters `left` and `right` became `merged`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// 0-based merge step
    pub step: usize,
    /// Lower id of the merged pair
    pub left: usize,
    /// Higher id of the merged pair
    pub right: usize,
    /// Id assigned to the new cluster
    pub merged: usize,
    /// Distance between the parents' mean feature vectors
    pub distance: f64,
    /// Member count of the new cluster
    pub size: usize,
}

// ============================================================================
// CLUSTER RECORD
// ============================================================================

#[derive(Debug, Clone)]
struct ClusterRecord {
    /// Stand indices of the members
    members: Vec<usize>,
    /// Running mean feature vector
    mean: FeatureVector,
    /// Ids of adjacent live clusters
    neighbors: HashSet<usize>,
    alive: bool,
}

// ============================================================================
// MERGE ENGINE
// ============================================================================

/// Greedy minimum-distance merging over adjacent clusters.
#[derive(Debug)]
pub struct MergeEngine {
    records: Vec<ClusterRecord>,
    heap: BinaryHeap<Reverse<MergeCandidate>>,
    live: usize,
    history: Vec<MergeEvent>,
    stale_skipped: usize,
}

impl MergeEngine {
    /// Seed one singleton cluster per stand.
    ///
    /// `features[i]` must be the vector of stand `i` of `index`.
    pub fn new(index: &GridIndex, features: Vec<FeatureVector>) -> Self {
        debug_assert_eq!(index.len(), features.len());

        let records: Vec<ClusterRecord> = features
            .into_iter()
            .enumerate()
            .map(|(i, mean)| ClusterRecord {
                members: vec![i],
                mean,
                neighbors: index.neighbor_indices(i).iter().copied().collect(),
                alive: true,
            })
            .collect();

        let mut heap = BinaryHeap::with_capacity(index.edge_count());
        for (a, record) in records.iter().enumerate() {
            for &b in index.neighbor_indices(a) {
                if a < b {
                    let distance = record.mean.distance(&records[b].mean);
                    heap.push(Reverse(MergeCandidate::new(distance, a, b)));
                }
            }
        }

        let live = records.len();
        Self {
            records,
            heap,
            live,
            history: Vec::new(),
            stale_skipped: 0,
        }
    }

    /// Number of clusters currently alive.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Merges performed so far.
    pub fn history(&self) -> &[MergeEvent] {
        &self.history
    }

    /// Heap entries discarded because a side had already been merged.
    pub fn stale_skipped(&self) -> usize {
        self.stale_skipped
    }

    /// Perform the next merge. Returns `None` when no adjacent pair remains.
    pub fn step(&mut self) -> Option<MergeEvent> {
        let candidate = loop {
            let Reverse(candidate) = self.heap.pop()?;
            if self.records[candidate.low].alive && self.records[candidate.high].alive {
                break candidate;
            }
            self.stale_skipped += 1;
        };

        let event = self.merge(candidate);
        trace!(
            "merge #{}: {} + {} -> {} (d={:.6}, size={})",
            event.step,
            event.left,
            event.right,
            event.merged,
            event.distance,
            event.size
        );
        self.history.push(event.clone());
        Some(event)
    }

    /// Merge until `target` clusters remain.
    ///
    /// Fails with `UnreachableTarget` if the adjacent pairs run out first.
    pub fn run_to(&mut self, target: usize) -> Result<(), ClusterError> {
        while self.live > target {
            if self.step().is_none() {
                return Err(ClusterError::UnreachableTarget {
                    requested: target,
                    reachable: self.live,
                });
            }
        }
        debug!(
            "Reached {} clusters after {} merges ({} stale candidates skipped)",
            self.live,
            self.history.len(),
            self.stale_skipped
        );
        Ok(())
    }

    fn merge(&mut self, candidate: MergeCandidate) -> MergeEvent {
        let MergeCandidate { distance, low, high } = candidate;
        let merged = self.records.len();

        let mut left = std::mem::take(&mut self.records[low].members);
        let mut right = std::mem::take(&mut self.records[high].members);
        if left.len() < right.len() {
            std::mem::swap(&mut left, &mut right);
        }
        left.append(&mut right);
        let members = left;

        let mean = self.records[low].mean.merged(&self.records[high].mean);

        let mut neighbors = std::mem::take(&mut self.records[low].neighbors);
        neighbors.extend(std::mem::take(&mut self.records[high].neighbors));
        neighbors.remove(&low);
        neighbors.remove(&high);

        self.records[low].alive = false;
        self.records[high].alive = false;

        for &other in &neighbors {
            let record = &mut self.records[other];
            record.neighbors.remove(&low);
            record.neighbors.remove(&high);
            record.neighbors.insert(merged);

            let distance = record.mean.distance(&mean);
            self.heap
                .push(Reverse(MergeCandidate::new(distance, other, merged)));
        }

        let size = members.len();
        self.records.push(ClusterRecord {
            members,
            mean,
            neighbors,
            alive: true,
        });
        self.live -= 1;

        MergeEvent {
            step: self.history.len(),
            left: low,
            right: high,
            merged,
            distance,
            size,
        }
    }

    /// Member stand indices of every live cluster, in ascending id order.
    pub fn live_clusters(&self) -> impl Iterator<Item = &[usize]> {
        self.records
            .iter()
            .filter(|r| r.alive)
            .map(|r| r.members.as_slice())
    }

    /// Consume the engine, returning live member lists and the merge history.
    pub fn into_parts(self) -> (Vec<Vec<usize>>, Vec<MergeEvent>) {
        let clusters = self
            .records
            .into_iter()
            .filter(|r| r.alive)
            .map(|r| r.members)
            .collect();
        (clusters, self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::StandGrid;

    /// A 1-row strip whose features are just the given scalars.
    fn strip(values: &[f64]) -> (GridIndex, Vec<FeatureVector>) {
        let mut grid = StandGrid::new(values.len() as u32, 1);
        for c in 0..values.len() {
            grid.insert((c as i32, 0).into(), "foo", values[c]);
        }
        let features = values
            .iter()
            .map(|&v| FeatureVector::from_components(&[Some(v)]))
            .collect();
        (GridIndex::build(&grid), features)
    }

    #[test]
    fn test_candidate_ordering() {
        let a = MergeCandidate::new(1.0, 3, 1);
        let b = MergeCandidate::new(1.0, 2, 0);
        let c = MergeCandidate::new(0.5, 9, 8);

        assert_eq!((a.low, a.high), (1, 3));
        assert!(c < b);
        assert!(b < a);

        let mut heap: BinaryHeap<Reverse<MergeCandidate>> =
            [a, b, c].into_iter().map(Reverse).collect();
        assert_eq!(heap.pop().map(|Reverse(x)| x.low), Some(8));
        assert_eq!(heap.pop().map(|Reverse(x)| x.low), Some(0));
    }

    #[test]
    fn test_merges_closest_adjacent_pair() {
        let (index, features) = strip(&[0.0, 5.0, 5.5, 9.0]);
        let mut engine = MergeEngine::new(&index, features);

        let event = engine.step().unwrap();
        assert_eq!((event.left, event.right, event.merged), (1, 2, 4));
        assert_eq!(event.size, 2);
        assert_eq!(engine.live_count(), 3);
    }

    #[test]
    fn test_merged_mean_drives_next_distance() {
        // after {1,2} -> mean 5.25, stand 3 (9.0) is 3.75 away, stand 0 is 5.25 away
        let (index, features) = strip(&[0.0, 5.0, 5.5, 9.0]);
        let mut engine = MergeEngine::new(&index, features);
        engine.step();

        let event = engine.step().unwrap();
        assert_eq!((event.left, event.right), (3, 4));
        assert!((event.distance - 3.75).abs() < 1e-12);
    }

    #[test]
    fn test_equidistant_pairs_use_lowest_ids() {
        let (index, features) = strip(&[1.0, 1.0, 1.0, 1.0]);
        let mut engine = MergeEngine::new(&index, features);

        let first = engine.step().unwrap();
        assert_eq!((first.left, first.right), (0, 1));
        let second = engine.step().unwrap();
        assert_eq!((second.left, second.right), (2, 3));
    }

    #[test]
    fn test_never_merges_non_adjacent() {
        let mut grid = StandGrid::new(3, 1);
        grid.insert((0, 0).into(), "foo", 1.0);
        grid.insert((2, 0).into(), "foo", 1.0);
        let index = GridIndex::build(&grid);
        let features = vec![
            FeatureVector::from_components(&[Some(1.0)]),
            FeatureVector::from_components(&[Some(1.0)]),
        ];
        let mut engine = MergeEngine::new(&index, features);

        assert!(engine.step().is_none());
        assert_eq!(
            engine.run_to(1),
            Err(ClusterError::UnreachableTarget { requested: 1, reachable: 2 })
        );
    }

    #[test]
    fn test_run_to_target_keeps_every_stand() {
        let (index, features) = strip(&[0.3, 0.1, 0.7, 0.2, 0.9, 0.4]);
        let mut engine = MergeEngine::new(&index, features);
        engine.run_to(2).unwrap();

        assert_eq!(engine.live_count(), 2);
        assert_eq!(engine.history().len(), 4);

        let mut all: Vec<usize> = engine.live_clusters().flatten().copied().collect();
        all.sort();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);

        let (clusters, history) = engine.into_parts();
        assert_eq!(clusters.len(), 2);
        assert_eq!(history.last().unwrap().step, 3);
    }

    #[test]
    fn test_stale_entries_are_skipped() {
        let (index, features) = strip(&[0.0, 0.1, 0.2, 5.0]);
        let mut engine = MergeEngine::new(&index, features);
        engine.run_to(1).unwrap();

        assert_eq!(engine.live_count(), 1);
        assert!(engine.stale_skipped() > 0);
    }
}

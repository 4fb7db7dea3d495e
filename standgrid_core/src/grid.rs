//! The "GRID" layer - Sparse Stand Table + 4-Neighbour Adjacency
//!
//! Stands are addressed by integer (column, row) pairs. Only coordinates
//! that appear in the input exist; absent cells are never materialized.
//! The adjacency relation derived here is fixed for the lifetime of a run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

/// Raw condition scores of a single stand, keyed by condition name.
pub type ConditionScores = BTreeMap<String, f64>;

/// Nested column -> row -> condition -> score layout used by callers.
pub type NestedScores = BTreeMap<i32, BTreeMap<i32, ConditionScores>>;

// ============================================================================
// STAND COORDINATE
// ============================================================================

/// Integer grid coordinate of a stand.
///
/// Ordering is column-major: by column, then by row. Every deterministic
/// ordering in the crate (initial cluster ids, member lists) follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StandCoord {
    pub column: i32,
    pub row: i32,
}

impl StandCoord {
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// The axis-aligned neighbour positions, in ascending coordinate order.
    ///
    /// Positions that would fall outside the `i32` range are omitted.
    pub fn neighbor_positions(&self) -> impl Iterator<Item = StandCoord> {
        let (column, row) = (self.column, self.row);
        [
            column.checked_sub(1).map(|c| StandCoord::new(c, row)),
            row.checked_sub(1).map(|r| StandCoord::new(column, r)),
            row.checked_add(1).map(|r| StandCoord::new(column, r)),
            column.checked_add(1).map(|c| StandCoord::new(c, row)),
        ]
        .into_iter()
        .flatten()
    }

    /// True if the two coordinates differ by one unit along exactly one axis.
    pub fn touches(&self, other: &StandCoord) -> bool {
        let dc = (self.column as i64 - other.column as i64).abs();
        let dr = (self.row as i64 - other.row as i64).abs();
        dc + dr == 1
    }
}

impl From<(i32, i32)> for StandCoord {
    fn from((column, row): (i32, i32)) -> Self {
        Self::new(column, row)
    }
}

impl fmt::Display for StandCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

// ============================================================================
// STAND GRID (sparse input table)
// ============================================================================

/// Sparse table of present stands and their raw condition scores.
///
/// `width` and `height` are informational bounds only; presence in the
/// table is what makes a stand part of the clustering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandGrid {
    pub width: u32,
    pub height: u32,
    stands: BTreeMap<StandCoord, ConditionScores>,
}

impl StandGrid {
    /// Create an empty grid with the given informational bounds.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stands: BTreeMap::new(),
        }
    }

    /// Build a grid from the nested column -> row -> condition layout.
    pub fn from_nested(width: u32, height: u32, nested: &NestedScores) -> Self {
        let mut grid = Self::new(width, height);
        for (&column, rows) in nested {
            for (&row, scores) in rows {
                grid.insert_stand(StandCoord::new(column, row), scores.clone());
            }
        }
        grid
    }

    /// Record one condition score, creating the stand if needed.
    pub fn insert(&mut self, coord: StandCoord, condition: impl Into<String>, score: f64) {
        self.stands
            .entry(coord)
            .or_default()
            .insert(condition.into(), score);
    }

    /// Add or replace a whole stand. A stand with no scores is still present.
    pub fn insert_stand(&mut self, coord: StandCoord, scores: ConditionScores) {
        self.stands.insert(coord, scores);
    }

    pub fn len(&self) -> usize {
        self.stands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stands.is_empty()
    }

    pub fn contains(&self, coord: &StandCoord) -> bool {
        self.stands.contains_key(coord)
    }

    pub fn scores(&self, coord: &StandCoord) -> Option<&ConditionScores> {
        self.stands.get(coord)
    }

    /// Present coordinates in ascending (column, row) order.
    pub fn coords(&self) -> impl Iterator<Item = StandCoord> + '_ {
        self.stands.keys().copied()
    }

    /// Stands with their scores in ascending (column, row) order.
    pub fn iter(&self) -> impl Iterator<Item = (StandCoord, &ConditionScores)> {
        self.stands.iter().map(|(c, s)| (*c, s))
    }

    /// Every condition name reported by at least one stand.
    pub fn condition_names(&self) -> BTreeSet<&str> {
        self.stands
            .values()
            .flat_map(|scores| scores.keys().map(String::as_str))
            .collect()
    }

    /// Multiply every raw score by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut grid = self.clone();
        for scores in grid.stands.values_mut() {
            for value in scores.values_mut() {
                *value *= factor;
            }
        }
        grid
    }
}

// ============================================================================
// GRID INDEX (adjacency)
// ============================================================================

/// Fixed 4-neighbour adjacency over the present stands.
///
/// Stands are numbered `0..len()` in ascending coordinate order; these
/// indices seed the initial cluster ids of the merge engine.
#[derive(Debug, Clone)]
pub struct GridIndex {
    coords: Vec<StandCoord>,
    lookup: HashMap<StandCoord, usize>,
    neighbors: Vec<Vec<usize>>,
}

impl GridIndex {
    /// Build the adjacency relation for every stand present in `grid`.
    pub fn build(grid: &StandGrid) -> Self {
        let coords: Vec<StandCoord> = grid.coords().collect();
        let lookup: HashMap<StandCoord, usize> =
            coords.iter().enumerate().map(|(i, c)| (*c, i)).collect();

        // neighbor_positions() is already in ascending order, so each list is sorted
        let neighbors = coords
            .iter()
            .map(|coord| {
                coord
                    .neighbor_positions()
                    .filter_map(|n| lookup.get(&n).copied())
                    .collect()
            })
            .collect();

        Self {
            coords,
            lookup,
            neighbors,
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn contains(&self, coord: &StandCoord) -> bool {
        self.lookup.contains_key(coord)
    }

    /// Coordinate of the stand with index `index`.
    pub fn coord(&self, index: usize) -> StandCoord {
        self.coords[index]
    }

    pub fn coords(&self) -> &[StandCoord] {
        &self.coords
    }

    pub fn index_of(&self, coord: &StandCoord) -> Option<usize> {
        self.lookup.get(coord).copied()
    }

    /// True iff both stands are present and they are 4-neighbours.
    pub fn is_adjacent(&self, a: &StandCoord, b: &StandCoord) -> bool {
        self.contains(a) && self.contains(b) && a.touches(b)
    }

    /// Present neighbours of `coord` (empty if `coord` itself is absent).
    pub fn neighbors(&self, coord: &StandCoord) -> impl Iterator<Item = StandCoord> + '_ {
        self.index_of(coord)
            .map(|i| self.neighbors[i].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&j| self.coords[j])
    }

    /// Indices of the present neighbours of stand `index`, ascending.
    pub fn neighbor_indices(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    /// Total number of undirected adjacency edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Connected components of the adjacency graph.
    ///
    /// Each component is sorted; components are ordered by their minimal
    /// coordinate.
    pub fn components(&self) -> Vec<Vec<StandCoord>> {
        let mut visited = vec![false; self.len()];
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..self.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);

            let mut component = Vec::new();
            while let Some(current) = queue.pop_front() {
                component.push(self.coords[current]);
                for &next in &self.neighbors[current] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }

        components
    }

    /// Number of connected components; the smallest reachable cluster count.
    pub fn component_count(&self) -> usize {
        self.components().len()
    }
}

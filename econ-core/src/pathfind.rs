//! C4 — A* path finder over the tile grid, discounted on road cells.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::grid::TileGrid;
use crate::roads::RoadSet;
use crate::types::GridCoord;

/// Neighbor visiting order fixed as {up, down, left, right} so ties resolve
/// identically across runs.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    f_score: f64,
    /// Monotonically increasing insertion index; smaller wins ties on `f_score`.
    seq: u64,
    coord: GridCoord,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the lowest f_score (and, among
        // ties, the lowest seq) to come out first, so both comparisons invert.
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(a: GridCoord, b: GridCoord) -> f64 {
    ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as f64
}

fn movement_cost(neighbor: GridCoord, road_set: &RoadSet, cost_on: f64, cost_off: f64) -> f64 {
    if road_set.contains(&neighbor) {
        cost_on
    } else {
        cost_off
    }
}

/// Returns the path from `start` to `end` inclusive, or `None` if unreachable.
pub fn find_path(
    grid: &TileGrid,
    road_set: &RoadSet,
    start: GridCoord,
    end: GridCoord,
    cost_on: f64,
    cost_off: f64,
) -> Option<Vec<GridCoord>> {
    if start == end {
        return Some(vec![start]);
    }
    if !grid.is_passable(start.0, start.1) || !grid.is_passable(end.0, end.1) {
        return None;
    }

    let mut open = BinaryHeap::new();
    let mut seq_counter: u64 = 0;
    let mut g_score: HashMap<GridCoord, f64> = HashMap::new();
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();

    g_score.insert(start, 0.0);
    open.push(HeapEntry {
        f_score: heuristic(start, end),
        seq: seq_counter,
        coord: start,
    });

    let mut closed: HashMap<GridCoord, bool> = HashMap::new();

    while let Some(HeapEntry { coord: current, .. }) = open.pop() {
        if current == end {
            return Some(reconstruct(&came_from, current));
        }
        if closed.get(&current).copied().unwrap_or(false) {
            continue;
        }
        closed.insert(current, true);

        let current_g = g_score[&current];
        for &(dx, dz) in &NEIGHBOR_OFFSETS {
            let neighbor = (current.0 + dx, current.1 + dz);
            if !grid.is_passable(neighbor.0, neighbor.1) {
                continue;
            }
            let tentative_g =
                current_g + movement_cost(neighbor, road_set, cost_on, cost_off);
            if tentative_g < *g_score.get(&neighbor).unwrap_or(&f64::INFINITY) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                seq_counter += 1;
                open.push(HeapEntry {
                    f_score: tentative_g + heuristic(neighbor, end),
                    seq: seq_counter,
                    coord: neighbor,
                });
            }
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<GridCoord, GridCoord>, mut current: GridCoord) -> Vec<GridCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

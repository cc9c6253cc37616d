//! C3 — Road Index: the set of grid cells a route's curve passes through.
//!
//! Recomputed whenever routes change and cached by the engine during
//! `initialize()` and on reload.

use std::collections::HashSet;

use crate::external::Curve;
use crate::grid::TileGrid;
use crate::types::GridCoord;

pub type RoadSet = HashSet<GridCoord>;

/// Samples each curve at `sample_count` equally spaced `t` values, snaps each
/// sample to a grid cell via `grid`, and unions every in-bounds cell.
pub fn compute(curves: &[Box<dyn Curve>], grid: &TileGrid, sample_count: u32) -> RoadSet {
    let mut roads = RoadSet::new();
    let denom = (sample_count - 1).max(1) as f64;
    for curve in curves {
        for i in 0..sample_count {
            let t = i as f64 / denom;
            let (x, _y, z) = curve.point_at(t);
            let (gx, gz) = grid.world_to_grid(x, z);
            if grid.tile_at(gx, gz).is_some() {
                roads.insert((gx, gz));
            }
        }
    }
    roads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{MapConfig, Tile};

    struct StraightLine {
        len: f64,
    }

    impl Curve for StraightLine {
        fn point_at(&self, t: f64) -> (f64, f64, f64) {
            (t * self.len, 0.0, 0.0)
        }
    }

    fn grid_10() -> TileGrid {
        let config = MapConfig {
            map_size: 10,
            tile_size: 1.0,
            tile_height: 0.0,
        };
        let mut tiles = Vec::new();
        for gx in 0..10 {
            for gz in 0..10 {
                tiles.push(Tile {
                    grid_x: gx,
                    grid_z: gz,
                    tile_type_index: 3,
                    world_x: gx as f64,
                    world_y: 0.0,
                    world_z: gz as f64,
                });
            }
        }
        TileGrid::new(config, tiles)
    }

    #[test]
    fn straight_route_covers_its_span() {
        let grid = grid_10();
        let curves: Vec<Box<dyn Curve>> = vec![Box::new(StraightLine { len: 4.0 })];
        let roads = compute(&curves, &grid, 101);
        assert!(roads.contains(&grid.world_to_grid(0.0, 0.0)));
        assert!(roads.contains(&grid.world_to_grid(4.0, 0.0)));
        assert!(!roads.contains(&grid.world_to_grid(8.0, 0.0)));
    }

    #[test]
    fn is_idempotent_over_unchanged_routes() {
        let grid = grid_10();
        let curves: Vec<Box<dyn Curve>> = vec![Box::new(StraightLine { len: 3.0 })];
        let first = compute(&curves, &grid, 101);
        let second = compute(&curves, &grid, 101);
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_bounds_samples_are_dropped() {
        let grid = grid_10();
        let curves: Vec<Box<dyn Curve>> = vec![Box::new(StraightLine { len: 1000.0 })];
        let roads = compute(&curves, &grid, 11);
        for (gx, gz) in &roads {
            assert!(grid.tile_at(*gx, *gz).is_some());
        }
    }
}

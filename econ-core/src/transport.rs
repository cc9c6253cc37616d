//! C8 — Transport Layer: active traders advancing along cached A* paths.

use serde::{Deserialize, Serialize};

use crate::roads::RoadSet;
use crate::types::{ContractId, GridCoord, ObjectId, ProductId, Quantity, TraderId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    pub id: TraderId,
    pub contract_id: ContractId,
    pub source_object_id: ObjectId,
    pub destination_object_id: ObjectId,
    pub product_id: ProductId,
    pub amount: Quantity,
    pub path: Vec<GridCoord>,
    pub path_index: usize,
    pub progress: f64,
    pub speed: f64,
}

impl Trader {
    /// Advances one tick; returns `true` once it has reached the end of its
    /// path and should be delivered and removed.
    pub fn advance(&mut self) -> bool {
        if self.path.len() <= 1 {
            return true;
        }
        self.progress += self.speed;
        while self.progress >= 1.0 && self.path_index < self.path.len() - 1 {
            self.progress -= 1.0;
            self.path_index += 1;
        }
        self.path_index >= self.path.len() - 1
    }

    /// Linear interpolation between the current and next grid cell, in
    /// grid-world space, for smooth rendering between ticks.
    pub fn world_position(&self, grid_to_world: impl Fn(GridCoord) -> (f64, f64)) -> (f64, f64) {
        let current = self.path[self.path_index];
        if self.path_index + 1 >= self.path.len() {
            return grid_to_world(current);
        }
        let next = self.path[self.path_index + 1];
        let (cx, cz) = grid_to_world(current);
        let (nx, nz) = grid_to_world(next);
        let t = self.progress.clamp(0.0, 1.0);
        (cx + (nx - cx) * t, cz + (nz - cz) * t)
    }
}

/// Total road-discounted weight of a path: `Σ_tile (cost_on if road else cost_off)`,
/// summed over the tiles entered (every tile but the first).
fn path_weight(path: &[GridCoord], road_set: &RoadSet, cost_on: f64, cost_off: f64) -> f64 {
    path.iter()
        .skip(1)
        .map(|tile| if road_set.contains(tile) { cost_on } else { cost_off })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathMetrics {
    pub route_length: usize,
    pub transport_cost: f64,
    pub fuel_cost: f64,
}

pub fn path_metrics(
    path: &[GridCoord],
    road_set: &RoadSet,
    transport_cost_on: f64,
    transport_cost_off: f64,
    fuel_cost_on: f64,
    fuel_cost_off: f64,
) -> PathMetrics {
    PathMetrics {
        route_length: path.len(),
        transport_cost: path_weight(path, road_set, transport_cost_on, transport_cost_off),
        fuel_cost: path_weight(path, road_set, fuel_cost_on, fuel_cost_off),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_grid(c: GridCoord) -> (f64, f64) {
        (c.0 as f64, c.1 as f64)
    }

    #[test]
    fn advance_steps_through_path_at_given_speed() {
        let mut trader = Trader {
            id: 1,
            contract_id: 1,
            source_object_id: 1,
            destination_object_id: 2,
            product_id: 0,
            amount: 1.0,
            path: vec![(0, 0), (1, 0), (2, 0)],
            path_index: 0,
            progress: 0.0,
            speed: 1.0,
        };
        assert!(!trader.advance());
        assert_eq!(trader.path_index, 1);
        assert!(trader.advance());
        assert_eq!(trader.path_index, 2);
    }

    #[test]
    fn world_position_interpolates_between_segments() {
        let trader = Trader {
            id: 1,
            contract_id: 1,
            source_object_id: 1,
            destination_object_id: 2,
            product_id: 0,
            amount: 1.0,
            path: vec![(0, 0), (2, 0)],
            path_index: 0,
            progress: 0.5,
            speed: 1.0,
        };
        assert_eq!(trader.world_position(identity_grid), (1.0, 0.0));
    }

    #[test]
    fn road_discount_lowers_transport_cost() {
        let path = vec![(0, 0), (1, 0), (2, 0)];
        let mut roads = RoadSet::new();
        roads.insert((1, 0));
        roads.insert((2, 0));
        let metrics = path_metrics(&path, &roads, 0.3, 1.0, 0.03, 0.1);
        assert_eq!(metrics.transport_cost, 0.6);
        assert_eq!(metrics.fuel_cost, 0.06);

        let off_road_metrics = path_metrics(&path, &RoadSet::new(), 0.3, 1.0, 0.03, 0.1);
        assert!(metrics.transport_cost < off_road_metrics.transport_cost);
    }
}

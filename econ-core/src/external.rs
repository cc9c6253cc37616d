//! Interfaces collaborators (the host game's object/route/tile stores)
//! implement so the engine can read the map without owning it (§6).

use crate::grid::MapConfig;
use crate::types::{ObjectId, ProductId};

/// What kind of actor a placed map object should become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Warehouse,
    Producer(ProductId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: ObjectPosition,
}

/// Iterable collection of placed map objects, owned by the host.
pub trait ObjectSource {
    fn objects(&self) -> Vec<PlacedObject>;
}

/// A parametric curve over `t in [0,1]`, as the host's route geometry exposes it.
pub trait Curve {
    fn point_at(&self, t: f64) -> (f64, f64, f64);
}

/// Iterable collection of routes, each backed by a curve.
pub trait RouteSource {
    fn routes(&self) -> Vec<Box<dyn Curve>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRecord {
    pub grid_x: i32,
    pub grid_z: i32,
    pub tile_type_index: i32,
}

/// Supplies raw tile records plus the map's sizing, from which a `TileGrid`
/// can be built with world positions derived via the centered-origin formula.
pub trait TileSource {
    fn tiles(&self) -> Vec<TileRecord>;
    fn map_config(&self) -> MapConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StraightLine;
    impl Curve for StraightLine {
        fn point_at(&self, t: f64) -> (f64, f64, f64) {
            (t * 10.0, 0.0, 0.0)
        }
    }

    #[test]
    fn curve_trait_object_is_usable() {
        let curves: Vec<Box<dyn Curve>> = vec![Box::new(StraightLine)];
        assert_eq!(curves[0].point_at(0.5), (5.0, 0.0, 0.0));
    }
}

//! C2 — Tile Grid: static passability and world<->grid transforms.
//!
//! Immutable once built; rebuilt only by `Engine::initialize`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::GridCoord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub grid_x: i32,
    pub grid_z: i32,
    pub tile_type_index: i32,
    pub world_x: f64,
    pub world_y: f64,
    pub world_z: f64,
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.tile_type_index >= 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub map_size: u32,
    pub tile_size: f64,
    pub tile_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    config: MapConfig,
    #[serde(serialize_with = "serialize_tiles", deserialize_with = "deserialize_tiles")]
    tiles: HashMap<GridCoord, Tile>,
}

fn serialize_tiles<S: serde::Serializer>(
    tiles: &HashMap<GridCoord, Tile>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = s.serialize_seq(Some(tiles.len()))?;
    for tile in tiles.values() {
        seq.serialize_element(tile)?;
    }
    seq.end()
}

fn deserialize_tiles<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> std::result::Result<HashMap<GridCoord, Tile>, D::Error> {
    let tiles: Vec<Tile> = Vec::deserialize(d)?;
    Ok(tiles
        .into_iter()
        .map(|t| ((t.grid_x, t.grid_z), t))
        .collect())
}

impl TileGrid {
    pub fn new(config: MapConfig, tiles: Vec<Tile>) -> Self {
        let tiles = tiles.into_iter().map(|t| ((t.grid_x, t.grid_z), t)).collect();
        Self { config, tiles }
    }

    pub fn config(&self) -> MapConfig {
        self.config
    }

    pub fn tile_at(&self, gx: i32, gz: i32) -> Option<&Tile> {
        if gx < 0 || gz < 0 || gx as u32 >= self.config.map_size || gz as u32 >= self.config.map_size {
            return None;
        }
        self.tiles.get(&(gx, gz))
    }

    pub fn is_passable(&self, gx: i32, gz: i32) -> bool {
        self.tile_at(gx, gz).is_some_and(Tile::is_passable)
    }

    pub fn tile_top(&self, x: f64, z: f64) -> Option<f64> {
        let (gx, gz) = self.world_to_grid(x, z);
        self.tile_at(gx, gz).map(|t| t.world_y)
    }

    fn offset(&self) -> f64 {
        self.config.map_size as f64 * self.config.tile_size / 2.0 - self.config.tile_size / 2.0
    }

    pub fn world_to_grid(&self, x: f64, z: f64) -> GridCoord {
        let offset = self.offset();
        let gx = ((x + offset) / self.config.tile_size).round() as i32;
        let gz = ((z + offset) / self.config.tile_size).round() as i32;
        (gx, gz)
    }

    pub fn grid_to_world(&self, gx: i32, gz: i32) -> (f64, f64) {
        let offset = self.offset();
        let x = gx as f64 * self.config.tile_size - offset;
        let z = gz as f64 * self.config.tile_size - offset;
        (x, z)
    }
}

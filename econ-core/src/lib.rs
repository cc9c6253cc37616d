//! Economic simulation core for a tile-based strategy game.
//!
//! A deterministic, fixed-tick engine driving a network of production actors
//! (factories, warehouses) connected by a road-augmented transport grid. Each
//! tick runs production, discovers and maintains point-to-point supply
//! contracts, dispatches transporters along cached A* paths, and adjusts
//! per-actor prices based on storage pressure.
//!
//! ## Components
//!
//! - `economy`    C1 — DAG of products with input recipes
//! - `grid`       C2 — static passability grid, world<->grid transforms
//! - `roads`      C3 — grid cells covered by route curves
//! - `pathfind`   C4 — A* over the grid, road-discounted movement cost
//! - `actor`      C5 — per-object storage, recipe, prices, production state
//! - `pricing`    C6 — integer producer prices, continuous warehouse prices
//! - `contracts`  C7 — discovery, maintenance, replacement, per-actor quotas
//! - `transport`  C8 — traders advancing along cached paths, fuel debits
//! - `engine`     C9 — tick phases, path cache, the public `Engine` surface
//!
//! `save` holds the versioned JSON formats (§6); `external` holds the traits
//! a host game implements to feed the engine map data without it owning that
//! data. `config` centralizes every tunable the design calls out as a
//! parameter; `error` is the `Error` enum surfaced at the save/load and
//! graph-edit boundaries.
//!
//! Everything inside a tick is synchronous and single-threaded: `tick()` runs
//! phases in strict order (production, trade evaluation, transport, pricing)
//! over actors and contracts iterated in a fixed order, so replaying the same
//! inputs always reaches the same state.

pub mod actor;
pub mod config;
pub mod contracts;
pub mod economy;
pub mod engine;
pub mod error;
pub mod external;
pub mod grid;
pub mod pathfind;
pub mod pricing;
pub mod roads;
pub mod save;
pub mod transport;
pub mod types;

#[cfg(feature = "instrument")]
pub use instrument;

pub mod wasm;

pub use actor::{ActorKind, ActorState, IdealBand, ProductionStatus, StorageSlot};
pub use config::EngineConfig;
pub use contracts::{Candidate, Contract, ContractBook};
pub use economy::{EconomyGraph, Product, RecipeInput};
pub use engine::Engine;
pub use error::{Error, Result};
pub use external::{Curve, ObjectKind, ObjectPosition, ObjectSource, PlacedObject, RouteSource, TileRecord, TileSource};
pub use grid::{MapConfig, Tile, TileGrid};
pub use roads::RoadSet;
pub use transport::{PathMetrics, Trader};
pub use types::{ContractId, GridCoord, ObjectId, ProducerPrice, ProductId, Quantity, RouteId, TraderId, WarehousePrice};

//! WASM boundary: flattened snapshot DTOs and a thin `wasm_bindgen` wrapper
//! around [`Engine`], so a host game's renderer/UI (§6 external collaborators)
//! can drive the simulation without linking against Rust directly.
//!
//! The engine's own types (`HashMap`-keyed storage, trait objects for the
//! consumer interfaces) aren't `wasm_bindgen`-friendly, so everything here is
//! a plain, `Tsify`-derived copy produced on demand from engine state. The
//! engine itself never depends on this module.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use crate::economy::EconomyGraph;
use crate::engine::Engine;
use crate::external::{Curve, ObjectKind, ObjectPosition, ObjectSource, PlacedObject, RouteSource, TileRecord, TileSource};
use crate::grid::MapConfig;
use crate::types::{ContractId, GridCoord, ObjectId, ProducerPrice, ProductId, TraderId};

/// Call once from JS before touching the engine, for readable panic messages.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ObjectDto {
    pub id: ObjectId,
    /// `"WAREHOUSE"` or `"PRODUCT_<n>"`, matching the host's `type` string (§6).
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
pub struct CurveDto {
    /// Sampled points already materialized by the host; the engine
    /// interpolates linearly between them for `point_at`.
    pub points: Vec<(f64, f64, f64)>,
}

struct SampledCurve(Vec<(f64, f64, f64)>);

impl Curve for SampledCurve {
    fn point_at(&self, t: f64) -> (f64, f64, f64) {
        if self.0.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        if self.0.len() == 1 {
            return self.0[0];
        }
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (self.0.len() - 1) as f64;
        let idx = scaled.floor() as usize;
        let frac = scaled - idx as f64;
        let a = self.0[idx.min(self.0.len() - 1)];
        let b = self.0[(idx + 1).min(self.0.len() - 1)];
        (
            a.0 + (b.0 - a.0) * frac,
            a.1 + (b.1 - a.1) * frac,
            a.2 + (b.2 - a.2) * frac,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
pub struct TileDto {
    #[serde(rename = "gridX")]
    pub grid_x: i32,
    #[serde(rename = "gridZ")]
    pub grid_z: i32,
    #[serde(rename = "tileTypeIndex")]
    pub tile_type_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
pub struct WorldInitDto {
    pub objects: Vec<ObjectDto>,
    pub routes: Vec<CurveDto>,
    pub tiles: Vec<TileDto>,
    #[serde(rename = "mapConfig")]
    pub map_config: MapConfig,
}

struct VecObjects(Vec<PlacedObject>);
impl ObjectSource for VecObjects {
    fn objects(&self) -> Vec<PlacedObject> {
        self.0.clone()
    }
}

struct VecRoutes(Vec<CurveDto>);
impl RouteSource for VecRoutes {
    fn routes(&self) -> Vec<Box<dyn Curve>> {
        self.0
            .iter()
            .map(|c| Box::new(SampledCurve(c.points.clone())) as Box<dyn Curve>)
            .collect()
    }
}

struct VecTiles {
    records: Vec<TileRecord>,
    config: MapConfig,
}
impl TileSource for VecTiles {
    fn tiles(&self) -> Vec<TileRecord> {
        self.records.clone()
    }
    fn map_config(&self) -> MapConfig {
        self.config
    }
}

fn parse_object_kind(type_str: &str) -> Option<ObjectKind> {
    if type_str == "WAREHOUSE" {
        return Some(ObjectKind::Warehouse);
    }
    type_str
        .strip_prefix("PRODUCT_")
        .and_then(|n| n.parse::<ProductId>().ok())
        .map(ObjectKind::Producer)
}

/// Flat view of [`crate::actor::ActorState`] for JS consumption — storage
/// maps become sorted `(product_id, value)` vectors so the shape is stable.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ActorSnapshot {
    #[serde(rename = "objectId")]
    pub object_id: ObjectId,
    #[serde(rename = "productId")]
    pub product_id: Option<ProductId>,
    #[serde(rename = "inputStorage")]
    pub input_storage: Vec<(ProductId, f64, f64)>,
    #[serde(rename = "outputStorage")]
    pub output_storage: Vec<(ProductId, f64, f64)>,
    pub prices: Vec<(ProductId, f64)>,
    pub status: String,
    #[serde(rename = "totalProduced")]
    pub total_produced: u64,
}

fn snapshot_actor(actor: &crate::actor::ActorState) -> ActorSnapshot {
    use crate::actor::{ActorKind, ProductionStatus};

    let product_id = match actor.kind {
        ActorKind::Producer { product_id } => Some(product_id),
        ActorKind::Warehouse => None,
    };
    let mut input_storage: Vec<(ProductId, f64, f64)> = actor
        .input_storage
        .iter()
        .map(|(&id, slot)| (id, slot.current, slot.capacity))
        .collect();
    input_storage.sort_by_key(|&(id, _, _)| id);
    let mut output_storage: Vec<(ProductId, f64, f64)> = actor
        .output_storage
        .iter()
        .map(|(&id, slot)| (id, slot.current, slot.capacity))
        .collect();
    output_storage.sort_by_key(|&(id, _, _)| id);

    let mut prices: Vec<(ProductId, f64)> = match actor.kind {
        ActorKind::Producer { .. } => actor
            .producer_prices
            .iter()
            .map(|(&id, &p)| (id, p as f64))
            .collect(),
        ActorKind::Warehouse => actor.warehouse_prices.iter().map(|(&id, &p)| (id, p)).collect(),
    };
    prices.sort_by_key(|&(id, _)| id);

    let status = match actor.status {
        ProductionStatus::Idle => "idle",
        ProductionStatus::Producing => "producing",
        ProductionStatus::OutputFull => "output_full",
        ProductionStatus::OutputSurplus => "output_surplus",
        ProductionStatus::MissingInputs => "missing_inputs",
    }
    .to_string();

    ActorSnapshot {
        object_id: actor.object_id,
        product_id,
        input_storage,
        output_storage,
        prices,
        status,
        total_produced: actor.total_produced,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TraderSnapshot {
    pub id: TraderId,
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub amount: f64,
    pub x: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ContractSnapshot {
    pub id: ContractId,
    #[serde(rename = "sourceObjectId")]
    pub source_object_id: ObjectId,
    #[serde(rename = "destinationObjectId")]
    pub destination_object_id: ObjectId,
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "unitPrice")]
    pub unit_price: ProducerPrice,
    pub score: f64,
}

/// JS-facing handle around [`Engine`]. Holds the only strong reference to the
/// engine's state; JS only ever sees cloned snapshots (§5).
#[wasm_bindgen]
pub struct SimHandle {
    engine: Engine,
}

#[wasm_bindgen]
impl SimHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SimHandle {
        SimHandle {
            engine: Engine::new(EconomyGraph::new(), crate::config::EngineConfig::default()),
        }
    }

    pub fn load_economy(&mut self, value: JsValue) -> Result<(), JsError> {
        let json: serde_json::Value = serde_wasm_bindgen::from_value(value)?;
        *self.engine.graph_mut() = crate::save::load_economy(json)?;
        Ok(())
    }

    pub fn save_economy(&self) -> Result<JsValue, JsError> {
        let json = crate::save::save_economy(self.engine.graph());
        Ok(serde_wasm_bindgen::to_value(&json)?)
    }

    pub fn initialize(&mut self, world: WorldInitDto) -> Result<(), JsError> {
        let objects: Vec<PlacedObject> = world
            .objects
            .iter()
            .filter_map(|o| {
                parse_object_kind(&o.kind).map(|kind| PlacedObject {
                    id: o.id,
                    kind,
                    position: ObjectPosition { x: o.x, y: o.y, z: o.z },
                })
            })
            .collect();
        let tiles = world
            .tiles
            .iter()
            .map(|t| TileRecord {
                grid_x: t.grid_x,
                grid_z: t.grid_z,
                tile_type_index: t.tile_type_index,
            })
            .collect();
        self.engine.initialize(
            &VecObjects(objects),
            &VecRoutes(world.routes),
            &VecTiles { records: tiles, config: world.map_config },
        );
        Ok(())
    }

    pub fn tick(&mut self) {
        self.engine.tick();
    }

    pub fn update(&mut self, timestamp: f64) -> bool {
        self.engine.update(timestamp)
    }

    #[wasm_bindgen(js_name = setRunning)]
    pub fn set_running(&mut self, running: bool) {
        self.engine.set_running(running);
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&mut self, speed: f64) {
        self.engine.set_speed(speed);
    }

    #[wasm_bindgen(js_name = tickCount)]
    pub fn tick_count(&self) -> u64 {
        self.engine.tick_count()
    }

    #[wasm_bindgen(js_name = actorSnapshots)]
    pub fn actor_snapshots(&self) -> Vec<ActorSnapshot> {
        self.engine.all_actor_states().map(snapshot_actor).collect()
    }

    #[wasm_bindgen(js_name = traderSnapshots)]
    pub fn trader_snapshots(&self) -> Vec<TraderSnapshot> {
        self.engine
            .active_traders()
            .map(|t| {
                let (x, z) = self
                    .engine
                    .trader_world_position(t.id)
                    .unwrap_or((0.0, 0.0));
                TraderSnapshot {
                    id: t.id,
                    product_id: t.product_id,
                    amount: t.amount,
                    x,
                    z,
                }
            })
            .collect()
    }

    #[wasm_bindgen(js_name = contractSnapshots)]
    pub fn contract_snapshots(&self) -> Vec<ContractSnapshot> {
        self.engine
            .contracts()
            .iter()
            .map(|c| ContractSnapshot {
                id: c.id,
                source_object_id: c.source_object_id,
                destination_object_id: c.destination_object_id,
                product_id: c.product_id,
                unit_price: c.unit_price,
                score: c.score,
            })
            .collect()
    }
}

impl Default for SimHandle {
    fn default() -> Self {
        Self::new()
    }
}

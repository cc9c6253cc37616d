//! Versioned save/load formats (§6): economy graph (v2), game state (v4),
//! simulation state (v3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actor::{ActorKind, ActorState, IdealBand, ProductionStatus, StorageSlot};
use crate::contracts::{Contract, ContractBook};
use crate::economy::{EconomyGraph, Product, RecipeInput};
use crate::error::{Error, Result};
use crate::grid::MapConfig;
use crate::transport::Trader;
use crate::types::{ContractId, ObjectId, ProductId, TraderId};

const ECONOMY_SAVE_VERSION: u32 = 2;
const GAME_SAVE_VERSION: u32 = 4;
const SIMULATION_SAVE_VERSION: u32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct EconomyNodeSave {
    id: ProductId,
    name: String,
    #[serde(rename = "imagePath")]
    image_path: Option<String>,
    inputs: Vec<RecipeInputSave>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecipeInputSave {
    #[serde(rename = "productId")]
    product_id: ProductId,
    amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct EconomySave {
    version: u32,
    nodes: Vec<EconomyNodeSave>,
    #[serde(rename = "nextNodeId")]
    next_node_id: ProductId,
    #[serde(rename = "fuelProductId")]
    fuel_product_id: Option<ProductId>,
}

pub fn save_economy(graph: &EconomyGraph) -> Value {
    let nodes: Vec<EconomyNodeSave> = graph
        .products()
        .map(|p: &Product| EconomyNodeSave {
            id: p.id,
            name: p.name.clone(),
            image_path: p.icon.clone(),
            inputs: p
                .inputs
                .iter()
                .map(|i| RecipeInputSave { product_id: i.product_id, amount: i.amount })
                .collect(),
        })
        .collect();
    let save = EconomySave {
        version: ECONOMY_SAVE_VERSION,
        nodes,
        next_node_id: graph.next_node_id(),
        fuel_product_id: graph.fuel_product(),
    };
    serde_json::to_value(save).expect("economy save serializes")
}

pub fn load_economy(value: Value) -> Result<EconomyGraph> {
    let save: EconomySave = serde_json::from_value(value)
        .map_err(|e| Error::InvalidInput(e.to_string()))?;
    if save.version != ECONOMY_SAVE_VERSION {
        return Err(Error::UnsupportedVersion(save.version));
    }

    let mut graph = EconomyGraph::new();
    // Products are added in saved order; inputs may reference ids not yet
    // re-added, so add every product with no inputs first, then set inputs.
    for node in &save.nodes {
        graph.add_product(node.name.clone(), node.image_path.clone(), Vec::new())?;
    }
    for node in &save.nodes {
        if node.inputs.is_empty() {
            continue;
        }
        let inputs = node
            .inputs
            .iter()
            .map(|i| RecipeInput { product_id: i.product_id, amount: i.amount })
            .collect();
        graph.update_product(node.id, node.name.clone(), node.image_path.clone(), inputs)?;
    }
    graph.set_fuel(save.fuel_product_id)?;
    Ok(graph)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TileSave {
    #[serde(rename = "gridX")]
    pub grid_x: i32,
    #[serde(rename = "gridZ")]
    pub grid_z: i32,
    #[serde(rename = "tileTypeIndex")]
    pub tile_type_index: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameSave {
    pub version: u32,
    #[serde(rename = "mapConfig")]
    pub map_config: MapConfig,
    pub tiles: Vec<TileSave>,
    pub objects: Vec<Value>,
    pub routes: Vec<Value>,
    #[serde(rename = "nextObjectId")]
    pub next_object_id: ObjectId,
    #[serde(rename = "nextRouteId")]
    pub next_route_id: u64,
    pub economy: Option<Value>,
    pub simulation: Option<Value>,
}

/// Validates a v4 game save has every required top-level key, returning the
/// specific missing one so callers can surface `Invalid game save: missing <key>`.
pub fn validate_game_save(value: &Value) -> Result<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::InvalidInput("game save is not a JSON object".into()))?;

    let version = obj
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(Error::MissingField("version"))?;
    if version as u32 != GAME_SAVE_VERSION {
        return Err(Error::UnsupportedVersion(version as u32));
    }

    for key in ["mapConfig", "tiles", "objects", "routes"] {
        if !obj.contains_key(key) {
            return Err(Error::MissingField(key));
        }
    }
    Ok(())
}

pub fn load_game_save(value: Value) -> Result<GameSave> {
    validate_game_save(&value)?;
    serde_json::from_value(value).map_err(|e| Error::InvalidInput(e.to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageSlotSave {
    pub current: f64,
    pub capacity: f64,
    #[serde(rename = "idealMin", skip_serializing_if = "Option::is_none")]
    pub ideal_min: Option<i64>,
    #[serde(rename = "idealMax", skip_serializing_if = "Option::is_none")]
    pub ideal_max: Option<i64>,
    /// Legacy single-target representation; migrated on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal: Option<f64>,
}

impl StorageSlotSave {
    fn from_slot(slot: &StorageSlot) -> Self {
        match slot.ideal {
            IdealBand::Band { ideal_min, ideal_max } => Self {
                current: slot.current,
                capacity: slot.capacity,
                ideal_min: Some(ideal_min),
                ideal_max: Some(ideal_max),
                ideal: None,
            },
            IdealBand::Target { ideal } => Self {
                current: slot.current,
                capacity: slot.capacity,
                ideal_min: None,
                ideal_max: None,
                ideal: Some(ideal),
            },
        }
    }

    /// §6: a legacy-format slot (bare `ideal`, no band) migrates to
    /// `idealMin=0, idealMax=min(ideal, capacity)`.
    fn into_producer_slot(self) -> StorageSlot {
        let (ideal_min, ideal_max) = match (self.ideal_min, self.ideal_max) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                let legacy = self.ideal.unwrap_or(0.0);
                (0, legacy.min(self.capacity) as i64)
            }
        };
        StorageSlot {
            current: self.current,
            capacity: self.capacity,
            ideal: IdealBand::Band { ideal_min, ideal_max },
        }
    }

    fn into_warehouse_slot(self) -> StorageSlot {
        let ideal = self.ideal.unwrap_or_else(|| self.capacity / 2.0);
        StorageSlot {
            current: self.current,
            capacity: self.capacity,
            ideal: IdealBand::Target { ideal },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActorStateSave {
    #[serde(rename = "objectId")]
    pub object_id: ObjectId,
    #[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(rename = "inputStorage")]
    pub input_storage: Vec<(ProductId, StorageSlotSave)>,
    #[serde(rename = "outputStorage")]
    pub output_storage: Vec<(ProductId, StorageSlotSave)>,
    #[serde(rename = "recipeInputs")]
    pub recipe_inputs: Vec<(ProductId, f64)>,
    #[serde(rename = "producerPrices")]
    pub producer_prices: Vec<(ProductId, i64)>,
    #[serde(rename = "warehousePrices")]
    pub warehouse_prices: Vec<(ProductId, f64)>,
    #[serde(rename = "minInputPrices")]
    pub min_input_prices: Vec<(ProductId, f64)>,
    #[serde(rename = "profitMargin")]
    pub profit_margin: f64,
    #[serde(rename = "productionRate")]
    pub production_rate: f64,
    #[serde(rename = "productionProgress")]
    pub production_progress: f64,
    pub status: String,
    #[serde(rename = "totalProduced")]
    pub total_produced: u64,
    #[serde(rename = "fuelProduct", skip_serializing_if = "Option::is_none")]
    pub fuel_product: Option<ProductId>,
}

fn status_to_string(status: ProductionStatus) -> &'static str {
    match status {
        ProductionStatus::Idle => "idle",
        ProductionStatus::Producing => "producing",
        ProductionStatus::OutputFull => "output_full",
        ProductionStatus::OutputSurplus => "output_surplus",
        ProductionStatus::MissingInputs => "missing_inputs",
    }
}

fn status_from_string(s: &str) -> ProductionStatus {
    match s {
        "producing" => ProductionStatus::Producing,
        "output_full" => ProductionStatus::OutputFull,
        "output_surplus" => ProductionStatus::OutputSurplus,
        "missing_inputs" => ProductionStatus::MissingInputs,
        _ => ProductionStatus::Idle,
    }
}

pub fn save_actor(actor: &ActorState) -> ActorStateSave {
    let product_id = match actor.kind {
        ActorKind::Producer { product_id } => Some(product_id),
        ActorKind::Warehouse => None,
    };
    ActorStateSave {
        object_id: actor.object_id,
        product_id,
        input_storage: actor
            .input_storage
            .iter()
            .map(|(&id, slot)| (id, StorageSlotSave::from_slot(slot)))
            .collect(),
        output_storage: actor
            .output_storage
            .iter()
            .map(|(&id, slot)| (id, StorageSlotSave::from_slot(slot)))
            .collect(),
        recipe_inputs: actor.recipe_inputs.clone(),
        producer_prices: actor.producer_prices.iter().map(|(&k, &v)| (k, v)).collect(),
        warehouse_prices: actor.warehouse_prices.iter().map(|(&k, &v)| (k, v)).collect(),
        min_input_prices: actor.min_input_prices.iter().map(|(&k, &v)| (k, v)).collect(),
        profit_margin: actor.profit_margin,
        production_rate: actor.production_rate,
        production_progress: actor.production_progress,
        status: status_to_string(actor.status).to_string(),
        total_produced: actor.total_produced,
        fuel_product: actor.fuel_product,
    }
}

pub fn load_actor(save: ActorStateSave) -> ActorState {
    let kind = match save.product_id {
        Some(product_id) => ActorKind::Producer { product_id },
        None => ActorKind::Warehouse,
    };
    let is_producer = matches!(kind, ActorKind::Producer { .. });

    let input_storage = save
        .input_storage
        .into_iter()
        .map(|(id, slot)| (id, slot.into_producer_slot()))
        .collect();
    let output_storage = save
        .output_storage
        .into_iter()
        .map(|(id, slot)| {
            let slot = if is_producer { slot.into_producer_slot() } else { slot.into_warehouse_slot() };
            (id, slot)
        })
        .collect();

    ActorState {
        object_id: save.object_id,
        kind,
        input_storage,
        output_storage,
        recipe_inputs: save.recipe_inputs,
        producer_prices: save.producer_prices.into_iter().collect(),
        warehouse_prices: save.warehouse_prices.into_iter().collect(),
        min_input_prices: save.min_input_prices.into_iter().collect(),
        profit_margin: save.profit_margin,
        production_rate: save.production_rate,
        production_progress: save.production_progress,
        status: status_from_string(&save.status),
        total_produced: save.total_produced,
        fuel_product: save.fuel_product,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SimulationSave {
    version: u32,
    #[serde(rename = "isRunning")]
    is_running: bool,
    #[serde(rename = "tickCount")]
    tick_count: u64,
    speed: f64,
    #[serde(rename = "nextTraderId")]
    next_trader_id: TraderId,
    #[serde(rename = "nextContractId")]
    next_contract_id: ContractId,
    #[serde(rename = "actorStates")]
    actor_states: Vec<ActorStateSave>,
    contracts: Vec<Contract>,
    #[serde(rename = "activeTraders")]
    active_traders: Vec<Trader>,
}

pub struct SimulationSnapshot {
    pub is_running: bool,
    pub tick_count: u64,
    pub speed: f64,
    pub next_trader_id: TraderId,
    pub next_contract_id: ContractId,
    pub actors: Vec<ActorState>,
    pub contracts: ContractBook,
    pub active_traders: Vec<Trader>,
}

pub fn save_simulation(
    is_running: bool,
    tick_count: u64,
    speed: f64,
    next_trader_id: TraderId,
    next_contract_id: ContractId,
    actors: impl Iterator<Item = ActorState>,
    contracts: impl Iterator<Item = Contract>,
    traders: impl Iterator<Item = Trader>,
) -> Value {
    let save = SimulationSave {
        version: SIMULATION_SAVE_VERSION,
        is_running,
        tick_count,
        speed,
        next_trader_id,
        next_contract_id,
        actor_states: actors.map(|a| save_actor(&a)).collect(),
        contracts: contracts.collect(),
        active_traders: traders.collect(),
    };
    serde_json::to_value(save).expect("simulation save serializes")
}

pub fn load_simulation(value: Value) -> Result<SimulationSnapshot> {
    let save: SimulationSave = serde_json::from_value(value)
        .map_err(|e| Error::InvalidInput(e.to_string()))?;
    if save.version != SIMULATION_SAVE_VERSION {
        return Err(Error::UnsupportedVersion(save.version));
    }

    let mut contracts = ContractBook::new();
    for contract in save.contracts {
        contracts.insert_raw(contract);
    }
    contracts.set_next_id(save.next_contract_id);

    Ok(SimulationSnapshot {
        is_running: save.is_running,
        tick_count: save.tick_count,
        speed: save.speed,
        next_trader_id: save.next_trader_id,
        next_contract_id: save.next_contract_id,
        actors: save.actor_states.into_iter().map(load_actor).collect(),
        contracts,
        active_traders: save.active_traders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::RecipeInput;

    #[test]
    fn economy_round_trips_products_inputs_fuel_and_next_id() {
        let mut graph = EconomyGraph::new();
        let ore = graph.add_product("Ore", None, vec![]).unwrap();
        graph
            .add_product("Ingot", None, vec![RecipeInput { product_id: ore, amount: 2.0 }])
            .unwrap();
        graph.set_fuel(Some(ore)).unwrap();

        let value = save_economy(&graph);
        let loaded = load_economy(value).unwrap();

        assert_eq!(loaded.products().count(), 2);
        assert_eq!(loaded.fuel_product(), Some(ore));
        assert_eq!(loaded.next_node_id(), graph.next_node_id());
    }

    #[test]
    fn economy_load_rejects_wrong_version() {
        let value = serde_json::json!({
            "version": 1,
            "nodes": [],
            "nextNodeId": 0,
            "fuelProductId": null,
        });
        assert_eq!(load_economy(value).unwrap_err(), Error::UnsupportedVersion(1));
    }

    #[test]
    fn game_save_rejects_missing_required_key() {
        let value = serde_json::json!({
            "version": 4,
            "mapConfig": {"mapSize": 10, "tileSize": 1.0, "tileHeight": 0.0},
            "tiles": [],
            "objects": [],
        });
        assert_eq!(validate_game_save(&value).unwrap_err(), Error::MissingField("routes"));
    }

    #[test]
    fn game_save_rejects_wrong_version() {
        let value = serde_json::json!({
            "version": 3,
            "mapConfig": {"mapSize": 10, "tileSize": 1.0, "tileHeight": 0.0},
            "tiles": [],
            "objects": [],
            "routes": [],
        });
        assert_eq!(validate_game_save(&value).unwrap_err(), Error::UnsupportedVersion(3));
    }

    #[test]
    fn legacy_ideal_slot_migrates_to_band() {
        let save = StorageSlotSave {
            current: 5.0,
            capacity: 20.0,
            ideal_min: None,
            ideal_max: None,
            ideal: Some(8.0),
        };
        let slot = save.into_producer_slot();
        assert_eq!(slot.ideal, IdealBand::Band { ideal_min: 0, ideal_max: 8 });
    }

    #[test]
    fn legacy_ideal_above_capacity_clamps() {
        let save = StorageSlotSave {
            current: 5.0,
            capacity: 20.0,
            ideal_min: None,
            ideal_max: None,
            ideal: Some(50.0),
        };
        let slot = save.into_producer_slot();
        assert_eq!(slot.ideal, IdealBand::Band { ideal_min: 0, ideal_max: 20 });
    }

    #[test]
    fn simulation_save_round_trips_contracts_and_traders() {
        let mut contracts = ContractBook::new();
        contracts.insert_raw(Contract {
            id: 0,
            source_object_id: 1,
            destination_object_id: 2,
            product_id: 0,
            amount_per_shipment: 2,
            unit_price: 3,
            score: 0.5,
            created_tick: 10,
        });

        let value = save_simulation(
            true,
            42,
            1.0,
            0,
            1,
            std::iter::empty(),
            contracts.iter().copied(),
            std::iter::empty(),
        );
        let snapshot = load_simulation(value).unwrap();
        assert_eq!(snapshot.tick_count, 42);
        assert_eq!(snapshot.contracts.len(), 1);
        assert!(snapshot.is_running);
    }
}

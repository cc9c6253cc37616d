//! C9 — Simulation Engine: tick phases, path cache, the public surface.

use std::collections::{HashMap, HashSet};

use crate::actor::{ActorKind, ActorState, ProductionStatus};
use crate::config::EngineConfig;
use crate::contracts::{Candidate, ContractBook};
use crate::economy::EconomyGraph;
use crate::external::{ObjectKind, ObjectSource, RouteSource, TileSource};
use crate::grid::TileGrid;
use crate::pathfind;
use crate::pricing;
use crate::roads::{self, RoadSet};
use crate::transport::{self, PathMetrics, Trader};
use crate::types::{ContractId, GridCoord, ObjectId, ProductId, TraderId};

#[cfg(feature = "instrument")]
use tracing::debug;

/// `(source_id, destination_id) -> cached path, or None if unreachable`.
type PathCache = HashMap<(ObjectId, ObjectId), Option<Vec<GridCoord>>>;

pub struct Engine {
    config: EngineConfig,
    graph: EconomyGraph,
    grid: Option<TileGrid>,
    road_set: RoadSet,
    actor_order: Vec<ObjectId>,
    actors: HashMap<ObjectId, ActorState>,
    positions: HashMap<ObjectId, GridCoord>,
    contracts: ContractBook,
    trader_order: Vec<TraderId>,
    traders: HashMap<TraderId, Trader>,
    next_trader_id: TraderId,
    path_cache: PathCache,
    tick_count: u64,
    trade_eval_counter: u32,
    speed: f64,
    running: bool,
    last_tick_time: Option<f64>,
    on_tick: Option<Box<dyn FnMut(u64)>>,
}

impl Engine {
    pub fn new(graph: EconomyGraph, config: EngineConfig) -> Self {
        Self {
            config,
            graph,
            grid: None,
            road_set: RoadSet::new(),
            actor_order: Vec::new(),
            actors: HashMap::new(),
            positions: HashMap::new(),
            contracts: ContractBook::new(),
            trader_order: Vec::new(),
            traders: HashMap::new(),
            next_trader_id: 0,
            path_cache: HashMap::new(),
            tick_count: 0,
            trade_eval_counter: 0,
            speed: 1.0,
            running: false,
            last_tick_time: None,
            on_tick: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &EconomyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut EconomyGraph {
        &mut self.graph
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(self.config.min_speed, self.config.max_speed);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_on_tick(&mut self, callback: Box<dyn FnMut(u64)>) {
        self.on_tick = Some(callback);
    }

    pub fn contracts(&self) -> &ContractBook {
        &self.contracts
    }

    /// Rebuilds the grid, road set and actor table from scratch. Clears
    /// actor states, contracts, traders and the path cache (§4.9).
    pub fn initialize(
        &mut self,
        objects: &dyn ObjectSource,
        routes: &dyn RouteSource,
        tiles: &dyn TileSource,
    ) {
        let records = tiles.tiles();
        let config = tiles.map_config();
        let grid_tiles = records
            .into_iter()
            .map(|r| {
                let (world_x, world_z) = {
                    let offset = config.map_size as f64 * config.tile_size / 2.0 - config.tile_size / 2.0;
                    (
                        r.grid_x as f64 * config.tile_size - offset,
                        r.grid_z as f64 * config.tile_size - offset,
                    )
                };
                crate::grid::Tile {
                    grid_x: r.grid_x,
                    grid_z: r.grid_z,
                    tile_type_index: r.tile_type_index,
                    world_x,
                    world_y: 0.0,
                    world_z,
                }
            })
            .collect();
        let grid = TileGrid::new(config, grid_tiles);

        let curves = routes.routes();
        self.road_set = roads::compute(&curves, &grid, self.config.road_sample_count);

        self.actors.clear();
        self.actor_order.clear();
        self.positions.clear();
        self.contracts = ContractBook::new();
        self.traders.clear();
        self.trader_order.clear();
        self.next_trader_id = 0;
        self.path_cache.clear();
        self.trade_eval_counter = 0;

        let placed = objects.objects();
        let all_products: Vec<ProductId> = self.graph.products().map(|p| p.id).collect();

        for object in &placed {
            let (gx, gz) = grid.world_to_grid(object.position.x, object.position.z);
            self.positions.insert(object.id, (gx, gz));
            let actor = match object.kind {
                ObjectKind::Producer(product_id) => {
                    ActorState::new_producer(object.id, product_id, &self.graph, &self.config)
                }
                ObjectKind::Warehouse => {
                    ActorState::new_warehouse(object.id, &all_products, &self.graph, &self.config)
                }
            };
            self.actors.insert(object.id, actor);
            self.actor_order.push(object.id);
        }

        self.grid = Some(grid);

        #[cfg(feature = "instrument")]
        debug!(actor_count = self.actors.len(), "engine initialized");
    }

    pub fn actor_state(&self, id: ObjectId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub fn all_actor_states(&self) -> impl Iterator<Item = &ActorState> {
        self.actor_order.iter().filter_map(|id| self.actors.get(id))
    }

    pub fn active_traders(&self) -> impl Iterator<Item = &Trader> {
        self.trader_order.iter().filter_map(|id| self.traders.get(id))
    }

    pub fn trader_world_position(&self, trader_id: TraderId) -> Option<(f64, f64)> {
        let trader = self.traders.get(&trader_id)?;
        let grid = self.grid.as_ref()?;
        Some(trader.world_position(|c| grid.grid_to_world(c.0, c.1)))
    }

    pub fn path_metrics(&self, path: &[GridCoord]) -> PathMetrics {
        transport::path_metrics(
            path,
            &self.road_set,
            self.config.road_cost_on,
            self.config.road_cost_off,
            self.config.fuel_cost_on,
            self.config.fuel_cost_off,
        )
    }

    /// Exposes the cached A* path between two objects, computing it if
    /// necessary. Not used by the engine itself outside tests; production
    /// callers only need [`Engine::path_metrics`] on the path they already
    /// have from a trader or a contract's endpoints.
    #[doc(hidden)]
    pub fn path_for_test(&mut self, source: ObjectId, destination: ObjectId) -> Option<Vec<GridCoord>> {
        self.cached_path(source, destination)
    }

    /// Exposes the computed road set. Test-only; the engine's own transport
    /// cost logic reaches `road_set` directly.
    #[doc(hidden)]
    pub fn road_set_for_test(&self) -> &RoadSet {
        &self.road_set
    }

    fn cached_path(&mut self, source: ObjectId, destination: ObjectId) -> Option<Vec<GridCoord>> {
        if let Some(cached) = self.path_cache.get(&(source, destination)) {
            return cached.clone();
        }
        let grid = self.grid.as_ref()?;
        let start = *self.positions.get(&source)?;
        let end = *self.positions.get(&destination)?;
        let path = pathfind::find_path(
            grid,
            &self.road_set,
            start,
            end,
            self.config.road_cost_on,
            self.config.road_cost_off,
        );
        self.path_cache.insert((source, destination), path.clone());
        path
    }

    /// Runs exactly one tick if `elapsed = timestamp - last_tick_time` has
    /// reached `tick_interval / speed`; otherwise a no-op. Returns whether a
    /// tick ran.
    pub fn update(&mut self, timestamp: f64) -> bool {
        if !self.running {
            return false;
        }
        let interval = self.config.tick_interval_ms / self.speed;
        let elapsed = match self.last_tick_time {
            Some(last) => timestamp - last,
            None => interval,
        };
        if elapsed >= interval {
            self.tick();
            self.last_tick_time = Some(timestamp);
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self) {
        self.production_phase();

        self.trade_eval_counter += 1;
        if self.trade_eval_counter >= self.config.trade_eval_interval {
            self.trade_eval_counter = 0;
            self.trade_evaluation_phase();
        }

        self.transport_phase();
        self.pricing_phase();

        self.tick_count += 1;
        if let Some(callback) = self.on_tick.as_mut() {
            callback(self.tick_count);
        }
    }

    fn consumed_products(&self) -> HashSet<ProductId> {
        self.actors
            .values()
            .flat_map(|a| a.recipe_inputs.iter().map(|&(id, _)| id))
            .collect()
    }

    fn production_phase(&mut self) {
        let consumed = self.consumed_products();
        for &id in &self.actor_order {
            let Some(actor) = self.actors.get_mut(&id) else { continue };
            let ActorKind::Producer { product_id } = actor.kind else { continue };
            let is_sink = !consumed.contains(&product_id);

            let output_full = actor
                .output_storage
                .get(&product_id)
                .is_some_and(|s| s.current >= s.capacity);
            if !is_sink && output_full {
                actor.status = ProductionStatus::OutputFull;
                continue;
            }
            let output_surplus = actor
                .output_storage
                .get(&product_id)
                .is_some_and(|s| s.is_above_ideal());
            if !is_sink && output_surplus {
                actor.status = ProductionStatus::OutputSurplus;
                continue;
            }

            if actor.is_raw_material() {
                advance_production(actor, product_id);
            } else {
                let inputs_ready = actor
                    .recipe_inputs
                    .iter()
                    .all(|&(input_id, amount)| {
                        actor
                            .input_storage
                            .get(&input_id)
                            .is_some_and(|s| s.current >= amount)
                    });
                if !inputs_ready {
                    actor.status = ProductionStatus::MissingInputs;
                    continue;
                }
                let recipe_inputs = actor.recipe_inputs.clone();
                for (input_id, amount) in recipe_inputs {
                    if let Some(slot) = actor.input_storage.get_mut(&input_id) {
                        slot.withdraw(amount);
                    }
                }
                advance_production(actor, product_id);
            }
        }
    }

    fn trade_evaluation_phase(&mut self) {
        self.recompute_min_input_prices();
        self.maintain_contracts();
        self.discover_contracts();
        self.execute_contracts();
    }

    fn recompute_min_input_prices(&mut self) {
        let producer_ids: Vec<ObjectId> = self
            .actor_order
            .iter()
            .copied()
            .filter(|id| matches!(self.actors.get(id).map(|a| &a.kind), Some(ActorKind::Producer { .. })))
            .collect();

        for &buyer_id in &producer_ids {
            let recipe_inputs = self.actors[&buyer_id].recipe_inputs.clone();
            for (input_id, _) in recipe_inputs {
                let mut sellers = Vec::new();
                for &seller_id in &self.actor_order.clone() {
                    if seller_id == buyer_id {
                        continue;
                    }
                    let Some(seller) = self.actors.get(&seller_id) else { continue };
                    if !seller.output_storage.get(&input_id).is_some_and(|s| s.current > 0.0) {
                        continue;
                    }
                    let Some(path) = self.cached_path(seller_id, buyer_id) else { continue };
                    sellers.push((seller_id, self.path_metrics(&path).transport_cost));
                }
                let best = pricing::min_input_price(
                    input_id,
                    sellers.iter().map(|&(id, cost)| (&self.actors[&id], cost)),
                );
                self.actors
                    .get_mut(&buyer_id)
                    .unwrap()
                    .min_input_prices
                    .insert(input_id, best);
            }
        }
    }

    fn maintain_contracts(&mut self) {
        let actors = &self.actors;
        self.contracts.retain(|contract| {
            let Some(source) = actors.get(&contract.source_object_id) else { return false };
            if actors.get(&contract.destination_object_id).is_none() {
                return false;
            }
            if let ActorKind::Producer { .. } = source.kind {
                let floor = pricing::recipe_floor(source);
                if floor > contract.unit_price {
                    #[cfg(feature = "instrument")]
                    debug!(
                        contract_id = contract.id,
                        floor,
                        unit_price = contract.unit_price,
                        "contract removed: below recipe floor"
                    );
                    return false;
                }
            }
            let destination = &actors[&contract.destination_object_id];
            let dest_slot = destination
                .input_storage
                .get(&contract.product_id)
                .or_else(|| destination.output_storage.get(&contract.product_id));
            match dest_slot {
                Some(slot) => !slot.is_above_ideal(),
                None => false,
            }
        });
    }

    fn discover_contracts(&mut self) {
        let current_tick = self.tick_count;
        let fuel_product = self.graph.fuel_product();

        for &seller_id in self.actor_order.clone().iter() {
            let output_products: Vec<ProductId> = self
                .actors
                .get(&seller_id)
                .map(|a| {
                    a.output_storage
                        .iter()
                        .filter(|(_, slot)| slot.current >= 1.0)
                        .map(|(&pid, _)| pid)
                        .collect()
                })
                .unwrap_or_default();

            for product_id in output_products {
                let Some(best) = self.best_buyer(seller_id, product_id, fuel_product) else { continue };

                if let Some(existing) = self
                    .contracts
                    .find(seller_id, best.buyer_id, product_id)
                    .map(|c| c.id)
                {
                    self.contracts.refresh_score(existing, best.score);
                    continue;
                }

                let seller = &self.actors[&seller_id];
                let Some(sell_price) = pricing::sell_price(seller, product_id) else { continue };
                let output_capacity = seller
                    .output_storage
                    .get(&product_id)
                    .map(|s| s.capacity)
                    .unwrap_or(1.0);
                let amount_per_shipment =
                    ((output_capacity / self.config.max_contracts_per_actor as f64).floor() as u32).max(1);

                let candidate = Candidate {
                    source_object_id: seller_id,
                    destination_object_id: best.buyer_id,
                    product_id,
                    amount_per_shipment,
                    unit_price: sell_price.ceil() as i64,
                    score: best.score,
                };
                self.contracts.insert_or_replace(candidate, &self.config, current_tick);
            }
        }
    }

    fn best_buyer(
        &mut self,
        seller_id: ObjectId,
        product_id: ProductId,
        fuel_product: Option<ProductId>,
    ) -> Option<BestBuyer> {
        let mut best: Option<BestBuyer> = None;
        for &buyer_id in &self.actor_order.clone() {
            if buyer_id == seller_id {
                continue;
            }
            let Some(buyer) = self.actors.get(&buyer_id) else { continue };

            let (current, capacity, limit) = match &buyer.kind {
                ActorKind::Producer { .. } => {
                    let Some(slot) = buyer.input_storage.get(&product_id) else { continue };
                    let IdealLimit::Band(max) = ideal_limit(slot) else { continue };
                    (slot.current, slot.capacity, max)
                }
                ActorKind::Warehouse => {
                    let Some(slot) = buyer.output_storage.get(&product_id) else { continue };
                    let IdealLimit::Target(ideal) = ideal_limit(slot) else { continue };
                    (slot.current, slot.capacity, ideal)
                }
            };
            if current >= capacity {
                continue;
            }
            let deficit = limit - current;
            if deficit <= 0.0 {
                continue;
            }

            let Some(path) = self.cached_path(seller_id, buyer_id) else { continue };
            let metrics = self.path_metrics(&path);

            if let Some(fuel_id) = fuel_product {
                let seller = &self.actors[&seller_id];
                let held_fuel = seller
                    .output_storage
                    .get(&fuel_id)
                    .or_else(|| seller.input_storage.get(&fuel_id))
                    .map_or(0.0, |slot| slot.current);
                if held_fuel < metrics.transport_cost {
                    continue;
                }
            }

            let fuel_penalty = if self.config.fuel_scoring_enabled
                && fuel_product == Some(product_id)
                && !self.actors[&buyer_id]
                    .recipe_inputs
                    .iter()
                    .any(|&(id, _)| Some(id) == fuel_product)
            {
                Some(self.config.fuel_scoring_penalty)
            } else {
                None
            };

            let score = crate::contracts::score_candidate(deficit, capacity, metrics.transport_cost, fuel_penalty);

            let better = match &best {
                None => true,
                Some(current_best) => {
                    score > current_best.score
                        || (score == current_best.score && buyer_id < current_best.buyer_id)
                }
            };
            if better {
                best = Some(BestBuyer { buyer_id, score });
            }
        }
        best
    }

    fn execute_contracts(&mut self) {
        let max_active = self.config.max_active_traders(self.actors.len());
        let fuel_product = self.graph.fuel_product();

        let contract_ids: Vec<ContractId> = self.contracts.iter().map(|c| c.id).collect();
        for contract_id in contract_ids {
            if self.traders.len() as u32 >= max_active {
                break;
            }
            let Some(contract) = self.contracts.get(contract_id).copied() else { continue };

            let concurrent = self
                .traders
                .values()
                .filter(|t| t.contract_id == contract_id)
                .count() as u32;
            if concurrent >= self.config.max_concurrent_traders_per_contract {
                continue;
            }

            let Some(path) = self.cached_path(contract.source_object_id, contract.destination_object_id) else {
                continue;
            };

            let source_stock = self
                .actors
                .get(&contract.source_object_id)
                .and_then(|a| a.output_storage.get(&contract.product_id))
                .map(|s| s.current)
                .unwrap_or(0.0);
            if source_stock < 1.0 {
                continue;
            }

            let free_dest_capacity = self
                .actors
                .get(&contract.destination_object_id)
                .and_then(|a| {
                    a.input_storage
                        .get(&contract.product_id)
                        .or_else(|| a.output_storage.get(&contract.product_id))
                })
                .map(|s| s.capacity - s.current)
                .unwrap_or(0.0);
            if free_dest_capacity < 1.0 {
                continue;
            }

            let amount = (contract.amount_per_shipment as f64)
                .min(free_dest_capacity.floor())
                .max(1.0);
            if source_stock < amount {
                continue;
            }

            let metrics = self.path_metrics(&path);
            let fuel_required = if fuel_product.is_some() { metrics.fuel_cost } else { 0.0 };

            if self.try_create_trader(contract_id, &contract, amount, fuel_product, fuel_required, path) {
                #[cfg(feature = "instrument")]
                debug!(contract_id, amount, "trader created");
            }
        }
    }

    /// §4.8: atomic with respect to the source's output and fuel slots.
    fn try_create_trader(
        &mut self,
        contract_id: ContractId,
        contract: &crate::contracts::Contract,
        amount: f64,
        fuel_product: Option<ProductId>,
        fuel_required: f64,
        path: Vec<GridCoord>,
    ) -> bool {
        let Some(source) = self.actors.get_mut(&contract.source_object_id) else { return false };

        let fuel_shares_output_slot = fuel_product == Some(contract.product_id);

        if fuel_required > 0.0 && !fuel_shares_output_slot {
            let has_fuel = fuel_product
                .and_then(|fuel_id| {
                    source
                        .output_storage
                        .get(&fuel_id)
                        .or_else(|| source.input_storage.get(&fuel_id))
                })
                .is_some_and(|slot| slot.current >= fuel_required);
            if !has_fuel {
                #[cfg(feature = "instrument")]
                debug!(
                    contract_id,
                    source_object_id = contract.source_object_id,
                    fuel_required,
                    "trader not created: fuel exhausted"
                );
                return false;
            }
        }

        let Some(output) = source.output_storage.get(&contract.product_id) else { return false };
        let available = if fuel_shares_output_slot {
            output.current - fuel_required
        } else {
            output.current
        };
        if available < amount.max(1.0) {
            return false;
        }

        if fuel_required > 0.0 && !fuel_shares_output_slot {
            if let Some(fuel_id) = fuel_product {
                if let Some(slot) = source.output_storage.get_mut(&fuel_id) {
                    slot.withdraw(fuel_required);
                } else if let Some(slot) = source.input_storage.get_mut(&fuel_id) {
                    slot.withdraw(fuel_required);
                }
            }
        }
        let total_debit = if fuel_shares_output_slot { amount + fuel_required } else { amount };
        source
            .output_storage
            .get_mut(&contract.product_id)
            .unwrap()
            .withdraw(total_debit);

        let trader_id = self.next_trader_id;
        self.next_trader_id += 1;
        let trader = Trader {
            id: trader_id,
            contract_id,
            source_object_id: contract.source_object_id,
            destination_object_id: contract.destination_object_id,
            product_id: contract.product_id,
            amount,
            path,
            path_index: 0,
            progress: 0.0,
            speed: self.config.trader_speed,
        };
        self.traders.insert(trader_id, trader);
        self.trader_order.push(trader_id);
        true
    }

    fn transport_phase(&mut self) {
        let mut arrived = Vec::new();
        for &id in &self.trader_order {
            let Some(trader) = self.traders.get_mut(&id) else { continue };
            if trader.advance() {
                arrived.push(id);
            }
        }

        for id in arrived {
            if let Some(trader) = self.traders.get(&id) {
                if let Some(destination) = self.actors.get_mut(&trader.destination_object_id) {
                    let slot = destination
                        .input_storage
                        .get_mut(&trader.product_id)
                        .or_else(|| destination.output_storage.get_mut(&trader.product_id));
                    if let Some(slot) = slot {
                        slot.deposit(trader.amount);
                        #[cfg(feature = "instrument")]
                        debug!(
                            trader_id = id,
                            destination_object_id = trader.destination_object_id,
                            amount = trader.amount,
                            "trader delivered"
                        );
                    }
                }
            }
            self.traders.remove(&id);
            self.trader_order.retain(|&tid| tid != id);
        }
    }

    fn pricing_phase(&mut self) {
        for actor in self.actors.values_mut() {
            match actor.kind {
                ActorKind::Producer { .. } => pricing::update_producer_prices(actor),
                ActorKind::Warehouse => pricing::update_warehouse_prices(actor),
            }
        }
    }
}

struct BestBuyer {
    buyer_id: ObjectId,
    score: f64,
}

enum IdealLimit {
    Band(f64),
    Target(f64),
}

fn ideal_limit(slot: &crate::actor::StorageSlot) -> IdealLimit {
    match slot.ideal {
        crate::actor::IdealBand::Band { ideal_max, .. } => IdealLimit::Band(ideal_max as f64),
        crate::actor::IdealBand::Target { ideal } => IdealLimit::Target(ideal),
    }
}

fn advance_production(actor: &mut ActorState, product_id: ProductId) {
    actor.status = ProductionStatus::Producing;
    actor.production_progress += actor.production_rate;
    if actor.production_progress >= 1.0 {
        actor.production_progress -= 1.0;
        actor.total_produced += 1;
        if let Some(slot) = actor.output_storage.get_mut(&product_id) {
            slot.deposit(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{ObjectPosition, PlacedObject, TileRecord};
    use crate::grid::MapConfig;

    struct FixtureObjects(Vec<PlacedObject>);
    impl ObjectSource for FixtureObjects {
        fn objects(&self) -> Vec<PlacedObject> {
            self.0.clone()
        }
    }

    struct NoRoutes;
    impl RouteSource for NoRoutes {
        fn routes(&self) -> Vec<Box<dyn crate::external::Curve>> {
            Vec::new()
        }
    }

    struct FlatTiles {
        size: i32,
    }
    impl TileSource for FlatTiles {
        fn tiles(&self) -> Vec<TileRecord> {
            let mut out = Vec::new();
            for gx in 0..self.size {
                for gz in 0..self.size {
                    out.push(TileRecord {
                        grid_x: gx,
                        grid_z: gz,
                        tile_type_index: 3,
                    });
                }
            }
            out
        }
        fn map_config(&self) -> MapConfig {
            MapConfig {
                map_size: self.size as u32,
                tile_size: 1.0,
                tile_height: 0.0,
            }
        }
    }

    #[test]
    fn empty_engine_ticks_without_actors() {
        let mut engine = Engine::new(EconomyGraph::new(), EngineConfig::default());
        engine.initialize(&FixtureObjects(vec![]), &NoRoutes, &FlatTiles { size: 4 });
        for _ in 0..10 {
            engine.tick();
        }
        assert_eq!(engine.tick_count(), 10);
        assert_eq!(engine.all_actor_states().count(), 0);
        assert_eq!(engine.active_traders().count(), 0);
        assert_eq!(engine.contracts().len(), 0);
    }

    #[test]
    fn raw_material_producer_fills_output_over_time() {
        let mut graph = EconomyGraph::new();
        let ore = graph.add_product("Ore", None, vec![]).unwrap();
        let mut engine = Engine::new(graph, EngineConfig::default());
        let objects = vec![PlacedObject {
            id: 1,
            kind: ObjectKind::Producer(ore),
            position: ObjectPosition { x: 0.0, y: 0.0, z: 0.0 },
        }];
        engine.initialize(&FixtureObjects(objects), &NoRoutes, &FlatTiles { size: 10 });

        for _ in 0..25 {
            engine.tick();
        }

        let actor = engine.actor_state(1).unwrap();
        assert_eq!(actor.total_produced, 25);
        assert_eq!(actor.output_storage[&ore].current, 20.0);
    }

    #[test]
    fn two_stage_chain_eventually_trades() {
        let mut graph = EconomyGraph::new();
        let ore = graph.add_product("Ore", None, vec![]).unwrap();
        let ingot = graph
            .add_product("Ingot", None, vec![crate::economy::RecipeInput { product_id: ore, amount: 2.0 }])
            .unwrap();
        let mut engine = Engine::new(graph, EngineConfig::default());
        let objects = vec![
            PlacedObject {
                id: 1,
                kind: ObjectKind::Producer(ore),
                position: ObjectPosition { x: 0.0, y: 0.0, z: 0.0 },
            },
            PlacedObject {
                id: 2,
                kind: ObjectKind::Producer(ingot),
                position: ObjectPosition { x: 3.0, y: 0.0, z: 0.0 },
            },
        ];
        engine.initialize(&FixtureObjects(objects), &NoRoutes, &FlatTiles { size: 10 });

        for _ in 0..400 {
            engine.tick();
        }

        let ingot_actor = engine.actor_state(2).unwrap();
        let traded_or_held = ingot_actor.output_storage[&ingot].current > 0.0 || ingot_actor.total_produced > 0;
        assert!(traded_or_held);
    }
}

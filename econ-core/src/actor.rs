//! C5 — Actor State: per-object storage, recipe, prices, production.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::economy::EconomyGraph;
use crate::types::{ObjectId, ProducerPrice, ProductId, Quantity, WarehousePrice};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IdealBand {
    /// Producer-style: an integer range tolerated as healthy stock.
    Band { ideal_min: i64, ideal_max: i64 },
    /// Warehouse-style: a single target the price curve centers on.
    Target { ideal: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageSlot {
    pub current: Quantity,
    pub capacity: Quantity,
    pub ideal: IdealBand,
}

impl StorageSlot {
    pub fn new_producer(capacity: Quantity, ideal_min: i64, ideal_max: i64) -> Self {
        Self {
            current: 0.0,
            capacity,
            ideal: IdealBand::Band { ideal_min, ideal_max },
        }
    }

    pub fn new_warehouse(capacity: Quantity, ideal: f64) -> Self {
        Self {
            current: 0.0,
            capacity,
            ideal: IdealBand::Target { ideal },
        }
    }

    pub fn is_above_ideal(&self) -> bool {
        match self.ideal {
            IdealBand::Band { ideal_max, .. } => self.current > ideal_max as f64,
            IdealBand::Target { ideal } => self.current > ideal,
        }
    }

    pub fn is_below_ideal(&self) -> bool {
        match self.ideal {
            IdealBand::Band { ideal_min, .. } => self.current < ideal_min as f64,
            IdealBand::Target { ideal } => self.current < ideal,
        }
    }

    pub fn deposit(&mut self, amount: Quantity) {
        self.current = (self.current + amount).min(self.capacity);
        if self.current >= self.capacity {
            self.shift_band(-1);
        }
    }

    pub fn withdraw(&mut self, amount: Quantity) {
        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.shift_band(1);
        }
    }

    /// Shifts a producer band by `delta`, clamping both ends into
    /// `[0, capacity]`; a no-op on warehouse slots.
    fn shift_band(&mut self, delta: i64) {
        if let IdealBand::Band { ideal_min, ideal_max } = &mut self.ideal {
            let cap = self.capacity as i64;
            let size = *ideal_max - *ideal_min;
            let mut new_min = *ideal_min + delta;
            new_min = new_min.clamp(0, cap);
            let mut new_max = new_min + size;
            if new_max > cap {
                new_max = cap;
                new_min = (new_max - size).max(0);
            }
            *ideal_min = new_min;
            *ideal_max = new_max;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionStatus {
    Idle,
    Producing,
    OutputFull,
    OutputSurplus,
    MissingInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorKind {
    Producer { product_id: ProductId },
    Warehouse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    pub object_id: ObjectId,
    pub kind: ActorKind,
    /// Ordered by product id so iteration (contract discovery, save/load) is
    /// deterministic across ticks and across a serialize/reload round trip.
    pub input_storage: BTreeMap<ProductId, StorageSlot>,
    pub output_storage: BTreeMap<ProductId, StorageSlot>,
    /// Inputs copied from the economy graph's recipe at construction time.
    pub recipe_inputs: Vec<(ProductId, Quantity)>,
    pub producer_prices: HashMap<ProductId, ProducerPrice>,
    pub warehouse_prices: HashMap<ProductId, WarehousePrice>,
    pub min_input_prices: HashMap<ProductId, f64>,
    pub profit_margin: f64,
    pub production_rate: f64,
    pub production_progress: f64,
    pub status: ProductionStatus,
    pub total_produced: u64,
    pub fuel_product: Option<ProductId>,
}

impl ActorState {
    pub fn new_producer(
        object_id: ObjectId,
        product_id: ProductId,
        graph: &EconomyGraph,
        config: &EngineConfig,
    ) -> Self {
        let product = graph.get(product_id);
        let recipe_inputs: Vec<(ProductId, Quantity)> = product
            .map(|p| p.inputs.iter().map(|i| (i.product_id, i.amount)).collect())
            .unwrap_or_default();

        let ideal_size = config.ideal_band_default_size as i64;
        let mut input_storage = BTreeMap::new();
        for &(input_id, _) in &recipe_inputs {
            input_storage.insert(
                input_id,
                StorageSlot::new_producer(config.producer_input_capacity, 0, ideal_size),
            );
        }

        let mut output_storage = BTreeMap::new();
        output_storage.insert(
            product_id,
            StorageSlot::new_producer(config.producer_output_capacity, 0, ideal_size),
        );

        let fuel_product = graph.fuel_product();
        if let Some(fuel_id) = fuel_product
            && fuel_id != product_id
            && !input_storage.contains_key(&fuel_id)
            && !output_storage.contains_key(&fuel_id)
        {
            let capacity = config.producer_input_capacity.max(config.fuel_min_capacity);
            let max = (capacity / 2.0).floor() as i64;
            input_storage.insert(fuel_id, StorageSlot::new_producer(capacity, 0, max));
        }

        let mut producer_prices = HashMap::new();
        producer_prices.insert(product_id, 1);
        for &(input_id, _) in &recipe_inputs {
            producer_prices.insert(input_id, 1);
        }

        Self {
            object_id,
            kind: ActorKind::Producer { product_id },
            input_storage,
            output_storage,
            recipe_inputs,
            producer_prices,
            warehouse_prices: HashMap::new(),
            min_input_prices: HashMap::new(),
            profit_margin: config.profit_margin,
            production_rate: 1.0,
            production_progress: 0.0,
            status: ProductionStatus::Idle,
            total_produced: 0,
            fuel_product,
        }
    }

    pub fn new_warehouse(
        object_id: ObjectId,
        all_products: &[ProductId],
        graph: &EconomyGraph,
        config: &EngineConfig,
    ) -> Self {
        let count = all_products.len().max(1) as f64;
        let capacity = config.warehouse_total_capacity / count;
        let mut output_storage = BTreeMap::new();
        let mut warehouse_prices = HashMap::new();
        for &pid in all_products {
            output_storage.insert(pid, StorageSlot::new_warehouse(capacity, capacity / 2.0));
            warehouse_prices.insert(pid, 1.0);
        }

        Self {
            object_id,
            kind: ActorKind::Warehouse,
            input_storage: BTreeMap::new(),
            output_storage,
            recipe_inputs: Vec::new(),
            producer_prices: HashMap::new(),
            warehouse_prices,
            min_input_prices: HashMap::new(),
            profit_margin: config.profit_margin,
            production_rate: 1.0,
            production_progress: 0.0,
            status: ProductionStatus::Idle,
            total_produced: 0,
            fuel_product: graph.fuel_product(),
        }
    }

    pub fn is_raw_material(&self) -> bool {
        self.recipe_inputs.is_empty()
    }

    /// `true` if no other actor's recipe consumes this producer's output —
    /// the caller must supply the set of products consumed somewhere in the
    /// economy, since a single actor can't know this on its own.
    pub fn is_sink(&self, consumed_products: &std::collections::HashSet<ProductId>) -> bool {
        match self.kind {
            ActorKind::Producer { product_id } => !consumed_products.contains(&product_id),
            ActorKind::Warehouse => false,
        }
    }
}

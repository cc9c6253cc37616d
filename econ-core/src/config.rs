//! Tunable parameters. Every default here reproduces a number spec.md states
//! as a default; every Open Question from §9 is resolved into an explicit
//! field instead of being hardcoded, so a host can flip it without a rebuild.

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Run trade evaluation every N ticks. Spec §9 Open Questions: newer
    /// source uses 1, older uses 3. Default to the newer behavior.
    pub trade_eval_interval: u32,
    pub max_contracts_per_actor: u32,
    pub max_concurrent_traders_per_contract: u32,
    pub min_contract_lifetime_ticks: u64,
    pub replacement_margin: f64,
    /// Floor used in `max(50, actor_count * per_actor)`.
    pub max_active_traders_floor: u32,
    pub max_active_traders_per_actor: u32,
    pub profit_margin: f64,
    pub trader_speed: f64,
    pub tick_interval_ms: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Feature flag for the fuel-as-input 0.2x scoring penalty (§4.7, §9).
    pub fuel_scoring_enabled: bool,
    pub fuel_scoring_penalty: f64,
    pub ideal_band_default_size: u32,
    pub producer_input_capacity: Quantity,
    pub producer_output_capacity: Quantity,
    pub warehouse_total_capacity: Quantity,
    pub fuel_min_capacity: Quantity,
    pub road_cost_on: f64,
    pub road_cost_off: f64,
    pub fuel_cost_on: f64,
    pub fuel_cost_off: f64,
    pub road_sample_count: u32,
}

use crate::types::Quantity;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trade_eval_interval: 1,
            max_contracts_per_actor: 10,
            max_concurrent_traders_per_contract: 3,
            min_contract_lifetime_ticks: 25,
            replacement_margin: 1.25,
            max_active_traders_floor: 50,
            max_active_traders_per_actor: 4,
            profit_margin: 0.05,
            trader_speed: 1.0,
            tick_interval_ms: 1000.0,
            min_speed: 0.1,
            max_speed: 10.0,
            fuel_scoring_enabled: true,
            fuel_scoring_penalty: 0.2,
            ideal_band_default_size: 3,
            producer_input_capacity: 20.0,
            producer_output_capacity: 20.0,
            warehouse_total_capacity: 100.0,
            fuel_min_capacity: 40.0,
            road_cost_on: 0.3,
            road_cost_off: 1.0,
            fuel_cost_on: 0.03,
            fuel_cost_off: 0.1,
            road_sample_count: 101,
        }
    }
}

impl EngineConfig {
    pub fn max_active_traders(&self, actor_count: usize) -> u32 {
        (actor_count as u32)
            .saturating_mul(self.max_active_traders_per_actor)
            .max(self.max_active_traders_floor)
    }
}

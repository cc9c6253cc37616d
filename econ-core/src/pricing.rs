//! C6 — Pricing Model: integer producer prices, continuous warehouse prices.

use crate::actor::{ActorState, IdealBand, StorageSlot};
use crate::types::{ProducerPrice, ProductId, WarehousePrice};

/// Recipe floor for a processor: `ceil(sum(amount * min_input_price) * (1 + margin))`.
/// Raw materials (no recipe inputs) have a floor of 1.
pub fn recipe_floor(actor: &ActorState) -> ProducerPrice {
    if actor.recipe_inputs.is_empty() {
        return 1;
    }
    let total: f64 = actor
        .recipe_inputs
        .iter()
        .map(|&(input_id, amount)| {
            let price = actor.min_input_prices.get(&input_id).copied().unwrap_or(1.0);
            amount * price
        })
        .sum();
    let floor = (total * (1.0 + actor.profit_margin)).ceil() as ProducerPrice;
    floor.max(1)
}

/// Adjusts every producer output price toward its recipe floor, and every
/// producer input price symmetrically with a floor of 1.
pub fn update_producer_prices(actor: &mut ActorState) {
    let floor = recipe_floor(actor);

    for (&product_id, slot) in actor.output_storage.iter() {
        let price = actor.producer_prices.entry(product_id).or_insert(1);
        if let Some(new_price) = adjust_price(*price, slot, floor) {
            *price = new_price;
        }
    }

    for (&product_id, slot) in actor.input_storage.iter() {
        let price = actor.producer_prices.entry(product_id).or_insert(1);
        if let Some(new_price) = adjust_price(*price, slot, 1) {
            *price = new_price;
        }
    }
}

fn adjust_price(current: ProducerPrice, slot: &StorageSlot, floor: ProducerPrice) -> Option<ProducerPrice> {
    if slot.is_above_ideal() {
        Some((current - 1).max(floor))
    } else if slot.is_below_ideal() {
        Some(current + 1)
    } else {
        None
    }
}

/// Continuous warehouse price curve over storage pressure.
pub fn warehouse_price(slot: &StorageSlot) -> WarehousePrice {
    let IdealBand::Target { ideal } = slot.ideal else {
        return 1.0;
    };
    let r = slot.current / slot.capacity;
    let r_star = ideal / slot.capacity;
    if r >= r_star {
        let denom = (1.0 - r_star).max(f64::EPSILON);
        (1.0 - 0.75 * (r - r_star) / denom).max(1.0)
    } else {
        let denom = r_star.max(f64::EPSILON);
        (1.0 + 4.0 * (r_star - r) / denom).max(1.0)
    }
}

pub fn update_warehouse_prices(actor: &mut ActorState) {
    for (&product_id, slot) in actor.output_storage.iter() {
        let price = warehouse_price(slot);
        actor.warehouse_prices.insert(product_id, price);
    }
}

/// Current sell price of `product_id` at this actor, whichever variant it is.
pub fn sell_price(actor: &ActorState, product_id: ProductId) -> Option<f64> {
    actor
        .producer_prices
        .get(&product_id)
        .map(|&p| p as f64)
        .or_else(|| actor.warehouse_prices.get(&product_id).copied())
}

/// `min over sellers of sell_price(product_id) + transport_cost(seller -> buyer)`,
/// restricted to sellers that hold stock of `product_id` and have a reachable
/// path, as recorded by the caller in the `(seller, transport_cost)` pairs.
pub fn min_input_price<'a>(
    product_id: ProductId,
    sellers: impl Iterator<Item = (&'a ActorState, f64)>,
) -> f64 {
    sellers
        .filter_map(|(actor, transport_cost)| {
            let slot = actor.output_storage.get(&product_id)?;
            if slot.current <= 0.0 {
                return None;
            }
            sell_price(actor, product_id).map(|price| price + transport_cost)
        })
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::economy::{EconomyGraph, RecipeInput};

    #[test]
    fn raw_material_floor_is_one() {
        let mut graph = EconomyGraph::new();
        let ore = graph.add_product("Ore", None, vec![]).unwrap();
        let actor = ActorState::new_producer(1, ore, &graph, &EngineConfig::default());
        assert_eq!(recipe_floor(&actor), 1);
    }

    #[test]
    fn processor_floor_uses_input_prices_and_margin() {
        let mut graph = EconomyGraph::new();
        let ore = graph.add_product("Ore", None, vec![]).unwrap();
        let ingot = graph
            .add_product("Ingot", None, vec![RecipeInput { product_id: ore, amount: 2.0 }])
            .unwrap();
        let mut actor = ActorState::new_producer(1, ingot, &graph, &EngineConfig::default());
        actor.min_input_prices.insert(ore, 3.0);
        // 2 * 3 * 1.05 = 6.3 -> ceil = 7
        assert_eq!(recipe_floor(&actor), 7);
    }

    #[test]
    fn price_rises_below_ideal_and_falls_above_but_never_under_floor() {
        let slot_low = StorageSlot::new_producer(20.0, 5, 10);
        assert_eq!(adjust_price(3, &slot_low, 1), Some(4));

        let mut slot_high = StorageSlot::new_producer(20.0, 5, 10);
        slot_high.current = 11.0;
        assert_eq!(adjust_price(2, &slot_high, 1), Some(1));
        assert_eq!(adjust_price(5, &slot_high, 3), Some(4));
    }

    #[test]
    fn warehouse_price_is_one_at_ideal() {
        let slot = StorageSlot::new_warehouse(100.0, 50.0);
        let mut at_ideal = slot;
        at_ideal.current = 50.0;
        assert_eq!(warehouse_price(&at_ideal), 1.0);
    }

    #[test]
    fn warehouse_price_rises_as_stock_falls_below_ideal() {
        let mut slot = StorageSlot::new_warehouse(100.0, 50.0);
        slot.current = 0.0;
        assert_eq!(warehouse_price(&slot), 5.0);
    }

    #[test]
    fn warehouse_price_floors_at_one_when_above_ideal() {
        let mut slot = StorageSlot::new_warehouse(100.0, 50.0);
        slot.current = 100.0;
        assert_eq!(warehouse_price(&slot), 1.0);
    }

    #[test]
    fn min_input_price_ignores_sellers_without_stock_or_the_product() {
        let graph = EconomyGraph::new();
        let mut empty = ActorState::new_warehouse(1, &[], &graph, &EngineConfig::default());
        empty.output_storage.insert(0, StorageSlot::new_warehouse(10.0, 5.0));
        let mut stocked = ActorState::new_warehouse(2, &[], &graph, &EngineConfig::default());
        stocked.output_storage.insert(0, StorageSlot::new_warehouse(10.0, 5.0));
        stocked.output_storage.get_mut(&0).unwrap().current = 4.0;
        stocked.warehouse_prices.insert(0, 2.0);

        let best = min_input_price(0, vec![(&empty, 0.0), (&stocked, 1.5)].into_iter());
        assert_eq!(best, 3.5);
    }
}

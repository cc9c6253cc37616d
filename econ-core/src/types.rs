//! Core scalar and identifier types shared across every component.

/// Stable integer id of a product in the economy graph. Insertion order does
/// not matter; ids are never reused within a single graph's lifetime.
pub type ProductId = u32;

/// Id of a placed map object, owned by the host game. The engine never
/// allocates these — they arrive through [`crate::external::ObjectSource`].
pub type ObjectId = u64;

/// Id of a contract, allocated by the engine (`next_contract_id`).
pub type ContractId = u64;

/// Id of an active trader, allocated by the engine (`next_trader_id`).
pub type TraderId = u64;

/// Id of a route, allocated by the host game (`nextRouteId` in a v4 save).
pub type RouteId = u64;

/// A grid cell, `(gx, gz)`.
pub type GridCoord = (i32, i32);

/// Storage quantities and production progress are real-valued: recipes and
/// warehouse capacity-per-product use fractional amounts.
pub type Quantity = f64;

/// Producer prices are integers, purely additive (§4.6).
pub type ProducerPrice = i64;

/// Warehouse prices are a continuous curve over storage pressure, always >= 1.
pub type WarehousePrice = f64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_coord_is_a_plain_pair() {
        let c: GridCoord = (3, -2);
        assert_eq!(c.0, 3);
        assert_eq!(c.1, -2);
    }
}

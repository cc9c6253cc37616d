//! C1 — Economy Graph: a DAG of products with input recipes.
//!
//! The simulation never mutates this graph; it is edited only between runs
//! (§4.1). Validation always runs on a trial copy first — the live graph is
//! mutated only once validation succeeds, so a rejected edit leaves no trace.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ProductId;

/// One input the product's recipe consumes, `amount` per unit produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub product_id: ProductId,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub icon: Option<String>,
    pub inputs: Vec<RecipeInput>,
}

impl Product {
    pub fn is_raw_material(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EconomyGraph {
    products: HashMap<ProductId, Product>,
    /// Insertion order, for tie-break in `topological_order`.
    insertion_order: Vec<ProductId>,
    next_id: ProductId,
    fuel_product: Option<ProductId>,
}

impl EconomyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }

    pub fn fuel_product(&self) -> Option<ProductId> {
        self.fuel_product
    }

    pub fn next_node_id(&self) -> ProductId {
        self.next_id
    }

    /// Records the fuel designation. At most one product is ever fuel; `None`
    /// clears it. No validation beyond existence — a non-existent id is
    /// simply not rendered meaningful by the rest of the engine, but we still
    /// reject it outright since a dangling designation is never useful.
    pub fn set_fuel(&mut self, id: Option<ProductId>) -> Result<()> {
        if let Some(id) = id
            && !self.products.contains_key(&id)
        {
            return Err(Error::InvalidInput(format!("no such product {id}")));
        }
        self.fuel_product = id;
        Ok(())
    }

    pub fn add_product(
        &mut self,
        name: impl Into<String>,
        icon: Option<String>,
        inputs: Vec<RecipeInput>,
    ) -> Result<ProductId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("product name is empty".into()));
        }
        for input in &inputs {
            if !self.products.contains_key(&input.product_id) {
                return Err(Error::InvalidInput(format!(
                    "input references missing product {}",
                    input.product_id
                )));
            }
        }

        let id = self.next_id;
        let mut trial = self.products.clone();
        trial.insert(
            id,
            Product {
                id,
                name: name.clone(),
                icon: icon.clone(),
                inputs: inputs.clone(),
            },
        );
        check_acyclic(&trial)?;

        self.products.insert(
            id,
            Product {
                id,
                name,
                icon,
                inputs,
            },
        );
        self.insertion_order.push(id);
        self.next_id += 1;
        Ok(id)
    }

    pub fn update_product(
        &mut self,
        id: ProductId,
        name: impl Into<String>,
        icon: Option<String>,
        inputs: Vec<RecipeInput>,
    ) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("product name is empty".into()));
        }
        if !self.products.contains_key(&id) {
            return Err(Error::InvalidInput(format!("no such product {id}")));
        }
        for input in &inputs {
            if input.product_id == id {
                return Err(Error::InvalidInput("product cannot reference itself".into()));
            }
            if !self.products.contains_key(&input.product_id) {
                return Err(Error::InvalidInput(format!(
                    "input references missing product {}",
                    input.product_id
                )));
            }
        }

        let mut trial = self.products.clone();
        trial.insert(
            id,
            Product {
                id,
                name: name.clone(),
                icon: icon.clone(),
                inputs: inputs.clone(),
            },
        );
        check_acyclic(&trial)?;

        let product = self.products.get_mut(&id).expect("checked above");
        product.name = name;
        product.icon = icon;
        product.inputs = inputs;
        Ok(())
    }

    pub fn delete_product(&mut self, id: ProductId) -> Result<()> {
        if !self.products.contains_key(&id) {
            return Err(Error::InvalidInput(format!("no such product {id}")));
        }
        let has_dependents = self
            .products
            .values()
            .any(|p| p.id != id && p.inputs.iter().any(|i| i.product_id == id));
        if has_dependents {
            return Err(Error::DependentsExist(id));
        }
        self.products.remove(&id);
        self.insertion_order.retain(|&pid| pid != id);
        if self.fuel_product == Some(id) {
            self.fuel_product = None;
        }
        Ok(())
    }

    /// One valid topological order, ties broken by ascending insertion id.
    pub fn topological_order(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.products.keys().copied().collect();
        ids.sort_unstable();

        let mut visited: HashSet<ProductId> = HashSet::new();
        let mut order = Vec::with_capacity(ids.len());

        for &start in &ids {
            if visited.contains(&start) {
                continue;
            }
            visit_topo(&self.products, start, &mut visited, &mut order);
        }
        order
    }

    /// Each product's length of the longest path from any raw material; raw
    /// materials themselves have depth 0.
    pub fn depths(&self) -> HashMap<ProductId, u32> {
        let order = self.topological_order();
        let mut depths: HashMap<ProductId, u32> = HashMap::new();
        for id in order {
            let product = &self.products[&id];
            let depth = product
                .inputs
                .iter()
                .map(|i| depths.get(&i.product_id).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            depths.insert(id, depth);
        }
        depths
    }
}

/// Post-order DFS: visit inputs before the node itself so a node always
/// appears after everything it depends on.
fn visit_topo(
    products: &HashMap<ProductId, Product>,
    id: ProductId,
    visited: &mut HashSet<ProductId>,
    order: &mut Vec<ProductId>,
) {
    if !visited.insert(id) {
        return;
    }
    let mut input_ids: Vec<ProductId> = products[&id].inputs.iter().map(|i| i.product_id).collect();
    input_ids.sort_unstable();
    for input_id in input_ids {
        if !visited.contains(&input_id) {
            visit_topo(products, input_id, visited, order);
        }
    }
    order.push(id);
}

/// Iterative DFS with `visited`/`on_stack` sets, as specified in §4.1.
fn check_acyclic(products: &HashMap<ProductId, Product>) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        OnStack,
        Done,
    }

    let mut marks: HashMap<ProductId, Mark> = HashMap::new();
    let mut ids: Vec<ProductId> = products.keys().copied().collect();
    ids.sort_unstable();

    for &start in &ids {
        if marks.contains_key(&start) {
            continue;
        }
        // Explicit stack of (node, next-input-index-to-visit).
        let mut stack: Vec<(ProductId, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::OnStack);

        while let Some(&(node, idx)) = stack.last() {
            let inputs = &products[&node].inputs;
            if idx >= inputs.len() {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            }
            stack.last_mut().unwrap().1 += 1;
            let next = inputs[idx].product_id;
            match marks.get(&next) {
                Some(Mark::OnStack) => return Err(Error::CycleViolation),
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::OnStack);
                    stack.push((next, 0));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_inputs() -> Vec<RecipeInput> {
        Vec::new()
    }

    #[test]
    fn add_raw_material() {
        let mut g = EconomyGraph::new();
        let ore = g.add_product("Ore", None, no_inputs()).unwrap();
        assert!(g.get(ore).unwrap().is_raw_material());
    }

    #[test]
    fn rejects_empty_name() {
        let mut g = EconomyGraph::new();
        assert_eq!(
            g.add_product("   ", None, no_inputs()).unwrap_err(),
            Error::InvalidInput("product name is empty".into())
        );
    }

    #[test]
    fn rejects_missing_input() {
        let mut g = EconomyGraph::new();
        let err = g
            .add_product("Ingot", None, vec![RecipeInput { product_id: 99, amount: 1.0 }])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn detects_direct_cycle_on_update() {
        let mut g = EconomyGraph::new();
        let a = g.add_product("A", None, no_inputs()).unwrap();
        let err = g
            .update_product(a, "A", None, vec![RecipeInput { product_id: a, amount: 1.0 }])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn detects_transitive_cycle() {
        let mut g = EconomyGraph::new();
        let a = g.add_product("A", None, no_inputs()).unwrap();
        let b = g
            .add_product("B", None, vec![RecipeInput { product_id: a, amount: 1.0 }])
            .unwrap();
        // a -> b already exists (b depends on a); now try a depends on b.
        let err = g
            .update_product(a, "A", None, vec![RecipeInput { product_id: b, amount: 1.0 }])
            .unwrap_err();
        assert_eq!(err, Error::CycleViolation);
    }

    #[test]
    fn delete_rejects_when_dependents_exist() {
        let mut g = EconomyGraph::new();
        let a = g.add_product("A", None, no_inputs()).unwrap();
        g.add_product("B", None, vec![RecipeInput { product_id: a, amount: 1.0 }])
            .unwrap();
        assert_eq!(g.delete_product(a).unwrap_err(), Error::DependentsExist(a));
    }

    #[test]
    fn topological_order_respects_dependencies() {
        let mut g = EconomyGraph::new();
        let ore = g.add_product("Ore", None, no_inputs()).unwrap();
        let ingot = g
            .add_product("Ingot", None, vec![RecipeInput { product_id: ore, amount: 2.0 }])
            .unwrap();
        let order = g.topological_order();
        let ore_pos = order.iter().position(|&x| x == ore).unwrap();
        let ingot_pos = order.iter().position(|&x| x == ingot).unwrap();
        assert!(ore_pos < ingot_pos);
    }

    #[test]
    fn depths_follow_longest_path() {
        let mut g = EconomyGraph::new();
        let ore = g.add_product("Ore", None, no_inputs()).unwrap();
        let ingot = g
            .add_product("Ingot", None, vec![RecipeInput { product_id: ore, amount: 2.0 }])
            .unwrap();
        let tool = g
            .add_product("Tool", None, vec![RecipeInput { product_id: ingot, amount: 1.0 }])
            .unwrap();
        let depths = g.depths();
        assert_eq!(depths[&ore], 0);
        assert_eq!(depths[&ingot], 1);
        assert_eq!(depths[&tool], 2);
    }

    #[test]
    fn set_fuel_rejects_missing_product() {
        let mut g = EconomyGraph::new();
        assert!(g.set_fuel(Some(7)).is_err());
    }

    #[test]
    fn round_trips_through_serde_json() {
        let mut g = EconomyGraph::new();
        let ore = g.add_product("Ore", None, no_inputs()).unwrap();
        g.add_product("Ingot", None, vec![RecipeInput { product_id: ore, amount: 2.0 }])
            .unwrap();
        g.set_fuel(Some(ore)).unwrap();

        let json = serde_json::to_string(&g).unwrap();
        let back: EconomyGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.products().count(), g.products().count());
        assert_eq!(back.fuel_product(), g.fuel_product());
        assert_eq!(back.next_node_id(), g.next_node_id());
    }
}

//! C7 — Contract Book: discovery, maintenance, replacement, per-actor quotas.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::types::{ContractId, ObjectId, ProductId};

#[cfg(feature = "instrument")]
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub source_object_id: ObjectId,
    pub destination_object_id: ObjectId,
    pub product_id: ProductId,
    pub amount_per_shipment: u32,
    pub unit_price: i64,
    pub score: f64,
    pub created_tick: u64,
}

impl Contract {
    pub fn touches(&self, object_id: ObjectId) -> bool {
        self.source_object_id == object_id || self.destination_object_id == object_id
    }
}

/// A proposed trade, not yet assigned an id or insertion tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub source_object_id: ObjectId,
    pub destination_object_id: ObjectId,
    pub product_id: ProductId,
    pub amount_per_shipment: u32,
    pub unit_price: i64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractBook {
    contracts: HashMap<ContractId, Contract>,
    /// Insertion order, preserved so iteration is deterministic (§5).
    order: Vec<ContractId>,
    next_id: ContractId,
}

impl ContractBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.order.iter().filter_map(|id| self.contracts.get(id))
    }

    pub fn get(&self, id: ContractId) -> Option<&Contract> {
        self.contracts.get(&id)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn find(
        &self,
        source_object_id: ObjectId,
        destination_object_id: ObjectId,
        product_id: ProductId,
    ) -> Option<&Contract> {
        self.iter().find(|c| {
            c.source_object_id == source_object_id
                && c.destination_object_id == destination_object_id
                && c.product_id == product_id
        })
    }

    pub fn count_touching(&self, object_id: ObjectId) -> u32 {
        self.iter().filter(|c| c.touches(object_id)).count() as u32
    }

    pub fn remove(&mut self, id: ContractId) -> Option<Contract> {
        self.order.retain(|&cid| cid != id);
        self.contracts.remove(&id)
    }

    pub fn refresh_score(&mut self, id: ContractId, score: f64) {
        if let Some(contract) = self.contracts.get_mut(&id) {
            contract.score = score;
        }
    }

    /// Drops any contract for which `keep` returns `false`. `keep` should
    /// encode the §4.7 maintenance rules: endpoint existence, source's
    /// recipe-floor no longer under `unit_price`, destination not above ideal.
    pub fn retain(&mut self, mut keep: impl FnMut(&Contract) -> bool) {
        let mut dropped = Vec::new();
        for contract in self.contracts.values() {
            if !keep(contract) {
                dropped.push(contract.id);
            }
        }
        for id in dropped {
            self.remove(id);
        }
    }

    /// Forces the next allocated id, used to restore a save's `nextContractId`
    /// even when it exceeds every contract actually present (e.g. after
    /// deletions before the save was taken).
    pub fn set_next_id(&mut self, id: ContractId) {
        self.next_id = self.next_id.max(id);
    }

    /// Inserts a contract with its id and tick preserved verbatim, bypassing
    /// quota checks. Used when restoring a saved simulation.
    pub fn insert_raw(&mut self, contract: Contract) {
        self.next_id = self.next_id.max(contract.id + 1);
        if !self.contracts.contains_key(&contract.id) {
            self.order.push(contract.id);
        }
        self.contracts.insert(contract.id, contract);
    }

    fn insert_new(&mut self, candidate: Candidate, current_tick: u64) -> ContractId {
        let id = self.next_id;
        self.next_id += 1;
        let contract = Contract {
            id,
            source_object_id: candidate.source_object_id,
            destination_object_id: candidate.destination_object_id,
            product_id: candidate.product_id,
            amount_per_shipment: candidate.amount_per_shipment,
            unit_price: candidate.unit_price,
            score: candidate.score,
            created_tick: current_tick,
        };
        self.contracts.insert(id, contract);
        self.order.push(id);
        #[cfg(feature = "instrument")]
        debug!(
            contract_id = id,
            source = candidate.source_object_id,
            destination = candidate.destination_object_id,
            product_id = candidate.product_id,
            "contract created"
        );
        id
    }

    /// §4.7 step 4. Inserts `candidate` if neither endpoint is at quota.
    /// Otherwise looks only at contracts touching a saturated endpoint and
    /// replaces the worst-scoring one if it has aged past the minimum
    /// lifetime and the candidate clears the replacement margin.
    pub fn insert_or_replace(
        &mut self,
        candidate: Candidate,
        config: &EngineConfig,
        current_tick: u64,
    ) -> Option<ContractId> {
        let source_at_quota =
            self.count_touching(candidate.source_object_id) >= config.max_contracts_per_actor;
        let dest_at_quota =
            self.count_touching(candidate.destination_object_id) >= config.max_contracts_per_actor;

        if !source_at_quota && !dest_at_quota {
            return Some(self.insert_new(candidate, current_tick));
        }

        let saturated: Vec<ObjectId> = [
            source_at_quota.then_some(candidate.source_object_id),
            dest_at_quota.then_some(candidate.destination_object_id),
        ]
        .into_iter()
        .flatten()
        .collect();

        let worst = self
            .iter()
            .filter(|c| saturated.iter().any(|&id| c.touches(id)))
            .min_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .copied()?;

        let aged_enough =
            worst.created_tick + config.min_contract_lifetime_ticks <= current_tick;
        let clears_margin = candidate.score > worst.score * config.replacement_margin;

        if aged_enough && clears_margin {
            #[cfg(feature = "instrument")]
            debug!(
                replaced_contract_id = worst.id,
                replaced_score = worst.score,
                candidate_score = candidate.score,
                "contract replaced"
            );
            self.remove(worst.id);
            Some(self.insert_new(candidate, current_tick))
        } else {
            None
        }
    }
}

/// §4.7 best-buyer score: deficit-weighted, transport-cost-discounted, with
/// an optional fuel-as-transport-reserve penalty.
pub fn score_candidate(deficit: f64, capacity: f64, transport_cost: f64, fuel_penalty: Option<f64>) -> f64 {
    let base = (deficit / capacity) / (1.0 + transport_cost);
    match fuel_penalty {
        Some(penalty) => base * penalty,
        None => base,
    }
}

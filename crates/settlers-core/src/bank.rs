//! The shared bank: a finite resource pool plus the undrawn development deck.

use crate::inventory::{DevCardHand, DevelopmentCard, Resource, ResourceHand};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Units of each resource in a fresh bank
pub const INITIAL_RESOURCE_SUPPLY: u32 = 19;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    resources: ResourceHand,
    development_deck: DevCardHand,
}

impl Bank {
    pub fn standard() -> Self {
        Self {
            resources: ResourceHand::uniform(INITIAL_RESOURCE_SUPPLY),
            development_deck: DevCardHand::standard_deck(),
        }
    }

    pub fn resources(&self) -> &ResourceHand {
        &self.resources
    }

    pub fn development_deck(&self) -> &DevCardHand {
        &self.development_deck
    }

    pub fn available(&self, resource: Resource) -> u32 {
        self.resources.get(resource)
    }

    /// Return resources to the bank
    pub fn deposit(&mut self, bundle: &ResourceHand) {
        self.resources.add_hand(bundle);
    }

    /// Take resources out of the bank. A request that cannot be covered in
    /// full takes nothing and returns false.
    pub fn withdraw(&mut self, bundle: &ResourceHand) -> bool {
        self.resources.try_subtract(bundle)
    }

    /// Withdraw as much of `bundle` as the bank holds and return what was taken
    pub fn withdraw_up_to(&mut self, bundle: &ResourceHand) -> ResourceHand {
        let mut granted = ResourceHand::new();
        for (resource, wanted) in bundle.iter() {
            granted.add(resource, wanted.min(self.available(resource)));
        }
        // granted never exceeds the pool, so this cannot fail
        self.resources.try_subtract(&granted);
        granted
    }

    /// Draw one card uniformly from the remaining deck
    pub fn draw_development_card<R: Rng>(&mut self, rng: &mut R) -> Option<DevelopmentCard> {
        let card = self.development_deck.pick_random(rng)?;
        self.development_deck.remove(card);
        Some(card)
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::standard()
    }
}

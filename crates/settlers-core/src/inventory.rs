//! Resource and development-card inventories.
//!
//! Both kinds of inventory are small fixed multisets. They are used for player
//! hands, the bank, trade offers and building costs alike.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Brick,
    Lumber,
    Ore,
    Grain,
    Wool,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Ore,
        Resource::Grain,
        Resource::Wool,
    ];
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Brick => "brick",
            Resource::Lumber => "lumber",
            Resource::Ore => "ore",
            Resource::Grain => "grain",
            Resource::Wool => "wool",
        };
        f.write_str(name)
    }
}

/// Development card kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DevelopmentCard {
    /// Move the robber and steal; counts toward Largest Army
    Soldier,
    /// One victory point when played
    Monument,
    /// Two free roads
    RoadBuilding,
    /// Two resources from the bank
    YearOfPlenty,
    /// Every other player hands over all of one resource
    Monopoly,
}

impl DevelopmentCard {
    pub const ALL: [DevelopmentCard; 5] = [
        DevelopmentCard::Soldier,
        DevelopmentCard::Monument,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::YearOfPlenty,
        DevelopmentCard::Monopoly,
    ];
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub lumber: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceHand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amounts(brick: u32, lumber: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            lumber,
            ore,
            grain,
            wool,
        }
    }

    /// A hand holding `amount` of every resource
    pub fn uniform(amount: u32) -> Self {
        Self::with_amounts(amount, amount, amount, amount, amount)
    }

    /// A hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        Resource::ALL
            .iter()
            .fold(0u32, |sum, &resource| sum.saturating_add(self.get(resource)))
    }

    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|&resource| self.get(resource) == 0)
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Lumber => self.lumber,
            Resource::Ore => self.ore,
            Resource::Grain => self.grain,
            Resource::Wool => self.wool,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Brick => &mut self.brick,
            Resource::Lumber => &mut self.lumber,
            Resource::Ore => &mut self.ore,
            Resource::Grain => &mut self.grain,
            Resource::Wool => &mut self.wool,
        }
    }

    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot(resource) = count;
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        let slot = self.slot(resource);
        *slot = slot.saturating_add(amount);
    }

    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if every count covers the corresponding count of `cost`
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|&resource| self.get(resource) >= cost.get(resource))
    }

    /// The first resource this hand cannot cover, with (needed, held)
    pub fn first_shortfall(&self, cost: &ResourceHand) -> Option<(Resource, u32, u32)> {
        Resource::ALL.iter().find_map(|&resource| {
            let (needed, held) = (cost.get(resource), self.get(resource));
            (held < needed).then_some((resource, needed, held))
        })
    }

    /// Subtract `cost` as a whole, or leave the hand untouched and return false
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            *self.slot(resource) -= cost.get(resource);
        }
        true
    }

    /// Take every unit of one resource, returning how many were taken
    pub fn take_all(&mut self, resource: Resource) -> u32 {
        std::mem::take(self.slot(resource))
    }

    /// Pick one card uniformly at random without removing it
    pub fn pick_random<R: Rng>(&self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut index = rng.gen_range(0..total);
        for resource in Resource::ALL {
            let count = self.get(resource);
            if index < count {
                return Some(resource);
            }
            index -= count;
        }
        None
    }

    /// Iterate over (resource, count) pairs with a non-zero count
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|resource| (resource, self.get(resource)))
            .filter(|(_, count)| *count > 0)
    }
}

/// Counts of development cards, one per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevCardHand {
    pub soldier: u32,
    pub monument: u32,
    pub road_building: u32,
    pub year_of_plenty: u32,
    pub monopoly: u32,
}

impl DevCardHand {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard 25 card deck
    pub fn standard_deck() -> Self {
        Self {
            soldier: 14,
            monument: 5,
            road_building: 2,
            year_of_plenty: 2,
            monopoly: 2,
        }
    }

    pub fn get(&self, card: DevelopmentCard) -> u32 {
        match card {
            DevelopmentCard::Soldier => self.soldier,
            DevelopmentCard::Monument => self.monument,
            DevelopmentCard::RoadBuilding => self.road_building,
            DevelopmentCard::YearOfPlenty => self.year_of_plenty,
            DevelopmentCard::Monopoly => self.monopoly,
        }
    }

    fn slot(&mut self, card: DevelopmentCard) -> &mut u32 {
        match card {
            DevelopmentCard::Soldier => &mut self.soldier,
            DevelopmentCard::Monument => &mut self.monument,
            DevelopmentCard::RoadBuilding => &mut self.road_building,
            DevelopmentCard::YearOfPlenty => &mut self.year_of_plenty,
            DevelopmentCard::Monopoly => &mut self.monopoly,
        }
    }

    pub fn add(&mut self, card: DevelopmentCard, amount: u32) {
        *self.slot(card) += amount;
    }

    pub fn add_hand(&mut self, other: &DevCardHand) {
        for card in DevelopmentCard::ALL {
            self.add(card, other.get(card));
        }
    }

    /// Remove one card of the given kind, returning false if none is held
    pub fn remove(&mut self, card: DevelopmentCard) -> bool {
        let slot = self.slot(card);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn total(&self) -> u32 {
        DevelopmentCard::ALL.iter().map(|&card| self.get(card)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Pick one card uniformly at random without removing it
    pub fn pick_random<R: Rng>(&self, rng: &mut R) -> Option<DevelopmentCard> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut index = rng.gen_range(0..total);
        for card in DevelopmentCard::ALL {
            let count = self.get(card);
            if index < count {
                return Some(card);
            }
            index -= count;
        }
        None
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// 1 brick, 1 lumber
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// 1 brick, 1 lumber, 1 grain, 1 wool
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 1, 1)
    }

    /// 3 ore, 2 grain
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 3, 2, 0)
    }

    /// 1 ore, 1 grain, 1 wool
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

//! Longest road and largest army.
//!
//! Holders are recomputed from scratch after any mutation that could change
//! them. A score below the threshold never qualifies. The incumbent keeps
//! the title on a tie; otherwise only a unique leader takes it.

use crate::board::{Board, Seat};
use crate::player::Player;
use serde::{Deserialize, Serialize};

/// Minimum trail length for longest road
pub const LONGEST_ROAD_MIN: u32 = 5;

/// Minimum soldiers played for largest army
pub const LARGEST_ARMY_MIN: u32 = 3;

/// Victory points granted by each achievement
pub const ACHIEVEMENT_POINTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Achievement {
    LongestRoad,
    LargestArmy,
}

/// A change of holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderChange {
    pub achievement: Achievement,
    pub from: Option<Seat>,
    pub to: Option<Seat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievements {
    pub longest_road: Option<Seat>,
    pub largest_army: Option<Seat>,
}

impl Achievements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, achievement: Achievement) -> Option<Seat> {
        match achievement {
            Achievement::LongestRoad => self.longest_road,
            Achievement::LargestArmy => self.largest_army,
        }
    }

    /// Bonus victory points held by a seat
    pub fn points_for(&self, seat: Seat) -> u32 {
        [self.longest_road, self.largest_army]
            .iter()
            .filter(|holder| **holder == Some(seat))
            .count() as u32
            * ACHIEVEMENT_POINTS
    }

    pub fn recompute_longest_road(&mut self, board: &Board, players: &[Player]) -> Option<HolderChange> {
        let scores: Vec<(Seat, u32)> = players
            .iter()
            .map(|p| (p.seat, board.longest_road(p.seat)))
            .collect();
        self.update(Achievement::LongestRoad, &scores, LONGEST_ROAD_MIN)
    }

    pub fn recompute_largest_army(&mut self, players: &[Player]) -> Option<HolderChange> {
        let scores: Vec<(Seat, u32)> = players.iter().map(|p| (p.seat, p.soldiers_played)).collect();
        self.update(Achievement::LargestArmy, &scores, LARGEST_ARMY_MIN)
    }

    fn update(
        &mut self,
        achievement: Achievement,
        scores: &[(Seat, u32)],
        threshold: u32,
    ) -> Option<HolderChange> {
        let slot = match achievement {
            Achievement::LongestRoad => &mut self.longest_road,
            Achievement::LargestArmy => &mut self.largest_army,
        };
        let from = *slot;
        let to = select_holder(from, scores, threshold);
        *slot = to;
        (from != to).then_some(HolderChange {
            achievement,
            from,
            to,
        })
    }
}

/// Decide the holder given every seat's score
pub fn select_holder(incumbent: Option<Seat>, scores: &[(Seat, u32)], threshold: u32) -> Option<Seat> {
    let best = scores
        .iter()
        .map(|(_, score)| *score)
        .filter(|score| *score >= threshold)
        .max()?;
    let leaders: Vec<Seat> = scores
        .iter()
        .filter(|(_, score)| *score == best)
        .map(|(seat, _)| *seat)
        .collect();

    match incumbent {
        Some(seat) if leaders.contains(&seat) => Some(seat),
        _ if leaders.len() == 1 => leaders.first().copied(),
        _ => None,
    }
}

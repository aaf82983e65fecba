//! Core game state machine.
//!
//! `GameState` is the aggregate root. `apply` validates a command completely
//! before touching anything, so a rejected command leaves the state exactly
//! as it was. Every successful command advances `version` by one.
//!
//! Randomness inside a command (steals, development card draws) comes from
//! an rng seeded by the game seed and the current version. Dice totals are
//! carried by the `rollDice` command itself. Replaying the same commands on
//! the same setup therefore always reproduces the same state.

use crate::achievements::Achievements;
use crate::bank::Bank;
use crate::board::{Board, Seat, VertexBuilding};
use crate::command::{Command, CommandKind, GameEvent, TradeOffer};
use crate::error::{
    GameError, GameResult, GeometryViolation, IdentityViolation, Rejection, Shortfall, TurnViolation,
};
use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use crate::inventory::{costs, DevelopmentCard, Resource, ResourceHand};
use crate::player::{PieceKind, Player, PlayerRef, SeatConfig};
use crate::turn::{TurnPhase, TurnTracker, DISCARD_LIMIT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Victory points needed to win
pub const VICTORY_POINTS_TO_WIN: u32 = 10;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Everything needed to create a game; with the command log it fully
/// determines every later state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    pub seed: u64,
    pub seats: Vec<SeatConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub seat: Seat,
    pub message: String,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    /// Indexed by seat
    pub players: Vec<Player>,
    pub turn: TurnTracker,
    pub bank: Bank,
    pub achievements: Achievements,
    pub pending_trade: Option<TradeOffer>,
    pub chat: Vec<ChatMessage>,
    version: u64,
    winner: Option<Seat>,
    seed: u64,
}

impl GameState {
    /// Create a game on the standard board generated from the setup seed
    pub fn new(setup: &GameSetup) -> GameResult<Self> {
        let board = Board::standard_with_rng(&mut StdRng::seed_from_u64(setup.seed));
        Self::with_board(setup, board)
    }

    /// Create a game on a given board
    pub fn with_board(setup: &GameSetup, board: Board) -> GameResult<Self> {
        validate_seats(&setup.seats)?;

        let players: Vec<Player> = setup
            .seats
            .iter()
            .enumerate()
            .map(|(seat, config)| Player::new(seat as Seat, config.clone()))
            .collect();
        let turn = TurnTracker::new(players.len() as u8, board.robber_start());

        Ok(Self {
            board,
            players,
            turn,
            bank: Bank::standard(),
            achievements: Achievements::new(),
            pending_trade: None,
            chat: Vec::new(),
            version: 0,
            winner: None,
            seed: setup.seed,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, seat: Seat) -> GameResult<&Player> {
        self.players
            .get(seat as usize)
            .ok_or_else(|| IdentityViolation::UnknownSeat(seat).into())
    }

    /// Seat of a user; users not in this game are an identity violation
    pub fn seat_of(&self, user: &PlayerRef) -> GameResult<Seat> {
        self.players
            .iter()
            .find(|p| p.user == *user)
            .map(|p| p.seat)
            .ok_or_else(|| IdentityViolation::NotSeated(*user).into())
    }

    /// Seats the given thief could rob at `hex`
    pub fn robbable_from(&self, thief: Seat, hex: &HexCoord) -> BTreeSet<Seat> {
        self.board
            .players_adjacent_to_hex(hex)
            .into_iter()
            .filter(|seat| *seat != thief)
            .filter(|seat| {
                self.players
                    .get(*seat as usize)
                    .is_some_and(|p| p.hand_size() > 0)
            })
            .collect()
    }

    // ==================== Command Application ====================

    /// Validate and apply a command. On rejection nothing changes.
    pub fn apply(&mut self, command: &Command) -> Result<Vec<GameEvent>, Rejection> {
        self.execute(command)
            .map_err(|error| Rejection::new(command.name(), error))
    }

    fn execute(&mut self, command: &Command) -> GameResult<Vec<GameEvent>> {
        if self.winner.is_some() {
            return Err(TurnViolation::GameOver.into());
        }
        let seat = self.seat_of(&command.player)?;
        let before = (self.turn.current(), self.turn.phase());

        let mut events = match &command.kind {
            CommandKind::RollDice { number } => self.roll_dice(seat, *number)?,
            CommandKind::FinishTurn => self.finish_turn(seat)?,
            CommandKind::BuildRoad { edge, free } => self.build_road(seat, edge.canonical(), *free)?,
            CommandKind::BuildSettlement { vertex, free } => {
                self.build_settlement(seat, *vertex, *free)?
            }
            CommandKind::BuildCity { vertex } => self.build_city(seat, *vertex)?,
            CommandKind::BuyDevCard => self.buy_dev_card(seat)?,
            CommandKind::PlaySoldier { location, victim } => {
                self.play_soldier(seat, *location, *victim)?
            }
            CommandKind::PlayRoadBuilding { first, second } => {
                self.play_road_building(seat, first.canonical(), second.canonical())?
            }
            CommandKind::PlayYearOfPlenty { first, second } => {
                self.play_year_of_plenty(seat, *first, *second)?
            }
            CommandKind::PlayMonopoly { resource } => self.play_monopoly(seat, *resource)?,
            CommandKind::PlayMonument => self.play_monument(seat)?,
            CommandKind::OfferTrade {
                receiver,
                offering,
                requesting,
            } => self.offer_trade(seat, *receiver, *offering, *requesting)?,
            CommandKind::RespondToTrade { accept } => self.respond_to_trade(seat, *accept)?,
            CommandKind::MaritimeTrade { ratio, input, output } => {
                self.maritime_trade(seat, *ratio, *input, *output)?
            }
            CommandKind::DiscardCards { cards } => self.discard_cards(seat, *cards)?,
            CommandKind::RobPlayer { location, victim } => self.rob_player(seat, *location, *victim)?,
            CommandKind::SendChat { message } => self.send_chat(seat, message.clone()),
        };

        self.version += 1;

        let after = (self.turn.current(), self.turn.phase());
        if after != before {
            events.push(GameEvent::PhaseChanged {
                current: after.0,
                phase: after.1,
            });
        }
        events.extend(self.refresh_scores());
        Ok(events)
    }

    // ==================== Dice Rolling ====================

    fn roll_dice(&mut self, seat: Seat, number: u8) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Rolling])?;
        if !(2..=12).contains(&number) {
            return Err(GameError::Serialization(format!(
                "dice total {number} outside 2..=12"
            )));
        }

        self.player_mut(seat).has_rolled = true;
        let mut events = vec![GameEvent::DiceRolled { seat, number }];

        if number == 7 {
            let owed: BTreeMap<Seat, u32> = self
                .players
                .iter()
                .filter(|p| p.hand_size() > DISCARD_LIMIT)
                .map(|p| (p.seat, p.hand_size() - DISCARD_LIMIT))
                .collect();
            for player in &mut self.players {
                player.has_discarded = false;
            }
            self.turn.begin_robbery(owed);
        } else {
            events.extend(self.produce(number));
            self.turn.begin_playing(number);
        }
        Ok(events)
    }

    /// Pay out a roll. A resource the bank cannot cover for everyone is
    /// withheld from everyone.
    fn produce(&mut self, number: u8) -> Vec<GameEvent> {
        let owed = self.board.resources_for_roll(number, self.turn.robber());

        let mut demand = ResourceHand::new();
        for hand in owed.values() {
            demand.add_hand(hand);
        }
        let withheld: Vec<Resource> = Resource::ALL
            .into_iter()
            .filter(|r| demand.get(*r) > self.bank.available(*r))
            .collect();

        let mut distributions = Vec::new();
        for (seat, mut hand) in owed {
            for resource in &withheld {
                hand.set(*resource, 0);
            }
            let granted = self.bank.withdraw_up_to(&hand);
            if granted.is_empty() {
                continue;
            }
            self.player_mut(seat).resources.add_hand(&granted);
            distributions.push((seat, granted));
        }

        let mut events: Vec<GameEvent> = withheld
            .into_iter()
            .map(|resource| GameEvent::ProductionWithheld { resource })
            .collect();
        if !distributions.is_empty() {
            events.push(GameEvent::ResourcesProduced { distributions });
        }
        events
    }

    fn finish_turn(&mut self, seat: Seat) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;

        let mut events = Vec::new();
        if let Some(offer) = self.pending_trade.take() {
            events.push(GameEvent::TradeWithdrawn { offer });
        }
        self.player_mut(seat).end_turn();
        self.turn.finish_turn();
        events.push(GameEvent::TurnFinished {
            seat,
            next: self.turn.current(),
        });
        Ok(events)
    }

    // ==================== Building ====================

    /// Phase gate shared by road and settlement placement
    fn ensure_build_turn(&self, seat: Seat, free: bool, piece: PieceKind) -> GameResult<()> {
        let phase = self.turn.phase();
        if free {
            if !phase.is_setup() {
                return Err(TurnViolation::FreeOutsideSetup.into());
            }
            self.turn.ensure_current(seat)?;
            let setup = self.turn.setup();
            let placed = match piece {
                PieceKind::Road => setup.road,
                _ => setup.settlement.is_some(),
            };
            if placed {
                return Err(TurnViolation::SetupPiecePlaced(piece).into());
            }
        } else {
            if phase.is_setup() {
                return Err(TurnViolation::PaidDuringSetup.into());
            }
            self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;
        }
        Ok(())
    }

    fn check_road_site(board: &Board, seat: Seat, edge: &EdgeCoord, require_network: bool) -> GameResult<()> {
        if !board.is_land_edge(edge) {
            return Err(GeometryViolation::OffBoard.into());
        }
        if board.edge_owner(edge).is_some() {
            return Err(GeometryViolation::Occupied.into());
        }
        if require_network && !board.is_connected_to_network(edge, seat) {
            return Err(GeometryViolation::NotConnected.into());
        }
        Ok(())
    }

    fn build_road(&mut self, seat: Seat, edge: EdgeCoord, free: bool) -> GameResult<Vec<GameEvent>> {
        self.ensure_build_turn(seat, free, PieceKind::Road)?;
        let player = self.player(seat)?;
        if !free {
            player.ensure_can_afford(&costs::road())?;
        }
        player.ensure_piece(PieceKind::Road)?;
        Self::check_road_site(&self.board, seat, &edge, !free)?;

        if !free {
            self.pay(seat, &costs::road());
        }
        self.board.place_road(edge, seat);
        self.player_mut(seat).roads_remaining -= 1;
        if free {
            self.turn.record_setup_road();
            self.turn.advance_setup();
        }

        let mut events = vec![GameEvent::RoadBuilt {
            seat,
            location: edge,
        }];
        events.extend(self.recompute_longest_road());
        Ok(events)
    }

    fn build_settlement(&mut self, seat: Seat, vertex: VertexCoord, free: bool) -> GameResult<Vec<GameEvent>> {
        self.ensure_build_turn(seat, free, PieceKind::Settlement)?;
        let player = self.player(seat)?;
        if !free {
            player.ensure_can_afford(&costs::settlement())?;
        }
        player.ensure_piece(PieceKind::Settlement)?;
        if !self.board.is_land_vertex(&vertex) {
            return Err(GeometryViolation::OffBoard.into());
        }
        if self.board.building_at(&vertex).is_some() {
            return Err(GeometryViolation::Occupied.into());
        }
        if !self.board.satisfies_distance_rule(&vertex) {
            return Err(GeometryViolation::DistanceRule.into());
        }
        if !free && !self.board.touches_own_road(&vertex, seat) {
            return Err(GeometryViolation::NotConnected.into());
        }

        if !free {
            self.pay(seat, &costs::settlement());
        }
        self.board.place_settlement(vertex, seat);
        self.player_mut(seat).settlements_remaining -= 1;
        let mut events = vec![GameEvent::SettlementBuilt {
            seat,
            location: vertex,
        }];

        if free {
            if self.turn.phase() == TurnPhase::SecondRound {
                let mut starting = ResourceHand::new();
                for tile in self.board.tiles_at_vertex(&vertex) {
                    if let Some(resource) = tile.resource() {
                        starting.add(resource, 1);
                    }
                }
                let granted = self.bank.withdraw_up_to(&starting);
                if !granted.is_empty() {
                    self.player_mut(seat).resources.add_hand(&granted);
                    events.push(GameEvent::StartingResources {
                        seat,
                        resources: granted,
                    });
                }
            }
            self.turn.record_setup_settlement(vertex);
            self.turn.advance_setup();
        }

        // A new settlement can cut an opponent's road
        events.extend(self.recompute_longest_road());
        Ok(events)
    }

    fn build_city(&mut self, seat: Seat, vertex: VertexCoord) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;
        let player = self.player(seat)?;
        player.ensure_can_afford(&costs::city())?;
        player.ensure_piece(PieceKind::City)?;
        if self.board.building_at(&vertex) != Some(VertexBuilding::Settlement(seat)) {
            return Err(GeometryViolation::NoSettlement.into());
        }

        self.pay(seat, &costs::city());
        self.board.upgrade_to_city(vertex, seat);
        let player = self.player_mut(seat);
        player.cities_remaining -= 1;
        player.settlements_remaining += 1;

        Ok(vec![GameEvent::CityBuilt {
            seat,
            location: vertex,
        }])
    }

    fn buy_dev_card(&mut self, seat: Seat) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;
        self.player(seat)?
            .ensure_can_afford(&costs::development_card())?;
        if self.bank.development_deck().is_empty() {
            return Err(Shortfall::DeckEmpty.into());
        }

        self.pay(seat, &costs::development_card());
        let mut rng = self.command_rng();
        if let Some(card) = self.bank.draw_development_card(&mut rng) {
            self.player_mut(seat).new_dev_cards.add(card, 1);
        }
        Ok(vec![GameEvent::DevelopmentCardBought { seat }])
    }

    // ==================== Robber ====================

    fn validate_robbery(&self, seat: Seat, location: HexCoord, victim: Option<Seat>) -> GameResult<()> {
        if !self.board.is_land_hex(&location) {
            return Err(GeometryViolation::OffBoard.into());
        }
        if location == self.turn.robber() {
            return Err(GeometryViolation::RobberNotMoved.into());
        }
        let eligible = self.robbable_from(seat, &location);
        // No victim means the robber moves without a steal
        if let Some(victim) = victim {
            self.player(victim)?;
            if !eligible.contains(&victim) {
                return Err(GeometryViolation::InvalidVictim(victim).into());
            }
        }
        Ok(())
    }

    /// Move the robber and steal one random card from the victim
    fn relocate_robber(&mut self, seat: Seat, location: HexCoord, victim: Option<Seat>) -> Vec<GameEvent> {
        let from = self.turn.robber();
        self.turn.move_robber(location);
        let mut events = vec![GameEvent::RobberMoved {
            seat,
            from,
            to: location,
        }];

        if let Some(victim) = victim {
            let mut rng = self.command_rng();
            let stolen = self.players[victim as usize].resources.pick_random(&mut rng);
            if let Some(resource) = stolen {
                let card = ResourceHand::single(resource, 1);
                if self.players[victim as usize].resources.try_subtract(&card) {
                    self.player_mut(seat).resources.add(resource, 1);
                    events.push(GameEvent::ResourceStolen {
                        thief: seat,
                        victim,
                        resource,
                    });
                }
            }
        }
        events
    }

    fn rob_player(&mut self, seat: Seat, location: HexCoord, victim: Option<Seat>) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Robbing])?;
        self.validate_robbery(seat, location, victim)?;
        Ok(self.relocate_robber(seat, location, victim))
    }

    fn discard_cards(&mut self, seat: Seat, cards: ResourceHand) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_phase(&[TurnPhase::Discarding])?;
        let owed = self
            .turn
            .discard_owed_by(seat)
            .ok_or(TurnViolation::NoDiscardOwed)?;
        if cards.total() != owed {
            return Err(Shortfall::DiscardCount {
                expected: owed,
                got: cards.total(),
            }
            .into());
        }
        self.player(seat)?.ensure_can_afford(&cards)?;

        self.pay(seat, &cards);
        self.player_mut(seat).has_discarded = true;
        self.turn.record_discard(seat);
        Ok(vec![GameEvent::CardsDiscarded { seat, cards }])
    }

    // ==================== Development Cards ====================

    fn ensure_can_play(&self, seat: Seat, card: DevelopmentCard) -> GameResult<()> {
        self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;
        self.player(seat)?.ensure_playable(card)
    }

    fn card_played(&mut self, seat: Seat, card: DevelopmentCard) -> GameEvent {
        self.player_mut(seat).consume_dev_card(card);
        GameEvent::DevelopmentCardPlayed { seat, card }
    }

    fn play_soldier(&mut self, seat: Seat, location: HexCoord, victim: Option<Seat>) -> GameResult<Vec<GameEvent>> {
        self.ensure_can_play(seat, DevelopmentCard::Soldier)?;
        self.validate_robbery(seat, location, victim)?;

        let mut events = vec![self.card_played(seat, DevelopmentCard::Soldier)];
        events.extend(self.relocate_robber(seat, location, victim));
        events.extend(
            self.achievements
                .recompute_largest_army(&self.players)
                .map(GameEvent::AchievementChanged),
        );
        Ok(events)
    }

    fn play_road_building(&mut self, seat: Seat, first: EdgeCoord, second: EdgeCoord) -> GameResult<Vec<GameEvent>> {
        self.ensure_can_play(seat, DevelopmentCard::RoadBuilding)?;
        if self.player(seat)?.roads_remaining < 2 {
            return Err(Shortfall::Pieces(PieceKind::Road).into());
        }
        if first == second {
            return Err(GeometryViolation::DuplicateRoad.into());
        }
        Self::check_road_site(&self.board, seat, &first, true)?;
        // The second road may extend from the first
        let mut preview = self.board.clone();
        preview.place_road(first, seat);
        Self::check_road_site(&preview, seat, &second, true)?;

        preview.place_road(second, seat);
        self.board = preview;
        self.player_mut(seat).roads_remaining -= 2;

        let mut events = vec![
            self.card_played(seat, DevelopmentCard::RoadBuilding),
            GameEvent::RoadBuilt {
                seat,
                location: first,
            },
            GameEvent::RoadBuilt {
                seat,
                location: second,
            },
        ];
        events.extend(self.recompute_longest_road());
        Ok(events)
    }

    /// Grants only what the bank holds
    fn play_year_of_plenty(&mut self, seat: Seat, first: Resource, second: Resource) -> GameResult<Vec<GameEvent>> {
        self.ensure_can_play(seat, DevelopmentCard::YearOfPlenty)?;

        let mut request = ResourceHand::single(first, 1);
        request.add(second, 1);
        let granted = self.bank.withdraw_up_to(&request);
        self.player_mut(seat).resources.add_hand(&granted);

        Ok(vec![
            self.card_played(seat, DevelopmentCard::YearOfPlenty),
            GameEvent::YearOfPlentyGranted {
                seat,
                resources: granted,
            },
        ])
    }

    fn play_monopoly(&mut self, seat: Seat, resource: Resource) -> GameResult<Vec<GameEvent>> {
        self.ensure_can_play(seat, DevelopmentCard::Monopoly)?;

        let total: u32 = self
            .players
            .iter_mut()
            .filter(|p| p.seat != seat)
            .map(|p| p.resources.take_all(resource))
            .sum();
        self.player_mut(seat).resources.add(resource, total);

        Ok(vec![
            self.card_played(seat, DevelopmentCard::Monopoly),
            GameEvent::MonopolyCollected {
                seat,
                resource,
                total,
            },
        ])
    }

    fn play_monument(&mut self, seat: Seat) -> GameResult<Vec<GameEvent>> {
        self.ensure_can_play(seat, DevelopmentCard::Monument)?;
        Ok(vec![self.card_played(seat, DevelopmentCard::Monument)])
    }

    // ==================== Trading ====================

    fn offer_trade(
        &mut self,
        seat: Seat,
        receiver: Seat,
        offering: ResourceHand,
        requesting: ResourceHand,
    ) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;
        if self.pending_trade.is_some() {
            return Err(TurnViolation::TradePending.into());
        }
        if receiver == seat {
            return Err(IdentityViolation::SelfTrade.into());
        }
        self.player(receiver)?;
        if offering.is_empty() || requesting.is_empty() {
            return Err(Shortfall::EmptyTrade.into());
        }
        self.player(seat)?.ensure_can_afford(&offering)?;

        let offer = TradeOffer {
            offerer: seat,
            receiver,
            offering,
            requesting,
        };
        self.pending_trade = Some(offer.clone());
        Ok(vec![GameEvent::TradeOffered { offer }])
    }

    fn respond_to_trade(&mut self, seat: Seat, accept: bool) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_phase(&[TurnPhase::Playing])?;
        let offer = self
            .pending_trade
            .clone()
            .ok_or(TurnViolation::NoPendingTrade)?;
        if seat != offer.receiver {
            return Err(TurnViolation::NotTradeReceiver.into());
        }

        if !accept {
            self.pending_trade = None;
            return Ok(vec![GameEvent::TradeDeclined { offer }]);
        }

        if !self.player(offer.offerer)?.resources.can_afford(&offer.offering) {
            return Err(Shortfall::Counterparty { seat: offer.offerer }.into());
        }
        self.player(seat)?.ensure_can_afford(&offer.requesting)?;

        let offerer = &mut self.players[offer.offerer as usize].resources;
        if offerer.try_subtract(&offer.offering) {
            offerer.add_hand(&offer.requesting);
        }
        let receiver = &mut self.players[seat as usize].resources;
        if receiver.try_subtract(&offer.requesting) {
            receiver.add_hand(&offer.offering);
        }
        self.pending_trade = None;
        Ok(vec![GameEvent::TradeAccepted { offer }])
    }

    fn maritime_trade(&mut self, seat: Seat, ratio: u32, input: Resource, output: Resource) -> GameResult<Vec<GameEvent>> {
        self.turn.ensure_turn(seat, &[TurnPhase::Playing])?;
        if !(2..=4).contains(&ratio) {
            return Err(GeometryViolation::InvalidRatio(ratio).into());
        }
        if input == output {
            return Err(GeometryViolation::SameResource(input).into());
        }
        let payment = ResourceHand::single(input, ratio);
        self.player(seat)?.ensure_can_afford(&payment)?;
        if self.bank.available(output) == 0 {
            return Err(Shortfall::Bank(output).into());
        }
        if ratio < self.board.best_trade_ratio(seat, input) {
            return Err(GeometryViolation::PortRequired {
                ratio,
                resource: input,
            }
            .into());
        }

        self.pay(seat, &payment);
        let granted = self.bank.withdraw_up_to(&ResourceHand::single(output, 1));
        self.player_mut(seat).resources.add_hand(&granted);
        Ok(vec![GameEvent::MaritimeTraded {
            seat,
            ratio,
            input,
            output,
        }])
    }

    fn send_chat(&mut self, seat: Seat, message: String) -> Vec<GameEvent> {
        self.chat.push(ChatMessage {
            seat,
            message: message.clone(),
        });
        vec![GameEvent::ChatSent { seat, message }]
    }

    // ==================== Helper Methods ====================

    fn player_mut(&mut self, seat: Seat) -> &mut Player {
        &mut self.players[seat as usize]
    }

    /// Move a validated cost from a player to the bank
    fn pay(&mut self, seat: Seat, cost: &ResourceHand) {
        if self.players[seat as usize].resources.try_subtract(cost) {
            self.bank.deposit(cost);
        }
    }

    /// Rng for randomness inside the next command
    fn command_rng(&self) -> StdRng {
        let mixed = (self.version + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(self.seed ^ mixed)
    }

    fn recompute_longest_road(&mut self) -> Option<GameEvent> {
        self.achievements
            .recompute_longest_road(&self.board, &self.players)
            .map(GameEvent::AchievementChanged)
    }

    /// Refresh every score and record a winner once someone reaches the target
    fn refresh_scores(&mut self) -> Vec<GameEvent> {
        for player in &mut self.players {
            player.victory_points = player.base_victory_points() + self.achievements.points_for(player.seat);
        }
        if self.winner.is_some() {
            return Vec::new();
        }

        let current = self.turn.current();
        let winner = self
            .players
            .iter()
            .filter(|p| p.victory_points >= VICTORY_POINTS_TO_WIN)
            .min_by_key(|p| (p.seat != current, p.seat))
            .map(|p| (p.seat, p.victory_points));

        match winner {
            Some((seat, victory_points)) => {
                self.winner = Some(seat);
                vec![GameEvent::GameWon { seat, victory_points }]
            }
            None => Vec::new(),
        }
    }
}

fn validate_seats(seats: &[SeatConfig]) -> GameResult<()> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&seats.len()) {
        return Err(IdentityViolation::SeatCount(seats.len()).into());
    }
    let mut users = BTreeSet::new();
    let mut colors = BTreeSet::new();
    for seat in seats {
        if !users.insert(seat.user) {
            return Err(IdentityViolation::DuplicatePlayer(seat.user).into());
        }
        if !colors.insert(seat.color) {
            return Err(IdentityViolation::DuplicateColor(seat.color).into());
        }
    }
    Ok(())
}

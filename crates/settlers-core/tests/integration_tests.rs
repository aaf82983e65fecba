//! Integration tests for the settlers rules engine.
//!
//! These tests drive complete games through the public command interface and
//! check the engine's laws: versioning, replay, all-or-nothing commands, and
//! the scenario rules for robbing, trading and achievements.

use pretty_assertions::assert_eq;
use settlers_core::*;

fn user(seat: u8) -> PlayerRef {
    PlayerRef::from_u128(0xA000 + seat as u128)
}

fn new_game(players: u8, seed: u64) -> (GameState, CommandLog) {
    let setup = GameSetup {
        seed,
        seats: (0..players)
            .map(|seat| SeatConfig {
                user: user(seat),
                name: format!("Player{seat}"),
                color: PlayerColor::for_seat(seat),
            })
            .collect(),
    };
    let game = GameState::new(&setup).unwrap();
    (game, CommandLog::new(setup))
}

/// Apply a command and log it on success, the way a host does
fn submit(
    game: &mut GameState,
    log: &mut CommandLog,
    seat: Seat,
    kind: CommandKind,
) -> Result<Vec<GameEvent>, Rejection> {
    let command = Command::new(user(seat), kind);
    let events = game.apply(&command)?;
    log.append(game.version(), command);
    Ok(events)
}

/// Every land vertex, in a fixed order
fn candidate_vertices(game: &GameState) -> Vec<VertexCoord> {
    let mut vertices: Vec<VertexCoord> = game
        .board
        .land_tiles()
        .flat_map(|tile| tile.coord.vertices())
        .collect();
    vertices.sort();
    vertices.dedup();
    vertices
}

/// Run through both setup rounds with the first legal placements
fn complete_setup(game: &mut GameState, log: &mut CommandLog) {
    let candidates = candidate_vertices(game);
    let mut iterations = 0;

    while game.turn.phase().is_setup() && iterations < 16 {
        let seat = game.turn.current();
        let vertex = *candidates
            .iter()
            .find(|v| game.board.building_at(v).is_none() && game.board.satisfies_distance_rule(v))
            .expect("board has room for every setup settlement");
        submit(game, log, seat, CommandKind::BuildSettlement { vertex, free: true }).unwrap();

        let edge = game
            .board
            .neighbors_of(&vertex)
            .into_iter()
            .find(|e| game.board.edge_owner(e).is_none())
            .expect("a fresh settlement has a free edge");
        submit(game, log, seat, CommandKind::BuildRoad { edge, free: true }).unwrap();
        iterations += 1;
    }

    assert_eq!(game.turn.phase(), TurnPhase::Rolling);
}

/// Hand of `count` cards taken greedily from `hand`
fn take_cards(hand: &ResourceHand, count: u32) -> ResourceHand {
    let mut taken = ResourceHand::new();
    let mut remaining = count;
    for (resource, held) in hand.iter() {
        let take = held.min(remaining);
        taken.add(resource, take);
        remaining -= take;
    }
    taken
}

/// Resolve discards and the robber until the current player is in `Playing`
fn resolve_robbery(game: &mut GameState, log: &mut CommandLog) {
    if game.turn.phase() == TurnPhase::Discarding {
        let owed: Vec<(Seat, u32)> = game.turn.discards_owed().iter().map(|(s, n)| (*s, *n)).collect();
        for (seat, count) in owed {
            let cards = take_cards(&game.players[seat as usize].resources, count);
            submit(game, log, seat, CommandKind::DiscardCards { cards }).unwrap();
        }
    }
    if game.turn.phase() == TurnPhase::Robbing {
        let seat = game.turn.current();
        let location = game
            .board
            .land_tiles()
            .map(|t| t.coord)
            .find(|c| *c != game.turn.robber())
            .unwrap();
        let victim = game.robbable_from(seat, &location).into_iter().next();
        submit(game, log, seat, CommandKind::RobPlayer { location, victim }).unwrap();
    }
}

/// Try the obvious builds for the current player; rejections are expected
fn play_greedily(game: &mut GameState, log: &mut CommandLog) {
    let seat = game.turn.current();

    let settlements: Vec<VertexCoord> = game
        .board
        .buildings()
        .filter(|(_, b)| **b == VertexBuilding::Settlement(seat))
        .map(|(v, _)| *v)
        .collect();
    for vertex in settlements {
        let _ = submit(game, log, seat, CommandKind::BuildCity { vertex });
    }

    let _ = submit(game, log, seat, CommandKind::BuyDevCard);

    for card in [DevelopmentCard::Monument, DevelopmentCard::Monopoly] {
        if game.players[seat as usize].old_dev_cards.get(card) > 0 {
            let kind = match card {
                DevelopmentCard::Monument => CommandKind::PlayMonument,
                _ => CommandKind::PlayMonopoly {
                    resource: Resource::Ore,
                },
            };
            let _ = submit(game, log, seat, kind);
        }
    }

    let frontier: Vec<EdgeCoord> = game
        .board
        .roads_of(seat)
        .flat_map(|road| road.adjacent_edges())
        .collect();
    for edge in frontier {
        if submit(game, log, seat, CommandKind::BuildRoad { edge, free: false }).is_ok() {
            break;
        }
    }

    for vertex in candidate_vertices(game) {
        if submit(game, log, seat, CommandKind::BuildSettlement { vertex, free: false }).is_ok() {
            break;
        }
    }

    let hand = game.players[seat as usize].resources;
    if let Some((input, _)) = hand.iter().find(|(_, n)| *n >= 4) {
        let output = if input == Resource::Ore {
            Resource::Grain
        } else {
            Resource::Ore
        };
        let _ = submit(game, log, seat, CommandKind::MaritimeTrade { ratio: 4, input, output });
    };
}

/// Grows one seat's road away from its first settlement, one paid road at a time
struct RoadWalker {
    seat: Seat,
    tip: VertexCoord,
    walked: Vec<EdgeCoord>,
}

impl RoadWalker {
    fn start(game: &GameState, seat: Seat) -> Self {
        let first_road = game.board.roads_of(seat).next().unwrap();
        let [a, b] = first_road.endpoints();
        let tip = if game.board.vertex_owner(&a) == Some(seat) { b } else { a };
        Self {
            seat,
            tip,
            walked: vec![first_road],
        }
    }

    /// Build the next road at the tip, returning the events of the build
    fn extend(&mut self, game: &mut GameState, log: &mut CommandLog) -> Vec<GameEvent> {
        assert!(self.walked.len() < 10, "road stopped growing at {:?}", self.tip);
        game.players[self.seat as usize].resources = ResourceHand::with_amounts(1, 1, 0, 0, 0);

        let candidates: Vec<EdgeCoord> = self
            .tip
            .touching_edges()
            .into_iter()
            .filter(|e| !self.walked.contains(e) && game.board.is_land_edge(e))
            .filter(|e| game.board.vertex_owner(&e.other_endpoint(&self.tip)).is_none())
            .collect();
        for edge in candidates {
            if let Ok(events) = submit(game, log, self.seat, CommandKind::BuildRoad { edge, free: false }) {
                self.tip = edge.other_endpoint(&self.tip);
                self.walked.push(edge);
                return events;
            }
        }
        panic!("the road can keep growing from {:?}", self.tip);
    }
}

/// Setup done and the current player in `Playing` after a harmless roll
fn game_in_playing(players: u8, seed: u64) -> (GameState, CommandLog) {
    let (mut game, mut log) = new_game(players, seed);
    complete_setup(&mut game, &mut log);
    submit(&mut game, &mut log, 0, CommandKind::RollDice { number: 12 }).unwrap();
    resolve_robbery(&mut game, &mut log);
    assert_eq!(game.turn.phase(), TurnPhase::Playing);
    (game, log)
}

#[test]
fn test_setup_phase_completes() {
    let (mut game, mut log) = new_game(4, 11);
    complete_setup(&mut game, &mut log);

    for player in &game.players {
        assert_eq!(player.settlements_remaining, 3);
        assert_eq!(player.roads_remaining, 13);
        assert_eq!(player.victory_points, 2);
    }
    assert_eq!(game.turn.current(), 0);
    assert_eq!(game.version(), 16);
}

#[test]
fn test_version_and_replay_laws() {
    for seed in 0..4 {
        let players = 2 + (seed % 3) as u8;
        let (mut game, mut log) = new_game(players, seed);
        let mut dice = StandardDice::seeded(seed);
        complete_setup(&mut game, &mut log);

        for _ in 0..60 {
            if game.is_finished() {
                break;
            }
            let seat = game.turn.current();
            let number = dice.roll();
            submit(&mut game, &mut log, seat, CommandKind::RollDice { number }).unwrap();
            resolve_robbery(&mut game, &mut log);
            play_greedily(&mut game, &mut log);
            if !game.is_finished() {
                submit(&mut game, &mut log, seat, CommandKind::FinishTurn).unwrap();
            }
        }

        // Exactly one version per commit
        assert_eq!(game.version(), log.len() as u64);
        assert_eq!(log.head_version(), game.version());

        // Replaying the log reproduces the same bytes
        let replayed = log.replay().unwrap();
        assert_eq!(
            replayed.snapshot().to_json().unwrap(),
            game.snapshot().to_json().unwrap()
        );

        // ... including through the persisted form
        let restored = CommandLog::from_json_lines(&log.to_json_lines().unwrap()).unwrap();
        assert_eq!(restored.replay().unwrap(), game);
    }
}

#[test]
fn test_rejections_leave_snapshot_identical() {
    let (mut game, mut log) = game_in_playing(3, 5);
    game.players[0].resources = ResourceHand::new();
    let before = game.snapshot().to_json().unwrap();
    let log_len = log.len();

    let rejected = vec![
        (1, CommandKind::FinishTurn),
        (0, CommandKind::RollDice { number: 6 }),
        (0, CommandKind::BuildCity {
            vertex: candidate_vertices(&game)[0],
        }),
        (0, CommandKind::PlayMonopoly {
            resource: Resource::Wool,
        }),
        (0, CommandKind::DiscardCards {
            cards: ResourceHand::single(Resource::Brick, 1),
        }),
        (0, CommandKind::MaritimeTrade {
            ratio: 4,
            input: Resource::Wool,
            output: Resource::Wool,
        }),
        (1, CommandKind::RespondToTrade { accept: true }),
    ];
    for (seat, kind) in rejected {
        let name = kind.name();
        let rejection = submit(&mut game, &mut log, seat, kind).unwrap_err();
        assert_eq!(rejection.command, name);
        assert_eq!(game.snapshot().to_json().unwrap(), before);
    }
    assert_eq!(log.len(), log_len);
}

#[test]
fn test_short_road_never_holds_longest_road() {
    let (mut game, mut log) = game_in_playing(2, 21);
    let mut road = RoadWalker::start(&game, 0);

    while game.board.longest_road(0) < 5 {
        assert_eq!(game.achievements.longest_road, None);
        road.extend(&mut game, &mut log);
    }

    assert!(game.board.longest_road(0) >= 5);
    assert_eq!(game.achievements.longest_road, Some(0));
    assert_eq!(game.players[0].victory_points, 4);
}

#[test]
fn test_longest_road_tie_keeps_incumbent() {
    let (mut game, mut log) = game_in_playing(2, 21);
    let mut ours = RoadWalker::start(&game, 0);
    while game.board.longest_road(0) < 5 {
        ours.extend(&mut game, &mut log);
    }
    let length = game.board.longest_road(0);
    assert_eq!(game.achievements.longest_road, Some(0));

    submit(&mut game, &mut log, 0, CommandKind::FinishTurn).unwrap();
    submit(&mut game, &mut log, 1, CommandKind::RollDice { number: 12 }).unwrap();
    let mut theirs = RoadWalker::start(&game, 1);
    while game.board.longest_road(1) < length {
        theirs.extend(&mut game, &mut log);
    }

    // Equal length leaves the title where it is
    assert_eq!(game.board.longest_road(1), length);
    assert_eq!(game.achievements.longest_road, Some(0));
    assert_eq!(game.players[0].victory_points, 4);
    assert_eq!(game.players[1].victory_points, 2);

    let events = theirs.extend(&mut game, &mut log);
    assert_eq!(game.board.longest_road(1), length + 1);
    assert_eq!(game.achievements.longest_road, Some(1));
    assert!(events.contains(&GameEvent::AchievementChanged(HolderChange {
        achievement: Achievement::LongestRoad,
        from: Some(0),
        to: Some(1),
    })));
    assert_eq!(game.players[0].victory_points, 2);
    assert_eq!(game.players[1].victory_points, 4);
}

#[test]
fn test_monopoly_collects_every_unit() {
    let (mut game, mut log) = game_in_playing(4, 8);
    for (seat, grain) in [(0, 1), (1, 3), (2, 0), (3, 2)] {
        game.players[seat].resources.grain = grain;
    }
    game.players[0].old_dev_cards.add(DevelopmentCard::Monopoly, 1);
    let total: u32 = game.players.iter().map(|p| p.resources.grain).sum();

    let events = submit(
        &mut game,
        &mut log,
        0,
        CommandKind::PlayMonopoly {
            resource: Resource::Grain,
        },
    )
    .unwrap();

    assert_eq!(game.players[0].resources.grain, total);
    for player in &game.players[1..] {
        assert_eq!(player.resources.grain, 0);
    }
    assert!(events.contains(&GameEvent::MonopolyCollected {
        seat: 0,
        resource: Resource::Grain,
        total: total - 1,
    }));
}

#[test]
fn test_maritime_ratio_two_needs_specific_port() {
    let (mut game, mut log) = game_in_playing(2, 3);
    let ports = game.board.player_ports(0);
    let input = Resource::ALL
        .into_iter()
        .find(|r| !ports.contains(&PortKind::Specific(*r)))
        .unwrap();
    let output = Resource::ALL.into_iter().find(|r| *r != input).unwrap();
    game.players[0].resources = ResourceHand::single(input, 2);
    let version = game.version();

    let rejection = submit(
        &mut game,
        &mut log,
        0,
        CommandKind::MaritimeTrade { ratio: 2, input, output },
    )
    .unwrap_err();
    assert_eq!(
        rejection.error,
        GameError::from(GeometryViolation::PortRequired {
            ratio: 2,
            resource: input
        })
    );
    assert_eq!(game.players[0].resources, ResourceHand::single(input, 2));
    assert_eq!(game.version(), version);
}

#[test]
fn test_seven_with_two_large_hands() {
    let (mut game, mut log) = new_game(4, 17);
    complete_setup(&mut game, &mut log);
    game.players[0].resources = ResourceHand::with_amounts(2, 2, 2, 2, 1);
    game.players[1].resources = ResourceHand::with_amounts(1, 1, 1, 1, 1);
    game.players[2].resources = ResourceHand::with_amounts(4, 4, 0, 0, 0);
    game.players[3].resources = ResourceHand::with_amounts(7, 0, 0, 0, 0);

    submit(&mut game, &mut log, 0, CommandKind::RollDice { number: 7 }).unwrap();
    assert_eq!(game.turn.phase(), TurnPhase::Discarding);

    // Players at or below the limit may not discard
    for seat in [1, 3] {
        let rejection = submit(
            &mut game,
            &mut log,
            seat,
            CommandKind::DiscardCards {
                cards: ResourceHand::single(Resource::Brick, 1),
            },
        )
        .unwrap_err();
        assert_eq!(rejection.error, GameError::from(TurnViolation::NoDiscardOwed));
    }

    // Nor may the robber move yet
    let location = game.board.land_tiles().map(|t| t.coord).find(|c| *c != game.turn.robber()).unwrap();
    let rejection = submit(&mut game, &mut log, 0, CommandKind::RobPlayer { location, victim: None }).unwrap_err();
    assert_eq!(rejection.kind(), ErrorKind::TurnViolation);

    // Seat 0 holds 9 and owes 2; seat 2 holds 8 and owes 1
    assert_eq!(game.turn.discard_owed_by(0), Some(2));
    assert_eq!(game.turn.discard_owed_by(2), Some(1));

    let rejection = submit(
        &mut game,
        &mut log,
        0,
        CommandKind::DiscardCards {
            cards: ResourceHand::single(Resource::Brick, 4),
        },
    )
    .unwrap_err();
    assert_eq!(
        rejection.error,
        GameError::from(Shortfall::DiscardCount {
            expected: 2,
            got: 4
        })
    );

    submit(
        &mut game,
        &mut log,
        2,
        CommandKind::DiscardCards {
            cards: ResourceHand::single(Resource::Lumber, 1),
        },
    )
    .unwrap();
    assert_eq!(game.turn.phase(), TurnPhase::Discarding);
    assert_eq!(game.players[2].hand_size(), 7);

    submit(
        &mut game,
        &mut log,
        0,
        CommandKind::DiscardCards {
            cards: ResourceHand::with_amounts(1, 1, 0, 0, 0),
        },
    )
    .unwrap();
    assert_eq!(game.turn.phase(), TurnPhase::Robbing);
    assert_eq!(game.players[0].hand_size(), 7);
    assert_eq!(game.players[1].hand_size(), 5);
    assert_eq!(game.players[3].hand_size(), 7);
}

#[test]
fn test_oversized_hands_are_rejected() {
    let (mut game, mut log) = game_in_playing(2, 5);
    game.players[0].resources = ResourceHand::with_amounts(2, 2, 2, 2, 2);
    game.players[1].resources = ResourceHand::with_amounts(1, 1, 1, 1, 1);
    let huge = ResourceHand::with_amounts(u32::MAX, 1, 0, 0, 0);

    let before = game.snapshot();
    let rejection = submit(
        &mut game,
        &mut log,
        0,
        CommandKind::OfferTrade {
            receiver: 1,
            offering: huge,
            requesting: ResourceHand::single(Resource::Ore, 1),
        },
    )
    .unwrap_err();
    assert_eq!(rejection.kind(), ErrorKind::InsufficientResources);
    assert_eq!(game.snapshot(), before);

    // Roll a 7 from the next seat so seat 0 owes a discard
    submit(&mut game, &mut log, 0, CommandKind::FinishTurn).unwrap();
    submit(&mut game, &mut log, 1, CommandKind::RollDice { number: 7 }).unwrap();
    assert_eq!(game.turn.discard_owed_by(0), Some(3));

    let before = game.snapshot();
    let rejection = submit(&mut game, &mut log, 0, CommandKind::DiscardCards { cards: huge }).unwrap_err();
    assert_eq!(
        rejection.error,
        GameError::from(Shortfall::DiscardCount {
            expected: 3,
            got: u32::MAX
        })
    );
    assert_eq!(game.snapshot(), before);
}

#[test]
fn test_distance_rule_rejection() {
    let (mut game, mut log) = game_in_playing(2, 9);
    game.players[0].resources = ResourceHand::uniform(5);

    let (theirs, _) = game
        .board
        .buildings()
        .find(|(_, b)| b.owner() == 1)
        .map(|(v, b)| (*v, *b))
        .unwrap();
    let version = game.version();

    for neighbor in theirs.adjacent_vertices() {
        if !game.board.is_land_vertex(&neighbor) {
            continue;
        }
        let rejection = submit(
            &mut game,
            &mut log,
            0,
            CommandKind::BuildSettlement {
                vertex: neighbor,
                free: false,
            },
        )
        .unwrap_err();
        assert_eq!(rejection.error, GameError::from(GeometryViolation::DistanceRule));
    }
    assert_eq!(game.version(), version);
}

#[test]
fn test_soldiers_win_largest_army() {
    let (mut game, mut log) = game_in_playing(2, 13);

    for turn in 0..3 {
        assert_eq!(game.achievements.largest_army, None);
        game.players[0].old_dev_cards.add(DevelopmentCard::Soldier, 1);
        let location = game
            .board
            .land_tiles()
            .map(|t| t.coord)
            .filter(|c| *c != game.turn.robber())
            .nth(turn)
            .unwrap();
        let victim = game.robbable_from(0, &location).into_iter().next();
        submit(&mut game, &mut log, 0, CommandKind::PlaySoldier { location, victim }).unwrap();
        assert_eq!(game.turn.robber(), location);

        // Second card in one turn is refused
        game.players[0].old_dev_cards.add(DevelopmentCard::Soldier, 1);
        let again = submit(&mut game, &mut log, 0, CommandKind::PlaySoldier { location, victim: None });
        assert!(again.is_err());
        game.players[0].old_dev_cards.soldier -= 1;

        // Pass a full round back to seat 0
        submit(&mut game, &mut log, 0, CommandKind::FinishTurn).unwrap();
        submit(&mut game, &mut log, 1, CommandKind::RollDice { number: 12 }).unwrap();
        submit(&mut game, &mut log, 1, CommandKind::FinishTurn).unwrap();
        submit(&mut game, &mut log, 0, CommandKind::RollDice { number: 12 }).unwrap();
    }

    assert_eq!(game.players[0].soldiers_played, 3);
    assert_eq!(game.achievements.largest_army, Some(0));
}

#[test]
fn test_robber_victim_is_optional() {
    let (mut game, mut log) = new_game(2, 4);
    complete_setup(&mut game, &mut log);
    game.players[0].resources = ResourceHand::new();
    game.players[1].resources = ResourceHand::single(Resource::Wool, 3);

    submit(&mut game, &mut log, 0, CommandKind::RollDice { number: 7 }).unwrap();
    assert_eq!(game.turn.phase(), TurnPhase::Robbing);

    // A hex next to seat 1's first settlement
    let (theirs, _) = game.board.buildings().find(|(_, b)| b.owner() == 1).unwrap();
    let location = theirs
        .touching_hexes()
        .into_iter()
        .find(|h| game.board.is_land_hex(h) && *h != game.turn.robber())
        .unwrap();
    assert!(game.robbable_from(0, &location).contains(&1));

    // Declining to steal still moves the robber
    let mut declined = game.clone();
    let events = submit(&mut declined, &mut log.clone(), 0, CommandKind::RobPlayer { location, victim: None }).unwrap();
    assert!(!events.iter().any(|e| matches!(e, GameEvent::ResourceStolen { .. })));
    assert_eq!(declined.turn.robber(), location);
    assert_eq!(declined.turn.phase(), TurnPhase::Playing);
    assert_eq!(declined.players[0].resources, ResourceHand::new());
    assert_eq!(declined.players[1].resources, ResourceHand::single(Resource::Wool, 3));

    let events = submit(&mut game, &mut log, 0, CommandKind::RobPlayer { location, victim: Some(1) }).unwrap();
    assert!(events.contains(&GameEvent::ResourceStolen {
        thief: 0,
        victim: 1,
        resource: Resource::Wool,
    }));
    assert_eq!(game.players[0].resources, ResourceHand::single(Resource::Wool, 1));
    assert_eq!(game.players[1].resources, ResourceHand::single(Resource::Wool, 2));
    assert_eq!(game.turn.phase(), TurnPhase::Playing);
}

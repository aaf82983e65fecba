//! Game board representation: tiles, buildings and ports.
//!
//! This module contains:
//! - Tile types and the hex grid
//! - Pieces on vertices (settlements, cities) and edges (roads)
//! - Ports for maritime trade
//! - Pure adjacency, ownership and placement queries
//! - Longest-road path search
//!
//! The board knows nothing about turns or costs. Every map is a `BTreeMap` so
//! two boards built the same way iterate and serialize identically.

use crate::hex::{EdgeCoord, EdgeDirection, HexCoord, VertexCoord, VertexDirection};
use crate::inventory::{Resource, ResourceHand};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Seat index of a player (0..N-1, N <= 4)
pub type Seat = u8;

/// Type of hex tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    Desert,
    /// Water; surrounds the playable area
    Ocean,
}

/// What a port accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    /// 3:1, any resource
    Any,
    /// 2:1 for one specific resource
    Specific(Resource),
}

impl PortKind {
    /// Exchange ratio granted by this port
    pub fn ratio(&self) -> u32 {
        match self {
            PortKind::Any => 3,
            PortKind::Specific(_) => 2,
        }
    }

    /// Whether this port improves trades giving away `resource`
    pub fn accepts(&self, resource: Resource) -> bool {
        match self {
            PortKind::Any => true,
            PortKind::Specific(r) => *r == resource,
        }
    }
}

/// A port placed on a coastal edge; both endpoints of the edge grant access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub edge: EdgeCoord,
    pub kind: PortKind,
}

impl Port {
    pub fn ratio(&self) -> u32 {
        self.kind.ratio()
    }
}

/// A single hex tile on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: HexCoord,
    pub tile_type: TileType,
    /// Number token 2-12, `None` for desert and ocean
    pub number: Option<u8>,
}

impl Tile {
    pub fn new_resource(coord: HexCoord, resource: Resource, number: u8) -> Self {
        Self {
            coord,
            tile_type: TileType::Resource(resource),
            number: Some(number),
        }
    }

    pub fn desert(coord: HexCoord) -> Self {
        Self {
            coord,
            tile_type: TileType::Desert,
            number: None,
        }
    }

    pub fn ocean(coord: HexCoord) -> Self {
        Self {
            coord,
            tile_type: TileType::Ocean,
            number: None,
        }
    }

    pub fn is_land(&self) -> bool {
        !matches!(self.tile_type, TileType::Ocean)
    }

    pub fn resource(&self) -> Option<Resource> {
        match self.tile_type {
            TileType::Resource(r) => Some(r),
            _ => None,
        }
    }
}

/// What's built on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexBuilding {
    /// 1 VP, 1 resource per adjacent producing tile
    Settlement(Seat),
    /// 2 VP, 2 resources per adjacent producing tile
    City(Seat),
}

impl VertexBuilding {
    pub fn owner(&self) -> Seat {
        match self {
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => *p,
        }
    }

    pub fn victory_points(&self) -> u32 {
        match self {
            VertexBuilding::Settlement(_) => 1,
            VertexBuilding::City(_) => 2,
        }
    }

    /// How many resources this building collects per production
    pub fn resource_multiplier(&self) -> u32 {
        self.victory_points()
    }
}

/// The complete game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: BTreeMap<HexCoord, Tile>,
    vertices: BTreeMap<VertexCoord, VertexBuilding>,
    /// Roads, keyed by edge, valued by owner
    roads: BTreeMap<EdgeCoord, Seat>,
    ports: Vec<Port>,
}

/// The 19 land hexes of the standard island: center, ring 1, ring 2
const LAND_COORDS: [HexCoord; 19] = [
    HexCoord::new(0, 0),
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
    HexCoord::new(2, 0),
    HexCoord::new(2, -1),
    HexCoord::new(2, -2),
    HexCoord::new(1, -2),
    HexCoord::new(0, -2),
    HexCoord::new(-1, -1),
    HexCoord::new(-2, 0),
    HexCoord::new(-2, 1),
    HexCoord::new(-2, 2),
    HexCoord::new(-1, 2),
    HexCoord::new(0, 2),
    HexCoord::new(1, 1),
];

/// Standard number tokens: one 2 and 12, two of everything else except 7
const NUMBER_TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

impl Board {
    /// An empty board with no tiles
    pub fn new() -> Self {
        Self {
            tiles: BTreeMap::new(),
            vertices: BTreeMap::new(),
            roads: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    /// A board from explicit land tiles and ports, surrounded by ocean
    pub fn from_layout(land: Vec<Tile>, ports: Vec<Port>) -> Self {
        let mut board = Self::new();
        for tile in land {
            board.tiles.insert(tile.coord, tile);
        }
        for coord in board.ocean_ring() {
            board.tiles.insert(coord, Tile::ocean(coord));
        }
        board.ports = ports;
        board
    }

    /// The standard island with shuffled terrain, numbers and ports.
    ///
    /// The same rng state always yields the same board.
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        // 4 lumber, 4 grain, 4 wool, 3 ore, 3 brick, 1 desert
        let mut terrain: Vec<Option<Resource>> = [
            (Resource::Lumber, 4),
            (Resource::Grain, 4),
            (Resource::Wool, 4),
            (Resource::Ore, 3),
            (Resource::Brick, 3),
        ]
        .into_iter()
        .flat_map(|(resource, count)| std::iter::repeat(Some(resource)).take(count))
        .chain(std::iter::once(None))
        .collect();
        terrain.shuffle(rng);

        let resource_coords: Vec<HexCoord> = LAND_COORDS
            .iter()
            .zip(&terrain)
            .filter(|(_, t)| t.is_some())
            .map(|(c, _)| *c)
            .collect();
        let numbers = assign_numbers_avoiding_adjacent_68(&resource_coords, rng);

        let mut numbers = numbers.into_iter();
        let mut land = Vec::with_capacity(LAND_COORDS.len());
        for (coord, kind) in LAND_COORDS.iter().zip(terrain) {
            let tile = match kind {
                Some(resource) => match numbers.next() {
                    Some(number) => Tile::new_resource(*coord, resource, number),
                    None => Tile::desert(*coord),
                },
                None => Tile::desert(*coord),
            };
            land.push(tile);
        }

        let mut board = Self::from_layout(land, Vec::new());
        board.add_standard_ports(rng);
        board
    }

    fn ocean_ring(&self) -> BTreeSet<HexCoord> {
        self.tiles
            .keys()
            .flat_map(|coord| coord.neighbors())
            .filter(|n| !self.tiles.contains_key(n))
            .collect()
    }

    /// 4 generic (3:1) ports and one 2:1 port per resource, spread along the coast
    fn add_standard_ports<R: Rng>(&mut self, rng: &mut R) {
        let mut kinds: Vec<PortKind> = std::iter::repeat(PortKind::Any)
            .take(4)
            .chain(Resource::ALL.into_iter().map(PortKind::Specific))
            .collect();
        kinds.shuffle(rng);

        let coastal = self.coastal_edges();
        let selected = select_distributed_edges(&coastal, kinds.len(), rng);
        self.ports = selected
            .into_iter()
            .zip(kinds)
            .map(|(edge, kind)| Port { edge, kind })
            .collect();
    }

    /// Edges between a land tile and ocean
    fn coastal_edges(&self) -> Vec<EdgeCoord> {
        let mut coastal = BTreeSet::new();
        for tile in self.land_tiles() {
            for edge in tile.coord.edges() {
                let touching = edge.touching_hexes();
                let has_ocean = touching
                    .iter()
                    .any(|h| self.tiles.get(h).map_or(true, |t| !t.is_land()));
                if has_ocean {
                    coastal.insert(edge);
                }
            }
        }
        coastal.into_iter().collect()
    }

    // ==================== Query Methods ====================

    pub fn get_tile(&self, coord: &HexCoord) -> Option<&Tile> {
        self.tiles.get(coord)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// All non-ocean tiles
    pub fn land_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values().filter(|t| t.is_land())
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn is_land_hex(&self, coord: &HexCoord) -> bool {
        self.tiles.get(coord).is_some_and(Tile::is_land)
    }

    /// The desert, where the robber starts. Falls back to the first land tile
    /// on boards without a desert.
    pub fn robber_start(&self) -> HexCoord {
        self.land_tiles()
            .find(|t| matches!(t.tile_type, TileType::Desert))
            .or_else(|| self.land_tiles().next())
            .map(|t| t.coord)
            .unwrap_or_default()
    }

    pub fn building_at(&self, vertex: &VertexCoord) -> Option<VertexBuilding> {
        self.vertices.get(vertex).copied()
    }

    pub fn vertex_owner(&self, vertex: &VertexCoord) -> Option<Seat> {
        self.building_at(vertex).map(|b| b.owner())
    }

    pub fn edge_owner(&self, edge: &EdgeCoord) -> Option<Seat> {
        self.roads.get(edge).copied()
    }

    pub fn buildings(&self) -> impl Iterator<Item = (&VertexCoord, &VertexBuilding)> {
        self.vertices.iter()
    }

    pub fn roads(&self) -> impl Iterator<Item = (&EdgeCoord, &Seat)> {
        self.roads.iter()
    }

    pub fn roads_of(&self, seat: Seat) -> impl Iterator<Item = EdgeCoord> + '_ {
        self.roads
            .iter()
            .filter(move |(_, owner)| **owner == seat)
            .map(|(edge, _)| *edge)
    }

    /// At least one touching hex is land
    pub fn is_land_vertex(&self, vertex: &VertexCoord) -> bool {
        vertex.touching_hexes().iter().any(|h| self.is_land_hex(h))
    }

    /// At least one touching hex is land
    pub fn is_land_edge(&self, edge: &EdgeCoord) -> bool {
        edge.touching_hexes().iter().any(|h| self.is_land_hex(h))
    }

    /// Land edges ending on this vertex
    pub fn neighbors_of(&self, vertex: &VertexCoord) -> BTreeSet<EdgeCoord> {
        vertex
            .touching_edges()
            .into_iter()
            .filter(|e| self.is_land_edge(e))
            .collect()
    }

    /// Ports usable from a building on this vertex
    pub fn ports_adjacent_to(&self, vertex: &VertexCoord) -> Vec<Port> {
        self.ports
            .iter()
            .filter(|port| port.edge.endpoints().contains(vertex))
            .copied()
            .collect()
    }

    /// Whether two edges share a vertex
    pub fn is_connected(&self, a: &EdgeCoord, b: &EdgeCoord) -> bool {
        a.shared_vertex(b).is_some()
    }

    /// Ports a player reaches through their settlements and cities
    pub fn player_ports(&self, seat: Seat) -> Vec<PortKind> {
        self.ports
            .iter()
            .filter(|port| {
                port.edge
                    .endpoints()
                    .iter()
                    .any(|v| self.vertex_owner(v) == Some(seat))
            })
            .map(|port| port.kind)
            .collect()
    }

    /// Best maritime ratio a player is entitled to when giving `resource`
    pub fn best_trade_ratio(&self, seat: Seat, resource: Resource) -> u32 {
        self.player_ports(seat)
            .iter()
            .filter(|kind| kind.accepts(resource))
            .map(PortKind::ratio)
            .min()
            .unwrap_or(4)
    }

    /// Tiles touching a vertex, ocean excluded
    pub fn tiles_at_vertex(&self, vertex: &VertexCoord) -> Vec<&Tile> {
        vertex
            .touching_hexes()
            .iter()
            .filter_map(|h| self.tiles.get(h))
            .filter(|t| t.is_land())
            .collect()
    }

    // ==================== Validation Methods ====================

    /// No settlement or city on any vertex one edge away
    pub fn satisfies_distance_rule(&self, vertex: &VertexCoord) -> bool {
        vertex
            .adjacent_vertices()
            .iter()
            .all(|adj| self.building_at(adj).is_none())
    }

    /// Whether one of the player's roads ends on this vertex
    pub fn touches_own_road(&self, vertex: &VertexCoord, seat: Seat) -> bool {
        vertex
            .touching_edges()
            .iter()
            .any(|edge| self.edge_owner(edge) == Some(seat))
    }

    /// Whether an edge continues the player's network: one endpoint holds the
    /// player's building, or holds no enemy building and has the player's road.
    pub fn is_connected_to_network(&self, edge: &EdgeCoord, seat: Seat) -> bool {
        edge.endpoints().iter().any(|endpoint| match self.vertex_owner(endpoint) {
            Some(owner) => owner == seat,
            None => endpoint
                .touching_edges()
                .iter()
                .any(|adj| adj != edge && self.edge_owner(adj) == Some(seat)),
        })
    }

    // ==================== Mutation Methods ====================
    // Callers validate first.

    pub fn place_settlement(&mut self, vertex: VertexCoord, seat: Seat) {
        self.vertices.insert(vertex, VertexBuilding::Settlement(seat));
    }

    pub fn upgrade_to_city(&mut self, vertex: VertexCoord, seat: Seat) {
        self.vertices.insert(vertex, VertexBuilding::City(seat));
    }

    pub fn place_road(&mut self, edge: EdgeCoord, seat: Seat) {
        self.roads.insert(edge, seat);
    }

    // ==================== Resource Distribution ====================

    /// Resources owed to each player for a roll, skipping the robber's hex
    pub fn resources_for_roll(&self, roll: u8, robber: HexCoord) -> BTreeMap<Seat, ResourceHand> {
        let mut distribution: BTreeMap<Seat, ResourceHand> = BTreeMap::new();

        for tile in self.tiles.values() {
            if tile.number != Some(roll) || tile.coord == robber {
                continue;
            }
            let Some(resource) = tile.resource() else {
                continue;
            };

            for vertex in tile.coord.vertices() {
                if let Some(building) = self.building_at(&vertex) {
                    distribution
                        .entry(building.owner())
                        .or_default()
                        .add(resource, building.resource_multiplier());
                }
            }
        }

        distribution
    }

    /// Players with a building on a corner of this hex
    pub fn players_adjacent_to_hex(&self, hex: &HexCoord) -> BTreeSet<Seat> {
        hex.vertices()
            .iter()
            .filter_map(|v| self.vertex_owner(v))
            .collect()
    }

    // ==================== Longest Road ====================

    /// Length of the longest trail through a player's own roads.
    ///
    /// Edges are never reused. A trail may start or end on another player's
    /// building but never passes through one.
    pub fn longest_road(&self, seat: Seat) -> u32 {
        let mut visited = BTreeSet::new();
        let mut longest = 0;
        for road in self.roads_of(seat) {
            for start in road.endpoints() {
                let far_end = road.other_endpoint(&start);
                longest = longest.max(self.extend_trail(seat, road, far_end, &mut visited));
            }
        }
        longest
    }

    /// Walk onward from `at`, having just traversed `edge`
    fn extend_trail(
        &self,
        seat: Seat,
        edge: EdgeCoord,
        at: VertexCoord,
        visited: &mut BTreeSet<EdgeCoord>,
    ) -> u32 {
        visited.insert(edge);

        let mut continuation = 0;
        let blocked = self.vertex_owner(&at).is_some_and(|owner| owner != seat);
        if !blocked {
            for next in at.touching_edges() {
                if !visited.contains(&next) && self.edge_owner(&next) == Some(seat) {
                    let far_end = next.other_endpoint(&at);
                    continuation = continuation.max(self.extend_trail(seat, next, far_end, visited));
                }
            }
        }

        visited.remove(&edge);
        1 + continuation
    }

    /// JSON-friendly representation with arrays in place of coordinate-keyed maps
    pub fn to_json_friendly(&self) -> BoardJson {
        BoardJson {
            tiles: self
                .tiles
                .values()
                .map(|tile| TileJson {
                    q: tile.coord.q,
                    r: tile.coord.r,
                    tile_type: tile.tile_type,
                    number: tile.number,
                })
                .collect(),
            buildings: self
                .vertices
                .iter()
                .map(|(coord, building)| VertexJson {
                    hex_q: coord.hex.q,
                    hex_r: coord.hex.r,
                    direction: coord.direction,
                    building: *building,
                })
                .collect(),
            roads: self
                .roads
                .iter()
                .map(|(coord, owner)| EdgeJson {
                    hex_q: coord.hex.q,
                    hex_r: coord.hex.r,
                    direction: coord.direction,
                    owner: *owner,
                })
                .collect(),
            ports: self.ports.clone(),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Shuffle number tokens until no 6 or 8 touches another 6 or 8
fn assign_numbers_avoiding_adjacent_68<R: Rng>(coords: &[HexCoord], rng: &mut R) -> Vec<u8> {
    const MAX_ATTEMPTS: usize = 100;

    let mut numbers = NUMBER_TOKENS.to_vec();
    for _ in 0..MAX_ATTEMPTS {
        numbers.shuffle(rng);
        if is_valid_number_placement(coords, &numbers) {
            break;
        }
    }
    numbers
}

fn is_valid_number_placement(coords: &[HexCoord], numbers: &[u8]) -> bool {
    let hot: BTreeSet<HexCoord> = coords
        .iter()
        .zip(numbers)
        .filter(|(_, n)| matches!(**n, 6 | 8))
        .map(|(c, _)| *c)
        .collect();
    hot.iter()
        .all(|coord| coord.neighbors().iter().all(|n| !hot.contains(n)))
}

/// Hex-step distance between two edges
fn edge_distance(a: &EdgeCoord, b: &EdgeCoord) -> u32 {
    a.touching_hexes()
        .iter()
        .flat_map(|x| b.touching_hexes().map(|y| x.distance_to(&y)))
        .sum()
}

/// Greedy farthest-point selection of `count` edges
fn select_distributed_edges<R: Rng>(edges: &[EdgeCoord], count: usize, rng: &mut R) -> Vec<EdgeCoord> {
    let mut available = edges.to_vec();
    available.shuffle(rng);
    if available.len() <= count {
        return available;
    }

    let mut selected = vec![available.remove(0)];
    while selected.len() < count && !available.is_empty() {
        let best = available
            .iter()
            .enumerate()
            .max_by_key(|(_, candidate)| {
                selected
                    .iter()
                    .map(|s| edge_distance(candidate, s))
                    .min()
                    .unwrap_or(u32::MAX)
            })
            .map(|(idx, _)| idx);
        match best {
            Some(idx) => selected.push(available.remove(idx)),
            None => break,
        }
    }
    selected
}

/// JSON-friendly board representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardJson {
    pub tiles: Vec<TileJson>,
    pub buildings: Vec<VertexJson>,
    pub roads: Vec<EdgeJson>,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileJson {
    pub q: i32,
    pub r: i32,
    pub tile_type: TileType,
    pub number: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexJson {
    pub hex_q: i32,
    pub hex_r: i32,
    pub direction: VertexDirection,
    pub building: VertexBuilding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeJson {
    pub hex_q: i32,
    pub hex_r: i32,
    pub direction: EdgeDirection,
    pub owner: Seat,
}

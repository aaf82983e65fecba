//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the coordinate types for the game board:
//! - `HexCoord`: identifies individual hex tiles
//! - `VertexCoord`: identifies corners where settlements and cities are placed
//! - `EdgeCoord`: identifies sides where roads are placed
//!
//! Hexes are pointy-top. Every vertex is either the north corner of exactly one
//! hex or the south corner of exactly one hex, so `(hex, North|South)` is already
//! a unique name for it. Edges have two names (one per touching hex) and are
//! canonicalised to the smaller hex.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Direction of a vertex relative to a hex (North or South pole)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VertexDirection {
    /// Top vertex of the hex
    North,
    /// Bottom vertex of the hex
    South,
}

/// Direction of an edge relative to a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

impl EdgeDirection {
    /// All edge directions in clockwise order starting from NorthEast
    pub const ALL: [EdgeDirection; 6] = [
        EdgeDirection::NorthEast,
        EdgeDirection::East,
        EdgeDirection::SouthEast,
        EdgeDirection::SouthWest,
        EdgeDirection::West,
        EdgeDirection::NorthWest,
    ];

    pub fn opposite(self) -> Self {
        match self {
            EdgeDirection::NorthEast => EdgeDirection::SouthWest,
            EdgeDirection::East => EdgeDirection::West,
            EdgeDirection::SouthEast => EdgeDirection::NorthWest,
            EdgeDirection::SouthWest => EdgeDirection::NorthEast,
            EdgeDirection::West => EdgeDirection::East,
            EdgeDirection::NorthWest => EdgeDirection::SouthEast,
        }
    }
}

/// Axial coordinate for the hex grid.
///
/// - `q` increases going east
/// - `r` increases going southeast
/// - the implicit third coordinate `s` satisfies q + r + s = 0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes in clockwise order starting from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.q + 1, self.r),     // East
            HexCoord::new(self.q + 1, self.r - 1), // NorthEast
            HexCoord::new(self.q, self.r - 1),     // NorthWest
            HexCoord::new(self.q - 1, self.r),     // West
            HexCoord::new(self.q - 1, self.r + 1), // SouthWest
            HexCoord::new(self.q, self.r + 1),     // SouthEast
        ]
    }

    /// Get the neighbor across a specific edge
    pub fn neighbor(&self, direction: EdgeDirection) -> HexCoord {
        match direction {
            EdgeDirection::East => HexCoord::new(self.q + 1, self.r),
            EdgeDirection::NorthEast => HexCoord::new(self.q + 1, self.r - 1),
            EdgeDirection::NorthWest => HexCoord::new(self.q, self.r - 1),
            EdgeDirection::West => HexCoord::new(self.q - 1, self.r),
            EdgeDirection::SouthWest => HexCoord::new(self.q - 1, self.r + 1),
            EdgeDirection::SouthEast => HexCoord::new(self.q, self.r + 1),
        }
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// All six corners of this hex, clockwise from the top
    pub fn vertices(&self) -> [VertexCoord; 6] {
        [
            VertexCoord::new(*self, VertexDirection::North),
            VertexCoord::new(self.neighbor(EdgeDirection::NorthEast), VertexDirection::South),
            VertexCoord::new(self.neighbor(EdgeDirection::SouthEast), VertexDirection::North),
            VertexCoord::new(*self, VertexDirection::South),
            VertexCoord::new(self.neighbor(EdgeDirection::SouthWest), VertexDirection::North),
            VertexCoord::new(self.neighbor(EdgeDirection::NorthWest), VertexDirection::South),
        ]
    }

    /// All six sides of this hex, canonicalised
    pub fn edges(&self) -> [EdgeCoord; 6] {
        EdgeDirection::ALL.map(|dir| EdgeCoord::new(*self, dir))
    }
}

/// Vertex coordinate - a corner where three hexes meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexCoord {
    pub hex: HexCoord,
    pub direction: VertexDirection,
}

impl VertexCoord {
    pub const fn new(hex: HexCoord, direction: VertexDirection) -> Self {
        Self { hex, direction }
    }

    /// Derive the vertex shared by three hexes.
    ///
    /// Returns `None` when the hexes do not meet at a single corner. The result
    /// depends only on the set of hexes, never on their order.
    pub fn from_hexes(hexes: [HexCoord; 3]) -> Option<Self> {
        let wanted: BTreeSet<HexCoord> = hexes.into_iter().collect();
        if wanted.len() != 3 {
            return None;
        }
        hexes
            .iter()
            .flat_map(|hex| {
                [
                    VertexCoord::new(*hex, VertexDirection::North),
                    VertexCoord::new(*hex, VertexDirection::South),
                ]
            })
            .find(|candidate| {
                candidate
                    .touching_hexes()
                    .into_iter()
                    .collect::<BTreeSet<_>>()
                    == wanted
            })
    }

    /// The three hexes that touch this vertex
    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        match self.direction {
            VertexDirection::North => [
                self.hex,
                self.hex.neighbor(EdgeDirection::NorthWest),
                self.hex.neighbor(EdgeDirection::NorthEast),
            ],
            VertexDirection::South => [
                self.hex,
                self.hex.neighbor(EdgeDirection::SouthWest),
                self.hex.neighbor(EdgeDirection::SouthEast),
            ],
        }
    }

    /// The three vertices one edge away (for the distance rule)
    pub fn adjacent_vertices(&self) -> [VertexCoord; 3] {
        self.touching_edges().map(|edge| edge.other_endpoint(self))
    }

    /// The three edges that meet at this vertex
    pub fn touching_edges(&self) -> [EdgeCoord; 3] {
        match self.direction {
            VertexDirection::North => [
                EdgeCoord::new(self.hex, EdgeDirection::NorthWest),
                EdgeCoord::new(self.hex, EdgeDirection::NorthEast),
                EdgeCoord::new(self.hex.neighbor(EdgeDirection::NorthWest), EdgeDirection::East),
            ],
            VertexDirection::South => [
                EdgeCoord::new(self.hex, EdgeDirection::SouthWest),
                EdgeCoord::new(self.hex, EdgeDirection::SouthEast),
                EdgeCoord::new(self.hex.neighbor(EdgeDirection::SouthWest), EdgeDirection::East),
            ],
        }
    }
}

/// Edge coordinate - a side shared by two hexes where roads are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeCoord {
    pub hex: HexCoord,
    pub direction: EdgeDirection,
}

impl EdgeCoord {
    /// Create a new edge coordinate (automatically canonicalized)
    pub fn new(hex: HexCoord, direction: EdgeDirection) -> Self {
        Self { hex, direction }.canonical()
    }

    /// Pick the representation anchored on the smaller `(q, r)` hex.
    pub fn canonical(self) -> Self {
        let other = Self {
            hex: self.hex.neighbor(self.direction),
            direction: self.direction.opposite(),
        };
        if (self.hex.q, self.hex.r) <= (other.hex.q, other.hex.r) {
            self
        } else {
            other
        }
    }

    /// The two hexes that share this edge
    pub fn touching_hexes(&self) -> [HexCoord; 2] {
        [self.hex, self.hex.neighbor(self.direction)]
    }

    /// The two vertices at the ends of this edge
    pub fn endpoints(&self) -> [VertexCoord; 2] {
        let h = self.hex;
        match self.direction {
            EdgeDirection::NorthEast => [
                VertexCoord::new(h, VertexDirection::North),
                VertexCoord::new(h.neighbor(EdgeDirection::NorthEast), VertexDirection::South),
            ],
            EdgeDirection::East => [
                VertexCoord::new(h.neighbor(EdgeDirection::NorthEast), VertexDirection::South),
                VertexCoord::new(h.neighbor(EdgeDirection::SouthEast), VertexDirection::North),
            ],
            EdgeDirection::SouthEast => [
                VertexCoord::new(h.neighbor(EdgeDirection::SouthEast), VertexDirection::North),
                VertexCoord::new(h, VertexDirection::South),
            ],
            EdgeDirection::SouthWest => [
                VertexCoord::new(h, VertexDirection::South),
                VertexCoord::new(h.neighbor(EdgeDirection::SouthWest), VertexDirection::North),
            ],
            EdgeDirection::West => [
                VertexCoord::new(h.neighbor(EdgeDirection::SouthWest), VertexDirection::North),
                VertexCoord::new(h.neighbor(EdgeDirection::NorthWest), VertexDirection::South),
            ],
            EdgeDirection::NorthWest => [
                VertexCoord::new(h.neighbor(EdgeDirection::NorthWest), VertexDirection::South),
                VertexCoord::new(h, VertexDirection::North),
            ],
        }
    }

    /// The endpoint that is not `vertex`. Returns the first endpoint if
    /// `vertex` is not on this edge.
    pub fn other_endpoint(&self, vertex: &VertexCoord) -> VertexCoord {
        let [a, b] = self.endpoints();
        if a == *vertex {
            b
        } else {
            a
        }
    }

    /// The vertex both edges end on, if they touch
    pub fn shared_vertex(&self, other: &EdgeCoord) -> Option<VertexCoord> {
        if self == other {
            return None;
        }
        let theirs = other.endpoints();
        self.endpoints().into_iter().find(|v| theirs.contains(v))
    }

    /// Edges that share a vertex with this edge
    pub fn adjacent_edges(&self) -> Vec<EdgeCoord> {
        let mut adjacent = BTreeSet::new();
        for vertex in self.endpoints() {
            for edge in vertex.touching_edges() {
                if edge != *self {
                    adjacent.insert(edge);
                }
            }
        }
        adjacent.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(0, 0);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);
        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance_to(&HexCoord::new(2, -1)), 2);
        assert_eq!(a.distance_to(&HexCoord::new(-3, 3)), 3);
    }

    #[test]
    fn test_vertex_identity_from_hexes() {
        // Every corner of every hex in a small patch round-trips through its hexes,
        // regardless of the order the hexes are listed in.
        for q in -2..=2 {
            for r in -2..=2 {
                for vertex in HexCoord::new(q, r).vertices() {
                    let [a, b, c] = vertex.touching_hexes();
                    assert_eq!(VertexCoord::from_hexes([a, b, c]), Some(vertex));
                    assert_eq!(VertexCoord::from_hexes([c, a, b]), Some(vertex));
                }
            }
        }
    }

    #[test]
    fn test_vertex_from_non_meeting_hexes() {
        let far = [HexCoord::new(0, 0), HexCoord::new(3, 0), HexCoord::new(0, 3)];
        assert_eq!(VertexCoord::from_hexes(far), None);

        let repeated = [HexCoord::new(0, 0), HexCoord::new(0, 0), HexCoord::new(1, 0)];
        assert_eq!(VertexCoord::from_hexes(repeated), None);
    }

    #[test]
    fn test_hex_vertices_are_distinct() {
        let unique: HashSet<_> = HexCoord::new(0, 0).vertices().into_iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_shared_corner_between_neighbors() {
        // East neighbor shares exactly two corners with the center hex
        let center: HashSet<_> = HexCoord::new(0, 0).vertices().into_iter().collect();
        let east: HashSet<_> = HexCoord::new(1, 0).vertices().into_iter().collect();
        assert_eq!(center.intersection(&east).count(), 2);
    }

    #[test]
    fn test_vertex_adjacent_vertices() {
        let v = VertexCoord::new(HexCoord::new(0, 0), VertexDirection::North);
        let adjacent = v.adjacent_vertices();
        let unique: HashSet<_> = adjacent.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(!adjacent.contains(&v));
    }

    #[test]
    fn test_edge_canonical_equality() {
        let e1 = EdgeCoord::new(HexCoord::new(0, 0), EdgeDirection::East);
        let e2 = EdgeCoord::new(HexCoord::new(1, 0), EdgeDirection::West);
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_edge_adjacent_edges() {
        let e = EdgeCoord::new(HexCoord::new(0, 0), EdgeDirection::East);
        let adjacent = e.adjacent_edges();
        assert_eq!(adjacent.len(), 4);
        assert!(!adjacent.contains(&e));
    }

    #[test]
    fn test_shared_vertex() {
        let v = VertexCoord::new(HexCoord::new(0, 0), VertexDirection::North);
        let [a, b, _] = v.touching_edges();
        assert_eq!(a.shared_vertex(&b), Some(v));
        assert_eq!(a.shared_vertex(&a), None);

        let far = EdgeCoord::new(HexCoord::new(2, 2), EdgeDirection::East);
        assert_eq!(a.shared_vertex(&far), None);
    }

    #[test]
    fn test_hex_edges_unique() {
        let unique: HashSet<_> = HexCoord::new(0, 0).edges().into_iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_vertex_edges_connection() {
        for direction in [VertexDirection::North, VertexDirection::South] {
            let v = VertexCoord::new(HexCoord::new(1, -1), direction);
            for edge in v.touching_edges() {
                assert!(edge.endpoints().contains(&v));
            }
        }
    }
}

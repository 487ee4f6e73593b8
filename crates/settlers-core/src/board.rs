//! The hex grid: tiles, corners, sides and ports.
//!
//! Topology (which nodes and edges exist and what touches what) is derived once
//! from the set of land hexes and never changes afterwards. During play only
//! the occupants of nodes and edges and the robber's position are mutated.

use crate::error::{GameError, GameResult};
use crate::hex::{EdgeCoord, HexCoord, NodeCoord};
use crate::player::Colour;
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Seat index (0-3), stable for the whole game.
pub type PlayerId = u8;

/// Rings of land hexes around the centre.
pub const BOARD_RADIUS: i32 = 2;

/// Placements tried before giving up on separating 6s and 8s.
const MAX_CHIT_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Lumber,
    Wool,
    Grain,
    Ore,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Wool,
        Resource::Grain,
        Resource::Ore,
    ];
}

/// What a hex produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Resource(Resource),
    Desert,
}

impl Terrain {
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Terrain::Resource(r) => Some(*r),
            Terrain::Desert => None,
        }
    }

    /// Standard tile mix: 4 lumber, 4 grain, 4 wool, 3 ore, 3 brick, 1 desert.
    pub fn standard_set() -> Vec<Terrain> {
        let mut terrains = Vec::with_capacity(19);
        for (resource, count) in [
            (Resource::Lumber, 4),
            (Resource::Grain, 4),
            (Resource::Wool, 4),
            (Resource::Ore, 3),
            (Resource::Brick, 3),
        ] {
            terrains.extend(std::iter::repeat(Terrain::Resource(resource)).take(count));
        }
        terrains.push(Terrain::Desert);
        terrains
    }
}

/// Dice sums printed on the 18 productive hexes.
pub const STANDARD_CHITS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hex {
    pub coord: HexCoord,
    pub terrain: Terrain,
    /// None for the desert.
    pub chit: Option<u8>,
    pub has_robber: bool,
}

impl Hex {
    /// The resource this hex yields for `sum`, if it yields anything.
    pub fn yields(&self, sum: u8) -> Option<Resource> {
        if self.has_robber || self.chit != Some(sum) {
            return None;
        }
        self.terrain.resource()
    }
}

/// A building on a node, tagged with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Building {
    Settlement(Colour),
    City(Colour),
}

impl Building {
    /// Colour of the player who built this
    pub fn owner(&self) -> Colour {
        match self {
            Building::Settlement(c) | Building::City(c) => *c,
        }
    }

    /// Victory points this building is worth
    pub fn victory_points(&self) -> u32 {
        match self {
            Building::Settlement(_) => 1,
            Building::City(_) => 2,
        }
    }

    /// Cards produced per matching roll.
    pub fn yield_multiplier(&self) -> u32 {
        self.victory_points()
    }
}

/// Exchange rate offered by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    /// 3:1 for any resource.
    Generic,
    /// 2:1 for one resource.
    Specific(Resource),
}

impl PortKind {
    /// Cards given per card received
    pub fn rate(&self) -> u32 {
        match self {
            PortKind::Generic => 3,
            PortKind::Specific(_) => 2,
        }
    }

    /// Four generic ports and one specific port per resource.
    pub fn standard_set() -> Vec<PortKind> {
        let mut kinds = vec![PortKind::Generic; 4];
        kinds.extend(Resource::ALL.map(PortKind::Specific));
        kinds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub edge: EdgeCoord,
    pub kind: PortKind,
}

/// A settlement site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub coord: NodeCoord,
    /// Land hexes at this corner (1 to 3).
    pub hexes: Vec<HexCoord>,
    /// On-board sides ending here (2 or 3).
    pub edges: Vec<EdgeCoord>,
    pub building: Option<Building>,
    pub port: Option<PortKind>,
}

/// A road site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub coord: EdgeCoord,
    pub endpoints: [NodeCoord; 2],
    pub road: Option<Colour>,
}

#[derive(Debug, Clone)]
pub struct HexGrid {
    hexes: BTreeMap<HexCoord, Hex>,
    nodes: BTreeMap<NodeCoord, Node>,
    edges: BTreeMap<EdgeCoord, Edge>,
    ports: Vec<Port>,
    robber: HexCoord,
}

impl HexGrid {
    /// Generate a standard randomised board.
    pub fn generate(rng: &mut RandomSource) -> Self {
        let coords = HexCoord::spiral(BOARD_RADIUS);

        let mut terrains = Terrain::standard_set();
        rng.shuffle(&mut terrains);

        let productive: Vec<HexCoord> = coords
            .iter()
            .zip(&terrains)
            .filter(|(_, t)| t.resource().is_some())
            .map(|(c, _)| *c)
            .collect();
        let chits = assign_chits(&productive, rng);

        let tiles = coords.iter().zip(terrains).map(|(coord, terrain)| {
            let chit = chits.get(coord).copied();
            (*coord, terrain, chit)
        });

        let mut grid = Self::from_tiles(tiles);
        grid.place_ports(rng);
        grid
    }

    /// Build the topology for a fixed set of tiles. The robber starts on the
    /// first desert, or on the first tile if there is none. No ports.
    pub fn from_tiles(tiles: impl IntoIterator<Item = (HexCoord, Terrain, Option<u8>)>) -> Self {
        let mut hexes = BTreeMap::new();
        for (coord, terrain, chit) in tiles {
            let chit = match terrain {
                Terrain::Desert => None,
                Terrain::Resource(_) => chit,
            };
            hexes.insert(
                coord,
                Hex {
                    coord,
                    terrain,
                    chit,
                    has_robber: false,
                },
            );
        }

        let robber = hexes
            .values()
            .find(|h| h.terrain == Terrain::Desert)
            .or_else(|| hexes.values().next())
            .map(|h| h.coord)
            .unwrap_or_default();
        if let Some(hex) = hexes.get_mut(&robber) {
            hex.has_robber = true;
        }

        let mut edges = BTreeMap::new();
        for coord in hexes.keys() {
            for edge in coord.edges() {
                edges.entry(edge).or_insert_with(|| Edge {
                    coord: edge,
                    endpoints: edge.endpoints(),
                    road: None,
                });
            }
        }

        let mut nodes = BTreeMap::new();
        for coord in hexes.keys() {
            for node in coord.nodes() {
                nodes.entry(node).or_insert_with(|| Node {
                    coord: node,
                    hexes: node
                        .touching_hexes()
                        .into_iter()
                        .filter(|h| hexes.contains_key(h))
                        .collect(),
                    edges: node
                        .touching_edges()
                        .into_iter()
                        .filter(|e| edges.contains_key(e))
                        .collect(),
                    building: None,
                    port: None,
                });
            }
        }

        Self {
            hexes,
            nodes,
            edges,
            ports: Vec::new(),
            robber,
        }
    }

    /// Sides with land on exactly one side, in walking order around the coast.
    pub fn coastline(&self) -> Vec<EdgeCoord> {
        let is_coastal = |edge: &EdgeCoord| {
            edge.touching_hexes()
                .iter()
                .filter(|h| self.hexes.contains_key(h))
                .count()
                == 1
        };

        let Some(start) = self.edges.keys().copied().find(|e| is_coastal(e)) else {
            return Vec::new();
        };

        let mut ring = vec![start];
        let mut current = start;
        let mut at = start.endpoints()[1];
        loop {
            let next = self.nodes.get(&at).and_then(|node| {
                node.edges
                    .iter()
                    .copied()
                    .find(|e| *e != current && is_coastal(e))
            });
            match next {
                Some(edge) if edge != start => {
                    ring.push(edge);
                    at = edge.other_end(at);
                    current = edge;
                }
                _ => break,
            }
        }
        ring
    }

    /// Place the standard ports around the coast.
    ///
    /// Walking the coastline, consecutive ports are at least two sides apart
    /// (they never share a corner) and at most one pair sits at exactly two.
    fn place_ports(&mut self, rng: &mut RandomSource) {
        let coast = self.coastline();
        let mut kinds = PortKind::standard_set();
        rng.shuffle(&mut kinds);

        let positions = port_positions(coast.len(), kinds.len(), rng);
        for (index, kind) in positions.into_iter().zip(kinds) {
            self.add_port(Port {
                edge: coast[index],
                kind,
            });
        }
    }

    /// Attach a port to a coastal edge and to both of its corners.
    pub fn add_port(&mut self, port: Port) {
        for end in port.edge.endpoints() {
            if let Some(node) = self.nodes.get_mut(&end) {
                node.port = Some(port.kind);
            }
        }
        self.ports.push(port);
    }

    /// Whether the placed ports obey the coastline spacing rule.
    pub fn ports_are_spaced(&self) -> bool {
        let coast = self.coastline();
        let mut indices: Vec<usize> = self
            .ports
            .iter()
            .filter_map(|p| coast.iter().position(|e| *e == p.edge))
            .collect();
        if indices.len() != self.ports.len() {
            return false;
        }
        if indices.len() < 2 {
            return true;
        }
        indices.sort_unstable();

        let len = coast.len();
        let mut tight_pairs = 0;
        for (i, &at) in indices.iter().enumerate() {
            let next = indices[(i + 1) % indices.len()];
            let gap = (next + len - at) % len;
            match gap {
                0 | 1 => return false,
                2 => tight_pairs += 1,
                _ => {}
            }
        }
        tight_pairs <= 1
    }

    // ==================== Lookup ====================

    /// Look up a tile. Off-board coordinates are `InvalidCoordinates`.
    pub fn hex(&self, coord: &HexCoord) -> GameResult<&Hex> {
        self.hexes.get(coord).ok_or(GameError::InvalidCoordinates)
    }

    /// Look up a corner
    pub fn node(&self, coord: &NodeCoord) -> GameResult<&Node> {
        self.nodes.get(coord).ok_or(GameError::InvalidCoordinates)
    }

    /// Look up a side
    pub fn edge(&self, coord: &EdgeCoord) -> GameResult<&Edge> {
        self.edges.get(coord).ok_or(GameError::InvalidCoordinates)
    }

    /// All land tiles
    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Ports placed on the coastline
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Tile the robber is on
    pub fn robber(&self) -> HexCoord {
        self.robber
    }

    /// Building on a corner, if any
    pub fn building_at(&self, node: &NodeCoord) -> Option<Building> {
        self.nodes.get(node).and_then(|n| n.building)
    }

    /// Owner of the road on a side, if any
    pub fn road_at(&self, edge: &EdgeCoord) -> Option<Colour> {
        self.edges.get(edge).and_then(|e| e.road)
    }

    /// The side joining two corners, if they are adjacent.
    pub fn find_edge(&self, a: &NodeCoord, b: &NodeCoord) -> Option<EdgeCoord> {
        self.nodes
            .get(a)?
            .edges
            .iter()
            .copied()
            .find(|e| e.other_end(*a) == *b)
    }

    /// On-board corners one side away.
    pub fn adjacent_nodes(&self, node: &NodeCoord) -> Vec<NodeCoord> {
        self.nodes
            .get(node)
            .map(|n| n.edges.iter().map(|e| e.other_end(*node)).collect())
            .unwrap_or_default()
    }

    /// On-board sides ending at a corner.
    pub fn edges_at(&self, node: &NodeCoord) -> Vec<EdgeCoord> {
        self.nodes
            .get(node)
            .map(|n| n.edges.clone())
            .unwrap_or_default()
    }

    /// Whether a corner is free of buildings on every adjacent corner.
    pub fn satisfies_distance_rule(&self, node: &NodeCoord) -> bool {
        self.adjacent_nodes(node)
            .iter()
            .all(|adj| self.building_at(adj).is_none())
    }

    /// Whether one of the edge's endpoints holds a building (of `owner`, if
    /// given).
    pub fn is_near_settlement(&self, edge: &EdgeCoord, owner: Option<Colour>) -> bool {
        edge.endpoints().iter().any(|end| match self.building_at(end) {
            Some(b) => owner.map_or(true, |c| b.owner() == c),
            None => false,
        })
    }

    /// Tiles showing `sum`
    pub fn hexes_with_chit(&self, sum: u8) -> impl Iterator<Item = &Hex> {
        self.hexes.values().filter(move |h| h.chit == Some(sum))
    }

    /// Corners of a hex that exist on the board.
    pub fn nodes_of_hex(&self, hex: &HexCoord) -> Vec<NodeCoord> {
        hex.nodes()
            .into_iter()
            .filter(|n| self.nodes.contains_key(n))
            .collect()
    }

    /// Owners of buildings on the corners of a hex, without duplicates.
    pub fn colours_around(&self, hex: &HexCoord) -> Vec<Colour> {
        let mut colours = Vec::new();
        for node in self.nodes_of_hex(hex) {
            if let Some(building) = self.building_at(&node) {
                if !colours.contains(&building.owner()) {
                    colours.push(building.owner());
                }
            }
        }
        colours
    }

    /// Ports reachable through the colour's buildings.
    pub fn ports_for(&self, colour: Colour) -> Vec<PortKind> {
        let mut kinds = Vec::new();
        for node in self.nodes.values() {
            if let (Some(kind), Some(building)) = (node.port, node.building) {
                if building.owner() == colour && !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    // ==================== Mutation ====================

    pub(crate) fn set_building(&mut self, node: &NodeCoord, building: Building) -> GameResult<()> {
        let node = self.nodes.get_mut(node).ok_or(GameError::InvalidCoordinates)?;
        node.building = Some(building);
        Ok(())
    }

    pub(crate) fn set_road(&mut self, edge: &EdgeCoord, colour: Colour) -> GameResult<()> {
        let edge = self.edges.get_mut(edge).ok_or(GameError::InvalidCoordinates)?;
        edge.road = Some(colour);
        Ok(())
    }

    /// Move the single robber marker. `from` must be where it currently is.
    pub fn swap_robber(&mut self, from: HexCoord, to: HexCoord) -> GameResult<()> {
        if !self.hexes.contains_key(&to) {
            return Err(GameError::InvalidCoordinates);
        }
        if from != self.robber || from == to {
            return Err(GameError::IllegalPlacement);
        }
        if let Some(hex) = self.hexes.get_mut(&from) {
            hex.has_robber = false;
        }
        if let Some(hex) = self.hexes.get_mut(&to) {
            hex.has_robber = true;
        }
        self.robber = to;
        Ok(())
    }

    /// Array-based view for clients (JSON keys cannot be structs).
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            hexes: self.hexes.values().cloned().collect(),
            buildings: self
                .nodes
                .values()
                .filter_map(|n| n.building.map(|b| (n.coord, b)))
                .collect(),
            roads: self
                .edges
                .values()
                .filter_map(|e| e.road.map(|c| (e.coord, c)))
                .collect(),
            ports: self.ports.clone(),
            robber: self.robber,
        }
    }
}

/// Board state sent to clients when the game begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub hexes: Vec<Hex>,
    pub buildings: Vec<(NodeCoord, Building)>,
    pub roads: Vec<(EdgeCoord, Colour)>,
    pub ports: Vec<Port>,
    pub robber: HexCoord,
}

/// Shuffle chits onto the productive hexes, retrying until no 6 or 8 touches
/// another 6 or 8.
fn assign_chits(productive: &[HexCoord], rng: &mut RandomSource) -> HashMap<HexCoord, u8> {
    let mut chits = STANDARD_CHITS.to_vec();
    chits.truncate(productive.len());

    let mut placement = HashMap::new();
    for _ in 0..MAX_CHIT_ATTEMPTS {
        rng.shuffle(&mut chits);
        placement = productive.iter().copied().zip(chits.iter().copied()).collect();
        if red_chits_separated(&placement) {
            break;
        }
    }
    placement
}

fn red_chits_separated(placement: &HashMap<HexCoord, u8>) -> bool {
    let is_red = |n: u8| n == 6 || n == 8;
    placement.iter().filter(|(_, &n)| is_red(n)).all(|(coord, _)| {
        coord
            .neighbors()
            .iter()
            .all(|adj| !placement.get(adj).is_some_and(|&n| is_red(n)))
    })
}

/// Coastline indices for `count` ports on a ring of `len` sides.
fn port_positions(len: usize, count: usize, rng: &mut RandomSource) -> Vec<usize> {
    if count == 0 || len == 0 {
        return Vec::new();
    }
    // Every gap is 3 except possibly one 2; leftover sides widen random gaps.
    let mut gaps = vec![3usize; count];
    if rng.chance(0.5) {
        let tight = rng.index(count);
        gaps[tight] = 2;
    }
    let used: usize = gaps.iter().sum();
    if used > len {
        // Ring too short for the rule: spread ports as evenly as possible.
        return (0..count.min(len)).map(|i| i * len / count.min(len)).collect();
    }
    for _ in 0..len - used {
        let widen = rng.index(count);
        gaps[widen] += 1;
    }

    let mut at = rng.index(len);
    let mut positions = Vec::with_capacity(count);
    for gap in gaps {
        positions.push(at);
        at = (at + gap) % len;
    }
    positions
}

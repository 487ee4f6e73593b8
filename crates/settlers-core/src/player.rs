//! Player state and the rules that only concern one player.
//!
//! This module contains:
//! - `Colour`, the stable identity of a seat
//! - `ResourceHand` for resource counts
//! - `DevCardHand`, separating cards bought this turn from playable ones
//! - `RoadChain` and the merge/split logic behind road length
//! - `Player` with its build, buy and play operations
//! - Building costs

use crate::bank::{Bank, DevCardKind, Piece};
use crate::board::{Building, HexGrid, PlayerId, Resource};
use crate::error::{GameError, GameResult, StockItem};
use crate::hex::{EdgeCoord, NodeCoord};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Seat colour. Seat order and colour order are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Colour {
    Red,
    Blue,
    Orange,
    White,
}

impl Colour {
    pub const ALL: [Colour; 4] = [Colour::Red, Colour::Blue, Colour::Orange, Colour::White];

    /// Colour for a seat index
    pub fn for_seat(id: PlayerId) -> Self {
        Self::ALL[id as usize % Self::ALL.len()]
    }

    pub fn seat(&self) -> PlayerId {
        *self as PlayerId
    }

    /// Hex colour code for rendering clients.
    pub fn hex_code(&self) -> u32 {
        match self {
            Colour::Red => 0xE74C3C,
            Colour::Blue => 0x3498DB,
            Colour::Orange => 0xE67E22,
            Colour::White => 0xECF0F1,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A hand of resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub lumber: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(brick: u32, lumber: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            lumber,
            ore,
            grain,
            wool,
        }
    }

    /// A hand holding only one resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        [self.brick, self.lumber, self.ore, self.grain, self.wool]
            .into_iter()
            .fold(0u32, u32::saturating_add)
    }

    /// Whether any single count is above `limit`.
    pub fn exceeds(&self, limit: u32) -> bool {
        Resource::ALL.iter().any(|r| self.get(*r) > limit)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
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

    /// Add resources, saturating
    pub fn add(&mut self, resource: Resource, amount: u32) {
        let slot = self.slot(resource);
        *slot = slot.saturating_add(amount);
    }

    pub fn add_hand(&mut self, other: &ResourceHand) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Non-zero counts in `Resource::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, n)| *n > 0)
    }

    /// The first resource `cost` needs more of than this hand holds.
    pub fn shortfall(&self, cost: &ResourceHand) -> Option<(Resource, u32, u32)> {
        cost.iter()
            .find(|(r, required)| self.get(*r) < *required)
            .map(|(r, required)| (r, required, self.get(r)))
    }

    /// Check if this hand covers `cost`
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        self.shortfall(cost).is_none()
    }

    /// Remove `cost`, saturating at zero. Check `can_afford` first.
    pub fn subtract(&mut self, cost: &ResourceHand) {
        for (resource, amount) in cost.iter() {
            let slot = self.slot(resource);
            *slot = slot.saturating_sub(amount);
        }
    }

    /// Remove one card, chosen uniformly over the cards held.
    pub fn take_random(&mut self, rng: &mut RandomSource) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut pick = rng.index(total as usize) as u32;
        let held: Vec<(Resource, u32)> = self.iter().collect();
        for (resource, amount) in held {
            if pick < amount {
                *self.slot(resource) -= 1;
                return Some(resource);
            }
            pick -= amount;
        }
        None
    }
}

impl fmt::Display for ResourceHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(r, n)| format!("{n} {r:?}")).collect();
        if parts.is_empty() {
            write!(f, "nothing")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 brick, 1 lumber
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 brick, 1 lumber, 1 grain, 1 wool
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 1, 1)
    }

    /// Cost to upgrade to city: 3 ore, 2 grain
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 3, 2, 0)
    }

    /// Cost to buy a development card: 1 ore, 1 grain, 1 wool
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// Development cards held by one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCardHand {
    available: BTreeMap<DevCardKind, u32>,
    bought_this_turn: BTreeMap<DevCardKind, u32>,
}

impl DevCardHand {
    pub fn add_bought(&mut self, kind: DevCardKind) {
        *self.bought_this_turn.entry(kind).or_default() += 1;
    }

    /// Cards of `kind` that may be played now.
    pub fn playable(&self, kind: DevCardKind) -> u32 {
        self.available.get(&kind).copied().unwrap_or(0)
    }

    pub fn bought_this_turn(&self, kind: DevCardKind) -> u32 {
        self.bought_this_turn.get(&kind).copied().unwrap_or(0)
    }

    fn take_playable(&mut self, kind: DevCardKind) -> bool {
        match self.available.get_mut(&kind) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    /// Make this turn's purchases playable.
    pub fn ripen(&mut self) {
        for (kind, n) in std::mem::take(&mut self.bought_this_turn) {
            *self.available.entry(kind).or_default() += n;
        }
    }

    /// Cards held, playable or not
    pub fn total(&self) -> u32 {
        self.available.values().sum::<u32>() + self.bought_this_turn.values().sum::<u32>()
    }

    /// Victory point cards count as soon as they are bought
    pub fn victory_points(&self) -> u32 {
        DevCardKind::ALL
            .iter()
            .filter(|k| k.is_victory_point())
            .map(|k| self.playable(*k) + self.bought_this_turn(*k))
            .sum()
    }
}

/// A maximal connected group of one player's roads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadChain {
    pub roads: BTreeSet<EdgeCoord>,
}

impl RoadChain {
    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn touches(&self, node: NodeCoord) -> bool {
        self.roads.iter().any(|r| r.has_endpoint(node))
    }
}

/// How a build is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Initial placement: free, no road needed for settlements.
    Setup,
    /// Road Building card: free, but connectivity rules apply.
    Free,
    /// Paid at the normal cost.
    Paid,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub colour: Colour,
    pub username: String,
    pub resources: ResourceHand,
    pub buildings: BTreeMap<NodeCoord, Building>,
    pub road_chains: Vec<RoadChain>,
    pub dev_cards: DevCardHand,
    pub knights_played: u32,
    pub has_longest_road: bool,
    pub has_largest_army: bool,
    pub played_dev_card_this_turn: bool,
}

impl Player {
    /// Create a new player for a seat
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            colour: Colour::for_seat(id),
            username: username.into(),
            resources: ResourceHand::new(),
            buildings: BTreeMap::new(),
            road_chains: Vec::new(),
            dev_cards: DevCardHand::default(),
            knights_played: 0,
            has_longest_road: false,
            has_largest_army: false,
            played_dev_card_this_turn: false,
        }
    }

    /// Calculate total victory points
    pub fn victory_points(&self) -> u32 {
        let buildings: u32 = self.buildings.values().map(Building::victory_points).sum();
        let bonuses = 2 * (self.has_longest_road as u32 + self.has_largest_army as u32);
        buildings + bonuses + self.dev_cards.victory_points()
    }

    /// Size of the largest road chain.
    pub fn road_length(&self) -> u32 {
        self.road_chains.iter().map(|c| c.len() as u32).max().unwrap_or(0)
    }

    /// Every road this player has built
    pub fn roads(&self) -> impl Iterator<Item = &EdgeCoord> {
        self.road_chains.iter().flat_map(|c| c.roads.iter())
    }

    pub fn settlements(&self) -> impl Iterator<Item = &NodeCoord> {
        self.buildings
            .iter()
            .filter(|(_, b)| matches!(b, Building::Settlement(_)))
            .map(|(n, _)| n)
    }

    // ==================== Resources ====================

    /// Remove `hand` from this player, or nothing if any count is short.
    pub fn spend_resources(&mut self, hand: &ResourceHand) -> GameResult<()> {
        if let Some((resource, required, held)) = self.resources.shortfall(hand) {
            return Err(GameError::CannotAfford {
                resource,
                required,
                held,
            });
        }
        self.resources.subtract(hand);
        Ok(())
    }

    pub fn grant_resources(&mut self, hand: &ResourceHand) {
        self.resources.add_hand(hand);
    }

    /// Pay a cost into the bank.
    fn pay(&mut self, bank: &mut Bank, cost: &ResourceHand) -> GameResult<()> {
        self.spend_resources(cost)?;
        bank.commit_grant(cost);
        Ok(())
    }

    fn check_afford(&self, cost: &ResourceHand) -> GameResult<()> {
        match self.resources.shortfall(cost) {
            Some((resource, required, held)) => Err(GameError::CannotAfford {
                resource,
                required,
                held,
            }),
            None => Ok(()),
        }
    }

    fn check_piece(&self, bank: &Bank, piece: Piece) -> GameResult<()> {
        let item = StockItem::Piece(self.colour, piece);
        if bank.reserve(item, 1) {
            Ok(())
        } else {
            Err(GameError::OutOfStock(item))
        }
    }

    // ==================== Building ====================

    /// Place a settlement. Outside setup it costs resources and must touch one of our roads.
    pub fn build_settlement(
        &mut self,
        grid: &mut HexGrid,
        bank: &mut Bank,
        node: NodeCoord,
        mode: BuildMode,
    ) -> GameResult<()> {
        let site = grid.node(&node)?;
        if mode != BuildMode::Setup {
            self.check_afford(&costs::settlement())?;
        }
        if site.building.is_some() {
            return Err(GameError::SettlementExists);
        }
        if !grid.satisfies_distance_rule(&node) {
            return Err(GameError::IllegalPlacement);
        }
        if mode != BuildMode::Setup {
            let on_own_road = site
                .edges
                .iter()
                .any(|e| grid.road_at(e) == Some(self.colour));
            if !on_own_road {
                return Err(GameError::IllegalPlacement);
            }
        }
        self.check_piece(bank, Piece::Settlement)?;

        if mode != BuildMode::Setup {
            self.pay(bank, &costs::settlement())?;
        }
        bank.take_piece(self.colour, Piece::Settlement)?;
        let building = Building::Settlement(self.colour);
        grid.set_building(&node, building)?;
        self.buildings.insert(node, building);
        Ok(())
    }

    /// Place a road that joins our network, merging any chains it connects
    pub fn build_road(
        &mut self,
        grid: &mut HexGrid,
        bank: &mut Bank,
        edge: EdgeCoord,
        mode: BuildMode,
    ) -> GameResult<()> {
        let site = grid.edge(&edge)?;
        if site.road.is_some() {
            return Err(GameError::RoadExists);
        }
        if !self.can_reach(grid, &edge) {
            return Err(GameError::CannotBuildRoad);
        }
        if mode == BuildMode::Paid {
            self.check_afford(&costs::road())?;
        }
        self.check_piece(bank, Piece::Road)?;

        if mode == BuildMode::Paid {
            self.pay(bank, &costs::road())?;
        }
        bank.take_piece(self.colour, Piece::Road)?;
        grid.set_road(&edge, self.colour)?;
        self.attach_road(grid, edge);
        Ok(())
    }

    /// Upgrade a settlement to a city
    pub fn build_city(
        &mut self,
        grid: &mut HexGrid,
        bank: &mut Bank,
        node: NodeCoord,
    ) -> GameResult<()> {
        if self.buildings.get(&node) != Some(&Building::Settlement(self.colour)) {
            return Err(GameError::CannotUpgrade);
        }
        self.check_afford(&costs::city())?;
        self.check_piece(bank, Piece::City)?;

        self.pay(bank, &costs::city())?;
        bank.take_piece(self.colour, Piece::City)?;
        bank.return_piece(self.colour, Piece::Settlement);
        let city = Building::City(self.colour);
        grid.set_building(&node, city)?;
        self.buildings.insert(node, city);
        Ok(())
    }

    /// Whether a new road on `edge` would join this player's network: an
    /// endpoint holds one of our buildings, or is free of opposing buildings
    /// and already has one of our roads.
    pub fn can_reach(&self, grid: &HexGrid, edge: &EdgeCoord) -> bool {
        if grid.is_near_settlement(edge, Some(self.colour)) {
            return true;
        }
        edge.endpoints().iter().any(|end| {
            grid.building_at(end).is_none()
                && grid
                    .edges_at(end)
                    .iter()
                    .any(|e| e != edge && grid.road_at(e) == Some(self.colour))
        })
    }

    /// A node links two of our roads unless an opponent has built on it.
    fn links_at(&self, grid: &HexGrid, node: &NodeCoord) -> bool {
        grid.building_at(node)
            .map_or(true, |b| b.owner() == self.colour)
    }

    /// Add a road to the chain it touches, merging chains it joins.
    fn attach_road(&mut self, grid: &HexGrid, edge: EdgeCoord) {
        let links: Vec<NodeCoord> = edge
            .endpoints()
            .into_iter()
            .filter(|n| self.links_at(grid, n))
            .collect();

        let (touching, rest): (Vec<RoadChain>, Vec<RoadChain>) = std::mem::take(&mut self.road_chains)
            .into_iter()
            .partition(|chain| links.iter().any(|n| chain.touches(*n)));
        self.road_chains = rest;

        let mut merged = RoadChain::default();
        for chain in touching {
            merged.roads.extend(chain.roads);
        }
        merged.roads.insert(edge);
        self.road_chains.push(merged);
    }

    /// Re-derive the chains running through `node` after an opponent built
    /// there.
    pub fn split_chains_at(&mut self, grid: &HexGrid, node: NodeCoord) {
        let (through, rest): (Vec<RoadChain>, Vec<RoadChain>) = std::mem::take(&mut self.road_chains)
            .into_iter()
            .partition(|chain| chain.touches(node));
        self.road_chains = rest;

        for chain in through {
            let parts = self.components(grid, chain.roads);
            self.road_chains.extend(parts);
        }
    }

    /// Split a set of roads into connected components.
    fn components(&self, grid: &HexGrid, mut roads: BTreeSet<EdgeCoord>) -> Vec<RoadChain> {
        let mut chains = Vec::new();
        while let Some(start) = roads.pop_first() {
            let mut chain = RoadChain::default();
            let mut frontier = vec![start];
            while let Some(road) = frontier.pop() {
                for end in road.endpoints() {
                    if !self.links_at(grid, &end) {
                        continue;
                    }
                    let linked: Vec<EdgeCoord> =
                        roads.iter().copied().filter(|r| r.has_endpoint(end)).collect();
                    for next in linked {
                        roads.remove(&next);
                        frontier.push(next);
                    }
                }
                chain.roads.insert(road);
            }
            chains.push(chain);
        }
        chains
    }

    // ==================== Development cards ====================

    /// Pay for and draw a development card
    pub fn buy_development_card(
        &mut self,
        bank: &mut Bank,
        rng: &mut RandomSource,
    ) -> GameResult<DevCardKind> {
        self.check_afford(&costs::development_card())?;
        if !bank.reserve(StockItem::DevelopmentCard, 1) {
            return Err(GameError::OutOfStock(StockItem::DevelopmentCard));
        }
        let kind = bank.random_development_card(rng)?;
        self.pay(bank, &costs::development_card())?;
        self.dev_cards.add_bought(kind);
        Ok(kind)
    }

    /// Play a card bought on an earlier turn. One card per turn.
    pub fn play_development_card(&mut self, kind: DevCardKind) -> GameResult<()> {
        if kind.is_victory_point() || self.dev_cards.playable(kind) == 0 {
            return Err(GameError::DoesNotOwn(kind));
        }
        if self.played_dev_card_this_turn {
            return Err(GameError::CardAlreadyPlayed);
        }
        self.dev_cards.take_playable(kind);
        self.played_dev_card_this_turn = true;
        if kind == DevCardKind::Knight {
            self.knights_played += 1;
        }
        Ok(())
    }

    /// Cards bought this turn become playable
    pub fn end_turn(&mut self) {
        self.dev_cards.ripen();
        self.played_dev_card_this_turn = false;
    }
}

//! The bank: resource pools, the development card supply and every colour's
//! building pieces.
//!
//! Pools are hard limits. Nothing here ever goes negative; callers get
//! `GameError::OutOfStock` instead and the bank is left untouched.

use crate::board::Resource;
use crate::error::{GameError, GameResult, StockItem};
use crate::player::{Colour, ResourceHand};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cards of each resource in a standard bank.
pub const STANDARD_RESOURCE_COUNT: u32 = 19;

/// Development card types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DevCardKind {
    /// Move the robber and steal; counts toward Largest Army.
    Knight,
    /// Build two roads for free.
    RoadBuilding,
    /// Take two resources from the bank.
    YearOfPlenty,
    /// Take every card of one resource from all opponents.
    Monopoly,
    /// One victory point.
    Library,
    /// One victory point.
    University,
}

impl DevCardKind {
    pub const ALL: [DevCardKind; 6] = [
        DevCardKind::Knight,
        DevCardKind::RoadBuilding,
        DevCardKind::YearOfPlenty,
        DevCardKind::Monopoly,
        DevCardKind::Library,
        DevCardKind::University,
    ];

    /// Copies in the standard 25-card supply.
    pub fn standard_count(&self) -> u32 {
        match self {
            DevCardKind::Knight => 14,
            DevCardKind::RoadBuilding | DevCardKind::YearOfPlenty | DevCardKind::Monopoly => 2,
            DevCardKind::Library => 3,
            DevCardKind::University => 2,
        }
    }

    /// Victory point cards score while held and are never played.
    pub fn is_victory_point(&self) -> bool {
        matches!(self, DevCardKind::Library | DevCardKind::University)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    Road,
    Settlement,
    City,
}

impl Piece {
    /// Pieces of this kind each colour starts with
    pub fn starting_count(&self) -> u32 {
        match self {
            Piece::Road => 15,
            Piece::Settlement => 5,
            Piece::City => 4,
        }
    }
}

/// Unbuilt pieces belonging to one colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceStock {
    pub roads: u32,
    pub settlements: u32,
    pub cities: u32,
}

impl Default for PieceStock {
    fn default() -> Self {
        Self {
            roads: Piece::Road.starting_count(),
            settlements: Piece::Settlement.starting_count(),
            cities: Piece::City.starting_count(),
        }
    }
}

impl PieceStock {
    fn slot(&mut self, piece: Piece) -> &mut u32 {
        match piece {
            Piece::Road => &mut self.roads,
            Piece::Settlement => &mut self.settlements,
            Piece::City => &mut self.cities,
        }
    }

    /// Pieces of `piece` kind still in stock
    pub fn get(&self, piece: Piece) -> u32 {
        match piece {
            Piece::Road => self.roads,
            Piece::Settlement => self.settlements,
            Piece::City => self.cities,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bank {
    resources: ResourceHand,
    dev_cards: BTreeMap<DevCardKind, u32>,
    pieces: BTreeMap<Colour, PieceStock>,
}

impl Default for Bank {
    fn default() -> Self {
        Self::new(STANDARD_RESOURCE_COUNT)
    }
}

impl Bank {
    /// A full bank holding `resource_count` of each resource.
    pub fn new(resource_count: u32) -> Self {
        let mut resources = ResourceHand::new();
        for resource in Resource::ALL {
            resources.set(resource, resource_count);
        }
        Self {
            resources,
            dev_cards: DevCardKind::ALL
                .iter()
                .map(|k| (*k, k.standard_count()))
                .collect(),
            pieces: Colour::ALL
                .iter()
                .map(|c| (*c, PieceStock::default()))
                .collect(),
        }
    }

    /// Resource cards left in the bank
    pub fn resources(&self) -> &ResourceHand {
        &self.resources
    }

    /// Development cards left in the deck
    pub fn dev_cards_left(&self) -> u32 {
        self.dev_cards.values().sum()
    }

    /// Unbuilt pieces for a colour
    pub fn pieces(&self, colour: Colour) -> PieceStock {
        self.pieces.get(&colour).copied().unwrap_or_default()
    }

    /// Whether `amount` of `item` is available. No side effects.
    pub fn reserve(&self, item: StockItem, amount: u32) -> bool {
        let available = match item {
            StockItem::Resource(resource) => self.resources.get(resource),
            StockItem::DevelopmentCard => self.dev_cards_left(),
            StockItem::Piece(colour, piece) => self.pieces(colour).get(piece),
        };
        available >= amount
    }

    /// Pay `hand` out of the pools. All or nothing.
    pub fn commit_spend(&mut self, hand: &ResourceHand) -> GameResult<()> {
        for resource in Resource::ALL {
            if !self.reserve(StockItem::Resource(resource), hand.get(resource)) {
                return Err(GameError::OutOfStock(StockItem::Resource(resource)));
            }
        }
        self.resources.subtract(hand);
        Ok(())
    }

    /// Return `hand` to the pools.
    pub fn commit_grant(&mut self, hand: &ResourceHand) {
        self.resources.add_hand(hand);
    }

    /// Draw a card, each type with supply left being equally likely.
    pub fn random_development_card(&mut self, rng: &mut RandomSource) -> GameResult<DevCardKind> {
        let stocked: Vec<DevCardKind> = self
            .dev_cards
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(k, _)| *k)
            .collect();
        let kind = *rng
            .choose(&stocked)
            .ok_or(GameError::OutOfStock(StockItem::DevelopmentCard))?;
        if let Some(count) = self.dev_cards.get_mut(&kind) {
            *count -= 1;
        }
        Ok(kind)
    }

    /// Take one piece from a colour's stock
    pub fn take_piece(&mut self, colour: Colour, piece: Piece) -> GameResult<()> {
        let stock = self.pieces.entry(colour).or_default();
        let slot = stock.slot(piece);
        if *slot == 0 {
            return Err(GameError::OutOfStock(StockItem::Piece(colour, piece)));
        }
        *slot -= 1;
        Ok(())
    }

    /// Put a piece back, e.g. a settlement replaced by a city
    pub fn return_piece(&mut self, colour: Colour, piece: Piece) {
        let stock = self.pieces.entry(colour).or_default();
        *stock.slot(piece) += 1;
    }
}

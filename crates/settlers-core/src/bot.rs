//! A computer player.
//!
//! Bots see exactly what a remote client could see through the processor's
//! public accessors and answer with ordinary `Request`s, so they go through
//! the same gating and validation as everyone else.

use crate::bank::{DevCardKind, Piece};
use crate::board::{HexGrid, Resource};
use crate::game::{Game, Phase};
use crate::hex::{EdgeCoord, HexCoord, NodeCoord};
use crate::messages::{DevCardPlay, MoveKind, Request, TradeResponse};
use crate::player::{costs, Colour, Player, ResourceHand};
use crate::processor::MessageProcessor;
use crate::random::RandomSource;

/// Chance of buying a development card when nothing better is affordable.
const DEV_CARD_APPETITE: f64 = 0.5;

pub struct Bot {
    pub colour: Colour,
    rng: RandomSource,
}

impl Bot {
    /// Create a bot seeded from the OS
    pub fn new(colour: Colour) -> Self {
        Self {
            colour,
            rng: RandomSource::from_entropy(),
        }
    }

    /// Create a bot with reproducible choices
    pub fn with_seed(colour: Colour, seed: u64) -> Self {
        Self {
            colour,
            rng: RandomSource::seeded(seed),
        }
    }

    /// The next request this bot wants to make, if it may move at all.
    pub fn decide(&mut self, processor: &MessageProcessor) -> Option<Request> {
        let game = processor.game()?;
        let player = game.player(self.colour).ok()?;
        let allowed = processor.allowed_moves(self.colour);
        if allowed.is_empty() {
            return None;
        }

        if allowed.contains(&MoveKind::DiscardResources) {
            if let Some(count) = processor.pending_discard(self.colour) {
                return Some(Request::DiscardResources {
                    hand: bot_discard(&player.resources, count),
                });
            }
        }
        if allowed.contains(&MoveKind::SubmitTradeResponse) {
            let affordable = processor
                .current_trade()
                .is_some_and(|t| player.resources.can_afford(&t.request));
            let response = if affordable {
                TradeResponse::Accept
            } else {
                TradeResponse::Reject
            };
            return Some(Request::SubmitTradeResponse(response));
        }
        if allowed.contains(&MoveKind::RollDice) {
            return Some(Request::RollDice);
        }
        if allowed.contains(&MoveKind::MoveRobber) {
            if processor.discards_pending() {
                return None;
            }
            return self
                .rank_robber_spots(game)
                .map(|hex| Request::MoveRobber { hex });
        }
        if allowed.contains(&MoveKind::SubmitTargetPlayer) {
            return choose_steal_target(game, self.colour).map(|target| {
                Request::SubmitTargetPlayer {
                    target,
                    resource: None,
                }
            });
        }
        if allowed.contains(&MoveKind::ChooseResource) {
            return Some(Request::ChooseResource {
                resource: richest_opponent_resource(game, self.colour),
            });
        }

        if game.phase() == Phase::Setup {
            return self.setup_move(game, player, &allowed);
        }

        // Roads from a Road Building card.
        if allowed == [MoveKind::BuildRoad] {
            return match self.expansion_road(game, player) {
                Some(edge) => Some(Request::BuildRoad { edge }),
                None => Some(Request::EndTurn),
            };
        }

        self.main_move(game, player, &allowed)
    }

    fn setup_move(&mut self, game: &Game, player: &Player, allowed: &[MoveKind]) -> Option<Request> {
        if allowed.contains(&MoveKind::BuildSettlement) {
            let spots: Vec<NodeCoord> = game
                .grid()
                .nodes()
                .filter(|n| n.building.is_none() && game.grid().satisfies_distance_rule(&n.coord))
                .map(|n| n.coord)
                .collect();
            return self
                .rank_settlement_spots(game.grid(), &spots)
                .map(|node| Request::BuildSettlement { node });
        }
        if allowed.contains(&MoveKind::BuildRoad) {
            // The settlement still without a road is the one just placed.
            let anchor = player.settlements().copied().find(|node| {
                game.grid()
                    .edges_at(node)
                    .iter()
                    .all(|e| game.grid().road_at(e) != Some(self.colour))
            })?;
            let edges: Vec<EdgeCoord> = game
                .grid()
                .edges_at(&anchor)
                .into_iter()
                .filter(|e| game.grid().road_at(e).is_none())
                .collect();
            return self
                .rng
                .choose(&edges)
                .map(|edge| Request::BuildRoad { edge: *edge });
        }
        None
    }

    fn main_move(&mut self, game: &Game, player: &Player, allowed: &[MoveKind]) -> Option<Request> {
        let hand = &player.resources;
        let pieces = game.bank().pieces(self.colour);

        if allowed.contains(&MoveKind::PlayDevCard)
            && !player.played_dev_card_this_turn
            && player.dev_cards.playable(DevCardKind::Knight) > 0
        {
            return Some(Request::PlayDevCard(DevCardPlay::Knight));
        }

        if hand.can_afford(&costs::city()) && pieces.get(Piece::City) > 0 {
            if let Some(node) = player.settlements().next() {
                return Some(Request::BuildCity { node: *node });
            }
        }

        if hand.can_afford(&costs::settlement()) && pieces.get(Piece::Settlement) > 0 {
            let spots: Vec<NodeCoord> = game
                .grid()
                .nodes()
                .filter(|n| {
                    n.building.is_none()
                        && game.grid().satisfies_distance_rule(&n.coord)
                        && n.edges
                            .iter()
                            .any(|e| game.grid().road_at(e) == Some(self.colour))
                })
                .map(|n| n.coord)
                .collect();
            if let Some(node) = self.rank_settlement_spots(game.grid(), &spots) {
                return Some(Request::BuildSettlement { node });
            }
        }

        if hand.can_afford(&costs::road()) && pieces.get(Piece::Road) > 0 {
            if let Some(edge) = self.expansion_road(game, player) {
                return Some(Request::BuildRoad { edge });
            }
        }

        if hand.can_afford(&costs::development_card())
            && game.bank().dev_cards_left() > 0
            && self.rng.chance(DEV_CARD_APPETITE)
        {
            return Some(Request::BuyDevCard);
        }

        Some(Request::EndTurn)
    }

    /// Best-scoring spot, with a small chance of taking the runner-up.
    fn rank_settlement_spots(&mut self, grid: &HexGrid, spots: &[NodeCoord]) -> Option<NodeCoord> {
        let mut scored: Vec<(NodeCoord, i32)> =
            spots.iter().map(|n| (*n, score_node(grid, n))).collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        if scored.len() >= 2 && self.rng.chance(0.1) {
            Some(scored[1].0)
        } else {
            scored.first().map(|(n, _)| *n)
        }
    }

    /// A free edge that extends our network, preferring ones that open up
    /// settlement spots.
    fn expansion_road(&mut self, game: &Game, player: &Player) -> Option<EdgeCoord> {
        let grid = game.grid();
        let candidates: Vec<EdgeCoord> = grid
            .edges()
            .filter(|e| e.road.is_none() && player.can_reach(grid, &e.coord))
            .map(|e| e.coord)
            .collect();
        let opening: Vec<EdgeCoord> = candidates
            .iter()
            .copied()
            .filter(|e| {
                e.endpoints().iter().any(|n| {
                    grid.building_at(n).is_none() && grid.satisfies_distance_rule(n)
                })
            })
            .collect();
        let pool = if opening.is_empty() { &candidates } else { &opening };
        self.rng.choose(pool).copied()
    }

    fn rank_robber_spots(&self, game: &Game) -> Option<HexCoord> {
        let robber = game.grid().robber();
        game.grid()
            .hexes()
            .filter(|h| h.coord != robber)
            .max_by_key(|h| score_robber_spot(game, self.colour, &h.coord))
            .map(|h| h.coord)
    }
}

/// Pip weight of a dice sum.
fn pips(chit: u8) -> i32 {
    match chit {
        6 | 8 => 5,
        5 | 9 => 4,
        4 | 10 => 3,
        3 | 11 => 2,
        2 | 12 => 1,
        _ => 0,
    }
}

fn score_node(grid: &HexGrid, node: &NodeCoord) -> i32 {
    let Ok(site) = grid.node(node) else {
        return 0;
    };
    let production: i32 = site
        .hexes
        .iter()
        .filter_map(|h| grid.hex(h).ok())
        .filter_map(|h| h.chit)
        .map(pips)
        .sum();
    let port = if site.port.is_some() { 1 } else { 0 };
    production + port
}

fn score_robber_spot(game: &Game, colour: Colour, hex: &HexCoord) -> i32 {
    let grid = game.grid();
    let mut score = grid
        .hex(hex)
        .ok()
        .and_then(|h| h.chit)
        .map(|c| pips(c) * 2)
        .unwrap_or(0);

    for owner in grid.colours_around(hex) {
        if owner == colour {
            score -= 20;
        } else {
            score += 5;
        }
    }
    score
}

/// The opponent next to the robber holding the most cards.
fn choose_steal_target(game: &Game, colour: Colour) -> Option<Colour> {
    game.robbable_victims(colour)
        .into_iter()
        .max_by_key(|c| {
            game.player(*c)
                .map(|p| p.resources.total())
                .unwrap_or(0)
        })
}

fn richest_opponent_resource(game: &Game, colour: Colour) -> Resource {
    Resource::ALL
        .into_iter()
        .max_by_key(|r| {
            game.players()
                .iter()
                .filter(|p| p.colour != colour)
                .map(|p| p.resources.get(*r))
                .sum::<u32>()
        })
        .unwrap_or(Resource::Ore)
}

/// Give up `count` cards, always from the largest pile.
pub fn bot_discard(hand: &ResourceHand, count: u32) -> ResourceHand {
    let mut remaining = hand.clone();
    let mut discard = ResourceHand::new();
    for _ in 0..count {
        let Some(resource) = Resource::ALL
            .into_iter()
            .filter(|r| remaining.get(*r) > 0)
            .max_by_key(|r| remaining.get(*r))
        else {
            break;
        };
        remaining.set(resource, remaining.get(resource) - 1);
        discard.add(resource, 1);
    }
    discard
}

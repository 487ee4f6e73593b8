//! The turn engine.
//!
//! `Game` owns the board, the bank, the roster and the random source, and
//! implements every rule that spans more than one player: resource
//! allocation, the robber, trades, bonus cards and the win check. It does not
//! know which moves are currently expected; that is the message processor's
//! job.

use crate::bank::{Bank, DevCardKind};
use crate::board::{HexGrid, PortKind, Resource};
use crate::config::GameConfig;
use crate::error::{GameError, GameResult, StockItem};
use crate::hex::{EdgeCoord, HexCoord, NodeCoord};
use crate::messages::{Event, ResourceGrant};
use crate::player::{BuildMode, Colour, Player, ResourceHand};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum road length for Longest Road
pub const MIN_LONGEST_ROAD: u32 = 5;

/// Minimum knights for Largest Army
pub const MIN_LARGEST_ARMY: u32 = 3;

/// Default exchange rate without a port.
const BANK_RATE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Snake-order initial placement.
    Setup,
    /// The current player has not rolled yet.
    PreRoll,
    /// Building, trading and cards.
    Main,
    Finished,
}

#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    grid: HexGrid,
    bank: Bank,
    players: Vec<Player>,
    current: usize,
    first: usize,
    phase: Phase,
    rng: RandomSource,
    winner: Option<Colour>,
}

impl Game {
    /// A new game on a generated board. Seats follow `usernames` order.
    pub fn new(config: GameConfig, usernames: Vec<String>) -> Self {
        let mut rng = match config.seed {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::from_entropy(),
        };
        let grid = HexGrid::generate(&mut rng);
        Self::with_grid(config, grid, rng, usernames)
    }

    /// A new game on a given board.
    pub fn with_grid(
        config: GameConfig,
        grid: HexGrid,
        rng: RandomSource,
        usernames: Vec<String>,
    ) -> Self {
        let bank = Bank::new(config.bank_resource_count);
        let players = usernames
            .into_iter()
            .enumerate()
            .map(|(seat, name)| Player::new(seat as u8, name))
            .collect();
        Self {
            config,
            grid,
            bank,
            players,
            current: 0,
            first: 0,
            phase: Phase::Setup,
            rng,
            winner: None,
        }
    }

    // ==================== Accessors ====================

    /// Get the rule parameters
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get the board
    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    /// Get the bank
    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// All players in seat order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Get a player by colour
    pub fn player(&self, colour: Colour) -> GameResult<&Player> {
        self.players
            .get(colour.seat() as usize)
            .ok_or(GameError::GameNotStarted)
    }

    /// Direct mutable access to a seat. Bypasses the bank.
    pub fn player_mut(&mut self, colour: Colour) -> GameResult<&mut Player> {
        seat_mut(&mut self.players, colour)
    }

    /// Colours in seat order
    pub fn colours(&self) -> Vec<Colour> {
        self.players.iter().map(|p| p.colour).collect()
    }

    /// Colour whose turn it is
    pub fn current_colour(&self) -> Colour {
        Colour::for_seat(self.current as u8)
    }

    pub fn first_colour(&self) -> Colour {
        Colour::for_seat(self.first as u8)
    }

    /// Get the current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_current(&mut self, colour: Colour) {
        self.current = colour.seat() as usize;
    }

    /// The game's random source, e.g. to script dice
    pub fn rng_mut(&mut self) -> &mut RandomSource {
        &mut self.rng
    }

    // ==================== Turn order ====================

    /// Uniform pick of the player who places and rolls first.
    pub fn choose_first_player(&mut self) -> Colour {
        let count = self.players.len().max(1);
        self.first = self.rng.index(count);
        self.current = self.first;
        self.current_colour()
    }

    /// Setup placement order: forwards from the first player, then back.
    pub fn setup_order(&self) -> Vec<Colour> {
        let count = self.players.len();
        let forward: Vec<Colour> = (0..count)
            .map(|i| Colour::for_seat(((self.first + i) % count) as u8))
            .collect();
        forward
            .iter()
            .chain(forward.iter().rev())
            .copied()
            .collect()
    }

    /// Colour that plays after the current one
    pub fn next_colour(&self) -> Colour {
        let count = self.players.len().max(1);
        Colour::for_seat(((self.current + 1) % count) as u8)
    }

    /// Finish the current turn and hand the dice to the next player.
    pub fn advance_turn(&mut self) -> Colour {
        if let Some(player) = self.players.get_mut(self.current) {
            player.end_turn();
        }
        let next = self.next_colour();
        self.set_current(next);
        self.phase = Phase::PreRoll;
        next
    }

    // ==================== Dice and allocation ====================

    /// Roll two dice
    pub fn roll_dice(&mut self) -> (u8, u8) {
        (self.rng.roll_die(), self.rng.roll_die())
    }

    /// Pay out every hex showing `sum`.
    ///
    /// If the bank cannot cover every claim on a resource, a lone claimant
    /// takes what is left and several claimants receive none of it.
    pub fn allocate_resources(&mut self, sum: u8) -> Vec<ResourceGrant> {
        if sum == 7 {
            return Vec::new();
        }

        let mut claims: BTreeMap<Colour, ResourceHand> = BTreeMap::new();
        for hex in self.grid.hexes_with_chit(sum) {
            let Some(resource) = hex.yields(sum) else {
                continue;
            };
            for node in self.grid.nodes_of_hex(&hex.coord) {
                if let Some(building) = self.grid.building_at(&node) {
                    claims
                        .entry(building.owner())
                        .or_default()
                        .add(resource, building.yield_multiplier());
                }
            }
        }

        for resource in Resource::ALL {
            let wanted: u32 = claims.values().map(|h| h.get(resource)).sum();
            let stock = self.bank.resources().get(resource);
            if wanted <= stock {
                continue;
            }
            let claimants: Vec<Colour> = claims
                .iter()
                .filter(|(_, h)| h.get(resource) > 0)
                .map(|(c, _)| *c)
                .collect();
            let share = if claimants.len() == 1 { stock } else { 0 };
            for colour in claimants {
                if let Some(hand) = claims.get_mut(&colour) {
                    hand.set(resource, share);
                }
            }
        }

        let mut grants = Vec::new();
        for (colour, hand) in claims {
            if hand.is_empty() || self.bank.commit_spend(&hand).is_err() {
                continue;
            }
            if let Ok(player) = seat_mut(&mut self.players, colour) {
                player.grant_resources(&hand);
                grants.push(ResourceGrant {
                    colour,
                    resources: hand,
                });
            }
        }
        grants
    }

    /// Take cards from the bank for a player, all or nothing.
    pub fn grant_from_bank(&mut self, colour: Colour, hand: &ResourceHand) -> GameResult<()> {
        let player = seat_mut(&mut self.players, colour)?;
        self.bank.commit_spend(hand)?;
        player.grant_resources(hand);
        Ok(())
    }

    // ==================== Sevens ====================

    /// Players over the hand limit and how many cards each must give up.
    pub fn discard_requirements(&self) -> Vec<(Colour, u32)> {
        self.players
            .iter()
            .filter(|p| p.resources.total() > self.config.discard_threshold)
            .map(|p| (p.colour, p.resources.total() / 2))
            .collect()
    }

    /// Return exactly `required` cards to the bank
    pub fn discard(&mut self, colour: Colour, hand: &ResourceHand, required: u32) -> GameResult<()> {
        if hand.exceeds(self.config.bank_resource_count) || hand.total() != required {
            return Err(GameError::InvalidDiscard { required });
        }
        let player = seat_mut(&mut self.players, colour)?;
        player.spend_resources(hand)?;
        self.bank.commit_grant(hand);
        Ok(())
    }

    /// Move the robber to another tile
    pub fn move_robber(&mut self, to: HexCoord) -> GameResult<()> {
        self.grid.hex(&to)?;
        let from = self.grid.robber();
        if from == to {
            return Err(GameError::IllegalPlacement);
        }
        self.grid.swap_robber(from, to)
    }

    /// Opponents with a building on the robber's hex.
    pub fn robbable_victims(&self, thief: Colour) -> Vec<Colour> {
        self.grid
            .colours_around(&self.grid.robber())
            .into_iter()
            .filter(|c| *c != thief)
            .collect()
    }

    /// Take one card from `victim`. Returns `None` when the victim holds no
    /// cards at all.
    pub fn steal_from(
        &mut self,
        thief: Colour,
        victim: Colour,
        resource: Option<Resource>,
    ) -> GameResult<Option<Resource>> {
        if thief == victim || !self.robbable_victims(thief).contains(&victim) {
            return Err(GameError::CannotSteal);
        }
        let target = seat_mut(&mut self.players, victim)?;
        if target.resources.is_empty() {
            return Ok(None);
        }
        let taken = match resource {
            Some(r) if target.resources.get(r) == 0 => return Err(GameError::CannotSteal),
            Some(r) => {
                target.spend_resources(&ResourceHand::single(r, 1))?;
                Some(r)
            }
            None => target.resources.take_random(&mut self.rng),
        };
        if let Some(r) = taken {
            seat_mut(&mut self.players, thief)?
                .grant_resources(&ResourceHand::single(r, 1));
        }
        Ok(taken)
    }

    // ==================== Building ====================

    /// Initial settlement. The second one collects a card from each
    /// productive hex it touches, as far as the bank allows.
    pub fn place_setup_settlement(
        &mut self,
        colour: Colour,
        node: NodeCoord,
        collect: bool,
    ) -> GameResult<ResourceHand> {
        let player = seat_mut(&mut self.players, colour)?;
        player.build_settlement(&mut self.grid, &mut self.bank, node, BuildMode::Setup)?;
        self.break_roads_at(colour, node);

        let mut collected = ResourceHand::new();
        if collect {
            let site = self.grid.node(&node)?;
            for hex in &site.hexes {
                if let Some(resource) = self.grid.hex(hex)?.terrain.resource() {
                    collected.add(resource, 1);
                }
            }
            for (resource, amount) in collected.clone().iter() {
                if !self.bank.reserve(StockItem::Resource(resource), amount) {
                    collected.set(resource, 0);
                }
            }
            self.grant_from_bank(colour, &collected)?;
        }
        Ok(collected)
    }

    /// Initial road, which must touch the settlement just placed.
    pub fn place_setup_road(&mut self, colour: Colour, edge: EdgeCoord, anchor: NodeCoord) -> GameResult<()> {
        if !edge.has_endpoint(anchor) {
            return Err(GameError::CannotBuildRoad);
        }
        let player = seat_mut(&mut self.players, colour)?;
        player.build_road(&mut self.grid, &mut self.bank, edge, BuildMode::Setup)
    }

    /// Paid settlement, splitting any opposing road it lands on
    pub fn build_settlement(&mut self, colour: Colour, node: NodeCoord) -> GameResult<()> {
        let player = seat_mut(&mut self.players, colour)?;
        player.build_settlement(&mut self.grid, &mut self.bank, node, BuildMode::Paid)?;
        self.break_roads_at(colour, node);
        Ok(())
    }

    /// Build a road connected to the player's network
    pub fn build_road(&mut self, colour: Colour, edge: EdgeCoord, mode: BuildMode) -> GameResult<()> {
        let player = seat_mut(&mut self.players, colour)?;
        player.build_road(&mut self.grid, &mut self.bank, edge, mode)
    }

    /// Upgrade one of the player's settlements
    pub fn build_city(&mut self, colour: Colour, node: NodeCoord) -> GameResult<()> {
        let player = seat_mut(&mut self.players, colour)?;
        player.build_city(&mut self.grid, &mut self.bank, node)
    }

    /// Split opponents' chains that run through a freshly built settlement.
    fn break_roads_at(&mut self, builder: Colour, node: NodeCoord) {
        for player in self.players.iter_mut().filter(|p| p.colour != builder) {
            if player.road_chains.iter().any(|c| c.touches(node)) {
                player.split_chains_at(&self.grid, node);
            }
        }
    }

    // ==================== Development cards ====================

    /// Buy a card from the deck
    pub fn buy_development_card(&mut self, colour: Colour) -> GameResult<DevCardKind> {
        let player = seat_mut(&mut self.players, colour)?;
        player.buy_development_card(&mut self.bank, &mut self.rng)
    }

    pub fn play_development_card(&mut self, colour: Colour, kind: DevCardKind) -> GameResult<()> {
        seat_mut(&mut self.players, colour)?.play_development_card(kind)
    }

    /// Move every opponent's `resource` to `colour`. Returns the total moved.
    pub fn play_monopoly(&mut self, colour: Colour, resource: Resource) -> GameResult<u32> {
        let mut total = 0;
        for player in self.players.iter_mut().filter(|p| p.colour != colour) {
            let held = player.resources.get(resource);
            player.resources.set(resource, 0);
            total += held;
        }
        seat_mut(&mut self.players, colour)?.grant_resources(&ResourceHand::single(resource, total));
        Ok(total)
    }

    /// Take one of each named resource from the bank
    pub fn play_year_of_plenty(
        &mut self,
        colour: Colour,
        first: Resource,
        second: Resource,
    ) -> GameResult<()> {
        let mut hand = ResourceHand::single(first, 1);
        hand.add(second, 1);
        self.grant_from_bank(colour, &hand)
    }

    // ==================== Trading ====================

    /// Best rate `colour` gets when giving `give` to the bank.
    pub fn trade_rate(&self, colour: Colour, give: Resource) -> u32 {
        self.grid
            .ports_for(colour)
            .iter()
            .filter(|kind| match kind {
                PortKind::Generic => true,
                PortKind::Specific(r) => *r == give,
            })
            .map(PortKind::rate)
            .min()
            .unwrap_or(BANK_RATE)
    }

    /// Exchange with the bank. Returns what was given and received.
    pub fn process_bank_trade(
        &mut self,
        colour: Colour,
        give: Resource,
        receive: Resource,
        quantity: u32,
        port: Option<PortKind>,
    ) -> GameResult<(ResourceHand, ResourceHand)> {
        if give == receive || quantity == 0 || quantity > self.config.bank_resource_count {
            return Err(GameError::IllegalBankTrade);
        }
        let rate = match port {
            None => self.trade_rate(colour, give),
            Some(kind) => {
                let owned = self.grid.ports_for(colour).contains(&kind);
                let matches = match kind {
                    PortKind::Generic => true,
                    PortKind::Specific(r) => r == give,
                };
                if !owned || !matches {
                    return Err(GameError::IllegalPortTrade);
                }
                kind.rate()
            }
        };

        let given = rate
            .checked_mul(quantity)
            .ok_or(GameError::IllegalBankTrade)?;
        let gave = ResourceHand::single(give, given);
        let received = ResourceHand::single(receive, quantity);
        let player = seat_mut(&mut self.players, colour)?;
        if let Some((resource, required, held)) = player.resources.shortfall(&gave) {
            return Err(GameError::CannotAfford {
                resource,
                required,
                held,
            });
        }
        self.bank.commit_spend(&received)?;
        player.spend_resources(&gave)?;
        self.bank.commit_grant(&gave);
        player.grant_resources(&received);
        Ok((gave, received))
    }

    /// Checks a player trade proposal without touching any state.
    pub fn validate_player_trade(
        &self,
        from: Colour,
        to: Colour,
        offer: &ResourceHand,
        request: &ResourceHand,
    ) -> GameResult<()> {
        let overlapping = Resource::ALL
            .iter()
            .any(|r| offer.get(*r) > 0 && request.get(*r) > 0);
        let limit = self.config.bank_resource_count;
        if from == to
            || offer.is_empty()
            || request.is_empty()
            || overlapping
            || offer.exceeds(limit)
            || request.exceeds(limit)
        {
            return Err(GameError::IllegalTrade);
        }
        self.player(to).map_err(|_| GameError::IllegalTrade)?;
        let instigator = self.player(from)?;
        if let Some((resource, required, held)) = instigator.resources.shortfall(offer) {
            return Err(GameError::CannotAfford {
                resource,
                required,
                held,
            });
        }
        Ok(())
    }

    /// Swap `offer` from `from` for `request` from `to`. Both sides are
    /// checked before either hand changes.
    pub fn process_player_trade(
        &mut self,
        from: Colour,
        to: Colour,
        offer: &ResourceHand,
        request: &ResourceHand,
    ) -> GameResult<()> {
        self.validate_player_trade(from, to, offer, request)?;
        if let Some((resource, required, held)) = self.player(to)?.resources.shortfall(request) {
            return Err(GameError::CannotAfford {
                resource,
                required,
                held,
            });
        }
        let giver = seat_mut(&mut self.players, from)?;
        giver.spend_resources(offer)?;
        giver.grant_resources(request);
        let taker = seat_mut(&mut self.players, to)?;
        taker.spend_resources(request)?;
        taker.grant_resources(offer);
        Ok(())
    }

    // ==================== Bonuses and victory ====================

    /// Recompute Longest Road. Returns an event if the holder changed.
    pub fn check_longest_road(&mut self) -> Option<Event> {
        let scores: Vec<(Colour, u32)> = self
            .players
            .iter()
            .map(|p| (p.colour, p.road_length()))
            .collect();
        let holder = self.players.iter().find(|p| p.has_longest_road).map(|p| p.colour);
        let (current, length) = award(holder, &scores, MIN_LONGEST_ROAD);
        if current == holder {
            return None;
        }
        for player in &mut self.players {
            player.has_longest_road = Some(player.colour) == current;
        }
        Some(Event::LongestRoadChanged {
            previous: holder,
            current,
            length,
        })
    }

    /// Recompute Largest Army. Returns an event if the holder changed.
    pub fn check_largest_army(&mut self) -> Option<Event> {
        let scores: Vec<(Colour, u32)> = self
            .players
            .iter()
            .map(|p| (p.colour, p.knights_played))
            .collect();
        let holder = self.players.iter().find(|p| p.has_largest_army).map(|p| p.colour);
        let (current, knights) = award(holder, &scores, MIN_LARGEST_ARMY);
        if current == holder {
            return None;
        }
        for player in &mut self.players {
            player.has_largest_army = Some(player.colour) == current;
        }
        Some(Event::LargestArmyChanged {
            previous: holder,
            current,
            knights,
        })
    }

    /// Current victory points for a colour
    pub fn victory_points(&self, colour: Colour) -> u32 {
        self.player(colour).map(Player::victory_points).unwrap_or(0)
    }

    /// Latch a winner once someone reaches the target. The current player is
    /// preferred when several qualify at once.
    pub fn check_winner(&mut self) -> Option<Colour> {
        if self.winner.is_some() {
            return self.winner;
        }
        let target = self.config.victory_points_to_win;
        let current = self.current_colour();
        let winner = if self.victory_points(current) >= target {
            Some(current)
        } else {
            self.players
                .iter()
                .find(|p| p.victory_points() >= target)
                .map(|p| p.colour)
        };
        if winner.is_some() {
            self.winner = winner;
            self.phase = Phase::Finished;
        }
        winner
    }

    /// Check if the game is over
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<Colour> {
        self.winner
    }
}

fn seat_mut(players: &mut [Player], colour: Colour) -> GameResult<&mut Player> {
    players
        .get_mut(colour.seat() as usize)
        .ok_or(GameError::GameNotStarted)
}

/// Who holds a bonus after rescoring: the incumbent keeps it while tied for
/// the lead, otherwise a sole leader at or above `threshold` takes it.
fn award(holder: Option<Colour>, scores: &[(Colour, u32)], threshold: u32) -> (Option<Colour>, u32) {
    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best < threshold {
        return (None, best);
    }
    let leaders: Vec<Colour> = scores
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(c, _)| *c)
        .collect();
    match holder {
        Some(h) if leaders.contains(&h) => (Some(h), best),
        _ if leaders.len() == 1 => (Some(leaders[0]), best),
        _ => (None, best),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Building;
    use pretty_assertions::assert_eq;

    fn names() -> Vec<String> {
        ["alice", "bob", "carol", "dave"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn game() -> Game {
        Game::new(GameConfig::seeded(7), names())
    }

    /// A corner of the hex showing `chit` that touches no other hex with it.
    fn lone_corner(game: &Game, chit: u8) -> (HexCoord, NodeCoord) {
        for hex in game.grid().hexes_with_chit(chit) {
            for node in game.grid().nodes_of_hex(&hex.coord) {
                let shared = game
                    .grid()
                    .node(&node)
                    .unwrap()
                    .hexes
                    .iter()
                    .filter(|h| game.grid().hex(h).unwrap().chit == Some(chit))
                    .count();
                if shared == 1 {
                    return (hex.coord, node);
                }
            }
        }
        panic!("no corner for chit {chit}");
    }

    #[test]
    fn test_setup_order_is_a_snake() {
        let mut game = game();
        let first = game.choose_first_player();
        let order = game.setup_order();
        assert_eq!(order.len(), 8);
        assert_eq!(order[0], first);
        assert_eq!(order[7], first);
        assert_eq!(order[3], order[4]);
    }

    #[test]
    fn test_allocation_grants_only_adjacent_settlement() {
        let mut game = game();
        let (hex, node) = lone_corner(&game, 8);
        let resource = game.grid().hex(&hex).unwrap().terrain.resource().unwrap();
        game.place_setup_settlement(Colour::Red, node, false).unwrap();

        let grants = game.allocate_resources(8);
        assert_eq!(
            grants,
            vec![ResourceGrant {
                colour: Colour::Red,
                resources: ResourceHand::single(resource, 1),
            }]
        );
        assert_eq!(game.player(Colour::Red).unwrap().resources.get(resource), 1);
        assert_eq!(game.bank().resources().get(resource), 18);
    }

    #[test]
    fn test_city_doubles_and_robber_blocks() {
        let mut game = game();
        let (hex, node) = lone_corner(&game, 8);
        let resource = game.grid().hex(&hex).unwrap().terrain.resource().unwrap();
        game.place_setup_settlement(Colour::Red, node, false).unwrap();
        game.player_mut(Colour::Red).unwrap().resources = ResourceHand::with_amounts(0, 0, 3, 2, 0);
        game.bank.commit_spend(&ResourceHand::with_amounts(0, 0, 3, 2, 0)).unwrap();
        game.build_city(Colour::Red, node).unwrap();

        let grants = game.allocate_resources(8);
        assert_eq!(grants[0].resources, ResourceHand::single(resource, 2));

        game.move_robber(hex).unwrap();
        assert!(game.allocate_resources(8).is_empty());
        assert!(game.allocate_resources(7).is_empty());
    }

    #[test]
    fn test_bank_shortage_rules() {
        let mut game = game();
        let (hex, node) = lone_corner(&game, 8);
        let resource = game.grid().hex(&hex).unwrap().terrain.resource().unwrap();
        game.place_setup_settlement(Colour::Red, node, false).unwrap();
        let other = game
            .grid()
            .nodes_of_hex(&hex)
            .into_iter()
            .find(|n| {
                let eights = game
                    .grid()
                    .node(n)
                    .unwrap()
                    .hexes
                    .iter()
                    .filter(|h| game.grid().hex(h).unwrap().chit == Some(8))
                    .count();
                *n != node && eights == 1 && game.grid().satisfies_distance_rule(n)
            })
            .unwrap();
        game.place_setup_settlement(Colour::Blue, other, false).unwrap();

        // One card left, two claimants: nobody gets it.
        game.bank.commit_spend(&ResourceHand::single(resource, 18)).unwrap();
        assert!(game.allocate_resources(8).is_empty());
        assert_eq!(game.bank().resources().get(resource), 1);
    }

    #[test]
    fn test_discard_thresholds() {
        let mut game = game();
        game.grant_from_bank(Colour::Blue, &ResourceHand::with_amounts(0, 0, 1, 1, 1))
            .unwrap();
        game.grant_from_bank(Colour::Red, &ResourceHand::with_amounts(2, 2, 2, 2, 1))
            .unwrap();
        assert_eq!(game.discard_requirements(), vec![(Colour::Red, 4)]);

        assert_eq!(
            game.discard(Colour::Red, &ResourceHand::with_amounts(1, 1, 1, 0, 0), 4)
                .unwrap_err(),
            GameError::InvalidDiscard { required: 4 }
        );
        game.discard(Colour::Red, &ResourceHand::with_amounts(2, 2, 0, 0, 0), 4)
            .unwrap();
        assert_eq!(game.player(Colour::Red).unwrap().resources.total(), 5);
        assert_eq!(game.bank().resources().brick, 19);
    }

    #[test]
    fn test_steal_rules() {
        let mut game = game();
        let (hex, node) = lone_corner(&game, 8);
        game.place_setup_settlement(Colour::Blue, node, false).unwrap();
        game.move_robber(hex).unwrap();

        assert_eq!(
            game.steal_from(Colour::Red, Colour::Red, None).unwrap_err(),
            GameError::CannotSteal
        );
        assert_eq!(
            game.steal_from(Colour::Red, Colour::White, None).unwrap_err(),
            GameError::CannotSteal
        );
        // Empty-handed victim: nothing happens.
        assert_eq!(game.steal_from(Colour::Red, Colour::Blue, None).unwrap(), None);

        game.grant_from_bank(Colour::Blue, &ResourceHand::single(Resource::Wool, 1))
            .unwrap();
        assert_eq!(
            game.steal_from(Colour::Red, Colour::Blue, Some(Resource::Ore))
                .unwrap_err(),
            GameError::CannotSteal
        );
        assert_eq!(
            game.steal_from(Colour::Red, Colour::Blue, None).unwrap(),
            Some(Resource::Wool)
        );
        assert_eq!(game.player(Colour::Red).unwrap().resources.wool, 1);
        assert!(game.player(Colour::Blue).unwrap().resources.is_empty());
    }

    #[test]
    fn test_move_robber_must_change_hex() {
        let mut game = game();
        let here = game.grid().robber();
        assert_eq!(game.move_robber(here).unwrap_err(), GameError::IllegalPlacement);
        assert_eq!(
            game.move_robber(HexCoord::new(9, 9)).unwrap_err(),
            GameError::InvalidCoordinates
        );
    }

    #[test]
    fn test_largest_army_incumbent_keeps_ties() {
        let mut game = game();
        game.player_mut(Colour::Red).unwrap().knights_played = 3;
        assert!(matches!(
            game.check_largest_army(),
            Some(Event::LargestArmyChanged {
                current: Some(Colour::Red),
                ..
            })
        ));

        game.player_mut(Colour::Blue).unwrap().knights_played = 3;
        assert!(game.check_largest_army().is_none());
        assert!(game.player(Colour::Red).unwrap().has_largest_army);

        game.player_mut(Colour::Blue).unwrap().knights_played = 4;
        assert!(game.check_largest_army().is_some());
        assert!(game.player(Colour::Blue).unwrap().has_largest_army);
        assert!(!game.player(Colour::Red).unwrap().has_largest_army);
    }

    #[test]
    fn test_award_tie_without_incumbent_goes_to_nobody() {
        let scores = [(Colour::Red, 5), (Colour::Blue, 5)];
        assert_eq!(award(None, &scores, 5), (None, 5));
        assert_eq!(award(Some(Colour::Blue), &scores, 5), (Some(Colour::Blue), 5));
        assert_eq!(award(Some(Colour::Red), &[(Colour::Red, 4)], 5), (None, 4));
    }

    #[test]
    fn test_bank_trade_rates_and_errors() {
        let mut game = game();
        game.grant_from_bank(Colour::Red, &ResourceHand::single(Resource::Brick, 4))
            .unwrap();
        assert_eq!(
            game.process_bank_trade(Colour::Red, Resource::Brick, Resource::Brick, 1, None)
                .unwrap_err(),
            GameError::IllegalBankTrade
        );
        assert_eq!(
            game.process_bank_trade(
                Colour::Red,
                Resource::Brick,
                Resource::Ore,
                1,
                Some(PortKind::Generic)
            )
            .unwrap_err(),
            GameError::IllegalPortTrade
        );

        let (gave, received) = game
            .process_bank_trade(Colour::Red, Resource::Brick, Resource::Ore, 1, None)
            .unwrap();
        assert_eq!(gave, ResourceHand::single(Resource::Brick, 4));
        assert_eq!(received, ResourceHand::single(Resource::Ore, 1));
        assert_eq!(game.bank().resources().brick, 19);
        assert_eq!(game.bank().resources().ore, 18);
    }

    #[test]
    fn test_bank_trade_rejects_overflowing_quantity() {
        let config = GameConfig {
            bank_resource_count: u32::MAX,
            ..GameConfig::seeded(7)
        };
        let mut game = Game::new(config, names());
        for quantity in [1 << 31, u32::MAX] {
            assert_eq!(
                game.process_bank_trade(Colour::Red, Resource::Brick, Resource::Ore, quantity, None)
                    .unwrap_err(),
                GameError::IllegalBankTrade
            );
        }

        let mut game = self::game();
        assert_eq!(
            game.process_bank_trade(Colour::Red, Resource::Brick, Resource::Ore, 20, None)
                .unwrap_err(),
            GameError::IllegalBankTrade
        );
    }

    #[test]
    fn test_port_rate_applies_to_owner() {
        let mut game = game();
        let port = game.grid().ports()[0];
        let node = port.edge.endpoints()[0];
        game.place_setup_settlement(Colour::White, node, false).unwrap();
        let give = match port.kind {
            PortKind::Specific(r) => r,
            PortKind::Generic => Resource::Grain,
        };
        assert_eq!(game.trade_rate(Colour::White, give), port.kind.rate());
        assert_eq!(game.trade_rate(Colour::Red, give), 4);
    }

    #[test]
    fn test_player_trade_is_atomic() {
        let mut game = game();
        game.grant_from_bank(Colour::Red, &ResourceHand::single(Resource::Ore, 2))
            .unwrap();
        game.grant_from_bank(Colour::Blue, &ResourceHand::single(Resource::Wool, 1))
            .unwrap();
        let red_before = game.player(Colour::Red).unwrap().resources.clone();
        let blue_before = game.player(Colour::Blue).unwrap().resources.clone();

        let err = game
            .process_player_trade(
                Colour::Red,
                Colour::Blue,
                &ResourceHand::single(Resource::Ore, 2),
                &ResourceHand::with_amounts(0, 0, 0, 1, 1),
            )
            .unwrap_err();
        assert!(matches!(err, GameError::CannotAfford { .. }));
        assert_eq!(game.player(Colour::Red).unwrap().resources, red_before);
        assert_eq!(game.player(Colour::Blue).unwrap().resources, blue_before);

        game.process_player_trade(
            Colour::Red,
            Colour::Blue,
            &ResourceHand::single(Resource::Ore, 2),
            &ResourceHand::single(Resource::Wool, 1),
        )
        .unwrap();
        assert_eq!(
            game.player(Colour::Blue).unwrap().resources,
            ResourceHand::single(Resource::Ore, 2)
        );
    }

    #[test]
    fn test_player_trade_shape_rules() {
        let game = game();
        let ore = ResourceHand::single(Resource::Ore, 1);
        assert_eq!(
            game.validate_player_trade(Colour::Red, Colour::Red, &ore, &ore),
            Err(GameError::IllegalTrade)
        );
        assert_eq!(
            game.validate_player_trade(Colour::Red, Colour::Blue, &ore, &ore),
            Err(GameError::IllegalTrade)
        );
        assert_eq!(
            game.validate_player_trade(Colour::Red, Colour::Blue, &ResourceHand::new(), &ore),
            Err(GameError::IllegalTrade)
        );
    }

    #[test]
    fn test_monopoly_and_year_of_plenty() {
        let mut game = game();
        game.grant_from_bank(Colour::Blue, &ResourceHand::single(Resource::Grain, 2))
            .unwrap();
        game.grant_from_bank(Colour::White, &ResourceHand::single(Resource::Grain, 3))
            .unwrap();
        assert_eq!(game.play_monopoly(Colour::Red, Resource::Grain).unwrap(), 5);
        assert_eq!(game.player(Colour::Red).unwrap().resources.grain, 5);
        assert_eq!(game.player(Colour::White).unwrap().resources.grain, 0);

        game.bank.commit_spend(&ResourceHand::single(Resource::Ore, 19)).unwrap();
        assert_eq!(
            game.play_year_of_plenty(Colour::Red, Resource::Ore, Resource::Wool)
                .unwrap_err(),
            GameError::OutOfStock(StockItem::Resource(Resource::Ore))
        );
        game.play_year_of_plenty(Colour::Red, Resource::Wool, Resource::Wool)
            .unwrap();
        assert_eq!(game.player(Colour::Red).unwrap().resources.wool, 2);
    }

    #[test]
    fn test_second_setup_settlement_collects() {
        let mut game = game();
        let node = game
            .grid()
            .nodes()
            .find(|n| n.hexes.len() == 3)
            .map(|n| n.coord)
            .unwrap();
        let collected = game.place_setup_settlement(Colour::Orange, node, true).unwrap();
        let productive = game
            .grid()
            .node(&node)
            .unwrap()
            .hexes
            .iter()
            .filter(|h| game.grid().hex(h).unwrap().terrain.resource().is_some())
            .count() as u32;
        assert_eq!(collected.total(), productive);
        assert_eq!(game.player(Colour::Orange).unwrap().resources, collected);
    }

    #[test]
    fn test_settlement_breaks_opponent_road() {
        let mut game = game();
        let nodes = HexCoord::new(0, 0).nodes();
        let edges = HexCoord::new(0, 0).edges();
        game.place_setup_settlement(Colour::Red, nodes[0], false).unwrap();
        for edge in &edges[0..4] {
            game.build_road(Colour::Red, *edge, BuildMode::Free).unwrap();
        }
        game.place_setup_settlement(Colour::Blue, nodes[2], false).unwrap();
        assert_eq!(game.player(Colour::Red).unwrap().road_length(), 2);
        assert_eq!(
            game.grid().building_at(&nodes[2]),
            Some(Building::Settlement(Colour::Blue))
        );
    }

    /// A settlement on `hex`'s first corner and a road along each of its
    /// first `roads` sides.
    fn ring_roads(game: &mut Game, colour: Colour, hex: HexCoord, roads: usize) {
        game.place_setup_settlement(colour, hex.nodes()[0], false).unwrap();
        for edge in &hex.edges()[..roads] {
            game.build_road(colour, *edge, BuildMode::Free).unwrap();
        }
    }

    #[test]
    fn test_longest_road_needs_five_and_incumbent_keeps_ties() {
        let mut game = game();
        let centre = HexCoord::new(0, 0);
        ring_roads(&mut game, Colour::Red, centre, 4);
        assert!(game.check_longest_road().is_none());

        game.build_road(Colour::Red, centre.edges()[4], BuildMode::Free)
            .unwrap();
        assert!(matches!(
            game.check_longest_road(),
            Some(Event::LongestRoadChanged {
                previous: None,
                current: Some(Colour::Red),
                length: 5,
            })
        ));
        assert_eq!(game.victory_points(Colour::Red), 3);

        ring_roads(&mut game, Colour::Blue, HexCoord::new(2, -2), 5);
        assert_eq!(game.player(Colour::Blue).unwrap().road_length(), 5);
        assert!(game.check_longest_road().is_none());
        assert!(game.player(Colour::Red).unwrap().has_longest_road);
        assert!(!game.player(Colour::Blue).unwrap().has_longest_road);
    }

    #[test]
    fn test_longest_road_lost_when_chain_is_cut() {
        let mut game = game();
        let centre = HexCoord::new(0, 0);
        ring_roads(&mut game, Colour::Red, centre, 5);
        assert!(game.check_longest_road().is_some());

        game.place_setup_settlement(Colour::Blue, centre.nodes()[2], false)
            .unwrap();
        assert_eq!(game.player(Colour::Red).unwrap().road_length(), 3);
        assert!(matches!(
            game.check_longest_road(),
            Some(Event::LongestRoadChanged {
                previous: Some(Colour::Red),
                current: None,
                length: 3,
            })
        ));
        assert!(!game.player(Colour::Red).unwrap().has_longest_road);
        assert_eq!(game.victory_points(Colour::Red), 1);
    }

    #[test]
    fn test_longest_road_passes_to_unique_leader_after_cut() {
        let mut game = game();
        let centre = HexCoord::new(0, 0);
        ring_roads(&mut game, Colour::Red, centre, 5);
        game.check_longest_road();
        ring_roads(&mut game, Colour::Blue, HexCoord::new(2, -2), 5);
        assert!(game.check_longest_road().is_none());
        assert!(game.player(Colour::Red).unwrap().has_longest_road);

        game.place_setup_settlement(Colour::Blue, centre.nodes()[2], false)
            .unwrap();
        assert!(matches!(
            game.check_longest_road(),
            Some(Event::LongestRoadChanged {
                previous: Some(Colour::Red),
                current: Some(Colour::Blue),
                length: 5,
            })
        ));
    }

    #[test]
    fn test_winner_is_latched() {
        let mut game = game();
        assert_eq!(game.check_winner(), None);
        for _ in 0..10 {
            game.player_mut(Colour::Orange)
                .unwrap()
                .dev_cards
                .add_bought(DevCardKind::Library);
        }
        assert_eq!(game.check_winner(), Some(Colour::Orange));
        assert!(game.is_over());
        assert_eq!(game.phase(), Phase::Finished);

        game.player_mut(Colour::Orange).unwrap().dev_cards = Default::default();
        assert_eq!(game.check_winner(), Some(Colour::Orange));
        assert!(game.is_over());
    }
}

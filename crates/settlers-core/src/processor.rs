//! The protocol authority.
//!
//! `MessageProcessor` seats players, decides whether a request may be applied
//! right now, applies it against a checkpoint and turns the outcome into
//! routed events. Every request is handled to completion before the next one
//! starts, so nothing in here needs a lock.
//!
//! Gating works on per-colour queues of expected move kinds:
//! - a non-empty queue admits only the kinds it contains, whoever's turn it is
//! - an empty queue admits the current player's free moves in the main phase

use crate::bank::Piece;
use crate::board::Resource;
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::game::{Game, Phase};
use crate::hex::{EdgeCoord, HexCoord, NodeCoord};
use crate::messages::{
    DevCardPlay, Envelope, Event, LobbySeat, MoveKind, PlayerSettings, Request, TradeResponse,
    TradeSpec,
};
use crate::player::{BuildMode, Colour, ResourceHand};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Instant;
use tracing::{debug, info};

/// Seats in a game.
pub const MAX_PLAYERS: usize = 4;

/// An outstanding player-to-player offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTrade {
    pub from: Colour,
    pub to: Colour,
    pub offer: ResourceHand,
    pub request: ResourceHand,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
struct SetupState {
    order: Vec<Colour>,
    step: usize,
    last_settlement: Option<NodeCoord>,
}

/// Protocol state that lives beside the game and is checkpointed with it.
#[derive(Debug, Clone, Default)]
struct TurnState {
    expected: HashMap<Colour, VecDeque<MoveKind>>,
    pending_discards: BTreeMap<Colour, u32>,
    free_roads: u32,
    monopoly_pending: bool,
    trade: Option<CurrentTrade>,
    setup: Option<SetupState>,
}

impl TurnState {
    fn expect(&mut self, colour: Colour, kind: MoveKind) {
        self.expected.entry(colour).or_default().push_back(kind);
    }

    fn queue(&self, colour: Colour) -> Option<&VecDeque<MoveKind>> {
        self.expected.get(&colour).filter(|q| !q.is_empty())
    }

    /// Drop the first `kind` from a colour's queue.
    fn consume(&mut self, colour: Colour, kind: MoveKind) {
        if let Some(queue) = self.expected.get_mut(&colour) {
            if let Some(at) = queue.iter().position(|k| *k == kind) {
                queue.remove(at);
            }
        }
    }

    fn forget(&mut self, colour: Colour, kind: MoveKind) {
        if let Some(queue) = self.expected.get_mut(&colour) {
            queue.retain(|k| *k != kind);
        }
    }
}

/// A lobby seat and whether someone is currently attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub colour: Colour,
    pub username: String,
    pub connected: bool,
}

pub struct MessageProcessor {
    config: GameConfig,
    seats: Vec<Seat>,
    game: Option<Game>,
    turn: TurnState,
}

impl MessageProcessor {
    /// An empty lobby. The game starts when the last seat fills.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            seats: Vec::new(),
            game: None,
            turn: TurnState::default(),
        }
    }

    /// The running game, if it has started
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut Game> {
        self.game.as_mut()
    }

    /// Lobby seats in join order
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// The open player trade, if any
    pub fn current_trade(&self) -> Option<&CurrentTrade> {
        self.turn.trade.as_ref()
    }

    /// Cards `colour` still owes after a 7
    pub fn pending_discard(&self, colour: Colour) -> Option<u32> {
        self.turn.pending_discards.get(&colour).copied()
    }

    /// Whether anyone still owes cards from a 7.
    pub fn discards_pending(&self) -> bool {
        !self.turn.pending_discards.is_empty()
    }

    /// The expected-move queue for a colour, front first.
    pub fn expected(&self, colour: Colour) -> Vec<MoveKind> {
        self.turn
            .expected
            .get(&colour)
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Move kinds `colour` could submit right now without being gated out.
    pub fn allowed_moves(&self, colour: Colour) -> Vec<MoveKind> {
        if let Some(queue) = self.turn.queue(colour) {
            let mut kinds: Vec<MoveKind> = Vec::new();
            for kind in queue {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
            return kinds;
        }
        let Some(game) = &self.game else {
            return Vec::new();
        };
        if game.is_over()
            || game.current_colour() != colour
            || game.phase() != Phase::Main
            || self.turn.trade.is_some()
        {
            return Vec::new();
        }
        vec![
            MoveKind::BuildRoad,
            MoveKind::BuildSettlement,
            MoveKind::BuildCity,
            MoveKind::BuyDevCard,
            MoveKind::PlayDevCard,
            MoveKind::InitiateTrade,
            MoveKind::EndTurn,
        ]
    }

    // ==================== Lobby ====================

    /// Seat a player, or re-attach a returning one.
    pub fn join(&mut self, username: &str) -> GameResult<(Colour, Vec<Envelope>)> {
        if let Some(seat) = self.seats.iter_mut().find(|s| s.username == username) {
            seat.connected = true;
            let colour = seat.colour;
            info!(%colour, username, "player reattached");
            let mut out = vec![self.lobby_update()];
            out.extend(self.begin_game_for(colour));
            return Ok((colour, out));
        }
        if self.seats.len() >= MAX_PLAYERS {
            return Err(GameError::GameFull);
        }

        let colour = Colour::for_seat(self.seats.len() as u8);
        self.seats.push(Seat {
            colour,
            username: username.to_string(),
            connected: true,
        });
        info!(%colour, username, seats = self.seats.len(), "player joined");

        let mut out = vec![self.lobby_update()];
        if self.seats.len() == MAX_PLAYERS {
            out.extend(self.start_game());
        }
        Ok((colour, out))
    }

    /// Mark a seat as detached. The seat stays reserved for a rejoin.
    pub fn disconnect(&mut self, colour: Colour) -> Vec<Envelope> {
        if let Some(seat) = self.seats.iter_mut().find(|s| s.colour == colour) {
            seat.connected = false;
            info!(%colour, "player detached");
        }
        vec![self.lobby_update()]
    }

    fn lobby_update(&self) -> Envelope {
        Envelope::all(Event::LobbyUpdate {
            seats: self
                .seats
                .iter()
                .map(|s| LobbySeat {
                    colour: s.colour,
                    username: s.username.clone(),
                    connected: s.connected,
                })
                .collect(),
        })
    }

    fn start_game(&mut self) -> Vec<Envelope> {
        let usernames = self.seats.iter().map(|s| s.username.clone()).collect();
        let mut game = Game::new(self.config.clone(), usernames);
        let first = game.choose_first_player();
        let order = game.setup_order();

        self.turn = TurnState::default();
        self.turn.expect(first, MoveKind::BuildSettlement);
        self.turn.setup = Some(SetupState {
            order,
            step: 0,
            last_settlement: None,
        });
        self.game = Some(game);
        info!(%first, "game started");

        self.seats
            .iter()
            .filter_map(|s| self.begin_game_for(s.colour))
            .collect()
    }

    fn begin_game_for(&self, colour: Colour) -> Option<Envelope> {
        let game = self.game.as_ref()?;
        let players = game
            .players()
            .iter()
            .map(|p| PlayerSettings {
                id: p.id,
                colour: p.colour,
                username: p.username.clone(),
                hex_code: p.colour.hex_code(),
            })
            .collect();
        Some(Envelope::only(
            colour,
            Event::BeginGame {
                board: game.grid().snapshot(),
                you: colour,
                players,
                first_player: game.first_colour(),
            },
        ))
    }

    // ==================== Moves ====================

    /// Expire the current trade if its window has passed.
    pub fn tick(&mut self, now: Instant) -> Vec<Envelope> {
        let Some(trade) = &self.turn.trade else {
            return Vec::new();
        };
        if now < trade.expires_at {
            return Vec::new();
        }
        let (from, to) = (trade.from, trade.to);
        self.turn.trade = None;
        self.turn.forget(to, MoveKind::SubmitTradeResponse);
        debug!(%from, %to, "trade offer expired");
        vec![Envelope::all(Event::TradeExpired { from, to })]
    }

    /// Validate and apply one request from `colour`.
    pub fn process_move(&mut self, colour: Colour, request: Request, now: Instant) -> Vec<Envelope> {
        let mut out = self.tick(now);

        let kind = request.kind();
        if kind.bypasses_gating() {
            match request {
                Request::ChatMessage { text } => {
                    out.push(Envelope::all(Event::ChatMessage { colour, text }));
                }
                _ => {
                    out.push(self.lobby_update());
                    out.extend(self.begin_game_for(colour));
                }
            }
            return out;
        }

        if let Err(error) = self.check_expected(colour, kind) {
            debug!(%colour, ?kind, %error, "move gated out");
            out.push(Self::error_for(colour, &error));
            return out;
        }

        let (Some(game), turn) = (self.game.clone(), self.turn.clone()) else {
            out.push(Self::error_for(colour, &GameError::GameNotStarted));
            return out;
        };

        self.turn.consume(colour, kind);
        match self.dispatch(colour, request, now) {
            Ok(events) => {
                out.extend(events);
                out.extend(self.after_success());
            }
            Err(error) => {
                debug!(%colour, ?kind, %error, "move rejected");
                self.game = Some(game);
                self.turn = turn;
                out.push(Self::error_for(colour, &error));
            }
        }
        out
    }

    fn error_for(colour: Colour, error: &GameError) -> Envelope {
        Envelope::only(
            colour,
            Event::Error {
                message: error.to_string(),
            },
        )
    }

    fn check_expected(&self, colour: Colour, kind: MoveKind) -> GameResult<()> {
        let game = self.game.as_ref().ok_or(GameError::GameNotStarted)?;
        if game.is_over() {
            return Err(GameError::GameOver);
        }

        if let Some(queue) = self.turn.queue(colour) {
            if queue.contains(&kind) {
                return Ok(());
            }
            // Roads from a Road Building card may be abandoned by ending the turn.
            let only_free_roads = self.turn.free_roads > 0
                && queue.iter().all(|k| *k == MoveKind::BuildRoad);
            if kind == MoveKind::EndTurn && only_free_roads && game.current_colour() == colour {
                return Ok(());
            }
            return Err(GameError::UnexpectedMove(kind));
        }

        let free_move = game.current_colour() == colour
            && game.phase() == Phase::Main
            && kind.is_free_move()
            && self.turn.trade.is_none();
        if free_move {
            Ok(())
        } else {
            Err(GameError::UnexpectedMove(kind))
        }
    }

    fn dispatch(&mut self, colour: Colour, request: Request, now: Instant) -> GameResult<Vec<Envelope>> {
        match request {
            // ==================== Building ====================
            Request::BuildSettlement { node } => self.build_settlement(colour, node),
            Request::BuildRoad { edge } => self.build_road(colour, edge),
            Request::BuildCity { node } => {
                active(&mut self.game)?.build_city(colour, node)?;
                Ok(vec![Envelope::all(Event::CityBuilt { colour, node })])
            }

            // ==================== Dice and robber ====================
            Request::RollDice => self.roll_dice(colour),
            Request::DiscardResources { hand } => {
                let required = self
                    .turn
                    .pending_discards
                    .get(&colour)
                    .copied()
                    .ok_or(GameError::UnexpectedMove(MoveKind::DiscardResources))?;
                active(&mut self.game)?.discard(colour, &hand, required)?;
                self.turn.pending_discards.remove(&colour);
                Ok(vec![Envelope::all(Event::CardsDiscarded { colour, hand })])
            }
            Request::MoveRobber { hex } => self.move_robber(colour, hex),
            Request::SubmitTargetPlayer { target, resource } => {
                self.steal(colour, target, resource)
            }

            // ==================== Development cards ====================
            Request::BuyDevCard => {
                let kind = active(&mut self.game)?.buy_development_card(colour)?;
                Ok(vec![
                    Envelope::all(Event::DevCardBought { colour }),
                    Envelope::only(colour, Event::DevCardDrawn { kind }),
                ])
            }
            Request::PlayDevCard(card) => self.play_card(colour, card),
            Request::ChooseResource { resource } => {
                if !self.turn.monopoly_pending {
                    return Err(GameError::UnexpectedMove(MoveKind::ChooseResource));
                }
                let total = active(&mut self.game)?.play_monopoly(colour, resource)?;
                self.turn.monopoly_pending = false;
                Ok(vec![Envelope::all(Event::MonopolyResolution {
                    colour,
                    resource,
                    total,
                })])
            }

            // ==================== Trading ====================
            Request::InitiateTrade(proposal) => self.initiate_trade(colour, proposal, now),
            Request::SubmitTradeResponse(response) => self.respond_to_trade(colour, response),

            // ==================== Turn management ====================
            Request::EndTurn => {
                self.turn.trade = None;
                self.turn.free_roads = 0;
                self.turn.forget(colour, MoveKind::BuildRoad);
                let next = active(&mut self.game)?.advance_turn();
                self.turn.expect(next, MoveKind::RollDice);
                Ok(vec![Envelope::all(Event::TurnEnded { colour, next })])
            }

            other => Err(GameError::UnexpectedMove(other.kind())),
        }
    }

    fn build_settlement(&mut self, colour: Colour, node: NodeCoord) -> GameResult<Vec<Envelope>> {
        let players = self.seats.len();
        let mut out = vec![Envelope::all(Event::SettlementBuilt { colour, node })];

        if let Some(setup) = self.turn.setup.as_mut() {
            let collect = setup.step >= players;
            setup.last_settlement = Some(node);
            let game = active(&mut self.game)?;
            let collected = game.place_setup_settlement(colour, node, collect)?;
            if !collected.is_empty() {
                out.push(Envelope::all(Event::StartingResources {
                    colour,
                    resources: collected,
                }));
            }
            self.turn.expect(colour, MoveKind::BuildRoad);
        } else {
            active(&mut self.game)?.build_settlement(colour, node)?;
        }
        Ok(out)
    }

    fn build_road(&mut self, colour: Colour, edge: EdgeCoord) -> GameResult<Vec<Envelope>> {
        let out = vec![Envelope::all(Event::RoadBuilt { colour, edge })];

        if self.turn.setup.is_none() {
            let mode = if self.turn.free_roads > 0 {
                self.turn.free_roads -= 1;
                BuildMode::Free
            } else {
                BuildMode::Paid
            };
            active(&mut self.game)?.build_road(colour, edge, mode)?;
            return Ok(out);
        }
        let Some(setup) = self.turn.setup.as_mut() else {
            return Err(GameError::GameNotStarted);
        };

        let anchor = setup.last_settlement.ok_or(GameError::CannotBuildRoad)?;
        setup.step += 1;
        let next = setup.order.get(setup.step).copied();
        let game = active(&mut self.game)?;
        game.place_setup_road(colour, edge, anchor)?;

        match next {
            Some(next) => {
                game.set_current(next);
                self.turn.expect(next, MoveKind::BuildSettlement);
            }
            None => {
                let first = game.first_colour();
                game.set_current(first);
                game.set_phase(Phase::PreRoll);
                self.turn.setup = None;
                self.turn.expect(first, MoveKind::RollDice);
                info!(%first, "setup complete");
            }
        }
        Ok(out)
    }

    fn roll_dice(&mut self, colour: Colour) -> GameResult<Vec<Envelope>> {
        let game = active(&mut self.game)?;
        let dice = game.roll_dice();
        let sum = dice.0 + dice.1;
        game.set_phase(Phase::Main);

        let (grants, discards) = if sum == 7 {
            let discards = game.discard_requirements();
            for (victim, count) in &discards {
                self.turn.pending_discards.insert(*victim, *count);
                self.turn.expect(*victim, MoveKind::DiscardResources);
            }
            self.turn.expect(colour, MoveKind::MoveRobber);
            (Vec::new(), discards)
        } else {
            (game.allocate_resources(sum), Vec::new())
        };

        Ok(vec![Envelope::all(Event::Rolled {
            colour,
            dice,
            grants,
            discards,
        })])
    }

    fn move_robber(&mut self, colour: Colour, hex: HexCoord) -> GameResult<Vec<Envelope>> {
        if !self.turn.pending_discards.is_empty() {
            return Err(GameError::DiscardsPending);
        }
        let game = active(&mut self.game)?;
        game.move_robber(hex)?;
        if !game.robbable_victims(colour).is_empty() {
            self.turn.expect(colour, MoveKind::SubmitTargetPlayer);
        }
        Ok(vec![Envelope::all(Event::RobberMoved { colour, hex })])
    }

    /// The thief and victim learn what was taken; everyone else only that a
    /// card changed hands.
    fn steal(
        &mut self,
        thief: Colour,
        victim: Colour,
        resource: Option<Resource>,
    ) -> GameResult<Vec<Envelope>> {
        let game = active(&mut self.game)?;
        let taken = game.steal_from(thief, victim, resource)?;
        Ok(game
            .colours()
            .into_iter()
            .map(|c| {
                let visible = c == thief || c == victim;
                Envelope::only(
                    c,
                    Event::ResourceStolen {
                        thief,
                        victim,
                        resource: if visible { taken } else { None },
                    },
                )
            })
            .collect())
    }

    fn play_card(&mut self, colour: Colour, card: DevCardPlay) -> GameResult<Vec<Envelope>> {
        let game = active(&mut self.game)?;
        game.play_development_card(colour, card.kind())?;
        let mut out = vec![Envelope::all(Event::DevCardPlayed { colour, card })];

        match card {
            DevCardPlay::Knight => self.turn.expect(colour, MoveKind::MoveRobber),
            DevCardPlay::RoadBuilding => {
                let roads = game.bank().pieces(colour).get(Piece::Road).min(2);
                self.turn.free_roads = roads;
                for _ in 0..roads {
                    self.turn.expect(colour, MoveKind::BuildRoad);
                }
            }
            DevCardPlay::Monopoly => {
                self.turn.monopoly_pending = true;
                self.turn.expect(colour, MoveKind::ChooseResource);
            }
            DevCardPlay::YearOfPlenty { first, second } => {
                game.play_year_of_plenty(colour, first, second)?;
                out.push(Envelope::all(Event::ResourceChosen {
                    colour,
                    resources: vec![first, second],
                }));
            }
        }
        Ok(out)
    }

    fn initiate_trade(&mut self, colour: Colour, proposal: TradeSpec, now: Instant) -> GameResult<Vec<Envelope>> {
        let timeout = self.config.trade_timeout();
        let game = active(&mut self.game)?;
        match proposal {
            TradeSpec::Bank {
                give,
                receive,
                quantity,
                port,
            } => {
                let (gave, received) = game.process_bank_trade(colour, give, receive, quantity, port)?;
                Ok(vec![Envelope::all(Event::BankTrade {
                    colour,
                    gave,
                    received,
                })])
            }
            TradeSpec::Player { to, offer, request } => {
                game.validate_player_trade(colour, to, &offer, &request)?;
                self.turn.trade = Some(CurrentTrade {
                    from: colour,
                    to,
                    offer: offer.clone(),
                    request: request.clone(),
                    expires_at: now + timeout,
                });
                self.turn.expect(to, MoveKind::SubmitTradeResponse);
                Ok(vec![Envelope::all(Event::TradeOffered {
                    from: colour,
                    to,
                    offer,
                    request,
                    expires_in_secs: timeout.as_secs(),
                })])
            }
        }
    }

    fn respond_to_trade(&mut self, colour: Colour, response: TradeResponse) -> GameResult<Vec<Envelope>> {
        let trade = match self.turn.trade.take() {
            Some(trade) if trade.to == colour => trade,
            _ => return Err(GameError::NoActiveTrade),
        };
        match response {
            TradeResponse::Accept => {
                active(&mut self.game)?.process_player_trade(
                    trade.from,
                    trade.to,
                    &trade.offer,
                    &trade.request,
                )?;
                Ok(vec![Envelope::all(Event::PlayerTrade {
                    from: trade.from,
                    to: trade.to,
                    offer: trade.offer,
                    request: trade.request,
                })])
            }
            TradeResponse::Reject => Ok(vec![Envelope::all(Event::TradeRejected {
                from: trade.from,
                to: trade.to,
            })]),
        }
    }

    /// Bonus recalculation and the win check after any applied move.
    fn after_success(&mut self) -> Vec<Envelope> {
        let Some(game) = self.game.as_mut() else {
            return Vec::new();
        };
        let mut out: Vec<Envelope> = [game.check_longest_road(), game.check_largest_army()]
            .into_iter()
            .flatten()
            .map(Envelope::all)
            .collect();

        if let Some(colour) = game.check_winner() {
            let victory_points = game.victory_points(colour);
            info!(%colour, victory_points, "game won");
            self.turn.expected.clear();
            self.turn.trade = None;
            out.push(Envelope::all(Event::GameWon {
                colour,
                victory_points,
            }));
        }
        out
    }
}

fn active(game: &mut Option<Game>) -> GameResult<&mut Game> {
    game.as_mut().ok_or(GameError::GameNotStarted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn started(seed: u64) -> MessageProcessor {
        let mut processor = MessageProcessor::new(GameConfig::seeded(seed));
        for name in ["alice", "bob", "carol", "dave"] {
            processor.join(name).unwrap();
        }
        processor
    }

    fn current(processor: &MessageProcessor) -> Colour {
        processor.game().unwrap().current_colour()
    }

    fn errors_for(out: &[Envelope], colour: Colour) -> usize {
        out.iter()
            .filter(|e| e.is_for(colour) && matches!(e.event, Event::Error { .. }))
            .count()
    }

    #[test]
    fn test_fifth_join_is_refused() {
        let mut processor = started(1);
        assert_eq!(processor.join("eve").unwrap_err(), GameError::GameFull);
    }

    #[test]
    fn test_game_starts_with_begin_game_per_seat() {
        let mut processor = MessageProcessor::new(GameConfig::seeded(1));
        let mut last = Vec::new();
        for name in ["alice", "bob", "carol", "dave"] {
            last = processor.join(name).unwrap().1;
        }
        let begins: Vec<_> = last
            .iter()
            .filter(|e| matches!(e.event, Event::BeginGame { .. }))
            .collect();
        assert_eq!(begins.len(), 4);
        assert!(begins.iter().all(|e| e.recipients != crate::messages::Recipients::All));

        let first = current(&processor);
        assert_eq!(processor.expected(first), vec![MoveKind::BuildSettlement]);
    }

    #[test]
    fn test_rejoin_reattaches_seat() {
        let mut processor = started(1);
        processor.disconnect(Colour::Orange);
        assert!(!processor.seats()[2].connected);

        let (colour, out) = processor.join("carol").unwrap();
        assert_eq!(colour, Colour::Orange);
        assert!(processor.seats()[2].connected);
        assert!(out.iter().any(|e| e.is_for(Colour::Orange)
            && matches!(e.event, Event::BeginGame { you: Colour::Orange, .. })));
    }

    #[test]
    fn test_out_of_turn_move_is_rejected_privately() {
        let mut processor = started(2);
        let first = current(&processor);
        let other = Colour::ALL.into_iter().find(|c| *c != first).unwrap();

        let out = processor.process_move(other, Request::RollDice, Instant::now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, crate::messages::Recipients::Only(other));
        assert_eq!(errors_for(&out, other), 1);
        assert_eq!(processor.expected(first), vec![MoveKind::BuildSettlement]);
    }

    #[test]
    fn test_failed_move_leaves_queue_untouched() {
        let mut processor = started(2);
        let first = current(&processor);
        let off_board = NodeCoord::new(HexCoord::new(8, 8), crate::hex::NodeDirection::North);

        let out = processor.process_move(
            first,
            Request::BuildSettlement { node: off_board },
            Instant::now(),
        );
        assert_eq!(errors_for(&out, first), 1);
        assert_eq!(processor.expected(first), vec![MoveKind::BuildSettlement]);
    }

    #[test]
    fn test_chat_bypasses_gating() {
        let mut processor = started(3);
        let out = processor.process_move(
            Colour::White,
            Request::ChatMessage {
                text: "hello".into(),
            },
            Instant::now(),
        );
        assert!(matches!(
            &out[0].event,
            Event::ChatMessage { colour: Colour::White, text } if text == "hello"
        ));
    }

    #[test]
    fn test_moves_before_game_start_are_refused() {
        let mut processor = MessageProcessor::new(GameConfig::seeded(3));
        processor.join("alice").unwrap();
        let out = processor.process_move(Colour::Red, Request::RollDice, Instant::now());
        assert_eq!(errors_for(&out, Colour::Red), 1);
    }

    #[test]
    fn test_trade_expires_on_tick() {
        let mut processor = started(4);
        let now = Instant::now();
        processor.turn.trade = Some(CurrentTrade {
            from: Colour::Red,
            to: Colour::Blue,
            offer: ResourceHand::single(Resource::Ore, 1),
            request: ResourceHand::single(Resource::Wool, 1),
            expires_at: now + Duration::from_secs(30),
        });
        processor.turn.expect(Colour::Blue, MoveKind::SubmitTradeResponse);

        assert!(processor.tick(now + Duration::from_secs(29)).is_empty());
        let out = processor.tick(now + Duration::from_secs(30));
        assert!(matches!(
            out[0].event,
            Event::TradeExpired {
                from: Colour::Red,
                to: Colour::Blue
            }
        ));
        assert!(processor.current_trade().is_none());
        assert!(processor.expected(Colour::Blue).is_empty());
    }
}

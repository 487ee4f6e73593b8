//! The single consumer of client traffic.
//!
//! Reader tasks push `Inbound` items onto one queue; the game loop pops them
//! in order, feeds them to the `MessageProcessor` and returns the frames to
//! deliver. Bot seats are driven from here after every item and on each
//! tick, through the same request path remote players use.

use crate::lobby::{Lobby, LobbyError};
use crate::protocol::{ClientMessage, ServerMessage};
use settlers_core::{
    Bot, Envelope, Event, GameConfig, GameError, MessageProcessor, MoveKind, Recipients, Request,
};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upper bound on bot moves in one drain, so an all-bot table yields.
const MAX_BOT_MOVES: usize = 1000;

/// Work for the game loop.
#[derive(Debug)]
pub enum Inbound {
    Message {
        connection: Uuid,
        message: ClientMessage,
    },
    Disconnected {
        connection: Uuid,
    },
}

/// A frame addressed to one connection.
pub type Outbound = (Uuid, ServerMessage);

pub struct GameLoop {
    processor: MessageProcessor,
    lobby: Lobby,
}

impl GameLoop {
    /// A table with `bots` seats already taken by computer players.
    pub fn new(config: GameConfig, bots: usize) -> Self {
        let seed = config.seed;
        let mut processor = MessageProcessor::new(config);
        let mut lobby = Lobby::new();

        for n in 0..bots {
            let Ok((colour, _)) = processor.join(&format!("bot-{}", n + 1)) else {
                break;
            };
            let bot = match seed {
                Some(seed) => Bot::with_seed(colour, seed.wrapping_add(n as u64 + 1)),
                None => Bot::new(colour),
            };
            if lobby.add_bot(bot).is_ok() {
                info!(%colour, "bot seated");
            }
        }

        Self { processor, lobby }
    }

    pub fn processor(&self) -> &MessageProcessor {
        &self.processor
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    /// Apply one queued item and let bots respond
    pub fn handle(&mut self, inbound: Inbound, now: Instant) -> Vec<Outbound> {
        let mut out = match inbound {
            Inbound::Message {
                connection,
                message: ClientMessage::Ping,
            } => return vec![(connection, ServerMessage::Pong)],
            Inbound::Message {
                connection,
                message: ClientMessage::Request(Request::JoinLobby { username }),
            } if !self.lobby.is_seated(connection) => self.join(connection, &username),
            Inbound::Message {
                connection,
                message: ClientMessage::Request(request),
            } => self.request(connection, request, now),
            Inbound::Disconnected { connection } => self.disconnect(connection),
        };
        out.extend(self.run_bots(now));
        out
    }

    /// Periodic work: trade expiry and idle bots.
    pub fn tick(&mut self, now: Instant) -> Vec<Outbound> {
        let envelopes = self.processor.tick(now);
        let mut out = self.route(&envelopes);
        out.extend(self.run_bots(now));
        out
    }

    fn join(&mut self, connection: Uuid, username: &str) -> Vec<Outbound> {
        let (colour, envelopes) = match self.processor.join(username) {
            Ok(joined) => joined,
            Err(GameError::GameFull) => {
                return vec![(connection, ServerMessage::Event(Event::GameFull))];
            }
            Err(error) => return vec![error_frame(connection, &error)],
        };
        if let Err(error) = self.lobby.attach(connection, colour) {
            warn!(%connection, %colour, %error, "seat already attached");
            return vec![error_frame(connection, &error)];
        }
        info!(%connection, %colour, username, "connection seated");
        self.route(&envelopes)
    }

    fn request(&mut self, connection: Uuid, request: Request, now: Instant) -> Vec<Outbound> {
        let colour = match self.lobby.seat_of(connection) {
            Ok(colour) => colour,
            Err(error @ LobbyError::NotSeated) => {
                debug!(%connection, "request before joining");
                return vec![error_frame(connection, &error)];
            }
            Err(error) => return vec![error_frame(connection, &error)],
        };
        let envelopes = self.processor.process_move(colour, request, now);
        self.route(&envelopes)
    }

    fn disconnect(&mut self, connection: Uuid) -> Vec<Outbound> {
        let Some(colour) = self.lobby.detach(connection) else {
            return Vec::new();
        };
        let envelopes = self.processor.disconnect(colour);
        self.route(&envelopes)
    }

    /// Let bots move until none of them can.
    fn run_bots(&mut self, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();
        for _ in 0..MAX_BOT_MOVES {
            let processor = &self.processor;
            let decision = self
                .lobby
                .bots_mut()
                .find_map(|bot| bot.decide(processor).map(|r| (bot.colour, r)));
            let Some((colour, request)) = decision else {
                break;
            };

            let envelopes = self.processor.process_move(colour, request, now);
            let rejected = envelopes.iter().any(|e| {
                e.recipients == Recipients::Only(colour) && matches!(e.event, Event::Error { .. })
            });
            out.extend(self.route(&envelopes));
            if !rejected {
                continue;
            }

            warn!(%colour, "bot move rejected");
            if !self.processor.allowed_moves(colour).contains(&MoveKind::EndTurn) {
                break;
            }
            let envelopes = self.processor.process_move(colour, Request::EndTurn, now);
            out.extend(self.route(&envelopes));
        }
        out
    }

    fn route(&self, envelopes: &[Envelope]) -> Vec<Outbound> {
        envelopes
            .iter()
            .flat_map(|envelope| {
                self.lobby
                    .recipients(envelope)
                    .into_iter()
                    .map(|connection| (connection, ServerMessage::Event(envelope.event.clone())))
            })
            .collect()
    }
}

fn error_frame(connection: Uuid, error: &impl std::fmt::Display) -> Outbound {
    (
        connection,
        ServerMessage::Error {
            message: error.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use settlers_core::{Colour, Phase};

    fn join(game: &mut GameLoop, connection: Uuid, name: &str) -> Vec<Outbound> {
        game.handle(
            Inbound::Message {
                connection,
                message: ClientMessage::Request(Request::JoinLobby {
                    username: name.to_string(),
                }),
            },
            Instant::now(),
        )
    }

    fn events_for(out: &[Outbound], connection: Uuid) -> Vec<&Event> {
        out.iter()
            .filter(|(c, _)| *c == connection)
            .filter_map(|(_, m)| match m {
                ServerMessage::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_four_joins_start_the_game() {
        let mut game = GameLoop::new(GameConfig::seeded(3), 0);
        let connections: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut last = Vec::new();
        for (n, connection) in connections.iter().enumerate() {
            last = join(&mut game, *connection, &format!("player-{n}"));
        }

        for (seat, connection) in connections.iter().enumerate() {
            let begins: Vec<_> = events_for(&last, *connection)
                .into_iter()
                .filter_map(|e| match e {
                    Event::BeginGame { you, .. } => Some(*you),
                    _ => None,
                })
                .collect();
            assert_eq!(begins, vec![Colour::for_seat(seat as u8)]);
        }

        let late = Uuid::new_v4();
        let out = join(&mut game, late, "late");
        assert!(matches!(
            out.as_slice(),
            [(c, ServerMessage::Event(Event::GameFull))] if *c == late
        ));
    }

    #[test]
    fn test_requests_need_a_seat() {
        let mut game = GameLoop::new(GameConfig::seeded(3), 0);
        let stranger = Uuid::new_v4();
        let out = game.handle(
            Inbound::Message {
                connection: stranger,
                message: ClientMessage::Request(Request::RollDice),
            },
            Instant::now(),
        );
        assert!(matches!(
            out.as_slice(),
            [(c, ServerMessage::Error { .. })] if *c == stranger
        ));
    }

    #[test]
    fn test_ping_gets_pong() {
        let mut game = GameLoop::new(GameConfig::seeded(3), 0);
        let connection = Uuid::new_v4();
        let out = game.handle(
            Inbound::Message {
                connection,
                message: ClientMessage::Ping,
            },
            Instant::now(),
        );
        assert!(matches!(out.as_slice(), [(_, ServerMessage::Pong)]));
    }

    #[test]
    fn test_bots_play_up_to_the_human_turn() {
        let mut game = GameLoop::new(GameConfig::seeded(5), 3);
        assert_eq!(game.lobby().bot_count(), 3);

        let human = Uuid::new_v4();
        join(&mut game, human, "human");
        let colour = game.lobby().seat_of(human).unwrap();
        assert_eq!(colour, Colour::White);

        let processor = game.processor();
        assert_eq!(processor.game().unwrap().phase(), Phase::Setup);
        assert_eq!(processor.game().unwrap().current_colour(), colour);
        assert_eq!(processor.expected(colour), vec![MoveKind::BuildSettlement]);
    }

    #[test]
    fn test_all_bot_table_advances_on_tick() {
        let mut game = GameLoop::new(GameConfig::seeded(6), 4);
        assert_eq!(game.processor().game().unwrap().phase(), Phase::Setup);

        let out = game.tick(Instant::now());
        assert!(out.is_empty());
        assert_ne!(game.processor().game().unwrap().phase(), Phase::Setup);
    }

    #[test]
    fn test_disconnect_frees_seat_for_rejoin() {
        let mut game = GameLoop::new(GameConfig::seeded(7), 0);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        join(&mut game, first, "ana");
        join(&mut game, second, "ben");

        let out = game.handle(Inbound::Disconnected { connection: first }, Instant::now());
        let update = events_for(&out, second);
        assert!(matches!(
            update.as_slice(),
            [Event::LobbyUpdate { seats }] if !seats[0].connected && seats[1].connected
        ));

        let returning = Uuid::new_v4();
        join(&mut game, returning, "ana");
        assert_eq!(game.lobby().seat_of(returning), Ok(Colour::Red));
    }
}

//! Seat bookkeeping: which connection or bot plays each colour.

use settlers_core::{Bot, Colour, Envelope};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("join the lobby first")]
    NotSeated,

    #[error("this connection already holds a seat")]
    AlreadySeated,

    #[error("that seat is taken")]
    SeatTaken,
}

/// Who makes the moves for a seat.
pub enum Controller {
    Remote(Uuid),
    Bot(Bot),
}

#[derive(Default)]
pub struct Lobby {
    seats: BTreeMap<Colour, Controller>,
    connections: HashMap<Uuid, Colour>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// The colour a connection plays.
    pub fn seat_of(&self, connection: Uuid) -> Result<Colour, LobbyError> {
        self.connections
            .get(&connection)
            .copied()
            .ok_or(LobbyError::NotSeated)
    }

    pub fn is_seated(&self, connection: Uuid) -> bool {
        self.connections.contains_key(&connection)
    }

    /// Hand a seat to a connection. A returning player may take back a seat
    /// nobody is attached to.
    pub fn attach(&mut self, connection: Uuid, colour: Colour) -> Result<(), LobbyError> {
        if self.connections.contains_key(&connection) {
            return Err(LobbyError::AlreadySeated);
        }
        if self.seats.contains_key(&colour) {
            return Err(LobbyError::SeatTaken);
        }
        self.seats.insert(colour, Controller::Remote(connection));
        self.connections.insert(connection, colour);
        Ok(())
    }

    /// Release a connection's seat. The colour stays reserved in the game.
    pub fn detach(&mut self, connection: Uuid) -> Option<Colour> {
        let colour = self.connections.remove(&connection)?;
        self.seats.remove(&colour);
        Some(colour)
    }

    /// Seat a bot on its colour
    pub fn add_bot(&mut self, bot: Bot) -> Result<(), LobbyError> {
        if self.seats.contains_key(&bot.colour) {
            return Err(LobbyError::SeatTaken);
        }
        self.seats.insert(bot.colour, Controller::Bot(bot));
        Ok(())
    }

    /// Bots in colour order
    pub fn bots_mut(&mut self) -> impl Iterator<Item = &mut Bot> {
        self.seats.values_mut().filter_map(|c| match c {
            Controller::Bot(bot) => Some(bot),
            Controller::Remote(_) => None,
        })
    }

    pub fn bot_count(&self) -> usize {
        self.seats
            .values()
            .filter(|c| matches!(c, Controller::Bot(_)))
            .count()
    }

    /// Connections an envelope should be delivered to.
    pub fn recipients(&self, envelope: &Envelope) -> Vec<Uuid> {
        self.seats
            .iter()
            .filter_map(|(colour, controller)| match controller {
                Controller::Remote(connection) if envelope.is_for(*colour) => Some(*connection),
                _ => None,
            })
            .collect()
    }
}

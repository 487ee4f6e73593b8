//! Settlers - an authoritative Catan turn engine
//!
//! This crate holds everything a server needs to referee a four-player game:
//! - Hex, corner and side coordinates for the standard 19-tile board
//! - Board generation with chits, ports and the robber
//! - Bank stock, player hands, buildings and road networks
//! - A protocol processor that gates, applies and broadcasts moves
//!
//! # Architecture
//!
//! `Game` owns the rules and mutates state in place. `MessageProcessor` wraps
//! it with seat management and expected-move queues, checkpoints state before
//! every move and restores it when the move fails. Nothing here does I/O, so
//! the same engine drives network clients, bots and tests.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for tiles, corners and sides
//! - [`board`]: Tiles, ports, placement queries
//! - [`bank`]: Resource, development card and piece stock
//! - [`player`]: Hands, buildings and road chains
//! - [`game`]: Turn flow and rule enforcement
//! - [`processor`]: Move gating and event routing
//! - [`bot`]: Computer players

pub mod bank;
pub mod board;
pub mod bot;
pub mod config;
pub mod error;
pub mod game;
pub mod hex;
pub mod messages;
pub mod player;
pub mod processor;
pub mod random;

// Re-export commonly used types
pub use bank::{Bank, DevCardKind, Piece};
pub use board::{Building, HexGrid, PlayerId, PortKind, Resource, Terrain};
pub use bot::Bot;
pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use game::{Game, Phase};
pub use hex::{EdgeCoord, EdgeDirection, HexCoord, NodeCoord, NodeDirection};
pub use messages::{
    DevCardPlay, Envelope, Event, MoveKind, Recipients, Request, TradeResponse, TradeSpec,
};
pub use player::{Colour, Player, ResourceHand};
pub use processor::MessageProcessor;

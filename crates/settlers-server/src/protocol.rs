//! WebSocket frames for the settlers server.
//!
//! Game traffic travels as core `Request`s and `Event`s; this layer only adds
//! the connection handshake and keepalive.

use serde::{Deserialize, Serialize};
use settlers_core::{Event, Request};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// A game move, chat line or lobby join
    Request(Request),

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Sent once when the socket opens
    Welcome { connection_id: Uuid },

    /// Something happened in the lobby or the game
    Event(Event),

    /// Pong response
    Pong,

    /// The frame could not be handled at all
    Error { message: String },
}

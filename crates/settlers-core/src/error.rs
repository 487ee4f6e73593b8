//! Every way a move can be refused.
//!
//! All variants are recoverable: the message processor turns them into an
//! `Event::Error` for the instigating player and restores the pre-move state.

use crate::bank::{DevCardKind, Piece};
use crate::board::Resource;
use crate::messages::MoveKind;
use crate::player::Colour;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something the bank can run out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockItem {
    Resource(Resource),
    DevelopmentCard,
    Piece(Colour, Piece),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    // Affordability
    #[error("cannot afford: need {required} {resource:?}, have {held}")]
    CannotAfford {
        resource: Resource,
        required: u32,
        held: u32,
    },

    #[error("the bank is out of {0:?}")]
    OutOfStock(StockItem),

    // Placement
    #[error("too close to another settlement")]
    IllegalPlacement,

    #[error("that node is already built on")]
    SettlementExists,

    #[error("that edge already has a road")]
    RoadExists,

    #[error("road does not connect to your network")]
    CannotBuildRoad,

    #[error("no settlement of yours to upgrade there")]
    CannotUpgrade,

    #[error("coordinates are not on the board")]
    InvalidCoordinates,

    // Ownership
    #[error("you have no playable {0:?} card")]
    DoesNotOwn(DevCardKind),

    #[error("you already played a development card this turn")]
    CardAlreadyPlayed,

    #[error("cannot steal from that player")]
    CannotSteal,

    // Trading
    #[error("illegal bank trade")]
    IllegalBankTrade,

    #[error("illegal port trade")]
    IllegalPortTrade,

    #[error("illegal trade")]
    IllegalTrade,

    #[error("there is no open trade offer")]
    NoActiveTrade,

    // Protocol
    #[error("unexpected move: {0:?}")]
    UnexpectedMove(MoveKind),

    #[error("waiting for players to discard")]
    DiscardsPending,

    #[error("must discard exactly {required} cards")]
    InvalidDiscard { required: u32 },

    #[error("the game is over")]
    GameOver,

    #[error("the game has not started")]
    GameNotStarted,

    // Lobby
    #[error("the game is full")]
    GameFull,
}

pub type GameResult<T> = Result<T, GameError>;

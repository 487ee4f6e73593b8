//! Requests players submit and events the server produces.
//!
//! Both enums serialize as `{"type": ..., "payload": ...}` objects.

use crate::bank::DevCardKind;
use crate::board::{BoardSnapshot, PlayerId, PortKind, Resource};
use crate::hex::{EdgeCoord, HexCoord, NodeCoord};
use crate::player::{Colour, ResourceHand};
use serde::{Deserialize, Serialize};

/// A development card being played, with any arguments it needs up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "card")]
pub enum DevCardPlay {
    Knight,
    RoadBuilding,
    /// The resource is named afterwards with `ChooseResource`.
    Monopoly,
    YearOfPlenty { first: Resource, second: Resource },
}

impl DevCardPlay {
    pub fn kind(&self) -> DevCardKind {
        match self {
            DevCardPlay::Knight => DevCardKind::Knight,
            DevCardPlay::RoadBuilding => DevCardKind::RoadBuilding,
            DevCardPlay::Monopoly => DevCardKind::Monopoly,
            DevCardPlay::YearOfPlenty { .. } => DevCardKind::YearOfPlenty,
        }
    }
}

/// A trade proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "with")]
pub enum TradeSpec {
    /// Give `give` at a port's rate (or the best one held when `port` is
    /// omitted), `quantity` times over, for `quantity` of `receive`.
    Bank {
        give: Resource,
        receive: Resource,
        quantity: u32,
        #[serde(default)]
        port: Option<PortKind>,
    },
    /// Offer cards to another player in exchange for theirs.
    Player {
        to: Colour,
        offer: ResourceHand,
        request: ResourceHand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeResponse {
    Accept,
    Reject,
}

/// Client-to-server move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Request {
    BuildRoad { edge: EdgeCoord },
    BuildSettlement { node: NodeCoord },
    BuildCity { node: NodeCoord },
    BuyDevCard,
    PlayDevCard(DevCardPlay),
    RollDice,
    MoveRobber { hex: HexCoord },
    /// Pick who to rob. Without `resource` a random held card is taken.
    SubmitTargetPlayer {
        target: Colour,
        #[serde(default)]
        resource: Option<Resource>,
    },
    DiscardResources { hand: ResourceHand },
    InitiateTrade(TradeSpec),
    SubmitTradeResponse(TradeResponse),
    ChooseResource { resource: Resource },
    EndTurn,
    ChatMessage { text: String },
    JoinLobby { username: String },
}

impl Request {
    /// The kind used for gating
    pub fn kind(&self) -> MoveKind {
        match self {
            Request::BuildRoad { .. } => MoveKind::BuildRoad,
            Request::BuildSettlement { .. } => MoveKind::BuildSettlement,
            Request::BuildCity { .. } => MoveKind::BuildCity,
            Request::BuyDevCard => MoveKind::BuyDevCard,
            Request::PlayDevCard(_) => MoveKind::PlayDevCard,
            Request::RollDice => MoveKind::RollDice,
            Request::MoveRobber { .. } => MoveKind::MoveRobber,
            Request::SubmitTargetPlayer { .. } => MoveKind::SubmitTargetPlayer,
            Request::DiscardResources { .. } => MoveKind::DiscardResources,
            Request::InitiateTrade(_) => MoveKind::InitiateTrade,
            Request::SubmitTradeResponse(_) => MoveKind::SubmitTradeResponse,
            Request::ChooseResource { .. } => MoveKind::ChooseResource,
            Request::EndTurn => MoveKind::EndTurn,
            Request::ChatMessage { .. } => MoveKind::ChatMessage,
            Request::JoinLobby { .. } => MoveKind::JoinLobby,
        }
    }
}

/// The discriminant of a `Request`, used in expected-move queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    BuildRoad,
    BuildSettlement,
    BuildCity,
    BuyDevCard,
    PlayDevCard,
    RollDice,
    MoveRobber,
    SubmitTargetPlayer,
    DiscardResources,
    InitiateTrade,
    SubmitTradeResponse,
    ChooseResource,
    EndTurn,
    ChatMessage,
    JoinLobby,
}

impl MoveKind {
    /// Moves the current player may make freely after rolling.
    pub fn is_free_move(&self) -> bool {
        matches!(
            self,
            MoveKind::BuildRoad
                | MoveKind::BuildSettlement
                | MoveKind::BuildCity
                | MoveKind::BuyDevCard
                | MoveKind::PlayDevCard
                | MoveKind::InitiateTrade
                | MoveKind::EndTurn
        )
    }

    /// Moves that never touch game state.
    pub fn bypasses_gating(&self) -> bool {
        matches!(self, MoveKind::ChatMessage | MoveKind::JoinLobby)
    }
}

/// Cards one player received from a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub colour: Colour,
    pub resources: ResourceHand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySeat {
    pub colour: Colour,
    pub username: String,
    pub connected: bool,
}

/// Per-seat information sent with `BeginGame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub id: PlayerId,
    pub colour: Colour,
    pub username: String,
    pub hex_code: u32,
}

/// Server-to-client notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    // Building
    RoadBuilt {
        colour: Colour,
        edge: EdgeCoord,
    },
    SettlementBuilt {
        colour: Colour,
        node: NodeCoord,
    },
    CityBuilt {
        colour: Colour,
        node: NodeCoord,
    },

    // Development cards
    DevCardBought {
        colour: Colour,
    },
    /// Only sent to the buyer.
    DevCardDrawn {
        kind: DevCardKind,
    },
    DevCardPlayed {
        colour: Colour,
        card: DevCardPlay,
    },
    MonopolyResolution {
        colour: Colour,
        resource: Resource,
        total: u32,
    },
    ResourceChosen {
        colour: Colour,
        resources: Vec<Resource>,
    },

    // Dice and robber
    Rolled {
        colour: Colour,
        dice: (u8, u8),
        grants: Vec<ResourceGrant>,
        /// Players who must now discard, and how many cards.
        discards: Vec<(Colour, u32)>,
    },
    /// Cards collected by a second setup settlement.
    StartingResources {
        colour: Colour,
        resources: ResourceHand,
    },
    CardsDiscarded {
        colour: Colour,
        hand: ResourceHand,
    },
    RobberMoved {
        colour: Colour,
        hex: HexCoord,
    },
    /// `resource` is only filled in for the two players involved.
    ResourceStolen {
        thief: Colour,
        victim: Colour,
        resource: Option<Resource>,
    },

    // Trading
    BankTrade {
        colour: Colour,
        gave: ResourceHand,
        received: ResourceHand,
    },
    TradeOffered {
        from: Colour,
        to: Colour,
        offer: ResourceHand,
        request: ResourceHand,
        expires_in_secs: u64,
    },
    PlayerTrade {
        from: Colour,
        to: Colour,
        offer: ResourceHand,
        request: ResourceHand,
    },
    TradeRejected {
        from: Colour,
        to: Colour,
    },
    TradeExpired {
        from: Colour,
        to: Colour,
    },

    // Bonuses and turn flow
    LongestRoadChanged {
        previous: Option<Colour>,
        current: Option<Colour>,
        length: u32,
    },
    LargestArmyChanged {
        previous: Option<Colour>,
        current: Option<Colour>,
        knights: u32,
    },
    TurnEnded {
        colour: Colour,
        next: Colour,
    },
    GameWon {
        colour: Colour,
        victory_points: u32,
    },

    // Lobby and chat
    LobbyUpdate {
        seats: Vec<LobbySeat>,
    },
    BeginGame {
        board: BoardSnapshot,
        you: Colour,
        players: Vec<PlayerSettings>,
        first_player: Colour,
    },
    GameFull,
    ChatMessage {
        colour: Colour,
        text: String,
    },
    Error {
        message: String,
    },
}

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipients {
    All,
    Only(Colour),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub recipients: Recipients,
    pub event: Event,
}

impl Envelope {
    /// An event for every seat
    pub fn all(event: Event) -> Self {
        Self {
            recipients: Recipients::All,
            event,
        }
    }

    /// An event for one seat
    pub fn only(colour: Colour, event: Event) -> Self {
        Self {
            recipients: Recipients::Only(colour),
            event,
        }
    }

    pub fn is_for(&self, colour: Colour) -> bool {
        match self.recipients {
            Recipients::All => true,
            Recipients::Only(c) => c == colour,
        }
    }
}

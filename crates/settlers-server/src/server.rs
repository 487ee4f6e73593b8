//! WebSocket server and connection handling.

use crate::game_loop::{GameLoop, Inbound, Outbound};
use crate::protocol::{ClientMessage, ServerMessage};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How often trade timeouts and idle bots are checked.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Server state shared across all connections.
pub struct ServerState {
    /// Mapping from connection ID to its outgoing message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// The game loop's queue
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl ServerState {
    pub fn new(inbound: mpsc::UnboundedSender<Inbound>) -> Self {
        Self {
            senders: DashMap::new(),
            inbound,
        }
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, connection: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&connection) {
            let _ = sender.send(msg);
        }
    }

    /// Send frames produced by the game loop
    pub fn deliver(&self, outbound: Vec<Outbound>) {
        for (connection, msg) in outbound {
            self.send_to(connection, msg);
        }
    }

    fn enqueue(&self, inbound: Inbound) {
        if self.inbound.send(inbound).is_err() {
            error!("game loop has stopped");
        }
    }
}

/// Consume the inbound queue one item at a time, ticking once a second.
pub async fn run_game_loop(
    mut game: GameLoop,
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    state: Arc<ServerState>,
) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            item = inbound.recv() => {
                let Some(item) = item else {
                    break;
                };
                let out = game.handle(item, std::time::Instant::now());
                state.deliver(out);
            }
            _ = interval.tick() => {
                let out = game.tick(std::time::Instant::now());
                state.deliver(out);
            }
        }
    }
    info!("game loop finished");
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Settlers server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let connection_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(connection_id, tx);

    let welcome = ServerMessage::Welcome { connection_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => state.enqueue(Inbound::Message {
                    connection: connection_id,
                    message,
                }),
                Err(e) => {
                    warn!("Invalid message from {}: {}", connection_id, e);
                    state.send_to(
                        connection_id,
                        ServerMessage::Error {
                            message: format!("malformed message: {e}"),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                debug!("ping from {}", connection_id);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.enqueue(Inbound::Disconnected {
        connection: connection_id,
    });
    state.senders.remove(&connection_id);
    send_task.abort();

    info!("Connection closed for {}", connection_id);
    Ok(())
}

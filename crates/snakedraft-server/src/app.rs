// Application state and broadcast layer.
//
// One task owns the `DraftEngine` and the set of connected clients. Events from
// the WebSocket server are handled strictly one at a time, so every request
// sees the effects of all requests before it.

use std::collections::HashMap;

use snakedraft_core::draft::engine::DraftEngine;
use snakedraft_core::protocol::{ClientMessage, Outcome, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ws_server::{ConnId, WsEvent};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub engine: DraftEngine,
    clients: HashMap<ConnId, mpsc::UnboundedSender<String>>,
}

impl AppState {
    pub fn new(engine: DraftEngine) -> Self {
        AppState {
            engine,
            clients: HashMap::new(),
        }
    }

    /// Number of connections currently in the broadcast set.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn handle_event(&mut self, event: WsEvent) {
        match event {
            WsEvent::Connected {
                conn_id,
                addr,
                outbound,
            } => {
                info!("Client {} connected from {}", conn_id, addr);
                self.clients.insert(conn_id, outbound);
                // Registered and synced in the same step, ahead of any later broadcast.
                let snapshot = self.engine.initial_state();
                self.send_to(conn_id, &snapshot);
            }
            WsEvent::Disconnected { conn_id } => {
                if self.clients.remove(&conn_id).is_some() {
                    info!("Client {} disconnected", conn_id);
                }
            }
            WsEvent::Message { conn_id, text } => self.handle_message(conn_id, &text),
        }
    }

    fn handle_message(&mut self, conn_id: ConnId, text: &str) {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to parse message from client {}: {}", conn_id, e);
                self.send_to(conn_id, &ServerMessage::error(format!("Malformed request: {e}")));
                return;
            }
        };
        debug!("Client {} request: {:?}", conn_id, msg);

        let outcome = self.engine.handle(msg);
        self.dispatch(conn_id, outcome);
    }

    /// Deliver an engine outcome: broadcasts first, then the requester's replies.
    fn dispatch(&mut self, origin: ConnId, outcome: Outcome) {
        for msg in &outcome.broadcast {
            self.broadcast(msg);
        }
        for msg in &outcome.reply {
            self.send_to(origin, msg);
        }
    }

    fn broadcast(&mut self, msg: &ServerMessage) {
        let Some(text) = encode(msg) else {
            return;
        };
        let mut dead = Vec::new();
        for (id, outbound) in &self.clients {
            if outbound.send(text.clone()).is_err() {
                dead.push(*id);
            }
        }
        self.prune(dead);
    }

    fn send_to(&mut self, conn_id: ConnId, msg: &ServerMessage) {
        let Some(outbound) = self.clients.get(&conn_id) else {
            return;
        };
        let Some(text) = encode(msg) else {
            return;
        };
        if outbound.send(text).is_err() {
            self.prune(vec![conn_id]);
        }
    }

    fn prune(&mut self, dead: Vec<ConnId>) {
        for id in dead {
            self.clients.remove(&id);
            debug!("Dropped dead connection {}", id);
        }
    }
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to serialise {} notification: {}", msg.kind(), e);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until the WebSocket channel closes.
pub async fn run(mut ws_rx: mpsc::Receiver<WsEvent>, mut state: AppState) -> anyhow::Result<()> {
    info!("Application event loop started");

    while let Some(event) = ws_rx.recv().await {
        state.handle_event(event);
    }

    info!("WebSocket channel closed, application event loop exiting");
    Ok(())
}

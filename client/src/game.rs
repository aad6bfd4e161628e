use std::sync::Arc;

use minesweeper_common::protocol::ClientMessage;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::connection::{MessageStream, MinesweeperConnection};
use crate::intent::Intent;
use crate::relay::{EventBus, SubscriberId};
use crate::session::{Action, GameEvent, Phase, Session};
use crate::viewport::Coord;
use crate::Result;

/// Connection state - all fields are required when connected
struct ConnectionState {
    sender: mpsc::UnboundedSender<ClientMessage>,
    address: String,
    background_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl ConnectionState {
    /// Queue a command for the server
    fn send_message(&self, message: ClientMessage) -> Result<()> {
        debug!("Queueing command: {}", message);
        self.sender
            .send(message)
            .map_err(|_| "Connection sender closed")?;
        Ok(())
    }

    /// Stop listening, flush queued commands and close the socket
    async fn shutdown(self) {
        self.background_task.abort();
        let _ = self.background_task.await;

        drop(self.sender);
        let _ = self.writer_task.await;
    }
}

/// High-level minesweeper client that mirrors the server's board locally
///
/// All mutation of the [`Session`] is serialized behind one lock: the
/// background listener applies server messages, user operations apply input.
pub struct MinesweeperGame {
    config: ClientConfig,
    connection_state: Arc<RwLock<Option<ConnectionState>>>,
    events: Arc<RwLock<EventBus<GameEvent>>>,
    session: Arc<RwLock<Session>>,
}

impl MinesweeperGame {
    /// Create a new game client; nothing is connected yet
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connection_state: Arc::new(RwLock::new(None)),
            events: Arc::new(RwLock::new(EventBus::new())),
            session: Arc::new(RwLock::new(Session::new())),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Subscribe to game events for the current or next connection
    pub async fn subscribe(&self) -> (SubscriberId, mpsc::UnboundedReceiver<GameEvent>) {
        self.events.write().await.subscribe()
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.events.write().await.unsubscribe(id)
    }

    /// Connect to the configured server over TCP
    pub async fn connect(&self) -> Result<()> {
        let address = self.config.address();
        let connection = MinesweeperConnection::connect(&address).await?;
        self.attach(connection, address).await;
        Ok(())
    }

    /// Play over an already established byte stream
    pub async fn connect_stream<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let connection = MinesweeperConnection::from_stream(stream);
        self.attach(connection, "stream".to_string()).await;
    }

    async fn attach(&self, connection: MinesweeperConnection, address: String) {
        let mut conn_state = self.connection_state.write().await;

        // Stop any existing connection
        if let Some(existing_conn) = conn_state.take() {
            existing_conn.shutdown().await;
        }
        *self.session.write().await = Session::new();

        let MinesweeperConnection {
            stream,
            sender,
            writer_task,
        } = connection;

        // Start background message listener
        let background_task = self.start_background_listener(stream, sender.clone());

        info!("Attached to {}", address);
        *conn_state = Some(ConnectionState {
            sender,
            address,
            background_task,
            writer_task,
        });
    }

    /// Send a command over the current connection
    async fn send_client_message(&self, message: ClientMessage) -> Result<()> {
        let conn_state = self.connection_state.read().await;

        if let Some(ref conn) = *conn_state {
            conn.send_message(message)?;
        } else {
            return Err("Not connected to a server. Call connect() first.".into());
        }

        Ok(())
    }

    /// Dig the selected tile. Returns whether a command was sent; nothing is
    /// sent unless the tile is untouched and the game is live.
    pub async fn dig(&self) -> Result<bool> {
        let command = self.session.read().await.dig();
        self.send_optional(command).await
    }

    /// Flag or deflag the selected tile. Returns whether a command was sent.
    pub async fn toggle_flag(&self) -> Result<bool> {
        let command = self.session.read().await.toggle_flag();
        self.send_optional(command).await
    }

    async fn send_optional(&self, command: Option<ClientMessage>) -> Result<bool> {
        match command {
            Some(command) => {
                self.send_client_message(command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn look(&self) -> Result<()> {
        self.send_client_message(ClientMessage::Look).await
    }

    pub async fn help(&self) -> Result<()> {
        self.send_client_message(ClientMessage::Help).await
    }

    /// Say goodbye to the server and close the connection
    pub async fn bye(&self) -> Result<()> {
        self.send_client_message(ClientMessage::Bye).await?;
        self.disconnect().await
    }

    /// Move the selection. Returns whether it moved.
    pub async fn move_selection(&self, delta: Coord) -> bool {
        let changed = self.session.write().await.move_selection(delta);
        self.notify_view(changed).await
    }

    /// Record the size of the visible window. Returns whether it changed.
    pub async fn resize_aperture(&self, size: Coord) -> bool {
        let changed = self.session.write().await.resize_aperture(size);
        self.notify_view(changed).await
    }

    async fn notify_view(&self, changed: bool) -> bool {
        if changed {
            self.events.write().await.publish(GameEvent::ViewChanged);
        }
        changed
    }

    /// Apply a user intent. Returns false once the user asked to quit.
    pub async fn handle_intent(&self, intent: Intent) -> Result<bool> {
        let action = self.session.write().await.handle_intent(intent);

        match action {
            Action::None => {}
            Action::Redraw => {
                self.notify_view(true).await;
            }
            Action::Send(command) => self.send_client_message(command).await?,
            Action::Quit => {
                self.bye().await?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Get a snapshot of the current session
    pub async fn get_state(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.session.read().await.phase()
    }

    /// Address of the current connection
    pub async fn get_address(&self) -> Option<String> {
        let conn_state = self.connection_state.read().await;
        conn_state.as_ref().map(|conn| conn.address.clone())
    }

    /// Check if we're connected and the server has not gone away
    pub async fn is_connected(&self) -> bool {
        let conn_state = self.connection_state.read().await;
        conn_state.is_some() && self.session.read().await.phase() != Phase::Closed
    }

    /// Close the connection and clean up
    pub async fn disconnect(&self) -> Result<()> {
        let mut conn_state = self.connection_state.write().await;

        if let Some(conn) = conn_state.take() {
            conn.shutdown().await;
        }

        // The event bus lives as long as the connection
        self.events.write().await.clear();

        info!("Disconnected from server");
        Ok(())
    }

    /// Start background message listener
    fn start_background_listener(
        &self,
        mut stream: MessageStream,
        sender: mpsc::UnboundedSender<ClientMessage>,
    ) -> JoinHandle<()> {
        let session = self.session.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            Self::background_message_handler(&mut stream, sender, session, events).await;
        })
    }

    /// Background task that applies incoming server messages
    async fn background_message_handler(
        stream: &mut MessageStream,
        sender: mpsc::UnboundedSender<ClientMessage>,
        session: Arc<RwLock<Session>>,
        events: Arc<RwLock<EventBus<GameEvent>>>,
    ) {
        let reason = loop {
            let message = match stream.receive_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => break None,
                Err(e) => {
                    warn!("Abandoning connection: {}", e);
                    break Some(e.to_string());
                }
            };

            let event = session.write().await.apply(message);
            let Some(event) = event else {
                continue;
            };

            // Ask for the first board right away
            if matches!(event, GameEvent::Initialized { .. })
                && sender.send(ClientMessage::Look).is_err()
            {
                warn!("Connection sender closed before the first look");
            }

            events.write().await.publish(event);
        };

        if let Some(event) = session.write().await.close(reason) {
            events.write().await.publish(event);
        }
    }
}

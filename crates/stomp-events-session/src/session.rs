//! Client session state machine.
//!
//! The session owns the connection status, subscription table, pending
//! receipt table and event log behind a single lock. The command path and the
//! inbound path both go through the operations here; neither touches the
//! state directly.
//!
//! Locks are never held across an await. Each operation updates the state
//! under the lock, releases it, and only then talks to the transport or the
//! file store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use stomp_events_core::{
    BatchSource, Event, Frame, ReportSink, ServerCommand, Transport, WireBody,
    protocol::{ACCEPT_VERSION, header},
    render_summary,
    traits::{BatchError, ReportError, TransportError},
};
use tokio::sync::watch;

use crate::state::{ConnectionStatus, ReceiptAction, SessionState};

/// Session operation error.
///
/// The display text is the status line shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("The client is already logged in, log out before trying again")]
    AlreadyConnected,
    #[error("Please login first")]
    NotConnected,
    #[error("Session terminated")]
    Terminated,
    #[error("Already subscribed to {0}")]
    AlreadySubscribed(String),
    #[error("Error: Not subscribed to {0}")]
    NotSubscribed(String),
    #[error("No events found for user: {user} in game {channel}")]
    NoEvents { channel: String, user: String },
    #[error("Error reading file: {0}")]
    Batch(#[from] BatchError),
    #[error("Error: Cannot write to file: {0}")]
    Report(#[from] ReportError),
    #[error("Failed to send frame: {0}")]
    Transport(#[from] TransportError),
}

/// Result of handling one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Login acknowledged.
    Connected,
    /// Server reported an error; the session is terminated.
    Error { message: String, body: String },
    /// A pending request was acknowledged.
    Receipt(ReceiptAction),
    /// Logout acknowledged; the session is terminated.
    Disconnected,
    /// The transport closed; the session is terminated.
    TransportLost,
    /// A broadcast event from another user was logged.
    EventReceived { sender: String, channel: String },
    /// A broadcast of our own event was dropped.
    SelfEcho,
    /// Unknown command, unknown receipt, or unreadable body.
    Ignored,
}

impl InboundOutcome {
    /// Whether the inbound loop must stop after this frame.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Error { .. } | Self::Disconnected | Self::TransportLost
        )
    }

    /// Status text for the user, if any.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Connected => Some("Login successful".to_string()),
            Self::Error { message, body } if body.is_empty() => {
                Some(format!("Received Error: {message}"))
            }
            Self::Error { message, body } => Some(format!("Received Error: {message}\n{body}")),
            Self::Receipt(action) => Some(action.to_string()),
            Self::Disconnected => Some(ReceiptAction::Disconnect.to_string()),
            Self::TransportLost => Some("Disconnected from server.".to_string()),
            Self::EventReceived { sender, channel } => Some(format!(
                "Received message from {sender} in channel {channel}"
            )),
            Self::SelfEcho | Self::Ignored => None,
        }
    }
}

/// Client session over a transport `T` and a file store `S`.
pub struct Session<T, S>
where
    T: Transport,
    S: BatchSource + ReportSink,
{
    transport: T,
    store: S,
    accept_version: String,
    state: Mutex<SessionState>,
    shutdown: watch::Sender<bool>,
}

impl<T, S> Session<T, S>
where
    T: Transport,
    S: BatchSource + ReportSink,
{
    /// Create a disconnected session.
    #[must_use]
    pub fn new(transport: T, store: S) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            transport,
            store,
            accept_version: ACCEPT_VERSION.to_string(),
            state: Mutex::new(SessionState::new()),
            shutdown,
        }
    }

    /// Override the `accept-version` sent on login.
    #[must_use]
    pub fn with_accept_version(mut self, accept_version: impl Into<String>) -> Self {
        self.accept_version = accept_version.into();
        self
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The batch and report store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.lock().status
    }

    /// Whether the server acknowledged the login.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Whether the session reached its terminal state.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.status() == ConnectionStatus::Terminated
    }

    /// User named in the last login attempt.
    #[must_use]
    pub fn current_user(&self) -> String {
        self.lock().current_user.clone()
    }

    /// Subscription id for `channel`, if subscribed.
    #[must_use]
    pub fn subscription_id(&self, channel: &str) -> Option<u64> {
        self.lock().subscriptions.get(channel).copied()
    }

    /// Number of requests still waiting for a receipt.
    #[must_use]
    pub fn pending_receipts(&self) -> usize {
        self.lock().receipts.len()
    }

    /// Events logged for `(channel, sender)`, oldest first.
    #[must_use]
    pub fn events(&self, channel: &str, sender: &str) -> Vec<Event> {
        self.lock().events.events(channel, sender).to_vec()
    }

    /// Receiver that flips to `true` once the session terminates.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    // ------------------------------------------------------------------
    // Command path
    // ------------------------------------------------------------------

    /// Send a login request.
    ///
    /// The status changes only when the server acknowledges.
    ///
    /// # Errors
    /// Returns error if already connected, terminated, or the send fails.
    pub async fn login(
        &self,
        host_port: &str,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        let host = host_port.split_once(':').map_or(host_port, |(host, _)| host);
        {
            let mut state = self.lock();
            match state.status {
                ConnectionStatus::Connected => return Err(SessionError::AlreadyConnected),
                ConnectionStatus::Terminated => return Err(SessionError::Terminated),
                ConnectionStatus::Disconnected => {}
            }
            state.current_user = username.to_string();
        }

        self.send_frame(Frame::connect(&self.accept_version, host, username, password))
            .await
    }

    /// Subscribe to `channel`.
    ///
    /// # Errors
    /// Returns error if not connected, already subscribed, or the send fails.
    pub async fn join(&self, channel: &str) -> Result<(), SessionError> {
        let (frame, subscription_id, receipt_id) = {
            let mut state = self.lock();
            require_connected(&state)?;
            if state.subscriptions.contains_key(channel) {
                return Err(SessionError::AlreadySubscribed(channel.to_string()));
            }
            let subscription_id = state.subscribe(channel);
            let receipt_id = state.expect_receipt(ReceiptAction::Joined(channel.to_string()));
            let frame = Frame::subscribe(channel, subscription_id, receipt_id);
            (frame, subscription_id, receipt_id)
        };

        self.send_frame(frame).await.inspect_err(|_| {
            let mut state = self.lock();
            state.receipts.remove(&receipt_id);
            if state.subscriptions.get(channel) == Some(&subscription_id) {
                state.subscriptions.remove(channel);
            }
        })
    }

    /// Unsubscribe from `channel`.
    ///
    /// # Errors
    /// Returns error if not connected, not subscribed, or the send fails.
    pub async fn leave(&self, channel: &str) -> Result<(), SessionError> {
        let (frame, subscription_id, receipt_id) = {
            let mut state = self.lock();
            require_connected(&state)?;
            let Some(subscription_id) = state.subscriptions.remove(channel) else {
                return Err(SessionError::NotSubscribed(channel.to_string()));
            };
            let receipt_id = state.expect_receipt(ReceiptAction::Left(channel.to_string()));
            let frame = Frame::unsubscribe(subscription_id, receipt_id);
            (frame, subscription_id, receipt_id)
        };

        self.send_frame(frame).await.inspect_err(|_| {
            let mut state = self.lock();
            state.receipts.remove(&receipt_id);
            state
                .subscriptions
                .entry(channel.to_string())
                .or_insert(subscription_id);
        })
    }

    /// Ask the server to end the session.
    ///
    /// The session terminates when the receipt arrives, not here.
    ///
    /// # Errors
    /// Returns error if not connected or the send fails.
    pub async fn request_logout(&self) -> Result<(), SessionError> {
        let receipt_id = {
            let mut state = self.lock();
            require_connected(&state)?;
            state.expect_receipt(ReceiptAction::Disconnect)
        };

        self.send_frame(Frame::disconnect(receipt_id))
            .await
            .inspect_err(|_| {
                self.lock().receipts.remove(&receipt_id);
            })
    }

    /// Publish every event in the batch at `path` to its channel.
    ///
    /// Each event is logged under the current user before its frame is
    /// sent. Returns the channel and the number of events sent.
    ///
    /// # Errors
    /// Returns error if not connected, the batch cannot be loaded, the
    /// channel is not subscribed, or a send fails. Events sent before a
    /// failed send stay logged.
    pub async fn publish_batch(&self, path: &str) -> Result<(String, usize), SessionError> {
        require_connected(&self.lock())?;
        let batch = self.store.load_events(path).await?;
        let channel = batch.channel();

        let user = {
            let state = self.lock();
            require_connected(&state)?;
            if !state.subscriptions.contains_key(&channel) {
                return Err(SessionError::NotSubscribed(channel));
            }
            state.current_user.clone()
        };

        let mut sent = 0;
        for event in batch.events {
            let frame = Frame::send(&channel, event.to_wire_body(&user));
            {
                let mut state = self.lock();
                if state.status == ConnectionStatus::Terminated {
                    return Err(SessionError::Terminated);
                }
                state.events.append(&channel, &user, event);
            }
            self.send_frame(frame).await?;
            sent += 1;
        }

        tracing::info!(%channel, sent, "published batch");
        Ok((channel, sent))
    }

    /// Write the summary of `user`'s events in `channel` to `path`.
    ///
    /// # Errors
    /// Returns error if not connected, nothing is logged for the pair, or
    /// the report cannot be written.
    pub async fn summarize(
        &self,
        channel: &str,
        user: &str,
        path: &str,
    ) -> Result<(), SessionError> {
        let events = {
            let state = self.lock();
            require_connected(&state)?;
            state.events.events(channel, user).to_vec()
        };
        if events.is_empty() {
            return Err(SessionError::NoEvents {
                channel: channel.to_string(),
                user: user.to_string(),
            });
        }

        self.store
            .write_summary(path, &render_summary(&events))
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inbound path
    // ------------------------------------------------------------------

    /// Handle one frame delivered by the transport.
    pub fn on_inbound_frame(&self, frame: &Frame) -> InboundOutcome {
        tracing::debug!(command = frame.command(), "received frame");

        match ServerCommand::parse(frame.command()) {
            Some(ServerCommand::Connected) => self.on_connected(),
            Some(ServerCommand::Error) => {
                self.terminate();
                InboundOutcome::Error {
                    message: frame.get_header(header::MESSAGE).to_string(),
                    body: frame.get_body().to_string(),
                }
            }
            Some(ServerCommand::Receipt) => self.on_receipt(frame.get_header(header::RECEIPT_ID)),
            Some(ServerCommand::Message) => self.on_message(frame.get_body()),
            None => InboundOutcome::Ignored,
        }
    }

    /// Handle end of stream or a receive failure.
    ///
    /// Returns `None` when the session had already terminated.
    pub fn on_transport_closed(&self) -> Option<InboundOutcome> {
        self.terminate().then_some(InboundOutcome::TransportLost)
    }

    /// Move to the terminal state.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn terminate(&self) -> bool {
        {
            let mut state = self.lock();
            if state.status == ConnectionStatus::Terminated {
                return false;
            }
            state.status = ConnectionStatus::Terminated;
        }
        tracing::info!("session terminated");
        self.shutdown.send_replace(true);
        true
    }

    fn on_connected(&self) -> InboundOutcome {
        let mut state = self.lock();
        match state.status {
            ConnectionStatus::Terminated => InboundOutcome::Ignored,
            ConnectionStatus::Connected | ConnectionStatus::Disconnected => {
                state.status = ConnectionStatus::Connected;
                tracing::info!(user = %state.current_user, "connected");
                InboundOutcome::Connected
            }
        }
    }

    fn on_receipt(&self, receipt_id: &str) -> InboundOutcome {
        let Ok(receipt_id) = receipt_id.trim().parse::<u64>() else {
            tracing::warn!(receipt_id, "receipt with non-numeric id");
            return InboundOutcome::Ignored;
        };

        // Copy the action out under the lock, act after releasing it.
        let action = self.lock().take_receipt(receipt_id);
        match action {
            Some(ReceiptAction::Disconnect) => {
                self.terminate();
                InboundOutcome::Disconnected
            }
            Some(action) => InboundOutcome::Receipt(action),
            None => {
                tracing::debug!(receipt_id, "unknown receipt");
                InboundOutcome::Ignored
            }
        }
    }

    fn on_message(&self, body: &str) -> InboundOutcome {
        let wire = match WireBody::parse(body) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::warn!("Dropping unreadable event: {e}");
                return InboundOutcome::Ignored;
            }
        };
        let sender = wire.user.unwrap_or_default();
        let channel = wire.event.channel();

        let mut state = self.lock();
        if state.status == ConnectionStatus::Terminated {
            return InboundOutcome::Ignored;
        }
        if sender == state.current_user {
            return InboundOutcome::SelfEcho;
        }
        state.events.append(&channel, &sender, wire.event);
        drop(state);

        InboundOutcome::EventReceived { sender, channel }
    }

    /// Send one frame; a failed send terminates the session.
    ///
    /// The terminated check and the write are not atomic: a frame may still
    /// go out while the inbound path terminates concurrently. Callers undo
    /// their table changes when this returns an error.
    async fn send_frame(&self, frame: Frame) -> Result<(), SessionError> {
        if self.is_terminated() {
            return Err(SessionError::Terminated);
        }

        tracing::debug!(command = frame.command(), "sending frame");
        if let Err(e) = self.transport.send(&frame.encode()).await {
            tracing::error!("Send failed, terminating session: {e}");
            self.terminate();
            return Err(e.into());
        }
        Ok(())
    }
}

fn require_connected(state: &SessionState) -> Result<(), SessionError> {
    match state.status {
        ConnectionStatus::Connected => Ok(()),
        ConnectionStatus::Disconnected => Err(SessionError::NotConnected),
        ConnectionStatus::Terminated => Err(SessionError::Terminated),
    }
}

//! In-process transport over unbounded channels.
//!
//! The session side holds a [`ChannelTransport`]; the other side holds a
//! [`ChannelPeer`] that plays the server: it reads what the session sent and
//! delivers frames back.

use async_trait::async_trait;
use stomp_events_core::{Frame, Transport, traits::TransportError};
use tokio::sync::{Mutex, mpsc, watch};

use crate::wait_closed;

/// Session side of the channel pair.
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: watch::Sender<bool>,
}

impl ChannelTransport {
    /// Create a connected transport and its peer.
    #[must_use]
    pub fn pair() -> (Self, ChannelPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);

        let transport = Self {
            outbound: outbound_tx,
            inbound: Mutex::new(inbound_rx),
            closed,
        };

        let peer = ChannelPeer {
            sent_rx: outbound_rx,
            deliver_tx: inbound_tx,
        };

        (transport, peer)
    }

    /// Whether [`Transport::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(frame.to_vec())
            .map_err(|_| TransportError::Closed)
    }

    async fn receive(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }

        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            frame = inbound.recv() => Ok(frame),
            () = wait_closed(closed) => Ok(None),
        }
    }

    async fn close(&self) {
        self.closed.send_replace(true);
    }
}

/// Server side of the channel pair.
pub struct ChannelPeer {
    /// Frames the session sent, terminator excluded.
    pub sent_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Frames to hand to the session.
    pub deliver_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelPeer {
    /// Deliver a frame to the session.
    ///
    /// # Errors
    /// Returns error if the transport was dropped.
    pub fn deliver(&self, frame: &Frame) -> Result<(), SendError> {
        self.deliver_raw(frame.encode())
    }

    /// Deliver raw bytes to the session.
    ///
    /// # Errors
    /// Returns error if the transport was dropped.
    pub fn deliver_raw(&self, bytes: impl Into<Vec<u8>>) -> Result<(), SendError> {
        self.deliver_tx
            .send(bytes.into())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Next frame the session sent, waiting for it.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.sent_rx.recv().await.map(|bytes| Frame::parse(&bytes))
    }

    /// Next frame the session sent, if one is queued (non-blocking).
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.sent_rx.try_recv().ok().map(|bytes| Frame::parse(&bytes))
    }

    /// All frames queued so far.
    pub fn drain(&mut self) -> Vec<Frame> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Peer send error.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Channel closed")]
    ChannelClosed,
}

//! Byte-stream transports for the STOMP events client.
//!
//! Provides:
//! - TCP transport with terminator framing (feature: tcp)
//! - In-process channel transport for tests and embedding callers

use tokio::sync::watch;

pub mod channel;

#[cfg(feature = "tcp")]
pub mod tcp;

pub use channel::{ChannelPeer, ChannelTransport};
#[cfg(feature = "tcp")]
pub use tcp::TcpTransport;

/// Resolve once the close flag is set or its sender is gone.
pub(crate) async fn wait_closed(mut closed: watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            return;
        }
    }
}

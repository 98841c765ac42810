//! TCP transport with terminator-byte framing.

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use stomp_events_core::{Transport, protocol::FRAME_TERMINATOR, traits::TransportError};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, watch},
};

use crate::wait_closed;

/// Default read buffer capacity.
const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Largest frame accepted before its terminator arrives.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

struct ReadHalf {
    stream: OwnedReadHalf,
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no terminator.
    scanned: usize,
}

/// Client connection to the server.
///
/// Sends and receives may run concurrently; each direction has its own lock.
pub struct TcpTransport {
    reader: Mutex<ReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    closed: watch::Sender<bool>,
    endpoint: String,
}

impl TcpTransport {
    /// Connect to `host:port`.
    ///
    /// # Errors
    /// Returns error if the connection cannot be opened.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let endpoint = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            tracing::warn!("Connect to {endpoint} failed: {e}");
            TransportError::Connect(endpoint.clone())
        })?;
        tracing::info!("Connected to {endpoint}");
        Ok(Self::from_stream(stream, endpoint))
    }

    /// Wrap an already connected stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream, endpoint: impl Into<String>) -> Self {
        let (read, write) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(ReadHalf {
                stream: read,
                buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
                scanned: 0,
            }),
            writer: Mutex::new(write),
            closed,
            endpoint: endpoint.into(),
        }
    }

    /// Remote `host:port`.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        writer.write_all(&[FRAME_TERMINATOR]).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }

        let mut reader = self.reader.lock().await;
        let ReadHalf {
            stream,
            buffer,
            scanned,
        } = &mut *reader;
        let wait = wait_closed(closed);
        tokio::pin!(wait);

        loop {
            if let Some(offset) = buffer[*scanned..]
                .iter()
                .position(|b| *b == FRAME_TERMINATOR)
            {
                let frame = buffer.split_to(*scanned + offset);
                buffer.advance(1);
                *scanned = 0;
                return Ok(Some(frame.to_vec()));
            }
            *scanned = buffer.len();

            if buffer.len() > MAX_FRAME_LEN {
                tracing::error!(
                    "{} sent {} bytes without a terminator",
                    self.endpoint,
                    buffer.len()
                );
                buffer.clear();
                *scanned = 0;
                return Err(TransportError::FrameTooLarge(MAX_FRAME_LEN));
            }

            tokio::select! {
                read = stream.read_buf(&mut *buffer) => {
                    if read? == 0 {
                        if !buffer.is_empty() {
                            tracing::warn!(
                                "{} closed with {} unterminated bytes",
                                self.endpoint,
                                buffer.len()
                            );
                            buffer.clear();
                            *scanned = 0;
                        }
                        return Ok(None);
                    }
                }
                () = &mut wait => return Ok(None),
            }
        }
    }

    async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("Shutdown of {} failed: {e}", self.endpoint);
        }
    }
}

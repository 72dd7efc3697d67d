//! TCP transport: listener plus split-stream connection handles.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP listener that produces [`Connection`] handles.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    ///
    /// Bind to port 0 to let the OS pick a free port; [`local_addr`]
    /// (Self::local_addr) reports the actual one.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming connection.
    ///
    /// Returns the shared write handle and the exclusive read half. The
    /// caller (the server's accept loop) moves the read half into the
    /// connection's handler task; everything else only ever sees the
    /// [`Connection`].
    pub async fn accept(
        &self,
    ) -> Result<(Connection, OwnedReadHalf), TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let (read_half, write_half) = stream.into_split();
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %peer, "accepted connection");

        let connection = Connection {
            id,
            peer,
            writer: Arc::new(Mutex::new(write_half)),
        };
        Ok((connection, read_half))
    }
}

/// The shared write side of one accepted connection.
///
/// Clones share the same underlying socket; the writer mutex is held only
/// for the duration of one frame write, so a broadcast over many
/// connections never serializes behind a single slow peer for longer than
/// one send.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl Connection {
    /// Writes one complete frame to the peer.
    ///
    /// The frame is written with `write_all` — a short write surfaces as
    /// [`TransportError::SendFailed`] and is not retried.
    pub async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    /// Closes the connection (best effort).
    ///
    /// Shuts down the write side, which delivers EOF to the peer and to
    /// our own handler task blocked in a read — that read observes the
    /// closure on its next attempt, per the teardown model.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::CloseFailed)
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the peer's remote address.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish()
    }
}

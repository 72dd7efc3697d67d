//! Response senders shared by the per-kind handlers.
//!
//! Every outbound message funnels through [`send`], which bounds each
//! write with a timeout: a slow or wedged recipient costs a broadcast at
//! most [`SEND_BOUND`] before being skipped, instead of stalling the
//! fan-out (and the sending handler) indefinitely.

use std::sync::Arc;
use std::time::Duration;

use mulligan_protocol::{ErrorNotice, Message, encode};
use mulligan_session::Session;
use mulligan_transport::Connection;

use crate::ServerError;

/// Upper bound on one response write to one recipient.
pub(crate) const SEND_BOUND: Duration = Duration::from_secs(5);

/// Encodes a message and writes it to one connection, bounded by
/// [`SEND_BOUND`].
pub(crate) async fn send(
    connection: &Connection,
    message: &Message,
) -> Result<(), ServerError> {
    let frame = encode(message)?;
    match tokio::time::timeout(SEND_BOUND, connection.send(&frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ServerError::SendTimedOut(connection.id())),
    }
}

/// Sends a wire `Error` message with human-readable text.
pub(crate) async fn send_error(
    connection: &Connection,
    message: &str,
) -> Result<(), ServerError> {
    send(
        connection,
        &Message::Error(ErrorNotice {
            message: message.to_string(),
        }),
    )
    .await
}

/// Delivers the same message to every recipient, one write at a time.
///
/// Failures (including the send bound) are logged and skipped: a dead or
/// slow recipient must not keep the rest of a broadcast from landing.
/// Recipients removed from the roster after this snapshot was taken
/// simply fail their write here — benign staleness, not an error.
pub(crate) async fn broadcast(
    recipients: &[Arc<Session>],
    message: &Message,
) {
    for session in recipients {
        if let Err(e) = send(session.connection(), message).await {
            tracing::warn!(
                player_id = %session.id(),
                error = %e,
                "broadcast send failed, skipping recipient"
            );
        }
    }
}

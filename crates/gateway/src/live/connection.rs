//! Transport-independent session driver.
//!
//! Messages from one connection are handled strictly in arrival order: the
//! reply to message N is queued before message N+1 is looked at. When the
//! transport closes, an in-flight model call is allowed to finish but its
//! result is dropped, and the session is wiped.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gg_domain::error::Result;

use super::protocol::{ClientMessage, ServerMessage};
use super::session::{Lifecycle, LiveSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// The client sent `end_session`.
    EndRequested,
    /// The inbound side went away (socket closed, reader stopped).
    TransportClosed,
    /// Replies could no longer be delivered.
    OutboundClosed,
}

/// How a session finished, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    pub reason: TeardownReason,
    pub messages_handled: usize,
    /// Turns still held when the connection went away.
    pub turns_discarded: usize,
    pub had_image: bool,
}

/// Run `session` until it ends or its transport goes away.
///
/// `inbound` carries decoded frames (or the decode error for a bad frame).
/// `closed` is cancelled by the transport when the peer disconnects.
pub async fn drive_session(
    mut session: LiveSession,
    mut inbound: mpsc::Receiver<Result<ClientMessage>>,
    outbound: mpsc::Sender<ServerMessage>,
    closed: CancellationToken,
) -> Teardown {
    let mut messages_handled = 0usize;

    let reason = loop {
        let frame = tokio::select! {
            biased;
            _ = closed.cancelled() => break TeardownReason::TransportClosed,
            frame = inbound.recv() => frame,
        };
        let Some(frame) = frame else {
            break TeardownReason::TransportClosed;
        };

        let reply = match frame {
            Ok(msg) => session.handle(msg).await,
            Err(err) => Some(ServerMessage::error(&err)),
        };
        messages_handled += 1;

        if closed.is_cancelled() {
            tracing::debug!(session_id = %session.id(), "peer gone, dropping reply");
            break TeardownReason::TransportClosed;
        }
        if let Some(reply) = reply {
            if outbound.send(reply).await.is_err() {
                break TeardownReason::OutboundClosed;
            }
        }
        if session.lifecycle() == Lifecycle::Ended {
            break TeardownReason::EndRequested;
        }
    };

    let teardown = Teardown {
        reason,
        messages_handled,
        turns_discarded: session.transcript().len(),
        had_image: session.image().is_some(),
    };
    session.end();

    tracing::info!(
        session_id = %session.id(),
        reason = ?teardown.reason,
        messages = teardown.messages_handled,
        turns_discarded = teardown.turns_discarded,
        had_image = teardown.had_image,
        "live session closed, state wiped"
    );
    teardown
}

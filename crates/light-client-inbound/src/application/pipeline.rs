//! # Connection Loop
//!
//! Drives one connection: read a frame, decode the envelope, dispatch,
//! repeat.
//!
//! ```text
//! bytes -> read_frame -> decode_message -> dispatch -> Continue | Close
//!              |               |
//!              |               +-- undecodable: drop frame, keep reading
//!              +-- EOF / oversize / truncated / I/O: leave loop
//! ```
//!
//! Every exit path goes through [`on_disconnect`] exactly once. There is
//! no read timeout; a silent peer keeps its loop parked.

use std::sync::Arc;

use shared_types::{InitConnection, Message};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::dispatcher::{Flow, MessageDispatcher};
use crate::algorithms::{decode_message, encode_body, read_frame, write_message};
use crate::domain::{Endpoint, InboundError, OutboundCommand, PeerInfo};
use crate::ports::BoxedStream;

/// A live connection and the identity of its remote side.
pub struct Connection {
    /// Byte stream to the peer.
    pub stream: BoxedStream,
    /// Remote side.
    pub peer: PeerInfo,
}

impl Connection {
    /// Pair a stream with its peer.
    pub fn new(stream: BoxedStream, peer: PeerInfo) -> Self {
        Self { stream, peer }
    }
}

/// Why a connection loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer closed the stream between frames.
    Eof,
    /// A handler asked for the connection to be closed.
    Closed,
    /// Framing or transport failure.
    Error,
}

/// Run the receive loop until the connection ends.
pub async fn run_connection(dispatcher: Arc<MessageDispatcher>, connection: Connection) {
    let span = info_span!(
        "connection",
        id = %Uuid::new_v4(),
        peer = %connection.peer.endpoint,
        role = ?connection.peer.role,
    );
    drive(dispatcher, connection).instrument(span).await;
}

async fn drive(dispatcher: Arc<MessageDispatcher>, connection: Connection) {
    let Connection { mut stream, peer } = connection;
    let metrics = Arc::clone(dispatcher.metrics());
    let max_frame_len = dispatcher.config().max_frame_len;

    metrics.record_connection_opened();
    debug!("[lc-inbound] Connection loop started");

    let reason = loop {
        let frame = match read_frame(&mut stream, max_frame_len).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break DisconnectReason::Eof,
            Err(e) => {
                if matches!(e, InboundError::FrameTooLarge { .. }) {
                    metrics.record_oversize_frame();
                }
                error!(error = %e, "[lc-inbound] Connection read failed");
                break DisconnectReason::Error;
            }
        };
        metrics.record_frame();

        let message = match decode_message(&frame) {
            Ok(message) => message,
            Err(e) => {
                metrics.record_decode_failure();
                debug!(error = %e, len = frame.len(), "[lc-inbound] Undecodable frame dropped");
                continue;
            }
        };
        metrics.record_decoded();

        if dispatcher.dispatch(&peer, message) == Flow::Close {
            break DisconnectReason::Closed;
        }
    };

    on_disconnect(&dispatcher, stream, &peer, reason).await;
}

/// Release a connection.
///
/// Takes the stream by value, so it can run at most once per connection.
pub async fn on_disconnect(
    dispatcher: &MessageDispatcher,
    mut stream: BoxedStream,
    peer: &PeerInfo,
    reason: DisconnectReason,
) {
    if let Err(e) = stream.shutdown().await {
        debug!(error = %e, "[lc-inbound] Shutdown after disconnect failed");
    }
    drop(stream);

    dispatcher.metrics().record_connection_closed();
    info!(
        peer = %peer.endpoint,
        address = ?peer.address.map(hex::encode),
        reason = ?reason,
        "[lc-inbound] Disconnected"
    );
}

/// Send the `InitConnection` handshake announcing the local identity.
pub async fn on_connect(
    dispatcher: &MessageDispatcher,
    stream: &mut BoxedStream,
    peer: &PeerInfo,
) -> Result<(), InboundError> {
    let config = dispatcher.config();
    let handshake = InitConnection {
        address: config.local_address,
        node_type: config.node_type.clone(),
    };
    let body = encode_body(&handshake)?;
    let message = Message::new(OutboundCommand::InitConnection.as_str(), body);
    write_message(stream, &message).await?;

    info!(peer = %peer.endpoint, node_type = %handshake.node_type, "[lc-inbound] Connected");
    Ok(())
}

/// Run a connection loop on its own task.
pub fn spawn_connection(
    dispatcher: Arc<MessageDispatcher>,
    connection: Connection,
) -> JoinHandle<()> {
    tokio::spawn(run_connection(dispatcher, connection))
}

/// Connect to the parent node, send the handshake and start its loop.
///
/// Connection and handshake failures are returned; there is no retry.
pub async fn connect_and_run(
    dispatcher: Arc<MessageDispatcher>,
    endpoint: Endpoint,
) -> Result<JoinHandle<()>, InboundError> {
    let mut stream = dispatcher.connector().connect(&endpoint).await?;
    let peer = PeerInfo::parent(endpoint, None, None);
    on_connect(&dispatcher, &mut stream, &peer).await?;

    Ok(spawn_connection(dispatcher, Connection::new(stream, peer)))
}

//! # TCP Adapter
//!
//! `Connector` over tokio `TcpStream`, plus the accept loop for peers that
//! dial the light client.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::{on_connect, run_connection, Connection, MessageDispatcher};
use crate::domain::{Endpoint, InboundError, PeerInfo};
use crate::ports::{BoxedStream, Connector};

/// Plain TCP connector.
#[derive(Clone, Debug, Default)]
pub struct TcpConnector;

impl TcpConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, InboundError> {
        let stream = TcpStream::connect((endpoint.host(), endpoint.port()))
            .await
            .map_err(|e| InboundError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

/// Accept connections forever, one connection loop per peer.
///
/// Each accepted peer is sent the handshake before its loop starts. Accept
/// errors are logged and the loop keeps going.
pub async fn serve(listener: TcpListener, dispatcher: Arc<MessageDispatcher>) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "[lc-inbound] Accept failed");
                continue;
            }
        };
        info!(peer = %peer_addr, "[lc-inbound] Incoming connection");

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let mut stream: BoxedStream = Box::new(stream);
            let peer = PeerInfo::accepted(Endpoint::from(peer_addr));
            if let Err(e) = on_connect(&dispatcher, &mut stream, &peer).await {
                warn!(peer = %peer_addr, error = %e, "[lc-inbound] Handshake failed");
                return;
            }
            run_connection(dispatcher, Connection::new(stream, peer)).await;
        });
    }
}

/// Bind `addr` and run [`serve`] on a background task.
///
/// Returns the bound address, useful when `addr` asks for port 0.
pub async fn listen(
    addr: SocketAddr,
    dispatcher: Arc<MessageDispatcher>,
) -> Result<(SocketAddr, JoinHandle<()>), InboundError> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "[lc-inbound] Listening");

    Ok((local_addr, tokio::spawn(serve(listener, dispatcher))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing behind it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = TcpConnector::new().connect(&Endpoint::from(addr)).await;
        assert!(matches!(result, Err(InboundError::ConnectFailed { .. })));
    }

    #[tokio::test]
    async fn test_connect_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let connector = TcpConnector::new();
        let endpoint = Endpoint::from(addr);
        let (connected, accepted) = tokio::join!(
            connector.connect(&endpoint),
            listener.accept()
        );
        assert!(connected.is_ok());
        assert!(accepted.is_ok());
    }
}

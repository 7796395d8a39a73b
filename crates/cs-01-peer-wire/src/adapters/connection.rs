//! Async peer connection over TCP.
//!
//! Wraps a [`tokio::net::TcpStream`] with a [`MessageFramer`] and the
//! payload codec so callers exchange [`Message`] values instead of bytes.
//! Malformed frames from a peer are logged and skipped; only transport
//! failures and protocol-fatal conditions surface as errors.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use shared_types::Network;

use crate::envelope::{encode_message, MessageFramer};
use crate::error::WireError;
use crate::messages::Message;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A live connection to one peer.
pub struct PeerConnection {
    stream: TcpStream,
    framer: MessageFramer,
    network: Network,
    peer: SocketAddr,
}

impl PeerConnection {
    /// Dials a peer and returns the connection once the TCP handshake
    /// completes. Wire-level version negotiation is the caller's business.
    pub async fn connect(peer: SocketAddr, network: Network) -> Result<Self, WireError> {
        let stream = TcpStream::connect(peer).await?;
        tracing::info!("[cs-01] connected to peer {} on {}", peer, network);
        Ok(Self::from_stream(stream, peer, network))
    }

    /// Adopts an already-established stream, e.g. an accepted inbound one.
    pub fn from_stream(stream: TcpStream, peer: SocketAddr, network: Network) -> Self {
        Self {
            stream,
            framer: MessageFramer::new(network),
            network,
            peer,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Frames and writes one message.
    pub async fn send(&mut self, message: &Message) -> Result<(), WireError> {
        let frame = encode_message(self.network, message);
        self.stream.write_all(&frame).await?;
        tracing::debug!(
            "[cs-01] sent {} ({} byte payload) to {}",
            message.command(),
            frame.len() - crate::envelope::HEADER_SIZE,
            self.peer
        );
        Ok(())
    }

    /// Reads until one decodable message arrives.
    ///
    /// Frames the peer mangles (bad checksum, unknown command, payload
    /// that fails its codec) are logged at `warn` and skipped rather than
    /// tearing the connection down. Errors that cannot be skipped are an
    /// oversized length claim, a closed stream, and I/O failure.
    pub async fn receive(&mut self) -> Result<Message, WireError> {
        loop {
            match self.framer.next_message() {
                Ok(Some(raw)) => {
                    match Message::decode_payload(raw.command, &raw.payload) {
                        Ok(message) => {
                            tracing::debug!(
                                "[cs-01] received {} from {}",
                                raw.command,
                                self.peer
                            );
                            return Ok(message);
                        }
                        Err(e) => {
                            tracing::warn!(
                                "[cs-01] dropping undecodable {} from {}: {}",
                                raw.command,
                                self.peer,
                                e
                            );
                            continue;
                        }
                    }
                }
                Ok(None) => {}
                Err(e @ WireError::OversizedMessage { .. }) => {
                    tracing::warn!("[cs-01] peer {} sent oversized frame: {}", self.peer, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("[cs-01] dropping bad frame from {}: {}", self.peer, e);
                    continue;
                }
            }

            let mut chunk = vec![0u8; READ_CHUNK_SIZE];
            let read = self.stream.read(&mut chunk).await?;
            if read == 0 {
                tracing::info!("[cs-01] peer {} closed the connection", self.peer);
                return Err(WireError::ConnectionClosed);
            }
            self.framer.push(&chunk[..read]);
        }
    }
}

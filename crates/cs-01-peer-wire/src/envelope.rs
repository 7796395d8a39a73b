//! # Message Envelope
//!
//! The 24-byte frame around every payload: network magic, null-padded
//! command, little-endian payload length, and a checksum that is the first
//! four bytes of the payload's double SHA-256.
//!
//! [`MessageFramer`] reassembles frames from arbitrarily fragmented input.
//! It resynchronizes on the magic after garbage, skips frames it cannot
//! attribute to a known command, and verifies checksums before handing a
//! [`RawMessage`] to the payload codec, which may therefore assume the
//! bytes it sees arrived intact.

use shared_types::network::MAX_MESSAGE_SIZE;
use shared_types::{double_sha256, Network};

use crate::domain::buffer::ByteStreamBuffer;
use crate::error::WireError;
use crate::messages::{Command, Message, COMMAND_WIDTH};

/// Envelope width: 4 magic + 12 command + 4 length + 4 checksum.
pub const HEADER_SIZE: usize = 24;

/// Checksum width carried in the envelope.
pub const CHECKSUM_WIDTH: usize = 4;

/// First four bytes of the payload's double SHA-256.
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_WIDTH] {
    let digest = double_sha256(payload);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// A framed message whose envelope checks passed but whose payload has not
/// been decoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub command: Command,
    pub payload: Vec<u8>,
}

/// Frames a payload under the given network's magic.
pub fn frame_payload(network: Network, command: Command, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&network.magic());
    frame.extend_from_slice(&command.to_wire());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&checksum(payload));
    frame.extend_from_slice(payload);
    frame
}

/// Serializes a message ready to write to a peer.
pub fn encode_message(network: Network, message: &Message) -> Vec<u8> {
    frame_payload(network, message.command(), &message.encode_payload())
}

/// Incremental frame reassembler over a chunked byte stream.
pub struct MessageFramer {
    buffer: ByteStreamBuffer,
    magic: [u8; 4],
}

impl MessageFramer {
    pub fn new(network: Network) -> Self {
        Self {
            buffer: ByteStreamBuffer::new(),
            magic: network.magic(),
        }
    }

    /// Bytes buffered but not yet consumed as frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds bytes received from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.push(chunk.to_vec());
    }

    /// Extracts the next complete frame, if one has fully arrived.
    ///
    /// `Ok(None)` means more bytes are needed. Frame-level failures
    /// (unknown command, checksum mismatch) consume the offending frame
    /// and return an error, so the caller can log and keep reading. An
    /// oversized length claim is not recoverable: nothing is consumed and
    /// the connection should be dropped.
    pub fn next_message(&mut self) -> Result<Option<RawMessage>, WireError> {
        loop {
            if self.buffer.len() < HEADER_SIZE {
                return Ok(None);
            }

            if self.buffer.slice(..4) != self.magic {
                self.resync();
                if self.buffer.len() < HEADER_SIZE {
                    return Ok(None);
                }
                continue;
            }

            let header = self.buffer.slice(..HEADER_SIZE);
            let length = u32::from_le_bytes([header[16], header[17], header[18], header[19]]);
            if length > MAX_MESSAGE_SIZE {
                return Err(WireError::OversizedMessage {
                    length,
                    max: MAX_MESSAGE_SIZE,
                });
            }

            let frame_len = HEADER_SIZE + length as usize;
            if self.buffer.len() < frame_len {
                return Ok(None);
            }

            // The whole frame is here; consume it regardless of what the
            // remaining checks conclude about it.
            let mut command_field = [0u8; COMMAND_WIDTH];
            command_field.copy_from_slice(&header[4..16]);
            let command = match Command::from_wire(&command_field) {
                Ok(command) => command,
                Err(e) => {
                    self.buffer.skip(frame_len);
                    return Err(e);
                }
            };

            let payload = self.buffer.slice(HEADER_SIZE..frame_len);
            self.buffer.skip(frame_len);

            let expected = [header[20], header[21], header[22], header[23]];
            let computed = checksum(&payload);
            if computed != expected {
                return Err(WireError::ChecksumMismatch {
                    command: command.as_str(),
                    expected: hex::encode(expected),
                    computed: hex::encode(computed),
                });
            }

            return Ok(Some(RawMessage { command, payload }));
        }
    }

    /// Skips garbage until the next occurrence of the magic, keeping the
    /// last three bytes when none is found in case a magic prefix is
    /// straddling the chunk boundary.
    fn resync(&mut self) {
        let buffered = self.buffer.slice(..);
        match buffered
            .windows(self.magic.len())
            .position(|window| window == self.magic)
        {
            Some(0) => {}
            Some(offset) => {
                tracing::warn!(
                    "[cs-01] resynchronized stream: dropped {} garbage byte(s)",
                    offset
                );
                self.buffer.skip(offset);
            }
            None => {
                let keep = self.magic.len() - 1;
                let dropped = buffered.len().saturating_sub(keep);
                tracing::warn!(
                    "[cs-01] no frame magic in {} buffered byte(s): dropped {}",
                    buffered.len(),
                    dropped
                );
                self.buffer.skip(dropped);
            }
        }
    }
}

//! # CS-01 Peer Wire
//!
//! Peer-to-peer wire protocol subsystem: everything between raw TCP bytes
//! and typed protocol messages.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure data structures, no I/O
//!   - `ByteStreamBuffer`: Chunked accumulation of partial reads
//!   - `InventoryItem`: The 36-byte announcement unit
//!   - `BloomFilter`: Wire form of the SPV filter
//!
//! - **Messages Layer** (`messages/`): The closed command set
//!   - `Command`: 12-byte wire names mapped to a closed enum
//!   - `Message`: One variant per command, with exhaustive
//!     encode/decode dispatch
//!
//! - **Envelope Layer** (`envelope`): Framing
//!   - `MessageFramer`: Magic scan and resync, length bounds, and
//!     double-SHA256 checksum verification over the stream buffer
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `PeerConnection`: Tokio TCP transport feeding the framer
//!
//! ## Decode Discipline
//!
//! Every payload decoder consumes its full input and then proves it: trailing
//! bytes fail the decode with an error naming the command. The single
//! sanctioned exception is the version message's optional relay flag, which
//! is read only when bytes remain.
//!
//! ## Usage Example
//!
//! ```ignore
//! use cs_01_peer_wire::{Message, envelope::MessageFramer};
//! use shared_types::Network;
//!
//! let mut framer = MessageFramer::new(Network::Mainnet);
//! framer.push(chunk_from_socket);
//! while let Some(raw) = framer.next_message()? {
//!     let message = Message::decode_payload(raw.command, &raw.payload)?;
//!     // dispatch message
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod messages;

pub use adapters::PeerConnection;
pub use domain::bloom::BloomFilter;
pub use domain::buffer::ByteStreamBuffer;
pub use domain::inventory::{InventoryItem, InventoryKind};
pub use envelope::{MessageFramer, RawMessage};
pub use error::WireError;
pub use messages::{Command, Message};

//! # Shared Types Crate
//!
//! This crate contains the chain entities, the consensus byte-level encoding
//! primitives, and the per-network protocol parameters shared across
//! subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Explicit Encoding**: Entities convert to and from consensus bytes only
//!   through `ByteReader`/`ByteWriter`; nothing encodes itself implicitly.
//! - **No Global Parameters**: Network magic, genesis hashes, and protocol
//!   bounds live on the `Network` value passed into constructors, never in
//!   process-wide state.

pub mod encoding;
pub mod entities;
pub mod network;

pub use encoding::{ByteReader, ByteWriter, EncodingError};
pub use entities::*;
pub use network::Network;

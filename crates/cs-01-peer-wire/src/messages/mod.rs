//! # Protocol Messages
//!
//! The closed command set and its payload codecs. Both directions run
//! through one exhaustive `match` per enum, so adding a command without
//! wiring its codec fails to compile rather than falling back to a lookup
//! table at runtime.

pub mod address;
pub mod chain;
pub mod inventory;
pub mod reject;
pub mod version;

use shared_types::network::MAX_FILTER_ADD_SIZE;
use shared_types::{Block, ByteReader, ByteWriter, Transaction};

use crate::domain::bloom::BloomFilter;
use crate::error::WireError;

pub use address::{AddrMessage, TimestampedAddress};
pub use chain::{BlockLocator, HeadersMessage, MerkleBlockMessage};
pub use inventory::InventoryMessage;
pub use reject::{RejectCode, RejectMessage};
pub use version::{NetworkAddress, VersionMessage};

/// Width of the command field in the message envelope.
pub const COMMAND_WIDTH: usize = 12;

/// Every command this node speaks, one variant per wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Version,
    Verack,
    Ping,
    Pong,
    Addr,
    Inv,
    GetData,
    NotFound,
    GetBlocks,
    GetHeaders,
    Headers,
    Block,
    Tx,
    MerkleBlock,
    FilterLoad,
    FilterAdd,
    FilterClear,
    GetAddr,
    Mempool,
    SendHeaders,
    SendCmpct,
    Alert,
    Reject,
}

impl Command {
    /// Every command, in a stable order for table-driven tests.
    pub const ALL: &'static [Command] = &[
        Command::Version,
        Command::Verack,
        Command::Ping,
        Command::Pong,
        Command::Addr,
        Command::Inv,
        Command::GetData,
        Command::NotFound,
        Command::GetBlocks,
        Command::GetHeaders,
        Command::Headers,
        Command::Block,
        Command::Tx,
        Command::MerkleBlock,
        Command::FilterLoad,
        Command::FilterAdd,
        Command::FilterClear,
        Command::GetAddr,
        Command::Mempool,
        Command::SendHeaders,
        Command::SendCmpct,
        Command::Alert,
        Command::Reject,
    ];

    /// The wire name (without padding).
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Version => "version",
            Command::Verack => "verack",
            Command::Ping => "ping",
            Command::Pong => "pong",
            Command::Addr => "addr",
            Command::Inv => "inv",
            Command::GetData => "getdata",
            Command::NotFound => "notfound",
            Command::GetBlocks => "getblocks",
            Command::GetHeaders => "getheaders",
            Command::Headers => "headers",
            Command::Block => "block",
            Command::Tx => "tx",
            Command::MerkleBlock => "merkleblock",
            Command::FilterLoad => "filterload",
            Command::FilterAdd => "filteradd",
            Command::FilterClear => "filterclear",
            Command::GetAddr => "getaddr",
            Command::Mempool => "mempool",
            Command::SendHeaders => "sendheaders",
            Command::SendCmpct => "sendcmpct",
            Command::Alert => "alert",
            Command::Reject => "reject",
        }
    }

    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.iter().copied().find(|c| c.as_str() == name)
    }

    /// The 12-byte null-padded envelope field.
    pub fn to_wire(self) -> [u8; COMMAND_WIDTH] {
        let mut field = [0u8; COMMAND_WIDTH];
        let name = self.as_str().as_bytes();
        field[..name.len()].copy_from_slice(name);
        field
    }

    /// Parses the envelope field: the name runs to the first null, and
    /// everything after it must be null padding.
    pub fn from_wire(field: &[u8; COMMAND_WIDTH]) -> Result<Command, WireError> {
        let end = field.iter().position(|&b| b == 0).unwrap_or(COMMAND_WIDTH);
        let unknown = || WireError::UnknownCommand {
            name: String::from_utf8_lossy(&field[..end]).into_owned(),
        };
        if field[end..].iter().any(|&b| b != 0) {
            return Err(unknown());
        }
        let name = std::str::from_utf8(&field[..end]).map_err(|_| unknown())?;
        Command::from_name(name).ok_or_else(unknown)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Version(VersionMessage),
    Verack,
    Ping { nonce: u64 },
    Pong { nonce: u64 },
    Addr(AddrMessage),
    Inv(InventoryMessage),
    GetData(InventoryMessage),
    NotFound(InventoryMessage),
    GetBlocks(BlockLocator),
    GetHeaders(BlockLocator),
    Headers(HeadersMessage),
    Block(Block),
    Tx(Transaction),
    MerkleBlock(MerkleBlockMessage),
    FilterLoad(BloomFilter),
    FilterAdd { data: Vec<u8> },
    FilterClear,
    GetAddr,
    Mempool,
    SendHeaders,
    SendCmpct { announce: bool, version: u64 },
    Alert { payload: Vec<u8>, signature: Vec<u8> },
    Reject(RejectMessage),
}

impl Message {
    /// A ping carrying a fresh random nonce.
    pub fn ping() -> Message {
        Message::Ping {
            nonce: rand::random(),
        }
    }

    /// The pong answering `nonce`.
    pub fn pong(nonce: u64) -> Message {
        Message::Pong { nonce }
    }

    /// The command this message travels under.
    pub fn command(&self) -> Command {
        match self {
            Message::Version(_) => Command::Version,
            Message::Verack => Command::Verack,
            Message::Ping { .. } => Command::Ping,
            Message::Pong { .. } => Command::Pong,
            Message::Addr(_) => Command::Addr,
            Message::Inv(_) => Command::Inv,
            Message::GetData(_) => Command::GetData,
            Message::NotFound(_) => Command::NotFound,
            Message::GetBlocks(_) => Command::GetBlocks,
            Message::GetHeaders(_) => Command::GetHeaders,
            Message::Headers(_) => Command::Headers,
            Message::Block(_) => Command::Block,
            Message::Tx(_) => Command::Tx,
            Message::MerkleBlock(_) => Command::MerkleBlock,
            Message::FilterLoad(_) => Command::FilterLoad,
            Message::FilterAdd { .. } => Command::FilterAdd,
            Message::FilterClear => Command::FilterClear,
            Message::GetAddr => Command::GetAddr,
            Message::Mempool => Command::Mempool,
            Message::SendHeaders => Command::SendHeaders,
            Message::SendCmpct { .. } => Command::SendCmpct,
            Message::Alert { .. } => Command::Alert,
            Message::Reject(_) => Command::Reject,
        }
    }

    /// Serializes the payload (envelope excluded).
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        match self {
            Message::Version(version) => version.encode(&mut writer),
            Message::Verack
            | Message::FilterClear
            | Message::GetAddr
            | Message::Mempool
            | Message::SendHeaders => {}
            Message::Ping { nonce } | Message::Pong { nonce } => writer.put_u64_le(*nonce),
            Message::Addr(addr) => addr.encode(&mut writer),
            Message::Inv(inv) | Message::GetData(inv) | Message::NotFound(inv) => {
                inv.encode(&mut writer)
            }
            Message::GetBlocks(locator) | Message::GetHeaders(locator) => {
                locator.encode(&mut writer)
            }
            Message::Headers(headers) => headers.encode(&mut writer),
            Message::Block(block) => block.encode(&mut writer),
            Message::Tx(tx) => tx.encode(&mut writer),
            Message::MerkleBlock(merkle) => merkle.encode(&mut writer),
            Message::FilterLoad(filter) => filter.encode(&mut writer),
            Message::FilterAdd { data } => writer.put_var_bytes(data),
            Message::SendCmpct { announce, version } => {
                writer.put_u8(u8::from(*announce));
                writer.put_u64_le(*version);
            }
            Message::Alert { payload, signature } => {
                writer.put_var_bytes(payload);
                writer.put_var_bytes(signature);
            }
            Message::Reject(reject) => reject.encode(&mut writer),
        }
        writer.into_bytes()
    }

    /// Decodes a payload under the given command.
    ///
    /// Every decoder must account for each payload byte: trailing bytes
    /// fail with an error naming the command. The version message consumes
    /// its optional relay byte internally, so the rule holds there too.
    pub fn decode_payload(command: Command, payload: &[u8]) -> Result<Message, WireError> {
        let mut reader = ByteReader::new(payload);
        let message =
            Self::decode_body(command, &mut reader).map_err(|e| e.with_command(command.as_str()))?;
        reader
            .check_finished()
            .map_err(|e| WireError::malformed(command.as_str(), e))?;
        Ok(message)
    }

    fn decode_body(command: Command, reader: &mut ByteReader<'_>) -> Result<Message, WireError> {
        let message = match command {
            Command::Version => Message::Version(VersionMessage::decode(reader)?),
            Command::Verack => Message::Verack,
            Command::Ping => Message::Ping {
                nonce: reader.read_u64_le()?,
            },
            Command::Pong => Message::Pong {
                nonce: reader.read_u64_le()?,
            },
            Command::Addr => Message::Addr(AddrMessage::decode(reader)?),
            Command::Inv => Message::Inv(InventoryMessage::decode(reader)?),
            Command::GetData => Message::GetData(InventoryMessage::decode(reader)?),
            Command::NotFound => Message::NotFound(InventoryMessage::decode(reader)?),
            Command::GetBlocks => Message::GetBlocks(BlockLocator::decode(reader)?),
            Command::GetHeaders => Message::GetHeaders(BlockLocator::decode(reader)?),
            Command::Headers => Message::Headers(HeadersMessage::decode(reader)?),
            Command::Block => Message::Block(Block::decode(reader)?),
            Command::Tx => Message::Tx(Transaction::decode(reader)?),
            Command::MerkleBlock => Message::MerkleBlock(MerkleBlockMessage::decode(reader)?),
            Command::FilterLoad => Message::FilterLoad(BloomFilter::decode(reader)?),
            Command::FilterAdd => {
                let data = reader.read_var_bytes()?;
                if data.len() as u64 > MAX_FILTER_ADD_SIZE {
                    return Err(WireError::malformed(
                        "filteradd",
                        format!(
                            "data element {} exceeds maximum {}",
                            data.len(),
                            MAX_FILTER_ADD_SIZE
                        ),
                    ));
                }
                Message::FilterAdd { data }
            }
            Command::FilterClear => Message::FilterClear,
            Command::GetAddr => Message::GetAddr,
            Command::Mempool => Message::Mempool,
            Command::SendHeaders => Message::SendHeaders,
            Command::SendCmpct => Message::SendCmpct {
                announce: reader.read_u8()? != 0,
                version: reader.read_u64_le()?,
            },
            Command::Alert => Message::Alert {
                payload: reader.read_var_bytes()?,
                signature: reader.read_var_bytes()?,
            },
            Command::Reject => Message::Reject(RejectMessage::decode(reader)?),
        };
        Ok(message)
    }
}

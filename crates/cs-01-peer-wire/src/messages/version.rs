//! # Version Handshake
//!
//! The first message on every connection: advertised services, addresses,
//! and the relay opt-out added late enough in the protocol's life that it
//! only exists when the peer sent it.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::{SystemTime, UNIX_EPOCH};

use shared_types::network::{user_agent, DEFAULT_SERVICES, PROTOCOL_VERSION};
use shared_types::{ByteReader, ByteWriter, EncodingError};

/// A peer endpoint as carried inside version payloads: services, a 16-byte
/// address (IPv4 arrives v4-mapped), and a big-endian port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddress {
    pub services: u64,
    pub ip: [u8; 16],
    pub port: u16,
}

impl NetworkAddress {
    pub fn new(services: u64, addr: SocketAddr) -> Self {
        let ip = match addr.ip() {
            IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
            IpAddr::V6(v6) => v6.octets(),
        };
        Self {
            services,
            ip,
            port: addr.port(),
        }
    }

    /// The all-zero placeholder nodes advertise for themselves when they
    /// do not accept inbound connections.
    pub fn unroutable() -> Self {
        Self {
            services: 0,
            ip: [0u8; 16],
            port: 0,
        }
    }

    /// Recovers the socket address, unmapping v4-mapped entries.
    pub fn socket_addr(&self) -> SocketAddr {
        let v6 = Ipv6Addr::from(self.ip);
        match v6.to_ipv4_mapped() {
            Some(v4) => SocketAddr::new(IpAddr::V4(v4), self.port),
            None => SocketAddr::new(IpAddr::V6(v6), self.port),
        }
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u64_le(self.services);
        writer.put_bytes(&self.ip);
        writer.put_u16_be(self.port);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        let services = reader.read_u64_le()?;
        let mut ip = [0u8; 16];
        ip.copy_from_slice(reader.read_bytes(16)?);
        Ok(Self {
            services,
            ip,
            port: reader.read_u16_be()?,
        })
    }
}

/// The version handshake payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMessage {
    pub version: u32,
    pub services: u64,
    /// Sender's unix time, signed per the original field definition.
    pub timestamp: i64,
    /// Address the sender believes it is talking to.
    pub receiver: NetworkAddress,
    /// Sender's own advertised address.
    pub sender: NetworkAddress,
    /// Random nonce for self-connection detection.
    pub nonce: u64,
    /// `/name:version/` form.
    pub user_agent: String,
    /// Best block height the sender knows.
    pub start_height: i32,
    /// False asks the peer to withhold transaction relay until a filter is
    /// loaded. Absent on ancient peers, in which case it defaults to true.
    pub relay: bool,
}

impl VersionMessage {
    /// Builds a handshake toward `receiver` with this node's defaults:
    /// current protocol version, full default service bits, the current
    /// time, a fresh random nonce, and the crate's user agent.
    pub fn new(receiver: SocketAddr, start_height: i32) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or(0);
        Self {
            version: PROTOCOL_VERSION,
            services: DEFAULT_SERVICES,
            timestamp,
            receiver: NetworkAddress::new(DEFAULT_SERVICES, receiver),
            sender: NetworkAddress::unroutable(),
            nonce: rand::random(),
            user_agent: user_agent(),
            start_height,
            relay: true,
        }
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u32_le(self.version);
        writer.put_u64_le(self.services);
        writer.put_i64_le(self.timestamp);
        self.receiver.encode(writer);
        self.sender.encode(writer);
        writer.put_u64_le(self.nonce);
        writer.put_var_string(&self.user_agent);
        writer.put_i32_le(self.start_height);
        writer.put_u8(u8::from(self.relay));
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        let version = reader.read_u32_le()?;
        let services = reader.read_u64_le()?;
        let timestamp = reader.read_i64_le()?;
        let receiver = NetworkAddress::decode(reader)?;
        let sender = NetworkAddress::decode(reader)?;
        let nonce = reader.read_u64_le()?;
        let user_agent = reader.read_var_string()?;
        let start_height = reader.read_i32_le()?;
        // The one place trailing bytes are meaningful rather than malformed:
        // peers predating the relay flag simply stop here.
        let relay = if reader.is_finished() {
            true
        } else {
            reader.read_u8()? != 0
        };
        Ok(Self {
            version,
            services,
            timestamp,
            receiver,
            sender,
            nonce,
            user_agent,
            start_height,
            relay,
        })
    }
}

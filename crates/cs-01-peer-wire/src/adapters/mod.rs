pub mod connection;

pub use connection::PeerConnection;

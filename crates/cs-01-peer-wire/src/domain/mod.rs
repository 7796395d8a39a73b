//! Pure wire-protocol data structures: no I/O, no clocks, no sockets.

pub mod bloom;
pub mod buffer;
pub mod inventory;

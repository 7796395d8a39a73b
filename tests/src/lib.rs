//! # ChainScope Test Suite
//!
//! Unified test crate for flows that span crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── pipeline.rs   # Wire frame → decoded block → indexed queries
//!     └── reorg.rs      # Commit/disconnect properties across services
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All integration flows
//! cargo test -p cs-tests
//!
//! # One area
//! cargo test -p cs-tests integration::reorg::
//! ```

pub mod integration;

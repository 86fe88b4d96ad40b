//! Foundation types for Story Chain.
//!
//! Every other Story Chain crate depends on `story-types`.
//!
//! # Key Types
//!
//! - [`Address`]: 32-byte account location or public identity
//! - [`TitleSeed`]: SHA-256 digest of a node title, passed as an instruction argument
//! - [`UnixTimestamp`]: seconds since the UNIX epoch, as recorded on nodes

pub mod address;
pub mod error;
pub mod seed;

pub use address::Address;
pub use error::TypeError;
pub use seed::TitleSeed;

/// Seconds since the UNIX epoch (signed, matching the on-ledger layout).
pub type UnixTimestamp = i64;

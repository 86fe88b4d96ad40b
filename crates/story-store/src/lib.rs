//! Account storage for Story Chain.
//!
//! The ledger is a flat map from [`Address`](story_types::Address) to
//! [`Account`]. Story node accounts live at derived addresses and are never
//! removed; the only write path is an atomic batch commit.
//!
//! # Storage Backends
//!
//! All backends implement the [`AccountStore`] trait:
//!
//! - [`InMemoryAccountStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileAccountStore`] -- append-only, CRC-framed commit log replayed on open
//!
//! # Design Rules
//!
//! 1. A commit batch is applied entirely or not at all.
//! 2. Full scans return accounts in address order.
//! 3. The store never interprets account data.

pub mod account;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use account::Account;
pub use error::{StoreError, StoreResult};
pub use file::FileAccountStore;
pub use memory::InMemoryAccountStore;
pub use traits::AccountStore;

//! High-level SDK for Story Chain.
//!
//! Loads the story tree from an account store, selects a wallet, and mints
//! root and branch nodes through the program runtime.

pub mod client;
pub mod display;
pub mod error;
pub mod repository;
pub mod wallet;

pub use client::{inline_content_uri, MintReceipt, StoryClient};
pub use display::{branch_label, format_date};
pub use error::{SdkError, SdkResult};
pub use repository::{CounterMismatch, CounterReport, StoryTree};
pub use wallet::{select_wallet, EnvWallet, KeypairFileWallet, Wallet, WalletEnvironment};

// Re-export key types
pub use story_crypto::{Keypair, Signature};
pub use story_program::{Runtime, RuntimeConfig, StoryNode};
pub use story_types::Address;

//! Cryptographic primitives for Story Chain.
//!
//! Provides SHA-256 title seeds and type discriminators, deterministic
//! off-curve address derivation for story node accounts, and Ed25519 keys
//! for authors.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod derive;
pub mod hasher;
pub mod signer;

pub use derive::{AddressDeriver, DeriveError, NodeSeeds, NODE_NAMESPACE};
pub use hasher::{
    account_discriminator, instruction_discriminator, title_seed, verify_title_seed,
    Discriminator,
};
pub use signer::{verify_signature, Keypair, KeypairError, Signature, SignatureError};

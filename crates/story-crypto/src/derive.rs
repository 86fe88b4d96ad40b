//! Deterministic account address derivation.
//!
//! A story node's address is never assigned: it is computed from an ordered
//! list of seeds plus a one-byte salt (the "bump"). Each candidate is
//!
//! ```text
//! SHA-256(seed_0 || ... || seed_n || [bump] || program_id || "ProgramDerivedAddress")
//! ```
//!
//! and is accepted only if it is *not* a valid compressed Ed25519 point, so
//! no private key can ever sign for it. Bumps are tried from 255 downward;
//! the first viable one wins, which makes the result a pure function of the
//! seeds and the program id.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use story_types::{Address, TitleSeed};

/// First seed of every story node derivation.
pub const NODE_NAMESPACE: &[u8] = b"story-node";

/// Maximum number of seeds, counting the bump.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Errors from address derivation.
///
/// None of these are domain rejections: well-formed node seeds never
/// trigger them in practice.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeriveError {
    #[error("seed {index} is {len} bytes; at most {MAX_SEED_LEN} allowed")]
    MaxSeedLengthExceeded { index: usize, len: usize },

    #[error("{count} seeds given; at most {} allowed besides the bump", MAX_SEEDS - 1)]
    TooManySeeds { count: usize },

    #[error("candidate address for bump {bump} lies on the curve")]
    OnCurve { bump: u8 },

    #[error("no off-curve address found within {attempts} attempts")]
    NoViableBump { attempts: u16 },
}

/// Derives program-owned addresses for a fixed program id.
#[derive(Clone, Debug)]
pub struct AddressDeriver {
    program_id: Address,
    max_attempts: u16,
}

impl AddressDeriver {
    /// A deriver that may try every bump value.
    pub fn new(program_id: Address) -> Self {
        Self {
            program_id,
            max_attempts: 256,
        }
    }

    /// Cap the number of bump values tried (clamped to `1..=256`).
    pub fn with_max_attempts(mut self, attempts: u16) -> Self {
        self.max_attempts = attempts.clamp(1, 256);
        self
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// Find the address and bump for `seeds`.
    pub fn derive(&self, seeds: &[&[u8]]) -> Result<(Address, u8), DeriveError> {
        check_seeds(seeds)?;
        let mut bump = u8::MAX;
        for _ in 0..self.max_attempts {
            let candidate = self.candidate(seeds, bump);
            if !is_on_curve(&candidate) {
                return Ok((Address::new(candidate), bump));
            }
            bump = match bump.checked_sub(1) {
                Some(next) => next,
                None => break,
            };
        }
        Err(DeriveError::NoViableBump {
            attempts: self.max_attempts,
        })
    }

    /// Recompute the address for a known bump without searching.
    pub fn create_address(&self, seeds: &[&[u8]], bump: u8) -> Result<Address, DeriveError> {
        check_seeds(seeds)?;
        let candidate = self.candidate(seeds, bump);
        if is_on_curve(&candidate) {
            return Err(DeriveError::OnCurve { bump });
        }
        Ok(Address::new(candidate))
    }

    fn candidate(&self, seeds: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(self.program_id.as_bytes());
        hasher.update(PDA_MARKER);
        hasher.finalize().into()
    }
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), DeriveError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(DeriveError::TooManySeeds { count: seeds.len() });
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(DeriveError::MaxSeedLengthExceeded {
                index,
                len: seed.len(),
            });
        }
    }
    Ok(())
}

/// Whether `bytes` decode to a point on the Ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Seed layouts for story node accounts.
///
/// Roots: `["story-node", author, title_seed]`.
/// Branches: `["story-node", author, parent, title_seed]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeSeeds {
    Root {
        author: Address,
        title_seed: TitleSeed,
    },
    Branch {
        author: Address,
        parent: Address,
        title_seed: TitleSeed,
    },
}

impl NodeSeeds {
    pub fn root(author: Address, title_seed: TitleSeed) -> Self {
        Self::Root { author, title_seed }
    }

    pub fn branch(author: Address, parent: Address, title_seed: TitleSeed) -> Self {
        Self::Branch {
            author,
            parent,
            title_seed,
        }
    }

    /// The ordered seed slices.
    pub fn as_slices(&self) -> Vec<&[u8]> {
        match self {
            Self::Root { author, title_seed } => {
                vec![NODE_NAMESPACE, author.as_ref(), title_seed.as_ref()]
            }
            Self::Branch {
                author,
                parent,
                title_seed,
            } => vec![
                NODE_NAMESPACE,
                author.as_ref(),
                parent.as_ref(),
                title_seed.as_ref(),
            ],
        }
    }

    pub fn derive(&self, deriver: &AddressDeriver) -> Result<(Address, u8), DeriveError> {
        deriver.derive(&self.as_slices())
    }
}

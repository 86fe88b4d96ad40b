use story_crypto::{DeriveError, SignatureError};
use story_store::StoreError;
use story_types::Address;

use crate::codec::DecodeError;

/// Offset of the first program-defined error code.
pub const ERROR_CODE_OFFSET: u32 = 6000;

/// Domain rejections raised by the story program.
///
/// Codes and messages are part of the external interface and are surfaced
/// verbatim to callers. Code 6002 is reserved: an earlier program revision
/// used it for a separate image-URI length error, which is now reported as
/// [`StoryError::UriTooLong`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum StoryError {
    #[error("Title exceeds 64 characters")]
    TitleTooLong,
    #[error("Content URI exceeds 200 characters")]
    UriTooLong,
    #[error("Content URI cannot be empty")]
    EmptyUri,
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Title seed does not match SHA-256 of title")]
    InvalidTitleSeed,
}

impl StoryError {
    /// Every variant, in code order.
    pub const ALL: [StoryError; 5] = [
        Self::TitleTooLong,
        Self::UriTooLong,
        Self::EmptyUri,
        Self::Overflow,
        Self::InvalidTitleSeed,
    ];

    /// Stable numeric code.
    pub fn code(self) -> u32 {
        ERROR_CODE_OFFSET
            + match self {
                Self::TitleTooLong => 0,
                Self::UriTooLong => 1,
                Self::EmptyUri => 3,
                Self::Overflow => 4,
                Self::InvalidTitleSeed => 5,
            }
    }

    /// Stable error name.
    pub fn name(self) -> &'static str {
        match self {
            Self::TitleTooLong => "TitleTooLong",
            Self::UriTooLong => "UriTooLong",
            Self::EmptyUri => "EmptyUri",
            Self::Overflow => "Overflow",
            Self::InvalidTitleSeed => "InvalidTitleSeed",
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

/// Every way an instruction or transaction can be rejected.
///
/// [`ProgramError::Story`] carries domain rejections; the remaining
/// variants are account-level preconditions and substrate failures.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("{0}")]
    Story(#[from] StoryError),

    #[error("account {0} already in use")]
    AccountAlreadyInUse(Address),

    #[error("parent node {0} not found")]
    ParentNotFound(Address),

    #[error("account {0} is not a story node")]
    AccountNotStoryNode(Address),

    #[error("derived address {derived} does not match supplied account {supplied}")]
    SeedsConstraint { derived: Address, supplied: Address },

    #[error("account {0} must sign this instruction")]
    MissingSigner(Address),

    #[error("account {0} was not declared by the instruction")]
    UndeclaredAccount(Address),

    #[error("account {0} is not declared writable")]
    AccountNotWritable(Address),

    #[error("instruction expects {expected} accounts, got {actual}")]
    NotEnoughAccounts { expected: usize, actual: usize },

    #[error("instruction targets unknown program {0}")]
    UnknownProgram(Address),

    #[error("invalid instruction data: {0}")]
    InvalidInstructionData(#[from] DecodeError),

    #[error("transaction signature rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("address derivation failed: {0}")]
    Derive(#[from] DeriveError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ProgramError {
    /// Stable numeric code for errors a caller can act on.
    ///
    /// Framework-level codes follow the numbering of the ledger the program
    /// was first deployed on. Substrate failures (store, derivation,
    /// signature) have no code.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Story(e) => Some(e.code()),
            Self::AccountAlreadyInUse(_) => Some(0),
            Self::UnknownProgram(_) => Some(101),
            Self::InvalidInstructionData(_) => Some(102),
            Self::AccountNotWritable(_) => Some(2000),
            Self::SeedsConstraint { .. } => Some(2006),
            Self::AccountNotStoryNode(_) => Some(3002),
            Self::NotEnoughAccounts { .. } => Some(3005),
            Self::MissingSigner(_) => Some(3010),
            Self::ParentNotFound(_) => Some(3012),
            Self::UndeclaredAccount(_)
            | Self::Signature(_)
            | Self::Derive(_)
            | Self::Store(_) => None,
        }
    }

    /// The domain rejection, if this is one.
    pub fn story_error(&self) -> Option<StoryError> {
        match self {
            Self::Story(e) => Some(*e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_stable() {
        assert_eq!(StoryError::TitleTooLong.code(), 6000);
        assert_eq!(StoryError::UriTooLong.code(), 6001);
        assert_eq!(StoryError::EmptyUri.code(), 6003);
        assert_eq!(StoryError::Overflow.code(), 6004);
        assert_eq!(StoryError::InvalidTitleSeed.code(), 6005);
    }

    #[test]
    fn codes_are_unique_and_reversible() {
        let codes: HashSet<u32> = StoryError::ALL.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), StoryError::ALL.len());
        for e in StoryError::ALL {
            assert_eq!(StoryError::from_code(e.code()), Some(e));
        }
        assert_eq!(StoryError::from_code(6002), None);
    }

    #[test]
    fn messages_are_verbatim() {
        assert_eq!(StoryError::EmptyUri.to_string(), "Content URI cannot be empty");
        assert_eq!(
            ProgramError::from(StoryError::InvalidTitleSeed).to_string(),
            "Title seed does not match SHA-256 of title"
        );
    }

    #[test]
    fn program_error_exposes_story_code() {
        let err = ProgramError::from(StoryError::Overflow);
        assert_eq!(err.code(), Some(6004));
        assert_eq!(err.story_error(), Some(StoryError::Overflow));
        assert_eq!(ProgramError::ParentNotFound(Address::SENTINEL).story_error(), None);
    }
}

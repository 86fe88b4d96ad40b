use story_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("no wallet available: set STORY_SECRET_KEY or create a keypair file")]
    NoWallet,

    #[error("wallet {0} is not connected")]
    NotConnected(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("story node not found: {0}")]
    NodeNotFound(Address),

    #[error("keypair error: {0}")]
    Keypair(#[from] story_crypto::KeypairError),

    #[error("program error: {0}")]
    Program(#[from] story_program::ProgramError),

    #[error("store error: {0}")]
    Store(#[from] story_store::StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SdkResult<T> = Result<T, SdkError>;

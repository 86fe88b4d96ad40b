use serde::{Deserialize, Serialize};
use story_types::Address;

/// A ledger account: an owning program and opaque data bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Program allowed to write this account's data.
    pub owner: Address,
    /// Raw account data; layout is defined by the owner.
    pub data: Vec<u8>,
}

impl Account {
    pub fn new(owner: Address, data: Vec<u8>) -> Self {
        Self { owner, data }
    }

    pub fn is_owned_by(&self, program_id: &Address) -> bool {
        self.owner == *program_id
    }
}

use std::collections::BTreeMap;

use story_crypto::AddressDeriver;
use story_store::{Account, AccountStore};
use story_types::{Address, UnixTimestamp};

use crate::error::ProgramError;
use crate::instruction::AccountMeta;

/// Execution context for a single instruction.
///
/// Reads see writes staged earlier in the same transaction before falling
/// back to the store. Writes are staged only; the runtime commits the
/// whole transaction as one batch once every instruction succeeded.
pub struct InstructionContext<'a> {
    deriver: &'a AddressDeriver,
    store: &'a dyn AccountStore,
    accounts: &'a [AccountMeta],
    signers: &'a [Address],
    staged: &'a mut BTreeMap<Address, Account>,
    now: UnixTimestamp,
}

impl<'a> InstructionContext<'a> {
    pub fn new(
        deriver: &'a AddressDeriver,
        store: &'a dyn AccountStore,
        accounts: &'a [AccountMeta],
        signers: &'a [Address],
        staged: &'a mut BTreeMap<Address, Account>,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            deriver,
            store,
            accounts,
            signers,
            staged,
            now,
        }
    }

    pub fn program_id(&self) -> Address {
        self.deriver.program_id()
    }

    pub fn deriver(&self) -> &AddressDeriver {
        self.deriver
    }

    /// Timestamp recorded on nodes created by this instruction.
    pub fn now(&self) -> UnixTimestamp {
        self.now
    }

    /// The declared account at `index`.
    pub fn account(&self, index: usize) -> Result<&AccountMeta, ProgramError> {
        self.accounts.get(index).ok_or(ProgramError::NotEnoughAccounts {
            expected: index + 1,
            actual: self.accounts.len(),
        })
    }

    /// The declared account at `index`, which must have signed the
    /// enclosing transaction.
    pub fn signer(&self, index: usize) -> Result<Address, ProgramError> {
        let meta = self.account(index)?;
        if !meta.is_signer || !self.signers.contains(&meta.address) {
            return Err(ProgramError::MissingSigner(meta.address));
        }
        Ok(meta.address)
    }

    fn declared(&self, address: &Address) -> Result<&AccountMeta, ProgramError> {
        self.accounts
            .iter()
            .find(|meta| meta.address == *address)
            .ok_or(ProgramError::UndeclaredAccount(*address))
    }

    /// Read a declared account.
    pub fn load(&self, address: &Address) -> Result<Option<Account>, ProgramError> {
        self.declared(address)?;
        if let Some(account) = self.staged.get(address) {
            return Ok(Some(account.clone()));
        }
        Ok(self.store.get(address)?)
    }

    /// Stage a write to a declared writable account.
    pub fn stage(&mut self, address: Address, account: Account) -> Result<(), ProgramError> {
        if !self.declared(&address)?.is_writable {
            return Err(ProgramError::AccountNotWritable(address));
        }
        self.staged.insert(address, account);
        Ok(())
    }
}

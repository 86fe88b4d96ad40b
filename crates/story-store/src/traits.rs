use story_types::Address;

use crate::account::Account;
use crate::error::StoreResult;

/// Persistent account storage.
///
/// All implementations must satisfy these invariants:
/// - `commit` is atomic: after it returns `Ok`, every entry of the batch is
///   visible; after it returns `Err`, none is. Readers never observe a
///   partially applied batch.
/// - `scan` returns every stored account, ordered by address.
/// - Accounts are never deleted.
///
/// Scheduling of conflicting writers is the caller's concern; the store
/// only guarantees per-batch atomicity.
pub trait AccountStore: Send + Sync {
    /// Read an account. Returns `Ok(None)` if nothing is stored there.
    fn get(&self, address: &Address) -> StoreResult<Option<Account>>;

    /// Enumerate all accounts in address order.
    fn scan(&self) -> StoreResult<Vec<(Address, Account)>>;

    /// Atomically write a batch of accounts.
    fn commit(&self, writes: &[(Address, Account)]) -> StoreResult<()>;

    /// Check whether an account exists.
    fn exists(&self, address: &Address) -> StoreResult<bool> {
        Ok(self.get(address)?.is_some())
    }

    /// Enumerate the accounts owned by `program_id`.
    fn scan_owned(&self, program_id: &Address) -> StoreResult<Vec<(Address, Account)>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|(_, account)| account.is_owned_by(program_id))
            .collect())
    }
}

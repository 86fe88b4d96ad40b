use std::collections::BTreeMap;
use std::sync::RwLock;

use story_types::Address;

use crate::account::Account;
use crate::error::{StoreError, StoreResult};
use crate::traits::AccountStore;

/// In-memory, `BTreeMap`-based account store.
///
/// Intended for tests and embedding. A batch is applied under a single
/// write lock, so readers see all of it or none of it.
pub struct InMemoryAccountStore {
    accounts: RwLock<BTreeMap<Address, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of accounts currently stored.
    pub fn len(&self) -> usize {
        self.accounts.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, address: &Address) -> StoreResult<Option<Account>> {
        let map = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(address).cloned())
    }

    fn scan(&self) -> StoreResult<Vec<(Address, Account)>> {
        let map = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.iter().map(|(a, acc)| (*a, acc.clone())).collect())
    }

    fn commit(&self, writes: &[(Address, Account)]) -> StoreResult<()> {
        let mut map = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        for (address, account) in writes {
            map.insert(*address, account.clone());
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAccountStore")
            .field("account_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(owner: u8, data: &[u8]) -> Account {
        Account::new(Address::new([owner; 32]), data.to_vec())
    }

    #[test]
    fn commit_and_get() {
        let store = InMemoryAccountStore::new();
        let addr = Address::new([1; 32]);
        store.commit(&[(addr, acct(9, b"node"))]).unwrap();
        assert_eq!(store.get(&addr).unwrap(), Some(acct(9, b"node")));
        assert!(store.exists(&addr).unwrap());
    }

    #[test]
    fn missing_account_is_none() {
        let store = InMemoryAccountStore::new();
        assert_eq!(store.get(&Address::new([4; 32])).unwrap(), None);
        assert!(!store.exists(&Address::new([4; 32])).unwrap());
    }

    #[test]
    fn batch_writes_all_entries() {
        let store = InMemoryAccountStore::new();
        store
            .commit(&[
                (Address::new([2; 32]), acct(9, b"child")),
                (Address::new([1; 32]), acct(9, b"parent")),
            ])
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn later_commit_overwrites() {
        let store = InMemoryAccountStore::new();
        let addr = Address::new([1; 32]);
        store.commit(&[(addr, acct(9, b"v1"))]).unwrap();
        store.commit(&[(addr, acct(9, b"v2"))]).unwrap();
        assert_eq!(store.get(&addr).unwrap().unwrap().data, b"v2");
    }

    #[test]
    fn scan_is_address_ordered() {
        let store = InMemoryAccountStore::new();
        for b in [5u8, 1, 3] {
            store.commit(&[(Address::new([b; 32]), acct(9, &[b]))]).unwrap();
        }
        let keys: Vec<u8> = store
            .scan()
            .unwrap()
            .iter()
            .map(|(a, _)| a.as_bytes()[0])
            .collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn scan_owned_filters_by_program() {
        let store = InMemoryAccountStore::new();
        store
            .commit(&[
                (Address::new([1; 32]), acct(9, b"mine")),
                (Address::new([2; 32]), acct(8, b"other")),
            ])
            .unwrap();
        let owned = store.scan_owned(&Address::new([9; 32])).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].0, Address::new([1; 32]));
    }
}

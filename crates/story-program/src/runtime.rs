//! Transaction execution over an [`AccountStore`].
//!
//! The runtime verifies the transaction signature, locks every account the
//! transaction may write, runs each instruction against a shared staging
//! area, and commits the staged writes as one batch. Transactions touching
//! disjoint accounts run in parallel; overlapping ones are serialized.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use story_crypto::{verify_signature, AddressDeriver, Keypair, Signature, SignatureError};
use story_store::{Account, AccountStore, InMemoryAccountStore};
use story_types::{Address, UnixTimestamp};
use tracing::debug;

use crate::context::InstructionContext;
use crate::error::ProgramError;
use crate::instruction::Instruction;
use crate::processor::process_instruction;
use crate::state::StoryNode;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Program that owns every story node.
    pub program_id: Address,
    /// Upper bound on bump values tried per derivation.
    pub max_derivation_attempts: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            program_id: crate::ID,
            max_derivation_attempts: 256,
        }
    }
}

impl RuntimeConfig {
    pub fn deriver(&self) -> AddressDeriver {
        AddressDeriver::new(self.program_id).with_max_attempts(self.max_derivation_attempts)
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> UnixTimestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(at: UnixTimestamp) -> Self {
        Self(AtomicI64::new(at))
    }

    pub fn set(&self, at: UnixTimestamp) {
        self.0.store(at, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> UnixTimestamp {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// The signed portion of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub signer: Address,
    pub instructions: Vec<Instruction>,
}

impl Message {
    /// Deterministic byte form covered by the signature.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.signer.as_bytes());
        buf.extend_from_slice(&(self.instructions.len() as u32).to_le_bytes());
        for ix in &self.instructions {
            buf.extend_from_slice(ix.program_id.as_bytes());
            buf.extend_from_slice(&(ix.accounts.len() as u32).to_le_bytes());
            for meta in &ix.accounts {
                buf.extend_from_slice(meta.address.as_bytes());
                buf.push(u8::from(meta.is_signer) | (u8::from(meta.is_writable) << 1));
            }
            buf.extend_from_slice(&(ix.data.len() as u32).to_le_bytes());
            buf.extend_from_slice(&ix.data);
        }
        buf
    }

    /// Every account any instruction declares.
    pub fn declared_accounts(&self) -> BTreeSet<Address> {
        self.instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter().map(|meta| meta.address))
            .collect()
    }

    /// Accounts some instruction may write. Only these are locked, so an
    /// author's transactions against unrelated nodes do not serialize on
    /// the read-only signer account.
    pub fn writable_accounts(&self) -> BTreeSet<Address> {
        self.instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter())
            .filter(|meta| meta.is_writable)
            .map(|meta| meta.address)
            .collect()
    }
}

/// A message plus the signer's signature over it. The signature is the
/// transaction id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub message: Message,
    pub signature: Signature,
}

impl Transaction {
    pub fn sign(keypair: &Keypair, instructions: Vec<Instruction>) -> Self {
        let message = Message {
            signer: keypair.address(),
            instructions,
        };
        let signature = keypair.sign(&message.serialize());
        Self { message, signature }
    }

    pub fn signer(&self) -> Address {
        self.message.signer
    }

    pub fn verify(&self) -> Result<(), SignatureError> {
        verify_signature(&self.message.signer, &self.message.serialize(), &self.signature)
    }
}

// ---------------------------------------------------------------------------
// Account locks
// ---------------------------------------------------------------------------

/// Per-account write locks, acquired all at once.
#[derive(Default)]
pub struct AccountLocks {
    held: Mutex<BTreeSet<Address>>,
    released: Condvar,
}

impl AccountLocks {
    /// Block until none of `addresses` is held, then hold all of them.
    pub fn acquire(&self, addresses: BTreeSet<Address>) -> AccountLockGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while addresses.iter().any(|a| held.contains(a)) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.extend(addresses.iter().copied());
        AccountLockGuard {
            locks: self,
            addresses,
        }
    }

    /// Number of accounts currently locked.
    pub fn held(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Releases its accounts on drop.
pub struct AccountLockGuard<'a> {
    locks: &'a AccountLocks,
    addresses: BTreeSet<Address>,
}

impl Drop for AccountLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(PoisonError::into_inner);
        for address in &self.addresses {
            held.remove(address);
        }
        self.locks.released.notify_all();
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

pub struct Runtime {
    config: RuntimeConfig,
    deriver: AddressDeriver,
    store: Arc<dyn AccountStore>,
    clock: Arc<dyn Clock>,
    locks: AccountLocks,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, store: Arc<dyn AccountStore>, clock: Arc<dyn Clock>) -> Self {
        let deriver = config.deriver();
        Self {
            config,
            deriver,
            store,
            clock,
            locks: AccountLocks::default(),
        }
    }

    /// A runtime over a fresh in-memory store and the system clock.
    pub fn in_memory() -> Self {
        Self::new(
            RuntimeConfig::default(),
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn program_id(&self) -> Address {
        self.config.program_id
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Execute a transaction. On success every staged write is committed
    /// and the transaction id is returned; on failure nothing is written.
    pub fn execute(&self, tx: &Transaction) -> Result<Signature, ProgramError> {
        tx.verify()?;

        let _guard = self.locks.acquire(tx.message.writable_accounts());
        let signers = [tx.signer()];
        let now = self.clock.now();
        let mut staged = BTreeMap::new();

        for ix in &tx.message.instructions {
            let mut ctx = InstructionContext::new(
                &self.deriver,
                self.store.as_ref(),
                &ix.accounts,
                &signers,
                &mut staged,
                now,
            );
            process_instruction(&mut ctx, ix)?;
        }

        let writes: Vec<(Address, Account)> = staged.into_iter().collect();
        self.store.commit(&writes)?;
        debug!(
            signer = %tx.signer(),
            instructions = tx.message.instructions.len(),
            writes = writes.len(),
            "transaction committed"
        );
        Ok(tx.signature.clone())
    }

    /// Sign `instructions` with `keypair` and execute them.
    pub fn submit(
        &self,
        keypair: &Keypair,
        instructions: Vec<Instruction>,
    ) -> Result<Signature, ProgramError> {
        self.execute(&Transaction::sign(keypair, instructions))
    }

    pub fn fetch_account(&self, address: &Address) -> Result<Option<Account>, ProgramError> {
        Ok(self.store.get(address)?)
    }

    /// Load the story node at `address`, if one exists.
    pub fn fetch_node(&self, address: &Address) -> Result<Option<StoryNode>, ProgramError> {
        let Some(account) = self.store.get(address)? else {
            return Ok(None);
        };
        if !account.is_owned_by(&self.config.program_id) {
            return Err(ProgramError::AccountNotStoryNode(*address));
        }
        StoryNode::decode(&account.data)
            .map(Some)
            .map_err(|_| ProgramError::AccountNotStoryNode(*address))
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("locked_accounts", &self.locks.held())
            .finish()
    }
}

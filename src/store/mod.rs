//! # Collaborator Interfaces
//!
//! The engine consumes persistence as four narrow traits. Storage
//! technology is somebody else's problem; what these traits *do* pin down
//! is the concurrency contract, because that is where the money-losing
//! bugs live:
//!
//! - [`NonceLedger::reserve`] is a single atomic check-and-reserve. A
//!   lookup followed by a separate insert would be a race with two winners.
//! - [`WalletStore::commit`] applies a staged one- or two-wallet write
//!   all-or-nothing, and refuses it if any staged wallet's version is
//!   stale. No observer ever sees a debited sender next to an un-credited
//!   receiver.
//! - [`LedgerStore`] is append-only. Nothing updates, nothing deletes.
//!
//! Thread-safe in-memory reference implementations live alongside the
//! traits and are re-exported here.

mod memory;

pub use memory::{InMemoryDirectory, InMemoryLedger, InMemoryNonceLedger, InMemoryWalletStore};

use thiserror::Error;

use crate::ledger::{Account, AccountId, LedgerEntry, OfflineTransferRecord, Wallet};

// ---------------------------------------------------------------------------
// WalletCommit
// ---------------------------------------------------------------------------

/// A staged wallet write: the atomic unit of balance mutation.
///
/// Holds the updated snapshots the executor computed from a consistent
/// read. The store applies every wallet in the commit or none of them,
/// bumping each version, iff every staged version still matches the
/// stored one.
#[derive(Debug, Clone)]
pub struct WalletCommit {
    wallets: Vec<Wallet>,
}

impl WalletCommit {
    /// Stages a single-wallet write (deposit, withdrawal).
    pub fn single(wallet: Wallet) -> Self {
        Self {
            wallets: vec![wallet],
        }
    }

    /// Stages the debit + credit pair of a transfer.
    pub fn pair(debited: Wallet, credited: Wallet) -> Self {
        Self {
            wallets: vec![debited, credited],
        }
    }

    /// The staged wallets.
    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    /// Consumes the commit, yielding the staged wallets.
    pub fn into_wallets(self) -> Vec<Wallet> {
        self.wallets
    }
}

/// A commit was staged against a wallet version that has since moved on.
///
/// Not a caller-visible failure: the executor re-reads, re-checks every
/// precondition against the fresh balances, and stages a new commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wallet version conflict; reload and retry")]
pub struct CommitConflict;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Lookup and registration of accounts and their signing keys.
pub trait AccountDirectory: Send + Sync {
    /// Fetches an account by id.
    fn find_by_id(&self, id: &AccountId) -> Option<Account>;

    /// Fetches an account by its unique email.
    fn find_by_email(&self, email: &str) -> Option<Account>;

    /// Stores a newly registered account. Returns `false` if the email is
    /// already taken (and stores nothing).
    fn insert(&self, account: Account) -> bool;

    /// Sets or rotates an account's SPKI public key. Returns `false` if
    /// the account does not exist.
    fn set_public_key(&self, id: &AccountId, spki_b64: String) -> bool;
}

/// Wallet persistence with an all-or-nothing versioned commit.
pub trait WalletStore: Send + Sync {
    /// Fetches the wallet owned by an account.
    fn find_by_owner(&self, owner: &AccountId) -> Option<Wallet>;

    /// Stores a brand-new wallet (registration path).
    fn insert(&self, wallet: Wallet);

    /// Applies a staged commit atomically.
    ///
    /// Either every staged wallet is written (with its version bumped) or
    /// none are. Fails with [`CommitConflict`] if any staged wallet's
    /// version no longer matches the stored version.
    fn commit(&self, commit: WalletCommit) -> Result<(), CommitConflict>;
}

/// The append-only audit log and offline-settlement record book.
pub trait LedgerStore: Send + Sync {
    /// Appends one audit entry.
    fn append(&self, entry: LedgerEntry);

    /// Persists the record of an accepted offline transfer.
    fn record_offline(&self, record: OfflineTransferRecord);

    /// All entries where the account is sender or receiver, newest first.
    fn history_for(&self, account: &AccountId) -> Vec<LedgerEntry>;

    /// The settled offline transfer for a nonce, if any.
    fn find_offline_by_nonce(&self, nonce: &str) -> Option<OfflineTransferRecord>;
}

/// The global, monotonically growing set of used nonces.
pub trait NonceLedger: Send + Sync {
    /// Atomically reserves a nonce. Returns `true` if this call was the
    /// one that inserted it; `false` if it was already reserved. Under
    /// concurrency, exactly one caller per nonce ever sees `true`.
    fn reserve(&self, nonce: &str) -> bool;

    /// Rolls back a reservation whose submission was rejected downstream,
    /// so a failed attempt leaves no side effects. Never called for an
    /// accepted transfer — accepted nonces are permanent.
    fn release(&self, nonce: &str);

    /// Whether a nonce is currently reserved.
    fn contains(&self, nonce: &str) -> bool;
}

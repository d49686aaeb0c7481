//! Thread-safe in-memory reference implementations of the store traits.
//!
//! These are the real thing concurrency-wise — request workers may hit
//! them fully in parallel, so every structure here is a shared, contended
//! resource — but persistence-wise they are plain process memory. A
//! deployment that needs durability swaps these for database-backed
//! implementations of the same traits.

use std::collections::HashMap;

use dashmap::DashSet;
use parking_lot::RwLock;

use crate::ledger::{Account, AccountId, LedgerEntry, OfflineTransferRecord, Wallet};
use super::{
    AccountDirectory, CommitConflict, LedgerStore, NonceLedger, WalletCommit, WalletStore,
};

// ---------------------------------------------------------------------------
// InMemoryDirectory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DirectoryInner {
    by_id: HashMap<AccountId, Account>,
    id_by_email: HashMap<String, AccountId>,
}

/// In-memory [`AccountDirectory`] with a unique-email index.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<DirectoryInner>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountDirectory for InMemoryDirectory {
    fn find_by_id(&self, id: &AccountId) -> Option<Account> {
        self.inner.read().by_id.get(id).cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<Account> {
        let inner = self.inner.read();
        let id = inner.id_by_email.get(email)?;
        inner.by_id.get(id).cloned()
    }

    fn insert(&self, account: Account) -> bool {
        let mut inner = self.inner.write();
        if inner.id_by_email.contains_key(&account.email) {
            return false;
        }
        inner.id_by_email.insert(account.email.clone(), account.id);
        inner.by_id.insert(account.id, account);
        true
    }

    fn set_public_key(&self, id: &AccountId, spki_b64: String) -> bool {
        let mut inner = self.inner.write();
        match inner.by_id.get_mut(id) {
            Some(account) => {
                account.public_key = Some(spki_b64);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryWalletStore
// ---------------------------------------------------------------------------

/// In-memory [`WalletStore`] keyed by owner, with version-checked commits.
///
/// The whole map sits behind one `RwLock`; a commit holds the write lock
/// while it validates every staged version and applies every write, which
/// makes the two legs of a transfer a single indivisible step for any
/// reader.
#[derive(Default)]
pub struct InMemoryWalletStore {
    wallets: RwLock<HashMap<AccountId, Wallet>>,
}

impl InMemoryWalletStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WalletStore for InMemoryWalletStore {
    fn find_by_owner(&self, owner: &AccountId) -> Option<Wallet> {
        self.wallets.read().get(owner).cloned()
    }

    fn insert(&self, wallet: Wallet) {
        self.wallets.write().insert(wallet.owner, wallet);
    }

    fn commit(&self, commit: WalletCommit) -> Result<(), CommitConflict> {
        let mut wallets = self.wallets.write();

        // Validate every version before touching anything.
        for staged in commit.wallets() {
            match wallets.get(&staged.owner) {
                Some(stored) if stored.version == staged.version => {}
                _ => return Err(CommitConflict),
            }
        }

        for mut staged in commit.into_wallets() {
            staged.version += 1;
            wallets.insert(staged.owner, staged);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryLedger
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LedgerInner {
    entries: Vec<LedgerEntry>,
    offline_by_nonce: HashMap<String, OfflineTransferRecord>,
}

/// In-memory [`LedgerStore`]: an append-only entry log plus the offline
/// settlement records indexed by nonce.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerInner>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of audit entries, across all accounts.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

impl LedgerStore for InMemoryLedger {
    fn append(&self, entry: LedgerEntry) {
        self.inner.write().entries.push(entry);
    }

    fn record_offline(&self, record: OfflineTransferRecord) {
        self.inner
            .write()
            .offline_by_nonce
            .insert(record.nonce.clone(), record);
    }

    fn history_for(&self, account: &AccountId) -> Vec<LedgerEntry> {
        let inner = self.inner.read();
        let mut entries: Vec<LedgerEntry> = inner
            .entries
            .iter()
            .filter(|e| e.sender_id == *account || e.receiver_id == *account)
            .cloned()
            .collect();
        entries.reverse(); // newest first
        entries
    }

    fn find_offline_by_nonce(&self, nonce: &str) -> Option<OfflineTransferRecord> {
        self.inner.read().offline_by_nonce.get(nonce).cloned()
    }
}

// ---------------------------------------------------------------------------
// InMemoryNonceLedger
// ---------------------------------------------------------------------------

/// In-memory [`NonceLedger`] over a concurrent set.
///
/// `DashSet::insert` is the atomic check-and-reserve: it returns whether
/// the value was newly inserted, so two racing reservations of the same
/// nonce get exactly one `true` between them with no window where both
/// succeed.
#[derive(Default)]
pub struct InMemoryNonceLedger {
    used: DashSet<String>,
}

impl InMemoryNonceLedger {
    /// Creates an empty nonce set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reserved nonces.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// `true` if no nonce has ever been reserved.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

impl NonceLedger for InMemoryNonceLedger {
    fn reserve(&self, nonce: &str) -> bool {
        self.used.insert(nonce.to_string())
    }

    fn release(&self, nonce: &str) {
        self.used.remove(nonce);
    }

    fn contains(&self, nonce: &str) -> bool {
        self.used.contains(nonce)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Amount, EntryKind};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use uuid::Uuid;

    fn amount(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn directory_enforces_unique_email() {
        let dir = InMemoryDirectory::new();
        assert!(dir.insert(Account::new("Alice", "alice@example.com")));
        assert!(!dir.insert(Account::new("Imposter", "alice@example.com")));
        assert_eq!(dir.find_by_email("alice@example.com").unwrap().name, "Alice");
    }

    #[test]
    fn set_public_key_rotates() {
        let dir = InMemoryDirectory::new();
        let account = Account::new("Alice", "alice@example.com");
        let id = account.id;
        dir.insert(account);

        assert!(dir.set_public_key(&id, "key-one".to_string()));
        assert!(dir.set_public_key(&id, "key-two".to_string()));
        assert_eq!(
            dir.find_by_id(&id).unwrap().public_key.as_deref(),
            Some("key-two")
        );
        assert!(!dir.set_public_key(&Uuid::new_v4(), "orphan".to_string()));
    }

    #[test]
    fn commit_applies_both_wallets() {
        let store = InMemoryWalletStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert(Wallet::new(a).credited(amount(dec!(100))).unwrap());
        store.insert(Wallet::new(b));

        let wa = store.find_by_owner(&a).unwrap();
        let wb = store.find_by_owner(&b).unwrap();
        let commit = WalletCommit::pair(
            wa.debited(amount(dec!(40))).unwrap(),
            wb.credited(amount(dec!(40))).unwrap(),
        );
        store.commit(commit).unwrap();

        assert_eq!(store.find_by_owner(&a).unwrap().balance, amount(dec!(60)));
        assert_eq!(store.find_by_owner(&b).unwrap().balance, amount(dec!(40)));
    }

    #[test]
    fn commit_bumps_versions() {
        let store = InMemoryWalletStore::new();
        let owner = Uuid::new_v4();
        store.insert(Wallet::new(owner));

        let w = store.find_by_owner(&owner).unwrap();
        assert_eq!(w.version, 0);
        store
            .commit(WalletCommit::single(w.credited(amount(dec!(5))).unwrap()))
            .unwrap();
        assert_eq!(store.find_by_owner(&owner).unwrap().version, 1);
    }

    #[test]
    fn stale_commit_is_refused_entirely() {
        let store = InMemoryWalletStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert(Wallet::new(a).credited(amount(dec!(50))).unwrap());
        store.insert(Wallet::new(b));

        let stale_a = store.find_by_owner(&a).unwrap();
        let fresh_b = store.find_by_owner(&b).unwrap();

        // Another writer moves wallet A first.
        store
            .commit(WalletCommit::single(
                stale_a.debited(amount(dec!(10))).unwrap(),
            ))
            .unwrap();

        // The staged pair against the old version of A must not apply
        // either leg.
        let result = store.commit(WalletCommit::pair(
            stale_a.debited(amount(dec!(20))).unwrap(),
            fresh_b.credited(amount(dec!(20))).unwrap(),
        ));
        assert_eq!(result, Err(CommitConflict));
        assert_eq!(store.find_by_owner(&a).unwrap().balance, amount(dec!(40)));
        assert!(store.find_by_owner(&b).unwrap().balance.is_zero());
    }

    #[test]
    fn ledger_history_is_newest_first_and_scoped() {
        let ledger = InMemoryLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let first = LedgerEntry::completed(a, b, amount(dec!(1)), EntryKind::Online);
        let second = LedgerEntry::completed(b, a, amount(dec!(2)), EntryKind::Online);
        let unrelated = LedgerEntry::completed(c, c, amount(dec!(3)), EntryKind::Deposit);
        ledger.append(first.clone());
        ledger.append(second.clone());
        ledger.append(unrelated);

        let history = ledger.history_for(&a);
        assert_eq!(history, vec![second, first]);
    }

    #[test]
    fn offline_records_are_found_by_nonce() {
        let ledger = InMemoryLedger::new();
        let record = OfflineTransferRecord::completed(
            Uuid::new_v4(),
            Uuid::new_v4(),
            amount(dec!(9.99)),
            "nonce-77",
            "sig",
        );
        ledger.record_offline(record.clone());

        assert_eq!(ledger.find_offline_by_nonce("nonce-77"), Some(record));
        assert_eq!(ledger.find_offline_by_nonce("nonce-78"), None);
    }

    #[test]
    fn nonce_reserve_is_first_wins() {
        let nonces = InMemoryNonceLedger::new();
        assert!(nonces.reserve("n1"));
        assert!(!nonces.reserve("n1"));
        assert!(nonces.contains("n1"));

        nonces.release("n1");
        assert!(!nonces.contains("n1"));
        assert!(nonces.reserve("n1"));
    }

    #[test]
    fn concurrent_reservations_have_one_winner() {
        let nonces = Arc::new(InMemoryNonceLedger::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let nonces = Arc::clone(&nonces);
            handles.push(std::thread::spawn(move || nonces.reserve("contested")));
        }
        let winners: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
    }
}

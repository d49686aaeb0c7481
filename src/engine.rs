//! # Engine Facade
//!
//! One front door wiring the settlement pipeline to its collaborators.
//! Construct it over any [`store`](crate::store) implementations, or use
//! [`Engine::in_memory`] for the thread-safe reference stores.
//!
//! The registration and wallet-maintenance operations here are the
//! ordinary CRUD edges of the system; they exist because the settlement
//! core needs accounts with keys and wallets with balances to act on.
//! Session handling, password auth, and transport live outside the crate.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::EngineError;
use crate::ledger::{
    Account, AccountId, Amount, EntryKind, LedgerEntry, OfflineTransferRecord, Wallet,
};
use crate::settle::{
    OfflineSettlement, OfflineSubmission, SyncCoordinator, SyncReport, TransferExecutor,
};
use crate::store::{
    AccountDirectory, InMemoryDirectory, InMemoryLedger, InMemoryNonceLedger, InMemoryWalletStore,
    LedgerStore, NonceLedger, WalletStore,
};

/// The assembled settlement engine.
#[derive(Clone)]
pub struct Engine {
    directory: Arc<dyn AccountDirectory>,
    wallets: Arc<dyn WalletStore>,
    ledger: Arc<dyn LedgerStore>,
    executor: TransferExecutor,
    offline: OfflineSettlement,
    sync: SyncCoordinator,
}

impl Engine {
    /// Assembles an engine over the given collaborators.
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        wallets: Arc<dyn WalletStore>,
        ledger: Arc<dyn LedgerStore>,
        nonces: Arc<dyn NonceLedger>,
    ) -> Self {
        let executor =
            TransferExecutor::new(directory.clone(), wallets.clone(), ledger.clone());
        let offline = OfflineSettlement::new(
            directory.clone(),
            ledger.clone(),
            nonces,
            executor.clone(),
        );
        let sync = SyncCoordinator::new(offline.clone());
        Self {
            directory,
            wallets,
            ledger,
            executor,
            offline,
            sync,
        }
    }

    /// An engine over the in-memory reference stores. The usual choice
    /// for tests and single-process deployments.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDirectory::new()),
            Arc::new(InMemoryWalletStore::new()),
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryNonceLedger::new()),
        )
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Registers a new account with a zero-balance wallet.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmailTaken`] if the email is already registered.
    pub fn register_account(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Account, EngineError> {
        let account = Account::new(name, email);
        if !self.directory.insert(account.clone()) {
            return Err(EngineError::EmailTaken(account.email));
        }
        self.wallets.insert(Wallet::new(account.id));
        info!(account = %account.id, "account registered");
        Ok(account)
    }

    /// Sets or rotates an account's SPKI public key.
    ///
    /// Transfers signed with the previous key stop verifying from this
    /// point on; already-settled records are unaffected.
    pub fn register_public_key(
        &self,
        account: AccountId,
        spki_b64: String,
    ) -> Result<(), EngineError> {
        if !self.directory.set_public_key(&account, spki_b64) {
            return Err(EngineError::AccountNotFound(account));
        }
        info!(%account, "public key registered");
        Ok(())
    }

    /// Fetches an account by email (login-adjacent lookup).
    pub fn find_account_by_email(&self, email: &str) -> Option<Account> {
        self.directory.find_by_email(email)
    }

    // -----------------------------------------------------------------------
    // Balances and history
    // -----------------------------------------------------------------------

    /// The current balance of an account's wallet.
    pub fn balance_of(&self, account: AccountId) -> Result<Amount, EngineError> {
        self.wallets
            .find_by_owner(&account)
            .map(|w| w.balance)
            .ok_or(EngineError::WalletNotFound(account))
    }

    /// Audit entries involving the account, newest first.
    pub fn history_for(&self, account: AccountId) -> Vec<LedgerEntry> {
        self.ledger.history_for(&account)
    }

    /// The settled offline transfer for a nonce, if any.
    pub fn find_offline_by_nonce(&self, nonce: &str) -> Option<OfflineTransferRecord> {
        self.ledger.find_offline_by_nonce(nonce)
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Direct online transfer between two accounts.
    pub fn transfer(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
    ) -> Result<LedgerEntry, EngineError> {
        let amount = Amount::new(amount)?;
        self.executor.execute(sender, receiver, amount, EntryKind::Online)
    }

    /// Credits external funds into an account's wallet.
    pub fn deposit(
        &self,
        account: AccountId,
        amount: Decimal,
    ) -> Result<LedgerEntry, EngineError> {
        let amount = Amount::new(amount)?;
        self.executor.deposit(account, amount)
    }

    /// Debits funds out of an account's wallet.
    pub fn withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
    ) -> Result<LedgerEntry, EngineError> {
        let amount = Amount::new(amount)?;
        self.executor.withdraw(account, amount)
    }

    // -----------------------------------------------------------------------
    // Offline settlement
    // -----------------------------------------------------------------------

    /// Verifies and settles a single offline submission, returning the
    /// persisted record.
    pub fn verify_offline_transfer(
        &self,
        submission: &OfflineSubmission,
    ) -> Result<OfflineTransferRecord, EngineError> {
        self.offline.submit(submission)
    }

    /// Replays a batch of offline submissions, isolating per-item
    /// failures. Always succeeds at the envelope level; per-item outcomes
    /// are in the report.
    pub fn sync_offline_transfers(&self, items: &[OfflineSubmission]) -> SyncReport {
        self.sync.sync_all(items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

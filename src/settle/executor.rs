//! # Transfer Executor
//!
//! The only code in the system that moves money. Every path (online
//! transfer, offline settlement, deposit, withdrawal) funnels into the
//! same precondition checks and the same atomic commit.
//!
//! ## Concurrency
//!
//! Balance mutation is optimistic: the executor reads the wallets, checks
//! every precondition, stages the debit + credit against the versions it
//! read, and asks the store to commit. If another transfer touched either
//! wallet in between, the commit is refused and the executor starts over
//! from a fresh read, so the insufficient-balance check always ran
//! against the balance that was actually committed. Two concurrent
//! transfers draining the same wallet serialize into one success and one
//! `InsufficientBalance`; the classic read-then-write lost-update
//! double-spend cannot happen.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::EngineError;
use crate::ledger::{AccountId, Amount, EntryKind, LedgerEntry};
use crate::store::{AccountDirectory, LedgerStore, WalletCommit, WalletStore};

/// Executes double-entry transfers against the wallet store.
#[derive(Clone)]
pub struct TransferExecutor {
    directory: Arc<dyn AccountDirectory>,
    wallets: Arc<dyn WalletStore>,
    ledger: Arc<dyn LedgerStore>,
}

impl TransferExecutor {
    /// Wires an executor to its collaborators.
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        wallets: Arc<dyn WalletStore>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        Self {
            directory,
            wallets,
            ledger,
        }
    }

    /// Moves `amount` from `sender` to `receiver` and appends one audit
    /// entry.
    ///
    /// Preconditions, first failure wins: sender ≠ receiver, amount > 0
    /// (re-checked here even though input validation ran earlier), both
    /// accounts exist, both wallets exist, sender balance covers the
    /// amount. On success the debit and credit are applied as one
    /// indivisible commit; the audit entry is appended after the commit,
    /// so an entry never exists without its balance movement.
    pub fn execute(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: Amount,
        kind: EntryKind,
    ) -> Result<LedgerEntry, EngineError> {
        if sender == receiver {
            return Err(EngineError::SelfTransfer);
        }
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }
        if self.directory.find_by_id(&sender).is_none() {
            return Err(EngineError::SenderNotFound(sender));
        }
        if self.directory.find_by_id(&receiver).is_none() {
            return Err(EngineError::ReceiverNotFound(receiver));
        }

        loop {
            let sender_wallet = self
                .wallets
                .find_by_owner(&sender)
                .ok_or(EngineError::WalletNotFound(sender))?;
            let receiver_wallet = self
                .wallets
                .find_by_owner(&receiver)
                .ok_or(EngineError::WalletNotFound(receiver))?;

            let debited = sender_wallet.debited(amount)?;
            let credited = receiver_wallet.credited(amount)?;

            match self.wallets.commit(WalletCommit::pair(debited, credited)) {
                Ok(()) => break,
                Err(_) => {
                    // A concurrent commit moved one of the wallets.
                    // Re-read and re-check everything against the fresh
                    // balances.
                    debug!(%sender, %receiver, "wallet commit conflict, retrying");
                    continue;
                }
            }
        }

        let entry = LedgerEntry::completed(sender, receiver, amount, kind);
        self.ledger.append(entry.clone());
        info!(%sender, %receiver, amount = %amount, kind = %kind, "transfer settled");
        Ok(entry)
    }

    /// Credits external funds into an account's wallet.
    ///
    /// Recorded as a `Deposit` self-entry (sender == receiver), so external
    /// funding shows up in history like any other entry.
    pub fn deposit(&self, account: AccountId, amount: Amount) -> Result<LedgerEntry, EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "deposit amount must be positive".to_string(),
            ));
        }
        if self.directory.find_by_id(&account).is_none() {
            return Err(EngineError::AccountNotFound(account));
        }

        loop {
            let wallet = self
                .wallets
                .find_by_owner(&account)
                .ok_or(EngineError::WalletNotFound(account))?;
            let credited = wallet.credited(amount)?;
            match self.wallets.commit(WalletCommit::single(credited)) {
                Ok(()) => break,
                Err(_) => {
                    debug!(%account, "deposit commit conflict, retrying");
                    continue;
                }
            }
        }

        let entry = LedgerEntry::completed(account, account, amount, EntryKind::Deposit);
        self.ledger.append(entry.clone());
        info!(%account, amount = %amount, "deposit settled");
        Ok(entry)
    }

    /// Debits funds out of an account's wallet.
    ///
    /// Same balance check and optimistic retry as a transfer debit.
    /// Recorded as a `Withdrawal` self-entry.
    pub fn withdraw(&self, account: AccountId, amount: Amount) -> Result<LedgerEntry, EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "withdrawal amount must be positive".to_string(),
            ));
        }
        if self.directory.find_by_id(&account).is_none() {
            return Err(EngineError::AccountNotFound(account));
        }

        loop {
            let wallet = self
                .wallets
                .find_by_owner(&account)
                .ok_or(EngineError::WalletNotFound(account))?;
            let debited = wallet.debited(amount)?;
            match self.wallets.commit(WalletCommit::single(debited)) {
                Ok(()) => break,
                Err(_) => {
                    debug!(%account, "withdrawal commit conflict, retrying");
                    continue;
                }
            }
        }

        let entry = LedgerEntry::completed(account, account, amount, EntryKind::Withdrawal);
        self.ledger.append(entry.clone());
        info!(%account, amount = %amount, "withdrawal settled");
        Ok(entry)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Core record types for accounts, wallets, and the audit trail.
//!
//! These are the nouns of the settlement engine. They are deliberately
//! dumb: no behavior beyond construction helpers, no hidden loading.
//! Everything that mutates them lives in [`settle`](crate::settle).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Amount;

/// Account identifier. Rendered lowercase-hyphenated in signature payloads,
/// which is `Uuid`'s default `Display` and matches the offline signer.
pub type AccountId = Uuid;

// ---------------------------------------------------------------------------
// TransferStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a transfer.
///
/// In practice only `Completed` is ever persisted: rejected submissions
/// leave zero side effects, so nothing with `Rejected` reaches a store.
/// The variant exists because the wire format and clients speak it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Created but not yet settled.
    Pending,
    /// Settled; balances moved.
    Completed,
    /// Refused by verification or execution.
    Rejected,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

// ---------------------------------------------------------------------------
// EntryKind
// ---------------------------------------------------------------------------

/// Which path produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Direct transfer made while both parties were online.
    Online,
    /// Offline-signed transfer settled through the verification pipeline.
    Offline,
    /// Funds added from outside; recorded as a self-entry.
    Deposit,
    /// Funds removed to outside; recorded as a self-entry.
    Withdrawal,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Offline => write!(f, "OFFLINE"),
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A registered identity.
///
/// The public key is the SPKI DER of a P-256 verifying key, base64-encoded
/// exactly as the client exported it. It is optional until the device
/// registers one, and may be rotated. Verification fails closed while it
/// is absent or blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier; appears verbatim in signature payloads.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Unique login email.
    pub email: String,
    /// Base64-encoded SPKI public key, if one has been registered.
    pub public_key: Option<String>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with no public key.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            public_key: None,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// The single wallet owned by an account.
///
/// `version` is the optimistic-concurrency token: every committed write
/// bumps it, and a commit staged against a stale version is refused by the
/// store. The executor re-reads and re-checks on conflict, so the
/// insufficient-balance check is never evaluated against a stale balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet identifier.
    pub id: Uuid,
    /// Owning account (1:1).
    pub owner: AccountId,
    /// Current balance. Never negative at any observable point.
    pub balance: Amount,
    /// Optimistic-concurrency version; bumped by the store on commit.
    pub version: u64,
    /// Timestamp of the last committed mutation.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a zero-balance wallet for an owner.
    pub fn new(owner: AccountId) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            balance: Amount::ZERO,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Returns a copy with `amount` added to the balance.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::InvalidAmount`] on arithmetic overflow.
    pub fn credited(&self, amount: Amount) -> Result<Wallet, crate::EngineError> {
        let balance = self.balance.checked_add(amount).ok_or_else(|| {
            crate::EngineError::InvalidAmount("balance overflow on credit".to_string())
        })?;
        Ok(Wallet {
            balance,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Returns a copy with `amount` subtracted from the balance.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::InsufficientBalance`] if the balance does not
    /// cover the amount.
    pub fn debited(&self, amount: Amount) -> Result<Wallet, crate::EngineError> {
        let balance = self.balance.checked_sub(amount).ok_or(
            crate::EngineError::InsufficientBalance {
                available: self.balance,
                requested: amount,
            },
        )?;
        Ok(Wallet {
            balance,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }
}

// ---------------------------------------------------------------------------
// OfflineTransferRecord
// ---------------------------------------------------------------------------

/// The durable record of an accepted offline transfer.
///
/// Written exactly once per accepted nonce, never updated, never deleted.
/// It is simultaneously the settlement receipt returned to the submitter
/// and the permanent half of the replay defense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineTransferRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Paying account.
    pub sender_id: AccountId,
    /// Receiving account.
    pub receiver_id: AccountId,
    /// Settled amount.
    pub amount: Amount,
    /// The single-use token that made this submission unique.
    pub nonce: String,
    /// The base64 signature exactly as submitted; kept for audit.
    pub signature: String,
    /// Always `Completed` for persisted records.
    pub status: TransferStatus,
    /// When the engine settled the transfer.
    pub synced_at: DateTime<Utc>,
}

impl OfflineTransferRecord {
    /// Builds the completed record for an accepted submission.
    pub fn completed(
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
        nonce: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            amount,
            nonce: nonce.into(),
            signature: signature.into(),
            status: TransferStatus::Completed,
            synced_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerEntry
// ---------------------------------------------------------------------------

/// One line of the append-only audit log.
///
/// Every successful transfer (online, offline, deposit, withdrawal)
/// produces exactly one entry. Deposits and withdrawals appear as
/// self-entries (`sender_id == receiver_id`), so every balance movement
/// in the system is visible through the same log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Debited account.
    pub sender_id: AccountId,
    /// Credited account.
    pub receiver_id: AccountId,
    /// Moved amount.
    pub amount: Amount,
    /// Settlement status; always `Completed` when appended.
    pub status: TransferStatus,
    /// Which path produced this entry.
    pub kind: EntryKind,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Builds a completed entry.
    pub fn completed(
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
        kind: EntryKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            amount,
            status: TransferStatus::Completed,
            kind,
            created_at: Utc::now(),
        }
    }

    /// `true` for deposit/withdrawal self-entries.
    pub fn is_self_entry(&self) -> bool {
        self.sender_id == self.receiver_id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn status_display_matches_wire_format() {
        assert_eq!(TransferStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(EntryKind::Offline.to_string(), "OFFLINE");
        assert_eq!(EntryKind::Withdrawal.to_string(), "WITHDRAWAL");
    }

    #[test]
    fn new_wallet_starts_empty_at_version_zero() {
        let wallet = Wallet::new(Uuid::new_v4());
        assert!(wallet.balance.is_zero());
        assert_eq!(wallet.version, 0);
    }

    #[test]
    fn credit_and_debit_are_pure() {
        let wallet = Wallet::new(Uuid::new_v4());
        let credited = wallet.credited(amount(dec!(10))).unwrap();
        assert!(wallet.balance.is_zero());
        assert_eq!(credited.balance, amount(dec!(10)));

        let debited = credited.debited(amount(dec!(4.5))).unwrap();
        assert_eq!(debited.balance, amount(dec!(5.5)));
    }

    #[test]
    fn debit_past_zero_reports_both_sides() {
        let wallet = Wallet::new(Uuid::new_v4())
            .credited(amount(dec!(3)))
            .unwrap();
        let err = wallet.debited(amount(dec!(3.01))).unwrap_err();
        assert_eq!(
            err,
            crate::EngineError::InsufficientBalance {
                available: amount(dec!(3)),
                requested: amount(dec!(3.01)),
            }
        );
    }

    #[test]
    fn deposit_entries_are_self_entries() {
        let id = Uuid::new_v4();
        let entry = LedgerEntry::completed(id, id, amount(dec!(20)), EntryKind::Deposit);
        assert!(entry.is_self_entry());
        assert_eq!(entry.status, TransferStatus::Completed);
    }

    #[test]
    fn offline_record_serde_roundtrip() {
        let record = OfflineTransferRecord::completed(
            Uuid::new_v4(),
            Uuid::new_v4(),
            amount(dec!(12.34)),
            "nonce-1",
            "c2lnbmF0dXJl",
        );
        let json = serde_json::to_string(&record).unwrap();
        let recovered: OfflineTransferRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, recovered);
    }
}

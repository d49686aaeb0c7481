//! Error taxonomy for the settlement engine.
//!
//! Every failure the engine can report is a named kind here. Callers branch
//! on the variant, never on message text. All of these are recoverable by
//! the caller; none are fatal to the process, and none are retried
//! automatically — a client that wants a retry re-submits in a later sync
//! batch, idempotently guarded by nonce uniqueness.

use thiserror::Error;

use crate::ledger::{AccountId, Amount};

/// Errors surfaced by settlement operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The nonce has already been reserved by an accepted transfer.
    ///
    /// This is the replay defense firing: a signed payload replayed
    /// verbatim re-verifies perfectly, so the nonce set is the only thing
    /// standing between an attacker and a double settlement.
    #[error("nonce {nonce} already used (replay detected)")]
    ReplayDetected {
        /// The offending nonce.
        nonce: String,
    },

    /// Signature verification failed, or the sender has no registered key.
    ///
    /// Intentionally carries no detail — we don't tell forgers which part
    /// of their submission was wrong.
    #[error("digital signature verification failed")]
    SignatureInvalid,

    /// Sender and receiver are the same account.
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// The sender account does not exist.
    #[error("sender account {0} not found")]
    SenderNotFound(AccountId),

    /// The receiver account does not exist.
    #[error("receiver account {0} not found")]
    ReceiverNotFound(AccountId),

    /// An account lookup on a CRUD edge (deposit, withdraw, key rotation)
    /// found nothing.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// An account exists but has no wallet. Should be impossible for
    /// accounts created through [`Engine::register_account`], which creates
    /// the two together.
    ///
    /// [`Engine::register_account`]: crate::engine::Engine::register_account
    #[error("no wallet for account {0}")]
    WalletNotFound(AccountId),

    /// The sender's balance does not cover the requested amount.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Balance at the time of the (serialized) check.
        available: Amount,
        /// Amount the transfer asked for.
        requested: Amount,
    },

    /// The amount is not a valid ledger amount (non-positive, too many
    /// fractional digits, or out of range).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A required submission field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Registration with an email that is already taken.
    #[error("email {0} is already registered")]
    EmailTaken(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn messages_name_the_offending_nonce() {
        let err = EngineError::ReplayDetected {
            nonce: "abc-123".to_string(),
        };
        assert!(err.to_string().contains("abc-123"));
    }

    #[test]
    fn signature_error_carries_no_detail() {
        let err = EngineError::SignatureInvalid;
        assert_eq!(err.to_string(), "digital signature verification failed");
    }

    #[test]
    fn kinds_are_comparable() {
        let id = Uuid::new_v4();
        assert_eq!(
            EngineError::SenderNotFound(id),
            EngineError::SenderNotFound(id)
        );
        assert_ne!(
            EngineError::SenderNotFound(id),
            EngineError::ReceiverNotFound(id)
        );
    }
}

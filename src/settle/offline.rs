//! # Offline Transfer Settlement
//!
//! The per-submission pipeline. A submission was created and signed while
//! the payer's device was offline; by the time it arrives here it could be
//! legitimate, forged, tampered with, or a byte-for-byte replay of
//! something already settled. The pipeline runs the cheap rejections
//! first:
//!
//! 1. **Shape** — all five fields present, amount a valid positive ledger
//!    amount. No store is touched.
//! 2. **Nonce** — atomic reservation; a replay fails here even though its
//!    signature would re-verify perfectly.
//! 3. **Signature** — canonical payload rebuilt and checked against the
//!    sender's registered key. Stateless; fails closed.
//! 4. **Execution** — the atomic debit + credit via the executor.
//! 5. **Record** — the durable [`OfflineTransferRecord`] is written and
//!    returned as the settlement receipt.
//!
//! If anything after step 2 rejects the submission, the nonce reservation
//! is rolled back: a rejected submission leaves zero persisted side
//! effects, and the client may legitimately fix and re-submit under the
//! same nonce. An accepted nonce is permanent.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::crypto::{canonical_payload, verify_signature};
use crate::error::EngineError;
use crate::ledger::{AccountId, Amount, EntryKind, OfflineTransferRecord};
use crate::store::{AccountDirectory, LedgerStore, NonceLedger};

use super::TransferExecutor;

// ---------------------------------------------------------------------------
// OfflineSubmission
// ---------------------------------------------------------------------------

/// An offline-signed transfer as submitted by the payee's device.
///
/// All five fields are required. `amount` arrives as a raw decimal and is
/// validated into a ledger [`Amount`] by the pipeline; `nonce` and
/// `signature` are opaque strings produced by the signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineSubmission {
    /// The paying account, as embedded in the signed payload.
    pub sender_id: AccountId,
    /// The receiving account.
    pub receiver_id: AccountId,
    /// Transfer amount; positive, at most 2 fractional digits.
    pub amount: Decimal,
    /// Single-use token chosen by the signer.
    pub nonce: String,
    /// Base64 raw (r‖s) ECDSA signature over the canonical payload.
    pub signature: String,
}

// ---------------------------------------------------------------------------
// OfflineSettlement
// ---------------------------------------------------------------------------

/// Settles individual offline submissions through the full pipeline.
#[derive(Clone)]
pub struct OfflineSettlement {
    directory: Arc<dyn AccountDirectory>,
    ledger: Arc<dyn LedgerStore>,
    nonces: Arc<dyn NonceLedger>,
    executor: TransferExecutor,
}

impl OfflineSettlement {
    /// Wires the pipeline to its collaborators.
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        ledger: Arc<dyn LedgerStore>,
        nonces: Arc<dyn NonceLedger>,
        executor: TransferExecutor,
    ) -> Self {
        Self {
            directory,
            ledger,
            nonces,
            executor,
        }
    }

    /// Verifies and settles one offline submission.
    ///
    /// Returns the persisted record on success. On any rejection the
    /// specific [`EngineError`] kind is surfaced and nothing remains
    /// behind: no balance change, no ledger entry, no record, no nonce.
    pub fn submit(&self, submission: &OfflineSubmission) -> Result<OfflineTransferRecord, EngineError> {
        let amount = Self::validate(submission)?;

        // The reservation is the replay linearization point: of two
        // concurrent submissions of the same nonce, exactly one gets past
        // this line.
        if !self.nonces.reserve(&submission.nonce) {
            return Err(EngineError::ReplayDetected {
                nonce: submission.nonce.clone(),
            });
        }

        match self.settle_reserved(submission, amount) {
            Ok(record) => Ok(record),
            Err(err) => {
                self.nonces.release(&submission.nonce);
                Err(err)
            }
        }
    }

    /// Shape validation; touches no store.
    fn validate(submission: &OfflineSubmission) -> Result<Amount, EngineError> {
        if submission.nonce.trim().is_empty() {
            return Err(EngineError::MissingField("nonce"));
        }
        if submission.signature.trim().is_empty() {
            return Err(EngineError::MissingField("signature"));
        }
        let amount = Amount::new(submission.amount)?;
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }
        Ok(amount)
    }

    /// The pipeline stages after the nonce reservation. Any `Err` from
    /// here makes the caller roll the reservation back.
    fn settle_reserved(
        &self,
        submission: &OfflineSubmission,
        amount: Amount,
    ) -> Result<OfflineTransferRecord, EngineError> {
        let sender = self
            .directory
            .find_by_id(&submission.sender_id)
            .ok_or(EngineError::SenderNotFound(submission.sender_id))?;

        let payload = canonical_payload(
            &submission.sender_id,
            &submission.receiver_id,
            &amount,
            &submission.nonce,
        );

        let verified = match sender.public_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                verify_signature(key, &payload, &submission.signature)
            }
            _ => {
                // No registered key: fail closed, never "assume valid".
                warn!(sender = %submission.sender_id, "sender has no registered public key");
                false
            }
        };
        if !verified {
            return Err(EngineError::SignatureInvalid);
        }

        let entry = self.executor.execute(
            submission.sender_id,
            submission.receiver_id,
            amount,
            EntryKind::Offline,
        )?;

        let record = OfflineTransferRecord::completed(
            submission.sender_id,
            submission.receiver_id,
            amount,
            submission.nonce.clone(),
            submission.signature.clone(),
        );
        self.ledger.record_offline(record.clone());
        info!(
            nonce = %record.nonce,
            entry = %entry.id,
            "offline transfer settled"
        );
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::ledger::TransferStatus;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use p256::ecdsa::{signature::Signer, Signature, SigningKey};
    use p256::pkcs8::EncodePublicKey;
    use rand_core::OsRng;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn keypair() -> (SigningKey, String) {
        let signing_key = SigningKey::random(&mut OsRng);
        let spki = signing_key
            .verifying_key()
            .to_public_key_der()
            .expect("spki export");
        (signing_key, BASE64.encode(spki.as_bytes()))
    }

    fn signed_submission(
        key: &SigningKey,
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
        nonce: &str,
    ) -> OfflineSubmission {
        let payload = canonical_payload(
            &sender,
            &receiver,
            &Amount::new(amount).unwrap(),
            nonce,
        );
        let signature: Signature = key.sign(&payload);
        OfflineSubmission {
            sender_id: sender,
            receiver_id: receiver,
            amount,
            nonce: nonce.to_string(),
            signature: BASE64.encode(signature.to_bytes()),
        }
    }

    struct World {
        engine: Engine,
        alice: AccountId,
        bob: AccountId,
        alice_key: SigningKey,
    }

    fn world() -> World {
        let engine = Engine::in_memory();
        let alice = engine.register_account("Alice", "alice@example.com").unwrap().id;
        let bob = engine.register_account("Bob", "bob@example.com").unwrap().id;
        engine.deposit(alice, dec!(100)).unwrap();

        let (alice_key, alice_spki) = keypair();
        engine.register_public_key(alice, alice_spki).unwrap();

        World {
            engine,
            alice,
            bob,
            alice_key,
        }
    }

    #[test]
    fn valid_submission_settles_and_returns_record() {
        let w = world();
        let sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(40), "n-1");

        let record = w.engine.verify_offline_transfer(&sub).unwrap();
        assert_eq!(record.status, TransferStatus::Completed);
        assert_eq!(record.nonce, "n-1");
        assert_eq!(w.engine.balance_of(w.alice).unwrap().as_decimal(), dec!(60));
        assert_eq!(w.engine.balance_of(w.bob).unwrap().as_decimal(), dec!(40));
    }

    #[test]
    fn replay_is_rejected_with_no_second_movement() {
        let w = world();
        let sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(10), "n-replay");

        w.engine.verify_offline_transfer(&sub).unwrap();
        let err = w.engine.verify_offline_transfer(&sub).unwrap_err();
        assert_eq!(
            err,
            EngineError::ReplayDetected {
                nonce: "n-replay".to_string()
            }
        );
        assert_eq!(w.engine.balance_of(w.alice).unwrap().as_decimal(), dec!(90));
        assert_eq!(w.engine.balance_of(w.bob).unwrap().as_decimal(), dec!(10));
    }

    #[test]
    fn tampered_amount_is_a_forgery() {
        let w = world();
        let mut sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(10), "n-tamper");
        sub.amount = dec!(90);

        assert_eq!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::SignatureInvalid
        );
        assert_eq!(w.engine.balance_of(w.alice).unwrap().as_decimal(), dec!(100));
    }

    #[test]
    fn rejected_submission_frees_its_nonce() {
        let w = world();
        let mut sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(10), "n-retry");
        sub.signature = BASE64.encode([0u8; 64]);
        assert_eq!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::SignatureInvalid
        );

        // A corrected submission under the same nonce must now succeed.
        let good = signed_submission(&w.alice_key, w.alice, w.bob, dec!(10), "n-retry");
        assert!(w.engine.verify_offline_transfer(&good).is_ok());
    }

    #[test]
    fn unregistered_key_fails_closed() {
        let w = world();
        let (bob_key, _) = keypair(); // Bob never registered a key.
        w.engine.deposit(w.bob, dec!(50)).unwrap();
        let sub = signed_submission(&bob_key, w.bob, w.alice, dec!(5), "n-nokey");

        assert_eq!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::SignatureInvalid
        );
        assert_eq!(w.engine.balance_of(w.bob).unwrap().as_decimal(), dec!(50));
    }

    #[test]
    fn unknown_sender_is_rejected_before_verification() {
        let w = world();
        let ghost = Uuid::new_v4();
        let sub = signed_submission(&w.alice_key, ghost, w.bob, dec!(5), "n-ghost");
        assert_eq!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::SenderNotFound(ghost)
        );
    }

    #[test]
    fn blank_nonce_and_signature_are_missing_fields() {
        let w = world();
        let mut sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(5), "n-blank");
        sub.nonce = "  ".to_string();
        assert_eq!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::MissingField("nonce")
        );

        let mut sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(5), "n-blank2");
        sub.signature = String::new();
        assert_eq!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::MissingField("signature")
        );
    }

    #[test]
    fn sub_cent_amount_is_rejected_at_the_boundary() {
        let w = world();
        let mut sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(5), "n-precision");
        sub.amount = dec!(5.005);
        assert!(matches!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::InvalidAmount(_)
        ));
    }

    #[test]
    fn insufficient_balance_surfaces_from_the_executor() {
        let w = world();
        let sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(100.01), "n-broke");
        assert!(matches!(
            w.engine.verify_offline_transfer(&sub).unwrap_err(),
            EngineError::InsufficientBalance { .. }
        ));
        assert_eq!(w.engine.balance_of(w.alice).unwrap().as_decimal(), dec!(100));
    }

    #[test]
    fn record_is_durable_and_found_by_nonce() {
        let w = world();
        let sub = signed_submission(&w.alice_key, w.alice, w.bob, dec!(12.34), "n-durable");
        let record = w.engine.verify_offline_transfer(&sub).unwrap();
        assert_eq!(w.engine.find_offline_by_nonce("n-durable"), Some(record));
    }
}

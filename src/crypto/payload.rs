//! Deterministic reconstruction of the signed payload.
//!
//! Any divergence between the signer's and the verifier's rendering of a
//! single field breaks every valid signature, so the representation is
//! pinned precisely and tested byte-for-byte:
//!
//! ```text
//! {sender_id}:{receiver_id}:{amount}:{nonce}
//! ```
//!
//! UUIDs render lowercase-hyphenated, the amount renders in canonical
//! minimal-decimal form (see [`Amount::canonical`]), the nonce is taken
//! verbatim, and the whole string is encoded as UTF-8 bytes.

use crate::config::PAYLOAD_DELIMITER;
use crate::ledger::{AccountId, Amount};

/// Builds the canonical payload bytes for an offline transfer.
pub fn canonical_payload(
    sender_id: &AccountId,
    receiver_id: &AccountId,
    amount: &Amount,
    nonce: &str,
) -> Vec<u8> {
    let d = PAYLOAD_DELIMITER;
    format!(
        "{sender_id}{d}{receiver_id}{d}{amount}{d}{nonce}",
        amount = amount.canonical()
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn payload_is_pinned_byte_for_byte() {
        let sender = Uuid::parse_str("8f14e45f-ceea-467f-a8cb-9800abcdef01").unwrap();
        let receiver = Uuid::parse_str("c4ca4238-a0b9-4382-8dcc-509a6f75849b").unwrap();
        let amount = Amount::new(dec!(42.50)).unwrap();

        let payload = canonical_payload(&sender, &receiver, &amount, "nonce-xyz");
        assert_eq!(
            payload,
            b"8f14e45f-ceea-467f-a8cb-9800abcdef01:c4ca4238-a0b9-4382-8dcc-509a6f75849b:42.5:nonce-xyz"
                .to_vec()
        );
    }

    #[test]
    fn amount_spelling_does_not_change_the_payload() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let a = Amount::new(dec!(100)).unwrap();
        let b = Amount::new(dec!(100.00)).unwrap();
        assert_eq!(
            canonical_payload(&sender, &receiver, &a, "n"),
            canonical_payload(&sender, &receiver, &b, "n")
        );
    }

    #[test]
    fn every_field_changes_the_payload() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let amount = Amount::new(dec!(5)).unwrap();
        let base = canonical_payload(&sender, &receiver, &amount, "n1");

        assert_ne!(
            base,
            canonical_payload(&Uuid::new_v4(), &receiver, &amount, "n1")
        );
        assert_ne!(
            base,
            canonical_payload(&sender, &Uuid::new_v4(), &amount, "n1")
        );
        assert_ne!(
            base,
            canonical_payload(&sender, &receiver, &Amount::new(dec!(6)).unwrap(), "n1")
        );
        assert_ne!(base, canonical_payload(&sender, &receiver, &amount, "n2"));
    }
}

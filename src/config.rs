//! # Engine Constants
//!
//! The signer (an offline device) and the verifier (this engine) never get
//! to negotiate. Every constant they must agree on lives here; changing
//! any of them invalidates every signature already sitting in somebody's
//! outbox.

/// Field delimiter in the canonical signature payload.
///
/// The payload is `sender:receiver:amount:nonce`. The delimiter is safe
/// because UUIDs, canonical decimal strings, and our nonces never contain
/// a colon.
pub const PAYLOAD_DELIMITER: char = ':';

/// Maximum fractional digits in any ledger amount.
///
/// Balances and transfer amounts are exact decimals with at most two
/// places (cents). Submissions with finer precision are rejected at the
/// input boundary, not rounded.
pub const LEDGER_SCALE: u32 = 2;

/// Length in bytes of a raw (r‖s) P-256 ECDSA signature.
///
/// Two 32-byte big-endian integers, concatenated. This is the fixed-length
/// IEEE P1363 form that Web Crypto produces, not the variable-length
/// ASN.1/DER form. The two encodings are byte-incompatible; anything that
/// isn't exactly 64 bytes fails verification.
pub const RAW_SIGNATURE_LEN: usize = 64;

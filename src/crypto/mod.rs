//! # Payload Canonicalization and Signature Verification
//!
//! The offline device signs a deterministic text payload; this module
//! rebuilds that payload byte-for-byte and checks the ECDSA signature
//! against the sender's registered public key.
//!
//! The scheme is pinned end to end by what the signer produces:
//!
//! - Curve: NIST P-256, digest SHA-256.
//! - Public key: SPKI DER, transported as base64.
//! - Signature: raw 64-byte r‖s (IEEE P1363), transported as base64.
//!   DER-encoded signatures are byte-incompatible and never verify.
//!
//! Verification is stateless, never panics on malformed input, and fails
//! closed: any decode problem anywhere is simply "not verified."

mod payload;
mod verify;

pub use payload::canonical_payload;
pub use verify::verify_signature;

//! ECDSA P-256 verification against a base64 SPKI key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use tracing::debug;

/// Verifies a raw (r‖s) ECDSA P-256/SHA-256 signature over `payload`.
///
/// `spki_b64` is the sender's registered public key: base64 of the SPKI
/// DER exactly as the client exported it. `signature_b64` is base64 of the
/// 64-byte r‖s signature.
///
/// Returns `false` (never an error, never a panic) for every malformed
/// input: blank key, bad base64, bytes that aren't a P-256 SPKI, a
/// signature that isn't exactly r‖s length (DER signatures land here), or
/// a signature that simply doesn't match. Callers are not told which part
/// was wrong; the detail goes to the debug log only.
///
/// Verification reads no engine state and writes none; it is safe to call
/// speculatively before committing to any ledger change.
pub fn verify_signature(spki_b64: &str, payload: &[u8], signature_b64: &str) -> bool {
    if spki_b64.trim().is_empty() || signature_b64.trim().is_empty() {
        return false;
    }

    let key_der = match BASE64.decode(spki_b64.trim()) {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!("public key is not valid base64");
            return false;
        }
    };

    let verifying_key = match VerifyingKey::from_public_key_der(&key_der) {
        Ok(key) => key,
        Err(_) => {
            debug!("public key bytes are not a P-256 SPKI");
            return false;
        }
    };

    let sig_bytes = match BASE64.decode(signature_b64.trim()) {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!("signature is not valid base64");
            return false;
        }
    };

    // from_slice only accepts the fixed 64-byte r‖s form, so DER input
    // fails here rather than being misparsed.
    let signature = match Signature::from_slice(&sig_bytes) {
        Ok(sig) => sig,
        Err(_) => {
            debug!(len = sig_bytes.len(), "signature is not raw r\u{2016}s form");
            return false;
        }
    };

    verifying_key.verify(payload, &signature).is_ok()
}

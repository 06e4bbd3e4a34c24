//! Ed25519 signatures over ledger statements, base64-encoded for storage.

use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{AttendanceError, Result};

pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> Result<()> {
    verifying_key
        .verify(message, signature)
        .map_err(|_| AttendanceError::SignatureInvalid)
}

/// Sign `message` and return the 64-byte signature as standard base64.
pub fn sign_to_base64(signing_key: &SigningKey, message: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(sign(signing_key, message).to_bytes())
}

/// Verify a base64 signature produced by [`sign_to_base64`].
pub fn verify_from_base64(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<()> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(signature_b64)
        .map_err(|e| AttendanceError::InvalidKey(format!("invalid base64 signature: {e}")))?;
    let bytes: [u8; 64] = raw
        .try_into()
        .map_err(|_| AttendanceError::InvalidKey("signature must be 64 bytes".into()))?;
    verify(verifying_key, message, &Signature::from_bytes(&bytes))
}

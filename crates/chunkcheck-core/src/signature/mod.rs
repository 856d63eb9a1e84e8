//! Chunklist authentication.
//!
//! Method 1 manifests carry a raw RSA signature over the running digest. The
//! signature is decrypted with the public key and compared as a whole
//! against the PKCS#1 v1.5 plaintext rebuilt from the digest. Method 2
//! manifests only restate their own digest and are never trusted.

mod key;
mod template;

pub use key::{PublicKey, PUBLIC_EXPONENT};
pub use template::{expected_plaintext, MIN_MODULUS_LEN, SHA256_DIGEST_INFO};

use num_bigint::BigUint;

use crate::chunklist::{SignatureBlock, SignatureMethod};
use crate::error::SignatureError;

/// Authenticate `digest` against the manifest's signature block.
pub fn verify_signature(
    key: &PublicKey,
    digest: &[u8; 32],
    block: &SignatureBlock,
) -> Result<(), SignatureError> {
    let expected_len = block.method.block_len();
    if block.bytes.len() != expected_len {
        tracing::warn!(
            "signature block is {} bytes, expected {}",
            block.bytes.len(),
            expected_len
        );
        return Err(SignatureError::BlockLength {
            expected: expected_len,
            actual: block.bytes.len(),
        });
    }

    match block.method {
        SignatureMethod::Rsa => verify_rsa(key, digest, &block.bytes),
        SignatureMethod::UnsignedDigest => {
            let digest_matches = block.bytes.as_slice() == digest.as_slice();
            tracing::warn!(digest_matches, "chunklist is unsigned; refusing to trust it");
            Err(SignatureError::Unsigned { digest_matches })
        }
    }
}

/// The block is stored little-endian, the order it is transmitted in. A
/// value at or above the modulus is reduced by the exponentiation.
fn verify_rsa(key: &PublicKey, digest: &[u8; 32], block: &[u8]) -> Result<(), SignatureError> {
    let signature = BigUint::from_bytes_le(block);
    let width = key.modulus_len();
    let recovered = key.apply(&signature).to_bytes_be();
    // recovered < modulus, so it always fits in `width` bytes.
    let mut candidate = vec![0u8; width - recovered.len()];
    candidate.extend_from_slice(&recovered);

    if candidate != expected_plaintext(digest, width) {
        tracing::warn!("chunklist signature does not match digest {}", hex::encode(digest));
        return Err(SignatureError::Mismatch);
    }
    tracing::info!("chunklist signature verified ({}-bit key)", key.bits());
    Ok(())
}

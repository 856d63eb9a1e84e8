//! Expected plaintext of a chunklist signature.
//!
//! `00 01 FF..FF 00 || DigestInfo(SHA-256) || digest`, as wide as the
//! modulus. The DigestInfo prefix is compared byte for byte.

/// DER `DigestInfo` header for SHA-256 with NULL parameters.
pub const SHA256_DIGEST_INFO: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];

const DIGEST_LEN: usize = 32;
const MIN_PADDING: usize = 8;

/// Smallest modulus width that fits the template with at least eight bytes
/// of 0xFF padding.
pub const MIN_MODULUS_LEN: usize = 3 + MIN_PADDING + SHA256_DIGEST_INFO.len() + DIGEST_LEN;

/// Build the expected plaintext for `digest` at `width` bytes.
/// `width` must be at least [`MIN_MODULUS_LEN`].
pub fn expected_plaintext(digest: &[u8; DIGEST_LEN], width: usize) -> Vec<u8> {
    debug_assert!(width >= MIN_MODULUS_LEN);
    let suffix_len = 1 + SHA256_DIGEST_INFO.len() + DIGEST_LEN;
    let mut out = Vec::with_capacity(width);
    out.extend_from_slice(&[0x00, 0x01]);
    out.resize(width - suffix_len, 0xff);
    out.push(0x00);
    out.extend_from_slice(&SHA256_DIGEST_INFO);
    out.extend_from_slice(digest);
    out
}

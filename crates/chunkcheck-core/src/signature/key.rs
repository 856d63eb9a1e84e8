//! RSA public key used to authenticate chunklists.

use anyhow::{bail, Result};
use num_bigint::BigUint;
use std::sync::OnceLock;

use super::template::MIN_MODULUS_LEN;

/// Public exponent shared by every accepted key.
pub const PUBLIC_EXPONENT: u32 = 0x10001;

/// Modulus of the recovery image signing key (2048-bit, big-endian).
const RECOVERY_MODULUS: [u8; 256] = [
    0xc3, 0xe7, 0x48, 0xca, 0xd9, 0xcd, 0x38, 0x43, 0x29, 0xe1, 0x0e, 0x25,
    0xa9, 0x1e, 0x43, 0xe1, 0xa7, 0x62, 0xff, 0x52, 0x9a, 0xde, 0x57, 0x8c,
    0x93, 0x5b, 0xdd, 0xf9, 0xb1, 0x3f, 0x21, 0x79, 0xd4, 0x85, 0x5e, 0x6f,
    0xc8, 0x9e, 0x9e, 0x29, 0xca, 0x12, 0x51, 0x7d, 0x17, 0xdf, 0xa1, 0xed,
    0xce, 0x0b, 0xeb, 0xf0, 0xea, 0x7b, 0x46, 0x1f, 0xfe, 0x61, 0xd9, 0x4e,
    0x2b, 0xdf, 0x72, 0xc1, 0x96, 0xf8, 0x9a, 0xcd, 0x35, 0x36, 0xb6, 0x44,
    0x06, 0x40, 0x14, 0xda, 0xe2, 0x5a, 0x15, 0xdb, 0x6b, 0xb0, 0x85, 0x2e,
    0xcb, 0xd1, 0x20, 0x91, 0x63, 0x18, 0xd1, 0xcc, 0xde, 0xa3, 0xc8, 0x4c,
    0x92, 0xed, 0x74, 0x3f, 0xc1, 0x76, 0xd0, 0xba, 0xca, 0x92, 0x0d, 0x3f,
    0xcf, 0x31, 0x58, 0xaf, 0xf7, 0x31, 0xf8, 0x8c, 0xe0, 0x62, 0x31, 0x82,
    0xa8, 0xed, 0x67, 0xe6, 0x50, 0x51, 0x5f, 0x75, 0x74, 0x59, 0x09, 0xf0,
    0x7d, 0x41, 0x5f, 0x55, 0xfc, 0x15, 0xa3, 0x56, 0x54, 0xd1, 0x18, 0xc5,
    0x5a, 0x46, 0x2d, 0x37, 0xa3, 0xac, 0xda, 0x08, 0x61, 0x2f, 0x3f, 0x3f,
    0x65, 0x71, 0x76, 0x1e, 0xfc, 0xcb, 0xcc, 0x29, 0x9a, 0xee, 0x99, 0xb3,
    0xa4, 0xfd, 0x62, 0x12, 0xcc, 0xff, 0xf5, 0xef, 0x37, 0xa2, 0xc3, 0x34,
    0xe8, 0x71, 0x19, 0x1f, 0x7e, 0x1c, 0x31, 0x96, 0x0e, 0x01, 0x0a, 0x54,
    0xe8, 0x6f, 0xa3, 0xf6, 0x2e, 0x6d, 0x69, 0x05, 0xe1, 0xcd, 0x57, 0x73,
    0x24, 0x10, 0xa3, 0xeb, 0x0c, 0x6b, 0x4d, 0xef, 0xda, 0xbe, 0x9f, 0x59,
    0xbf, 0x16, 0x18, 0x75, 0x8c, 0x75, 0x1c, 0xd5, 0x6c, 0xef, 0x85, 0x1d,
    0x1c, 0x0e, 0xaa, 0x1c, 0x55, 0x8e, 0x37, 0xac, 0x10, 0x8d, 0xa9, 0x08,
    0x98, 0x63, 0xd2, 0x0e, 0x2e, 0x7e, 0x4b, 0xf4, 0x75, 0xec, 0x66, 0xfe,
    0x6b, 0x3e, 0xfd, 0xcf,
];

/// RSA public key with the fixed exponent 65537.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    modulus: BigUint,
    exponent: BigUint,
    modulus_len: usize,
}

impl PublicKey {
    /// Build a key from a big-endian modulus. Leading zero bytes are ignored.
    pub fn from_modulus_be(modulus: &[u8]) -> Result<Self> {
        let modulus = BigUint::from_bytes_be(modulus);
        let modulus_len = (modulus.bits() as usize).div_ceil(8);
        if modulus_len < MIN_MODULUS_LEN {
            bail!(
                "modulus is {} bytes, at least {} needed to hold a SHA-256 signature",
                modulus_len,
                MIN_MODULUS_LEN
            );
        }
        if !modulus.bit(0) {
            bail!("modulus must be odd");
        }
        Ok(Self {
            modulus,
            exponent: BigUint::from(PUBLIC_EXPONENT),
            modulus_len,
        })
    }

    /// The embedded recovery signing key. Built once per process.
    pub fn recovery() -> &'static PublicKey {
        static KEY: OnceLock<PublicKey> = OnceLock::new();
        KEY.get_or_init(|| {
            let modulus = BigUint::from_bytes_be(&RECOVERY_MODULUS);
            PublicKey {
                modulus,
                exponent: BigUint::from(PUBLIC_EXPONENT),
                modulus_len: RECOVERY_MODULUS.len(),
            }
        })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Modulus width in bytes; also the width of the signed plaintext.
    pub fn modulus_len(&self) -> usize {
        self.modulus_len
    }

    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }

    /// Raw RSA public operation `value^e mod n`.
    pub(crate) fn apply(&self, value: &BigUint) -> BigUint {
        value.modpow(&self.exponent, &self.modulus)
    }
}

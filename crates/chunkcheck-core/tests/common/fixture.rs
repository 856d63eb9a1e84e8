//! Builds chunklists for integration tests, signed with a throwaway
//! 1024-bit key so the full pipeline can be exercised end to end.

use chunkcheck_core::chunklist::{ChunkDescriptor, ManifestHeader, SignatureMethod};
use chunkcheck_core::signature::{expected_plaintext, PublicKey};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use std::io::{self, Read};

const TEST_N: &str = "b6c81a986198be3512fd282a15d2b796755db065e1ea887b854ee7c46acb96f189dffc8ba33c230ee6bfd65a61117753b1237b737fa77f41137f4903e0ff3bac8c01fac202f542aae4f266c54bf1b86316c357f93ce75706b4dfdf351fd6eb51032c71526007ee1a9dcde458f5474f69a5533bca7e31eb74daae3d4f0613c2db";
const TEST_D: &str = "b67c6c090d0fa97f65b8f89ba3f4203508728486039adbaeaef68b70cfcaf9a5a728c8844571e9f29bb095fae004c724f8aadb3b020d2180c04d898164e68e14d199eb776cc6f2abbfbbf2d97cf542ac7fa0dc0c41b71cc3f6998e3a4eecb8ddd1197ad4f8aa0a4257abfac4cf90d2a0975e9306278c68c2371a3f0fa5ca9309";

pub fn test_key() -> PublicKey {
    PublicKey::from_modulus_be(&hex::decode(TEST_N).unwrap()).unwrap()
}

/// Raw RSA signature over `digest`, little-endian in a 256-byte block.
pub fn sign(digest: &[u8; 32]) -> Vec<u8> {
    let n = BigUint::parse_bytes(TEST_N.as_bytes(), 16).unwrap();
    let d = BigUint::parse_bytes(TEST_D.as_bytes(), 16).unwrap();
    let m = BigUint::from_bytes_be(&expected_plaintext(digest, 128));
    let mut sig = m.modpow(&d, &n).to_bytes_le();
    sig.resize(256, 0);
    sig
}

/// Deterministic image bytes.
pub fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Header and chunk table describing `image` split at `sizes`.
pub fn manifest_body(image: &[u8], sizes: &[u32], method: SignatureMethod) -> Vec<u8> {
    let header = ManifestHeader::new(method, sizes.len() as u64).unwrap();
    let mut out = header.to_bytes().to_vec();
    let mut at = 0usize;
    for &size in sizes {
        let part = &image[at..at + size as usize];
        at += size as usize;
        let entry = ChunkDescriptor {
            size,
            sha256: Sha256::digest(part).into(),
        };
        out.extend_from_slice(&entry.to_bytes());
    }
    out
}

/// Sign (method 1) or self-digest (method 2) an already built body.
pub fn seal(body: &[u8], method: SignatureMethod) -> Vec<u8> {
    let digest: [u8; 32] = Sha256::digest(body).into();
    let mut out = body.to_vec();
    match method {
        SignatureMethod::Rsa => out.extend_from_slice(&sign(&digest)),
        SignatureMethod::UnsignedDigest => out.extend_from_slice(&digest),
    }
    out
}

pub fn chunklist(image: &[u8], sizes: &[u32], method: SignatureMethod) -> Vec<u8> {
    seal(&manifest_body(image, sizes, method), method)
}

/// Image source that fails the test if it is ever read.
pub struct Untouchable;

impl Read for Untouchable {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        panic!("image was read before the chunklist was trusted");
    }
}

//! Fixed 36-byte chunklist header.

use super::{CHUNK_ENTRY_LEN, CHUNK_METHOD_SHA256, FILE_VERSION, HEADER_LEN, MAGIC};
use crate::error::FormatError;

/// How the manifest digest is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMethod {
    /// 2048-bit RSA signature over the manifest digest.
    Rsa,
    /// The manifest digest itself, unsigned.
    UnsignedDigest,
}

impl SignatureMethod {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(SignatureMethod::Rsa),
            2 => Some(SignatureMethod::UnsignedDigest),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            SignatureMethod::Rsa => 1,
            SignatureMethod::UnsignedDigest => 2,
        }
    }

    /// Length of the signature block that follows the chunk table.
    pub fn block_len(self) -> usize {
        match self {
            SignatureMethod::Rsa => 256,
            SignatureMethod::UnsignedDigest => 32,
        }
    }
}

/// Validated chunklist header. Only constructed by [`ManifestHeader::parse`]
/// or [`ManifestHeader::new`], so every instance satisfies the layout rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHeader {
    pub signature_method: SignatureMethod,
    pub chunk_count: u64,
    pub signature_offset: u64,
}

impl ManifestHeader {
    /// Header for a manifest with `chunk_count` entries. `None` when the
    /// count is zero or the signature offset would not fit in 64 bits.
    pub fn new(signature_method: SignatureMethod, chunk_count: u64) -> Option<Self> {
        if chunk_count == 0 {
            return None;
        }
        let signature_offset = u64::try_from(expected_signature_offset(chunk_count)).ok()?;
        Some(Self {
            signature_method,
            chunk_count,
            signature_offset,
        })
    }

    /// Decode and validate raw header bytes.
    ///
    /// Checks run in wire order so the first bad field is the one reported.
    pub fn parse(buf: &[u8; HEADER_LEN]) -> Result<Self, FormatError> {
        let magic: [u8; 4] = [buf[0], buf[1], buf[2], buf[3]];
        if magic != MAGIC {
            return Err(FormatError::BadMagic { found: magic });
        }
        let header_size = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if header_size as usize != HEADER_LEN {
            return Err(FormatError::HeaderSize(header_size));
        }
        if buf[8] != FILE_VERSION {
            return Err(FormatError::Version(buf[8]));
        }
        if buf[9] != CHUNK_METHOD_SHA256 {
            return Err(FormatError::ChunkMethod(buf[9]));
        }
        let signature_method =
            SignatureMethod::from_u8(buf[10]).ok_or(FormatError::SignatureMethod(buf[10]))?;
        // buf[11] is reserved.
        let chunk_count = le_u64(buf, 12);
        if chunk_count == 0 {
            return Err(FormatError::NoChunks);
        }
        let chunk_table_offset = le_u64(buf, 20);
        if chunk_table_offset != HEADER_LEN as u64 {
            return Err(FormatError::ChunkTableOffset(chunk_table_offset));
        }
        let signature_offset = le_u64(buf, 28);
        let expected = expected_signature_offset(chunk_count);
        if u128::from(signature_offset) != expected {
            return Err(FormatError::SignatureOffset {
                found: signature_offset,
                expected,
            });
        }

        Ok(Self {
            signature_method,
            chunk_count,
            signature_offset,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        out[8] = FILE_VERSION;
        out[9] = CHUNK_METHOD_SHA256;
        out[10] = self.signature_method.as_u8();
        out[12..20].copy_from_slice(&self.chunk_count.to_le_bytes());
        out[20..28].copy_from_slice(&(HEADER_LEN as u64).to_le_bytes());
        out[28..36].copy_from_slice(&self.signature_offset.to_le_bytes());
        out
    }
}

fn le_u64(buf: &[u8; HEADER_LEN], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

/// Computed in u128 so absurd chunk counts cannot wrap into a match.
fn expected_signature_offset(chunk_count: u64) -> u128 {
    HEADER_LEN as u128 + CHUNK_ENTRY_LEN as u128 * u128::from(chunk_count)
}

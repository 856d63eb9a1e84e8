//! Chunklist manifest reader.
//!
//! A chunklist is a 36-byte header, `chunk_count` 36-byte entries and a
//! trailing signature block. Header and entries are fed to a running SHA-256
//! as they are read; the signature block is not. The reader never holds more
//! than one entry in memory.

mod header;

pub use header::{ManifestHeader, SignatureMethod};

use sha2::{Digest, Sha256};
use std::io::Read;

use crate::error::{FormatError, Result, VerifyError};
use crate::read::{has_more, read_full};

pub const MAGIC: [u8; 4] = *b"CNKL";
pub const HEADER_LEN: usize = 0x24;
pub const CHUNK_ENTRY_LEN: usize = 0x24;
pub const FILE_VERSION: u8 = 1;
pub const CHUNK_METHOD_SHA256: u8 = 1;

/// Upper bound on descriptors preallocated from an untrusted chunk count.
const PREALLOC_CHUNKS: usize = 4096;

/// One entry of the chunk table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub size: u32,
    pub sha256: [u8; 32],
}

impl ChunkDescriptor {
    fn parse(buf: &[u8; CHUNK_ENTRY_LEN]) -> Self {
        let size = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let mut sha256 = [0u8; 32];
        sha256.copy_from_slice(&buf[4..]);
        Self { size, sha256 }
    }

    pub fn to_bytes(&self) -> [u8; CHUNK_ENTRY_LEN] {
        let mut out = [0u8; CHUNK_ENTRY_LEN];
        out[..4].copy_from_slice(&self.size.to_le_bytes());
        out[4..].copy_from_slice(&self.sha256);
        out
    }
}

/// Raw bytes after the chunk table. May be shorter than the method's block
/// length if the manifest was truncated; the signature check rejects that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    pub method: SignatureMethod,
    pub bytes: Vec<u8>,
}

/// What is left once the chunk table has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestTrailer {
    pub digest: [u8; 32],
    pub signature: SignatureBlock,
}

/// Single-pass reader over a chunklist byte source.
///
/// The header is validated in [`ChunklistReader::new`] before any byte is
/// hashed. Descriptors are then pulled one at a time with
/// [`ChunklistReader::next_chunk`] (or by iterating), and
/// [`ChunklistReader::finish`] yields the digest and signature block.
pub struct ChunklistReader<R> {
    inner: R,
    header: ManifestHeader,
    hasher: Sha256,
    next_index: u64,
    fused: bool,
}

impl<R: Read> ChunklistReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        let n = read_full(&mut inner, &mut buf)
            .map_err(|e| VerifyError::io("read chunklist header", e))?;
        if n < HEADER_LEN {
            tracing::warn!("chunklist header truncated at {} bytes", n);
            return Err(FormatError::TruncatedHeader(n).into());
        }
        let header = ManifestHeader::parse(&buf).map_err(|e| {
            tracing::warn!("rejecting chunklist header: {}", e);
            e
        })?;
        tracing::debug!(
            chunk_count = header.chunk_count,
            signature_method = ?header.signature_method,
            "chunklist header parsed"
        );

        let mut hasher = Sha256::new();
        hasher.update(buf);
        Ok(Self {
            inner,
            header,
            hasher,
            next_index: 0,
            fused: false,
        })
    }

    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    /// Entries not yet read from the chunk table.
    pub fn remaining_chunks(&self) -> u64 {
        self.header.chunk_count - self.next_index
    }

    /// Read the next chunk table entry, or `None` once all are consumed.
    pub fn next_chunk(&mut self) -> Result<Option<ChunkDescriptor>> {
        if self.next_index == self.header.chunk_count {
            return Ok(None);
        }
        let index = self.next_index;
        let mut buf = [0u8; CHUNK_ENTRY_LEN];
        let n = read_full(&mut self.inner, &mut buf)
            .map_err(|e| VerifyError::io(format!("read chunk table entry {}", index), e))?;
        if n < CHUNK_ENTRY_LEN {
            tracing::warn!("chunk table truncated in entry {}", index);
            return Err(FormatError::TruncatedChunkTable { index, read: n }.into());
        }
        self.hasher.update(buf);
        self.next_index += 1;
        Ok(Some(ChunkDescriptor::parse(&buf)))
    }

    /// Consume any unread entries, then the signature block, and require the
    /// source to end there.
    pub fn finish(mut self) -> Result<ManifestTrailer> {
        while self.next_chunk()?.is_some() {}
        let digest: [u8; 32] = self.hasher.finalize().into();

        let method = self.header.signature_method;
        let mut bytes = vec![0u8; method.block_len()];
        let n = read_full(&mut self.inner, &mut bytes)
            .map_err(|e| VerifyError::io("read signature block", e))?;
        bytes.truncate(n);
        if n == method.block_len()
            && has_more(&mut self.inner)
                .map_err(|e| VerifyError::io("read past signature block", e))?
        {
            tracing::warn!("chunklist has data after its signature block");
            return Err(FormatError::TrailingData.into());
        }

        Ok(ManifestTrailer {
            digest,
            signature: SignatureBlock { method, bytes },
        })
    }
}

impl<R: Read> Iterator for ChunklistReader<R> {
    type Item = Result<ChunkDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(c)) => Some(Ok(c)),
            Ok(None) => None,
            Err(e) => {
                self.fused = true;
                Some(Err(e))
            }
        }
    }
}

/// A fully read chunklist whose signature has not been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunklist {
    pub header: ManifestHeader,
    pub chunks: Vec<ChunkDescriptor>,
    pub digest: [u8; 32],
    pub signature: SignatureBlock,
}

impl Chunklist {
    /// Drive a [`ChunklistReader`] to completion.
    pub fn read<R: Read>(source: R) -> Result<Self> {
        let mut reader = ChunklistReader::new(source)?;
        let cap = usize::try_from(reader.remaining_chunks())
            .unwrap_or(usize::MAX)
            .min(PREALLOC_CHUNKS);
        let mut chunks = Vec::with_capacity(cap);
        while let Some(chunk) = reader.next_chunk()? {
            chunks.push(chunk);
        }
        let header = reader.header().clone();
        let trailer = reader.finish()?;
        Ok(Self {
            header,
            chunks,
            digest: trailer.digest,
            signature: trailer.signature,
        })
    }

    /// Image size implied by the chunk table.
    pub fn image_len(&self) -> u64 {
        self.chunks.iter().map(|c| u64::from(c.size)).sum()
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

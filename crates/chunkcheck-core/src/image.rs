//! Streams an image against an authenticated chunk table.
//!
//! Each chunk is hashed through a fixed buffer, so memory stays bounded no
//! matter how large the image or its chunks are.

use sha2::{Digest, Sha256};
use std::io::Read;

use crate::chunklist::ChunkDescriptor;
use crate::error::{Result, VerifyError};
use crate::read::{has_more, read_full};
use crate::verdict::VerifySink;

pub const DEFAULT_BUFFER_BYTES: usize = 1 << 20;

/// Totals for an image that matched its chunk table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSummary {
    pub chunk_count: u64,
    pub image_bytes: u64,
}

/// Check that `image` is exactly the concatenation of `chunks`.
///
/// Fails on the first chunk that comes up short or hashes differently, and
/// if the image continues past the last chunk.
pub fn verify_chunks<R, S>(
    chunks: &[ChunkDescriptor],
    mut image: R,
    buffer_bytes: usize,
    sink: &mut S,
) -> Result<ImageSummary>
where
    R: Read,
    S: VerifySink + ?Sized,
{
    let mut buf = vec![0u8; buffer_bytes.max(1)];
    let mut offset: u64 = 0;

    for (index, chunk) in chunks.iter().enumerate() {
        let index = index as u64;
        let mut hasher = Sha256::new();
        let mut remaining = chunk.size as usize;
        while remaining > 0 {
            let want = remaining.min(buf.len());
            let n = read_full(&mut image, &mut buf[..want])
                .map_err(|e| VerifyError::io(format!("read image chunk {}", index), e))?;
            hasher.update(&buf[..n]);
            remaining -= n;
            if n < want {
                let read = u64::from(chunk.size) - remaining as u64;
                tracing::warn!(
                    "image ended inside chunk {}: {} of {} bytes",
                    index,
                    read,
                    chunk.size
                );
                return Err(VerifyError::ShortRead {
                    index,
                    offset,
                    expected: chunk.size,
                    read,
                });
            }
        }

        let actual: [u8; 32] = hasher.finalize().into();
        let end = offset + u64::from(chunk.size);
        if actual != chunk.sha256 {
            tracing::warn!("chunk {} (bytes {}..{}) hash mismatch", index, offset, end);
            return Err(VerifyError::ChunkHashMismatch {
                index,
                start: offset,
                end,
                expected: hex::encode(chunk.sha256),
                actual: hex::encode(actual),
            });
        }
        tracing::trace!(index, size = chunk.size, "chunk verified");
        sink.chunk_verified(index, chunk.size);
        offset = end;
    }

    if has_more(&mut image).map_err(|e| VerifyError::io("read past last chunk", e))? {
        tracing::warn!("image continues past the {} bytes declared", offset);
        return Err(VerifyError::TrailingData { declared: offset });
    }

    Ok(ImageSummary {
        chunk_count: chunks.len() as u64,
        image_bytes: offset,
    })
}

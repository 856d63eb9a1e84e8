//! Error taxonomy for chunklist and image verification.
//!
//! Every variant names one invariant. The orchestrator stops at the first
//! violation and reports it unchanged, so the kind and location here are
//! what the user ends up seeing.

use serde::Serialize;
use std::io;
use thiserror::Error;

use crate::chunklist::{CHUNK_ENTRY_LEN, HEADER_LEN};

pub type Result<T, E = VerifyError> = std::result::Result<T, E>;

/// Malformed manifest structure. Raised before any cryptographic work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic {found:02x?}, expected \"CNKL\"")]
    BadMagic { found: [u8; 4] },
    #[error("header size is {0}, expected {len}", len = HEADER_LEN)]
    HeaderSize(u32),
    #[error("unsupported file version {0}")]
    Version(u8),
    #[error("unsupported chunk method {0}")]
    ChunkMethod(u8),
    #[error("unsupported signature method {0}")]
    SignatureMethod(u8),
    #[error("chunk count is zero")]
    NoChunks,
    #[error("chunk table offset is {0}, expected {len}", len = HEADER_LEN)]
    ChunkTableOffset(u64),
    #[error("signature offset is {found}, expected {expected}")]
    SignatureOffset { found: u64, expected: u128 },
    #[error("header truncated after {0} of {len} bytes", len = HEADER_LEN)]
    TruncatedHeader(usize),
    #[error("chunk table entry {index} truncated after {read} of {len} bytes", len = CHUNK_ENTRY_LEN)]
    TruncatedChunkTable { index: u64, read: usize },
    #[error("unexpected data after the signature block")]
    TrailingData,
}

/// The manifest could not be authenticated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature block is {actual} bytes, expected {expected}")]
    BlockLength { expected: usize, actual: usize },
    #[error("signature does not match the manifest digest")]
    Mismatch,
    #[error("chunklist missing digital signature (self-reported digest matches: {digest_matches})")]
    Unsigned { digest_matches: bool },
}

/// Any reason a verification call can fail.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid chunklist: {0}")]
    Format(#[from] FormatError),
    #[error("chunklist signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("chunk {index} (bytes {start}..{end}): hash mismatch, expected {expected}, got {actual}")]
    ChunkHashMismatch {
        index: u64,
        start: u64,
        end: u64,
        expected: String,
        actual: String,
    },
    #[error("chunk {index} at offset {offset}: expected {expected} bytes, read {read}")]
    ShortRead {
        index: u64,
        offset: u64,
        expected: u32,
        read: u64,
    },
    #[error("image is larger than the {declared} bytes described by the chunklist")]
    TrailingData { declared: u64 },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Stable, serializable classification of a [`VerifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Format,
    Signature,
    ChunkHashMismatch,
    ShortRead,
    TrailingData,
    Io,
}

impl VerifyError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        VerifyError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            VerifyError::Format(_) => FailureKind::Format,
            VerifyError::Signature(_) => FailureKind::Signature,
            VerifyError::ChunkHashMismatch { .. } => FailureKind::ChunkHashMismatch,
            VerifyError::ShortRead { .. } => FailureKind::ShortRead,
            VerifyError::TrailingData { .. } => FailureKind::TrailingData,
            VerifyError::Io { .. } => FailureKind::Io,
        }
    }

    /// Index of the offending chunk, for errors tied to one chunk.
    pub fn chunk_index(&self) -> Option<u64> {
        match self {
            VerifyError::ChunkHashMismatch { index, .. } | VerifyError::ShortRead { index, .. } => {
                Some(*index)
            }
            VerifyError::Format(FormatError::TruncatedChunkTable { index, .. }) => Some(*index),
            _ => None,
        }
    }

    /// Image byte offset where the failure was detected.
    pub fn byte_offset(&self) -> Option<u64> {
        match self {
            VerifyError::ChunkHashMismatch { start, .. } => Some(*start),
            VerifyError::ShortRead { offset, read, .. } => Some(offset + read),
            VerifyError::TrailingData { declared } => Some(*declared),
            _ => None,
        }
    }
}

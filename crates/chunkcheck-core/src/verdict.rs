//! Final verdict and the progress sink that receives it.

use serde::Serialize;

use crate::error::{FailureKind, VerifyError};

/// Outcome of one verification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Verified {
        chunk_count: u64,
        image_bytes: u64,
        manifest_digest: String,
    },
    Failed {
        kind: FailureKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        chunk_index: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        byte_offset: Option<u64>,
    },
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified { .. })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&VerifyError> for Verdict {
    fn from(e: &VerifyError) -> Self {
        Verdict::Failed {
            kind: e.kind(),
            message: e.to_string(),
            chunk_index: e.chunk_index(),
            byte_offset: e.byte_offset(),
        }
    }
}

/// Receives progress while an image is scanned, then the verdict.
pub trait VerifySink {
    /// Chunk `index` of `size` bytes matched its declared hash.
    fn chunk_verified(&mut self, _index: u64, _size: u32) {}

    fn finished(&mut self, _verdict: &Verdict) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl VerifySink for NoProgress {}

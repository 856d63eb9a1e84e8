//! Verification pipeline: read the chunklist, authenticate it, then check
//! the image against it.
//!
//! Only a [`TrustedChunklist`] can check an image, and the only way to get
//! one is through [`Verifier::authenticate`], so image bytes are never read
//! on the strength of an unauthenticated chunk table.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::chunklist::{ChunkDescriptor, Chunklist, ManifestHeader};
use crate::error::{Result, VerifyError};
use crate::image::{self, ImageSummary, DEFAULT_BUFFER_BYTES};
use crate::signature::{verify_signature, PublicKey};
use crate::verdict::{Verdict, VerifySink};

/// A chunklist whose signature has been checked.
#[derive(Debug, Clone)]
pub struct TrustedChunklist {
    header: ManifestHeader,
    chunks: Vec<ChunkDescriptor>,
    digest: [u8; 32],
}

impl TrustedChunklist {
    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    pub fn chunks(&self) -> &[ChunkDescriptor] {
        &self.chunks
    }

    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub fn image_len(&self) -> u64 {
        self.chunks.iter().map(|c| u64::from(c.size)).sum()
    }

    /// Stream `image` against the authenticated chunk table.
    pub fn verify_image<R, S>(&self, image: R, buffer_bytes: usize, sink: &mut S) -> Result<ImageSummary>
    where
        R: Read,
        S: VerifySink + ?Sized,
    {
        image::verify_chunks(&self.chunks, image, buffer_bytes, sink)
    }
}

/// Runs the three verification stages with a fixed key.
#[derive(Debug, Clone)]
pub struct Verifier<'k> {
    key: &'k PublicKey,
    buffer_bytes: usize,
}

impl Verifier<'static> {
    /// Verifier bound to the embedded recovery key.
    pub fn recovery() -> Self {
        Self::with_key(PublicKey::recovery())
    }
}

impl<'k> Verifier<'k> {
    pub fn with_key(key: &'k PublicKey) -> Self {
        Self {
            key,
            buffer_bytes: DEFAULT_BUFFER_BYTES,
        }
    }

    /// Image read buffer size.
    pub fn buffer_bytes(mut self, buffer_bytes: usize) -> Self {
        self.buffer_bytes = buffer_bytes.max(1);
        self
    }

    /// Stages 1 and 2: read the whole chunklist, then check its signature.
    pub fn authenticate<C: Read>(&self, chunklist: C) -> Result<TrustedChunklist> {
        let list = Chunklist::read(chunklist)?;
        verify_signature(self.key, &list.digest, &list.signature)?;
        Ok(TrustedChunklist {
            header: list.header,
            chunks: list.chunks,
            digest: list.digest,
        })
    }

    /// All three stages over already-open sources.
    pub fn verify<C, I, S>(&self, chunklist: C, image: I, sink: &mut S) -> Result<ImageSummary>
    where
        C: Read,
        I: Read,
        S: VerifySink + ?Sized,
    {
        let trusted = self.authenticate(chunklist)?;
        trusted.verify_image(image, self.buffer_bytes, sink)
    }

    /// Verify files on disk and report the verdict to `sink`.
    ///
    /// The image is only opened once the chunklist has been authenticated.
    /// Both files are closed before this returns, on every path.
    pub fn verify_paths<S>(&self, image_path: &Path, chunklist_path: &Path, sink: &mut S) -> Verdict
    where
        S: VerifySink + ?Sized,
    {
        tracing::info!(
            "verifying {} against {}",
            image_path.display(),
            chunklist_path.display()
        );
        let verdict = match self.verify_paths_inner(image_path, chunklist_path, sink) {
            Ok((summary, digest)) => {
                tracing::info!(
                    "image verified: {} chunks, {} bytes",
                    summary.chunk_count,
                    summary.image_bytes
                );
                Verdict::Verified {
                    chunk_count: summary.chunk_count,
                    image_bytes: summary.image_bytes,
                    manifest_digest: hex::encode(digest),
                }
            }
            Err(e) => {
                tracing::warn!("image verification failed: {}", e);
                Verdict::from(&e)
            }
        };
        sink.finished(&verdict);
        verdict
    }

    fn verify_paths_inner<S>(
        &self,
        image_path: &Path,
        chunklist_path: &Path,
        sink: &mut S,
    ) -> Result<(ImageSummary, [u8; 32])>
    where
        S: VerifySink + ?Sized,
    {
        let trusted = {
            let file = File::open(chunklist_path).map_err(|e| {
                VerifyError::io(format!("open {}", chunklist_path.display()), e)
            })?;
            self.authenticate(BufReader::new(file))?
        };
        let image = File::open(image_path)
            .map_err(|e| VerifyError::io(format!("open {}", image_path.display()), e))?;
        let summary = trusted.verify_image(image, self.buffer_bytes, sink)?;
        Ok((summary, trusted.digest))
    }
}

/// Verify with the embedded recovery key and default buffering.
pub fn verify_image<C: Read, I: Read>(chunklist: C, image: I) -> Result<ImageSummary> {
    Verifier::recovery().verify(chunklist, image, &mut crate::verdict::NoProgress)
}

//! End-to-end verification: chunklist parsing, signature check and image scan.
//!
//! Manifests are signed with a throwaway key; the last tests run the same
//! pipeline against files on disk through `Verifier::verify_paths`.

mod common;

use chunkcheck_core::chunklist::{SignatureMethod, CHUNK_ENTRY_LEN, HEADER_LEN};
use chunkcheck_core::image::ImageSummary;
use chunkcheck_core::{
    FailureKind, FormatError, NoProgress, SignatureError, Verdict, Verifier, VerifyError,
    VerifySink,
};
use common::fixture::{self, Untouchable};
use std::fs;
use tempfile::tempdir;

const SIZES: [u32; 3] = [10, 20, 5];

fn run(chunklist: &[u8], image: &[u8]) -> Result<ImageSummary, VerifyError> {
    let key = fixture::test_key();
    Verifier::with_key(&key)
        .buffer_bytes(8)
        .verify(chunklist, image, &mut NoProgress)
}

#[test]
fn three_chunk_image_verifies() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let summary = run(&list, &image).expect("verification succeeds");
    assert_eq!(
        summary,
        ImageSummary {
            chunk_count: 3,
            image_bytes: 35
        }
    );
}

#[test]
fn image_one_byte_short_names_third_chunk() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let err = run(&list, &image[..34]).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ShortRead);
    assert_eq!(err.chunk_index(), Some(2));
}

#[test]
fn image_one_byte_long_is_trailing_data() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let mut longer = image.clone();
    longer.push(0xee);
    let err = run(&list, &longer).unwrap_err();
    assert!(matches!(err, VerifyError::TrailingData { declared: 35 }));
}

#[test]
fn altered_byte_names_its_chunk() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    for (pos, chunk) in [(0usize, 0u64), (9, 0), (10, 1), (29, 1), (30, 2), (34, 2)] {
        let mut bad = image.clone();
        bad[pos] ^= 0x01;
        let err = run(&list, &bad).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ChunkHashMismatch, "byte {}", pos);
        assert_eq!(err.chunk_index(), Some(chunk), "byte {}", pos);
    }
}

#[test]
fn any_chunk_table_bit_flip_breaks_signature() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let table = HEADER_LEN..HEADER_LEN + SIZES.len() * CHUNK_ENTRY_LEN;
    let key = fixture::test_key();
    let verifier = Verifier::with_key(&key);
    for byte in table {
        for bit in 0..8 {
            let mut tampered = list.clone();
            tampered[byte] ^= 1 << bit;
            let err = verifier.authenticate(tampered.as_slice()).unwrap_err();
            assert!(
                matches!(err, VerifyError::Signature(SignatureError::Mismatch)),
                "byte {} bit {}: {}",
                byte,
                bit,
                err
            );
        }
    }
}

#[test]
fn untrusted_chunklist_never_reads_image() {
    let image = fixture::image(35);
    let mut list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let last = list.len() - 1;
    list[last] ^= 0x01;
    let key = fixture::test_key();
    let err = Verifier::with_key(&key)
        .verify(list.as_slice(), Untouchable, &mut NoProgress)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Signature);
}

#[test]
fn unsigned_chunklist_rejected_even_when_digest_matches() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::UnsignedDigest);
    let key = fixture::test_key();
    let err = Verifier::with_key(&key)
        .verify(list.as_slice(), Untouchable, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Signature(SignatureError::Unsigned {
            digest_matches: true
        })
    ));
}

#[test]
fn bad_magic_rejected_before_image() {
    let image = fixture::image(35);
    let mut list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    list[..4].copy_from_slice(b"KNLC");
    let key = fixture::test_key();
    let err = Verifier::with_key(&key)
        .verify(list.as_slice(), Untouchable, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Format(FormatError::BadMagic { found }) if &found == b"KNLC"
    ));
}

#[test]
fn zero_chunks_rejected_at_parse() {
    let image = fixture::image(35);
    let mut list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    list[12..20].copy_from_slice(&0u64.to_le_bytes());
    let key = fixture::test_key();
    let err = Verifier::with_key(&key)
        .authenticate(list.as_slice())
        .unwrap_err();
    assert!(matches!(err, VerifyError::Format(FormatError::NoChunks)));
}

#[test]
fn inconsistent_signature_offset_rejected_at_parse() {
    let image = fixture::image(35);
    let mut list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    list[28..36].copy_from_slice(&(36u64 + 4 * 36).to_le_bytes());
    let key = fixture::test_key();
    let err = Verifier::with_key(&key)
        .authenticate(list.as_slice())
        .unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Format(FormatError::SignatureOffset { .. })
    ));
}

#[test]
fn trailing_manifest_bytes_rejected() {
    let image = fixture::image(35);
    let mut list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    list.push(0);
    let key = fixture::test_key();
    let err = Verifier::with_key(&key)
        .authenticate(list.as_slice())
        .unwrap_err();
    assert!(matches!(err, VerifyError::Format(FormatError::TrailingData)));
}

#[test]
fn recovery_key_rejects_test_signature() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let err = Verifier::recovery()
        .verify(list.as_slice(), Untouchable, &mut NoProgress)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Signature);
}

#[test]
fn trusted_chunklist_exposes_table() {
    let image = fixture::image(35);
    let list = fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa);
    let key = fixture::test_key();
    let trusted = Verifier::with_key(&key).authenticate(list.as_slice()).unwrap();
    assert_eq!(trusted.header().chunk_count, 3);
    assert_eq!(trusted.chunks().len(), 3);
    assert_eq!(trusted.image_len(), 35);
    let body = &list[..HEADER_LEN + 3 * CHUNK_ENTRY_LEN];
    let expected: [u8; 32] = <sha2::Sha256 as sha2::Digest>::digest(body).into();
    assert_eq!(trusted.digest(), &expected);
}

#[derive(Default)]
struct Recorder {
    chunks: Vec<(u64, u32)>,
    verdict: Option<Verdict>,
}

impl VerifySink for Recorder {
    fn chunk_verified(&mut self, index: u64, size: u32) {
        self.chunks.push((index, size));
    }

    fn finished(&mut self, verdict: &Verdict) {
        self.verdict = Some(verdict.clone());
    }
}

#[test]
fn verify_paths_reports_progress_and_verdict() {
    let dir = tempdir().unwrap();
    let image = fixture::image(35);
    let image_path = dir.path().join("BaseSystem.dmg");
    let list_path = dir.path().join("BaseSystem.chunklist");
    fs::write(&image_path, &image).unwrap();
    fs::write(
        &list_path,
        fixture::chunklist(&image, &SIZES, SignatureMethod::Rsa),
    )
    .unwrap();

    let key = fixture::test_key();
    let mut rec = Recorder::default();
    let verdict = Verifier::with_key(&key).verify_paths(&image_path, &list_path, &mut rec);
    assert!(verdict.is_verified(), "{:?}", verdict);
    assert_eq!(rec.chunks, vec![(0, 10), (1, 20), (2, 5)]);
    assert_eq!(rec.verdict, Some(verdict));
}

#[test]
fn verify_paths_does_not_open_image_for_untrusted_chunklist() {
    let dir = tempdir().unwrap();
    let image = fixture::image(35);
    let list_path = dir.path().join("BaseSystem.chunklist");
    fs::write(
        &list_path,
        fixture::chunklist(&image, &SIZES, SignatureMethod::UnsignedDigest),
    )
    .unwrap();
    let missing_image = dir.path().join("missing.dmg");

    let key = fixture::test_key();
    let verdict = Verifier::with_key(&key).verify_paths(&missing_image, &list_path, &mut NoProgress);
    match verdict {
        Verdict::Failed { kind, .. } => assert_eq!(kind, FailureKind::Signature),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn verify_paths_missing_chunklist_is_io_failure() {
    let dir = tempdir().unwrap();
    let key = fixture::test_key();
    let verdict = Verifier::with_key(&key).verify_paths(
        &dir.path().join("a.dmg"),
        &dir.path().join("a.chunklist"),
        &mut NoProgress,
    );
    match verdict {
        Verdict::Failed { kind, message, .. } => {
            assert_eq!(kind, FailureKind::Io);
            assert!(message.contains("a.chunklist"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

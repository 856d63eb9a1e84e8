//! Verify command: authenticate the chunklist, then check the image against it.

use anyhow::{bail, Result};
use chunkcheck_core::config::ChunkcheckConfig;
use chunkcheck_core::Verifier;
use std::io;
use std::path::{Path, PathBuf};

use crate::cli::progress::TerminalProgress;

const IMAGE_EXT: &str = "dmg";
const CHUNKLIST_EXT: &str = "chunklist";

#[derive(Debug, Default)]
pub struct VerifyArgs {
    pub image: Option<PathBuf>,
    pub chunklist: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub basename: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

/// Verify one image/chunklist pair with the embedded recovery key.
pub fn run_verify(cfg: &ChunkcheckConfig, args: VerifyArgs) -> Result<()> {
    let (image, chunklist) = resolve_pair(cfg, &args)?;

    let show_chunks = cfg.show_progress && !args.quiet && !args.json;
    let mut progress = TerminalProgress::new(io::stderr(), show_chunks);
    let verdict = Verifier::recovery()
        .buffer_bytes(cfg.buffer_bytes())
        .verify_paths(&image, &chunklist, &mut progress);

    if args.json {
        println!("{}", verdict.to_json()?);
    }
    if !verdict.is_verified() {
        bail!("{} did not verify against {}", image.display(), chunklist.display());
    }
    Ok(())
}

/// Work out which files to verify.
///
/// Explicit paths win. A lone image path pairs with the same path ending in
/// `.chunklist`. With no paths, `<dir>/<basename>.dmg` and
/// `<dir>/<basename>.chunklist` are used, falling back to the configured
/// recovery directory and basename.
fn resolve_pair(cfg: &ChunkcheckConfig, args: &VerifyArgs) -> Result<(PathBuf, PathBuf)> {
    match (&args.image, &args.chunklist) {
        (Some(image), Some(chunklist)) => Ok((image.clone(), chunklist.clone())),
        (Some(image), None) => Ok((image.clone(), image.with_extension(CHUNKLIST_EXT))),
        (None, _) => {
            let dir = args.dir.as_deref().unwrap_or(cfg.recovery_dir.as_path());
            let name = args.basename.as_deref().unwrap_or(cfg.default_basename.as_str());
            check_basename(name)?;
            Ok((
                pair_path(dir, name, IMAGE_EXT),
                pair_path(dir, name, CHUNKLIST_EXT),
            ))
        }
    }
}

fn check_basename(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        bail!("invalid basename {:?}", name);
    }
    Ok(())
}

fn pair_path(dir: &Path, name: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, ext))
}

//! Digest command: print the running digest a chunklist signature covers.

use anyhow::Result;
use chunkcheck_core::digest;
use std::path::Path;

pub fn run_digest(chunklist: &Path) -> Result<()> {
    let digest = digest::chunklist_digest_path(chunklist)?;
    println!("{}  {}", digest, chunklist.display());
    Ok(())
}

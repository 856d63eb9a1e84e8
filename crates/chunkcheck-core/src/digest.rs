//! Chunklist running digest from a file, for comparing against published
//! values. Nothing here authenticates the manifest.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::chunklist::Chunklist;

/// Parse a chunklist and return its running digest (header + chunk table) as
/// lowercase hex. The signature is not checked.
pub fn chunklist_digest_path(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let list = Chunklist::read(BufReader::new(file))
        .with_context(|| format!("parse chunklist {}", path.display()))?;
    Ok(list.digest_hex())
}

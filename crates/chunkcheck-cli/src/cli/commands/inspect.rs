//! Inspect command: dump a chunklist's header and chunk table.

use anyhow::{Context, Result};
use chunkcheck_core::chunklist::Chunklist;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parse the chunklist and print a summary. The signature is reported, not checked.
pub fn run_inspect(path: &Path, show_chunks: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let list = Chunklist::read(BufReader::new(file))
        .with_context(|| format!("parse chunklist {}", path.display()))?;
    print!("{}", describe(&list, show_chunks));
    Ok(())
}

fn describe(list: &Chunklist, show_chunks: bool) -> String {
    let mut s = String::new();
    let method = list.header.signature_method;
    let _ = writeln!(s, "signature method: {:?} ({})", method, method.as_u8());
    let _ = writeln!(
        s,
        "signature block:  {} of {} bytes",
        list.signature.bytes.len(),
        method.block_len()
    );
    let _ = writeln!(s, "chunks:           {}", list.header.chunk_count);
    let _ = writeln!(s, "image size:       {} bytes", list.image_len());
    let _ = writeln!(s, "digest:           {}", list.digest_hex());
    if show_chunks {
        let mut offset = 0u64;
        for (i, c) in list.chunks.iter().enumerate() {
            let _ = writeln!(
                s,
                "{:>6}  {:>12}  {:>10}  {}",
                i,
                offset,
                c.size,
                hex::encode(c.sha256)
            );
            offset += u64::from(c.size);
        }
    }
    s
}

//! Terminal progress for the verify command.

use chunkcheck_core::{Verdict, VerifySink};
use std::io::Write;

/// Rewrites one status line per verified chunk, then prints the outcome.
pub struct TerminalProgress<W: Write> {
    out: W,
    show_chunks: bool,
    line_open: bool,
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W, show_chunks: bool) -> Self {
        Self {
            out,
            show_chunks,
            line_open: false,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

// Write errors are ignored: progress must never change the verdict.
impl<W: Write> VerifySink for TerminalProgress<W> {
    fn chunk_verified(&mut self, index: u64, size: u32) {
        if !self.show_chunks {
            return;
        }
        // Counted from 1 on screen; errors and verdicts keep the 0-based index.
        let _ = write!(self.out, "\rChunk {} ({} bytes)", index + 1, size);
        let _ = self.out.flush();
        self.line_open = true;
    }

    fn finished(&mut self, verdict: &Verdict) {
        if self.line_open {
            let _ = writeln!(self.out);
            self.line_open = false;
        }
        let _ = match verdict {
            Verdict::Verified { .. } => writeln!(self.out, "Image verification complete!"),
            Verdict::Failed { message, .. } => {
                writeln!(self.out, "Image verification failed. ({})", message)
            }
        };
    }
}

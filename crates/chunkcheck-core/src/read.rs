//! Blocking read helpers shared by the manifest and image readers.

use std::io::{self, Read};

/// Read until `buf` is full or the source reports EOF. Returns the number of
/// bytes placed in `buf`; a short count means the source ran dry.
pub(crate) fn read_full<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// True if the source has at least one more byte.
pub(crate) fn has_more<R: Read + ?Sized>(r: &mut R) -> io::Result<bool> {
    let mut probe = [0u8; 1];
    Ok(read_full(r, &mut probe)? != 0)
}

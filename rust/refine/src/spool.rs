// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deferred output for the element section
//!
//! While elements are refined, new midpoint nodes must appear in the output
//! before the elements that use them. Element output is collected here and
//! replayed once the element section is over.

use std::io::{self, Write};

/// In-memory buffer replayed in write order
#[derive(Debug, Default)]
pub struct Spool {
    buf: Vec<u8>,
    lines: usize,
}

impl Spool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered lines
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Write everything buffered to `out` and release the buffer
    ///
    /// Returns the number of bytes replayed.
    pub fn drain_into<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<usize> {
        out.write_all(&self.buf)?;
        let bytes = self.buf.len();
        self.buf = Vec::new();
        self.lines = 0;
        Ok(bytes)
    }
}

impl Write for Spool {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.lines += data.iter().filter(|&&b| b == b'\n').count();
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

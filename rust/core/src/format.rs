// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output record formatting

use std::io::{self, Write};

use crate::record::{ElemId, NodeId};

/// Write an `id,x,y,z` node record with six decimals per coordinate
#[inline]
pub fn write_node_record<W: Write + ?Sized>(
    out: &mut W,
    id: NodeId,
    x: f64,
    y: f64,
    z: f64,
) -> io::Result<()> {
    writeln!(out, "{},{:.6},{:.6},{:.6}", id, x, y, z)
}

/// Write an `id,n0,n1,...` element record
#[inline]
pub fn write_element_record<W: Write + ?Sized>(
    out: &mut W,
    id: ElemId,
    nodes: &[NodeId],
) -> io::Result<()> {
    write!(out, "{}", id)?;
    for node in nodes {
        write!(out, ",{}", node)?;
    }
    writeln!(out)
}

/// Copy a line through unchanged, terminating it if the input did not
#[inline]
pub fn write_verbatim<W: Write + ?Sized>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming line classifier
//!
//! Reads a FrontSTR mesh file one line at a time and tags every line as a
//! comment, a section header or a data record. The section kind of the most
//! recent header sticks to all following data lines.

use std::io::{BufRead, Read};

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::multispace0,
    combinator::value,
    sequence::preceded,
    IResult,
};

use crate::error::{Error, Result};

/// Longest accepted line, not counting the line terminator.
pub const MAX_LINE_LEN: usize = 1022;

/// Bytes read per line before giving up: the longest line, `\r\n`, and one
/// byte to tell an over-long line from a full one
const READ_LIMIT: u64 = MAX_LINE_LEN as u64 + 3;

/// Section a header opens (and that its data lines belong to)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionKind {
    /// No header seen yet
    None,
    Node,
    Element,
    NGroup,
    EGroup,
    /// Any other `!` header (`!HEADER`, `!SGROUP`, `!END`, ...)
    Other,
}

/// How a single line is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    /// `#...`, `!!...` or a blank line
    Comment,
    /// `!KEYWORD...`
    Header,
    /// Comma-separated record of the active section
    Data,
}

/// One classified input line, borrowed from the classifier's buffer
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// Raw text including the line terminator (if any)
    pub text: &'a str,
    pub mode: LineMode,
    pub section: SectionKind,
    /// 1-based line number
    pub number: usize,
}

/// Recognize the keyword following the `!` of a header line
fn header_keyword(input: &str) -> IResult<&str, SectionKind> {
    preceded(
        multispace0,
        alt((
            value(SectionKind::Node, tag("NODE")),
            value(SectionKind::Element, tag("ELEMENT")),
            value(SectionKind::NGroup, tag("NGROUP")),
            value(SectionKind::EGroup, tag("EGROUP")),
        )),
    )(input)
}

/// Section kind of a header line (`text` starts with a single `!`)
pub fn header_kind(text: &str) -> SectionKind {
    let rest = text.strip_prefix('!').unwrap_or(text);
    match header_keyword(rest) {
        Ok((_, kind)) => kind,
        Err(_) => SectionKind::Other,
    }
}

/// Classify a line on its own, without section state
pub fn line_mode(text: &str) -> LineMode {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b'#') => LineMode::Comment,
        Some(b'!') if bytes.get(1) == Some(&b'!') => LineMode::Comment,
        Some(b'!') => LineMode::Header,
        _ if text.trim().is_empty() => LineMode::Comment,
        _ => LineMode::Data,
    }
}

/// Pull-based line classifier over any buffered reader
///
/// # Example
///
/// ```
/// use fstr_mesh_core::{LineClassifier, LineMode, SectionKind};
///
/// let input = "!NODE\n1,0.0,0.0,0.0\n";
/// let mut lines = LineClassifier::new(input.as_bytes());
///
/// let header = lines.next_line().unwrap().unwrap();
/// assert_eq!(header.mode, LineMode::Header);
///
/// let data = lines.next_line().unwrap().unwrap();
/// assert_eq!(data.section, SectionKind::Node);
/// ```
pub struct LineClassifier<R> {
    reader: R,
    buf: Vec<u8>,
    section: SectionKind,
    line_number: usize,
}

impl<R: BufRead> LineClassifier<R> {
    /// Create a new classifier
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(MAX_LINE_LEN + 2),
            section: SectionKind::None,
            line_number: 0,
        }
    }

    /// Read and classify the next line. Returns `Ok(None)` at end of input.
    pub fn next_line(&mut self) -> Result<Option<Line<'_>>> {
        self.buf.clear();
        let read = (&mut self.reader)
            .take(READ_LIMIT)
            .read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        let number = self.line_number;

        if read as u64 == READ_LIMIT && self.buf.last() != Some(&b'\n') {
            return Err(Error::LineTooLong { line: number });
        }

        let mut content_len = self.buf.len();
        while content_len > 0 && matches!(self.buf[content_len - 1], b'\n' | b'\r') {
            content_len -= 1;
        }
        if content_len > MAX_LINE_LEN {
            return Err(Error::LineTooLong { line: number });
        }

        let text =
            std::str::from_utf8(&self.buf).map_err(|_| Error::InvalidUtf8 { line: number })?;

        let mode = line_mode(text);
        let section = match mode {
            LineMode::Comment => self.section,
            LineMode::Header => {
                self.section = header_kind(text);
                self.section
            }
            LineMode::Data => {
                if self.section == SectionKind::None {
                    return Err(Error::DataBeforeHeader { line: number });
                }
                self.section
            }
        };

        Ok(Some(Line {
            text,
            mode,
            section,
            number,
        }))
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tetrahedral element types and `!ELEMENT` header handling

use std::fmt;

use memchr::memmem;

use crate::error::{Error, Result};

/// Element types understood by the converters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// 4-node linear tetrahedron ("341")
    Linear4,
    /// 10-node quadratic tetrahedron ("342")
    Quadratic10,
}

impl ElementType {
    /// FrontSTR type code
    pub const fn code(self) -> &'static str {
        match self {
            ElementType::Linear4 => "341",
            ElementType::Quadratic10 => "342",
        }
    }

    /// Number of nodes per element
    pub const fn node_count(self) -> usize {
        match self {
            ElementType::Linear4 => 4,
            ElementType::Quadratic10 => 10,
        }
    }

    /// The type on the other side of a 341 <-> 342 conversion
    pub const fn counterpart(self) -> Self {
        match self {
            ElementType::Linear4 => ElementType::Quadratic10,
            ElementType::Quadratic10 => ElementType::Linear4,
        }
    }

    /// Element type for a record with `node_count` node fields
    pub fn from_node_count(node_count: usize) -> Option<Self> {
        match node_count {
            4 => Some(ElementType::Linear4),
            10 => Some(ElementType::Quadratic10),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A resolved `!ELEMENT` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHeader {
    pub element_type: ElementType,
    /// Byte offset of the type token inside the header text
    pub token_at: usize,
}

impl ElementHeader {
    /// Locate the type token in an `!ELEMENT` header of unknown type. The
    /// earliest `341` or `342` occurrence wins.
    pub fn parse(header: &str) -> Result<Self> {
        let bytes = header.as_bytes();
        let linear = memmem::find(bytes, ElementType::Linear4.code().as_bytes());
        let quadratic = memmem::find(bytes, ElementType::Quadratic10.code().as_bytes());

        let (element_type, token_at) = match (linear, quadratic) {
            (Some(l), Some(q)) if q < l => (ElementType::Quadratic10, q),
            (Some(l), _) => (ElementType::Linear4, l),
            (None, Some(q)) => (ElementType::Quadratic10, q),
            (None, None) => {
                return Err(Error::MissingElementType {
                    header: header.trim_end().to_string(),
                })
            }
        };

        Ok(Self {
            element_type,
            token_at,
        })
    }

    /// Locate `expected`'s type code in an `!ELEMENT` header, ignoring any
    /// occurrence of the other code (group names such as `EGRP=PART342`).
    pub fn find(header: &str, expected: ElementType) -> Result<Self> {
        match memmem::find(header.as_bytes(), expected.code().as_bytes()) {
            Some(token_at) => Ok(Self {
                element_type: expected,
                token_at,
            }),
            None => Err(Error::MissingElementType {
                header: header.trim_end().to_string(),
            }),
        }
    }

    /// Header text with the type token replaced by `target`'s code
    pub fn rewrite(&self, header: &str, target: ElementType) -> String {
        let token_end = self.token_at + self.element_type.code().len();
        let mut out = String::with_capacity(header.len());
        out.push_str(&header[..self.token_at]);
        out.push_str(target.code());
        out.push_str(&header[token_end..]);
        out
    }
}

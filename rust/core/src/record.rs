// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data record decoding
//!
//! Node, element and group records are short comma-separated lines. They are
//! decoded directly from the line text with lexical-core (integers) and
//! fast-float (coordinates), without building intermediate tokens.

use smallvec::SmallVec;

use crate::element_type::ElementType;
use crate::error::{Error, Result};

/// Externally supplied node ID
pub type NodeId = i64;

/// Externally supplied element ID
pub type ElemId = i64;

/// Most integer fields a record is scanned for (id + 10 nodes + 1 extra)
pub const MAX_RECORD_FIELDS: usize = 12;

/// Leading integer fields of a record
pub type IntFields = SmallVec<[i64; MAX_RECORD_FIELDS]>;

/// Node list of a single element
pub type NodeList = SmallVec<[NodeId; 10]>;

/// A decoded `id,x,y,z` node record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A decoded element record
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub id: ElemId,
    pub nodes: NodeList,
}

impl ElementRecord {
    /// Element type implied by the node count
    pub fn element_type(&self) -> Option<ElementType> {
        ElementType::from_node_count(self.nodes.len())
    }
}

#[inline]
fn fields(text: &str) -> impl Iterator<Item = &str> {
    text.trim_end_matches(['\n', '\r'])
        .split(',')
        .map(|field| field.trim_matches(|c: char| c.is_ascii_whitespace()))
}

#[inline]
fn parse_int(field: &str) -> Option<i64> {
    if field.is_empty() {
        return None;
    }
    lexical_core::parse::<i64>(field.as_bytes()).ok()
}

/// Leading integer of a field and whether the whole field was consumed
#[inline]
fn parse_int_prefix(field: &str) -> Option<(i64, bool)> {
    match lexical_core::parse_partial::<i64>(field.as_bytes()) {
        Ok((value, used)) if used > 0 => Some((value, used == field.len())),
        _ => None,
    }
}

#[inline]
fn parse_float(field: &str) -> Option<f64> {
    if field.is_empty() {
        return None;
    }
    fast_float::parse::<f64, _>(field).ok()
}

/// Scan the leading integer fields of a record
///
/// Scanning stops at the first field that does not start with an integer,
/// after a field with text following its integer (`4 junk` counts as `4`),
/// or after [`MAX_RECORD_FIELDS`] fields. Trailing text is therefore
/// ignored, but a surplus integer field shows up in the count.
pub fn parse_int_fields(text: &str) -> IntFields {
    let mut ints = IntFields::new();
    for field in fields(text).take(MAX_RECORD_FIELDS) {
        match parse_int_prefix(field) {
            Some((value, whole)) => {
                ints.push(value);
                if !whole {
                    break;
                }
            }
            None => break,
        }
    }
    ints
}

/// Decode an `id,x,y,z` node record. Fields after `z` are ignored.
pub fn parse_node_record(text: &str) -> Result<NodeRecord> {
    let mut it = fields(text);

    let id = it
        .next()
        .and_then(parse_int)
        .ok_or_else(|| Error::parse("node", format!("bad node id in {:?}", text.trim_end())))?;

    let mut coords = [0.0f64; 3];
    for (axis, slot) in coords.iter_mut().enumerate() {
        *slot = it.next().and_then(parse_float).ok_or_else(|| {
            Error::parse(
                "node",
                format!("node {}: missing or bad coordinate {}", id, axis + 1),
            )
        })?;
    }

    Ok(NodeRecord {
        id,
        x: coords[0],
        y: coords[1],
        z: coords[2],
    })
}

/// Decode an element record that must carry exactly `element_type`'s node
/// count after the id.
pub fn parse_element_record(text: &str, element_type: ElementType) -> Result<ElementRecord> {
    let ints = parse_int_fields(text);
    let expected = element_type.node_count() + 1;
    if ints.len() != expected {
        return Err(Error::parse(
            "element",
            format!(
                "expected {} integer fields for type {}, found {}",
                expected,
                element_type,
                ints.len()
            ),
        ));
    }

    Ok(ElementRecord {
        id: ints[0],
        nodes: ints[1..].iter().copied().collect(),
    })
}

/// Decode a group record holding a single ID
pub fn parse_id_record(text: &str) -> Result<i64> {
    fields(text)
        .next()
        .and_then(parse_int)
        .ok_or_else(|| Error::parse("group", format!("bad id in {:?}", text.trim_end())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_record() {
        let node = parse_node_record("12, 1.5, -2.0e-3, 3.0\n").unwrap();
        assert_eq!(node.id, 12);
        assert_eq!(node.x, 1.5);
        assert_eq!(node.y, -2.0e-3);
        assert_eq!(node.z, 3.0);
    }

    #[test]
    fn test_parse_node_record_missing_coordinate() {
        let err = parse_node_record("12,1.0,2.0\n").unwrap_err();
        assert!(err.to_string().contains("coordinate 3"), "{}", err);
        assert!(parse_node_record("x,1,2,3").is_err());
    }

    #[test]
    fn test_int_fields_stop_at_junk() {
        assert_eq!(parse_int_fields("1,2,3,4,5,\n").as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(parse_int_fields(" 7, 8 ,9,abc,10").as_slice(), &[7, 8, 9]);
        assert!(parse_int_fields("").is_empty());
        assert_eq!(parse_int_fields("1,2,3,4 junk,5").as_slice(), &[1, 2, 3, 4]);
        assert_eq!(parse_int_fields("1,2x,3").as_slice(), &[1, 2]);
    }

    #[test]
    fn test_parse_linear_element() {
        let elem = parse_element_record("1,1,2,3,4\n", ElementType::Linear4).unwrap();
        assert_eq!(elem.id, 1);
        assert_eq!(elem.nodes.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(elem.element_type(), Some(ElementType::Linear4));

        // trailing junk is tolerated, a surplus integer is not
        assert!(parse_element_record("1,1,2,3,4,", ElementType::Linear4).is_ok());
        let elem = parse_element_record("1,1,2,3,4 junk\n", ElementType::Linear4).unwrap();
        assert_eq!(elem.nodes.as_slice(), &[1, 2, 3, 4]);
        assert!(parse_element_record("1,1,2,3,4,5", ElementType::Linear4).is_err());
        assert!(parse_element_record("1,1,2,3", ElementType::Linear4).is_err());
    }

    #[test]
    fn test_parse_quadratic_element() {
        let elem =
            parse_element_record("3,1,2,3,4,5,6,7,8,9,10\n", ElementType::Quadratic10).unwrap();
        assert_eq!(elem.id, 3);
        assert_eq!(elem.nodes.len(), 10);
        assert!(parse_element_record("3,1,2,3,4", ElementType::Quadratic10).is_err());
    }

    #[test]
    fn test_parse_id_record() {
        assert_eq!(parse_id_record(" 42\n").unwrap(), 42);
        assert!(parse_id_record("ALL").is_err());
    }
}

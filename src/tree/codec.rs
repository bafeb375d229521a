//! Versioned binary encoding of a [`SecretTree`].
//!
//! The payload that gets encrypted into the store file looks like:
//!
//! ```text
//! [KTRE: 4 bytes][schema version: 1 byte][root record]
//! ```
//!
//! A record (version 2) is:
//!
//! ```text
//! child_count: u32 BE
//! repeated child_count times:
//!     label_len: u32 BE, label bytes (UTF-8)
//!     flag: u8 (0 = no value, 1 = value follows)
//!     [value_len: u32 BE, value bytes]      -- only when flag == 1
//!     child record (recursive)
//! ```
//!
//! Version 1 is the older compact layout: `u16` counts and lengths and
//! no presence flag, with an empty value meaning "no value".  It is
//! decoded for migration only; everything is written back as version 2.
//!
//! Decoding is strict: every length is checked against the remaining
//! input and trailing bytes are an error.

use super::node::{Node, SecretTree};
use super::path;
use crate::errors::{KeyTreeError, Result};

/// Magic bytes at the start of every decrypted payload.
const MAGIC: &[u8; 4] = b"KTRE";

/// Schema version written by `encode`.
pub const CURRENT_VERSION: u8 = 2;

/// The compact pre-flag layout.
pub const LEGACY_VERSION: u8 = 1;

/// Deepest nesting written or read; shared with path parsing.
const MAX_DEPTH: usize = path::MAX_DEPTH;

/// Serialize `tree` into a version-2 payload.
pub fn encode(tree: &SecretTree) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    encode_record(tree.root(), &mut buf, 0)?;
    Ok(buf)
}

fn encode_record(node: &Node, buf: &mut Vec<u8>, depth: usize) -> Result<()> {
    check_depth(depth)?;
    put_len(buf, node.children().len())?;
    for (label, child) in node.children() {
        put_len(buf, label.len())?;
        buf.extend_from_slice(label.as_bytes());
        match child.value() {
            Some(value) => {
                buf.push(1);
                put_len(buf, value.len())?;
                buf.extend_from_slice(value);
            }
            None => buf.push(0),
        }
        encode_record(child, buf, depth + 1)?;
    }
    Ok(())
}

fn put_len(buf: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        KeyTreeError::InvalidStoreFormat(format!("length {len} exceeds u32::MAX"))
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

/// Whether `payload` starts with the codec's magic bytes.
///
/// A payload decrypted under the wrong key fails this check; one that
/// passes it came from the right key even if the rest is unreadable.
pub fn has_magic(payload: &[u8]) -> bool {
    payload.starts_with(MAGIC)
}

/// Parse a payload produced by `encode` (or a legacy version-1 payload).
///
/// Returns the tree together with the schema version it was read from,
/// so callers can tell when a migration happened.
pub fn decode(payload: &[u8]) -> Result<(SecretTree, u8)> {
    let mut reader = Reader::new(payload);

    if reader.take(MAGIC.len())? != MAGIC {
        return Err(KeyTreeError::InvalidStoreFormat(
            "missing KTRE magic bytes".into(),
        ));
    }

    let version = reader.u8()?;
    let mut root = Node::default();
    match version {
        CURRENT_VERSION => decode_children_v2(&mut reader, &mut root, 0)?,
        LEGACY_VERSION => decode_children_v1(&mut reader, &mut root, 0)?,
        other => return Err(KeyTreeError::UnsupportedVersion(other)),
    }

    if !reader.is_at_end() {
        return Err(KeyTreeError::InvalidStoreFormat(format!(
            "{} trailing bytes after tree record",
            reader.remaining()
        )));
    }

    Ok((SecretTree::from_root(root), version))
}

fn decode_children_v2(reader: &mut Reader<'_>, parent: &mut Node, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let count = reader.u32()?;
    for _ in 0..count {
        let label_len = reader.u32()? as usize;
        let label = read_label(reader, label_len)?;
        let mut child = Node::default();
        match reader.u8()? {
            0 => {}
            1 => {
                let len = reader.u32()? as usize;
                child.set_value(reader.take(len)?.to_vec());
            }
            flag => {
                return Err(KeyTreeError::InvalidStoreFormat(format!(
                    "invalid value flag {flag}"
                )))
            }
        }
        decode_children_v2(reader, &mut child, depth + 1)?;
        insert_unique(parent, label, child)?;
    }
    Ok(())
}

fn decode_children_v1(reader: &mut Reader<'_>, parent: &mut Node, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let count = reader.u16()?;
    for _ in 0..count {
        let label_len = reader.u16()? as usize;
        let label = read_label(reader, label_len)?;
        let value_len = reader.u16()? as usize;
        let mut child = Node::default();
        if value_len > 0 {
            child.set_value(reader.take(value_len)?.to_vec());
        }
        decode_children_v1(reader, &mut child, depth + 1)?;
        insert_unique(parent, label, child)?;
    }
    Ok(())
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(KeyTreeError::InvalidStoreFormat(format!(
            "tree nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

fn read_label(reader: &mut Reader<'_>, len: usize) -> Result<String> {
    let bytes = reader.take(len)?;
    let label = std::str::from_utf8(bytes)
        .map_err(|_| KeyTreeError::InvalidStoreFormat("label is not valid UTF-8".into()))?;
    if !path::is_valid_label(label) {
        return Err(KeyTreeError::InvalidStoreFormat(format!(
            "invalid label '{label}'"
        )));
    }
    Ok(label.to_string())
}

fn insert_unique(parent: &mut Node, label: String, child: Node) -> Result<()> {
    if parent.child(&label).is_some() {
        return Err(KeyTreeError::InvalidStoreFormat(format!(
            "duplicate label '{label}'"
        )));
    }
    parent.insert_child(label, child);
    Ok(())
}

/// Bounds-checked cursor over a byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(KeyTreeError::InvalidStoreFormat(format!(
                "truncated payload: need {len} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> SecretTree {
        let mut tree = SecretTree::new();
        tree.descendant_mut("email/gmail", true)
            .unwrap()
            .unwrap()
            .set_value(vec![1, 2, 3]);
        tree.descendant_mut("email", true)
            .unwrap()
            .unwrap()
            .set_value(vec![9]);
        tree.descendant_mut("bank/checking/pin", true).unwrap();
        tree
    }

    #[test]
    fn encode_then_decode_preserves_structure() {
        let tree = sample_tree();
        let (decoded, version) = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(version, CURRENT_VERSION);
        assert_eq!(decoded.root(), tree.root());
    }

    #[test]
    fn empty_tree_is_nine_bytes() {
        let bytes = encode(&SecretTree::new()).unwrap();
        assert_eq!(bytes, b"KTRE\x02\x00\x00\x00\x00");
        assert!(decode(&bytes).unwrap().0.is_empty());
    }

    #[test]
    fn legacy_payload_is_migrated() {
        // One child "a" with value [7, 7] and one grandchild "b" without.
        let mut payload = b"KTRE\x01".to_vec();
        payload.extend_from_slice(&[0, 1]); // root: 1 child
        payload.extend_from_slice(&[0, 1, b'a']); // label "a"
        payload.extend_from_slice(&[0, 2, 7, 7]); // value
        payload.extend_from_slice(&[0, 1]); // "a": 1 child
        payload.extend_from_slice(&[0, 1, b'b']); // label "b"
        payload.extend_from_slice(&[0, 0]); // no value
        payload.extend_from_slice(&[0, 0]); // "b": no children

        let (tree, version) = decode(&payload).unwrap();
        assert_eq!(version, LEGACY_VERSION);
        let a = tree.descendant("a").unwrap().unwrap();
        assert_eq!(a.value(), Some(&[7u8, 7][..]));
        assert!(!tree.descendant("a/b").unwrap().unwrap().has_value());

        // Re-encoding always produces the current layout.
        let (again, version) = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(version, CURRENT_VERSION);
        assert_eq!(again.root(), tree.root());
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            decode(b"NOPE\x02\x00\x00\x00\x00"),
            Err(KeyTreeError::InvalidStoreFormat(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        assert!(matches!(
            decode(b"KTRE\x09\x00\x00\x00\x00"),
            Err(KeyTreeError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_truncation_at_every_offset() {
        let bytes = encode(&sample_tree()).unwrap();
        for cut in 0..bytes.len() {
            assert!(decode(&bytes[..cut]).is_err(), "cut at {cut} decoded");
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode(&sample_tree()).unwrap();
        bytes.push(0);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn rejects_oversized_length() {
        let mut payload = b"KTRE\x02".to_vec();
        payload.extend_from_slice(&1u32.to_be_bytes());
        payload.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn rejects_slash_in_label() {
        let mut payload = b"KTRE\x02".to_vec();
        payload.extend_from_slice(&1u32.to_be_bytes());
        payload.extend_from_slice(&3u32.to_be_bytes());
        payload.extend_from_slice(b"a/b");
        payload.push(0);
        payload.extend_from_slice(&0u32.to_be_bytes());
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn rejects_duplicate_labels() {
        let mut payload = b"KTRE\x02".to_vec();
        payload.extend_from_slice(&2u32.to_be_bytes());
        for _ in 0..2 {
            payload.extend_from_slice(&1u32.to_be_bytes());
            payload.push(b'x');
            payload.push(0);
            payload.extend_from_slice(&0u32.to_be_bytes());
        }
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn rejects_bad_flag() {
        let mut payload = b"KTRE\x02".to_vec();
        payload.extend_from_slice(&1u32.to_be_bytes());
        payload.extend_from_slice(&1u32.to_be_bytes());
        payload.push(b'x');
        payload.push(5);
        payload.extend_from_slice(&0u32.to_be_bytes());
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn magic_check_only_looks_at_the_prefix() {
        assert!(has_magic(b"KTRE\x09garbage"));
        assert!(!has_magic(b"KTR"));
        assert!(!has_magic(b"XTRE\x02\x00\x00\x00\x00"));
    }

    #[test]
    fn rejects_excessive_depth() {
        let mut payload = b"KTRE\x02".to_vec();
        for _ in 0..=MAX_DEPTH + 1 {
            payload.extend_from_slice(&1u32.to_be_bytes());
            payload.extend_from_slice(&1u32.to_be_bytes());
            payload.push(b'x');
            payload.push(0);
        }
        payload.extend_from_slice(&0u32.to_be_bytes());
        assert!(decode(&payload).is_err());
    }

    /// Build a single chain `n/n/.../n` with `levels` nodes by hand,
    /// bypassing path parsing.
    fn chain(levels: usize) -> SecretTree {
        let mut node = Node::default();
        node.set_value(b"leaf".to_vec());
        for _ in 1..levels {
            let mut parent = Node::default();
            parent.insert_child("n".to_string(), node);
            node = parent;
        }
        let mut root = Node::default();
        root.insert_child("n".to_string(), node);
        SecretTree::from_root(root)
    }

    #[test]
    fn deepest_allowed_tree_survives_encoding() {
        let tree = chain(MAX_DEPTH);
        let (decoded, _) = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(decoded.root(), tree.root());
    }

    #[test]
    fn encode_refuses_trees_the_decoder_would_reject() {
        assert!(matches!(
            encode(&chain(MAX_DEPTH + 1)),
            Err(KeyTreeError::InvalidStoreFormat(_))
        ));
    }
}

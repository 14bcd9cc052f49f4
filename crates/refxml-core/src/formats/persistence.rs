//! Binary snapshot format.
//!
//! Layout: 4-byte magic `RXGS`, 1-byte format version, postcard body.
//! Slot numbering is stored as-is, so a snapshot reproduces the arena
//! exactly rather than just an equivalent graph.

use crate::{Document, RefXmlError, Result};

/// Magic bytes at the start of every snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"RXGS";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 1;

/// True if `bytes` start with the snapshot magic.
#[must_use]
pub fn is_snapshot(bytes: &[u8]) -> bool {
    bytes.starts_with(&SNAPSHOT_MAGIC)
}

/// Encode a document as a binary snapshot.
pub fn encode_snapshot(doc: &Document) -> Result<Vec<u8>> {
    let body = postcard::to_allocvec(doc)?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&SNAPSHOT_MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode and validate a binary snapshot.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Document> {
    if bytes.len() < HEADER_LEN || !is_snapshot(bytes) {
        return Err(RefXmlError::InvalidSnapshot("missing RXGS header".to_string()));
    }
    let version = bytes[SNAPSHOT_MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(RefXmlError::InvalidSnapshot(format!(
            "unsupported version {version} (expected {SNAPSHOT_VERSION})"
        )));
    }
    let doc: Document = postcard::from_bytes(&bytes[HEADER_LEN..])?;
    doc.validate()?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::{ObjectGraph, ObjectId, Root};

    #[test]
    fn snapshot_roundtrip_is_exact() {
        let doc = fixtures::full_sample();
        let bytes = encode_snapshot(&doc).expect("encode");
        assert!(is_snapshot(&bytes));
        assert_eq!(bytes[4], SNAPSHOT_VERSION);

        let restored = decode_snapshot(&bytes).expect("decode");
        assert_eq!(restored, doc);
    }

    #[test]
    fn rejects_missing_header() {
        let result = decode_snapshot(b"<ClassReference/>");
        assert!(matches!(result, Err(RefXmlError::InvalidSnapshot(_))));
        assert!(matches!(decode_snapshot(b"RX"), Err(RefXmlError::InvalidSnapshot(_))));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode_snapshot(&fixtures::self_cycle(1)).expect("encode");
        bytes[4] = 99;
        assert!(matches!(
            decode_snapshot(&bytes),
            Err(RefXmlError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn rejects_dangling_ids() {
        let doc = crate::Document::new(ObjectGraph::new(), Root::Reference(ObjectId(0)));
        let bytes = encode_snapshot(&doc).expect("encode");
        assert!(matches!(
            decode_snapshot(&bytes),
            Err(RefXmlError::UnknownObject(ObjectId(0)))
        ));
    }

    #[test]
    fn rejects_truncated_body() {
        let bytes = encode_snapshot(&fixtures::with_list(3)).expect("encode");
        let truncated = &bytes[..bytes.len() - 2];
        assert!(matches!(
            decode_snapshot(truncated),
            Err(RefXmlError::Postcard(_))
        ));
    }
}

//! # Primitives
//!
//! Identifier types and engine-wide bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum element nesting accepted by the reader and produced
/// by the writer.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default cap on object elements written for one document. Only reachable
/// when aliases are expanded with references disabled.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 20;

/// Stable index of an object inside an [`ObjectGraph`](crate::ObjectGraph).
///
/// Two fields holding the same `ObjectId` refer to the same object.
/// Indices are assigned sequentially and never reused.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Get the raw slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_orders_by_index() {
        assert!(ObjectId(1) < ObjectId(2));
        assert_eq!(ObjectId(7).index(), 7);
    }

    #[test]
    fn object_id_display() {
        assert_eq!(ObjectId(3).to_string(), "#3");
        assert_eq!(format!("{:?}", ObjectId(3)), "ObjectId(3)");
    }
}

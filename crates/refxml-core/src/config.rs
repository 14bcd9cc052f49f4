//! # Serializer Configuration

use crate::primitives::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_ELEMENTS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How objects are keyed in `id` / `ref` attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMode {
    /// Key is the object's own [`Reference::id`](crate::Reference::id).
    /// Distinct objects sharing an id are rejected.
    #[default]
    ById,
    /// Keys 1, 2, 3... assigned in first-visit order.
    Generated,
    /// No reference tracking. Aliases are duplicated, cycles are errors.
    Disabled,
}

impl ReferenceMode {
    #[must_use]
    pub fn tracks_references(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ById => "byid",
            Self::Generated => "generated",
            Self::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

impl FromStr for ReferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "byid" | "id" => Ok(Self::ById),
            "generated" => Ok(Self::Generated),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown reference mode '{other}' (expected byid, generated or disabled)"
            )),
        }
    }
}

/// Options shared by the XML writer and reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub reference_mode: ReferenceMode,
    /// Emit a `type` attribute on every object element.
    pub emit_type: bool,
    /// Spaces per nesting level; `None` writes compact XML.
    pub indent: Option<usize>,
    /// Emit the `<?xml ...?>` declaration.
    pub declaration: bool,
    pub max_depth: usize,
    /// Object elements the writer may emit for one document, `ref`
    /// elements included.
    pub max_elements: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            reference_mode: ReferenceMode::default(),
            emit_type: true,
            indent: Some(2),
            declaration: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}

impl SerializerConfig {
    #[must_use]
    pub fn with_reference_mode(mut self, mode: ReferenceMode) -> Self {
        self.reference_mode = mode;
        self
    }

    #[must_use]
    pub fn compact(mut self) -> Self {
        self.indent = None;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    #[must_use]
    pub fn with_max_elements(mut self, limit: usize) -> Self {
        self.max_elements = limit.max(1);
        self
    }

    /// `max_depth` as enforced. Values loaded from a config file skip the
    /// builder, so the floor is applied here too.
    #[must_use]
    pub fn depth_limit(&self) -> usize {
        self.max_depth.max(1)
    }

    #[must_use]
    pub fn element_limit(&self) -> usize {
        self.max_elements.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SerializerConfig::default();
        assert_eq!(config.reference_mode, ReferenceMode::ById);
        assert!(config.emit_type);
        assert_eq!(config.indent, Some(2));
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn reference_mode_parses() {
        assert_eq!("ById".parse::<ReferenceMode>(), Ok(ReferenceMode::ById));
        assert_eq!("generated".parse::<ReferenceMode>(), Ok(ReferenceMode::Generated));
        assert_eq!("none".parse::<ReferenceMode>(), Ok(ReferenceMode::Disabled));
        assert!("weak".parse::<ReferenceMode>().is_err());
    }

    #[test]
    fn max_depth_floor_is_one() {
        assert_eq!(SerializerConfig::default().with_max_depth(0).max_depth, 1);
        assert_eq!(SerializerConfig::default().with_max_elements(0).max_elements, 1);
    }

    #[test]
    fn zero_limits_are_floored_when_enforced() {
        let config = SerializerConfig {
            max_depth: 0,
            max_elements: 0,
            ..SerializerConfig::default()
        };
        assert_eq!(config.depth_limit(), 1);
        assert_eq!(config.element_limit(), 1);
    }
}

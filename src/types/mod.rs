//! Shared types used throughout the library.

mod lod;
mod shader;

pub use lod::{LodCutoffs, LodLevel};
pub use shader::ShaderType;

use serde::{Deserialize, Serialize};

/// How aggressively duplicate vertices are collapsed after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeLevel {
    /// Keep every vertex as authored.
    #[default]
    None,
    /// Merge bit-identical vertices only.
    Exact,
    /// Merge vertices within a small tolerance.
    Loose,
}

impl OptimizeLevel {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(OptimizeLevel::None),
            "exact" => Some(OptimizeLevel::Exact),
            "loose" => Some(OptimizeLevel::Loose),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimize_level_from_str() {
        assert_eq!(OptimizeLevel::from_str("Exact"), Some(OptimizeLevel::Exact));
        assert_eq!(OptimizeLevel::from_str("loose"), Some(OptimizeLevel::Loose));
        assert_eq!(OptimizeLevel::from_str("off"), Some(OptimizeLevel::None));
        assert_eq!(OptimizeLevel::from_str("max"), None);
    }
}

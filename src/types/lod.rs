//! Level-of-detail tiers and their distance cutoffs.

use crate::error::{MergerError, Result};
use serde::{Deserialize, Serialize};

/// The five level-of-detail tiers, most detailed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodLevel {
    #[default]
    Superhigh,
    High,
    Medium,
    Low,
    Superlow,
}

impl LodLevel {
    /// All five tiers in promotion priority order.
    pub const ALL: [LodLevel; 5] = [
        LodLevel::Superhigh,
        LodLevel::High,
        LodLevel::Medium,
        LodLevel::Low,
        LodLevel::Superlow,
    ];

    /// Slot index of this tier (superhigh = 0).
    pub fn index(&self) -> usize {
        match self {
            LodLevel::Superhigh => 0,
            LodLevel::High => 1,
            LodLevel::Medium => 2,
            LodLevel::Low => 3,
            LodLevel::Superlow => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LodLevel::Superhigh => "superhigh",
            LodLevel::High => "high",
            LodLevel::Medium => "medium",
            LodLevel::Low => "low",
            LodLevel::Superlow => "superlow",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "superhigh" => Some(LodLevel::Superhigh),
            "high" => Some(LodLevel::High),
            "medium" => Some(LodLevel::Medium),
            "low" => Some(LodLevel::Low),
            "superlow" => Some(LodLevel::Superlow),
            _ => None,
        }
    }
}

impl std::fmt::Display for LodLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera distances at which each LOD tier stops being used.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LodCutoffs {
    pub superhigh: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
    pub superlow: f32,
}

impl LodCutoffs {
    pub fn get(&self, lod: LodLevel) -> f32 {
        match lod {
            LodLevel::Superhigh => self.superhigh,
            LodLevel::High => self.high,
            LodLevel::Medium => self.medium,
            LodLevel::Low => self.low,
            LodLevel::Superlow => self.superlow,
        }
    }

    pub fn set(&mut self, lod: LodLevel, value: f32) {
        match lod {
            LodLevel::Superhigh => self.superhigh = value,
            LodLevel::High => self.high = value,
            LodLevel::Medium => self.medium = value,
            LodLevel::Low => self.low = value,
            LodLevel::Superlow => self.superlow = value,
        }
    }

    /// Parse user-entered cutoffs, superhigh first. Blank entries mean 0.
    pub fn parse(values: [&str; 5]) -> Result<Self> {
        let mut cutoffs = Self::default();
        for (lod, value) in LodLevel::ALL.into_iter().zip(values) {
            cutoffs.set(lod, parse_cutoff(lod, value)?);
        }
        Ok(cutoffs)
    }
}

fn parse_cutoff(lod: LodLevel, value: &str) -> Result<f32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MergerError::InvalidLodCutoff {
            lod,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_order_and_names() {
        for (i, lod) in LodLevel::ALL.iter().enumerate() {
            assert_eq!(lod.index(), i);
            assert_eq!(LodLevel::from_str(lod.as_str()), Some(*lod));
        }
        assert_eq!(LodLevel::from_str("HIGH"), Some(LodLevel::High));
        assert_eq!(LodLevel::from_str("ultra"), None);
        assert!(LodLevel::Superhigh < LodLevel::Superlow);
    }

    #[test]
    fn test_parse_cutoffs() {
        let cutoffs = LodCutoffs::parse(["1.5", " ", "", "20", "100.25"]).unwrap();
        assert_eq!(cutoffs.superhigh, 1.5);
        assert_eq!(cutoffs.high, 0.0);
        assert_eq!(cutoffs.medium, 0.0);
        assert_eq!(cutoffs.get(LodLevel::Low), 20.0);
        assert_eq!(cutoffs.superlow, 100.25);
    }

    #[test]
    fn test_parse_cutoffs_rejects_garbage() {
        let err = LodCutoffs::parse(["0", "far", "0", "0", "0"]).unwrap_err();
        assert!(matches!(
            err,
            MergerError::InvalidLodCutoff { lod: LodLevel::High, .. }
        ));
    }
}

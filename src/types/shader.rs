//! Shader families a material can reference.

use serde::{Deserialize, Serialize};

/// Shader tag families. The tag class (`shader_<family>`) doubles as the
/// file extension of a shader in the tags directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderType {
    Model,
    Environment,
    TransparentChicago,
    TransparentChicagoExtended,
    TransparentGeneric,
    TransparentGlass,
    TransparentMeter,
    TransparentPlasma,
    TransparentWater,
}

impl ShaderType {
    pub const ALL: [ShaderType; 9] = [
        ShaderType::Model,
        ShaderType::Environment,
        ShaderType::TransparentChicago,
        ShaderType::TransparentChicagoExtended,
        ShaderType::TransparentGeneric,
        ShaderType::TransparentGlass,
        ShaderType::TransparentMeter,
        ShaderType::TransparentPlasma,
        ShaderType::TransparentWater,
    ];

    /// Family name without the `shader_` prefix.
    pub fn family(&self) -> &'static str {
        match self {
            ShaderType::Model => "model",
            ShaderType::Environment => "environment",
            ShaderType::TransparentChicago => "transparent_chicago",
            ShaderType::TransparentChicagoExtended => "transparent_chicago_extended",
            ShaderType::TransparentGeneric => "transparent_generic",
            ShaderType::TransparentGlass => "transparent_glass",
            ShaderType::TransparentMeter => "transparent_meter",
            ShaderType::TransparentPlasma => "transparent_plasma",
            ShaderType::TransparentWater => "transparent_water",
        }
    }

    /// Tag class name, e.g. `shader_model`.
    pub fn tag_class(&self) -> String {
        format!("shader_{}", self.family())
    }

    /// Parse a tag class (`shader_model`) or bare family (`model`), case-insensitive.
    pub fn from_tag_class(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        let family = lower.strip_prefix("shader_").unwrap_or(&lower);
        Self::ALL.into_iter().find(|t| t.family() == family)
    }

    /// Parse a file extension such as `.shader_environment`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if !ext.to_lowercase().starts_with("shader_") {
            return None;
        }
        Self::from_tag_class(ext)
    }
}

impl std::fmt::Display for ShaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shader_{}", self.family())
    }
}

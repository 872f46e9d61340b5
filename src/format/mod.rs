//! Model source formats.
//!
//! Every supported format is parsed into the same [`MeshAsset`].

pub mod jms;
pub mod obj;

pub use jms::read_jms;
pub use obj::read_obj;

use crate::error::{MergerError, ParseError, Result};
use crate::mesh::MeshAsset;
use std::path::Path;

/// A supported text interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Jms,
    Obj,
}

impl ModelFormat {
    /// Extensions (without the dot) that are picked up from a models directory.
    pub const EXTENSIONS: [&'static str; 2] = ["jms", "obj"];

    /// Parse from a file extension (case-insensitive, leading dot optional).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "jms" => Some(ModelFormat::Jms),
            "obj" => Some(ModelFormat::Obj),
            _ => None,
        }
    }

    /// Detect the format of a file, rejecting unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or(MergerError::UnsupportedFormat(ext))
    }
}

/// Parse model source text in the given format.
pub fn parse_model(text: &str, model_name: &str, format: ModelFormat) -> std::result::Result<MeshAsset, ParseError> {
    match format {
        ModelFormat::Jms => read_jms(text, model_name),
        ModelFormat::Obj => read_obj(text, model_name),
    }
}

/// Model name for a source file: its file name up to the first dot.
pub fn model_name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

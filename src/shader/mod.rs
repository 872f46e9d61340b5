//! Shader reference resolution.
//!
//! Each material of a merged model is given a shader path and family by
//! the first source that knows one:
//!
//! 1. a shader reference with the same name in the previously compiled model,
//! 2. a `shader_*` file with the same name in the `shaders` directory next
//!    to the output,
//! 3. a default `shader_model` in that `shaders` directory.

use crate::merge::MergedModel;
use crate::types::ShaderType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Name of the shader directory expected next to the compiled model.
pub const SHADERS_DIR_NAME: &str = "shaders";

/// A shader used by a compiled model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderReference {
    /// Tags-root relative path without extension.
    pub path: String,
    pub shader_type: ShaderType,
    pub permutation_index: u16,
}

impl ShaderReference {
    pub fn new(path: impl Into<String>, shader_type: ShaderType) -> Self {
        Self {
            path: path.into(),
            shader_type,
            permutation_index: 0,
        }
    }

    /// Lowercased last path component, used to match material names.
    pub fn name(&self) -> String {
        basename(&self.path).to_lowercase()
    }
}

/// Where resolution looks for shaders.
#[derive(Debug, Clone, Default)]
pub struct ShaderContext {
    pub tags_dir: Option<PathBuf>,
    pub shaders_dir: Option<PathBuf>,
}

impl ShaderContext {
    /// Context for a model compiled to `output_path`.
    pub fn for_output(output_path: &Path, tags_dir: Option<&Path>) -> Self {
        Self {
            tags_dir: tags_dir.map(Path::to_path_buf),
            shaders_dir: output_path.parent().map(|p| p.join(SHADERS_DIR_NAME)),
        }
    }
}

/// Which rule resolved a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderSource {
    /// Shader reference of the previously compiled model.
    Existing,
    /// A shader file found in the shaders directory.
    ShadersDirectory,
    /// Nothing matched; defaulted to `shader_model`.
    Default,
    /// The material already had a shader type.
    Unchanged,
}

/// Resolve every material's shader. Returns the rule used per material, in
/// material order.
pub fn resolve_shaders(
    model: &mut MergedModel,
    existing: &[ShaderReference],
    context: &ShaderContext,
) -> Vec<ShaderSource> {
    let mut pool: HashMap<String, VecDeque<&ShaderReference>> = HashMap::new();
    for reference in existing {
        pool.entry(reference.name()).or_default().push_back(reference);
    }

    let local = match &context.shaders_dir {
        Some(dir) if dir.is_dir() => scan_shaders_dir(dir),
        _ => HashMap::new(),
    };

    let mut sources = Vec::with_capacity(model.materials.len());
    for material in &mut model.materials {
        if material.shader_type.is_some() {
            material.shader_path = normalize_shader_path(&material.shader_path);
            sources.push(ShaderSource::Unchanged);
            continue;
        }

        let key = material.name.to_lowercase();
        let source = if let Some(reference) = pool.get_mut(&key).and_then(VecDeque::pop_front) {
            material.shader_type = Some(reference.shader_type);
            material.shader_path = reference.path.clone();
            material.permutation_index = reference.permutation_index;
            ShaderSource::Existing
        } else if let Some((path, shader_type)) = local.get(&key) {
            material.shader_type = Some(*shader_type);
            material.shader_path = tags_relative(path, context.tags_dir.as_deref(), true)
                .unwrap_or_else(|| default_shader_path(&material.name));
            ShaderSource::ShadersDirectory
        } else {
            material.shader_type = Some(ShaderType::Model);
            material.shader_path = match (&context.shaders_dir, &context.tags_dir) {
                (Some(dir), Some(tags)) => tags_relative(&dir.join(&material.name), Some(tags.as_path()), false),
                _ => None,
            }
            .unwrap_or_else(|| default_shader_path(&material.name));
            ShaderSource::Default
        };

        material.shader_path = normalize_shader_path(&material.shader_path);
        log::debug!(
            "Shader for {:?}: {} {} ({:?})",
            material.name,
            material.shader_type.map(|t| t.tag_class()).unwrap_or_default(),
            material.shader_path,
            source
        );
        sources.push(source);
    }

    sources
}

/// Normalise a shader path to the tags-relative, backslash separated form.
///
/// Paths that climb out of the tags directory are pointed at
/// `shaders\<basename>` instead. Leading dots and backslashes are dropped.
pub fn normalize_shader_path(path: &str) -> String {
    let mut path = path.trim().replace('/', "\\");
    if path.starts_with("..\\") {
        path = default_shader_path(basename(&path));
    }
    path.trim_start_matches(|c: char| c == '.' || c == '\\')
        .trim_end_matches('\\')
        .to_string()
}

fn default_shader_path(name: &str) -> String {
    format!("{}\\{}", SHADERS_DIR_NAME, name)
}

fn basename(path: &str) -> &str {
    path.rsplit(|c: char| c == '\\' || c == '/').next().unwrap_or(path)
}

/// `path` relative to the tags directory, backslash separated.
fn tags_relative(path: &Path, tags_dir: Option<&Path>, strip_extension: bool) -> Option<String> {
    let relative = path.strip_prefix(tags_dir?).ok()?;
    let relative = if strip_extension {
        relative.with_extension("")
    } else {
        relative.to_path_buf()
    };
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\\"))
    }
}

/// Shader files directly inside `dir`, keyed by lowercased stem. The first
/// file by name wins when several families share a stem.
fn scan_shaders_dir(dir: &Path) -> HashMap<String, (PathBuf, ShaderType)> {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect(),
        Err(e) => {
            log::warn!("Could not read shaders directory {:?}: {}", dir, e);
            return HashMap::new();
        }
    };
    files.sort();

    let mut shaders = HashMap::new();
    for path in files {
        let shader_type = path
            .extension()
            .and_then(|ext| ShaderType::from_extension(&ext.to_string_lossy()));
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_lowercase());
        if let (Some(shader_type), Some(stem)) = (shader_type, stem) {
            shaders.entry(stem).or_insert((path, shader_type));
        }
    }
    shaders
}

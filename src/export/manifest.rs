//! Compiled model manifest.
//!
//! The manifest is the compiled form of a merged model: the model itself,
//! its LOD cutoffs and the shader references in material order. A manifest
//! left at the output path from an earlier run seeds shader resolution and
//! the LOD cutoffs of the next one.

use crate::error::{MergerError, Result};
use crate::merge::MergedModel;
use crate::shader::ShaderReference;
use crate::types::{LodCutoffs, LodLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current manifest layout version.
pub const MANIFEST_VERSION: u32 = 1;

/// A compiled model as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledModel {
    pub version: u32,
    pub node_list_checksum: i32,
    pub lod_cutoffs: LodCutoffs,
    pub shaders: Vec<ShaderReference>,
    pub model: MergedModel,
}

impl CompiledModel {
    /// Build the compiled form, failing with every problem found.
    pub fn from_model(model: &MergedModel, lod_cutoffs: LodCutoffs) -> Result<Self> {
        let errors = validate(model, &lod_cutoffs);
        if !errors.is_empty() {
            return Err(MergerError::Compile(errors));
        }

        let shaders = model
            .materials
            .iter()
            .filter_map(|m| {
                m.shader_type.map(|shader_type| ShaderReference {
                    path: m.shader_path.clone(),
                    shader_type,
                    permutation_index: m.permutation_index,
                })
            })
            .collect();

        Ok(Self {
            version: MANIFEST_VERSION,
            node_list_checksum: model.node_list_checksum,
            lod_cutoffs,
            shaders,
            model: model.clone(),
        })
    }

    /// Load a manifest from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the manifest to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Everything a compiler needs for one model.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    pub model: &'a MergedModel,
    pub lod_cutoffs: LodCutoffs,
    pub tags_dir: Option<&'a Path>,
    pub data_dir: Option<&'a Path>,
    pub output_path: &'a Path,
}

/// Turns a merged model into its compiled form at `request.output_path`.
pub trait Compiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<()>;
}

/// Compiler that writes a [`CompiledModel`] as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestCompiler;

impl Compiler for ManifestCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<()> {
        if request.output_path.is_file() {
            log::info!("Updating existing compiled model {:?}", request.output_path);
        } else {
            log::info!("Creating new compiled model {:?}", request.output_path);
        }

        let compiled = CompiledModel::from_model(request.model, request.lod_cutoffs)?;
        if let Some(parent) = request.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        compiled.save(request.output_path)
    }
}

fn validate(model: &MergedModel, lod_cutoffs: &LodCutoffs) -> Vec<String> {
    let mut errors = Vec::new();

    if model.permutations.is_empty() {
        errors.push("model has no permutations".to_string());
    }
    for (name, ladder) in &model.permutations {
        if !ladder.is_occupied(LodLevel::Superhigh) {
            errors.push(format!("permutation {:?} has no superhigh LOD", name));
        }
    }
    for material in &model.materials {
        if material.shader_type.is_none() {
            errors.push(format!("material {:?} has no shader type", material.name));
        } else if material.shader_path.is_empty() {
            errors.push(format!("material {:?} has an empty shader path", material.name));
        }
    }
    for lod in LodLevel::ALL {
        if lod_cutoffs.get(lod) < 0.0 {
            errors.push(format!("{} LOD cutoff is negative", lod));
        }
    }

    errors
}

//! End-to-end loading, saving and compiling of a models directory.
//!
//! A run discovers the model sources in one directory, parses and cleans
//! each of them, merges them into a single [`MergedModel`] and resolves the
//! shader of every material.

use crate::error::{MergeIssue, MergerError, ParseError, Result};
use crate::export::{jms_file_name, write_jms, CompileRequest, CompiledModel, Compiler};
use crate::format::{model_name_from_path, parse_model, ModelFormat};
use crate::merge::{merge, MergedModel};
use crate::mesh::{compute_normals, optimize};
use crate::shader::{resolve_shaders, ShaderContext, ShaderReference};
use crate::types::{LodCutoffs, OptimizeLevel};
use std::path::{Path, PathBuf};

/// File name of the compiled model when no output path is configured.
pub const DEFAULT_OUTPUT_NAME: &str = "model.json";

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Directory holding the model sources.
    pub models_dir: PathBuf,
    /// Compiled model path. Defaults to `model.json` inside `models_dir`.
    pub output_path: Option<PathBuf>,
    /// Tags root that shader paths are made relative to.
    pub tags_dir: Option<PathBuf>,
    /// Data root handed to the compiler.
    pub data_dir: Option<PathBuf>,
    /// Vertex welding applied to every parsed mesh.
    pub optimize: OptimizeLevel,
}

impl PipelineConfig {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_tags_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.tags_dir = Some(path.into());
        self
    }

    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn with_optimize(mut self, level: OptimizeLevel) -> Self {
        self.optimize = level;
        self
    }

    /// The compiled model path this run reads from and writes to.
    pub fn resolved_output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.models_dir.join(DEFAULT_OUTPUT_NAME))
    }
}

/// A model source that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: ParseError,
}

/// Result of [`load_models`].
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: MergedModel,
    pub issues: Vec<MergeIssue>,
    pub skipped: Vec<SkippedFile>,
    /// Cutoffs of the previously compiled model, or all zero.
    pub lod_cutoffs: LodCutoffs,
    /// Whether a previously compiled model seeded this load.
    pub existing_loaded: bool,
}

impl LoadedModel {
    /// Whether any issue beyond warnings was raised.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| !i.is_warning())
    }
}

/// Model sources directly inside `dir`, sorted by file name.
pub fn discover_model_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && ModelFormat::from_path(&path).is_ok() {
            files.push(path);
        }
    }
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// Parse, clean and merge every model source in `config.models_dir`.
pub fn load_models(config: &PipelineConfig) -> Result<LoadedModel> {
    let files = discover_model_files(&config.models_dir)?;
    if files.is_empty() {
        return Err(MergerError::NoModelFiles(config.models_dir.clone()));
    }

    let mut meshes = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();
    for path in files {
        let name = model_name_from_path(&path);
        log::info!("Loading {:?}", name);

        let format = ModelFormat::from_path(&path)?;
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| ParseError::Unreadable(e.to_string()))
            .and_then(|text| parse_model(&text, &name, format));
        let mut mesh = match parsed {
            Ok(mesh) => mesh,
            Err(error) => {
                log::warn!("Skipping {:?}: {}", path, error);
                skipped.push(SkippedFile { path, error });
                continue;
            }
        };

        match config.optimize {
            OptimizeLevel::None => {}
            level => {
                log::info!("Optimizing {:?}", name);
                let removed = optimize(&mut mesh, level == OptimizeLevel::Exact);
                log::debug!("Removed {} duplicate vertices from {:?}", removed, name);
            }
        }
        log::info!("Calculating normals for {:?}", name);
        compute_normals(&mut mesh);
        meshes.push(mesh);
    }

    if meshes.is_empty() {
        return Err(MergerError::NoUsableMeshes);
    }

    log::info!("Merging {} models", meshes.len());
    let (mut model, issues) = merge(meshes);
    for issue in &issues {
        log::warn!("{}", issue);
    }
    if model.is_empty() {
        return Err(MergerError::NoUsableMeshes);
    }

    let output_path = config.resolved_output_path();
    let mut lod_cutoffs = LodCutoffs::default();
    let mut existing_shaders: Vec<ShaderReference> = Vec::new();
    let mut existing_loaded = false;
    let has_errors = issues.iter().any(|i| !i.is_warning());
    if !has_errors && output_path.is_file() {
        match CompiledModel::load(&output_path) {
            Ok(existing) => {
                log::info!("Reading shaders and LOD cutoffs from {:?}", output_path);
                model.node_list_checksum = existing.node_list_checksum;
                lod_cutoffs = existing.lod_cutoffs;
                existing_shaders = existing.shaders;
                existing_loaded = true;
            }
            Err(err) => log::warn!("Could not read existing model {:?}: {}", output_path, err),
        }
    }

    let context = ShaderContext::for_output(&output_path, config.tags_dir.as_deref());
    resolve_shaders(&mut model, &existing_shaders, &context);

    Ok(LoadedModel {
        model,
        issues,
        skipped,
        lod_cutoffs,
        existing_loaded,
    })
}

/// Write every mesh of `model` to `dir` as JMS. Returns the written paths.
pub fn save_models<P: AsRef<Path>>(model: &MergedModel, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(model.mesh_count());
    for mesh in model.meshes() {
        let path = dir.join(jms_file_name(mesh));
        std::fs::write(&path, write_jms(model, mesh))?;
        log::info!("Saved {:?}", path);
        written.push(path);
    }
    Ok(written)
}

/// Compile a loaded model to the configured output path. Returns that path.
pub fn compile_model(
    loaded: &LoadedModel,
    lod_cutoffs: LodCutoffs,
    config: &PipelineConfig,
    compiler: &dyn Compiler,
) -> Result<PathBuf> {
    let output_path = config.resolved_output_path();
    let request = CompileRequest {
        model: &loaded.model,
        lod_cutoffs,
        tags_dir: config.tags_dir.as_deref(),
        data_dir: config.data_dir.as_deref(),
        output_path: &output_path,
    };
    compiler.compile(&request)?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ManifestCompiler;
    use crate::format::jms::tests::BOX_JMS;
    use crate::shader::SHADERS_DIR_NAME;
    use crate::types::{LodLevel, ShaderType};

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_discover_is_sorted_and_flat() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b high.jms", BOX_JMS);
        write(dir.path(), "a low.JMS", BOX_JMS);
        write(dir.path(), "notes.txt", "");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested"), "c.jms", BOX_JMS);

        let files = discover_model_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a low.JMS", "b high.jms"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_models(&PipelineConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, MergerError::NoModelFiles(_)));
    }

    #[test]
    fn test_all_files_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.jms", "8200\n");
        let err = load_models(&PipelineConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, MergerError::NoUsableMeshes));
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crate high.jms", BOX_JMS);
        std::fs::write(dir.path().join("broken low.jms"), [0xff, 0xfe, 0x00, 0x38]).unwrap();

        let loaded = load_models(&PipelineConfig::new(dir.path())).unwrap();
        assert_eq!(loaded.model.mesh_count(), 1);
        assert_eq!(loaded.skipped.len(), 1);
        assert!(loaded.skipped[0].path.ends_with("broken low.jms"));
        assert!(matches!(loaded.skipped[0].error, ParseError::Unreadable(_)));
    }

    #[test]
    fn test_corrupt_count_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crate high.jms", BOX_JMS);
        write(dir.path(), "crate low.jms", "8200\n3251\n0\n0\n0\n0\n99999999999999999\n");

        let loaded = load_models(&PipelineConfig::new(dir.path())).unwrap();
        assert_eq!(loaded.model.mesh_count(), 1);
        assert_eq!(loaded.skipped[0].error, ParseError::UnexpectedEof("vertex node"));
    }

    #[test]
    fn test_high_and_low_are_promoted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crate_high.jms", BOX_JMS);
        write(dir.path(), "crate_low.jms", BOX_JMS);
        write(dir.path(), "broken.jms", "8200\n3251\n");

        let config = PipelineConfig::new(dir.path()).with_optimize(OptimizeLevel::Exact);
        let loaded = load_models(&config).unwrap();

        assert_eq!(loaded.skipped.len(), 1);
        assert!(loaded.issues.is_empty());
        assert!(!loaded.existing_loaded);
        assert_eq!(loaded.lod_cutoffs, LodCutoffs::default());

        let ladder = &loaded.model.permutations["crate"];
        assert_eq!(ladder.get(LodLevel::Superhigh).unwrap().source_lod, LodLevel::High);
        assert!(ladder.get(LodLevel::High).is_none());
        assert!(ladder.get(LodLevel::Medium).is_none());
        assert_eq!(ladder.get(LodLevel::Low).unwrap().source_lod, LodLevel::Low);
        assert!(ladder.get(LodLevel::Superlow).is_none());

        assert!(loaded.model.unresolved_materials().next().is_none());
        assert_eq!(loaded.model.materials[0].shader_path, "shaders\\metal");
    }

    #[test]
    fn test_existing_model_seeds_shaders_and_cutoffs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crate superhigh.jms", BOX_JMS);
        let config = PipelineConfig::new(dir.path());

        let mut loaded = load_models(&config).unwrap();
        loaded
            .model
            .set_shader("metal", ShaderType::Environment, "levels\\test\\shaders\\metal")
            .unwrap();
        let cutoffs = LodCutoffs {
            superhigh: 0.25,
            ..Default::default()
        };
        let output = compile_model(&loaded, cutoffs, &config, &ManifestCompiler).unwrap();
        assert_eq!(output, dir.path().join(DEFAULT_OUTPUT_NAME));

        let reloaded = load_models(&config).unwrap();
        assert!(reloaded.existing_loaded);
        assert_eq!(reloaded.lod_cutoffs, cutoffs);
        let metal = reloaded.model.material("metal").unwrap();
        assert_eq!(metal.shader_type, Some(ShaderType::Environment));
        assert_eq!(metal.shader_path, "levels\\test\\shaders\\metal");
    }

    #[test]
    fn test_local_shader_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crate superhigh.jms", BOX_JMS);
        let shaders = dir.path().join(SHADERS_DIR_NAME);
        std::fs::create_dir(&shaders).unwrap();
        write(&shaders, "glass.shader_transparent_glass", "");

        let config = PipelineConfig::new(dir.path()).with_tags_dir(dir.path());
        let loaded = load_models(&config).unwrap();
        let glass = loaded.model.material("glass").unwrap();
        assert_eq!(glass.shader_type, Some(ShaderType::TransparentGlass));
        assert_eq!(glass.shader_path, "shaders\\glass");
    }

    #[test]
    fn test_save_models_writes_every_mesh() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crate_high.jms", BOX_JMS);
        write(dir.path(), "~lid low.jms", BOX_JMS);
        let loaded = load_models(&PipelineConfig::new(dir.path())).unwrap();

        let out = dir.path().join("saved");
        let written = save_models(&loaded.model, &out).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["crate superhigh.jms", "~lid superhigh.jms"]);
        assert_eq!(discover_model_files(&out).unwrap().len(), 2);
    }
}

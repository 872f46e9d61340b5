//! # JMS Merger
//!
//! A Rust library for merging per-permutation, per-LOD model sources into a
//! single multi-LOD model.
//!
//! ## Overview
//!
//! This library takes a directory of JMS (or OBJ) files as input, one file
//! per permutation and level of detail, and produces one [`MergedModel`]
//! with a shared skeleton, a shared material list and a LOD ladder per
//! permutation. Each material is then given a shader, reusing the shader
//! references of a previously compiled model where one exists.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jms_merger::{compile_model, load_models, ManifestCompiler, OptimizeLevel, PipelineConfig};
//!
//! let config = PipelineConfig::new("data/vehicles/crate/models")
//!     .with_tags_dir("tags")
//!     .with_optimize(OptimizeLevel::Exact);
//!
//! // Parse, clean, merge and resolve shaders
//! let loaded = load_models(&config)?;
//! for issue in &loaded.issues {
//!     println!("{}", issue);
//! }
//!
//! // Compile with the recovered LOD cutoffs
//! compile_model(&loaded, loaded.lod_cutoffs, &config, &ManifestCompiler)?;
//! ```

pub mod error;
pub mod types;
pub mod mesh;
pub mod format;
pub mod merge;
pub mod shader;
pub mod export;
pub mod pipeline;

// Re-export main types for convenience
pub use error::{MergeIssue, MergerError, ParseError, Result};
pub use types::{LodCutoffs, LodLevel, OptimizeLevel, ShaderType};
pub use mesh::{MeshAsset, MeshMaterial, Marker, Node, Triangle, Vertex};
pub use format::{parse_model, ModelFormat};
pub use merge::{merge, LodLadder, LodMesh, Material, MergedModel};
pub use shader::{resolve_shaders, ShaderContext, ShaderReference, ShaderSource};
pub use export::{CompileRequest, CompiledModel, Compiler, ManifestCompiler};
pub use pipeline::{
    compile_model, discover_model_files, load_models, save_models, LoadedModel, PipelineConfig,
    SkippedFile,
};

/// Parse a single model source file, detecting its format from the extension.
pub fn load_model_file<P: AsRef<std::path::Path>>(path: P) -> Result<MeshAsset> {
    let path = path.as_ref();
    let format = ModelFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_model(&text, &format::model_name_from_path(path), format).map_err(|source| {
        MergerError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}

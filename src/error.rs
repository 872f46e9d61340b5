//! Error types for the model merger.

use crate::types::LodLevel;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MergerError.
pub type Result<T> = std::result::Result<T, MergerError>;

/// Fatal errors that stop a pipeline run.
#[derive(Error, Debug)]
pub enum MergerError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or write a compiled manifest.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A model source could not be parsed.
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// File extension is not a supported model format.
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// The models directory holds no recognised model files.
    #[error("No valid model files found in {0:?}")]
    NoModelFiles(PathBuf),

    /// Every model file failed to parse or merge.
    #[error("No usable meshes were merged")]
    NoUsableMeshes,

    /// A LOD cutoff string is not a number.
    #[error("Invalid {lod} LOD cutoff: {value:?}")]
    InvalidLodCutoff { lod: LodLevel, value: String },

    /// No material matches a shader override.
    #[error("No material named {0:?}")]
    UnknownMaterial(String),

    /// The compiler rejected the merged model.
    #[error("Compilation failed: {}", .0.join("; "))]
    Compile(Vec<String>),
}

/// Errors raised while parsing a single model source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("could not read file: {0}")]
    Unreadable(String),

    #[error("unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("line {line}: invalid {field}: {value:?}")]
    InvalidValue {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: unexpected trailing data {value:?}")]
    TrailingData { line: usize, value: String },

    #[error("unsupported JMS version {0}")]
    UnsupportedVersion(i64),

    #[error("line {line}: {kind} index {index} out of range (count {count})")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        count: usize,
    },

    #[error("node hierarchy contains a cycle at node {0:?}")]
    CyclicSkeleton(String),

    #[error("model contains no triangles")]
    NoGeometry,

    #[error("invalid OBJ data: {0}")]
    Obj(#[from] tobj::LoadError),
}

/// Non-fatal problems collected while grouping and merging meshes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeIssue {
    #[error("{mesh}: node list checksum {found} does not match {expected}")]
    ChecksumMismatch {
        mesh: String,
        expected: i32,
        found: i32,
    },

    #[error("{mesh}: material {material:?} conflicts with an earlier definition ({existing:?} vs {found:?})")]
    MaterialConflict {
        mesh: String,
        material: String,
        existing: String,
        found: String,
    },

    #[error("{mesh}: permutation {permutation:?} already has a {lod} LOD")]
    DuplicateLod {
        mesh: String,
        permutation: String,
        lod: LodLevel,
    },

    #[error("{mesh}: node index {index} is outside the {node_count}-node skeleton")]
    NodeOutOfRange {
        mesh: String,
        index: usize,
        node_count: usize,
    },

    #[error("permutation {0:?} has no usable LOD")]
    EmptyPermutation(String),
}

impl MergeIssue {
    /// Warnings are reported but do not mark the load as failed.
    pub fn is_warning(&self) -> bool {
        matches!(self, MergeIssue::ChecksumMismatch { .. })
    }
}

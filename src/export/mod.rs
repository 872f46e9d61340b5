//! Output formats.
//!
//! This module writes merged meshes back out as JMS and compiles merged
//! models into a JSON manifest.

pub mod jms;
pub mod manifest;

pub use jms::{jms_file_name, write_jms};
pub use manifest::{CompileRequest, CompiledModel, Compiler, ManifestCompiler};

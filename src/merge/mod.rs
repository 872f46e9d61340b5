//! Merging parsed meshes into one model.
//!
//! The merged model owns a single skeleton, a material table unique by
//! name, a sorted region table and, per permutation, a ladder of LOD
//! meshes whose indices point into those shared tables.

pub mod lod;

pub use lod::{group_by_permutation, promote, LodLadder, LodMember, PermutationGroup};

use crate::error::{MergeIssue, MergerError, Result};
use crate::mesh::{Marker, MeshAsset, Node, Triangle, Vertex};
use crate::shader::normalize_shader_path;
use crate::types::{LodLevel, ShaderType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A shader slot in the merged model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub tiff_path: String,
    /// Tags-root relative path without extension, backslash separated.
    pub shader_path: String,
    /// `None` until the shader has been resolved.
    pub shader_type: Option<ShaderType>,
    pub permutation_index: u16,
}

impl Material {
    pub fn new(name: impl Into<String>, tiff_path: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            shader_path: name.clone(),
            name,
            tiff_path: tiff_path.into(),
            shader_type: None,
            permutation_index: 0,
        }
    }

    /// Last component of the shader path.
    pub fn shader_name(&self) -> &str {
        self.shader_path.rsplit('\\').next().unwrap_or(&self.shader_path)
    }
}

/// Geometry of one merged source mesh.
///
/// Material and region indices refer to the owning [`MergedModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodMesh {
    pub name: String,
    pub permutation_name: String,
    pub lod_level: LodLevel,
    /// Tier the mesh was authored at, before promotion.
    pub source_lod: LodLevel,
    pub is_random_permutation: bool,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub markers: Vec<Marker>,
}

impl LodMember for LodMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn permutation_name(&self) -> &str {
        &self.permutation_name
    }

    fn lod_level(&self) -> LodLevel {
        self.lod_level
    }

    fn set_lod_level(&mut self, lod: LodLevel) {
        self.lod_level = lod;
    }
}

/// The unified model handed to the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedModel {
    pub nodes: Vec<Node>,
    pub node_list_checksum: i32,
    pub materials: Vec<Material>,
    /// Sorted, without duplicates.
    pub regions: Vec<String>,
    pub permutations: BTreeMap<String, LodLadder<LodMesh>>,
}

impl MergedModel {
    /// Number of meshes across all permutations.
    pub fn mesh_count(&self) -> usize {
        self.permutations.values().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh_count() == 0
    }

    /// All meshes, by permutation then LOD.
    pub fn meshes(&self) -> impl Iterator<Item = &LodMesh> {
        self.permutations.values().flat_map(|l| l.iter().map(|(_, m)| m))
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn region_index(&self, name: &str) -> Option<usize> {
        self.regions.binary_search_by(|r| r.as_str().cmp(name)).ok()
    }

    /// Override the shader of a material by hand.
    pub fn set_shader(&mut self, material: &str, shader_type: ShaderType, shader_path: &str) -> Result<()> {
        let material = self
            .materials
            .iter_mut()
            .find(|m| m.name == material)
            .ok_or_else(|| MergerError::UnknownMaterial(material.to_string()))?;
        material.shader_type = Some(shader_type);
        material.shader_path = normalize_shader_path(shader_path);
        Ok(())
    }

    /// Materials that still have no shader type.
    pub fn unresolved_materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter().filter(|m| m.shader_type.is_none())
    }
}

/// Merge meshes, in order, into one model.
///
/// The first mesh's skeleton is canonical. Problems with individual meshes
/// are collected rather than aborting the merge; a mesh whose node
/// references do not fit the canonical skeleton is left out entirely.
pub fn merge(meshes: Vec<MeshAsset>) -> (MergedModel, Vec<MergeIssue>) {
    let mut model = MergedModel::default();
    let mut issues = Vec::new();

    let Some(first) = meshes.first() else {
        return (model, issues);
    };
    model.nodes = first.nodes.clone();
    model.node_list_checksum = first.node_list_checksum;

    let mut material_lookup: HashMap<String, usize> = HashMap::new();
    let mut region_names = BTreeSet::new();
    let mut accepted = Vec::with_capacity(meshes.len());

    for mesh in meshes {
        if mesh.node_list_checksum != model.node_list_checksum {
            issues.push(MergeIssue::ChecksumMismatch {
                mesh: mesh.name.clone(),
                expected: model.node_list_checksum,
                found: mesh.node_list_checksum,
            });
        }

        if let Some(index) = max_node_index(&mesh).filter(|i| *i >= model.nodes.len()) {
            issues.push(MergeIssue::NodeOutOfRange {
                mesh: mesh.name.clone(),
                index,
                node_count: model.nodes.len(),
            });
            continue;
        }

        let mut material_map = Vec::with_capacity(mesh.materials.len());
        for material in &mesh.materials {
            let index = match material_lookup.get(&material.name) {
                Some(&index) => {
                    let existing = &model.materials[index];
                    if existing.tiff_path != material.tiff_path {
                        issues.push(MergeIssue::MaterialConflict {
                            mesh: mesh.name.clone(),
                            material: material.name.clone(),
                            existing: existing.tiff_path.clone(),
                            found: material.tiff_path.clone(),
                        });
                    }
                    index
                }
                None => {
                    model
                        .materials
                        .push(Material::new(&material.name, &material.tiff_path));
                    material_lookup.insert(material.name.clone(), model.materials.len() - 1);
                    model.materials.len() - 1
                }
            };
            material_map.push(index);
        }

        let referenced = mesh
            .triangles
            .iter()
            .map(|t| t.region_index)
            .chain(mesh.markers.iter().map(|m| m.region_index));
        for index in referenced {
            if let Some(name) = mesh.regions.get(index) {
                region_names.insert(name.clone());
            }
        }

        accepted.push((mesh, material_map));
    }

    model.regions = region_names.into_iter().collect();
    let merged: Vec<LodMesh> = accepted
        .into_iter()
        .map(|(mesh, material_map)| remap_mesh(mesh, &material_map, &model.regions))
        .collect();

    let (groups, group_issues) = group_by_permutation(merged);
    issues.extend(group_issues);

    for mut group in groups {
        match promote(&mut group) {
            Ok(_) => {
                model.permutations.insert(group.name, group.ladder);
            }
            Err(issue) => issues.push(issue),
        }
    }

    (model, issues)
}

fn max_node_index(mesh: &MeshAsset) -> Option<usize> {
    mesh.vertices
        .iter()
        .flat_map(|v| std::iter::once(v.node_index).chain(v.node1_index))
        .chain(mesh.markers.iter().filter_map(|m| m.parent_node))
        .max()
}

/// Rewrite a mesh's file-local material and region indices into the merged tables.
fn remap_mesh(mesh: MeshAsset, material_map: &[usize], regions: &[String]) -> LodMesh {
    let region_map: Vec<usize> = mesh
        .regions
        .iter()
        .map(|name| regions.binary_search(name).unwrap_or(0))
        .collect();

    let vertices = mesh
        .vertices
        .into_iter()
        .map(|mut v| {
            v.material_index = v.material_index.map(|i| material_map[i]);
            v
        })
        .collect();
    let triangles = mesh
        .triangles
        .into_iter()
        .map(|mut t| {
            t.material_index = material_map[t.material_index];
            t.region_index = region_map[t.region_index];
            t
        })
        .collect();
    let markers = mesh
        .markers
        .into_iter()
        .map(|mut m| {
            m.region_index = region_map[m.region_index];
            m
        })
        .collect();

    LodMesh {
        name: mesh.name,
        permutation_name: mesh.permutation_name,
        lod_level: mesh.lod_level,
        source_lod: mesh.lod_level,
        is_random_permutation: mesh.is_random_permutation,
        vertices,
        triangles,
        markers,
    }
}

//! Parsed mesh data.
//!
//! A [`MeshAsset`] is one permutation/LOD unit as read from a single source
//! file. All indices it holds refer to its own file-local tables.

pub mod normals;
pub mod optimize;

pub use normals::compute_normals;
pub use optimize::optimize;

use crate::error::ParseError;
use crate::types::LodLevel;
use serde::{Deserialize, Serialize};

/// Permutation name used when a file name has nothing before its LOD suffix.
pub const DEFAULT_PERMUTATION: &str = "__base";

/// A vertex bound to up to two skeleton nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Primary node this vertex is weighted to.
    pub node_index: usize,
    /// Optional secondary node.
    pub node1_index: Option<usize>,
    /// Weight of the secondary node (0.0 when unused).
    pub node1_weight: f32,
    /// Material of the first triangle that uses this vertex.
    pub material_index: Option<usize>,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Default::default()
        }
    }

    pub fn with_node(mut self, node_index: usize) -> Self {
        self.node_index = node_index;
        self
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 0.0],
            node_index: 0,
            node1_index: None,
            node1_weight: 0.0,
            material_index: None,
        }
    }
}

/// A triangle with its material and region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [u32; 3],
    pub material_index: usize,
    pub region_index: usize,
}

impl Triangle {
    pub fn new(vertices: [u32; 3], material_index: usize, region_index: usize) -> Self {
        Self {
            vertices,
            material_index,
            region_index,
        }
    }
}

/// A named attachment point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    /// Permutation the marker belongs to.
    pub permutation: String,
    pub region_index: usize,
    pub parent_node: Option<usize>,
    pub radius: f32,
    /// Quaternion i, j, k, w.
    pub rotation: [f32; 4],
    pub position: [f32; 3],
}

/// One skeleton joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub sibling: Option<usize>,
    /// Quaternion i, j, k, w.
    pub rotation: [f32; 4],
    pub position: [f32; 3],
}

impl Node {
    /// A root node at the origin with identity rotation.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            first_child: None,
            sibling: None,
            rotation: [0.0, 0.0, 0.0, 1.0],
            position: [0.0, 0.0, 0.0],
        }
    }

    /// Fill in `parent` from the first-child/sibling links.
    ///
    /// Fails with the name of the offending node if a child chain loops or a
    /// node is reachable from two parents.
    pub fn link_parents(nodes: &mut [Node]) -> Result<(), ParseError> {
        for node in nodes.iter_mut() {
            node.parent = None;
        }

        let mut claimed = vec![false; nodes.len()];
        for parent in 0..nodes.len() {
            let mut child = nodes[parent].first_child;
            while let Some(index) = child {
                if index >= nodes.len() || index == parent || claimed[index] {
                    return Err(ParseError::CyclicSkeleton(nodes[parent].name.clone()));
                }
                claimed[index] = true;
                nodes[index].parent = Some(parent);
                child = nodes[index].sibling;
            }
        }

        // Every node must reach a root by walking parents.
        for start in 0..nodes.len() {
            let mut current = nodes[start].parent;
            let mut steps = 0;
            while let Some(index) = current {
                steps += 1;
                if steps > nodes.len() {
                    return Err(ParseError::CyclicSkeleton(nodes[start].name.clone()));
                }
                current = nodes[index].parent;
            }
        }

        Ok(())
    }

    /// Checksum over node names and hierarchy.
    pub fn list_checksum(nodes: &[Node]) -> i32 {
        let mut hasher = crc32fast::Hasher::new();
        for node in nodes {
            hasher.update(node.name.to_lowercase().as_bytes());
            hasher.update(&[0]);
            for link in [node.first_child, node.sibling] {
                let value = link.map_or(-1, |i| i as i32);
                hasher.update(&value.to_le_bytes());
            }
        }
        hasher.finalize() as i32
    }
}

/// A material slot as declared by one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshMaterial {
    pub name: String,
    /// Texture path recorded by the exporter (`<none>` when absent).
    pub tiff_path: String,
}

impl MeshMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tiff_path: "<none>".to_string(),
        }
    }
}

/// One parsed permutation/LOD source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAsset {
    pub name: String,
    pub permutation_name: String,
    pub lod_level: LodLevel,
    pub is_random_permutation: bool,
    pub node_list_checksum: i32,
    pub nodes: Vec<Node>,
    pub materials: Vec<MeshMaterial>,
    pub regions: Vec<String>,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub markers: Vec<Marker>,
}

impl MeshAsset {
    /// Create an empty mesh, deriving permutation and LOD from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let parsed = parse_model_name(&name);
        Self {
            name,
            permutation_name: parsed.permutation,
            lod_level: parsed.lod,
            is_random_permutation: parsed.is_random,
            node_list_checksum: 0,
            nodes: Vec::new(),
            materials: Vec::new(),
            regions: Vec::new(),
            vertices: Vec::new(),
            triangles: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle by vertex indices.
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32, material_index: usize, region_index: usize) {
        self.triangles
            .push(Triangle::new([i0, i1, i2], material_index, region_index));
    }

    /// Index of the material with this name, adding it if missing.
    pub fn material_index(&mut self, name: &str) -> usize {
        match self.materials.iter().position(|m| m.name == name) {
            Some(index) => index,
            None => {
                self.materials.push(MeshMaterial::new(name));
                self.materials.len() - 1
            }
        }
    }

    /// Index of the region with this name, adding it if missing.
    pub fn region_index(&mut self, name: &str) -> usize {
        match self.regions.iter().position(|r| r == name) {
            Some(index) => index,
            None => {
                self.regions.push(name.to_string());
                self.regions.len() - 1
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Tag each vertex with the material of the first triangle using it.
    pub fn assign_vertex_materials(&mut self) {
        for vertex in &mut self.vertices {
            vertex.material_index = None;
        }
        for triangle in &self.triangles {
            for &index in &triangle.vertices {
                if let Some(vertex) = self.vertices.get_mut(index as usize) {
                    vertex.material_index.get_or_insert(triangle.material_index);
                }
            }
        }
    }

    /// Check every index against the tables it refers to.
    pub fn validate(&self) -> Result<(), ParseError> {
        let node_count = self.nodes.len();
        let check = |kind: &'static str, index: usize, count: usize| {
            if index < count {
                Ok(())
            } else {
                Err(ParseError::IndexOutOfRange {
                    line: 0,
                    kind,
                    index: index as i64,
                    count,
                })
            }
        };

        for vertex in &self.vertices {
            check("node", vertex.node_index, node_count)?;
            if let Some(node1) = vertex.node1_index {
                check("node", node1, node_count)?;
            }
        }
        for triangle in &self.triangles {
            for &index in &triangle.vertices {
                check("vertex", index as usize, self.vertices.len())?;
            }
            check("material", triangle.material_index, self.materials.len())?;
            check("region", triangle.region_index, self.regions.len())?;
        }
        for marker in &self.markers {
            check("region", marker.region_index, self.regions.len())?;
            if let Some(parent) = marker.parent_node {
                check("node", parent, node_count)?;
            }
        }
        Ok(())
    }
}

/// Permutation, LOD and randomness encoded in a model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName {
    pub permutation: String,
    pub lod: LodLevel,
    pub is_random: bool,
}

/// Split a model name such as `~crate high` or `crate_low` into its parts.
///
/// The LOD is a trailing tier name separated by a space or underscore and
/// defaults to superhigh. A leading `~` marks a permutation that is never
/// picked at random.
pub fn parse_model_name(name: &str) -> ModelName {
    let trimmed = name.trim();
    let mut permutation = trimmed;
    let mut lod = LodLevel::Superhigh;

    if let Some(split) = trimmed.rfind(|c: char| c == ' ' || c == '_') {
        if let Some(level) = LodLevel::from_str(&trimmed[split + 1..]) {
            permutation = trimmed[..split].trim_end();
            lod = level;
        }
    } else if let Some(level) = LodLevel::from_str(trimmed) {
        permutation = "";
        lod = level;
    }

    let is_random = !permutation.starts_with('~');
    let permutation = permutation.trim_start_matches('~').trim();

    ModelName {
        permutation: if permutation.is_empty() {
            DEFAULT_PERMUTATION.to_string()
        } else {
            permutation.to_string()
        },
        lod,
        is_random,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(names: &[&str]) -> Vec<Node> {
        names.iter().map(|n| Node::root(*n)).collect()
    }

    #[test]
    fn test_parse_model_name() {
        let parsed = parse_model_name("crate_high");
        assert_eq!(parsed.permutation, "crate");
        assert_eq!(parsed.lod, LodLevel::High);
        assert!(parsed.is_random);

        let parsed = parse_model_name("~blown up superlow");
        assert_eq!(parsed.permutation, "blown up");
        assert_eq!(parsed.lod, LodLevel::Superlow);
        assert!(!parsed.is_random);

        let parsed = parse_model_name("crate");
        assert_eq!(parsed.permutation, "crate");
        assert_eq!(parsed.lod, LodLevel::Superhigh);

        let parsed = parse_model_name("medium");
        assert_eq!(parsed.permutation, DEFAULT_PERMUTATION);
        assert_eq!(parsed.lod, LodLevel::Medium);

        // "superhigh" must not be read as "high" with a "super" permutation.
        let parsed = parse_model_name("crate superhigh");
        assert_eq!(parsed.permutation, "crate");
        assert_eq!(parsed.lod, LodLevel::Superhigh);
    }

    #[test]
    fn test_mesh_asset_tables() {
        let mut mesh = MeshAsset::new("hull low");
        assert_eq!(mesh.permutation_name, "hull");
        assert_eq!(mesh.lod_level, LodLevel::Low);

        assert_eq!(mesh.material_index("metal"), 0);
        assert_eq!(mesh.material_index("glass"), 1);
        assert_eq!(mesh.material_index("metal"), 0);
        assert_eq!(mesh.region_index("base"), 0);
        assert_eq!(mesh.region_index("base"), 0);
        assert_eq!(mesh.materials.len(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let mut mesh = MeshAsset::new("crate");
        mesh.nodes.push(Node::root("frame"));
        let m = mesh.material_index("metal");
        let r = mesh.region_index("base");
        let v0 = mesh.add_vertex(Vertex::default());
        let v1 = mesh.add_vertex(Vertex::default());
        mesh.add_triangle(v0, v1, 5, m, r);

        assert!(matches!(
            mesh.validate(),
            Err(ParseError::IndexOutOfRange { kind: "vertex", index: 5, .. })
        ));

        mesh.triangles[0].vertices[2] = v1;
        assert!(mesh.validate().is_ok());

        mesh.vertices[0].node_index = 3;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_assign_vertex_materials() {
        let mut mesh = MeshAsset::new("crate");
        let metal = mesh.material_index("metal");
        let glass = mesh.material_index("glass");
        for _ in 0..4 {
            mesh.add_vertex(Vertex::default());
        }
        mesh.add_triangle(0, 1, 2, glass, 0);
        mesh.add_triangle(1, 2, 3, metal, 0);
        mesh.assign_vertex_materials();

        let materials: Vec<_> = mesh.vertices.iter().map(|v| v.material_index).collect();
        assert_eq!(materials, vec![Some(glass), Some(glass), Some(glass), Some(metal)]);
    }

    #[test]
    fn test_link_parents() {
        let mut nodes = chain(&["frame", "left", "right"]);
        nodes[0].first_child = Some(1);
        nodes[1].sibling = Some(2);
        Node::link_parents(&mut nodes).unwrap();

        assert_eq!(nodes[0].parent, None);
        assert_eq!(nodes[1].parent, Some(0));
        assert_eq!(nodes[2].parent, Some(0));
    }

    #[test]
    fn test_link_parents_detects_cycles() {
        let mut nodes = chain(&["a", "b"]);
        nodes[0].first_child = Some(1);
        nodes[1].first_child = Some(0);
        assert!(matches!(
            Node::link_parents(&mut nodes),
            Err(ParseError::CyclicSkeleton(_))
        ));

        let mut nodes = chain(&["a", "b"]);
        nodes[0].first_child = Some(1);
        nodes[1].sibling = Some(1);
        assert!(Node::link_parents(&mut nodes).is_err());
    }

    #[test]
    fn test_list_checksum_tracks_skeleton() {
        let mut a = chain(&["frame", "lid"]);
        a[0].first_child = Some(1);
        let mut b = a.clone();
        b[1].position = [4.0, 0.0, 0.0];
        assert_eq!(Node::list_checksum(&a), Node::list_checksum(&b));

        b[1].name = "door".into();
        assert_ne!(Node::list_checksum(&a), Node::list_checksum(&b));
    }
}

//! Duplicate vertex removal.

use super::{MeshAsset, Vertex};
use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use std::collections::HashMap;

/// Largest position and texture coordinate difference for a loose merge.
pub const LOOSE_POSITION_TOLERANCE: f32 = 0.0001;
/// Largest normal component and weight difference for a loose merge.
pub const LOOSE_NORMAL_TOLERANCE: f32 = 0.001;

/// Everything that must match bit for bit in an exact merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: [u32; 3],
    normal: [u32; 3],
    uv: [u32; 2],
    node_index: usize,
    node1_index: Option<usize>,
    node1_weight: u32,
    material_index: Option<usize>,
}

impl From<&Vertex> for VertexKey {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.map(f32::to_bits),
            normal: v.normal.map(f32::to_bits),
            uv: v.uv.map(f32::to_bits),
            node_index: v.node_index,
            node1_index: v.node1_index,
            node1_weight: v.node1_weight.to_bits(),
            material_index: v.material_index,
        }
    }
}

/// Collapse duplicate vertices and remap triangles onto the survivors.
///
/// With `exact` only bit-identical vertices merge. Otherwise a vertex merges
/// into the earliest kept vertex within the loose tolerances; node and
/// material bindings must still match exactly. Triangle count and winding
/// are unchanged. Returns the number of vertices removed.
pub fn optimize(mesh: &mut MeshAsset, exact: bool) -> usize {
    let original_count = mesh.vertices.len();
    let (kept, remap) = if exact {
        merge_exact(&mesh.vertices)
    } else {
        merge_loose(&mesh.vertices)
    };

    for triangle in &mut mesh.triangles {
        for index in &mut triangle.vertices {
            *index = remap[*index as usize];
        }
    }

    mesh.vertices = kept;
    original_count - mesh.vertices.len()
}

fn merge_exact(vertices: &[Vertex]) -> (Vec<Vertex>, Vec<u32>) {
    let mut seen: HashMap<VertexKey, u32> = HashMap::with_capacity(vertices.len());
    let mut kept = Vec::with_capacity(vertices.len());
    let mut remap = Vec::with_capacity(vertices.len());

    for vertex in vertices {
        let index = *seen.entry(VertexKey::from(vertex)).or_insert_with(|| {
            kept.push(*vertex);
            (kept.len() - 1) as u32
        });
        remap.push(index);
    }
    (kept, remap)
}

fn merge_loose(vertices: &[Vertex]) -> (Vec<Vertex>, Vec<u32>) {
    let radius = LOOSE_POSITION_TOLERANCE * LOOSE_POSITION_TOLERANCE;
    let mut tree: KdTree<f32, usize, [f32; 3]> = KdTree::new(3);
    let mut kept: Vec<Vertex> = Vec::with_capacity(vertices.len());
    let mut remap = Vec::with_capacity(vertices.len());

    for vertex in vertices {
        let survivor = tree
            .within(&vertex.position, radius, &squared_euclidean)
            .ok()
            .and_then(|neighbors| {
                neighbors
                    .into_iter()
                    .map(|(_, &index)| index)
                    .filter(|&index| loosely_equal(vertex, &kept[index]))
                    .min()
            });

        let index = match survivor {
            Some(index) => index,
            None => {
                // Non-finite positions cannot be indexed and are kept as is.
                let _ = tree.add(vertex.position, kept.len());
                kept.push(*vertex);
                kept.len() - 1
            }
        };
        remap.push(index as u32);
    }
    (kept, remap)
}

fn loosely_equal(a: &Vertex, b: &Vertex) -> bool {
    let near = |x: &[f32], y: &[f32], tolerance: f32| {
        x.iter().zip(y).all(|(x, y)| (x - y).abs() <= tolerance)
    };
    a.node_index == b.node_index
        && a.node1_index == b.node1_index
        && a.material_index == b.material_index
        && near(&a.normal, &b.normal, LOOSE_NORMAL_TOLERANCE)
        && near(&a.uv, &b.uv, LOOSE_POSITION_TOLERANCE)
        && (a.node1_weight - b.node1_weight).abs() <= LOOSE_NORMAL_TOLERANCE
}

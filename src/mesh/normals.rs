//! Vertex normal generation.

use super::MeshAsset;
use glam::Vec3;

/// Recompute every vertex normal from triangle winding.
///
/// Each vertex gets the normalized sum of the unit normals of the triangles
/// that use it. Faces are not weighted by area or angle. Degenerate
/// triangles contribute nothing, and a vertex without any usable face keeps
/// the normal it had.
pub fn compute_normals(mesh: &mut MeshAsset) {
    let mut sums = vec![Vec3::ZERO; mesh.vertices.len()];

    for triangle in &mesh.triangles {
        let [i0, i1, i2] = triangle.vertices.map(|i| i as usize);
        let p0 = Vec3::from(mesh.vertices[i0].position);
        let p1 = Vec3::from(mesh.vertices[i1].position);
        let p2 = Vec3::from(mesh.vertices[i2].position);
        let face_normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();

        sums[i0] += face_normal;
        sums[i1] += face_normal;
        sums[i2] += face_normal;
    }

    for (vertex, sum) in mesh.vertices.iter_mut().zip(sums) {
        let normal = sum.normalize_or_zero();
        if normal != Vec3::ZERO {
            vertex.normal = normal.to_array();
        }
    }
}

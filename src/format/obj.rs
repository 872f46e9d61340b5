//! Wavefront OBJ reader.
//!
//! OBJ has no skeleton, so every vertex is bound to a single synthesised
//! root node. `usemtl` selects the material and `g`/`o` the region. No
//! `.mtl` file is read; only the material names are kept.

use crate::error::ParseError;
use crate::mesh::{MeshAsset, Node, Vertex};

/// Name of the node synthesised for OBJ sources.
pub const OBJ_ROOT_NODE: &str = "frame";
/// Material and region name used before any `usemtl`/`g` line.
pub const UNNAMED: &str = "__unnamed";

/// Parse OBJ text into a mesh named `model_name`.
pub fn read_obj(text: &str, model_name: &str) -> Result<MeshAsset, ParseError> {
    let mut mesh = MeshAsset::new(model_name);
    mesh.nodes.push(Node::root(OBJ_ROOT_NODE));
    mesh.node_list_checksum = Node::list_checksum(&mesh.nodes);

    // tobj resolves `usemtl` only against materials handed back for an
    // `mtllib` line, so one is declared up front and answered with every
    // name the file uses.
    let material_names = usemtl_names(text);
    let source = format!("mtllib {}.mtl\no {}\n{}", UNNAMED, UNNAMED, text);
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj_buf(&mut source.as_bytes(), &load_options, |_| {
        let materials = material_names
            .iter()
            .map(|name| tobj::Material {
                name: name.clone(),
                ..Default::default()
            })
            .collect();
        let lookup = material_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok((materials, lookup))
    })?;
    let materials = materials?;

    for model in models {
        let obj = model.mesh;
        if obj.indices.is_empty() {
            continue;
        }

        let material = obj
            .material_id
            .and_then(|id| materials.get(id))
            .map_or(UNNAMED, |m| m.name.as_str());
        let region = if model.name.is_empty() { UNNAMED } else { model.name.as_str() };
        let material_index = mesh.material_index(material);
        let region_index = mesh.region_index(region);

        let base = mesh.vertices.len() as u32;
        for i in 0..obj.positions.len() / 3 {
            let position = [obj.positions[3 * i], obj.positions[3 * i + 1], obj.positions[3 * i + 2]];
            let normal = match obj.normals.get(3 * i..3 * i + 3) {
                Some(n) => [n[0], n[1], n[2]],
                None => [0.0; 3],
            };
            let uv = match obj.texcoords.get(2 * i..2 * i + 2) {
                Some(t) => [t[0], t[1]],
                None => [0.0; 2],
            };
            mesh.add_vertex(Vertex::new(position, normal, uv));
        }
        for triangle in obj.indices.chunks_exact(3) {
            mesh.add_triangle(
                base + triangle[0],
                base + triangle[1],
                base + triangle[2],
                material_index,
                region_index,
            );
        }
    }

    if mesh.triangles.is_empty() {
        return Err(ParseError::NoGeometry);
    }
    mesh.assign_vertex_materials();
    Ok(mesh)
}

/// Every `usemtl` name in first-use order.
fn usemtl_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in text.lines() {
        let Some(("usemtl", name)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LodLevel;

    const QUAD_OBJ: &str = "# exported quad
mtllib crate.mtl
o lid
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl hull
f 1/1/1 2/2/1 3/3/1 4/4/1
g handle
usemtl trim
f -4/-4/-1 -2/-2/-1 -1/-1/-1
";

    #[test]
    fn test_read_quad() {
        let mesh = read_obj(QUAD_OBJ, "crate low").unwrap();

        assert_eq!(mesh.permutation_name, "crate");
        assert_eq!(mesh.lod_level, LodLevel::Low);
        assert_eq!(mesh.nodes.len(), 1);
        assert_eq!(mesh.node_list_checksum, Node::list_checksum(&mesh.nodes));
        // Fan triangulation of the quad, then the handle triangle with its own corners.
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.triangles[0].vertices, [0, 1, 2]);
        assert_eq!(mesh.triangles[1].vertices, [0, 2, 3]);
        assert_eq!(mesh.triangles[2].vertices, [4, 5, 6]);
        assert_eq!(mesh.vertices[2].uv, [1.0, 1.0]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[5].position, [1.0, 1.0, 0.0]);

        let names: Vec<_> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["hull", "trim"]);
        assert_eq!(mesh.regions, vec!["lid".to_string(), "handle".to_string()]);
        assert_eq!(mesh.triangles[2].material_index, 1);
        assert_eq!(mesh.triangles[2].region_index, 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_obj_meshes_share_checksum() {
        let a = read_obj(QUAD_OBJ, "a").unwrap();
        let b = read_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", "b").unwrap();
        assert_eq!(a.node_list_checksum, b.node_list_checksum);
        assert_eq!(b.materials[0].name, UNNAMED);
        assert_eq!(b.regions[0], UNNAMED);
    }

    #[test]
    fn test_usemtl_without_mtllib() {
        let mesh = read_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl paint\nf 1 2 3\n", "b").unwrap();
        assert_eq!(mesh.materials[0].name, "paint");
        assert_eq!(usemtl_names("usemtl a\nusemtl b\n usemtl a\nusemtlx\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_bad_faces() {
        assert!(read_obj("v 0 0 0\nv 1 0 0\nf 1 2\n", "x").is_err());
        assert!(matches!(
            read_obj("v 0 0 0\nv 1 0 0\nf 1 2 7\n", "x"),
            Err(ParseError::Obj(_))
        ));
        assert_eq!(read_obj("v 0 0 0\n", "x"), Err(ParseError::NoGeometry));
    }
}

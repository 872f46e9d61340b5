//! JMS (version 8200) export.
//!
//! Writes one merged LOD mesh against the merged model's skeleton, material
//! and region tables, so the files can be edited and merged again.

use crate::format::jms::JMS_VERSION;
use crate::merge::{LodMesh, MergedModel};
use std::fmt::Write;

/// File name a mesh is saved under: `<permutation> <lod>.jms`, prefixed
/// with `~` when the permutation is never picked at random.
pub fn jms_file_name(mesh: &LodMesh) -> String {
    let name = format!("{} {}.jms", mesh.permutation_name, mesh.lod_level);
    if mesh.is_random_permutation {
        name
    } else {
        format!("~{}", name)
    }
}

/// Export a mesh to JMS text.
pub fn write_jms(model: &MergedModel, mesh: &LodMesh) -> String {
    let capacity = 256 + mesh.vertices.len() * 120 + mesh.triangles.len() * 24;
    let mut out = String::with_capacity(capacity);

    write_body(&mut out, model, mesh).unwrap();
    out
}

fn index(value: Option<usize>) -> i64 {
    value.map_or(-1, |i| i as i64)
}

fn write_body(out: &mut String, model: &MergedModel, mesh: &LodMesh) -> std::fmt::Result {
    writeln!(out, "{}", JMS_VERSION)?;
    writeln!(out, "{}", model.node_list_checksum)?;

    writeln!(out, "{}", model.nodes.len())?;
    for node in &model.nodes {
        let [i, j, k, w] = node.rotation;
        let [x, y, z] = node.position;
        writeln!(out, "{}", node.name)?;
        writeln!(out, "{}", index(node.first_child))?;
        writeln!(out, "{}", index(node.sibling))?;
        writeln!(out, "{}\t{}\t{}\t{}", i, j, k, w)?;
        writeln!(out, "{}\t{}\t{}", x, y, z)?;
    }

    writeln!(out, "{}", model.materials.len())?;
    for material in &model.materials {
        writeln!(out, "{}", material.name)?;
        writeln!(out, "{}", material.tiff_path)?;
    }

    writeln!(out, "{}", mesh.markers.len())?;
    for marker in &mesh.markers {
        let [i, j, k, w] = marker.rotation;
        let [x, y, z] = marker.position;
        writeln!(out, "{}", marker.name)?;
        writeln!(out, "{}", marker.region_index)?;
        writeln!(out, "{}", index(marker.parent_node))?;
        writeln!(out, "{}\t{}\t{}\t{}", i, j, k, w)?;
        writeln!(out, "{}\t{}\t{}", x, y, z)?;
        writeln!(out, "{}", marker.radius)?;
    }

    writeln!(out, "{}", model.regions.len())?;
    for region in &model.regions {
        writeln!(out, "{}", region)?;
    }

    writeln!(out, "{}", mesh.vertices.len())?;
    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.position;
        let [i, j, k] = vertex.normal;
        let [u, v] = vertex.uv;
        writeln!(out, "{}", vertex.node_index)?;
        writeln!(out, "{}\t{}\t{}", x, y, z)?;
        writeln!(out, "{}\t{}\t{}", i, j, k)?;
        writeln!(out, "{}", index(vertex.node1_index))?;
        writeln!(out, "{}", vertex.node1_weight)?;
        writeln!(out, "{}\t{}\t0", u, v)?;
    }

    writeln!(out, "{}", mesh.triangles.len())?;
    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.vertices;
        writeln!(out, "{}", triangle.region_index)?;
        writeln!(out, "{}", triangle.material_index)?;
        writeln!(out, "{}\t{}\t{}", a, b, c)?;
    }

    Ok(())
}

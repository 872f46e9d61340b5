//! JMS (version 8200) reader.
//!
//! JMS is line oriented. Names occupy a whole line; numeric groups such as
//! a position may sit on one tab-separated line or be split across lines.

use crate::error::ParseError;
use crate::mesh::{Marker, MeshAsset, MeshMaterial, Node, Triangle, Vertex};
use std::collections::VecDeque;
use std::str::FromStr;

/// The only JMS version this reader understands.
pub const JMS_VERSION: i64 = 8200;

/// Parse JMS text into a mesh named `model_name`.
pub fn read_jms(text: &str, model_name: &str) -> Result<MeshAsset, ParseError> {
    let mut reader = JmsReader::new(text);
    let mut mesh = MeshAsset::new(model_name);

    let version: i64 = reader.number("version")?;
    if version != JMS_VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }
    mesh.node_list_checksum = reader.number::<i64>("node list checksum")? as i32;

    let node_count = reader.count("node count")?;
    for _ in 0..node_count {
        let name = reader.name("node name")?.to_string();
        let first_child = reader.index("node first child", node_count)?;
        let sibling = reader.index("node sibling", node_count)?;
        let rotation = reader.numbers::<4>("node rotation")?;
        let position = reader.numbers::<3>("node position")?;
        mesh.nodes.push(Node {
            name,
            parent: None,
            first_child,
            sibling,
            rotation,
            position,
        });
    }
    Node::link_parents(&mut mesh.nodes)?;

    let material_count = reader.count("material count")?;
    for _ in 0..material_count {
        let name = reader.name("material name")?.to_string();
        let tiff_path = reader.name("material texture path")?.to_string();
        mesh.materials.push(MeshMaterial { name, tiff_path });
    }

    // Region indices can only be checked once the region table is read.
    let marker_count = reader.count("marker count")?;
    let mut marker_regions = Vec::new();
    for _ in 0..marker_count {
        let name = reader.name("marker name")?.to_string();
        let region = (reader.line(), reader.number::<i64>("marker region")?);
        let parent_node = reader.index("marker parent node", node_count)?;
        let rotation = reader.numbers::<4>("marker rotation")?;
        let position = reader.numbers::<3>("marker position")?;
        let radius = reader.number("marker radius")?;
        marker_regions.push(region);
        mesh.markers.push(Marker {
            name,
            permutation: mesh.permutation_name.clone(),
            region_index: 0,
            parent_node,
            radius,
            rotation,
            position,
        });
    }

    let region_count = reader.count("region count")?;
    for _ in 0..region_count {
        mesh.regions.push(reader.name("region name")?.to_string());
    }
    for (marker, (line, region)) in mesh.markers.iter_mut().zip(marker_regions) {
        marker.region_index = required_index(line, "region", region, region_count)?;
    }

    let vertex_count = reader.count("vertex count")?;
    for _ in 0..vertex_count {
        let line = reader.line();
        let node_index = reader.index("vertex node", node_count)?.ok_or(
            ParseError::IndexOutOfRange {
                line,
                kind: "node",
                index: -1,
                count: node_count,
            },
        )?;
        let position = reader.numbers::<3>("vertex position")?;
        let normal = reader.numbers::<3>("vertex normal")?;
        let node1_index = reader.index("vertex secondary node", node_count)?;
        let node1_weight = reader.number("vertex node weight")?;
        let [u, v, _w] = reader.numbers::<3>("vertex texture coordinates")?;
        mesh.vertices.push(Vertex {
            position,
            normal,
            uv: [u, v],
            node_index,
            node1_index,
            node1_weight,
            material_index: None,
        });
    }

    let triangle_count = reader.count("triangle count")?;
    for _ in 0..triangle_count {
        let line = reader.line();
        let region = reader.number::<i64>("triangle region")?;
        let region_index = required_index(line, "region", region, region_count)?;
        let line = reader.line();
        let shader = reader.number::<i64>("triangle shader")?;
        let material_index = required_index(line, "material", shader, material_count)?;
        let mut vertices = [0u32; 3];
        for slot in &mut vertices {
            let line = reader.line();
            let index = reader.number::<i64>("triangle vertex")?;
            *slot = required_index(line, "vertex", index, vertex_count)? as u32;
        }
        mesh.triangles.push(Triangle {
            vertices,
            material_index,
            region_index,
        });
    }

    reader.finish()?;
    mesh.assign_vertex_materials();
    Ok(mesh)
}

fn required_index(line: usize, kind: &'static str, index: i64, count: usize) -> Result<usize, ParseError> {
    if index >= 0 && (index as usize) < count {
        Ok(index as usize)
    } else {
        Err(ParseError::IndexOutOfRange {
            line,
            kind,
            index,
            count,
        })
    }
}

/// Cursor over the meaningful lines of a JMS file.
struct JmsReader<'a> {
    lines: Vec<(usize, &'a str)>,
    next_line: usize,
    tokens: VecDeque<&'a str>,
    token_line: usize,
}

impl<'a> JmsReader<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with(';'))
            .collect();
        Self {
            lines,
            next_line: 0,
            tokens: VecDeque::new(),
            token_line: 0,
        }
    }

    /// Line number of the next value to be read.
    fn line(&self) -> usize {
        if self.tokens.is_empty() {
            self.lines
                .get(self.next_line)
                .map_or(self.token_line, |(n, _)| *n)
        } else {
            self.token_line
        }
    }

    fn take_line(&mut self, field: &'static str) -> Result<(usize, &'a str), ParseError> {
        let line = self
            .lines
            .get(self.next_line)
            .copied()
            .ok_or(ParseError::UnexpectedEof(field))?;
        self.next_line += 1;
        Ok(line)
    }

    fn ensure_line_consumed(&self) -> Result<(), ParseError> {
        match self.tokens.front() {
            Some(extra) => Err(ParseError::TrailingData {
                line: self.token_line,
                value: extra.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// A whole line read as a name.
    fn name(&mut self, field: &'static str) -> Result<&'a str, ParseError> {
        self.ensure_line_consumed()?;
        self.take_line(field).map(|(_, line)| line)
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, ParseError> {
        if self.tokens.is_empty() {
            let (line_number, line) = self.take_line(field)?;
            self.token_line = line_number;
            self.tokens.extend(line.split_whitespace());
        }
        let token = self.tokens.pop_front().ok_or(ParseError::UnexpectedEof(field))?;
        token.parse().map_err(|_| ParseError::InvalidValue {
            line: self.token_line,
            field,
            value: token.to_string(),
        })
    }

    fn numbers<const N: usize>(&mut self, field: &'static str) -> Result<[f32; N], ParseError> {
        let mut values = [0.0; N];
        for value in &mut values {
            *value = self.number(field)?;
        }
        Ok(values)
    }

    fn count(&mut self, field: &'static str) -> Result<usize, ParseError> {
        let line = self.line();
        let value: i64 = self.number(field)?;
        usize::try_from(value).map_err(|_| ParseError::InvalidValue {
            line,
            field,
            value: value.to_string(),
        })
    }

    /// An index where -1 means "none".
    fn index(&mut self, field: &'static str, count: usize) -> Result<Option<usize>, ParseError> {
        let line = self.line();
        let value: i64 = self.number(field)?;
        if value == -1 {
            return Ok(None);
        }
        required_index(line, "node", value, count).map(Some)
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.ensure_line_consumed()?;
        match self.lines.get(self.next_line) {
            Some((line, value)) => Err(ParseError::TrailingData {
                line: *line,
                value: value.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::LodLevel;

    /// Two-node skeleton, one quad split into two triangles, one marker.
    pub(crate) const BOX_JMS: &str = "8200
3251
2
frame
1
-1
0.0\t0.0\t0.0\t1.0
0.0\t0.0\t0.0
lid
-1
-1
0.0\t0.0\t0.0\t1.0
0.0\t0.0\t5.0
2
metal
<none>
glass
<none>
1
handle
0
1
0.0\t0.0\t0.0\t1.0
1.0\t2.0\t3.0
0.5
1
base
4
0
0.0\t0.0\t0.0
0.0\t0.0\t1.0
-1
0.0
0.0\t0.0\t0.0
0
10.0\t0.0\t0.0
0.0\t0.0\t1.0
-1
0.0
1.0\t0.0\t0.0
1
10.0\t10.0\t0.0
0.0\t0.0\t1.0
0
0.25
1.0\t1.0\t0.0
0
0.0\t10.0\t0.0
0.0\t0.0\t1.0
-1
0.0
0.0\t1.0\t0.0
2
0
0
0\t1\t2
0
1
0\t2\t3
";

    #[test]
    fn test_read_box() {
        let mesh = read_jms(BOX_JMS, "box high").unwrap();

        assert_eq!(mesh.permutation_name, "box");
        assert_eq!(mesh.lod_level, LodLevel::High);
        assert_eq!(mesh.node_list_checksum, 3251);
        assert_eq!(mesh.nodes.len(), 2);
        assert_eq!(mesh.nodes[1].parent, Some(0));
        assert_eq!(mesh.nodes[1].position, [0.0, 0.0, 5.0]);
        assert_eq!(mesh.materials[1].name, "glass");
        assert_eq!(mesh.regions, vec!["base".to_string()]);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.vertices[2].node_index, 1);
        assert_eq!(mesh.vertices[2].node1_index, Some(0));
        assert_eq!(mesh.vertices[2].node1_weight, 0.25);
        assert_eq!(mesh.vertices[1].uv, [1.0, 0.0]);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles[1].vertices, [0, 2, 3]);
        assert_eq!(mesh.triangles[1].material_index, 1);
        assert_eq!(mesh.vertices[3].material_index, Some(1));

        let marker = &mesh.markers[0];
        assert_eq!(marker.name, "handle");
        assert_eq!(marker.permutation, "box");
        assert_eq!(marker.parent_node, Some(1));
        assert_eq!(marker.position, [1.0, 2.0, 3.0]);
        assert_eq!(marker.radius, 0.5);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_numbers_may_span_lines() {
        let split = BOX_JMS.replace("1.0\t2.0\t3.0", "1.0\n2.0\n3.0");
        let mesh = read_jms(&split, "box").unwrap();
        assert_eq!(mesh.markers[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rejects_other_versions() {
        let text = BOX_JMS.replacen("8200", "8197", 1);
        assert_eq!(read_jms(&text, "box"), Err(ParseError::UnsupportedVersion(8197)));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let cut = &BOX_JMS[..BOX_JMS.find("0\t2\t3").unwrap()];
        assert!(matches!(read_jms(cut, "box"), Err(ParseError::UnexpectedEof(_))));
    }

    #[test]
    fn test_rejects_bad_vertex_index() {
        let text = BOX_JMS.replace("0\t2\t3", "0\t2\t9");
        assert!(matches!(
            read_jms(&text, "box"),
            Err(ParseError::IndexOutOfRange { kind: "vertex", index: 9, count: 4, .. })
        ));
    }

    #[test]
    fn test_rejects_garbage_number() {
        let text = BOX_JMS.replace("0.5\n", "big\n");
        assert!(matches!(
            read_jms(&text, "box"),
            Err(ParseError::InvalidValue { field: "marker radius", .. })
        ));
    }

    #[test]
    fn test_rejects_trailing_data() {
        let text = format!("{}extra\n", BOX_JMS);
        assert!(matches!(read_jms(&text, "box"), Err(ParseError::TrailingData { .. })));
    }

    #[test]
    fn test_huge_count_is_eof_not_allocation() {
        let text = "8200\n1\n0\n0\n0\n0\n99999999999999999\n";
        assert_eq!(read_jms(text, "x high"), Err(ParseError::UnexpectedEof("vertex node")));

        let text = "8200\n1\n0\n0\n0\n0\n0\n4000000000000\n";
        assert_eq!(read_jms(text, "x high"), Err(ParseError::UnexpectedEof("triangle region")));
    }

    #[test]
    fn test_rejects_negative_count() {
        assert!(matches!(
            read_jms("8200\n1\n-5\n", "x"),
            Err(ParseError::InvalidValue { field: "node count", line: 3, .. })
        ));
    }
}

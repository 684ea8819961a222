use std::f32::consts::{PI, TAU};

/// Floats per vertex: position, color, uv, normal.
pub const VERTEX_STRIDE: usize = 11;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    fn push_vertex(&mut self, pos: [f32; 3], color: [f32; 3], uv: [f32; 2], normal: [f32; 3]) {
        self.vertices.extend_from_slice(&pos);
        self.vertices.extend_from_slice(&color);
        self.vertices.extend_from_slice(&uv);
        self.vertices.extend_from_slice(&normal);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    /// UV sphere centred on the origin.
    pub fn sphere(radius: f32, width_segments: u16, height_segments: u16, color: [f32; 3]) -> Self {
        let mut mesh = Mesh { vertices: Vec::new(), indices: Vec::new() };

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * TAU;
                let normal = [
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                ];
                let pos = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
                mesh.push_vertex(pos, color, [u, 1.0 - v], normal);
            }
        }

        let row = width_segments + 1;
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        mesh
    }

    /// Box centred on the origin; `depth` runs along z.
    pub fn cuboid(width: f32, height: f32, depth: f32, color: [f32; 3]) -> Self {
        let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
        let mut mesh = Mesh { vertices: Vec::new(), indices: Vec::new() };

        let mut add_face = |corners: [[f32; 3]; 4], normal: [f32; 3]| {
            let base = mesh.vertex_count() as u16;
            let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
            for (corner, uv) in corners.iter().zip(uvs) {
                mesh.push_vertex(*corner, color, uv, normal);
            }
            mesh.indices.extend_from_slice(&[
                base, base + 1, base + 2,
                base, base + 2, base + 3,
            ]);
        };

        add_face([[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]], [0.0, 0.0, 1.0]);
        add_face([[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]], [0.0, 0.0, -1.0]);
        add_face([[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]], [0.0, 1.0, 0.0]);
        add_face([[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]], [0.0, -1.0, 0.0]);
        add_face([[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]], [1.0, 0.0, 0.0]);
        add_face([[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]], [-1.0, 0.0, 0.0]);

        mesh
    }

    /// Flat ring in the XY plane. u runs across the band, v around it.
    pub fn annulus(inner_radius: f32, outer_radius: f32, segments: u16, color: [f32; 3]) -> Self {
        let mut mesh = Mesh { vertices: Vec::new(), indices: Vec::new() };

        for i in 0..=segments {
            let v = i as f32 / segments as f32;
            let (sin, cos) = (v * TAU).sin_cos();
            mesh.push_vertex([cos * inner_radius, sin * inner_radius, 0.0], color, [0.0, v], [0.0, 0.0, 1.0]);
            mesh.push_vertex([cos * outer_radius, sin * outer_radius, 0.0], color, [1.0, v], [0.0, 0.0, 1.0]);
        }

        for i in 0..segments {
            let base = i * 2;
            mesh.indices.extend_from_slice(&[
                base, base + 1, base + 3,
                base, base + 3, base + 2,
            ]);
        }

        mesh
    }

    /// Unindexed point list, drawn with `POINTS`.
    pub fn points(positions: &[[f32; 3]], colors: &[[f32; 3]]) -> Self {
        let mut mesh = Mesh {
            vertices: Vec::with_capacity(positions.len() * VERTEX_STRIDE),
            indices: Vec::new(),
        };
        for (pos, color) in positions.iter().zip(colors) {
            mesh.push_vertex(*pos, *color, [0.0, 0.0], [0.0, 0.0, 0.0]);
        }
        mesh
    }

    pub fn from_gltf(bytes: &[u8]) -> Result<Self, String> {
        let (document, buffers, _) = gltf::import_slice(bytes).map_err(|e| e.to_string())?;

        let mut mesh = Mesh { vertices: Vec::new(), indices: Vec::new() };

        for gltf_mesh in document.meshes() {
            for primitive in gltf_mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

                let positions: Vec<[f32; 3]> = reader.read_positions().ok_or("No positions")?.collect();
                let colors: Vec<[f32; 3]> = if let Some(iter) = reader.read_colors(0) {
                    iter.into_rgb_f32().collect()
                } else {
                    vec![[1.0, 1.0, 1.0]; positions.len()]
                };
                let normals: Vec<[f32; 3]> = if let Some(iter) = reader.read_normals() {
                    iter.collect()
                } else {
                    vec![[0.0, 1.0, 0.0]; positions.len()]
                };
                let uvs: Vec<[f32; 2]> = if let Some(iter) = reader.read_tex_coords(0) {
                    iter.into_f32().collect()
                } else {
                    vec![[0.0, 0.0]; positions.len()]
                };

                if colors.len() != positions.len() || normals.len() != positions.len() || uvs.len() != positions.len() {
                    return Err(format!(
                        "Primitive attributes disagree: {} positions, {} colors, {} normals, {} uvs",
                        positions.len(), colors.len(), normals.len(), uvs.len()
                    ));
                }

                let base_index = mesh.vertex_count();
                if base_index + positions.len() > u16::MAX as usize {
                    return Err("Model has too many vertices for 16-bit indices".to_string());
                }

                for (((pos, color), uv), normal) in positions.iter().zip(&colors).zip(&uvs).zip(&normals) {
                    mesh.push_vertex(*pos, *color, *uv, *normal);
                }

                if let Some(iter) = reader.read_indices() {
                    for index in iter.into_u32() {
                        mesh.indices.push((base_index + index as usize) as u16);
                    }
                }
            }
        }

        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let mesh = Mesh::sphere(2.0, 16, 8, [1.0, 1.0, 1.0]);
        assert_eq!(mesh.vertex_count(), 17 * 9);
        for v in mesh.vertices.chunks(VERTEX_STRIDE) {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        // poles contribute one triangle per segment, every other band two
        assert_eq!(mesh.indices.len(), 3 * (16 * 2 + 16 * 2 * 6));
    }

    #[test]
    fn annulus_spans_inner_to_outer() {
        let mesh = Mesh::annulus(3.0, 5.0, 32, [1.0, 1.0, 1.0]);
        assert_eq!(mesh.vertex_count(), 66);
        assert_eq!(mesh.indices.len(), 32 * 6);
        for v in mesh.vertices.chunks(VERTEX_STRIDE) {
            let r = (v[0] * v[0] + v[1] * v[1]).sqrt();
            assert!((r - 3.0).abs() < 1e-4 || (r - 5.0).abs() < 1e-4);
            assert_eq!(v[2], 0.0);
        }
    }

    #[test]
    fn cuboid_has_six_faces() {
        let mesh = Mesh::cuboid(1.0, 0.5, 2.0, [0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let max_z = mesh
            .vertices
            .chunks(VERTEX_STRIDE)
            .map(|v| v[2])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_z, 1.0);
    }

    // Three positions and two normals, base64 in a data URI.
    const TRIANGLE_BUFFER: &str =
        "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/";

    fn triangle_gltf(attributes: &str) -> String {
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [ {{ "byteLength": 60, "uri": "data:application/octet-stream;base64,{TRIANGLE_BUFFER}" }} ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 24 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC3" }}
  ],
  "meshes": [ {{ "primitives": [ {{ "attributes": {attributes} }} ] }} ]
}}"#
        )
    }

    #[test]
    fn gltf_positions_fill_in_default_attributes() {
        let json = triangle_gltf(r#"{ "POSITION": 0 }"#);
        let mesh = Mesh::from_gltf(json.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.indices.is_empty());
        let second = &mesh.vertices[VERTEX_STRIDE..2 * VERTEX_STRIDE];
        assert_eq!(second, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn gltf_with_short_attribute_is_an_error() {
        let json = triangle_gltf(r#"{ "POSITION": 0, "NORMAL": 1 }"#);
        assert!(Mesh::from_gltf(json.as_bytes()).is_err());
    }

    #[test]
    fn points_are_unindexed() {
        let mesh = Mesh::points(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], &[[0.5, 0.5, 1.0]; 2]);
        assert_eq!(mesh.vertex_count(), 2);
        assert!(mesh.indices.is_empty());
        assert_eq!(&mesh.vertices[11..17], &[4.0, 5.0, 6.0, 0.5, 0.5, 1.0]);
    }
}

//! Renderable assets: geometry loading and texture bundles.
//!
//! Geometry uses a plain text format: a `Vertex Count:` header, a `Data:`
//! marker, then one `x y z tu tv nx ny nz` line per vertex, three per
//! triangle. Parsing is split from GPU upload so it can be tested without a
//! device; the upload side lives in [`crate::renderer::Renderer`]'s
//! `load_*` methods.

use crate::mesh::Mesh;
use crate::vertex::{BumpVertex, Vertex};
use anyhow::{bail, Context, Result};
use glam::{Vec2, Vec3};
use std::path::Path;

/// A plain or per-pixel-lit renderable: mesh + one color texture.
/// Immutable after load; the bind group keeps its GPU resources alive.
pub struct Model {
    pub mesh: Mesh,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// A normal-mapped renderable: tangent-space mesh + color + normal map.
pub struct BumpModel {
    pub mesh: Mesh,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// An animated-fire renderable: mesh + fire, noise, and alpha textures.
pub struct FireModel {
    pub mesh: Mesh,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// Parse the text model format into a vertex list.
pub fn parse_model(text: &str) -> Result<Vec<Vertex>> {
    let mut lines = text.lines();

    let count: usize = loop {
        let line = lines.next().context("missing 'Vertex Count:' header")?;
        if let Some(rest) = line.trim().strip_prefix("Vertex Count:") {
            break rest
                .trim()
                .parse()
                .with_context(|| format!("bad vertex count {:?}", rest.trim()))?;
        }
    };

    loop {
        let line = lines.next().context("missing 'Data:' marker")?;
        if line.trim() == "Data:" {
            break;
        }
    }

    let mut vertices = Vec::with_capacity(count);
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<f32> = line
            .split_whitespace()
            .map(|f| f.parse().with_context(|| format!("bad value {:?}", f)))
            .collect::<Result<_>>()?;
        if fields.len() != 8 {
            bail!("expected 8 values per vertex line, got {}", fields.len());
        }
        vertices.push(Vertex::new(
            [fields[0], fields[1], fields[2]],
            [fields[5], fields[6], fields[7]],
            [fields[3], fields[4]],
        ));
    }

    if vertices.len() != count {
        bail!(
            "vertex count mismatch: header says {}, data has {}",
            count,
            vertices.len()
        );
    }
    if vertices.len() % 3 != 0 {
        bail!("vertex count {} is not a whole number of triangles", vertices.len());
    }
    Ok(vertices)
}

/// Load geometry from disk: the vertex list plus sequential indices
/// (the format stores unindexed triangle lists).
pub fn load_geometry(path: &Path) -> Result<(Vec<Vertex>, Vec<u32>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read model {}", path.display()))?;
    let vertices =
        parse_model(&text).with_context(|| format!("could not parse model {}", path.display()))?;
    let indices = (0..vertices.len() as u32).collect();
    Ok((vertices, indices))
}

/// Derive per-face tangent basis vectors for normal mapping. Every vertex
/// of a triangle shares that triangle's tangent/bitangent.
pub fn with_tangents(vertices: &[Vertex]) -> Vec<BumpVertex> {
    let mut out = Vec::with_capacity(vertices.len());
    for tri in vertices.chunks_exact(3) {
        let p0 = Vec3::from(tri[0].position);
        let p1 = Vec3::from(tri[1].position);
        let p2 = Vec3::from(tri[2].position);
        let uv0 = Vec2::from(tri[0].tex_coords);
        let uv1 = Vec2::from(tri[1].tex_coords);
        let uv2 = Vec2::from(tri[2].tex_coords);

        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let duv1 = uv1 - uv0;
        let duv2 = uv2 - uv0;

        let den = duv1.x * duv2.y - duv2.x * duv1.y;
        let (tangent, bitangent) = if den.abs() > 1e-8 {
            let inv = 1.0 / den;
            (
                ((e1 * duv2.y - e2 * duv1.y) * inv).normalize_or_zero(),
                ((e2 * duv1.x - e1 * duv2.x) * inv).normalize_or_zero(),
            )
        } else {
            // Degenerate UVs; fall back to world axes.
            (Vec3::X, Vec3::Y)
        };

        for v in tri {
            out.push(BumpVertex {
                position: v.position,
                normal: v.normal,
                tex_coords: v.tex_coords,
                tangent: tangent.into(),
                bitangent: bitangent.into(),
            });
        }
    }
    out
}

/// Upload a parsed vertex list as a GPU mesh.
pub(crate) fn upload(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Mesh {
    Mesh::new(device, vertices, indices)
}

/// Upload a tangent-space vertex list as a GPU mesh.
pub(crate) fn upload_bump(device: &wgpu::Device, vertices: &[BumpVertex], indices: &[u32]) -> Mesh {
    Mesh::new(device, vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
Vertex Count: 3

Data:

0.0 0.0 0.0 0.0 1.0 0.0 0.0 -1.0
1.0 0.0 0.0 1.0 1.0 0.0 0.0 -1.0
0.0 1.0 0.0 0.0 0.0 0.0 0.0 -1.0
";

    #[test]
    fn parses_header_and_vertex_lines() {
        let vertices = parse_model(TRIANGLE).unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].tex_coords, [1.0, 1.0]);
        assert_eq!(vertices[2].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn rejects_count_mismatch() {
        let text = TRIANGLE.replace("Vertex Count: 3", "Vertex Count: 6");
        assert!(parse_model(&text).is_err());
    }

    #[test]
    fn rejects_malformed_line() {
        let text = TRIANGLE.replace("1.0 0.0 0.0 1.0 1.0 0.0 0.0 -1.0", "1.0 oops");
        assert!(parse_model(&text).is_err());
    }

    #[test]
    fn rejects_partial_triangle() {
        let text = "Vertex Count: 1\n\nData:\n\n0 0 0 0 0 0 0 1\n";
        assert!(parse_model(text).is_err());
    }

    /// Standard v-down UV mapping on an XY-plane triangle gives a +X
    /// tangent and a -Y bitangent.
    #[test]
    fn tangent_basis_follows_uv_directions() {
        let vertices = parse_model(TRIANGLE).unwrap();
        let bump = with_tangents(&vertices);
        assert_eq!(bump.len(), 3);
        for v in &bump {
            let tangent = Vec3::from(v.tangent);
            let bitangent = Vec3::from(v.bitangent);
            assert!(tangent.distance(Vec3::X) < 1e-5, "tangent {:?}", tangent);
            assert!(bitangent.distance(-Vec3::Y) < 1e-5, "bitangent {:?}", bitangent);
        }
    }
}

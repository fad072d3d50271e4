//! Wavefront OBJ reader
//!
//! Supports `v`, `vt`, `vn`, `f` and `usemtl`. Object/group names, smoothing
//! groups, `mtllib` and unknown keywords are skipped. Polygons are
//! fan-triangulated around their first corner.

use std::str::SplitWhitespace;

use crate::error::LoadError;
use crate::rasterizer::{Vec2, Vec3};
use crate::scene::{Corner, Face, Mesh};

/// Material name given to faces that precede the first `usemtl`
const DEFAULT_MATERIAL: &str = "default";

/// Parse OBJ source text into a validated mesh
pub fn parse_obj(source: &str) -> Result<Mesh, LoadError> {
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut faces = Vec::new();
    let mut materials: Vec<String> = Vec::new();
    let mut current_material = 0;

    for (i, raw) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };

        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let [x, y, z]: [f32; 3] = floats(&mut tokens, line_no, "v")?;
                vertices.push(Vec3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z]: [f32; 3] = floats(&mut tokens, line_no, "vn")?;
                normals.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let u = float(tokens.next(), line_no, "vt")?;
                // v is optional in 1D texture coordinates
                let v = match tokens.next() {
                    Some(t) => float(Some(t), line_no, "vt")?,
                    None => 0.0,
                };
                uvs.push(Vec2::new(u, v));
            }
            "f" => {
                let corners = tokens
                    .map(|t| corner(t, line_no, vertices.len(), uvs.len(), normals.len()))
                    .collect::<Result<Vec<_>, _>>()?;

                if corners.len() < 3 {
                    return Err(LoadError::parse(
                        line_no,
                        format!("face needs at least 3 corners, got {}", corners.len()),
                    ));
                }

                for k in 1..corners.len() - 1 {
                    faces.push(Face::with_material([corners[0], corners[k], corners[k + 1]], current_material));
                }
            }
            "usemtl" => {
                let name = line[keyword.len()..].trim();
                if name.is_empty() {
                    return Err(LoadError::parse(line_no, "usemtl without a name"));
                }
                if materials.is_empty() && !faces.is_empty() {
                    materials.push(DEFAULT_MATERIAL.to_string());
                }
                current_material = match materials.iter().position(|m| m == name) {
                    Some(idx) => idx,
                    None => {
                        materials.push(name.to_string());
                        materials.len() - 1
                    }
                };
            }
            _ => {}
        }
    }

    Mesh::new(vertices, normals, uvs, faces, materials)
}

fn float(token: Option<&str>, line: usize, what: &str) -> Result<f32, LoadError> {
    let token = token.ok_or_else(|| LoadError::parse(line, format!("{} is missing a component", what)))?;
    let value: f32 = token
        .parse()
        .map_err(|_| LoadError::parse(line, format!("invalid number {:?} in {}", token, what)))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoadError::parse(line, format!("non-finite number {:?} in {}", token, what)))
    }
}

fn floats<const N: usize>(tokens: &mut SplitWhitespace<'_>, line: usize, what: &str) -> Result<[f32; N], LoadError> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = float(tokens.next(), line, what)?;
    }
    Ok(out)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn corner(token: &str, line: usize, n_vertices: usize, n_uvs: usize, n_normals: usize) -> Result<Corner, LoadError> {
    let mut parts = token.split('/');
    let vertex = match parts.next() {
        Some(v) if !v.is_empty() => index(v, n_vertices, line)?,
        _ => return Err(LoadError::parse(line, format!("face corner {:?} has no vertex index", token))),
    };
    let uv = optional_index(parts.next(), n_uvs, line)?;
    let normal = optional_index(parts.next(), n_normals, line)?;

    if parts.next().is_some() {
        return Err(LoadError::parse(line, format!("face corner {:?} has too many fields", token)));
    }

    Ok(Corner::new(vertex, uv, normal))
}

fn optional_index(field: Option<&str>, len: usize, line: usize) -> Result<Option<usize>, LoadError> {
    match field {
        Some(f) if !f.is_empty() => index(f, len, line).map(Some),
        _ => Ok(None),
    }
}

/// 1-based OBJ index to 0-based. Negative indices count back from the
/// most recent element. Positive indices past the end are left for
/// `Mesh::new` to reject.
fn index(field: &str, len: usize, line: usize) -> Result<usize, LoadError> {
    let raw: i64 = field
        .parse()
        .map_err(|_| LoadError::parse(line, format!("invalid index {:?}", field)))?;

    match raw {
        0 => Err(LoadError::parse(line, "index 0 is not valid (OBJ indices start at 1)")),
        r if r > 0 => Ok((r - 1) as usize),
        r => {
            let back = r.unsigned_abs() as usize;
            if back > len {
                Err(LoadError::parse(line, format!("relative index {} with only {} elements", r, len)))
            } else {
                Ok(len - back)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexKind;

    const QUAD: &str = "\
# a unit quad
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
s off
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.uvs().len(), 4);
        assert_eq!(mesh.normals().len(), 1);
        assert_eq!(mesh.faces().len(), 2);

        let verts: Vec<[usize; 3]> = mesh
            .faces()
            .iter()
            .map(|f| f.corners.map(|c| c.vertex))
            .collect();
        assert_eq!(verts, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.faces()[1].corners[2], Corner::full(3, 3, 0));
        assert!(mesh.materials().is_empty());
    }

    #[test]
    fn test_pentagon_gives_three_triangles() {
        let src = "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n";
        let mesh = parse_obj(src).unwrap();
        assert_eq!(mesh.faces().len(), 3);
        assert_eq!(mesh.faces()[2].corners.map(|c| c.vertex), [0, 3, 4]);
    }

    #[test]
    fn test_corner_field_variants() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.5\nvn 0 0 1\nf 1 2/1 3//1\n";
        let mesh = parse_obj(src).unwrap();
        let [a, b, c] = mesh.faces()[0].corners;
        assert_eq!(a, Corner::new(0, None, None));
        assert_eq!(b, Corner::new(1, Some(0), None));
        assert_eq!(c, Corner::new(2, None, Some(0)));
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 5 5 5\nf -4 -3 -1\n";
        let mesh = parse_obj(src).unwrap();
        assert_eq!(mesh.faces()[0].corners.map(|c| c.vertex), [0, 1, 2]);
        assert_eq!(mesh.faces()[1].corners.map(|c| c.vertex), [0, 1, 3]);
    }

    #[test]
    fn test_index_zero_is_rejected() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_out_of_range_rejects_whole_mesh() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nf 1 2 9\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::IndexOutOfRange { face: 1, kind: IndexKind::Vertex, index: 8, len: 3 }
        ));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 -4\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_malformed_numbers_report_line() {
        let err = parse_obj("v 0 0 0\nv 1 zero 0\n").unwrap_err();
        match err {
            LoadError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("zero"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(parse_obj("v 1 2\n"), Err(LoadError::Parse { line: 1, .. })));
        assert!(matches!(parse_obj("v 0 0 0\nf 1 1\n"), Err(LoadError::Parse { line: 2, .. })));
        assert!(matches!(parse_obj("v 0 0 0\nf 1/1/1/1 1 1\n"), Err(LoadError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_usemtl_assigns_materials() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
usemtl body
f 1 2 3
usemtl eyes
f 1 2 3
usemtl body
f 1 2 3
";
        let mesh = parse_obj(src).unwrap();
        assert_eq!(mesh.materials(), &["default", "body", "eyes"]);
        let mats: Vec<usize> = mesh.faces().iter().map(|f| f.material).collect();
        assert_eq!(mats, vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_comments_and_unknown_keywords_are_skipped() {
        let src = "mtllib scene.mtl\n# comment\n\ng group\nv 0 0 0 # trailing\nv 1 0 0\nv 0 1 0\nl 1 2\nf 1 2 3\n";
        let mesh = parse_obj(src).unwrap();
        assert_eq!(mesh.faces().len(), 1);
    }

    #[test]
    fn test_vt_with_single_component() {
        let mesh = parse_obj("vt 0.25\nvt 0.5 0.75 0.0\n").unwrap();
        assert_eq!(mesh.uvs(), &[Vec2::new(0.25, 0.0), Vec2::new(0.5, 0.75)]);
    }
}

//! Wavefront OBJ loading
//!
//! Minimal parser for the subset the engine consumes: positions, normals,
//! and faces. Faces with more than three vertices are fan-triangulated.
//! Vertex color is set from the normal, which gives untextured models a
//! readable shaded look.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::render::mesh::{Mesh, Vertex};

/// OBJ parsing errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// Failed to read the file
    #[error("failed to read OBJ: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in the file
    #[error("OBJ parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// Face references a vertex index outside the file's data
    #[error("OBJ index out of range at line {line}: {index}")]
    IndexOutOfRange {
        /// 1-based line number
        line: usize,
        /// The offending 1-based index
        index: isize,
    },
}

const FALLBACK_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Parse an OBJ model from a reader into a flat, non-indexed mesh
pub fn load_obj(reader: impl Read) -> Result<Mesh, ObjError> {
    let reader = BufReader::new(reader);

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut mesh = Mesh::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => positions.push(parse_vec3(parts, line_number)?),
            "vn" => normals.push(parse_vec3(parts, line_number)?),
            "f" => {
                let corners: Vec<(usize, Option<usize>)> = parts
                    .map(|corner| parse_face_corner(corner, line_number, positions.len(), normals.len()))
                    .collect::<Result<_, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::Parse {
                        line: line_number,
                        message: format!("face has {} vertices, need at least 3", corners.len()),
                    });
                }

                // Fan triangulation around the first corner
                for i in 1..corners.len() - 1 {
                    for &(position_index, normal_index) in
                        [corners[0], corners[i], corners[i + 1]].iter()
                    {
                        let normal = normal_index
                            .map(|n| normals[n])
                            .unwrap_or(FALLBACK_NORMAL);
                        mesh.vertices.push(Vertex::new(
                            positions[position_index],
                            normal,
                            normal,
                        ));
                    }
                }
            }
            // vt, o, g, s, usemtl, mtllib: ignored
            _ => {}
        }
    }

    log::debug!("parsed OBJ: {} vertices", mesh.vertex_count());
    Ok(mesh)
}

/// Load an OBJ model from a file
pub fn load_obj_file(path: &Path) -> Result<Mesh, ObjError> {
    let file = std::fs::File::open(path)?;
    let mesh = load_obj(file)?;
    log::info!(
        "loaded model {} ({} vertices)",
        path.display(),
        mesh.vertex_count()
    );
    Ok(mesh)
}

fn parse_vec3<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; 3], ObjError> {
    let mut values = [0.0f32; 3];
    for value in &mut values {
        let token = parts.next().ok_or(ObjError::Parse {
            line,
            message: "expected three components".to_string(),
        })?;
        *value = token.parse().map_err(|_| ObjError::Parse {
            line,
            message: format!("invalid float '{token}'"),
        })?;
    }
    Ok(values)
}

/// Parse one `v`, `v/vt`, `v//vn`, or `v/vt/vn` face corner into 0-based
/// position and optional normal indices
fn parse_face_corner(
    corner: &str,
    line: usize,
    position_count: usize,
    normal_count: usize,
) -> Result<(usize, Option<usize>), ObjError> {
    let mut fields = corner.split('/');
    let position_token = fields.next().unwrap_or("");
    let _texcoord = fields.next();
    let normal_token = fields.next();

    let position_index = resolve_index(position_token, line, position_count)?;
    let normal_index = match normal_token {
        Some(token) if !token.is_empty() => Some(resolve_index(token, line, normal_count)?),
        _ => None,
    };
    Ok((position_index, normal_index))
}

/// Resolve a 1-based (or negative, relative) OBJ index against `count`
fn resolve_index(token: &str, line: usize, count: usize) -> Result<usize, ObjError> {
    let raw: isize = token.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid index '{token}'"),
    })?;

    let resolved = if raw > 0 {
        (raw - 1) as usize
    } else if raw < 0 {
        let offset = (-raw) as usize;
        if offset > count {
            return Err(ObjError::IndexOutOfRange { line, index: raw });
        }
        count - offset
    } else {
        return Err(ObjError::IndexOutOfRange { line, index: raw });
    };

    if resolved >= count {
        return Err(ObjError::IndexOutOfRange { line, index: raw });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRIANGLE_OBJ: &str = "\
# simple triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
";

    #[test]
    fn parses_triangle_with_normals() {
        let mesh = load_obj(Cursor::new(TRIANGLE_OBJ)).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        // Color is taken from the normal
        assert_eq!(mesh.vertices[0].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let obj = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";
        let mesh = load_obj(Cursor::new(obj)).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        // Second triangle shares the fan origin
        assert_eq!(mesh.vertices[3].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_normals_get_a_fallback() {
        let obj = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let mesh = load_obj(Cursor::new(obj)).unwrap();
        assert_eq!(mesh.vertices[0].normal, FALLBACK_NORMAL);
    }

    #[test]
    fn negative_indices_resolve_from_the_end() {
        let obj = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f -3 -2 -1
";
        let mesh = load_obj(Cursor::new(obj)).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let obj = "\
v 0.0 0.0 0.0
f 1 2 3
";
        let err = load_obj(Cursor::new(obj)).unwrap_err();
        assert!(matches!(err, ObjError::IndexOutOfRange { line: 2, .. }));
    }

    #[test]
    fn malformed_float_is_an_error() {
        let err = load_obj(Cursor::new("v 0.0 abc 0.0\n")).unwrap_err();
        assert!(matches!(err, ObjError::Parse { line: 1, .. }));
    }
}

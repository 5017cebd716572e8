//! Minimal Wavefront OBJ reader: positions and triangular faces only.

use std::{fs, path::Path};

use bytemuck::{Pod, Zeroable};
use log::info;

use crate::error::{AppError, Result};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Three 0-based vertex indices.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct Face {
    pub a: u16,
    pub b: u16,
    pub c: u16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| AppError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mesh = Self::parse(&text).map_err(|(line, reason)| AppError::MalformedFile {
            path: path.to_path_buf(),
            line: Some(line),
            reason,
        })?;

        info!(
            "Loaded {} vertices, {} triangles from {}",
            mesh.vertices.len(),
            mesh.faces.len(),
            path.display()
        );
        Ok(mesh)
    }

    /// Parses OBJ text. `v x y z` adds a vertex, `f a b c` a triangle with
    /// 1-based indices; blank lines, comments and every other statement are
    /// skipped. Errors carry the 1-based line number.
    pub fn parse(text: &str) -> std::result::Result<Self, (usize, String)> {
        let mut mesh = Self::default();

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            let mut fields = line.split_whitespace();

            match fields.next() {
                Some("v") => {
                    let [x, y, z] = three(fields, |f| f.parse::<f32>().ok()).ok_or_else(|| {
                        (number, format!("Error reading vertex from line: {line}"))
                    })?;
                    mesh.vertices.push(Vertex { x, y, z });
                }
                Some("f") => {
                    let [a, b, c] = three(fields, face_index)
                        .ok_or_else(|| (number, format!("Error reading face from line: {line}")))?;
                    mesh.faces.push(Face { a, b, c });
                }
                _ => {}
            }
        }

        Ok(mesh)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.faces)
    }

    /// Number of indices to hand to `glDrawElements`.
    pub fn index_count(&self) -> usize {
        self.faces.len() * 3
    }
}

/// Exactly three fields, each accepted by `parse`.
fn three<'a, T: Copy + Default>(
    mut fields: impl Iterator<Item = &'a str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<[T; 3]> {
    let mut out = [T::default(); 3];
    for slot in &mut out {
        *slot = parse(fields.next()?)?;
    }
    fields.next().is_none().then_some(out)
}

/// `7`, `7/2` and `7/2/5` all name vertex 7; converted to 0-based.
fn face_index(field: &str) -> Option<u16> {
    let vertex = field.split('/').next()?;
    vertex.parse::<u16>().ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_indices_become_zero_based() {
        let mesh = Mesh::parse("f 2 4 7\n").unwrap();
        assert_eq!(mesh.faces, vec![Face { a: 1, b: 3, c: 6 }]);
    }

    #[test]
    fn parses_vertices_and_skips_other_statements() {
        let text = "# cube corner\n\
                    o Corner\n\
                    v 0.0 1.5 -2\n\
                    vn 0 0 1\n\
                    \n\
                    v 1 0 0\n\
                    v 0 0 1\n\
                    s off\n\
                    f 1/1 2/2/2 3//3\n";
        let mesh = Mesh::parse(text).unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[0], Vertex { x: 0.0, y: 1.5, z: -2.0 });
        assert_eq!(mesh.faces, vec![Face { a: 0, b: 1, c: 2 }]);
        assert_eq!(mesh.index_count(), 3);
    }

    #[test]
    fn bad_vertex_reports_its_line() {
        let (line, reason) = Mesh::parse("v 1 2 3\nv 1 two 3\n").unwrap_err();
        assert_eq!(line, 2);
        assert!(reason.contains("v 1 two 3"));
    }

    #[test]
    fn zero_index_is_rejected() {
        let (line, _) = Mesh::parse("f 0 1 2").unwrap_err();
        assert_eq!(line, 1);
    }

    #[test]
    fn quads_are_rejected() {
        assert!(Mesh::parse("f 1 2 3 4").is_err());
    }

    #[test]
    fn buffers_are_tightly_packed() {
        let mesh = Mesh::parse("v 1 2 3\nv 4 5 6\nv 7 8 9\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.vertex_bytes().len(), 3 * 3 * 4);
        assert_eq!(mesh.index_bytes().len(), 3 * 2);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = Mesh::load(Path::new("/no/such/mesh.obj")).unwrap_err();
        assert!(matches!(err, AppError::FileNotFound { .. }));
    }
}

// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wavefront OBJ export.
//!
//! Each vertex is written as a `v`/`vn`/`vt` triple sharing one index, so every
//! face corner reads `i/i/i`. Normals are the normalized cross product of the
//! two stored partial derivatives.

use super::{MeshError, MeshVertex, ParametricMesh};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

impl ParametricMesh {
    /// Writes the mesh with its triangle topology as OBJ text.
    ///
    /// # Errors
    ///
    /// [`MeshError::DegenerateNormal`] if a vertex has no usable normal, or
    /// [`MeshError::Io`] if the writer fails. Nothing is written past the
    /// first error.
    pub fn write_obj_triangles<W: Write>(&self, writer: W) -> Result<(), MeshError> {
        self.write_obj(writer, self.triangles(), 3)
    }

    /// Writes the mesh with its quad topology as OBJ text.
    ///
    /// # Errors
    ///
    /// Same as [`write_obj_triangles`](Self::write_obj_triangles).
    pub fn write_obj_quads<W: Write>(&self, writer: W) -> Result<(), MeshError> {
        self.write_obj(writer, self.quads(), 4)
    }

    /// Exports the triangle topology to an OBJ file, replacing any existing file.
    pub fn export_obj_triangles(&self, path: impl AsRef<Path>) -> Result<(), MeshError> {
        let path = path.as_ref();
        self.write_obj_triangles(BufWriter::new(File::create(path)?))?;
        log::debug!("Exported {} triangles to '{}'", self.triangle_count(), path.display());
        Ok(())
    }

    /// Exports the quad topology to an OBJ file, replacing any existing file.
    pub fn export_obj_quads(&self, path: impl AsRef<Path>) -> Result<(), MeshError> {
        let path = path.as_ref();
        self.write_obj_quads(BufWriter::new(File::create(path)?))?;
        log::debug!("Exported {} quads to '{}'", self.quad_count(), path.display());
        Ok(())
    }

    fn write_obj<W: Write>(
        &self,
        writer: W,
        indices: &[u16],
        corners: usize,
    ) -> Result<(), MeshError> {
        // Validate every normal first so a failed export leaves no partial body.
        let normals = self
            .vertices()
            .iter()
            .enumerate()
            .map(|(index, vertex)| {
                vertex_normal(vertex).ok_or(MeshError::DegenerateNormal { vertex: index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = writer;
        writeln!(out, "# Parametric mesh export")?;
        writeln!(out)?;

        writeln!(out, "# Vertices")?;
        for (vertex, n) in self.vertices().iter().zip(&normals) {
            let p = vertex.position;
            let st = vertex.tex_coord;
            writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
            writeln!(out, "vn {:.6} {:.6} {:.6}", n[0], n[1], n[2])?;
            writeln!(out, "vt {:.6} {:.6}", st.x, st.y)?;
        }

        writeln!(out, "# Topology")?;
        for face in indices.chunks_exact(corners) {
            let corners = face
                .iter()
                .map(|&i| {
                    let i = u32::from(i) + 1;
                    format!("{i}/{i}/{i}")
                })
                .collect::<Vec<_>>();
            writeln!(out, "f {}", corners.join(" "))?;
        }

        out.flush()?;
        Ok(())
    }
}

fn vertex_normal(vertex: &MeshVertex) -> Option<[f32; 3]> {
    let n = vertex
        .tangent
        .truncate()
        .cross(vertex.bitangent.truncate())
        .try_normalize()?;
    Some([n.x, n.y, n.z])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_to_string(mesh: &ParametricMesh, quads: bool) -> String {
        let mut bytes = Vec::new();
        if quads {
            mesh.write_obj_quads(&mut bytes).unwrap();
        } else {
            mesh.write_obj_triangles(&mut bytes).unwrap();
        }
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn plane_export_writes_one_based_faces() {
        let mesh = ParametricMesh::plane(1.0, 1.0, 0, 0).unwrap();
        let text = export_to_string(&mesh, false);

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, vec!["f 1/1/1 3/3/3 2/2/2", "f 2/2/2 3/3/3 4/4/4"]);
        assert!(text.contains("vn 0.000000 0.000000 1.000000"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
    }

    #[test]
    fn quad_export_writes_four_corners() {
        let mesh = ParametricMesh::plane(1.0, 1.0, 1, 0).unwrap();
        let text = export_to_string(&mesh, true);

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0], "f 1/1/1 3/3/3 4/4/4 2/2/2");
    }

    #[test]
    fn degenerate_frame_is_reported_before_writing() {
        // Odd tessellation places a vertex on the disk centre.
        let mesh = ParametricMesh::disk(1.0, 1, 1).unwrap();
        let mut bytes = Vec::new();

        match mesh.write_obj_triangles(&mut bytes) {
            Err(MeshError::DegenerateNormal { vertex }) => assert_eq!(vertex, 4),
            other => panic!("expected DegenerateNormal, got {other:?}"),
        }
        assert!(bytes.is_empty());
    }
}

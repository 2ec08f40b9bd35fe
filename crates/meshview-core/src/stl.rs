//! STL loading

use std::collections::HashMap;
use std::io::{Read, Seek};

use glam::Vec3;

use crate::import::ImportError;
use crate::mesh::{MeshData, Vertex};

/// Precision for vertex comparison (multiply by this, then round to int)
const PRECISION: f32 = 10000.0;

/// Read an ASCII or binary STL solid
pub fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<MeshData, ImportError> {
    let mesh = stl_io::read_stl(reader).map_err(|e| ImportError::ParseFailure(e.to_string()))?;

    if mesh.faces.is_empty() {
        return Err(ImportError::NoMeshes);
    }

    Ok(index_mesh(&mesh))
}

/// Convert STL faces to an indexed mesh with per-vertex normals.
///
/// Corners sharing both position and face normal are joined, so flat faces
/// keep hard edges.
fn index_mesh(mesh: &stl_io::IndexedMesh) -> MeshData {
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut vertex_map: HashMap<[i32; 6], u32> = HashMap::new();
    let mut indices: Vec<u32> = Vec::with_capacity(mesh.faces.len() * 3);

    for face in &mesh.faces {
        let corners = face.vertices.map(|i| {
            let v = mesh.vertices[i];
            Vec3::new(v[0], v[1], v[2])
        });
        let normal = face_normal(&face.normal, &corners);

        for corner in corners {
            let key = [
                quantize(corner.x),
                quantize(corner.y),
                quantize(corner.z),
                quantize(normal.x),
                quantize(normal.y),
                quantize(normal.z),
            ];

            let index = *vertex_map.entry(key).or_insert_with(|| {
                vertices.push(Vertex::new(corner.to_array(), normal.to_array()));
                (vertices.len() - 1) as u32
            });

            indices.push(index);
        }
    }

    MeshData::new(vertices, indices)
}

/// Stored normal, or the winding normal when the file leaves it zeroed
fn face_normal(stored: &stl_io::Normal, corners: &[Vec3; 3]) -> Vec3 {
    let stored = Vec3::new(stored[0], stored[1], stored[2]);
    if stored.length_squared() > f32::EPSILON {
        return stored.normalize();
    }

    let cross = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
    if cross.length_squared() > 0.0 {
        cross.normalize()
    } else {
        Vec3::Z
    }
}

fn quantize(value: f32) -> i32 {
    (value * PRECISION) as i32
}

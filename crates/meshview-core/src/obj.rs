//! Wavefront OBJ loading

use std::io::BufRead;
use std::path::Path;

use crate::import::ImportError;
use crate::mesh::{MeshData, Vertex};

/// Load the first mesh of an OBJ file. Materials are ignored.
pub fn load_obj(path: &Path) -> Result<MeshData, ImportError> {
    let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| ImportError::ParseFailure(format!("{}: {}", path.display(), e)))?;

    first_mesh(models)
}

/// Read the first mesh of OBJ text. `mtllib` references are not followed.
pub fn read_obj<R: BufRead>(reader: &mut R) -> Result<MeshData, ImportError> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &tobj::GPU_LOAD_OPTIONS, |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| ImportError::ParseFailure(e.to_string()))?;

    first_mesh(models)
}

/// Models without faces (trailing groups, point clouds) are not meshes.
fn first_mesh(models: Vec<tobj::Model>) -> Result<MeshData, ImportError> {
    let mut meshes = models.into_iter().filter(|m| !m.mesh.indices.is_empty());

    let model = meshes.next().ok_or(ImportError::NoMeshes)?;

    let discarded = meshes.count();
    if discarded > 0 {
        tracing::debug!(
            "Using mesh '{}', discarding {} more",
            model.name,
            discarded
        );
    }

    let mesh = model.mesh;
    if mesh.normals.len() < mesh.positions.len() {
        return Err(ImportError::MissingNormals {
            vertices: mesh.positions.len() / 3,
            normals: mesh.normals.len() / 3,
        });
    }

    let vertices = mesh
        .positions
        .chunks_exact(3)
        .zip(mesh.normals.chunks_exact(3))
        .map(|(p, n)| Vertex::new([p[0], p[1], p[2]], [n[0], n[1], n[2]]))
        .collect();

    Ok(MeshData::new(vertices, mesh.indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_quad_is_triangulated_and_joined() {
        let source = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";
        let data = read_obj(&mut Cursor::new(source)).unwrap();

        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices.len(), 6);
    }

    #[test]
    fn test_missing_normals_is_reported() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let result = read_obj(&mut Cursor::new(source));

        assert_eq!(
            result,
            Err(ImportError::MissingNormals {
                vertices: 3,
                normals: 0
            })
        );
    }

    #[test]
    fn test_later_meshes_are_discarded() {
        let source = "\
o empty
o tri
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
o other
v 5 5 5
f 4//1 2//1 3//1
";
        let data = read_obj(&mut Cursor::new(source)).unwrap();

        assert_eq!(data.vertices.len(), 3);
        assert!(data.vertices.iter().all(|v| v.position[0] < 5.0));
    }
}

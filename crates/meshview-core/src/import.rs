//! Mesh import
//!
//! Reads a scene file and returns the triangulated geometry of its first
//! mesh. Additional meshes are discarded.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

use crate::mesh::MeshData;
use crate::{obj, stl};

/// Scene file formats the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    /// Picks the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "obj" => Ok(MeshFormat::Obj),
            "stl" => Ok(MeshFormat::Stl),
            _ => Err(ImportError::UnsupportedFormat(extension)),
        }
    }

    pub fn extensions() -> &'static [&'static str] {
        &["obj", "stl"]
    }
}

/// Errors that can occur during mesh import
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("Scene contains no meshes")]
    NoMeshes,

    #[error("Failed to parse scene: {0}")]
    ParseFailure(String),

    #[error("Mesh has {normals} normals for {vertices} vertices")]
    MissingNormals { vertices: usize, normals: usize },

    #[error("Unsupported mesh format: '{0}' (expected obj or stl)")]
    UnsupportedFormat(String),
}

/// Import the first mesh of a scene file
pub fn import(path: impl AsRef<Path>) -> Result<MeshData, ImportError> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;

    let data = match format {
        MeshFormat::Obj => obj::load_obj(path),
        MeshFormat::Stl => {
            let file = File::open(path)
                .map_err(|e| ImportError::ParseFailure(format!("{}: {}", path.display(), e)))?;
            stl::read_stl(&mut BufReader::new(file))
        }
    }?;

    validate(&data)?;

    tracing::info!(
        "Imported {:?}: {} vertices, {} triangles",
        path,
        data.vertices.len(),
        data.triangle_count()
    );
    Ok(data)
}

/// Import the first mesh from an in-memory or already opened source
pub fn import_from_reader<R>(reader: &mut R, format: MeshFormat) -> Result<MeshData, ImportError>
where
    R: BufRead + Seek,
{
    let data = match format {
        MeshFormat::Obj => obj::read_obj(reader),
        MeshFormat::Stl => stl::read_stl(reader),
    }?;

    validate(&data)?;
    Ok(data)
}

/// Checks that the index stream forms whole triangles over existing vertices
fn validate(data: &MeshData) -> Result<(), ImportError> {
    if data.indices.len() % 3 != 0 {
        return Err(ImportError::ParseFailure(format!(
            "index count {} is not a multiple of 3",
            data.indices.len()
        )));
    }

    let vertex_count = data.vertices.len();
    if let Some(index) = data.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ImportError::ParseFailure(format!(
            "index {} out of range for {} vertices",
            index, vertex_count
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Vertex;
    use std::io::Cursor;

    const TWO_OBJECTS: &str = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
o second
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 4//1 5//1 6//1 7//1
";

    #[test]
    fn test_format_from_extension() {
        assert_eq!(MeshFormat::from_path(Path::new("a/b.OBJ")), Ok(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path(Path::new("part.stl")), Ok(MeshFormat::Stl));
        assert!(matches!(
            MeshFormat::from_path(Path::new("scene.fbx")),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            MeshFormat::from_path(Path::new("no_extension")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_import_selects_first_mesh() {
        let data = import_from_reader(&mut Cursor::new(TWO_OBJECTS), MeshFormat::Obj).unwrap();

        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.indices.len(), 3);
        assert_eq!(data.vertices[1].position, [1.0, 0.0, 0.0]);
        assert!(data.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_import_without_faces_has_no_meshes() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";
        let result = import_from_reader(&mut Cursor::new(source), MeshFormat::Obj);

        assert_eq!(result, Err(ImportError::NoMeshes));
    }

    #[test]
    fn test_import_empty_stl_has_no_meshes() {
        let mut buffer = Cursor::new(Vec::new());
        stl_io::write_stl(&mut buffer, std::iter::empty::<stl_io::Triangle>()).unwrap();
        buffer.set_position(0);

        let result = import_from_reader(&mut buffer, MeshFormat::Stl);

        assert_eq!(result, Err(ImportError::NoMeshes));
    }

    #[test]
    fn test_missing_file_is_parse_failure() {
        let result = import("does/not/exist.obj");
        assert!(matches!(result, Err(ImportError::ParseFailure(_))));

        let result = import("does/not/exist.stl");
        assert!(matches!(result, Err(ImportError::ParseFailure(_))));
    }

    #[test]
    fn test_bundled_triangle_asset() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/models/triangle.obj");
        let data = import(path).unwrap();

        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_bundled_cube_asset() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/models/cube.obj");
        let data = import(path).unwrap();

        assert_eq!(data.triangle_count(), 12);
        assert_eq!(data.indices.len() % 3, 0);
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let normal = [0.0, 0.0, 1.0];
        let data = MeshData::new(
            vec![Vertex::new([0.0; 3], normal), Vertex::new([1.0, 0.0, 0.0], normal)],
            vec![0, 1, 2],
        );

        assert!(matches!(validate(&data), Err(ImportError::ParseFailure(_))));
    }

    #[test]
    fn test_validate_rejects_partial_triangle() {
        let normal = [0.0, 0.0, 1.0];
        let data = MeshData::new(
            vec![Vertex::new([0.0; 3], normal); 3],
            vec![0, 1, 2, 0],
        );

        assert!(matches!(validate(&data), Err(ImportError::ParseFailure(_))));
    }
}

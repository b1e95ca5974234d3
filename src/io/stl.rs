//! STL (stereolithography) format support.
//!
//! Both binary and ASCII files are read; files are written as binary.
//! STL only stores triangles, so polygon faces are fan-triangulated on save.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{ReliefError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, SurfaceMesh};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Coincident corners are
/// merged by the reader; triangles that collapse after merging are skipped.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| ReliefError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();

    if faces.is_empty() {
        return Err(ReliefError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|f| {
            let p0 = &vertices[f[0]];
            let p1 = &vertices[f[1]];
            let p2 = &vertices[f[2]];
            let n = (p1 - p0).cross(&(p2 - p0)).normalize();

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| ReliefError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

//! PLY (Stanford polygon) format support.
//!
//! Faces are loaded and saved as polygons, so quad-dominant patches keep
//! their topology.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{ReliefError, Result};
use crate::mesh::{build_from_polygons, SurfaceMesh};

/// Load a mesh from a PLY file (ASCII or binary).
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let load_error = |message: &str| ReliefError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let x = get_float_property(vertex, "x").ok_or_else(|| load_error("vertex missing x coordinate"))?;
        let y = get_float_property(vertex, "y").ok_or_else(|| load_error("vertex missing y coordinate"))?;
        let z = get_float_property(vertex, "z").ok_or_else(|| load_error("vertex missing z coordinate"))?;
        vertices.push(Point3::new(x, y, z));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;
        faces.push(indices);
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    build_from_polygons(&vertices, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to an ASCII PLY file, keeping polygon faces.
///
/// Positions are written at double precision so sub-millimeter
/// displacements survive.
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by relief")?;
    writeln!(writer, "element vertex {}", mesh.num_vertices())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", mesh.num_faces())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }

    for f in mesh.face_ids() {
        let loop_ = mesh.face(f);
        if loop_.len() > u8::MAX as usize {
            return Err(ReliefError::SaveError {
                path: path.to_path_buf(),
                message: format!("face {} has {} vertices, PLY lists hold at most 255", f, loop_.len()),
            });
        }
        let indices: Vec<String> = loop_.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{} {}", loop_.len(), indices.join(" "))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_vertical_grid, VertexId};

    #[test]
    fn test_roundtrip_keeps_quads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.ply");

        let mut mesh = build_vertical_grid(4, 3, 0.5, 2.0).unwrap();
        mesh.set_position(VertexId::new(5), Point3::new(-0.25, 2.000123, 0.5));
        save(&mesh, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), 12);
        assert_eq!(loaded.num_faces(), 6);
        assert_eq!(loaded.num_edges(), mesh.num_edges());
        assert!(loaded.face_ids().all(|f| loaded.face(f).len() == 4));
        assert_eq!(loaded.position(VertexId::new(5)).y, 2.000123);
    }

    #[test]
    fn test_missing_file() {
        let result = load("/nonexistent/relief/patch.ply");
        assert!(matches!(result, Err(ReliefError::Io(_))));
    }
}

//! Mesh file I/O.
//!
//! This module provides functions for loading and saving surface meshes.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | PLY | `.ply` | ✓ | ✓ | Polygons kept as-is |
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII, triangles only |
//!
//! PLY is the better choice for relief patches: quad faces survive the round
//! trip, while STL triangulates them and every triangulated border quad adds
//! a shortcut chord to the shape loop.
//!
//! # Usage
//!
//! ```no_run
//! use relief::io::{load, save};
//!
//! let mesh = load("socket.ply").unwrap();
//! save(&mesh, "socket_out.ply").unwrap();
//! ```

pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{ReliefError, Result};
use crate::mesh::SurfaceMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| ReliefError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Save a mesh to a file with automatic format detection.
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
    }
}

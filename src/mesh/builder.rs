//! Mesh construction utilities.
//!
//! This module builds [`SurfaceMesh`] values from face-vertex lists as found
//! in mesh file formats, deriving the undirected edge set, the per-edge face
//! counts, and the vertex adjacency table.

use std::collections::HashMap;

use nalgebra::Point3;

use super::index::{EdgeId, VertexId};
use super::surface::{Edge, SurfaceMesh, Vertex};
use crate::error::{ReliefError, Result};

/// Build a surface mesh from vertices and polygon faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of polygon faces, each as an ordered vertex index loop
///
/// # Errors
/// * [`ReliefError::EmptyMesh`] if there are no faces
/// * [`ReliefError::InvalidVertexIndex`] for out-of-range indices
/// * [`ReliefError::DegenerateFace`] for faces with fewer than three distinct vertices
/// * [`ReliefError::NonManifoldEdge`] for edges shared by more than two faces
///
/// # Example
/// ```
/// use relief::mesh::build_from_polygons;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.5, 1.5, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
///
/// let mesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// assert_eq!(mesh.num_edges(), 6);
/// ```
pub fn build_from_polygons(vertices: &[Point3<f64>], faces: &[Vec<usize>]) -> Result<SurfaceMesh> {
    if faces.is_empty() {
        return Err(ReliefError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(ReliefError::DegenerateFace { face: fi });
        }
        for (i, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(ReliefError::InvalidVertexIndex {
                    element: fi,
                    vertex: vi,
                });
            }
            if face[..i].contains(&vi) {
                return Err(ReliefError::DegenerateFace { face: fi });
            }
        }
    }

    // Map from sorted vertex pair to edge ID
    let mut edge_map: HashMap<(usize, usize), EdgeId> = HashMap::new();
    let mut edges: Vec<Edge> = Vec::new();

    for face in faces {
        for (i, &a) in face.iter().enumerate() {
            let b = face[(i + 1) % face.len()];
            let key = (a.min(b), a.max(b));
            let id = *edge_map.entry(key).or_insert_with(|| {
                edges.push(Edge::new(VertexId::new(a), VertexId::new(b)));
                EdgeId::new(edges.len() - 1)
            });
            let edge = &mut edges[id.index()];
            if edge.face_count >= 2 {
                return Err(ReliefError::NonManifoldEdge { v0: key.0, v1: key.1 });
            }
            edge.face_count += 1;
        }
    }

    let faces = faces
        .iter()
        .map(|f| f.iter().map(|&v| VertexId::new(v)).collect())
        .collect();

    Ok(assemble(
        vertices.iter().map(|&p| Vertex::new(p)).collect(),
        faces,
        edges,
    ))
}

/// Build a surface mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use relief::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_edges(), 3);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<SurfaceMesh> {
    let polygons: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    build_from_polygons(vertices, &polygons)
}

/// Build a surface mesh from vertices and quad faces (counter-clockwise).
pub fn build_from_quads(vertices: &[Point3<f64>], faces: &[[usize; 4]]) -> Result<SurfaceMesh> {
    let polygons: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    build_from_polygons(vertices, &polygons)
}

/// Build a mesh that only carries vertices and explicit edges.
///
/// Used for boundary-tagged graphs handed over by a host that has no face
/// information. Every edge gets a face count of 2, so nothing is reported as
/// a border edge; border membership must then be supplied separately.
pub fn build_from_edges(vertices: &[Point3<f64>], edges: &[[usize; 2]]) -> Result<SurfaceMesh> {
    if vertices.is_empty() {
        return Err(ReliefError::EmptyPatch);
    }

    let mut seen: HashMap<(usize, usize), ()> = HashMap::new();
    let mut out: Vec<Edge> = Vec::with_capacity(edges.len());
    for (ei, &[a, b]) in edges.iter().enumerate() {
        for v in [a, b] {
            if v >= vertices.len() {
                return Err(ReliefError::InvalidVertexIndex {
                    element: ei,
                    vertex: v,
                });
            }
        }
        if a == b {
            return Err(ReliefError::invalid_param("edge", ei, "edge joins a vertex to itself"));
        }
        if seen.insert((a.min(b), a.max(b)), ()).is_none() {
            let mut e = Edge::new(VertexId::new(a), VertexId::new(b));
            e.face_count = 2;
            out.push(e);
        }
    }

    Ok(assemble(
        vertices.iter().map(|&p| Vertex::new(p)).collect(),
        Vec::new(),
        out,
    ))
}

/// Fill in the CSR adjacency table for a set of vertices, faces and edges.
fn assemble(vertices: Vec<Vertex>, faces: Vec<Vec<VertexId>>, edges: Vec<Edge>) -> SurfaceMesh {
    let n = vertices.len();

    let mut degree = vec![0usize; n];
    for e in &edges {
        degree[e.vertices[0].index()] += 1;
        degree[e.vertices[1].index()] += 1;
    }

    let mut offsets = Vec::with_capacity(n + 1);
    offsets.push(0);
    for d in &degree {
        offsets.push(offsets.last().copied().unwrap_or(0) + d);
    }

    let mut cursor = offsets[..n].to_vec();
    let mut adjacency = vec![(VertexId::invalid(), EdgeId::invalid()); offsets[n]];
    for (i, e) in edges.iter().enumerate() {
        let [a, b] = e.vertices;
        adjacency[cursor[a.index()]] = (b, EdgeId::new(i));
        cursor[a.index()] += 1;
        adjacency[cursor[b.index()]] = (a, EdgeId::new(i));
        cursor[b.index()] += 1;
    }

    // Deterministic neighbor order regardless of face order
    for v in 0..n {
        adjacency[offsets[v]..offsets[v + 1]].sort_unstable_by_key(|&(n, _)| n);
    }

    SurfaceMesh {
        vertices,
        faces,
        edges,
        offsets,
        adjacency,
    }
}

/// Convert a surface mesh back to a triangle face-vertex representation.
///
/// Polygons are fan-triangulated from their first vertex.
pub fn to_face_vertex(mesh: &SurfaceMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(mesh.num_faces());
    for f in mesh.face_ids() {
        let loop_ = mesh.face(f);
        for i in 1..loop_.len() - 1 {
            faces.push([loop_[0].index(), loop_[i].index(), loop_[i + 1].index()]);
        }
    }

    (vertices, faces)
}

/// Build a regular `nx` × `nz` quad grid standing in the plane `y = depth`.
///
/// Columns run along X (centered on zero) and rows along Z, with `spacing`
/// between neighbors. This is the shape of a patch cut from the front of a
/// socket-like surface, and is handy for tests and benchmarks.
pub fn build_vertical_grid(nx: usize, nz: usize, spacing: f64, depth: f64) -> Result<SurfaceMesh> {
    if nx < 2 || nz < 2 {
        return Err(ReliefError::invalid_param("grid size", format!("{}x{}", nx, nz), "needs at least 2x2 vertices"));
    }

    let half = (nx - 1) as f64 * spacing / 2.0;
    let mut vertices = Vec::with_capacity(nx * nz);
    for k in 0..nz {
        for i in 0..nx {
            vertices.push(Point3::new(i as f64 * spacing - half, depth, k as f64 * spacing));
        }
    }

    let mut faces = Vec::with_capacity((nx - 1) * (nz - 1));
    for k in 0..nz - 1 {
        for i in 0..nx - 1 {
            let v00 = k * nx + i;
            let v10 = v00 + 1;
            let v01 = v00 + nx;
            let v11 = v01 + 1;
            // Wound so the face normals point along +Y, away from the origin
            faces.push([v00, v01, v11, v10]);
        }
    }

    build_from_quads(&vertices, &faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    fn two_quads() -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
        // Two quads sharing an edge (1-2)
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        (vertices, faces)
    }

    #[test]
    fn test_build_from_quads_two_quads() {
        let (vertices, faces) = two_quads();
        let mesh = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 7);
        assert!(mesh.is_valid());

        let shared = mesh
            .edges()
            .find(|(_, e)| e.vertices == [VertexId::new(1), VertexId::new(2)])
            .map(|(_, e)| *e)
            .unwrap();
        assert_eq!(shared.face_count, 2);
        assert_eq!(mesh.edges().filter(|(_, e)| e.is_border()).count(), 6);
    }

    #[test]
    fn test_empty_faces_rejected() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let result = build_from_triangles(&vertices, &[]);
        assert!(matches!(result, Err(ReliefError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_index_rejected() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let result = build_from_triangles(&vertices, &[[0, 1, 5]]);
        assert!(matches!(
            result,
            Err(ReliefError::InvalidVertexIndex { element: 0, vertex: 5 })
        ));
    }

    #[test]
    fn test_quad_degenerate_face() {
        let (vertices, _) = two_quads();
        // Degenerate: v0 == v2 (diagonal vertices the same)
        let result = build_from_quads(&vertices, &[[0, 1, 0, 3]]);
        assert!(matches!(result, Err(ReliefError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_non_manifold_edge_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = [[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let result = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(ReliefError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_roundtrip_triangulates_quads() {
        let (vertices, faces) = two_quads();
        let mesh = build_from_quads(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);
        assert_eq!(out_verts.len(), vertices.len());
        assert_eq!(out_faces.len(), 4);
        assert_eq!(out_faces[0], [0, 1, 2]);
        assert_eq!(out_faces[1], [0, 2, 3]);
    }

    #[test]
    fn test_build_from_edges_has_no_border_edges() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let mesh = build_from_edges(&vertices, &[[0, 1], [1, 2], [2, 1]]).unwrap();
        assert_eq!(mesh.num_edges(), 2);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.edges().all(|(_, e)| !e.is_border()));
        assert_eq!(mesh.valence(VertexId::new(1)), 2);
    }

    #[test]
    fn test_vertical_grid_layout() {
        let mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
        assert_eq!(mesh.num_vertices(), 25);
        assert_eq!(mesh.num_faces(), 16);
        assert_eq!(mesh.num_edges(), 40);

        // Corner at x = -2, z = 0
        let p = mesh.position(VertexId::new(0));
        assert_eq!((p.x, p.y, p.z), (-2.0, 10.0, 0.0));

        // Face normals point away from the origin (+Y)
        assert!(mesh.face_normal(FaceId::new(0)).y > 0.99);

        let border = mesh.vertex_ids().filter(|&v| mesh.is_border_vertex(v)).count();
        assert_eq!(border, 16);
    }
}

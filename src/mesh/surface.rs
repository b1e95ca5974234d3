//! Polygon surface mesh with undirected edge adjacency.
//!
//! The relief pipeline only needs to know which vertices are linked, which
//! edges lie on the open border of the surface, and the position/normal of
//! each vertex. [`SurfaceMesh`] stores exactly that:
//!
//! - vertices with their positions
//! - polygon faces as vertex index lists
//! - undirected edges with the number of incident faces
//! - a compressed (CSR) vertex → (neighbor, edge) adjacency table
//!
//! An edge with exactly one incident face is a border edge; its two vertices
//! are border vertices. Meshes are constructed through the functions in
//! [`super::builder`], which validate the topology.

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, VertexId};

/// A vertex of the surface.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// The two endpoints, lower index first.
    pub vertices: [VertexId; 2],

    /// Number of faces using this edge (1 on the border, 2 inside).
    pub face_count: u8,
}

impl Edge {
    /// Create an edge between two vertices with no incident faces yet.
    pub fn new(a: VertexId, b: VertexId) -> Self {
        let vertices = if a <= b { [a, b] } else { [b, a] };
        Self {
            vertices,
            face_count: 0,
        }
    }

    /// Check if this edge lies on the open border of the surface.
    #[inline]
    pub fn is_border(&self) -> bool {
        self.face_count == 1
    }

    /// The endpoint opposite to `v`.
    #[inline]
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.vertices[0] == v {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }
}

/// A polygon surface mesh with edge adjacency.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    /// All vertices in the mesh.
    pub(crate) vertices: Vec<Vertex>,

    /// All faces, as ordered vertex loops.
    pub(crate) faces: Vec<Vec<VertexId>>,

    /// All undirected edges.
    pub(crate) edges: Vec<Edge>,

    /// `adjacency[offsets[v]..offsets[v + 1]]` lists the links of vertex `v`.
    pub(crate) offsets: Vec<usize>,

    /// Flattened (neighbor, edge) pairs, sorted by neighbor per vertex.
    pub(crate) adjacency: Vec<(VertexId, EdgeId)>,
}

impl SurfaceMesh {
    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get the vertex loop of a face.
    #[inline]
    pub fn face(&self, id: FaceId) -> &[VertexId] {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.vertices[v.index()].position = pos;
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over the (neighbor, edge) links of a vertex.
    pub fn vertex_links(&self, v: VertexId) -> impl Iterator<Item = (VertexId, EdgeId)> + '_ {
        let i = v.index();
        self.adjacency[self.offsets[i]..self.offsets[i + 1]]
            .iter()
            .copied()
    }

    /// Iterate over vertices adjacent to a vertex, in ascending index order.
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_links(v).map(|(n, _)| n)
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId) -> usize {
        let i = v.index();
        self.offsets[i + 1] - self.offsets[i]
    }

    // ==================== Topology Queries ====================

    /// Check if a vertex lies on the open border (or is isolated).
    pub fn is_border_vertex(&self, v: VertexId) -> bool {
        if self.valence(v) == 0 {
            return true;
        }
        self.vertex_links(v).any(|(_, e)| self.edge(e).is_border())
    }

    /// Check if the mesh is closed (has no border edges).
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(|e| !e.is_border())
    }

    // ==================== Geometry ====================

    /// Compute the unnormalized Newell vector of a face.
    ///
    /// Its direction is the face normal and its length is twice the face area,
    /// which makes it usable directly for area-weighted vertex normals.
    pub fn face_newell(&self, f: FaceId) -> Vector3<f64> {
        let loop_ = self.face(f);
        let mut n = Vector3::zeros();
        for (i, &v) in loop_.iter().enumerate() {
            let p = self.position(v);
            let q = self.position(loop_[(i + 1) % loop_.len()]);
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        n
    }

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        self.face_newell(f).normalize()
    }

    /// Compute the area of a (planar) face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        0.5 * self.face_newell(f).norm()
    }

    /// Compute area-weighted unit normals for every vertex.
    ///
    /// Vertices without incident faces (or with cancelling faces) get `+Z`.
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.vertices.len()];
        for f in self.face_ids() {
            let n = self.face_newell(f);
            for &v in self.face(f) {
                normals[v.index()] += n;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            *n = if len > f64::EPSILON {
                *n / len
            } else {
                Vector3::z()
            };
        }
        normals
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = first.position;
        let mut max = first.position;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Validation ====================

    /// Check if the adjacency tables are consistent with the edge list.
    pub fn is_valid(&self) -> bool {
        if self.offsets.len() != self.vertices.len() + 1 {
            return false;
        }
        for v in self.vertex_ids() {
            for (n, e) in self.vertex_links(v) {
                let edge = self.edge(e);
                if !edge.vertices.contains(&v) || edge.other(v) != n {
                    return false;
                }
            }
        }
        self.faces
            .iter()
            .all(|f| f.len() >= 3 && f.iter().all(|v| v.index() < self.vertices.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, build_from_triangles};

    fn create_single_quad() -> SurfaceMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn test_vertex_creation() {
        let v = Vertex::from_coords(1.0, 2.0, 3.0);
        assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = SurfaceMesh::default();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_edges(), 0);
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_quad_geometry() {
        let mesh = create_single_quad();
        let f = FaceId::new(0);

        assert!((mesh.face_area(f) - 1.0).abs() < 1e-12);
        assert!((mesh.face_normal(f).z - 1.0).abs() < 1e-12);
        assert!(mesh.is_valid());
        assert!(!mesh.is_closed());
    }

    #[test]
    fn test_vertex_normals_point_up_on_flat_quad() {
        let mesh = create_single_quad();
        for n in mesh.vertex_normals() {
            assert!((n - Vector3::z()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_neighbors_sorted_and_border() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let n: Vec<usize> = mesh.vertex_neighbors(VertexId::new(0)).map(|v| v.index()).collect();
        assert_eq!(n, vec![1, 2, 3]);
        assert!(mesh.is_closed());
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_border_vertex(v), "vertex {:?} should not be on border", v);
        }
    }

    #[test]
    fn test_edge_other_endpoint() {
        let e = Edge::new(VertexId::new(5), VertexId::new(2));
        assert_eq!(e.vertices, [VertexId::new(2), VertexId::new(5)]);
        assert_eq!(e.other(VertexId::new(2)), VertexId::new(5));
        assert_eq!(e.other(VertexId::new(5)), VertexId::new(2));
    }
}

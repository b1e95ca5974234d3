//! The working patch: a boundary-tagged vertex/edge graph.
//!
//! A [`Patch`] is the sub-region of a mesh enclosed by the drawn shape. It is
//! a read-only snapshot of positions, normals, undirected edges, and border
//! membership, re-indexed densely from zero. Every algorithm in [`crate::algo`]
//! works on patch-local [`VertexId`]s; [`Patch::source_vertex`] maps them back
//! to the mesh the patch was cut from.
//!
//! # Example
//!
//! ```
//! use relief::mesh::build_vertical_grid;
//! use relief::patch::Patch;
//!
//! let mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
//! let patch = Patch::from_mesh(&mesh).unwrap();
//!
//! assert_eq!(patch.num_vertices(), 25);
//! assert_eq!(patch.border_vertices().count(), 16);
//! ```

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::error::{ReliefError, Result};
use crate::mesh::{SurfaceMesh, VertexId};

/// A boundary-tagged vertex/edge graph cut from a mesh.
#[derive(Debug, Clone)]
pub struct Patch {
    positions: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
    border: Vec<bool>,

    /// Undirected edges, lower index first, sorted and deduplicated.
    edges: Vec<[VertexId; 2]>,

    offsets: Vec<usize>,
    adjacency: Vec<VertexId>,

    /// Patch vertex -> vertex of the source mesh.
    source: Vec<VertexId>,
}

impl Patch {
    /// Build a patch from raw arrays handed over by a host.
    ///
    /// `normals` and `border` must have one entry per position. Edges are
    /// undirected; duplicates are merged.
    ///
    /// # Errors
    /// * [`ReliefError::EmptyPatch`] if there are no vertices
    /// * [`ReliefError::InvalidVertexIndex`] for out-of-range edge endpoints
    /// * [`ReliefError::InvalidParameter`] for mismatched array lengths or self-loops
    pub fn new(
        positions: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        edges: &[[usize; 2]],
        border: Vec<bool>,
    ) -> Result<Self> {
        let n = positions.len();
        if n == 0 {
            return Err(ReliefError::EmptyPatch);
        }
        if normals.len() != n {
            return Err(ReliefError::invalid_param("normals", normals.len(), "must match vertex count"));
        }
        if border.len() != n {
            return Err(ReliefError::invalid_param("border", border.len(), "must match vertex count"));
        }

        let mut pairs = Vec::with_capacity(edges.len());
        for (ei, &[a, b]) in edges.iter().enumerate() {
            if let Some(&bad) = [a, b].iter().find(|&&v| v >= n) {
                return Err(ReliefError::InvalidVertexIndex {
                    element: ei,
                    vertex: bad,
                });
            }
            if a == b {
                return Err(ReliefError::invalid_param("edge", ei, "edge joins a vertex to itself"));
            }
            pairs.push([VertexId::new(a.min(b)), VertexId::new(a.max(b))]);
        }

        let source = (0..n).map(VertexId::new).collect();
        Ok(Self::assemble(positions, normals, border, pairs, source))
    }

    /// Build a patch covering a whole open mesh.
    ///
    /// The mesh's own open border is the shape loop.
    pub fn from_mesh(mesh: &SurfaceMesh) -> Result<Self> {
        let all: Vec<VertexId> = mesh.vertex_ids().collect();
        Self::from_region(mesh, &all)
    }

    /// Build a patch from a vertex region of a larger mesh.
    ///
    /// A region vertex is on the border if it lies on an open mesh border, or
    /// if any of its mesh neighbors is outside the region. Normals are the
    /// area-weighted vertex normals of the full mesh.
    pub fn from_region(mesh: &SurfaceMesh, region: &[VertexId]) -> Result<Self> {
        if region.is_empty() {
            return Err(ReliefError::EmptyPatch);
        }

        let mut local: HashMap<VertexId, VertexId> = HashMap::with_capacity(region.len());
        let mut source = Vec::with_capacity(region.len());
        for &v in region {
            if v.index() >= mesh.num_vertices() {
                return Err(ReliefError::InvalidVertexIndex {
                    element: source.len(),
                    vertex: v.index(),
                });
            }
            if !local.contains_key(&v) {
                local.insert(v, VertexId::new(source.len()));
                source.push(v);
            }
        }

        let mesh_normals = mesh.vertex_normals();
        let mut positions = Vec::with_capacity(source.len());
        let mut normals = Vec::with_capacity(source.len());
        let mut border = Vec::with_capacity(source.len());
        let mut pairs = Vec::new();

        for (li, &mv) in source.iter().enumerate() {
            positions.push(*mesh.position(mv));
            normals.push(mesh_normals[mv.index()]);

            let mut on_border = mesh.is_border_vertex(mv);
            for n in mesh.vertex_neighbors(mv) {
                match local.get(&n) {
                    Some(&ln) if ln.index() > li => pairs.push([VertexId::new(li), ln]),
                    Some(_) => {}
                    None => on_border = true,
                }
            }
            border.push(on_border);
        }

        Ok(Self::assemble(positions, normals, border, pairs, source))
    }

    fn assemble(
        positions: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        border: Vec<bool>,
        mut edges: Vec<[VertexId; 2]>,
        source: Vec<VertexId>,
    ) -> Self {
        edges.sort_unstable();
        edges.dedup();

        let n = positions.len();
        let mut offsets = vec![0usize; n + 1];
        for &[a, b] in &edges {
            offsets[a.index() + 1] += 1;
            offsets[b.index() + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets[..n].to_vec();
        let mut adjacency = vec![VertexId::invalid(); offsets[n]];
        for &[a, b] in &edges {
            adjacency[cursor[a.index()]] = b;
            cursor[a.index()] += 1;
            adjacency[cursor[b.index()]] = a;
            cursor[b.index()] += 1;
        }
        for v in 0..n {
            adjacency[offsets[v]..offsets[v + 1]].sort_unstable();
        }

        Self {
            positions,
            normals,
            border,
            edges,
            offsets,
            adjacency,
            source,
        }
    }

    // ==================== Accessors ====================

    /// Get the number of patch vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of undirected patch edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all patch vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Get the position of a patch vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Get the unit normal of a patch vertex.
    #[inline]
    pub fn normal(&self, v: VertexId) -> &Vector3<f64> {
        &self.normals[v.index()]
    }

    /// Check if a patch vertex lies on the shape loop.
    #[inline]
    pub fn is_border(&self, v: VertexId) -> bool {
        self.border[v.index()]
    }

    /// Map a patch vertex back to the mesh it was cut from.
    #[inline]
    pub fn source_vertex(&self, v: VertexId) -> VertexId {
        self.source[v.index()]
    }

    /// Iterate over all undirected edges.
    pub fn edges(&self) -> impl Iterator<Item = [VertexId; 2]> + '_ {
        self.edges.iter().copied()
    }

    /// Iterate over edges whose endpoints are both on the border.
    pub fn border_edges(&self) -> impl Iterator<Item = [VertexId; 2]> + '_ {
        self.edges()
            .filter(|&[a, b]| self.is_border(a) && self.is_border(b))
    }

    /// Iterate over border vertices in index order.
    pub fn border_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_ids().filter(|&v| self.is_border(v))
    }

    /// Iterate over the neighbors of a vertex, in ascending index order.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        let i = v.index();
        self.adjacency[self.offsets[i]..self.offsets[i + 1]]
            .iter()
            .copied()
    }

    /// Collect the raw indices of a vertex's neighbors (for diagnostics).
    pub fn neighbor_indices(&self, v: VertexId) -> Vec<usize> {
        self.neighbors(v).map(VertexId::index).collect()
    }
}

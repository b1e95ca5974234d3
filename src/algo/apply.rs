//! Applying a displacement map to the source mesh.

use tracing::info;

use super::blend::DisplacementMap;
use super::smooth::{smooth_region, SmoothOptions};
use crate::error::{ReliefError, Result};
use crate::mesh::{SurfaceMesh, VertexId};
use crate::patch::Patch;

/// Move every patch vertex of `mesh` along its normal by its displacement.
///
/// Normals come from the patch snapshot, so the result does not depend on
/// the order vertices are moved in. Returns the number of vertices moved.
///
/// # Errors
/// * [`ReliefError::InvalidParameter`] if the map does not match the patch
/// * [`ReliefError::InvalidVertexIndex`] if the patch points outside `mesh`
pub fn apply_displacement(mesh: &mut SurfaceMesh, patch: &Patch, map: &DisplacementMap) -> Result<usize> {
    if map.len() != patch.num_vertices() {
        return Err(ReliefError::invalid_param("displacement map", map.len(), "must cover every patch vertex"));
    }

    let mut moved = 0;
    for (v, d) in map.iter() {
        let target = patch.source_vertex(v);
        if target.index() >= mesh.num_vertices() {
            return Err(ReliefError::InvalidVertexIndex {
                element: v.index(),
                vertex: target.index(),
            });
        }
        if d == 0.0 {
            continue;
        }
        let pos = mesh.position(target) + patch.normal(v) * d;
        mesh.set_position(target, pos);
        moved += 1;
    }

    info!(moved, peak_m = map.max_abs(), "displacement applied");
    Ok(moved)
}

/// Apply a displacement map, then relax the patch region.
///
/// `smooth_amount` is the number of smoothing iterations; zero skips the
/// smoothing pass.
pub fn apply_and_smooth(mesh: &mut SurfaceMesh, patch: &Patch, map: &DisplacementMap, smooth_amount: usize) -> Result<usize> {
    let moved = apply_displacement(mesh, patch, map)?;
    if smooth_amount > 0 {
        let region: Vec<VertexId> = patch.vertex_ids().map(|v| patch.source_vertex(v)).collect();
        smooth_region(mesh, &region, &SmoothOptions::default().with_iterations(smooth_amount));
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_vertical_grid;

    #[test]
    fn test_displacement_moves_along_normal() {
        let mut mesh = build_vertical_grid(3, 3, 1.0, 5.0).unwrap();
        let patch = Patch::from_mesh(&mesh).unwrap();

        let mut map = DisplacementMap::zeros(patch.num_vertices());
        map.set(VertexId::new(4), 0.25);

        let moved = apply_displacement(&mut mesh, &patch, &map).unwrap();
        assert_eq!(moved, 1);

        // Grid normals point along +Y
        let p = mesh.position(VertexId::new(4));
        assert!((p.y - 5.25).abs() < 1e-12);
        assert_eq!(mesh.position(VertexId::new(0)).y, 5.0);
    }

    #[test]
    fn test_region_patch_maps_back_to_source() {
        let mut mesh = build_vertical_grid(5, 5, 1.0, 5.0).unwrap();
        let region: Vec<VertexId> = [6, 7, 8, 11, 12, 13, 16, 17, 18].map(VertexId::new).to_vec();
        let patch = Patch::from_region(&mesh, &region).unwrap();

        let mut map = DisplacementMap::zeros(patch.num_vertices());
        map.set(VertexId::new(4), -0.5);
        apply_displacement(&mut mesh, &patch, &map).unwrap();

        assert!((mesh.position(VertexId::new(12)).y - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_map_rejected() {
        let mut mesh = build_vertical_grid(3, 3, 1.0, 5.0).unwrap();
        let patch = Patch::from_mesh(&mesh).unwrap();
        let result = apply_displacement(&mut mesh, &patch, &DisplacementMap::zeros(2));
        assert!(matches!(result, Err(ReliefError::InvalidParameter { .. })));
    }

    #[test]
    fn test_smoothing_keeps_rim() {
        let mut mesh = build_vertical_grid(5, 5, 1.0, 5.0).unwrap();
        let patch = Patch::from_mesh(&mesh).unwrap();
        let mut map = DisplacementMap::zeros(patch.num_vertices());
        map.set(VertexId::new(12), 1.0);

        apply_and_smooth(&mut mesh, &patch, &map, 5).unwrap();

        assert_eq!(mesh.position(VertexId::new(0)).y, 5.0);
        let centre = mesh.position(VertexId::new(12)).y;
        assert!(centre > 5.0 && centre < 6.0);
    }
}

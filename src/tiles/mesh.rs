//! Curved tile geometry.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::mesh::PrimitiveTopology;

use crate::geo::lat_lon_to_point;
use crate::tiles::mercator::{TileBounds, tile_uv_to_lat_lon};

/// Grid subdivision per tile edge; enough for a smooth curve at the zoom
/// levels served.
pub const TILE_SEGMENTS: u32 = 12;

/// Builds a subdivided quad over the tile's UV range, bending every vertex
/// onto the sphere at `radius`. Texture V is flipped so image row 0 lands on
/// the tile's north edge.
pub fn build_tile_mesh(bounds: &TileBounds, segments: u32, radius: f32) -> Mesh {
    let segments = segments.max(1);
    let side = segments + 1;

    let mut positions: Vec<Vec3> = Vec::with_capacity((side * side) as usize);
    let mut normals: Vec<Vec3> = Vec::with_capacity((side * side) as usize);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity((side * side) as usize);
    let mut indices: Vec<u32> = Vec::with_capacity((segments * segments * 6) as usize);

    for gy in 0..side {
        for gx in 0..side {
            let u = gx as f64 / segments as f64;
            let v = gy as f64 / segments as f64;

            let (lat, lon) = tile_uv_to_lat_lon(u, v, bounds);
            let point = lat_lon_to_point(lat as f32, lon as f32, radius);

            positions.push(point);
            normals.push(point.normalize());
            uvs.push([u as f32, 1.0 - v as f32]);

            if gx < segments && gy < segments {
                let i = gy * side + gx;
                // v grows northward while texture v grows southward, so wind
                // the triangles to face outward.
                indices.extend_from_slice(&[i, i + 1, i + side]);
                indices.extend_from_slice(&[i + 1, i + side + 1, i + side]);
            }
        }
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_indices(Indices::U32(indices));
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh
}

/// One point per sampled pixel, colored from the raster. Rendered as a point
/// list.
pub fn build_point_cloud_mesh(points: &[(Vec3, Color)]) -> Mesh {
    let positions: Vec<Vec3> = points.iter().map(|(p, _)| *p).collect();
    let colors: Vec<[f32; 4]> = points
        .iter()
        .map(|(_, c)| c.to_linear().to_f32_array())
        .collect();

    let mut mesh = Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::mercator::tile_bounds;
    use bevy::render::mesh::VertexAttributeValues;

    fn mesh_positions(mesh: &Mesh) -> Vec<Vec3> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => {
                values.iter().map(|v| Vec3::from_array(*v)).collect()
            }
            other => panic!("unexpected position attribute: {other:?}"),
        }
    }

    #[test]
    fn test_vertices_lie_on_offset_sphere() {
        let bounds = tile_bounds(1, 2, 2);
        let radius = 1.01;
        let mesh = build_tile_mesh(&bounds, TILE_SEGMENTS, radius);

        let positions = mesh_positions(&mesh);
        assert_eq!(
            positions.len(),
            ((TILE_SEGMENTS + 1) * (TILE_SEGMENTS + 1)) as usize
        );
        for p in &positions {
            assert!((p.length() - radius).abs() < 1e-5);
        }
    }

    #[test]
    fn test_index_buffer_is_complete_and_in_range() {
        let bounds = tile_bounds(0, 0, 1);
        let mesh = build_tile_mesh(&bounds, 4, 1.0);

        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        assert_eq!(indices.len(), (4 * 4 * 6) as usize);
        let vertex_count = mesh_positions(&mesh).len() as u32;
        assert!(indices.iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn test_corners_match_tile_bounds() {
        let bounds = tile_bounds(3, 1, 2);
        let mesh = build_tile_mesh(&bounds, 2, 1.0);
        let positions = mesh_positions(&mesh);

        // Vertex 0 is (u=0, v=0): the tile's south-west corner.
        let expected =
            lat_lon_to_point(bounds.south as f32, bounds.west as f32, 1.0);
        assert!((positions[0] - expected).length() < 1e-5);

        // Last vertex is (u=1, v=1): the north-east corner.
        let expected =
            lat_lon_to_point(bounds.north as f32, bounds.east as f32, 1.0);
        assert!((*positions.last().unwrap() - expected).length() < 1e-5);
    }

    #[test]
    fn test_point_cloud_mesh_topology() {
        let points = vec![
            (Vec3::X, Color::srgb(1.0, 0.0, 0.0)),
            (Vec3::Y, Color::srgb(0.0, 1.0, 0.0)),
        ];
        let mesh = build_point_cloud_mesh(&points);
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::PointList);
        assert_eq!(mesh_positions(&mesh).len(), 2);
    }
}

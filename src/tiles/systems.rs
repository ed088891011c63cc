//! Tile set lifecycle: request, decode, spawn, drop.

use bevy::asset::RenderAssetUsages;
use bevy::image::{CompressedImageFormats, ImageSampler, ImageType};
use bevy::prelude::*;

use crate::GlobeRoot;
use crate::catalog::ActiveTileSource;
use crate::geo::{GLOBE_RADIUS, lat_lon_to_point};
use crate::tiles::fetcher::{FetchCommand, FetchResultMsg, TileFetchChannels};
use crate::tiles::mercator::{
    MAX_ZOOM, Tile, all_tiles, clamp_zoom_checked, tile_bounds, tile_count,
};
use crate::tiles::mesh::{build_point_cloud_mesh, build_tile_mesh};
use crate::tiles::{ActiveTileSet, TileLayerConfig, TileSetMember, TileSetSignature};

/// Points render just above the tile quads.
const POINT_CLOUD_EXTRA_OFFSET: f32 = 0.002;

/// Clamps a zoom request to the supported range. The out-of-range flag is
/// raised only the first time a given request value is seen, so holding an
/// out-of-range request does not report on every frame.
fn resolve_zoom_request(active: &mut ActiveTileSet, requested: i32) -> (i32, bool) {
    let (clamped, out_of_range) = clamp_zoom_checked(requested);
    let report = out_of_range && active.last_zoom_request != Some(requested);
    active.last_zoom_request = Some(requested);
    (clamped, report)
}

/// Rebuilds the tile set whenever its inputs change: despawns the previous
/// set, bumps the generation, and queues a fetch for every tile of the new
/// grid. Still-loading tiles are simply absent until their result arrives.
pub fn refresh_tile_set(
    config: Res<TileLayerConfig>,
    source: Res<ActiveTileSource>,
    channels: Option<Res<TileFetchChannels>>,
    mut active: ResMut<ActiveTileSet>,
    members: Query<Entity, With<TileSetMember>>,
    mut commands: Commands,
) {
    let Some(channels) = channels else { return };

    let (zoom, report_clamp) = resolve_zoom_request(&mut active, config.requested_zoom);
    if report_clamp {
        warn!(
            "zoom level {} is out of bounds (0-{MAX_ZOOM}), clamping to {zoom}",
            config.requested_zoom
        );
    }
    let signature = TileSetSignature {
        zoom,
        source_revision: source.revision,
        point_cloud: config.point_cloud.enabled,
    };
    if active.signature == Some(signature) {
        return;
    }

    for entity in &members {
        commands.entity(entity).despawn();
    }
    active.signature = Some(signature);
    active.generation += 1;

    let tiles = all_tiles(signature.zoom);
    info!(
        "requesting {} tiles at zoom {} from '{}'",
        tiles.len(),
        signature.zoom,
        source.title
    );
    for tile in tiles {
        let url = source.resolver.url_for(tile.z, tile.x, tile.y);
        let _ = channels.cmd_tx.send(FetchCommand::Tile {
            tile,
            url,
            generation: active.generation,
        });
    }
}

/// Drains fetch results: successful tiles become curved meshes (plus an
/// optional pixel point cloud) parented to the globe, failures and stale
/// generations are dropped.
pub fn drain_tile_results(
    channels: Option<Res<TileFetchChannels>>,
    config: Res<TileLayerConfig>,
    active: Res<ActiveTileSet>,
    root: Query<Entity, With<GlobeRoot>>,
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(channels) = channels else { return };
    let Ok(root) = root.single() else { return };
    let Ok(guard) = channels.res_rx.lock() else {
        return;
    };

    while let Ok(msg) = guard.try_recv() {
        match msg {
            FetchResultMsg::Loaded {
                tile,
                generation,
                bytes,
                content_type,
            } => {
                if generation != active.generation {
                    continue;
                }
                let image = match decode_tile_image(&bytes, content_type.as_deref()) {
                    Ok(image) => image,
                    Err(error) => {
                        // Soft failure: the tile just does not appear.
                        warn!(
                            "tile {}/{}/{} dropped, decode failed: {error}",
                            tile.z, tile.x, tile.y
                        );
                        continue;
                    }
                };

                if config.point_cloud.enabled {
                    spawn_point_cloud(
                        &tile,
                        &image,
                        config.point_cloud.step,
                        config.radius_offset,
                        root,
                        &mut commands,
                        &mut meshes,
                        &mut materials,
                    );
                }

                let bounds = tile_bounds(tile.x, tile.y, tile.z);
                let mesh = build_tile_mesh(
                    &bounds,
                    config.segments,
                    GLOBE_RADIUS + config.radius_offset,
                );
                commands.spawn((
                    Mesh3d(meshes.add(mesh)),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::WHITE.with_alpha(config.opacity),
                        base_color_texture: Some(images.add(image)),
                        unlit: true,
                        alpha_mode: AlphaMode::Blend,
                        double_sided: true,
                        cull_mode: None,
                        ..default()
                    })),
                    TileSetMember,
                    ChildOf(root),
                ));
            }
            FetchResultMsg::Failed {
                tile,
                generation,
                error,
            } => {
                if generation != active.generation {
                    continue;
                }
                warn!(
                    "tile {}/{}/{} dropped, fetch failed: {error}",
                    tile.z, tile.x, tile.y
                );
            }
        }
    }
}

fn decode_tile_image(bytes: &[u8], content_type: Option<&str>) -> Result<Image, String> {
    let image_type = match content_type {
        Some(ct) if ct.starts_with("image/") => ImageType::MimeType(ct),
        _ => ImageType::Extension("png"),
    };
    Image::from_buffer(
        bytes,
        image_type,
        CompressedImageFormats::NONE,
        true,
        ImageSampler::default(),
        RenderAssetUsages::default(),
    )
    .map_err(|e| e.to_string())
}

/// One colored point per sampled raster pixel, mapped through the exact
/// inverse-Mercator projection.
#[allow(clippy::too_many_arguments)]
fn spawn_point_cloud(
    tile: &Tile,
    image: &Image,
    step: u32,
    radius_offset: f32,
    root: Entity,
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let step = step.max(1);
    let (n_tiles, _) = tile_count(tile.z);
    let radius = GLOBE_RADIUS + radius_offset + POINT_CLOUD_EXTRA_OFFSET;
    let (width, height) = (image.width(), image.height());

    let mut points = Vec::new();
    for py in (0..height).step_by(step as usize) {
        for px in (0..width).step_by(step as usize) {
            let Ok(color) = image.get_color_at(px, py) else {
                continue;
            };
            if color.alpha() <= f32::EPSILON {
                continue;
            }
            let (lat, lon) = crate::tiles::mercator::pixel_to_lat_lon(
                px as f64, py as f64, tile.x, tile.y, width, height, n_tiles,
            );
            points.push((lat_lon_to_point(lat as f32, lon as f32, radius), color));
        }
    }
    if points.is_empty() {
        return;
    }

    commands.spawn((
        Mesh3d(meshes.add(build_point_cloud_mesh(&points))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            ..default()
        })),
        TileSetMember,
        ChildOf(root),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_zoom_reported_once_per_request() {
        let mut active = ActiveTileSet::default();

        // First frame of a held out-of-range request reports; later ones do not.
        assert_eq!(resolve_zoom_request(&mut active, 7), (4, true));
        assert_eq!(resolve_zoom_request(&mut active, 7), (4, false));
        assert_eq!(resolve_zoom_request(&mut active, 7), (4, false));

        // A different out-of-range request reports again.
        assert_eq!(resolve_zoom_request(&mut active, -1), (0, true));

        // In-range requests never report.
        assert_eq!(resolve_zoom_request(&mut active, 3), (3, false));
        assert_eq!(resolve_zoom_request(&mut active, 3), (3, false));

        // Returning to a previous out-of-range value is a fresh request.
        assert_eq!(resolve_zoom_request(&mut active, 7), (4, true));
    }

    #[test]
    fn test_undecodable_tile_bytes_are_an_error() {
        // An error page served where an image was expected.
        assert!(decode_tile_image(b"<html>missing tile</html>", Some("text/html")).is_err());
        // Truncated garbage under a correct content type.
        assert!(decode_tile_image(&[0xde, 0xad, 0xbe, 0xef], Some("image/png")).is_err());
        // Empty body, no content type.
        assert!(decode_tile_image(&[], None).is_err());
    }
}

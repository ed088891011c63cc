//! Raster tile overlay for the globe.

use bevy::prelude::*;

pub mod fetcher;
pub mod mercator;
pub mod mesh;
pub mod systems;

pub use fetcher::{FetchCommand, FetchResultMsg, TileFetchChannels, start_tile_worker};
pub use mercator::{MAX_ZOOM, Tile, TileBounds, all_tiles, clamp_zoom, tile_bounds};

use systems::{drain_tile_results, refresh_tile_set};

/// Tile layer settings, adjustable from the UI.
#[derive(Resource, Debug)]
pub struct TileLayerConfig {
    /// Requested zoom; clamped to the supported range when applied.
    pub requested_zoom: i32,
    pub opacity: f32,
    /// How far above the globe surface tiles render, to avoid z-fighting with
    /// the base sphere.
    pub radius_offset: f32,
    pub segments: u32,
    pub point_cloud: PointCloudConfig,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            requested_zoom: 2,
            opacity: 1.0,
            radius_offset: 0.01,
            segments: mesh::TILE_SEGMENTS,
            point_cloud: PointCloudConfig::default(),
        }
    }
}

/// Pixel point-cloud rendering of the tile rasters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointCloudConfig {
    pub enabled: bool,
    /// Sample every Nth pixel in both directions.
    pub step: u32,
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            step: 4,
        }
    }
}

/// What the spawned tile set was built from; the render set is rebuilt when
/// the effective zoom, tile source, or point-cloud toggle changes.
#[derive(Resource, Default)]
pub struct ActiveTileSet {
    pub signature: Option<TileSetSignature>,
    pub generation: u64,
    /// Last zoom request seen, so an out-of-range request held across frames
    /// is reported once rather than every tick.
    pub last_zoom_request: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSetSignature {
    pub zoom: i32,
    pub source_revision: u64,
    pub point_cloud: bool,
}

/// Tag for every entity belonging to the current tile set.
#[derive(Component)]
pub struct TileSetMember;

pub struct TilesPlugin;

impl Plugin for TilesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileLayerConfig>()
            .init_resource::<ActiveTileSet>()
            .add_systems(Startup, setup_tile_worker)
            .add_systems(Update, (refresh_tile_set, drain_tile_results).chain());
    }
}

fn setup_tile_worker(mut commands: Commands) {
    commands.insert_resource(start_tile_worker());
    info!("tile fetch worker started");
}

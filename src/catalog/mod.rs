//! Raster layer catalog.
//!
//! Fetches the available layer list from the STAC catalog and, when a layer
//! is selected, registers a raster search to obtain its `(z, x, y)` tile URL
//! resolver. A built-in default layer works without any network.

use bevy::prelude::*;

pub mod fetcher;
pub mod types;

pub use fetcher::{CatalogChannels, CatalogCommand, CatalogResultMsg, start_catalog_worker};
pub use types::{CatalogLayer, DEFAULT_LAYER_TITLE, TileUrlResolver, default_resolver};

/// Fetched layer list plus the user's selection.
#[derive(Resource, Default)]
pub struct LayerCatalog {
    pub layers: Vec<CatalogLayer>,
    pub selected: Option<usize>,
    pub loading: bool,
}

/// The tile source the globe currently renders. `revision` bumps on every
/// change so the tile systems know to rebuild.
#[derive(Resource)]
pub struct ActiveTileSource {
    pub title: String,
    pub resolver: TileUrlResolver,
    pub revision: u64,
}

impl Default for ActiveTileSource {
    fn default() -> Self {
        Self {
            title: DEFAULT_LAYER_TITLE.to_string(),
            resolver: default_resolver(),
            revision: 0,
        }
    }
}

pub struct CatalogPlugin;

impl Plugin for CatalogPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LayerCatalog>()
            .init_resource::<ActiveTileSource>()
            .add_systems(Startup, setup_catalog_worker)
            .add_systems(Update, process_catalog_results);
    }
}

fn setup_catalog_worker(mut commands: Commands, mut catalog: ResMut<LayerCatalog>) {
    let channels = start_catalog_worker();
    if channels.cmd_tx.send(CatalogCommand::FetchLayers).is_ok() {
        catalog.loading = true;
    }
    commands.insert_resource(channels);
    info!("catalog worker started");
}

/// Select a layer by catalog index, kicking off its search registration. The
/// active tile source only switches once the registration succeeds.
pub fn request_layer(
    index: usize,
    catalog: &mut LayerCatalog,
    channels: &CatalogChannels,
) {
    let Some(layer) = catalog.layers.get(index) else {
        return;
    };
    info!("registering raster search for layer '{}'", layer.title);
    catalog.selected = Some(index);
    let _ = channels
        .cmd_tx
        .send(CatalogCommand::RegisterSearch(layer.clone()));
}

fn process_catalog_results(
    channels: Option<Res<CatalogChannels>>,
    mut catalog: ResMut<LayerCatalog>,
    mut source: ResMut<ActiveTileSource>,
) {
    let Some(channels) = channels else { return };
    let Ok(guard) = channels.res_rx.lock() else {
        return;
    };
    while let Ok(msg) = guard.try_recv() {
        match msg {
            CatalogResultMsg::Layers(layers) => {
                info!("catalog loaded: {} layers", layers.len());
                catalog.layers = layers;
                catalog.loading = false;
            }
            CatalogResultMsg::LayersFailed(error) => {
                warn!("catalog fetch failed: {error}");
                catalog.loading = false;
            }
            CatalogResultMsg::SearchReady {
                layer_id,
                layer_title,
                resolver,
            } => {
                info!("tile source ready for layer '{layer_id}'");
                source.title = layer_title;
                source.resolver = resolver;
                source.revision += 1;
            }
            CatalogResultMsg::SearchFailed { layer_id, error } => {
                // Soft failure: keep rendering the current source.
                warn!("raster search for '{layer_id}' failed: {error}");
            }
        }
    }
}

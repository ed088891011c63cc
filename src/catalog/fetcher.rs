//! Catalog worker: layer list fetch and raster search registration.

use bevy::prelude::*;
use serde_json::json;
use std::sync::{
    Arc, Mutex,
    mpsc::{self, Receiver, Sender},
};
use std::thread;

use crate::catalog::types::{
    CatalogLayer, RASTER_API_BASE, STAC_COLLECTIONS_URL, TileUrlResolver,
};

#[derive(Debug)]
pub enum CatalogCommand {
    FetchLayers,
    /// Register a raster search for the layer so tiles can be addressed by
    /// `(z, x, y)`.
    RegisterSearch(CatalogLayer),
}

pub enum CatalogResultMsg {
    Layers(Vec<CatalogLayer>),
    LayersFailed(String),
    SearchReady {
        layer_id: String,
        layer_title: String,
        resolver: TileUrlResolver,
    },
    SearchFailed {
        layer_id: String,
        error: String,
    },
}

#[derive(Resource)]
pub struct CatalogChannels {
    pub cmd_tx: Sender<CatalogCommand>,
    pub res_rx: Arc<Mutex<Receiver<CatalogResultMsg>>>,
}

/// Start the background catalog worker thread.
pub fn start_catalog_worker() -> CatalogChannels {
    let (cmd_tx, cmd_rx) = mpsc::channel::<CatalogCommand>();
    let (res_tx, res_rx) = mpsc::channel::<CatalogResultMsg>();

    thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async move {
            let client = reqwest::Client::new();

            while let Ok(cmd) = cmd_rx.recv() {
                let msg = match cmd {
                    CatalogCommand::FetchLayers => match fetch_layers(&client).await {
                        Ok(layers) => CatalogResultMsg::Layers(layers),
                        Err(e) => CatalogResultMsg::LayersFailed(e.to_string()),
                    },
                    CatalogCommand::RegisterSearch(layer) => {
                        match register_search(&client, &layer).await {
                            Ok(resolver) => CatalogResultMsg::SearchReady {
                                layer_id: layer.id,
                                layer_title: layer.title,
                                resolver,
                            },
                            Err(e) => CatalogResultMsg::SearchFailed {
                                layer_id: layer.id,
                                error: e.to_string(),
                            },
                        }
                    }
                };
                if res_tx.send(msg).is_err() {
                    break;
                }
            }
        });
    });

    CatalogChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

/// GET the STAC collections list, keeping entries that carry an id and a
/// title. Malformed entries are skipped, not errors.
async fn fetch_layers(client: &reqwest::Client) -> anyhow::Result<Vec<CatalogLayer>> {
    let resp = client.get(STAC_COLLECTIONS_URL).send().await?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {status}");
    }
    let body = resp.text().await?;
    let value: serde_json::Value = serde_json::from_str(&body)?;
    let Some(collections) = value.get("collections").and_then(|c| c.as_array()) else {
        anyhow::bail!("catalog response did not contain a collections array");
    };
    Ok(collections
        .iter()
        .filter_map(|c| serde_json::from_value(c.clone()).ok())
        .collect())
}

/// POST a raster search registration for the layer and derive a tile URL
/// resolver from the returned search id.
async fn register_search(
    client: &reqwest::Client,
    layer: &CatalogLayer,
) -> anyhow::Result<TileUrlResolver> {
    let dashboard = layer
        .renders
        .as_ref()
        .and_then(|r| r.dashboard.clone())
        .unwrap_or_default();

    let mut payload = json!({
        "filter-lang": "cql2-json",
        "filter": {},
        "collections": [layer.id],
    });
    if let Some(assets) = &dashboard.assets {
        payload["assets"] = json!(assets);
    }
    if let Some(bidx) = &dashboard.bidx {
        payload["bidx"] = json!(bidx);
    }
    if let Some(colormap) = &dashboard.colormap_name {
        payload["colormap_name"] = json!(colormap);
    }
    if let Some(rescale) = &dashboard.rescale {
        let joined = rescale
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",");
        payload["rescale"] = json!(joined);
    }

    let resp = client
        .post(format!("{RASTER_API_BASE}/searches/register"))
        .header("content-type", "application/json")
        .body(payload.to_string())
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("failed to register raster search: HTTP {status}");
    }
    let body = resp.text().await?;
    let value: serde_json::Value = serde_json::from_str(&body)?;
    let Some(search_id) = value.get("id").and_then(|id| id.as_str()) else {
        anyhow::bail!("raster search response did not contain a search id");
    };

    Ok(TileUrlResolver::for_search(
        RASTER_API_BASE,
        search_id,
        dashboard.to_query(),
    ))
}

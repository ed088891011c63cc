//! Layer catalog data types and tile URL resolution.

use serde::Deserialize;

/// One raster layer from the catalog. The core only consumes `id`, `title`,
/// and the dashboard render parameters used to build tile URLs.
#[derive(Deserialize, Clone, Debug)]
pub struct CatalogLayer {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub renders: Option<LayerRenders>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LayerRenders {
    #[serde(default)]
    pub dashboard: Option<DashboardRender>,
}

/// Render parameters the dashboard publishes for a layer; forwarded to the
/// raster API both when registering a search and on every tile request.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct DashboardRender {
    #[serde(default)]
    pub assets: Option<Vec<String>>,
    #[serde(default)]
    pub bidx: Option<Vec<i64>>,
    #[serde(default)]
    pub colormap_name: Option<String>,
    #[serde(default)]
    pub rescale: Option<Vec<f64>>,
}

impl DashboardRender {
    /// Query string for tile requests. Commas inside values are
    /// percent-encoded; the parameter names themselves are plain.
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(assets) = &self.assets {
            parts.push(format!("assets={}", assets.join("%2C")));
        }
        if let Some(bidx) = &self.bidx {
            let joined = bidx
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join("%2C");
            parts.push(format!("bidx={joined}"));
        }
        if let Some(colormap) = &self.colormap_name {
            parts.push(format!("colormap_name={colormap}"));
        }
        if let Some(rescale) = &self.rescale {
            let joined = rescale
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("%2C");
            parts.push(format!("rescale={joined}"));
        }
        parts.join("&")
    }
}

/// Maps `(z, x, y)` to a tile image URL for one registered raster search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileUrlResolver {
    base: String,
    query: String,
}

impl TileUrlResolver {
    pub fn for_search(api_base: &str, search_id: &str, query: String) -> Self {
        Self {
            base: format!("{api_base}/searches/{search_id}/tiles/WebMercatorQuad"),
            query,
        }
    }

    pub fn url_for(&self, z: i32, x: u32, y: u32) -> String {
        if self.query.is_empty() {
            format!("{}/{z}/{x}/{y}", self.base)
        } else {
            format!("{}/{z}/{x}/{y}?{}", self.base, self.query)
        }
    }
}

pub const RASTER_API_BASE: &str = "https://openveda.cloud/api/raster";
pub const STAC_COLLECTIONS_URL: &str = "https://openveda.cloud/api/stac/collections";

/// Built-in layer available before (or without) any catalog fetch.
pub fn default_resolver() -> TileUrlResolver {
    TileUrlResolver::for_search(
        RASTER_API_BASE,
        "ef5766e5684b02f6bf65185f542354f3",
        "title=Mean-Carbon-Dioxide&rescale=0.000408%2C0.000419&colormap_name=rdylbu_r&assets=cog_default"
            .to_string(),
    )
}

pub const DEFAULT_LAYER_TITLE: &str = "Mean Carbon Dioxide";

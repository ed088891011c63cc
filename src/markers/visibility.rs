//! Hemisphere culling with a horizon fade.

use bevy::prelude::*;

use crate::geo::lat_lon_to_point;

/// Dot-product band over which markers fade out near the horizon instead of
/// popping.
pub const FADE_THRESHOLD: f32 = 0.1;

/// Per-tick visibility verdict for one marker. Not persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerVisibility {
    pub is_visible: bool,
    pub opacity: f32,
}

/// Whether a marker at `lat`/`lon` faces the camera once the globe's current
/// orientation is applied, and how opaque it should render.
pub fn evaluate(
    lat: f32,
    lon: f32,
    marker_radius: f32,
    orientation: Quat,
    camera_pos: Vec3,
) -> MarkerVisibility {
    let world_pos = orientation * lat_lon_to_point(lat, lon, marker_radius);

    let to_marker = world_pos.normalize();
    let to_camera = camera_pos.normalize();
    let dot = to_marker.dot(to_camera);

    let is_visible = dot > 0.0;
    let opacity = if is_visible {
        (dot / FADE_THRESHOLD).clamp(0.0, 1.0)
    } else {
        0.0
    };
    MarkerVisibility { is_visible, opacity }
}

//! Canonical mapping between geographic coordinates and sphere space.
//!
//! Every component that places something on the globe (tiles, markers, drag
//! handling, focus animation) goes through `lat_lon_to_point` so they all
//! agree on the same frame.

use bevy::prelude::Vec3;
use std::f32::consts::PI;

/// Radius of the globe in world units. Tiles and markers sit slightly above it.
pub const GLOBE_RADIUS: f32 = 1.0;

/// Converts latitude/longitude in degrees to a point on a sphere of the given
/// radius, in Bevy coordinates (y up).
pub fn lat_lon_to_point(lat: f32, lon: f32, radius: f32) -> Vec3 {
    let phi = (90.0 - lat) * (PI / 180.0);
    let theta = (lon + 180.0) * (PI / 180.0);

    let x = -radius * phi.sin() * theta.cos();
    let y = radius * phi.cos();
    let z = radius * phi.sin() * theta.sin();
    Vec3::new(x, y, z)
}

/// Inverse of `lat_lon_to_point`, ignoring radius. Longitude is undefined at
/// the poles; callers get whatever `atan2` yields there.
pub fn point_to_lat_lon(point: Vec3) -> (f32, f32) {
    let p = point.normalize();
    let phi = p.y.clamp(-1.0, 1.0).acos();
    let theta = p.z.atan2(-p.x);

    let lat = 90.0 - phi * (180.0 / PI);
    let mut lon = theta * (180.0 / PI) - 180.0;
    if lon < -180.0 {
        lon += 360.0;
    }
    (lat, lon)
}

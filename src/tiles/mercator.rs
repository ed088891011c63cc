//! Web-Mercator tile grid math.
//!
//! Standard power-of-two tiling: `2^z` columns and rows at zoom `z`.
//! Longitude is linear across columns; latitude bands come from the inverse
//! Web-Mercator projection, so they shrink toward the poles.

use std::f64::consts::PI;

/// Highest zoom level the globe renders. `2^4 = 16` columns is plenty for a
/// whole-earth view and keeps tile counts bounded.
pub const MAX_ZOOM: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: i32,
}

/// Tile bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Columns and rows at a zoom level; negative zoom gets the 1x1 floor.
pub fn tile_count(zoom: i32) -> (u32, u32) {
    if zoom < 0 {
        return (1, 1);
    }
    let per_axis = 1u32 << zoom.min(31);
    (per_axis, per_axis)
}

/// Clamps a zoom request to `[0, MAX_ZOOM]`, also signaling whether the
/// request was out of range. Out-of-range zoom is a soft error, never fatal;
/// reporting it is the caller's job so a held request is not reported every
/// frame.
pub fn clamp_zoom_checked(zoom: i32) -> (i32, bool) {
    let clamped = zoom.clamp(0, MAX_ZOOM);
    (clamped, clamped != zoom)
}

/// Clamps a zoom request to `[0, MAX_ZOOM]`.
pub fn clamp_zoom(zoom: i32) -> i32 {
    clamp_zoom_checked(zoom).0
}

/// Latitude in degrees of the Web-Mercator row boundary `y` at zoom `z`.
pub fn web_mercator_y_to_lat(y: f64, z: i32) -> f64 {
    let n = PI - 2.0 * PI * y / 2f64.powi(z);
    (180.0 / PI) * n.sinh().atan()
}

pub fn tile_bounds(x: u32, y: u32, z: i32) -> TileBounds {
    let (cols, _) = tile_count(z);

    // Longitude is linear in Web-Mercator.
    let lon_step = 360.0 / cols as f64;
    let west = -180.0 + x as f64 * lon_step;
    let east = west + lon_step;

    let north = web_mercator_y_to_lat(y as f64, z);
    let south = web_mercator_y_to_lat((y + 1) as f64, z);

    TileBounds {
        north,
        south,
        east,
        west,
    }
}

/// Linear interpolation of both axes inside a tile's bounds.
///
/// Deliberate approximation: true Mercator latitude spacing is non-linear, so
/// sub-tile vertices are slightly off versus an exact re-projection. At the
/// zoom levels served (<= MAX_ZOOM) the error is below what subdivided tile
/// meshes resolve, and the behavior is pinned by tests.
pub fn tile_uv_to_lat_lon(u: f64, v: f64, bounds: &TileBounds) -> (f64, f64) {
    let lon = bounds.west + u * (bounds.east - bounds.west);
    let lat = bounds.south + v * (bounds.north - bounds.south);
    (lat, lon)
}

/// Exact inverse-Mercator mapping of a raster pixel inside a tile, for the
/// point-cloud path where per-pixel accuracy matters.
pub fn pixel_to_lat_lon(
    px: f64,
    py: f64,
    tile_x: u32,
    tile_y: u32,
    width: u32,
    height: u32,
    n_tiles: u32,
) -> (f64, f64) {
    let gx = tile_x as f64 + px / width as f64;
    let gy = tile_y as f64 + py / height as f64;
    let n = n_tiles as f64;

    let lon = (gx / n) * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * (gy / n))).sinh().atan() * (180.0 / PI);
    (lat, lon)
}

/// Total number of tiles at `zoom`. Wide result type; the per-axis counts
/// alone can overflow a `u32` multiply from zoom 16 up.
pub fn tile_total(zoom: i32) -> u64 {
    let (cols, rows) = tile_count(zoom);
    cols as u64 * rows as u64
}

/// Every tile of the grid at `zoom`, row-major.
pub fn all_tiles(zoom: i32) -> Vec<Tile> {
    let (cols, rows) = tile_count(zoom);
    let mut tiles = Vec::with_capacity(tile_total(zoom) as usize);
    for y in 0..rows {
        for x in 0..cols {
            tiles.push(Tile { x, y, z: zoom });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_tile_count() {
        assert_eq!(tile_count(0), (1, 1));
        assert_eq!(tile_count(1), (2, 2));
        assert_eq!(tile_count(4), (16, 16));
        assert_eq!(tile_count(-3), (1, 1));
    }

    #[test]
    fn test_clamp_zoom_identity_in_range() {
        for z in 0..=MAX_ZOOM {
            assert_eq!(clamp_zoom(z), z);
        }
    }

    #[test]
    fn test_clamp_zoom_is_idempotent() {
        for z in [-5, -1, 0, 2, 4, 5, 7, 100] {
            assert_eq!(clamp_zoom(clamp_zoom(z)), clamp_zoom(z));
        }
    }

    #[test]
    fn test_clamp_zoom_signals_out_of_range() {
        assert_eq!(clamp_zoom_checked(7), (4, true));
        assert_eq!(clamp_zoom_checked(-1), (0, true));
        assert_eq!(clamp_zoom_checked(3), (3, false));
    }

    #[test]
    fn test_longitude_partition_has_no_gaps_or_overlaps() {
        for z in 0..=MAX_ZOOM {
            let (cols, _) = tile_count(z);
            for x in 0..cols {
                let b = tile_bounds(x, 0, z);
                if x == 0 {
                    assert!((b.west + 180.0).abs() < EPSILON);
                } else {
                    let prev = tile_bounds(x - 1, 0, z);
                    assert!(
                        (prev.east - b.west).abs() < EPSILON,
                        "z={z} x={x}: gap between {} and {}",
                        prev.east,
                        b.west
                    );
                }
            }
            let last = tile_bounds(cols - 1, 0, z);
            assert!((last.east - 180.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_latitude_bands_are_contiguous_and_monotonic() {
        for z in 0..=MAX_ZOOM {
            let (_, rows) = tile_count(z);
            for y in 0..rows {
                let b = tile_bounds(0, y, z);
                assert!(b.north > b.south, "z={z} y={y}");
                if y > 0 {
                    let above = tile_bounds(0, y - 1, z);
                    assert!(above.north > b.north, "north not decreasing at z={z} y={y}");
                    assert!(
                        (above.south - b.north).abs() < EPSILON,
                        "band gap at z={z} y={y}"
                    );
                }
            }
            // Full projected range, symmetric about the equator.
            let top = tile_bounds(0, 0, z);
            let bottom = tile_bounds(0, rows - 1, z);
            assert!((top.north - 85.051_128_779_806_6).abs() < 1e-6);
            assert!((top.north + bottom.south).abs() < EPSILON);
        }
    }

    #[test]
    fn test_tile_uv_interpolation_is_linear_by_design() {
        let b = tile_bounds(0, 0, 1);

        let (lat, lon) = tile_uv_to_lat_lon(0.0, 1.0, &b);
        assert!((lat - b.north).abs() < EPSILON);
        assert!((lon - b.west).abs() < EPSILON);

        // The v midpoint lands on the arithmetic mean of the bounds...
        let (lat_mid, _) = tile_uv_to_lat_lon(0.5, 0.5, &b);
        assert!((lat_mid - (b.north + b.south) / 2.0).abs() < EPSILON);

        // ...which is intentionally NOT the exact Mercator midpoint. Pin the
        // approximation so it is not "fixed" by accident.
        let exact_mid = web_mercator_y_to_lat(0.5, 1);
        assert!((lat_mid - exact_mid).abs() > 1.0);
    }

    #[test]
    fn test_pixel_to_lat_lon_centers() {
        // Center pixel of the single zoom-0 tile is the null island.
        let (lat, lon) = pixel_to_lat_lon(128.0, 128.0, 0, 0, 256, 256, 1);
        assert!(lat.abs() < EPSILON);
        assert!(lon.abs() < EPSILON);

        // Top-left corner of tile (0,0) at zoom 1.
        let (lat, lon) = pixel_to_lat_lon(0.0, 0.0, 0, 0, 256, 256, 2);
        assert!((lon + 180.0).abs() < EPSILON);
        assert!((lat - 85.051_128_779_806_6).abs() < 1e-6);
    }

    #[test]
    fn test_tile_total_does_not_overflow_at_high_zoom() {
        assert_eq!(tile_total(0), 1);
        assert_eq!(tile_total(4), 256);
        // 65536 x 65536 does not fit a u32 product.
        assert_eq!(tile_total(16), 1u64 << 32);
        assert_eq!(tile_total(31), 1u64 << 62);
    }

    #[test]
    fn test_all_tiles_enumerates_full_grid() {
        assert_eq!(all_tiles(0).len(), 1);
        let tiles = all_tiles(2);
        assert_eq!(tiles.len(), 16);
        assert_eq!(tiles[0], Tile { x: 0, y: 0, z: 2 });
        assert_eq!(tiles[5], Tile { x: 1, y: 1, z: 2 });
        for t in &tiles {
            assert!(t.x < 4 && t.y < 4);
        }
    }
}

//! Ray/sphere intersection and pointer hit classification.

use bevy::prelude::*;

/// One pickable marker, expressed in world space.
pub struct MarkerTarget {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
}

/// What the pointer is over, resolved once at the raycast site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceHit {
    /// Globe surface; `local` is the contact point in globe-local space,
    /// normalized onto the unit sphere.
    Globe { local: Vec3 },
    Marker { entity: Entity },
}

/// Nearest intersection of `ray` with a sphere, or `None` for a miss.
///
/// Solves |O + t*D - C|^2 = r^2 and takes the smallest root in front of the
/// ray origin.
pub fn intersect_sphere(ray: Ray3d, center: Vec3, radius: f32) -> Option<Vec3> {
    let oc = ray.origin - center;
    let d = Vec3::from(ray.direction);

    let b = 2.0 * oc.dot(d);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - 4.0 * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t_near = (-b - sqrt_d) / 2.0;
    let t_far = (-b + sqrt_d) / 2.0;

    let t = if t_near >= 0.0 {
        t_near
    } else if t_far >= 0.0 {
        // Origin inside the sphere.
        t_far
    } else {
        return None;
    };
    Some(ray.origin + d * t)
}

fn hit_distance(ray: Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    intersect_sphere(ray, center, radius).map(|p| (p - ray.origin).length())
}

/// Classifies a pointer ray against the globe and its markers.
///
/// Markers win when struck at least as near as the globe surface (they float
/// just above it), so a click on a marker never starts a drag.
pub fn hit_test(
    ray: Ray3d,
    orientation: Quat,
    globe_radius: f32,
    markers: &[MarkerTarget],
) -> Option<SurfaceHit> {
    let globe = intersect_sphere(ray, Vec3::ZERO, globe_radius);
    let globe_distance = globe.map(|p| (p - ray.origin).length());

    let nearest_marker = markers
        .iter()
        .filter_map(|m| hit_distance(ray, m.center, m.radius).map(|d| (m.entity, d)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((entity, marker_distance)) = nearest_marker
        && globe_distance.is_none_or(|gd| marker_distance <= gd)
    {
        return Some(SurfaceHit::Marker { entity });
    }

    globe.map(|world| SurfaceHit::Globe {
        local: (orientation.inverse() * world).normalize(),
    })
}

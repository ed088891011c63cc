//! Fly-to rotation when a marker is activated.

use bevy::prelude::*;

use crate::geo::lat_lon_to_point;
use crate::interaction::OrientationController;

pub const FOCUS_DURATION_SECS: f32 = 0.8;

/// Orientation that brings the given lat/lon in front of the camera, with the
/// globe's poles kept as upright as the view allows.
///
/// First rotates the marker direction onto the camera direction, then twists
/// around the camera direction so the globe's Y axis, projected onto the view
/// plane, lines up with world up.
pub fn focus_orientation(lat: f32, lon: f32, camera_pos: Vec3) -> Quat {
    let marker_dir = lat_lon_to_point(lat, lon, 1.0).normalize();
    let camera_dir = camera_pos.normalize();

    let q1 = Quat::from_rotation_arc(marker_dir, camera_dir);

    let y_after = q1 * Vec3::Y;
    let y_proj = (y_after - camera_dir * y_after.dot(camera_dir)).normalize_or_zero();
    let up_proj = (Vec3::Y - camera_dir * camera_dir.y).normalize_or_zero();
    if y_proj == Vec3::ZERO || up_proj == Vec3::ZERO {
        // Pole-on view; any twist is as good as another.
        return q1;
    }

    let mut angle = y_proj.dot(up_proj).clamp(-1.0, 1.0).acos();
    if y_proj.cross(up_proj).dot(camera_dir) < 0.0 {
        angle = -angle;
    }
    let q2 = Quat::from_axis_angle(camera_dir, angle);

    (q2 * q1).normalize()
}

/// In-flight fly-to animation; present as a resource only while playing.
#[derive(Resource, Debug)]
pub struct FocusAnimation {
    start: Quat,
    target: Quat,
    elapsed: f32,
    duration: f32,
}

impl FocusAnimation {
    pub fn toward(start: Quat, lat: f32, lon: f32, camera_pos: Vec3) -> Self {
        Self {
            start,
            target: focus_orientation(lat, lon, camera_pos),
            elapsed: 0.0,
            duration: FOCUS_DURATION_SECS,
        }
    }

    /// Advances by `dt` and returns the interpolated orientation plus a done
    /// flag. The final frame snaps exactly to the target.
    pub fn advance(&mut self, dt: f32) -> (Quat, bool) {
        self.elapsed += dt;
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        if t >= 1.0 {
            // Snap to the exact target; slerp residue would leave the marker
            // slightly off-center.
            (self.target, true)
        } else {
            (self.start.slerp(self.target, t), false)
        }
    }
}

/// Drives the fly-to animation, writing through the orientation controller so
/// the rest of the app keeps a single source of rotation truth.
pub fn advance_focus_animation(
    time: Res<Time>,
    animation: Option<ResMut<FocusAnimation>>,
    mut controller: ResMut<OrientationController>,
    mut commands: Commands,
) {
    let Some(mut animation) = animation else {
        return;
    };
    let (orientation, done) = animation.advance(time.delta_secs());
    controller.set_orientation(orientation);
    if done {
        commands.remove_resource::<FocusAnimation>();
    }
}

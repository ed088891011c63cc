//! Globe orientation ownership and the drag lifecycle.
//!
//! The controller is the only writer of the globe quaternion. Renderer and
//! marker logic read it through `orientation()` each tick. During a drag the
//! rotation is always recomputed from the pointer-down snapshot, never layered
//! on top of the previous frame, so multi-frame drags do not accumulate drift.

use bevy::prelude::*;

use crate::geo::GLOBE_RADIUS;
use crate::interaction::raycast::intersect_sphere;
use crate::rotation::RotationMachine;

/// Auto-rotation step in radians per simulated 60 Hz tick.
pub const AUTO_ROTATION_SPEED: f32 = 0.005;

/// Drags below this angle are ignored for the frame.
const MIN_DRAG_ANGLE: f32 = 1e-3;

/// State for one continuous drag, pointer-down to pointer-up.
#[derive(Clone, Copy, Debug)]
struct DragSession {
    /// Grabbed surface point, unit vector in globe-local space.
    grabbed: Vec3,
    /// Orientation snapshot taken at pointer-down.
    initial: Quat,
}

#[derive(Resource, Debug)]
pub struct OrientationController {
    orientation: Quat,
    drag: Option<DragSession>,
    pub auto_speed: f32,
}

impl Default for OrientationController {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            drag: None,
            auto_speed: AUTO_ROTATION_SPEED,
        }
    }
}

impl OrientationController {
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Direct overwrite, used by the focus animation.
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer-down on the globe surface: snapshot the orientation, remember
    /// the grabbed local point, and pause auto-rotation (no-op when stopped).
    pub fn begin_drag(&mut self, grabbed_local: Vec3, machine: &mut RotationMachine) {
        self.drag = Some(DragSession {
            grabbed: grabbed_local.normalize(),
            initial: self.orientation,
        });
        machine.pause();
    }

    /// Pointer-move during a drag. The ray is cast against a virtual sphere
    /// frozen at the pointer-down orientation; rotating the live globe under
    /// the cursor must not feed back into the target computation.
    ///
    /// Missing the sphere, tiny angles, and degenerate axes (coincident or
    /// antipodal grab/target) all leave the orientation untouched.
    pub fn drag_to(&mut self, ray: Ray3d) {
        let Some(drag) = self.drag else {
            return;
        };
        let Some(world) = intersect_sphere(ray, Vec3::ZERO, GLOBE_RADIUS) else {
            return;
        };
        let target = (drag.initial.inverse() * world).normalize();

        let angle = drag.grabbed.angle_between(target);
        if angle <= MIN_DRAG_ANGLE {
            return;
        }
        let Ok(axis) = Dir3::new(drag.grabbed.cross(target)) else {
            return;
        };

        let incremental = Quat::from_axis_angle(*axis, angle);
        self.orientation = (drag.initial * incremental).normalize();
    }

    /// Pointer-up or pointer-leave: clear the session and schedule the
    /// auto-rotation resume (no-op on the machine unless it is paused).
    pub fn end_drag(&mut self, machine: &mut RotationMachine, cooldown: f32) {
        if self.drag.take().is_some() {
            machine.schedule_resume(cooldown);
        }
    }

    /// Idle auto-rotation around the polar axis. Skipped while a drag is
    /// active or the machine is not rotating.
    pub fn tick(&mut self, dt: f32, machine: &RotationMachine) {
        if self.drag.is_some() || !machine.is_rotating() {
            return;
        }
        let step = self.auto_speed * dt * 60.0;
        self.orientation = (self.orientation * Quat::from_axis_angle(Vec3::Y, step)).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::RotationState;

    fn ray_toward_origin(origin: Vec3) -> Ray3d {
        Ray3d::new(origin, Dir3::new(-origin).unwrap())
    }

    #[test]
    fn test_drag_quarter_turn_maps_grab_to_target() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();

        controller.begin_drag(Vec3::Z, &mut machine);
        assert_eq!(machine.state(), RotationState::Paused);

        // Ray hitting the unit sphere at (1, 0, 0).
        controller.drag_to(ray_toward_origin(Vec3::new(5.0, 0.0, 0.0)));

        let moved = controller.orientation() * Vec3::Z;
        assert!(
            (moved - Vec3::X).length() < 1e-4,
            "grabbed point should now sit at the target, got {moved:?}"
        );
    }

    #[test]
    fn test_drag_recomputes_from_snapshot_each_move() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();
        controller.begin_drag(Vec3::Z, &mut machine);

        // Wander, then come back: the net rotation must match a single move
        // to the final target, not the sum of intermediate steps.
        controller.drag_to(ray_toward_origin(Vec3::new(5.0, 0.0, 0.0)));
        controller.drag_to(ray_toward_origin(Vec3::new(0.0, 5.0, 0.0)));
        controller.drag_to(ray_toward_origin(Vec3::new(3.0, 0.0, 3.0)));

        let expected_target = Vec3::new(3.0, 0.0, 3.0).normalize();
        let moved = controller.orientation() * Vec3::Z;
        assert!((moved - expected_target).length() < 1e-4);
    }

    #[test]
    fn test_degenerate_drags_are_noops() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();
        controller.begin_drag(Vec3::Z, &mut machine);

        // Target coincides with the grab point.
        controller.drag_to(ray_toward_origin(Vec3::new(0.0, 0.0, 5.0)));
        assert!((controller.orientation() * Vec3::Z - Vec3::Z).length() < 1e-6);

        // Ray misses the sphere entirely.
        controller.drag_to(Ray3d::new(Vec3::new(0.0, 5.0, 5.0), Dir3::Z));
        assert!((controller.orientation() * Vec3::Z - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_antipodal_target_is_skipped() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();
        controller.begin_drag(Vec3::Z, &mut machine);

        // Camera behind the globe grabs the far side: target is -Z, the cross
        // product degenerates, and the frame is dropped.
        controller.drag_to(ray_toward_origin(Vec3::new(0.0, 0.0, -5.0)));
        assert!((controller.orientation() * Vec3::Z - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_end_drag_schedules_resume() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();

        controller.begin_drag(Vec3::Z, &mut machine);
        controller.end_drag(&mut machine, 1.0);
        assert!(!controller.is_dragging());
        assert_eq!(machine.state(), RotationState::Paused);

        machine.tick(1.1);
        assert_eq!(machine.state(), RotationState::Rotating);
    }

    #[test]
    fn test_end_drag_respects_manual_stop() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();
        machine.stop();

        controller.begin_drag(Vec3::Z, &mut machine);
        assert_eq!(machine.state(), RotationState::Stopped);
        controller.end_drag(&mut machine, 0.5);
        machine.tick(10.0);
        assert_eq!(machine.state(), RotationState::Stopped);
    }

    #[test]
    fn test_auto_rotation_turns_about_polar_axis() {
        let mut controller = OrientationController::default();
        let machine = RotationMachine::default();

        controller.tick(1.0 / 60.0, &machine);
        let q = controller.orientation();
        let (axis, angle) = q.to_axis_angle();
        assert!((axis.abs() - Vec3::Y).length() < 1e-4);
        assert!((angle - AUTO_ROTATION_SPEED).abs() < 1e-5);
    }

    #[test]
    fn test_orientation_norm_stays_bounded_over_many_ticks() {
        let mut controller = OrientationController::default();
        let machine = RotationMachine::default();

        for _ in 0..10_000 {
            controller.tick(1.0 / 60.0, &machine);
        }
        assert!((controller.orientation().length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_auto_rotation_while_dragging_or_paused() {
        let mut controller = OrientationController::default();
        let mut machine = RotationMachine::default();

        controller.begin_drag(Vec3::Z, &mut machine);
        controller.tick(1.0, &machine);
        assert_eq!(controller.orientation(), Quat::IDENTITY);

        controller.end_drag(&mut machine, 5.0);
        // Still paused, cooldown pending.
        controller.tick(1.0, &machine);
        assert_eq!(controller.orientation(), Quat::IDENTITY);
    }
}

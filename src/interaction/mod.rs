//! Pointer-driven globe interaction.
//!
//! Translates window cursor state into controller calls: drags rotate the
//! globe so the grabbed surface point tracks the cursor, marker hits pause
//! rotation or trigger the fly-to focus, and each frame advances the
//! auto-rotation and writes the resulting quaternion onto the globe root.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

pub mod controller;
pub mod raycast;

pub use controller::OrientationController;
pub use raycast::{MarkerTarget, SurfaceHit, hit_test};

use crate::focus::{FocusAnimation, advance_focus_animation};
use crate::geo::{GLOBE_RADIUS, point_to_lat_lon};
use crate::markers::{MARKER_HIT_RADIUS, Marker};
use crate::rotation::{RESUME_COOLDOWN_SECS, RotationMachine};
use crate::{GlobeRoot, MainCamera};

/// Marker currently under the cursor, if any. Drives hover pause/resume.
#[derive(Resource, Default)]
struct HoverState {
    marker: Option<Entity>,
}

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OrientationController>()
            .init_resource::<RotationMachine>()
            .init_resource::<HoverState>()
            .add_systems(
                Update,
                (
                    pointer_system,
                    tick_rotation_machine,
                    advance_focus_animation,
                    advance_auto_rotation,
                    sync_globe_rotation,
                )
                    .chain(),
            );
    }
}

fn pointer_system(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    markers: Query<(Entity, &Marker, &GlobalTransform)>,
    mut controller: ResMut<OrientationController>,
    mut machine: ResMut<RotationMachine>,
    mut hover: ResMut<HoverState>,
    mut commands: Commands,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    let Some(cursor) = window.cursor_position() else {
        // Pointer left the window: terminate any drag immediately and treat a
        // hovered marker as un-hovered.
        controller.end_drag(&mut machine, RESUME_COOLDOWN_SECS);
        if hover.marker.take().is_some() {
            machine.schedule_resume(RESUME_COOLDOWN_SECS);
        }
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    if controller.is_dragging() {
        if buttons.pressed(MouseButton::Left) {
            controller.drag_to(ray);
        }
        if buttons.just_released(MouseButton::Left) {
            controller.end_drag(&mut machine, RESUME_COOLDOWN_SECS);
        }
        return;
    }

    let targets: Vec<MarkerTarget> = markers
        .iter()
        .map(|(entity, _, transform)| MarkerTarget {
            entity,
            center: transform.translation(),
            radius: MARKER_HIT_RADIUS,
        })
        .collect();
    let hit = hit_test(ray, controller.orientation(), GLOBE_RADIUS, &targets);

    let hovered = match hit {
        Some(SurfaceHit::Marker { entity }) => Some(entity),
        _ => None,
    };
    if hovered != hover.marker {
        if hovered.is_some() {
            machine.pause();
        } else {
            machine.schedule_resume(RESUME_COOLDOWN_SECS);
        }
        hover.marker = hovered;
    }

    if buttons.just_pressed(MouseButton::Left) {
        match hit {
            // Markers consume the press for selection; no drag starts.
            Some(SurfaceHit::Marker { entity }) => {
                if let Ok((_, marker, _)) = markers.get(entity) {
                    info!("focusing on marker '{}'", marker.id);
                    machine.stop();
                    commands.insert_resource(FocusAnimation::toward(
                        controller.orientation(),
                        marker.lat,
                        marker.lon,
                        camera_transform.translation(),
                    ));
                }
            }
            Some(SurfaceHit::Globe { local }) => {
                let (lat, lon) = point_to_lat_lon(local);
                debug!("grabbed globe at lat {lat:.2}, lon {lon:.2}");
                commands.remove_resource::<FocusAnimation>();
                controller.begin_drag(local, &mut machine);
            }
            None => {}
        }
    }
}

fn tick_rotation_machine(time: Res<Time>, mut machine: ResMut<RotationMachine>) {
    machine.tick(time.delta_secs());
}

fn advance_auto_rotation(
    time: Res<Time>,
    machine: Res<RotationMachine>,
    mut controller: ResMut<OrientationController>,
) {
    controller.tick(time.delta_secs(), &machine);
}

/// Mirrors the controller's quaternion onto the globe root transform. The
/// controller stays the single writer of orientation state.
fn sync_globe_rotation(
    controller: Res<OrientationController>,
    mut root: Query<&mut Transform, With<GlobeRoot>>,
) {
    let Ok(mut transform) = root.single_mut() else {
        return;
    };
    transform.rotation = controller.orientation();
}

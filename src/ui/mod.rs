//! Control surface: rotation toggle button, status readout, and keyboard
//! controls for zoom, layers, and the point cloud.

use bevy::prelude::*;

use crate::catalog::{ActiveTileSource, CatalogChannels, LayerCatalog, request_layer};
use crate::rotation::{RotationMachine, RotationState};
use crate::tiles::TileLayerConfig;

#[derive(Component)]
struct RotationToggleButton;

#[derive(Component)]
struct RotationToggleLabel;

#[derive(Component)]
struct StatusReadout;

const BUTTON_BG: Color = Color::srgba(0.06, 0.12, 0.16, 0.9);
const BUTTON_BG_HOVER: Color = Color::srgba(0.08, 0.2, 0.26, 0.95);
const BUTTON_TEXT: Color = Color::srgba(0.6, 1.0, 1.0, 1.0);

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_ui).add_systems(
            Update,
            (
                rotation_toggle_system,
                update_rotation_label,
                keyboard_controls,
                update_status_readout,
            ),
        );
    }
}

fn setup_ui(mut commands: Commands) {
    commands
        .spawn((
            RotationToggleButton,
            Button,
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(16.0),
                left: Val::Px(16.0),
                padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
                ..default()
            },
            BackgroundColor(BUTTON_BG),
        ))
        .with_children(|parent| {
            parent.spawn((
                RotationToggleLabel,
                Text::new("Pause globe rotation"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(BUTTON_TEXT),
            ));
        });

    commands.spawn((
        StatusReadout,
        Text::new(String::new()),
        TextFont {
            font_size: 13.0,
            ..default()
        },
        TextColor(BUTTON_TEXT),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(16.0),
            ..default()
        },
    ));
}

fn rotation_toggle_system(
    mut interactions: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<RotationToggleButton>),
    >,
    mut machine: ResMut<RotationMachine>,
) {
    for (interaction, mut background) in &mut interactions {
        match interaction {
            Interaction::Pressed => {
                machine.toggle();
                *background = BackgroundColor(BUTTON_BG);
            }
            Interaction::Hovered => *background = BackgroundColor(BUTTON_BG_HOVER),
            Interaction::None => *background = BackgroundColor(BUTTON_BG),
        }
    }
}

fn update_rotation_label(
    machine: Res<RotationMachine>,
    mut labels: Query<&mut Text, With<RotationToggleLabel>>,
) {
    if !machine.is_changed() {
        return;
    }
    let label = match machine.state() {
        RotationState::Stopped => "Resume globe rotation",
        RotationState::Rotating | RotationState::Paused => "Pause globe rotation",
    };
    for mut text in &mut labels {
        text.0 = label.to_string();
    }
}

/// Digits set the requested zoom (out-of-range values exercise clamping),
/// `N`/`B` walk the layer catalog, `P` toggles the point cloud.
fn keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut config: ResMut<TileLayerConfig>,
    mut catalog: ResMut<LayerCatalog>,
    channels: Option<Res<CatalogChannels>>,
) {
    const DIGITS: [(KeyCode, i32); 8] = [
        (KeyCode::Digit0, 0),
        (KeyCode::Digit1, 1),
        (KeyCode::Digit2, 2),
        (KeyCode::Digit3, 3),
        (KeyCode::Digit4, 4),
        (KeyCode::Digit5, 5),
        (KeyCode::Digit6, 6),
        (KeyCode::Digit7, 7),
    ];
    for (key, zoom) in DIGITS {
        if keys.just_pressed(key) {
            config.requested_zoom = zoom;
        }
    }

    if keys.just_pressed(KeyCode::KeyP) {
        config.point_cloud.enabled = !config.point_cloud.enabled;
    }

    let Some(channels) = channels else { return };
    if catalog.layers.is_empty() {
        return;
    }
    let step: isize = if keys.just_pressed(KeyCode::KeyN) {
        1
    } else if keys.just_pressed(KeyCode::KeyB) {
        -1
    } else {
        return;
    };
    let count = catalog.layers.len() as isize;
    let current = catalog.selected.map_or(-1, |i| i as isize);
    let next = (current + step).rem_euclid(count) as usize;
    request_layer(next, &mut catalog, &channels);
}

fn update_status_readout(
    machine: Res<RotationMachine>,
    config: Res<TileLayerConfig>,
    source: Res<ActiveTileSource>,
    catalog: Res<LayerCatalog>,
    mut readouts: Query<&mut Text, With<StatusReadout>>,
) {
    let state = match machine.state() {
        RotationState::Rotating => "rotating",
        RotationState::Paused => "paused",
        RotationState::Stopped => "stopped",
    };
    let layers = if catalog.loading {
        "loading...".to_string()
    } else {
        format!("{} available", catalog.layers.len())
    };
    let status = format!(
        "{} | zoom {} | layers: {} | {}",
        source.title, config.requested_zoom, layers, state
    );
    for mut text in &mut readouts {
        if text.0 != status {
            text.0 = status.clone();
        }
    }
}

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{RenderCreation, WgpuSettings};
use bevy::window::{PresentMode, Window, WindowPlugin};

mod catalog;
mod focus;
mod geo;
mod interaction;
mod markers;
mod rotation;
mod tiles;
mod ui;

use catalog::CatalogPlugin;
use geo::GLOBE_RADIUS;
use interaction::InteractionPlugin;
use markers::MarkersPlugin;
use tiles::TilesPlugin;
use ui::UiPlugin;

/// Root entity of the globe. Tiles and markers are parented here so the
/// whole assembly follows a single rotation.
#[derive(Component)]
pub struct GlobeRoot;

#[derive(Component)]
pub struct MainCamera;

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Keep the night side readable; tiles are unlit but the base sphere is not.
    commands.insert_resource(GlobalAmbientLight {
        brightness: 150.0,
        ..default()
    });

    commands
        .spawn((
            GlobeRoot,
            Transform::default(),
            Visibility::default(),
            Name::new("Globe"),
        ))
        .with_children(|parent| {
            // Opaque base sphere sits just under the tile shell so gaps between
            // tiles read as ocean-dark instead of the clear color.
            parent.spawn((
                Mesh3d(meshes.add(Sphere::new(GLOBE_RADIUS).mesh().ico(5).unwrap())),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.02, 0.04, 0.08),
                    unlit: true,
                    ..default()
                })),
                Name::new("Globe Base"),
            ));
        });

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.05,
            far: 100.0,
            ..default()
        }),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        MainCamera,
        Tonemapping::TonyMcMapface,
        Transform::from_xyz(0.0, 0.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(0.0, 2.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn main() {
    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Tile Globe".to_string(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(RenderPlugin {
                render_creation: RenderCreation::Automatic(WgpuSettings { ..default() }),
                ..default()
            }),
    );

    app.add_plugins(CatalogPlugin);
    app.add_plugins(TilesPlugin);
    app.add_plugins(MarkersPlugin);
    app.add_plugins(InteractionPlugin);
    app.add_plugins(UiPlugin);
    app.add_systems(Startup, setup);

    app.run();
}

//! Point markers pinned to the globe surface.
//!
//! Markers are supplied as plain lat/lon records, spawned as small spheres
//! parented to the globe root, and culled every tick against the visible
//! hemisphere.

use bevy::prelude::*;

pub mod visibility;

use crate::geo::lat_lon_to_point;
use crate::interaction::OrientationController;
use crate::{GlobeRoot, MainCamera};
use visibility::evaluate;

/// Radius at which markers sit, slightly above the globe surface.
pub const MARKER_ALTITUDE: f32 = 1.01;
/// Rendered sphere size.
const MARKER_MESH_RADIUS: f32 = 0.012;
/// Pick radius, a little fatter than the visual so markers are clickable.
pub const MARKER_HIT_RADIUS: f32 = 0.035;

/// One marker site. Immutable once spawned.
#[derive(Component, Clone, Debug)]
pub struct Marker {
    pub id: String,
    pub lat: f32,
    pub lon: f32,
}

/// Externally supplied marker list; the default set is a handful of large
/// cities.
#[derive(Resource, Debug)]
pub struct MarkerCatalog(pub Vec<Marker>);

impl Default for MarkerCatalog {
    fn default() -> Self {
        let sites = [
            ("Tokyo", 35.6762, 139.6503),
            ("Delhi", 28.6139, 77.2090),
            ("Shanghai", 31.2304, 121.4737),
            ("São Paulo", -23.5505, -46.6333),
            ("Cairo", 30.0444, 31.2357),
            ("New York", 40.7128, -74.0060),
            ("Lagos", 6.5244, 3.3792),
            ("London", 51.5074, -0.1278),
            ("Sydney", -33.8688, 151.2093),
            ("Nairobi", -1.2921, 36.8219),
        ];
        Self(
            sites
                .into_iter()
                .map(|(id, lat, lon)| Marker {
                    id: id.to_string(),
                    lat,
                    lon,
                })
                .collect(),
        )
    }
}

pub struct MarkersPlugin;

impl Plugin for MarkersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MarkerCatalog>()
            .add_systems(PostStartup, spawn_markers)
            .add_systems(Update, update_marker_visibility);
    }
}

/// Spawns one sphere per catalog entry as a child of the globe root, each
/// with its own material so opacity can fade independently.
fn spawn_markers(
    catalog: Res<MarkerCatalog>,
    root: Query<Entity, With<GlobeRoot>>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Ok(root) = root.single() else {
        return;
    };

    let mesh = meshes.add(Sphere::new(MARKER_MESH_RADIUS).mesh().ico(3).unwrap());
    for marker in &catalog.0 {
        let position = lat_lon_to_point(marker.lat, marker.lon, MARKER_ALTITUDE);
        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba(0.9, 0.15, 0.15, 1.0),
                alpha_mode: AlphaMode::Blend,
                ..default()
            })),
            Transform::from_translation(position),
            marker.clone(),
            ChildOf(root),
        ));
    }
    info!("spawned {} markers", catalog.0.len());
}

/// Hemisphere culling pass. Hidden markers are excluded from rendering
/// entirely; visible ones fade with the horizon.
fn update_marker_visibility(
    controller: Res<OrientationController>,
    camera: Query<&GlobalTransform, With<MainCamera>>,
    mut markers: Query<(&Marker, &MeshMaterial3d<StandardMaterial>, &mut Visibility)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Ok(camera) = camera.single() else {
        return;
    };
    let orientation = controller.orientation();

    for (marker, material, mut vis) in &mut markers {
        let result = evaluate(
            marker.lat,
            marker.lon,
            MARKER_ALTITUDE,
            orientation,
            camera.translation(),
        );
        *vis = if result.is_visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = material.base_color.with_alpha(result.opacity);
        }
    }
}

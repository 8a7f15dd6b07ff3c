//! Globe section: a draggable sphere with magnitude-sized event markers kept
//! in step with the marker renderer.

use std::collections::HashMap;
use std::f32::consts::TAU;

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::camera::{PageCamera, PageLayout, SectionId};
use crate::render::{MarkerKey, MarkerRenderer, Phase};
use crate::scene::materials::{globe_material, marker_material, tint_marker};
use crate::scene::QuakeFeature;

pub const GLOBE_RADIUS: f32 = 4.0;
const MARKER_LIFT: f32 = 1.005;
const GRATICULE_STEP_DEG: f32 = 30.0;
const GRATICULE_SEGMENTS: usize = 72;
const MAX_PITCH: f32 = 1.2;
const HOVER_RADIUS_PX: f32 = 12.0;

/// Rotation state of the globe. Lives with the visualization rather than in
/// module-level statics.
#[derive(Resource, Debug)]
pub struct GlobeView {
    pub yaw: f32,
    pub pitch: f32,
    pub dragging: bool,
    /// Idle rotation in radians per second.
    pub spin_speed: f32,
    /// Radians per pixel of pointer motion.
    pub drag_sensitivity: f32,
}

impl Default for GlobeView {
    fn default() -> Self {
        Self {
            yaw: -2.4,
            pitch: 0.5,
            dragging: false,
            spin_speed: 0.08,
            drag_sensitivity: 0.006,
        }
    }
}

impl GlobeView {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch) * Quat::from_rotation_y(self.yaw)
    }

    pub fn drag(&mut self, delta: Vec2) {
        self.yaw = (self.yaw + delta.x * self.drag_sensitivity).rem_euclid(TAU);
        self.pitch = (self.pitch + delta.y * self.drag_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

/// Unit-sphere position for a latitude/longitude in degrees. Longitude 0 on
/// the equator faces +Z.
pub fn lat_lon_to_unit(latitude: f64, longitude: f64) -> Vec3 {
    let lat = (latitude as f32).to_radians();
    let lon = (longitude as f32).to_radians();
    Vec3::new(lat.cos() * lon.sin(), lat.sin(), lat.cos() * lon.cos())
}

#[derive(Component)]
pub struct GlobeRoot;

#[derive(Component)]
pub struct GlobeMarker {
    pub key: MarkerKey,
}

/// Marker entities by key, with their per-marker material for fading.
#[derive(Resource, Default)]
pub struct GlobeMarkers {
    entities: HashMap<MarkerKey, (Entity, Handle<StandardMaterial>)>,
}

/// Marker under the pointer, if any.
#[derive(Resource, Default)]
pub struct HoveredMarker {
    pub key: Option<MarkerKey>,
}

#[derive(Resource)]
struct MarkerMesh(Handle<Mesh>);

pub fn globe_plugin(app: &mut App) {
    app.init_resource::<GlobeView>()
        .init_resource::<GlobeMarkers>()
        .init_resource::<HoveredMarker>()
        .add_systems(Startup, spawn_globe)
        .add_systems(
            Update,
            (
                globe_drag_system,
                apply_globe_rotation_system,
                advance_marker_transitions_system,
                sync_globe_markers_system,
                hover_marker_system,
                draw_globe_graticule_system,
            )
                .chain(),
        );
}

fn spawn_globe(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    page: Res<PageLayout>,
    view: Res<GlobeView>,
) {
    let Some(section) = page.section(SectionId::Globe) else {
        return;
    };
    let marker_mesh = Sphere::new(1.0)
        .mesh()
        .ico(2)
        .unwrap_or_else(|_| Sphere::new(1.0).mesh().uv(16, 8));
    commands.insert_resource(MarkerMesh(meshes.add(marker_mesh)));

    commands
        .spawn((
            GlobeRoot,
            Transform::from_translation(section.center()).with_rotation(view.rotation()),
            Visibility::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(Sphere::new(GLOBE_RADIUS).mesh().uv(64, 32))),
                MeshMaterial3d(globe_material(&mut materials)),
                Transform::default(),
            ));
        });
}

fn globe_drag_system(
    time: Res<Time>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut contexts: EguiContexts,
    page: Res<PageLayout>,
    mut view: ResMut<GlobeView>,
) {
    let delta: Vec2 = motion.read().map(|m| m.delta).sum();

    if mouse.just_pressed(MouseButton::Left)
        && !contexts.ctx_mut().is_pointer_over_area()
        && page.visibility(SectionId::Globe).ratio >= 0.5
    {
        view.dragging = true;
    }
    if !mouse.pressed(MouseButton::Left) {
        view.dragging = false;
    }

    if view.dragging {
        view.drag(delta);
    } else {
        let spin = view.spin_speed * time.delta_secs();
        view.yaw = (view.yaw + spin).rem_euclid(TAU);
    }
}

fn apply_globe_rotation_system(
    view: Res<GlobeView>,
    mut roots: Query<&mut Transform, With<GlobeRoot>>,
) {
    if !view.is_changed() {
        return;
    }
    for mut transform in &mut roots {
        transform.rotation = view.rotation();
    }
}

fn advance_marker_transitions_system(
    time: Res<Time>,
    mut feature: ResMut<QuakeFeature<MarkerRenderer>>,
) {
    feature.animation.renderer_mut().advance(time.delta());
}

/// Spawn, move, fade and despawn marker entities to mirror the renderer.
fn sync_globe_markers_system(
    mut commands: Commands,
    feature: Res<QuakeFeature<MarkerRenderer>>,
    mesh: Option<Res<MarkerMesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut registry: ResMut<GlobeMarkers>,
    roots: Query<Entity, With<GlobeRoot>>,
    mut transforms: Query<&mut Transform, With<GlobeMarker>>,
) {
    let (Some(mesh), Ok(root)) = (mesh, roots.get_single()) else {
        return;
    };
    let renderer = feature.animation.renderer();

    for marker in renderer.markers() {
        let pose = marker.pose();
        let transform = Transform::from_translation(
            lat_lon_to_unit(pose.latitude, pose.longitude) * GLOBE_RADIUS * MARKER_LIFT,
        )
        .with_scale(Vec3::splat((pose.radius * GLOBE_RADIUS).max(0.0)));

        match registry.entities.get(&marker.key).cloned() {
            Some((entity, material)) => {
                if let Ok(mut current) = transforms.get_mut(entity) {
                    *current = transform;
                }
                if let Some(material) = materials.get_mut(&material) {
                    tint_marker(material, marker.magnitude, pose.opacity);
                }
            }
            None => {
                let material = marker_material(&mut materials, marker.magnitude);
                let entity = commands
                    .spawn((
                        GlobeMarker {
                            key: marker.key.clone(),
                        },
                        Mesh3d(mesh.0.clone()),
                        MeshMaterial3d(material.clone()),
                        transform,
                    ))
                    .set_parent(root)
                    .id();
                registry
                    .entities
                    .insert(marker.key.clone(), (entity, material));
            }
        }
    }

    registry.entities.retain(|key, (entity, material)| {
        if renderer.get(key).is_some() {
            return true;
        }
        commands.entity(*entity).despawn_recursive();
        materials.remove(material.id());
        false
    });
}

fn hover_marker_system(
    windows: Query<&Window>,
    cameras: Query<(&Camera, &GlobalTransform), With<PageCamera>>,
    roots: Query<&GlobalTransform, With<GlobeRoot>>,
    markers: Query<(&GlobalTransform, &GlobeMarker)>,
    feature: Res<QuakeFeature<MarkerRenderer>>,
    mut hovered: ResMut<HoveredMarker>,
) {
    let picked = (|| {
        let cursor = windows.get_single().ok()?.cursor_position()?;
        let (camera, cam_transform) = cameras.get_single().ok()?;
        let center = roots.get_single().ok()?.translation();
        let renderer = feature.animation.renderer();

        markers
            .iter()
            .filter(|(transform, _)| transform.translation().z >= center.z)
            .filter(|(_, marker)| {
                renderer
                    .get(&marker.key)
                    .is_some_and(|m| m.phase != Phase::Exiting)
            })
            .filter_map(|(transform, marker)| {
                let screen = camera
                    .world_to_viewport(cam_transform, transform.translation())
                    .ok()?;
                let distance = screen.distance(cursor);
                (distance <= HOVER_RADIUS_PX).then_some((distance, marker.key.clone()))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, key)| key)
    })();

    if hovered.key != picked {
        hovered.key = picked;
    }
}

fn draw_globe_graticule_system(
    mut gizmos: Gizmos,
    page: Res<PageLayout>,
    roots: Query<&GlobalTransform, With<GlobeRoot>>,
) {
    if !page.visibility(SectionId::Globe).is_intersecting {
        return;
    }
    let Ok(root) = roots.get_single() else {
        return;
    };
    let center = root.translation();
    let color = Color::srgba(0.55, 0.7, 0.85, 0.35);
    let radius = GLOBE_RADIUS * 1.002;

    let to_world = |lat: f32, lon: f32| {
        root.transform_point(lat_lon_to_unit(f64::from(lat), f64::from(lon)) * radius)
    };
    let mut polyline = |points: Vec<Vec3>| {
        for pair in points.windows(2) {
            // Front hemisphere only.
            if pair[0].z >= center.z && pair[1].z >= center.z {
                gizmos.line(pair[0], pair[1], color);
            }
        }
    };

    let step = GRATICULE_STEP_DEG;
    let mut lon = -180.0;
    while lon < 180.0 {
        let points: Vec<Vec3> = (0..=GRATICULE_SEGMENTS)
            .map(|i| {
                let lat = -90.0 + 180.0 * i as f32 / GRATICULE_SEGMENTS as f32;
                to_world(lat, lon)
            })
            .collect();
        polyline(points);
        lon += step;
    }

    let mut lat = -90.0 + step;
    while lat < 90.0 {
        let points: Vec<Vec3> = (0..=GRATICULE_SEGMENTS)
            .map(|i| {
                let lon = -180.0 + 360.0 * i as f32 / GRATICULE_SEGMENTS as f32;
                to_world(lat, lon)
            })
            .collect();
        polyline(points);
        lat += step;
    }
}

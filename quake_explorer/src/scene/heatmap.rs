//! Heatmap section: the region backdrop, a graticule and the weighted heat
//! points of the current frame, drawn with gizmos.

use bevy::prelude::*;

use crate::camera::{PageLayout, SectionId};
use crate::data::BoundingRegion;
use crate::render::HeatmapRenderer;
use crate::scene::materials::heat_color;
use crate::scene::QuakeFeature;

const GRATICULE_STEP_DEG: f64 = 2.0;
const BACKDROP_MARGIN: f32 = 0.4;

/// Equirectangular placement of the heat region inside its section.
#[derive(Resource, Clone, Debug)]
pub struct HeatmapView {
    pub region: BoundingRegion,
    /// World units per degree.
    pub scale: f32,
}

impl Default for HeatmapView {
    fn default() -> Self {
        Self {
            region: BoundingRegion::JAPAN,
            scale: 0.42,
        }
    }
}

impl HeatmapView {
    /// World position of a lat/lon inside the section centred at `origin`.
    pub fn project(&self, origin: Vec3, latitude: f64, longitude: f64) -> Vec3 {
        let (center_lat, center_lon) = self.region.center();
        origin
            + Vec3::new(
                ((longitude - center_lon) as f32) * self.scale,
                ((latitude - center_lat) as f32) * self.scale,
                0.0,
            )
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(
            self.region.lon_span() as f32 * self.scale,
            self.region.lat_span() as f32 * self.scale,
        )
    }
}

/// Marker for the backdrop plane.
#[derive(Component)]
pub struct HeatmapBackdrop;

pub fn heatmap_plugin(app: &mut App) {
    app.init_resource::<HeatmapView>()
        .add_systems(Startup, spawn_heatmap_backdrop)
        .add_systems(Update, draw_heatmap_system);
}

fn spawn_heatmap_backdrop(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    page: Res<PageLayout>,
    view: Res<HeatmapView>,
) {
    let Some(section) = page.section(SectionId::Heatmap) else {
        return;
    };
    let size = view.size() + Vec2::splat(BACKDROP_MARGIN * 2.0);
    commands.spawn((
        HeatmapBackdrop,
        Mesh3d(meshes.add(Rectangle::new(size.x, size.y))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.06, 0.08, 0.12),
            unlit: true,
            ..default()
        })),
        Transform::from_translation(section.center() - Vec3::Z * 0.1),
    ));
}

fn draw_heatmap_system(
    mut gizmos: Gizmos,
    page: Res<PageLayout>,
    view: Res<HeatmapView>,
    feature: Res<QuakeFeature<HeatmapRenderer>>,
) {
    let Some(section) = page.section(SectionId::Heatmap) else {
        return;
    };
    if !page.visibility(SectionId::Heatmap).is_intersecting {
        return;
    }
    let origin = section.center();
    draw_graticule(&mut gizmos, &view, origin);
    draw_points(&mut gizmos, &view, origin, feature.animation.renderer());
}

fn draw_graticule(gizmos: &mut Gizmos, view: &HeatmapView, origin: Vec3) {
    let region = &view.region;
    let grid = Color::srgba(0.5, 0.6, 0.7, 0.25);
    let border = Color::srgba(0.7, 0.8, 0.9, 0.8);

    let mut lat = (region.min_lat / GRATICULE_STEP_DEG).ceil() * GRATICULE_STEP_DEG;
    while lat <= region.max_lat {
        let color = if lat == region.min_lat || lat == region.max_lat {
            border
        } else {
            grid
        };
        gizmos.line(
            view.project(origin, lat, region.min_lon),
            view.project(origin, lat, region.max_lon),
            color,
        );
        lat += GRATICULE_STEP_DEG;
    }

    let mut lon = (region.min_lon / GRATICULE_STEP_DEG).ceil() * GRATICULE_STEP_DEG;
    while lon <= region.max_lon {
        let color = if lon == region.min_lon || lon == region.max_lon {
            border
        } else {
            grid
        };
        gizmos.line(
            view.project(origin, region.min_lat, lon),
            view.project(origin, region.max_lat, lon),
            color,
        );
        lon += GRATICULE_STEP_DEG;
    }
}

fn draw_points(gizmos: &mut Gizmos, view: &HeatmapView, origin: Vec3, heat: &HeatmapRenderer) {
    let settings = &heat.settings;
    let rings = settings.blur_rings.max(1);
    for point in heat.points() {
        let center = view.project(origin, point.latitude, point.longitude) + Vec3::Z * 0.01;
        let base_radius = settings.radius * view.scale * (0.5 + point.weight);
        let base_alpha = point.weight.max(settings.min_opacity);
        let color = heat_color(point.weight);

        for ring in 0..rings {
            let falloff = ring as f32 / rings as f32;
            gizmos.circle(
                Isometry3d::from_translation(center),
                base_radius * (1.0 + falloff),
                color.with_alpha(base_alpha * (1.0 - falloff)),
            );
        }
    }
}

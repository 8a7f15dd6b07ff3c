mod feature;
pub(crate) mod globe;
pub(crate) mod heatmap;
pub(crate) mod materials;

pub use feature::{add_feature, QuakeFeature};
pub use globe::{globe_plugin, HoveredMarker};
pub use heatmap::heatmap_plugin;

use bevy::prelude::*;

pub fn setup_scene(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 6_000.0,
            ..default()
        },
        Transform::from_xyz(-6., 8., 12.).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_scene_inserts_lighting() {
        let mut app = App::new();
        app.add_systems(Startup, setup_scene);

        app.update();

        assert!(app.world().get_resource::<AmbientLight>().is_some());
        let world = app.world_mut();
        let light_count = world.query::<&DirectionalLight>().iter(world).count();
        assert_eq!(light_count, 1);
    }
}

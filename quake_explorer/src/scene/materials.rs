//! Shared colour helpers for heat points and globe markers.

use bevy::prelude::*;

/// Blue → Cyan → Yellow → Red gradient over `t` in 0..=1.
pub fn heat_color(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);

    if t < 0.33 {
        let s = t / 0.33;
        Color::srgb(0.0, s, 1.0 - s * 0.5)
    } else if t < 0.66 {
        let s = (t - 0.33) / 0.33;
        Color::srgb(s, 1.0, 0.5 * (1.0 - s))
    } else {
        let s = (t - 0.66) / 0.34;
        Color::srgb(1.0, 1.0 - s, 0.0)
    }
}

/// Marker colour by magnitude: pale orange for small events, deep red for
/// great ones.
pub fn magnitude_color(magnitude: Option<f64>) -> Color {
    let Some(mag) = magnitude else {
        return Color::srgb(0.7, 0.7, 0.7);
    };
    let t = ((mag - 5.0) / 3.0).clamp(0.0, 1.0) as f32;
    Color::srgb(1.0, 0.75 - 0.6 * t, 0.35 - 0.3 * t)
}

pub fn globe_material(materials: &mut Assets<StandardMaterial>) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: Color::srgb(0.08, 0.16, 0.28),
        perceptual_roughness: 0.9,
        ..default()
    })
}

pub fn marker_material(
    materials: &mut Assets<StandardMaterial>,
    magnitude: Option<f64>,
) -> Handle<StandardMaterial> {
    let mut material = StandardMaterial {
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    };
    tint_marker(&mut material, magnitude, 0.0);
    materials.add(material)
}

/// Recolour a marker material for its current magnitude and fade.
pub fn tint_marker(material: &mut StandardMaterial, magnitude: Option<f64>, opacity: f32) {
    let color = magnitude_color(magnitude);
    let lin = color.to_linear();
    material.base_color = color.with_alpha(opacity);
    material.emissive = LinearRgba::rgb(lin.red * 0.6, lin.green * 0.6, lin.blue * 0.6);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_ramp_ends_blue_and_red() {
        assert_eq!(heat_color(0.0), Color::srgb(0.0, 0.0, 1.0));
        let hot = heat_color(1.0).to_srgba();
        assert_eq!(hot.red, 1.0);
        assert!(hot.green < 1e-3);
        assert_eq!(hot.blue, 0.0);
        assert_eq!(heat_color(3.0), heat_color(1.0));
    }

    #[test]
    fn unknown_magnitude_is_grey() {
        assert_eq!(magnitude_color(None), Color::srgb(0.7, 0.7, 0.7));
    }

    #[test]
    fn retint_follows_magnitude_and_opacity() {
        let mut material = StandardMaterial::default();
        tint_marker(&mut material, Some(5.0), 0.0);
        let small = material.base_color;
        assert_eq!(small.alpha(), 0.0);

        tint_marker(&mut material, Some(8.0), 0.85);
        assert_eq!(material.base_color, magnitude_color(Some(8.0)).with_alpha(0.85));
        assert_ne!(material.base_color.with_alpha(0.0), small);
    }
}

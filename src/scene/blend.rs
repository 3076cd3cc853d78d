//! CPU reference for the transition blend.
//!
//! These functions compute exactly what the blend shader in
//! [`BlendPass`](super::BlendPass) computes per pixel, and are what the
//! compositor's invariants are tested against.

use glam::Vec4;

/// Parameters of one blend draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendParams {
    pub mix_ratio: f32,
    pub threshold: f32,
    pub use_mask: bool,
    pub mask: crate::ecs::TextureId,
}

/// Position of the wipe edge in mask-value space for a given mix ratio.
///
/// Sweeps from `-threshold` at `mix_ratio == 0` to `1 + threshold` at
/// `mix_ratio == 1`, so both ends of the transition fully clear the mask.
pub fn wipe_edge(mix_ratio: f32, threshold: f32) -> f32 {
    mix_ratio * (1.0 + threshold * 2.0) - threshold
}

/// How much of scene B shows through at a pixel whose mask red value is
/// `mask_red`.
///
/// Always within `[0, 1]`. A zero threshold gives a hard edge instead of a
/// division by zero, and NaN inputs resolve to scene A.
pub fn mask_blend_factor(mask_red: f32, mix_ratio: f32, threshold: f32) -> f32 {
    let factor = (mask_red - wipe_edge(mix_ratio, threshold)) * (1.0 / threshold);
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// Blend two texels the way the shader does.
///
/// With the mask: `lerp(a, b, factor)`. Without: `lerp(b, a, mix_ratio)`.
/// The operand order differs between the two paths on purpose.
pub fn blend_texel(a: Vec4, b: Vec4, mask_red: f32, mix_ratio: f32, threshold: f32, use_mask: bool) -> Vec4 {
    if use_mask {
        a.lerp(b, mask_blend_factor(mask_red, mix_ratio, threshold))
    } else {
        b.lerp(a, mix_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn early_wipe_shows_scene_b_fully() {
        assert!(close(wipe_edge(0.05, 0.1), -0.04));
        assert_eq!(mask_blend_factor(0.5, 0.05, 0.1), 1.0);
        assert_eq!(blend_texel(RED, BLUE, 0.5, 0.05, 0.1, true), BLUE);
    }

    #[test]
    fn late_wipe_shows_scene_a_fully() {
        assert!(close(wipe_edge(0.9, 0.1), 0.98));
        assert_eq!(mask_blend_factor(0.1, 0.9, 0.1), 0.0);
        assert_eq!(blend_texel(RED, BLUE, 0.1, 0.9, 0.1, true), RED);
    }

    #[test]
    fn factor_stays_in_unit_range() {
        let thresholds = [0.001, 0.1, 0.5, 3.2, 100.0];
        let masks = [-2.0, 0.0, 0.25, 0.5, 1.0, 7.0];
        for step in 0..=100 {
            let mix = step as f32 / 100.0;
            for &t in &thresholds {
                for &m in &masks {
                    let f = mask_blend_factor(m, mix, t);
                    assert!((0.0..=1.0).contains(&f), "mix={mix} t={t} m={m} -> {f}");
                }
            }
        }
    }

    #[test]
    fn zero_threshold_gives_hard_edge() {
        assert_eq!(mask_blend_factor(0.6, 0.5, 0.0), 1.0);
        assert_eq!(mask_blend_factor(0.4, 0.5, 0.0), 0.0);
        assert_eq!(mask_blend_factor(0.5, 0.5, 0.0), 0.0);
    }

    #[test]
    fn boundaries_clear_the_whole_mask() {
        for m in [0.0, 0.3, 1.0] {
            assert_eq!(mask_blend_factor(m, 0.0, 0.1), 1.0);
            assert_eq!(mask_blend_factor(m, 1.0, 0.1), 0.0);
        }
    }

    #[test]
    fn plain_crossfade_uses_reversed_order() {
        assert_eq!(blend_texel(RED, BLUE, 0.0, 0.0, 0.1, false), BLUE);
        assert_eq!(blend_texel(RED, BLUE, 0.0, 1.0, 0.1, false), RED);
        let half = blend_texel(RED, BLUE, 0.0, 0.5, 0.1, false);
        assert!(close(half.x, 0.5) && close(half.z, 0.5));
    }
}

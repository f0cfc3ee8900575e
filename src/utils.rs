use fastrand::Rng;
use ultraviolet::DVec3;

use crate::body::{Body, Color};

/// Uniformly distributed point inside the unit ball (rejection sampling).
pub fn random_in_unit_ball(rng: &mut Rng) -> DVec3 {
    loop {
        let p = DVec3::new(
            rng.f64() * 2.0 - 1.0,
            rng.f64() * 2.0 - 1.0,
            rng.f64() * 2.0 - 1.0,
        );
        if p.mag_sq() <= 1.0 {
            return p;
        }
    }
}

/// Radius in `[inner, outer]` distributed uniformly by area, as for a flat disc.
pub fn random_disc_radius(rng: &mut Rng, inner: f64, outer: f64) -> f64 {
    let t = inner / outer;
    let r = rng.f64() * (1.0 - t * t) + t * t;
    outer * r.sqrt()
}

/// Bright, saturated color with a random hue.
pub fn random_color(rng: &mut Rng) -> Color {
    hue_color(rng.f64())
}

/// Fully saturated color at `hue` in `[0, 1)`.
pub fn hue_color(hue: f64) -> Color {
    let h = hue.rem_euclid(1.0) * 6.0;
    let x = (1.0 - (h % 2.0 - 1.0).abs()) as f32;
    match h as u32 {
        0 => Color::new(1.0, x, 0.0),
        1 => Color::new(x, 1.0, 0.0),
        2 => Color::new(0.0, 1.0, x),
        3 => Color::new(0.0, x, 1.0),
        4 => Color::new(x, 0.0, 1.0),
        _ => Color::new(1.0, 0.0, x),
    }
}

/// Axis-aligned box around every existing body's sphere, scaled about its
/// center by `headroom`. Degenerate extents fall back to the largest one, so the
/// box never collapses to a plane.
pub fn display_bounds(bodies: &[Body], headroom: f64) -> (DVec3, DVec3) {
    let mut min = DVec3::broadcast(f64::INFINITY);
    let mut max = DVec3::broadcast(f64::NEG_INFINITY);
    for body in bodies.iter().filter(|b| b.exists) {
        let r = DVec3::broadcast(body.radius);
        min = min.min_by_component(body.position - r);
        max = max.max_by_component(body.position + r);
    }
    if min.x > max.x {
        return (DVec3::broadcast(-1.0), DVec3::broadcast(1.0));
    }

    let center = (min + max) * 0.5;
    let mut half = (max - min) * 0.5;
    let largest = half.x.max(half.y).max(half.z).max(1.0);
    for axis in [&mut half.x, &mut half.y, &mut half.z] {
        if *axis < largest * 1e-3 {
            *axis = largest;
        }
    }
    (center - half * headroom, center + half * headroom)
}

//! Pairwise interaction models.
//!
//! Every function here computes the acceleration induced on a `target` body by a
//! single `source` body. Displacements always point from target to source, so a
//! positive magnitude means attraction.

use std::f64::consts::PI;

use ultraviolet::DVec3;

use crate::body::Body;
use crate::config::{CollisionModel, GravityModel, PhysicsConfiguration};
use crate::error::StepFailure;

/// m³ kg⁻¹ s⁻²
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Relative radial speed the bounce cap may leave behind, as a fraction of the
/// speed before the step.
const BOUNCE_TOLERANCE: f64 = 1e-9;

/// Total acceleration on `target` from `source`: gravity plus any contact drag.
pub fn pairwise_acceleration(
    target: &Body,
    source: &Body,
    config: &PhysicsConfiguration,
) -> Result<DVec3, StepFailure> {
    let mut acc = gravity_acceleration(target, source, config);
    if config.collision_model == CollisionModel::Drag && target.overlaps(source) {
        acc += drag_acceleration(target, source, config.drag_coefficient, config.step_time)?;
    }
    Ok(acc)
}

/// Newtonian point-mass acceleration, `G·m·d/|d|³`.
///
/// Coincident positions yield NaN, which the integrator reports as a step failure.
#[inline(always)]
pub fn pointlike_acceleration(target: DVec3, source: DVec3, source_mass: f64) -> DVec3 {
    let d = source - target;
    let dist_sq = d.mag_sq();
    d * (GRAVITATIONAL_CONSTANT * source_mass / (dist_sq * dist_sq.sqrt()))
}

/// Gravity on `target` from `source` under the configured model.
///
/// Every model except [`GravityModel::None`] is plain point-mass gravity while the
/// bodies are apart. The overlapping regimes are skipped when either mass is zero.
pub fn gravity_acceleration(target: &Body, source: &Body, config: &PhysicsConfiguration) -> DVec3 {
    let kissing = target.radius + source.radius;
    let d = source.position - target.position;
    let distance = d.mag();

    match config.gravity_model {
        GravityModel::None => DVec3::zero(),
        GravityModel::NewtonPointlike => {
            pointlike_acceleration(target.position, source.position, source.mass)
        }
        _ if distance >= kissing => {
            pointlike_acceleration(target.position, source.position, source.mass)
        }
        _ if target.mass == 0.0 || source.mass == 0.0 => DVec3::zero(),
        GravityModel::NewtonLinearAfterTouching => {
            linear_after_touching(d, kissing, source.mass)
        }
        GravityModel::NewtonBuoyant => buoyant(
            d,
            distance,
            target.radius,
            source.radius,
            source.mass,
            config.buoyant_gravity_ratio,
        ),
    }
}

/// `(|d| / kissing) · a_kissing`, written without normalizing `d` so that
/// coincident centers give zero instead of NaN.
fn linear_after_touching(d: DVec3, kissing: f64, source_mass: f64) -> DVec3 {
    d * (GRAVITATIONAL_CONSTANT * source_mass / kissing.powi(3))
}

/// Signed magnitude along `d`:
/// - `[engulfment, kissing]`: from `-ratio·a_kissing` up to `a_kissing`
/// - `[0, engulfment)`: from zero down to `-ratio·a_kissing`
fn buoyant(
    d: DVec3,
    distance: f64,
    r1: f64,
    r2: f64,
    source_mass: f64,
    ratio: f64,
) -> DVec3 {
    if distance == 0.0 {
        return DVec3::zero();
    }
    let kissing = r1 + r2;
    let engulfment = (r1 - r2).abs();
    let at_kissing = GRAVITATIONAL_CONSTANT * source_mass / (kissing * kissing);
    let at_engulfment = -ratio * at_kissing;

    // distance < kissing here, so the outer segment has positive width whenever it is entered.
    let magnitude = if distance >= engulfment {
        let s = (distance - engulfment) / (kissing - engulfment);
        at_engulfment + s * (at_kissing - at_engulfment)
    } else {
        at_engulfment * distance / engulfment
    };
    d * (magnitude / distance)
}

/// Radial drag between overlapping bodies.
///
/// The force is `½·c·ρ·A·|v|²` against the relative velocity, with `ρ` the
/// combined density and `A` the cross-section of the smaller body, then reduced to
/// its component along the center line. If that force would flip the sign of the
/// radial relative velocity within `dt`, it is replaced by the force that brings
/// both bodies to their common momentum-conserving radial velocity.
pub fn drag_acceleration(
    target: &Body,
    source: &Body,
    coefficient: f64,
    dt: f64,
) -> Result<DVec3, StepFailure> {
    if target.mass == 0.0 || source.mass == 0.0 {
        return Ok(DVec3::zero());
    }
    let d = source.position - target.position;
    let distance = d.mag();
    let relative = target.velocity - source.velocity;
    let speed = relative.mag();
    if distance == 0.0 || speed == 0.0 {
        return Ok(DVec3::zero());
    }
    let axis = d / distance;

    let density = (target.mass + source.mass) / (target.volume() + source.volume());
    let area = PI * target.radius.min(source.radius).powi(2);
    let magnitude = 0.5 * coefficient * density * area * speed * speed;
    let mut radial_force = (relative * (-magnitude / speed)).dot(axis);

    let inverse_reduced_mass = 1.0 / target.mass + 1.0 / source.mass;
    let radial_speed = relative.dot(axis);
    let predicted = radial_speed + radial_force * dt * inverse_reduced_mass;

    if radial_speed * predicted < 0.0 {
        radial_force = -radial_speed / (dt * inverse_reduced_mass);
        let residual = radial_speed + radial_force * dt * inverse_reduced_mass;
        let reversed =
            radial_speed * residual < 0.0 && residual.abs() > BOUNCE_TOLERANCE * radial_speed.abs();
        if reversed || !residual.is_finite() {
            return Err(StepFailure::BounceCapFailed {
                body: target.id,
                other: source.id,
                residual,
            });
        }
    }

    Ok(axis * (radial_force / target.mass))
}

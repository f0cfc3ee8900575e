use std::f64::consts::PI;
use std::fmt;

use ultraviolet::DVec3;

use crate::config::PhysicsConfiguration;
use crate::error::StepFailure;
use crate::forces;

/// Stable identity of a body within one run.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing ids for the bodies of a single run.
/// Ids are never reused, even after a body stops existing.
#[derive(Clone, Debug, Default)]
pub struct BodyIdAllocator {
    next: u64,
}

impl BodyIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> BodyId {
        let id = BodyId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next
    }
}

/// Linear RGB color with channels in `[0, 1]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Volume of a sphere of radius `radius`.
pub fn sphere_volume(radius: f64) -> f64 {
    4.0 / 3.0 * PI * radius.powi(3)
}

/// Inverse of [`sphere_volume`].
pub fn sphere_radius(volume: f64) -> f64 {
    (volume * 3.0 / (4.0 * PI)).cbrt()
}

/// A massive sphere in the simulation.
///
/// Bodies that stop existing (absorbed by a merge) keep their slot so that
/// indices stay stable for the whole run.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub color: Color,
    /// kg
    pub mass: f64,
    /// m
    pub radius: f64,
    pub exists: bool,
    /// m
    pub position: DVec3,
    /// m/s
    pub velocity: DVec3,
}

impl Body {
    pub fn new(
        id: BodyId,
        name: impl Into<String>,
        color: Color,
        mass: f64,
        radius: f64,
        position: DVec3,
        velocity: DVec3,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            mass,
            radius,
            exists: true,
            position,
            velocity,
        }
    }

    pub fn volume(&self) -> f64 {
        sphere_volume(self.radius)
    }

    pub fn momentum(&self) -> DVec3 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.mag_sq()
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        (other.position - self.position).mag()
    }

    /// True when the two spheres interpenetrate (strictly closer than touching).
    pub fn overlaps(&self, other: &Body) -> bool {
        self.distance_to(other) < self.radius + other.radius
    }

    /// Sums the acceleration induced on this body by every other existing body.
    ///
    /// `bodies` may contain this body itself and non-existing bodies; both are skipped.
    /// The sum runs in slice order so repeated runs produce identical bits.
    pub fn compute_acceleration(
        &self,
        bodies: &[Body],
        config: &PhysicsConfiguration,
    ) -> Result<DVec3, StepFailure> {
        let mut acc = DVec3::zero();
        for other in bodies {
            if other.id == self.id || !other.exists {
                continue;
            }
            acc += forces::pairwise_acceleration(self, other, config)?;
        }
        Ok(acc)
    }

    /// Semi-implicit (symplectic) Euler: the position advances with the updated velocity.
    /// Returns `(position, velocity)` without touching `self`.
    pub fn compute_step(&self, dt: f64, acceleration: DVec3) -> Result<(DVec3, DVec3), StepFailure> {
        self.ensure_finite("acceleration", acceleration)?;
        let velocity = self.velocity + acceleration * dt;
        self.ensure_finite("velocity", velocity)?;
        let position = self.position + velocity * dt;
        self.ensure_finite("position", position)?;
        Ok((position, velocity))
    }

    /// Commits values produced by [`Body::compute_step`].
    pub fn step(&mut self, position: DVec3, velocity: DVec3) {
        self.position = position;
        self.velocity = velocity;
    }

    fn ensure_finite(&self, quantity: &'static str, v: DVec3) -> Result<(), StepFailure> {
        if v.x.is_finite() && v.y.is_finite() && v.z.is_finite() {
            Ok(())
        } else {
            Err(StepFailure::NonFinite {
                quantity,
                id: self.id,
                name: self.name.clone(),
            })
        }
    }
}

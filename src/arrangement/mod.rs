//! Initial conditions.
//!
//! An [`Arrangement`] is a parameterized, deterministic factory for the bodies a
//! run starts with. Building the same arrangement twice yields identical bodies;
//! randomized arrangements resolve their seed once, at construction, so the seed
//! can be recorded and replayed.

mod binary;
mod cloud;
mod disc;
mod explicit;

#[cfg(test)]
mod arrangement_test;

pub use binary::{BinaryStar, BinaryStarParams};
pub use cloud::{RandomCloud, RandomCloudParams};
pub use disc::{PlanetaryDisc, PlanetaryDiscParams};
pub use explicit::{BodySpec, ExplicitBodies};

use log::info;
use ultraviolet::DVec3;

use crate::body::{Body, BodyIdAllocator};
use crate::error::ArrangementError;

/// Display box scale relative to the tight bounds of the generated bodies.
const HEADROOM: f64 = 1.25;

/// Bodies and display box produced by [`Arrangement::build`].
#[derive(Clone, Debug, PartialEq)]
pub struct Setup {
    pub bodies: Vec<Body>,
    pub display_bound0: DVec3,
    pub display_bound1: DVec3,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arrangement {
    Explicit(ExplicitBodies),
    BinaryStar(BinaryStar),
    PlanetaryDisc(PlanetaryDisc),
    RandomCloud(RandomCloud),
}

impl Arrangement {
    pub fn name(&self) -> &'static str {
        match self {
            Arrangement::Explicit(_) => "explicit",
            Arrangement::BinaryStar(_) => "binary-star",
            Arrangement::PlanetaryDisc(_) => "planetary-disc",
            Arrangement::RandomCloud(_) => "random-cloud",
        }
    }

    /// Constructor arguments as name/value pairs, enough to rebuild the arrangement.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        match self {
            Arrangement::Explicit(a) => a.parameters(),
            Arrangement::BinaryStar(a) => a.parameters(),
            Arrangement::PlanetaryDisc(a) => a.parameters(),
            Arrangement::RandomCloud(a) => a.parameters(),
        }
    }

    pub fn parameter_lines(&self) -> Vec<String> {
        std::iter::once(format!("arrangement: {}", self.name()))
            .chain(
                self.parameters()
                    .into_iter()
                    .map(|(name, value)| format!("  {name}: {value}")),
            )
            .collect()
    }

    /// Seed actually in use, for randomized arrangements.
    pub fn seed(&self) -> Option<u64> {
        match self {
            Arrangement::Explicit(_) | Arrangement::BinaryStar(_) => None,
            Arrangement::PlanetaryDisc(a) => Some(a.seed()),
            Arrangement::RandomCloud(a) => Some(a.seed()),
        }
    }

    /// Produces the initial bodies, drawing their ids from `ids`.
    pub fn build(&self, ids: &mut BodyIdAllocator) -> Setup {
        match self {
            Arrangement::Explicit(a) => a.build(ids),
            Arrangement::BinaryStar(a) => a.build(ids),
            Arrangement::PlanetaryDisc(a) => a.build(ids),
            Arrangement::RandomCloud(a) => a.build(ids),
        }
    }
}

impl From<ExplicitBodies> for Arrangement {
    fn from(a: ExplicitBodies) -> Self {
        Arrangement::Explicit(a)
    }
}

impl From<BinaryStar> for Arrangement {
    fn from(a: BinaryStar) -> Self {
        Arrangement::BinaryStar(a)
    }
}

impl From<PlanetaryDisc> for Arrangement {
    fn from(a: PlanetaryDisc) -> Self {
        Arrangement::PlanetaryDisc(a)
    }
}

impl From<RandomCloud> for Arrangement {
    fn from(a: RandomCloud) -> Self {
        Arrangement::RandomCloud(a)
    }
}

/// Shifts every velocity by the center-of-mass velocity so the total momentum of
/// existing bodies is zero. Massless systems are left alone.
pub fn zero_net_momentum(bodies: &mut [Body]) {
    let mut mass = 0.0;
    let mut momentum = DVec3::zero();
    for body in bodies.iter().filter(|b| b.exists) {
        mass += body.mass;
        momentum += body.momentum();
    }
    if mass <= 0.0 {
        return;
    }
    let drift = momentum / mass;
    for body in bodies.iter_mut().filter(|b| b.exists) {
        body.velocity -= drift;
    }
}

fn resolve_seed(arrangement: &str, seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = fastrand::u64(..);
            info!("{arrangement}: using fresh seed {seed}");
            seed
        }
    }
}

fn ensure(valid: bool, name: &'static str, reason: &str) -> Result<(), ArrangementError> {
    if valid {
        Ok(())
    } else {
        Err(ArrangementError::new(name, reason))
    }
}

fn ensure_positive(name: &'static str, value: f64) -> Result<(), ArrangementError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ArrangementError::new(
            name,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

fn ensure_non_negative(name: &'static str, value: f64) -> Result<(), ArrangementError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ArrangementError::new(
            name,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

use std::f64::consts::TAU;

use fastrand::Rng;
use ultraviolet::DVec3;

use super::{HEADROOM, Setup, ensure, ensure_non_negative, ensure_positive, resolve_seed, zero_net_momentum};
use crate::body::{Body, BodyIdAllocator, Color};
use crate::error::ArrangementError;
use crate::forces::GRAVITATIONAL_CONSTANT;
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanetaryDiscParams {
    pub star_mass: f64,
    pub star_radius: f64,
    pub planet_count: usize,
    pub planet_mass: f64,
    pub planet_radius: f64,
    /// Orbits are sampled in `[inner_radius, outer_radius]`, m.
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Maximum height above or below the disc plane, m.
    pub thickness: f64,
}

impl Default for PlanetaryDiscParams {
    fn default() -> Self {
        Self {
            star_mass: 1.989e30,
            star_radius: 6.957e8,
            planet_count: 24,
            planet_mass: 5.972e24,
            planet_radius: 6.371e6,
            inner_radius: 5.0e10,
            outer_radius: 7.5e11,
            thickness: 1.0e9,
        }
    }
}

/// A central star with planets on near-circular orbits, scattered uniformly by
/// area over an annulus.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetaryDisc {
    params: PlanetaryDiscParams,
    seed: u64,
}

impl PlanetaryDisc {
    /// `seed: None` draws a fresh seed, available afterwards from [`PlanetaryDisc::seed`].
    pub fn new(params: PlanetaryDiscParams, seed: Option<u64>) -> Result<Self, ArrangementError> {
        ensure_positive("star_mass", params.star_mass)?;
        ensure_non_negative("star_radius", params.star_radius)?;
        ensure_non_negative("planet_mass", params.planet_mass)?;
        ensure_non_negative("planet_radius", params.planet_radius)?;
        ensure_positive("inner_radius", params.inner_radius)?;
        ensure_positive("outer_radius", params.outer_radius)?;
        ensure(
            params.outer_radius > params.inner_radius,
            "outer_radius",
            "must exceed inner_radius",
        )?;
        ensure_non_negative("thickness", params.thickness)?;
        Ok(Self {
            params,
            seed: resolve_seed("planetary-disc", seed),
        })
    }

    pub fn params(&self) -> &PlanetaryDiscParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let p = &self.params;
        vec![
            ("star_mass", format!("{:e} kg", p.star_mass)),
            ("star_radius", format!("{:e} m", p.star_radius)),
            ("planet_count", p.planet_count.to_string()),
            ("planet_mass", format!("{:e} kg", p.planet_mass)),
            ("planet_radius", format!("{:e} m", p.planet_radius)),
            ("inner_radius", format!("{:e} m", p.inner_radius)),
            ("outer_radius", format!("{:e} m", p.outer_radius)),
            ("thickness", format!("{:e} m", p.thickness)),
            ("seed", self.seed.to_string()),
        ]
    }

    pub fn build(&self, ids: &mut BodyIdAllocator) -> Setup {
        let p = &self.params;
        let mut rng = Rng::with_seed(self.seed);

        let mut planets: Vec<(DVec3, DVec3)> = (0..p.planet_count)
            .map(|_| {
                let (sin, cos) = (rng.f64() * TAU).sin_cos();
                let r = utils::random_disc_radius(&mut rng, p.inner_radius, p.outer_radius);
                let z = (rng.f64() * 2.0 - 1.0) * p.thickness;
                (DVec3::new(cos * r, sin * r, z), DVec3::new(-sin, cos, 0.0))
            })
            .collect();

        // Closest first, so each orbit sees the mass inside it.
        planets.sort_by(|a, b| a.0.mag_sq().total_cmp(&b.0.mag_sq()));

        let mut bodies = Vec::with_capacity(p.planet_count + 1);
        bodies.push(Body::new(
            ids.allocate(),
            "Star",
            Color::new(1.0, 0.95, 0.6),
            p.star_mass,
            p.star_radius,
            DVec3::zero(),
            DVec3::zero(),
        ));

        let mut enclosed = p.star_mass;
        for (i, (position, direction)) in planets.into_iter().enumerate() {
            let speed = (GRAVITATIONAL_CONSTANT * enclosed / position.mag()).sqrt();
            bodies.push(Body::new(
                ids.allocate(),
                format!("Planet {}", i + 1),
                utils::hue_color(i as f64 / p.planet_count as f64),
                p.planet_mass,
                p.planet_radius,
                position,
                direction * speed,
            ));
            enclosed += p.planet_mass;
        }

        zero_net_momentum(&mut bodies);
        let (display_bound0, display_bound1) = utils::display_bounds(&bodies, HEADROOM);
        Setup {
            bodies,
            display_bound0,
            display_bound1,
        }
    }
}

use fastrand::Rng;

use super::{HEADROOM, Setup, ensure, ensure_non_negative, ensure_positive, resolve_seed, zero_net_momentum};
use crate::body::{Body, BodyIdAllocator, sphere_radius};
use crate::error::ArrangementError;
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomCloudParams {
    pub count: usize,
    /// Radius of the ball the bodies start in, m.
    pub cloud_radius: f64,
    pub min_mass: f64,
    pub max_mass: f64,
    /// Shared by all bodies, kg/m³. Sets each radius from its mass.
    pub density: f64,
    /// Initial velocities are uniform in a ball of this radius, m/s.
    pub max_speed: f64,
}

impl Default for RandomCloudParams {
    fn default() -> Self {
        Self {
            count: 200,
            cloud_radius: 1.0e9,
            min_mass: 1.0e22,
            max_mass: 1.0e24,
            density: 3000.0,
            max_speed: 100.0,
        }
    }
}

/// Bodies scattered uniformly through a ball with random masses and velocities.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomCloud {
    params: RandomCloudParams,
    seed: u64,
}

impl RandomCloud {
    /// `seed: None` draws a fresh seed, available afterwards from [`RandomCloud::seed`].
    pub fn new(params: RandomCloudParams, seed: Option<u64>) -> Result<Self, ArrangementError> {
        ensure(params.count > 0, "count", "at least one body is required")?;
        ensure_positive("cloud_radius", params.cloud_radius)?;
        ensure_non_negative("min_mass", params.min_mass)?;
        ensure_non_negative("max_mass", params.max_mass)?;
        ensure(
            params.max_mass >= params.min_mass,
            "max_mass",
            "must not be below min_mass",
        )?;
        ensure_positive("density", params.density)?;
        ensure_non_negative("max_speed", params.max_speed)?;
        Ok(Self {
            params,
            seed: resolve_seed("random-cloud", seed),
        })
    }

    pub fn params(&self) -> &RandomCloudParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let p = &self.params;
        vec![
            ("count", p.count.to_string()),
            ("cloud_radius", format!("{:e} m", p.cloud_radius)),
            ("min_mass", format!("{:e} kg", p.min_mass)),
            ("max_mass", format!("{:e} kg", p.max_mass)),
            ("density", format!("{} kg/m3", p.density)),
            ("max_speed", format!("{} m/s", p.max_speed)),
            ("seed", self.seed.to_string()),
        ]
    }

    pub fn build(&self, ids: &mut BodyIdAllocator) -> Setup {
        let p = &self.params;
        let mut rng = Rng::with_seed(self.seed);

        let mut bodies: Vec<Body> = (0..p.count)
            .map(|i| {
                let mass = p.min_mass + rng.f64() * (p.max_mass - p.min_mass);
                let position = utils::random_in_unit_ball(&mut rng) * p.cloud_radius;
                let velocity = utils::random_in_unit_ball(&mut rng) * p.max_speed;
                let color = utils::random_color(&mut rng);
                Body::new(
                    ids.allocate(),
                    format!("Body {}", i + 1),
                    color,
                    mass,
                    sphere_radius(mass / p.density),
                    position,
                    velocity,
                )
            })
            .collect();

        zero_net_momentum(&mut bodies);
        let (display_bound0, display_bound1) = utils::display_bounds(&bodies, HEADROOM);
        Setup {
            bodies,
            display_bound0,
            display_bound1,
        }
    }
}

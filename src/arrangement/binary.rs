use ultraviolet::DVec3;

use super::{HEADROOM, Setup, ensure, ensure_non_negative, ensure_positive};
use crate::body::{Body, BodyIdAllocator, Color};
use crate::error::ArrangementError;
use crate::forces::GRAVITATIONAL_CONSTANT;
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinaryStarParams {
    pub primary_mass: f64,
    pub primary_radius: f64,
    pub secondary_mass: f64,
    pub secondary_radius: f64,
    /// Semi-major axis of the relative orbit, m.
    pub semi_major_axis: f64,
    pub eccentricity: f64,
}

impl Default for BinaryStarParams {
    /// Sun and a half-solar-mass companion 1 AU apart.
    fn default() -> Self {
        Self {
            primary_mass: 1.989e30,
            primary_radius: 6.957e8,
            secondary_mass: 0.9945e30,
            secondary_radius: 4.5e8,
            semi_major_axis: 1.496e11,
            eccentricity: 0.0,
        }
    }
}

/// Two stars on a Keplerian orbit about their barycenter, released at apoapsis.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryStar {
    params: BinaryStarParams,
}

impl BinaryStar {
    pub fn new(params: BinaryStarParams) -> Result<Self, ArrangementError> {
        ensure_non_negative("primary_mass", params.primary_mass)?;
        ensure_non_negative("secondary_mass", params.secondary_mass)?;
        ensure_positive("total mass", params.primary_mass + params.secondary_mass)?;
        ensure_non_negative("primary_radius", params.primary_radius)?;
        ensure_non_negative("secondary_radius", params.secondary_radius)?;
        ensure_positive("semi_major_axis", params.semi_major_axis)?;
        ensure(
            (0.0..1.0).contains(&params.eccentricity),
            "eccentricity",
            "must lie in [0, 1)",
        )?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &BinaryStarParams {
        &self.params
    }

    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let p = &self.params;
        vec![
            ("primary_mass", format!("{:e} kg", p.primary_mass)),
            ("primary_radius", format!("{:e} m", p.primary_radius)),
            ("secondary_mass", format!("{:e} kg", p.secondary_mass)),
            ("secondary_radius", format!("{:e} m", p.secondary_radius)),
            ("semi_major_axis", format!("{:e} m", p.semi_major_axis)),
            ("eccentricity", p.eccentricity.to_string()),
        ]
    }

    pub fn build(&self, ids: &mut BodyIdAllocator) -> Setup {
        let p = &self.params;
        let total = p.primary_mass + p.secondary_mass;
        let apoapsis = p.semi_major_axis * (1.0 + p.eccentricity);
        // vis-viva at apoapsis
        let speed = (GRAVITATIONAL_CONSTANT * total * (1.0 - p.eccentricity) / apoapsis).sqrt();

        let w1 = p.secondary_mass / total;
        let w2 = p.primary_mass / total;
        let bodies = vec![
            Body::new(
                ids.allocate(),
                "Primary",
                Color::new(1.0, 0.9, 0.5),
                p.primary_mass,
                p.primary_radius,
                DVec3::new(-w1 * apoapsis, 0.0, 0.0),
                DVec3::new(0.0, -w1 * speed, 0.0),
            ),
            Body::new(
                ids.allocate(),
                "Secondary",
                Color::new(1.0, 0.45, 0.2),
                p.secondary_mass,
                p.secondary_radius,
                DVec3::new(w2 * apoapsis, 0.0, 0.0),
                DVec3::new(0.0, w2 * speed, 0.0),
            ),
        ];

        // The orbit sweeps the full ellipse, not just the starting segment.
        let reach = apoapsis * HEADROOM;
        let (mut display_bound0, mut display_bound1) = utils::display_bounds(&bodies, HEADROOM);
        display_bound0.x = display_bound0.x.min(-reach);
        display_bound0.y = display_bound0.y.min(-reach);
        display_bound1.x = display_bound1.x.max(reach);
        display_bound1.y = display_bound1.y.max(reach);

        Setup {
            bodies,
            display_bound0,
            display_bound1,
        }
    }
}

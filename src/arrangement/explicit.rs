use ultraviolet::DVec3;

use super::{Setup, ensure, ensure_non_negative, ensure_positive, zero_net_momentum};
use crate::body::{Body, BodyIdAllocator, Color};
use crate::error::ArrangementError;
use crate::utils;

/// One body of an [`ExplicitBodies`] arrangement, before it has an id.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    pub name: String,
    pub color: Color,
    pub mass: f64,
    pub radius: f64,
    pub position: DVec3,
    pub velocity: DVec3,
}

impl BodySpec {
    pub fn new(name: impl Into<String>, mass: f64, radius: f64, position: DVec3, velocity: DVec3) -> Self {
        Self {
            name: name.into(),
            color: Color::WHITE,
            mass,
            radius,
            position,
            velocity,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Bodies given one by one, e.g. taken from an ephemeris.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplicitBodies {
    specs: Vec<BodySpec>,
    headroom: f64,
    zero_momentum: bool,
}

impl ExplicitBodies {
    pub fn new(specs: Vec<BodySpec>, headroom: f64, zero_momentum: bool) -> Result<Self, ArrangementError> {
        ensure(!specs.is_empty(), "specs", "at least one body is required")?;
        ensure_positive("headroom", headroom)?;
        for spec in &specs {
            ensure_non_negative("mass", spec.mass)?;
            ensure_non_negative("radius", spec.radius)?;
            let finite = [spec.position, spec.velocity]
                .iter()
                .all(|v| v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
            ensure(finite, "specs", &format!("{} has a non-finite position or velocity", spec.name))?;
        }
        Ok(Self {
            specs,
            headroom,
            zero_momentum,
        })
    }

    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("headroom", self.headroom.to_string()),
            ("zero_momentum", self.zero_momentum.to_string()),
        ];
        for spec in &self.specs {
            params.push((
                "body",
                format!(
                    "{} mass={:e} radius={:e} position=({:e}, {:e}, {:e}) velocity=({:e}, {:e}, {:e}) color={}",
                    spec.name,
                    spec.mass,
                    spec.radius,
                    spec.position.x,
                    spec.position.y,
                    spec.position.z,
                    spec.velocity.x,
                    spec.velocity.y,
                    spec.velocity.z,
                    spec.color,
                ),
            ));
        }
        params
    }

    pub fn build(&self, ids: &mut BodyIdAllocator) -> Setup {
        let mut bodies: Vec<Body> = self
            .specs
            .iter()
            .map(|spec| {
                Body::new(
                    ids.allocate(),
                    spec.name.clone(),
                    spec.color,
                    spec.mass,
                    spec.radius,
                    spec.position,
                    spec.velocity,
                )
            })
            .collect();
        if self.zero_momentum {
            zero_net_momentum(&mut bodies);
        }
        let (display_bound0, display_bound1) = utils::display_bounds(&bodies, self.headroom);
        Setup {
            bodies,
            display_bound0,
            display_bound1,
        }
    }
}

use crate::error::ConfigError;

/// How bodies attract each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GravityModel {
    /// No gravity at all.
    None,
    /// Point masses at every distance.
    #[default]
    NewtonPointlike,
    /// Point masses until the surfaces touch, then a linear fall-off to zero at the center.
    NewtonLinearAfterTouching,
    /// Point masses until touching, then a blend through zero into a capped repulsion
    /// at the engulfment distance, fading back to zero at the center.
    NewtonBuoyant,
}

impl GravityModel {
    pub const ALL: [GravityModel; 4] = [
        GravityModel::None,
        GravityModel::NewtonPointlike,
        GravityModel::NewtonLinearAfterTouching,
        GravityModel::NewtonBuoyant,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GravityModel::None => "none",
            GravityModel::NewtonPointlike => "newton-pointlike",
            GravityModel::NewtonLinearAfterTouching => "newton-linear-after-touching",
            GravityModel::NewtonBuoyant => "newton-buoyant",
        }
    }
}

impl TryFrom<u32> for GravityModel {
    type Error = ConfigError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        GravityModel::ALL
            .get(index as usize)
            .copied()
            .ok_or(ConfigError::UnknownModel {
                kind: "gravity",
                index,
            })
    }
}

/// What happens when bodies overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionModel {
    #[default]
    None,
    /// Overlapping groups merge into their heaviest member after each step.
    Combine,
    /// Overlapping pairs feel a radial drag force.
    Drag,
}

impl CollisionModel {
    pub const ALL: [CollisionModel; 3] = [
        CollisionModel::None,
        CollisionModel::Combine,
        CollisionModel::Drag,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CollisionModel::None => "none",
            CollisionModel::Combine => "combine",
            CollisionModel::Drag => "drag",
        }
    }
}

impl TryFrom<u32> for CollisionModel {
    type Error = ConfigError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        CollisionModel::ALL
            .get(index as usize)
            .copied()
            .ok_or(ConfigError::UnknownModel {
                kind: "collision",
                index,
            })
    }
}

/// Physical parameters of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfiguration {
    /// Seconds per step.
    pub step_time: f64,
    pub gravity_model: GravityModel,
    /// Repulsion at the engulfment distance, as a multiple of the attraction at
    /// the kissing distance. Only read by [`GravityModel::NewtonBuoyant`].
    pub buoyant_gravity_ratio: f64,
    pub collision_model: CollisionModel,
    /// Only read by [`CollisionModel::Drag`].
    pub drag_coefficient: f64,
}

impl Default for PhysicsConfiguration {
    fn default() -> Self {
        Self {
            step_time: 1.0,
            gravity_model: GravityModel::default(),
            buoyant_gravity_ratio: 1.0,
            collision_model: CollisionModel::default(),
            drag_coefficient: 1.0,
        }
    }
}

impl PhysicsConfiguration {
    pub fn new(step_time: f64, gravity_model: GravityModel, collision_model: CollisionModel) -> Self {
        Self {
            step_time,
            gravity_model,
            collision_model,
            ..Self::default()
        }
    }

    pub fn with_buoyant_gravity_ratio(mut self, ratio: f64) -> Self {
        self.buoyant_gravity_ratio = ratio;
        self
    }

    pub fn with_drag_coefficient(mut self, coefficient: f64) -> Self {
        self.drag_coefficient = coefficient;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_time.is_finite() && self.step_time > 0.0) {
            return Err(ConfigError::StepTime(self.step_time));
        }
        if !(self.buoyant_gravity_ratio.is_finite() && self.buoyant_gravity_ratio >= 0.0) {
            return Err(ConfigError::BuoyantRatio(self.buoyant_gravity_ratio));
        }
        if !(self.drag_coefficient.is_finite() && self.drag_coefficient >= 0.0) {
            return Err(ConfigError::DragCoefficient(self.drag_coefficient));
        }
        Ok(())
    }

    /// True when every pairwise interaction is plain point-mass gravity, so the
    /// acceleration can be handed to a [`crate::kernel::GravityKernel`].
    pub fn is_pointlike_only(&self) -> bool {
        self.gravity_model == GravityModel::NewtonPointlike
            && self.collision_model != CollisionModel::Drag
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("step time: {} s", self.step_time),
            format!("gravity model: {}", self.gravity_model.name()),
        ];
        if self.gravity_model == GravityModel::NewtonBuoyant {
            lines.push(format!("buoyant gravity ratio: {}", self.buoyant_gravity_ratio));
        }
        lines.push(format!("collision model: {}", self.collision_model.name()));
        if self.collision_model == CollisionModel::Drag {
            lines.push(format!("drag coefficient: {}", self.drag_coefficient));
        }
        lines
    }
}

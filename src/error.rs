use thiserror::Error;

use crate::body::BodyId;

/// Raised while computing the next state of a body. Aborts the step in flight.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFailure {
    #[error("non-finite {quantity} for body {id} ({name})")]
    NonFinite {
        quantity: &'static str,
        id: BodyId,
        name: String,
    },
    #[error("drag bounce cap between bodies {body} and {other} left residual radial speed {residual}")]
    BounceCapFailed {
        body: BodyId,
        other: BodyId,
        residual: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    #[error("overlap group {ids:?} has zero total mass")]
    MasslessGroup { ids: Vec<BodyId> },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("step time must be finite and positive, got {0}")]
    StepTime(f64),
    #[error("buoyant gravity ratio must be finite and non-negative, got {0}")]
    BuoyantRatio(f64),
    #[error("drag coefficient must be finite and non-negative, got {0}")]
    DragCoefficient(f64),
    #[error("unknown {kind} model index {index}")]
    UnknownModel { kind: &'static str, index: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid arrangement parameter `{name}`: {reason}")]
pub struct ArrangementError {
    pub name: &'static str,
    pub reason: String,
}

impl ArrangementError {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("step {step} failed: {source}")]
    Step {
        step: u64,
        #[source]
        source: StepFailure,
    },
    #[error("collision resolution failed at step {step}: {source}")]
    Collision {
        step: u64,
        #[source]
        source: CollisionError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Arrangement(#[from] ArrangementError),
    #[error("simulation halted after an earlier failure: {message}")]
    Halted { message: String },
}

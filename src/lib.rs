pub mod arrangement;
pub mod body;
pub mod c_api;
pub mod collision;
pub mod config;
pub mod error;
pub mod forces;
pub mod kernel;
pub mod simulation;
pub mod utils;

#[cfg(test)]
mod simulation_test;

pub use arrangement::{Arrangement, Setup};
pub use body::{Body, BodyId, BodyIdAllocator, Color};
pub use config::{CollisionModel, GravityModel, PhysicsConfiguration};
pub use error::{SimulationError, StepFailure};
pub use kernel::{GravityKernel, NativeKernel, ReferenceKernel};
pub use simulation::Simulation;

use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;
use ultraviolet::DVec3;

use crate::{
    arrangement::Arrangement,
    body::{Body, BodyIdAllocator},
    collision,
    config::{CollisionModel, PhysicsConfiguration},
    error::{ConfigError, SimulationError, StepFailure},
    kernel::GravityKernel,
};

/// Next `(position, velocity)` of every body slot; `None` for bodies that do not exist.
type Updates = Vec<Option<(DVec3, DVec3)>>;

/// Advances a set of bodies through discrete time steps.
///
/// Each step computes the next state of every body without touching any of them,
/// then commits all updates at once and finally merges overlapping bodies when
/// [`CollisionModel::Combine`] is active. A failed step leaves the bodies as they
/// were after the previous step and halts the simulation for good.
pub struct Simulation {
    arrangement: Arrangement,
    physics: PhysicsConfiguration,
    initial_bodies: Arc<[Body]>,
    bodies: Vec<Body>,
    ids: BodyIdAllocator,
    display_bound0: DVec3,
    display_bound1: DVec3,
    num_steps_performed: u64,
    latest_error: Option<String>,
    /// Used for the force sum whenever the physics reduces to point-mass gravity.
    kernel: Option<Arc<dyn GravityKernel>>,
    /// Whether to spread the compute phase over the Rayon thread pool.
    use_rayon: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("arrangement", &self.arrangement.name())
            .field("physics", &self.physics)
            .field("bodies", &self.bodies.len())
            .field("num_steps_performed", &self.num_steps_performed)
            .field("latest_error", &self.latest_error)
            .field("kernel", &self.kernel.as_ref().map(|k| k.name().to_owned()))
            .field("use_rayon", &self.use_rayon)
            .finish()
    }
}

impl Simulation {
    /// Builds the arrangement and validates the physics. Body ids come from a fresh
    /// counter owned by this simulation.
    pub fn new(
        arrangement: impl Into<Arrangement>,
        physics: PhysicsConfiguration,
    ) -> Result<Self, SimulationError> {
        physics.validate()?;
        let arrangement = arrangement.into();
        let mut ids = BodyIdAllocator::new();
        let setup = arrangement.build(&mut ids);

        info!(
            "new {} simulation: {} bodies, gravity {}, collisions {}, dt {} s",
            arrangement.name(),
            setup.bodies.len(),
            physics.gravity_model.name(),
            physics.collision_model.name(),
            physics.step_time
        );
        if let Some(seed) = arrangement.seed() {
            info!("{} seed: {seed}", arrangement.name());
        }

        Ok(Self {
            arrangement,
            physics,
            initial_bodies: setup.bodies.clone().into(),
            bodies: setup.bodies,
            ids,
            display_bound0: setup.display_bound0,
            display_bound1: setup.display_bound1,
            num_steps_performed: 0,
            latest_error: None,
            kernel: None,
            use_rayon: false,
        })
    }

    pub fn with_kernel(mut self, kernel: Arc<dyn GravityKernel>) -> Self {
        self.set_kernel(Some(kernel));
        self
    }

    /// Installs (or removes) the accelerated force routine. An unavailable kernel
    /// is kept but ignored; forces are then summed by the bodies themselves.
    pub fn set_kernel(&mut self, kernel: Option<Arc<dyn GravityKernel>>) {
        if let Some(kernel) = &kernel {
            if !kernel.is_available() {
                warn!(
                    "gravity kernel `{}` is unavailable, falling back to the built-in sum",
                    kernel.name()
                );
            }
        }
        self.kernel = kernel;
    }

    /// Sets whether to use Rayon for the compute phase. Results do not depend on it.
    pub fn set_use_rayon(&mut self, use_rayon: bool) {
        self.use_rayon = use_rayon;
    }

    /// Replaces the physics for subsequent steps. Simulation time stays
    /// `num_steps_performed × step_time` with the new step time.
    pub fn set_physics(&mut self, physics: PhysicsConfiguration) -> Result<(), ConfigError> {
        physics.validate()?;
        info!("physics changed at step {}", self.num_steps_performed);
        self.physics = physics;
        Ok(())
    }

    /// Runs `steps` steps. Stops at the first failure, which is recorded and makes
    /// every later call fail with [`SimulationError::Halted`].
    pub fn leap(&mut self, steps: u64) -> Result<(), SimulationError> {
        if let Some(message) = &self.latest_error {
            return Err(SimulationError::Halted {
                message: message.clone(),
            });
        }
        for _ in 0..steps {
            if let Err(err) = self.step() {
                let message = err.to_string();
                warn!("simulation halted: {message}");
                self.latest_error = Some(message);
                return Err(err);
            }
        }
        debug!(
            "leap of {steps} steps done, step {} t = {} s, {} bodies exist",
            self.num_steps_performed,
            self.t(),
            self.existing_bodies().count()
        );
        Ok(())
    }

    /// Like [`Simulation::leap`], reporting success instead of the error. The message
    /// stays available from [`Simulation::latest_error_message`].
    pub fn try_leap(&mut self, steps: u64) -> bool {
        self.leap(steps).is_ok()
    }

    fn step(&mut self) -> Result<(), SimulationError> {
        let step = self.num_steps_performed + 1;
        let updates = self
            .compute_updates()
            .map_err(|source| SimulationError::Step { step, source })?;

        let merges = match self.physics.collision_model {
            CollisionModel::Combine => collision::plan_merges(&self.bodies, &updates)
                .map_err(|source| SimulationError::Collision { step, source })?,
            CollisionModel::None | CollisionModel::Drag => Vec::new(),
        };

        for (body, update) in self.bodies.iter_mut().zip(updates) {
            if let Some((position, velocity)) = update {
                body.step(position, velocity);
            }
        }
        collision::apply_merges(&mut self.bodies, merges);

        self.num_steps_performed = step;
        Ok(())
    }

    /// Compute phase: reads every body, writes none. The lowest failing index
    /// decides the reported error, whatever the number of workers.
    fn compute_updates(&self) -> Result<Updates, StepFailure> {
        let dt = self.physics.step_time;
        let kernel = self.active_kernel();

        let mut masses = Vec::new();
        let mut positions = Vec::new();
        let mut slots = vec![usize::MAX; self.bodies.len()];
        if kernel.is_some() {
            for (i, body) in self.bodies.iter().enumerate().filter(|(_, b)| b.exists) {
                slots[i] = masses.len();
                masses.push(body.mass);
                positions.push(body.position);
            }
        }

        let compute = |(i, body): (usize, &Body)| {
            if !body.exists {
                return None;
            }
            let acceleration = match kernel {
                Some(kernel) => Ok(kernel.acceleration(&masses, &positions, slots[i])),
                None => body.compute_acceleration(&self.bodies, &self.physics),
            };
            Some(acceleration.and_then(|a| body.compute_step(dt, a)))
        };

        let results: Vec<_> = if self.use_rayon {
            self.bodies.par_iter().enumerate().map(compute).collect()
        } else {
            self.bodies.iter().enumerate().map(compute).collect()
        };
        results.into_iter().map(Option::transpose).collect()
    }

    fn active_kernel(&self) -> Option<&dyn GravityKernel> {
        if !self.physics.is_pointlike_only() {
            return None;
        }
        self.kernel.as_deref().filter(|kernel| kernel.is_available())
    }

    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    pub fn physics(&self) -> &PhysicsConfiguration {
        &self.physics
    }

    /// Every body slot, including bodies that no longer exist.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn existing_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|body| body.exists)
    }

    /// Bodies as the arrangement produced them.
    pub fn initial_bodies(&self) -> &Arc<[Body]> {
        &self.initial_bodies
    }

    /// Number of body ids handed out in this run.
    pub fn ids_allocated(&self) -> u64 {
        self.ids.allocated()
    }

    pub fn num_steps_performed(&self) -> u64 {
        self.num_steps_performed
    }

    /// Simulation time in seconds.
    pub fn t(&self) -> f64 {
        self.num_steps_performed as f64 * self.physics.step_time
    }

    pub fn display_bound0(&self) -> DVec3 {
        self.display_bound0
    }

    pub fn display_bound1(&self) -> DVec3 {
        self.display_bound1
    }

    pub fn has_error(&self) -> bool {
        self.latest_error.is_some()
    }

    pub fn latest_error_message(&self) -> Option<&str> {
        self.latest_error.as_deref()
    }

    pub fn seed(&self) -> Option<u64> {
        self.arrangement.seed()
    }

    pub fn total_mass(&self) -> f64 {
        self.existing_bodies().map(|body| body.mass).sum()
    }

    pub fn total_momentum(&self) -> DVec3 {
        self.existing_bodies()
            .fold(DVec3::zero(), |acc, body| acc + body.momentum())
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.existing_bodies().map(Body::kinetic_energy).sum()
    }

    /// Mass-weighted mean position, or `None` for a massless system.
    pub fn center_of_mass(&self) -> Option<DVec3> {
        let mass = self.total_mass();
        if mass <= 0.0 {
            return None;
        }
        let weighted = self
            .existing_bodies()
            .fold(DVec3::zero(), |acc, body| acc + body.position * body.mass);
        Some(weighted / mass)
    }

    /// Arrangement parameters followed by the physics configuration.
    pub fn config_lines(&self) -> Vec<String> {
        let mut lines = self.arrangement.parameter_lines();
        lines.push("physics:".to_owned());
        lines.extend(
            self.physics
                .summary_lines()
                .into_iter()
                .map(|line| format!("  {line}")),
        );
        lines
    }

    pub fn state_lines(&self) -> Vec<String> {
        let p = self.total_momentum();
        let mut lines = vec![
            format!("step: {}", self.num_steps_performed),
            format!("t: {} s", self.t()),
            format!(
                "bodies: {} of {} exist",
                self.existing_bodies().count(),
                self.bodies.len()
            ),
            format!("total mass: {:e} kg", self.total_mass()),
            format!("total momentum: ({:e}, {:e}, {:e}) kg m/s", p.x, p.y, p.z),
            format!("kinetic energy: {:e} J", self.kinetic_energy()),
        ];
        if let Some(message) = &self.latest_error {
            lines.push(format!("error: {message}"));
        }
        lines
    }
}

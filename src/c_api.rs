use std::sync::Arc;

use crate::{
    arrangement::{PlanetaryDisc, PlanetaryDiscParams, RandomCloud, RandomCloudParams},
    config::{CollisionModel, GravityModel, PhysicsConfiguration},
    kernel::{self, NativeKernel},
    simulation::Simulation,
};

/// Snapshot of one body slot for hosts that cannot read Rust structs.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct BodyState {
    pub id: u64,
    pub exists: bool,
    pub mass: f64,
    pub radius: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub color: [f32; 3],
}

fn physics_from_raw(
    step_time: f64,
    gravity_model: u32,
    collision_model: u32,
) -> Option<PhysicsConfiguration> {
    let gravity = GravityModel::try_from(gravity_model).ok()?;
    let collision = CollisionModel::try_from(collision_model).ok()?;
    Some(PhysicsConfiguration::new(step_time, gravity, collision))
}

fn into_handle(sim: Simulation) -> *mut Simulation {
    let sim = sim.with_kernel(Arc::new(NativeKernel::builtin()));
    Box::into_raw(Box::new(sim))
}

/// Installs `env_logger` so library logs reach the host's console. Safe to call twice.
#[unsafe(no_mangle)]
pub extern "C" fn NBody_InitLogging() {
    let _ = env_logger::try_init();
}

/// Returns null if any parameter is invalid. `seed == 0` draws a fresh seed.
#[unsafe(no_mangle)]
pub extern "C" fn Simulation_CreateRandomCloud(
    count: usize,
    seed: u64,
    step_time: f64,
    gravity_model: u32,
    collision_model: u32,
) -> *mut Simulation {
    let Some(physics) = physics_from_raw(step_time, gravity_model, collision_model) else {
        return std::ptr::null_mut();
    };
    let params = RandomCloudParams {
        count,
        ..RandomCloudParams::default()
    };
    let seed = (seed != 0).then_some(seed);
    match RandomCloud::new(params, seed).map_err(Into::into).and_then(|a| Simulation::new(a, physics)) {
        Ok(sim) => into_handle(sim),
        Err(err) => {
            log::warn!("Simulation_CreateRandomCloud: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Returns null if any parameter is invalid. `seed == 0` draws a fresh seed.
#[unsafe(no_mangle)]
pub extern "C" fn Simulation_CreatePlanetaryDisc(
    planet_count: usize,
    seed: u64,
    step_time: f64,
    gravity_model: u32,
    collision_model: u32,
) -> *mut Simulation {
    let Some(physics) = physics_from_raw(step_time, gravity_model, collision_model) else {
        return std::ptr::null_mut();
    };
    let params = PlanetaryDiscParams {
        planet_count,
        ..PlanetaryDiscParams::default()
    };
    let seed = (seed != 0).then_some(seed);
    match PlanetaryDisc::new(params, seed).map_err(Into::into).and_then(|a| Simulation::new(a, physics)) {
        Ok(sim) => into_handle(sim),
        Err(err) => {
            log::warn!("Simulation_CreatePlanetaryDisc: {err}");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Destroy(handle: *mut Simulation) {
    if !handle.is_null() {
        unsafe { drop(Box::from_raw(handle)) };
    }
}

/// Returns whether all `steps` steps completed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_TryLeap(handle: *mut Simulation, steps: u64) -> bool {
    unsafe { handle.as_mut() }.is_some_and(|sim| sim.try_leap(steps))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_SetParallel(handle: *mut Simulation, parallel: bool) {
    if let Some(sim) = unsafe { handle.as_mut() } {
        sim.set_use_rayon(parallel);
    }
}

/// Number of body slots, including bodies that no longer exist.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetBodyCount(handle: *const Simulation) -> usize {
    unsafe { handle.as_ref() }.map_or(0, |sim| sim.bodies().len())
}

/// Copies slot `index` into `out`. Returns false for a bad handle or index.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetBodyState(
    handle: *const Simulation,
    index: usize,
    out: *mut BodyState,
) -> bool {
    let (Some(sim), Some(out)) = (unsafe { handle.as_ref() }, unsafe { out.as_mut() }) else {
        return false;
    };
    let Some(body) = sim.bodies().get(index) else {
        return false;
    };
    *out = BodyState {
        id: body.id.0,
        exists: body.exists,
        mass: body.mass,
        radius: body.radius,
        position: [body.position.x, body.position.y, body.position.z],
        velocity: [body.velocity.x, body.velocity.y, body.velocity.z],
        color: [body.color.r, body.color.g, body.color.b],
    };
    true
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetStepCount(handle: *const Simulation) -> u64 {
    unsafe { handle.as_ref() }.map_or(0, |sim| sim.num_steps_performed())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetTime(handle: *const Simulation) -> f64 {
    unsafe { handle.as_ref() }.map_or(0.0, |sim| sim.t())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_HasError(handle: *const Simulation) -> bool {
    unsafe { handle.as_ref() }.is_none_or(|sim| sim.has_error())
}

/// Writes the NUL-terminated error message into `buffer`, truncated to fit.
/// Returns the full message length in bytes, or 0 when there is no error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetErrorMessage(
    handle: *const Simulation,
    buffer: *mut u8,
    capacity: usize,
) -> usize {
    let Some(message) = unsafe { handle.as_ref() }.and_then(|sim| sim.latest_error_message()) else {
        return 0;
    };
    if !buffer.is_null() && capacity > 0 {
        let mut n = message.len().min(capacity - 1);
        while !message.is_char_boundary(n) {
            n -= 1;
        }
        unsafe {
            std::ptr::copy_nonoverlapping(message.as_ptr(), buffer, n);
            buffer.add(n).write(0);
        }
    }
    message.len()
}

/// Writes the display box corners into `bound0[0..3]` and `bound1[0..3]`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetDisplayBounds(
    handle: *const Simulation,
    bound0: *mut f64,
    bound1: *mut f64,
) -> bool {
    let Some(sim) = (unsafe { handle.as_ref() }) else {
        return false;
    };
    if bound0.is_null() || bound1.is_null() {
        return false;
    }
    let (b0, b1) = (sim.display_bound0(), sim.display_bound1());
    unsafe {
        std::ptr::copy_nonoverlapping([b0.x, b0.y, b0.z].as_ptr(), bound0, 3);
        std::ptr::copy_nonoverlapping([b1.x, b1.y, b1.z].as_ptr(), bound1, 3);
    }
    true
}

/// Point-mass gravitational acceleration of body `index` from the other `count - 1`
/// bodies. `positions` holds packed `x, y, z` triples. Writes zero for bad input.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nbody_pointlike_acceleration(
    masses: *const f64,
    positions: *const f64,
    count: usize,
    index: usize,
    out: *mut f64,
) {
    if out.is_null() {
        return;
    }
    let acc = if masses.is_null() || positions.is_null() || index >= count {
        [0.0; 3]
    } else {
        let masses = unsafe { std::slice::from_raw_parts(masses, count) };
        let positions = unsafe { std::slice::from_raw_parts(positions, count * 3) };
        let a = kernel::four_lane_acceleration(masses, positions, index);
        [a.x, a.y, a.z]
    };
    unsafe { std::ptr::copy_nonoverlapping(acc.as_ptr(), out, 3) };
}

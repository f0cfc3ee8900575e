//! Interchangeable implementations of the point-mass gravity sum.
//!
//! The engine hands a kernel the masses and positions of all existing bodies and
//! asks for the acceleration of one of them. Kernels only ever substitute for
//! [`forces::pointlike_acceleration`] summed over every other body; they never
//! change the physics.

use ultraviolet::DVec3;

use crate::forces;

/// Signature of an external routine computing the point-mass acceleration of
/// body `index`. `positions` holds `count` packed `x, y, z` triples and the result
/// is written to `out[0..3]`.
pub type NativeGravityFn = unsafe extern "C" fn(
    masses: *const f64,
    positions: *const f64,
    count: usize,
    index: usize,
    out: *mut f64,
);

pub trait GravityKernel: Send + Sync {
    fn name(&self) -> &str;

    /// Kernels that cannot run report `false` and the engine computes forces itself.
    fn is_available(&self) -> bool {
        true
    }

    /// Acceleration of `positions[index]` due to every other entry.
    fn acceleration(&self, masses: &[f64], positions: &[DVec3], index: usize) -> DVec3;
}

/// Same formula and summation order as [`crate::body::Body::compute_acceleration`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceKernel;

impl GravityKernel for ReferenceKernel {
    fn name(&self) -> &str {
        "reference"
    }

    fn acceleration(&self, masses: &[f64], positions: &[DVec3], index: usize) -> DVec3 {
        let target = positions[index];
        let mut acc = DVec3::zero();
        for (j, (&mass, &position)) in masses.iter().zip(positions).enumerate() {
            if j == index {
                continue;
            }
            acc += forces::pointlike_acceleration(target, position, mass);
        }
        acc
    }
}

/// Wraps an optional C ABI routine. Without one, it behaves as [`ReferenceKernel`]
/// and reports itself unavailable.
#[derive(Clone, Copy, Debug)]
pub struct NativeKernel {
    routine: Option<NativeGravityFn>,
}

impl NativeKernel {
    pub fn new(routine: Option<NativeGravityFn>) -> Self {
        Self { routine }
    }

    /// The routine this library exports as `nbody_pointlike_acceleration`.
    pub fn builtin() -> Self {
        Self::new(Some(crate::c_api::nbody_pointlike_acceleration))
    }
}

impl GravityKernel for NativeKernel {
    fn name(&self) -> &str {
        "native"
    }

    fn is_available(&self) -> bool {
        self.routine.is_some()
    }

    fn acceleration(&self, masses: &[f64], positions: &[DVec3], index: usize) -> DVec3 {
        let Some(routine) = self.routine else {
            return ReferenceKernel.acceleration(masses, positions, index);
        };
        let count = masses.len().min(positions.len());
        if index >= count {
            return DVec3::zero();
        }
        let mut out = [0.0f64; 3];
        // SAFETY: DVec3 is #[repr(C)] with three f64 fields, so `positions` is a packed
        // array of `count` xyz triples. `out` has room for three values.
        unsafe {
            routine(
                masses.as_ptr(),
                positions.as_ptr() as *const f64,
                count,
                index,
                out.as_mut_ptr(),
            );
        }
        DVec3::new(out[0], out[1], out[2])
    }
}

/// Point-mass sum over packed `x, y, z` positions using four independent
/// accumulators, which lets the compiler overlap the divisions.
pub fn four_lane_acceleration(masses: &[f64], positions: &[f64], index: usize) -> DVec3 {
    let at = |i: usize| DVec3::new(positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]);
    let count = masses.len().min(positions.len() / 3);
    if index >= count {
        return DVec3::zero();
    }
    let target = at(index);
    let mut lanes = [DVec3::zero(); 4];
    for j in 0..count {
        if j == index {
            continue;
        }
        lanes[j & 3] += forces::pointlike_acceleration(target, at(j), masses[j]);
    }
    (lanes[0] + lanes[1]) + (lanes[2] + lanes[3])
}

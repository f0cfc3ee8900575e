//! Overlap detection and merging for [`CollisionModel::Combine`](crate::config::CollisionModel).
//!
//! Overlapping bodies form an undirected graph. Every connected component with
//! more than one member collapses into its heaviest body, conserving mass,
//! momentum and volume.

use broccoli::aabb::Rect;
use log::debug;
use ultraviolet::DVec3;

use crate::body::{Body, Color, sphere_radius, sphere_volume};
use crate::error::CollisionError;

/// Relative padding applied when rounding bounds to `f32` for the broad phase.
const BROAD_PHASE_PADDING: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: DVec3,
    pub radius: f64,
}

/// Result of merging one overlap group, computed before anything is written back.
#[derive(Clone, Debug, PartialEq)]
pub struct Merge {
    /// Index of the body that survives.
    pub survivor: usize,
    /// Indices of the bodies that stop existing.
    pub absorbed: Vec<usize>,
    pub mass: f64,
    pub radius: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    pub color: Color,
}

/// Merges every overlap group in place. Returns the number of bodies absorbed.
pub fn combine(bodies: &mut [Body]) -> Result<usize, CollisionError> {
    let states: Vec<_> = bodies
        .iter()
        .map(|body| body.exists.then_some((body.position, body.velocity)))
        .collect();
    let merges = plan_merges(bodies, &states)?;
    Ok(apply_merges(bodies, merges))
}

/// Plans the merges implied by `states`, the `(position, velocity)` each body will
/// have (`None` for bodies that do not exist). Bodies themselves are not touched.
pub fn plan_merges(
    bodies: &[Body],
    states: &[Option<(DVec3, DVec3)>],
) -> Result<Vec<Merge>, CollisionError> {
    let spheres: Vec<_> = bodies
        .iter()
        .zip(states)
        .map(|(body, state)| {
            state.map(|(center, _)| Sphere {
                center,
                radius: body.radius,
            })
        })
        .collect();

    let mut merges = Vec::new();
    for group in overlap_groups(&spheres) {
        let total_mass: f64 = group.iter().map(|&i| bodies[i].mass).sum();
        if total_mass == 0.0 {
            return Err(CollisionError::MasslessGroup {
                ids: group.iter().map(|&i| bodies[i].id).collect(),
            });
        }

        // Groups are sorted, so ties keep the lowest index.
        let mut survivor = group[0];
        let mut position = DVec3::zero();
        let mut velocity = DVec3::zero();
        let mut color = [0.0f64; 3];
        let mut volume = 0.0;
        for &i in &group {
            let body = &bodies[i];
            if body.mass > bodies[survivor].mass {
                survivor = i;
            }
            if let Some((p, v)) = states[i] {
                position += p * body.mass;
                velocity += v * body.mass;
            }
            color[0] += f64::from(body.color.r) * body.mass;
            color[1] += f64::from(body.color.g) * body.mass;
            color[2] += f64::from(body.color.b) * body.mass;
            volume += sphere_volume(body.radius);
        }

        merges.push(Merge {
            survivor,
            absorbed: group.iter().copied().filter(|&i| i != survivor).collect(),
            mass: total_mass,
            radius: sphere_radius(volume),
            position: position / total_mass,
            velocity: velocity / total_mass,
            color: Color::new(
                (color[0] / total_mass) as f32,
                (color[1] / total_mass) as f32,
                (color[2] / total_mass) as f32,
            ),
        });
    }
    Ok(merges)
}

/// Writes planned merges back. Returns the number of bodies absorbed.
pub fn apply_merges(bodies: &mut [Body], merges: Vec<Merge>) -> usize {
    let mut absorbed = 0;
    for merge in merges {
        for &i in &merge.absorbed {
            bodies[i].exists = false;
        }
        absorbed += merge.absorbed.len();

        let survivor = &mut bodies[merge.survivor];
        debug!(
            "body {} absorbed {} bodies, mass now {:e} kg",
            survivor.id,
            merge.absorbed.len(),
            merge.mass
        );
        survivor.mass = merge.mass;
        survivor.radius = merge.radius;
        survivor.position = merge.position;
        survivor.velocity = merge.velocity;
        survivor.color = merge.color;
    }
    absorbed
}

/// Connected components of the overlap graph with at least two members.
/// Members are sorted by index and groups by their first member.
pub fn overlap_groups(spheres: &[Option<Sphere>]) -> Vec<Vec<usize>> {
    let mut sets = DisjointSets::new(spheres.len());
    for (i, j) in overlapping_pairs(spheres) {
        sets.union(i, j);
    }

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); spheres.len()];
    for (i, sphere) in spheres.iter().enumerate() {
        if sphere.is_some() {
            let root = sets.find(i);
            groups[root].push(i);
        }
    }
    let mut groups: Vec<_> = groups.into_iter().filter(|g| g.len() > 1).collect();
    groups.sort_by_key(|g| g[0]);
    groups
}

/// Pairs `(i, j)` with `i < j` whose spheres interpenetrate, sorted.
///
/// Candidates come from a broad phase over the x/y bounding rectangles; each is
/// confirmed with the exact 3D distance test. Bounds that do not fit in `f32`
/// switch candidate generation to all pairs.
pub fn overlapping_pairs(spheres: &[Option<Sphere>]) -> Vec<(usize, usize)> {
    let mut rects = spheres
        .iter()
        .enumerate()
        .filter_map(|(index, sphere)| {
            let sphere = sphere.as_ref()?;
            let (x0, x1) = widen(sphere.center.x, sphere.radius);
            let (y0, y1) = widen(sphere.center.y, sphere.radius);
            Some((Rect::new(x0, x1, y0, y1), index))
        })
        .collect::<Vec<_>>();

    let representable = rects.iter().all(|(rect, _)| {
        [rect.x.start, rect.x.end, rect.y.start, rect.y.end]
            .iter()
            .all(|bound| bound.is_finite())
    });

    let mut candidates = Vec::new();
    if representable {
        let mut broccoli = broccoli::Tree::new(&mut rects);
        broccoli.find_colliding_pairs(|a, b| {
            let i = *a.unpack_inner();
            let j = *b.unpack_inner();
            candidates.push((i.min(j), i.max(j)));
        });
    } else {
        debug!("broad phase bounds exceed f32 range, testing all pairs");
        for (n, &(_, i)) in rects.iter().enumerate() {
            for &(_, j) in &rects[n + 1..] {
                candidates.push((i.min(j), i.max(j)));
            }
        }
    }

    candidates.sort_unstable();
    candidates.dedup();
    candidates.retain(|&(i, j)| match (&spheres[i], &spheres[j]) {
        (Some(a), Some(b)) => (b.center - a.center).mag() < a.radius + b.radius,
        _ => false,
    });
    candidates
}

/// `[center - radius, center + radius]` rounded outwards to `f32`.
fn widen(center: f64, radius: f64) -> (f32, f32) {
    let lo = center - radius;
    let hi = center + radius;
    let pad = (lo.abs().max(hi.abs()) + radius) * BROAD_PHASE_PADDING;
    ((lo - pad) as f32, (hi + pad) as f32)
}

/// Union-find with path halving; no recursion.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

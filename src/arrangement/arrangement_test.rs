use approx::assert_relative_eq;
use ultraviolet::DVec3;

use crate::arrangement::{
    Arrangement, BinaryStar, BinaryStarParams, BodySpec, ExplicitBodies, PlanetaryDisc,
    PlanetaryDiscParams, RandomCloud, RandomCloudParams, zero_net_momentum,
};
use crate::body::{BodyId, BodyIdAllocator};
use crate::forces::GRAVITATIONAL_CONSTANT;

fn momentum(arrangement: &Arrangement) -> (DVec3, f64) {
    let setup = arrangement.build(&mut BodyIdAllocator::new());
    let mut total = DVec3::zero();
    let mut scale = 0.0;
    for body in &setup.bodies {
        total += body.momentum();
        scale += body.momentum().mag();
    }
    (total, scale)
}

fn all() -> Vec<Arrangement> {
    vec![
        ExplicitBodies::new(
            vec![
                BodySpec::new("a", 2.0, 0.1, DVec3::new(-1.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)),
                BodySpec::new("b", 1.0, 0.1, DVec3::new(1.0, 0.0, 0.0), DVec3::zero()),
            ],
            1.5,
            true,
        )
        .unwrap()
        .into(),
        BinaryStar::new(BinaryStarParams {
            eccentricity: 0.3,
            ..BinaryStarParams::default()
        })
        .unwrap()
        .into(),
        PlanetaryDisc::new(PlanetaryDiscParams::default(), Some(11)).unwrap().into(),
        RandomCloud::new(RandomCloudParams::default(), Some(12)).unwrap().into(),
    ]
}

#[test]
fn test_build_is_deterministic() {
    for arrangement in all() {
        let first = arrangement.build(&mut BodyIdAllocator::new());
        let second = arrangement.build(&mut BodyIdAllocator::new());
        assert_eq!(first, second, "{}", arrangement.name());
    }
}

#[test]
fn test_ids_are_sequential_from_the_counter() {
    for arrangement in all() {
        let mut ids = BodyIdAllocator::new();
        ids.allocate();
        let setup = arrangement.build(&mut ids);

        for (i, body) in setup.bodies.iter().enumerate() {
            assert_eq!(body.id, BodyId(i as u64 + 1));
        }
        assert_eq!(ids.allocated(), setup.bodies.len() as u64 + 1);
    }
}

#[test]
fn test_display_bounds_contain_bodies() {
    for arrangement in all() {
        let setup = arrangement.build(&mut BodyIdAllocator::new());
        for body in &setup.bodies {
            let p = body.position;
            let (b0, b1) = (setup.display_bound0, setup.display_bound1);
            assert!(p.x > b0.x && p.y > b0.y && p.z > b0.z, "{}", arrangement.name());
            assert!(p.x < b1.x && p.y < b1.y && p.z < b1.z, "{}", arrangement.name());
        }
    }
}

#[test]
fn test_momentum_is_zeroed() {
    for arrangement in all() {
        let (total, scale) = momentum(&arrangement);
        assert!(total.mag() <= scale * 1e-12, "{}: {:?}", arrangement.name(), total);
    }
}

#[test]
fn test_zero_net_momentum_ignores_massless_systems() {
    let mut setup = ExplicitBodies::new(
        vec![BodySpec::new("ghost", 0.0, 0.0, DVec3::zero(), DVec3::new(1.0, 0.0, 0.0))],
        1.0,
        false,
    )
    .unwrap()
    .build(&mut BodyIdAllocator::new());

    zero_net_momentum(&mut setup.bodies);
    assert_eq!(setup.bodies[0].velocity, DVec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_seed_is_recorded_and_replays() {
    let fresh = RandomCloud::new(RandomCloudParams::default(), None).unwrap();
    let replay = RandomCloud::new(RandomCloudParams::default(), Some(fresh.seed())).unwrap();

    assert_eq!(
        fresh.build(&mut BodyIdAllocator::new()),
        replay.build(&mut BodyIdAllocator::new())
    );

    let other = RandomCloud::new(RandomCloudParams::default(), Some(fresh.seed().wrapping_add(1))).unwrap();
    assert_ne!(
        fresh.build(&mut BodyIdAllocator::new()).bodies,
        other.build(&mut BodyIdAllocator::new()).bodies
    );
}

#[test]
fn test_seed_is_reported() {
    let arrangements = all();
    assert_eq!(arrangements[0].seed(), None);
    assert_eq!(arrangements[1].seed(), None);
    assert_eq!(arrangements[2].seed(), Some(11));
    assert_eq!(arrangements[3].seed(), Some(12));
    assert!(arrangements[3].parameter_lines().contains(&"  seed: 12".to_owned()));
}

#[test]
fn test_binary_star_starts_at_apoapsis() {
    let params = BinaryStarParams {
        eccentricity: 0.5,
        ..BinaryStarParams::default()
    };
    let setup = BinaryStar::new(params).unwrap().build(&mut BodyIdAllocator::new());
    let (a, b) = (&setup.bodies[0], &setup.bodies[1]);

    let separation = a.distance_to(b);
    assert_relative_eq!(separation, params.semi_major_axis * 1.5, max_relative = 1e-12);

    let total = params.primary_mass + params.secondary_mass;
    let relative_speed = (b.velocity - a.velocity).mag();
    let vis_viva = (GRAVITATIONAL_CONSTANT * total * (2.0 / separation - 1.0 / params.semi_major_axis)).sqrt();
    assert_relative_eq!(relative_speed, vis_viva, max_relative = 1e-9);
}

#[test]
fn test_disc_orbits_are_sorted_and_bounded() {
    let params = PlanetaryDiscParams::default();
    let setup = PlanetaryDisc::new(params, Some(3)).unwrap().build(&mut BodyIdAllocator::new());

    assert_eq!(setup.bodies.len(), params.planet_count + 1);
    assert_eq!(setup.bodies[0].name, "Star");
    let star = setup.bodies[0].position;
    let mut last = 0.0;
    for planet in &setup.bodies[1..] {
        let r = (planet.position - star).mag();
        assert!(r >= last);
        assert!(r <= (params.outer_radius.powi(2) + params.thickness.powi(2)).sqrt() * 1.001);
        last = r;
    }
}

#[test]
fn test_cloud_respects_parameters() {
    let params = RandomCloudParams {
        count: 50,
        min_mass: 1.0e20,
        max_mass: 2.0e20,
        ..RandomCloudParams::default()
    };
    let setup = RandomCloud::new(params, Some(99)).unwrap().build(&mut BodyIdAllocator::new());

    assert_eq!(setup.bodies.len(), 50);
    for body in &setup.bodies {
        assert!((params.min_mass..=params.max_mass).contains(&body.mass));
        assert!(body.position.mag() <= params.cloud_radius * (1.0 + 1e-12));
        assert_relative_eq!(body.mass / body.volume(), params.density, max_relative = 1e-9);
    }
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let err = RandomCloud::new(
        RandomCloudParams {
            count: 0,
            ..RandomCloudParams::default()
        },
        Some(1),
    )
    .unwrap_err();
    assert_eq!(err.name, "count");

    let err = BinaryStar::new(BinaryStarParams {
        eccentricity: 1.0,
        ..BinaryStarParams::default()
    })
    .unwrap_err();
    assert_eq!(err.name, "eccentricity");

    let err = PlanetaryDisc::new(
        PlanetaryDiscParams {
            outer_radius: 1.0,
            ..PlanetaryDiscParams::default()
        },
        Some(1),
    )
    .unwrap_err();
    assert_eq!(err.name, "outer_radius");

    assert!(ExplicitBodies::new(Vec::new(), 1.0, false).is_err());
    let nan = BodySpec::new("nan", 1.0, 1.0, DVec3::new(f64::NAN, 0.0, 0.0), DVec3::zero());
    assert!(ExplicitBodies::new(vec![nan], 1.0, false).is_err());
}

#[test]
fn test_explicit_listing_keeps_exact_color() {
    let color = crate::body::Color::new(0.123_456, 0.5, 0.1);
    let spec = BodySpec::new("tinted", 1.0, 1.0, DVec3::zero(), DVec3::zero()).with_color(color);
    let arrangement: Arrangement = ExplicitBodies::new(vec![spec], 1.0, false).unwrap().into();

    let lines = arrangement.parameter_lines();
    assert!(lines.iter().any(|l| l.ends_with("color=rgb(0.123456, 0.5, 0.1)")), "{lines:?}");
}

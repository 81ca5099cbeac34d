//! End-to-end scenarios driven through `CharacterMover`.

use alpha_locomotion::math::size_2d;
use alpha_locomotion::{
    CharacterMover, CollisionHit, CollisionPlane, ConfigError, MovementConfig, MovementEvent,
    MovementInput, MovementMode, PlaneWorld,
};
use glam::{Vec2, Vec3};

const DT: f32 = 1.0 / 60.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mover_on_floor(config: MovementConfig) -> CharacterMover<PlaneWorld> {
    init_logging();
    let world = PlaneWorld::new().with_floor(0.0);
    let mut mover = CharacterMover::new(config, world).unwrap();
    mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));
    mover
}

// ============================================================================
// Core Scenarios
// ============================================================================

#[test]
fn test_rest_on_flat_floor() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let start = mover.position();

    let events = mover.tick(&MovementInput::default(), DT).to_vec();

    assert!(events.is_empty());
    assert_eq!(mover.velocity(), Vec3::ZERO);
    assert_eq!(mover.mode(), MovementMode::Walking);
    assert_eq!(mover.position(), start);
}

#[test]
fn test_braking_to_rest() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let max_speed = mover.max_speed();
    mover.state_mut().velocity = Vec3::new(max_speed, 0.0, 0.0);

    let mut previous = max_speed;
    let mut stopped_at = None;

    for tick in 0..120 {
        mover.tick(&MovementInput::default(), DT);
        let speed = mover.velocity().x;

        assert!(speed >= 0.0, "reversed on tick {tick}: {speed}");
        assert!(speed <= previous + 1e-3, "sped up on tick {tick}");
        previous = speed;

        if speed == 0.0 {
            stopped_at = Some(tick);
            break;
        }
    }

    let stopped_at = stopped_at.expect("agent never came to rest");
    assert!(stopped_at < 60, "took {stopped_at} ticks to stop");
    assert_eq!(mover.velocity(), Vec3::ZERO);
    assert_eq!(mover.mode(), MovementMode::Walking);
}

#[test]
fn test_braking_to_rest_from_any_speed() {
    // Even sweep plus speeds whose braking ends just under the rest tolerance
    let speeds = (0..207)
        .map(|i| 0.2 + i as f32 * 2.9)
        .chain([12.8, 50.9, 127.1, 165.2, 204.2]);

    for start in speeds {
        let mut mover = mover_on_floor(MovementConfig::default());
        mover.state_mut().velocity = Vec3::new(start, 0.0, 0.0);

        let mut previous = start;
        for _ in 0..300 {
            mover.tick(&MovementInput::default(), DT);
            let speed = mover.velocity().x;
            assert!(speed >= 0.0, "start {start}: reversed to {speed}");
            assert!(speed <= previous + 1e-3, "start {start}: sped up to {speed}");
            previous = speed;
        }

        assert_eq!(mover.velocity(), Vec3::ZERO, "start {start}: still moving");
    }
}

#[test]
fn test_landing_in_the_same_tick() {
    init_logging();
    let world = PlaneWorld::new().with_floor(0.0);
    let mut mover = CharacterMover::new(MovementConfig::default(), world).unwrap();
    {
        let state = mover.state_mut();
        state.mode = MovementMode::Falling;
        state.position = Vec3::new(0.0, 0.0, 100.0);
        state.velocity = Vec3::new(0.0, 0.0, -500.0);
    }

    let events = mover.tick(&MovementInput::default(), DT).to_vec();

    // Trapezoid move over the tick, stopped 0.01 short of the floor
    let new_vz = -500.0 + mover.config().gravity_z * DT;
    let travel = (500.0 - new_vz) * 0.5 * DT;
    let hit_time = (4.0 - 0.01) / travel;
    let expected_remaining = DT * (1.0 - hit_time);

    let landed = events.iter().find_map(|event| match event {
        MovementEvent::Landed { remaining_time } => Some(*remaining_time),
        _ => None,
    });
    let remaining = landed.expect("no landing event");
    assert!((remaining - expected_remaining).abs() < 1e-4);

    assert!(events.contains(&MovementEvent::ModeChanged {
        from: MovementMode::Falling,
        to: MovementMode::Walking,
    }));
    assert_eq!(mover.mode(), MovementMode::Walking);
    assert_eq!(mover.velocity(), Vec3::ZERO);
    assert!(mover.is_walkable_floor());
}

#[test]
fn test_landing_time_is_spent_walking() {
    let config = MovementConfig {
        max_simulation_iterations: 4,
        ..Default::default()
    };
    init_logging();
    let world = PlaneWorld::new().with_floor(0.0);
    let mut mover = CharacterMover::new(config, world).unwrap();
    {
        let state = mover.state_mut();
        state.mode = MovementMode::Falling;
        state.position = Vec3::new(0.0, 0.0, 100.0);
        state.velocity = Vec3::new(120.0, 0.0, -500.0);
    }

    mover.tick(&MovementInput::default(), DT);

    assert_eq!(mover.mode(), MovementMode::Walking);
    // The walking phase re-derives velocity from the leftover move
    assert_eq!(mover.velocity().z, 0.0);
    assert!(mover.velocity().x > 0.0);
    let gap = mover.position().z - 96.0;
    assert!(gap >= 1.9 - 1e-3 && gap <= 2.4 + 1e-3, "gap {gap}");
}

#[test]
fn test_jump_refused_on_steep_floor() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let steep = Vec3::new(-0.8, 0.0, 0.6);
    {
        let state = mover.state_mut();
        state.velocity = Vec3::new(10.0, 0.0, 0.0);
        state.current_floor.hit = CollisionHit::blocking(0.1, state.position, Vec3::ZERO, steep);
    }
    let before = mover.state().clone();

    assert!(!mover.attempt_jump());
    assert_eq!(mover.mode(), MovementMode::Walking);
    assert_eq!(mover.velocity(), before.velocity);
    assert!(mover.events().is_empty());
}

// ============================================================================
// Jumping
// ============================================================================

#[test]
fn test_jump_arc() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let floor_z = mover.position().z;

    let press = MovementInput {
        jump_pressed: true,
        ..Default::default()
    };
    let mut events = mover.tick(&press, DT).to_vec();
    assert_eq!(mover.mode(), MovementMode::Falling);

    let mut peak = mover.position().z;
    for _ in 0..90 {
        events.extend_from_slice(mover.tick(&MovementInput::default(), DT));
        peak = peak.max(mover.position().z);
    }

    let order: Vec<_> = events
        .iter()
        .filter(|event| !matches!(event, MovementEvent::ModeChanged { .. }))
        .map(|event| match event {
            MovementEvent::Jumped => "jumped",
            MovementEvent::JumpApex => "apex",
            MovementEvent::Landed { .. } => "landed",
            MovementEvent::ModeChanged { .. } => unreachable!(),
        })
        .collect();
    assert_eq!(order, vec!["jumped", "apex", "landed"]);

    // v^2 / 2g
    let expected_height = 304.8 * 304.8 / (2.0 * 1143.0);
    assert!((peak - floor_z - expected_height).abs() < 1.0);

    assert_eq!(mover.mode(), MovementMode::Walking);
    assert_eq!(mover.state().jump.current_count, 0);
}

#[test]
fn test_apex_splits_the_step() {
    let mut mover = mover_on_floor(MovementConfig::default());
    mover.attempt_jump();

    // One long tick crosses the apex partway through
    let events = mover.tick(&MovementInput::default(), 0.3).to_vec();

    assert!(events.contains(&MovementEvent::JumpApex));
    assert_eq!(mover.state().jump_apex_attempts, 1);
    let apex_time = 304.8 / 1143.0;
    let expected_vz = -1143.0 * (0.3 - apex_time);
    assert!((mover.velocity().z - expected_vz).abs() < 0.05);
}

#[test]
fn test_double_jump_in_the_air() {
    let config = MovementConfig {
        jump_max_count: 2,
        ..Default::default()
    };
    let mut mover = mover_on_floor(config);

    let press = MovementInput {
        jump_pressed: true,
        ..Default::default()
    };
    let release = MovementInput::default();

    mover.tick(&press, DT);
    for _ in 0..10 {
        mover.tick(&release, DT);
    }
    let events = mover.tick(&press, DT).to_vec();
    assert!(events.contains(&MovementEvent::Jumped));
    assert_eq!(mover.state().jump.current_count, 2);

    mover.tick(&release, DT);
    let events = mover.tick(&press, DT).to_vec();
    assert!(!events.contains(&MovementEvent::Jumped));
}

// ============================================================================
// Falling
// ============================================================================

#[test]
fn test_wedged_in_ditch_counts_as_landing() {
    init_logging();
    let world = PlaneWorld::new()
        .with_plane(CollisionPlane::new(Vec3::new(0.8, 0.0, 0.6), Vec3::ZERO))
        .with_plane(CollisionPlane::new(Vec3::new(-0.8, 0.0, 0.6), Vec3::ZERO));
    let mut mover = CharacterMover::new(MovementConfig::default(), world).unwrap();
    {
        let state = mover.state_mut();
        state.mode = MovementMode::Falling;
        state.position = Vec3::new(0.0, 0.0, 132.33);
        state.velocity = Vec3::new(0.0, 0.0, -600.0);
    }

    let events = mover.tick(&MovementInput::default(), 0.05).to_vec();

    assert!(events.contains(&MovementEvent::Landed {
        remaining_time: 0.0
    }));
}

#[test]
fn test_air_strafe_is_capped() {
    init_logging();
    let mut mover = CharacterMover::new(MovementConfig::default(), PlaneWorld::new()).unwrap();
    mover.spawn_at(Vec3::new(0.0, 0.0, 10_000.0));

    let strafe = MovementInput::wish(Vec2::new(1.0, 0.0));
    for _ in 0..60 {
        mover.tick(&strafe, DT);
        let side = mover.velocity().y;
        assert!(side <= mover.config().air_speed_cap + 1e-3, "side speed {side}");
    }

    assert!(mover.velocity().y > 0.0);
    assert_eq!(mover.mode(), MovementMode::Falling);
}

#[test]
fn test_walking_off_ledge_then_landing_below() {
    init_logging();
    let upper = CollisionPlane::new(Vec3::Z, Vec3::new(0.0, 0.0, 100.0)).with_bounds(
        Vec3::new(-1000.0, -1000.0, 99.0),
        Vec3::new(0.0, 1000.0, 101.0),
    );
    let world = PlaneWorld::new().with_floor(0.0).with_plane(upper);
    let mut mover = CharacterMover::new(MovementConfig::default(), world).unwrap();
    mover.spawn_at(Vec3::new(-100.0, 0.0, 200.0));
    assert_eq!(mover.mode(), MovementMode::Walking);

    let forward = MovementInput::wish(Vec2::new(0.0, 1.0));
    let mut events = Vec::new();
    for _ in 0..120 {
        events.extend_from_slice(mover.tick(&forward, DT));
    }

    assert!(events.contains(&MovementEvent::ModeChanged {
        from: MovementMode::Walking,
        to: MovementMode::Falling,
    }));
    assert!(events
        .iter()
        .any(|event| matches!(event, MovementEvent::Landed { .. })));
    assert_eq!(mover.mode(), MovementMode::Walking);
    assert!(mover.position().z < 100.0);
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_ground_speed_never_exceeds_max() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let input = MovementInput::wish(Vec2::new(0.7, 0.7));

    for _ in 0..120 {
        mover.tick(&input, DT);
        assert!(size_2d(mover.velocity()) <= mover.max_speed() + 1e-2);
        assert_eq!(mover.velocity().z, 0.0);
    }
}

#[test]
fn test_walk_toggle_lowers_speed() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let input = MovementInput {
        wish: Vec2::new(0.0, 1.0),
        wants_to_walk: true,
        ..Default::default()
    };

    for _ in 0..120 {
        mover.tick(&input, DT);
    }

    assert!((size_2d(mover.velocity()) - 285.75).abs() < 0.5);
}

#[test]
fn test_strafing_rolls_the_camera() {
    let mut mover = mover_on_floor(MovementConfig::arcade());

    for _ in 0..30 {
        mover.tick(&MovementInput::wish(Vec2::new(1.0, 0.0)), DT);
    }
    let roll = mover.camera_roll();
    assert!(roll > 0.0 && roll <= 2.0, "roll {roll}");

    for _ in 0..30 {
        mover.tick(&MovementInput::wish(Vec2::new(-1.0, 0.0)), DT);
    }
    assert!(mover.camera_roll() < 0.0);
}

#[test]
fn test_identical_runs_match() {
    let run = || {
        let mut mover = mover_on_floor(MovementConfig::arcade()).with_seed(99);
        for frame in 0..180u32 {
            let input = MovementInput {
                wish: Vec2::new((frame as f32 * 0.1).sin(), 1.0),
                jump_pressed: frame % 40 == 0,
                ..Default::default()
            };
            mover.tick(&input, DT);
        }
        mover.state().clone()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_invalid_delta_time_is_ignored() {
    let mut mover = mover_on_floor(MovementConfig::default());
    let before = mover.state().clone();

    let input = MovementInput::wish(Vec2::new(0.0, 1.0));
    assert!(mover.tick(&input, 0.0).is_empty());
    assert!(mover.tick(&input, -1.0).is_empty());
    assert_eq!(*mover.state(), before);
}

#[test]
fn test_bad_config_is_rejected() {
    let config = MovementConfig {
        min_floor_dist: 5.0,
        max_floor_dist: 2.0,
        ..Default::default()
    };
    let result = CharacterMover::new(config, PlaneWorld::new());
    assert!(matches!(result, Err(ConfigError::InvertedRange { .. })));
}

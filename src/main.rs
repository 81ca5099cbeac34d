//! Alpha Sim - Headless Driver
//!
//! Runs a scripted agent through a small test course and logs what happens.
//! Set `RUST_LOG=debug` to see mode changes, or `trace` for sub-step detail.

use alpha_locomotion::{
    CharacterMover, CollisionPlane, MovementConfig, MovementEvent, MovementInput, PlaneWorld,
};
use anyhow::Context;
use glam::{Vec2, Vec3};
use log::info;

const TICK_RATE: f32 = 60.0;
const TOTAL_FRAMES: u32 = 420;

/// Flat floor, a ramp that ends in a ledge, and a wall at the far end.
fn build_course() -> PlaneWorld {
    let ramp_angle = 20.0_f32.to_radians();
    let ramp_normal = Vec3::new(-ramp_angle.sin(), 0.0, ramp_angle.cos());
    let ramp_top = 400.0 * ramp_angle.tan();

    PlaneWorld::new()
        .with_floor(0.0)
        .with_plane(
            CollisionPlane::new(ramp_normal, Vec3::new(600.0, 0.0, 0.0)).with_bounds(
                Vec3::new(600.0, -1000.0, 0.0),
                Vec3::new(1000.0, 1000.0, ramp_top),
            ),
        )
        .with_plane(CollisionPlane::new(-Vec3::X, Vec3::new(1400.0, 0.0, 0.0)))
}

/// Scripted input for one frame.
fn scripted_input(frame: u32) -> MovementInput {
    match frame {
        0..=239 => MovementInput {
            wish: Vec2::new(0.0, 1.0),
            jump_pressed: frame == 45,
            ..Default::default()
        },
        240..=329 => MovementInput {
            wish: Vec2::new(1.0, 1.0),
            jump_pressed: frame == 260,
            ..Default::default()
        },
        _ => MovementInput::default(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = MovementConfig::arcade();
    let mut mover = CharacterMover::new(config, build_course())
        .context("invalid movement config")?
        .with_seed(7);

    mover.spawn_at(Vec3::new(0.0, 0.0, 100.0));
    info!("spawned at {} in {:?}", mover.position(), mover.mode());

    let delta_time = 1.0 / TICK_RATE;

    for frame in 0..TOTAL_FRAMES {
        let input = scripted_input(frame);

        for event in mover.tick(&input, delta_time) {
            match event {
                MovementEvent::ModeChanged { from, to } => {
                    info!("[{frame:>4}] mode {from:?} -> {to:?}");
                }
                MovementEvent::Jumped => info!("[{frame:>4}] jumped"),
                MovementEvent::JumpApex => info!("[{frame:>4}] apex"),
                MovementEvent::Landed { remaining_time } => {
                    info!("[{frame:>4}] landed ({remaining_time:.4}s left)");
                }
            }
        }

        if frame % 30 == 0 {
            info!(
                "[{frame:>4}] pos={:.1} vel={:.1} speed={:.1} roll={:.2}",
                mover.position(),
                mover.velocity(),
                mover.velocity().truncate().length(),
                mover.camera_roll(),
            );
        }
    }

    info!("finished at {} in {:?}", mover.position(), mover.mode());
    Ok(())
}

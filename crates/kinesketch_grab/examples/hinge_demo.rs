//! Hinge Grab Demo
//!
//! Grabs a door on a limited hinge with a simulated hand, swings it open by
//! moving the hand, nudges it with the thumbstick, then lets go.
//!
//! Run with: RUST_LOG=kinesketch_grab=debug cargo run -p kinesketch_grab --example hinge_demo

use kinesketch_grab::prelude::*;
use kinesketch_physics::{ArticulationBody, ArticulationDrive, DofLock, DofLocks, JointAnchor, MemoryBackend};
use tracing_subscriber::EnvFilter;

const DT: f32 = 1.0 / 90.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => KinesketchConfig::load(path)?,
        None => KinesketchConfig::default(),
    };

    let mut backend = MemoryBackend::new();
    let frame = backend.add_body(
        ArticulationBody::root(Pose::IDENTITY)
            .with_name("frame")
            .immovable(),
    )?;
    let door = backend.add_body(
        ArticulationBody::revolute(frame, Pose::from_position(Vec3::new(0.8, 0.0, 0.0)))
            .with_name("door")
            .with_anchor(JointAnchor::linked(Vec3::new(-0.8, 0.0, 0.0), Vec3::ZERO))
            .with_locks(DofLocks::swing_y(DofLock::Limited))
            .with_x_drive(
                ArticulationDrive::target(0.0)
                    .with_limits(-110f32.to_radians(), 0.0)
                    .with_spring(1000.0, 50.0),
            ),
    )?;

    let mut interactables = Interactables::new();
    let handle = interactables.register(&mut backend, door, config.grab.clone());
    handle.listeners_mut().on_started(|event| {
        tracing::info!("grab started on {:?} by {:?}", event.body, event.grabber);
    });
    handle.listeners_mut().on_ended(|event| {
        tracing::info!("grab ended on {:?}", event.body);
    });

    let mut hand = GrabController::try_new(GrabberId(0), config.controller.clone())?;

    // Reach the handle and squeeze, then sweep the hand a quarter circle
    // around the hinge toward +Z.
    let steps = 90;
    for step in 0..=steps {
        let sweep = (step as f32 / steps as f32) * 90f32.to_radians();
        let hand_pose = Pose::from_position(Vec3::new(0.8 * sweep.cos(), 0.0, 0.8 * sweep.sin()));
        let input = InputSnapshot::new(hand_pose, 1.0).with_thumbstick(0.0, 0.0);

        if step == 0 {
            hand.validate_input(&input)?;
        }
        tick(&mut hand, &mut backend, &mut interactables, &input);
    }
    let angle = interactables.get(door).map_or(0.0, |i| i.joint_angle(&backend));
    tracing::info!("{} swung to {:.1}°", backend.body_name(door).unwrap_or("door"), angle);

    // Thumbstick pushes the door back toward closed.
    let held = backend.pose(door)?;
    for _ in 0..30 {
        let input = InputSnapshot::new(held, 1.0).with_thumbstick(0.0, 1.0);
        tick(&mut hand, &mut backend, &mut interactables, &input);
    }
    let angle = interactables.get(door).map_or(0.0, |i| i.joint_angle(&backend));
    tracing::info!("door nudged to {:.1}°", angle);

    let released = InputSnapshot::new(held, 0.0).with_thumbstick(0.0, 0.0);
    tick(&mut hand, &mut backend, &mut interactables, &released);
    tracing::info!("hand state after release: {:?}", hand.state());
    Ok(())
}

fn tick(
    hand: &mut GrabController,
    backend: &mut MemoryBackend,
    interactables: &mut Interactables,
    input: &InputSnapshot,
) {
    let mut ctx = GrabUpdateContext {
        dt: DT,
        backend: &mut *backend,
        interactables,
    };
    let result = hand.update(&mut ctx, input);
    if let Some(transition) = result.transition {
        tracing::info!("{:?}", transition);
    }
    if let Some(line) = result.feedback {
        tracing::trace!(
            "feedback {:?} length {:.3} color {:?} -> {:?}",
            line.state,
            line.length(),
            FeedbackLine::START_RGBA,
            line.state.rgba()
        );
    }
    backend.settle();
}

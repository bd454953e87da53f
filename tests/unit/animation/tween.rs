use std::cell::Cell;

use super::*;
use crate::scene::shape::Geometry;
use crate::scene::stage::StageConfig;
use crate::schedule::clock::{ManualClock, NoopScheduler};

fn setup() -> (AnimationEngine, Stage, Rc<ManualClock>, NodeId) {
    let clock = Rc::new(ManualClock::new());
    let engine = AnimationEngine::new(clock.clone(), Box::new(NoopScheduler));
    let mut stage = Stage::new(
        StageConfig::new(100, 100)
            .unwrap()
            .with_clock(clock.clone()),
    );
    let layer = stage.add_layer().unwrap();
    let shape = stage.add_shape(layer, Geometry::Rect).unwrap();
    stage.set_attr(shape, "x", 100.0).unwrap();
    stage.run_pending_draws().unwrap();
    (engine, stage, clock, shape)
}

fn x_tween(engine: &mut AnimationEngine, stage: &mut Stage, node: NodeId) -> Tween {
    Tween::new(
        engine,
        stage,
        TweenConfig::new(node, vec![("x".into(), 200.0)], Duration::from_millis(200)),
    )
    .unwrap()
}

fn step(engine: &mut AnimationEngine, stage: &mut Stage, clock: &ManualClock, ms: u64) {
    clock.advance(Duration::from_millis(ms));
    engine.tick(stage).unwrap();
}

#[test]
fn interpolates_linearly_and_lands_exactly() {
    let (mut engine, mut stage, clock, shape) = setup();
    let tween = x_tween(&mut engine, &mut stage, shape);
    assert_eq!(tween.state(), TweenState::Idle);
    assert_eq!(tween.progress(), 0.0);

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 100);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 150.0);
    assert_eq!(tween.progress(), 0.5);

    step(&mut engine, &mut stage, &clock, 100);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 200.0);
    assert_eq!(tween.state(), TweenState::Finished);
    assert_eq!(tween.progress(), 1.0);
    assert!(!engine.is_running(tween.anim()));
}

#[test]
fn paused_time_does_not_advance_the_tween() {
    let (mut engine, mut stage, clock, shape) = setup();
    let tween = x_tween(&mut engine, &mut stage, shape);

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 50);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 125.0);

    tween.stop(&mut engine).unwrap();
    assert_eq!(tween.state(), TweenState::Stopped);
    clock.advance(Duration::from_secs(10));
    engine.tick(&mut stage).unwrap();
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 125.0);

    // Resume measures deltas from the resume, not from the pause.
    tween.resume(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 50);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 150.0);
}

#[test]
fn reverse_replays_the_covered_distance_backwards() {
    let (mut engine, mut stage, clock, shape) = setup();
    let tween = x_tween(&mut engine, &mut stage, shape);

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 100);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 150.0);

    tween.reverse(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 50);
    let x = stage.attrs(shape).unwrap().number("x");
    assert!((x - 125.0).abs() < 1e-9, "x = {x}");

    step(&mut engine, &mut stage, &clock, 50);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 100.0);
    assert_eq!(tween.state(), TweenState::Finished);
}

#[test]
fn zero_duration_finishes_on_the_first_frame() {
    let (mut engine, mut stage, clock, shape) = setup();
    let tween = Tween::new(
        &mut engine,
        &mut stage,
        TweenConfig::new(shape, vec![("x".into(), 200.0)], Duration::ZERO),
    )
    .unwrap();

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 1);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 200.0);
    assert_eq!(tween.state(), TweenState::Finished);
    assert_eq!(tween.progress(), 1.0);
}

#[test]
fn play_on_a_finished_tween_restarts_from_zero() {
    let (mut engine, mut stage, clock, shape) = setup();
    let tween = x_tween(&mut engine, &mut stage, shape);

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 200);
    assert_eq!(tween.state(), TweenState::Finished);

    tween.play(&mut engine).unwrap();
    assert_eq!(tween.progress(), 0.0);
    step(&mut engine, &mut stage, &clock, 100);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 150.0);

    // resume, by contrast, leaves a finished tween alone.
    step(&mut engine, &mut stage, &clock, 100);
    tween.resume(&mut engine).unwrap();
    assert_eq!(tween.state(), TweenState::Finished);
}

#[test]
fn on_finish_fires_once_per_completion() {
    let (mut engine, mut stage, clock, shape) = setup();
    let finishes = Rc::new(Cell::new(0));
    let tween = {
        let finishes = finishes.clone();
        Tween::new(
            &mut engine,
            &mut stage,
            TweenConfig::new(shape, vec![("x".into(), 200.0)], Duration::from_millis(200))
                .with_on_finish(move |_| finishes.set(finishes.get() + 1)),
        )
        .unwrap()
    };

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 200);
    step(&mut engine, &mut stage, &clock, 16);
    assert_eq!(finishes.get(), 1);

    // The callback is restored, so a replay completes it again.
    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 200);
    assert_eq!(finishes.get(), 2);
}

#[test]
fn eased_tweens_pass_through_the_curve() {
    let (mut engine, mut stage, clock, shape) = setup();
    let tween = Tween::new(
        &mut engine,
        &mut stage,
        TweenConfig::new(shape, vec![("x".into(), 200.0)], Duration::from_millis(200))
            .with_ease(Ease::InQuad),
    )
    .unwrap();

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 100);
    // InQuad(0.5) = 0.25 of the distance.
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 125.0);
}

#[test]
fn destroyed_tweens_reject_control_calls() {
    let (mut engine, mut stage, _clock, shape) = setup();
    let tween = x_tween(&mut engine, &mut stage, shape);

    tween.destroy(&mut engine);
    assert_eq!(tween.state(), TweenState::Destroyed);
    assert!(tween.play(&mut engine).is_err());
    assert!(tween.resume(&mut engine).is_err());
    assert!(tween.reverse(&mut engine).is_err());
    assert!(tween.stop(&mut engine).is_err());
    assert!(!engine.is_running(tween.anim()));
}

#[test]
fn multiple_attributes_advance_together() {
    let (mut engine, mut stage, clock, shape) = setup();
    stage.set_attr(shape, "opacity", 0.0).unwrap();
    let tween = Tween::new(
        &mut engine,
        &mut stage,
        TweenConfig::new(
            shape,
            vec![("x".into(), 200.0), ("opacity".into(), 1.0)],
            Duration::from_millis(200),
        ),
    )
    .unwrap();

    tween.play(&mut engine).unwrap();
    step(&mut engine, &mut stage, &clock, 100);
    assert_eq!(stage.attrs(shape).unwrap().number("x"), 150.0);
    assert_eq!(stage.attrs(shape).unwrap().number("opacity"), 0.5);
}

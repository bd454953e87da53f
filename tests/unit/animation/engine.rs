use std::cell::{Cell, RefCell};

use super::*;
use crate::foundation::error::EaselError;
use crate::scene::stage::StageConfig;
use crate::schedule::clock::{CountingScheduler, ManualClock, NoopScheduler};

fn setup() -> (AnimationEngine, Stage, Rc<ManualClock>, NodeId) {
    let clock = Rc::new(ManualClock::new());
    let engine = AnimationEngine::new(clock.clone(), Box::new(NoopScheduler));
    let mut stage = Stage::new(
        StageConfig::new(100, 100)
            .unwrap()
            .with_clock(clock.clone()),
    );
    let layer = stage.add_layer().unwrap();
    stage.run_pending_draws().unwrap();
    (engine, stage, clock, layer)
}

fn counting_anim(
    engine: &mut AnimationEngine,
    layer: NodeId,
    calls: Rc<Cell<u64>>,
) -> AnimId {
    engine.register(
        [layer],
        move |_: &mut Stage,
              _: FrameInfo,
              _: &mut EngineCommands|
              -> EaselResult<FrameOutcome> {
            calls.set(calls.get() + 1);
            Ok(FrameOutcome::Continue)
        },
    )
}

#[test]
fn only_running_animations_receive_frames() {
    let (mut engine, mut stage, clock, layer) = setup();
    let calls = Rc::new(Cell::new(0));
    let anim = counting_anim(&mut engine, layer, calls.clone());

    // Registered but never started.
    engine.tick(&mut stage).unwrap();
    assert_eq!(calls.get(), 0);

    engine.start(anim);
    for _ in 0..3 {
        clock.advance(Duration::from_millis(16));
        engine.tick(&mut stage).unwrap();
    }
    assert_eq!(calls.get(), 3);

    engine.stop(anim);
    engine.tick(&mut stage).unwrap();
    assert_eq!(calls.get(), 3);
    assert!(!engine.is_running(anim));
}

#[test]
fn frame_info_measures_time_from_start() {
    let (mut engine, mut stage, clock, layer) = setup();
    let frames = Rc::new(RefCell::new(Vec::new()));
    let anim = {
        let frames = frames.clone();
        engine.register(
            [layer],
            move |_: &mut Stage,
                  frame: FrameInfo,
                  _: &mut EngineCommands|
                  -> EaselResult<FrameOutcome> {
                frames.borrow_mut().push(frame);
                Ok(FrameOutcome::Continue)
            },
        )
    };

    clock.advance(Duration::from_secs(5));
    engine.start(anim);
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();

    let frames = frames.borrow();
    assert_eq!(frames[0].time, Duration::from_millis(16));
    assert_eq!(frames[0].delta, Duration::from_millis(16));
    assert_eq!(frames[0].frame_count, 0);
    assert_eq!(frames[1].time, Duration::from_millis(32));
    assert_eq!(frames[1].delta, Duration::from_millis(16));
    assert_eq!(frames[1].frame_count, 1);
}

#[test]
fn stop_outcome_ends_the_animation() {
    let (mut engine, mut stage, clock, layer) = setup();
    let calls = Rc::new(Cell::new(0));
    let anim = {
        let calls = calls.clone();
        engine.register(
            [layer],
            move |_: &mut Stage,
                  _: FrameInfo,
                  _: &mut EngineCommands|
                  -> EaselResult<FrameOutcome> {
                calls.set(calls.get() + 1);
                Ok(FrameOutcome::Stop)
            },
        )
    };

    engine.start(anim);
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    engine.tick(&mut stage).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(!engine.is_running(anim));
}

#[test]
fn a_failing_animation_does_not_take_others_down() {
    let (mut engine, mut stage, clock, layer) = setup();
    let failing = engine.register(
        [layer],
        |_: &mut Stage, _: FrameInfo, _: &mut EngineCommands| -> EaselResult<FrameOutcome> {
            Err(EaselError::invalid_state("boom"))
        },
    );
    let calls = Rc::new(Cell::new(0));
    let healthy = counting_anim(&mut engine, layer, calls.clone());

    engine.start(failing);
    engine.start(healthy);
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();

    assert!(!engine.is_running(failing));
    assert!(engine.is_running(healthy));
    assert_eq!(calls.get(), 2);
}

#[test]
fn shared_layers_redraw_once_per_tick() {
    let (mut engine, mut stage, clock, layer) = setup();
    let a = counting_anim(&mut engine, layer, Rc::new(Cell::new(0)));
    let b = counting_anim(&mut engine, layer, Rc::new(Cell::new(0)));
    engine.start(a);
    engine.start(b);

    let before = stage.stats().layer_draws;
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    assert_eq!(stage.stats().layer_draws, before + 1);
}

#[test]
fn buffered_commands_apply_after_the_frame_loop() {
    let (mut engine, mut stage, clock, layer) = setup();
    let victim_calls = Rc::new(Cell::new(0));
    let victim = counting_anim(&mut engine, layer, victim_calls.clone());
    let controller = {
        engine.register(
            [layer],
            move |_: &mut Stage,
                  _: FrameInfo,
                  commands: &mut EngineCommands|
                  -> EaselResult<FrameOutcome> {
                commands.stop(victim);
                Ok(FrameOutcome::Continue)
            },
        )
    };

    engine.start(controller);
    engine.start(victim);
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    // The stop lands after the loop, so the victim still saw this frame.
    assert_eq!(victim_calls.get(), 1);
    assert!(!engine.is_running(victim));
    assert_eq!(engine.running_count(), 1);
}

#[test]
fn ticks_are_rerequested_only_while_running() {
    let clock = Rc::new(ManualClock::new());
    let scheduler = CountingScheduler::new();
    let mut engine = AnimationEngine::new(clock.clone(), Box::new(scheduler.clone()));
    let mut stage = Stage::new(
        StageConfig::new(100, 100)
            .unwrap()
            .with_clock(clock.clone()),
    );
    let layer = stage.add_layer().unwrap();
    stage.run_pending_draws().unwrap();

    let calls = Rc::new(Cell::new(0));
    let anim = {
        let calls = calls.clone();
        engine.register(
            [layer],
            move |_: &mut Stage,
                  _: FrameInfo,
                  _: &mut EngineCommands|
                  -> EaselResult<FrameOutcome> {
                calls.set(calls.get() + 1);
                if calls.get() == 2 {
                    Ok(FrameOutcome::Stop)
                } else {
                    Ok(FrameOutcome::Continue)
                }
            },
        )
    };

    engine.start(anim);
    assert_eq!(scheduler.requests(), 1);
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    assert_eq!(scheduler.requests(), 2);
    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    // Stopped on the second frame; no further wakeups requested.
    assert_eq!(scheduler.requests(), 2);
}

#[test]
fn unregister_forgets_the_animation() {
    let (mut engine, mut stage, clock, layer) = setup();
    let calls = Rc::new(Cell::new(0));
    let anim = counting_anim(&mut engine, layer, calls.clone());
    engine.start(anim);
    engine.unregister(anim);

    clock.advance(Duration::from_millis(16));
    engine.tick(&mut stage).unwrap();
    assert_eq!(calls.get(), 0);
    assert!(!engine.is_running(anim));
}

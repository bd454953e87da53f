//! Shared frame-clock animation engine.
//!
//! All animations run off one injected clock and one host tick scheduler.
//! The host calls [`AnimationEngine::tick`] once per frame; the engine
//! invokes every running animation's callback, redraws the union of their
//! layers once, and re-requests a tick only while something is still
//! running.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use smallvec::SmallVec;
use tracing::error;

use crate::{
    foundation::core::NodeId,
    foundation::error::EaselResult,
    scene::stage::Stage,
    schedule::clock::{Clock, TickScheduler},
};

/// Handle to a registered animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimId(pub u64);

/// Timing data handed to an animation callback each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Time since the animation was last started.
    pub time: Duration,
    /// Time since the previous frame (or since start, on the first frame).
    pub delta: Duration,
    /// Frames delivered since the animation was last started.
    pub frame_count: u64,
}

/// What an animation callback wants to happen next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep ticking.
    Continue,
    /// Stop this animation after the current frame is drawn.
    Stop,
}

/// Start/stop requests buffered during a tick.
///
/// Callbacks cannot borrow the engine they run inside, so re-entrant
/// control flows through this buffer and is applied once the frame loop
/// finishes.
#[derive(Default)]
pub struct EngineCommands {
    start: Vec<AnimId>,
    stop: Vec<AnimId>,
}

impl EngineCommands {
    /// Request that `anim` be started after this tick.
    pub fn start(&mut self, anim: AnimId) {
        self.start.push(anim);
    }

    /// Request that `anim` be stopped after this tick.
    pub fn stop(&mut self, anim: AnimId) {
        self.stop.push(anim);
    }
}

/// Per-frame animation callback.
pub trait FrameCallback {
    /// Advance one frame. Mutate the stage freely; layer redraws are
    /// handled by the engine.
    fn on_frame(
        &mut self,
        stage: &mut Stage,
        frame: FrameInfo,
        commands: &mut EngineCommands,
    ) -> EaselResult<FrameOutcome>;
}

impl<F> FrameCallback for F
where
    F: FnMut(&mut Stage, FrameInfo, &mut EngineCommands) -> EaselResult<FrameOutcome>,
{
    fn on_frame(
        &mut self,
        stage: &mut Stage,
        frame: FrameInfo,
        commands: &mut EngineCommands,
    ) -> EaselResult<FrameOutcome> {
        self(stage, frame, commands)
    }
}

struct AnimEntry {
    layers: SmallVec<[NodeId; 2]>,
    /// Taken out of the entry while the callback runs.
    callback: Option<Box<dyn FrameCallback>>,
    running: bool,
    started_at: Duration,
    last_tick: Duration,
    frames: u64,
}

/// Owner of every registered animation, driven by one shared clock.
pub struct AnimationEngine {
    clock: Rc<dyn Clock>,
    scheduler: Box<dyn TickScheduler>,
    entries: BTreeMap<u64, AnimEntry>,
    next_id: u64,
}

impl AnimationEngine {
    /// Engine using the given time source and host scheduler.
    pub fn new(clock: Rc<dyn Clock>, scheduler: Box<dyn TickScheduler>) -> Self {
        Self {
            clock,
            scheduler,
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Register an animation over `layers`, initially stopped.
    pub fn register(
        &mut self,
        layers: impl IntoIterator<Item = NodeId>,
        callback: impl FrameCallback + 'static,
    ) -> AnimId {
        let id = AnimId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id.0,
            AnimEntry {
                layers: layers.into_iter().collect(),
                callback: Some(Box::new(callback)),
                running: false,
                started_at: Duration::ZERO,
                last_tick: Duration::ZERO,
                frames: 0,
            },
        );
        id
    }

    /// Start (or restart) an animation. Stamps the clock so the first
    /// frame's delta measures time since this call.
    pub fn start(&mut self, anim: AnimId) {
        let Some(entry) = self.entries.get_mut(&anim.0) else {
            return;
        };
        let now = self.clock.now();
        entry.running = true;
        entry.started_at = now;
        entry.last_tick = now;
        entry.frames = 0;
        self.scheduler.request_tick();
    }

    /// Stop an animation without forgetting it.
    pub fn stop(&mut self, anim: AnimId) {
        if let Some(entry) = self.entries.get_mut(&anim.0) {
            entry.running = false;
        }
    }

    /// Remove an animation entirely.
    pub fn unregister(&mut self, anim: AnimId) {
        self.entries.remove(&anim.0);
    }

    /// Whether `anim` is currently running.
    pub fn is_running(&self, anim: AnimId) -> bool {
        self.entries.get(&anim.0).is_some_and(|e| e.running)
    }

    /// Number of running animations.
    pub fn running_count(&self) -> usize {
        self.entries.values().filter(|e| e.running).count()
    }

    /// Advance one frame: invoke every running callback, redraw the union
    /// of their layers once, apply buffered start/stop commands, and
    /// re-request a tick if anything is still running.
    ///
    /// A callback error stops that animation and is logged; other
    /// animations keep running.
    #[tracing::instrument(skip(self, stage))]
    pub fn tick(&mut self, stage: &mut Stage) -> EaselResult<()> {
        let now = self.clock.now();
        let running: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, e)| e.running)
            .map(|(id, _)| *id)
            .collect();

        let mut commands = EngineCommands::default();
        let mut dirty: SmallVec<[NodeId; 4]> = SmallVec::new();

        for id in running {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            if !entry.running {
                // Stopped earlier in this same tick via commands applied
                // by a previous frame; skip.
                continue;
            }
            let frame = FrameInfo {
                time: now.saturating_sub(entry.started_at),
                delta: now.saturating_sub(entry.last_tick),
                frame_count: entry.frames,
            };
            let Some(mut callback) = entry.callback.take() else {
                continue;
            };
            for layer in &entry.layers {
                if !dirty.contains(layer) {
                    dirty.push(*layer);
                }
            }

            let outcome = callback.on_frame(stage, frame, &mut commands);
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.callback = Some(callback);
                entry.last_tick = now;
                entry.frames += 1;
                match outcome {
                    Ok(FrameOutcome::Continue) => {}
                    Ok(FrameOutcome::Stop) => entry.running = false,
                    Err(e) => {
                        entry.running = false;
                        error!(anim = id, error = %e, "animation frame failed, stopping");
                    }
                }
            }
        }

        for layer in dirty {
            if stage.graph().contains(layer) {
                stage.batch_draw(layer)?;
            }
        }
        stage.run_pending_draws()?;

        let EngineCommands { start, stop } = commands;
        for anim in stop {
            self.stop(anim);
        }
        for anim in start {
            self.start(anim);
        }

        if self.entries.values().any(|e| e.running) {
            self.scheduler.request_tick();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/engine.rs"]
mod tests;

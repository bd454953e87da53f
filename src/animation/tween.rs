//! Attribute tweens built on the animation engine.
//!
//! A tween interpolates a set of numeric attributes on one node from their
//! values at construction time to configured targets over a fixed duration,
//! through an easing curve. It registers itself as a regular engine
//! animation; the handle and the engine callback share state through an
//! `Rc<RefCell<..>>`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::{
    animation::ease::Ease,
    animation::engine::{AnimId, AnimationEngine, EngineCommands, FrameInfo, FrameOutcome},
    foundation::core::NodeId,
    foundation::error::{EaselError, EaselResult},
    scene::stage::Stage,
};

/// Lifecycle of a tween.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenState {
    /// Created but never played.
    Idle,
    /// Advancing each frame.
    Running,
    /// Paused mid-flight; `play` resumes from the current position.
    Stopped,
    /// Reached the end; `play` restarts from zero.
    Finished,
    /// Unregistered; all further control calls fail.
    Destroyed,
}

/// Construction parameters for a [`Tween`].
pub struct TweenConfig {
    /// Node whose attributes are animated.
    pub node: NodeId,
    /// Target values per attribute key. Start values are captured from the
    /// node when the tween is created.
    pub to: Vec<(String, f64)>,
    /// Total active duration.
    pub duration: Duration,
    /// Easing curve over normalized progress.
    pub ease: Ease,
    /// Invoked once each time the tween completes.
    pub on_finish: Option<Box<dyn FnMut(&mut Stage)>>,
}

impl TweenConfig {
    /// Linear tween of `node` toward `to` over `duration`.
    pub fn new(node: NodeId, to: Vec<(String, f64)>, duration: Duration) -> Self {
        Self {
            node,
            to,
            duration,
            ease: Ease::Linear,
            on_finish: None,
        }
    }

    /// Set the easing curve.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Set the completion callback.
    pub fn with_on_finish(mut self, on_finish: impl FnMut(&mut Stage) + 'static) -> Self {
        self.on_finish = Some(Box::new(on_finish));
        self
    }
}

struct TweenProp {
    key: String,
    from: f64,
    to: f64,
}

struct TweenInner {
    node: NodeId,
    props: Vec<TweenProp>,
    duration: Duration,
    ease: Ease,
    /// Accumulated active time; paused time never lands here because frame
    /// deltas are measured from the most recent start.
    position: Duration,
    state: TweenState,
    on_finish: Option<Box<dyn FnMut(&mut Stage)>>,
}

impl TweenInner {
    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return if self.state == TweenState::Idle { 0.0 } else { 1.0 };
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Handle controlling one attribute tween.
pub struct Tween {
    inner: Rc<RefCell<TweenInner>>,
    anim: AnimId,
}

impl Tween {
    /// Create a tween, capturing the node's current values as start values.
    pub fn new(
        engine: &mut AnimationEngine,
        stage: &mut Stage,
        config: TweenConfig,
    ) -> EaselResult<Self> {
        let attrs = stage.attrs(config.node)?;
        let props = config
            .to
            .into_iter()
            .map(|(key, to)| {
                let from = attrs.number(&key);
                TweenProp { key, from, to }
            })
            .collect();

        let layer = stage.graph().owning_layer(config.node)?;
        let inner = Rc::new(RefCell::new(TweenInner {
            node: config.node,
            props,
            duration: config.duration,
            ease: config.ease,
            position: Duration::ZERO,
            state: TweenState::Idle,
            on_finish: config.on_finish,
        }));

        let shared = Rc::clone(&inner);
        let anim = engine.register(layer, move |stage: &mut Stage,
                                                frame: FrameInfo,
                                                _commands: &mut EngineCommands|
              -> EaselResult<FrameOutcome> {
            step(&shared, stage, frame)
        });

        Ok(Self { inner, anim })
    }

    /// The underlying engine animation.
    pub fn anim(&self) -> AnimId {
        self.anim
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TweenState {
        self.inner.borrow().state
    }

    /// Normalized position in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.inner.borrow().progress()
    }

    /// Start playing. A finished tween restarts from zero; a stopped one
    /// resumes from where it paused, excluding the paused time.
    pub fn play(&self, engine: &mut AnimationEngine) -> EaselResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            match inner.state {
                TweenState::Destroyed => {
                    return Err(EaselError::invalid_state("tween has been destroyed"));
                }
                TweenState::Finished => inner.position = Duration::ZERO,
                _ => {}
            }
            inner.state = TweenState::Running;
        }
        engine.start(self.anim);
        Ok(())
    }

    /// Resume from the current position without restarting a finished run.
    pub fn resume(&self, engine: &mut AnimationEngine) -> EaselResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == TweenState::Destroyed {
                return Err(EaselError::invalid_state("tween has been destroyed"));
            }
            if inner.state == TweenState::Finished {
                return Ok(());
            }
            inner.state = TweenState::Running;
        }
        engine.start(self.anim);
        Ok(())
    }

    /// Flip direction: start and target values swap and the position is
    /// mirrored, so reversing at 30% replays the same 30% backwards.
    pub fn reverse(&self, engine: &mut AnimationEngine) -> EaselResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == TweenState::Destroyed {
                return Err(EaselError::invalid_state("tween has been destroyed"));
            }
            for prop in &mut inner.props {
                std::mem::swap(&mut prop.from, &mut prop.to);
            }
            inner.position = inner.duration.saturating_sub(inner.position);
            inner.state = TweenState::Running;
        }
        engine.start(self.anim);
        Ok(())
    }

    /// Pause at the current position.
    pub fn stop(&self, engine: &mut AnimationEngine) -> EaselResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == TweenState::Destroyed {
                return Err(EaselError::invalid_state("tween has been destroyed"));
            }
            if inner.state == TweenState::Running {
                inner.state = TweenState::Stopped;
            }
        }
        engine.stop(self.anim);
        Ok(())
    }

    /// Unregister from the engine. The handle stays queryable but every
    /// control call fails afterwards.
    pub fn destroy(&self, engine: &mut AnimationEngine) {
        self.inner.borrow_mut().state = TweenState::Destroyed;
        engine.unregister(self.anim);
    }
}

fn step(
    shared: &Rc<RefCell<TweenInner>>,
    stage: &mut Stage,
    frame: FrameInfo,
) -> EaselResult<FrameOutcome> {
    let mut inner = shared.borrow_mut();
    if inner.state != TweenState::Running {
        return Ok(FrameOutcome::Stop);
    }
    inner.position += frame.delta;

    let done = inner.duration.is_zero() || inner.position >= inner.duration;
    let eased = inner.ease.apply(inner.progress());
    let node = inner.node;
    let updates: Vec<(String, f64)> = inner
        .props
        .iter()
        .map(|prop| {
            // Land exactly on the target; eased interpolation at t == 1 can
            // carry float error.
            let value = if done {
                prop.to
            } else {
                prop.from + (prop.to - prop.from) * eased
            };
            (prop.key.clone(), value)
        })
        .collect();
    drop(inner);

    for (key, value) in updates {
        stage.set_attr(node, &key, value)?;
    }

    if done {
        let on_finish = {
            let mut inner = shared.borrow_mut();
            inner.position = inner.duration;
            inner.state = TweenState::Finished;
            inner.on_finish.take()
        };
        // Invoked without holding the borrow so the callback may control
        // the tween through its handle.
        if let Some(mut callback) = on_finish {
            callback(stage);
            shared.borrow_mut().on_finish = Some(callback);
        }
        return Ok(FrameOutcome::Stop);
    }
    Ok(FrameOutcome::Continue)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;

//! Easel is a retained-mode 2D scene-graph renderer with built-in hit
//! testing, batched redraws, and a frame-clock animation engine.
//!
//! # Pipeline overview
//!
//! 1. **Build**: assemble a tree of layers, groups, and shapes under a
//!    [`Stage`]; every node carries a dynamic attribute bag ([`Attrs`]).
//! 2. **Draw**: each layer rasterizes twice through `vello_cpu`, a scene
//!    surface with the styled pixels and a hit surface where every listening
//!    shape is painted in a unique color key.
//! 3. **Interact**: pointer lookups read one hit pixel and decode it through
//!    the layer's [`HitColorRegistry`]; events bubble from the hit shape up
//!    its ancestor chain.
//! 4. **Animate**: an [`AnimationEngine`] drives callbacks and [`Tween`]s
//!    off one shared clock, coalescing layer redraws per frame.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Injected time and scheduling**: the engine never spins a loop; hosts
//!   provide a [`Clock`] and a [`TickScheduler`], and tests step a
//!   [`ManualClock`] deterministically.
//! - **Premultiplied RGBA8** end-to-end: surfaces hold premultiplied pixels.
//! - **Coalesced redraws**: `batch_draw` folds any number of requests into
//!   one draw per layer per tick.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod event;
mod foundation;
mod hit;
mod scene;
mod schedule;
mod surface;

pub use animation::ease::Ease;
pub use animation::engine::{
    AnimId, AnimationEngine, EngineCommands, FrameCallback, FrameInfo, FrameOutcome,
};
pub use animation::tween::{Tween, TweenConfig, TweenState};
pub use event::types::{Event, EventType, ListenerId};
pub use foundation::core::{Affine, BezPath, LocalTransform, NodeId, Point, Rect, Rgba8, Size, Vec2};
pub use foundation::error::{EaselError, EaselResult};
pub use hit::registry::HitColorRegistry;
pub use scene::attrs::{AttrValue, Attrs, TRANSFORM_ATTRS, is_transform_attr};
pub use scene::graph::SceneGraph;
pub use scene::shape::{DrawProcedure, Geometry, ShadowStyle, ShapeStyle, ShapeView};
pub use scene::stage::{DrawStats, Stage, StageConfig};
pub use schedule::clock::{
    Clock, CountingScheduler, ManualClock, MonotonicClock, NoopScheduler, TickScheduler,
};
pub use schedule::redraw::RedrawQueue;
pub use surface::canvas::{CanvasSurface, DrawSession};
pub use surface::filter::{FilterFn, brightness, grayscale, invert};

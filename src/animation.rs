//! Frame-driven animations and attribute tweens.

pub mod ease;
pub mod engine;
pub mod tween;

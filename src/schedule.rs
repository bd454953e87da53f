//! Frame clock, host tick scheduling, and redraw coalescing.

pub mod clock;
pub mod redraw;

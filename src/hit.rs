//! Color-indexed hit testing support.

pub mod registry;

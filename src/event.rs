//! Event vocabulary and listener plumbing.

pub mod types;

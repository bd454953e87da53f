//! Raster surfaces and pixel filters.

pub mod canvas;
pub mod filter;

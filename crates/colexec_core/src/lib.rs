//! Columnar execution core: arrays and blocks, nested column flattening, and
//! scalar function dispatch.

pub mod arrays;
pub mod config;
pub mod functions;
pub mod nested;

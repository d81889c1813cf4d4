//! Bundled backends
//!
//! - [`StdLogger`]: template-rendered lines on any `io::Write`
//! - [`JsonLogger`]: one JSON object per line, fanned out to several sinks
//! - [`RotatingFile`]: size/count/age rotated file usable as a sink by either

pub mod json;
pub mod rotating_file;
pub mod std_logger;
pub mod template;

pub use json::JsonLogger;
pub use rotating_file::{RotatingFile, RotationPolicy};
pub use std_logger::{new_std_logger, StdLogger, DEFAULT_TEMPLATE};
pub use template::Template;

//! Core library: the slide specification generation and normalization
//! pipeline. The transport layer above supplies prompts and request ids;
//! the renderer below consumes the finished specification.

pub mod color;
pub mod design;
pub mod enhance;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod layout;
pub mod limits;
pub mod pipeline;
pub mod planner;
pub mod rules;
pub mod safety;
pub mod sanitize;

pub use error::{PipelineError, Result};
pub use pipeline::SlidePipeline;

//! GPU-side data structures.
//!
//! - `texture` contains the GPU texture wrapper and creation utilities for
//!   color maps and render attachments

pub mod texture;

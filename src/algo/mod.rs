//! Garment processing algorithms.
//!
//! - [`grade`]: move a garment from one avatar to another
//! - [`adjacency`]: face pairs sharing an edge
//! - [`unfold`]: flatten a draped surface into a 2D pattern
//!
//! Long-running operations have a `*_with_progress` variant taking a
//! [`Progress`] callback.

pub mod adjacency;
pub mod grade;
pub mod unfold;

mod progress;

pub use progress::Progress;

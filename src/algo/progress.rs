//! Progress reporting for long-running algorithms.
//!
//! Grading reports once per chunk of garment vertices and unfolding once per
//! placed vertex. The CLI turns these callbacks into a terminal progress bar.
//!
//! # Example
//!
//! ```
//! use drapeflat::algo::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 10, "Grading");
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Number of completed units
/// - `total`: Total number of units
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_report_reaches_callback() {
        let last = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&last);
        let progress = Progress::new(move |current, _, _| {
            seen.store(current, Ordering::Relaxed);
        });

        progress.report(7, 10, "Unfolding");
        assert_eq!(last.load(Ordering::Relaxed), 7);

        Progress::none().report(1, 1, "ignored");
    }
}

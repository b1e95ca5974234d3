//! Progress reporting for the relief pipeline.
//!
//! The displacement computation walks a fixed list of [`Stage`]s, and the
//! smoothing pass reports one step per iteration. Both go through the same
//! [`Progress`] callback so a host UI or the CLI can draw a single bar.
//!
//! # Example
//!
//! ```
//! use relief::algo::progress::{Progress, Stage};
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! progress.stage(Stage::ColumnAxis);
//! progress.report(3, 5, "Laplacian smoothing");
//! ```

use std::fmt;

/// Steps of the displacement computation, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Quadrant split, loop ordering, and grid indexing.
    Grid,
    /// Extrusion walking down each column.
    ColumnAxis,
    /// Extrusion walking along each row.
    RowAxis,
    /// Merging both axes into the map.
    Blend,
    /// The map is complete.
    Done,
}

impl Stage {
    /// Number of stages before [`Stage::Done`].
    pub const COUNT: usize = 4;

    /// Position of the stage, `Done` being [`Stage::COUNT`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Grid => "Building grid",
            Stage::ColumnAxis => "Column-axis extrusion",
            Stage::RowAxis => "Row-axis extrusion",
            Stage::Blend => "Blending",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A progress callback that receives `(current, total, message)` updates.
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

    /// A reporter that discards every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }

    /// Report a raw step count.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report entry into a pipeline stage.
    #[inline]
    pub fn stage(&self, stage: Stage) {
        self.report(stage.index(), Stage::COUNT, stage.label());
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_stages_are_ordered() {
        let indices: Vec<usize> = [Stage::Grid, Stage::ColumnAxis, Stage::RowAxis, Stage::Blend, Stage::Done]
            .iter()
            .map(|s| s.index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(Stage::Done.index(), Stage::COUNT);
    }

    #[test]
    fn test_stage_reports_label() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = Progress::new(move |current, total, message| {
            sink.lock().unwrap().push((current, total, message.to_string()));
        });

        progress.stage(Stage::RowAxis);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(2, 4, "Row-axis extrusion".to_string())]);
    }
}

//! Relief parameters.
//!
//! [`ReliefOptions`] bundles everything a single relief invocation needs
//! besides the patch and the two curves. It can be built in code with the
//! `with_*` setters or loaded from JSON:
//!
//! ```
//! use relief::config::ReliefOptions;
//!
//! let options = ReliefOptions::from_json(r#"{ "height": 4.0, "grid": { "gap_offset": 5.0 } }"#).unwrap();
//! assert_eq!(options.height, 4.0);
//! assert_eq!(options.smooth_amount, 5);
//! assert_eq!(options.grid.gap_offset, 5.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ReliefError, Result};

/// Parameters for grid construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridOptions {
    /// Minimum angular discontinuity (degrees) that counts as the loop's gap.
    pub gap_offset: f64,

    /// Boundary vertices closer than this (degrees) share a column.
    pub column_tolerance: f64,

    /// Vertices closer than this in Z share a row.
    pub row_tolerance: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            gap_offset: 2.0,
            column_tolerance: 1e-6,
            row_tolerance: 1e-6,
        }
    }
}

impl GridOptions {
    /// Set the angular gap threshold.
    pub fn with_gap_offset(mut self, degrees: f64) -> Self {
        self.gap_offset = degrees;
        self
    }

    /// Set the column merge tolerance.
    pub fn with_column_tolerance(mut self, degrees: f64) -> Self {
        self.column_tolerance = degrees;
        self
    }

    /// Set the row merge tolerance.
    pub fn with_row_tolerance(mut self, tolerance: f64) -> Self {
        self.row_tolerance = tolerance;
        self
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.gap_offset.is_finite() && self.gap_offset >= 0.0) {
            return Err(ReliefError::invalid_param("gap_offset", self.gap_offset, "must be finite and non-negative"));
        }
        if !(self.column_tolerance.is_finite() && self.column_tolerance >= 0.0) {
            return Err(ReliefError::invalid_param(
                "column_tolerance",
                self.column_tolerance,
                "must be finite and non-negative",
            ));
        }
        if !(self.row_tolerance.is_finite() && self.row_tolerance >= 0.0) {
            return Err(ReliefError::invalid_param("row_tolerance", self.row_tolerance, "must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Parameters for one relief invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReliefOptions {
    /// Target peak displacement in millimeters.
    pub height: f64,

    /// Smoothing iterations applied to the patch after displacement.
    pub smooth_amount: usize,

    /// Grid construction parameters.
    pub grid: GridOptions,
}

impl Default for ReliefOptions {
    fn default() -> Self {
        Self {
            height: 2.0,
            smooth_amount: 5,
            grid: GridOptions::default(),
        }
    }
}

impl ReliefOptions {
    /// Set the target height in millimeters.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Set the number of smoothing iterations.
    pub fn with_smooth_amount(mut self, iterations: usize) -> Self {
        self.smooth_amount = iterations;
        self
    }

    /// Set the grid parameters.
    pub fn with_grid(mut self, grid: GridOptions) -> Self {
        self.grid = grid;
        self
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.height.is_finite() {
            return Err(ReliefError::invalid_param("height", self.height, "must be finite"));
        }
        self.grid.validate()
    }

    /// Load options from a JSON string. Missing fields take their defaults.
    pub fn from_json(json_str: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json_str)?;
        options.validate()?;
        Ok(options)
    }

    /// Serialize options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReliefOptions::default();
        assert_eq!(options.height, 2.0);
        assert_eq!(options.smooth_amount, 5);
        assert_eq!(options.grid.gap_offset, 2.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let options = ReliefOptions::default()
            .with_height(10.0)
            .with_smooth_amount(0)
            .with_grid(GridOptions::default().with_gap_offset(3.5));

        let json = options.to_json().unwrap();
        let parsed = ReliefOptions::from_json(&json).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ReliefOptions::from_json(r#"{ "height": 1.0, "depth": 2.0 }"#);
        assert!(matches!(result, Err(ReliefError::Json(_))));
    }

    #[test]
    fn test_grid_setters_validate() {
        let grid = GridOptions::default().with_column_tolerance(0.5).with_row_tolerance(0.01);
        assert_eq!(grid.column_tolerance, 0.5);
        assert!(grid.validate().is_ok());

        let result = GridOptions::default().with_column_tolerance(-1.0).validate();
        assert!(matches!(
            result,
            Err(ReliefError::InvalidParameter { name: "column_tolerance", .. })
        ));
    }

    #[test]
    fn test_negative_gap_offset_rejected() {
        let result = ReliefOptions::from_json(r#"{ "grid": { "gap_offset": -1.0 } }"#);
        assert!(matches!(
            result,
            Err(ReliefError::InvalidParameter { name: "gap_offset", .. })
        ));
    }
}

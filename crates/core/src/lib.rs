//! # knnmap Core
//!
//! Core types, traits and I/O for the knnmap library.
//!
//! This crate provides:
//! - `Feature` / `FeatureCollection`: point and result features with attributes
//! - `Schema`: attribute field descriptors
//! - `ProgressListener`: progress reporting and cooperative cancellation
//! - Algorithm trait for consistent API
//! - GeoJSON I/O

pub mod error;
pub mod io;
pub mod progress;
pub mod vector;

pub use error::{Error, Result};
pub use progress::{CancelFlag, NullProgress, ProgressListener};
pub use vector::{AttributeValue, Feature, FeatureCollection, Schema};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::progress::{NullProgress, ProgressListener};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, Schema};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in knnmap.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

//! Domain models for patient records.

mod patient;
mod update;
mod validation;

pub use patient::*;
pub use update::*;
pub use validation::*;

//! The experiment session: which experiment is active and every operation
//! performed against it.

pub mod error;
pub mod experiment;
pub mod registry;

pub use error::SessionError;
pub use experiment::{ActiveSummary, Experiment, TrackingRow};
pub use registry::{ExperimentRegistry, RegistryConfig, SwitchOutcome};

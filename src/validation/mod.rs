//! Validation of pipelines against operation schemas and structural rules.
//!
//! The [`engine`] drives a run; [`steps`] checks parameter bindings and
//! [`pipeline`] checks wiring, reachability and stream interfaces.

pub mod engine;
pub mod pipeline;
pub mod steps;

pub use engine::{RunStats, ValidationRun, Validator};
pub use pipeline::{
    CycleRule, ExitHasSuccessorRule, ForeignStepRule, InterfaceRule, MalformedWiringRule,
    OrphanStepRule, PipelineInput, PipelineInterfaceRule, PipelineRule, PipelineValidator,
};
pub use steps::{StepOutcome, StepValidator, ValidatedStep};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::model::PlanningRun;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Scenario cannot be turned into demand and capacity. Fatal for the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("Kitchen capacity is zero; no orders can be produced")]
    NoKitchenCapacity,

    #[error("Restaurant has no order channel (no drive-thru lanes and no POS terminals)")]
    NoOrderChannel,

    #[error("Day of week '{stated}' does not match date {date} ({actual})")]
    DayMismatch {
        stated: String,
        date: chrono::NaiveDate,
        actual: String,
    },

    #[error("Shift length must be positive, got {0} hours")]
    InvalidShiftHours(f64),
}

/// No valid initial option. Fatal for the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("No feasible staffing: ceiling of {ceiling} staff is below the required minimum of {required}")]
    Infeasible { ceiling: u32, required: u32 },

    #[error("Generated option breaks a constraint: {0}")]
    ConstraintViolation(String),
}

/// Outcome prediction failed for one candidate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Staffing schedules no staff")]
    NoStaff,

    #[error("Demand is invalid: {0}")]
    InvalidDemand(String),
}

/// Scoring failed for one candidate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Metric '{metric}' has invalid value {value}")]
    InvalidMetric { metric: &'static str, value: f64 },

    #[error("Target '{target}' must be positive, got {value}")]
    InvalidTarget { target: &'static str, value: f64 },

    #[error("Objective weights must be finite, non-negative and sum above zero")]
    InvalidWeights,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefinementError {
    #[error("Refinement history is empty")]
    EmptyHistory,

    #[error("Refinement failed: {0}")]
    Failed(String),
}

/// Outcome of a guarded capability call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError<E: std::error::Error + 'static> {
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Failed(E),
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Context resolution failed: {0}")]
    Context(#[from] ContextError),

    #[error("Baseline generation failed: {0}")]
    Generation(#[from] CallError<GenerationError>),

    #[error("Baseline simulation failed: {0}")]
    BaselineSimulation(CallError<SimulationError>),

    #[error("Baseline scoring failed: {0}")]
    BaselineScoring(CallError<ScoringError>),

    #[error("Iteration {0} produced no scored candidates")]
    EmptyIteration(u32),

    #[error("Failed to acquire semaphore: {0}")]
    Semaphore(#[from] tokio::sync::AcquireError),
}

/// A run that ended in `failed`, with the trace recorded up to that point
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: PlanError,
    pub run: Box<PlanningRun>,
}

#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("Run has no selected plan to compare against")]
    NoSelection,

    #[error("Actual metric '{metric}' has invalid value {value}")]
    InvalidActual { metric: &'static str, value: f64 },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

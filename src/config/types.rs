use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;
use crate::model::{AlignmentTargets, Constraints, ObjectiveWeights, Station};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub call: CallConfig,

    #[serde(default)]
    pub targets: AlignmentTargets,

    #[serde(default)]
    pub weights: ObjectiveWeights,

    #[serde(default)]
    pub constraints: Constraints,

    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PlanningConfig {
    /// Refinement rounds after the baseline (0 = baseline only)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Minimum gain over the best-ever overall score to keep refining
    #[serde(default = "default_min_improvement")]
    pub min_improvement: f64,

    /// Stop as soon as the best overall score reaches this value
    #[serde(default)]
    pub target_score: Option<f64>,

    #[serde(default = "default_candidates_per_iteration")]
    pub candidates_per_iteration: usize,

    /// Candidates evaluated in parallel within one round
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub empty_iteration: EmptyIterationPolicy,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            min_improvement: default_min_improvement(),
            target_score: None,
            candidates_per_iteration: default_candidates_per_iteration(),
            concurrency: default_concurrency(),
            empty_iteration: EmptyIterationPolicy::default(),
        }
    }
}

/// What to do when a refinement round yields no scored candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EmptyIterationPolicy {
    /// Stop and select the best option found so far
    #[default]
    Select,
    /// Fail the run
    Fail,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CallConfig {
    /// Per-attempt deadline for every capability call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    /// Total attempts per call, 1 or 2
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Operating constants of the heuristic demand and queue models
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ModelConfig {
    #[serde(default = "default_shift_hours")]
    pub shift_hours: f64,

    #[serde(default = "default_hourly_wage")]
    pub hourly_wage: f64,

    /// Food cost as a fraction of revenue
    #[serde(default = "default_food_cost_ratio")]
    pub food_cost_ratio: f64,

    #[serde(default = "default_drive_thru_ticket")]
    pub drive_thru_ticket: f64,

    #[serde(default = "default_counter_ticket")]
    pub counter_ticket: f64,

    /// Orders/hour one drive-thru worker handles
    #[serde(default = "default_drive_thru_rate")]
    pub drive_thru_rate: f64,

    /// Orders/hour one cook produces
    #[serde(default = "default_kitchen_rate")]
    pub kitchen_rate: f64,

    /// Orders/hour one cashier takes
    #[serde(default = "default_counter_rate")]
    pub counter_rate: f64,

    #[serde(default = "default_drive_thru_lane_capacity")]
    pub drive_thru_lane_capacity: f64,

    #[serde(default = "default_pos_terminal_capacity")]
    pub pos_terminal_capacity: f64,

    /// Wait every guest sees with no queueing at all
    #[serde(default = "default_base_service_seconds")]
    pub base_service_seconds: f64,

    /// Upper bound of any predicted wait
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: f64,

    /// Utilization above which a station counts as a bottleneck
    #[serde(default = "default_high_water_utilization")]
    pub high_water_utilization: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            shift_hours: default_shift_hours(),
            hourly_wage: default_hourly_wage(),
            food_cost_ratio: default_food_cost_ratio(),
            drive_thru_ticket: default_drive_thru_ticket(),
            counter_ticket: default_counter_ticket(),
            drive_thru_rate: default_drive_thru_rate(),
            kitchen_rate: default_kitchen_rate(),
            counter_rate: default_counter_rate(),
            drive_thru_lane_capacity: default_drive_thru_lane_capacity(),
            pos_terminal_capacity: default_pos_terminal_capacity(),
            base_service_seconds: default_base_service_seconds(),
            max_wait_seconds: default_max_wait_seconds(),
            high_water_utilization: default_high_water_utilization(),
        }
    }
}

impl ModelConfig {
    /// Orders/hour one staff member serves at a station
    pub fn rate(&self, station: Station) -> f64 {
        match station {
            Station::DriveThru => self.drive_thru_rate,
            Station::Kitchen => self.kitchen_rate,
            Station::FrontCounter => self.counter_rate,
        }
    }

    /// Labor cost of a headcount over the full shift
    pub fn labor_cost(&self, staff: u32) -> f64 {
        staff as f64 * self.hourly_wage * self.shift_hours
    }
}

mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use crate::model::{AlignmentTargets, Constraints, ObjectiveWeights};
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            planning: PlanningConfig::default(),
            call: CallConfig::default(),
            targets: AlignmentTargets::default(),
            weights: ObjectiveWeights::default(),
            constraints: Constraints::default(),
            model: ModelConfig::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a positive number, got {}", value)))
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise `shiftplan.yaml` in the working
    /// directory when present, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new("shiftplan.yaml");
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let planning = &self.planning;
        if !planning.min_improvement.is_finite() || planning.min_improvement < 0.0 {
            return Err(invalid("planning.min_improvement", "must be zero or positive"));
        }
        if let Some(target) = planning.target_score {
            if !(target > 0.0 && target <= 1.0) {
                return Err(invalid("planning.target_score", "must be in (0, 1]"));
            }
        }
        if planning.candidates_per_iteration == 0 {
            return Err(invalid("planning.candidates_per_iteration", "must be at least 1"));
        }
        if planning.concurrency == 0 {
            return Err(invalid("planning.concurrency", "must be at least 1"));
        }

        if self.call.timeout_ms == 0 {
            return Err(invalid("call.timeout_ms", "must be at least 1"));
        }
        // A call is retried at most once
        if !(1..=2).contains(&self.call.retry.max_attempts) {
            return Err(invalid("call.retry.max_attempts", "must be 1 or 2"));
        }

        validate_targets(&self.targets)?;

        if self.weights.normalized().is_none() {
            return Err(invalid(
                "weights",
                "must be finite, non-negative and sum above zero",
            ));
        }

        if let Some(hours) = self.constraints.budget_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(invalid("constraints.budget_hours", "must be zero or positive"));
            }
        }

        let floors = self.constraints.min_staff_per_station.total();
        if floors > self.constraints.available_staff {
            return Err(invalid(
                "constraints.min_staff_per_station",
                format!(
                    "floors need {} staff but only {} are available",
                    floors, self.constraints.available_staff
                ),
            ));
        }

        let model = &self.model;
        require_positive("model.shift_hours", model.shift_hours)?;
        require_positive("model.hourly_wage", model.hourly_wage)?;
        require_positive("model.drive_thru_ticket", model.drive_thru_ticket)?;
        require_positive("model.counter_ticket", model.counter_ticket)?;
        require_positive("model.drive_thru_rate", model.drive_thru_rate)?;
        require_positive("model.kitchen_rate", model.kitchen_rate)?;
        require_positive("model.counter_rate", model.counter_rate)?;
        require_positive("model.drive_thru_lane_capacity", model.drive_thru_lane_capacity)?;
        require_positive("model.pos_terminal_capacity", model.pos_terminal_capacity)?;
        require_positive("model.max_wait_seconds", model.max_wait_seconds)?;
        if !(0.0..1.0).contains(&model.food_cost_ratio) {
            return Err(invalid("model.food_cost_ratio", "must be in [0, 1)"));
        }
        if !model.base_service_seconds.is_finite()
            || model.base_service_seconds < 0.0
            || model.base_service_seconds > model.max_wait_seconds
        {
            return Err(invalid(
                "model.base_service_seconds",
                "must be between 0 and max_wait_seconds",
            ));
        }
        if !(model.high_water_utilization > 0.0 && model.high_water_utilization <= 1.0) {
            return Err(invalid("model.high_water_utilization", "must be in (0, 1]"));
        }

        Ok(())
    }
}

pub fn validate_targets(targets: &AlignmentTargets) -> Result<(), ConfigError> {
    require_positive("targets.labor_cost_pct", targets.labor_cost_pct)?;
    require_positive("targets.wait_seconds", targets.wait_seconds)?;
    if !(targets.utilization > 0.0 && targets.utilization < 1.0) {
        return Err(invalid("targets.utilization", "must be in (0, 1)"));
    }
    if !targets.utilization_band.is_finite() || targets.utilization_band < 0.0 {
        return Err(invalid("targets.utilization_band", "must be zero or positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.planning.max_iterations, 3);
        assert_eq!(config.call.retry.max_attempts, 2);
        assert_eq!(config.constraints.available_staff, 15);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
output_dir: out
planning:
  max_iterations: 5
  empty_iteration: fail
weights:
  profit: 1.0
  guest_satisfaction: 1.0
  staff_wellbeing: 0.0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.planning.max_iterations, 5);
        assert_eq!(config.planning.empty_iteration, EmptyIterationPolicy::Fail);
        assert_eq!(config.planning.concurrency, 4);
        assert_eq!(config.model.kitchen_rate, 22.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_more_than_one_retry() {
        let mut config = Config::default();
        config.call.retry.max_attempts = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "call.retry.max_attempts", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_weights() {
        let mut config = Config::default();
        config.weights = ObjectiveWeights {
            profit: 0.0,
            guest_satisfaction: 0.0,
            staff_wellbeing: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_floors_above_available_staff() {
        let mut config = Config::default();
        config.constraints.available_staff = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "constraints.min_staff_per_station", .. })
        ));

        config.constraints.available_staff = 15;
        config.constraints.min_staff_per_station.drive_thru = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/shiftplan.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}

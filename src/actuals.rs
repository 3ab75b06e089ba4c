use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ComparisonError;
use crate::model::{PlanningRun, Staffing};

/// What actually happened on the shift the plan was made for
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ActualMetrics {
    pub customers_served: u32,

    pub revenue: f64,

    #[serde(alias = "avg_wait_time_seconds")]
    pub avg_wait_seconds: f64,

    pub labor_cost: f64,

    /// Observed fraction of paid time spent serving, if tracked
    #[serde(default)]
    pub staff_utilization: Option<f64>,

    #[serde(default)]
    pub reported_issues: Vec<String>,
}

/// Accuracy of a single metric prediction by absolute error %
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBand {
    Excellent,
    Good,
    Acceptable,
    Poor,
    VeryPoor,
}

impl AccuracyBand {
    pub fn from_error_pct(error_pct: f64) -> Self {
        let magnitude = error_pct.abs();
        if magnitude < 5.0 {
            AccuracyBand::Excellent
        } else if magnitude < 10.0 {
            AccuracyBand::Good
        } else if magnitude < 20.0 {
            AccuracyBand::Acceptable
        } else if magnitude < 30.0 {
            AccuracyBand::Poor
        } else {
            AccuracyBand::VeryPoor
        }
    }
}

impl std::fmt::Display for AccuracyBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccuracyBand::Excellent => write!(f, "excellent"),
            AccuracyBand::Good => write!(f, "good"),
            AccuracyBand::Acceptable => write!(f, "acceptable"),
            AccuracyBand::Poor => write!(f, "poor"),
            AccuracyBand::VeryPoor => write!(f, "very_poor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PredictionQuality {
    pub fn from_mean_error_pct(mean: f64) -> Self {
        if mean < 5.0 {
            PredictionQuality::Excellent
        } else if mean < 10.0 {
            PredictionQuality::Good
        } else if mean < 20.0 {
            PredictionQuality::Fair
        } else {
            PredictionQuality::Poor
        }
    }
}

impl std::fmt::Display for PredictionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionQuality::Excellent => write!(f, "excellent"),
            PredictionQuality::Good => write!(f, "good"),
            PredictionQuality::Fair => write!(f, "fair"),
            PredictionQuality::Poor => write!(f, "poor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub predicted: f64,
    pub actual: f64,
    pub absolute_error: f64,
    /// (actual - predicted) / predicted x 100
    pub error_pct: f64,
    pub band: AccuracyBand,
}

impl MetricComparison {
    fn new(metric: &str, predicted: f64, actual: f64) -> Self {
        let error_pct = if predicted != 0.0 {
            (actual - predicted) / predicted * 100.0
        } else if actual == 0.0 {
            0.0
        } else {
            // Nothing predicted but something happened: a full miss
            100.0_f64.copysign(actual)
        };
        Self {
            metric: metric.to_string(),
            predicted,
            actual,
            absolute_error: (actual - predicted).abs(),
            error_pct,
            band: AccuracyBand::from_error_pct(error_pct),
        }
    }
}

/// Per-metric comparison of a run's selected plan against observed results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub run_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub option_id: String,
    pub staffing: Staffing,
    pub comparisons: Vec<MetricComparison>,
    pub mean_abs_error_pct: f64,
    pub prediction_quality: PredictionQuality,
    pub reported_issues: Vec<String>,
}

impl ComparisonReport {
    pub fn worst(&self) -> Option<&MetricComparison> {
        self.comparisons
            .iter()
            .max_by(|a, b| a.error_pct.abs().total_cmp(&b.error_pct.abs()))
    }
}

fn check_actual(metric: &'static str, value: f64) -> Result<(), ComparisonError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ComparisonError::InvalidActual { metric, value })
    }
}

/// Compare the selected plan's predictions with what actually happened
pub fn evaluate_actuals(
    run: &PlanningRun,
    actual: &ActualMetrics,
) -> Result<ComparisonReport, ComparisonError> {
    let best = run.best.as_ref().ok_or(ComparisonError::NoSelection)?;

    check_actual("revenue", actual.revenue)?;
    check_actual("avg_wait_seconds", actual.avg_wait_seconds)?;
    check_actual("labor_cost", actual.labor_cost)?;
    if let Some(utilization) = actual.staff_utilization {
        if !(0.0..=1.0).contains(&utilization) {
            return Err(ComparisonError::InvalidActual {
                metric: "staff_utilization",
                value: utilization,
            });
        }
    }

    let predicted = &best.evaluation.result.metrics;
    let mut comparisons = vec![
        MetricComparison::new(
            "customers_served",
            predicted.customers_served as f64,
            actual.customers_served as f64,
        ),
        MetricComparison::new("revenue", predicted.revenue, actual.revenue),
        MetricComparison::new("avg_wait_seconds", predicted.avg_wait_seconds, actual.avg_wait_seconds),
        MetricComparison::new("labor_cost", predicted.labor_cost, actual.labor_cost),
    ];
    if let Some(utilization) = actual.staff_utilization {
        comparisons.push(MetricComparison::new(
            "staff_utilization",
            predicted.staff_utilization,
            utilization,
        ));
    }

    let mean_abs_error_pct =
        comparisons.iter().map(|c| c.error_pct.abs()).sum::<f64>() / comparisons.len() as f64;
    let prediction_quality = PredictionQuality::from_mean_error_pct(mean_abs_error_pct);

    info!(
        "Run {}: mean prediction error {:.1}% ({})",
        run.run_id, mean_abs_error_pct, prediction_quality
    );

    Ok(ComparisonReport {
        run_id: run.run_id.clone(),
        evaluated_at: Utc::now(),
        option_id: best.evaluation.option.id.clone(),
        staffing: best.evaluation.option.staffing,
        comparisons,
        mean_abs_error_pct,
        prediction_quality,
        reported_issues: actual.reported_issues.clone(),
    })
}

use async_trait::async_trait;

use crate::error::ScoringError;
use crate::model::{
    AlignmentTargets, Objective, ObjectiveScore, ObjectiveWeights, PredictedMetrics, Ranking,
    ScoreCard, SimulationResult, StaffingOption,
};

use super::Scorer;

/// Utilization distance past the band over which wellbeing falls to zero
pub const WELLBEING_DECAY: f64 = 0.15;

const STRENGTH_THRESHOLD: f64 = 0.85;
const WEAKNESS_THRESHOLD: f64 = 0.5;

/// Scores predicted metrics by their deviation from operator targets. Pure:
/// identical inputs always produce an identical scorecard.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetScorer;

/// Full credit at or below `target`, falling linearly to zero at twice the target
fn under_target(actual: f64, target: f64) -> f64 {
    1.0 - ((actual - target) / target).clamp(0.0, 1.0)
}

pub fn profit_score(labor_cost_pct: f64, target_pct: f64) -> f64 {
    under_target(labor_cost_pct, target_pct)
}

pub fn guest_score(wait_seconds: f64, target_seconds: f64, accuracy: f64) -> f64 {
    under_target(wait_seconds, target_seconds) * accuracy
}

/// Two-sided: full credit inside the band, decaying linearly on either side
pub fn wellbeing_score(utilization: f64, midpoint: f64, band: f64) -> f64 {
    let distance = (utilization - midpoint).abs();
    if distance <= band {
        1.0
    } else {
        (1.0 - (distance - band) / WELLBEING_DECAY).max(0.0)
    }
}

fn check_metric(metric: &'static str, value: f64) -> Result<(), ScoringError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScoringError::InvalidMetric { metric, value })
    }
}

fn check_fraction(metric: &'static str, value: f64) -> Result<(), ScoringError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::InvalidMetric { metric, value })
    }
}

fn check_target(target: &'static str, value: f64) -> Result<(), ScoringError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScoringError::InvalidTarget { target, value })
    }
}

fn validate(metrics: &PredictedMetrics, targets: &AlignmentTargets) -> Result<(), ScoringError> {
    check_metric("revenue", metrics.revenue)?;
    check_metric("labor_cost", metrics.labor_cost)?;
    check_metric("food_cost", metrics.food_cost)?;
    check_metric("avg_wait_seconds", metrics.avg_wait_seconds)?;
    check_fraction("staff_utilization", metrics.staff_utilization)?;
    check_fraction("order_accuracy", metrics.order_accuracy)?;

    check_target("labor_cost_pct", targets.labor_cost_pct)?;
    check_target("wait_seconds", targets.wait_seconds)?;
    check_target("utilization", targets.utilization)?;
    if !targets.utilization_band.is_finite() || targets.utilization_band < 0.0 {
        return Err(ScoringError::InvalidTarget {
            target: "utilization_band",
            value: targets.utilization_band,
        });
    }
    Ok(())
}

fn objective(
    objective: Objective,
    raw: f64,
    weight: f64,
    actual: Option<f64>,
    target: f64,
    detail: String,
) -> ObjectiveScore {
    ObjectiveScore {
        objective,
        raw_score: raw,
        weight,
        weighted: weight * raw,
        actual,
        target,
        detail,
    }
}

fn recommendation(ranking: Ranking, weakest: &ObjectiveScore) -> String {
    match ranking {
        Ranking::Excellent => "Adopt this plan; every objective is on target".to_string(),
        Ranking::VeryGood => format!("Strong plan; keep an eye on {}", weakest.objective),
        Ranking::Good => format!("Workable plan; {} has the most room to improve", weakest.objective),
        Ranking::Fair => format!("Marginal plan; rebalance staff to lift {}", weakest.objective),
        Ranking::Poor => format!("Not recommended; {} is far off target", weakest.objective),
    }
}

#[async_trait]
impl Scorer for TargetScorer {
    fn name(&self) -> &'static str {
        "targets"
    }

    async fn score(
        &self,
        _option: &StaffingOption,
        result: &SimulationResult,
        targets: &AlignmentTargets,
        weights: &ObjectiveWeights,
    ) -> Result<ScoreCard, ScoringError> {
        let metrics = &result.metrics;
        validate(metrics, targets)?;
        let weights = weights.normalized().ok_or(ScoringError::InvalidWeights)?;

        let labor_pct = metrics.labor_cost_pct();
        let profit = objective(
            Objective::Profit,
            labor_pct
                .map(|pct| profit_score(pct, targets.labor_cost_pct))
                .unwrap_or(0.0),
            weights.profit,
            labor_pct,
            targets.labor_cost_pct,
            match labor_pct {
                Some(pct) => format!(
                    "labor at {:.1}% of revenue (target {:.1}%)",
                    pct, targets.labor_cost_pct
                ),
                None => format!(
                    "no revenue against ${:.2} labor (target {:.1}%)",
                    metrics.labor_cost, targets.labor_cost_pct
                ),
            },
        );

        let guest = objective(
            Objective::GuestSatisfaction,
            guest_score(metrics.avg_wait_seconds, targets.wait_seconds, metrics.order_accuracy),
            weights.guest_satisfaction,
            Some(metrics.avg_wait_seconds),
            targets.wait_seconds,
            format!(
                "average wait {:.0}s (target {:.0}s), accuracy {:.1}%",
                metrics.avg_wait_seconds,
                targets.wait_seconds,
                metrics.order_accuracy * 100.0
            ),
        );

        let wellbeing = objective(
            Objective::StaffWellbeing,
            wellbeing_score(metrics.staff_utilization, targets.utilization, targets.utilization_band),
            weights.staff_wellbeing,
            Some(metrics.staff_utilization),
            targets.utilization,
            format!(
                "utilization {:.0}% (comfortable {:.0}-{:.0}%)",
                metrics.staff_utilization * 100.0,
                (targets.utilization - targets.utilization_band) * 100.0,
                (targets.utilization + targets.utilization_band) * 100.0
            ),
        );

        let overall = profit.weighted + guest.weighted + wellbeing.weighted;
        let ranking = Ranking::from_score(overall);

        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        for score in [&profit, &guest, &wellbeing] {
            if score.raw_score >= STRENGTH_THRESHOLD {
                strengths.push(format!("{}: {}", score.objective, score.detail));
            } else if score.raw_score <= WEAKNESS_THRESHOLD {
                weaknesses.push(format!("{}: {}", score.objective, score.detail));
            }
        }

        let mut card = ScoreCard {
            profit,
            guest_satisfaction: guest,
            staff_wellbeing: wellbeing,
            overall_score: overall,
            ranking,
            strengths,
            weaknesses,
            recommendation: String::new(),
        };
        card.recommendation = recommendation(ranking, card.weakest());
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskLevel, Staffing, Station, StationLoad};

    fn result(revenue: f64, labor: f64, wait: f64, utilization: f64, accuracy: f64) -> SimulationResult {
        SimulationResult {
            metrics: PredictedMetrics {
                customers_served: 400,
                revenue,
                avg_wait_seconds: wait,
                peak_wait_seconds: wait,
                max_queue_length: 3,
                labor_cost: labor,
                food_cost: revenue * 0.28,
                staff_utilization: utilization,
                order_accuracy: accuracy,
            },
            station_loads: vec![StationLoad {
                station: Station::Kitchen,
                staff: 6,
                demand_per_hour: 100.0,
                capacity_per_hour: 132.0,
                utilization,
                equipment_bound: false,
            }],
            key_events: Vec::new(),
            bottlenecks: Vec::new(),
            confidence: 0.9,
        }
    }

    fn option() -> StaffingOption {
        StaffingOption::new("test", Staffing::new(4, 6, 2), 960.0, RiskLevel::Low, "")
    }

    async fn score(result: &SimulationResult) -> Result<ScoreCard, ScoringError> {
        TargetScorer
            .score(&option(), result, &AlignmentTargets::default(), &ObjectiveWeights::default())
            .await
    }

    #[tokio::test]
    async fn test_balanced_plan_scores() {
        let card = score(&result(4070.79, 960.0, 202.6, 0.6883, 0.97)).await.unwrap();

        assert_eq!(card.profit.raw_score, 1.0);
        assert!((card.guest_satisfaction.raw_score - 0.8482).abs() < 1e-3);
        assert!((card.staff_wellbeing.raw_score - 0.6554).abs() < 1e-3);
        assert!((card.overall_score - 0.8607).abs() < 1e-3);
        assert_eq!(card.ranking, Ranking::VeryGood);
        assert_eq!(card.weakest().objective, Objective::StaffWellbeing);
        assert!(card.recommendation.contains("staff_wellbeing"));
        assert_eq!(card.strengths.len(), 1);
        assert!(card.weaknesses.is_empty());
    }

    #[tokio::test]
    async fn test_scoring_is_pure() {
        let input = result(3000.0, 1100.0, 250.0, 0.9, 0.95);
        let first = score(&input).await.unwrap();
        let second = score(&input).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_scores_bounded_and_sum_to_overall() {
        let cases = [
            result(4000.0, 900.0, 120.0, 0.82, 0.97),
            result(1000.0, 1200.0, 900.0, 1.0, 0.0),
            result(5000.0, 400.0, 60.0, 0.1, 1.0),
            result(2500.0, 1000.0, 300.0, 0.55, 0.9),
        ];
        for case in &cases {
            let card = score(case).await.unwrap();
            let mut sum = 0.0;
            for objective in card.objectives() {
                assert!((0.0..=1.0).contains(&objective.raw_score));
                assert!((0.0..=1.0).contains(&objective.weighted));
                assert!((objective.weighted - objective.weight * objective.raw_score).abs() < 1e-12);
                sum += objective.weighted;
            }
            assert!((card.overall_score - sum).abs() < 1e-9);
            assert!((0.0..=1.0).contains(&card.overall_score));
        }
    }

    #[tokio::test]
    async fn test_unnormalized_weights_are_rescaled() {
        let weights = ObjectiveWeights {
            profit: 4.0,
            guest_satisfaction: 3.5,
            staff_wellbeing: 2.5,
        };
        let input = result(4070.79, 960.0, 202.6, 0.6883, 0.97);
        let rescaled = TargetScorer
            .score(&option(), &input, &AlignmentTargets::default(), &weights)
            .await
            .unwrap();
        let default = score(&input).await.unwrap();
        assert!((rescaled.overall_score - default.overall_score).abs() < 1e-9);
    }

    #[test]
    fn test_wellbeing_midpoint_and_symmetry() {
        assert_eq!(wellbeing_score(0.82, 0.82, 0.08), 1.0);
        assert_eq!(wellbeing_score(0.82, 0.82, 0.0), 1.0);
        for delta in [0.05, 0.1, 0.15, 0.2, 0.3] {
            let above = wellbeing_score(0.82 + delta, 0.82, 0.08);
            let below = wellbeing_score(0.82 - delta, 0.82, 0.08);
            assert!((above - below).abs() < 1e-9);
        }
        assert_eq!(wellbeing_score(0.40, 0.82, 0.08), 0.0);
    }

    #[test]
    fn test_profit_and_guest_curves() {
        assert_eq!(profit_score(25.0, 30.0), 1.0);
        assert!((profit_score(45.0, 30.0) - 0.5).abs() < 1e-12);
        assert_eq!(profit_score(f64::INFINITY, 30.0), 0.0);
        assert_eq!(guest_score(900.0, 180.0, 1.0), 0.0);
        assert!((guest_score(180.0, 180.0, 0.9) - 0.9).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_zero_revenue_scores_zero_profit() {
        let card = score(&result(0.0, 960.0, 900.0, 1.0, 0.9)).await.unwrap();
        assert_eq!(card.profit.raw_score, 0.0);
        assert_eq!(card.profit.actual, None);
        assert!(card.profit.detail.contains("no revenue"));
        assert!(!card.profit.detail.contains("inf"));
        assert_eq!(card.ranking, Ranking::Poor);
    }

    #[tokio::test]
    async fn test_zero_revenue_card_survives_json() {
        let card = score(&result(0.0, 960.0, 900.0, 1.0, 0.9)).await.unwrap();
        let json = serde_json::to_string(&card).unwrap();
        let back: ScoreCard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let err = score(&result(4000.0, -1.0, 200.0, 0.8, 0.97)).await.unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidMetric {
                metric: "labor_cost",
                value: -1.0
            }
        );

        let err = score(&result(4000.0, 900.0, 200.0, 1.2, 0.97)).await.unwrap_err();
        assert!(matches!(err, ScoringError::InvalidMetric { metric: "staff_utilization", .. }));

        let err = score(&result(4000.0, 900.0, f64::NAN, 0.8, 0.97)).await.unwrap_err();
        assert!(matches!(err, ScoringError::InvalidMetric { metric: "avg_wait_seconds", .. }));

        let zero = ObjectiveWeights {
            profit: 0.0,
            guest_satisfaction: 0.0,
            staff_wellbeing: 0.0,
        };
        let err = TargetScorer
            .score(
                &option(),
                &result(4000.0, 900.0, 200.0, 0.8, 0.97),
                &AlignmentTargets::default(),
                &zero,
            )
            .await
            .unwrap_err();
        assert_eq!(err, ScoringError::InvalidWeights);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::{CapacityAnalysis, DemandPrediction};
use super::outcome::SimulationResult;
use super::request::{Constraints, DecisionPriority};
use super::scenario::Scenario;
use super::scorecard::{AlignmentTargets, Objective, ObjectiveWeights, ScoreCard};
use super::staffing::{Staffing, StaffingOption, Station};

/// An option together with its predicted outcome and score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub option: StaffingOption,
    pub result: SimulationResult,
    pub scorecard: ScoreCard,
}

impl Evaluation {
    pub fn overall(&self) -> f64 {
        self.scorecard.overall_score
    }
}

/// Where a candidate's evaluation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Simulation,
    Scoring,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Simulation => write!(f, "simulation"),
            FailureStage::Scoring => write!(f, "scoring"),
        }
    }
}

/// A candidate dropped from its iteration after a recoverable failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub option: StaffingOption,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Put more staff on a station
    Cover,
    /// Take staff off
    Shed,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Cover => write!(f, "cover"),
            Direction::Shed => write!(f, "shed"),
        }
    }
}

/// Structured signal about which objective to push on next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementFeedback {
    pub objective: Objective,
    pub direction: Direction,
    pub station: Option<Station>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    /// 1-based; the baseline is not an iteration
    pub number: u32,
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub skipped: Vec<SkippedCandidate>,
    /// Feedback that produced this round's candidates
    pub feedback: Option<RefinementFeedback>,
}

/// Index and value of the best evaluation in a slice, earliest on ties
pub fn best_of(evaluations: &[Evaluation]) -> Option<(usize, &Evaluation)> {
    let mut best: Option<(usize, &Evaluation)> = None;
    for (index, evaluation) in evaluations.iter().enumerate() {
        match best {
            Some((_, current)) if evaluation.overall() <= current.overall() => {}
            _ => best = Some((index, evaluation)),
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPick {
    /// 0 for the baseline
    pub iteration: u32,
    pub index: usize,
    pub evaluation: Evaluation,
}

/// Orchestrator states. Every state entered is appended to the run trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Baseline,
    Refine,
    Evaluate,
    Decide,
    Select,
    Done,
    Cancelled,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Baseline => "baseline",
            Phase::Refine => "refine",
            Phase::Evaluate => "evaluate",
            Phase::Decide => "decide",
            Phase::Select => "select",
            Phase::Done => "done",
            Phase::Cancelled => "cancelled",
            Phase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Completed,
    Cancelled,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Why the refinement loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Refiner had nothing left to propose
    Converged,
    /// Every proposed candidate broke a constraint or repeated an explored allocation
    RefinementRejected,
    /// Refiner errored or timed out
    RefinerFailed,
    /// A round produced no scored candidates
    EmptyIteration,
    MaxIterations,
    NoImprovement,
    TargetReached,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StopReason::Converged => "converged",
            StopReason::RefinementRejected => "refinement_rejected",
            StopReason::RefinerFailed => "refiner_failed",
            StopReason::EmptyIteration => "empty_iteration",
            StopReason::MaxIterations => "max_iterations",
            StopReason::NoImprovement => "no_improvement",
            StopReason::TargetReached => "target_reached",
        };
        write!(f, "{}", name)
    }
}

/// Full, replayable decision trace of one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub scenario: Scenario,
    pub constraints: Constraints,
    pub targets: AlignmentTargets,
    pub weights: ObjectiveWeights,
    pub priority: DecisionPriority,
    pub max_iterations: u32,
    pub demand: Option<DemandPrediction>,
    pub capacity: Option<CapacityAnalysis>,
    pub baseline: Option<Evaluation>,
    #[serde(default)]
    pub iterations: Vec<Iteration>,
    pub best: Option<BestPick>,
    #[serde(default)]
    pub transitions: Vec<Phase>,
    pub total_duration_ms: u64,
    pub status: RunStatus,
    pub stop_reason: Option<StopReason>,
    pub error: Option<String>,
}

impl PlanningRun {
    /// Every evaluation in trace order, tagged with (iteration, index)
    pub fn evaluations(&self) -> impl Iterator<Item = (u32, usize, &Evaluation)> + '_ {
        let baseline = self.baseline.iter().map(|e| (0, 0, e));
        let rounds = self.iterations.iter().flat_map(|it| {
            it.evaluations
                .iter()
                .enumerate()
                .map(move |(i, e)| (it.number, i, e))
        });
        baseline.chain(rounds)
    }

    /// Best evaluation across the baseline and every round. Ties keep the
    /// earliest iteration, then the earliest candidate.
    pub fn select_best(&self) -> Option<BestPick> {
        let mut best: Option<(u32, usize, &Evaluation)> = None;
        for (iteration, index, evaluation) in self.evaluations() {
            match best {
                Some((_, _, current)) if evaluation.overall() <= current.overall() => {}
                _ => best = Some((iteration, index, evaluation)),
            }
        }
        best.map(|(iteration, index, evaluation)| BestPick {
            iteration,
            index,
            evaluation: evaluation.clone(),
        })
    }

    /// Allocations already evaluated or attempted in this run
    pub fn explored(&self) -> Vec<Staffing> {
        let mut explored: Vec<Staffing> = self.evaluations().map(|(_, _, e)| e.option.staffing).collect();
        for iteration in &self.iterations {
            explored.extend(iteration.skipped.iter().map(|s| s.option.staffing));
        }
        explored
    }

    pub fn candidate_count(&self) -> usize {
        self.evaluations().count()
            + self.iterations.iter().map(|it| it.skipped.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DayOfWeek, ObjectiveScore, PredictedMetrics, Ranking, RestaurantProfile, RiskLevel,
        ShiftPeriod, Weather,
    };
    use chrono::NaiveDate;

    fn objective(objective: Objective, raw: f64) -> ObjectiveScore {
        ObjectiveScore {
            objective,
            raw_score: raw,
            weight: 1.0 / 3.0,
            weighted: raw / 3.0,
            actual: Some(raw),
            target: 1.0,
            detail: String::new(),
        }
    }

    fn evaluation(overall: f64, drive_thru: u32) -> Evaluation {
        let staffing = Staffing::new(drive_thru, 6, 2);
        Evaluation {
            option: StaffingOption::new("test", staffing, 960.0, RiskLevel::Low, ""),
            result: SimulationResult {
                metrics: PredictedMetrics {
                    customers_served: 400,
                    revenue: 4000.0,
                    avg_wait_seconds: 200.0,
                    peak_wait_seconds: 300.0,
                    max_queue_length: 4,
                    labor_cost: 960.0,
                    food_cost: 1120.0,
                    staff_utilization: 0.7,
                    order_accuracy: 0.97,
                },
                station_loads: Vec::new(),
                key_events: Vec::new(),
                bottlenecks: Vec::new(),
                confidence: 0.9,
            },
            scorecard: ScoreCard {
                profit: objective(Objective::Profit, overall),
                guest_satisfaction: objective(Objective::GuestSatisfaction, overall),
                staff_wellbeing: objective(Objective::StaffWellbeing, overall),
                overall_score: overall,
                ranking: Ranking::from_score(overall),
                strengths: Vec::new(),
                weaknesses: Vec::new(),
                recommendation: String::new(),
            },
        }
    }

    fn iteration(number: u32, evaluations: Vec<Evaluation>) -> Iteration {
        Iteration {
            number,
            evaluations,
            skipped: Vec::new(),
            feedback: None,
        }
    }

    fn run(baseline: Option<Evaluation>, iterations: Vec<Iteration>) -> PlanningRun {
        PlanningRun {
            run_id: "run-1".to_string(),
            started_at: Utc::now(),
            scenario: Scenario {
                shift: ShiftPeriod::Dinner,
                date: NaiveDate::from_ymd_opt(2026, 10, 23).unwrap(),
                day_of_week: DayOfWeek::Friday,
                weather: Weather::Rainy,
                special_events: Vec::new(),
                restaurant: RestaurantProfile::default(),
            },
            constraints: Constraints::default(),
            targets: AlignmentTargets::default(),
            weights: ObjectiveWeights::default(),
            priority: DecisionPriority::Balanced,
            max_iterations: 3,
            demand: None,
            capacity: None,
            baseline,
            iterations,
            best: None,
            transitions: Vec::new(),
            total_duration_ms: 0,
            status: RunStatus::Completed,
            stop_reason: None,
            error: None,
        }
    }

    #[test]
    fn test_best_of_keeps_earliest_on_tie() {
        let evaluations = vec![evaluation(0.7, 1), evaluation(0.8, 2), evaluation(0.8, 3)];
        let (index, best) = best_of(&evaluations).unwrap();
        assert_eq!(index, 1);
        assert_eq!(best.option.staffing.drive_thru(), 2);
        assert!(best_of(&[]).is_none());
    }

    #[test]
    fn test_tie_with_baseline_keeps_baseline() {
        let run = run(
            Some(evaluation(0.8, 4)),
            vec![
                iteration(1, vec![evaluation(0.8, 3)]),
                iteration(2, vec![evaluation(0.8, 5), evaluation(0.8, 6)]),
            ],
        );
        let best = run.select_best().unwrap();
        assert_eq!((best.iteration, best.index), (0, 0));
        assert_eq!(best.evaluation.option.staffing.drive_thru(), 4);
    }

    #[test]
    fn test_tie_across_rounds_keeps_earliest_round_then_candidate() {
        let run = run(
            Some(evaluation(0.6, 4)),
            vec![
                iteration(1, vec![evaluation(0.5, 3), evaluation(0.8, 5)]),
                iteration(2, vec![evaluation(0.8, 6), evaluation(0.8, 7)]),
            ],
        );
        let best = run.select_best().unwrap();
        assert_eq!((best.iteration, best.index), (1, 1));
        assert_eq!(best.evaluation.option.staffing.drive_thru(), 5);
    }

    #[test]
    fn test_tie_inside_one_round_keeps_first_candidate() {
        let run = run(
            Some(evaluation(0.6, 4)),
            vec![iteration(1, vec![evaluation(0.9, 3), evaluation(0.9, 5)])],
        );
        let best = run.select_best().unwrap();
        assert_eq!((best.iteration, best.index), (1, 0));
    }

    #[test]
    fn test_strictly_better_later_candidate_wins() {
        let run = run(
            Some(evaluation(0.8, 4)),
            vec![iteration(1, vec![evaluation(0.8, 3), evaluation(0.81, 5)])],
        );
        let best = run.select_best().unwrap();
        assert_eq!((best.iteration, best.index), (1, 1));
        assert_eq!(run.candidate_count(), 3);
        assert_eq!(run.explored().len(), 3);
    }

    #[test]
    fn test_empty_run_has_no_best() {
        assert!(run(None, Vec::new()).select_best().is_none());
    }
}

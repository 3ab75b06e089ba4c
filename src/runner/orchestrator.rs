use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::{Capabilities, GenerationInput, RefinementRequest};
use crate::config::{validate_targets, Config, EmptyIterationPolicy, PlanningConfig, CallConfig};
use crate::error::{CallError, GenerationError, PlanError, RunFailure};
use crate::model::{
    Evaluation, Iteration, Phase, PlanRequest, PlanningRun, RunStatus, StaffingOption, StopReason,
};

use super::cancel::CancellationToken;
use super::evaluate::{evaluate_option, evaluate_round, EvaluationContext};
use super::retry::guarded_call;

/// How the refinement loop ended
enum LoopEnd {
    Stopped(StopReason),
    Cancelled,
}

/// Drives one planning run through init, baseline, and bounded
/// refine / evaluate / decide rounds, then selects the best-ever option.
pub struct PlanningOrchestrator {
    capabilities: Capabilities,
    planning: PlanningConfig,
    call: CallConfig,
    shift_hours: f64,
    semaphore: Arc<Semaphore>,
}

fn enter(run: &mut PlanningRun, phase: Phase) {
    debug!("Run {} entering {}", run.run_id, phase);
    run.transitions.push(phase);
}

impl PlanningOrchestrator {
    pub fn new(config: &Config, capabilities: Capabilities) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.planning.concurrency.max(1)));
        Self {
            capabilities,
            planning: config.planning.clone(),
            call: config.call.clone(),
            shift_hours: config.model.shift_hours,
            semaphore,
        }
    }

    pub async fn run_plan(
        &self,
        request: PlanRequest,
        cancel: &CancellationToken,
    ) -> Result<PlanningRun, RunFailure> {
        let start = Instant::now();
        let mut run = PlanningRun {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            scenario: request.scenario.clone(),
            constraints: request.constraints.clone(),
            targets: request.targets.clone(),
            weights: request.weights.clone(),
            priority: request.priority,
            max_iterations: request.max_iterations,
            demand: None,
            capacity: None,
            baseline: None,
            iterations: Vec::new(),
            best: None,
            transitions: Vec::new(),
            total_duration_ms: 0,
            status: RunStatus::Completed,
            stop_reason: None,
            error: None,
        };

        info!(
            "Planning run {}: {} {} ({}), {} staff available, priority {}",
            run.run_id,
            request.scenario.day_of_week,
            request.scenario.shift,
            request.scenario.date,
            request.constraints.available_staff,
            request.priority
        );

        let outcome = self.drive(&mut run, &request, cancel).await;
        run.total_duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(end) => {
                enter(&mut run, Phase::Select);
                run.best = run.select_best();
                if let Some(best) = &run.best {
                    info!(
                        "Selected {} [{}] from iteration {} with score {:.4}",
                        best.evaluation.option.id,
                        best.evaluation.option.staffing,
                        best.iteration,
                        best.evaluation.overall()
                    );
                }
                match end {
                    LoopEnd::Stopped(reason) => {
                        info!("Run {} completed: {}", run.run_id, reason);
                        run.stop_reason = Some(reason);
                        enter(&mut run, Phase::Done);
                    }
                    LoopEnd::Cancelled => {
                        warn!("Run {} cancelled", run.run_id);
                        run.status = RunStatus::Cancelled;
                        enter(&mut run, Phase::Cancelled);
                    }
                }
                Ok(run)
            }
            Err(error) => {
                warn!("Run {} failed: {}", run.run_id, error);
                run.best = run.select_best();
                run.status = RunStatus::Failed;
                run.error = Some(error.to_string());
                enter(&mut run, Phase::Failed);
                Err(RunFailure {
                    error,
                    run: Box::new(run),
                })
            }
        }
    }

    async fn drive(
        &self,
        run: &mut PlanningRun,
        request: &PlanRequest,
        cancel: &CancellationToken,
    ) -> Result<LoopEnd, PlanError> {
        enter(run, Phase::Init);
        let weights = request.weights.normalized().ok_or_else(|| {
            PlanError::InvalidRequest("weights must be non-negative and sum above zero".to_string())
        })?;
        run.weights = weights.clone();
        validate_targets(&request.targets).map_err(|e| PlanError::InvalidRequest(e.to_string()))?;
        if let Some(hours) = request.constraints.budget_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(PlanError::InvalidRequest(format!(
                    "budget_hours must be zero or positive, got {}",
                    hours
                )));
            }
        }

        let (demand, capacity) = self.capabilities.context.resolve(&request.scenario)?;
        info!(
            "Demand {:.1} orders/hour ({:.0} over the shift, peak {:.1})",
            demand.hourly_demand, demand.total_demand, demand.peak_hour_demand
        );
        run.demand = Some(demand.clone());
        run.capacity = Some(capacity.clone());

        let context = Arc::new(EvaluationContext {
            scenario: request.scenario.clone(),
            demand: demand.clone(),
            capacity: capacity.clone(),
            targets: request.targets.clone(),
            weights,
        });

        enter(run, Phase::Baseline);
        let input = GenerationInput {
            scenario: request.scenario.clone(),
            demand: demand.clone(),
            capacity: capacity.clone(),
            priority: request.priority,
            constraints: request.constraints.clone(),
        };
        let option = guarded_call(&self.call, || self.capabilities.generator.generate(&input)).await?;
        if let Some(violation) = self.violation(&option, run, &context) {
            return Err(PlanError::Generation(CallError::Failed(
                GenerationError::ConstraintViolation(violation),
            )));
        }
        info!("Baseline {} [{}]", option.strategy, option.staffing);

        let baseline = evaluate_option(&self.capabilities, &self.call, &context, option).await?;
        let mut best_score = baseline.overall();
        info!(
            "Baseline scored {:.4} ({}), wait {:.0}s",
            best_score, baseline.scorecard.ranking, baseline.result.metrics.avg_wait_seconds
        );
        run.baseline = Some(baseline);

        if self.target_reached(best_score) {
            return Ok(LoopEnd::Stopped(StopReason::TargetReached));
        }
        if request.max_iterations == 0 {
            return Ok(LoopEnd::Stopped(StopReason::MaxIterations));
        }

        let mut number = 0;
        loop {
            number += 1;

            if cancel.is_cancelled() {
                return Ok(LoopEnd::Cancelled);
            }

            enter(run, Phase::Refine);
            let latest = self.latest_round(run);
            let best_ever = run
                .select_best()
                .map(|pick| pick.evaluation)
                .or_else(|| latest.first().cloned())
                .ok_or_else(|| PlanError::InvalidRequest("no evaluation to refine".to_string()))?;
            let refinement = RefinementRequest {
                latest,
                best_ever,
                explored: run.explored(),
                constraints: request.constraints.clone(),
                targets: request.targets.clone(),
                demand: demand.clone(),
                capacity: capacity.clone(),
                max_candidates: self.planning.candidates_per_iteration.max(1),
            };
            let proposal = match guarded_call(&self.call, || {
                self.capabilities.refiner.refine(&refinement)
            })
            .await
            {
                Ok(proposal) => proposal,
                Err(e) => {
                    warn!("Refiner failed, keeping best plan so far: {}", e);
                    return Ok(LoopEnd::Stopped(StopReason::RefinerFailed));
                }
            };

            if let Some(feedback) = &proposal.feedback {
                info!("Feedback: {}", feedback.message);
            }
            if proposal.candidates.is_empty() {
                info!("No further moves after {} iteration(s)", number - 1);
                return Ok(LoopEnd::Stopped(StopReason::Converged));
            }

            let candidates = self.admit(proposal.candidates, run, &context);
            if candidates.is_empty() {
                warn!("All proposed candidates were rejected");
                return Ok(LoopEnd::Stopped(StopReason::RefinementRejected));
            }

            if cancel.is_cancelled() {
                return Ok(LoopEnd::Cancelled);
            }

            enter(run, Phase::Evaluate);
            let (evaluations, skipped) = evaluate_round(
                &self.capabilities,
                &self.call,
                context.clone(),
                self.semaphore.clone(),
                candidates,
            )
            .await?;

            let round_best = evaluations
                .iter()
                .map(Evaluation::overall)
                .fold(f64::NEG_INFINITY, f64::max);
            run.iterations.push(Iteration {
                number,
                evaluations,
                skipped,
                feedback: proposal.feedback,
            });

            enter(run, Phase::Decide);
            if let Some(reason) = self.decide(number, round_best, best_score, request.max_iterations)? {
                return Ok(LoopEnd::Stopped(reason));
            }
            best_score = round_best;
        }
    }

    /// Stop reason for the round just evaluated, or `None` to keep refining
    fn decide(
        &self,
        number: u32,
        round_best: f64,
        best_score: f64,
        max_iterations: u32,
    ) -> Result<Option<StopReason>, PlanError> {
        if !round_best.is_finite() {
            return match self.planning.empty_iteration {
                EmptyIterationPolicy::Select => {
                    warn!("Iteration {} produced no scored candidates", number);
                    Ok(Some(StopReason::EmptyIteration))
                }
                EmptyIterationPolicy::Fail => Err(PlanError::EmptyIteration(number)),
            };
        }

        let gain = round_best - best_score;
        info!(
            "Iteration {} best {:.4} ({:+.4} over best so far)",
            number, round_best, gain
        );
        if gain <= self.planning.min_improvement {
            return Ok(Some(StopReason::NoImprovement));
        }
        if self.target_reached(round_best) {
            return Ok(Some(StopReason::TargetReached));
        }
        if number >= max_iterations {
            return Ok(Some(StopReason::MaxIterations));
        }
        Ok(None)
    }

    fn target_reached(&self, score: f64) -> bool {
        self.planning
            .target_score
            .map(|target| score >= target)
            .unwrap_or(false)
    }

    /// Evaluations of the most recent round, or the baseline before round 1
    fn latest_round(&self, run: &PlanningRun) -> Vec<Evaluation> {
        match run.iterations.last() {
            Some(iteration) if !iteration.evaluations.is_empty() => iteration.evaluations.clone(),
            _ => run.baseline.iter().cloned().collect(),
        }
    }

    fn violation(
        &self,
        option: &StaffingOption,
        run: &PlanningRun,
        context: &EvaluationContext,
    ) -> Option<String> {
        run.constraints
            .violation(&option.staffing, self.shift_hours, |s| context.capacity.has_channel(s))
    }

    /// Drop candidates that break a constraint or repeat an explored allocation
    fn admit(
        &self,
        proposed: Vec<StaffingOption>,
        run: &PlanningRun,
        context: &EvaluationContext,
    ) -> Vec<StaffingOption> {
        let explored = run.explored();
        let mut admitted: Vec<StaffingOption> = Vec::new();
        for option in proposed {
            if let Some(violation) = self.violation(&option, run, context) {
                warn!("Rejecting candidate [{}]: {}", option.staffing, violation);
                continue;
            }
            if explored.contains(&option.staffing)
                || admitted.iter().any(|a| a.staffing == option.staffing)
            {
                warn!("Rejecting candidate [{}]: already explored", option.staffing);
                continue;
            }
            admitted.push(option);
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        DirectionalRefiner, OutcomeSimulator, QueueSimulator, RefinementProposal, Refiner, Scorer,
        TargetScorer,
    };
    use crate::error::{RefinementError, ScoringError, SimulationError};
    use crate::model::{
        AlignmentTargets, CapacityAnalysis, Constraints, DayOfWeek, DecisionPriority,
        DemandPrediction, FailureStage, ObjectiveWeights, RestaurantProfile, Scenario,
        ScoreCard, ShiftPeriod, SimulationResult, Staffing, Weather,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn scenario(events: &[&str]) -> Scenario {
        Scenario {
            shift: ShiftPeriod::Dinner,
            date: NaiveDate::from_ymd_opt(2026, 10, 23).unwrap(),
            day_of_week: DayOfWeek::Friday,
            weather: Weather::Rainy,
            special_events: events.iter().map(|e| e.to_string()).collect(),
            restaurant: RestaurantProfile::default(),
        }
    }

    fn request(events: &[&str], priority: DecisionPriority) -> PlanRequest {
        PlanRequest {
            scenario: scenario(events),
            constraints: Constraints::default(),
            targets: AlignmentTargets::default(),
            weights: ObjectiveWeights::default(),
            priority,
            max_iterations: 3,
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.call.retry.backoff_base_ms = 1;
        config
    }

    async fn plan(config: &Config, capabilities: Capabilities, request: PlanRequest) -> Result<PlanningRun, RunFailure> {
        PlanningOrchestrator::new(config, capabilities)
            .run_plan(request, &CancellationToken::new())
            .await
    }

    fn assert_best_dominates(run: &PlanningRun) {
        let best = run.best.as_ref().unwrap();
        for (iteration, index, evaluation) in run.evaluations() {
            assert!(best.evaluation.overall() >= evaluation.overall());
            if evaluation.overall() == best.evaluation.overall() {
                assert!((best.iteration, best.index) <= (iteration, index));
            }
        }
    }

    /// Fails simulation for allocations matching the predicate
    struct FlakySimulator {
        inner: QueueSimulator,
        fails: fn(&Staffing) -> bool,
    }

    #[async_trait]
    impl OutcomeSimulator for FlakySimulator {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn simulate(
            &self,
            option: &StaffingOption,
            scenario: &Scenario,
            demand: &DemandPrediction,
            capacity: &CapacityAnalysis,
        ) -> Result<SimulationResult, SimulationError> {
            if (self.fails)(&option.staffing) {
                return Err(SimulationError::InvalidDemand("model unavailable".to_string()));
            }
            self.inner.simulate(option, scenario, demand, capacity).await
        }
    }

    /// Raises the cancellation flag, then proposes like the heuristic refiner
    struct CancellingRefiner {
        inner: DirectionalRefiner,
        token: CancellationToken,
    }

    #[async_trait]
    impl Refiner for CancellingRefiner {
        fn name(&self) -> &'static str {
            "cancelling"
        }

        async fn refine(&self, request: &RefinementRequest) -> Result<RefinementProposal, RefinementError> {
            self.token.cancel();
            self.inner.refine(request).await
        }
    }

    struct SlowRefiner;

    #[async_trait]
    impl Refiner for SlowRefiner {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn refine(&self, _request: &RefinementRequest) -> Result<RefinementProposal, RefinementError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(RefinementError::Failed("unreachable".to_string()))
        }
    }

    /// Proposes the anchor allocation again
    struct RepeatingRefiner;

    #[async_trait]
    impl Refiner for RepeatingRefiner {
        fn name(&self) -> &'static str {
            "repeating"
        }

        async fn refine(&self, request: &RefinementRequest) -> Result<RefinementProposal, RefinementError> {
            Ok(RefinementProposal {
                candidates: vec![request.best_ever.option.clone()],
                feedback: None,
            })
        }
    }

    /// Records which options reach the scorer
    struct RecordingScorer {
        inner: TargetScorer,
        seen: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Scorer for RecordingScorer {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn score(
            &self,
            option: &StaffingOption,
            result: &SimulationResult,
            targets: &AlignmentTargets,
            weights: &ObjectiveWeights,
        ) -> Result<ScoreCard, ScoringError> {
            self.seen.lock().unwrap().push(option.id.clone());
            self.inner.score(option, result, targets, weights).await
        }
    }

    fn flaky(config: &Config, fails: fn(&Staffing) -> bool) -> Capabilities {
        let mut capabilities = Capabilities::heuristic(config);
        capabilities.simulator = Arc::new(FlakySimulator {
            inner: QueueSimulator {
                model: config.model.clone(),
            },
            fails,
        });
        capabilities
    }

    #[tokio::test]
    async fn test_friday_dinner_refines_and_never_regresses() {
        let config = config();
        let run = plan(&config, Capabilities::heuristic(&config), request(&[], DecisionPriority::Balanced))
            .await
            .unwrap();

        let baseline = run.baseline.as_ref().unwrap();
        assert_eq!(baseline.option.staffing, Staffing::new(4, 6, 2));
        assert!(baseline.option.staffing.total() <= 15);
        assert!(baseline.result.metrics.avg_wait_seconds > 180.0);
        assert!(!run.iterations.is_empty());

        let best = run.best.as_ref().unwrap();
        assert!(best.evaluation.overall() >= baseline.overall());
        assert_eq!(best.iteration, 0);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.stop_reason, Some(StopReason::NoImprovement));
        assert_eq!(
            run.transitions,
            vec![
                Phase::Init,
                Phase::Baseline,
                Phase::Refine,
                Phase::Evaluate,
                Phase::Decide,
                Phase::Select,
                Phase::Done
            ]
        );
        assert!((run.weights.sum() - 1.0).abs() < 1e-12);
        assert_best_dominates(&run);
    }

    #[tokio::test]
    async fn test_lean_start_climbs_to_better_plan() {
        let config = config();
        let run = plan(&config, Capabilities::heuristic(&config), request(&[], DecisionPriority::MinimizeCost))
            .await
            .unwrap();

        let baseline = run.baseline.as_ref().unwrap();
        assert_eq!(baseline.option.staffing, Staffing::new(3, 5, 2));

        let numbers: Vec<u32> = run.iterations.iter().map(|it| it.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let best = run.best.as_ref().unwrap();
        assert_eq!(best.iteration, 2);
        assert_eq!(best.evaluation.option.staffing, Staffing::new(4, 6, 2));
        assert!(best.evaluation.overall() > baseline.overall());
        assert_eq!(run.stop_reason, Some(StopReason::NoImprovement));
        assert!(run.iterations.iter().all(|it| it.feedback.is_some()));
        assert_best_dominates(&run);
    }

    #[tokio::test]
    async fn test_rush_converges_when_no_move_remains() {
        let config = config();
        let run = plan(
            &config,
            Capabilities::heuristic(&config),
            request(&["friday_rush"], DecisionPriority::Balanced),
        )
        .await
        .unwrap();

        assert_eq!(run.baseline.as_ref().unwrap().option.staffing, Staffing::new(5, 7, 2));
        assert_eq!(run.iterations.len(), 1);
        assert_eq!(run.stop_reason, Some(StopReason::Converged));
        assert_eq!(run.status, RunStatus::Completed);
        let best = run.best.as_ref().unwrap();
        assert_eq!(best.evaluation.option.staffing, Staffing::new(5, 7, 3));
        assert_best_dominates(&run);
    }

    #[tokio::test]
    async fn test_target_score_stops_early() {
        let mut config = config();
        config.planning.target_score = Some(0.8);
        let run = plan(&config, Capabilities::heuristic(&config), request(&[], DecisionPriority::MinimizeCost))
            .await
            .unwrap();

        assert_eq!(run.iterations.len(), 2);
        assert_eq!(run.stop_reason, Some(StopReason::TargetReached));
    }

    #[tokio::test]
    async fn test_zero_max_iterations_is_baseline_only() {
        let config = config();
        let mut req = request(&[], DecisionPriority::Balanced);
        req.max_iterations = 0;
        let run = plan(&config, Capabilities::heuristic(&config), req).await.unwrap();

        assert!(run.iterations.is_empty());
        assert_eq!(run.stop_reason, Some(StopReason::MaxIterations));
        assert_eq!(run.best.as_ref().unwrap().iteration, 0);
    }

    #[tokio::test]
    async fn test_no_available_staff_fails_generation() {
        let config = config();
        let mut req = request(&[], DecisionPriority::Balanced);
        req.constraints.available_staff = 0;

        let failure = plan(&config, Capabilities::heuristic(&config), req).await.unwrap_err();
        assert!(matches!(
            failure.error,
            PlanError::Generation(CallError::Failed(GenerationError::Infeasible { ceiling: 0, .. }))
        ));
        assert_eq!(failure.run.status, RunStatus::Failed);
        assert!(failure.run.baseline.is_none());
        assert!(failure.run.best.is_none());
        assert!(failure.run.demand.is_some());
        assert_eq!(failure.run.transitions.last(), Some(&Phase::Failed));
        assert!(failure.run.error.is_some());
    }

    #[tokio::test]
    async fn test_bad_scenario_fails_in_init() {
        let config = config();
        let mut req = request(&[], DecisionPriority::Balanced);
        req.scenario.day_of_week = DayOfWeek::Tuesday;

        let failure = plan(&config, Capabilities::heuristic(&config), req).await.unwrap_err();
        assert!(matches!(failure.error, PlanError::Context(_)));
        assert_eq!(failure.run.transitions, vec![Phase::Init, Phase::Failed]);
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let config = config();
        let mut req = request(&[], DecisionPriority::Balanced);
        req.weights = ObjectiveWeights {
            profit: 0.0,
            guest_satisfaction: 0.0,
            staff_wellbeing: 0.0,
        };

        let failure = plan(&config, Capabilities::heuristic(&config), req).await.unwrap_err();
        assert!(matches!(failure.error, PlanError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_refine_keeps_baseline() {
        let config = config();
        let token = CancellationToken::new();
        token.cancel();

        let run = PlanningOrchestrator::new(&config, Capabilities::heuristic(&config))
            .run_plan(request(&[], DecisionPriority::MinimizeCost), &token)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Cancelled);
        assert!(run.baseline.is_some());
        assert!(run.iterations.is_empty());
        assert_eq!(run.best.as_ref().unwrap().iteration, 0);
        assert_eq!(run.stop_reason, None);
        assert_eq!(run.transitions.last(), Some(&Phase::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_mid_run_returns_partial_trace() {
        let config = config();
        let token = CancellationToken::new();
        let mut capabilities = Capabilities::heuristic(&config);
        capabilities.refiner = Arc::new(CancellingRefiner {
            inner: DirectionalRefiner {
                model: config.model.clone(),
            },
            token: token.clone(),
        });

        let run = PlanningOrchestrator::new(&config, capabilities)
            .run_plan(request(&[], DecisionPriority::MinimizeCost), &token)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Cancelled);
        assert!(run.baseline.is_some());
        assert!(run.best.is_some());
        assert!(run.transitions.contains(&Phase::Refine));
        assert!(!run.transitions.contains(&Phase::Evaluate));
    }

    #[tokio::test]
    async fn test_failed_candidate_is_skipped_not_fatal() {
        let mut config = config();
        config.planning.candidates_per_iteration = 2;
        let capabilities = flaky(&config, |s| *s == Staffing::new(4, 7, 2));

        let run = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        let first = &run.iterations[0];
        assert_eq!(first.evaluations.len(), 1);
        assert_eq!(first.evaluations[0].option.staffing, Staffing::new(3, 6, 2));
        assert_eq!(first.skipped.len(), 1);
        assert_eq!(first.skipped[0].stage, FailureStage::Simulation);
        assert_eq!(first.skipped[0].option.staffing, Staffing::new(4, 7, 2));
        assert!(first.skipped[0].reason.contains("model unavailable"));
        assert!(run.explored().contains(&Staffing::new(4, 7, 2)));
    }

    #[tokio::test]
    async fn test_empty_iteration_selects_by_default() {
        let config = config();
        let capabilities = flaky(&config, |s| *s != Staffing::new(4, 6, 2));

        let run = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap();

        assert_eq!(run.stop_reason, Some(StopReason::EmptyIteration));
        assert_eq!(run.iterations.len(), 1);
        assert!(run.iterations[0].evaluations.is_empty());
        assert_eq!(run.best.as_ref().unwrap().iteration, 0);
    }

    #[tokio::test]
    async fn test_empty_iteration_can_fail_run() {
        let mut config = config();
        config.planning.empty_iteration = EmptyIterationPolicy::Fail;
        let capabilities = flaky(&config, |s| *s != Staffing::new(4, 6, 2));

        let failure = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, PlanError::EmptyIteration(1)));
        assert_eq!(failure.run.status, RunStatus::Failed);
        assert!(failure.run.baseline.is_some());
        assert_eq!(failure.run.best.as_ref().unwrap().iteration, 0);
    }

    #[tokio::test]
    async fn test_baseline_simulation_failure_is_fatal() {
        let config = config();
        let capabilities = flaky(&config, |_| true);

        let failure = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, PlanError::BaselineSimulation(_)));
        assert!(failure.run.best.is_none());
    }

    #[tokio::test]
    async fn test_refiner_timeout_keeps_best_plan() {
        let mut config = config();
        config.call.timeout_ms = 50;
        config.call.retry.max_attempts = 1;
        let mut capabilities = Capabilities::heuristic(&config);
        capabilities.refiner = Arc::new(SlowRefiner);

        let run = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.stop_reason, Some(StopReason::RefinerFailed));
        assert!(run.best.is_some());
    }

    #[tokio::test]
    async fn test_repeated_allocation_is_rejected() {
        let config = config();
        let mut capabilities = Capabilities::heuristic(&config);
        capabilities.refiner = Arc::new(RepeatingRefiner);

        let run = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap();

        assert_eq!(run.stop_reason, Some(StopReason::RefinementRejected));
        assert!(run.iterations.is_empty());
    }

    #[tokio::test]
    async fn test_scorer_sees_each_evaluated_option() {
        let config = config();
        let scorer = Arc::new(RecordingScorer {
            inner: TargetScorer,
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let mut capabilities = Capabilities::heuristic(&config);
        capabilities.scorer = scorer.clone();

        let run = plan(&config, capabilities, request(&[], DecisionPriority::Balanced))
            .await
            .unwrap();

        let mut expected: Vec<String> = run
            .evaluations()
            .map(|(_, _, e)| e.option.id.clone())
            .collect();
        let mut seen = scorer.seen.lock().unwrap().clone();
        expected.sort();
        seen.sort();
        assert!(expected.len() >= 2);
        assert_eq!(seen, expected);
    }
}

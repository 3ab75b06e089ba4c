use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::capability::Capabilities;
use crate::config::CallConfig;
use crate::error::{CallError, PlanError, ScoringError, SimulationError};
use crate::model::{
    AlignmentTargets, CapacityAnalysis, DemandPrediction, Evaluation, FailureStage,
    ObjectiveWeights, Scenario, SkippedCandidate, StaffingOption,
};

use super::retry::guarded_call;

/// Read-only inputs shared by every candidate evaluation of a run
#[derive(Debug)]
pub struct EvaluationContext {
    pub scenario: Scenario,
    pub demand: DemandPrediction,
    pub capacity: CapacityAnalysis,
    pub targets: AlignmentTargets,
    pub weights: ObjectiveWeights,
}

#[derive(Debug)]
pub enum EvaluationFailure {
    Simulation(CallError<SimulationError>),
    Scoring(CallError<ScoringError>),
}

impl EvaluationFailure {
    pub fn stage(&self) -> FailureStage {
        match self {
            EvaluationFailure::Simulation(_) => FailureStage::Simulation,
            EvaluationFailure::Scoring(_) => FailureStage::Scoring,
        }
    }

    fn reason(&self) -> String {
        match self {
            EvaluationFailure::Simulation(e) => e.to_string(),
            EvaluationFailure::Scoring(e) => e.to_string(),
        }
    }
}

impl From<EvaluationFailure> for PlanError {
    fn from(failure: EvaluationFailure) -> Self {
        match failure {
            EvaluationFailure::Simulation(e) => PlanError::BaselineSimulation(e),
            EvaluationFailure::Scoring(e) => PlanError::BaselineScoring(e),
        }
    }
}

/// Simulate then score one option
pub async fn evaluate_option(
    capabilities: &Capabilities,
    call: &CallConfig,
    context: &EvaluationContext,
    option: StaffingOption,
) -> Result<Evaluation, EvaluationFailure> {
    let result = guarded_call(call, || {
        capabilities
            .simulator
            .simulate(&option, &context.scenario, &context.demand, &context.capacity)
    })
    .await
    .map_err(EvaluationFailure::Simulation)?;

    let scorecard = guarded_call(call, || {
        capabilities
            .scorer
            .score(&option, &result, &context.targets, &context.weights)
    })
    .await
    .map_err(EvaluationFailure::Scoring)?;

    debug!(
        "Scored {} [{}]: {:.4} ({})",
        option.id, option.staffing, scorecard.overall_score, scorecard.ranking
    );

    Ok(Evaluation {
        option,
        result,
        scorecard,
    })
}

/// Evaluate one round of candidates in parallel. Results keep candidate order;
/// a failed candidate becomes a skipped entry and never fails the round.
pub async fn evaluate_round(
    capabilities: &Capabilities,
    call: &CallConfig,
    context: Arc<EvaluationContext>,
    semaphore: Arc<Semaphore>,
    candidates: Vec<StaffingOption>,
) -> Result<(Vec<Evaluation>, Vec<SkippedCandidate>), PlanError> {
    info!("Evaluating {} candidate(s)", candidates.len());

    let mut futures = FuturesUnordered::new();
    for (idx, option) in candidates.iter().cloned().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let capabilities = capabilities.clone();
        let call = call.clone();
        let context = context.clone();

        futures.push(tokio::spawn(async move {
            let _permit = permit; // hold until done
            (idx, evaluate_option(&capabilities, &call, &context, option).await)
        }));
    }

    let mut outcomes: Vec<(usize, Result<Evaluation, SkippedCandidate>)> = Vec::new();
    while let Some(joined) = futures.next().await {
        match joined {
            Ok((idx, Ok(evaluation))) => outcomes.push((idx, Ok(evaluation))),
            Ok((idx, Err(failure))) => {
                let option = candidates[idx].clone();
                warn!(
                    "Skipping candidate {} [{}]: {} failed: {}",
                    option.id,
                    option.staffing,
                    failure.stage(),
                    failure.reason()
                );
                outcomes.push((
                    idx,
                    Err(SkippedCandidate {
                        option,
                        stage: failure.stage(),
                        reason: failure.reason(),
                    }),
                ));
            }
            Err(e) => {
                // Panicked task; the candidate index is lost with it
                warn!("Evaluation task panicked: {}", e);
            }
        }
    }

    // Any candidate whose task panicked is recorded as skipped
    for (idx, option) in candidates.iter().enumerate() {
        if !outcomes.iter().any(|(i, _)| *i == idx) {
            outcomes.push((
                idx,
                Err(SkippedCandidate {
                    option: option.clone(),
                    stage: FailureStage::Simulation,
                    reason: "evaluation task panicked".to_string(),
                }),
            ));
        }
    }

    outcomes.sort_by_key(|(idx, _)| *idx);
    let mut evaluations = Vec::new();
    let mut skipped = Vec::new();
    for (_, outcome) in outcomes {
        match outcome {
            Ok(evaluation) => evaluations.push(evaluation),
            Err(entry) => skipped.push(entry),
        }
    }
    Ok((evaluations, skipped))
}

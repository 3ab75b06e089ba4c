mod context;
mod generator;
mod refiner;
mod scorer;
mod simulator;

pub use context::RuleContextResolver;
pub use generator::PriorityGenerator;
pub use refiner::DirectionalRefiner;
pub use scorer::TargetScorer;
pub use simulator::QueueSimulator;

use crate::config::Config;
use crate::error::{ContextError, GenerationError, RefinementError, ScoringError, SimulationError};
use crate::model::{
    AlignmentTargets, CapacityAnalysis, Constraints, DecisionPriority, DemandPrediction,
    Evaluation, ObjectiveWeights, RefinementFeedback, Scenario, ScoreCard, SimulationResult,
    Staffing, StaffingOption,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a scenario into demand and infrastructure limits
pub trait ContextResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        scenario: &Scenario,
    ) -> Result<(DemandPrediction, CapacityAnalysis), ContextError>;
}

#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub scenario: Scenario,
    pub demand: DemandPrediction,
    pub capacity: CapacityAnalysis,
    pub priority: DecisionPriority,
    pub constraints: Constraints,
}

/// Produces the initial staffing option for a run
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, input: &GenerationInput) -> Result<StaffingOption, GenerationError>;
}

/// Predicts the outcome of running a shift with one option
#[async_trait]
pub trait OutcomeSimulator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn simulate(
        &self,
        option: &StaffingOption,
        scenario: &Scenario,
        demand: &DemandPrediction,
        capacity: &CapacityAnalysis,
    ) -> Result<SimulationResult, SimulationError>;
}

#[async_trait]
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score an option's predicted outcome. The option is passed for scorers
    /// that weigh the allocation itself.
    async fn score(
        &self,
        option: &StaffingOption,
        result: &SimulationResult,
        targets: &AlignmentTargets,
        weights: &ObjectiveWeights,
    ) -> Result<ScoreCard, ScoringError>;
}

#[derive(Debug, Clone)]
pub struct RefinementRequest {
    /// Scored candidates of the most recent round (the baseline before round 1)
    pub latest: Vec<Evaluation>,
    /// Best evaluation of the run so far. Heuristic refiners may anchor on
    /// `latest` instead and ignore it.
    pub best_ever: Evaluation,
    /// Every allocation evaluated or attempted so far
    pub explored: Vec<Staffing>,
    pub constraints: Constraints,
    pub targets: AlignmentTargets,
    pub demand: DemandPrediction,
    pub capacity: CapacityAnalysis,
    /// Upper bound on the number of candidates to return
    pub max_candidates: usize,
}

#[derive(Debug, Clone)]
pub struct RefinementProposal {
    /// Empty when no improving move exists
    pub candidates: Vec<StaffingOption>,
    pub feedback: Option<RefinementFeedback>,
}

/// Proposes next-round candidates from the evaluation history
#[async_trait]
pub trait Refiner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn refine(
        &self,
        request: &RefinementRequest,
    ) -> Result<RefinementProposal, RefinementError>;
}

/// The capability handles one orchestrator works against
#[derive(Clone)]
pub struct Capabilities {
    pub context: Arc<dyn ContextResolver>,
    pub generator: Arc<dyn CandidateGenerator>,
    pub simulator: Arc<dyn OutcomeSimulator>,
    pub scorer: Arc<dyn Scorer>,
    pub refiner: Arc<dyn Refiner>,
}

impl Capabilities {
    /// Deterministic rule and queue-model implementations of every capability
    pub fn heuristic(config: &Config) -> Self {
        Self {
            context: Arc::new(RuleContextResolver {
                model: config.model.clone(),
            }),
            generator: Arc::new(PriorityGenerator {
                model: config.model.clone(),
            }),
            simulator: Arc::new(QueueSimulator {
                model: config.model.clone(),
            }),
            scorer: Arc::new(TargetScorer),
            refiner: Arc::new(DirectionalRefiner {
                model: config.model.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("context", &self.context.name())
            .field("generator", &self.generator.name())
            .field("simulator", &self.simulator.name())
            .field("scorer", &self.scorer.name())
            .field("refiner", &self.refiner.name())
            .finish()
    }
}

/// Queue utilization of a station: arrivals over service rate. A station with
/// arrivals but no service capacity reports 2.0.
pub(crate) fn utilization(arrivals: f64, service_rate: f64) -> f64 {
    if service_rate > 0.0 {
        arrivals / service_rate
    } else if arrivals > 0.0 {
        2.0
    } else {
        0.0
    }
}

/// Orders/hour a station serves: headcount times rate, capped by equipment
pub(crate) fn service_rate(staff: u32, rate: f64, ceiling: f64) -> f64 {
    (staff as f64 * rate).min(ceiling)
}

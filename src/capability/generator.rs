use async_trait::async_trait;
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::GenerationError;
use crate::model::{DecisionPriority, RiskLevel, Staffing, StaffingOption, Station};

use super::{service_rate, utilization, CandidateGenerator, GenerationInput};

/// Sizes each station to a target utilization chosen by the decision priority
#[derive(Debug, Clone)]
pub struct PriorityGenerator {
    pub model: ModelConfig,
}

/// Utilization the initial allocation is sized for
pub fn planning_utilization(priority: DecisionPriority) -> f64 {
    match priority {
        DecisionPriority::MinimizeCost => 0.95,
        DecisionPriority::Balanced => 0.85,
        DecisionPriority::StaffWellbeing => 0.80,
        DecisionPriority::CustomerFirst => 0.75,
    }
}

fn strategy_name(priority: DecisionPriority) -> &'static str {
    match priority {
        DecisionPriority::MinimizeCost => "Lean baseline",
        DecisionPriority::Balanced => "Balanced baseline",
        DecisionPriority::StaffWellbeing => "Sustainable baseline",
        DecisionPriority::CustomerFirst => "Service-first baseline",
    }
}

/// Smallest headcount whose capacity at `target` utilization covers `arrivals`
fn required_staff(arrivals: f64, rate: f64, target: f64) -> u32 {
    let exact = arrivals / (rate * target);
    // Tolerate float noise right at an integer boundary
    (exact - 1e-9).ceil().max(0.0) as u32
}

impl PriorityGenerator {
    fn allocate(&self, input: &GenerationInput) -> Result<Staffing, GenerationError> {
        let capacity = &input.capacity;
        let constraints = &input.constraints;

        let ceiling = constraints.staff_ceiling(self.model.shift_hours);
        let floors: Vec<u32> = Station::ALL
            .iter()
            .map(|&s| constraints.floor(s, capacity.has_channel(s)))
            .collect();
        let required = floors.iter().fold(0u32, |sum, floor| sum.saturating_add(*floor));
        if ceiling == 0 || ceiling < required {
            return Err(GenerationError::Infeasible { ceiling, required });
        }

        let target = planning_utilization(input.priority);
        let mut staffing = Staffing::new(0, 0, 0);
        for (station, floor) in Station::ALL.into_iter().zip(floors.iter().copied()) {
            if !capacity.has_channel(station) {
                continue;
            }
            let rate = self.model.rate(station);
            let wanted = required_staff(input.demand.routed_hourly(station), rate, target);
            let useful_cap = (capacity.ceiling(station) / rate).ceil() as u32;
            let count = wanted.min(useful_cap).max(floor);
            staffing = staffing.with(station, count);
        }

        while staffing.total() > ceiling {
            let Some(station) = self.most_slack(input, &staffing, &floors) else {
                break;
            };
            debug!("Trimming {} to stay within {} staff", station, ceiling);
            staffing = staffing.with(station, staffing.get(station) - 1);
        }

        if staffing.total() == 0 || staffing.total() > ceiling {
            return Err(GenerationError::Infeasible { ceiling, required });
        }
        Ok(staffing)
    }

    /// Station above its floor that stays least loaded after losing one staff
    fn most_slack(&self, input: &GenerationInput, staffing: &Staffing, floors: &[u32]) -> Option<Station> {
        Station::ALL
            .into_iter()
            .zip(floors.iter().copied())
            .filter(|(station, floor)| staffing.get(*station) > *floor)
            .map(|(station, _)| {
                let mu = service_rate(
                    staffing.get(station) - 1,
                    self.model.rate(station),
                    input.capacity.ceiling(station),
                );
                (station, utilization(input.demand.routed_hourly(station), mu))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(station, _)| station)
    }

    fn peak_utilization(&self, input: &GenerationInput, staffing: &Staffing) -> f64 {
        Station::ALL
            .into_iter()
            .filter(|s| input.capacity.has_channel(*s))
            .map(|s| {
                let mu = service_rate(staffing.get(s), self.model.rate(s), input.capacity.ceiling(s));
                utilization(input.demand.routed_peak(s), mu)
            })
            .fold(0.0, f64::max)
    }
}

#[async_trait]
impl CandidateGenerator for PriorityGenerator {
    fn name(&self) -> &'static str {
        "priority"
    }

    async fn generate(&self, input: &GenerationInput) -> Result<StaffingOption, GenerationError> {
        let staffing = self.allocate(input)?;
        let peak = self.peak_utilization(input, &staffing);
        let risk = RiskLevel::from_peak_utilization(peak);

        let rationale = format!(
            "Sized for {:.0}% utilization at {:.0} orders/hour ({} priority); peak-hour load reaches {:.0}% of capacity",
            planning_utilization(input.priority) * 100.0,
            input.demand.hourly_demand,
            input.priority,
            peak * 100.0
        );

        Ok(StaffingOption::new(
            strategy_name(input.priority),
            staffing,
            self.model.labor_cost(staffing.total()),
            risk,
            rationale,
        ))
    }
}

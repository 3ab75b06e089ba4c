use async_trait::async_trait;
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::RefinementError;
use crate::model::{
    best_of, Direction, Evaluation, Objective, ObjectiveScore, RefinementFeedback, RiskLevel,
    Staffing, StaffingOption, Station,
};

use super::{service_rate, utilization, RefinementRequest, RefinementProposal, Refiner};

/// Single-step moves aimed at the weakest objectives of the latest round's
/// best option: move or hire one person onto a strained station (cover), or
/// release one from a station that can spare them (shed).
#[derive(Debug, Clone)]
pub struct DirectionalRefiner {
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
struct Move {
    staffing: Staffing,
    station: Station,
    strategy: String,
}

/// Per-request view of the anchor allocation
struct Anchor<'a> {
    request: &'a RefinementRequest,
    evaluation: &'a Evaluation,
    model: &'a ModelConfig,
}

impl Anchor<'_> {
    fn staffing(&self) -> &Staffing {
        &self.evaluation.option.staffing
    }

    fn has_channel(&self, station: Station) -> bool {
        self.request.capacity.has_channel(station)
    }

    fn floor(&self, station: Station) -> u32 {
        self.request.constraints.floor(station, self.has_channel(station))
    }

    fn arrivals(&self, station: Station) -> f64 {
        self.request.demand.routed_hourly(station)
    }

    fn rho_with(&self, station: Station, staff: u32) -> f64 {
        let mu = service_rate(staff, self.model.rate(station), self.request.capacity.ceiling(station));
        utilization(self.arrivals(station), mu)
    }

    fn rho(&self, station: Station) -> f64 {
        self.evaluation
            .result
            .load(station)
            .map(|l| l.utilization)
            .unwrap_or_else(|| self.rho_with(station, self.staffing().get(station)))
    }

    /// Adding staff would still raise throughput
    fn staff_bound(&self, station: Station) -> bool {
        let staff = self.staffing().get(station);
        let rate = self.model.rate(station);
        let ceiling = self.request.capacity.ceiling(station);
        let useful_cap = (ceiling / rate).ceil() as u32;
        self.has_channel(station) && (staff as f64 * rate) < ceiling && staff < useful_cap
    }

    /// Stations above their floor whose utilization after losing one person stays at or below `limit`
    fn spare(&self, limit: f64, exclude: Option<Station>) -> Vec<Station> {
        let staffing = self.staffing();
        let mut stations: Vec<Station> = Station::ALL
            .into_iter()
            .filter(|s| Some(*s) != exclude)
            .filter(|s| self.has_channel(*s) && staffing.get(*s) > self.floor(*s))
            .filter(|s| self.rho_with(*s, staffing.get(*s) - 1) <= limit)
            .collect();
        stations.sort_by(|a, b| self.rho(*a).total_cmp(&self.rho(*b)));
        stations
    }

    fn cover_moves(&self) -> Vec<Move> {
        let staffing = *self.staffing();
        let midpoint = self.request.targets.utilization;
        let ceiling = self.request.constraints.staff_ceiling(self.model.shift_hours);

        let mut targets: Vec<Station> = Station::ALL
            .into_iter()
            .filter(|s| self.staff_bound(*s))
            .collect();
        targets.sort_by(|a, b| self.rho(*b).total_cmp(&self.rho(*a)));

        let mut moves = Vec::new();
        for target in targets {
            for source in self.spare(midpoint, Some(target)) {
                if let Some(moved) = staffing.transfer(source, target) {
                    moves.push(Move {
                        staffing: moved,
                        station: target,
                        strategy: format!("Move {} to {}", source, target),
                    });
                }
            }
            if staffing.total() < ceiling {
                moves.push(Move {
                    staffing: staffing.add_one(target),
                    station: target,
                    strategy: format!("Add {}", target),
                });
            }
        }
        moves
    }

    fn shed_moves(&self) -> Vec<Move> {
        let staffing = *self.staffing();
        let limit = self.request.targets.utilization + self.request.targets.utilization_band;
        self.spare(limit, None)
            .into_iter()
            .filter_map(|station| {
                staffing.remove_one(station).map(|shed| Move {
                    staffing: shed,
                    station,
                    strategy: format!("Release {}", station),
                })
            })
            .collect()
    }

    fn direction(&self, objective: Objective) -> Direction {
        match objective {
            Objective::Profit => Direction::Shed,
            Objective::GuestSatisfaction => Direction::Cover,
            Objective::StaffWellbeing => {
                let utilization = self.evaluation.result.metrics.staff_utilization;
                if utilization > self.request.targets.utilization {
                    Direction::Cover
                } else {
                    Direction::Shed
                }
            }
        }
    }

    fn peak_utilization(&self, staffing: &Staffing) -> f64 {
        Station::ALL
            .into_iter()
            .filter(|s| self.has_channel(*s))
            .map(|s| {
                let mu = service_rate(staffing.get(s), self.model.rate(s), self.request.capacity.ceiling(s));
                utilization(self.request.demand.routed_peak(s), mu)
            })
            .fold(0.0, f64::max)
    }
}

fn feedback_message(score: &ObjectiveScore, direction: Direction, station: Option<Station>) -> String {
    let action = match (direction, station) {
        (Direction::Cover, Some(s)) => format!("add coverage at {}", s),
        (Direction::Shed, Some(s)) => format!("release staff from {}", s),
        (Direction::Cover, None) => "no station can take more staff".to_string(),
        (Direction::Shed, None) => "no station can spare staff".to_string(),
    };
    format!(
        "{} scored {:.2} ({}); {}",
        score.objective, score.raw_score, score.detail, action
    )
}

#[async_trait]
impl Refiner for DirectionalRefiner {
    fn name(&self) -> &'static str {
        "directional"
    }

    async fn refine(
        &self,
        request: &RefinementRequest,
    ) -> Result<RefinementProposal, RefinementError> {
        let (_, evaluation) = best_of(&request.latest).ok_or(RefinementError::EmptyHistory)?;
        let anchor = Anchor {
            request,
            evaluation,
            model: &self.model,
        };

        let mut lacking: Vec<&ObjectiveScore> = evaluation
            .scorecard
            .objectives()
            .into_iter()
            .filter(|s| s.raw_score < 1.0)
            .collect();
        lacking.sort_by(|a, b| a.raw_score.total_cmp(&b.raw_score));

        let ceiling = request.constraints.staff_ceiling(self.model.shift_hours);
        let mut per_objective: Vec<(&ObjectiveScore, Direction, Vec<Move>)> = Vec::new();
        for score in lacking.iter().copied() {
            let direction = anchor.direction(score.objective);
            let moves = match direction {
                Direction::Cover => anchor.cover_moves(),
                Direction::Shed => anchor.shed_moves(),
            };
            let moves: Vec<Move> = moves
                .into_iter()
                .filter(|m| !request.explored.contains(&m.staffing))
                .filter(|m| m.staffing.total() > 0 && m.staffing.total() <= ceiling)
                .collect();
            debug!(
                "{} ({:.3}) -> {}: {} move(s)",
                score.objective,
                score.raw_score,
                direction,
                moves.len()
            );
            per_objective.push((score, direction, moves));
        }

        // Round-robin so each weak objective gets a say
        let mut chosen: Vec<(Move, Objective)> = Vec::new();
        let longest = per_objective.iter().map(|(_, _, m)| m.len()).max().unwrap_or(0);
        'merge: for round in 0..longest {
            for (score, _, moves) in &per_objective {
                if chosen.len() >= request.max_candidates {
                    break 'merge;
                }
                if let Some(m) = moves.get(round) {
                    if chosen.iter().all(|(c, _)| c.staffing != m.staffing) {
                        chosen.push((m.clone(), score.objective));
                    }
                }
            }
        }

        let feedback = per_objective
            .iter()
            .find(|(_, _, moves)| !moves.is_empty())
            .map(|(score, direction, moves)| (*score, *direction, moves.first().map(|m| m.station)))
            .or_else(|| {
                per_objective
                    .first()
                    .map(|(score, direction, _)| (*score, *direction, None))
            })
            .map(|(score, direction, station)| RefinementFeedback {
                objective: score.objective,
                direction,
                station,
                message: feedback_message(score, direction, station),
            });

        let candidates = chosen
            .into_iter()
            .map(|(m, objective)| {
                let peak = anchor.peak_utilization(&m.staffing);
                let rationale = format!(
                    "Targets {} from {} ({}); peak-hour load {:.0}% of capacity",
                    objective,
                    evaluation.option.staffing,
                    m.strategy.to_lowercase(),
                    peak * 100.0
                );
                StaffingOption::new(
                    m.strategy,
                    m.staffing,
                    self.model.labor_cost(m.staffing.total()),
                    RiskLevel::from_peak_utilization(peak),
                    rationale,
                )
            })
            .collect();

        Ok(RefinementProposal {
            candidates,
            feedback,
        })
    }
}

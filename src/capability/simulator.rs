use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::error::SimulationError;
use crate::model::{
    CapacityAnalysis, DemandPrediction, PredictedMetrics, Scenario, SimulationResult,
    StaffingOption, Station, StationLoad,
};

use super::{service_rate, utilization, OutcomeSimulator};

/// Models every station as a single queue whose service rate is headcount
/// times per-staff throughput, capped by the station's equipment ceiling.
#[derive(Debug, Clone)]
pub struct QueueSimulator {
    pub model: ModelConfig,
}

/// Queueing delay in seconds for a station at utilization `rho` and service
/// rate `mu` (orders/hour). Grows with `rho` and saturates at `cap`.
pub fn queue_delay(rho: f64, mu: f64, cap: f64) -> f64 {
    if mu <= 0.0 || rho >= 1.0 {
        return cap;
    }
    if rho <= 0.0 {
        return 0.0;
    }
    let unbounded = rho / (1.0 - rho) * 3600.0 / mu;
    cap * unbounded / (cap + unbounded)
}

struct Snapshot {
    loads: Vec<StationLoad>,
    wait: f64,
    longest_queue: f64,
}

impl QueueSimulator {
    fn validate(&self, option: &StaffingOption, demand: &DemandPrediction) -> Result<(), SimulationError> {
        let staffing = &option.staffing;
        if staffing.total() == 0 {
            return Err(SimulationError::NoStaff);
        }

        let split = &demand.channel_split;
        for (label, value) in [
            ("hourly demand", demand.hourly_demand),
            ("peak hour demand", demand.peak_hour_demand),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::InvalidDemand(format!("{} is {}", label, value)));
            }
        }
        for (label, share) in [
            ("drive-thru share", split.drive_thru_share),
            ("counter share", split.counter_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(SimulationError::InvalidDemand(format!("{} is {}", label, share)));
            }
        }
        Ok(())
    }

    /// Station loads and guest wait for a given arrival profile
    fn snapshot(
        &self,
        option: &StaffingOption,
        capacity: &CapacityAnalysis,
        demand: &DemandPrediction,
        arrivals: impl Fn(Station) -> f64,
    ) -> Snapshot {
        let cap = self.model.max_wait_seconds;
        let mut loads = Vec::with_capacity(Station::ALL.len());
        let mut wait = self.model.base_service_seconds;
        let mut longest_queue: f64 = 0.0;

        for station in Station::ALL {
            let staff = option.staffing.get(station);
            let rate = self.model.rate(station);
            let ceiling = capacity.ceiling(station);
            let lambda = arrivals(station);
            let mu = service_rate(staff, rate, ceiling);
            let rho = utilization(lambda, mu);

            let delay = queue_delay(rho, mu, cap);
            let weight = match station {
                Station::DriveThru => demand.channel_split.drive_thru_share,
                Station::FrontCounter => demand.channel_split.counter_share,
                Station::Kitchen => 1.0,
            };
            wait += weight * delay;
            // Little's law: waiting orders = arrival rate x time in queue
            longest_queue = longest_queue.max(lambda * delay / 3600.0);

            loads.push(StationLoad {
                station,
                staff,
                demand_per_hour: lambda,
                capacity_per_hour: mu,
                utilization: rho,
                equipment_bound: staff > 0 && staff as f64 * rate >= ceiling,
            });
        }

        Snapshot {
            loads,
            wait: wait.min(cap),
            longest_queue,
        }
    }
}

#[async_trait]
impl OutcomeSimulator for QueueSimulator {
    fn name(&self) -> &'static str {
        "queue"
    }

    async fn simulate(
        &self,
        option: &StaffingOption,
        scenario: &Scenario,
        demand: &DemandPrediction,
        capacity: &CapacityAnalysis,
    ) -> Result<SimulationResult, SimulationError> {
        self.validate(option, demand)?;
        let model = &self.model;

        let average = self.snapshot(option, capacity, demand, |s| demand.routed_hourly(s));
        let peak = self.snapshot(option, capacity, demand, |s| demand.routed_peak(s));
        let load = |station: Station| {
            average
                .loads
                .iter()
                .find(|l| l.station == station)
                .map(|l| (l.demand_per_hour, l.capacity_per_hour))
                .unwrap_or((0.0, 0.0))
        };

        let mut key_events = Vec::new();

        let (dt_lambda, dt_mu) = load(Station::DriveThru);
        let (counter_lambda, counter_mu) = load(Station::FrontCounter);
        let (_, kitchen_mu) = load(Station::Kitchen);
        let mut dt_served = dt_lambda.min(dt_mu);
        let mut counter_served = counter_lambda.min(counter_mu);
        let taken = dt_served + counter_served;
        if taken > kitchen_mu && taken > 0.0 {
            let kept = kitchen_mu / taken;
            dt_served *= kept;
            counter_served *= kept;
            key_events.push(format!(
                "kitchen can only produce {:.0} of {:.0} orders/hour taken",
                kitchen_mu, taken
            ));
        }
        let lost = (dt_lambda + counter_lambda) - (dt_served + counter_served);
        if lost > 0.5 {
            key_events.push(format!("about {:.0} orders/hour walk away unserved", lost));
        }

        let customers = (dt_served + counter_served) * model.shift_hours;
        let revenue = (dt_served * model.drive_thru_ticket + counter_served * model.counter_ticket)
            * model.shift_hours;
        let labor_cost = model.labor_cost(option.staffing.total());

        let total_staff = option.staffing.total() as f64;
        let busy: f64 = average
            .loads
            .iter()
            .map(|l| l.staff as f64 * l.utilization.min(1.0))
            .sum();
        let max_rho = average.loads.iter().map(|l| l.utilization).fold(0.0, f64::max);

        let order_accuracy = (0.97 - 0.1 * (max_rho - 0.85).max(0.0)).clamp(0.0, 1.0);
        let strain = ((max_rho - 0.85) / 0.3).clamp(0.0, 1.0);
        let confidence = (0.9 - 0.4 * strain - 0.05 * scenario.special_events.len() as f64)
            .clamp(0.05, 0.95);

        let mut bottlenecks = Vec::new();
        for l in &average.loads {
            if l.utilization > model.high_water_utilization {
                bottlenecks.push(l.station);
                key_events.push(format!(
                    "{} running at {:.0}% utilization",
                    l.station,
                    l.utilization * 100.0
                ));
            } else if l.equipment_bound && l.demand_per_hour > 0.0 {
                key_events.push(format!(
                    "{} limited by equipment at {:.0} orders/hour",
                    l.station, l.capacity_per_hour
                ));
            }
        }
        if peak.wait >= model.max_wait_seconds {
            key_events.push("peak-hour queues saturate".to_string());
        }

        Ok(SimulationResult {
            metrics: PredictedMetrics {
                customers_served: customers.round() as u32,
                revenue,
                avg_wait_seconds: average.wait,
                peak_wait_seconds: peak.wait,
                max_queue_length: peak.longest_queue.ceil() as u32,
                labor_cost,
                food_cost: revenue * model.food_cost_ratio,
                staff_utilization: (busy / total_staff).clamp(0.0, 1.0),
                order_accuracy,
            },
            station_loads: average.loads,
            key_events,
            bottlenecks,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::context::tests::friday_dinner;
    use crate::capability::{ContextResolver, RuleContextResolver};
    use crate::model::{RiskLevel, Staffing};

    fn setup(events: &[&str]) -> (Scenario, DemandPrediction, CapacityAnalysis) {
        let scenario = friday_dinner(events);
        let resolver = RuleContextResolver {
            model: ModelConfig::default(),
        };
        let (demand, capacity) = resolver.resolve(&scenario).unwrap();
        (scenario, demand, capacity)
    }

    fn option(dt: u32, k: u32, fc: u32) -> StaffingOption {
        StaffingOption::new("test", Staffing::new(dt, k, fc), 0.0, RiskLevel::Medium, "")
    }

    async fn run(dt: u32, k: u32, fc: u32) -> SimulationResult {
        let (scenario, demand, capacity) = setup(&[]);
        QueueSimulator {
            model: ModelConfig::default(),
        }
        .simulate(&option(dt, k, fc), &scenario, &demand, &capacity)
        .await
        .unwrap()
    }

    #[test]
    fn test_queue_delay_shape() {
        assert_eq!(queue_delay(0.0, 100.0, 900.0), 0.0);
        assert_eq!(queue_delay(1.0, 100.0, 900.0), 900.0);
        assert_eq!(queue_delay(0.5, 0.0, 900.0), 900.0);

        let mut previous = 0.0;
        for step in 1..100 {
            let delay = queue_delay(step as f64 / 100.0, 100.0, 900.0);
            assert!(delay > previous);
            assert!(delay < 900.0);
            previous = delay;
        }
    }

    #[tokio::test]
    async fn test_balanced_allocation_metrics() {
        let result = run(4, 6, 2).await;
        let m = &result.metrics;

        assert!((m.avg_wait_seconds - 202.6).abs() < 0.1);
        assert!((m.revenue - 4070.79).abs() < 0.01);
        assert_eq!(m.labor_cost, 960.0);
        assert!((m.labor_cost_pct().unwrap() - 23.58).abs() < 0.01);
        assert!((m.staff_utilization - 0.6883).abs() < 1e-3);
        assert!((m.order_accuracy - 0.97).abs() < 1e-12);
        assert!((m.food_cost - m.revenue * 0.28).abs() < 1e-9);
        assert_eq!(m.customers_served, 410);
        assert!(m.peak_wait_seconds > m.avg_wait_seconds);
        assert!(result.bottlenecks.is_empty());
        assert_eq!(result.station_loads.len(), 3);
    }

    #[tokio::test]
    async fn test_short_kitchen_creates_bottleneck() {
        let result = run(3, 5, 2).await;
        assert!((result.metrics.avg_wait_seconds - 544.2).abs() < 0.1);
        assert_eq!(result.bottlenecks, vec![Station::Kitchen]);
        assert!(result.metrics.order_accuracy < 0.97);
        assert!(result.confidence < 0.9);
    }

    #[tokio::test]
    async fn test_kitchen_limits_customers_served() {
        let result = run(4, 2, 2).await;
        let kitchen = result.load(Station::Kitchen).unwrap();
        assert!(kitchen.utilization > 1.0);
        assert_eq!(result.metrics.avg_wait_seconds, 900.0);
        // 2 cooks produce 44 orders/hour over a 4-hour shift
        assert_eq!(result.metrics.customers_served, 176);
        assert!(result.key_events.iter().any(|e| e.contains("kitchen can only produce")));
    }

    #[tokio::test]
    async fn test_more_staff_never_increases_wait() {
        let lean = run(3, 6, 2).await;
        let covered = run(4, 6, 2).await;
        let extra = run(5, 7, 3).await;
        assert!(covered.metrics.avg_wait_seconds < lean.metrics.avg_wait_seconds);
        assert!(extra.metrics.avg_wait_seconds <= covered.metrics.avg_wait_seconds);
    }

    #[tokio::test]
    async fn test_events_lower_confidence() {
        let (scenario, demand, capacity) = setup(&["concert", "promotion"]);
        let result = QueueSimulator {
            model: ModelConfig::default(),
        }
        .simulate(&option(5, 7, 2), &scenario, &demand, &capacity)
        .await
        .unwrap();
        assert!(result.confidence <= 0.8 + 1e-12);
        assert!(result.confidence >= 0.05);
    }

    #[tokio::test]
    async fn test_rejects_empty_staffing_and_bad_demand() {
        let (scenario, mut demand, capacity) = setup(&[]);
        let simulator = QueueSimulator {
            model: ModelConfig::default(),
        };

        let err = simulator
            .simulate(&option(0, 0, 0), &scenario, &demand, &capacity)
            .await
            .unwrap_err();
        assert_eq!(err, SimulationError::NoStaff);

        demand.hourly_demand = f64::NAN;
        let err = simulator
            .simulate(&option(4, 6, 2), &scenario, &demand, &capacity)
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidDemand(_)));
    }
}

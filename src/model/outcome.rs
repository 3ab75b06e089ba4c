use serde::{Deserialize, Serialize};

use super::staffing::Station;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedMetrics {
    pub customers_served: u32,
    pub revenue: f64,
    pub avg_wait_seconds: f64,
    pub peak_wait_seconds: f64,
    pub max_queue_length: u32,
    pub labor_cost: f64,
    pub food_cost: f64,
    /// Fraction of paid staff time spent serving, in [0, 1]
    pub staff_utilization: f64,
    /// Fraction of orders completed correctly, in [0, 1]
    pub order_accuracy: f64,
}

impl PredictedMetrics {
    /// Labor cost as a percentage of revenue; `None` when labor is paid but
    /// nothing is sold
    pub fn labor_cost_pct(&self) -> Option<f64> {
        if self.revenue > 0.0 {
            Some(self.labor_cost / self.revenue * 100.0)
        } else if self.labor_cost > 0.0 {
            None
        } else {
            Some(0.0)
        }
    }
}

/// Queue state of one station at average load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationLoad {
    pub station: Station,
    pub staff: u32,
    /// Orders/hour arriving at the station
    pub demand_per_hour: f64,
    /// Orders/hour the station can serve (staff-driven, capped by equipment)
    pub capacity_per_hour: f64,
    /// demand / capacity; may exceed 1 when overloaded
    pub utilization: f64,
    /// True when equipment, not headcount, limits the station
    pub equipment_bound: bool,
}

/// Predicted outcome of one staffing option. Exactly one per option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub metrics: PredictedMetrics,
    pub station_loads: Vec<StationLoad>,
    pub key_events: Vec<String>,
    pub bottlenecks: Vec<Station>,
    /// In [0, 1]
    pub confidence: f64,
}

impl SimulationResult {
    pub fn load(&self, station: Station) -> Option<&StationLoad> {
        self.station_loads.iter().find(|l| l.station == station)
    }
}

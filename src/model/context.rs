use serde::{Deserialize, Serialize};

use super::staffing::Station;

/// How demand splits across order channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSplit {
    /// Share of orders placed at the drive-through, in [0, 1]
    pub drive_thru_share: f64,
    /// Share of orders placed at the front counter, in [0, 1]
    pub counter_share: f64,
}

/// Demand estimate for the shift, produced once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPrediction {
    /// Average orders per hour across the shift
    pub hourly_demand: f64,
    /// Orders over the whole shift
    pub total_demand: f64,
    /// Orders in the busiest hour
    pub peak_hour_demand: f64,
    pub channel_split: ChannelSplit,
    pub contributing_factors: Vec<String>,
}

impl DemandPrediction {
    /// Average hourly orders routed to a station. The kitchen sees every order.
    pub fn routed_hourly(&self, station: Station) -> f64 {
        self.hourly_demand * self.routing_share(station)
    }

    pub fn routed_peak(&self, station: Station) -> f64 {
        self.peak_hour_demand * self.routing_share(station)
    }

    fn routing_share(&self, station: Station) -> f64 {
        match station {
            Station::DriveThru => self.channel_split.drive_thru_share,
            Station::FrontCounter => self.channel_split.counter_share,
            Station::Kitchen => 1.0,
        }
    }
}

/// A station expected to run hot at peak
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRisk {
    pub station: Station,
    /// Peak-hour routed demand divided by the station ceiling
    pub peak_load_ratio: f64,
    pub note: String,
}

/// Infrastructure limits of the restaurant, produced once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAnalysis {
    pub drive_thru_ceiling: f64,
    pub kitchen_ceiling: f64,
    pub counter_ceiling: f64,
    pub max_throughput_per_hour: f64,
    pub bottleneck_risks: Vec<StationRisk>,
    pub notes: Vec<String>,
}

impl CapacityAnalysis {
    /// Orders/hour the station's equipment can handle regardless of staffing
    pub fn ceiling(&self, station: Station) -> f64 {
        match station {
            Station::DriveThru => self.drive_thru_ceiling,
            Station::Kitchen => self.kitchen_ceiling,
            Station::FrontCounter => self.counter_ceiling,
        }
    }

    /// Whether the station has equipment to take orders at all
    pub fn has_channel(&self, station: Station) -> bool {
        self.ceiling(station) > 0.0
    }
}

use crate::config::ModelConfig;
use crate::error::ContextError;
use crate::model::{
    CapacityAnalysis, ChannelSplit, DayOfWeek, DemandPrediction, Scenario, ShiftPeriod, Station,
    StationRisk, Weather,
};
use chrono::Datelike;

use super::ContextResolver;

const BASE_DRIVE_THRU_SHARE: f64 = 0.65;
const BASE_COUNTER_SHARE: f64 = 0.35;

/// Static demand rules by shift, day, weather and event tags
#[derive(Debug, Clone)]
pub struct RuleContextResolver {
    pub model: ModelConfig,
}

fn base_hourly_demand(shift: ShiftPeriod) -> f64 {
    match shift {
        ShiftPeriod::Breakfast => 60.0,
        ShiftPeriod::Lunch => 100.0,
        ShiftPeriod::Dinner => 90.0,
    }
}

fn day_multiplier(day: DayOfWeek, shift: ShiftPeriod) -> f64 {
    match (day, shift) {
        (DayOfWeek::Sunday, ShiftPeriod::Lunch) => 1.4,
        (DayOfWeek::Sunday, _) => 1.1,
        (DayOfWeek::Friday, _) => 1.2,
        (DayOfWeek::Saturday, _) => 1.3,
        _ => 1.0,
    }
}

fn weather_multiplier(weather: Weather) -> f64 {
    match weather {
        Weather::Sunny => 1.0,
        Weather::Cloudy => 0.97,
        Weather::Rainy => 0.95,
        Weather::Stormy => 0.75,
    }
}

/// Relative pull of (drive-thru, counter) under the weather
fn channel_preference(weather: Weather) -> (f64, f64) {
    match weather {
        Weather::Rainy => (1.25, 0.9),
        Weather::Stormy => (1.3, 0.7),
        Weather::Sunny | Weather::Cloudy => (1.0, 1.0),
    }
}

fn event_uplift(tag: &str) -> f64 {
    match tag.trim().to_lowercase().as_str() {
        "friday_rush" => 0.30,
        "game_day" | "festival" => 0.40,
        "concert" => 0.30,
        "holiday" => 0.20,
        "promotion" => 0.15,
        _ => 0.10,
    }
}

fn peak_factor(shift: ShiftPeriod) -> f64 {
    match shift {
        ShiftPeriod::Breakfast => 1.4,
        ShiftPeriod::Lunch | ShiftPeriod::Dinner => 1.5,
    }
}

impl RuleContextResolver {
    fn validate(&self, scenario: &Scenario) -> Result<(), ContextError> {
        if !(self.model.shift_hours.is_finite() && self.model.shift_hours > 0.0) {
            return Err(ContextError::InvalidShiftHours(self.model.shift_hours));
        }
        if scenario.restaurant.kitchen_capacity == 0 {
            return Err(ContextError::NoKitchenCapacity);
        }
        if scenario.restaurant.drive_thru_lanes == 0 && scenario.restaurant.pos_terminals == 0 {
            return Err(ContextError::NoOrderChannel);
        }
        if !scenario.day_matches_date() {
            return Err(ContextError::DayMismatch {
                stated: scenario.day_of_week.to_string(),
                date: scenario.date,
                actual: DayOfWeek::from(scenario.date.weekday()).to_string(),
            });
        }
        Ok(())
    }

    fn predict_demand(&self, scenario: &Scenario) -> DemandPrediction {
        let mut factors = Vec::new();

        let base = base_hourly_demand(scenario.shift);
        factors.push(format!("{} base demand {:.0} orders/hour", scenario.shift, base));

        let day = day_multiplier(scenario.day_of_week, scenario.shift);
        if day != 1.0 {
            factors.push(format!("{} traffic x{:.2}", scenario.day_of_week, day));
        }

        let weather = weather_multiplier(scenario.weather);
        if weather != 1.0 {
            factors.push(format!("{} weather x{:.2}", scenario.weather, weather));
        }

        let mut events = 1.0;
        for tag in &scenario.special_events {
            let uplift = event_uplift(tag);
            events *= 1.0 + uplift;
            factors.push(format!("event '{}' +{:.0}%", tag, uplift * 100.0));
        }

        let hourly = base * day * weather * events;

        let (dt_pref, counter_pref) = channel_preference(scenario.weather);
        let dt_weight = if scenario.restaurant.drive_thru_lanes > 0 {
            BASE_DRIVE_THRU_SHARE * dt_pref
        } else {
            0.0
        };
        let counter_weight = if scenario.restaurant.pos_terminals > 0 {
            BASE_COUNTER_SHARE * counter_pref
        } else {
            0.0
        };
        // validate() guarantees at least one channel
        let weight_sum = dt_weight + counter_weight;
        let channel_split = ChannelSplit {
            drive_thru_share: dt_weight / weight_sum,
            counter_share: counter_weight / weight_sum,
        };
        if dt_pref != counter_pref {
            factors.push(format!(
                "{} weather shifts orders to the drive-thru ({:.0}% of volume)",
                scenario.weather,
                channel_split.drive_thru_share * 100.0
            ));
        }

        DemandPrediction {
            hourly_demand: hourly,
            total_demand: hourly * self.model.shift_hours,
            peak_hour_demand: hourly * peak_factor(scenario.shift),
            channel_split,
            contributing_factors: factors,
        }
    }

    fn analyze_capacity(&self, scenario: &Scenario, demand: &DemandPrediction) -> CapacityAnalysis {
        let restaurant = &scenario.restaurant;
        let drive_thru_ceiling = restaurant.drive_thru_lanes as f64 * self.model.drive_thru_lane_capacity;
        let kitchen_ceiling = restaurant.kitchen_capacity as f64;
        let counter_ceiling = restaurant.pos_terminals as f64 * self.model.pos_terminal_capacity;

        let mut capacity = CapacityAnalysis {
            drive_thru_ceiling,
            kitchen_ceiling,
            counter_ceiling,
            max_throughput_per_hour: kitchen_ceiling.min(drive_thru_ceiling + counter_ceiling),
            bottleneck_risks: Vec::new(),
            notes: Vec::new(),
        };

        for station in Station::ALL {
            let ceiling = capacity.ceiling(station);
            if ceiling <= 0.0 {
                capacity.notes.push(format!("no {} channel; station stays unstaffed", station));
                continue;
            }
            let ratio = demand.routed_peak(station) / ceiling;
            if ratio > self.model.high_water_utilization {
                capacity.bottleneck_risks.push(StationRisk {
                    station,
                    peak_load_ratio: ratio,
                    note: format!(
                        "peak demand {:.0}/hour against equipment ceiling {:.0}/hour",
                        demand.routed_peak(station),
                        ceiling
                    ),
                });
            }
        }

        if demand.peak_hour_demand > capacity.max_throughput_per_hour {
            capacity.notes.push(format!(
                "peak hour demand {:.0} exceeds restaurant throughput {:.0}",
                demand.peak_hour_demand, capacity.max_throughput_per_hour
            ));
        }

        capacity
    }
}

impl ContextResolver for RuleContextResolver {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn resolve(
        &self,
        scenario: &Scenario,
    ) -> Result<(DemandPrediction, CapacityAnalysis), ContextError> {
        self.validate(scenario)?;
        let demand = self.predict_demand(scenario);
        let capacity = self.analyze_capacity(scenario, &demand);
        Ok((demand, capacity))
    }
}

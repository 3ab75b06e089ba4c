use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::scenario::Scenario;
use super::scorecard::{AlignmentTargets, ObjectiveWeights};
use super::staffing::{Staffing, Station};

/// Which objective the initial allocation over-indexes on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPriority {
    #[default]
    Balanced,
    #[serde(alias = "profit_focus")]
    MinimizeCost,
    #[serde(alias = "service_focus")]
    CustomerFirst,
    StaffWellbeing,
}

impl std::fmt::Display for DecisionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionPriority::Balanced => write!(f, "balanced"),
            DecisionPriority::MinimizeCost => write!(f, "minimize_cost"),
            DecisionPriority::CustomerFirst => write!(f, "customer_first"),
            DecisionPriority::StaffWellbeing => write!(f, "staff_wellbeing"),
        }
    }
}

impl std::str::FromStr for DecisionPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "balanced" => Ok(DecisionPriority::Balanced),
            "minimize_cost" | "profit_focus" => Ok(DecisionPriority::MinimizeCost),
            "customer_first" | "service_focus" => Ok(DecisionPriority::CustomerFirst),
            "staff_wellbeing" => Ok(DecisionPriority::StaffWellbeing),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Minimum headcount per station whenever the station has an order channel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct StationFloors {
    #[serde(default = "default_drive_thru_floor")]
    pub drive_thru: u32,

    #[serde(default = "default_kitchen_floor")]
    pub kitchen: u32,

    #[serde(default = "default_counter_floor")]
    pub front_counter: u32,
}

fn default_drive_thru_floor() -> u32 {
    2
}

fn default_kitchen_floor() -> u32 {
    3
}

fn default_counter_floor() -> u32 {
    1
}

impl Default for StationFloors {
    fn default() -> Self {
        Self {
            drive_thru: default_drive_thru_floor(),
            kitchen: default_kitchen_floor(),
            front_counter: default_counter_floor(),
        }
    }
}

impl StationFloors {
    pub fn get(&self, station: Station) -> u32 {
        match station {
            Station::DriveThru => self.drive_thru,
            Station::Kitchen => self.kitchen,
            Station::FrontCounter => self.front_counter,
        }
    }

    /// Sum of all floors, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        self.drive_thru
            .saturating_add(self.kitchen)
            .saturating_add(self.front_counter)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Constraints {
    /// Staff pool that may be scheduled
    pub available_staff: u32,

    /// Optional cap on scheduled staff-hours for the shift
    #[serde(default)]
    pub budget_hours: Option<f64>,

    #[serde(default)]
    pub min_staff_per_station: StationFloors,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            available_staff: 15,
            budget_hours: None,
            min_staff_per_station: StationFloors::default(),
        }
    }
}

impl Constraints {
    /// Headcount ceiling after applying the staff-hour budget
    pub fn staff_ceiling(&self, shift_hours: f64) -> u32 {
        match self.budget_hours {
            Some(hours) if shift_hours > 0.0 => {
                let by_budget = (hours.max(0.0) / shift_hours).floor() as u32;
                self.available_staff.min(by_budget)
            }
            _ => self.available_staff,
        }
    }

    /// Floor for a station; stations without an order channel have none
    pub fn floor(&self, station: Station, has_channel: bool) -> u32 {
        if has_channel {
            self.min_staff_per_station.get(station)
        } else {
            0
        }
    }

    /// Describe the first constraint the allocation breaks, if any
    pub fn violation(
        &self,
        staffing: &Staffing,
        shift_hours: f64,
        has_channel: impl Fn(Station) -> bool,
    ) -> Option<String> {
        if staffing.total() == 0 {
            return Some("allocation schedules no staff".to_string());
        }
        let ceiling = self.staff_ceiling(shift_hours);
        if staffing.total() > ceiling {
            return Some(format!(
                "total staff {} exceeds ceiling {}",
                staffing.total(),
                ceiling
            ));
        }
        for (station, count) in staffing.iter() {
            if !has_channel(station) {
                if count > 0 {
                    return Some(format!("{} has no order channel but {} staff", station, count));
                }
                continue;
            }
            let floor = self.floor(station, true);
            if count < floor {
                return Some(format!("{} staffed at {}, minimum is {}", station, count, floor));
            }
        }
        None
    }
}

/// Everything a caller supplies to one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub scenario: Scenario,
    pub constraints: Constraints,
    pub targets: AlignmentTargets,
    pub weights: ObjectiveWeights,
    pub priority: DecisionPriority,
    pub max_iterations: u32,
}

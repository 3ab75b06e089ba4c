use chrono::{Datelike, NaiveDate, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named service period with its own demand profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShiftPeriod {
    Breakfast,
    Lunch,
    Dinner,
}

impl std::fmt::Display for ShiftPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftPeriod::Breakfast => write!(f, "breakfast"),
            ShiftPeriod::Lunch => write!(f, "lunch"),
            ShiftPeriod::Dinner => write!(f, "dinner"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
}

impl std::fmt::Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Weather::Sunny => write!(f, "sunny"),
            Weather::Cloudy => write!(f, "cloudy"),
            Weather::Rainy => write!(f, "rainy"),
            Weather::Stormy => write!(f, "stormy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        };
        write!(f, "{}", name)
    }
}

/// Physical profile of the restaurant location
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RestaurantProfile {
    #[serde(default)]
    pub location: String,

    /// Drive-through lanes (0 = no drive-through)
    #[serde(default = "default_drive_thru_lanes")]
    pub drive_thru_lanes: u32,

    /// Kitchen equipment ceiling in orders/hour
    #[serde(default = "default_kitchen_capacity")]
    pub kitchen_capacity: u32,

    /// Point-of-sale terminals at the front counter (0 = no counter service)
    #[serde(default = "default_pos_terminals")]
    pub pos_terminals: u32,

    #[serde(default = "default_seating_capacity")]
    pub seating_capacity: u32,
}

fn default_drive_thru_lanes() -> u32 {
    2
}

fn default_kitchen_capacity() -> u32 {
    150
}

fn default_pos_terminals() -> u32 {
    2
}

fn default_seating_capacity() -> u32 {
    50
}

impl Default for RestaurantProfile {
    fn default() -> Self {
        Self {
            location: String::new(),
            drive_thru_lanes: default_drive_thru_lanes(),
            kitchen_capacity: default_kitchen_capacity(),
            pos_terminals: default_pos_terminals(),
            seating_capacity: default_seating_capacity(),
        }
    }
}

/// Operational scenario for one shift. Immutable for the duration of a run.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Scenario {
    pub shift: ShiftPeriod,

    pub date: NaiveDate,

    pub day_of_week: DayOfWeek,

    pub weather: Weather,

    #[serde(default)]
    pub special_events: Vec<String>,

    #[serde(default)]
    pub restaurant: RestaurantProfile,
}

impl Scenario {
    /// Whether the stated day of week agrees with the calendar date
    pub fn day_matches_date(&self) -> bool {
        DayOfWeek::from(self.date.weekday()) == self.day_of_week
    }
}

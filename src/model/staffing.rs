use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A functional area with its own throughput and staff allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    DriveThru,
    Kitchen,
    FrontCounter,
}

impl Station {
    pub const ALL: [Station; 3] = [Station::DriveThru, Station::Kitchen, Station::FrontCounter];
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Station::DriveThru => write!(f, "drive_thru"),
            Station::Kitchen => write!(f, "kitchen"),
            Station::FrontCounter => write!(f, "front_counter"),
        }
    }
}

#[derive(Deserialize)]
struct StaffingRepr {
    drive_thru: u32,
    kitchen: u32,
    front_counter: u32,
}

impl From<StaffingRepr> for Staffing {
    fn from(repr: StaffingRepr) -> Self {
        Staffing::new(repr.drive_thru, repr.kitchen, repr.front_counter)
    }
}

/// Per-station headcount. `total` is always the (saturating) sum of the
/// stations; it is recomputed on every construction, including deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StaffingRepr")]
pub struct Staffing {
    drive_thru: u32,
    kitchen: u32,
    front_counter: u32,
    total: u32,
}

impl Staffing {
    pub fn new(drive_thru: u32, kitchen: u32, front_counter: u32) -> Self {
        Self {
            drive_thru,
            kitchen,
            front_counter,
            total: drive_thru.saturating_add(kitchen).saturating_add(front_counter),
        }
    }

    pub fn drive_thru(&self) -> u32 {
        self.drive_thru
    }

    pub fn kitchen(&self) -> u32 {
        self.kitchen
    }

    pub fn front_counter(&self) -> u32 {
        self.front_counter
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn get(&self, station: Station) -> u32 {
        match station {
            Station::DriveThru => self.drive_thru,
            Station::Kitchen => self.kitchen,
            Station::FrontCounter => self.front_counter,
        }
    }

    /// Copy with one station replaced
    pub fn with(&self, station: Station, count: u32) -> Self {
        let mut counts = [self.drive_thru, self.kitchen, self.front_counter];
        counts[station_index(station)] = count;
        Staffing::new(counts[0], counts[1], counts[2])
    }

    /// Copy with one unit moved from `from` to `to`; `None` if `from` is empty
    pub fn transfer(&self, from: Station, to: Station) -> Option<Self> {
        let source = self.get(from).checked_sub(1)?;
        let moved = self.with(from, source);
        Some(moved.with(to, moved.get(to).saturating_add(1)))
    }

    /// Copy with one unit removed from `station`; `None` if it is empty
    pub fn remove_one(&self, station: Station) -> Option<Self> {
        let remaining = self.get(station).checked_sub(1)?;
        Some(self.with(station, remaining))
    }

    pub fn add_one(&self, station: Station) -> Self {
        self.with(station, self.get(station).saturating_add(1))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Station, u32)> + '_ {
        Station::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

fn station_index(station: Station) -> usize {
    match station {
        Station::DriveThru => 0,
        Station::Kitchen => 1,
        Station::FrontCounter => 2,
    }
}

impl std::fmt::Display for Staffing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} total (drive_thru {}, kitchen {}, front_counter {})",
            self.total, self.drive_thru, self.kitchen, self.front_counter
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Classify from the highest planned peak-hour utilization of any station
    pub fn from_peak_utilization(peak: f64) -> Self {
        if peak > 1.1 {
            RiskLevel::VeryHigh
        } else if peak > 1.0 {
            RiskLevel::High
        } else if peak > 0.9 {
            RiskLevel::Medium
        } else if peak > 0.75 {
            RiskLevel::Low
        } else {
            RiskLevel::VeryLow
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::VeryLow => write!(f, "very_low"),
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// A candidate staffing allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingOption {
    pub id: String,
    pub strategy: String,
    pub staffing: Staffing,
    pub estimated_labor_cost: f64,
    pub risk: RiskLevel,
    pub rationale: String,
}

impl StaffingOption {
    pub fn new(
        strategy: impl Into<String>,
        staffing: Staffing,
        estimated_labor_cost: f64,
        risk: RiskLevel,
        rationale: impl Into<String>,
    ) -> Self {
        let strategy = strategy.into();
        let id = fingerprint(&strategy, &staffing);
        Self {
            id,
            strategy,
            staffing,
            estimated_labor_cost,
            risk,
            rationale: rationale.into(),
        }
    }
}

/// Deterministic option id: strategy | drive_thru | kitchen | front_counter
fn fingerprint(strategy: &str, staffing: &Staffing) -> String {
    let input = format!(
        "{}|{}|{}|{}",
        strategy,
        staffing.drive_thru(),
        staffing.kitchen(),
        staffing.front_counter()
    );
    let hash = Sha256::digest(input.as_bytes());
    format!("opt-{}", &format!("{:x}", hash)[..12])
}

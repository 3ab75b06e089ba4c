use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Profit,
    GuestSatisfaction,
    StaffWellbeing,
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Objective::Profit => write!(f, "profit"),
            Objective::GuestSatisfaction => write!(f, "guest_satisfaction"),
            Objective::StaffWellbeing => write!(f, "staff_wellbeing"),
        }
    }
}

/// Operator targets that scoring measures deviation against
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct AlignmentTargets {
    /// Labor cost as % of revenue; at or below scores full profit credit
    pub labor_cost_pct: f64,

    /// Average wait ceiling in seconds
    pub wait_seconds: f64,

    /// Utilization midpoint
    pub utilization: f64,

    /// Half-width of the full-credit utilization band around the midpoint
    #[serde(default = "default_utilization_band")]
    pub utilization_band: f64,
}

fn default_utilization_band() -> f64 {
    0.08
}

impl Default for AlignmentTargets {
    fn default() -> Self {
        Self {
            labor_cost_pct: 30.0,
            wait_seconds: 180.0,
            utilization: 0.82,
            utilization_band: default_utilization_band(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ObjectiveWeights {
    pub profit: f64,
    pub guest_satisfaction: f64,
    pub staff_wellbeing: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            profit: 0.40,
            guest_satisfaction: 0.35,
            staff_wellbeing: 0.25,
        }
    }
}

impl ObjectiveWeights {
    pub fn sum(&self) -> f64 {
        self.profit + self.guest_satisfaction + self.staff_wellbeing
    }

    /// Rescale so the weights sum to 1.0. `None` if any weight is negative or
    /// non-finite, or if they sum to zero.
    pub fn normalized(&self) -> Option<Self> {
        let parts = [self.profit, self.guest_satisfaction, self.staff_wellbeing];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let sum = self.sum();
        if sum <= 0.0 {
            return None;
        }
        Some(Self {
            profit: self.profit / sum,
            guest_satisfaction: self.guest_satisfaction / sum,
            staff_wellbeing: self.staff_wellbeing / sum,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl Ranking {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Ranking::Excellent
        } else if score >= 0.85 {
            Ranking::VeryGood
        } else if score >= 0.70 {
            Ranking::Good
        } else if score >= 0.50 {
            Ranking::Fair
        } else {
            Ranking::Poor
        }
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ranking::Excellent => write!(f, "excellent"),
            Ranking::VeryGood => write!(f, "very_good"),
            Ranking::Good => write!(f, "good"),
            Ranking::Fair => write!(f, "fair"),
            Ranking::Poor => write!(f, "poor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveScore {
    pub objective: Objective,
    /// In [0, 1]
    pub raw_score: f64,
    /// Normalized weight, in [0, 1]
    pub weight: f64,
    /// weight * raw_score
    pub weighted: f64,
    /// Measured value; `None` when it is undefined (labor % with no revenue)
    pub actual: Option<f64>,
    pub target: f64,
    pub detail: String,
}

/// Multi-objective score of one option. Exactly one per option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub profit: ObjectiveScore,
    pub guest_satisfaction: ObjectiveScore,
    pub staff_wellbeing: ObjectiveScore,
    pub overall_score: f64,
    pub ranking: Ranking,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: String,
}

impl ScoreCard {
    pub fn get(&self, objective: Objective) -> &ObjectiveScore {
        match objective {
            Objective::Profit => &self.profit,
            Objective::GuestSatisfaction => &self.guest_satisfaction,
            Objective::StaffWellbeing => &self.staff_wellbeing,
        }
    }

    pub fn objectives(&self) -> [&ObjectiveScore; 3] {
        [&self.profit, &self.guest_satisfaction, &self.staff_wellbeing]
    }

    /// Lowest raw score; ties resolve in declaration order
    pub fn weakest(&self) -> &ObjectiveScore {
        let mut weakest = &self.profit;
        for score in [&self.guest_satisfaction, &self.staff_wellbeing] {
            if score.raw_score < weakest.raw_score {
                weakest = score;
            }
        }
        weakest
    }
}

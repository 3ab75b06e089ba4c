use std::path::PathBuf;

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("plans")
}

pub fn default_max_iterations() -> u32 {
    3
}

pub fn default_min_improvement() -> f64 {
    0.005
}

pub fn default_candidates_per_iteration() -> usize {
    1
}

pub fn default_concurrency() -> usize {
    4
}

pub fn default_timeout_ms() -> u64 {
    30_000
}

pub fn default_max_attempts() -> u32 {
    2
}

pub fn default_backoff_base_ms() -> u64 {
    200
}

pub fn default_shift_hours() -> f64 {
    4.0
}

pub fn default_hourly_wage() -> f64 {
    20.0
}

pub fn default_food_cost_ratio() -> f64 {
    0.28
}

pub fn default_drive_thru_ticket() -> f64 {
    9.5
}

pub fn default_counter_ticket() -> f64 {
    11.0
}

pub fn default_drive_thru_rate() -> f64 {
    28.0
}

pub fn default_kitchen_rate() -> f64 {
    22.0
}

pub fn default_counter_rate() -> f64 {
    30.0
}

pub fn default_drive_thru_lane_capacity() -> f64 {
    60.0
}

pub fn default_pos_terminal_capacity() -> f64 {
    45.0
}

pub fn default_base_service_seconds() -> f64 {
    60.0
}

pub fn default_max_wait_seconds() -> f64 {
    900.0 // 15 minutes
}

pub fn default_high_water_utilization() -> f64 {
    0.9
}

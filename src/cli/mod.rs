pub mod evaluate;
pub mod list;
pub mod plan;
pub mod schema;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::DecisionPriority;

#[derive(Parser)]
#[command(name = "shiftplan")]
#[command(
    author,
    version,
    about = "Iterative plan-simulate-score-refine staffing planner for restaurant shifts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (default: ./shiftplan.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan staffing for one shift and write the decision trace
    Plan(PlanArgs),

    /// Compare a saved plan against what actually happened
    Evaluate(EvaluateArgs),

    /// List saved planning runs, newest first
    List(ListArgs),

    /// Print JSON Schema for an input document
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct PlanArgs {
    /// Scenario file (YAML or JSON)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Override max refinement rounds (0 = baseline only)
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override staff available for the shift
    #[arg(long)]
    pub available_staff: Option<u32>,

    /// Initial allocation priority
    #[arg(long, default_value = "balanced")]
    pub priority: DecisionPriority,

    /// Override output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct EvaluateArgs {
    /// Saved plan_<run_id>.json
    #[arg(long)]
    pub run: PathBuf,

    /// Actual shift results (YAML or JSON)
    #[arg(long)]
    pub actuals: PathBuf,

    /// Where to write eval_<run_id>.json (default: next to the plan)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct ListArgs {
    /// Maximum number of runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Directory to scan (default: output_dir from config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Which document to describe
    #[arg(value_enum, default_value = "config")]
    pub target: SchemaTarget,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaTarget {
    Config,
    Scenario,
    Actuals,
}

use anyhow::Context;
use tracing::info;

use crate::actuals::{evaluate_actuals, ActualMetrics};
use crate::cli::EvaluateArgs;
use crate::output::{load_run, write_comparison};

pub fn execute(args: EvaluateArgs) -> anyhow::Result<()> {
    let run = load_run(&args.run)?;

    let content = std::fs::read_to_string(&args.actuals)
        .with_context(|| format!("Failed to read actuals {:?}", args.actuals))?;
    let actual: ActualMetrics = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse actuals {:?}", args.actuals))?;

    let report = evaluate_actuals(&run, &actual)?;

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => args
            .run
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
    };
    let path = write_comparison(&output_dir, &report)?;
    info!("Comparison written to {:?}", path);

    println!("\n=== Prediction accuracy for run {} ===\n", report.run_id);
    println!("{:<20} {:>12} {:>12} {:>9}  Band", "Metric", "Predicted", "Actual", "Error");
    for comparison in &report.comparisons {
        println!(
            "{:<20} {:>12.2} {:>12.2} {:>8.1}%  {}",
            comparison.metric,
            comparison.predicted,
            comparison.actual,
            comparison.error_pct,
            comparison.band
        );
    }
    println!(
        "\nMean absolute error: {:.1}% ({})",
        report.mean_abs_error_pct, report.prediction_quality
    );
    if let Some(worst) = report.worst() {
        println!("Largest miss: {} ({:+.1}%)", worst.metric, worst.error_pct);
    }
    if !report.reported_issues.is_empty() {
        println!("Reported issues:");
        for issue in &report.reported_issues {
            println!("  - {}", issue);
        }
    }
    println!("\nComparison written to {}", path.display());
    Ok(())
}

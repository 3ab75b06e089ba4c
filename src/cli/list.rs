use crate::cli::ListArgs;
use crate::config::Config;
use crate::output::list_runs;

pub fn execute(args: ListArgs, config: Config) -> anyhow::Result<()> {
    let output_dir = args.output_dir.unwrap_or(config.output_dir);
    let runs = list_runs(&output_dir, args.limit)?;

    if runs.is_empty() {
        println!("No saved runs in {}", output_dir.display());
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:<30}  {:<9}  {:<19}  Best",
        "Run", "Started", "Scenario", "Status", "Stop reason"
    );
    for run in &runs {
        println!(
            "{:<36}  {:<16}  {:<30}  {:<9}  {:<19}  {}",
            run.run_id,
            run.started_at.format("%Y-%m-%d %H:%M"),
            run.scenario,
            run.status.to_string(),
            run.stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            run.best_score
                .map(|s| format!("{:.4}", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

//! CLI handler for the `plan` subcommand

use anyhow::Context;
use tracing::{info, warn};

use crate::capability::Capabilities;
use crate::cli::PlanArgs;
use crate::config::Config;
use crate::model::{PlanRequest, PlanningRun, RunStatus, Scenario};
use crate::output::write_run;
use crate::runner::{CancellationToken, PlanningOrchestrator};

pub async fn execute(args: PlanArgs, config: Config) -> anyhow::Result<()> {
    let mut config = config;

    // Apply CLI overrides
    if let Some(max_iterations) = args.max_iterations {
        config.planning.max_iterations = max_iterations;
    }
    if let Some(available_staff) = args.available_staff {
        config.constraints.available_staff = available_staff;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    config.validate()?;

    let content = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read scenario {:?}", args.scenario))?;
    let scenario: Scenario = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario {:?}", args.scenario))?;

    let request = PlanRequest {
        scenario,
        constraints: config.constraints.clone(),
        targets: config.targets.clone(),
        weights: config.weights.clone(),
        priority: args.priority,
        max_iterations: config.planning.max_iterations,
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing with the best plan so far");
                cancel.cancel();
            }
        })
    };

    info!(
        "Planning {} {} ({}) with priority {}",
        request.scenario.day_of_week, request.scenario.shift, request.scenario.date, request.priority
    );
    let orchestrator = PlanningOrchestrator::new(&config, Capabilities::heuristic(&config));
    let outcome = orchestrator.run_plan(request, &cancel).await;
    interrupt.abort();

    match outcome {
        Ok(run) => {
            let written = write_run(&config.output_dir, &run)?;
            print_summary(&run);
            println!("Plan written to {}", written.json.display());
            println!("Trace written to {}", written.markdown.display());
            Ok(())
        }
        Err(failure) => {
            // Keep the partial trace for inspection
            match write_run(&config.output_dir, &failure.run) {
                Ok(written) => eprintln!("Partial trace written to {}", written.json.display()),
                Err(e) => warn!("Failed to write partial trace: {}", e),
            }
            Err(anyhow::Error::new(failure).context("Planning run failed"))
        }
    }
}

fn print_summary(run: &PlanningRun) {
    println!("\n=== Planning Run {} ===\n", run.run_id);
    println!("Status: {}", run.status);
    if let Some(reason) = run.stop_reason {
        println!("Stop reason: {}", reason);
    }
    println!(
        "Iterations: {} ({} candidates evaluated)",
        run.iterations.len(),
        run.candidate_count()
    );

    match &run.best {
        Some(best) => {
            let evaluation = &best.evaluation;
            let card = &evaluation.scorecard;
            println!("\nSelected: {}", evaluation.option.staffing);
            println!(
                "Score: {:.4} ({}) | profit {:.3}, guest {:.3}, wellbeing {:.3}",
                card.overall_score,
                card.ranking,
                card.profit.raw_score,
                card.guest_satisfaction.raw_score,
                card.staff_wellbeing.raw_score
            );
            println!("Recommendation: {}", card.recommendation);
        }
        None => println!("\nNo plan selected"),
    }

    if run.status == RunStatus::Cancelled {
        println!("\nRun was cancelled before refinement finished");
    }
    println!();
}

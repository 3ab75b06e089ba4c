use crate::model::{Evaluation, Iteration, PlanningRun, RunStatus};

/// Render the run's decision trace as markdown
pub fn build_run_markdown(run: &PlanningRun) -> String {
    let mut content = String::new();

    content.push_str(&format!("# Staffing plan {}\n\n", run.run_id));

    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!("| Status | {} |\n", format_status(run)));
    content.push_str(&format!(
        "| Stop reason | {} |\n",
        run.stop_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    content.push_str(&format!(
        "| Scenario | {} {} ({}), {} |\n",
        run.scenario.day_of_week, run.scenario.shift, run.scenario.date, run.scenario.weather
    ));
    content.push_str(&format!("| Priority | {} |\n", run.priority));
    content.push_str(&format!(
        "| Iterations | {} of {} |\n",
        run.iterations.len(),
        run.max_iterations
    ));
    content.push_str(&format!("| Candidates | {} |\n", run.candidate_count()));
    content.push_str(&format!(
        "| Duration | {:.1}s |\n",
        run.total_duration_ms as f64 / 1000.0
    ));
    content.push_str("\n---\n\n");

    if let Some(demand) = &run.demand {
        content.push_str("## Demand\n\n");
        content.push_str(&format!(
            "- **Hourly:** {:.1} orders (peak {:.1}, shift total {:.0})\n",
            demand.hourly_demand, demand.peak_hour_demand, demand.total_demand
        ));
        content.push_str(&format!(
            "- **Channel split:** {:.0}% drive-thru / {:.0}% counter\n",
            demand.channel_split.drive_thru_share * 100.0,
            demand.channel_split.counter_share * 100.0
        ));
        for factor in &demand.contributing_factors {
            content.push_str(&format!("- {}\n", factor));
        }
        content.push('\n');
    }

    if let Some(capacity) = &run.capacity {
        content.push_str("## Capacity\n\n");
        content.push_str(&format!(
            "- **Ceilings:** drive-thru {:.0}/h, kitchen {:.0}/h, counter {:.0}/h\n",
            capacity.drive_thru_ceiling, capacity.kitchen_ceiling, capacity.counter_ceiling
        ));
        for risk in &capacity.bottleneck_risks {
            content.push_str(&format!(
                "- `{}` at {:.2} of ceiling at peak: {}\n",
                risk.station, risk.peak_load_ratio, risk.note
            ));
        }
        content.push('\n');
    }

    if let Some(baseline) = &run.baseline {
        content.push_str("## Baseline\n\n");
        push_table_header(&mut content);
        push_row(&mut content, baseline, is_best(run, 0, 0));
        content.push('\n');
    }

    for iteration in &run.iterations {
        push_iteration(&mut content, run, iteration);
    }

    match &run.best {
        Some(best) => {
            let evaluation = &best.evaluation;
            let metrics = &evaluation.result.metrics;
            content.push_str("## Selected plan\n\n");
            content.push_str(&format!(
                "**{}** `{}` from {}\n\n",
                evaluation.option.strategy,
                evaluation.option.id,
                if best.iteration == 0 {
                    "baseline".to_string()
                } else {
                    format!("iteration {}", best.iteration)
                }
            ));
            content.push_str(&format!("- **Staffing:** {}\n", evaluation.option.staffing));
            content.push_str(&format!(
                "- **Score:** {:.4} ({})\n",
                evaluation.overall(),
                evaluation.scorecard.ranking
            ));
            content.push_str(&format!(
                "- **Revenue:** ${:.2}, labor ${:.2} ({})\n",
                metrics.revenue,
                metrics.labor_cost,
                metrics
                    .labor_cost_pct()
                    .map(|pct| format!("{:.1}%", pct))
                    .unwrap_or_else(|| "no revenue".to_string())
            ));
            content.push_str(&format!(
                "- **Wait:** {:.0}s average, {:.0}s peak\n",
                metrics.avg_wait_seconds, metrics.peak_wait_seconds
            ));
            content.push_str(&format!(
                "- **Utilization:** {:.0}%\n",
                metrics.staff_utilization * 100.0
            ));
            content.push_str(&format!("- **Risk:** {}\n\n", evaluation.option.risk));

            if !evaluation.scorecard.strengths.is_empty() {
                content.push_str("**Strengths:**\n");
                for strength in &evaluation.scorecard.strengths {
                    content.push_str(&format!("- {}\n", strength));
                }
                content.push('\n');
            }
            if !evaluation.scorecard.weaknesses.is_empty() {
                content.push_str("**Weaknesses:**\n");
                for weakness in &evaluation.scorecard.weaknesses {
                    content.push_str(&format!("- {}\n", weakness));
                }
                content.push('\n');
            }
            content.push_str(&format!(
                "**Recommendation:** {}\n\n",
                evaluation.scorecard.recommendation
            ));
        }
        None => content.push_str("*No plan selected*\n\n"),
    }

    content.push_str("---\n\n");
    let trace: Vec<String> = run.transitions.iter().map(|p| p.to_string()).collect();
    content.push_str(&format!("Transitions: `{}`\n", trace.join(" → ")));

    content
}

fn push_iteration(content: &mut String, run: &PlanningRun, iteration: &Iteration) {
    content.push_str(&format!("## Iteration {}\n\n", iteration.number));

    if let Some(feedback) = &iteration.feedback {
        content.push_str(&format!("> {}\n\n", feedback.message));
    }

    if iteration.evaluations.is_empty() {
        content.push_str("*No candidates scored*\n\n");
    } else {
        push_table_header(content);
        for (idx, evaluation) in iteration.evaluations.iter().enumerate() {
            push_row(content, evaluation, is_best(run, iteration.number, idx));
        }
        content.push('\n');
    }

    for skipped in &iteration.skipped {
        content.push_str(&format!(
            "- ⏭️ `{}` [{}] skipped at {}: {}\n",
            skipped.option.id, skipped.option.staffing, skipped.stage, skipped.reason
        ));
    }
    if !iteration.skipped.is_empty() {
        content.push('\n');
    }
}

fn push_table_header(content: &mut String) {
    content.push_str("| Option | DT | K | FC | Profit | Guest | Wellbeing | Overall | |\n");
    content.push_str("|--------|----|---|----|--------|-------|-----------|---------|---|\n");
}

fn push_row(content: &mut String, evaluation: &Evaluation, best: bool) {
    let staffing = evaluation.option.staffing;
    let card = &evaluation.scorecard;
    content.push_str(&format!(
        "| `{}` | {} | {} | {} | {:.3} | {:.3} | {:.3} | {:.4} | {} |\n",
        evaluation.option.id,
        staffing.drive_thru(),
        staffing.kitchen(),
        staffing.front_counter(),
        card.profit.raw_score,
        card.guest_satisfaction.raw_score,
        card.staff_wellbeing.raw_score,
        card.overall_score,
        if best { "⭐" } else { "" }
    ));
}

fn is_best(run: &PlanningRun, iteration: u32, index: usize) -> bool {
    run.best
        .as_ref()
        .is_some_and(|b| b.iteration == iteration && b.index == index)
}

fn format_status(run: &PlanningRun) -> String {
    match run.status {
        RunStatus::Completed => "✅ Completed".to_string(),
        RunStatus::Cancelled => "⏹️ Cancelled".to_string(),
        RunStatus::Failed => format!(
            "❌ Failed ({})",
            run.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

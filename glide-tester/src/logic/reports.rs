use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ComparisonRun;

pub fn generate_console_report(
    out: &mut dyn Write,
    run: &ComparisonRun,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Policy Comparison Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;
    writeln!(out, "Flights per policy: {}", run.flights)?;
    writeln!(out, "Seed: {}", run.comparison.seed)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    let best = run
        .comparison
        .best_by_mean_distance()
        .map(|s| s.policy_name.clone());

    for policy_run in &run.runs {
        let summary = &policy_run.summary;
        let marker = if best.as_deref() == Some(summary.policy_name.as_str()) {
            "🏆".to_string()
        } else {
            "  ".to_string()
        };
        let cached = if policy_run.cached { " (cached)" } else { "" };
        writeln!(
            out,
            "{} {}{}",
            marker,
            policy_run.policy.bold(),
            cached.dimmed()
        )?;
        writeln!(
            out,
            "   Distance km: mean {:.1} ± {:.1}, median {:.1}, min {:.1}, max {:.1}",
            summary.distance_m.mean / 1000.0,
            summary.distance_m.std / 1000.0,
            summary.distance_m.median / 1000.0,
            summary.distance_m.min / 1000.0,
            summary.distance_m.max / 1000.0
        )?;
        writeln!(
            out,
            "   Duration h: mean {:.2}, max {:.2}",
            summary.duration_s.mean / 3600.0,
            summary.duration_s.max / 3600.0
        )?;
        writeln!(
            out,
            "   Landed: {} out of altitude, {} out of time",
            format!("{:.1}%", summary.out_of_altitude_rate * 100.0).yellow(),
            format!("{:.1}%", summary.out_of_time_rate * 100.0).green()
        )?;
        writeln!(
            out,
            "   Thermals per flight: {:.2}, climbing {:.0} s",
            summary.mean_thermals_used, summary.mean_climb_time_s
        )?;
        if !policy_run.failures.is_empty() {
            writeln!(out, "   Failures: {}", policy_run.failures.len().to_string().red())?;
            for failure in policy_run.failures.iter().take(5) {
                writeln!(out, "     • flight {}: {}", failure.index, failure.message.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, run: &ComparisonRun) -> Result<()> {
    let json_output = serde_json::to_string_pretty(run)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, run: &ComparisonRun) -> Result<()> {
    writeln!(out, "# Glide Policy Comparison\n")?;
    writeln!(out, "- **Flights per policy**: {}", run.flights)?;
    writeln!(out, "- **Seed**: {}", run.comparison.seed)?;
    writeln!(out, "- **Failed flights**: {}\n", run.failure_count())?;

    writeln!(
        out,
        "| Policy | Mean km | Median km | Min km | Max km | Out of altitude | Out of time | Thermals |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|")?;
    for policy_run in &run.runs {
        let s = &policy_run.summary;
        writeln!(
            out,
            "| {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1}% | {:.1}% | {:.2} |",
            policy_run.policy,
            s.distance_m.mean / 1000.0,
            s.distance_m.median / 1000.0,
            s.distance_m.min / 1000.0,
            s.distance_m.max / 1000.0,
            s.out_of_altitude_rate * 100.0,
            s.out_of_time_rate * 100.0,
            s.mean_thermals_used
        )?;
    }

    if let Some(best) = run.comparison.best_by_mean_distance() {
        writeln!(out, "\nFarthest on average: **{}**", best.policy_name)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, run: &ComparisonRun) -> Result<()> {
    writeln!(
        out,
        "policy,policy_name,flights,failures,cached,distance_mean_m,distance_std_m,distance_min_m,distance_median_m,distance_max_m,duration_mean_s,out_of_time_rate,out_of_altitude_rate,mean_thermals_used,mean_climb_time_s"
    )?;
    for policy_run in &run.runs {
        let s = &policy_run.summary;
        writeln!(
            out,
            "{},{},{},{},{},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.4},{:.4},{:.4},{:.3}",
            csv_field(&policy_run.policy),
            csv_field(&s.policy_name),
            s.flight_count,
            policy_run.failures.len(),
            policy_run.cached,
            s.distance_m.mean,
            s.distance_m.std,
            s.distance_m.min,
            s.distance_m.median,
            s.distance_m.max,
            s.duration_s.mean,
            s.out_of_time_rate,
            s.out_of_altitude_rate,
            s.mean_thermals_used,
            s.mean_climb_time_s
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::runner::{PolicyRun, RunFailure};
    use glide_sim::{BatchSummary, ExperimentOutputBatch, PolicyComparison};

    fn sample_run() -> ComparisonRun {
        let summary = BatchSummary::from_batch("three_zones(0.9,0.5)", &ExperimentOutputBatch::default());
        let mut comparison = PolicyComparison::new(42);
        comparison.push(summary.clone());
        ComparisonRun {
            flights: 0,
            comparison,
            runs: vec![PolicyRun {
                policy: "three-zones:0.9:0.5".to_string(),
                summary,
                failures: vec![RunFailure {
                    index: 3,
                    message: "policy 'x' failed: boom".to_string(),
                }],
                cached: false,
                elapsed: Duration::from_millis(5),
            }],
        }
    }

    fn render(f: impl Fn(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer: Vec<u8> = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn csv_has_header_and_row() {
        let run = sample_run();
        let text = render(|out| generate_csv_report(out, &run));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("policy,policy_name,flights"));
        assert!(lines[1].starts_with("three-zones:0.9:0.5,\"three_zones(0.9,0.5)\",0,1,false"));
    }

    #[test]
    fn json_lists_failures() {
        let run = sample_run();
        let text = render(|out| generate_json_report(out, &run));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["runs"][0]["failures"][0]["index"], 3);
        assert_eq!(value["comparison"]["seed"], 42);
    }

    #[test]
    fn markdown_and_console_mention_policy() {
        let run = sample_run();
        let markdown = render(|out| generate_markdown_report(out, &run));
        assert!(markdown.contains("| three-zones:0.9:0.5 |"));
        assert!(markdown.contains("**three_zones(0.9,0.5)**"));
        let console = render(|out| generate_console_report(out, &run, Duration::from_secs(1)));
        assert!(console.contains("three-zones:0.9:0.5"));
        assert!(console.contains("flight 3"));
    }
}

//! Performance report command

use anyhow::Result;
use colored::Colorize;
use governor_lib::PerformanceReport;
use tabled::{settings::Style, Table, Tabled};

use crate::client::ApiClient;
use crate::output::{
    color_level, color_power_mode, color_thermal, format_bytes, format_duration, format_percent,
    print_json, OutputFormat,
};

/// Row for the context dwell table
#[derive(Tabled)]
struct ContextRow {
    #[tabled(rename = "Context")]
    context: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Visits")]
    visits: u32,
}

/// Show the current performance report
pub async fn show_report(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report: PerformanceReport = client.get("report").await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &PerformanceReport) {
    println!("{}", "Performance Report".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Level:                  {} (score {:.3})",
        color_level(report.performance_level),
        report.composite_score
    );
    println!("Context:                {}", report.activity_context.to_string().cyan());
    if !report.monitoring {
        println!("{}", "Monitoring is stopped".yellow());
    }
    println!();

    println!("{}", "Frames".bold());
    println!("{}", "-".repeat(50));
    println!("Frame rate:             {:.1} fps", report.frame_rate);
    println!("Average frame time:     {:.2} ms", report.average_frame_time_ms);
    println!(
        "Dropped frames:         {}",
        format_percent(report.dropped_frame_percentage)
    );
    println!();

    println!("{}", "Memory".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Used:                   {} of {} ({})",
        format_bytes(report.memory.used_bytes),
        format_bytes(report.memory.total_bytes),
        format_percent(report.memory_used_percentage)
    );
    if report.emergency_active {
        println!("{}", "Emergency cleanup active".red().bold());
    }
    println!();

    println!("{}", "Device".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Thermal:                {} (trend {:+.2})",
        color_thermal(report.thermal_state),
        report.thermal_trend
    );
    println!("Power mode:             {}", color_power_mode(report.power_mode));
    println!(
        "Battery:                {}",
        format_percent(report.battery_level as f64)
    );
    println!("Sync interval:          {}", format_duration(report.sync_interval_secs as f64));
    println!();

    println!("{}", "Active Optimizations".bold());
    println!("{}", "-".repeat(50));
    if report.active_optimizations.is_empty() {
        println!("{}", "none".dimmed());
    } else {
        for optimization in &report.active_optimizations {
            println!("  • {}", optimization);
        }
    }

    if !report.context_profile.is_empty() {
        println!();
        println!("{}", "Context Profile".bold());
        println!("{}", "-".repeat(50));

        let rows: Vec<ContextRow> = report
            .context_profile
            .iter()
            .map(|entry| ContextRow {
                context: entry.context.to_string(),
                time: format_duration(entry.total_secs),
                visits: entry.visits,
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!();
    println!(
        "Generated at: {}",
        format_timestamp(report.generated_at).dimmed()
    );
}

/// Format a unix timestamp for display
fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use governor_lib::{ComponentStatus, PerformanceLevel, PowerMode, ThermalState};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2}Gi", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a `[0, 1]` fraction as a percentage
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format seconds as `1h02m`, `3m05s` or `12s`
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h{:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Color a component status
pub fn color_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy".green().to_string(),
        ComponentStatus::Degraded => "degraded".yellow().to_string(),
        ComponentStatus::Unhealthy => "unhealthy".red().to_string(),
    }
}

/// Color a performance level
pub fn color_level(level: PerformanceLevel) -> String {
    let text = level.as_str();
    match level {
        PerformanceLevel::Optimal => text.green().bold().to_string(),
        PerformanceLevel::Good => text.green().to_string(),
        PerformanceLevel::Fair => text.yellow().to_string(),
        PerformanceLevel::Poor => text.red().bold().to_string(),
    }
}

/// Color a thermal state
pub fn color_thermal(state: ThermalState) -> String {
    let text = state.as_str();
    match state {
        ThermalState::Nominal => text.green().to_string(),
        ThermalState::Fair => text.yellow().to_string(),
        ThermalState::Serious => text.red().to_string(),
        ThermalState::Critical => text.red().bold().to_string(),
    }
}

/// Color a power mode
pub fn color_power_mode(mode: PowerMode) -> String {
    let text = mode.as_str();
    match mode {
        PowerMode::Normal => text.green().to_string(),
        PowerMode::Conservative => text.yellow().to_string(),
        PowerMode::Aggressive | PowerMode::Extreme => text.red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2048), "2.00Ki");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00Mi");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00Gi");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(0.8333), "83.3%");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.4), "12s");
        assert_eq!(format_duration(185.0), "3m05s");
        assert_eq!(format_duration(3720.0), "1h02m");
        assert_eq!(format_duration(-5.0), "0s");
    }
}

//! CLI command implementations for flightlens.
//!
//! Provides subcommand handlers for:
//! - `flightlens interpret <RESULT>`: narrative interpretation of a result
//! - `flightlens visualize <RESULT>`: chart data and summary cards
//! - `flightlens history`: outcome and latency report over the event log
//! - `flightlens health`: config, interpreter reachability, event log
//! - `flightlens config show|init|set|reset`: configuration management

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config;
use crate::events::history::{self, History};
use crate::events::{self, InterpretEvent};
use crate::interpret::{self, InterpretClient, InterpretationSession, Lifecycle};
use crate::model::AnalyticsResult;
use crate::visualize::chart::{BreakdownTable, ChartSeries};
use crate::visualize::{self, AnalyticFunction, Dashboard, SummaryCard, Visualization};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            Some("text") => Self::Text,
            _ => Self::Table,
        }
    }
}

/// Width of a full (100%) text bar.
const BAR_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Read an analytics result from `source`, a file path or `-` for stdin.
pub fn read_result(source: &str) -> Result<AnalyticsResult> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read analytics result from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };

    AnalyticsResult::from_json(&text)
        .with_context(|| format!("failed to parse analytics result from {source}"))
}

// ---------------------------------------------------------------------------
// flightlens interpret
// ---------------------------------------------------------------------------

/// Interpret a result through the configured interpreter and print the text.
pub fn run_interpret(source: &str, query: &str, format: OutputFormat) -> Result<()> {
    let result = read_result(source)?;
    let cfg = config::load();
    let client = InterpretClient::from_config(&cfg.interpreter);
    let mut session = InterpretationSession::new();

    let Some(trigger) = interpret::interpret_result(&mut session, &client, Some(&result), query)
    else {
        return Ok(());
    };

    let event = InterpretEvent::from_trigger(
        &trigger,
        session.state(),
        result.function_executed.as_deref(),
    );
    events::log_event(&cfg.logging, &event);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(session.state())?);
        return Ok(());
    }

    match session.state() {
        Lifecycle::Success(text) => {
            println!("{}", "Interpretation".bold().cyan());
            println!("{}", "=".repeat(50));
            println!("{text}");
            println!();
            println!(
                "  {}",
                format!("{} in {}ms", result.mode, trigger.latency_ms).dimmed()
            );
            Ok(())
        }
        Lifecycle::Error(message) => anyhow::bail!("interpretation failed: {message}"),
        other => anyhow::bail!("interpretation did not complete ({other})"),
    }
}

// ---------------------------------------------------------------------------
// flightlens visualize
// ---------------------------------------------------------------------------

/// Print the dashboard view of a result.
pub fn run_visualize(source: &str, format: OutputFormat) -> Result<()> {
    let result = read_result(source)?;
    let dashboard = visualize::visualize(&result);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        _ => print_dashboard(&dashboard),
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let title = dashboard
        .function_executed
        .as_deref()
        .and_then(AnalyticFunction::from_name)
        .map_or("Analysis", AnalyticFunction::title);
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));
    print_field("Query used:", dashboard.semantic_query_used.as_deref());
    if let Some(total) = &dashboard.total_results_fetched {
        println!("  {} {total} results", "Fetched:".bold());
    }
    println!();

    if !dashboard.summary.is_empty() {
        print_summary_cards(&dashboard.summary);
    }
    println!();
    if let Some(message) = &dashboard.user_message {
        println!("{}", message.italic());
        println!();
    }
    print_visualization(&dashboard.visualization);
}

fn print_summary_cards(cards: &[SummaryCard]) {
    for card in cards {
        println!("  {} {}", format!("{:<22}", card.label).bold(), card.display);
    }
}

fn print_visualization(visualization: &Visualization) {
    match visualization {
        Visualization::ConditionalGroups {
            matching_total,
            opposite_total,
            matching,
            opposite,
        } => {
            print_series(matching);
            println!("  {}", format!("total: {matching_total}").dimmed());
            println!();
            print_series(opposite);
            println!("  {}", format!("total: {opposite_total}").dimmed());
        }
        Visualization::RatingMatch {
            base_condition,
            compare_condition,
            split,
            ..
        } => {
            print_field("Base condition:", base_condition.as_deref());
            print_field("Compare condition:", compare_condition.as_deref());
            println!();
            print_series(split);
        }
        Visualization::CategoryBreakdown { table } => print_table(table),
        Visualization::Distribution {
            condition,
            total_filtered_rows,
            series,
            ..
        } => {
            print_field("Condition:", condition.as_deref());
            if let Some(rows) = total_filtered_rows {
                println!("  {} {rows}", "Filtered rows:".bold());
            }
            println!();
            print_series(series);
        }
        Visualization::PercentageSplit {
            field,
            operator,
            threshold,
            note,
            split,
            ..
        } => {
            let condition = [field, operator, threshold]
                .iter()
                .filter_map(|part| part.as_deref())
                .collect::<Vec<_>>()
                .join(" ");
            print_field("Condition:", (!condition.is_empty()).then_some(condition.as_str()));
            print_field("Note:", note.as_deref());
            println!();
            print_series(split);
        }
        Visualization::Unsupported { function } => {
            let name = function.as_deref().unwrap_or("(none)");
            println!(
                "{}",
                format!("No visualization available for function: {name}").yellow()
            );
        }
    }
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {} {value}", label.bold());
    }
}

fn print_series(series: &ChartSeries) {
    println!("{}", series.title.bold());
    if series.points.is_empty() {
        println!("  {}", "(no data)".dimmed());
        return;
    }

    let label_width = series
        .labels()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(24);
    for point in &series.points {
        let value = format!("{:.1}%", point.magnitude());
        let count = point
            .count
            .as_ref()
            .map(|c| format!(" ({c} users)"))
            .unwrap_or_default();
        println!(
            "  {:<label_width$} {} {value}{}",
            truncate(&point.label, label_width),
            bar(point.magnitude()).green(),
            count.dimmed(),
        );
    }
}

fn print_table(table: &BreakdownTable) {
    let row_field = table.row_field.as_deref().unwrap_or("category");
    let column_field = table.column_field.as_deref().unwrap_or("value");
    println!("{}", format!("{row_field} by {column_field}").bold());

    if table.rows.is_empty() {
        println!("  {}", "(no data)".dimmed());
        return;
    }

    let mut header = format!("  {:<18} {:>8}", row_field, "Total");
    for column in &table.columns {
        header.push_str(&format!(" {:>10}", truncate(column, 10)));
    }
    println!("{header}");
    println!("  {}", "-".repeat(header.len().saturating_sub(2)));

    for (i, row) in table.rows.iter().enumerate() {
        let total = row.total.as_ref().map(|t| t.to_string()).unwrap_or_default();
        let mut line = format!("  {:<18} {:>8}", truncate(&row.row_key, 18), total);
        for column in &table.columns {
            line.push_str(&format!(" {:>10}", table.cell(&row.row_key, column)));
        }
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// flightlens history
// ---------------------------------------------------------------------------

/// Show outcome and latency statistics for past interpretation calls.
pub fn run_history(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let history = history::compute_history(&cfg.logging, days);

    if history.total == 0 {
        println!(
            "{}",
            "No data yet. Run `flightlens interpret` to record calls.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history)?),
        OutputFormat::Csv => print_history_csv(&history),
        OutputFormat::Table | OutputFormat::Text => print_history_table(&history),
    }
    Ok(())
}

fn print_history_table(history: &History) {
    println!("{}", "Interpretation History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("  {} {}", "Total calls: ".bold(), history.total);
    println!(
        "  {} {} ok / {} failed / {} stale",
        "Outcomes:    ".bold(),
        history.successes.to_string().green(),
        history.errors.to_string().red(),
        history.stale,
    );
    println!("  {} {:.1}%", "Success rate:".bold(), history.success_rate());
    if let Some(latency) = history.avg_success_latency_ms {
        println!("  {} {}ms", "Avg latency: ".bold(), latency);
    }
    if let Some(error) = &history.last_error {
        println!("  {} {}", "Last error:  ".bold(), error.red());
    }
    println!();

    println!("{}", "Calls by Function".bold().cyan());
    println!("  {:<42} {:>6} {:>7}", "Function", "Calls", "Errors");
    println!("  {}", "-".repeat(57));
    for (i, stat) in history.functions.iter().enumerate() {
        let line = format!(
            "  {:<42} {:>6} {:>7}",
            truncate(&stat.function, 42),
            stat.calls,
            stat.errors
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_history_csv(history: &History) {
    println!("function,calls,errors");
    for stat in &history.functions {
        println!("{},{},{}", stat.function, stat.calls, stat.errors);
    }
}

// ---------------------------------------------------------------------------
// flightlens health
// ---------------------------------------------------------------------------

/// Check system health: config files, interpreter, event log.
pub fn run_health() -> Result<()> {
    println!("{}", "flightlens Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    // 1. Config
    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.flightlens/config.toml"
        } else {
            "not found, using defaults"
        },
    );

    let cfg = config::load();

    // 2. Interpreter
    let client = InterpretClient::from_config(&cfg.interpreter);
    let reachable = client.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", client.url())
    } else {
        format!("not reachable at {}", client.url())
    };
    print_health_item("Interpreter", reachable, &detail);

    // 3. Event log
    if cfg.logging.enabled {
        let log_exists = events::event_log_path(&cfg.logging).is_some_and(|p| p.exists());
        let detail = if log_exists {
            format!("{} entries", events::read_all_events(&cfg.logging).len())
        } else {
            "no log file yet".to_string()
        };
        print_health_item("Event log", log_exists, &detail);
    } else {
        print_health_item("Event log", true, "disabled");
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// flightlens config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective flightlens Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let sources = [
        (config::global_config_file(), "~/.flightlens/config.toml"),
        (config::project_config_file(), ".flightlens.toml"),
    ];
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (path, label) in sources {
        if path.is_some_and(|p| p.exists()) {
            println!("  {} {}", "✓".green(), label.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "FLIGHTLENS_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.flightlens/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Text bar for a percentage, clamped to 0..=100.
fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

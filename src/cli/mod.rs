//! CLI command implementations for dupdash.
//!
//! Provides subcommand handlers for:
//! - `dupdash scan`: run a scan and list duplicate groups
//! - `dupdash stats`: similarity statistics and category breakdown
//! - `dupdash health`: config files, scan service, history log
//! - `dupdash history --days N`: scan history and daily trend
//! - `dupdash config show|init|set|reset`: configuration management

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, anyhow};
use colored::Colorize;

use crate::aggregate::{self, CategoryCount, CategoryStats, Statistics};
use crate::client::{DuplicatesSource, FileSource, ScanClient};
use crate::config::{self, schema::DupdashConfig};
use crate::history::{self, HistoryReport, logger as history_logger, reporter};
use crate::model::{ApiDescriptor, ApiPair, DuplicateGroup, Priority};
use crate::store::{Action, DashboardStore, DashboardView, ScanError};

/// Output format for report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Arguments of `dupdash scan`.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Read a saved scan result instead of calling the service.
    pub input: Option<PathBuf>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub format: OutputFormat,
    /// Maximum number of groups to print.
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Pick the data source: a JSON file when given, the scan service otherwise.
pub fn source_for(cfg: &DupdashConfig, input: Option<PathBuf>) -> Box<dyn DuplicatesSource> {
    match input {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(ScanClient::from_config(&cfg.api)),
    }
}

/// Run one scan into `store`, recording it in the scan history.
///
/// Fetch failures come back as an error carrying the user-facing message.
pub fn load_into(
    store: &mut DashboardStore,
    cfg: &DupdashConfig,
    source: &dyn DuplicatesSource,
) -> Result<()> {
    let started = Instant::now();
    let result = store.scan(source);
    let elapsed = started.elapsed();

    match result {
        Ok(data) => {
            history::record_scan(
                &cfg.history,
                &source.describe(),
                Ok(aggregate::summarize(&data)),
                elapsed,
            );
            Ok(())
        }
        Err(ScanError::Fetch(err)) => {
            history::record_scan(&cfg.history, &source.describe(), Err(&err), elapsed);
            Err(anyhow!(err))
        }
        Err(err) => Err(anyhow!(err)),
    }
}

// ---------------------------------------------------------------------------
// dupdash scan
// ---------------------------------------------------------------------------

/// Run a scan and print the visible groups for the chosen tab and search.
pub fn run_scan(options: ScanOptions) -> Result<()> {
    let cfg = config::load();
    let source = source_for(&cfg, options.input);

    let mut store = DashboardStore::new();
    if let Some(category) = options.category {
        store.dispatch(Action::SelectCategory(category));
    }
    if let Some(search) = options.search {
        store.dispatch(Action::SetSearch(search));
    }

    load_into(&mut store, &cfg, source.as_ref())?;
    let view = store.view();

    let renderable = renderable_groups(&view.visible_groups);
    let limit = page_limit(options.limit, cfg.dashboard.page_size);
    let groups = &renderable[..renderable.len().min(limit)];
    let hidden = renderable.len() - groups.len();

    match options.format {
        OutputFormat::Json => print_scan_json(&store, &view, groups)?,
        OutputFormat::Csv => print_scan_csv(groups),
        OutputFormat::Table => {
            print_scan_table(&store, &view, groups, hidden, cfg.dashboard.pairs_preview)
        }
    }

    Ok(())
}

fn print_scan_table(
    store: &DashboardStore,
    view: &DashboardView<'_>,
    groups: &[&DuplicateGroup],
    hidden: usize,
    pairs_preview: usize,
) {
    println!("{}", "Duplicate APIs Detection".bold().cyan());
    println!("{}", "=".repeat(60));
    if let Some(at) = view.last_scan_time {
        println!("  {} {}", "Last scan:".dimmed(), at.format("%Y-%m-%d %H:%M:%S"));
    }
    println!();

    if !view.has_data {
        println!("{}", "No duplicates data available.".yellow());
        return;
    }

    if let Some(stats) = &view.statistics {
        print_statistics(stats);
    }
    print_tabs(&view.category_stats, store.active_category());
    println!();

    if groups.is_empty() {
        let message = if store.search_term().trim().is_empty() {
            format!("No duplicates found in {}.", store.active_category())
        } else {
            format!("No groups match \"{}\".", store.search_term())
        };
        println!("{}", message.yellow());
        return;
    }

    for (i, group) in groups.iter().enumerate() {
        print_group(i, group, pairs_preview);
    }

    if hidden > 0 {
        println!("  {}", format!("… {hidden} more groups (use --limit)").dimmed());
    }
}

fn print_statistics(stats: &Statistics) {
    println!("{}", "Statistics".bold().cyan());
    println!(
        "  {} {}",
        "Total duplicates:".bold(),
        format_number(stats.total_duplicates)
    );
    for (priority, count) in [
        (Priority::High, stats.high_similarity),
        (Priority::Medium, stats.medium_similarity),
        (Priority::Low, stats.low_similarity),
    ] {
        println!(
            "  {} {:>8}  {}",
            colorize_priority(priority, &format!("{:<17}", priority.label())),
            format_number(count),
            priority.range().dimmed()
        );
    }
    println!();
}

fn print_tabs(category_stats: &CategoryStats, active: &str) {
    let tabs: Vec<String> = category_stats
        .iter()
        .map(|entry| {
            let tab = format!("{} ({})", entry.category, entry.count);
            if entry.category == active {
                tab.bold().underline().to_string()
            } else {
                tab.dimmed().to_string()
            }
        })
        .collect();
    println!("  {}", tabs.join("  "));
}

fn print_group(index: usize, group: &DuplicateGroup, pairs_preview: usize) {
    let priority = group.priority();
    let header = format!(
        "{:>3}% {:<6}",
        group.similarity_score_percentage,
        priority.level()
    );
    // First group and high-similarity groups are shown expanded.
    let expanded = index == 0 || priority == Priority::High;
    println!(
        "{} {} APIs · {} pairs",
        colorize_priority(priority, &header).bold(),
        group.api_count(),
        group.pair_count()
    );

    if !expanded {
        return;
    }

    let shown = renderable_pairs(group);
    for pair in shown.iter().take(pairs_preview) {
        print_pair(pair);
    }
    let more = hidden_pairs(shown.len(), pairs_preview);
    if more > 0 {
        println!("      {}", format!("… {more} more pairs").dimmed());
    }
}

/// Groups with at least one pair, in view order.
fn renderable_groups<'a>(groups: &[&'a DuplicateGroup]) -> Vec<&'a DuplicateGroup> {
    groups.iter().copied().filter(|g| g.is_renderable()).collect()
}

fn renderable_pairs(group: &DuplicateGroup) -> Vec<&ApiPair> {
    group.pairs.iter().filter(|p| p.is_renderable()).collect()
}

/// Groups printed per page: `--limit` wins, then `dashboard.page_size`.
/// Zero means no limit.
fn page_limit(limit: Option<usize>, page_size: usize) -> usize {
    match limit.unwrap_or(page_size) {
        0 => usize::MAX,
        n => n,
    }
}

/// Renderable pairs left out of an expanded group's preview.
fn hidden_pairs(renderable: usize, pairs_preview: usize) -> usize {
    renderable.saturating_sub(pairs_preview)
}

fn print_pair(pair: &ApiPair) {
    let (Some(source), Some(destination)) = (&pair.source, &pair.destination) else {
        return;
    };
    println!(
        "      {} {} {}  {}",
        describe_api(source),
        "→".dimmed(),
        describe_api(destination),
        format!("{}%", pair.effective_score()).bold()
    );
}

fn describe_api(api: &ApiDescriptor) -> String {
    format!(
        "{} {}",
        truncate(api.display_name(), 32),
        format!("v{}", api.display_version()).dimmed()
    )
}

fn print_scan_json(
    store: &DashboardStore,
    view: &DashboardView<'_>,
    groups: &[&DuplicateGroup],
) -> Result<()> {
    let value = serde_json::json!({
        "last_scan_time": view.last_scan_time.map(|t| t.to_rfc3339()),
        "active_category": store.active_category(),
        "search_term": store.search_term(),
        "statistics": view.statistics,
        "category_stats": view.category_stats,
        "groups": groups,
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_scan_csv(groups: &[&DuplicateGroup]) {
    println!(
        "group_score,priority,source_name,source_version,destination_name,destination_version,pair_score"
    );
    for group in groups {
        for pair in &group.pairs {
            let (Some(source), Some(destination)) = (&pair.source, &pair.destination) else {
                continue;
            };
            println!(
                "{},{},{},{},{},{},{}",
                group.similarity_score_percentage,
                group.priority().level(),
                csv_field(source.display_name()),
                csv_field(source.display_version()),
                csv_field(destination.display_name()),
                csv_field(destination.display_version()),
                pair.effective_score(),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// dupdash stats
// ---------------------------------------------------------------------------

/// Show similarity statistics and the per-category breakdown.
pub fn run_stats(input: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let source = source_for(&cfg, input);

    let mut store = DashboardStore::new();
    load_into(&mut store, &cfg, source.as_ref())?;
    let view = store.view();

    let Some(stats) = view.statistics.filter(|_| view.has_data) else {
        println!("{}", "No duplicates data available.".yellow());
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_stats_json(&stats, &view.category_breakdown)?,
        OutputFormat::Csv => print_stats_csv(&view.category_breakdown),
        OutputFormat::Table => print_stats_table(&stats, &view.category_breakdown),
    }

    Ok(())
}

fn print_stats_table(stats: &Statistics, breakdown: &[CategoryCount]) {
    println!("{}", "Duplicate APIs Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    print_statistics(stats);
    if stats.uncounted() > 0 {
        println!(
            "  {} {:>8}  {}",
            format!("{:<17}", Priority::NonPriority.label()).dimmed(),
            format_number(stats.uncounted()),
            Priority::NonPriority.range().dimmed()
        );
        println!();
    }

    if breakdown.is_empty() {
        return;
    }

    let total: usize = breakdown.iter().map(|entry| entry.count).sum();
    println!("{}", "Duplicates by Category".bold().cyan());
    println!("  {:<28} {:>8} {:>8}", "Category", "Pairs", "Share");
    println!("  {}", "-".repeat(46));

    for (i, entry) in breakdown.iter().enumerate() {
        let share = if total == 0 {
            0.0
        } else {
            (entry.count as f64 / total as f64) * 100.0
        };
        let line = format!(
            "  {:<28} {:>8} {:>7.1}%",
            truncate(&entry.category, 28),
            format_number(entry.count),
            share
        );

        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_stats_json(stats: &Statistics, breakdown: &[CategoryCount]) -> Result<()> {
    let value = serde_json::json!({
        "statistics": stats,
        "category_breakdown": breakdown,
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_stats_csv(breakdown: &[CategoryCount]) {
    println!("category,pairs");
    for entry in breakdown {
        println!("{},{}", csv_field(&entry.category), entry.count);
    }
}

// ---------------------------------------------------------------------------
// dupdash history
// ---------------------------------------------------------------------------

/// Show scan history: totals, latency and per-day trend.
pub fn run_history(days: Option<u32>, format: OutputFormat) -> Result<()> {
    let report = reporter::compute_report(days);

    if report.total_scans == 0 {
        println!(
            "{}",
            "No scans recorded yet. Run `dupdash scan` to record one.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print_history_csv(&report),
        OutputFormat::Table => print_history_table(&report, days),
    }

    Ok(())
}

fn print_history_table(report: &HistoryReport, days: Option<u32>) {
    let title = match days {
        Some(days) => format!("Scan History (last {days} days)"),
        None => "Scan History".to_string(),
    };
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Total scans: ".bold(), report.total_scans);
    println!(
        "  {} {} ({:.0}%)",
        "Successful:  ".bold(),
        report.successful,
        report.success_rate()
    );
    println!("  {} {}", "Failed:      ".bold(), report.failed);
    println!("  {} {:.0}ms", "Avg latency: ".bold(), report.avg_latency_ms);

    if let Some(last) = &report.last_scan {
        let outcome = if last.success {
            format!("{} groups, {} pairs", last.groups, last.total_pairs).green()
        } else {
            last.error.as_deref().unwrap_or("failed").red()
        };
        println!("  {} {} {}", "Last scan:   ".bold(), last.timestamp, outcome);
    }

    if !report.failure_kinds.is_empty() {
        let kinds: Vec<String> = report
            .failure_kinds
            .iter()
            .map(|(kind, count)| format!("{kind} ×{count}"))
            .collect();
        println!("  {} {}", "Failures:    ".bold(), kinds.join(", "));
    }

    println!();
    println!(
        "  {:<12} {:>6} {:>9} {:>8} {:>8}",
        "Date", "Scans", "Failures", "Groups", "Pairs"
    );
    println!("  {}", "-".repeat(48));
    for entry in &report.trends {
        println!(
            "  {:<12} {:>6} {:>9} {:>8} {:>8}",
            entry.date,
            entry.scans,
            entry.failures,
            format_number(entry.groups),
            format_number(entry.total_pairs),
        );
    }
}

fn print_history_csv(report: &HistoryReport) {
    println!("date,scans,failures,groups,total_pairs");
    for t in &report.trends {
        println!(
            "{},{},{},{},{}",
            t.date, t.scans, t.failures, t.groups, t.total_pairs
        );
    }
}

// ---------------------------------------------------------------------------
// dupdash health
// ---------------------------------------------------------------------------

/// Check config files, the scan service, and the history log.
pub fn run_health() -> Result<()> {
    println!("{}", "dupdash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.dupdash/config.toml found"
        } else {
            "not found (run `dupdash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".dupdash.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = ScanClient::from_config(&cfg.api);
    let healthy = client.health_check();
    let detail = if healthy {
        format!("reachable at {}", client.health_url())
    } else {
        format!("not reachable at {}", client.health_url())
    };
    print_health_item("Scan service", healthy, &detail);
    print_health_item("Scan endpoint", true, &client.scan_url());

    let log_exists = history_logger::scan_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);
    let detail = if !cfg.history.enabled {
        "disabled".to_string()
    } else if log_exists {
        format!("{} entries", history_logger::read_all_entries().len())
    } else {
        "no log file yet".to_string()
    };
    print_health_item("Scan history", cfg.history.enabled && log_exists, &detail);

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
// dupdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective dupdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.dupdash/config.toml", global_exists);
    print_source(".dupdash.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "DUPDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.dupdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point dupdash at your scan service.".dimmed());
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

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn colorize_priority(priority: Priority, text: &str) -> colored::ColoredString {
    match priority {
        Priority::High => text.red(),
        Priority::Medium => text.truecolor(249, 115, 22),
        Priority::Low => text.yellow(),
        Priority::NonPriority => text.normal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

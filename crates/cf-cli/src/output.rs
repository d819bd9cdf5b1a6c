//! Display helpers shared by several commands.
//!
//! Formatting of sizes and timestamps, the app summary printed by `v3-app`
//! and `v3-push`, and the per-process view printed by `v3-scale`.

use std::io;

use chrono::{DateTime, Duration, Utc};

use cf_actor::resources::{ApplicationSummary, LifecycleType, ProcessInstance, ProcessSummary};

use crate::ui::{DEFAULT_TABLE_PADDING, Ui};

const KILOBYTE: u64 = 1024;
const MEGABYTE: u64 = 1024 * KILOBYTE;
const GIGABYTE: u64 = 1024 * MEGABYTE;
const TERABYTE: u64 = 1024 * GIGABYTE;

/// Render a byte count the way CF does: `976.6K`, `32M`, `1.5G`.
pub fn byte_size(bytes: u64) -> String {
    let (value, unit) = match bytes {
        b if b >= TERABYTE => (b as f64 / TERABYTE as f64, "T"),
        b if b >= GIGABYTE => (b as f64 / GIGABYTE as f64, "G"),
        b if b >= MEGABYTE => (b as f64 / MEGABYTE as f64, "M"),
        b if b >= KILOBYTE => (b as f64 / KILOBYTE as f64, "K"),
        b if b > 0 => (b as f64, "B"),
        _ => return "0".to_string(),
    };
    let formatted = format!("{value:.1}");
    let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
    format!("{trimmed}{unit}")
}

/// Megabytes as a size, e.g. `1024` as `1G`.
pub fn megabytes(mb: u64) -> String {
    byte_size(mb * MEGABYTE)
}

/// `Mon 02 Jan 15:04:05 UTC 2006`.
pub fn user_friendly_date(at: &DateTime<Utc>) -> String {
    at.format("%a %d %b %H:%M:%S %Z %Y").to_string()
}

/// Optional timestamp, empty when absent.
pub fn user_friendly_date_or_blank(at: Option<&DateTime<Utc>>) -> String {
    at.map(user_friendly_date).unwrap_or_default()
}

/// When an instance started, given its uptime.
fn instance_since(instance: &ProcessInstance, now: DateTime<Utc>) -> String {
    let uptime = Duration::seconds(i64::try_from(instance.uptime).unwrap_or(i64::MAX));
    now.checked_sub_signed(uptime)
        .unwrap_or(now)
        .format("%Y-%m-%d %I:%M:%S %p")
        .to_string()
}

/// `web:2/2, console:0/0`, web first.
pub fn process_ratios(processes: &[&ProcessSummary]) -> String {
    processes
        .iter()
        .map(|summary| format!("{}:{}", summary.process.process_type, summary.instance_ratio()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn string_rows(rows: Vec<[String; 2]>) -> Vec<Vec<String>> {
    rows.into_iter().map(Vec::from).collect()
}

/// Print the health and status of an app.
pub fn display_app_summary(ui: &mut Ui, summary: &ApplicationSummary) -> io::Result<()> {
    display_app_summary_at(ui, summary, Utc::now())
}

fn display_app_summary_at(ui: &mut Ui, summary: &ApplicationSummary, now: DateTime<Utc>) -> io::Result<()> {
    let app = &summary.application;
    let processes = summary.processes_web_first();

    let memory_usage = processes
        .iter()
        .filter(|summary| summary.process.instances > 0)
        .map(|summary| format!("{} x {}", megabytes(summary.process.memory_in_mb), summary.process.instances))
        .collect::<Vec<_>>()
        .join(", ");
    let routes = summary
        .routes
        .iter()
        .map(|route| route.url.clone())
        .collect::<Vec<_>>()
        .join(", ");
    let droplet = summary.current_droplet.as_ref();

    let mut rows = vec![
        ["name:".to_string(), app.name.clone()],
        ["requested state:".to_string(), app.state.as_str().to_string()],
        ["processes:".to_string(), process_ratios(&processes)],
        ["memory usage:".to_string(), memory_usage],
        ["routes:".to_string(), routes],
        [
            "stack:".to_string(),
            droplet.and_then(|d| d.stack.clone()).unwrap_or_default(),
        ],
    ];
    if app.lifecycle.kind == LifecycleType::Docker {
        rows.push([
            "docker image:".to_string(),
            droplet.and_then(|d| d.image.clone()).unwrap_or_default(),
        ]);
    } else {
        let buildpacks = droplet
            .map(|d| {
                d.buildpacks
                    .iter()
                    .map(|bp| match bp.detect_output.as_deref() {
                        Some(detected) if !detected.is_empty() => detected.to_string(),
                        _ => bp.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        rows.push(["buildpacks:".to_string(), buildpacks]);
    }
    ui.display_key_value_table("", &string_rows(rows))?;
    display_processes(ui, &processes, now)
}

/// Print every process of an app, web first, each after a blank line.
pub fn display_app_processes(ui: &mut Ui, summary: &ApplicationSummary) -> io::Result<()> {
    display_processes(ui, &summary.processes_web_first(), Utc::now())
}

fn display_processes(ui: &mut Ui, processes: &[&ProcessSummary], now: DateTime<Utc>) -> io::Result<()> {
    for process in processes {
        ui.display_newline()?;
        display_process(ui, process, now)?;
    }
    Ok(())
}

fn display_process(ui: &mut Ui, summary: &ProcessSummary, now: DateTime<Utc>) -> io::Result<()> {
    ui.display_key_value_table(
        "",
        &string_rows(vec![
            ["type:".to_string(), summary.process.process_type.clone()],
            ["instances:".to_string(), summary.instance_ratio()],
            ["memory usage:".to_string(), megabytes(summary.process.memory_in_mb)],
        ]),
    )?;

    if summary.running_instances() == 0 {
        return ui.display_text("There are no running instances of this process.");
    }

    let mut table = vec![vec![
        String::new(),
        "state".to_string(),
        "since".to_string(),
        "cpu".to_string(),
        "memory".to_string(),
        "disk".to_string(),
    ]];
    for instance in &summary.instances {
        table.push(vec![
            format!("#{}", instance.index),
            instance.state.as_str().to_string(),
            instance_since(instance, now),
            format!("{:.1}%", instance.usage.cpu * 100.0),
            format!("{} of {}", byte_size(instance.usage.mem), byte_size(instance.mem_quota)),
            format!("{} of {}", byte_size(instance.usage.disk), byte_size(instance.disk_quota)),
        ]);
    }
    ui.display_table("", &table, DEFAULT_TABLE_PADDING)
}

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::model::snapshot::MetricsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

const RULE_WIDTH: usize = 30;
const LABEL_WIDTH: usize = 24;

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{:.6}", x),
        None => "N/A".to_string(),
    }
}

fn push_line(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{:<width$}{}", label, value, width = LABEL_WIDTH);
}

pub fn render_text(s: &MetricsSnapshot) -> String {
    let when = Utc
        .timestamp_millis_opt(s.timestamp_ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "tick {} {}", s.tick, when);
    push_line(&mut out, "best bid:", format!("{} (qty {})", s.bid, s.bid_qty));
    push_line(&mut out, "best ask:", format!("{} (qty {})", s.ask, s.ask_qty));
    push_line(&mut out, "max spread:", s.max_spread);
    push_line(&mut out, "avg mid (1 min):", format!("{:.6}", s.avg_mid_1m));
    push_line(&mut out, "avg mid (5 min):", format!("{:.6}", s.avg_mid_5m));
    push_line(&mut out, "avg mid (15 min):", format!("{:.6}", s.avg_mid_15m));
    push_line(&mut out, "forecast mid (60s):", fmt_opt(s.latest_forecast));
    for (minutes, err) in s.errors() {
        push_line(&mut out, &format!("forecast mae ({} min):", minutes), fmt_opt(err));
    }
    out.push_str(&"=".repeat(RULE_WIDTH));
    out
}

pub fn render_json(s: &MetricsSnapshot) -> Result<String> {
    serde_json::to_string(s).context("failed to encode snapshot")
}

pub fn render(s: &MetricsSnapshot, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(s)),
        ReportFormat::Json => render_json(s),
    }
}

/// Print every snapshot to stdout until the engine side of the channel closes.
pub async fn run_reporter(
    mut rx: mpsc::Receiver<MetricsSnapshot>,
    format: ReportFormat,
) -> Result<()> {
    while let Some(snapshot) = rx.recv().await {
        println!("{}", render(&snapshot, format)?);
    }
    tracing::debug!("reporter finished");
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use palantir_core::{ComponentKind, Snapshot};
use palantir_engine::{InvariantMonitor, RunReport};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

/// Print one snapshot as it happens
pub fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", snapshot_line(snapshot)),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(snapshot) {
                println!("{}", json);
            }
        }
    }
}

pub fn snapshot_line(snapshot: &Snapshot) -> String {
    let mut line = format!(
        "[{:>6}ms] {} {}: {} -> {}",
        snapshot.elapsed.as_millis(),
        snapshot.kind,
        snapshot.id,
        snapshot.previous,
        snapshot.current
    );
    match snapshot.kind {
        ComponentKind::Being => {
            if let Some(palantir) = snapshot.palantir {
                line.push_str(&format!(" ({})", palantir));
            }
        }
        ComponentKind::Palantir => {
            if let Some(being) = snapshot.being {
                line.push_str(&format!(" ({})", being));
            }
        }
        ComponentKind::Simulator => {}
    }
    if let Some(error) = &snapshot.error {
        line.push_str(&format!(" error: {}", error));
    }
    line
}

/// Run report plus what the invariant monitor saw
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    #[serde(flatten)]
    pub report: &'a RunReport,
    pub peak_holders: usize,
    pub peak_gazing: usize,
    pub violations: Vec<String>,
}

impl<'a> Summary<'a> {
    pub fn new(report: &'a RunReport, monitor: &InvariantMonitor) -> Self {
        Self {
            report,
            peak_holders: monitor.peak_holders(),
            peak_gazing: monitor.peak_gazing(),
            violations: monitor.violations(),
        }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "Run: {}", report.run_id)?;
        writeln!(f, "  Palantiri strategy: {}", report.palantiri_strategy)?;
        writeln!(f, "  Being strategy: {}", report.being_strategy)?;
        writeln!(
            f,
            "  Elapsed: {}",
            humantime::format_duration(Duration::from_millis(report.elapsed_ms))
        )?;
        writeln!(f, "  Iterations completed: {}", report.total_completed())?;
        writeln!(
            f,
            "  Peak holders: {}  Peak gazing: {}",
            self.peak_holders, self.peak_gazing
        )?;
        if let Some(outcome) = report.shutdown {
            writeln!(f, "  Shutdown: {}", outcome)?;
        }
        if let Some(fault) = &report.fault {
            writeln!(f, "  Fault: {}", fault)?;
        }

        writeln!(f)?;
        writeln!(f, "{:<12} {:<10} {:>5}  ERROR", "BEING", "STATE", "DONE")?;
        for being in &report.beings {
            writeln!(
                f,
                "{:<12} {:<10} {:>5}  {}",
                being.id.to_string(),
                being.state.to_string(),
                being.completed,
                being.error.as_deref().unwrap_or("-")
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{:<12} {:<10} {:>5}  OWNER", "PALANTIR", "STATE", "USES")?;
        for palantir in &report.palantiri {
            writeln!(
                f,
                "{:<12} {:<10} {:>5}  {}",
                palantir.id.to_string(),
                palantir.state.to_string(),
                palantir.uses,
                palantir
                    .owner
                    .map_or_else(|| "-".to_string(), |b| b.to_string())
            )?;
        }

        for anomaly in &report.anomalies {
            writeln!(f, "anomaly: {}", anomaly)?;
        }
        for violation in &self.violations {
            writeln!(f, "violation: {}", violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

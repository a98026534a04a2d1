// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing errors with context and suggestions

use palantir_engine::{ConfigError, Fault, RunReport};
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// A config file or flag combination that cannot be run
    pub fn invalid_config(path: Option<&Path>, err: ConfigError) -> Self {
        let mut error = CliError::new(err.to_string());
        if let Some(path) = path {
            error = error.with_context(format!("while loading {}", path.display()));
        }
        let error = match &err {
            ConfigError::Io { .. } => error.with_suggestion("Check that the --config path exists"),
            ConfigError::Toml(_) => error
                .with_context("Durations are written like \"250ms\" or \"2s\"")
                .with_suggestion("Fix the TOML syntax or remove the unknown key"),
            ConfigError::Invalid(_) => {
                error.with_suggestion("Adjust the value with a flag, e.g. --palantiri 3")
            }
        };
        error.with_source(err)
    }

    /// A run stopped by a fault
    pub fn simulation_fault(fault: &Fault, report: &RunReport) -> Self {
        let mut error = CliError::new(format!("Simulation failed: {}", fault))
            .with_context(format!(
                "{} of {} beings finished, {} iterations completed",
                report
                    .beings
                    .iter()
                    .filter(|b| b.error.is_none())
                    .count(),
                report.beings.len(),
                report.total_completed()
            ));
        for anomaly in &report.anomalies {
            error = error.with_context(anomaly.clone());
        }
        error
            .with_suggestion("Rerun with RUST_LOG=debug to see every acquire and release")
            .with_suggestion("Try another palantiri strategy: palantir strategies")
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

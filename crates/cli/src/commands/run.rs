// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `palantir run` - Run a simulation until it finishes or Ctrl-C

use crate::error::CliError;
use crate::output::{self, OutputFormat, Summary};
use anyhow::Result;
use palantir_core::{PalantiriStrategy, Snapshot};
use palantir_engine::{
    BeingStrategy, InvariantMonitor, SimulationConfig, Simulator, SimulatorError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(clap::Args)]
pub struct RunArgs {
    /// TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of palantiri in the pool
    #[arg(long)]
    pub palantiri: Option<usize>,

    /// Number of beings
    #[arg(long)]
    pub beings: Option<usize>,

    /// Acquire/gaze/release cycles per being
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Palantiri strategy (see `palantir strategies`)
    #[arg(long = "strategy")]
    pub palantiri_strategy: Option<PalantiriStrategy>,

    /// Being strategy (threads or start-gate)
    #[arg(long)]
    pub being_strategy: Option<BeingStrategy>,

    /// Shortest gaze (e.g. 50ms)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub gaze_min: Option<Duration>,

    /// Longest gaze (e.g. 1s)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub gaze_max: Option<Duration>,

    /// How long each shutdown phase waits for beings
    #[arg(long, value_parser = humantime::parse_duration)]
    pub shutdown_window: Option<Duration>,

    /// Print every state change as it happens
    #[arg(long)]
    pub watch: bool,

    /// Stream state changes as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Format of the final report
    #[arg(long, value_enum, default_value_t)]
    pub report: OutputFormat,
}

impl RunArgs {
    /// The config file (or defaults) with every given flag applied
    pub fn config(&self) -> Result<SimulationConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)
                .map_err(|e| CliError::invalid_config(Some(path.as_path()), e))?,
            None => SimulationConfig::default(),
        };

        if let Some(palantiri) = self.palantiri {
            config.palantiri = palantiri;
        }
        if let Some(beings) = self.beings {
            config.beings = beings;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(strategy) = self.palantiri_strategy {
            config.palantiri_strategy = strategy;
        }
        if let Some(strategy) = self.being_strategy {
            config.being_strategy = strategy;
        }
        if let Some(gaze_min) = self.gaze_min {
            config.gaze_min = gaze_min;
        }
        if let Some(gaze_max) = self.gaze_max {
            config.gaze_max = gaze_max;
        }
        if let Some(window) = self.shutdown_window {
            config.shutdown_window = window;
        }

        config
            .validate()
            .map_err(|e| CliError::invalid_config(self.config.as_deref(), e))?;
        Ok(config)
    }

    /// Format of the snapshot stream, if one was asked for
    fn stream(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else if self.watch {
            Some(OutputFormat::Text)
        } else {
            None
        }
    }
}

pub async fn handle(args: RunArgs) -> Result<()> {
    let config = args.config()?;
    tracing::debug!(?config, "resolved config");

    let monitor = Arc::new(InvariantMonitor::new());
    let mut simulator = Simulator::default().with_observer(monitor.clone());

    // Snapshots are printed off the being threads
    let mut printer = None;
    if let Some(format) = args.stream() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Snapshot>();
        simulator = simulator.with_observer(Arc::new(move |snapshot: &Snapshot| {
            // Fails only once the printer is gone
            let _ = tx.send(snapshot.clone());
        }));
        printer = Some(tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                output::print_snapshot(&snapshot, format);
            }
        }));
    }
    let simulator = Arc::new(simulator);

    let mut run = tokio::task::spawn_blocking({
        let simulator = Arc::clone(&simulator);
        let config = config.clone();
        move || simulator.run(&config)
    });

    let result = tokio::select! {
        result = &mut run => result?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted, shutting down beings...");
            let outcome = tokio::task::spawn_blocking({
                let simulator = Arc::clone(&simulator);
                move || simulator.shutdown()
            })
            .await?;
            tracing::info!(%outcome, "shutdown finished");
            run.await?
        }
    };

    // Last sender goes with the simulator, which ends the printer
    drop(simulator);
    if let Some(printer) = printer {
        printer.await?;
    }

    match result {
        Ok(report) => {
            output::print(&Summary::new(&report, &monitor), args.report);
            Ok(())
        }
        Err(SimulatorError::Fault { fault, report }) => {
            output::print(&Summary::new(&report, &monitor), args.report);
            Err(CliError::simulation_fault(&fault, &report).into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `palantir strategies` - List the strategy registries

use crate::output::{print_list, OutputFormat};
use anyhow::Result;
use palantir_core::PalantiriStrategy;
use palantir_engine::BeingStrategy;
use serde::Serialize;
use std::fmt;

#[derive(clap::Args)]
pub struct StrategiesArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct StrategyRow {
    kind: &'static str,
    name: &'static str,
    description: &'static str,
    default: bool,
}

impl fmt::Display for StrategyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:<20} {}", self.kind, self.name, self.description)?;
        if self.default {
            write!(f, " (default)")?;
        }
        Ok(())
    }
}

fn rows() -> Vec<StrategyRow> {
    let palantiri = PalantiriStrategy::ALL.into_iter().map(|s| StrategyRow {
        kind: "palantiri",
        name: s.name(),
        description: s.description(),
        default: s == PalantiriStrategy::default(),
    });
    let beings = BeingStrategy::ALL.into_iter().map(|s| StrategyRow {
        kind: "being",
        name: s.name(),
        description: s.description(),
        default: s == BeingStrategy::default(),
    });
    palantiri.chain(beings).collect()
}

pub fn handle(args: StrategiesArgs) -> Result<()> {
    print_list(&rows(), args.format);
    Ok(())
}

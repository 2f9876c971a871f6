// Copyright 2024 Ntuplizer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line front end for the ntuplizer
//!
//! Checks branch configurations and fills ntuples from events stored as JSON.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use ntuplizer::model::{CompositeCandidate, Electron, EventContext, Muon, ObjectKind};
use ntuplizer::registry::ObjectFunctions;
use ntuplizer::{NtupleConfig, Ntuplizer, parse};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ntuplize")]
#[command(about = "Resolve ntuple branch configurations and fill ntuples from JSON events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every branch of a configuration and report errors
    Check {
        /// JSON ntuple configuration
        config: PathBuf,
    },
    /// Fill one row per object per event and print rows as JSON lines
    Run {
        /// JSON ntuple configuration
        config: PathBuf,
        /// JSON array of events, each with its object collection
        events: PathBuf,
    },
    /// Parse an expression and print its syntax tree
    Parse {
        /// Expression to parse
        expression: String,
    },
}

/// One event and the objects to ntuplize from it
#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct EventRecord<T> {
    event: EventContext,
    #[serde(default = "Vec::new")]
    objects: Vec<T>,
}

fn main() -> Result<()> {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            dispatch(&config, |kind| check(kind, &config))
        }
        Commands::Run { config, events } => {
            let config = load_config(&config)?;
            let input = fs::read_to_string(&events)
                .with_context(|| format!("Cannot read events from {}", events.display()))?;
            dispatch(&config, |kind| run(kind, &config, &input))
        }
        Commands::Parse { expression } => {
            let ast = parse(&expression).with_context(|| format!("Cannot parse '{expression}'"))?;
            println!("{ast}");
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<NtupleConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration {}", path.display()))?;
    NtupleConfig::from_json(&text)
        .with_context(|| format!("Invalid configuration {}", path.display()))
}

/// Concrete record type for each ntuplizable object kind
enum Kind {
    Electron,
    Muon,
    Composite,
}

fn dispatch(config: &NtupleConfig, f: impl FnOnce(Kind) -> Result<()>) -> Result<()> {
    let kind = match config.object {
        ObjectKind::Electron => Kind::Electron,
        ObjectKind::Muon => Kind::Muon,
        ObjectKind::Composite => Kind::Composite,
        ObjectKind::Other => bail!(ntuplizer::NtupleError::UnsupportedObjectKind(config.object)),
    };
    f(kind)
}

fn check(kind: Kind, config: &NtupleConfig) -> Result<()> {
    let branches = match kind {
        Kind::Electron => build::<Electron>(config)?.branch_names().count(),
        Kind::Muon => build::<Muon>(config)?.branch_names().count(),
        Kind::Composite => build::<CompositeCandidate>(config)?.branch_names().count(),
    };
    println!("OK: {branches} branches for {}", config.object);
    Ok(())
}

fn run(kind: Kind, config: &NtupleConfig, input: &str) -> Result<()> {
    match kind {
        Kind::Electron => fill::<Electron>(config, input),
        Kind::Muon => fill::<Muon>(config, input),
        Kind::Composite => fill::<CompositeCandidate>(config, input),
    }
}

fn build<T: ObjectFunctions>(config: &NtupleConfig) -> Result<Ntuplizer<T>> {
    Ntuplizer::new(config).context("Cannot resolve branches")
}

fn fill<T: ObjectFunctions + DeserializeOwned>(config: &NtupleConfig, input: &str) -> Result<()> {
    let ntuplizer = build::<T>(config)?;
    let records: Vec<EventRecord<T>> =
        serde_json::from_str(input).context("Events must be a JSON array of {event, objects}")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut rows = 0usize;
    for record in &records {
        for row in ntuplizer.fill_all(&record.objects, &record.event) {
            serde_json::to_writer(&mut out, &row)?;
            writeln!(out)?;
            rows += 1;
        }
    }
    out.flush()?;
    info!("Filled {rows} rows from {} events", records.len());
    Ok(())
}

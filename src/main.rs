//! `geoscan` command line tool.
//!
//! Loads points from a JSON file into an in-memory index and runs radius or
//! rectangle queries against it, printing the matching items as JSON.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use geoscan::{
    engine::{Attributes, InMemoryStore},
    logging::init_logging,
    query::{QueryOutput, QueryPlan, QueryRadiusInput, QueryRectangleInput},
    GeoDataManager, GeoPoint, PutPointInput, Settings,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Parser)]
#[command(name = "geoscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Radius and rectangle queries over a geospatial point index", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "GEOSCAN_CONFIG")]
    config: Option<PathBuf>,
    /// JSON array of `{rangeKey, latitude, longitude, ...attributes}`
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Page size per scan request
    #[arg(long)]
    limit: Option<usize>,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
    /// Only warnings and errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
    #[arg(long, value_enum, default_value = "pretty")]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Points within a distance of a center
    Radius {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        meters: f64,
    },
    /// Points inside a latitude/longitude box, edges included
    Rectangle {
        #[arg(long, allow_hyphen_values = true)]
        min_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        min_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        max_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        max_lon: f64,
    },
    /// Show the scans a radius query would issue, without running it
    PlanRadius {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        meters: f64,
    },
}

/// One record of the `--data` file.
#[derive(Debug, Serialize, Deserialize)]
struct DataPoint {
    #[serde(rename = "rangeKey")]
    range_key: String,
    latitude: f64,
    longitude: f64,
    #[serde(flatten)]
    attributes: Attributes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.verbose {
        settings.logging.level = "debug".to_string();
    } else if cli.quiet {
        settings.logging.level = "warn".to_string();
    }
    let logging = init_logging(settings.logging.clone())
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    let store = Arc::new(InMemoryStore::new());
    let manager = GeoDataManager::new(store, settings.geo.clone())?;
    if let Some(path) = &cli.data {
        let loaded = load_points(&manager, path).await?;
        info!(points = loaded, path = %path.display(), "Loaded points");
    }

    let output = match cli.command {
        Commands::Radius { lat, lon, meters } => {
            let mut input = QueryRadiusInput::new(GeoPoint::new(lat, lon), meters);
            input.options.limit = cli.limit;
            render_output(&manager, manager.query_radius(&input).await?)
        }
        Commands::Rectangle {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        } => {
            let mut input = QueryRectangleInput::new(
                GeoPoint::new(min_lat, min_lon),
                GeoPoint::new(max_lat, max_lon),
            );
            input.options.limit = cli.limit;
            render_output(&manager, manager.query_rectangle(&input).await?)
        }
        Commands::PlanRadius { lat, lon, meters } => {
            let input = QueryRadiusInput::new(GeoPoint::new(lat, lon), meters);
            render_plan(&manager.plan_radius(&input)?)
        }
    };

    let text = match cli.output {
        OutputFormat::Pretty => serde_json::to_string_pretty(&output)?,
        OutputFormat::Json => serde_json::to_string(&output)?,
    };
    println!("{text}");

    logging.shutdown();
    Ok(())
}

async fn load_points(
    manager: &GeoDataManager<InMemoryStore>,
    path: &Path,
) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading data file {}", path.display()))?;
    let points: Vec<DataPoint> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing data file {}", path.display()))?;

    let inputs: Vec<PutPointInput> = points
        .into_iter()
        .map(|p| PutPointInput {
            range_key: p.range_key,
            point: GeoPoint::new(p.latitude, p.longitude),
            attributes: p.attributes,
        })
        .collect();

    let mut loaded = 0;
    for chunk in inputs.chunks(manager.config().batch_write_size) {
        loaded += manager.batch_write_points(chunk.to_vec()).await?.written;
    }
    Ok(loaded)
}

fn render_output(
    manager: &GeoDataManager<InMemoryStore>,
    output: QueryOutput,
) -> Value {
    info!(
        cells = output.stats.cells,
        ranges = output.stats.ranges,
        pages = output.stats.pages,
        scanned = output.stats.scanned,
        returned = output.stats.returned,
        "Query finished"
    );
    Value::Array(
        output
            .items
            .iter()
            .map(|item| item.to_document(manager.config()))
            .collect(),
    )
}

fn render_plan(plan: &QueryPlan) -> Value {
    let scans: Vec<Value> = plan
        .scans()
        .map(|(hash_key, range)| {
            json!({
                "hashKey": hash_key,
                "rangeMin": range.range_min,
                "rangeMax": range.range_max,
            })
        })
        .collect();
    json!({
        "cells": plan.cell_count,
        "ranges": scans,
    })
}

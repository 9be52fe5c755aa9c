use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use retailmap::api::fetch_highways;
use retailmap::config::{FileConfig, default_output, default_places, resolve_verbose};
use retailmap::domain::{PointOfInterest, SiteCategory};
use retailmap::logging::init_logger;
use retailmap::osm::parse_highway_graph;
use retailmap::pipeline::{
    CensusSource, OsmSource, annotate_distances, collect_supply, run_demand_and_render,
};

/// Map cafe supply, highway access and census tract income for retail siting
///
/// Examples:
///   # Northwest Arkansas with the built-in defaults
///   retailmap --census-key YOUR_KEY
///
///   # A different set of places and counties
///   retailmap -p "Tulsa, Oklahoma, USA" --state 40 --county 143 -o tulsa.html
///
///   # Use a config file
///   retailmap --config my-settings.toml
#[derive(Parser, Debug)]
#[command(name = "retailmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches retailmap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Place to collect cafes from, repeatable (e.g. "Rogers, Arkansas, USA")
    #[arg(short = 'p', long = "place")]
    places: Vec<String>,

    /// Census Data API key
    #[arg(long)]
    census_key: Option<String>,

    /// Two-digit state FIPS code for census data
    #[arg(long)]
    state: Option<String>,

    /// Three-digit county FIPS code, repeatable
    #[arg(long = "county")]
    counties: Vec<String>,

    /// ACS 5-year vintage and TIGER year
    #[arg(long)]
    year: Option<u16>,

    /// Output HTML file path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Snap to every highway node instead of only endpoints and intersections
    #[arg(long)]
    no_simplify: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            Some(FileConfig::from_path(config_path)?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load()
    };

    let verbose = resolve_verbose(args.verbose, file_config.as_ref());
    let multi = init_logger(verbose);

    let places = if !args.places.is_empty() {
        args.places.clone()
    } else {
        file_config
            .as_ref()
            .and_then(|c| c.places.clone())
            .unwrap_or_else(default_places)
    };
    if places.is_empty() {
        bail!("No places configured");
    }
    let output = args
        .output
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()))
        .unwrap_or_else(default_output);
    let simplify =
        !args.no_simplify && file_config.as_ref().map(|c| c.simplify).unwrap_or(true);

    let mut census = file_config
        .as_ref()
        .and_then(|c| c.census.clone())
        .unwrap_or_default();
    if let Some(key) = args.census_key.clone() {
        census.api_key = key;
    }
    if let Some(state) = args.state.clone() {
        census.state = state;
    }
    if !args.counties.is_empty() {
        census.counties = args.counties.clone();
    }
    if let Some(year) = args.year {
        census.year = year;
    }

    let overpass = file_config
        .as_ref()
        .and_then(|c| c.overpass.clone())
        .unwrap_or_default();
    let nominatim = file_config
        .as_ref()
        .and_then(|c| c.nominatim.clone())
        .unwrap_or_default();
    let map = file_config
        .as_ref()
        .and_then(|c| c.map.clone())
        .unwrap_or_default();

    println!("retailmap - Retail Opportunity Map");
    println!("==================================");
    println!();

    if verbose {
        println!("Configuration:");
        for place in &places {
            println!("  Place: {}", place);
        }
        println!(
            "  Census: ACS {} {} for state {} counties {}",
            census.year,
            census.variable,
            census.state,
            census.counties.join(",")
        );
        println!(
            "  POI tag: {}={}",
            overpass.poi_key, overpass.poi_value
        );
        println!("  Highway filter: {}", overpass.highway_filter);
        println!(
            "  Graph simplification: {}",
            if simplify { "enabled" } else { "disabled" }
        );
        println!("  Output: {}", output.display());
        println!();
    }

    let spinner = create_spinner(&multi, "1. Fetching cafe locations (supply)...");
    let start = Instant::now();
    let source = OsmSource::new(nominatim, overpass);
    let mut pois = collect_supply(&source, &places);
    spinner.finish_with_message(format!(
        "Found {} cafes across {} places [{:.1}s]",
        pois.len(),
        places.len(),
        start.elapsed().as_secs_f32()
    ));

    let spinner = create_spinner(&multi, "2. Calculating commuter access (flow)...");
    let start = Instant::now();
    let areas = source.resolve_all(&places);
    let highways = fetch_highways(&areas, source.overpass())
        .context("Failed to fetch highway network from Overpass API")?;
    let graph = parse_highway_graph(&highways, simplify);
    annotate_distances(&mut pois, &graph)?;
    spinner.finish_with_message(format!(
        "Snapped {} cafes to {} highway nodes [{:.1}s]",
        pois.len(),
        graph.node_count(),
        start.elapsed().as_secs_f32()
    ));
    if verbose {
        print_category_breakdown(&pois);
    }

    let spinner = create_spinner(&multi, "3. Fetching census income data (demand) and building map...");
    let start = Instant::now();
    let summary = match run_demand_and_render(&CensusSource::new(census), &pois, &map, &output) {
        Ok(summary) => {
            spinner.finish_with_message(format!(
                "Census data merged for {} of {} tracts ({} income rows), map written [{:.1}s]",
                summary.tracts,
                summary.boundaries,
                summary.income_rows,
                start.elapsed().as_secs_f32()
            ));
            summary
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("ERROR: The Census API is likely still activating.");
            eprintln!("   Details: {:#}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );
    println!();
    println!("Output: {}", summary.output.display());

    Ok(())
}

fn print_category_breakdown(pois: &[PointOfInterest]) {
    let categories = [
        SiteCategory::CommuterHub,
        SiteCategory::NeighborhoodCafe,
        SiteCategory::DestinationStudy,
    ];
    for category in categories {
        let count = pois
            .iter()
            .filter(|p| p.category() == Some(category))
            .count();
        println!("  {}: {}", category.label(), count);
    }
}

fn create_spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

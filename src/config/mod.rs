use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const USER_AGENT: &str = "retailmap/0.1.0";

pub fn default_places() -> Vec<String> {
    vec![
        "Fayetteville, Arkansas, USA".to_string(),
        "Springdale, Arkansas, USA".to_string(),
        "Rogers, Arkansas, USA".to_string(),
        "Bentonville, Arkansas, USA".to_string(),
    ]
}

pub fn default_output() -> PathBuf {
    PathBuf::from("NWA_Final_Analysis.html")
}

fn default_verbose() -> bool {
    false
}
fn default_simplify() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub places: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Collapse highway ways to endpoints and intersections before snapping
    #[serde(default = "default_simplify")]
    pub simplify: bool,
    #[serde(default)]
    pub census: Option<CensusConfig>,
    #[serde(default)]
    pub overpass: Option<OverpassConfig>,
    #[serde(default)]
    pub nominatim: Option<NominatimConfig>,
    #[serde(default)]
    pub map: Option<MapConfig>,
}

fn default_api_key() -> String {
    "YOUR_API_KEY_HERE".to_string()
}
fn default_census_url() -> String {
    "https://api.census.gov/data".to_string()
}
fn default_tiger_url() -> String {
    "https://www2.census.gov/geo/tiger".to_string()
}
fn default_year() -> u16 {
    2021
}
/// ACS median household income
fn default_variable() -> String {
    "B19013_001E".to_string()
}
/// Arkansas
fn default_state() -> String {
    "05".to_string()
}
/// Benton and Washington counties
fn default_counties() -> Vec<String> {
    vec!["007".to_string(), "143".to_string()]
}
fn default_census_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct CensusConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_census_url")]
    pub api_url: String,
    #[serde(default = "default_tiger_url")]
    pub tiger_url: String,
    #[serde(default = "default_year")]
    pub year: u16,
    #[serde(default = "default_variable")]
    pub variable: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_counties")]
    pub counties: Vec<String>,
    #[serde(default = "default_census_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            api_url: default_census_url(),
            tiger_url: default_tiger_url(),
            year: default_year(),
            variable: default_variable(),
            state: default_state(),
            counties: default_counties(),
            timeout_secs: default_census_timeout_secs(),
        }
    }
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}
fn default_overpass_timeout_secs() -> u64 {
    180
}
fn default_user_agent() -> String {
    USER_AGENT.to_string()
}
fn default_highway_filter() -> String {
    "motorway|motorway_link".to_string()
}
fn default_poi_key() -> String {
    "amenity".to_string()
}
fn default_poi_value() -> String {
    "cafe".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_url")]
    pub url: String,
    /// Server-side query timeout; the HTTP client waits a little longer
    #[serde(default = "default_overpass_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Regex matched against the `highway` tag of the flow network
    #[serde(default = "default_highway_filter")]
    pub highway_filter: String,
    #[serde(default = "default_poi_key")]
    pub poi_key: String,
    #[serde(default = "default_poi_value")]
    pub poi_value: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: default_overpass_url(),
            timeout_secs: default_overpass_timeout_secs(),
            user_agent: default_user_agent(),
            highway_filter: default_highway_filter(),
            poi_key: default_poi_key(),
            poi_value: default_poi_value(),
        }
    }
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}
fn default_nominatim_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct NominatimConfig {
    #[serde(default = "default_nominatim_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_nominatim_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            url: default_nominatim_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_nominatim_timeout_secs(),
        }
    }
}

fn default_center() -> [f64; 2] {
    [36.18, -94.14]
}
fn default_zoom() -> u8 {
    11
}
/// CartoDB positron
fn default_tile_url() -> String {
    "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png".to_string()
}
fn default_attribution() -> String {
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>".to_string()
}
fn default_title() -> String {
    "NWA Retail Opportunity Map".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    /// [lat, lon]
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_attribution")]
    pub attribution: String,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: default_center(),
            zoom: default_zoom(),
            tile_url: default_tile_url(),
            attribution: default_attribution(),
            title: default_title(),
        }
    }
}

impl FileConfig {
    /// Search the standard locations and return the first config that parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

/// Verbose output is on when either the CLI flag or the config file enables it
pub fn resolve_verbose(cli: bool, file: Option<&FileConfig>) -> bool {
    cli || file.is_some_and(|c| c.verbose)
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("retailmap.toml"));
    paths.push(PathBuf::from(".retailmap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("retailmap").join("config.toml"));
        paths.push(config_dir.join("retailmap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".retailmap.toml"));
        paths.push(home.join(".config").join("retailmap").join("config.toml"));
    }

    paths
}

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::nominatim::PlaceArea;
use crate::config::OverpassConfig;

/// Raw Overpass API response
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Inline way geometry, present with `out geom`
    #[serde(default)]
    pub geometry: Option<Vec<LatLon>>,
    /// Relation extent, present with `out geom`
    #[serde(default)]
    pub bounds: Option<ElementBounds>,
}

/// Overpass filter clause selecting the given area, with any setup statement
fn area_clause(area: &PlaceArea, set_name: &str) -> (String, String) {
    match area {
        PlaceArea::Area(id) => (
            format!("area({id})->.{set_name};\n"),
            format!("(area.{set_name})"),
        ),
        PlaceArea::BoundingBox {
            south,
            west,
            north,
            east,
        } => (String::new(), format!("({south},{west},{north},{east})")),
    }
}

/// Build the query for all features carrying `key=value` inside one place
fn build_amenity_query(area: &PlaceArea, key: &str, value: &str, timeout_secs: u64) -> String {
    let (setup, filter) = area_clause(area, "searchArea");
    format!(
        r#"[out:json][timeout:{timeout_secs}];
{setup}(
  node["{key}"="{value}"]{filter};
  way["{key}"="{value}"]{filter};
  relation["{key}"="{value}"]{filter};
);
out geom;"#
    )
}

/// Build the query for highway ways (and their nodes) across all places
fn build_highway_query(areas: &[PlaceArea], highway_regex: &str, timeout_secs: u64) -> String {
    let mut setup = String::new();
    let mut selectors = String::new();
    for (i, area) in areas.iter().enumerate() {
        let (s, filter) = area_clause(area, &format!("a{i}"));
        setup.push_str(&s);
        selectors.push_str(&format!("  way[\"highway\"~\"{highway_regex}\"]{filter};\n"));
    }
    format!(
        r#"[out:json][timeout:{timeout_secs}];
{setup}(
{selectors});
out body;
>;
out skel qt;"#
    )
}

/// Fetch all `amenity=cafe` style features for a place
pub fn fetch_amenities(
    area: &PlaceArea,
    key: &str,
    value: &str,
    config: &OverpassConfig,
) -> Result<OverpassResponse> {
    let query = build_amenity_query(area, key, value, config.timeout_secs);
    execute_overpass_query(&query, config)
}

/// Fetch the highway network covering every place
pub fn fetch_highways(areas: &[PlaceArea], config: &OverpassConfig) -> Result<OverpassResponse> {
    if areas.is_empty() {
        bail!("No places resolved, cannot fetch highway network");
    }
    let query = build_highway_query(areas, &config.highway_filter, config.timeout_secs);
    execute_overpass_query(&query, config)
}

/// Execute an Overpass API query. A single attempt; callers decide what a failure means.
fn execute_overpass_query(query: &str, config: &OverpassConfig) -> Result<OverpassResponse> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.as_str())
        // Client timeout slightly higher than the server-side query timeout
        .timeout(Duration::from_secs(config.timeout_secs + 20))
        .build()
        .context("Failed to create HTTP client")?;

    log::debug!("Overpass query:\n{}", query);

    // Overpass expects form-encoded POST data: data=<query>
    let response = client
        .post(&config.url)
        .form(&[("data", query)])
        .send()
        .context("Failed to send request to Overpass API")?;

    if !response.status().is_success() {
        bail!("Overpass API returned error status: {}", response.status());
    }

    response
        .json()
        .context("Failed to parse Overpass JSON response")
}

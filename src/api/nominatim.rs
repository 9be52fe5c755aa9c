use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::thread;
use std::time::Duration;

use crate::config::NominatimConfig;

/// Overpass derives area ids from OSM ids by adding these offsets
const RELATION_AREA_OFFSET: u64 = 3_600_000_000;
const WAY_AREA_OFFSET: u64 = 2_400_000_000;

#[derive(Debug, Deserialize)]
struct NominatimResult {
    #[serde(default)]
    osm_type: Option<String>,
    #[serde(default)]
    osm_id: Option<u64>,
    /// [south, north, west, east] as strings
    boundingbox: Vec<String>,
    #[allow(dead_code)]
    display_name: String,
}

/// Where a place lives for the purpose of an Overpass query
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceArea {
    /// An Overpass area id derived from a boundary relation or closed way
    Area(u64),
    /// Fallback when the geocoder only resolved a point-like object
    BoundingBox {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    },
}

impl PlaceArea {
    fn from_result(result: &NominatimResult) -> Result<Self> {
        match (result.osm_type.as_deref(), result.osm_id) {
            (Some("relation"), Some(id)) => return Ok(PlaceArea::Area(RELATION_AREA_OFFSET + id)),
            (Some("way"), Some(id)) => return Ok(PlaceArea::Area(WAY_AREA_OFFSET + id)),
            _ => {}
        }

        if result.boundingbox.len() != 4 {
            bail!(
                "Nominatim bounding box has {} values, expected 4",
                result.boundingbox.len()
            );
        }
        let parse = |i: usize| -> Result<f64> {
            result.boundingbox[i]
                .parse()
                .with_context(|| format!("Invalid bounding box value: {}", result.boundingbox[i]))
        };
        Ok(PlaceArea::BoundingBox {
            south: parse(0)?,
            north: parse(1)?,
            west: parse(2)?,
            east: parse(3)?,
        })
    }
}

/// Resolve a free-form place name ("Rogers, Arkansas, USA") to a query area.
///
/// Sleeps one second before the request to respect the Nominatim usage policy.
pub fn geocode_place(place: &str, config: &NominatimConfig) -> Result<PlaceArea> {
    thread::sleep(Duration::from_secs(1));

    let client = reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(&config.url)
        .query(&[("q", place), ("format", "json"), ("limit", "1")])
        .send()
        .context("Failed to send request to Nominatim API")?;

    if !response.status().is_success() {
        bail!("Nominatim API returned error status: {}", response.status());
    }

    let results: Vec<NominatimResult> = response
        .json()
        .context("Failed to parse Nominatim JSON response")?;

    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Place not found: {}", place))?;

    PlaceArea::from_result(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_becomes_area() {
        let json = r#"[{"osm_type":"relation","osm_id":116220,"boundingbox":["35.99","36.14","-94.29","-94.03"],"display_name":"Fayetteville, Washington County, Arkansas, United States"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();

        let area = PlaceArea::from_result(&results[0]).unwrap();
        assert_eq!(area, PlaceArea::Area(3_600_116_220));
    }

    #[test]
    fn test_node_falls_back_to_bbox() {
        let json = r#"[{"osm_type":"node","osm_id":42,"boundingbox":["36.1","36.3","-94.2","-94.0"],"display_name":"Somewhere"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();

        let area = PlaceArea::from_result(&results[0]).unwrap();
        assert_eq!(
            area,
            PlaceArea::BoundingBox {
                south: 36.1,
                west: -94.2,
                north: 36.3,
                east: -94.0,
            }
        );
    }

    #[test]
    fn test_bad_bbox_is_error() {
        let json = r#"[{"boundingbox":["36.1"],"display_name":"Broken"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();
        assert!(PlaceArea::from_result(&results[0]).is_err());
    }
}

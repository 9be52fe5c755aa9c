use anyhow::{Context, Result, bail};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;

use super::color::{ColorScale, YL_GN_6};
use crate::config::MapConfig;
use crate::domain::{CensusTract, PointOfInterest};

const INCOME_LAYER: &str = "Income Layer";
const MARKER_LAYER: &str = "Coffee Shops";
const LEGEND_TITLE: &str = "Median Household Income ($)";
const FILL_OPACITY: f64 = 0.6;
const LINE_OPACITY: f64 = 0.1;

#[derive(Debug, Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    color: &'static str,
    icon: &'static str,
    popup: String,
}

#[derive(Debug, Serialize)]
struct LegendBin {
    color: &'static str,
    label: String,
}

/// Minimal HTML text escaping for names coming from OpenStreetMap
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize to JSON that is safe to inline in a `<script>` block
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize map data")?;
    Ok(json.replace("</", "<\\/"))
}

/// Format as whole dollars with thousands separators: 71250.4 -> "$71,250"
fn format_dollars(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Popup body for one point of interest
pub fn popup_html(poi: &PointOfInterest) -> Option<String> {
    let distance = poi.dist_to_highway_m?;
    let category = poi.category()?;
    let name = poi.name.as_deref().map(escape_html);

    Some(format!(
        "<b>{}</b><br>Type: {}<br>Dist to Hwy: {}m",
        name.as_deref().unwrap_or("Unnamed"),
        category.label(),
        distance as i64,
    ))
}

fn markers(pois: &[PointOfInterest]) -> Vec<Marker> {
    pois.iter()
        .filter_map(|poi| {
            let category = poi.category()?;
            Some(Marker {
                lat: poi.lat,
                lon: poi.lon,
                color: category.color(),
                icon: category.icon(),
                popup: popup_html(poi)?,
            })
        })
        .collect()
}

fn tract_features(tracts: &[CensusTract], scale: &ColorScale) -> FeatureCollection {
    let features = tracts
        .iter()
        .map(|tract| {
            let mut properties = JsonObject::new();
            properties.insert("TRACTCE".to_string(), json!(tract.key.tract));
            properties.insert("COUNTYFP".to_string(), json!(tract.key.county));
            properties.insert("GEOID".to_string(), json!(tract.geoid));
            properties.insert("income".to_string(), json!(tract.income));
            properties.insert("fill".to_string(), json!(scale.color_for(tract.income)));
            properties.insert(
                "tooltip".to_string(),
                json!(format!(
                    "{}<br>{}",
                    escape_html(&tract.name),
                    format_dollars(tract.income)
                )),
            );

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&tract.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/4.7.0/css/font-awesome.min.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.min.js"></script>
<style>
html, body, #map { height: 100%; width: 100%; margin: 0; padding: 0; }
.legend { background: white; padding: 6px 8px; font: 12px sans-serif; border-radius: 4px; box-shadow: 0 0 6px rgba(0,0,0,0.3); }
.legend i { width: 14px; height: 14px; float: left; margin-right: 6px; }
</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map", { center: __CENTER__, zoom: __ZOOM__ });
L.tileLayer(__TILE_URL__, { attribution: __ATTRIBUTION__, subdomains: "abcd", maxZoom: 20 }).addTo(map);

var incomeLayer = L.geoJson(__TRACTS__, {
  style: function (feature) {
    return { fillColor: feature.properties.fill, fillOpacity: __FILL_OPACITY__, color: "black", weight: 1, opacity: __LINE_OPACITY__ };
  },
  onEachFeature: function (feature, layer) {
    layer.bindTooltip(feature.properties.tooltip);
  }
}).addTo(map);

var cluster = L.markerClusterGroup();
__MARKERS__.forEach(function (m) {
  var icon = L.AwesomeMarkers.icon({ icon: m.icon, markerColor: m.color, prefix: "fa" });
  L.marker([m.lat, m.lon], { icon: icon }).bindPopup(m.popup).addTo(cluster);
});
cluster.addTo(map);

var legend = L.control({ position: "topright" });
legend.onAdd = function () {
  var div = L.DomUtil.create("div", "legend");
  div.innerHTML = "<b>" + __LEGEND_TITLE__ + "</b><br>";
  __LEGEND__.forEach(function (bin) {
    div.innerHTML += '<i style="background:' + bin.color + '"></i>' + bin.label + "<br>";
  });
  return div;
};
legend.addTo(map);

var overlays = {};
overlays[__INCOME_LAYER__] = incomeLayer;
overlays[__MARKER_LAYER__] = cluster;
L.control.layers(null, overlays).addTo(map);
</script>
</body>
</html>
"#;

/// Render the complete interactive map document
pub fn render_map(
    config: &MapConfig,
    tracts: &[CensusTract],
    pois: &[PointOfInterest],
) -> Result<String> {
    let incomes: Vec<f64> = tracts.iter().map(|t| t.income).collect();
    let Some(scale) = ColorScale::equal_interval(&incomes, &YL_GN_6) else {
        bail!("No tract income values to shade");
    };

    let legend: Vec<LegendBin> = scale
        .bins()
        .map(|(color, lo, hi)| LegendBin {
            color,
            label: format!("{} - {}", format_dollars(lo), format_dollars(hi)),
        })
        .collect();

    let replacements = [
        ("__TITLE__", escape_html(&config.title)),
        ("__CENTER__", script_json(&config.center)?),
        ("__ZOOM__", config.zoom.to_string()),
        ("__TILE_URL__", script_json(&config.tile_url)?),
        ("__ATTRIBUTION__", script_json(&config.attribution)?),
        ("__TRACTS__", script_json(&tract_features(tracts, &scale))?),
        ("__FILL_OPACITY__", FILL_OPACITY.to_string()),
        ("__LINE_OPACITY__", LINE_OPACITY.to_string()),
        ("__MARKERS__", script_json(&markers(pois))?),
        ("__LEGEND_TITLE__", script_json(LEGEND_TITLE)?),
        ("__LEGEND__", script_json(&legend)?),
        ("__INCOME_LAYER__", script_json(INCOME_LAYER)?),
        ("__MARKER_LAYER__", script_json(MARKER_LAYER)?),
    ];

    Ok(fill_template(TEMPLATE, &replacements))
}

/// Replace `__TOKEN__` placeholders in a single left-to-right pass.
///
/// Inserted values are never rescanned, so data containing a placeholder
/// name is emitted verbatim.
fn fill_template(template: &str, replacements: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("__") {
        let tail = &rest[start..];
        match replacements.iter().find(|(token, _)| tail.starts_with(token)) {
            Some((token, value)) => {
                out.push_str(&rest[..start]);
                out.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                out.push_str(&rest[..start + 2]);
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Write `html` to `path` via a temporary file in the same directory and a rename,
/// so a failed write never leaves a truncated or partially replaced document.
pub fn write_html(path: &Path, html: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).context("Failed to create temp file")?;
    tmp.write_all(html.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to rename temp file to {}", path.display()))?;

    Ok(())
}

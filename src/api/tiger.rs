use anyhow::{Context, Result, bail};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{Reader, Shape};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::ZipArchive;

use crate::config::CensusConfig;
use crate::domain::{TractBoundary, TractKey};
use crate::geometry::shp_to_geo;

/// TIGER/Line tract archive URL for one state and vintage
///
/// Example: `https://www2.census.gov/geo/tiger/TIGER2021/TRACT/tl_2021_05_tract.zip`
pub fn tract_archive_url(config: &CensusConfig) -> String {
    format!(
        "{base}/TIGER{year}/TRACT/tl_{year}_{state}_tract.zip",
        base = config.tiger_url.trim_end_matches('/'),
        year = config.year,
        state = config.state,
    )
}

/// Download, extract and read tract boundaries, keeping only the configured counties
pub fn fetch_tract_boundaries(config: &CensusConfig) -> Result<Vec<TractBoundary>> {
    let url = tract_archive_url(config);
    let workdir = tempfile::tempdir().context("Failed to create temporary directory")?;
    let zip_path = workdir.path().join("tracts.zip");

    download_file(&url, &zip_path, config.timeout_secs)?;
    extract_zip(&zip_path, workdir.path())?;

    let shp_path = find_shapefile(workdir.path())?;
    let boundaries = read_tract_shapefile(&shp_path)?;

    Ok(filter_counties(boundaries, &config.counties))
}

fn download_file(url: &str, out_path: &Path, timeout_secs: u64) -> Result<()> {
    log::debug!("[download] {url} -> {}", out_path.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url} returned error status"))?;

    let mut file = fs::File::create(out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    std::io::copy(&mut response, &mut file)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    Ok(())
}

/// Extract a `.zip` archive into `dest_dir`
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = fs::File::open(zip_path)
        .with_context(|| format!("Failed to open {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read zip archive {}", zip_path.display()))?;
    archive
        .extract(dest_dir)
        .with_context(|| format!("Failed to extract {}", zip_path.display()))?;
    Ok(())
}

fn find_shapefile(dir: &Path) -> Result<PathBuf> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("shp")) {
            found.push(path);
        }
    }
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => bail!("No .shp file found in tract archive"),
        n => bail!("Expected one .shp file in tract archive, found {}", n),
    }
}

fn character_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(value))) => Some(value.trim().to_string()),
        _ => None,
    }
}

/// Read every polygon tract from a TIGER tract shapefile
pub fn read_tract_shapefile(path: &Path) -> Result<Vec<TractBoundary>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut boundaries = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Error reading shape+record")?;

        let polygon = match shape {
            Shape::Polygon(p) => p,
            other => {
                log::debug!("Skipping non-polygon tract shape: {:?}", other.shapetype());
                continue;
            }
        };

        let (Some(county), Some(tract)) = (
            character_field(&record, "COUNTYFP"),
            character_field(&record, "TRACTCE"),
        ) else {
            log::debug!("Skipping tract record without COUNTYFP/TRACTCE");
            continue;
        };
        let geoid = character_field(&record, "GEOID").unwrap_or_default();

        boundaries.push(TractBoundary {
            key: TractKey::new(county, tract),
            geoid,
            geometry: shp_to_geo(&polygon),
        });
    }

    Ok(boundaries)
}

/// Keep only boundaries whose county FIPS is listed
pub fn filter_counties(boundaries: Vec<TractBoundary>, counties: &[String]) -> Vec<TractBoundary> {
    boundaries
        .into_iter()
        .filter(|b| counties.iter().any(|c| *c == b.key.county))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;
    use shapefile::dbase::TableWriterBuilder;
    use shapefile::{Point, Polygon, PolygonRing, Writer};
    use std::io::Write;

    fn tract_table() -> TableWriterBuilder {
        TableWriterBuilder::new()
            .add_character_field("COUNTYFP".try_into().unwrap(), 3)
            .add_character_field("TRACTCE".try_into().unwrap(), 6)
            .add_character_field("GEOID".try_into().unwrap(), 11)
    }

    fn tract_record(county: &str, tract: Option<&str>, geoid: &str) -> Record {
        let mut record = Record::default();
        record.insert(
            "COUNTYFP".to_string(),
            FieldValue::Character(Some(county.to_string())),
        );
        record.insert(
            "TRACTCE".to_string(),
            FieldValue::Character(tract.map(String::from)),
        );
        record.insert(
            "GEOID".to_string(),
            FieldValue::Character(Some(geoid.to_string())),
        );
        record
    }

    fn square(x: f64, y: f64) -> Polygon {
        Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, y),
            Point::new(x, y + 0.1),
            Point::new(x + 0.1, y + 0.1),
            Point::new(x + 0.1, y),
            Point::new(x, y),
        ]))
    }

    /// Polygon tracts: one complete, one without TRACTCE, one outside the study counties
    fn write_tract_shapefile(path: &Path) {
        let mut writer = Writer::from_path(path, tract_table()).unwrap();
        writer
            .write_shape_and_record(
                &square(-94.2, 36.0),
                &tract_record("143", Some("010100"), "05143010100"),
            )
            .unwrap();
        writer
            .write_shape_and_record(&square(-94.1, 36.0), &tract_record("143", None, "05143"))
            .unwrap();
        writer
            .write_shape_and_record(
                &square(-93.0, 35.0),
                &tract_record("087", Some("950100"), "05087950100"),
            )
            .unwrap();
    }

    fn zip_dir(src: &Path, zip_path: &Path) {
        let mut zip = zip::ZipWriter::new(fs::File::create(zip_path).unwrap());
        for entry in fs::read_dir(src).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            zip.start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(&fs::read(&path).unwrap()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn boundary(county: &str, tract: &str) -> TractBoundary {
        TractBoundary {
            key: TractKey::new(county, tract),
            geoid: format!("05{county}{tract}"),
            geometry: MultiPolygon(vec![]),
        }
    }

    #[test]
    fn test_tract_archive_url() {
        let config = CensusConfig::default();
        assert_eq!(
            tract_archive_url(&config),
            "https://www2.census.gov/geo/tiger/TIGER2021/TRACT/tl_2021_05_tract.zip"
        );
    }

    #[test]
    fn test_filter_counties() {
        let all = vec![
            boundary("007", "020100"),
            boundary("143", "010100"),
            boundary("087", "950100"),
        ];
        let kept = filter_counties(all, &["007".to_string(), "143".to_string()]);
        let counties: Vec<&str> = kept.iter().map(|b| b.key.county.as_str()).collect();
        assert_eq!(counties, vec!["007", "143"]);
    }

    #[test]
    fn test_find_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tl_2021_05_tract.dbf"), b"").unwrap();
        fs::write(dir.path().join("tl_2021_05_tract.shp"), b"").unwrap();

        let found = find_shapefile(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "tl_2021_05_tract.shp");
    }

    #[test]
    fn test_find_shapefile_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_shapefile(dir.path()).is_err());
    }

    #[test]
    fn test_read_tract_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tl_2021_05_tract.shp");
        write_tract_shapefile(&path);

        let boundaries = read_tract_shapefile(&path).unwrap();
        assert_eq!(boundaries.len(), 2);

        assert_eq!(boundaries[0].key, TractKey::new("143", "010100"));
        assert_eq!(boundaries[0].geoid, "05143010100");
        assert_eq!(boundaries[0].geometry.0.len(), 1);
        assert_eq!(boundaries[1].key, TractKey::new("087", "950100"));
    }

    #[test]
    fn test_non_polygon_shapes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.shp");
        {
            let mut writer = Writer::from_path(&path, tract_table()).unwrap();
            writer
                .write_shape_and_record(
                    &Point::new(-94.15, 36.05),
                    &tract_record("143", Some("010100"), "05143010100"),
                )
                .unwrap();
        }

        assert!(read_tract_shapefile(&path).unwrap().is_empty());
    }

    #[test]
    fn test_archive_to_county_boundaries() {
        let shp_dir = tempfile::tempdir().unwrap();
        write_tract_shapefile(&shp_dir.path().join("tl_2021_05_tract.shp"));

        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("tracts.zip");
        zip_dir(shp_dir.path(), &zip_path);

        let extracted = work.path().join("extracted");
        fs::create_dir_all(&extracted).unwrap();
        extract_zip(&zip_path, &extracted).unwrap();
        let shp_path = find_shapefile(&extracted).unwrap();
        let boundaries = filter_counties(
            read_tract_shapefile(&shp_path).unwrap(),
            &["007".to_string(), "143".to_string()],
        );

        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].key, TractKey::new("143", "010100"));
        assert_eq!(boundaries[0].geoid, "05143010100");
    }
}

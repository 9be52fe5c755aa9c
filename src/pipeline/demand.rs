use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::api::{fetch_income_table, fetch_tract_boundaries};
use crate::config::{CensusConfig, MapConfig};
use crate::domain::{CensusTract, IncomeRecord, PointOfInterest, TractBoundary, TractKey};
use crate::render::{render_map, write_html};

/// Provider of the two demand datasets
pub trait DemandSource {
    fn income_table(&self) -> Result<Vec<IncomeRecord>>;
    fn tract_boundaries(&self) -> Result<Vec<TractBoundary>>;
}

/// Census ACS API + TIGER/Line shapefiles
pub struct CensusSource {
    config: CensusConfig,
}

impl CensusSource {
    pub fn new(config: CensusConfig) -> Self {
        Self { config }
    }
}

impl DemandSource for CensusSource {
    fn income_table(&self) -> Result<Vec<IncomeRecord>> {
        fetch_income_table(&self.config)
    }

    fn tract_boundaries(&self) -> Result<Vec<TractBoundary>> {
        fetch_tract_boundaries(&self.config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemandSummary {
    pub income_rows: usize,
    pub boundaries: usize,
    pub tracts: usize,
    pub output: PathBuf,
}

/// Inner join of positive incomes onto boundaries by tract key.
///
/// Output follows boundary order. Tracts missing from either side, or whose
/// income is missing or not positive, are dropped.
pub fn join_tracts(income: Vec<IncomeRecord>, boundaries: Vec<TractBoundary>) -> Vec<CensusTract> {
    let by_key: HashMap<TractKey, (String, f64)> = income
        .into_iter()
        .filter_map(|r| {
            let value = r.income.filter(|v| *v > 0.0)?;
            Some((r.key, (r.name, value)))
        })
        .collect();

    boundaries
        .into_iter()
        .filter_map(|b| {
            let (name, income) = by_key.get(&b.key)?.clone();
            Some(CensusTract {
                key: b.key,
                geoid: b.geoid,
                name,
                geometry: b.geometry,
                income,
            })
        })
        .collect()
}

/// Demand acquisition and visualization as one failure boundary.
///
/// Any error aborts before the output file is touched; a previous file at
/// `output` is left as it was.
pub fn run_demand_and_render<D: DemandSource + ?Sized>(
    source: &D,
    pois: &[PointOfInterest],
    map: &MapConfig,
    output: &Path,
) -> Result<DemandSummary> {
    let income = source
        .income_table()
        .context("Failed to fetch census income table")?;
    let income_rows = income.len();
    log::info!("Fetched {} income rows", income_rows);

    let boundaries = source
        .tract_boundaries()
        .context("Failed to load tract boundaries")?;
    let boundary_count = boundaries.len();
    log::info!("Loaded {} tract boundaries", boundary_count);

    let tracts = join_tracts(income, boundaries);
    if tracts.is_empty() {
        bail!(
            "No tracts matched between {} income rows and {} boundaries",
            income_rows,
            boundary_count
        );
    }
    log::info!("Census data merged for {} tracts", tracts.len());

    let html = render_map(map, &tracts, pois)?;
    write_html(output, &html)?;

    Ok(DemandSummary {
        income_rows,
        boundaries: boundary_count,
        tracts: tracts.len(),
        output: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};

    fn record(county: &str, tract: &str, income: Option<f64>) -> IncomeRecord {
        IncomeRecord {
            name: format!("Census Tract {tract}"),
            key: TractKey::new(county, tract),
            income,
        }
    }

    fn boundary(county: &str, tract: &str) -> TractBoundary {
        TractBoundary {
            key: TractKey::new(county, tract),
            geoid: format!("05{county}{tract}"),
            geometry: MultiPolygon(vec![polygon![
                (x: -94.2, y: 36.0),
                (x: -94.1, y: 36.0),
                (x: -94.1, y: 36.1),
                (x: -94.2, y: 36.0),
            ]]),
        }
    }

    struct FakeDemand {
        income: Result<Vec<IncomeRecord>, &'static str>,
        boundaries: Result<Vec<TractBoundary>, &'static str>,
    }

    impl DemandSource for FakeDemand {
        fn income_table(&self) -> Result<Vec<IncomeRecord>> {
            self.income.clone().map_err(|e| anyhow::anyhow!(e))
        }

        fn tract_boundaries(&self) -> Result<Vec<TractBoundary>> {
            self.boundaries.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn healthy() -> FakeDemand {
        FakeDemand {
            income: Ok(vec![
                record("007", "020100", Some(64_000.0)),
                record("143", "010100", Some(48_500.0)),
            ]),
            boundaries: Ok(vec![boundary("007", "020100"), boundary("143", "010100")]),
        }
    }

    fn cafe() -> PointOfInterest {
        let mut p = PointOfInterest::new(Some("Cafe".into()), 36.05, -94.15, "Fayetteville");
        p.dist_to_highway_m = Some(700.0);
        p
    }

    #[test]
    fn test_join_is_inner() {
        let income = vec![
            record("007", "020100", Some(64_000.0)),
            record("143", "010100", Some(48_500.0)),
            // no boundary for this one
            record("143", "999999", Some(51_000.0)),
        ];
        let boundaries = vec![
            boundary("143", "010100"),
            boundary("007", "020100"),
            // no income row for this one
            boundary("007", "020200"),
        ];

        let tracts = join_tracts(income, boundaries);
        let keys: Vec<&str> = tracts.iter().map(|t| t.key.tract.as_str()).collect();
        assert_eq!(keys, vec!["010100", "020100"]);
        assert_eq!(tracts[0].income, 48_500.0);
        assert_eq!(tracts[0].geoid, "05143010100");
    }

    #[test]
    fn test_join_drops_non_positive_income() {
        let income = vec![
            record("143", "010100", Some(-666_666_666.0)),
            record("143", "010200", Some(0.0)),
            record("143", "010300", None),
            record("143", "010400", Some(1.0)),
        ];
        let boundaries = vec![
            boundary("143", "010100"),
            boundary("143", "010200"),
            boundary("143", "010300"),
            boundary("143", "010400"),
        ];

        let tracts = join_tracts(income, boundaries);
        assert_eq!(tracts.len(), 1);
        assert_eq!(tracts[0].key.tract, "010400");
    }

    #[test]
    fn test_join_distinguishes_counties() {
        let income = vec![record("007", "010100", Some(70_000.0))];
        let boundaries = vec![boundary("143", "010100")];
        assert!(join_tracts(income, boundaries).is_empty());
    }

    #[test]
    fn test_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("map.html");

        let summary =
            run_demand_and_render(&healthy(), &[cafe()], &MapConfig::default(), &output).unwrap();

        assert_eq!(summary.tracts, 2);
        assert_eq!(summary.income_rows, 2);
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("Neighborhood Cafe"));
    }

    #[test]
    fn test_income_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("map.html");
        let source = FakeDemand {
            income: Err("invalid key"),
            ..healthy()
        };

        assert!(run_demand_and_render(&source, &[cafe()], &MapConfig::default(), &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_boundary_failure_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("map.html");
        std::fs::write(&output, "previous run").unwrap();
        let source = FakeDemand {
            boundaries: Err("archive unavailable"),
            ..healthy()
        };

        assert!(run_demand_and_render(&source, &[cafe()], &MapConfig::default(), &output).is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run");
    }

    #[test]
    fn test_empty_join_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("map.html");
        let source = FakeDemand {
            income: Ok(vec![record("143", "777777", Some(50_000.0))]),
            ..healthy()
        };

        assert!(run_demand_and_render(&source, &[cafe()], &MapConfig::default(), &output).is_err());
        assert!(!output.exists());
    }
}

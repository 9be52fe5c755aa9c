use anyhow::{Context, Result};
use std::time::Duration;
use thiserror::Error;

use crate::config::CensusConfig;
use crate::domain::{IncomeRecord, TractKey};

/// Problems with the shape of an ACS response
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Census API returned status {status}: {excerpt}")]
    Status { status: u16, excerpt: String },
    #[error("Census response is not a JSON table: {0}")]
    NotATable(String),
    #[error("Census response is missing the {0} column")]
    MissingColumn(String),
    #[error("Census response row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Build the ACS 5-year query URL for tract-level estimates
pub fn build_acs_url(config: &CensusConfig) -> String {
    format!(
        "{base}/{year}/acs/acs5?get=NAME,{var}&for=tract:*&in=state:{state}&in=county:{counties}&key={key}",
        base = config.api_url.trim_end_matches('/'),
        year = config.year,
        var = config.variable,
        state = config.state,
        counties = config.counties.join(","),
        key = config.api_key,
    )
}

/// Fetch the income table for every tract in the configured counties
pub fn fetch_income_table(config: &CensusConfig) -> Result<Vec<IncomeRecord>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(build_acs_url(config))
        .send()
        .context("Failed to send request to Census API")?;

    let status = response.status();
    let body = response
        .text()
        .context("Failed to read Census API response body")?;

    if !status.is_success() {
        return Err(CensusError::Status {
            status: status.as_u16(),
            excerpt: excerpt(&body),
        }
        .into());
    }

    parse_income_table(&body, &config.variable)
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect::<String>().trim().to_string()
}

/// Parse the ACS "array of rows" JSON, header first.
///
/// Cells may be strings or null. Rows whose income is not a number come back
/// with `income: None`; filtering is the caller's job.
pub fn parse_income_table(body: &str, variable: &str) -> Result<Vec<IncomeRecord>> {
    let rows: Vec<Vec<Option<String>>> =
        serde_json::from_str(body).map_err(|_| CensusError::NotATable(excerpt(body)))?;

    let mut rows = rows.into_iter();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| CensusError::NotATable("empty response".to_string()))?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();

    let column = |name: &str| -> Result<usize, CensusError> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CensusError::MissingColumn(name.to_string()))
    };
    let name_idx = column("NAME")?;
    let income_idx = column(variable)?;
    let county_idx = column("county")?;
    let tract_idx = column("tract")?;

    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.len() != header.len() {
            return Err(CensusError::RaggedRow {
                row: i + 1,
                found: row.len(),
                expected: header.len(),
            }
            .into());
        }
        let cell = |idx: usize| row[idx].clone().unwrap_or_default();

        records.push(IncomeRecord {
            name: cell(name_idx),
            key: TractKey::new(cell(county_idx), cell(tract_idx)),
            income: row[income_idx]
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        });
    }

    Ok(records)
}

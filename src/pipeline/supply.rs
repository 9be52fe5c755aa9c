use anyhow::{Context, Result, bail};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::api::{PlaceArea, fetch_amenities, geocode_place};
use crate::config::{NominatimConfig, OverpassConfig};
use crate::domain::PointOfInterest;
use crate::domain::poi::city_label;
use crate::osm::parse_points_of_interest;

/// Something that can list points of interest for a named place
pub trait PoiSource {
    fn fetch(&self, place: &str) -> Result<Vec<PointOfInterest>>;
}

/// Collect points of interest for every place, skipping places that fail.
///
/// A failed place is logged and contributes nothing; there is no retry.
pub fn collect_supply<S: PoiSource + ?Sized>(source: &S, places: &[String]) -> Vec<PointOfInterest> {
    let mut all = Vec::new();

    for place in places {
        match source.fetch(place) {
            Ok(pois) => {
                log::debug!("{}: {} points of interest", place, pois.len());
                all.extend(pois);
            }
            Err(e) => {
                log::warn!("Could not fetch for {}: {:#}", place, e);
            }
        }
    }

    all
}

/// Geocoding outcome per place, failures included, so each place is looked
/// up at most once per run
#[derive(Debug, Default)]
pub struct AreaCache {
    areas: RefCell<HashMap<String, Option<PlaceArea>>>,
}

impl AreaCache {
    fn cached(&self, place: &str) -> Option<Option<PlaceArea>> {
        self.areas.borrow().get(place).cloned()
    }

    pub fn get_or_resolve<F>(&self, place: &str, geocode: F) -> Result<PlaceArea>
    where
        F: FnOnce(&str) -> Result<PlaceArea>,
    {
        match self.cached(place) {
            Some(Some(area)) => return Ok(area),
            Some(None) => bail!("Geocoding already failed for {}", place),
            None => {}
        }
        let result = geocode(place);
        self.areas
            .borrow_mut()
            .insert(place.to_string(), result.as_ref().ok().cloned());
        result
    }

    /// Areas for every place that resolves, in order.
    ///
    /// New failures are logged; places that already failed are skipped silently.
    pub fn resolve_all<F>(&self, places: &[String], mut geocode: F) -> Vec<PlaceArea>
    where
        F: FnMut(&str) -> Result<PlaceArea>,
    {
        places
            .iter()
            .filter_map(|place| {
                if let Some(cached) = self.cached(place) {
                    return cached;
                }
                match self.get_or_resolve(place, &mut geocode) {
                    Ok(area) => Some(area),
                    Err(e) => {
                        log::warn!("{:#}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Nominatim + Overpass backed source. Geocoded areas are cached so the
/// highway stage can reuse them without another round of geocoding.
pub struct OsmSource {
    nominatim: NominatimConfig,
    overpass: OverpassConfig,
    areas: AreaCache,
}

impl OsmSource {
    pub fn new(nominatim: NominatimConfig, overpass: OverpassConfig) -> Self {
        Self {
            nominatim,
            overpass,
            areas: AreaCache::default(),
        }
    }

    pub fn overpass(&self) -> &OverpassConfig {
        &self.overpass
    }

    fn geocode(&self, place: &str) -> Result<PlaceArea> {
        geocode_place(place, &self.nominatim).with_context(|| format!("Failed to geocode {}", place))
    }

    /// Areas for every place that resolves, reusing the supply stage's lookups
    pub fn resolve_all(&self, places: &[String]) -> Vec<PlaceArea> {
        self.areas.resolve_all(places, |place| self.geocode(place))
    }
}

impl PoiSource for OsmSource {
    fn fetch(&self, place: &str) -> Result<Vec<PointOfInterest>> {
        let area = self.areas.get_or_resolve(place, |p| self.geocode(p))?;
        let response = fetch_amenities(
            &area,
            &self.overpass.poi_key,
            &self.overpass.poi_value,
            &self.overpass,
        )
        .with_context(|| format!("Failed to fetch features for {}", place))?;

        Ok(parse_points_of_interest(&response, city_label(place)))
    }
}

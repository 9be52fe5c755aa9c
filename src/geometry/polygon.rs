use geo::{Centroid, Coord, LineString, MultiPolygon, Polygon};
use shapefile::PolygonRing;

/// Convert a shapefile polygon into a geo MultiPolygon
///
/// Shapefiles store each outer ring followed by its holes, so every inner
/// ring attaches to the most recent outer ring. Inner rings that appear
/// before any outer ring are dropped.
pub fn shp_to_geo(p: &shapefile::Polygon) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in p.rings() {
        let ls = ring_to_linestring(ring.points());
        match ring {
            PolygonRing::Outer(_) => {
                if let Some(ext) = exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(ls);
            }
            PolygonRing::Inner(_) => {
                if exterior.is_some() {
                    holes.push(ls);
                }
            }
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

fn ring_to_linestring(points: &[shapefile::Point]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = points.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied())
        && first != last
    {
        coords.push(first);
    }
    LineString(coords)
}

/// Centroid of a closed ring of (lat, lon) points, returned as (lat, lon)
///
/// Falls back to the vertex mean for degenerate (zero-area) rings.
pub fn ring_centroid(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let ring: LineString<f64> = points
        .iter()
        .map(|&(lat, lon)| geo::coord! { x: lon, y: lat })
        .collect();
    let polygon = Polygon::new(ring.clone(), vec![]);

    polygon
        .centroid()
        .or_else(|| ring.centroid())
        .map(|c| (c.y(), c.x()))
}

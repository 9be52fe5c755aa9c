//! Sequential color binning for the income choropleth.

/// ColorBrewer YlGn, 6 classes
pub const YL_GN_6: [&str; 6] = [
    "#ffffcc", "#d9f0a3", "#addd8e", "#78c679", "#31a354", "#006837",
];

/// Equal-interval bins over a value range, one color per bin
#[derive(Debug, Clone)]
pub struct ColorScale {
    /// `colors.len() + 1` ascending bin edges
    edges: Vec<f64>,
    colors: &'static [&'static str],
}

impl ColorScale {
    /// Split `[min, max]` of `values` into `colors.len()` equal bins.
    ///
    /// A constant series is widened by 0.5 on each side so it still gets a
    /// non-empty range. Returns `None` for no finite values.
    pub fn equal_interval(values: &[f64], colors: &'static [&'static str]) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
        let (min, max) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };

        let n = colors.len();
        let step = (max - min) / n as f64;
        let mut edges: Vec<f64> = (0..n).map(|i| min + step * i as f64).collect();
        edges.push(max);

        Some(Self { edges, colors })
    }

    /// (color, lower edge, upper edge) for every bin, lowest first
    pub fn bins(&self) -> impl Iterator<Item = (&'static str, f64, f64)> + '_ {
        self.colors
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&c, w)| (c, w[0], w[1]))
    }

    /// Bins are `[lower, upper)` except the last, which includes `max`.
    /// Out-of-range values clamp to the nearest end.
    pub fn color_for(&self, value: f64) -> &'static str {
        let last = self.colors.len() - 1;
        let idx = self.edges[1..]
            .iter()
            .position(|&upper| value < upper)
            .unwrap_or(last)
            .min(last);
        self.colors[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_interval_edges() {
        let scale = ColorScale::equal_interval(&[20_000.0, 80_000.0, 50_000.0], &YL_GN_6).unwrap();
        let expected = [20_000.0, 30_000.0, 40_000.0, 50_000.0, 60_000.0, 70_000.0, 80_000.0];
        for (got, want) in scale.edges.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6);
        }
        assert_eq!(scale.bins().count(), 6);
    }

    #[test]
    fn test_color_for() {
        let scale = ColorScale::equal_interval(&[20_000.0, 80_000.0], &YL_GN_6).unwrap();
        assert_eq!(scale.color_for(20_000.0), "#ffffcc");
        assert_eq!(scale.color_for(29_999.0), "#ffffcc");
        assert_eq!(scale.color_for(30_000.0), "#d9f0a3");
        assert_eq!(scale.color_for(80_000.0), "#006837");
        assert_eq!(scale.color_for(1_000_000.0), "#006837");
        assert_eq!(scale.color_for(0.0), "#ffffcc");
    }

    #[test]
    fn test_constant_series() {
        let scale = ColorScale::equal_interval(&[50_000.0, 50_000.0], &YL_GN_6).unwrap();
        assert_eq!(scale.edges[0], 49_999.5);
        assert_eq!(scale.edges[6], 50_000.5);
    }

    #[test]
    fn test_empty_values() {
        assert!(ColorScale::equal_interval(&[], &YL_GN_6).is_none());
        assert!(ColorScale::equal_interval(&[f64::NAN], &YL_GN_6).is_none());
    }
}

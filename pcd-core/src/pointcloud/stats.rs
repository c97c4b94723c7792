use std::collections::BTreeMap;

use serde::{ser::SerializeMap as _, Deserialize, Serialize, Serializer};

use crate::pointcloud::{buffer::UnpackedPoints, schema::SchemaPlan};

pub type StatsResult = BTreeMap<String, Histogram>;

/// Which histograms to collect by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub elevation_key: String,
    /// Column holding elevation after axis normalization.
    pub elevation_column: usize,
    pub elevation_bin_width: f64,
    pub color_bin_width: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            elevation_key: "z".to_string(),
            elevation_column: 1,
            elevation_bin_width: 10.0,
            color_bin_width: 10.0,
        }
    }
}

/// Color fields looked up by exact schema name, and the stats key each one is reported under.
pub const COLOR_CHANNELS: [(&str, &str); 3] = [("Red", "red"), ("Green", "green"), ("Blue", "blue")];

#[derive(Debug, Clone, PartialEq)]
pub struct StatSpec {
    pub key: String,
    pub column: usize,
    pub bin_width: f64,
}

impl StatSpec {
    pub fn new(key: impl Into<String>, column: usize, bin_width: f64) -> Self {
        Self {
            key: key.into(),
            column,
            bin_width,
        }
    }

    /// Elevation is always collected. Colors are collected only when the schema names all of
    /// `Red`, `Green` and `Blue`.
    pub fn defaults(plan: &SchemaPlan, config: &StatsConfig) -> Vec<StatSpec> {
        let mut specs = vec![StatSpec::new(
            config.elevation_key.clone(),
            config.elevation_column,
            config.elevation_bin_width,
        )];

        let columns: Vec<Option<usize>> = COLOR_CHANNELS
            .iter()
            .map(|(field, _)| plan.column_of(field))
            .collect();
        if columns.iter().all(Option::is_some) {
            for ((_, key), column) in COLOR_CHANNELS.iter().zip(columns.into_iter().flatten()) {
                specs.push(StatSpec::new(*key, column, config.color_bin_width));
            }
        }

        specs
    }
}

/// `floor(value / bin_width)`; bins are labelled by their start, `index * bin_width`.
/// `None` when the index is not finite or does not fit an `i64`.
pub fn bin_index(value: f32, bin_width: f64) -> Option<i64> {
    let scaled = (value as f64 / bin_width).floor();
    (-I64_BOUND..I64_BOUND)
        .contains(&scaled)
        .then_some(scaled as i64)
}

// 2^63, exact in f64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

// Decimal places that represent `bin_width` exactly, so labels of fractional widths do not
// pick up binary rounding noise.
fn label_precision(bin_width: f64) -> usize {
    (0..=15)
        .find(|&places| {
            let scaled = bin_width * 10f64.powi(places as i32);
            (scaled - scaled.round()).abs() <= scaled.abs() * 1e-9
        })
        .unwrap_or(15)
}

/// Fixed-width value counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bin_width: f64,
    counts: BTreeMap<i64, u64>,
}

impl Histogram {
    pub fn new(bin_width: f64) -> Self {
        Self {
            bin_width,
            counts: BTreeMap::new(),
        }
    }

    /// Returns false for values that do not land in a finite bin.
    pub fn add(&mut self, value: f32) -> bool {
        match bin_index(value, self.bin_width) {
            Some(index) => {
                *self.counts.entry(index).or_insert(0) += 1;
                true
            }
            None => false,
        }
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn count(&self, bin_start: f64) -> u64 {
        let index = (bin_start / self.bin_width).round() as i64;
        self.counts.get(&index).copied().unwrap_or(0)
    }

    /// The bin start as written in JSON: `20`, `-10`, `0.3`.
    pub fn bin_label(&self, index: i64) -> String {
        let start = index as f64 * self.bin_width;
        let fixed = format!("{:.*}", label_precision(self.bin_width), start);
        let trimmed = if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.')
        } else {
            fixed.as_str()
        };
        match trimmed {
            "-0" => "0".to_string(),
            label => label.to_string(),
        }
    }

    /// (bin start, count) in ascending order.
    pub fn bins(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.counts
            .iter()
            .map(|(&index, &count)| (index as f64 * self.bin_width, count))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn merge(&mut self, other: Histogram) {
        for (index, count) in other.counts {
            *self.counts.entry(index).or_insert(0) += count;
        }
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (&index, count) in &self.counts {
            map.serialize_entry(&self.bin_label(index), count)?;
        }
        map.end()
    }
}

/// Bins every point once per spec. Keys show up only for specs that binned at least one value.
pub fn collect_stats(points: &UnpackedPoints, specs: &[StatSpec]) -> StatsResult {
    let field_count = points.field_count();
    let specs: Vec<&StatSpec> = specs
        .iter()
        .filter(|spec| {
            let in_range = spec.column < field_count;
            if !in_range && !points.is_empty() {
                log::warn!(
                    "stats '{}' skipped: column {} not in {field_count} columns",
                    spec.key,
                    spec.column
                );
            }
            in_range
        })
        .collect();

    let mut histograms: Vec<Histogram> = specs
        .iter()
        .map(|spec| Histogram::new(spec.bin_width))
        .collect();

    for point in points.points() {
        for (spec, histogram) in specs.iter().zip(histograms.iter_mut()) {
            histogram.add(point[spec.column]);
        }
    }

    let mut result = StatsResult::new();
    for (spec, histogram) in specs.into_iter().zip(histograms) {
        if histogram.is_empty() {
            continue;
        }
        match result.get_mut(&spec.key) {
            Some(existing) => existing.merge(histogram),
            None => {
                result.insert(spec.key.clone(), histogram);
            }
        }
    }
    result
}

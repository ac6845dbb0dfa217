use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sample of one metric on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub date: String,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

/// A date plus whichever metrics were sampled on it.
///
/// Serializes flat (`{"date": "2026-01-05", "weight": 71.2}`) so chart
/// consumers can key on field names. A missing field means the metric was
/// not sampled that day, which is not the same as a zero sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergedPoint {
    pub date: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

impl MergedPoint {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }
}

/// Merges named date series into one ascending, union-keyed series.
///
/// Points of different series sharing a date land on the same record. A date
/// repeated inside one series keeps the last value seen. Every constant is
/// attached to every produced record; constants never create records.
pub fn merge<'a, I>(series: I, constants: &[(&str, f64)]) -> Vec<MergedPoint>
where
    I: IntoIterator<Item = (&'a str, &'a [MetricPoint])>,
{
    let mut by_date: BTreeMap<&'a str, MergedPoint> = BTreeMap::new();

    for (name, points) in series {
        for point in points {
            by_date
                .entry(point.date.as_str())
                .or_insert_with(|| MergedPoint {
                    date: point.date.clone(),
                    fields: BTreeMap::new(),
                })
                .fields
                .insert(name.to_string(), point.value);
        }
    }

    by_date
        .into_values()
        .map(|mut record| {
            for (name, value) in constants {
                record.fields.insert((*name).to_string(), *value);
            }
            record
        })
        .collect()
}

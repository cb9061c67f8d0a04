//! Trend fitting and outlier flagging over ordered historical records.
//!
//! None of these functions fail. Degenerate input yields the flat
//! [`Trend::FLAT`] line or no flagged points. Values are read from each record
//! through an accessor returning `None` for anything that is not a number.
//!
//! Note the two policies differ on bad values: the regression refuses to fit
//! as soon as one is found, while anomaly detection leaves them out of the
//! statistics and never flags them.

pub mod auxiliary;

pub use auxiliary::numeric_field;

use serde::Serialize;

pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub const FLAT: Trend = Trend {
        slope: 0.0,
        intercept: 0.0,
    };

    pub fn is_flat(&self) -> bool {
        *self == Self::FLAT
    }

    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares with the record index as x.
pub fn linear_regression<T, F>(series: &[T], value: F) -> Trend
where
    F: Fn(&T) -> Option<f64>,
{
    let mut ys = Vec::with_capacity(series.len());
    for record in series {
        match value(record) {
            Some(y) => ys.push(y),
            None => return Trend::FLAT,
        }
    }
    if ys.len() < 2 {
        return Trend::FLAT;
    }

    let n = ys.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    Trend { slope, intercept }
}

/// The fitted line evaluated one step past the last record.
pub fn predict_next_value<T, F>(series: &[T], value: F) -> f64
where
    F: Fn(&T) -> Option<f64>,
{
    linear_regression(series, value).at(series.len() as f64)
}

/// A record of the input series with its anomaly flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flagged<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(rename = "isAnomaly")]
    pub is_anomaly: bool,
}

/// Flags records whose value lies more than `threshold` population standard
/// deviations away from the mean of all numeric values.
pub fn detect_anomalies<T, F>(series: Vec<T>, value: F, threshold: f64) -> Vec<Flagged<T>>
where
    F: Fn(&T) -> Option<f64>,
{
    let values: Vec<f64> = series.iter().filter_map(&value).collect();
    let stats = if values.is_empty() {
        None
    } else {
        let mean = statistical::mean(&values);
        let stddev = statistical::population_standard_deviation(&values, Some(mean));
        Some((mean, stddev))
    };

    series
        .into_iter()
        .map(|record| {
            let is_anomaly = match (stats, value(&record)) {
                (Some((mean, stddev)), Some(v)) => (v - mean).abs() > threshold * stddev,
                _ => false,
            };
            Flagged { record, is_anomaly }
        })
        .collect()
}

/// Fitted trend, next value and flagged records of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis<T> {
    pub trend: Trend,
    pub next_value: f64,
    pub points: Vec<Flagged<T>>,
}

pub fn analyze<T, F>(series: Vec<T>, value: F, threshold: f64) -> Analysis<T>
where
    F: Fn(&T) -> Option<f64>,
{
    let trend = linear_regression(&series, &value);
    let next_value = trend.at(series.len() as f64);
    Analysis {
        trend,
        next_value,
        points: detect_anomalies(series, value, threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn records(field: &str, values: &[f64]) -> Vec<Value> {
        values
            .iter()
            .map(|v| {
                let mut record = Map::new();
                record.insert(field.to_string(), json!(v));
                Value::Object(record)
            })
            .collect()
    }

    #[test]
    fn regression_on_empty_series_is_flat() {
        let empty: Vec<Value> = vec![];
        assert_eq!(linear_regression(&empty, numeric_field("totalFlowRate")), Trend::FLAT);
    }

    #[test]
    fn regression_stops_on_first_bad_value() {
        let bad = vec![json!({"totalFlowRate": "bad"})];
        assert_eq!(linear_regression(&bad, numeric_field("totalFlowRate")), Trend::FLAT);

        let mut series = records("totalFlowRate", &[1.0, 2.0, 3.0, 4.0]);
        series.insert(2, json!({"totalFlowRate": null}));
        assert!(linear_regression(&series, numeric_field("totalFlowRate")).is_flat());
    }

    #[test]
    fn regression_on_single_point_is_flat() {
        let one = records("metricTons", &[42.0]);
        assert_eq!(linear_regression(&one, numeric_field("metricTons")), Trend::FLAT);
        assert_eq!(predict_next_value(&one, numeric_field("metricTons")), 0.0);
    }

    #[test]
    fn regression_fits_a_line() {
        let series = records("metricTons", &[3.0, 5.0, 7.0, 9.0]);
        let trend = linear_regression(&series, numeric_field("metricTons"));
        assert_eq!(trend, Trend { slope: 2.0, intercept: 3.0 });
        assert_eq!(predict_next_value(&series, numeric_field("metricTons")), 11.0);
    }

    #[test]
    fn regression_over_typed_records() {
        let points = [(0, 10.0), (1, 8.0), (2, 6.0)];
        let trend = linear_regression(&points, |p| Some(p.1));
        assert_eq!(trend.slope, -2.0);
        assert_eq!(trend.intercept, 10.0);
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        let series = records("metricTons", &[250.5; 8]);
        let flagged = detect_anomalies(series, numeric_field("metricTons"), DEFAULT_ANOMALY_THRESHOLD);
        assert_eq!(flagged.len(), 8);
        assert!(flagged.iter().all(|f| !f.is_anomaly));
    }

    #[test]
    fn outlier_is_flagged() {
        let series = records("metricTons", &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]);
        let flagged = detect_anomalies(series, numeric_field("metricTons"), DEFAULT_ANOMALY_THRESHOLD);
        let marks: Vec<bool> = flagged.iter().map(|f| f.is_anomaly).collect();
        assert_eq!(marks.iter().filter(|m| **m).count(), 1);
        assert!(marks[9]);
    }

    #[test]
    fn bad_values_are_left_out_of_the_statistics() {
        let series = vec![
            json!({"metricTons": 10.0}),
            json!({"metricTons": "n/a"}),
            json!({"metricTons": 10.0}),
        ];
        let flagged = detect_anomalies(series, numeric_field("metricTons"), 2.0);
        assert!(flagged.iter().all(|f| !f.is_anomaly));
    }

    #[test]
    fn all_bad_values_flag_nothing() {
        let series = vec![json!({"metricTons": "x"}), json!({})];
        let flagged = detect_anomalies(series, numeric_field("metricTons"), 2.0);
        assert_eq!(flagged.len(), 2);
        assert!(flagged.iter().all(|f| !f.is_anomaly));
    }

    #[test]
    fn analysis_combines_the_three() {
        let series = records("totalFlowRate", &[100.0, 110.0, 120.0, 130.0]);
        let analysis = analyze(series, numeric_field("totalFlowRate"), 2.0);
        assert_eq!(analysis.trend, Trend { slope: 10.0, intercept: 100.0 });
        assert_eq!(analysis.next_value, 140.0);
        assert_eq!(analysis.points.len(), 4);
        assert!(analysis.points.iter().all(|p| !p.is_anomaly));
    }

    #[test]
    fn flagged_records_keep_their_fields() {
        let series = vec![json!({"date": "2025-01-01", "metricTons": 5.0})];
        let flagged = detect_anomalies(series, numeric_field("metricTons"), 2.0);
        let out = serde_json::to_value(&flagged).unwrap();
        assert_eq!(out, json!([{"date": "2025-01-01", "metricTons": 5.0, "isAnomaly": false}]));
    }
}

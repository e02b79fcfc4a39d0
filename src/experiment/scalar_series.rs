//! Scalar Series - one tagged metric over training steps

use serde::{Deserialize, Serialize};

/// A single `(step, value)` point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScalarPoint {
    /// Step of the event the value was logged in.
    pub step: i64,
    /// Logged value.
    pub value: f64,
}

/// Values of one tag, indexed by step.
///
/// Points keep the order they were encountered in the event log. Steps are
/// usually increasing, but neither sorted nor deduplicated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalarSeries {
    tag: String,
    points: Vec<ScalarPoint>,
}

impl ScalarSeries {
    /// Create an empty series for `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            points: Vec::new(),
        }
    }

    /// Append a point.
    pub fn push(&mut self, step: i64, value: f64) {
        self.points.push(ScalarPoint { step, value });
    }

    /// Get the tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no point was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in log order.
    #[must_use]
    pub fn points(&self) -> &[ScalarPoint] {
        &self.points
    }

    /// Step index of the series.
    #[must_use]
    pub fn steps(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.step).collect()
    }

    /// Values of the series.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// First value logged at `step`.
    #[must_use]
    pub fn value_at(&self, step: i64) -> Option<f64> {
        self.points.iter().find(|p| p.step == step).map(|p| p.value)
    }

    /// Iterate over points.
    pub fn iter(&self) -> std::slice::Iter<'_, ScalarPoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a ScalarSeries {
    type Item = &'a ScalarPoint;
    type IntoIter = std::slice::Iter<'a, ScalarPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_series_new() {
        let series = ScalarSeries::new("loss");
        assert_eq!(series.tag(), "loss");
        assert!(series.is_empty());
    }

    #[test]
    fn test_scalar_series_keeps_log_order() {
        let mut series = ScalarSeries::new("loss");
        series.push(2, 0.4);
        series.push(1, 0.9);
        series.push(2, 0.3);
        assert_eq!(series.steps(), vec![2, 1, 2]);
        assert_eq!(series.value_at(2), Some(0.4));
        assert_eq!(series.value_at(7), None);
    }

    #[test]
    fn test_scalar_series_serialize() {
        let mut series = ScalarSeries::new("acc");
        series.push(0, 0.5);
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"{"tag":"acc","points":[{"step":0,"value":0.5}]}"#);
    }
}

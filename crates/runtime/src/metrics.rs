use std::collections::BTreeMap;

/// Per-layer counters, gauges and value summaries.
///
/// Keys are static strings so recording never allocates on the frame path, and
/// the maps are ordered so `snapshot()` output is stable across runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
    summaries: BTreeMap<&'static str, Summary>,
}

/// Running count/min/max/mean of observed values.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Summary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    sum: f64,
}

impl Summary {
    pub fn observe(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
    pub summaries: Vec<(&'static str, Summary)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn incr(&mut self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn observe(&mut self, name: &'static str, value: f64) {
        self.summaries.entry(name).or_default().observe(value);
    }

    pub fn summary(&self, name: &str) -> Option<Summary> {
        self.summaries.get(name).copied()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
            summaries: self.summaries.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Named run metrics, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters(BTreeMap<String, i64>);

impl Counters {
    pub fn add(&mut self, name: &str, x: i64) {
        *self.0.entry(name.to_string()).or_insert(0) += x;
    }

    pub fn set(&mut self, name: &str, x: i64) {
        self.0.insert(name.to_string(), x);
    }

    /// Value of `name`, zero if it was never recorded.
    pub fn get(&self, name: &str) -> i64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.0.iter().map(|(name, &x)| (name.as_str(), x))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Wall-clock budget and counters shared by every phase of one run.
#[derive(Debug)]
pub struct RunContext {
    start: Instant,
    budget: Duration,
    counters: Counters,
}

impl RunContext {
    pub fn new(budget: Duration) -> Self {
        Self { start: Instant::now(), budget, counters: Counters::default() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.time_limit())
    }

    /// Starts the clock again. Counters are kept.
    pub fn restart(&mut self) {
        self.start = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub fn time_exceeded(&self) -> bool {
        self.elapsed() >= self.budget
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub fn into_counters(self) -> Counters {
        self.counters
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counters() {
        let mut counters = Counters::default();
        assert_eq!(counters.get("neg_iterations"), 0);
        counters.add("neg_iterations", 3);
        counters.add("neg_iterations", 4);
        counters.set("clusters", 2);
        assert_eq!(counters.get("neg_iterations"), 7);
        assert!(counters.contains("clusters"));
        let names: Vec<_> = counters.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["clusters", "neg_iterations"]);
    }

    #[test]
    fn budget() {
        let ctx = RunContext::new(Duration::ZERO);
        assert!(ctx.time_exceeded());
        assert_eq!(ctx.remaining(), Duration::ZERO);

        let ctx = RunContext::new(Duration::from_secs(3600));
        assert!(!ctx.time_exceeded());
        assert!(ctx.remaining() > Duration::from_secs(3500));
    }
}

//! Selectivity estimation: `IntHistogram` and `StringHistogram` (spec
//! §4.6).
//!
//! Grounded on the teacher's cost-model intent (`harborgrid-justin-rusty-db`'s
//! `optimizer_pro/cost_model.rs` was used only to confirm the shape of an
//! equi-width histogram estimator; this crate's own arithmetic follows the
//! specification's corrected formula — see the `(v - min) / width`
//! precedence note below, which fixes an operator-precedence bug present in
//! one of the source variants this was distilled from).

use crate::types::Op;

/// Equi-width histogram over `[min, max]`, used to estimate a predicate's
/// selectivity against a column without scanning it.
pub struct IntHistogram {
    n_buckets: usize,
    min: i32,
    max: i32,
    width: i32,
    buckets: Vec<u64>,
    ntups: u64,
}

impl IntHistogram {
    pub fn new(n_buckets: usize, min: i32, max: i32) -> Self {
        assert!(n_buckets > 0, "a histogram needs at least one bucket");
        assert!(max >= min, "max must be >= min");
        let width = std::cmp::max(1, (max - min + 1) / n_buckets as i32);
        IntHistogram {
            n_buckets,
            min,
            max,
            width,
            buckets: vec![0u64; n_buckets],
            ntups: 0,
        }
    }

    /// Intentionally `(v - min) / width`, not `v - min / width`: the
    /// specification fixes an operator-precedence bug from the original.
    fn bucket_index(&self, v: i32) -> usize {
        let idx = (v - self.min) / self.width;
        idx.clamp(0, self.n_buckets as i32 - 1) as usize
    }

    pub fn add_value(&mut self, v: i32) {
        if v < self.min || v > self.max {
            return;
        }
        let idx = self.bucket_index(v);
        self.buckets[idx] += 1;
        self.ntups += 1;
    }

    pub fn ntups(&self) -> u64 {
        self.ntups
    }

    fn equals_selectivity(&self, v: i32) -> f64 {
        if v < self.min || v > self.max || self.ntups == 0 {
            return 0.0;
        }
        let idx = self.bucket_index(v);
        (self.buckets[idx] as f64 / self.width as f64) / self.ntups as f64
    }

    fn greater_than_selectivity(&self, v: i32) -> f64 {
        if self.ntups == 0 {
            return 0.0;
        }
        if v <= self.min {
            return 1.0;
        }
        if v >= self.max {
            return 0.0;
        }
        let idx = self.bucket_index(v);
        let bf = self.buckets[idx] as f64 / self.ntups as f64;
        let bucket_right_edge = (idx as i32 + 1) * self.width + self.min;
        let part_right = (bucket_right_edge - v - 1) as f64 / self.width as f64;
        let rest: u64 = self.buckets[idx + 1..].iter().sum();
        bf * part_right + rest as f64 / self.ntups as f64
    }

    pub fn estimate_selectivity(&self, op: Op, v: i32) -> f64 {
        let sel = match op {
            Op::Equals => self.equals_selectivity(v),
            Op::NotEquals => 1.0 - self.equals_selectivity(v),
            Op::GreaterThan => self.greater_than_selectivity(v),
            Op::GreaterThanOrEq => self.equals_selectivity(v) + self.greater_than_selectivity(v),
            Op::LessThan => 1.0 - (self.equals_selectivity(v) + self.greater_than_selectivity(v)),
            Op::LessThanOrEq => 1.0 - self.greater_than_selectivity(v),
            // A `Like` predicate has no histogram-backed estimate; fall
            // back to the average per-value selectivity.
            Op::Like => self.avg_selectivity(),
        };
        sel.clamp(0.0, 1.0)
    }

    /// Mean of `EQUALS` selectivity over each bucket's midpoint; `1/nBuckets`
    /// when the histogram has seen no values (uniform prior).
    pub fn avg_selectivity(&self) -> f64 {
        if self.ntups == 0 {
            return 1.0 / self.n_buckets as f64;
        }
        let total: f64 = (0..self.n_buckets)
            .map(|i| {
                let midpoint = self.min + i as i32 * self.width + self.width / 2;
                self.equals_selectivity(midpoint.clamp(self.min, self.max))
            })
            .sum();
        total / self.n_buckets as f64
    }
}

/// Reduces a string to a 4-byte big-endian integer code (first four
/// characters, `\0`-padded/truncated) and delegates to an `IntHistogram`
/// spanning the full `i32` range.
pub struct StringHistogram {
    inner: IntHistogram,
}

impl StringHistogram {
    pub fn new(n_buckets: usize) -> Self {
        StringHistogram {
            inner: IntHistogram::new(n_buckets, i32::MIN, i32::MAX),
        }
    }

    pub fn encode(s: &str) -> i32 {
        let bytes = s.as_bytes();
        let mut buf = [0u8; 4];
        for i in 0..4 {
            buf[i] = *bytes.get(i).unwrap_or(&0);
        }
        i32::from_be_bytes(buf)
    }

    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(Self::encode(s));
    }

    pub fn estimate_selectivity(&self, op: Op, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, Self::encode(s))
    }

    pub fn ntups(&self) -> u64 {
        self.inner.ntups()
    }

    pub fn avg_selectivity(&self) -> f64 {
        self.inner.avg_selectivity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_sum_law() {
        let mut h = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            h.add_value(v);
        }
        assert_eq!(h.ntups(), 100);
    }

    #[test]
    fn spec_scenario_selectivity_bounds() {
        let mut h = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            h.add_value(v);
        }
        let eq = h.estimate_selectivity(Op::Equals, 50);
        let lt = h.estimate_selectivity(Op::LessThan, 50);
        let gt = h.estimate_selectivity(Op::GreaterThan, 50);
        assert!((eq - 0.01).abs() < 0.005, "eq = {}", eq);
        assert!((lt - 0.49).abs() < 0.02, "lt = {}", lt);
        assert!((gt - 0.50).abs() < 0.02, "gt = {}", gt);
    }

    #[test]
    fn not_equals_complements_equals() {
        let mut h = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            h.add_value(v);
        }
        let eq = h.estimate_selectivity(Op::Equals, 37);
        let neq = h.estimate_selectivity(Op::NotEquals, 37);
        assert!((eq + neq - 1.0).abs() < 1e-9);
    }

    #[test]
    fn values_outside_range_are_ignored() {
        let mut h = IntHistogram::new(5, 1, 10);
        h.add_value(0);
        h.add_value(11);
        assert_eq!(h.ntups(), 0);
    }

    #[test]
    fn every_selectivity_is_in_unit_interval() {
        let mut h = IntHistogram::new(4, 1, 20);
        for v in 1..=20 {
            h.add_value(v);
        }
        for op in [
            Op::Equals,
            Op::NotEquals,
            Op::LessThan,
            Op::LessThanOrEq,
            Op::GreaterThan,
            Op::GreaterThanOrEq,
        ] {
            for v in 0..22 {
                let sel = h.estimate_selectivity(op, v);
                assert!((0.0..=1.0).contains(&sel), "{:?} {} -> {}", op, v, sel);
            }
        }
    }

    #[test]
    fn string_histogram_round_trips_through_encoding() {
        let mut h = StringHistogram::new(10);
        h.add_value("apple");
        h.add_value("apricot");
        h.add_value("banana");
        assert_eq!(h.ntups(), 3);
        let sel = h.estimate_selectivity(Op::Equals, "apple");
        assert!((0.0..=1.0).contains(&sel));
    }
}

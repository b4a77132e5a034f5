//! Aggregation helpers behind every dashboard card.
//!
//! One rounding policy applies engine-wide: percentages use the
//! largest-remainder method at one decimal place, so the displayed
//! values always sum to exactly 100.0 for a non-empty set and two cards
//! over the same data can never disagree.

/// Counts per state over a collection of records.
///
/// Preserves insertion order so rollups render in a stable sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRollup {
    counts: Vec<(String, u64)>,
    total: u64,
}

impl StatusRollup {
    /// Build a rollup from per-state counts.
    #[must_use]
    pub fn from_counts<S: Into<String>>(counts: impl IntoIterator<Item = (S, u64)>) -> Self {
        let counts: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(state, count)| (state.into(), count))
            .collect();
        let total = counts.iter().map(|(_, count)| count).sum();
        Self { counts, total }
    }

    /// Total records across all states.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Count for one state; zero when the state was not observed.
    #[must_use]
    pub fn count(&self, state: &str) -> u64 {
        self.counts
            .iter()
            .find(|(s, _)| s == state)
            .map_or(0, |(_, count)| *count)
    }

    /// The per-state counts in insertion order.
    #[must_use]
    pub fn counts(&self) -> &[(String, u64)] {
        &self.counts
    }

    /// Percentage per state, one decimal place, largest-remainder method.
    ///
    /// For a non-empty set the values sum to exactly 100.0. An empty set
    /// yields 0.0 for every state rather than NaN.
    #[must_use]
    pub fn percentages(&self) -> Vec<(String, f64)> {
        if self.total == 0 {
            return self
                .counts
                .iter()
                .map(|(state, _)| (state.clone(), 0.0))
                .collect();
        }

        // Work in tenths of a percent: 1000 units to distribute.
        let total = u128::from(self.total);
        let mut tenths: Vec<u64> = Vec::with_capacity(self.counts.len());
        let mut remainders: Vec<(usize, u128, u64)> = Vec::with_capacity(self.counts.len());

        for (index, (_, count)) in self.counts.iter().enumerate() {
            let scaled = u128::from(*count) * 1000;
            tenths.push((scaled / total) as u64);
            remainders.push((index, scaled % total, *count));
        }

        let assigned: u64 = tenths.iter().sum();
        let mut leftover = 1000 - assigned;

        // Hand the leftover tenths to the largest remainders; ties break
        // toward the larger count, then the earlier state.
        remainders.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(&b.0)));
        for (index, _, _) in remainders {
            if leftover == 0 {
                break;
            }
            tenths[index] += 1;
            leftover -= 1;
        }

        self.counts
            .iter()
            .zip(tenths)
            .map(|((state, _), t)| (state.clone(), t as f64 / 10.0))
            .collect()
    }
}

/// A ratio guarded against empty denominators.
///
/// Returns a value in `[0.0, 1.0]`; a zero denominator yields 0.0, never
/// NaN or infinity.
#[must_use]
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Attendance rate: present over all recorded outcomes.
#[must_use]
pub fn attendance_rate(present: u64, absent: u64, late: u64, justified: u64) -> f64 {
    rate(present, present + absent + late + justified)
}

/// The `n` highest-ranked items by a key, descending.
///
/// Stable for equal keys, so earlier items keep their position.
#[must_use]
pub fn top_n<T, K: Ord>(mut items: Vec<T>, n: usize, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items.truncate(n);
    items
}

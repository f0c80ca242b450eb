use std::collections::BTreeMap;

use super::calendar::{BucketKey, BucketMode, YearMonth, assign, bucket_keys};
use super::duration::{minutes_to_hours, to_minutes};
use super::{DurationEntry, StatsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub key: BucketKey,
    pub total_minutes: i64,
}

impl Bucket {
    pub fn label(&self) -> String {
        self.key.label()
    }

    /// Total rounded to one decimal hour; exactly 0.0 for an empty bucket.
    pub fn hours(&self) -> f64 {
        minutes_to_hours(self.total_minutes)
    }
}

/// Sums `entries` into the full, zero-filled bucket set for `mode`.
///
/// Entries whose date falls outside the covered range are skipped. The
/// result is ordered by bucket (week number, weekday index, or month).
pub fn bucketize(
    mode: BucketMode,
    month: YearMonth,
    entries: &[DurationEntry],
) -> Result<Vec<Bucket>, StatsError> {
    let mut buckets: Vec<Bucket> = bucket_keys(mode, month)?
        .into_iter()
        .map(|key| Bucket {
            key,
            total_minutes: 0,
        })
        .collect();

    for entry in entries {
        let minutes = entry.total_minutes()?;
        let Some(key) = assign(mode, month, entry.date) else {
            continue;
        };
        if let Ok(pos) = buckets.binary_search_by(|b| b.key.cmp(&key)) {
            buckets[pos].total_minutes += minutes;
        }
    }
    Ok(buckets)
}

pub fn total_minutes(entries: &[DurationEntry]) -> Result<i64, StatsError> {
    entries
        .iter()
        .try_fold(0i64, |acc, e| -> Result<i64, StatsError> {
            Ok(acc + e.total_minutes()?)
        })
}

/// Sums `(key, hours, minutes)` triples per key.
///
/// Largest total first; ties keep key order.
pub fn group_totals<K, I>(items: I) -> Result<Vec<(K, i64)>, StatsError>
where
    K: Ord,
    I: IntoIterator<Item = (K, i64, i64)>,
{
    let mut sums: BTreeMap<K, i64> = BTreeMap::new();
    for (key, hours, minutes) in items {
        *sums.entry(key).or_insert(0) += to_minutes(hours, minutes)?;
    }
    let mut out: Vec<(K, i64)> = sums.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(out)
}

//! The mirrored simulation state.

use crate::CacheError;
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeDelta};
use parking_lot::RwLock;
use simbridge_types::{Snapshot, Value, TIME_KEY};

/// The latest complete snapshot of the simulation.
///
/// Readers always receive copies, so a caller never holds the lock and
/// never observes a mix of two snapshots. Only the runner replaces the
/// snapshot; any number of readers proceed concurrently otherwise.
#[derive(Debug, Default)]
pub struct StateCache {
    snapshot: RwLock<Snapshot>,
}

impl StateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new snapshot, discarding the previous one entirely.
    pub fn replace_all(&self, snapshot: Snapshot) {
        let previous = std::mem::replace(&mut *self.snapshot.write(), snapshot);
        drop(previous);
    }

    /// Copy of the full snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Copy of a single point's value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.snapshot.read().get(key).cloned()
    }

    /// Values for the requested keys that are present.
    ///
    /// Absent keys are omitted rather than reported.
    pub fn get_multiple<K: AsRef<str>>(&self, keys: &[K]) -> Snapshot {
        let snapshot = self.snapshot.read();
        keys.iter()
            .filter_map(|key| {
                let key = key.as_ref();
                snapshot
                    .get(key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    /// Simulated elapsed seconds carried under [`TIME_KEY`].
    pub fn elapsed_seconds(&self) -> Result<f64, CacheError> {
        let value = self
            .get(TIME_KEY)
            .ok_or_else(|| CacheError::StateUnavailable(TIME_KEY.to_string()))?;

        match value {
            Value::Number(seconds) if seconds.is_finite() => Ok(seconds),
            other => Err(CacheError::TypeMismatch {
                key: TIME_KEY.to_string(),
                expected: "finite number",
                found: other.to_string(),
            }),
        }
    }

    /// Current simulated time, anchored at the start of the current
    /// calendar year in local time.
    pub fn current_time(&self) -> Result<DateTime<Local>, CacheError> {
        let seconds = self.elapsed_seconds()?;
        elapsed_since_year_start(seconds, Local::now().year())
            .ok_or(CacheError::TimeOutOfRange(seconds))
    }

    /// Number of points in the snapshot.
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    /// Whether no snapshot has been installed yet.
    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }
}

/// Absolute local time `seconds` after midnight, January 1st of `year`.
///
/// Returns `None` when the result falls outside the representable calendar.
pub fn elapsed_since_year_start(seconds: f64, year: i32) -> Option<DateTime<Local>> {
    let micros = (seconds * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    year_start(year).checked_add_signed(TimeDelta::microseconds(micros as i64))
}

fn year_start(year: i32) -> DateTime<Local> {
    let midnight = NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default();

    // A zone without a local midnight on January 1st falls back to UTC midnight.
    midnight
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or_else(|| midnight.and_utc().with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn snapshot(pairs: &[(&str, Value)]) -> Snapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_replace_then_snapshot() {
        let cache = StateCache::new();
        let s = snapshot(&[
            ("time", Value::Number(60.0)),
            ("zon_reaTRooAir_y", Value::Number(293.15)),
        ]);
        cache.replace_all(s.clone());
        assert_eq!(cache.snapshot(), s);
    }

    #[test]
    fn test_replace_discards_previous_keys() {
        let cache = StateCache::new();
        cache.replace_all(snapshot(&[("a", Value::Number(1.0)), ("b", Value::Number(2.0))]));
        cache.replace_all(snapshot(&[("c", Value::Number(3.0))]));

        let current = cache.snapshot();
        assert_eq!(current.len(), 1);
        assert!(current.contains_key("c"));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let cache = StateCache::new();
        cache.replace_all(snapshot(&[("a", Value::Number(1.0))]));

        let mut copy = cache.snapshot();
        copy.insert("a".to_string(), Value::Number(99.0));
        copy.insert("b".to_string(), Value::Bool(true));

        assert_eq!(cache.snapshot(), snapshot(&[("a", Value::Number(1.0))]));
    }

    #[test]
    fn test_get_multiple_returns_present_subset() {
        let cache = StateCache::new();
        cache.replace_all(snapshot(&[
            ("a", Value::Number(1.0)),
            ("b", Value::Text("on".into())),
            ("c", Value::Bool(false)),
        ]));

        let found = cache.get_multiple(&["a", "missing", "c", "also_missing"]);
        assert_eq!(
            found,
            snapshot(&[("a", Value::Number(1.0)), ("c", Value::Bool(false))])
        );

        let none: Snapshot = cache.get_multiple(&["x", "y"]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_current_time_one_hour_into_year() {
        let cache = StateCache::new();
        cache.replace_all(snapshot(&[("time", Value::Number(3600.0))]));

        let now = Local::now();
        let expected = Local
            .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
            .earliest()
            .unwrap()
            + TimeDelta::hours(1);
        assert_eq!(cache.current_time().unwrap(), expected);
    }

    #[test]
    fn test_current_time_without_time_key() {
        let cache = StateCache::new();
        assert_eq!(
            cache.current_time(),
            Err(CacheError::StateUnavailable("time".to_string()))
        );

        cache.replace_all(snapshot(&[("zon_reaTRooAir_y", Value::Number(293.15))]));
        assert!(matches!(
            cache.current_time(),
            Err(CacheError::StateUnavailable(_))
        ));
    }

    #[test]
    fn test_current_time_type_mismatch() {
        let cache = StateCache::new();
        cache.replace_all(snapshot(&[("time", Value::Text("noon".into()))]));
        assert!(matches!(
            cache.current_time(),
            Err(CacheError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_fractional_seconds() {
        let start = elapsed_since_year_start(0.0, 2024).unwrap();
        let later = elapsed_since_year_start(90.5, 2024).unwrap();
        assert_eq!(later - start, TimeDelta::milliseconds(90_500));
    }

    #[test]
    fn test_current_time_out_of_range() {
        let cache = StateCache::new();
        cache.replace_all(snapshot(&[("time", Value::Number(1e18))]));
        assert_eq!(cache.current_time(), Err(CacheError::TimeOutOfRange(1e18)));

        // Fits a time delta but lands past the last representable year.
        cache.replace_all(snapshot(&[("time", Value::Number(9e12))]));
        assert!(matches!(
            cache.current_time(),
            Err(CacheError::TimeOutOfRange(_))
        ));

        assert!(elapsed_since_year_start(-1e18, 2024).is_none());
    }

    #[test]
    fn test_readers_never_see_torn_snapshot() {
        let cache = Arc::new(StateCache::new());
        cache.replace_all(snapshot(&[("a", Value::Number(0.0)), ("b", Value::Number(0.0))]));

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 1..=500 {
                    let v = Value::Number(i as f64);
                    cache.replace_all(snapshot(&[("a", v.clone()), ("b", v)]));
                }
            })
        };

        while !writer.is_finished() {
            let s = cache.snapshot();
            assert_eq!(s["a"], s["b"]);
        }
        writer.join().unwrap();
    }
}

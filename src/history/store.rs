//! Bounded rolling history per metric.
//!
//! Windows are daily series: one sample per UTC day, so repeated evaluations
//! within a day never add samples.
//!
//! Each metric owns one [`HistoryWindow`] guarded by its own mutex, so an
//! append-then-evict on one series never interleaves with another writer on
//! the same series. Readers copy the values out before computing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{HistoryPoint, MetricKind, MetricSample};

/// Window capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Capacity of price and moving-average windows.
    pub long_capacity: usize,
    /// Capacity of market-cap and ETF windows.
    pub short_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            long_capacity: 200,
            short_capacity: 30,
        }
    }
}

impl HistoryConfig {
    pub fn capacity_for(&self, metric: MetricKind) -> usize {
        if metric.is_price_derived() {
            self.long_capacity
        } else {
            self.short_capacity
        }
    }
}

/// One retained day of a metric.
#[derive(Debug, Clone)]
struct Slot {
    sample: MetricSample,
    /// Recorded from an evaluation snapshot rather than supplied history.
    provisional: bool,
}

impl Slot {
    fn day(&self) -> NaiveDate {
        self.sample.timestamp.date_naive()
    }
}

/// Day-bucketed, capacity-bounded samples of one metric.
///
/// A window holds at most one sample per UTC day, oldest-first. Supplied
/// history is confirmed; a snapshot value is provisional and only fills a day
/// no confirmed point covers yet.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    metric: MetricKind,
    capacity: usize,
    samples: VecDeque<Slot>,
}

impl HistoryWindow {
    pub fn new(metric: MetricKind, capacity: usize) -> Self {
        Self {
            metric,
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    fn accepts(&self, sample: &MetricSample) -> bool {
        sample.metric == self.metric && sample.value.is_finite()
    }

    fn append(&mut self, slot: Slot) {
        self.samples.push_back(slot);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Append a confirmed sample, evicting the oldest beyond capacity.
    ///
    /// A sample for the newest retained day replaces it if that day is
    /// provisional or the sample is later in the day. A sample for an older
    /// day only settles a provisional entry for that day. Returns `false` when
    /// nothing changed: wrong metric, non-finite value, or stale timestamp.
    pub fn push(&mut self, sample: MetricSample) -> bool {
        if !self.accepts(&sample) {
            return false;
        }
        let day = sample.timestamp.date_naive();
        let confirmed = Slot {
            sample,
            provisional: false,
        };

        match self.tail() {
            Some((last_day, provisional, last_ts)) if day == last_day => {
                if !provisional && confirmed.sample.timestamp <= last_ts {
                    return false;
                }
                self.replace_latest(confirmed);
                true
            }
            Some((last_day, _, _)) if day < last_day => {
                match self
                    .samples
                    .iter_mut()
                    .find(|slot| slot.provisional && slot.day() == day)
                {
                    Some(slot) => {
                        *slot = confirmed;
                        true
                    }
                    None => false,
                }
            }
            _ => {
                self.append(confirmed);
                true
            }
        }
    }

    /// Record a snapshot value for its day.
    ///
    /// Opens a new provisional day, or overwrites the newest day when it is
    /// still provisional. Never displaces a confirmed sample or reaches back
    /// before the newest retained day.
    pub fn record_provisional(&mut self, sample: MetricSample) -> bool {
        if !self.accepts(&sample) {
            return false;
        }
        let day = sample.timestamp.date_naive();
        let slot = Slot {
            sample,
            provisional: true,
        };

        match self.tail() {
            Some((last_day, _, _)) if day < last_day => false,
            Some((last_day, provisional, _)) if day == last_day => {
                if provisional {
                    self.replace_latest(slot);
                }
                provisional
            }
            _ => {
                self.append(slot);
                true
            }
        }
    }

    /// Day, provisional flag and timestamp of the newest slot.
    fn tail(&self) -> Option<(NaiveDate, bool, DateTime<Utc>)> {
        self.samples
            .back()
            .map(|slot| (slot.day(), slot.provisional, slot.sample.timestamp))
    }

    fn replace_latest(&mut self, slot: Slot) {
        if let Some(last) = self.samples.back_mut() {
            *last = slot;
        }
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back().map(|slot| &slot.sample)
    }

    pub fn oldest(&self) -> Option<&MetricSample> {
        self.samples.front().map(|slot| &slot.sample)
    }

    /// Whether the newest retained day came from a snapshot.
    pub fn is_latest_provisional(&self) -> bool {
        self.tail().is_some_and(|(_, provisional, _)| provisional)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter().map(|slot| &slot.sample)
    }

    /// Values oldest-first.
    pub fn values(&self) -> Vec<f64> {
        self.iter().map(|s| s.value).collect()
    }
}

/// Process-lifetime store of every metric window.
#[derive(Debug)]
pub struct HistoryStore {
    windows: [Mutex<HistoryWindow>; 7],
}

impl HistoryStore {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            windows: MetricKind::ALL
                .map(|metric| Mutex::new(HistoryWindow::new(metric, config.capacity_for(metric)))),
        }
    }

    fn window(&self, metric: MetricKind) -> MutexGuard<'_, HistoryWindow> {
        // A push never leaves a window half-updated, so a poisoned lock is still usable.
        self.windows[metric.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one sample. See [`HistoryWindow::push`].
    pub fn append(&self, sample: MetricSample) -> bool {
        self.window(sample.metric).push(sample)
    }

    /// Record a snapshot value. See [`HistoryWindow::record_provisional`].
    pub fn record_provisional(&self, sample: MetricSample) -> bool {
        self.window(sample.metric).record_provisional(sample)
    }

    /// Append a batch of points under a single lock. Returns how many were accepted.
    pub fn extend(&self, metric: MetricKind, points: &[HistoryPoint]) -> usize {
        if points.is_empty() {
            return 0;
        }

        let mut window = self.window(metric);
        let mut accepted = 0;
        for point in points {
            if window.push(MetricSample::new(metric, point.value, point.timestamp)) {
                accepted += 1;
            }
        }

        debug!(
            metric = window.metric().as_str(),
            supplied = points.len(),
            accepted,
            retained = window.len(),
            "history extended"
        );
        accepted
    }

    /// Copy of a window's values, oldest-first.
    pub fn snapshot(&self, metric: MetricKind) -> Vec<f64> {
        self.window(metric).values()
    }

    /// Copy of a whole window.
    pub fn window_snapshot(&self, metric: MetricKind) -> HistoryWindow {
        self.window(metric).clone()
    }

    pub fn len(&self, metric: MetricKind) -> usize {
        self.window(metric).len()
    }

    pub fn capacity(&self, metric: MetricKind) -> usize {
        self.window(metric).capacity()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = HistoryWindow::new(MetricKind::EtfNetFlow, 3);
        for i in 0..5 {
            let sample =
                MetricSample::new(MetricKind::EtfNetFlow, i as f64, start() + Duration::days(i));
            assert!(window.push(sample));
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.values(), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.oldest().unwrap().value, 2.0);
    }

    #[test]
    fn test_window_rejects_stale_and_foreign_samples() {
        let mut window = HistoryWindow::new(MetricKind::Price, 10);
        assert!(window.push(MetricSample::new(MetricKind::Price, 1.0, start())));
        assert!(!window.push(MetricSample::new(MetricKind::Price, 2.0, start())));
        assert!(!window.push(MetricSample::new(
            MetricKind::Price,
            2.0,
            start() - Duration::days(1)
        )));
        assert!(!window.push(MetricSample::new(
            MetricKind::Ma50,
            2.0,
            start() + Duration::days(1)
        )));
        assert!(!window.push(MetricSample::new(
            MetricKind::Price,
            f64::NAN,
            start() + Duration::days(1)
        )));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_store_capacities_by_metric() {
        let store = HistoryStore::default();
        assert_eq!(store.capacity(MetricKind::Price), 200);
        assert_eq!(store.capacity(MetricKind::Ma200), 200);
        assert_eq!(store.capacity(MetricKind::StablecoinMarketCap), 30);
        assert_eq!(store.capacity(MetricKind::EtfAum), 30);
    }

    #[test]
    fn test_extend_is_idempotent_for_resent_points() {
        let store = HistoryStore::default();
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let points = HistoryPoint::daily_series(start(), &values);

        assert_eq!(store.extend(MetricKind::TotalMarketCap, &points), 40);
        assert_eq!(store.len(MetricKind::TotalMarketCap), 30);
        assert_eq!(store.extend(MetricKind::TotalMarketCap, &points), 0);

        let snapshot = store.snapshot(MetricKind::TotalMarketCap);
        assert_eq!(snapshot.len(), 30);
        assert_eq!(snapshot[0], 110.0);
        assert_eq!(snapshot[29], 139.0);
    }

    #[test]
    fn test_concurrent_appends_respect_capacity() {
        let store = HistoryStore::new(&HistoryConfig {
            long_capacity: 50,
            short_capacity: 5,
        });

        std::thread::scope(|scope| {
            for t in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..100 {
                        let ts = start() + Duration::days(i * 4 + t);
                        store.append(MetricSample::new(MetricKind::Price, 1.0, ts));
                        store.append(MetricSample::new(MetricKind::EtfNetFlow, 1.0, ts));
                    }
                });
            }
        });

        assert!(store.len(MetricKind::Price) <= 50);
        assert!(store.len(MetricKind::EtfNetFlow) <= 5);

        let window = store.window_snapshot(MetricKind::Price);
        let ordered = window
            .iter()
            .zip(window.iter().skip(1))
            .all(|(a, b)| a.timestamp < b.timestamp);
        assert!(ordered);
    }

    #[test]
    fn test_one_sample_per_day() {
        let mut window = HistoryWindow::new(MetricKind::EtfNetFlow, 30);
        assert!(window.push(MetricSample::new(MetricKind::EtfNetFlow, 1.0, start())));
        // Later in the same day replaces, never appends.
        let later = start() + Duration::hours(6);
        assert!(window.push(MetricSample::new(MetricKind::EtfNetFlow, 2.0, later)));
        assert_eq!(window.len(), 1);
        assert_eq!(window.latest().unwrap().value, 2.0);
        assert_eq!(window.latest().unwrap().timestamp, later);
    }

    #[test]
    fn test_provisional_day_is_overwritten_then_settled() {
        let mut window = HistoryWindow::new(MetricKind::StablecoinMarketCap, 30);
        let day = |d: i64, h: i64| start() + Duration::days(d) + Duration::hours(h);
        let sample = |v: f64, ts| MetricSample::new(MetricKind::StablecoinMarketCap, v, ts);

        assert!(window.push(sample(100.0, day(0, 0))));
        for hour in [9, 13, 17] {
            assert!(window.record_provisional(sample(105.0, day(1, hour))));
        }
        assert_eq!(window.values(), vec![100.0, 105.0]);
        assert!(window.is_latest_provisional());

        // The day's confirmed point settles it, even stamped earlier.
        assert!(window.push(sample(104.0, day(1, 0))));
        assert_eq!(window.values(), vec![100.0, 104.0]);
        assert!(!window.is_latest_provisional());

        // A confirmed day is never displaced by a snapshot.
        assert!(!window.record_provisional(sample(999.0, day(1, 20))));
        assert!(!window.record_provisional(sample(999.0, day(0, 20))));
        assert_eq!(window.values(), vec![100.0, 104.0]);
    }

    #[test]
    fn test_late_history_settles_older_provisional_day() {
        let store = HistoryStore::default();
        let metric = MetricKind::EtfNetFlow;
        store.record_provisional(MetricSample::new(metric, -50.0, start() + Duration::hours(15)));
        store.record_provisional(MetricSample::new(
            metric,
            -60.0,
            start() + Duration::days(1) + Duration::hours(15),
        ));

        let points = HistoryPoint::daily_series(start(), &[-40.0]);
        assert_eq!(store.extend(metric, &points), 1);
        assert_eq!(store.snapshot(metric), vec![-40.0, -60.0]);
        assert!(store.window_snapshot(metric).is_latest_provisional());
    }
}

//! Call counters and stopwatch timings.
//!
//! [`PerformanceMonitor`] keeps a fixed set of monotonically increasing
//! counters plus named timing buckets (count, total and max duration). It
//! keeps sums and counts only; [`PerformanceSummary`] renders them for humans
//! via `Display` or for tooling via `serde`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    ApiCalls,
    ApiFailures,
    CacheHits,
    CacheMisses,
    EmbeddingCalls,
    Retries,
}

impl Counter {
    pub const ALL: [Counter; 6] = [
        Counter::ApiCalls,
        Counter::ApiFailures,
        Counter::CacheHits,
        Counter::CacheMisses,
        Counter::EmbeddingCalls,
        Counter::Retries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::ApiCalls => "api_calls",
            Counter::ApiFailures => "api_failures",
            Counter::CacheHits => "cache_hits",
            Counter::CacheMisses => "cache_misses",
            Counter::EmbeddingCalls => "embedding_calls",
            Counter::Retries => "retries",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TimingStats {
    count: u64,
    total: Duration,
    max: Duration,
}

impl TimingStats {
    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }
}

pub struct PerformanceMonitor {
    counters: [AtomicU64; 6],
    timings: Mutex<BTreeMap<String, TimingStats>>,
    started: Instant,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            counters: Default::default(),
            timings: Mutex::new(BTreeMap::new()),
            started: Instant::now(),
        }
    }

    pub fn incr(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: Counter, n: u64) {
        self.counters[counter.slot()].fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters[counter.slot()].load(Ordering::Relaxed)
    }

    /// Start a stopwatch that records into `bucket` when dropped.
    pub fn time(&self, bucket: impl Into<String>) -> TimerGuard<'_> {
        TimerGuard {
            monitor: self,
            bucket: bucket.into(),
            started: Instant::now(),
        }
    }

    pub fn record(&self, bucket: &str, elapsed: Duration) {
        self.timings()
            .entry(bucket.to_string())
            .or_default()
            .record(elapsed);
    }

    // A poisoned lock only means a panic happened mid-record; the sums are still usable.
    fn timings(&self) -> MutexGuard<'_, BTreeMap<String, TimingStats>> {
        self.timings.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn summary(&self) -> PerformanceSummary {
        let counters = Counter::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), self.get(*c)))
            .collect();
        let timings = self
            .timings()
            .iter()
            .map(|(name, t)| {
                let total_ms = t.total.as_secs_f64() * 1000.0;
                (
                    name.clone(),
                    TimingSummary {
                        count: t.count,
                        total_ms,
                        mean_ms: if t.count == 0 { 0.0 } else { total_ms / t.count as f64 },
                        max_ms: t.max.as_secs_f64() * 1000.0,
                    },
                )
            })
            .collect();
        PerformanceSummary {
            uptime_secs: self.started.elapsed().as_secs_f64(),
            counters,
            timings,
            cache_hit_rate: hit_rate(self.get(Counter::CacheHits), self.get(Counter::CacheMisses)),
        }
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Records elapsed time into its bucket on drop.
pub struct TimerGuard<'a> {
    monitor: &'a PerformanceMonitor,
    bucket: String,
    started: Instant,
}

impl TimerGuard<'_> {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.monitor.record(&self.bucket, self.started.elapsed());
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimingSummary {
    pub count: u64,
    pub total_ms: f64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub uptime_secs: f64,
    pub counters: BTreeMap<String, u64>,
    pub timings: BTreeMap<String, TimingSummary>,
    pub cache_hit_rate: f64,
}

impl PerformanceSummary {
    pub fn counter(&self, counter: Counter) -> u64 {
        self.counters.get(counter.as_str()).copied().unwrap_or(0)
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance summary ({:.1}s)", self.uptime_secs)?;
        for (name, value) in &self.counters {
            writeln!(f, "  {:<16} {}", name, value)?;
        }
        writeln!(f, "  {:<16} {:.1}%", "cache_hit_rate", self.cache_hit_rate * 100.0)?;
        if !self.timings.is_empty() {
            writeln!(f, "Timings")?;
            for (name, t) in &self.timings {
                writeln!(
                    f,
                    "  {:<16} n={:<4} total={:.1}ms mean={:.1}ms max={:.1}ms",
                    name, t.count, t.total_ms, t.mean_ms, t.max_ms
                )?;
            }
        }
        Ok(())
    }
}

//! Lock-free metrics collection and reporting
//!
//! Counter updates are lock-free atomics; `report()` swaps the periodic
//! counters to zero to take a snapshot while the facility keeps running.
//!
//! NOTE: All atomics use Relaxed ordering. These are statistical counters
//! only and must not drive any billing decision.

use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries for fee computation latency (nanoseconds)
/// Buckets: ≤250, ≤500, ≤1000, ... ≤128000, >128000
const BUCKET_BOUNDS: [u64; 10] = [250, 500, 1000, 2000, 4000, 8000, 16000, 32000, 64000, 128000];
const NUM_BUCKETS: usize = 11;

/// Segment length bucket boundaries (billed hours)
/// Buckets: ≤1, ≤3, ≤6, ≤12, ≤24, ≤48, ≤96, ≤168, ≤336, ≤720, >720 h
const SEGMENT_HOURS_BOUNDS: [u64; 10] = [1, 3, 6, 12, 24, 48, 96, 168, 336, 720];

#[inline]
fn bucket_index(latency_ns: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_ns)
}

#[inline]
fn segment_hours_bucket_index(hours: u64) -> usize {
    SEGMENT_HOURS_BOUNDS.partition_point(|&bound| bound < hours)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].swap(0, Ordering::Relaxed))
}

#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].load(Ordering::Relaxed))
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile) as u64).max(1);
    let mut cumulative = 0u64;

    // Last bucket reports twice the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [250, 500, 1000, 2000, 4000, 8000, 16000, 32000, 64000, 128000, 256000];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector for one facility
pub struct Metrics {
    /// Tickets opened (monotonic)
    parked_total: AtomicU64,
    /// Tickets closed (monotonic)
    unparked_total: AtomicU64,
    /// Returns linked to a previous ticket (monotonic)
    continuous_links_total: AtomicU64,
    /// Sum of all amounts charged at unpark (monotonic)
    revenue_total: AtomicU64,
    /// Fee computations ever run (monotonic)
    fee_computations_total: AtomicU64,
    /// Fee computations since last report (reset on report)
    fee_computations_since_report: AtomicU64,
    /// Sum of fee latencies in nanoseconds (reset on report)
    fee_latency_sum_ns: AtomicU64,
    /// Max fee latency in nanoseconds (reset on report)
    fee_latency_max_ns: AtomicU64,
    /// Fee latency histogram (reset on report)
    fee_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Billed hours per priced segment (cumulative)
    segment_hours_buckets: [AtomicU64; NUM_BUCKETS],
    /// Rejected park/unpark attempts keyed by reason (cumulative)
    rejections: parking_lot::Mutex<FxHashMap<&'static str, u64>>,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            parked_total: AtomicU64::new(0),
            unparked_total: AtomicU64::new(0),
            continuous_links_total: AtomicU64::new(0),
            revenue_total: AtomicU64::new(0),
            fee_computations_total: AtomicU64::new(0),
            fee_computations_since_report: AtomicU64::new(0),
            fee_latency_sum_ns: AtomicU64::new(0),
            fee_latency_max_ns: AtomicU64::new(0),
            fee_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            segment_hours_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            rejections: parking_lot::Mutex::new(FxHashMap::default()),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_parked(&self) {
        self.parked_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_continuous_link(&self) {
        self.continuous_links_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed ticket and what it actually charged
    #[inline]
    pub fn record_unparked(&self, charged: u64) {
        self.unparked_total.fetch_add(1, Ordering::Relaxed);
        self.revenue_total.fetch_add(charged, Ordering::Relaxed);
    }

    /// Record one fee computation and its duration (lock-free)
    #[inline]
    pub fn record_fee_computation(&self, latency_ns: u64) {
        self.fee_computations_total.fetch_add(1, Ordering::Relaxed);
        self.fee_computations_since_report.fetch_add(1, Ordering::Relaxed);
        self.fee_latency_sum_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.fee_latency_buckets[bucket_index(latency_ns)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.fee_latency_max_ns, latency_ns);
    }

    #[inline]
    pub fn record_segment_hours(&self, billed_hours: u64) {
        let bucket = segment_hours_bucket_index(billed_hours);
        self.segment_hours_buckets[bucket].fetch_add(1, Ordering::Relaxed);
    }

    /// Count a rejected operation; the only call that takes a lock
    pub fn record_rejection(&self, reason: &'static str) {
        *self.rejections.lock().entry(reason).or_insert(0) += 1;
    }

    #[inline]
    pub fn parked_total(&self) -> u64 {
        self.parked_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn unparked_total(&self) -> u64 {
        self.unparked_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn revenue_total(&self) -> u64 {
        self.revenue_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn continuous_links_total(&self) -> u64 {
        self.continuous_links_total.load(Ordering::Relaxed)
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejections.lock().values().sum()
    }

    /// Calculate and return a summary, then reset periodic counters
    pub fn report(&self, active_tickets: usize, free_slots: usize) -> MetricsSummary {
        let fee_count = self.fee_computations_since_report.swap(0, Ordering::Relaxed);
        let fee_latency_sum = self.fee_latency_sum_ns.swap(0, Ordering::Relaxed);
        let fee_latency_max = self.fee_latency_max_ns.swap(0, Ordering::Relaxed);
        let fee_lat_buckets = swap_buckets(&self.fee_latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let fees_per_sec = if elapsed.as_secs_f64() > 0.0 {
            fee_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let fee_lat_avg_ns = if fee_count > 0 { fee_latency_sum / fee_count } else { 0 };

        let mut rejections: Vec<(&'static str, u64)> =
            self.rejections.lock().iter().map(|(k, v)| (*k, *v)).collect();
        rejections.sort_unstable();

        MetricsSummary {
            parked_total: self.parked_total(),
            unparked_total: self.unparked_total(),
            rejected_total: rejections.iter().map(|(_, n)| n).sum(),
            rejections,
            continuous_links_total: self.continuous_links_total(),
            revenue_total: self.revenue_total(),
            fee_computations_total: self.fee_computations_total.load(Ordering::Relaxed),
            fees_per_sec,
            fee_lat_buckets,
            fee_lat_avg_ns,
            fee_lat_max_ns: fee_latency_max,
            fee_lat_p50_ns: percentile_from_buckets(&fee_lat_buckets, 0.50),
            fee_lat_p99_ns: percentile_from_buckets(&fee_lat_buckets, 0.99),
            segment_hours_buckets: load_buckets(&self.segment_hours_buckets),
            active_tickets,
            free_slots,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub parked_total: u64,
    pub unparked_total: u64,
    pub rejected_total: u64,
    /// Rejections per reason, sorted by reason
    pub rejections: Vec<(&'static str, u64)>,
    pub continuous_links_total: u64,
    pub revenue_total: u64,
    pub fee_computations_total: u64,
    pub fees_per_sec: f64,
    /// Bounds: ≤250, ≤500, ... ≤128000, >128000 ns
    pub fee_lat_buckets: [u64; NUM_BUCKETS],
    pub fee_lat_avg_ns: u64,
    pub fee_lat_max_ns: u64,
    pub fee_lat_p50_ns: u64,
    pub fee_lat_p99_ns: u64,
    /// Bounds: ≤1, ≤3, ≤6, ... ≤720, >720 billed hours
    pub segment_hours_buckets: [u64; NUM_BUCKETS],
    pub active_tickets: usize,
    pub free_slots: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            parked = %self.parked_total,
            unparked = %self.unparked_total,
            rejected = %self.rejected_total,
            continuous_links = %self.continuous_links_total,
            revenue = %self.revenue_total,
            active_tickets = %self.active_tickets,
            free_slots = %self.free_slots,
            fee_computations = %self.fee_computations_total,
            fees_per_sec = format!("{:.1}", self.fees_per_sec),
            fee_avg_ns = %self.fee_lat_avg_ns,
            fee_p50_ns = %self.fee_lat_p50_ns,
            fee_p99_ns = %self.fee_lat_p99_ns,
            "metrics"
        );
        for (reason, count) in &self.rejections {
            info!(reason = %reason, count = %count, "metrics_rejections");
        }
    }
}

/// Feed performance accounting.
///
/// Latency samples go into a fixed 100-bucket histogram at 100 ns per
/// bucket (the last bucket is open-ended), so recording is a couple of
/// integer operations and percentiles are a cumulative scan. Samples
/// come from the monotone `Instant` clock, which already reports
/// calibrated nanoseconds.

use std::time::Instant;

pub const NUM_BUCKETS: usize = 100;
pub const BUCKET_WIDTH_NS: u64 = 100;

#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    buckets: [u64; NUM_BUCKETS],
    count: u64,
    total: u64,
    min: u64,
    max: u64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        LatencyHistogram {
            buckets: [0; NUM_BUCKETS],
            count: 0,
            total: 0,
            min: u64::MAX,
            max: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, latency_ns: u64) {
        let bucket = ((latency_ns / BUCKET_WIDTH_NS) as usize).min(NUM_BUCKETS - 1);
        self.buckets[bucket] += 1;
        self.count += 1;
        self.total += latency_ns;
        self.min = self.min.min(latency_ns);
        self.max = self.max.max(latency_ns);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }

    /// Latency at quantile `p` in [0, 1], resolved to the lower edge
    /// of the containing bucket. The target rank truncates toward
    /// zero, so small sample counts resolve to the low side.
    pub fn percentile(&self, p: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }
        let target = (self.count as f64 * p) as u64;
        let mut cumulative = 0u64;
        for (i, &bucket) in self.buckets.iter().enumerate() {
            cumulative += bucket;
            if cumulative >= target {
                return i as u64 * BUCKET_WIDTH_NS;
            }
        }
        (NUM_BUCKETS as u64 - 1) * BUCKET_WIDTH_NS
    }

    pub fn p50(&self) -> u64 {
        self.percentile(0.50)
    }

    pub fn p99(&self) -> u64 {
        self.percentile(0.99)
    }

    pub fn p999(&self) -> u64 {
        self.percentile(0.999)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Operation counters and the book-update latency histogram.
#[derive(Debug, Clone, Default)]
pub struct FeedMetrics {
    pub messages_processed: u64,
    pub orders_added: u64,
    pub orders_executed: u64,
    pub orders_cancelled: u64,
    pub orders_deleted: u64,
    pub orders_replaced: u64,
    pub trades: u64,
    pub bbo_updates: u64,
    pub book_update_latency: LatencyHistogram,
    started: Option<Instant>,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start_clock(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Messages per second since metrics were enabled.
    pub fn throughput_mps(&self) -> f64 {
        match self.started {
            None => 0.0,
            Some(started) => {
                let elapsed = started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.messages_processed as f64 / elapsed
                } else {
                    0.0
                }
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("=== Feed Metrics ===");
        println!("Messages processed: {}", self.messages_processed);
        println!(
            "Orders  add/exec/cancel/delete/replace: {}/{}/{}/{}/{}",
            self.orders_added,
            self.orders_executed,
            self.orders_cancelled,
            self.orders_deleted,
            self.orders_replaced
        );
        println!("Trades: {}  BBO updates: {}", self.trades, self.bbo_updates);
        println!("Throughput: {:.0} msgs/sec", self.throughput_mps());

        let hist = &self.book_update_latency;
        if hist.count() > 0 {
            println!("\nBook update latency (ns):");
            println!(
                "  min {}  max {}  mean {:.1}",
                hist.min(),
                hist.max(),
                hist.mean()
            );
            println!(
                "  p50 {}  p99 {}  p99.9 {}",
                hist.p50(),
                hist.p99(),
                hist.p999()
            );
        }
    }
}

//! Metrics module - Servo bus transaction timing and failure counts

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Read,
    Write,
    Torque,
}

impl Transaction {
    pub fn as_str(self) -> &'static str {
        match self {
            Transaction::Read => "read",
            Transaction::Write => "write",
            Transaction::Torque => "torque",
        }
    }
}

fn histogram() -> Histogram<u64> {
    Histogram::new(3).expect("3 significant figures is within hdrhistogram's range")
}

// ============================================================================
// TRANSPORT METRICS - Shared by every channel of the bank
// ============================================================================

#[derive(Clone)]
pub struct TransportMetrics {
    read_hist: Arc<Mutex<Histogram<u64>>>,
    write_hist: Arc<Mutex<Histogram<u64>>>,
    torque_hist: Arc<Mutex<Histogram<u64>>>,
    read_failures: Arc<AtomicU64>,
    write_failures: Arc<AtomicU64>,
    torque_failures: Arc<AtomicU64>,
    exclusions: Arc<AtomicU64>,
}

impl Default for TransportMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self {
            read_hist: Arc::new(Mutex::new(histogram())),
            write_hist: Arc::new(Mutex::new(histogram())),
            torque_hist: Arc::new(Mutex::new(histogram())),
            read_failures: Arc::new(AtomicU64::new(0)),
            write_failures: Arc::new(AtomicU64::new(0)),
            torque_failures: Arc::new(AtomicU64::new(0)),
            exclusions: Arc::new(AtomicU64::new(0)),
        }
    }

    fn parts(&self, kind: Transaction) -> (&Mutex<Histogram<u64>>, &AtomicU64) {
        match kind {
            Transaction::Read => (&*self.read_hist, &*self.read_failures),
            Transaction::Write => (&*self.write_hist, &*self.write_failures),
            Transaction::Torque => (&*self.torque_hist, &*self.torque_failures),
        }
    }

    /// Record one transaction's latency; failed ones are counted too.
    pub fn record(&self, kind: Transaction, duration: Duration, ok: bool) {
        let (hist, failures) = self.parts(kind);
        hist.lock().record(duration.as_nanos() as u64).ok();
        if !ok {
            failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_exclusion(&self) {
        self.exclusions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failures(&self, kind: Transaction) -> u64 {
        self.parts(kind).1.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let summarize = |kind: Transaction| {
            let (hist, failures) = self.parts(kind);
            let hist = hist.lock();
            TransactionStats {
                count: hist.len(),
                failures: failures.load(Ordering::Relaxed),
                p50: Duration::from_nanos(hist.value_at_quantile(0.5)),
                p99: Duration::from_nanos(hist.value_at_quantile(0.99)),
                max: Duration::from_nanos(hist.max()),
            }
        };

        MetricsReport {
            read: summarize(Transaction::Read),
            write: summarize(Transaction::Write),
            torque: summarize(Transaction::Torque),
            excluded_channels: self.exclusions.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionStats {
    pub count: u64,
    pub failures: u64,
    pub p50: Duration,
    pub p99: Duration,
    pub max: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsReport {
    pub read: TransactionStats,
    pub write: TransactionStats,
    pub torque: TransactionStats,
    pub excluded_channels: u64,
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bus transactions:")?;
        let rows = [
            (Transaction::Read, &self.read),
            (Transaction::Write, &self.write),
            (Transaction::Torque, &self.torque),
        ];
        for (kind, stats) in rows {
            let name = kind.as_str();
            writeln!(
                f,
                "  {name:<7} count={:<6} failed={:<4} p50={:?} p99={:?} max={:?}",
                stats.count, stats.failures, stats.p50, stats.p99, stats.max
            )?;
        }
        write!(f, "  excluded channels: {}", self.excluded_channels)
    }
}

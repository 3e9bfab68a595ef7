//! The Poller runs gather passes and emits each pass's batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mgdwatch_adapters::mgd::MgdAdapter;
use mgdwatch_adapters::AdapterError;
use mgdwatch_types::MetricBuffer;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::output::Output;

/// Default interval between passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Counters shared between a running poller and its handles.
#[derive(Debug, Default)]
struct PassStats {
    passes: AtomicU64,
    failures: AtomicU64,
    emitted: AtomicU64,
    last_error: RwLock<Option<String>>,
}

impl PassStats {
    fn record(&self, result: &Result<(), AdapterError>, emitted: usize) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.emitted.fetch_add(emitted as u64, Ordering::Relaxed);
        match result {
            Ok(()) => *self.last_error.write() = None,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                *self.last_error.write() = Some(e.to_string());
            }
        }
    }

    fn summary(&self) -> PassSummary {
        PassSummary {
            passes: self.passes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            last_error: self.last_error.read().clone(),
        }
    }
}

/// Point-in-time view of a poller's pass counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PassSummary {
    /// Passes run so far.
    pub passes: u64,
    /// Passes that ended in an error.
    pub failures: u64,
    /// Emissions handed to outputs.
    pub emitted: u64,
    /// Error of the most recent pass, if it failed.
    pub last_error: Option<String>,
}

/// Polls mgd servers and emits each pass to the configured outputs.
///
/// # Example
///
/// ```rust,no_run
/// use mgdwatch_adapters::mgd::MgdAdapter;
/// use mgdwatch_sdk::{Output, Poller};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let adapter = MgdAdapter::builder().server("localhost:50000").build()?;
///
///     let poller = Poller::builder(adapter)
///         .output(Output::stdout())
///         .interval(Duration::from_secs(10))
///         .build();
///
///     let handle = poller.start();
///     tokio::time::sleep(Duration::from_secs(60)).await;
///     handle.stop();
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Poller {
    adapter: Arc<MgdAdapter>,
    outputs: Arc<Vec<Output>>,
    interval: Duration,
    stats: Arc<PassStats>,
}

impl Poller {
    /// Create a builder around an adapter.
    pub fn builder(adapter: MgdAdapter) -> PollerBuilder {
        PollerBuilder::new(adapter)
    }

    /// The configured interval between passes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Counters accumulated by this poller.
    pub fn summary(&self) -> PassSummary {
        self.stats.summary()
    }

    /// Run one pass now and return how many emissions were produced.
    ///
    /// Emissions gathered before a failure are still emitted.
    pub async fn run_once(&self) -> Result<usize, AdapterError> {
        run_pass(&self.adapter, &self.outputs, &self.stats).await
    }

    /// Start background polling.
    ///
    /// The first pass runs immediately. A failed pass is logged and the loop
    /// keeps going. Returns a handle that can be used to stop polling;
    /// dropping the handle stops polling too.
    pub fn start(&self) -> PollHandle {
        use tokio::sync::watch;

        let (stop_tx, stop_rx) = watch::channel(false);
        let adapter = self.adapter.clone();
        let outputs = self.outputs.clone();
        let stats = self.stats.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut stop_rx = stop_rx;

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let _ = run_pass(&adapter, &outputs, &stats).await;
                    }
                    res = stop_rx.changed() => {
                        // A closed channel means the handle was dropped.
                        if res.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        PollHandle {
            stop_tx,
            stats: self.stats.clone(),
        }
    }
}

async fn run_pass(
    adapter: &MgdAdapter,
    outputs: &[Output],
    stats: &PassStats,
) -> Result<usize, AdapterError> {
    let mut buffer = MetricBuffer::new();
    let result = adapter.gather(&mut buffer).await;
    let batch = buffer.into_inner();

    if !batch.is_empty() {
        let timestamp_ns = now_ns();
        for output in outputs {
            if let Err(e) = output.emit(&batch, timestamp_ns).await {
                warn!(error = %e, "failed to emit batch");
            }
        }
    }

    stats.record(&result, batch.len());

    match result {
        Ok(()) => {
            debug!(emissions = batch.len(), "gather pass complete");
            Ok(batch.len())
        }
        Err(e) => {
            warn!(error = %e, kind = ?e.kind(), emitted = batch.len(), "gather pass failed");
            Err(e)
        }
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Builder for configuring a Poller.
#[derive(Debug)]
pub struct PollerBuilder {
    adapter: MgdAdapter,
    outputs: Vec<Output>,
    interval: Option<Duration>,
}

impl PollerBuilder {
    /// Create a new builder.
    pub fn new(adapter: MgdAdapter) -> Self {
        Self {
            adapter,
            outputs: Vec::new(),
            interval: None,
        }
    }

    /// Add an output destination.
    ///
    /// Multiple outputs can be added; batches will be emitted to all of them.
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Set the polling interval.
    ///
    /// Defaults to 10 seconds if not specified.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Build the poller.
    pub fn build(self) -> Poller {
        Poller {
            adapter: Arc::new(self.adapter),
            outputs: Arc::new(self.outputs),
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            stats: Arc::new(PassStats::default()),
        }
    }
}

/// Handle for controlling background polling.
///
/// Polling stops when the handle is stopped or dropped.
pub struct PollHandle {
    stop_tx: tokio::sync::watch::Sender<bool>,
    stats: Arc<PassStats>,
}

impl PollHandle {
    /// Counters accumulated by the running poller.
    pub fn summary(&self) -> PassSummary {
        self.stats.summary()
    }

    /// Stop background polling.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }
}

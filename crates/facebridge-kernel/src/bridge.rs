//! Bridge orchestration
//!
//! [`Bridge`] wraps a [`ForeignRuntime`] with everything the per-call logic
//! needs around it:
//!
//! - a gate serializing calls, so the runtime never sees two at once
//! - an optional deadline, covering the wait for the gate as well as the
//!   routine. A call that has not started by then never starts; one that
//!   has is abandoned on its worker thread
//! - panic containment, so nothing unwinds into a foreign caller
//! - diagnostics: one span per call, the failure kind and detail logged
//!   before any sentinel is produced
//!
//! Clones share the runtime, the gate and the statistics.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use tracing::{debug, error, info_span, warn};

use crate::config::BridgeConfig;
use crate::error::ForeignCallError;
use crate::report::{RecognitionReport, ReportError};
use crate::runtime::{EntryPoint, ForeignRuntime};
use crate::sentinel;

/// Call counters shared by every clone of a [`Bridge`].
#[derive(Debug, Default)]
pub struct BridgeStats {
    invocations: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicU64,
}

impl BridgeStats {
    /// Calls started, including ones still running.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Calls that ended in a [`ForeignCallError`], timeouts included.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Runtime calls that have not returned yet. An abandoned call stays in
    /// flight until the routine actually finishes.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Decrements `in_flight` when the runtime call ends, however it ends.
struct InFlight<'a>(&'a BridgeStats);

impl<'a> InFlight<'a> {
    fn enter(stats: &'a BridgeStats) -> Self {
        stats.in_flight.fetch_add(1, Ordering::AcqRel);
        Self(stats)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct Bridge<R: ForeignRuntime> {
    runtime: Arc<R>,
    entry: EntryPoint,
    timeout: Option<Duration>,
    gate: Arc<Mutex<()>>,
    stats: Arc<BridgeStats>,
}

impl<R: ForeignRuntime> Clone for Bridge<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            entry: self.entry.clone(),
            timeout: self.timeout,
            gate: Arc::clone(&self.gate),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<R: ForeignRuntime> Bridge<R> {
    pub fn new(runtime: R, entry: EntryPoint) -> Self {
        Self {
            runtime: Arc::new(runtime),
            entry,
            timeout: None,
            gate: Arc::new(Mutex::new(())),
            stats: Arc::new(BridgeStats::default()),
        }
    }

    pub fn from_config(runtime: R, config: &BridgeConfig) -> Self {
        let bridge = Self::new(runtime, config.entry_point());
        match config.timeout() {
            Some(timeout) => bridge.with_timeout(timeout),
            None => bridge,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn entry_point(&self) -> &EntryPoint {
        &self.entry
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Perform the call and return its text, or why there is none.
    pub fn call(&self) -> Result<String, ForeignCallError> {
        let span = info_span!(
            "bridge_call",
            module = %self.entry.module,
            function = %self.entry.function,
        );
        let _enter = span.enter();

        self.stats.invocations.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        let result = match self.timeout {
            Some(limit) => self.call_with_deadline(limit),
            None => run_gated(&*self.runtime, &self.entry, &self.gate, &self.stats),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(text) => {
                debug!(elapsed_ms, len = text.len(), "foreign call returned");
                if sentinel::is_sentinel(text) {
                    warn!("routine returned the sentinel text as a success value");
                }
            }
            Err(err) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    kind = %err.kind(),
                    error = %err,
                    runtime = self.runtime.name(),
                    elapsed_ms,
                    "foreign call failed"
                );
            }
        }
        result
    }

    /// Drop-in form of [`Bridge::call`]: the text, or `"Error"`.
    pub fn invoke(&self) -> String {
        sentinel::collapse(self.call())
    }

    /// Call and parse the routine's output as a [`RecognitionReport`].
    pub fn recognize(&self) -> Result<RecognitionReport, ReportError> {
        let raw = self.call()?;
        RecognitionReport::parse(&raw)
    }

    fn call_with_deadline(&self, limit: Duration) -> Result<String, ForeignCallError> {
        let deadline = Instant::now() + limit;
        let (tx, rx) = crossbeam_channel::bounded(1);
        let claim = Arc::new(AtomicBool::new(false));
        let runtime = Arc::clone(&self.runtime);
        let entry = self.entry.clone();
        let gate = Arc::clone(&self.gate);
        let stats = Arc::clone(&self.stats);
        let worker_claim = Arc::clone(&claim);
        let span = tracing::Span::current();

        // Caller and worker race for `claim`: the worker must win it before
        // touching the runtime, the caller takes it when the deadline passes.
        // A worker that loses never calls the routine.
        thread::Builder::new()
            .name("facebridge-call".to_string())
            .spawn(move || {
                let _enter = span.enter();
                let result = match gate.try_lock_until(deadline) {
                    Some(_gate) => {
                        if worker_claim.swap(true, Ordering::AcqRel) {
                            debug!("call abandoned before the routine started");
                            return;
                        }
                        run_locked(&*runtime, &entry, &stats)
                    }
                    None => Err(ForeignCallError::Timeout(limit)),
                };
                // The receiver is gone once the caller has timed out.
                let _ = tx.send(result);
            })
            .map_err(|e| ForeignCallError::Worker(format!("could not spawn call thread: {e}")))?;

        match rx.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let started = claim.swap(true, Ordering::AcqRel);
                let timeout_ms = limit.as_millis() as u64;
                warn!(timeout_ms, started, "abandoning foreign call");
                Err(ForeignCallError::Timeout(limit))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ForeignCallError::Worker(
                "call thread exited without a result".to_string(),
            )),
        }
    }
}

fn run_gated<R: ForeignRuntime>(
    runtime: &R,
    entry: &EntryPoint,
    gate: &Mutex<()>,
    stats: &BridgeStats,
) -> Result<String, ForeignCallError> {
    let _gate = gate.lock();
    run_locked(runtime, entry, stats)
}

/// Caller holds the gate.
fn run_locked<R: ForeignRuntime>(
    runtime: &R,
    entry: &EntryPoint,
    stats: &BridgeStats,
) -> Result<String, ForeignCallError> {
    let _in_flight = InFlight::enter(stats);
    catch_unwind(AssertUnwindSafe(|| runtime.call_entry(entry)))
        .unwrap_or_else(|payload| Err(ForeignCallError::Worker(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("runtime panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("runtime panicked: {msg}")
    } else {
        "runtime panicked".to_string()
    }
}

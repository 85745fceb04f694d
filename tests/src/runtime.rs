use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use facebridge_kernel::{EntryPoint, FailureKind, ForeignCallError, ForeignRuntime};
use parking_lot::Mutex;

/// What a [`MockRuntime`] does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return this text.
    Return(String),
    /// Fail with this error. The handles a real interpreter would hold at
    /// that point (module, callable, value) are acquired first.
    Fail(ForeignCallError),
    /// Sleep, then behave as the inner behavior.
    Delay(Duration, Box<Behavior>),
    /// Panic with this message.
    Panic(String),
}

impl Behavior {
    pub fn returns(text: impl Into<String>) -> Self {
        Behavior::Return(text.into())
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Behavior::Delay(delay, Box::new(self))
    }
}

/// Counts foreign handles that are currently held.
#[derive(Debug, Default)]
struct HandleLedger {
    live: AtomicUsize,
    acquired: AtomicUsize,
}

/// A held foreign handle, released on drop.
struct Handle<'a>(&'a HandleLedger);

impl<'a> Handle<'a> {
    fn acquire(ledger: &'a HandleLedger) -> Self {
        ledger.live.fetch_add(1, Ordering::SeqCst);
        ledger.acquired.fetch_add(1, Ordering::SeqCst);
        Self(ledger)
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks one call as inside the runtime, also across a panic.
struct Active<'a>(&'a AtomicUsize);

impl<'a> Active<'a> {
    fn enter(active: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A scripted [`ForeignRuntime`].
///
/// Answers with a default [`Behavior`] unless one-shot behaviors are queued.
/// Records every entry point it was called with, the number of calls running
/// at once, and the foreign handles it holds.
#[derive(Clone)]
pub struct MockRuntime {
    default: Arc<Mutex<Behavior>>,
    queued: Arc<Mutex<VecDeque<Behavior>>>,
    history: Arc<Mutex<Vec<EntryPoint>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    handles: Arc<HandleLedger>,
}

impl MockRuntime {
    pub fn new(default: Behavior) -> Self {
        Self {
            default: Arc::new(Mutex::new(default)),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            history: Arc::new(Mutex::new(Vec::new())),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            handles: Arc::new(HandleLedger::default()),
        }
    }

    pub fn returning(text: impl Into<String>) -> Self {
        Self::new(Behavior::returns(text))
    }

    pub fn failing(err: ForeignCallError) -> Self {
        Self::new(Behavior::Fail(err))
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.default.lock() = behavior;
    }

    /// Queue a behavior for the next call only.
    pub fn enqueue(&self, behavior: Behavior) {
        self.queued.lock().push_back(behavior);
    }

    pub fn history(&self) -> Vec<EntryPoint> {
        self.history.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.history.lock().len()
    }

    /// Largest number of calls that were inside the runtime at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Foreign handles held right now.
    pub fn live_handles(&self) -> usize {
        self.handles.live.load(Ordering::SeqCst)
    }

    /// Foreign handles acquired since creation.
    pub fn acquired_handles(&self) -> usize {
        self.handles.acquired.load(Ordering::SeqCst)
    }

    fn next_behavior(&self) -> Behavior {
        self.queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.lock().clone())
    }

    fn perform(&self, behavior: Behavior) -> Result<String, ForeignCallError> {
        match behavior {
            Behavior::Delay(delay, inner) => {
                thread::sleep(delay);
                self.perform(*inner)
            }
            Behavior::Panic(message) => panic!("{message}"),
            Behavior::Return(text) => {
                let _module = Handle::acquire(&self.handles);
                let _callable = Handle::acquire(&self.handles);
                let _value = Handle::acquire(&self.handles);
                Ok(text)
            }
            Behavior::Fail(err) => {
                // Hold what an interpreter would hold when this error surfaces.
                let depth = match err.kind() {
                    FailureKind::RuntimeInit | FailureKind::ModuleResolution => 0,
                    FailureKind::AttributeResolution | FailureKind::NotCallable => 1,
                    FailureKind::InvocationRaised => 2,
                    _ => 3,
                };
                let _held: Vec<Handle<'_>> =
                    (0..depth).map(|_| Handle::acquire(&self.handles)).collect();
                Err(err)
            }
        }
    }
}

impl ForeignRuntime for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    fn call_entry(&self, entry: &EntryPoint) -> Result<String, ForeignCallError> {
        self.history.lock().push(entry.clone());

        let _active = Active::enter(&self.active, &self.peak);
        self.perform(self.next_behavior())
    }
}

#[macro_export]
macro_rules! assert_runtime_called {
    ($runtime:expr, $expected_count:expr) => {
        let count = $runtime.call_count();
        assert_eq!(
            count, $expected_count,
            "Expected runtime '{}' to be called {} times, but was called {} times",
            $crate::ForeignRuntime::name(&$runtime),
            $expected_count,
            count
        );
    };
}

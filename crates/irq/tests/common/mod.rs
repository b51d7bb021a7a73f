//! Shared fixtures for the irq integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use irq::{DevId, IrqController, IrqHandler, IrqHooks, IrqReturn, Registry};

/// Controller that only counts how often each capability was used.
#[derive(Default)]
pub struct RecordingController {
    pub startups: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub enables: AtomicUsize,
    pub disables: AtomicUsize,
    pub acks: AtomicUsize,
    pub ends: AtomicUsize,
    pub resends: AtomicUsize,
    /// Value reported by `startup`.
    pub latched: AtomicBool,
}

impl RecordingController {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl IrqController for RecordingController {
    fn name(&self) -> &str {
        "recording"
    }

    fn startup(&self, _irq: usize) -> bool {
        self.startups.fetch_add(1, Ordering::SeqCst);
        self.latched.load(Ordering::SeqCst)
    }

    fn shutdown(&self, _irq: usize) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    fn enable(&self, _irq: usize) {
        self.enables.fetch_add(1, Ordering::SeqCst);
    }

    fn disable(&self, _irq: usize) {
        self.disables.fetch_add(1, Ordering::SeqCst);
    }

    fn ack(&self, _irq: usize) {
        self.acks.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self, _irq: usize) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn resend(&self, _irq: usize) {
        self.resends.fetch_add(1, Ordering::SeqCst);
    }
}

type DelayHook = Box<dyn Fn(u32) + Send + Sync>;

/// Collaborators that record every call; `mdelay` can inject hardware events.
#[derive(Default)]
pub struct TestHooks {
    pub softirqs: AtomicUsize,
    pub randomness: Mutex<Vec<usize>>,
    pub delays: Mutex<Vec<u32>>,
    on_delay: OnceLock<DelayHook>,
}

impl TestHooks {
    /// Run `f` from inside every `mdelay` call.
    pub fn on_delay(&self, f: impl Fn(u32) + Send + Sync + 'static) {
        assert!(self.on_delay.set(Box::new(f)).is_ok(), "delay hook already set");
    }
}

impl IrqHooks for TestHooks {
    fn add_interrupt_randomness(&self, irq: usize) {
        self.randomness.lock().unwrap().push(irq);
    }

    fn raise_softirq(&self) {
        self.softirqs.fetch_add(1, Ordering::SeqCst);
    }

    fn mdelay(&self, ms: u32) {
        self.delays.lock().unwrap().push(ms);
        if let Some(f) = self.on_delay.get() {
            f(ms);
        }
    }

    fn cpu_relax(&self) {
        std::thread::yield_now();
    }
}

pub struct Fixture {
    pub reg: &'static Registry,
    pub hooks: Arc<TestHooks>,
    pub ctrl: Arc<RecordingController>,
}

/// A leaked registry (drivers keep `&'static` references to it, like a kernel would)
/// with every line routed through one recording controller.
pub fn setup(nr_irqs: usize) -> Fixture {
    test_support::install();
    let hooks = Arc::new(TestHooks::default());
    let reg: &'static Registry = Box::leak(Box::new(Registry::new(nr_irqs, hooks.clone())));
    let ctrl = Arc::new(RecordingController::default());
    for irq in 0..nr_irqs {
        reg.set_controller(irq, ctrl.clone()).unwrap();
    }
    Fixture { reg, hooks, ctrl }
}

pub fn counting_handler(counter: Arc<AtomicUsize>) -> impl IrqHandler {
    move |_irq: usize, _dev: DevId| {
        counter.fetch_add(1, Ordering::SeqCst);
        IrqReturn::Handled
    }
}

pub fn recording_handler(log: Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> impl IrqHandler {
    move |_irq: usize, _dev: DevId| {
        log.lock().unwrap().push(tag);
        IrqReturn::Handled
    }
}

//! Autoprobe: lines that fire during the settle window become candidates.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use common::{Fixture, RecordingController, counting_handler, setup};
use irq::config::{PROBE_LONGSTANDING_MS, PROBE_SETTLE_MS};
use irq::{DevId, IrqFlags, IrqStatus, ProbeOutcome};

/// Make `lines` raise an interrupt while the probe waits `when` milliseconds.
fn fire_during(fx: &Fixture, when: u32, lines: &'static [usize]) {
    let reg = fx.reg;
    fx.hooks.on_delay(move |ms| {
        if ms == when {
            for &irq in lines {
                reg.dispatch(irq);
            }
        }
    });
}

fn assert_no_probe_state(fx: &Fixture) {
    for irq in 0..fx.reg.nr_irqs() {
        let state = fx.reg.line_state(irq).unwrap();
        assert!(
            !state.status.intersects(IrqStatus::AUTODETECT | IrqStatus::WAITING),
            "IRQ {irq} still probing: {:?}",
            state.status
        );
    }
}

#[test]
fn test_probe_without_activity_finds_nothing() {
    let fx = setup(16);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(mask, 0);
    let outcome = fx.reg.probe_irq_off(mask);
    assert_eq!(outcome, ProbeOutcome::NotFound);
    assert_eq!(outcome.as_raw(), 0);

    assert_eq!(
        *fx.hooks.delays.lock().unwrap(),
        vec![PROBE_LONGSTANDING_MS, PROBE_SETTLE_MS]
    );
    assert_no_probe_state(&fx);
}

#[test]
fn test_probe_finds_single_line() {
    let fx = setup(16);
    fire_during(&fx, PROBE_SETTLE_MS, &[7]);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(mask, 1 << 7);
    let outcome = fx.reg.probe_irq_off(mask);
    assert_eq!(outcome, ProbeOutcome::Found(7));
    assert_eq!(outcome.as_raw(), 7);
    assert_no_probe_state(&fx);

    // Every idle line was started twice and shut down once.
    assert_eq!(RecordingController::get(&fx.ctrl.startups), 2 * 15);
    assert_eq!(RecordingController::get(&fx.ctrl.shutdowns), 15);
}

#[test]
fn test_probe_reports_ambiguity() {
    let fx = setup(16);
    fire_during(&fx, PROBE_SETTLE_MS, &[3, 9]);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(mask, (1 << 3) | (1 << 9));
    let outcome = fx.reg.probe_irq_off(mask);
    assert_eq!(outcome, ProbeOutcome::Ambiguous(2));
    assert_eq!(outcome.as_raw(), -2);
    assert_no_probe_state(&fx);
}

#[test]
fn test_probe_skips_lines_in_use_and_line_zero() {
    let fx = setup(16);
    let hits = Arc::new(AtomicUsize::new(0));
    fx.reg
        .request_irq(7, counting_handler(hits), IrqFlags::empty(), "busy", DevId(1))
        .unwrap();
    fire_during(&fx, PROBE_SETTLE_MS, &[0, 7, 11]);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(mask, 1 << 11);
    assert_eq!(fx.reg.probe_irq_off(mask), ProbeOutcome::Found(11));

    // The owned line keeps running normally.
    let state = fx.reg.line_state(7).unwrap();
    assert_eq!(state.nr_actions, 1);
    assert!(!state.status.contains(IrqStatus::DISABLED));
}

#[test]
fn test_probe_ignores_longstanding_interrupts() {
    let fx = setup(16);
    fire_during(&fx, PROBE_LONGSTANDING_MS, &[5]);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(mask, 0);
    assert_eq!(fx.reg.probe_irq_off(mask), ProbeOutcome::NotFound);
}

#[test]
fn test_probe_irq_mask_filters_fired_lines() {
    let fx = setup(16);
    fire_during(&fx, PROBE_SETTLE_MS, &[3, 9]);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(fx.reg.probe_irq_mask(1 << 3), 1 << 3);
    assert_ne!(mask, 0);
    assert_no_probe_state(&fx);
}

#[test]
fn test_probe_high_line_only_visible_through_off() {
    let fx = setup(48);
    fire_during(&fx, PROBE_SETTLE_MS, &[40]);

    let mask = fx.reg.probe_irq_on();
    assert_eq!(mask, 0);
    assert_eq!(fx.reg.probe_irq_off(mask), ProbeOutcome::Found(40));
}

#[test]
fn test_probe_can_run_again() {
    let fx = setup(16);
    fire_during(&fx, PROBE_SETTLE_MS, &[4]);

    for _ in 0..2 {
        let mask = fx.reg.probe_irq_on();
        assert_eq!(fx.reg.probe_irq_off(mask), ProbeOutcome::Found(4));
    }
}

#[test]
fn test_concurrent_probe_waits_for_first_session() {
    let fx = setup(16);
    let reg = fx.reg;
    let second_started = Arc::new(AtomicBool::new(false));

    let first = reg.probe_irq_on();

    let started = second_started.clone();
    let cpu1 = thread::spawn(move || {
        test_support::set_cpu_id(1);
        let mask = reg.probe_irq_on();
        started.store(true, Ordering::SeqCst);
        reg.probe_irq_off(mask)
    });

    thread::sleep(Duration::from_millis(200));
    assert!(!second_started.load(Ordering::SeqCst));
    // Only the first session has run its settle waits so far.
    assert_eq!(fx.hooks.delays.lock().unwrap().len(), 2);

    assert_eq!(reg.probe_irq_off(first), ProbeOutcome::NotFound);
    assert_eq!(cpu1.join().unwrap(), ProbeOutcome::NotFound);
    assert!(second_started.load(Ordering::SeqCst));
    assert_eq!(fx.hooks.delays.lock().unwrap().len(), 4);
    assert_no_probe_state(&fx);
}

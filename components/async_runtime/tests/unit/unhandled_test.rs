//! Unit tests for unhandled rejection reporting

use crate::support::{capture_unhandled, journal, setup, setup_with};
use async_runtime::{Handler, Promise, RuntimeConfig};
use core_types::{ErrorKind, JsError, Value};
use log::LevelFilter;
use std::sync::OnceLock;
use std::time::Duration;
use structs::BufferedLogger;

fn delayed(ms: i64) -> RuntimeConfig {
    RuntimeConfig {
        unhandled_rejection_delay_ms: ms,
        ..RuntimeConfig::default()
    }
}

fn ignore() -> Handler {
    Handler::new(|_| Ok(Value::Undefined))
}

/// Global logger shared by every test in this binary.
fn error_log() -> &'static BufferedLogger {
    static LOGGER: OnceLock<&'static BufferedLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger: &'static BufferedLogger =
            Box::leak(Box::new(BufferedLogger::new(1024, LevelFilter::Error)));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Error);
        }
        logger
    })
}

#[test]
fn unhandled_rejection_is_reported_exactly_once() {
    let (el, rt) = setup();
    let reports = capture_unhandled(&rt);
    let promise = Promise::pending(&rt);
    promise.reject(Value::from("lost"));

    el.run_until_done().unwrap();
    el.run_until_done().unwrap();
    assert_eq!(*reports.borrow(), vec![Value::from("lost")]);
}

#[test]
fn catch_in_same_frame_suppresses_report() {
    let (el, rt) = setup();
    let reports = capture_unhandled(&rt);
    let promise = Promise::pending(&rt);
    promise.reject(Value::from("handled"));
    promise.then_catch(ignore(), None);

    el.run_until_done().unwrap();
    assert!(reports.borrow().is_empty());
}

#[test]
fn catch_after_report_still_runs() {
    let (el, rt) = setup();
    let reports = capture_unhandled(&rt);
    let log = journal();
    let promise = Promise::pending(&rt);
    promise.reject(Value::Smi(1));
    el.run_until_done().unwrap();

    let l = log.clone();
    promise.then_catch(
        Handler::new(move |r| {
            l.borrow_mut().push(r.to_string());
            Ok(Value::Undefined)
        }),
        None,
    );
    el.run_until_done().unwrap();
    assert_eq!(reports.borrow().len(), 1);
    assert_eq!(*log.borrow(), vec!["1"]);
}

#[test]
fn only_the_leaf_of_a_chain_is_reported() {
    let (el, rt) = setup();
    let reports = capture_unhandled(&rt);
    let root = Promise::pending(&rt);
    let leaf = root
        .then(Some(Handler::new(Ok)), None, None)
        .then(Some(Handler::new(Ok)), None, None);

    root.reject(Value::from("deep"));
    el.run_until_done().unwrap();
    assert_eq!(leaf.result(), Some(Value::from("deep")));
    assert_eq!(*reports.borrow(), vec![Value::from("deep")]);
}

#[test]
fn fulfillment_only_registration_does_not_handle() {
    let (el, rt) = setup();
    let reports = capture_unhandled(&rt);
    let promise = Promise::pending(&rt);
    promise.then_void(Some(ignore()), None, None);
    promise.reject(Value::Smi(2));

    el.run_until_done().unwrap();
    assert_eq!(*reports.borrow(), vec![Value::Smi(2)]);
}

#[test]
fn positive_delay_reports_through_host_timer() {
    let (el, rt) = setup_with(delayed(100));
    let reports = capture_unhandled(&rt);
    let promise = Promise::pending(&rt);
    promise.reject(Value::from("slow"));

    el.run_until_stalled().unwrap();
    assert_eq!(el.pending_timers(), 1);

    el.advance_by(Duration::from_millis(99)).unwrap();
    assert!(reports.borrow().is_empty());

    el.advance_by(Duration::from_millis(1)).unwrap();
    assert_eq!(*reports.borrow(), vec![Value::from("slow")]);
    assert_eq!(el.pending_timers(), 0);
}

#[test]
fn handling_before_delay_cancels_timer() {
    let (el, rt) = setup_with(delayed(100));
    let reports = capture_unhandled(&rt);
    let promise = Promise::pending(&rt);
    promise.reject(Value::from("caught"));
    el.advance_by(Duration::from_millis(50)).unwrap();

    promise.then_catch(ignore(), None);
    el.run_until_stalled().unwrap();
    assert_eq!(el.pending_timers(), 0);

    el.advance_by(Duration::from_millis(200)).unwrap();
    assert!(reports.borrow().is_empty());
}

#[test]
fn negative_delay_disables_reporting() {
    let (el, rt) = setup_with(delayed(-1));
    let reports = capture_unhandled(&rt);
    let promise = Promise::pending(&rt);
    promise.reject(Value::from("quiet"));

    el.run_until_done().unwrap();
    assert!(reports.borrow().is_empty());
    assert_eq!(el.pending_timers(), 0);
}

#[test]
fn long_stack_trace_is_appended_to_reported_error() {
    let config = RuntimeConfig {
        long_stack_traces: true,
        ..RuntimeConfig::default()
    };
    let (el, rt) = setup_with(config);
    let reports = capture_unhandled(&rt);
    let root = Promise::pending(&rt);
    let child = root.then(None, None, None);

    root.reject(Value::from(JsError::new(ErrorKind::Error, "boom")));
    el.run_until_done().unwrap();

    let reports = reports.borrow();
    assert_eq!(reports.len(), 1);
    let err = reports[0].as_error().unwrap();
    let names: Vec<&str> = err
        .stack
        .iter()
        .filter_map(|frame| frame.function_name.as_deref())
        .collect();
    assert_eq!(names.first(), Some(&"Promise trace:"));
    assert_eq!(names.last(), Some(&"Value: [REJECTED] <Error: boom>"));
    assert!(err.stack.iter().any(|frame| frame
        .source_url
        .as_deref()
        .is_some_and(|url| url.ends_with("unhandled_test.rs"))));

    // The settled value itself is untouched.
    assert!(child.result().unwrap().as_error().unwrap().stack.is_empty());
}

#[test]
fn default_report_goes_to_error_log() {
    let logger = error_log();
    let (el, rt) = setup();
    let promise = Promise::pending(&rt);
    promise.reject(Value::from("nobody listened"));

    el.run_until_done().unwrap();
    assert!(logger
        .messages()
        .iter()
        .any(|m| m == "Uncaught (in promise) nobody listened"));
}

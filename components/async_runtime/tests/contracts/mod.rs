//! Contract tests for async_runtime component
//!
//! These tests pin down the public surface: signatures, defaults and the
//! observable guarantees embedders rely on.

use async_runtime::{
    EventLoop, Handler, Host, MicroTask, Promise, PromiseState, RejectionDelay, Resolver,
    Runtime, RuntimeConfig, RuntimeError, Task, DEFAULT_MAX_UNUSED,
};
use core_types::Value;
use std::time::Duration;

mod event_loop_contract {
    use super::*;

    #[test]
    fn event_loop_is_a_host() {
        let event_loop = EventLoop::new();
        let host: &dyn Host = &event_loop;
        host.schedule_soon(MicroTask::new(|| Ok(Value::Undefined)));
        assert_eq!(event_loop.microtask_count(), 1);
    }

    #[test]
    fn clones_share_queues() {
        let event_loop = EventLoop::new();
        let clone = event_loop.clone();
        clone.enqueue_task(Task::new(|| Ok(Value::Undefined)));
        assert!(!event_loop.is_task_queue_empty());
    }

    #[test]
    fn schedule_timer_returns_distinct_ids() {
        let event_loop = EventLoop::new();
        let a = event_loop.schedule_timer(Duration::ZERO, Task::new(|| Ok(Value::Undefined)));
        let b = event_loop.schedule_timer(Duration::ZERO, Task::new(|| Ok(Value::Undefined)));
        assert_ne!(a, b);
        assert_eq!(event_loop.pending_timers(), 2);
    }
}

mod runtime_contract {
    use super::*;

    #[test]
    fn runtime_new_uses_default_config() {
        let runtime = Runtime::new(EventLoop::new());
        assert_eq!(runtime.config(), &RuntimeConfig::default());
        assert_eq!(runtime.pending_work(), 0);
    }

    #[test]
    fn pool_is_bounded_by_config() {
        let event_loop = EventLoop::new();
        let config = RuntimeConfig {
            max_unused_entries: 2,
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::with_config(event_loop.clone(), config);
        let promise = Promise::pending(&runtime);
        for _ in 0..5 {
            promise.then_void(None, None, None);
        }
        promise.resolve(Value::Undefined);
        event_loop.run_until_done().unwrap();

        assert_eq!(runtime.pooled_entries(), 2);
        let stats = runtime.pool_stats();
        assert_eq!(stats.created, 5);
        assert_eq!(stats.discarded, 3);
    }

    #[test]
    fn initial_entries_are_preallocated() {
        let config = RuntimeConfig {
            initial_entries: 4,
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::with_config(EventLoop::new(), config);
        assert_eq!(runtime.pooled_entries(), 4);
    }
}

mod promise_contract {
    use super::*;

    #[test]
    fn then_returns_new_pending_promise() {
        let runtime = Runtime::new(EventLoop::new());
        let promise = Promise::pending(&runtime);
        let child = promise.then(None, None, None);
        assert!(!child.ptr_eq(&promise));
        assert_eq!(child.state(), PromiseState::Pending);
        assert_ne!(child.id(), promise.id());
    }

    #[test]
    fn then_catch_returns_child() {
        let runtime = Runtime::new(EventLoop::new());
        let promise = Promise::pending(&runtime);
        let child = promise.then_catch(Handler::new(Ok), None);
        assert!(child.parent().is_some_and(|p| p.ptr_eq(&promise)));
    }

    #[test]
    fn promise_is_a_value() {
        let runtime = Runtime::new(EventLoop::new());
        let promise = Promise::pending(&runtime);
        let value: Value = promise.clone().into();
        assert_eq!(value, promise.to_value());
        assert!(matches!(value, Value::Thenable(_)));
    }

    #[test]
    fn resolver_controls_its_promise() {
        let runtime = Runtime::new(EventLoop::new());
        let Resolver {
            promise, resolve, ..
        } = Promise::with_resolver(&runtime);
        resolve.call(Value::Boolean(true));
        assert_eq!(promise.result(), Some(Value::Boolean(true)));
    }
}

mod config_contract {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_unused_entries, DEFAULT_MAX_UNUSED);
        assert_eq!(config.initial_entries, 0);
        assert_eq!(config.rejection_delay(), RejectionDelay::Immediate);
        assert!(!config.long_stack_traces);
    }

    #[test]
    fn json_overrides_selected_fields() {
        let config = RuntimeConfig::from_json(
            r#"{ "unhandled_rejection_delay_ms": 250, "long_stack_traces": true }"#,
        )
        .unwrap();
        assert_eq!(
            config.rejection_delay(),
            RejectionDelay::After(Duration::from_millis(250))
        );
        assert!(config.long_stack_traces);
        assert_eq!(config.max_unused_entries, DEFAULT_MAX_UNUSED);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let result = RuntimeConfig::from_json("{ not json");
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
